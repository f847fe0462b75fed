use proptest::prelude::*;

use kanban_core::model::{
    MoveRequest, NewTicket, Priority, Status, Ticket, TicketPatch, display_assignee, now,
};
use kanban_core::ops::{self, BoardRules};
use kanban_core::store::codec;

#[derive(Debug, Clone)]
enum Op {
    Create(Priority),
    Move { pick: usize, to: usize, to_index: Option<usize> },
    EditStatus { pick: usize, to: usize },
    Assign { pick: usize, who: usize },
    Comment { pick: usize },
    Delete { pick: usize },
}

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::High), Just(Priority::Medium), Just(Priority::Low)]
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => arb_priority().prop_map(Op::Create),
        4 => (any::<usize>(), 0..6usize, proptest::option::of(0..8usize))
            .prop_map(|(pick, to, to_index)| Op::Move { pick, to, to_index }),
        2 => (any::<usize>(), 0..6usize).prop_map(|(pick, to)| Op::EditStatus { pick, to }),
        2 => (any::<usize>(), 0..5usize).prop_map(|(pick, who)| Op::Assign { pick, who }),
        1 => any::<usize>().prop_map(|pick| Op::Comment { pick }),
        1 => any::<usize>().prop_map(|pick| Op::Delete { pick }),
    ]
}

const WHO: [&str; 5] = ["", "Alice", "Bob", "Charlie", "Diana"];

fn pick_id(tickets: &[Ticket], pick: usize) -> Option<String> {
    if tickets.is_empty() {
        None
    } else {
        Some(tickets[pick % tickets.len()].id.clone())
    }
}

fn apply(tickets: &mut Vec<Ticket>, op: &Op, rules: &BoardRules) {
    let at = now();
    match op {
        Op::Create(priority) => {
            let input = NewTicket {
                priority: Some(*priority),
                ..NewTicket::new("t", "d")
            };
            ops::create(tickets, &input, rules, at).expect("create");
        }
        Op::Move { pick, to, to_index } => {
            let Some(id) = pick_id(tickets, *pick) else { return };
            let idx = ops::position(tickets, &id).expect("present");
            let from = tickets[idx].status;
            let from_index = ops::column(tickets, from)
                .iter()
                .position(|&i| i == idx)
                .expect("in own column");
            let req = MoveRequest {
                from,
                to: Status::ALL[*to],
                from_index,
                to_index: *to_index,
            };
            ops::move_ticket(tickets, &id, &req, at).expect("move");
        }
        Op::EditStatus { pick, to } => {
            let Some(id) = pick_id(tickets, *pick) else { return };
            let patch = TicketPatch {
                status: Some(Status::ALL[*to]),
                ..TicketPatch::default()
            };
            ops::edit(tickets, &id, &patch, rules, at).expect("edit");
        }
        Op::Assign { pick, who } => {
            let Some(id) = pick_id(tickets, *pick) else { return };
            ops::edit(tickets, &id, &TicketPatch::assignee(WHO[*who]), rules, at).expect("assign");
        }
        Op::Comment { pick } => {
            let Some(id) = pick_id(tickets, *pick) else { return };
            ops::add_comment(tickets, &id, "note", at).expect("comment");
        }
        Op::Delete { pick } => {
            let Some(id) = pick_id(tickets, *pick) else { return };
            ops::delete(tickets, &id).expect("delete");
        }
    }
}

/// History actions a single op must append, in status, assignee, priority order.
fn expected_actions(old: &Ticket, new: &Ticket) -> Vec<String> {
    let mut actions = Vec::new();
    if old.status != new.status {
        actions.push(format!("Status changed from {} to {}", old.status, new.status));
    }
    if old.assignee != new.assignee {
        actions.push(format!(
            "Assignee changed from {} to {}",
            display_assignee(&old.assignee),
            display_assignee(&new.assignee)
        ));
    }
    if old.priority != new.priority {
        actions.push(format!("Priority changed from {} to {}", old.priority, new.priority));
    }
    actions
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn every_column_stays_dense(script in prop::collection::vec(arb_op(), 0..40)) {
        let rules = BoardRules::default();
        let mut tickets = Vec::new();
        for op in &script {
            apply(&mut tickets, op, &rules);
            prop_assert!(ops::check_order(&tickets).is_ok(), "after {:?}", op);
        }
    }

    #[test]
    fn history_appends_one_entry_per_changed_field(script in prop::collection::vec(arb_op(), 0..40)) {
        let rules = BoardRules::default();
        let mut tickets: Vec<Ticket> = Vec::new();
        for op in &script {
            let before = tickets.clone();
            apply(&mut tickets, op, &rules);
            for old in &before {
                let Some(new) = tickets.iter().find(|t| t.id == old.id) else { continue };
                let expected = expected_actions(old, new);
                prop_assert_eq!(
                    new.history.len(),
                    old.history.len() + expected.len(),
                    "ticket {} after {:?}", &old.id, op
                );
                prop_assert_eq!(&new.history[..old.history.len()], &old.history[..]);
                let appended: Vec<&str> = new.history[old.history.len()..]
                    .iter()
                    .map(|h| h.action.as_str())
                    .collect();
                prop_assert_eq!(appended, expected.iter().map(String::as_str).collect::<Vec<_>>());
                prop_assert!(new.comments.len() >= old.comments.len());
                prop_assert_eq!(new.history[0].action.as_str(), "Created");
            }
        }
    }

    #[test]
    fn review_column_is_never_assigned_by_a_move(script in prop::collection::vec(arb_op(), 0..40)) {
        let rules = BoardRules::default();
        let mut tickets = Vec::new();
        for op in &script {
            let was_review: Vec<String> = tickets
                .iter()
                .filter(|t: &&Ticket| t.status == Status::REVIEW)
                .map(|t| t.id.clone())
                .collect();
            apply(&mut tickets, op, &rules);
            if matches!(op, Op::Move { .. } | Op::EditStatus { .. }) {
                for t in tickets.iter().filter(|t| t.status == Status::REVIEW) {
                    if !was_review.contains(&t.id) {
                        prop_assert_eq!(t.assignee.as_str(), "");
                    }
                }
            }
        }
    }

    #[test]
    fn codec_preserves_generated_boards(script in prop::collection::vec(arb_op(), 0..25)) {
        let rules = BoardRules::default();
        let mut tickets = Vec::new();
        for op in &script {
            apply(&mut tickets, op, &rules);
        }
        let text = codec::encode_file(&tickets).expect("encode");
        let decoded = codec::decode_file(&text).expect("decode");
        prop_assert_eq!(decoded, tickets);
    }
}
