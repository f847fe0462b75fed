//! End-to-end lifecycle scenarios against the file store.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

use kanban_core::error::IoOp;
use kanban_core::model::{MoveRequest, NewTicket, Priority, Status, Ticket, TicketPatch};
use kanban_core::ops::{self, BoardRules};
use kanban_core::store::codec;
use kanban_core::{FileStore, KanbanError, MemoryStore, Result, TicketService, TicketStore};
use tempfile::TempDir;

fn file_service() -> (TempDir, TicketService<FileStore>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileStore::new(dir.path().join(".kanban").join("tickets.tsv"));
    (dir, TicketService::new(store, BoardRules::default()))
}

fn ids_in(tickets: &[Ticket], status: Status) -> Vec<String> {
    ops::column(tickets, status)
        .into_iter()
        .map(|i| tickets[i].id.clone())
        .collect()
}

/// Fails the `fail_on`-th save (1-based) with an I/O error.
struct FlakyStore {
    inner: MemoryStore,
    saves: AtomicUsize,
    fail_on: usize,
}

impl TicketStore for FlakyStore {
    fn load(&self) -> Result<Vec<Ticket>> {
        self.inner.load()
    }

    fn save(&self, tickets: &[Ticket]) -> Result<()> {
        let n = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on {
            return Err(KanbanError::Io {
                op: IoOp::Write,
                path: "flaky.tsv".into(),
                source: io::Error::other("disk full"),
            });
        }
        self.inner.save(tickets)
    }
}

#[test]
fn create_on_empty_store() {
    let (_dir, svc) = file_service();
    let t = svc
        .create(&NewTicket::new("Fix bug", "desc"))
        .expect("create");

    assert_eq!(t.id, "1");
    assert_eq!(t.status, Status::ToDo);
    assert_eq!(t.priority, Priority::Medium);
    assert_eq!(t.order, 0);
    assert_eq!(t.assignee, "");
    assert_eq!(t.history.len(), 1);
    assert_eq!(t.history[0].action, "Created");
    assert_eq!(svc.all().expect("all"), vec![t]);
}

#[test]
fn move_into_review_unassigns() {
    let (_dir, svc) = file_service();
    svc.create(&NewTicket::new("Fix bug", "desc")).expect("create");
    svc.assign("1", "Bob").expect("assign");

    let req = MoveRequest {
        from: Status::ToDo,
        to: Status::ReadyForReview,
        from_index: 0,
        to_index: None,
    };
    let moved = svc.move_ticket("1", &req).expect("move");
    assert_eq!(moved.status, Status::ReadyForReview);
    assert_eq!(moved.assignee, "");
    let actions: Vec<&str> = moved.history.iter().map(|h| h.action.as_str()).collect();
    assert!(actions.contains(&"Status changed from ToDo to Ready for Review"));
    assert_eq!(actions.last(), Some(&"Assignee changed from Bob to Unassigned"));
    assert_eq!(svc.get("1").expect("get"), moved);
}

#[test]
fn reorder_last_to_first() {
    let (_dir, svc) = file_service();
    // Create puts new tickets at the head: ToDo = [3, 2, 1].
    for title in ["Z", "Y", "X"] {
        svc.create(&NewTicket::new(title, "d")).expect("create");
    }
    assert_eq!(ids_in(&svc.all().expect("all"), Status::ToDo), vec!["3", "2", "1"]);

    let req = MoveRequest {
        from: Status::ToDo,
        to: Status::ToDo,
        from_index: 2,
        to_index: Some(0),
    };
    svc.move_ticket("1", &req).expect("move");

    let tickets = svc.all().expect("all");
    assert_eq!(ids_in(&tickets, Status::ToDo), vec!["1", "3", "2"]);
    let orders: Vec<usize> = ["1", "3", "2"]
        .iter()
        .map(|id| svc.get(id).expect("get").order)
        .collect();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[test]
fn bulk_delete_keeps_applied_deletions_after_a_failure() {
    let store = FlakyStore {
        inner: MemoryStore::new(),
        saves: AtomicUsize::new(0),
        fail_on: 5,
    };
    let svc = TicketService::new(store, BoardRules::default());
    // Saves 1..=3 are the creates; save 4 deletes "1", save 5 ("2") fails.
    for title in ["a", "b", "c"] {
        svc.create(&NewTicket::new(title, "d")).expect("create");
    }

    let ids: Vec<String> = ["1", "2", "3"].iter().map(ToString::to_string).collect();
    let outcome = svc.bulk_delete(&ids);

    assert_eq!(outcome.applied, vec!["1", "3"]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].0, "2");
    assert!(outcome.failed[0].1.is_io_failure());

    let remaining = svc.all().expect("all");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, "2");
    assert_eq!(remaining[0].order, 0);
}

#[test]
fn store_round_trip_preserves_every_field() {
    let (_dir, svc) = file_service();
    svc.create(&NewTicket::new("tab\there", "multi\nline \"quoted\" description"))
        .expect("create");
    svc.create(&NewTicket {
        priority: Some(Priority::High),
        assignee: Some("Diana".into()),
        sprint: Some("Sprint 7".into()),
        ..NewTicket::new("second", "d")
    })
    .expect("create");
    svc.add_comment("1", "first\tcomment").expect("comment");
    svc.edit(
        "2",
        &TicketPatch {
            status: Some(Status::ReadyForQa),
            ..TicketPatch::default()
        },
    )
    .expect("edit");

    let store = svc.store();
    let loaded = store.load().expect("load");
    store.save(&loaded).expect("save");
    assert_eq!(store.load().expect("reload"), loaded);

    let text = std::fs::read_to_string(store.path()).expect("read");
    assert!(text.starts_with(codec::FILE_HEADER));
    assert_eq!(text.lines().filter(|l| !l.starts_with('#')).count(), 2);
}

#[test]
fn delete_then_get_is_not_found() {
    let (_dir, svc) = file_service();
    for title in ["a", "b", "c"] {
        svc.create(&NewTicket::new(title, "d")).expect("create");
    }
    svc.edit("1", &TicketPatch::assignee("Alice")).expect("assign");
    svc.add_comment("3", "keep me").expect("comment");
    let before = svc.all().expect("all");
    svc.delete("2").expect("delete");

    assert!(matches!(svc.get("2"), Err(KanbanError::NotFound { .. })));
    let after = svc.all().expect("all");
    assert_eq!(after.len(), 2);
    ops::check_order(&after).expect("dense orders");

    // Survivors are unchanged apart from their column position.
    for survivor in &after {
        let mut old = before
            .iter()
            .find(|t| t.id == survivor.id)
            .cloned()
            .expect("survivor existed before");
        old.order = survivor.order;
        assert_eq!(&old, survivor);
    }
}

#[test]
fn deleting_an_unknown_id_changes_nothing() {
    let (_dir, svc) = file_service();
    for title in ["a", "b"] {
        svc.create(&NewTicket::new(title, "d")).expect("create");
    }
    let before = svc.all().expect("all");

    assert!(matches!(svc.delete("9"), Err(KanbanError::NotFound { .. })));
    assert_eq!(svc.all().expect("all"), before);
}

#[test]
fn put_with_full_ticket_ignores_order_and_history() {
    let (_dir, svc) = file_service();
    svc.create(&NewTicket::new("a", "d")).expect("create");
    svc.create(&NewTicket::new("b", "d")).expect("create");

    let mut echoed = serde_json::to_value(svc.get("1").expect("get")).expect("json");
    echoed["order"] = serde_json::json!(0);
    echoed["history"] = serde_json::json!([]);
    echoed["title"] = serde_json::json!("renamed");
    let patch: TicketPatch = serde_json::from_value(echoed).expect("patch");

    let updated = svc.edit("1", &patch).expect("edit");
    assert_eq!(updated.title, "renamed");
    assert_eq!(updated.order, 1);
    assert_eq!(updated.history.len(), 1);
}

#[test]
fn repair_heals_legacy_file() {
    let (_dir, svc) = file_service();
    for title in ["a", "b", "c"] {
        svc.create(&NewTicket::new(title, "d")).expect("create");
    }
    let mut legacy = svc.all().expect("all");
    for t in &mut legacy {
        t.order = 0;
    }
    svc.store().save(&legacy).expect("save");

    assert_eq!(svc.repair_order().expect("repair"), 2);
    ops::check_order(&svc.all().expect("all")).expect("dense orders");
    assert_eq!(svc.repair_order().expect("repair"), 0);
}

#[test]
fn unreadable_store_surfaces_io_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    // The store path is a directory.
    let svc = TicketService::new(FileStore::new(dir.path()), BoardRules::default());
    let err = svc.create(&NewTicket::new("a", "b")).expect_err("io failure");
    assert!(err.is_io_failure());
    assert_eq!(err.code().http_status(), 500);
}
