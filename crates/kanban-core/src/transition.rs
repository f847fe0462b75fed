//! Status-dependent side effects and the audit trail they leave.
//!
//! Side effects are declared in [`RULES`], keyed by destination status, and
//! applied identically whether a ticket changes column through a drag
//! (`move`) or through a field edit. History entries are derived afterwards
//! by diffing the tracked fields of the before/after records, so every
//! effect that changes a tracked field is audited like a user change.

use chrono::{DateTime, Utc};

use crate::model::{HistoryEntry, Status, Ticket, display_assignee};

/// A side effect triggered by entering a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Hand the ticket back to the pool: `assignee = ""`.
    ClearAssignee,
}

/// Effects applied when a ticket enters `to` from any other status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub to: Status,
    pub effects: &'static [Effect],
}

/// The transition table.
pub const RULES: &[TransitionRule] = &[TransitionRule {
    to: Status::REVIEW,
    effects: &[Effect::ClearAssignee],
}];

/// Effects for a `from -> to` transition. Staying in a column has none.
#[must_use]
pub fn effects_for(from: Status, to: Status) -> &'static [Effect] {
    if from == to {
        return &[];
    }
    match RULES.iter().find(|rule| rule.to == to) {
        Some(rule) => rule.effects,
        None => &[],
    }
}

/// Set `ticket.status = to` and apply the table's effects for the change.
pub fn enter_status(ticket: &mut Ticket, to: Status) {
    let from = ticket.status;
    ticket.status = to;
    for effect in effects_for(from, to) {
        apply(ticket, *effect);
    }
}

fn apply(ticket: &mut Ticket, effect: Effect) {
    match effect {
        Effect::ClearAssignee => ticket.assignee.clear(),
    }
}

/// Fields whose changes are written to the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackedField {
    Status,
    Assignee,
    Priority,
}

impl TrackedField {
    /// Tracked fields in the order their entries are appended.
    pub const ALL: [Self; 3] = [Self::Status, Self::Assignee, Self::Priority];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Status => "Status",
            Self::Assignee => "Assignee",
            Self::Priority => "Priority",
        }
    }

    fn display(self, ticket: &Ticket) -> String {
        match self {
            Self::Status => ticket.status.to_string(),
            Self::Assignee => display_assignee(&ticket.assignee).to_string(),
            Self::Priority => ticket.priority.to_string(),
        }
    }

    fn differs(self, before: &Ticket, after: &Ticket) -> bool {
        match self {
            Self::Status => before.status != after.status,
            Self::Assignee => before.assignee != after.assignee,
            Self::Priority => before.priority != after.priority,
        }
    }
}

/// `"<Field> changed from <A> to <B>"`.
#[must_use]
pub fn change_action(field: TrackedField, from: &str, to: &str) -> String {
    format!("{} changed from {from} to {to}", field.label())
}

/// Append one history entry to `after` per tracked field that differs from
/// `before`. Returns the number of entries appended.
pub fn record_changes(before: &Ticket, after: &mut Ticket, at: DateTime<Utc>) -> usize {
    let mut appended = 0;
    for field in TrackedField::ALL {
        if field.differs(before, after) {
            let action = change_action(field, &field.display(before), &field.display(after));
            after.history.push(HistoryEntry::new(action, at));
            appended += 1;
        }
    }
    appended
}
