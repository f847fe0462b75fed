use std::sync::Arc;

use crate::board::{Board, BoardQuery, project};
use crate::model::Ticket;

/// One immutable view of the collection as the client last knew it.
///
/// Every change produces a new snapshot with a higher version; a published
/// snapshot is never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    version: u64,
    tickets: Arc<[Ticket]>,
}

impl Snapshot {
    #[must_use]
    pub fn new(tickets: Vec<Ticket>) -> Self {
        Self {
            version: 0,
            tickets: tickets.into(),
        }
    }

    /// The snapshot that follows this one.
    #[must_use]
    pub fn succeed(&self, tickets: Vec<Ticket>) -> Self {
        Self {
            version: self.version + 1,
            tickets: tickets.into(),
        }
    }

    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn board(&self, query: &BoardQuery) -> Board<'_> {
        project(&self.tickets, query)
    }
}
