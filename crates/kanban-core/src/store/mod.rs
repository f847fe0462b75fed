//! Authoritative persistence for the ticket collection.
//!
//! The only primitives are "load everything" and "save everything". There is
//! no per-record write, no lock and no version check: two interleaved
//! load/save cycles lose the first writer's update. Callers that need
//! correctness under concurrency must serialize their own mutations.

pub mod codec;
mod file;

pub use file::FileStore;

use std::sync::Mutex;

use crate::error::Result;
use crate::model::Ticket;

/// Whole-collection persistence.
pub trait TicketStore {
    /// Return the entire current dataset.
    ///
    /// # Errors
    ///
    /// Returns an IOFailure-family [`crate::KanbanError`] when the backing
    /// medium cannot be read. A store that was never written is empty, not
    /// an error.
    fn load(&self) -> Result<Vec<Ticket>>;

    /// Replace the entire dataset with `tickets`.
    ///
    /// # Errors
    ///
    /// Returns an IOFailure-family [`crate::KanbanError`] on write failure.
    fn save(&self, tickets: &[Ticket]) -> Result<()>;
}

impl<S: TicketStore + ?Sized> TicketStore for &S {
    fn load(&self) -> Result<Vec<Ticket>> {
        (**self).load()
    }

    fn save(&self, tickets: &[Ticket]) -> Result<()> {
        (**self).save(tickets)
    }
}

/// In-process store holding the last saved collection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tickets: Mutex<Vec<Ticket>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, Vec<Ticket>> {
        // A panic while holding the lock cannot leave a half-written Vec:
        // every save swaps the whole value.
        self.tickets
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl TicketStore for MemoryStore {
    fn load(&self) -> Result<Vec<Ticket>> {
        Ok(self.guard().clone())
    }

    fn save(&self, tickets: &[Ticket]) -> Result<()> {
        *self.guard() = tickets.to_vec();
        Ok(())
    }
}
