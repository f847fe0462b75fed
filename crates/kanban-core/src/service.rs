//! Ticket lifecycle operations over a [`TicketStore`].
//!
//! Every mutation is one load → compute → save cycle. Nothing is saved when
//! the computation fails, so a rejected request leaves the store untouched.

use tracing::{info, warn};

use crate::error::{KanbanError, Result};
use crate::model::{MoveRequest, NewTicket, Status, Ticket, TicketPatch, now};
use crate::ops::{self, BoardRules};
use crate::page::{Page, paginate};
use crate::store::TicketStore;

/// Page size used by [`TicketService::list`] when the caller gives none.
pub const DEFAULT_PAGE_LIMIT: usize = 10;

/// Per-id results of a bulk operation.
#[derive(Debug, Default)]
pub struct BulkOutcome {
    /// Ids whose mutation was saved, in processing order.
    pub applied: Vec<String>,
    /// Ids that failed, with the reason. Processing continued past each.
    pub failed: Vec<(String, KanbanError)>,
}

impl BulkOutcome {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct TicketService<S> {
    store: S,
    rules: BoardRules,
    page_limit: usize,
}

impl<S: TicketStore> TicketService<S> {
    pub fn new(store: S, rules: BoardRules) -> Self {
        Self {
            store,
            rules,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    #[must_use]
    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn rules(&self) -> &BoardRules {
        &self.rules
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut Vec<Ticket>) -> Result<T>) -> Result<T> {
        let mut tickets = self.store.load()?;
        let out = f(&mut tickets)?;
        self.store.save(&tickets)?;
        Ok(out)
    }

    /// One page of tickets in stored order.
    ///
    /// # Errors
    ///
    /// Propagates store read failures.
    pub fn list(&self, page: usize, limit: Option<usize>) -> Result<Page> {
        let tickets = self.store.load()?;
        Ok(paginate(tickets, page, limit.unwrap_or(self.page_limit)))
    }

    /// The whole collection.
    ///
    /// # Errors
    ///
    /// Propagates store read failures.
    pub fn all(&self) -> Result<Vec<Ticket>> {
        self.store.load()
    }

    /// # Errors
    ///
    /// [`KanbanError::NotFound`] if absent, or a store read failure.
    pub fn get(&self, id: &str) -> Result<Ticket> {
        let tickets = self.store.load()?;
        let idx = ops::position(&tickets, id)?;
        Ok(tickets[idx].clone())
    }

    /// # Errors
    ///
    /// Validation failures from [`ops::create`], or store failures.
    pub fn create(&self, input: &NewTicket) -> Result<Ticket> {
        let ticket = self.mutate(|tickets| {
            let idx = ops::create(tickets, input, &self.rules, now())?;
            Ok(tickets[idx].clone())
        })?;
        info!(id = %ticket.id, title = %ticket.title, "created ticket");
        Ok(ticket)
    }

    /// Move one ticket and renumber the affected columns in a single save.
    ///
    /// # Errors
    ///
    /// See [`ops::move_ticket`]; plus store failures.
    pub fn move_ticket(&self, id: &str, req: &MoveRequest) -> Result<Ticket> {
        let ticket = self.mutate(|tickets| {
            let idx = ops::move_ticket(tickets, id, req, now())?;
            Ok(tickets[idx].clone())
        })?;
        info!(
            id,
            from = %req.from,
            to = %req.to,
            order = ticket.order,
            "moved ticket"
        );
        Ok(ticket)
    }

    /// # Errors
    ///
    /// [`KanbanError::NotFound`], a roster violation, or store failures.
    pub fn assign(&self, id: &str, assignee: &str) -> Result<Ticket> {
        self.edit(id, &TicketPatch::assignee(assignee))
    }

    /// # Errors
    ///
    /// See [`ops::edit`]; plus store failures.
    pub fn edit(&self, id: &str, patch: &TicketPatch) -> Result<Ticket> {
        let ticket = self.mutate(|tickets| {
            let idx = ops::edit(tickets, id, patch, &self.rules, now())?;
            Ok(tickets[idx].clone())
        })?;
        info!(id, status = %ticket.status, assignee = %ticket.assignee_display(), "updated ticket");
        Ok(ticket)
    }

    /// # Errors
    ///
    /// Blank text, [`KanbanError::NotFound`], or store failures.
    pub fn add_comment(&self, id: &str, text: &str) -> Result<Ticket> {
        let ticket = self.mutate(|tickets| {
            let idx = ops::add_comment(tickets, id, text, now())?;
            Ok(tickets[idx].clone())
        })?;
        info!(id, comments = ticket.comments.len(), "added comment");
        Ok(ticket)
    }

    /// # Errors
    ///
    /// [`KanbanError::NotFound`] or store failures.
    pub fn delete(&self, id: &str) -> Result<Ticket> {
        let removed = self.mutate(|tickets| ops::delete(tickets, id))?;
        info!(id, status = %removed.status, "deleted ticket");
        Ok(removed)
    }

    /// Run `op` once per id, each as its own load/save cycle.
    fn bulk(&self, kind: &'static str, ids: &[String], op: impl Fn(&str) -> Result<()>) -> BulkOutcome {
        let mut outcome = BulkOutcome::default();
        for id in ids {
            match op(id) {
                Ok(()) => outcome.applied.push(id.clone()),
                Err(err) => {
                    warn!(id = %id, error = %err, kind, "bulk step failed, continuing");
                    outcome.failed.push((id.clone(), err));
                }
            }
        }
        info!(
            kind,
            applied = outcome.applied.len(),
            failed = outcome.failed.len(),
            "bulk operation finished"
        );
        outcome
    }

    /// Move each ticket to the end of `to`.
    pub fn bulk_move(&self, ids: &[String], to: Status) -> BulkOutcome {
        let patch = TicketPatch {
            status: Some(to),
            ..TicketPatch::default()
        };
        self.bulk("move", ids, |id| self.edit(id, &patch).map(drop))
    }

    pub fn bulk_assign(&self, ids: &[String], assignee: &str) -> BulkOutcome {
        self.bulk("assign", ids, |id| self.assign(id, assignee).map(drop))
    }

    pub fn bulk_delete(&self, ids: &[String]) -> BulkOutcome {
        self.bulk("delete", ids, |id| self.delete(id).map(drop))
    }

    /// Renumber every column densely from its current order.
    ///
    /// Returns how many tickets changed position; saves only if any did.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn repair_order(&self) -> Result<usize> {
        let mut tickets = self.store.load()?;
        let changed = ops::renormalize_all(&mut tickets);
        if changed > 0 {
            self.store.save(&tickets)?;
            info!(changed, "repaired column order");
        }
        Ok(changed)
    }
}
