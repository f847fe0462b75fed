//! Optimistic client over a [`TicketApi`].
//!
//! Each intent publishes its expected result locally before the service
//! call, then either trusts it or replaces it with a full reload. There is no
//! rollback: any failure is resolved by refetching the authoritative
//! collection.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::api::TicketApi;
use super::snapshot::Snapshot;
use crate::config::SyncConfig;
use crate::error::{KanbanError, Result};
use crate::model::{MoveRequest, NewTicket, Status, Ticket, TicketPatch, now};
use crate::ops::{self, BoardRules};

/// What happened to an intent that passed local validation.
#[derive(Debug)]
pub enum Outcome<T> {
    /// Every service call succeeded.
    Applied(T),
    /// Another intent was in flight; nothing was done.
    Rejected,
    /// A service call failed and the local view was refetched.
    Reconciled {
        error: KanbanError,
        /// Ids whose calls were accepted before the failure. Only bulk
        /// intents fill this in.
        committed: Vec<String>,
    },
}

impl<T> Outcome<T> {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    #[must_use]
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }

    /// The applied value, if any.
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Rejected | Self::Reconciled { .. } => None,
        }
    }

    fn with_committed(self, committed: Vec<String>) -> Self {
        match self {
            Self::Reconciled { error, .. } => Self::Reconciled { error, committed },
            other => other,
        }
    }
}

/// How the local view settles after the service accepted an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Settle {
    /// Trust the optimistic view, adopting any record the service returned.
    Keep,
    /// Replace the view with a full reload.
    Reload,
}

/// Service responses that carry an authoritative record.
trait Returned {
    fn record(&self) -> Option<&Ticket> {
        None
    }
}

impl Returned for Ticket {
    fn record(&self) -> Option<&Ticket> {
        Some(self)
    }
}

impl Returned for () {}

impl Returned for Vec<String> {}

/// Releases the busy gate when dropped.
struct BusyGuard<'a> {
    busy: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

pub struct SyncClient<A> {
    api: A,
    rules: BoardRules,
    throttle: Duration,
    page_size: usize,
    snapshot: Mutex<Arc<Snapshot>>,
    busy: AtomicBool,
    loading: AtomicBool,
    last_error: Mutex<Option<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<A: TicketApi> SyncClient<A> {
    pub fn new(api: A, rules: BoardRules) -> Self {
        let defaults = SyncConfig::default();
        Self {
            api,
            rules,
            throttle: defaults.throttle(),
            page_size: defaults.page_size,
            snapshot: Mutex::new(Arc::new(Snapshot::default())),
            busy: AtomicBool::new(false),
            loading: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: &SyncConfig) -> Self {
        self.throttle = config.throttle();
        self.page_size = config.page_size.max(1);
        self
    }

    #[must_use]
    pub const fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    pub const fn api(&self) -> &A {
        &self.api
    }

    /// The current view. Holding it does not block later updates.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&lock(&self.snapshot))
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Message of the most recent failure, cleared when the next intent starts.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.last_error).clone()
    }

    fn set_error(&self, message: Option<String>) {
        *lock(&self.last_error) = message;
    }

    fn try_begin(&self) -> Option<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard { busy: &self.busy })
    }

    fn publish(&self, tickets: Vec<Ticket>) -> u64 {
        let mut current = lock(&self.snapshot);
        let next = Arc::new(current.succeed(tickets));
        let version = next.version();
        *current = next;
        version
    }

    fn adopt(&self, record: &Ticket) {
        let mut tickets = self.snapshot().tickets().to_vec();
        if let Some(slot) = tickets.iter_mut().find(|t| t.id == record.id) {
            slot.clone_from(record);
            self.publish(tickets);
        }
    }

    fn refresh(&self) -> Result<()> {
        let tickets = self.api.fetch_all(self.page_size)?;
        let count = tickets.len();
        let version = self.publish(tickets);
        debug!(count, version, "reloaded collection");
        Ok(())
    }

    /// Fetch the whole collection and replace the local view.
    ///
    /// # Errors
    ///
    /// The fetch failure, also recorded as the last error. The previous
    /// view is kept.
    pub fn load(&self) -> Result<Outcome<()>> {
        let Some(_guard) = self.try_begin() else {
            return Ok(Outcome::Rejected);
        };
        self.set_error(None);
        self.loading.store(true, Ordering::Release);
        let result = self.refresh();
        self.loading.store(false, Ordering::Release);
        match result {
            Ok(()) => Ok(Outcome::Applied(())),
            Err(err) => {
                self.set_error(Some(err.to_string()));
                Err(err)
            }
        }
    }

    fn reconcile<T>(&self, kind: &'static str, before: &Snapshot, error: KanbanError) -> Outcome<T> {
        warn!(kind, error = %error, "service call failed, reloading");
        self.set_error(Some(error.to_string()));
        if let Err(reload) = self.refresh() {
            warn!(kind, error = %reload, "reload failed, restoring pre-intent view");
            self.publish(before.tickets().to_vec());
        }
        Outcome::Reconciled {
            error,
            committed: Vec::new(),
        }
    }

    /// Gate, publish the optimistic view, call the service, settle.
    fn run<P, T: Returned>(
        &self,
        kind: &'static str,
        optimistic: impl FnOnce(&mut Vec<Ticket>) -> Result<(Settle, P)>,
        remote: impl FnOnce(P) -> Result<T>,
    ) -> Result<Outcome<T>> {
        let Some(_guard) = self.try_begin() else {
            debug!(kind, "intent rejected, another is in flight");
            return Ok(Outcome::Rejected);
        };
        self.set_error(None);

        let before = self.snapshot();
        let mut next = before.tickets().to_vec();
        let (settle, plan) = optimistic(&mut next)?;
        let version = self.publish(next);
        debug!(kind, version, "published optimistic view");

        match remote(plan) {
            Ok(value) => {
                match settle {
                    Settle::Reload => {
                        if let Err(err) = self.refresh() {
                            warn!(kind, error = %err, "reload after success failed");
                            self.set_error(Some(err.to_string()));
                        }
                    }
                    Settle::Keep => {
                        if let Some(record) = value.record() {
                            self.adopt(record);
                        }
                    }
                }
                info!(kind, "intent applied");
                Ok(Outcome::Applied(value))
            }
            Err(error) => Ok(self.reconcile(kind, &before, error)),
        }
    }

    /// Run `call` for each id in order, pausing between calls. Stops at the
    /// first failure. Accepted ids are recorded in `done`.
    fn each<F: FnMut(&str) -> Result<()>>(
        &self,
        ids: &[String],
        done: &mut Vec<String>,
        mut call: F,
    ) -> Result<Vec<String>> {
        for (n, id) in ids.iter().enumerate() {
            if n > 0 && !self.throttle.is_zero() {
                thread::sleep(self.throttle);
            }
            call(id).inspect_err(|err| {
                warn!(id = %id, applied = done.len(), error = %err, "bulk call failed, stopping");
            })?;
            done.push(id.clone());
        }
        Ok(done.clone())
    }

    /// # Errors
    ///
    /// Local validation failures, before any service call.
    pub fn create(&self, input: &NewTicket) -> Result<Outcome<Ticket>> {
        self.run(
            "create",
            |tickets| {
                ops::create(tickets, input, &self.rules, now())?;
                Ok((Settle::Reload, ()))
            },
            |()| self.api.create(input),
        )
    }

    /// Move `id` to `to_index` of `to` (end of column when `None`).
    ///
    /// The source position comes from the current view.
    ///
    /// # Errors
    ///
    /// `NotFound` for an id missing from the view.
    pub fn move_ticket(
        &self,
        id: &str,
        to: Status,
        to_index: Option<usize>,
    ) -> Result<Outcome<Ticket>> {
        self.run(
            "move",
            |tickets| {
                let idx = ops::position(tickets, id)?;
                let from = tickets[idx].status;
                let from_index = ops::column(tickets, from)
                    .iter()
                    .position(|&i| i == idx)
                    .unwrap_or_default();
                let req = MoveRequest {
                    from,
                    to,
                    from_index,
                    to_index,
                };
                ops::move_ticket(tickets, id, &req, now())?;
                let settle = if req.is_cross_column() {
                    Settle::Reload
                } else {
                    Settle::Keep
                };
                Ok((settle, req))
            },
            |req| self.api.move_ticket(id, &req),
        )
    }

    /// # Errors
    ///
    /// `NotFound` or a roster violation, before any service call.
    pub fn assign(&self, id: &str, assignee: &str) -> Result<Outcome<Ticket>> {
        self.edit(id, &TicketPatch::assignee(assignee))
    }

    /// # Errors
    ///
    /// `NotFound` or validation failures, before any service call.
    pub fn edit(&self, id: &str, patch: &TicketPatch) -> Result<Outcome<Ticket>> {
        self.run(
            "edit",
            |tickets| {
                let idx = ops::position(tickets, id)?;
                let moves = patch.status.is_some_and(|s| s != tickets[idx].status);
                ops::edit(tickets, id, patch, &self.rules, now())?;
                Ok((if moves { Settle::Reload } else { Settle::Keep }, ()))
            },
            |()| self.api.update(id, patch),
        )
    }

    /// # Errors
    ///
    /// Blank text or `NotFound`, before any service call.
    pub fn add_comment(&self, id: &str, text: &str) -> Result<Outcome<Ticket>> {
        self.run(
            "comment",
            |tickets| {
                ops::add_comment(tickets, id, text, now())?;
                Ok((Settle::Keep, ()))
            },
            |()| self.api.add_comment(id, text),
        )
    }

    /// # Errors
    ///
    /// `NotFound`, before any service call.
    pub fn delete(&self, id: &str) -> Result<Outcome<()>> {
        self.run(
            "delete",
            |tickets| {
                ops::delete(tickets, id)?;
                Ok((Settle::Keep, ()))
            },
            |()| self.api.delete(id),
        )
    }

    /// Move every id to the end of `to`, one service call per id.
    ///
    /// # Errors
    ///
    /// The first id that fails locally, before any service call.
    pub fn bulk_move(&self, ids: &[String], to: Status) -> Result<Outcome<Vec<String>>> {
        let patch = TicketPatch {
            status: Some(to),
            ..TicketPatch::default()
        };
        self.bulk_update("bulk-move", ids, &patch)
    }

    /// # Errors
    ///
    /// The first id that fails locally, before any service call.
    pub fn bulk_assign(&self, ids: &[String], assignee: &str) -> Result<Outcome<Vec<String>>> {
        self.bulk_update("bulk-assign", ids, &TicketPatch::assignee(assignee))
    }

    fn bulk_update(
        &self,
        kind: &'static str,
        ids: &[String],
        patch: &TicketPatch,
    ) -> Result<Outcome<Vec<String>>> {
        let mut committed = Vec::with_capacity(ids.len());
        let outcome = self.run(
            kind,
            |tickets| {
                let at = now();
                for id in ids {
                    ops::edit(tickets, id, patch, &self.rules, at)?;
                }
                Ok((Settle::Reload, ()))
            },
            |()| self.each(ids, &mut committed, |id| self.api.update(id, patch).map(drop)),
        )?;
        Ok(outcome.with_committed(committed))
    }

    /// # Errors
    ///
    /// The first id missing from the view, before any service call.
    pub fn bulk_delete(&self, ids: &[String]) -> Result<Outcome<Vec<String>>> {
        let mut committed = Vec::with_capacity(ids.len());
        let outcome = self.run(
            "bulk-delete",
            |tickets| {
                for id in ids {
                    ops::delete(tickets, id)?;
                }
                Ok((Settle::Reload, ()))
            },
            |()| self.each(ids, &mut committed, |id| self.api.delete(id)),
        )?;
        Ok(outcome.with_committed(committed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::TicketService;
    use crate::store::MemoryStore;
    use crate::sync::api::LocalApi;

    fn client() -> SyncClient<LocalApi<MemoryStore>> {
        let api = LocalApi::new(TicketService::new(MemoryStore::new(), BoardRules::default()));
        SyncClient::new(api, BoardRules::default()).with_throttle(Duration::ZERO)
    }

    #[test]
    fn create_reloads_with_server_ids() {
        let client = client();
        let created = client
            .create(&NewTicket::new("a", "b"))
            .expect("create")
            .applied()
            .expect("applied");
        let snap = client.snapshot();
        assert_eq!(snap.tickets().len(), 1);
        assert_eq!(snap.tickets()[0], created);
        assert!(!client.is_busy());
    }

    #[test]
    fn local_failure_makes_no_call_and_keeps_view() {
        let client = client();
        client.load().expect("load");
        let before = client.snapshot();
        let err = client.assign("9", "Alice").expect_err("unknown id");
        assert!(matches!(err, KanbanError::NotFound { .. }));
        assert_eq!(client.snapshot().version(), before.version());
        assert!(!client.is_busy());
    }

    #[test]
    fn held_gate_rejects_intents() {
        let client = client();
        let guard = client.try_begin().expect("gate free");
        assert!(client.create(&NewTicket::new("a", "b")).expect("create").is_rejected());
        assert!(client.load().expect("load").is_rejected());
        drop(guard);
        assert!(client.create(&NewTicket::new("a", "b")).expect("create").is_applied());
    }

    #[test]
    fn comment_adopts_server_record() {
        let client = client();
        client.create(&NewTicket::new("a", "b")).expect("create");
        let out = client.add_comment("1", "hello").expect("comment");
        let server = out.applied().expect("applied");
        assert_eq!(client.snapshot().get("1"), Some(&server));
    }
}
