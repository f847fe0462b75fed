//! Client-side view of the board and its reconciliation with the service.

mod api;
mod client;
mod snapshot;

pub use api::{LocalApi, TicketApi};
pub use client::{Outcome, SyncClient};
pub use snapshot::Snapshot;
