//! kanban-core library.
//!
//! # Conventions
//!
//! - **Errors**: library functions return [`Result`] with a typed
//!   [`KanbanError`]; binaries wrap them in `anyhow` at the edge.
//! - **Logging**: use `tracing` macros (`info!` per committed mutation,
//!   `debug!` for store I/O, `warn!` when a client reconciles).

pub mod board;
pub mod config;
pub mod error;
pub mod model;
pub mod ops;
pub mod page;
pub mod service;
pub mod store;
pub mod sync;
pub mod transition;

pub use error::{ErrorCode, KanbanError, Result};
pub use model::{MoveRequest, NewTicket, Priority, Status, Ticket, TicketPatch};
pub use service::{BulkOutcome, TicketService};
pub use store::{FileStore, MemoryStore, TicketStore};
