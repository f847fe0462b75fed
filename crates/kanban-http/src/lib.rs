//! HTTP transport for the kanban ticket service.
//!
//! [`Server`] exposes a [`kanban_core::TicketService`] over JSON; [`HttpApi`]
//! is the matching [`kanban_core::sync::TicketApi`] for a remote client.

mod client;
mod server;
pub mod wire;

pub use client::HttpApi;
pub use server::{Reply, Server, ServerError};
