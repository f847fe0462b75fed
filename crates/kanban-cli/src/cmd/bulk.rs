//! `kb bulk`: apply one change to several tickets.
//!
//! Calls go out one id at a time, in the order given, with the configured
//! throttle between them. The first failure stops the run and the local view
//! is reloaded; ids before it stay applied and are named in the error.

use crate::backend::applied;
use crate::cmd::Context;
use crate::output::render;
use anyhow::Result;
use clap::{Args, Subcommand};
use kanban_core::model::Status;
use kanban_core::sync::Outcome;
use serde::Serialize;
use std::io::Write;
use tracing::warn;

#[derive(Args, Debug)]
pub struct BulkArgs {
    #[command(subcommand)]
    pub command: BulkCommand,
}

#[derive(Subcommand, Debug)]
pub enum BulkCommand {
    #[command(
        about = "Move tickets to the end of a column",
        after_help = "EXAMPLES:\n    kb bulk move done 3 4 7"
    )]
    Move {
        /// Destination column.
        to: Status,
        /// Ticket IDs.
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },

    #[command(
        about = "Assign tickets to one person",
        after_help = "EXAMPLES:\n    kb bulk assign Alice 3 4\n\n    # Unassign\n    kb bulk assign '' 3 4"
    )]
    Assign {
        /// Roster member; an empty string unassigns.
        assignee: String,
        /// Ticket IDs.
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },

    #[command(about = "Delete tickets", after_help = "EXAMPLES:\n    kb bulk delete 3 4")]
    Delete {
        /// Ticket IDs.
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },
}

#[derive(Debug, Serialize)]
struct BulkOutput<'a> {
    ok: bool,
    action: &'a str,
    applied: Vec<String>,
}

/// Unwrap a bulk outcome. A failure after some ids went through keeps the
/// typed error and names the ids that stay applied.
fn settle(action: &str, outcome: Outcome<Vec<String>>) -> Result<Vec<String>> {
    match outcome {
        Outcome::Reconciled { error, committed } if !committed.is_empty() => {
            warn!(action, applied = ?committed, "bulk stopped after partial success");
            Err(anyhow::Error::new(error).context(format!(
                "bulk {action} stopped; already applied: {}",
                committed.join(" ")
            )))
        }
        other => applied(other),
    }
}

/// Execute `kb bulk`.
///
/// # Errors
///
/// The first failing call, after the local view has been reloaded.
pub fn run_bulk(args: &BulkArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let (action, outcome) = match &args.command {
        BulkCommand::Move { to, ids } => ("move", client.bulk_move(ids, *to)?),
        BulkCommand::Assign { assignee, ids } => ("assign", client.bulk_assign(ids, assignee)?),
        BulkCommand::Delete { ids } => ("delete", client.bulk_delete(ids)?),
    };
    let out = BulkOutput {
        ok: true,
        action,
        applied: settle(action, outcome)?,
    };
    render(ctx.output, &out, |out, w| {
        writeln!(w, "{} {} ticket(s): {}", out.action, out.applied.len(), out.applied.join(" "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::CliError;
    use clap::Parser;
    use kanban_core::KanbanError;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: BulkArgs,
    }

    #[test]
    fn move_collects_ids() {
        let w = Wrapper::parse_from(["test", "move", "done", "1", "2", "3"]);
        match w.args.command {
            BulkCommand::Move { to, ids } => {
                assert_eq!(to, Status::Done);
                assert_eq!(ids, ["1", "2", "3"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn partial_failure_names_applied_ids() {
        let outcome = Outcome::Reconciled {
            error: KanbanError::not_found("7"),
            committed: vec!["3".to_string(), "4".to_string()],
        };
        let err = settle("move", outcome).expect_err("partial");
        assert!(matches!(
            err.downcast_ref::<KanbanError>(),
            Some(KanbanError::NotFound { .. })
        ));
        let cli = CliError::from(&err);
        assert_eq!(cli.error_code.as_deref(), Some("E2001"));
        assert!(cli.message.contains("already applied: 3 4"));
    }

    #[test]
    fn failure_before_any_id_is_the_plain_error() {
        let outcome = Outcome::Reconciled {
            error: KanbanError::not_found("3"),
            committed: Vec::new(),
        };
        let err = settle("delete", outcome).expect_err("failed");
        assert_eq!(CliError::from(&err).message, "ticket '3' not found");
        assert_eq!(
            settle("delete", Outcome::Applied(vec!["1".into()])).expect("applied"),
            ["1"]
        );
    }

    #[test]
    fn ids_are_required() {
        assert!(Wrapper::try_parse_from(["test", "delete"]).is_err());
        assert!(Wrapper::try_parse_from(["test", "assign", "Alice"]).is_err());
    }
}
