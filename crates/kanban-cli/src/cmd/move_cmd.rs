//! `kb move`: drag a ticket to another column or position.

use crate::backend::applied;
use crate::cmd::Context;
use crate::cmd::show::TicketRow;
use crate::output::render_item;
use anyhow::Result;
use clap::Args;
use kanban_core::model::Status;

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Ticket ID.
    pub id: String,

    /// Destination column, e.g. `todo`, `in-progress`, `review`, `qa`,
    /// `release`, `done`.
    pub to: Status,

    /// Zero-based position in the destination column. Appends when omitted;
    /// positions past the end are clamped.
    #[arg(long, short = 'i')]
    pub index: Option<usize>,
}

/// Execute `kb move`. Entering `Ready for Review` clears the assignee.
///
/// # Errors
///
/// `NotFound` for an unknown id and store or transport failures.
pub fn run_move(args: &MoveArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let ticket = applied(client.move_ticket(&args.id, args.to, args.index)?)?;
    render_item(&TicketRow(&ticket), ctx.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: MoveArgs,
    }

    #[test]
    fn accepts_slug_statuses() {
        let w = Wrapper::parse_from(["test", "4", "ready-for-qa", "-i", "0"]);
        assert_eq!(w.args.to, Status::ReadyForQa);
        assert_eq!(w.args.index, Some(0));

        let w = Wrapper::parse_from(["test", "4", "In Progress"]);
        assert_eq!(w.args.to, Status::InProgress);
        assert!(w.args.index.is_none());
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!(Wrapper::try_parse_from(["test", "4", "archived"]).is_err());
    }
}
