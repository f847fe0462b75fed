use crate::backend::applied;
use crate::cmd::Context;
use crate::cmd::show::TicketDetail;
use crate::output::render_item;
use anyhow::Result;
use clap::Args;
use kanban_core::model::{NewTicket, Priority};
use tracing::info;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Ticket title.
    #[arg(short, long)]
    pub title: String,

    /// Ticket description.
    #[arg(short, long)]
    pub description: String,

    /// Priority: high, medium or low.
    #[arg(short, long)]
    pub priority: Option<Priority>,

    /// Initial assignee (must be on the roster).
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Sprint label. Defaults to the board's default sprint.
    #[arg(short, long)]
    pub sprint: Option<String>,
}

impl CreateArgs {
    fn to_new_ticket(&self) -> NewTicket {
        NewTicket {
            priority: self.priority,
            assignee: self.assignee.clone(),
            sprint: self.sprint.clone(),
            ..NewTicket::new(self.title.clone(), self.description.clone())
        }
    }
}

/// Execute `kb create`. New tickets land at the top of `ToDo`.
///
/// # Errors
///
/// Validation failures (blank title or description, assignee off the
/// roster) and store or transport failures.
pub fn run_create(args: &CreateArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let ticket = applied(client.create(&args.to_new_ticket())?)?;
    info!(id = %ticket.id, "created ticket");
    render_item(&TicketDetail(&ticket), ctx.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: CreateArgs,
    }

    #[test]
    fn parses_all_fields() {
        let w = Wrapper::parse_from([
            "test", "-t", "Fix bug", "-d", "desc", "-p", "high", "-a", "Alice", "-s", "Sprint 2",
        ]);
        let input = w.args.to_new_ticket();
        assert_eq!(input.title.as_deref(), Some("Fix bug"));
        assert_eq!(input.priority, Some(Priority::High));
        assert_eq!(input.assignee.as_deref(), Some("Alice"));
        assert_eq!(input.sprint.as_deref(), Some("Sprint 2"));
    }

    #[test]
    fn description_is_required() {
        assert!(Wrapper::try_parse_from(["test", "--title", "x"]).is_err());
    }

    #[test]
    fn bad_priority_is_rejected() {
        assert!(Wrapper::try_parse_from(["test", "-t", "x", "-d", "y", "-p", "urgent"]).is_err());
    }
}
