use crate::backend::applied;
use crate::cmd::Context;
use crate::cmd::show::TicketRow;
use crate::output::render_item;
use anyhow::{Result, bail};
use clap::Args;

#[derive(Args, Debug)]
pub struct AssignArgs {
    /// Ticket ID.
    pub id: String,

    /// Roster member to assign.
    #[arg(value_name = "ASSIGNEE", required_unless_present = "clear")]
    pub assignee: Option<String>,

    /// Unassign the ticket instead.
    #[arg(long, conflicts_with = "assignee")]
    pub clear: bool,
}

impl AssignArgs {
    /// The stored form: empty for unassigned.
    fn target(&self) -> Result<String> {
        match (&self.assignee, self.clear) {
            (_, true) => Ok(String::new()),
            (Some(name), false) => Ok(name.clone()),
            (None, false) => bail!("an assignee or --clear is required"),
        }
    }
}

/// Execute `kb assign`.
///
/// # Errors
///
/// `NotFound`, a name outside the roster, and store or transport failures.
pub fn run_assign(args: &AssignArgs, ctx: &Context) -> Result<()> {
    let target = args.target()?;
    let client = ctx.client()?;
    let ticket = applied(client.assign(&args.id, &target)?)?;
    render_item(&TicketRow(&ticket), ctx.output)?;
    Ok(())
}
