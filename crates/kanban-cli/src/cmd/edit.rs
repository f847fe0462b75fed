use crate::backend::applied;
use crate::cmd::Context;
use crate::cmd::show::TicketDetail;
use crate::output::render_item;
use anyhow::{Result, bail};
use clap::Args;
use kanban_core::model::{Priority, Status, TicketPatch};

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Ticket ID.
    pub id: String,

    /// New title.
    #[arg(short, long)]
    pub title: Option<String>,

    /// New description.
    #[arg(short, long)]
    pub description: Option<String>,

    /// New status. The ticket goes to the end of that column.
    #[arg(long)]
    pub status: Option<Status>,

    /// New priority.
    #[arg(short, long)]
    pub priority: Option<Priority>,

    /// New assignee; an empty string unassigns.
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// New sprint label.
    #[arg(short, long)]
    pub sprint: Option<String>,
}

impl EditArgs {
    fn to_patch(&self) -> TicketPatch {
        TicketPatch {
            title: self.title.clone(),
            description: self.description.clone(),
            status: self.status,
            priority: self.priority,
            assignee: self.assignee.clone(),
            sprint: self.sprint.clone(),
        }
    }
}

/// Execute `kb edit`: a partial update. Order, comments and history are not
/// editable here.
///
/// # Errors
///
/// An empty edit, `NotFound`, validation and store or transport failures.
pub fn run_edit(args: &EditArgs, ctx: &Context) -> Result<()> {
    let patch = args.to_patch();
    if patch.is_empty() {
        bail!("nothing to change; pass at least one field flag");
    }
    let client = ctx.client()?;
    let ticket = applied(client.edit(&args.id, &patch)?)?;
    render_item(&TicketDetail(&ticket), ctx.output)?;
    Ok(())
}
