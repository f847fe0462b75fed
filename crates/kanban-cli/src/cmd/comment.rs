use crate::backend::applied;
use crate::cmd::Context;
use crate::cmd::show::TicketDetail;
use crate::output::render_item;
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct CommentArgs {
    /// Ticket ID.
    pub id: String,

    /// Comment text.
    pub text: String,
}

/// Execute `kb comment`.
///
/// # Errors
///
/// Blank text, `NotFound` and store or transport failures.
pub fn run_comment(args: &CommentArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let ticket = applied(client.add_comment(&args.id, &args.text)?)?;
    render_item(&TicketDetail(&ticket), ctx.output)?;
    Ok(())
}
