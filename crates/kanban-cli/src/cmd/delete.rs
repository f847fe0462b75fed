use crate::backend::applied;
use crate::cmd::Context;
use crate::output::render;
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Ticket ID.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct DeleteOutput<'a> {
    ok: bool,
    deleted: &'a str,
}

/// Execute `kb delete`. The rest of the column closes the gap.
///
/// # Errors
///
/// `NotFound` and store or transport failures.
pub fn run_delete(args: &DeleteArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    applied(client.delete(&args.id)?)?;
    let out = DeleteOutput {
        ok: true,
        deleted: &args.id,
    };
    render(ctx.output, &out, |out, w| writeln!(w, "deleted #{}", out.deleted))
}
