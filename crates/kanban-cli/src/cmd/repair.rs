use crate::backend::local_service;
use crate::cmd::Context;
use crate::output::render;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct RepairOutput {
    ok: bool,
    renumbered: usize,
}

/// Execute `kb repair`: renumber every column densely from its current
/// order. Files written by older tools can carry gaps or duplicates.
///
/// # Errors
///
/// `--server` was given, or the store cannot be read or written.
pub fn run_repair(ctx: &Context) -> Result<()> {
    ctx.require_local("repair")?;
    let service = local_service(&ctx.project_root, &ctx.project);
    let out = RepairOutput {
        ok: true,
        renumbered: service.repair_order()?,
    };
    render(ctx.output, &out, |out, w| {
        if out.renumbered == 0 {
            writeln!(w, "column order already dense")
        } else {
            writeln!(w, "renumbered {} ticket(s)", out.renumbered)
        }
    })
}
