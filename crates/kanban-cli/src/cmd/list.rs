use crate::cmd::Context;
use crate::cmd::show::{TICKET_HEADERS, write_line, write_row};
use crate::output::{pretty_rule, render_mode};
use anyhow::Result;
use clap::Args;
use kanban_core::page::Page;
use kanban_core::sync::TicketApi;
use std::io::Write;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Page number, starting at 1.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Tickets per page. Defaults to the configured page limit.
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub limit: Option<u32>,
}

/// Execute `kb list`: one page of tickets in stored order.
///
/// # Errors
///
/// Store or transport failures.
pub fn run_list(args: &ListArgs, ctx: &Context) -> Result<()> {
    let limit = args
        .limit
        .map_or(ctx.project.server.page_limit, |l| l as usize);
    let page = ctx.api().list_page(args.page as usize, limit)?;

    render_mode(
        ctx.output,
        &page,
        |page, w| {
            if !page.tickets.is_empty() {
                writeln!(w, "{}", TICKET_HEADERS.join("\t"))?;
            }
            for t in &page.tickets {
                write_row(w, t)?;
            }
            Ok(())
        },
        |page, w| {
            for t in &page.tickets {
                write_line(w, t)?;
            }
            pretty_rule(w)?;
            writeln!(w, "{}", summary(page))
        },
    )
}

fn summary(page: &Page) -> String {
    if page.total == 0 {
        return "No tickets.".to_string();
    }
    format!(
        "Page {} of {} ({} tickets)",
        page.page,
        page.total_pages.max(1),
        page.total
    )
}
