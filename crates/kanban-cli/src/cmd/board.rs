//! `kb board`: the six-column view with filters, search and per-column sort.

use crate::cmd::Context;
use crate::cmd::show::{write_line, write_row};
use crate::output::{pretty_section, render_mode};
use anyhow::{Result, anyhow};
use clap::Args;
use kanban_core::board::{AssigneeFilter, BoardQuery, Filters, SortMode};
use kanban_core::model::{Priority, Status};
use std::io::Write;

#[derive(Args, Debug)]
pub struct BoardArgs {
    /// Only tickets with this priority.
    #[arg(long)]
    pub priority: Option<Priority>,

    /// Only tickets assigned to this name; `unassigned` selects unassigned tickets.
    #[arg(long)]
    pub assignee: Option<String>,

    /// Only tickets in this sprint.
    #[arg(long)]
    pub sprint: Option<String>,

    /// Case-insensitive substring of title or description.
    #[arg(long, short = 'q', default_value = "")]
    pub search: String,

    /// Sort mode for every column, or `STATUS=MODE` for one column.
    /// Modes: order, priority-desc, priority-asc, created-desc, created-asc.
    #[arg(long, value_name = "[STATUS=]MODE", value_parser = parse_sort)]
    pub sort: Vec<SortSpec>,
}

/// One `--sort` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    /// `None` applies to every column.
    pub status: Option<Status>,
    pub mode: SortMode,
}

fn parse_sort(raw: &str) -> Result<SortSpec> {
    let (status, mode) = match raw.split_once('=') {
        Some((status, mode)) => (Some(status.parse::<Status>()?), mode),
        None => (None, raw),
    };
    let mode = mode
        .parse::<SortMode>()
        .map_err(|err| anyhow!("{err} (expected one of: {})", sort_modes()))?;
    Ok(SortSpec { status, mode })
}

fn sort_modes() -> String {
    SortMode::ALL
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl BoardArgs {
    /// Later `--sort` values override earlier ones for the same column.
    pub fn to_query(&self) -> BoardQuery {
        let mut query = BoardQuery {
            filters: Filters {
                priority: self.priority,
                assignee: self.assignee.as_deref().and_then(AssigneeFilter::parse),
                sprint: self.sprint.clone().filter(|s| !s.trim().is_empty()),
            },
            search: self.search.clone(),
            ..BoardQuery::default()
        };
        for spec in &self.sort {
            match spec.status {
                Some(status) => {
                    query.sort.insert(status, spec.mode);
                }
                None => {
                    for status in Status::ALL {
                        query.sort.insert(status, spec.mode);
                    }
                }
            }
        }
        query
    }
}

/// Execute `kb board`.
///
/// # Errors
///
/// Store or transport failures while loading the collection.
pub fn run_board(args: &BoardArgs, ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    let snapshot = client.snapshot();
    let board = snapshot.board(&args.to_query());

    render_mode(
        ctx.output,
        &board,
        |board, w| {
            for (status, column) in board.iter() {
                for t in column {
                    write_row(w, t)?;
                }
                if column.is_empty() {
                    writeln!(w, "# {status}: empty")?;
                }
            }
            Ok(())
        },
        |board, w| {
            for (status, column) in board.iter() {
                pretty_section(w, &format!("{status} ({})", column.len()))?;
                for t in column {
                    write_line(w, t)?;
                }
                writeln!(w)?;
            }
            Ok(())
        },
    )
}
