//! `kb show` and the ticket renderers the other commands share.

use crate::cmd::Context;
use crate::output::{Renderable, pretty_kv, pretty_rule, pretty_section, render_item};
use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use clap::Args;
use kanban_core::model::{Ticket, millis};
use kanban_core::sync::TicketApi;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Ticket ID.
    pub id: String,
}

/// One ticket rendered as a text row or a short pretty line.
pub struct TicketRow<'a>(pub &'a Ticket);

/// One ticket with its comments and history.
pub struct TicketDetail<'a>(pub &'a Ticket);

pub const TICKET_HEADERS: &[&str] = &["ID", "STATUS", "PRIORITY", "ASSIGNEE", "SPRINT", "TITLE"];

/// Tab-separated row, matching [`TICKET_HEADERS`].
pub fn write_row(w: &mut dyn Write, t: &Ticket) -> io::Result<()> {
    writeln!(
        w,
        "{}\t{}\t{}\t{}\t{}\t{}",
        t.id,
        t.status,
        t.priority,
        t.assignee_display(),
        t.sprint,
        t.title
    )
}

/// `#id  [priority]  title  (assignee)` for pretty listings.
pub fn write_line(w: &mut dyn Write, t: &Ticket) -> io::Result<()> {
    writeln!(
        w,
        "  #{:<4} [{:<6}] {}  ({})",
        t.id,
        t.priority,
        t.title,
        t.assignee_display()
    )
}

/// Local wall-clock time for pretty output.
fn local(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn write_json(w: &mut dyn Write, t: &Ticket) -> io::Result<()> {
    serde_json::to_writer(&mut *w, t)?;
    writeln!(w)
}

impl Renderable for TicketRow<'_> {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        write_line(w, self.0)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        write_json(w, self.0)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        write_row(w, self.0)
    }
}

impl Renderable for TicketDetail<'_> {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        let t = self.0;
        pretty_section(w, &format!("#{} {}", t.id, t.title))?;
        pretty_kv(w, "Status", t.status.as_str())?;
        pretty_kv(w, "Priority", t.priority.as_str())?;
        pretty_kv(w, "Assignee", t.assignee_display())?;
        pretty_kv(w, "Sprint", &t.sprint)?;
        pretty_kv(w, "Position", t.order.to_string())?;
        pretty_kv(w, "Created", local(&t.created_at))?;
        pretty_kv(w, "Updated", local(&t.updated_at))?;
        writeln!(w)?;
        writeln!(w, "{}", t.description)?;

        if !t.comments.is_empty() {
            writeln!(w)?;
            pretty_section(w, &format!("Comments ({})", t.comments.len()))?;
            for c in &t.comments {
                writeln!(w, "  {}  {}", local(&c.timestamp), c.text)?;
            }
        }

        writeln!(w)?;
        pretty_section(w, "History")?;
        for h in &t.history {
            writeln!(w, "  {}  {}", local(&h.timestamp), h.action)?;
        }
        pretty_rule(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        write_json(w, self.0)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        let t = self.0;
        write_row(w, t)?;
        for c in &t.comments {
            writeln!(w, "comment\t{}\t{}", millis::format(&c.timestamp), c.text)?;
        }
        for h in &t.history {
            writeln!(w, "history\t{}\t{}", millis::format(&h.timestamp), h.action)?;
        }
        Ok(())
    }
}

/// Execute `kb show`.
///
/// # Errors
///
/// `NotFound` for an unknown id, or any store/transport failure.
pub fn run_show(args: &ShowArgs, ctx: &Context) -> Result<()> {
    let ticket = ctx.api().get(&args.id)?;
    render_item(&TicketDetail(&ticket), ctx.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kanban_core::model::{NewTicket, now};
    use kanban_core::ops::{self, BoardRules};

    fn ticket() -> Ticket {
        let mut tickets = Vec::new();
        ops::create(&mut tickets, &NewTicket::new("Fix bug", "it breaks"), &BoardRules::default(), now())
            .expect("create");
        ops::add_comment(&mut tickets, "1", "on it", now()).expect("comment");
        tickets.remove(0)
    }

    fn capture(f: impl FnOnce(&mut dyn Write) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn row_matches_headers() {
        let t = ticket();
        let row = capture(|w| TicketRow(&t).render_table(w));
        assert_eq!(row.trim_end().split('\t').count(), TICKET_HEADERS.len());
        assert!(row.starts_with("1\tToDo\tMedium\tUnassigned\tSprint 1\tFix bug"));
    }

    #[test]
    fn detail_lists_comments_and_history() {
        let t = ticket();
        let pretty = capture(|w| TicketDetail(&t).render_human(w));
        assert!(pretty.contains("#1 Fix bug"));
        assert!(pretty.contains("Comments (1)"));
        assert!(pretty.contains("on it"));
        assert!(pretty.contains("Created"));

        let text = capture(|w| TicketDetail(&t).render_table(w));
        assert!(text.lines().any(|l| l.starts_with("comment\t")));
        assert!(text.lines().any(|l| l.starts_with("history\t") && l.ends_with("Created")));
    }

    #[test]
    fn show_args_parse() {
        use clap::Parser;

        #[derive(Parser)]
        struct Wrapper {
            #[command(flatten)]
            args: ShowArgs,
        }

        let w = Wrapper::parse_from(["test", "12"]);
        assert_eq!(w.args.id, "12");
    }
}
