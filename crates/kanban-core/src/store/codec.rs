//! Tab-separated ticket file format.
//!
//! ```text
//! # kanban tickets v1
//! # fields: id \t title \t description \t status \t priority \t assignee \t sprint \t order \t createdAt \t updatedAt \t comments \t history
//! "1"\t"Fix bug"\t"desc"\tToDo\tMedium\t""\t"Sprint 1"\t0\t2024-01-01T00:00:00.000Z\t...\t[]\t[{"action":"Created",...}]
//! ```
//!
//! - Free-text columns are JSON string literals, so tabs and newlines inside
//!   them are escaped and every record stays on one line.
//! - `comments` and `history` are compact JSON arrays.
//! - Blank lines and `#` lines are skipped on read.
//! - Timestamps are written at millisecond precision; finer precision in an
//!   external file is truncated when it is read.

use std::fmt::Write as _;

use crate::model::{Comment, HistoryEntry, Ticket, millis};

/// Header line written at the top of every tickets file.
pub const FILE_HEADER: &str = "# kanban tickets v1";

/// Field comment written after the header.
pub const FIELD_COMMENT: &str = "# fields: id\ttitle\tdescription\tstatus\tpriority\tassignee\tsprint\torder\tcreatedAt\tupdatedAt\tcomments\thistory";

/// Format version understood by this build.
pub const CURRENT_VERSION: u32 = 1;

const HEADER_PREFIX: &str = "# kanban tickets v";
const FIELD_COUNT: usize = 12;

/// Errors from decoding one line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("expected {expected} tab-separated fields, found {found}")]
    FieldCount { found: usize, expected: usize },

    #[error("invalid {field}: {detail}")]
    InvalidField { field: &'static str, detail: String },

    #[error("file format v{found} is newer than supported v{supported}")]
    VersionMismatch { found: u32, supported: u32 },
}

fn invalid(field: &'static str, detail: impl ToString) -> DecodeError {
    DecodeError::InvalidField {
        field,
        detail: detail.to_string(),
    }
}

fn quote(s: &str) -> serde_json::Result<String> {
    serde_json::to_string(s)
}

/// Encode one ticket as a single line (no trailing newline).
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if a nested list fails to serialize.
pub fn encode_ticket(ticket: &Ticket) -> serde_json::Result<String> {
    Ok([
        quote(&ticket.id)?,
        quote(&ticket.title)?,
        quote(&ticket.description)?,
        ticket.status.as_str().to_string(),
        ticket.priority.as_str().to_string(),
        quote(&ticket.assignee)?,
        quote(&ticket.sprint)?,
        ticket.order.to_string(),
        millis::format(&ticket.created_at),
        millis::format(&ticket.updated_at),
        serde_json::to_string(&ticket.comments)?,
        serde_json::to_string(&ticket.history)?,
    ]
    .join("\t"))
}

/// Encode a whole collection, header included.
///
/// # Errors
///
/// Same as [`encode_ticket`].
pub fn encode_file(tickets: &[Ticket]) -> serde_json::Result<String> {
    let mut out = format!("{FILE_HEADER}\n{FIELD_COMMENT}\n");
    for ticket in tickets {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{}", encode_ticket(ticket)?);
    }
    Ok(out)
}

fn unquote(field: &'static str, raw: &str) -> Result<String, DecodeError> {
    serde_json::from_str::<String>(raw).map_err(|e| invalid(field, e))
}

/// Decode one data line.
///
/// # Errors
///
/// Returns a [`DecodeError`] naming the first offending field.
pub fn decode_ticket(line: &str) -> Result<Ticket, DecodeError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != FIELD_COUNT {
        return Err(DecodeError::FieldCount {
            found: fields.len(),
            expected: FIELD_COUNT,
        });
    }

    let ts = |field: &'static str, raw: &str| millis::parse(raw).map_err(|e| invalid(field, e));

    Ok(Ticket {
        id: unquote("id", fields[0])?,
        title: unquote("title", fields[1])?,
        description: unquote("description", fields[2])?,
        status: fields[3].parse().map_err(|e| invalid("status", e))?,
        priority: fields[4].parse().map_err(|e| invalid("priority", e))?,
        assignee: unquote("assignee", fields[5])?,
        sprint: unquote("sprint", fields[6])?,
        order: fields[7].parse().map_err(|e| invalid("order", e))?,
        created_at: ts("createdAt", fields[8])?,
        updated_at: ts("updatedAt", fields[9])?,
        comments: decode_list::<Comment>("comments", fields[10])?,
        history: decode_list::<HistoryEntry>("history", fields[11])?,
    })
}

fn decode_list<T: serde::de::DeserializeOwned>(
    field: &'static str,
    raw: &str,
) -> Result<Vec<T>, DecodeError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|e| invalid(field, e))
}

/// Reject files written by a newer format version.
fn check_header(line: &str) -> Result<(), DecodeError> {
    let Some(rest) = line.strip_prefix(HEADER_PREFIX) else {
        return Ok(());
    };
    let found: u32 = rest
        .trim()
        .parse()
        .map_err(|e| invalid("header", format!("bad version '{rest}': {e}")))?;
    if found > CURRENT_VERSION {
        return Err(DecodeError::VersionMismatch {
            found,
            supported: CURRENT_VERSION,
        });
    }
    Ok(())
}

/// Decode a whole file. Errors carry the 1-based line number.
///
/// # Errors
///
/// Returns `(line, error)` for the first line that fails to decode.
pub fn decode_file(content: &str) -> Result<Vec<Ticket>, (usize, DecodeError)> {
    let mut tickets = Vec::new();
    for (i, line) in content.lines().enumerate() {
        let line_no = i + 1;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with('#') {
            check_header(line).map_err(|e| (line_no, e))?;
            continue;
        }
        tickets.push(decode_ticket(line).map_err(|e| (line_no, e))?);
    }
    Ok(tickets)
}
