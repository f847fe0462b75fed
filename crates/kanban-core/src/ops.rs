//! Pure mutations over a whole ticket collection.
//!
//! Each function takes the current collection and returns (in place) the
//! next one. The service wraps them in load/save, and the sync client runs
//! the very same functions against its local snapshot to compute optimistic
//! state, so both sides agree on ordering and side effects.
//!
//! Every function that changes column membership renumbers the affected
//! columns so that each column's `order` values are exactly `0..n`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::error::{KanbanError, Result};
use crate::model::{
    Comment, HistoryEntry, MoveRequest, NewTicket, Status, Ticket, TicketPatch,
};
use crate::transition::{enter_status, record_changes};

/// Rules the service enforces beyond the data model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardRules {
    /// Allowed assignees. Empty accepts any name.
    pub roster: Vec<String>,
    /// Sprint label given to tickets created without one.
    pub default_sprint: String,
}

impl Default for BoardRules {
    fn default() -> Self {
        Self {
            roster: ["Alice", "Bob", "Charlie", "Diana"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_sprint: "Sprint 1".to_string(),
        }
    }
}

impl BoardRules {
    /// Accept `""` (unassigned) or a roster member.
    ///
    /// # Errors
    ///
    /// Returns [`KanbanError::Validation`] for a name outside the roster.
    pub fn check_assignee(&self, assignee: &str) -> Result<()> {
        if assignee.is_empty()
            || self.roster.is_empty()
            || self.roster.iter().any(|member| member == assignee)
        {
            return Ok(());
        }
        Err(KanbanError::validation(
            "assignee",
            format!(
                "'{assignee}' is not on the roster ({})",
                self.roster.join(", ")
            ),
        ))
    }
}

/// Index of the ticket with `id`.
///
/// # Errors
///
/// Returns [`KanbanError::NotFound`] when absent.
pub fn position(tickets: &[Ticket], id: &str) -> Result<usize> {
    tickets
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| KanbanError::not_found(id))
}

/// Collection indices of the tickets in `status`, in column order.
///
/// Ties in `order` (legacy data) keep collection order.
#[must_use]
pub fn column(tickets: &[Ticket], status: Status) -> Vec<usize> {
    let mut indices: Vec<usize> = tickets
        .iter()
        .enumerate()
        .filter(|(_, t)| t.status == status)
        .map(|(i, _)| i)
        .collect();
    indices.sort_by_key(|&i| tickets[i].order);
    indices
}

/// Assign `order = rank` along `column`. Returns how many orders changed.
fn renumber(tickets: &mut [Ticket], column: &[usize]) -> usize {
    let mut changed = 0;
    for (rank, &i) in column.iter().enumerate() {
        if tickets[i].order != rank {
            tickets[i].order = rank;
            changed += 1;
        }
    }
    changed
}

/// Renumber every column from its current column order.
pub fn renormalize_all(tickets: &mut [Ticket]) -> usize {
    Status::ALL
        .into_iter()
        .map(|status| {
            let col = column(tickets, status);
            renumber(tickets, &col)
        })
        .sum()
}

/// A column whose `order` values are not exactly `0..n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderViolation {
    pub status: Status,
    pub orders: Vec<usize>,
}

/// Check the dense per-column order invariant.
///
/// # Errors
///
/// Returns the first column that violates it.
pub fn check_order(tickets: &[Ticket]) -> Result<(), OrderViolation> {
    for status in Status::ALL {
        let mut orders: Vec<usize> = tickets
            .iter()
            .filter(|t| t.status == status)
            .map(|t| t.order)
            .collect();
        orders.sort_unstable();
        if orders.iter().enumerate().any(|(rank, &order)| rank != order) {
            return Err(OrderViolation { status, orders });
        }
    }
    Ok(())
}

/// Next id: one past the largest numeric id (ids are never reused while a
/// higher one exists). When the largest id is `u64::MAX` the smallest free
/// id is taken instead.
#[must_use]
pub fn next_id(tickets: &[Ticket]) -> String {
    let taken: BTreeSet<u64> = tickets
        .iter()
        .filter_map(|t| t.id.parse::<u64>().ok())
        .collect();
    taken
        .last()
        .map_or(Some(1), |max| max.checked_add(1))
        .or_else(|| (1..u64::MAX).find(|n| !taken.contains(n)))
        .unwrap_or_default()
        .to_string()
}

fn required(field: &'static str, value: Option<&str>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.to_string()),
        Some(_) => Err(KanbanError::validation(field, "must not be blank")),
        None => Err(KanbanError::validation(field, "is required")),
    }
}

fn non_blank(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(KanbanError::validation(field, "must not be blank"));
    }
    Ok(())
}

/// Insert a new ticket at the head of the first column.
///
/// Returns the index of the new ticket.
///
/// # Errors
///
/// Returns [`KanbanError::Validation`] when title or description is missing
/// or blank, or the assignee is not on the roster.
pub fn create(
    tickets: &mut Vec<Ticket>,
    input: &NewTicket,
    rules: &BoardRules,
    at: DateTime<Utc>,
) -> Result<usize> {
    let title = required("title", input.title.as_deref())?;
    let description = required("description", input.description.as_deref())?;
    let assignee = input.assignee.clone().unwrap_or_default();
    rules.check_assignee(&assignee)?;
    let sprint = input
        .sprint
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| rules.default_sprint.clone());

    let mut head = column(tickets, Status::FIRST);
    let ticket = Ticket {
        id: next_id(tickets),
        title,
        description,
        status: Status::FIRST,
        priority: input.priority.unwrap_or_default(),
        assignee,
        sprint,
        order: 0,
        created_at: at,
        updated_at: at,
        comments: Vec::new(),
        history: vec![HistoryEntry::new("Created", at)],
    };
    tickets.push(ticket);
    let idx = tickets.len() - 1;
    head.insert(0, idx);
    renumber(tickets, &head);
    Ok(idx)
}

/// Move ticket `id` from one column position to another.
///
/// `from_index` is where the caller saw the ticket; if that slot now holds a
/// different ticket the ticket's actual position wins. `to_index` is clamped
/// to the destination length, and `None` appends.
///
/// Returns the index of the moved ticket.
///
/// # Errors
///
/// - [`KanbanError::NotFound`] if `id` is absent.
/// - [`KanbanError::Validation`] if the ticket is not in `req.from` or
///   `from_index` is outside the source column.
pub fn move_ticket(
    tickets: &mut [Ticket],
    id: &str,
    req: &MoveRequest,
    at: DateTime<Utc>,
) -> Result<usize> {
    let idx = position(tickets, id)?;
    if tickets[idx].status != req.from {
        return Err(KanbanError::validation(
            "from",
            format!(
                "ticket '{id}' is in '{}', not '{}'",
                tickets[idx].status, req.from
            ),
        ));
    }

    let mut source = column(tickets, req.from);
    if req.from_index >= source.len() {
        return Err(KanbanError::validation(
            "fromIndex",
            format!(
                "{} is out of range for '{}' ({} tickets)",
                req.from_index,
                req.from,
                source.len()
            ),
        ));
    }
    let actual = source
        .iter()
        .position(|&i| i == idx)
        .unwrap_or(req.from_index);
    if actual != req.from_index {
        tracing::debug!(
            id,
            claimed = req.from_index,
            actual,
            "stale fromIndex, using actual position"
        );
    }
    source.remove(actual);

    let before = tickets[idx].clone();
    if req.is_cross_column() {
        let mut dest = column(tickets, req.to);
        let at_index = req.to_index.unwrap_or(dest.len()).min(dest.len());
        dest.insert(at_index, idx);
        enter_status(&mut tickets[idx], req.to);
        renumber(tickets, &source);
        renumber(tickets, &dest);
    } else {
        let at_index = req.to_index.unwrap_or(source.len()).min(source.len());
        source.insert(at_index, idx);
        renumber(tickets, &source);
    }

    let ticket = &mut tickets[idx];
    record_changes(&before, ticket, at);
    ticket.updated_at = at;
    Ok(idx)
}

/// Merge `patch` into ticket `id`.
///
/// A status change appends the ticket to the end of its new column and
/// applies the transition table. Returns the index of the edited ticket.
///
/// # Errors
///
/// - [`KanbanError::NotFound`] if `id` is absent.
/// - [`KanbanError::Validation`] for a blank title/description or an
///   assignee outside the roster.
pub fn edit(
    tickets: &mut [Ticket],
    id: &str,
    patch: &TicketPatch,
    rules: &BoardRules,
    at: DateTime<Utc>,
) -> Result<usize> {
    let idx = position(tickets, id)?;
    if let Some(title) = &patch.title {
        non_blank("title", title)?;
    }
    if let Some(description) = &patch.description {
        non_blank("description", description)?;
    }
    if let Some(assignee) = &patch.assignee {
        rules.check_assignee(assignee)?;
    }

    let before = tickets[idx].clone();
    {
        let ticket = &mut tickets[idx];
        if let Some(title) = &patch.title {
            ticket.title.clone_from(title);
        }
        if let Some(description) = &patch.description {
            ticket.description.clone_from(description);
        }
        if let Some(sprint) = &patch.sprint {
            ticket.sprint.clone_from(sprint);
        }
        if let Some(priority) = patch.priority {
            ticket.priority = priority;
        }
        if let Some(assignee) = &patch.assignee {
            ticket.assignee.clone_from(assignee);
        }
    }

    if let Some(to) = patch.status.filter(|to| *to != before.status) {
        let mut source = column(tickets, before.status);
        source.retain(|&i| i != idx);
        let mut dest = column(tickets, to);
        dest.push(idx);
        enter_status(&mut tickets[idx], to);
        renumber(tickets, &source);
        renumber(tickets, &dest);
    }

    let ticket = &mut tickets[idx];
    record_changes(&before, ticket, at);
    ticket.updated_at = at;
    Ok(idx)
}

/// Append a comment to ticket `id`. Returns its index.
///
/// # Errors
///
/// - [`KanbanError::Validation`] for blank text.
/// - [`KanbanError::NotFound`] if `id` is absent.
pub fn add_comment(
    tickets: &mut [Ticket],
    id: &str,
    text: &str,
    at: DateTime<Utc>,
) -> Result<usize> {
    if text.trim().is_empty() {
        return Err(KanbanError::validation("text", "comment must not be blank"));
    }
    let idx = position(tickets, id)?;
    let ticket = &mut tickets[idx];
    ticket.comments.push(Comment {
        text: text.to_string(),
        timestamp: at,
    });
    ticket.updated_at = at;
    Ok(idx)
}

/// Remove ticket `id` and close the gap it leaves in its column.
///
/// # Errors
///
/// Returns [`KanbanError::NotFound`] if `id` is absent.
pub fn delete(tickets: &mut Vec<Ticket>, id: &str) -> Result<Ticket> {
    let idx = position(tickets, id)?;
    let removed = tickets.remove(idx);
    let col = column(tickets, removed.status);
    renumber(tickets, &col);
    Ok(removed)
}
