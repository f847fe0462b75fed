use serde::{Deserialize, Serialize};

use crate::model::Ticket;

/// One page of the collection, in stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub tickets: Vec<Ticket>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}

/// Slice `tickets` into the 1-based `page` of `limit` records.
///
/// `page` and `limit` below 1 are raised to 1. A page past the end is empty
/// but still reports the real totals.
#[must_use]
pub fn paginate(tickets: Vec<Ticket>, page: usize, limit: usize) -> Page {
    let page = page.max(1);
    let limit = limit.max(1);
    let total = tickets.len();
    let total_pages = total.div_ceil(limit);
    let start = (page - 1).saturating_mul(limit);

    let tickets = tickets.into_iter().skip(start).take(limit).collect();
    Page {
        tickets,
        total,
        page,
        total_pages,
    }
}
