//! Read-only projection of the collection into columns.
//!
//! Nothing here mutates a ticket. Display sorting is independent of the
//! persisted `order`, which is what move resolution uses.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::model::{ParseEnumError, Priority, Status, Ticket};
use crate::ops;

/// Who a ticket must be assigned to in order to be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssigneeFilter {
    Unassigned,
    Named(String),
}

impl AssigneeFilter {
    /// `""` is "no filter"; `unassigned` (any case) selects unassigned
    /// tickets; anything else is a name.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else if raw.eq_ignore_ascii_case("unassigned") {
            Some(Self::Unassigned)
        } else {
            Some(Self::Named(raw.to_string()))
        }
    }

    fn matches(&self, ticket: &Ticket) -> bool {
        match self {
            Self::Unassigned => !ticket.is_assigned(),
            Self::Named(name) => ticket.assignee == *name,
        }
    }
}

/// Conjunctive filters. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub priority: Option<Priority>,
    pub assignee: Option<AssigneeFilter>,
    pub sprint: Option<String>,
}

impl Filters {
    fn matches(&self, ticket: &Ticket) -> bool {
        self.priority.is_none_or(|p| ticket.priority == p)
            && self.assignee.as_ref().is_none_or(|a| a.matches(ticket))
            && self
                .sprint
                .as_deref()
                .filter(|s| !s.is_empty())
                .is_none_or(|s| ticket.sprint == s)
    }
}

/// Display order within one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Drag position.
    #[default]
    Order,
    PriorityDesc,
    PriorityAsc,
    CreatedDesc,
    CreatedAsc,
}

impl SortMode {
    pub const ALL: [Self; 5] = [
        Self::Order,
        Self::PriorityDesc,
        Self::PriorityAsc,
        Self::CreatedDesc,
        Self::CreatedAsc,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::PriorityDesc => "priority-desc",
            Self::PriorityAsc => "priority-asc",
            Self::CreatedDesc => "created-desc",
            Self::CreatedAsc => "created-asc",
        }
    }

    /// Stable sort of an already order-sorted column.
    fn apply(self, column: &mut [&Ticket]) {
        match self {
            Self::Order => {}
            Self::PriorityDesc => {
                column.sort_by_key(|t| std::cmp::Reverse(t.priority.weight()));
            }
            Self::PriorityAsc => column.sort_by_key(|t| t.priority.weight()),
            Self::CreatedDesc => column.sort_by_key(|t| std::cmp::Reverse(t.created_at)),
            Self::CreatedAsc => column.sort_by_key(|t| t.created_at),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or(ParseEnumError {
                expected: "sort mode",
                got: s,
            })
    }
}

/// Everything the projection needs besides the tickets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardQuery {
    pub filters: Filters,
    /// Case-insensitive substring of title or description. Blank matches all.
    pub search: String,
    /// Per-column sort. Columns not listed use [`SortMode::Order`].
    pub sort: BTreeMap<Status, SortMode>,
}

impl BoardQuery {
    #[must_use]
    pub fn sort_for(&self, status: Status) -> SortMode {
        self.sort.get(&status).copied().unwrap_or_default()
    }

    fn matches_search(&self, needle: &str, ticket: &Ticket) -> bool {
        needle.is_empty()
            || ticket.title.to_lowercase().contains(needle)
            || ticket.description.to_lowercase().contains(needle)
    }
}

/// Every status, in workflow order, with its visible tickets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Board<'a> {
    columns: BTreeMap<Status, Vec<&'a Ticket>>,
}

impl<'a> Board<'a> {
    #[must_use]
    pub fn column(&self, status: Status) -> &[&'a Ticket] {
        match self.columns.get(&status) {
            Some(column) => column,
            None => &[],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Status, &[&'a Ticket])> {
        self.columns.iter().map(|(s, col)| (*s, col.as_slice()))
    }

    #[must_use]
    pub fn visible(&self) -> usize {
        self.columns.values().map(Vec::len).sum()
    }
}

/// Project `tickets` into a [`Board`].
#[must_use]
pub fn project<'a>(tickets: &'a [Ticket], query: &BoardQuery) -> Board<'a> {
    let needle = query.search.trim().to_lowercase();
    let columns = Status::ALL
        .into_iter()
        .map(|status| {
            let mut column: Vec<&Ticket> = ops::column(tickets, status)
                .into_iter()
                .map(|i| &tickets[i])
                .filter(|t| query.filters.matches(t) && query.matches_search(&needle, t))
                .collect();
            query.sort_for(status).apply(&mut column);
            (status, column)
        })
        .collect();
    Board { columns }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewTicket, TicketPatch, now};
    use crate::ops::BoardRules;

    fn seeded() -> Vec<Ticket> {
        let rules = BoardRules::default();
        let mut tickets = Vec::new();
        let specs = [
            ("Login page", "build the form", Priority::High, "Alice", "Sprint 1"),
            ("Logout", "clear the session", Priority::Low, "", "Sprint 1"),
            ("Search", "full text LOGIN lookup", Priority::Medium, "Bob", "Sprint 2"),
        ];
        for (title, desc, priority, assignee, sprint) in specs {
            let input = NewTicket {
                priority: Some(priority),
                assignee: Some(assignee.to_string()),
                sprint: Some(sprint.to_string()),
                ..NewTicket::new(title, desc)
            };
            ops::create(&mut tickets, &input, &rules, now()).expect("create");
        }
        tickets
    }

    fn titles(board: &Board<'_>, status: Status) -> Vec<String> {
        board.column(status).iter().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn empty_collection_has_all_six_columns() {
        let board = project(&[], &BoardQuery::default());
        assert_eq!(board.iter().count(), 6);
        let order: Vec<Status> = board.iter().map(|(s, _)| s).collect();
        assert_eq!(order, Status::ALL.to_vec());
        assert_eq!(board.visible(), 0);
    }

    #[test]
    fn default_query_uses_drag_order() {
        let tickets = seeded();
        let board = project(&tickets, &BoardQuery::default());
        assert_eq!(titles(&board, Status::ToDo), vec!["Search", "Logout", "Login page"]);
    }

    #[test]
    fn filters_are_conjunctive() {
        let tickets = seeded();
        let query = BoardQuery {
            filters: Filters {
                sprint: Some("Sprint 1".into()),
                assignee: AssigneeFilter::parse("unassigned"),
                ..Filters::default()
            },
            ..BoardQuery::default()
        };
        assert_eq!(titles(&project(&tickets, &query), Status::ToDo), vec!["Logout"]);

        let query = BoardQuery {
            filters: Filters {
                priority: Some(Priority::High),
                assignee: AssigneeFilter::parse("Bob"),
                ..Filters::default()
            },
            ..BoardQuery::default()
        };
        assert_eq!(project(&tickets, &query).visible(), 0);
    }

    #[test]
    fn empty_filter_values_match_all() {
        let tickets = seeded();
        let query = BoardQuery {
            filters: Filters {
                assignee: AssigneeFilter::parse(""),
                sprint: Some(String::new()),
                ..Filters::default()
            },
            search: "   ".into(),
            ..BoardQuery::default()
        };
        assert_eq!(project(&tickets, &query).visible(), 3);
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let tickets = seeded();
        let query = BoardQuery {
            search: "login".into(),
            ..BoardQuery::default()
        };
        assert_eq!(
            titles(&project(&tickets, &query), Status::ToDo),
            vec!["Search", "Login page"]
        );
    }

    #[test]
    fn sort_modes_apply_per_column_without_touching_order() {
        let mut tickets = seeded();
        let patch = TicketPatch {
            status: Some(Status::Done),
            ..TicketPatch::default()
        };
        ops::edit(&mut tickets, "1", &patch, &BoardRules::default(), now()).expect("edit");
        let before = tickets.clone();

        let query = BoardQuery {
            sort: [(Status::ToDo, SortMode::PriorityDesc)].into_iter().collect(),
            ..BoardQuery::default()
        };
        let board = project(&tickets, &query);
        assert_eq!(titles(&board, Status::ToDo), vec!["Search", "Logout"]);
        assert_eq!(titles(&board, Status::Done), vec!["Login page"]);

        let asc = BoardQuery {
            sort: [(Status::ToDo, SortMode::PriorityAsc)].into_iter().collect(),
            ..BoardQuery::default()
        };
        assert_eq!(titles(&project(&tickets, &asc), Status::ToDo), vec!["Logout", "Search"]);
        assert_eq!(tickets, before);
    }

    #[test]
    fn created_sort_is_stable_on_ties() {
        let tickets = seeded();
        let query = BoardQuery {
            sort: [(Status::ToDo, SortMode::CreatedAsc)].into_iter().collect(),
            ..BoardQuery::default()
        };
        let board = project(&tickets, &query);
        let created: Vec<_> = board.column(Status::ToDo).iter().map(|t| t.created_at).collect();
        assert!(created.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn sort_mode_parses_and_displays() {
        for mode in SortMode::ALL {
            assert_eq!(mode.to_string().parse::<SortMode>(), Ok(mode));
        }
        assert!("random".parse::<SortMode>().is_err());
    }

    #[test]
    fn board_serializes_with_status_keys() {
        let json = serde_json::to_value(project(&[], &BoardQuery::default())).expect("json");
        assert!(json.get("Ready for Review").is_some());
    }
}
