//! Visible-set computation for board columns.
//!
//! # Responsibility
//! - Decide which tasks pass the header search box and priority select.
//!
//! # Invariants
//! - Pure and deterministic: identical inputs yield identical output.
//! - Output keeps input relative order (stable filter, no re-sort).
//! - Search and priority predicates combine with logical AND.

use crate::model::task::{Priority, Task};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Priority select value that is neither empty nor a known priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPriority(pub String);

impl Display for UnknownPriority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown priority filter `{}`; expected low|medium|high or empty",
            self.0
        )
    }
}

impl Error for UnknownPriority {}

/// Parses the priority select value; `""` means "all priorities".
pub fn parse_priority_filter(value: &str) -> Result<Option<Priority>, UnknownPriority> {
    if value.is_empty() {
        return Ok(None);
    }
    Priority::parse(value)
        .map(Some)
        .ok_or_else(|| UnknownPriority(value.to_string()))
}

/// Current search/priority selection of the board header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Case-insensitive title substring; empty matches everything.
    pub query: String,
    /// Exact priority; `None` matches everything.
    pub priority: Option<Priority>,
}

impl TaskFilter {
    pub fn new(query: impl Into<String>, priority: Option<Priority>) -> Self {
        Self {
            query: query.into(),
            priority,
        }
    }

    /// Whether any predicate narrows the result.
    pub fn is_active(&self) -> bool {
        !self.query.is_empty() || self.priority.is_some()
    }

    pub fn matches(&self, task: &Task) -> bool {
        matches(task, &self.query, self.priority)
    }

    pub fn apply<'a, I>(&self, tasks: I) -> Vec<&'a Task>
    where
        I: IntoIterator<Item = &'a Task>,
    {
        visible(tasks, &self.query, self.priority)
    }
}

/// Returns the subsequence of `tasks` that passes both predicates.
pub fn visible<'a, I>(
    tasks: I,
    search_query: &str,
    priority_filter: Option<Priority>,
) -> Vec<&'a Task>
where
    I: IntoIterator<Item = &'a Task>,
{
    let needle = search_query.to_lowercase();
    tasks
        .into_iter()
        .filter(|task| matches_lowered(task, &needle, priority_filter))
        .collect()
}

/// Single-task form of `visible`.
pub fn matches(task: &Task, search_query: &str, priority_filter: Option<Priority>) -> bool {
    matches_lowered(task, &search_query.to_lowercase(), priority_filter)
}

fn matches_lowered(task: &Task, needle: &str, priority_filter: Option<Priority>) -> bool {
    let matches_search = needle.is_empty() || task.title.to_lowercase().contains(needle);
    let matches_priority = priority_filter.map_or(true, |priority| task.priority == priority);
    matches_search && matches_priority
}
