// View projection: status filter plus text search over a task store

use crate::error::TaskError;
use crate::models::{Task, TaskId};
use crate::store::TaskStore;
use std::fmt;
use std::str::FromStr;

/// Completion filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Incomplete,
}

impl StatusFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Completed => task.completed,
            StatusFilter::Incomplete => !task.completed,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::All => write!(f, "all"),
            StatusFilter::Completed => write!(f, "completed"),
            StatusFilter::Incomplete => write!(f, "incomplete"),
        }
    }
}

impl FromStr for StatusFilter {
    type Err = TaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "completed" => Ok(StatusFilter::Completed),
            "incomplete" => Ok(StatusFilter::Incomplete),
            _ => Err(TaskError::InvalidFilter(s.to_string())),
        }
    }
}

/// Transient display criteria
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub filter: StatusFilter,
    /// Case-insensitive substring; empty matches everything
    pub search: String,
}

impl Query {
    pub fn new(filter: StatusFilter, search: impl Into<String>) -> Self {
        Self {
            filter,
            search: search.into(),
        }
    }
}

/// A task as it appears in a projection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectedTask<'a> {
    pub id: TaskId,
    /// Position in the underlying store, not in the projection
    pub index: usize,
    pub task: &'a Task,
}

/// Tasks to display for `query`, in store order
pub fn project<'a>(store: &'a TaskStore, query: &Query) -> Vec<ProjectedTask<'a>> {
    let needle = query.search.to_lowercase();

    store
        .iter()
        .enumerate()
        .filter(|(_, (_, task))| query.filter.matches(task))
        .filter(|(_, (_, task))| needle.is_empty() || task.text.to_lowercase().contains(&needle))
        .map(|(index, (id, task))| ProjectedTask { id, index, task })
        .collect()
}
