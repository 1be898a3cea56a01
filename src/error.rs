// Error taxonomy for task list operations

use crate::models::TaskId;
use thiserror::Error;

/// Broad classification of a [`TaskError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; nothing was changed
    Validation,
    /// Addressed a task or list that does not exist; nothing was changed
    Index,
    /// Persisted data exists but cannot be parsed
    Corrupt,
    /// The storage backend failed
    Storage,
}

/// Errors returned by stores, the registry and the persistence adapter
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task text cannot be empty")]
    EmptyText,

    #[error("invalid priority: {0} (expected low, medium or high)")]
    InvalidPriority(String),

    #[error("invalid filter: {0} (expected all, completed or incomplete)")]
    InvalidFilter(String),

    #[error("index {index} out of bounds (len {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("no task with id {0}")]
    UnknownTask(TaskId),

    #[error("no current list")]
    NoCurrentList,

    #[error("corrupt state under key '{key}'")]
    CorruptState {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{context}")]
    Storage {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl TaskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TaskError::EmptyText | TaskError::InvalidPriority(_) | TaskError::InvalidFilter(_) => {
                ErrorKind::Validation
            }
            TaskError::IndexOutOfBounds { .. } | TaskError::UnknownTask(_) | TaskError::NoCurrentList => {
                ErrorKind::Index
            }
            TaskError::CorruptState { .. } => ErrorKind::Corrupt,
            TaskError::Storage { .. } => ErrorKind::Storage,
        }
    }

    /// Wrap a backend failure with a short description of what was attempted
    pub fn storage<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        TaskError::Storage {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T, E = TaskError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(TaskError::EmptyText.kind(), ErrorKind::Validation);
        assert_eq!(TaskError::InvalidPriority("urgent".to_string()).kind(), ErrorKind::Validation);
        assert_eq!(TaskError::IndexOutOfBounds { index: 5, len: 1 }.kind(), ErrorKind::Index);
        assert_eq!(TaskError::UnknownTask(TaskId::from_raw(3)).kind(), ErrorKind::Index);
        assert_eq!(TaskError::NoCurrentList.kind(), ErrorKind::Index);

        let parse_err = serde_json::from_str::<Vec<u8>>("{").unwrap_err();
        let corrupt = TaskError::CorruptState {
            key: "tasks".to_string(),
            source: parse_err,
        };
        assert_eq!(corrupt.kind(), ErrorKind::Corrupt);

        let io = std::io::Error::other("disk full");
        assert_eq!(TaskError::storage("write failed", io).kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            TaskError::IndexOutOfBounds { index: 5, len: 1 }.to_string(),
            "index 5 out of bounds (len 1)"
        );
        assert_eq!(TaskError::UnknownTask(TaskId::from_raw(7)).to_string(), "no task with id #7");
    }
}
