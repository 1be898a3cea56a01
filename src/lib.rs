// TaskList - Ordered task lists with filtering, search and durable key-value persistence

pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod persist;
pub mod record;
pub mod registry;
pub mod reorder;
pub mod sqlite;
pub mod storage;
pub mod store;

// Re-export main types for convenience
pub use config::{Backend, Config};
pub use error::{ErrorKind, TaskError};
pub use filter::{ProjectedTask, Query, StatusFilter, project};
pub use models::{Priority, Task, TaskId};
pub use persist::{Persisted, PersistedRegistry, PersistedStore, Persistence, RecoveryPolicy};
pub use record::Snapshot;
pub use registry::{ListRegistry, TaskList};
pub use reorder::DragState;
pub use sqlite::SqliteStorage;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{EditOutcome, TaskStore};
