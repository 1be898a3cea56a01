// Runtime configuration: where state lives and how to read it

use crate::error::Result;
use crate::persist::RecoveryPolicy;
use crate::sqlite::SqliteStorage;
use crate::storage::{FileStorage, Storage};
use std::path::PathBuf;
use tracing::debug;

/// Storage backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// One JSON file per key
    #[default]
    File,
    /// A kv table in `tasklist.db`
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: Backend,
    pub recovery: RecoveryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: Backend::default(),
            recovery: RecoveryPolicy::default(),
        }
    }
}

impl Config {
    /// Open the configured backend, creating the data directory if needed
    pub fn open_storage(&self) -> Result<Box<dyn Storage>> {
        debug!(data_dir = ?self.data_dir, backend = ?self.backend, "open_storage");
        Ok(match self.backend {
            Backend::File => Box::new(FileStorage::open(&self.data_dir)?),
            Backend::Sqlite => Box::new(SqliteStorage::open(&self.data_dir)?),
        })
    }
}

/// `<platform data dir>/tasklist`, or `.tasklist` when there is none
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("tasklist"))
        .unwrap_or_else(|| PathBuf::from(".tasklist"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend, Backend::File);
        assert_eq!(config.recovery, RecoveryPolicy::Fail);
        assert!(config.data_dir.ends_with("tasklist") || config.data_dir.ends_with(".tasklist"));
    }

    #[test]
    fn test_open_storage_backends() {
        let temp = TempDir::new().unwrap();

        for backend in [Backend::File, Backend::Sqlite] {
            let config = Config {
                data_dir: temp.path().join(format!("{:?}", backend)),
                backend,
                recovery: RecoveryPolicy::Fail,
            };
            let mut storage = config.open_storage().unwrap();
            storage.set("tasks", "[]").unwrap();
            assert_eq!(storage.get("tasks").unwrap().as_deref(), Some("[]"));
        }

        assert!(temp.path().join("File/tasks.json").exists());
        assert!(temp.path().join("Sqlite/tasklist.db").exists());
    }
}
