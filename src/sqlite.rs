// SQLite-backed key-value storage

use crate::error::{Result, TaskError};
use crate::storage::{Storage, validate_key};
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key-value storage in a single SQLite table
pub struct SqliteStorage {
    base_path: PathBuf,
    db: Connection,
}

impl SqliteStorage {
    /// Open or create `tasklist.db` in the given directory
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let base_path = dir.as_ref().to_path_buf();

        fs::create_dir_all(&base_path)
            .map_err(|e| TaskError::storage(format!("Failed to create {}", base_path.display()), e))?;

        let db_path = base_path.join("tasklist.db");
        let db = Connection::open(&db_path).map_err(|e| TaskError::storage("Failed to open SQLite database", e))?;

        let storage = Self { base_path, db };
        storage.create_schema()?;
        Ok(storage)
    }

    /// In-memory database, mostly for tests
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().map_err(|e| TaskError::storage("Failed to open SQLite database", e))?;
        let storage = Self {
            base_path: PathBuf::new(),
            db,
        };
        storage.create_schema()?;
        Ok(storage)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating kv schema");

        self.db
            .execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                "#,
            )
            .map_err(|e| TaskError::storage("Failed to create schema", e))
    }
}

impl Storage for SqliteStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;

        self.db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get::<_, String>(0))
            .optional()
            .map_err(|e| TaskError::storage(format!("Failed to read key {}", key), e))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;

        self.db
            .execute(
                "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
                rusqlite::params![key, value, now_ms()],
            )
            .map_err(|e| TaskError::storage(format!("Failed to write key {}", key), e))?;

        debug!(key, bytes = value.len(), "set: wrote value");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;

        self.db
            .execute("DELETE FROM kv WHERE key = ?1", [key])
            .map_err(|e| TaskError::storage(format!("Failed to delete key {}", key), e))?;
        Ok(())
    }
}

fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
