// Durable string-keyed storage backends

use crate::error::{Result, TaskError};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A durable map from string keys to string values
///
/// `set` must not return until the value is durable.
pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// In-process storage; nothing survives the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// One `{key}.json` file per key under a directory
///
/// Writes go to a temp file that is synced and renamed over the target while
/// holding an exclusive lock on `.lock`; reads hold a shared lock.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open storage rooted at `dir`, creating the directory if needed
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| TaskError::storage(format!("Failed to create {}", dir.display()), e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn lock_file(&self) -> Result<File> {
        let path = self.dir.join(".lock");
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| TaskError::storage("Failed to open lock file", e))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.path_for(key);

        let lock = self.lock_file()?;
        lock.lock_shared()
            .map_err(|e| TaskError::storage("Failed to acquire read lock", e))?;

        let mut file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(TaskError::storage(format!("Failed to open {}", path.display()), e)),
        };

        let mut value = String::new();
        file.read_to_string(&mut value)
            .map_err(|e| TaskError::storage(format!("Failed to read {}", path.display()), e))?;

        // Lock is released when `lock` is dropped
        Ok(Some(value))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!("{}.json.tmp", key));

        let lock = self.lock_file()?;
        lock.lock_exclusive()
            .map_err(|e| TaskError::storage("Failed to acquire write lock", e))?;

        let write = || -> std::io::Result<()> {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(value.as_bytes())?;
            tmp.sync_all()?;
            fs::rename(&tmp_path, &path)
        };
        write().map_err(|e| TaskError::storage(format!("Failed to write {}", path.display()), e))?;

        debug!(key, bytes = value.len(), path = ?path, "set: wrote value");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.path_for(key);

        let lock = self.lock_file()?;
        lock.lock_exclusive()
            .map_err(|e| TaskError::storage("Failed to acquire write lock", e))?;

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TaskError::storage(format!("Failed to remove {}", path.display()), e)),
        }
    }
}

/// Keys become file names and table keys, so keep them boring
pub(crate) fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty() && key.len() <= 64 && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(TaskError::storage(
            format!("Invalid storage key: {:?}", key),
            std::io::Error::new(ErrorKind::InvalidInput, "key must be 1-64 chars of [A-Za-z0-9_-]"),
        ))
    }
}
