//! Key-value storage scopes with different lifetimes

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// A key-value store with a fixed lifetime.
///
/// Only [`super::SessionStore`] writes session markers into a scope.
pub trait StorageScope {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
    /// Removing a missing key is not an error
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory scope that lives exactly as long as its browsing context
#[derive(Debug, Default, Clone)]
pub struct MemoryScope {
    entries: HashMap<String, String>,
}

impl MemoryScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl StorageScope for MemoryScope {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    value: String,
    written_at: chrono::DateTime<chrono::Utc>,
}

/// Durable scope: one JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileScope {
    dir: PathBuf,
}

impl FileScope {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

fn unavailable(path: &Path, err: impl std::fmt::Display) -> Error {
    Error::StorageUnavailable(format!("{}: {}", path.display(), err))
}

impl StorageScope for FileScope {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(unavailable(&path, e)),
        };

        match serde_json::from_str::<StoredEntry>(&contents) {
            Ok(entry) => Ok(Some(entry.value)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable entry {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key);
        fs::create_dir_all(&self.dir).map_err(|e| unavailable(&self.dir, e))?;

        let entry = StoredEntry {
            value: value.to_string(),
            written_at: chrono::Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&entry)?;

        // Write then rename so a reader never sees a half-written entry
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents).map_err(|e| unavailable(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| unavailable(&path, e))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(unavailable(&path, e)),
        }
    }
}
