//! Key-value storage backing the session.
//!
//! Stands in for browser local storage: string keys, string values, and a
//! `reload` hook so a process can pick up writes made by another one.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ClientError;

/// String key-value store with write-through persistence.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), ClientError>;

    fn remove(&mut self, key: &str) -> Result<(), ClientError>;

    /// Re-read the backing medium, discarding the in-memory view.
    fn reload(&mut self) -> Result<(), ClientError>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Non-persistent store for tests and one-shot commands.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ClientError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ClientError> {
        self.entries.remove(key);
        Ok(())
    }

    fn reload(&mut self) -> Result<(), ClientError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// Store persisted as a single JSON object file.
///
/// Every mutation re-reads the file, applies only the changed key and
/// rewrites it via a temporary sibling and a rename, so keys written by
/// other processes survive and readers never observe a half-written file.
/// The in-memory view only picks up those foreign keys on `reload`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`.
    ///
    /// A missing file is an empty store; an unreadable or malformed file is
    /// an error so a corrupt session is never silently overwritten.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let path = path.into();
        let entries = read_entries(&path)?;
        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened session store");
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply one key change to the current file contents and write it back.
    fn write_key(&self, key: &str, value: Option<&str>) -> Result<(), ClientError> {
        let mut on_disk = read_entries(&self.path)?;
        match value {
            Some(value) => on_disk.insert(key.to_string(), value.to_string()),
            None => on_disk.remove(key),
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_vec_pretty(&on_disk)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, String>, ClientError> {
    match fs::read(path) {
        Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(BTreeMap::new()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(e.into()),
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ClientError> {
        self.write_key(key, Some(value))?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), ClientError> {
        self.write_key(key, None)?;
        self.entries.remove(key);
        Ok(())
    }

    fn reload(&mut self) -> Result<(), ClientError> {
        self.entries = read_entries(&self.path)?;
        Ok(())
    }
}
