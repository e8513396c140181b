//! Persistent device storage for the session.
//!
//! The store is a tiny string key/value map. The client only ever uses one
//! key, `user_id`, holding the stringified integer id.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::errors::SessionError;

pub const USER_ID_KEY: &str = "user_id";

pub trait SessionStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError>;

    fn remove_item(&self, key: &str) -> Result<(), SessionError>;
}

/// JSON file backed store, e.g. `<data dir>/session.json`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, SessionError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(SessionError::ReadFailed {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| SessionError::Corrupt {
            path: self.path.clone(),
            source: e,
        })
    }

    fn write(&self, items: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let write_err = |source| SessionError::WriteFailed {
            path: self.path.clone(),
            source,
        };

        if items.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(write_err(e)),
            };
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let content = serde_json::to_string_pretty(items).map_err(|e| SessionError::Corrupt {
            path: self.path.clone(),
            source: e,
        })?;
        std::fs::write(&self.path, content).map_err(write_err)
    }
}

impl SessionStore for FileSessionStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.read()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        // A corrupt file is replaced rather than blocking the write.
        let mut items = self.read().unwrap_or_default();
        items.insert(key.to_string(), value.to_string());
        self.write(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        let mut items = self.read().unwrap_or_default();
        items.remove(key);
        self.write(&items)
    }
}

/// Volatile store for tests and one-shot invocations.
///
/// Counts reads and writes so callers can assert how storage was touched.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    items: Mutex<BTreeMap<String, String>>,
    reads: Mutex<usize>,
    writes: Mutex<usize>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        store
    }

    pub fn reads(&self) -> usize {
        *self.reads.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn peek(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }
}

impl SessionStore for MemorySessionStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionError> {
        *self.reads.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(self.peek(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}
