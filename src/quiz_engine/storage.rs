use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access profile storage: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt storage file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Current time as unix seconds. Clock failures collapse to 0 rather than
/// propagating into result records.
pub(crate) fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// The opaque key/value capability the profile store is built on.
///
/// The engine depends on this abstraction, never on a concrete backing
/// store, so browsers' localStorage, a file, or a test map all plug in the
/// same way.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

/// Volatile in-memory store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
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

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }
}

/// File-backed store: one JSON object per file, whole map rewritten on every
/// `set`. Fine for profile-sized payloads.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading any existing content. A missing
    /// file starts empty; a corrupt one is an error rather than silent data
    /// loss.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            HashMap::new()
        };
        Ok(Self { path, entries })
    }

    fn persist(&self) {
        let write = || -> Result<(), StorageError> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let raw = serde_json::to_string_pretty(&self.entries)?;
            std::fs::write(&self.path, raw)?;
            Ok(())
        };
        if let Err(e) = write() {
            // A failed flush loses at most the latest write; the in-memory
            // view stays consistent for the rest of the session.
            log::warn!("failed to persist {}: {e}", self.path.display());
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k"), None);
        store.set("k", "v".to_string());
        assert_eq!(store.get("k").as_deref(), Some("v"));
        store.set("k", "v2".to_string());
        assert_eq!(store.get("k").as_deref(), Some("v2"));
    }

    #[test]
    fn json_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");

        {
            let mut store = JsonFileStore::open(&path).unwrap();
            store.set("quiz_user_ada", "{\"name\":\"ada\"}".to_string());
        }

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(
            store.get("quiz_user_ada").as_deref(),
            Some("{\"name\":\"ada\"}")
        );
    }

    #[test]
    fn json_file_store_rejects_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "][").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StorageError::Corrupt(_))
        ));
    }
}
