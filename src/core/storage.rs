//! Client-local key/value storage.
//!
//! Every persisted piece of client state (rate cache, conversion history, UI
//! slices) lives under a single string key holding a JSON blob. The default
//! backend is an embedded redb database; an in-memory map is used when the
//! database cannot be opened and in tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use redb::{Database, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::shared::error::{AppError, AppResult};

/// Key: storage key, Value: JSON text
const STATE_TABLE: TableDefinition<&str, &str> = TableDefinition::new("local_state");

pub trait LocalStorage: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// Reads and decodes a JSON value. `Ok(None)` when the key is absent.
pub fn load_json<T: DeserializeOwned>(storage: &dyn LocalStorage, key: &str) -> AppResult<Option<T>> {
    match storage.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn save_json<T: Serialize + ?Sized>(storage: &dyn LocalStorage, key: &str, value: &T) -> AppResult<()> {
    let serialized = serde_json::to_string(value)?;
    storage.set(key, &serialized)
}

/// Redb-based storage implementation
pub struct RedbStorage {
    db: Database,
}

impl RedbStorage {
    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Io(format!("Failed to create data directory: {}", e)))?;
        }

        let db = Database::create(path)?;

        // Create the table up front so readers never see TableDoesNotExist
        let write_txn = db.begin_write()?;
        {
            let _table = write_txn.open_table(STATE_TABLE)?;
        }
        write_txn.commit()?;

        debug!("[LocalStorage] Opened {}", path.display());
        Ok(Self { db })
    }
}

impl LocalStorage for RedbStorage {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(STATE_TABLE)?;
        let value = table.get(key)?.map(|v| v.value().to_string());
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(STATE_TABLE)?;
            table.insert(key, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(STATE_TABLE)?;
            table.remove(key)?;
        }
        write_txn.commit()?;
        Ok(())
    }
}

/// In-memory storage, also the fallback when the database cannot be opened.
#[derive(Default)]
pub struct InMemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for InMemoryStorage {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| AppError::Storage(format!("Mutex poisoned: {}", e)))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| AppError::Storage(format!("Mutex poisoned: {}", e)))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| AppError::Storage(format!("Mutex poisoned: {}", e)))?;
        entries.remove(key);
        Ok(())
    }
}

/// Opens the redb store at `path`, degrading to memory if that fails.
pub fn open_or_in_memory(path: &Path) -> Arc<dyn LocalStorage> {
    match RedbStorage::open(path) {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            warn!(
                "[LocalStorage] Failed to open {}: {}, using in-memory fallback",
                path.display(),
                e
            );
            Arc::new(InMemoryStorage::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(storage: &dyn LocalStorage) {
        assert_eq!(storage.get("missing").unwrap(), None);

        storage.set("k", "v1").unwrap();
        storage.set("k", "v2").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v2"));

        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);

        // Removing an absent key is not an error
        storage.remove("k").unwrap();
    }

    #[test]
    fn test_in_memory_storage() {
        exercise(&InMemoryStorage::new());
    }

    #[test]
    fn test_redb_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = RedbStorage::open(&dir.path().join("state.redb")).unwrap();
        exercise(&storage);
    }

    #[test]
    fn test_redb_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.redb");
        {
            let storage = RedbStorage::open(&path).unwrap();
            storage.set("greeting", "nyan").unwrap();
        }
        let storage = RedbStorage::open(&path).unwrap();
        assert_eq!(storage.get("greeting").unwrap().as_deref(), Some("nyan"));
    }

    #[test]
    fn test_json_helpers() {
        let storage = InMemoryStorage::new();
        save_json(&storage, "list", &vec![1, 2, 3]).unwrap();
        let loaded: Option<Vec<u32>> = load_json(&storage, "list").unwrap();
        assert_eq!(loaded, Some(vec![1, 2, 3]));

        storage.set("list", "[1, oops").unwrap();
        assert!(load_json::<Vec<u32>>(&storage, "list").is_err());
    }

    #[test]
    fn test_fallback_when_path_unusable() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the database file should be makes redb fail
        let storage = open_or_in_memory(dir.path());
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
    }
}
