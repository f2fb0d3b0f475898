//! Durable key-value storage behind the preferences.
//!
//! `KeyValueStore` is the contract the preference accessors rely on: fallible
//! `get`, `set` that only stages a value, and `save` that commits staged values
//! to durable media. `JsonFileStore` keeps every key in one JSON document.

use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Storage port for JSON values keyed by name.
pub trait KeyValueStore: Send + Sync {
    /// Returns `Ok(None)` when the key has never been set.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    /// Stage a value; it may not be durable until `save`.
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
    /// Commit staged values.
    fn save(&self) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn save(&self) -> Result<(), StoreError> {
        (**self).save()
    }
}

/// All keys stored as one pretty-printed JSON object on disk.
///
/// The file is read lazily on first access. A failed read is reported to that
/// caller and attempted again on the next access, except that a write over a
/// file that does not parse starts from an empty document.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<Option<Map<String, Value>>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        info!("Open preferences store at {:?}", path);
        Self {
            path,
            entries: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush staged values and release the handle
    pub fn close(self) -> Result<(), StoreError> {
        self.save()?;
        info!("Closed preferences store at {:?}", self.path);
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<Map<String, Value>>>, StoreError> {
        self.entries.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Load entries ahead of a write. A file that no longer parses is copied
    /// to `*.json.bak` and replaced by an empty document on the next save.
    fn load_for_write(&self) -> Result<Map<String, Value>, StoreError> {
        match read_entries(&self.path) {
            Err(StoreError::Json(e)) => {
                let backup = self.path.with_extension("json.bak");
                warn!(
                    "Unreadable preferences {:?} ({}), starting fresh; old file kept at {:?}",
                    self.path, e, backup
                );
                if let Err(e) = fs::copy(&self.path, &backup) {
                    warn!("Failed to back up {:?}: {}", self.path, e);
                }
                Ok(Map::new())
            }
            other => other,
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let mut guard = self.lock()?;
        if guard.is_none() {
            *guard = Some(read_entries(&self.path)?);
        }
        Ok(guard.as_ref().and_then(|entries| entries.get(key).cloned()))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        if guard.is_none() {
            *guard = Some(self.load_for_write()?);
        }
        guard
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value);
        Ok(())
    }

    fn save(&self) -> Result<(), StoreError> {
        let guard = self.lock()?;
        // Nothing was ever loaded, so nothing can be staged
        let Some(entries) = guard.as_ref() else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(entries)?;
        write_atomic(&self.path, content.as_bytes())?;
        debug!("Saved preferences to {:?}", self.path);
        Ok(())
    }
}

fn read_entries(path: &Path) -> Result<Map<String, Value>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(StoreError::Io(e)),
    };
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    Ok(serde_json::from_str(&content)?)
}

fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, data)?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    Ok(())
}

/// Volatile store; `save` is a no-op.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value);
        Ok(())
    }

    fn save(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn setup_test_dir() -> PathBuf {
        let test_dir = std::env::temp_dir().join(format!("test_store_{}", Uuid::new_v4()));
        fs::create_dir_all(&test_dir).unwrap();
        test_dir
    }

    fn cleanup_test_dir(test_dir: &Path) {
        let _ = fs::remove_dir_all(test_dir);
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let test_dir = setup_test_dir();
        let store = JsonFileStore::open(test_dir.join("preferences.json"));

        assert!(store.get("theme").unwrap().is_none());
        assert!(store.get("recent_files").unwrap().is_none());
        store.save().unwrap();

        let reopened = JsonFileStore::open(test_dir.join("preferences.json"));
        assert!(reopened.get("theme").unwrap().is_none());

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_set_is_staged_until_save() {
        let test_dir = setup_test_dir();
        let path = test_dir.join("preferences.json");
        let store = JsonFileStore::open(&path);

        store.set("theme", json!("dark")).unwrap();
        assert!(!path.exists());
        assert_eq!(store.get("theme").unwrap(), Some(json!("dark")));

        store.save().unwrap();
        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get("theme").unwrap(), Some(json!("dark")));

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_close_flushes_staged_values() {
        let test_dir = setup_test_dir();
        let path = test_dir.join("nested").join("preferences.json");
        let store = JsonFileStore::open(&path);

        store.set("recent_files", json!(["/a"])).unwrap();
        store.close().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value, json!({ "recent_files": ["/a"] }));

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_unknown_keys_survive_rewrite() {
        let test_dir = setup_test_dir();
        let path = test_dir.join("preferences.json");
        fs::write(&path, r#"{ "window": { "width": 800 } }"#).unwrap();

        let store = JsonFileStore::open(&path);
        store.set("theme", json!("light")).unwrap();
        store.save().unwrap();

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get("window").unwrap(), Some(json!({ "width": 800 })));
        assert_eq!(reopened.get("theme").unwrap(), Some(json!("light")));

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_corrupt_file_fails_every_read() {
        let test_dir = setup_test_dir();
        let path = test_dir.join("preferences.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path);
        assert!(matches!(store.get("theme"), Err(StoreError::Json(_))));
        assert!(matches!(store.get("theme"), Err(StoreError::Json(_))));

        // A repaired file is picked up on the next access
        fs::write(&path, r#"{ "theme": "dark" }"#).unwrap();
        assert_eq!(store.get("theme").unwrap(), Some(json!("dark")));

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_write_replaces_corrupt_file_and_keeps_backup() {
        let test_dir = setup_test_dir();
        let path = test_dir.join("preferences.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::open(&path);
        assert!(store.get("theme").is_err());
        store.set("theme", json!("dark")).unwrap();
        store.save().unwrap();

        let reopened = JsonFileStore::open(&path);
        assert_eq!(reopened.get("theme").unwrap(), Some(json!("dark")));
        assert_eq!(
            fs::read_to_string(test_dir.join("preferences.json.bak")).unwrap(),
            "{ not json"
        );

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let test_dir = setup_test_dir();
        // A non-empty directory in the way makes the rename fail
        let path = test_dir.join("preferences.json");
        fs::create_dir_all(path.join("occupied")).unwrap();

        assert!(write_atomic(&path, b"{}").is_err());
        assert!(!test_dir.join("preferences.json.tmp").exists());

        cleanup_test_dir(&test_dir);
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.get("theme").unwrap().is_none());
        store.set("theme", json!("dark")).unwrap();
        store.save().unwrap();
        assert_eq!(store.get("theme").unwrap(), Some(json!("dark")));
    }
}
