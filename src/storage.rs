//! Key-value persistence for user preferences.
//!
//! Values are plain strings. The typed helpers follow a forgiving convention:
//! strings are stored raw, everything else as JSON, and reads try JSON first
//! before falling back to the raw string.

use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::path::{Path, PathBuf};

#[cfg(not(target_arch = "wasm32"))]
use log::warn;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Failure while reading or writing persisted preferences.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage contents are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
}

/// String key-value store consumed by the theme service.
pub trait ThemeStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Reads `key` as JSON, or as the raw string when it is not valid JSON.
pub fn get_stored_item<T: DeserializeOwned>(store: &dyn ThemeStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str::<T>(&raw) {
        Ok(value) => Some(value),
        Err(_) => serde_json::from_value(Value::String(raw)).ok(),
    }
}

/// Stores strings verbatim and any other value as JSON text.
pub fn set_stored_item<T: Serialize + ?Sized>(
    store: &dyn ThemeStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    match serde_json::to_value(value)? {
        Value::String(text) => store.set(key, &text),
        other => store.set(key, &other.to_string()),
    }
}

/// Volatile store, used headless and in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ThemeStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// The page's `window.localStorage`, looked up on every access.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    fn storage() -> Result<web_sys::Storage, StorageError> {
        web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".into()))?
            .local_storage()
            .map_err(|err| StorageError::Unavailable(format!("{err:?}")))?
            .ok_or_else(|| StorageError::Unavailable("localStorage disabled".into()))
    }
}

#[cfg(target_arch = "wasm32")]
impl ThemeStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage().ok()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|err| StorageError::Unavailable(format!("{err:?}")))
    }
}

/// Store persisted as a flat JSON object on disk.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

#[cfg(not(target_arch = "wasm32"))]
impl FileStore {
    /// Opens the store at `path`. A missing file starts empty; an unreadable
    /// one is logged and also starts empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match Self::load(&path) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("ignoring preferences at {}: {err}", path.display());
                HashMap::new()
            }
        };
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    /// Default location inside the user's configuration directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("backdrop-scene").join("preferences.json"))
    }

    fn load(path: &Path) -> Result<HashMap<String, String>, StorageError> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn flush(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, serialized)?;
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl ThemeStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write();
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Layout {
        columns: u32,
    }

    #[test]
    fn strings_are_stored_raw() {
        let store = MemoryStore::new();
        set_stored_item(&store, "theme", "dark").unwrap();
        assert_eq!(store.get("theme").as_deref(), Some("dark"));
        assert_eq!(
            get_stored_item::<String>(&store, "theme").as_deref(),
            Some("dark")
        );
    }

    #[test]
    fn structured_values_round_trip_as_json() {
        let store = MemoryStore::new();
        set_stored_item(&store, "layout", &Layout { columns: 3 }).unwrap();
        assert_eq!(store.get("layout").as_deref(), Some(r#"{"columns":3}"#));
        assert_eq!(
            get_stored_item::<Layout>(&store, "layout"),
            Some(Layout { columns: 3 })
        );
    }

    #[test]
    fn missing_or_mismatched_values_are_none() {
        let store = MemoryStore::new();
        assert_eq!(get_stored_item::<String>(&store, "absent"), None);
        store.set("layout", "not json").unwrap();
        assert_eq!(get_stored_item::<Layout>(&store, "layout"), None);
    }

    #[test]
    fn file_store_persists_between_instances() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("prefs.json");
        {
            let store = FileStore::open(&path);
            store.set("theme", "light").unwrap();
        }
        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("theme").as_deref(), Some("light"));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        std::fs::write(file.path(), "{ broken").unwrap();
        let store = FileStore::open(file.path());
        assert_eq!(store.get("theme"), None);
    }
}
