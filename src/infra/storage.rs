//! Persistent key-value storage and the auth-token store built on it.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Key under which the auth token is persisted.
pub const TOKEN_KEY: &str = "auth_header_value";

/// String-to-string storage that survives restarts.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> std::io::Result<()>;
    fn remove(&self, key: &str) -> std::io::Result<()>;
}

#[derive(Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        self.values
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> std::io::Result<()> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// JSON object on disk, rewritten atomically on every change.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let Ok(contents) = std::fs::read_to_string(&self.path) else {
            return BTreeMap::new();
        };
        serde_json::from_str(&contents).unwrap_or_else(|err| {
            log::warn!(
                "Ignoring unreadable storage file {}: {}",
                self.path.display(),
                err
            );
            BTreeMap::new()
        })
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> std::io::Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let mut file = tempfile::NamedTempFile::new_in(parent)?;
        let contents = serde_json::to_vec_pretty(values).map_err(std::io::Error::other)?;
        file.write_all(&contents)?;
        file.persist(&self.path).map_err(|err| err.error)?;
        Ok(())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock();
        self.read_all().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        let _guard = self.lock.lock();
        let mut values = self.read_all();
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }

    fn remove(&self, key: &str) -> std::io::Result<()> {
        let _guard = self.lock.lock();
        let mut values = self.read_all();
        if values.remove(key).is_none() {
            return Ok(());
        }
        self.write_all(&values)
    }
}

/// Holds at most one opaque auth token.
///
/// A stored token says nothing about its validity; only the server can
/// confirm it.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    pub fn load(&self) -> Option<String> {
        self.storage
            .get(TOKEN_KEY)
            .filter(|token| !token.is_empty())
    }

    pub fn save(&self, token: &str) {
        if let Err(err) = self.storage.set(TOKEN_KEY, token) {
            log::warn!("Failed to persist auth token: {}", err);
        }
    }

    pub fn erase(&self) {
        if let Err(err) = self.storage.remove(TOKEN_KEY) {
            log::warn!("Failed to erase auth token: {}", err);
        }
    }
}
