use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use engine_logging::{engine_debug, engine_warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::events::{ChangeBus, StorageChange, StorageEvents, Subscription};
use crate::persist::{AtomicFileWriter, PersistIoError};

/// Same order of magnitude as a browser's per-origin localStorage quota.
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage quota exceeded ({needed} of {limit} bytes)")]
    QuotaExceeded { needed: u64, limit: u64 },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("malformed storage file: {0}")]
    Format(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistIoError),
}

/// Raw key/value medium. Implementations report failures; the adapter
/// absorbs them.
pub trait StorageBackend: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// All keys in one RON map file, rewritten atomically on every mutation.
///
/// The file is re-read on every access so separate processes sharing it see
/// each other's writes.
pub struct FileBackend {
    path: PathBuf,
    quota_bytes: u64,
    lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_quota(path, DEFAULT_QUOTA_BYTES)
    }

    pub fn with_quota(path: impl Into<PathBuf>, quota_bytes: u64) -> Self {
        Self {
            path: path.into(),
            quota_bytes,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(err) => return Err(err.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        ron::from_str(&content).map_err(|err| StorageError::Format(err.to_string()))
    }

    fn store(&self, map: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(map, pretty)
            .map_err(|err| StorageError::Format(err.to_string()))?;
        let needed = content.len() as u64;
        if needed > self.quota_bytes {
            return Err(StorageError::QuotaExceeded {
                needed,
                limit: self.quota_bytes,
            });
        }

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let filename = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| StorageError::Unavailable(format!("bad store path {:?}", self.path)))?;
        AtomicFileWriter::new(dir).write(filename, &content)?;
        Ok(())
    }

    /// Reads tolerate a corrupt file as empty, but writes must not silently
    /// discard whatever is there.
    fn load_for_update(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match self.load() {
            Err(StorageError::Format(reason)) => {
                engine_warn!(
                    "Replacing unreadable storage file {:?}: {}",
                    self.path,
                    reason
                );
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.load_for_update()?;
        map.insert(key.to_string(), value.to_string());
        self.store(&map)
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.load_for_update()?;
        if map.remove(key).is_some() {
            self.store(&map)?;
        }
        Ok(())
    }
}

/// In-memory medium for tests and fakes. Writes can be made to fail to
/// exercise the quota path.
#[derive(Default)]
pub struct MemoryBackend {
    map: Mutex<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    pub fn keys(&self) -> Vec<String> {
        self.map
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StorageError::QuotaExceeded {
                needed: value.len() as u64,
                limit: 0,
            });
        }
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        map.remove(key);
        Ok(())
    }
}

/// Failure-tolerant handle over a [`StorageBackend`].
///
/// `get`, `set` and `remove` never fail: backend errors are logged and turn
/// into `None` / `false`. Each handle has its own origin on the change bus;
/// [`StorageAdapter::new_tab`] makes a sibling that observes this one's writes.
#[derive(Clone)]
pub struct StorageAdapter {
    backend: Arc<dyn StorageBackend>,
    events: Arc<dyn StorageEvents>,
    origin: u64,
}

impl StorageAdapter {
    pub fn new(backend: Arc<dyn StorageBackend>, events: Arc<dyn StorageEvents>) -> Self {
        let origin = events.next_origin();
        Self {
            backend,
            events,
            origin,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()), Arc::new(ChangeBus::new()))
    }

    pub fn open_file(path: impl Into<PathBuf>, quota_bytes: u64) -> Self {
        Self::new(
            Arc::new(FileBackend::with_quota(path, quota_bytes)),
            Arc::new(ChangeBus::new()),
        )
    }

    /// Another view on the same medium and bus, with its own origin.
    pub fn new_tab(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            events: Arc::clone(&self.events),
            origin: self.events.next_origin(),
        }
    }

    pub fn origin(&self) -> u64 {
        self.origin
    }

    pub fn subscribe(&self) -> Subscription {
        self.events.subscribe(self.origin)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self.backend.read(key) {
            Ok(value) => value,
            Err(err) => {
                engine_warn!("Storage read failed for {}: {}", key, err);
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: &str) -> bool {
        match self.backend.write(key, value) {
            Ok(()) => {
                self.publish(key, Some(value.to_string()));
                true
            }
            Err(err) => {
                engine_warn!("Storage write failed for {}: {}", key, err);
                false
            }
        }
    }

    pub fn remove(&self, key: &str) {
        match self.backend.delete(key) {
            Ok(()) => self.publish(key, None),
            Err(err) => engine_warn!("Storage remove failed for {}: {}", key, err),
        }
    }

    /// Malformed JSON reads as absent.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                engine_debug!("Ignoring malformed JSON under {}: {}", key, err);
                None
            }
        }
    }

    pub fn get_json_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.get_json(key).unwrap_or_default()
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, &raw),
            Err(err) => {
                engine_warn!("Could not serialize value for {}: {}", key, err);
                false
            }
        }
    }

    fn publish(&self, key: &str, new_value: Option<String>) {
        self.events.publish(StorageChange {
            key: key.to_string(),
            new_value,
            origin: self.origin,
        });
    }
}
