//! Device-local mirror of the last and best results.
//!
//! The gateway stays the source of truth; this cache only lets the start
//! screen show results without a backend round trip.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::warn;

/// Key holding the most recent result in milliseconds.
pub const PREVIOUS_RESULT_KEY: &str = "previousResult";
/// Key holding the best local result in milliseconds.
pub const BEST_RESULT_KEY: &str = "bestResult";
/// File name of the local store inside the data directory.
pub const LOCAL_STORE_FILE: &str = "local.json";

/// Local storage failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// Backing file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// Items could not be serialised.
    #[error("failed to serialise {}: {source}", path.display())]
    Serialization {
        /// Backing file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// String key-value storage on the device.
pub trait LocalStore: Send + Sync {
    /// Value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// [`LocalStore`] backed by one JSON object file.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// Store items in `local.json` under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            path: root.into().join(LOCAL_STORE_FILE),
            lock: Mutex::new(()),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;
        match serde_json::from_str(&content) {
            Ok(items) => Ok(items),
            Err(err) => {
                warn!(path = %self.path.display(), "discarding unreadable local store: {err}");
                Ok(BTreeMap::new())
            }
        }
    }

    fn write(&self, items: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let io = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io)?;
        }
        let serialised =
            serde_json::to_vec_pretty(items).map_err(|source| StoreError::Serialization {
                path: self.path.clone(),
                source,
            })?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serialised).map_err(io)?;
        fs::rename(&staging, &self.path).map_err(io)
    }
}

impl LocalStore for JsonFileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock();
        Ok(self.read()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut items = self.read()?;
        items.insert(key.to_string(), value.to_string());
        self.write(&items)
    }
}

/// In-memory [`LocalStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.items.read().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Typed access to the cached previous and best results.
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn LocalStore>,
}

impl ResultCache {
    /// Wrap a store.
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    /// Most recent result.
    pub fn previous(&self) -> Result<Option<Duration>, StoreError> {
        self.read(PREVIOUS_RESULT_KEY)
    }

    /// Best result seen on this device.
    pub fn best(&self) -> Result<Option<Duration>, StoreError> {
        self.read(BEST_RESULT_KEY)
    }

    /// Record a finished round. Returns `true` when it became the local best.
    pub fn record(&self, elapsed: Duration) -> Result<bool, StoreError> {
        let millis = elapsed.as_millis().to_string();
        self.store.set_item(PREVIOUS_RESULT_KEY, &millis)?;
        let improved = self.best()?.map_or(true, |best| elapsed < best);
        if improved {
            self.store.set_item(BEST_RESULT_KEY, &millis)?;
        }
        Ok(improved)
    }

    fn read(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let Some(raw) = self.store.get_item(key)? else {
            return Ok(None);
        };
        match raw.trim().parse::<u64>() {
            Ok(millis) => Ok(Some(Duration::from_millis(millis))),
            Err(err) => {
                warn!(key, value = %raw, "ignoring unreadable cached result: {err}");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_store_persists_items() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path());
        assert_eq!(store.get_item("missing")?, None);
        store.set_item("a", "1")?;
        store.set_item("b", "2")?;
        store.set_item("a", "3")?;

        let reopened = JsonFileStore::new(dir.path());
        assert_eq!(reopened.get_item("a")?.as_deref(), Some("3"));
        assert_eq!(reopened.get_item("b")?.as_deref(), Some("2"));
        assert!(reopened.path().ends_with(LOCAL_STORE_FILE));
        Ok(())
    }

    #[test]
    fn corrupt_file_is_replaced_on_next_record() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let store = Arc::new(JsonFileStore::new(dir.path()));
        fs::write(store.path(), "{oops")?;
        let cache = ResultCache::new(store.clone());

        assert_eq!(cache.previous()?, None);
        assert!(cache.record(Duration::from_secs(12))?);
        assert!(!cache.record(Duration::from_secs(15))?);
        assert_eq!(cache.previous()?, Some(Duration::from_secs(15)));
        assert_eq!(cache.best()?, Some(Duration::from_secs(12)));

        let on_disk: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(store.path())?)?;
        assert_eq!(on_disk.get(PREVIOUS_RESULT_KEY).map(String::as_str), Some("15000"));
        assert!(!store.path().with_extension("json.tmp").exists());
        Ok(())
    }

    #[test]
    fn record_keeps_previous_and_best() -> anyhow::Result<()> {
        let cache = ResultCache::new(Arc::new(MemoryStore::new()));
        assert_eq!(cache.previous()?, None);
        assert_eq!(cache.best()?, None);

        assert!(cache.record(Duration::from_millis(40_000))?);
        assert!(!cache.record(Duration::from_millis(45_000))?);
        assert_eq!(cache.previous()?, Some(Duration::from_millis(45_000)));
        assert_eq!(cache.best()?, Some(Duration::from_millis(40_000)));

        assert!(!cache.record(Duration::from_millis(40_000))?);
        assert!(cache.record(Duration::from_millis(39_990))?);
        assert_eq!(cache.best()?, Some(Duration::from_millis(39_990)));
        Ok(())
    }

    #[test]
    fn unreadable_values_count_as_absent() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        store.set_item(BEST_RESULT_KEY, "fast")?;
        let cache = ResultCache::new(store);
        assert_eq!(cache.best()?, None);
        assert!(cache.record(Duration::from_secs(50))?);
        assert_eq!(cache.best()?, Some(Duration::from_secs(50)));
        Ok(())
    }
}
