//! Persistence layer for the daily price cache
//!
//! A small durable key-value store: one JSON object per file, mapping keys
//! such as `prices20240101` or `hue_id` to raw string values. Writers take an
//! exclusive lock on a sibling lock file for the whole read-fetch-write
//! sequence so two invocations cannot race on the same day's key.

use crate::error::{PumpError, Result};
use crate::logging::{StructuredLogger, get_logger};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Durable key-value store used for the price cache and bridge credentials
pub trait PriceStore: Send + Sync {
    /// Fetch the raw value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Take the store-wide exclusive lock; released when the guard drops
    fn lock(&self) -> Result<StoreGuard>;

    /// Whether `key` is present
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

/// Scoped exclusive lock on a store
#[derive(Debug)]
pub struct StoreGuard {
    file: File,
}

impl Drop for StoreGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// JSON file backed store
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
    logger: StructuredLogger,
}

impl FileStore {
    /// Create a store at `path` guarded by `lock_path`
    pub fn new<P: AsRef<Path>, L: AsRef<Path>>(path: P, lock_path: L) -> Self {
        let path = path.as_ref().to_path_buf();
        let logger = get_logger("persistence").with_field("path", path.display());
        Self {
            path,
            lock_path: lock_path.as_ref().to_path_buf(),
            logger,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .map_err(|e| PumpError::cache(format!("cannot read {}: {}", self.path.display(), e)))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents)
            .map_err(|e| PumpError::cache(format!("corrupt store {}: {}", self.path.display(), e)))
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let contents = serde_json::to_string_pretty(entries)?;
        // Write next to the target and rename so readers never see a torn file
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, contents)
            .and_then(|()| std::fs::rename(&tmp, &self.path))
            .map_err(|e| PumpError::cache(format!("cannot write {}: {}", self.path.display(), e)))
    }
}

impl PriceStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries)?;
        self.logger.debug(&format!("Stored {} ({} bytes)", key, value.len()));
        Ok(())
    }

    fn lock(&self) -> Result<StoreGuard> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| {
                PumpError::cache(format!("cannot open lock {}: {}", self.lock_path.display(), e))
            })?;
        file.lock().map_err(|e| {
            PumpError::cache(format!("cannot lock {}: {}", self.lock_path.display(), e))
        })?;
        self.logger.trace("Acquired store lock");
        Ok(StoreGuard { file })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> FileStore {
        FileStore::new(dir.path().join("cache.json"), dir.path().join("cache.json.lock"))
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.get("prices20240101").unwrap(), None);
        assert!(!store.contains("prices20240101").unwrap());
    }

    #[test]
    fn set_then_get_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        store_in(&dir).set("prices20240101", "[]").unwrap();
        store_in(&dir).set("hue_id", "abc").unwrap();

        let store = store_in(&dir);
        assert_eq!(store.get("prices20240101").unwrap().as_deref(), Some("[]"));
        assert_eq!(store.get("hue_id").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn corrupt_file_is_cache_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{not json").unwrap();
        let err = store.get("x").unwrap_err();
        assert!(matches!(err, PumpError::CacheUnavailable { .. }));
    }

    #[test]
    fn lock_in_missing_dir_is_cache_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(
            dir.path().join("cache.json"),
            dir.path().join("missing").join("cache.lock"),
        );
        let err = store.lock().unwrap_err();
        assert!(matches!(err, PumpError::CacheUnavailable { .. }));
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        drop(store.lock().unwrap());
        let lock_file = File::open(dir.path().join("cache.json.lock")).unwrap();
        assert!(lock_file.try_lock().is_ok());
    }
}
