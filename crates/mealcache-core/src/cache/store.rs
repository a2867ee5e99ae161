use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};

/// Flat string key-value storage.
///
/// Values are opaque strings (JSON in practice). Implementations must be
/// safe to share between the UI loop and background tasks.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Stores each key as `<dir>/<key>.json`.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create storage directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read storage file: {}", key))?;
        Ok(Some(contents))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // write-then-rename: readers see the old value or the new one
        let path = self.path(key);
        let tmp = self.dir.join(format!("{}.json.tmp", key));
        std::fs::write(&tmp, value)
            .with_context(|| format!("Failed to write storage file: {}", key))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace storage file: {}", key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove storage file: {}", key))?;
        }
        Ok(())
    }
}

/// In-memory store, used by tests and as a fallback when no directory is writable.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow::anyhow!("Memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested")).unwrap();

        assert_eq!(store.get("meal.favorites.v1").unwrap(), None);
        store.set("meal.favorites.v1", "[]").unwrap();
        assert_eq!(store.get("meal.favorites.v1").unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("nested/meal.favorites.v1.json").exists());

        store.set("meal.favorites.v1", "[1]").unwrap();
        assert_eq!(store.get("meal.favorites.v1").unwrap().as_deref(), Some("[1]"));

        store.remove("meal.favorites.v1").unwrap();
        assert_eq!(store.get("meal.favorites.v1").unwrap(), None);
        // Removing a missing key is fine
        store.remove("meal.favorites.v1").unwrap();
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
    }
}
