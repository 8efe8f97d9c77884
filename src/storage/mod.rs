//! Key-value persistence collaborator
//!
//! The processing engine persists its cache mapping as a single JSON
//! value under a fixed key. [`FileStore`] keeps one JSON file per key
//! under a data directory; [`MemoryStore`] backs tests and ephemeral
//! deployments.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Generic codable persistence.
///
/// Read failures are treated as non-fatal by callers (fall back to an
/// empty value); write failures are surfaced on the warning channel and
/// never propagated past the store boundary by the processing engine.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Persist a value under the given key, replacing any previous value
    async fn store(&self, key: &str, value: Value) -> Result<()>;

    /// Read the value stored under the given key, `None` when absent
    async fn read(&self, key: &str) -> Result<Option<Value>>;
}

/// File-backed store keeping one JSON file per key
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at the given directory, creating it if needed
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// Default data directory (~/.fhirsight/)
    pub fn default_dir() -> PathBuf {
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".fhirsight")
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are fixed constants, but guard against separators anyway
        let safe: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn store(&self, key: &str, value: Value) -> Result<()> {
        let path = self.path_for(key);
        let data = serde_json::to_vec_pretty(&value)?;
        tokio::fs::write(&path, data).await?;
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and ephemeral deployments
#[derive(Default)]
pub struct MemoryStore {
    values: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn store(&self, key: &str, value: Value) -> Result<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.read("missing").await.unwrap().is_none());

        store.store("k", json!({"a": 1})).await.unwrap();
        assert_eq!(store.read("k").await.unwrap(), Some(json!({"a": 1})));

        store.store("k", json!({"a": 2})).await.unwrap();
        assert_eq!(store.read("k").await.unwrap(), Some(json!({"a": 2})));
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();

        assert!(store.read("summaries").await.unwrap().is_none());

        store.store("summaries", json!({"obs-1": "text"})).await.unwrap();
        let read_back = store.read("summaries").await.unwrap();
        assert_eq!(read_back, Some(json!({"obs-1": "text"})));
    }

    #[tokio::test]
    async fn test_file_store_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).await.unwrap();

        store.store("a/b", json!(1)).await.unwrap();
        assert_eq!(store.read("a/b").await.unwrap(), Some(json!(1)));
        assert!(dir.path().join("a_b.json").exists());
    }
}
