//! Persistent key/value backend for the cache tiers
//!
//! The tiers only see the [`CacheBackend`] trait. [`FsCache`] is the
//! file-system implementation: one JSON file per key, named after hashes
//! of the tier, the namespace and the key so that several namespaces can
//! share a directory without seeing each other's entries.

use crate::config::CacheNamespace;
use crate::error::{VmodError, VmodResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// A persisted entry as stored by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// Key the entry was stored under
    pub key: String,

    /// Stored value
    pub value: Value,

    /// When the entry was written
    pub cached_at: DateTime<Utc>,
}

impl CacheRecord {
    /// Create a record stamped with the current time
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
            cached_at: Utc::now(),
        }
    }
}

/// Abstract namespaced key/value store
///
/// Failures are returned to the caller as-is; backends never retry.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get the value stored under `key`, if any
    async fn get(&self, key: &str) -> VmodResult<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: Value) -> VmodResult<()>;

    /// Remove the entry stored under `key`. Missing keys are not an error.
    async fn remove(&self, key: &str) -> VmodResult<()>;

    /// Load every entry in this backend's namespace, ordered by key
    async fn load(&self) -> VmodResult<Vec<CacheRecord>>;

    /// Remove every entry in this backend's namespace
    async fn clear(&self) -> VmodResult<()>;

    /// Namespace tag this backend is scoped to
    fn namespace(&self) -> &str;
}

/// Hash a string using SHA256, returning first 12 hex chars
fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..6])
}

/// File-system cache backend
pub struct FsCache {
    base_path: PathBuf,
    namespace: String,
    prefix: String,
}

impl FsCache {
    /// Create a backend for the given namespace. Nothing touches the disk
    /// until the first write.
    pub fn new(ns: &CacheNamespace) -> Self {
        Self {
            base_path: ns.base_path.clone(),
            namespace: ns.namespace.clone(),
            prefix: format!(
                "{}-",
                short_hash(&format!("{}:{}", ns.tier.as_str(), ns.namespace))
            ),
        }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.base_path
            .join(format!("{}{}.json", self.prefix, short_hash(key)))
    }

    fn owns(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        name.starts_with(&self.prefix) && name.ends_with(".json")
    }

    async fn read_record(&self, path: &Path) -> VmodResult<CacheRecord> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| VmodError::io(format!("reading cache file {}", path.display()), e))?;

        serde_json::from_str(&content)
            .map_err(|e| VmodError::record_invalid(path, e.to_string()))
    }

    async fn owned_entries(&self) -> VmodResult<Vec<PathBuf>> {
        if !self.base_path.exists() {
            return Ok(vec![]);
        }

        let mut paths = vec![];
        let mut entries = fs::read_dir(&self.base_path)
            .await
            .map_err(|e| VmodError::io("reading cache directory", e))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| VmodError::io("reading cache entry", e))?
        {
            let path = entry.path();
            if self.owns(&path) {
                paths.push(path);
            }
        }

        Ok(paths)
    }
}

#[async_trait]
impl CacheBackend for FsCache {
    async fn get(&self, key: &str) -> VmodResult<Option<Value>> {
        let path = self.entry_path(key);

        if !path.exists() {
            return Ok(None);
        }

        let record = self.read_record(&path).await?;
        if record.key != key {
            return Err(VmodError::record_invalid(
                &path,
                format!("expected key {}, found {}", key, record.key),
            ));
        }

        debug!("Cache hit {} in namespace {}", key, self.namespace);
        Ok(Some(record.value))
    }

    async fn set(&self, key: &str, value: Value) -> VmodResult<()> {
        fs::create_dir_all(&self.base_path).await.map_err(|e| {
            VmodError::io(
                format!("creating cache directory {}", self.base_path.display()),
                e,
            )
        })?;

        let path = self.entry_path(key);
        let content = serde_json::to_string_pretty(&CacheRecord::new(key, value))?;
        fs::write(&path, content)
            .await
            .map_err(|e| VmodError::io(format!("writing cache file {}", path.display()), e))?;

        debug!("Cached {} in namespace {}", key, self.namespace);
        Ok(())
    }

    async fn remove(&self, key: &str) -> VmodResult<()> {
        let path = self.entry_path(key);
        if path.exists() {
            fs::remove_file(&path).await.map_err(|e| {
                VmodError::io(format!("removing cache file {}", path.display()), e)
            })?;
        }
        Ok(())
    }

    async fn load(&self) -> VmodResult<Vec<CacheRecord>> {
        let mut records = vec![];
        for path in self.owned_entries().await? {
            records.push(self.read_record(&path).await?);
        }

        records.sort_by(|a, b| a.key.cmp(&b.key));

        debug!(
            "Loaded {} entries from namespace {}",
            records.len(),
            self.namespace
        );
        Ok(records)
    }

    async fn clear(&self) -> VmodResult<()> {
        for path in self.owned_entries().await? {
            fs::remove_file(&path)
                .await
                .map_err(|e| VmodError::io("removing cache file", e))?;
        }
        Ok(())
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }
}
