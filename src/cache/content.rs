//! Content tier: generated module source keyed by module path

use crate::cache::backend::CacheBackend;
use crate::error::VmodResult;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A synthetic source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEntry {
    /// Generated source
    pub content: String,

    /// Module path, unique within the tier
    pub path: String,
}

impl ModuleEntry {
    /// Create a new module entry
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            path: path.into(),
        }
    }
}

/// Persistent store of generated module content
pub struct ContentCache {
    backend: Box<dyn CacheBackend>,
}

impl ContentCache {
    /// Wrap a backend scoped to the content namespace
    pub fn new(backend: Box<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Persist a module, keyed by its path
    pub async fn set(&self, entry: &ModuleEntry) -> VmodResult<()> {
        self.backend
            .set(&entry.path, serde_json::to_value(entry)?)
            .await
    }

    /// Forget a persisted module
    pub async fn remove_module(&self, path: &str) -> VmodResult<()> {
        self.backend.remove(path).await
    }

    /// Load every persisted module in this namespace
    pub async fn load(&self) -> VmodResult<Vec<ModuleEntry>> {
        let records = self.backend.load().await?;
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            entries.push(serde_json::from_value::<ModuleEntry>(record.value)?);
        }

        debug!(
            "Loaded {} cached modules (namespace {})",
            entries.len(),
            self.backend.namespace()
        );
        Ok(entries)
    }

    /// Remove every persisted module in this namespace
    pub async fn clear(&self) -> VmodResult<()> {
        self.backend.clear().await
    }
}
