//! Dependency tier: the real files each synthetic module was generated from

use crate::cache::backend::CacheBackend;
use crate::error::VmodResult;
use serde_json::Value;

/// Dependencies of one synthetic module, order preserved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyEntry {
    pub module_path: String,
    pub deps: Vec<String>,
}

impl DependencyEntry {
    /// Create a new dependency entry
    pub fn new(module_path: impl Into<String>, deps: Vec<String>) -> Self {
        Self {
            module_path: module_path.into(),
            deps,
        }
    }
}

/// Persistent store of per-module dependency lists
pub struct DependencyCache {
    backend: Box<dyn CacheBackend>,
}

impl DependencyCache {
    /// Wrap a backend scoped to the dependency namespace
    pub fn new(backend: Box<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Persist the dependency list of a module, replacing any previous list
    pub async fn set(&self, entry: &DependencyEntry) -> VmodResult<()> {
        let value = Value::Array(entry.deps.iter().cloned().map(Value::String).collect());
        self.backend.set(&entry.module_path, value).await
    }

    /// Get the dependency list of a module
    pub async fn get(&self, module_path: &str) -> VmodResult<Option<Vec<String>>> {
        match self.backend.get(module_path).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Forget the dependency list of a module
    pub async fn remove(&self, module_path: &str) -> VmodResult<()> {
        self.backend.remove(module_path).await
    }

    /// Remove every dependency list in this namespace
    pub async fn clear(&self) -> VmodResult<()> {
        self.backend.clear().await
    }
}
