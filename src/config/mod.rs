//! Configuration and cache namespace resolution

pub mod schema;

pub use schema::{CacheConfig, StoreConfig};

use std::path::{Path, PathBuf};

/// Tool name used for the default cache directory and the per-mode subdirectory
pub const TOOL_NAME: &str = "vmod";

/// Suffix appended to the version tag for the dependency tier
pub const DEPS_NAMESPACE_SUFFIX: &str = "-deps";

/// Which tier a namespace belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheTier {
    /// Generated module content
    Content,
    /// Per-module dependency lists
    Dependencies,
}

impl CacheTier {
    /// Stable tag mixed into entry file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Dependencies => "deps",
        }
    }
}

/// Location of one persistent cache tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNamespace {
    /// Directory holding the tier's entry files
    pub base_path: PathBuf,

    /// Tier this namespace stores
    pub tier: CacheTier,

    /// Namespace tag isolating this tier from others in the same directory
    pub namespace: String,
}

impl CacheNamespace {
    /// Namespace of the content tier
    pub fn content(base_dir: &Path, mode: &str, version: &str) -> Self {
        Self {
            base_path: mode_dir(base_dir, mode),
            tier: CacheTier::Content,
            namespace: version.to_string(),
        }
    }

    /// Namespace of the dependency tier
    pub fn dependencies(base_dir: &Path, mode: &str, version: &str) -> Self {
        Self {
            base_path: mode_dir(base_dir, mode),
            tier: CacheTier::Dependencies,
            namespace: format!("{}{}", version, DEPS_NAMESPACE_SUFFIX),
        }
    }
}

/// Get the default base cache directory (`<cwd>/.vmod-cache`)
pub fn default_cache_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(format!(".{}-cache", TOOL_NAME))
}

/// Resolve both tier namespaces for a configuration.
///
/// Returns `None` when the configuration has no cache section.
pub fn resolve_namespaces(config: &StoreConfig) -> Option<(CacheNamespace, CacheNamespace)> {
    let cache = config.cache.as_ref()?;
    let base_dir = cache
        .cache_directory
        .clone()
        .unwrap_or_else(default_cache_dir);

    Some((
        CacheNamespace::content(&base_dir, &config.mode, &cache.version),
        CacheNamespace::dependencies(&base_dir, &config.mode, &cache.version),
    ))
}

fn mode_dir(base_dir: &Path, mode: &str) -> PathBuf {
    base_dir.join(format!("{}-{}", TOOL_NAME, mode))
}
