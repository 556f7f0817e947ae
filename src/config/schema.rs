//! Configuration schema for vmod
//!
//! Mirrors the subset of a host build configuration the store cares about:
//! the build mode and an optional file-system cache section.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Build mode (e.g. "development", "production")
    pub mode: String,

    /// Persistent cache settings. `None` runs the store cache-disabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheConfig>,
}

impl StoreConfig {
    /// Configuration without a persistent cache
    pub fn uncached(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            cache: None,
        }
    }

    /// Configuration with a persistent cache
    pub fn cached(mode: impl Into<String>, cache: CacheConfig) -> Self {
        Self {
            mode: mode.into(),
            cache: Some(cache),
        }
    }
}

/// File-system cache settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Base cache directory. Defaults to `.vmod-cache` under the working directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_directory: Option<PathBuf>,

    /// Version tag; entries written under other versions are invisible
    pub version: String,
}

impl CacheConfig {
    /// Cache section with the default directory
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            cache_directory: None,
            version: version.into(),
        }
    }

    /// Override the base cache directory
    pub fn with_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_directory = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_cached_config() {
        let config: StoreConfig = toml::from_str(
            r#"
            mode = "production"

            [cache]
            cache_directory = "/tmp/build-cache"
            version = "v1"
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, "production");
        let cache = config.cache.unwrap();
        assert_eq!(cache.cache_directory, Some(PathBuf::from("/tmp/build-cache")));
        assert_eq!(cache.version, "v1");
    }

    #[test]
    fn missing_cache_section_disables_cache() {
        let config: StoreConfig = toml::from_str(r#"mode = "development""#).unwrap();
        assert_eq!(config, StoreConfig::uncached("development"));
    }

    #[test]
    fn cache_directory_is_optional() {
        let config: StoreConfig = toml::from_str(
            r#"
            mode = "development"
            [cache]
            version = "abc"
            "#,
        )
        .unwrap();

        assert_eq!(
            config,
            StoreConfig::cached("development", CacheConfig::new("abc"))
        );
    }
}
