//! Persistent cache tiers
//!
//! Two tiers share one base directory (`<cache_dir>/vmod-<mode>`) but live
//! in disjoint namespaces:
//!
//! | Tier | Namespace | Value |
//! |------|-----------|-------|
//! | Content | `<version>` | `{ content, path }` |
//! | Dependencies | `<version>-deps` | ordered list of paths |
//!
//! Entries written under one version are never visible under another.

pub mod backend;
pub mod content;
pub mod deps;

pub use backend::{CacheBackend, CacheRecord, FsCache};
pub use content::{ContentCache, ModuleEntry};
pub use deps::{DependencyCache, DependencyEntry};
