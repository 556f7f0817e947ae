//! vmod - Virtual Module Store
//!
//! Lets a source-generation step inject virtual modules into a host build
//! tool's module graph. Writes requested before a registry has attached to
//! the build pipeline are queued and replayed in order, and generated
//! content plus per-module dependency lists persist across build runs.

pub mod cache;
pub mod config;
pub mod error;
pub mod registry;
pub mod store;

pub use config::{CacheConfig, StoreConfig};
pub use error::{VmodError, VmodResult};
pub use registry::{DeferredWriteAdapter, MemoryHost, MemoryModules, VirtualModules};
pub use store::{BootstrapState, Lookup, ModuleStore};
