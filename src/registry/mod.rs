//! Virtual module registries
//!
//! Provides the capability trait a host build tool's virtual module registry
//! implements, and the adapter that makes writes to it safe before the
//! registry has attached to the build pipeline.

mod adapter;
mod modules;

pub use adapter::{AfterInitTask, AttachOutcome, DeferredWriteAdapter, TaskOutcome};
pub use modules::{MemoryHost, MemoryModules, ModuleMap, VirtualModules};
