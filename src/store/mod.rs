//! Virtual module store
//!
//! The [`ModuleStore`] owns every named registry adapter created for a build,
//! fans module writes out to all of them, and keeps the content and
//! dependency cache tiers in sync across build runs.

mod bootstrap;
mod lookup;
mod manager;

pub use bootstrap::BootstrapState;
pub use lookup::Lookup;
pub use manager::{ModuleStore, DEFAULT_STORE_NAME};
