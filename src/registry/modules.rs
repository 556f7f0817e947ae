//! Virtual module capability
//!
//! Provides a trait for the host build tool's virtual module registry so the
//! deferred-write adapter can wrap any implementation, plus an in-memory
//! implementation with a stub host.

use std::collections::BTreeMap;

/// Mapping of module path to generated content
pub type ModuleMap = BTreeMap<String, String>;

/// Abstract virtual module registry
///
/// Implementations own the module map the host reads from. `attach` is
/// invoked once, by the host pipeline during its setup phase.
pub trait VirtualModules: Send + 'static {
    /// Host pipeline this registry attaches to
    type Host: ?Sized;

    /// Create a registry pre-populated with `modules`
    fn seeded(modules: ModuleMap) -> Self
    where
        Self: Sized;

    /// Write (or overwrite) a module
    fn write_module(&mut self, path: &str, content: &str);

    /// Perform the one-time registration with the host pipeline
    fn attach(&mut self, host: &mut Self::Host);
}

/// Stub host pipeline that only counts attachments
#[derive(Debug, Default)]
pub struct MemoryHost {
    attachments: usize,
}

impl MemoryHost {
    /// Create a new host
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registries attached so far
    pub fn attachments(&self) -> usize {
        self.attachments
    }
}

/// In-memory virtual module registry
#[derive(Debug, Default, Clone)]
pub struct MemoryModules {
    modules: ModuleMap,
    attached: bool,
}

impl MemoryModules {
    /// Get a module's content
    pub fn get(&self, path: &str) -> Option<&str> {
        self.modules.get(path).map(String::as_str)
    }

    /// All modules currently held
    pub fn modules(&self) -> &ModuleMap {
        &self.modules
    }

    /// Whether `attach` has run
    pub fn is_attached(&self) -> bool {
        self.attached
    }
}

impl VirtualModules for MemoryModules {
    type Host = MemoryHost;

    fn seeded(modules: ModuleMap) -> Self {
        Self {
            modules,
            attached: false,
        }
    }

    fn write_module(&mut self, path: &str, content: &str) {
        self.modules.insert(path.to_string(), content.to_string());
    }

    fn attach(&mut self, host: &mut MemoryHost) {
        host.attachments += 1;
        self.attached = true;
    }
}
