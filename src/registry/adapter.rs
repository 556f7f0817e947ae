//! Deferred-write adapter
//!
//! Wraps a [`VirtualModules`] registry and queues writes requested before the
//! registry has attached to the host pipeline.
//!
//! # States
//!
//! | State | `run_task_after_init` | `attach` |
//! |-------|-----------------------|----------|
//! | Uninitialized | queue task | register, replay queue in order |
//! | Initialized | run task now | no-op |
//!
//! Initialized is terminal. The queue is only non-empty while Uninitialized
//! and is drained exactly once.

use crate::registry::modules::VirtualModules;
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Work to run against the wrapped registry once it is live
pub type AfterInitTask<R> = Box<dyn FnOnce(&mut R) + Send>;

/// What `run_task_after_init` did with a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Queued until attachment
    Deferred,
    /// Ran synchronously
    Executed,
}

/// Result of an `attach` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// Registered with the host and replayed this many queued tasks
    Attached { replayed: usize },
    /// Already initialized; nothing happened
    AlreadyAttached,
}

struct AdapterState<R> {
    registry: R,
    initialized: bool,
    pending: VecDeque<AfterInitTask<R>>,
}

/// Named wrapper around a virtual module registry
pub struct DeferredWriteAdapter<R: VirtualModules> {
    name: String,
    state: Mutex<AdapterState<R>>,
}

impl<R: VirtualModules> DeferredWriteAdapter<R> {
    /// Wrap `registry` in the Uninitialized state
    pub fn new(name: impl Into<String>, registry: R) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(AdapterState {
                registry,
                initialized: false,
                pending: VecDeque::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, AdapterState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Name this adapter is registered under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the adapter has attached to its host
    pub fn is_initialized(&self) -> bool {
        self.state().initialized
    }

    /// Number of tasks waiting for attachment
    pub fn pending_len(&self) -> usize {
        self.state().pending.len()
    }

    /// Run `task` now if attached, otherwise queue it for attachment
    pub fn run_task_after_init<F>(&self, task: F) -> TaskOutcome
    where
        F: FnOnce(&mut R) + Send + 'static,
    {
        let mut state = self.state();
        if !state.initialized {
            state.pending.push_back(Box::new(task));
            return TaskOutcome::Deferred;
        }

        task(&mut state.registry);
        TaskOutcome::Executed
    }

    /// Write a module through the deferred-write queue
    pub fn write_module(&self, path: impl Into<String>, content: impl Into<String>) -> TaskOutcome {
        let path = path.into();
        let content = content.into();
        let outcome = self.run_task_after_init(move |registry: &mut R| {
            registry.write_module(&path, &content);
        });

        if outcome == TaskOutcome::Deferred {
            debug!("Deferred module write on store {}", self.name);
        }
        outcome
    }

    /// Attach the wrapped registry to `host` and replay queued tasks in order
    pub fn attach(&self, host: &mut R::Host) -> AttachOutcome {
        let mut guard = self.state();
        let state = &mut *guard;

        if state.initialized {
            debug!("Store {} already attached", self.name);
            return AttachOutcome::AlreadyAttached;
        }

        state.registry.attach(host);
        state.initialized = true;

        let pending = std::mem::take(&mut state.pending);
        let replayed = pending.len();
        for task in pending {
            task(&mut state.registry);
        }

        debug!("Attached store {}, replayed {} writes", self.name, replayed);
        AttachOutcome::Attached { replayed }
    }

    /// Read access to the wrapped registry
    pub fn with_registry<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        f(&self.state().registry)
    }
}

impl<R: VirtualModules> fmt::Debug for DeferredWriteAdapter<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("DeferredWriteAdapter")
            .field("name", &self.name)
            .field("initialized", &state.initialized)
            .field("pending", &state.pending.len())
            .finish()
    }
}
