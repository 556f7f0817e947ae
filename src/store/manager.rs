//! Module store lifecycle: adapter registry, fan-out writes, cache bootstrap

use crate::cache::{
    CacheBackend, ContentCache, DependencyCache, DependencyEntry, FsCache, ModuleEntry,
};
use crate::config::{resolve_namespaces, StoreConfig};
use crate::error::{VmodError, VmodResult};
use crate::registry::{DeferredWriteAdapter, ModuleMap, VirtualModules};
use crate::store::bootstrap::BootstrapState;
use crate::store::lookup::Lookup;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Name used by [`ModuleStore::create_default_store`]
pub const DEFAULT_STORE_NAME: &str = "default";

type AdapterMap<R> = BTreeMap<String, Arc<DeferredWriteAdapter<R>>>;

struct StoreInner<R: VirtualModules> {
    adapters: Mutex<AdapterMap<R>>,
    snapshot: Mutex<ModuleMap>,
    content: Option<ContentCache>,
    deps: Option<DependencyCache>,
    bootstrap: watch::Sender<BootstrapState>,
}

impl<R: VirtualModules> StoreInner<R> {
    fn adapters(&self) -> MutexGuard<'_, AdapterMap<R>> {
        self.adapters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> MutexGuard<'_, ModuleMap> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue (or run) a write on every registered adapter
    fn fan_out(&self, path: &str, content: &str) {
        let adapters: Vec<_> = self.adapters().values().cloned().collect();
        for adapter in adapters {
            adapter.write_module(path, content);
        }
    }

    /// Apply one persisted entry: remember it for future adapters and
    /// write it to the ones that already exist
    ///
    /// An adapter created between the two steps gets the entry twice; the
    /// second write is identical and therefore harmless.
    fn seed(&self, entry: &ModuleEntry) {
        self.snapshot()
            .insert(entry.path.clone(), entry.content.clone());
        self.fan_out(&entry.path, &entry.content);
    }
}

/// Marks bootstrap as failed if its task ends without settling, whether
/// through a panic or because the runtime dropped the task unpolled
struct BootstrapGuard<R: VirtualModules> {
    inner: Arc<StoreInner<R>>,
}

impl<R: VirtualModules> Drop for BootstrapGuard<R> {
    fn drop(&mut self) {
        self.inner.bootstrap.send_if_modified(|state| {
            if state.is_settled() {
                return false;
            }
            warn!("Module cache bootstrap ended before loading finished");
            *state = BootstrapState::Failed(
                "bootstrap task ended before loading finished".to_string(),
            );
            true
        });
    }
}

/// Store of virtual modules shared by every registry adapter of a build
///
/// Cloning is cheap and yields a handle to the same store.
pub struct ModuleStore<R: VirtualModules> {
    inner: Arc<StoreInner<R>>,
}

impl<R: VirtualModules> Clone for ModuleStore<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: VirtualModules> ModuleStore<R> {
    /// Create a store from build configuration
    ///
    /// Without a cache section the store runs cache-disabled. With one, both
    /// tiers are opened on the file system and loading persisted content
    /// starts in the background; await [`ModuleStore::ready`] to wait for it.
    /// Must be called from within a Tokio runtime when caching is enabled.
    pub fn new(config: &StoreConfig) -> VmodResult<Self> {
        let Some((content_ns, deps_ns)) = resolve_namespaces(config) else {
            debug!("No cache configured, running cache-disabled");
            return Ok(Self::disabled());
        };

        info!(
            "Using module cache at {} (version {})",
            content_ns.base_path.display(),
            content_ns.namespace
        );
        Self::with_backends(
            Box::new(FsCache::new(&content_ns)),
            Box::new(FsCache::new(&deps_ns)),
        )
    }

    /// Create a store with no persistent cache
    pub fn disabled() -> Self {
        let (bootstrap, _) = watch::channel(BootstrapState::Loaded(0));
        Self {
            inner: Arc::new(StoreInner {
                adapters: Mutex::new(BTreeMap::new()),
                snapshot: Mutex::new(ModuleMap::new()),
                content: None,
                deps: None,
                bootstrap,
            }),
        }
    }

    /// Create a store over caller-provided cache backends and start the
    /// bootstrap load
    pub fn with_backends(
        content: Box<dyn CacheBackend>,
        deps: Box<dyn CacheBackend>,
    ) -> VmodResult<Self> {
        let handle = tokio::runtime::Handle::try_current().map_err(|e| {
            VmodError::Internal(format!("cache bootstrap needs a Tokio runtime: {}", e))
        })?;

        let (bootstrap, _) = watch::channel(BootstrapState::Pending);
        let inner = Arc::new(StoreInner {
            adapters: Mutex::new(BTreeMap::new()),
            snapshot: Mutex::new(ModuleMap::new()),
            content: Some(ContentCache::new(content)),
            deps: Some(DependencyCache::new(deps)),
            bootstrap,
        });

        let guard = BootstrapGuard {
            inner: Arc::clone(&inner),
        };
        handle.spawn(bootstrap_from_cache(guard));
        Ok(Self { inner })
    }

    /// Whether this store persists to a cache
    pub fn is_cache_enabled(&self) -> bool {
        self.inner.content.is_some()
    }

    /// Create a named adapter seeded with the current snapshot
    ///
    /// Replaces any adapter previously registered under `name`. Entries that
    /// bootstrap loads later reach the adapter as ordinary writes.
    pub fn create_store(&self, name: impl Into<String>) -> Arc<DeferredWriteAdapter<R>> {
        let name = name.into();
        let mut adapters = self.inner.adapters();
        let seed = self.inner.snapshot().clone();

        let adapter = Arc::new(DeferredWriteAdapter::new(name.clone(), R::seeded(seed)));
        if adapters
            .insert(name.clone(), Arc::clone(&adapter))
            .is_some()
        {
            debug!("Replaced existing store {}", name);
        }

        info!("Created store: {}", name);
        adapter
    }

    /// Create the adapter named `"default"`
    pub fn create_default_store(&self) -> Arc<DeferredWriteAdapter<R>> {
        self.create_store(DEFAULT_STORE_NAME)
    }

    /// Get a registered adapter by name
    pub fn store(&self, name: &str) -> Option<Arc<DeferredWriteAdapter<R>>> {
        self.inner.adapters().get(name).cloned()
    }

    /// Names of all registered adapters
    pub fn store_names(&self) -> Vec<String> {
        self.inner.adapters().keys().cloned().collect()
    }

    /// Copy of the modules loaded from the cache so far
    pub fn snapshot(&self) -> ModuleMap {
        self.inner.snapshot().clone()
    }

    /// Write a module to every registered adapter, and persist it to the
    /// content tier when `persist` is set
    ///
    /// Adapters not yet attached queue the write. The fan-out completes
    /// before the first suspension point.
    pub async fn add_module(&self, path: &str, content: &str, persist: bool) -> VmodResult<()> {
        self.inner.fan_out(path, content);

        if !persist {
            return Ok(());
        }
        if let Some(cache) = &self.inner.content {
            cache.set(&ModuleEntry::new(path, content)).await?;
        }
        Ok(())
    }

    /// Persist the real files a module was generated from
    pub async fn add_module_dependencies(
        &self,
        module_path: &str,
        deps: &[String],
    ) -> VmodResult<()> {
        if let Some(cache) = &self.inner.deps {
            cache
                .set(&DependencyEntry::new(module_path, deps.to_vec()))
                .await?;
            debug!("Stored {} dependencies for {}", deps.len(), module_path);
        }
        Ok(())
    }

    /// Get the persisted dependencies of a module
    pub async fn get_module_dependencies(
        &self,
        module_path: &str,
    ) -> VmodResult<Lookup<Vec<String>>> {
        match &self.inner.deps {
            Some(cache) => Ok(cache.get(module_path).await?.into()),
            None => Ok(Lookup::Disabled),
        }
    }

    /// Drop the persisted content and dependencies of one module
    ///
    /// Adapters and the snapshot keep whatever they already hold.
    pub async fn invalidate_module(&self, path: &str) -> VmodResult<()> {
        if let Some(cache) = &self.inner.content {
            cache.remove_module(path).await?;
        }
        if let Some(cache) = &self.inner.deps {
            cache.remove(path).await?;
        }
        Ok(())
    }

    /// Remove every persisted entry of this store's version from both tiers
    pub async fn clear_cache(&self) -> VmodResult<()> {
        if let Some(cache) = &self.inner.content {
            cache.clear().await?;
        }
        if let Some(cache) = &self.inner.deps {
            cache.clear().await?;
        }
        info!("Cleared module cache");
        Ok(())
    }

    /// Current bootstrap progress
    pub fn bootstrap_state(&self) -> BootstrapState {
        let state = self.inner.bootstrap.borrow();
        BootstrapState::clone(&state)
    }

    /// Wait until persisted content has been loaded
    ///
    /// Returns the number of entries loaded (0 when cache-disabled), or the
    /// bootstrap failure.
    pub async fn ready(&self) -> VmodResult<usize> {
        let mut rx = self.inner.bootstrap.subscribe();
        let state = {
            let settled = rx
                .wait_for(BootstrapState::is_settled)
                .await
                .map_err(|_| VmodError::Internal("bootstrap state channel closed".to_string()))?;
            BootstrapState::clone(&settled)
        };

        match state {
            BootstrapState::Loaded(count) => Ok(count),
            BootstrapState::Failed(reason) => Err(VmodError::Bootstrap(reason)),
            BootstrapState::Pending => Err(VmodError::Internal(
                "bootstrap settled in pending state".to_string(),
            )),
        }
    }
}

/// Load persisted content and feed it through the regular fan-out path
/// without writing it back
async fn bootstrap_from_cache<R: VirtualModules>(guard: BootstrapGuard<R>) {
    let inner = &guard.inner;
    let Some(cache) = inner.content.as_ref() else {
        inner.bootstrap.send_replace(BootstrapState::Loaded(0));
        return;
    };

    match cache.load().await {
        Ok(entries) => {
            let count = entries.len();
            for entry in &entries {
                inner.seed(entry);
            }
            info!("Loaded {} cached modules", count);
            inner.bootstrap.send_replace(BootstrapState::Loaded(count));
        }
        Err(e) => {
            warn!("Failed to load module cache: {}", e);
            inner
                .bootstrap
                .send_replace(BootstrapState::Failed(e.to_string()));
        }
    }
}
