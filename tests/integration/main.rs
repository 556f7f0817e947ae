//! Integration tests for vmod

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use vmod::registry::TaskOutcome;
use vmod::{
    CacheConfig, DeferredWriteAdapter, Lookup, MemoryHost, MemoryModules, ModuleStore,
    StoreConfig,
};

type Store = ModuleStore<MemoryModules>;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("vmod=debug"))
        .with_test_writer()
        .try_init();
}

fn cached(temp: &TempDir, mode: &str, version: &str) -> StoreConfig {
    StoreConfig::cached(mode, CacheConfig::new(version).with_directory(temp.path()))
}

fn module(adapter: &DeferredWriteAdapter<MemoryModules>, path: &str) -> Option<String> {
    adapter.with_registry(|r| r.get(path).map(str::to_owned))
}

mod scenario_tests {
    use super::*;

    #[tokio::test]
    async fn cache_disabled_write_reaches_attached_store() {
        init_tracing();
        let store = Store::new(&StoreConfig::uncached("development")).unwrap();
        let a = store.create_store("a");

        store.add_module("/x.css", "body{}", true).await.unwrap();
        assert!(module(&a, "/x.css").is_none());

        let mut host = MemoryHost::new();
        a.attach(&mut host);

        assert_eq!(module(&a, "/x.css").as_deref(), Some("body{}"));
        assert_eq!(host.attachments(), 1);
    }

    #[tokio::test]
    async fn later_build_bootstraps_persisted_modules() {
        init_tracing();
        let temp = TempDir::new().unwrap();

        let first = Store::new(&cached(&temp, "production", "v1")).unwrap();
        first.add_module("/y.css", "a{}", true).await.unwrap();

        let second = Store::new(&cached(&temp, "production", "v1")).unwrap();
        assert_eq!(second.ready().await.unwrap(), 1);
        assert_eq!(
            second.snapshot().get("/y.css").map(String::as_str),
            Some("a{}")
        );

        let adapter = second.create_default_store();
        assert_eq!(module(&adapter, "/y.css").as_deref(), Some("a{}"));
    }

    #[tokio::test]
    async fn dependency_order_is_kept() {
        init_tracing();
        let temp = TempDir::new().unwrap();
        let store = Store::new(&cached(&temp, "production", "v1")).unwrap();

        store
            .add_module_dependencies("/a.ts", &["/b.ts".to_string(), "/c.ts".to_string()])
            .await
            .unwrap();

        assert_eq!(
            store.get_module_dependencies("/a.ts").await.unwrap(),
            Lookup::Found(vec!["/b.ts".to_string(), "/c.ts".to_string()])
        );
    }
}

mod property_tests {
    use super::*;

    #[tokio::test]
    async fn queued_writes_replay_in_order_exactly_once() {
        let store = Store::disabled();
        let adapter = store.create_default_store();

        // Same path written repeatedly: only in-order replay leaves the last value
        for i in 0..50 {
            store
                .add_module("/counter.css", &format!("n{{{}}}", i), false)
                .await
                .unwrap();
        }
        assert_eq!(adapter.pending_len(), 50);

        adapter.attach(&mut MemoryHost::new());

        assert_eq!(adapter.pending_len(), 0);
        assert_eq!(module(&adapter, "/counter.css").as_deref(), Some("n{49}"));
    }

    #[tokio::test]
    async fn write_after_attach_is_immediate() {
        let store = Store::disabled();
        let adapter = store.create_default_store();
        adapter.attach(&mut MemoryHost::new());

        assert_eq!(adapter.write_module("/z.css", "z{}"), TaskOutcome::Executed);
        assert_eq!(module(&adapter, "/z.css").as_deref(), Some("z{}"));
    }

    #[tokio::test]
    async fn transient_write_is_not_cached_but_reaches_every_store() {
        let temp = TempDir::new().unwrap();
        let store = Store::new(&cached(&temp, "production", "v1")).unwrap();
        store.ready().await.unwrap();
        let client = store.create_store("client");
        let server = store.create_store("server");

        store.add_module("/t.css", "t{}", false).await.unwrap();

        let mut host = MemoryHost::new();
        client.attach(&mut host);
        server.attach(&mut host);
        assert_eq!(module(&client, "/t.css").as_deref(), Some("t{}"));
        assert_eq!(module(&server, "/t.css").as_deref(), Some("t{}"));

        let next_build = Store::new(&cached(&temp, "production", "v1")).unwrap();
        assert_eq!(next_build.ready().await.unwrap(), 0);
        assert!(next_build.snapshot().is_empty());
    }

    #[tokio::test]
    async fn versions_never_see_each_other() {
        let temp = TempDir::new().unwrap();
        let v1 = Store::new(&cached(&temp, "production", "v1")).unwrap();
        let v2 = Store::new(&cached(&temp, "production", "v2")).unwrap();

        v1.add_module("/a.css", "from-v1", true).await.unwrap();
        v2.add_module("/b.css", "from-v2", true).await.unwrap();
        v1.add_module_dependencies("/a.css", &["/a.ts".to_string()])
            .await
            .unwrap();

        let v1_next = Store::new(&cached(&temp, "production", "v1")).unwrap();
        let v2_next = Store::new(&cached(&temp, "production", "v2")).unwrap();
        v1_next.ready().await.unwrap();
        v2_next.ready().await.unwrap();

        let v1_snapshot = v1_next.snapshot();
        let v2_snapshot = v2_next.snapshot();
        assert_eq!(v1_snapshot.keys().collect::<Vec<_>>(), vec!["/a.css"]);
        assert_eq!(v2_snapshot.keys().collect::<Vec<_>>(), vec!["/b.css"]);
        assert_eq!(
            v2_next.get_module_dependencies("/a.css").await.unwrap(),
            Lookup::Missing
        );
    }

    #[tokio::test]
    async fn modes_use_separate_directories() {
        let temp = TempDir::new().unwrap();
        let dev = Store::new(&cached(&temp, "development", "v1")).unwrap();
        dev.add_module("/a.css", "a{}", true).await.unwrap();

        let prod = Store::new(&cached(&temp, "production", "v1")).unwrap();
        assert_eq!(prod.ready().await.unwrap(), 0);
        assert!(temp.path().join("vmod-development").is_dir());
    }

    #[tokio::test]
    async fn disabled_dependency_lookup_is_explicit() {
        let store = Store::new(&StoreConfig::uncached("production")).unwrap();

        let lookup = store.get_module_dependencies("/a.ts").await.unwrap();

        assert_eq!(lookup, Lookup::Disabled);
        assert!(lookup.found().is_none());
    }
}
