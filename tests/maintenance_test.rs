use ravel::graph::{EngineConfig, GraphEngine, PropertyMap};
use ravel::maintenance::{MaintenanceConfig, MaintenanceScheduler};
use ravel::persistence::{
    BatchOp, DurableStore, GraphSnapshot, LookupCache, MemoryCache, RocksStore, StorageError,
    StorageResult,
};
use std::sync::Arc;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn slow_config() -> MaintenanceConfig {
    MaintenanceConfig {
        prune_interval: Duration::from_secs(3600),
        recluster_interval: Duration::from_secs(3600),
        cache_sync_interval: Duration::from_secs(3600),
        min_edge_weight: 0.1,
    }
}

/// Store double that refuses deletions but accepts everything else
struct DeleteRejectingStore {
    inner: RocksStore,
}

impl DurableStore for DeleteRejectingStore {
    fn apply_batch(&self, ops: Vec<BatchOp>) -> StorageResult<()> {
        if ops
            .iter()
            .any(|op| matches!(op, BatchOp::DeleteNode(_) | BatchOp::DeleteEdge(_)))
        {
            return Err(StorageError::Backend("deletes rejected".to_string()));
        }
        self.inner.apply_batch(ops)
    }

    fn load(&self) -> StorageResult<GraphSnapshot> {
        self.inner.load()
    }

    fn clear(&self) -> StorageResult<()> {
        self.inner.clear()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_prune_job_runs_on_schedule() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RocksStore::open(dir.path()).unwrap());
    let cache = Arc::new(MemoryCache::new());
    let engine =
        Arc::new(GraphEngine::new(store, cache, EngineConfig::default()).unwrap());

    let a = engine.create_node("user", PropertyMap::new()).unwrap();
    let b = engine.create_node("user", PropertyMap::new()).unwrap();
    let orphan = engine.create_node("user", PropertyMap::new()).unwrap();
    let weak = engine
        .create_edge(&a.id, &b.id, "follows", 0.05, PropertyMap::new())
        .unwrap();

    let mut scheduler = MaintenanceScheduler::start(
        Arc::clone(&engine),
        MaintenanceConfig {
            prune_interval: Duration::from_millis(25),
            ..slow_config()
        },
    );

    tokio::time::sleep(Duration::from_millis(150)).await;
    scheduler.shutdown();

    assert!(engine.get_node(&orphan.id).is_none());
    assert!(engine.get_edge(&weak.id).is_none());
    assert!(engine.get_node(&a.id).is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_jobs_wait_a_full_interval_before_first_run() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RocksStore::open(dir.path()).unwrap());
    let cache = Arc::new(MemoryCache::new());
    let engine =
        Arc::new(GraphEngine::new(store, cache, EngineConfig::default()).unwrap());

    let orphan = engine.create_node("user", PropertyMap::new()).unwrap();

    let _scheduler = MaintenanceScheduler::start(
        Arc::clone(&engine),
        MaintenanceConfig {
            prune_interval: Duration::from_secs(3600),
            ..slow_config()
        },
    );

    tokio::time::sleep(Duration::from_millis(50)).await;

    // No immediate tick at startup.
    assert!(engine.get_node(&orphan.id).is_some());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_recluster_job_refreshes_clusters() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RocksStore::open(dir.path()).unwrap());
    let cache = Arc::new(MemoryCache::new());
    let engine =
        Arc::new(GraphEngine::new(store, cache, EngineConfig::default()).unwrap());

    let a = engine.create_node("user", PropertyMap::new()).unwrap();
    let b = engine.create_node("user", PropertyMap::new()).unwrap();
    engine
        .create_edge(&a.id, &b.id, "follows", 1.0, PropertyMap::new())
        .unwrap();
    engine
        .create_edge(&b.id, &a.id, "follows", 1.0, PropertyMap::new())
        .unwrap();
    assert!(engine.get_node_cluster(&a.id).is_none());

    let mut scheduler = MaintenanceScheduler::start(
        Arc::clone(&engine),
        MaintenanceConfig {
            recluster_interval: Duration::from_millis(25),
            ..slow_config()
        },
    );

    tokio::time::sleep(Duration::from_millis(150)).await;
    scheduler.shutdown();

    let cluster = engine.get_node_cluster(&a.id).unwrap();
    assert!(cluster.contains(&b.id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cache_sync_keeps_running_when_prune_fails() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(DeleteRejectingStore {
        inner: RocksStore::open(dir.path()).unwrap(),
    });
    let cache = Arc::new(MemoryCache::new());
    // Short TTL so only a recent sync pass can explain a cache hit.
    let config = EngineConfig {
        cache_ttl: Duration::from_millis(60),
        ..EngineConfig::default()
    };
    let engine = Arc::new(
        GraphEngine::new(store, Arc::clone(&cache) as Arc<dyn LookupCache>, config).unwrap(),
    );

    let orphan = engine.create_node("user", PropertyMap::new()).unwrap();

    let mut scheduler = MaintenanceScheduler::start(
        Arc::clone(&engine),
        MaintenanceConfig {
            prune_interval: Duration::from_millis(20),
            cache_sync_interval: Duration::from_millis(30),
            ..slow_config()
        },
    );

    tokio::time::sleep(Duration::from_millis(200)).await;
    scheduler.shutdown();

    // Every prune tick failed, so the orphan is still there, and the
    // failures did not take the cache sync job down with them.
    assert!(engine.get_node(&orphan.id).is_some());
    let key = format!("graph:node:{}", orphan.id);
    assert!(cache.get(&key).unwrap().is_some());
}
