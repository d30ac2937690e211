//! Background maintenance
//!
//! Three periodic jobs keep the graph healthy: pruning orphans and weak
//! edges, refreshing community clusters, and resyncing the lookup cache.
//! Each job runs on its own tokio task; a failing run is logged and the
//! schedule continues.

use crate::graph::GraphEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// How often orphaned nodes and weak edges are pruned
    pub prune_interval: Duration,
    /// How often community clusters are recomputed
    pub recluster_interval: Duration,
    /// How often the lookup cache is fully rewritten
    pub cache_sync_interval: Duration,
    /// Edges below this weight are removed by the prune job
    pub min_edge_weight: f64,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            prune_interval: Duration::from_secs(60 * 60),
            recluster_interval: Duration::from_secs(6 * 60 * 60),
            cache_sync_interval: Duration::from_secs(5 * 60),
            min_edge_weight: 0.1,
        }
    }
}

/// Owns the background job tasks; dropping it stops them.
pub struct MaintenanceScheduler {
    tasks: Vec<JoinHandle<()>>,
}

impl MaintenanceScheduler {
    /// Spawn the maintenance jobs. Each job waits a full interval before
    /// its first run rather than firing immediately at startup.
    pub fn start(engine: Arc<GraphEngine>, config: MaintenanceConfig) -> Self {
        info!(
            prune_secs = config.prune_interval.as_secs(),
            recluster_secs = config.recluster_interval.as_secs(),
            cache_sync_secs = config.cache_sync_interval.as_secs(),
            "maintenance scheduler started"
        );

        let prune = {
            let engine = Arc::clone(&engine);
            let min_weight = config.min_edge_weight;
            let period = config.prune_interval;
            tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                loop {
                    ticker.tick().await;
                    match engine.prune(min_weight) {
                        Ok(report) => info!(
                            orphan_nodes = report.orphan_nodes,
                            weak_edges = report.weak_edges,
                            "prune job finished"
                        ),
                        Err(err) => warn!(%err, "prune job failed"),
                    }
                }
            })
        };

        let recluster = {
            let engine = Arc::clone(&engine);
            let period = config.recluster_interval;
            tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                loop {
                    ticker.tick().await;
                    match engine.detect_communities() {
                        Ok(clusters) => {
                            info!(clusters = clusters.len(), "recluster job finished")
                        }
                        Err(err) => warn!(%err, "recluster job failed"),
                    }
                }
            })
        };

        let cache_sync = {
            let engine = Arc::clone(&engine);
            let period = config.cache_sync_interval;
            tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                loop {
                    ticker.tick().await;
                    let entries = engine.sync_cache();
                    info!(entries, "cache sync job finished");
                }
            })
        };

        Self {
            tasks: vec![prune, recluster, cache_sync],
        }
    }

    pub fn shutdown(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
        info!("maintenance scheduler stopped");
    }
}

impl Drop for MaintenanceScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
