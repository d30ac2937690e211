//! Ravel
//!
//! An embedded property-graph engine. The in-memory graph is the source of
//! truth for reads; every mutation is mirrored to a durable store before
//! it is applied to memory, so a crash never leaves memory ahead of disk.
//!
//! # Architecture
//!
//! - [`graph`]: domain types and the [`GraphEngine`], the single mutation
//!   and read surface
//! - [`algo`]: traversal, shortest path, PageRank, and community detection
//!   over immutable snapshots
//! - [`query`]: declarative node/edge queries with type and property
//!   filters
//! - [`persistence`]: the [`DurableStore`] write-ahead seam (RocksDB in
//!   production) and the TTL'd [`LookupCache`]
//! - [`maintenance`]: periodic pruning, reclustering, and cache resync
//!
//! # Example
//!
//! ```no_run
//! use ravel::graph::{EngineConfig, GraphEngine, PropertyMap};
//! use ravel::persistence::{MemoryCache, RocksStore};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(RocksStore::open("./graph-data")?);
//! let cache = Arc::new(MemoryCache::new());
//! let engine = GraphEngine::new(store, cache, EngineConfig::default())?;
//!
//! let alice = engine.create_node("user", PropertyMap::new())?;
//! let bob = engine.create_node("user", PropertyMap::new())?;
//! engine.create_edge(&alice.id, &bob.id, "follows", 1.0, PropertyMap::new())?;
//! # Ok(())
//! # }
//! ```

pub mod algo;
pub mod graph;
pub mod maintenance;
pub mod persistence;
pub mod query;

pub use graph::{GraphEngine, GraphError, GraphResult};
pub use maintenance::{MaintenanceConfig, MaintenanceScheduler};
pub use persistence::{DurableStore, LookupCache, MemoryCache, RocksStore};
pub use query::{GraphQuery, QueryResult};
