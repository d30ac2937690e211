//! Durable storage layer
//!
//! Every mutation is written here before it touches the in-memory maps.
//! The [`DurableStore`] trait is the seam: the engine only ever talks to
//! the trait, and the production implementation is [`RocksStore`]. Multi-
//! entity operations go through [`DurableStore::apply_batch`], which must
//! apply every op or none of them.

use crate::graph::{Cluster, ClusterId, Edge, EdgeId, Node, NodeId};
use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Column family error: {0}")]
    ColumnFamily(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// One durable mutation inside an atomic batch
#[derive(Debug, Clone)]
pub enum BatchOp {
    UpsertNode(Node),
    DeleteNode(NodeId),
    UpsertEdge(Edge),
    DeleteEdge(EdgeId),
    UpsertCluster(Cluster),
    DeleteCluster(ClusterId),
}

/// Full graph contents as read back at startup
#[derive(Debug, Default)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub clusters: Vec<Cluster>,
}

/// Write-ahead persistence for graph entities
pub trait DurableStore: Send + Sync {
    /// Apply all ops atomically, or fail without applying any
    fn apply_batch(&self, ops: Vec<BatchOp>) -> StorageResult<()>;

    /// Read everything back, typically once at startup
    fn load(&self) -> StorageResult<GraphSnapshot>;

    /// Drop all stored entities
    fn clear(&self) -> StorageResult<()>;

    fn upsert_node(&self, node: &Node) -> StorageResult<()> {
        self.apply_batch(vec![BatchOp::UpsertNode(node.clone())])
    }

    fn delete_node(&self, id: &NodeId) -> StorageResult<()> {
        self.apply_batch(vec![BatchOp::DeleteNode(id.clone())])
    }

    fn upsert_edge(&self, edge: &Edge) -> StorageResult<()> {
        self.apply_batch(vec![BatchOp::UpsertEdge(edge.clone())])
    }

    fn delete_edge(&self, id: &EdgeId) -> StorageResult<()> {
        self.apply_batch(vec![BatchOp::DeleteEdge(id.clone())])
    }
}

const CF_NODES: &str = "nodes";
const CF_EDGES: &str = "edges";
const CF_CLUSTERS: &str = "clusters";

/// RocksDB-backed [`DurableStore`] with one column family per entity kind
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening durable store");

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(64 * 1024 * 1024);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new("default", Options::default()),
            ColumnFamilyDescriptor::new(CF_NODES, Self::cf_options()),
            ColumnFamilyDescriptor::new(CF_EDGES, Self::cf_options()),
            ColumnFamilyDescriptor::new(CF_CLUSTERS, Self::cf_options()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;
        Ok(Self { db })
    }

    fn cf_options() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf(&self, name: &str) -> StorageResult<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamily(name.to_string()))
    }
}

impl DurableStore for RocksStore {
    fn apply_batch(&self, ops: Vec<BatchOp>) -> StorageResult<()> {
        let nodes = self.cf(CF_NODES)?;
        let edges = self.cf(CF_EDGES)?;
        let clusters = self.cf(CF_CLUSTERS)?;

        let op_count = ops.len();
        let mut batch = WriteBatch::default();
        for op in ops {
            match op {
                BatchOp::UpsertNode(node) => {
                    batch.put_cf(nodes, node.id.as_str(), bincode::serialize(&node)?);
                }
                BatchOp::DeleteNode(id) => batch.delete_cf(nodes, id.as_str()),
                BatchOp::UpsertEdge(edge) => {
                    batch.put_cf(edges, edge.id.as_str(), bincode::serialize(&edge)?);
                }
                BatchOp::DeleteEdge(id) => batch.delete_cf(edges, id.as_str()),
                BatchOp::UpsertCluster(cluster) => {
                    batch.put_cf(clusters, cluster.id.as_str(), bincode::serialize(&cluster)?);
                }
                BatchOp::DeleteCluster(id) => batch.delete_cf(clusters, id.as_str()),
            }
        }

        self.db.write(batch)?;
        debug!(ops = op_count, "applied durable batch");
        Ok(())
    }

    fn load(&self) -> StorageResult<GraphSnapshot> {
        let mut snapshot = GraphSnapshot::default();

        for item in self.db.iterator_cf(self.cf(CF_NODES)?, IteratorMode::Start) {
            let (_, value) = item?;
            snapshot.nodes.push(bincode::deserialize(&value)?);
        }
        for item in self.db.iterator_cf(self.cf(CF_EDGES)?, IteratorMode::Start) {
            let (_, value) = item?;
            snapshot.edges.push(bincode::deserialize(&value)?);
        }
        for item in self
            .db
            .iterator_cf(self.cf(CF_CLUSTERS)?, IteratorMode::Start)
        {
            let (_, value) = item?;
            snapshot.clusters.push(bincode::deserialize(&value)?);
        }

        info!(
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            clusters = snapshot.clusters.len(),
            "loaded graph snapshot"
        );
        Ok(snapshot)
    }

    fn clear(&self) -> StorageResult<()> {
        let mut batch = WriteBatch::default();
        for name in [CF_NODES, CF_EDGES, CF_CLUSTERS] {
            let cf = self.cf(name)?;
            for item in self.db.iterator_cf(cf, IteratorMode::Start) {
                let (key, _) = item?;
                batch.delete_cf(cf, key);
            }
        }
        self.db.write(batch)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::{node, weighted_edge};

    #[test]
    fn test_batch_round_trips_through_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = RocksStore::open(dir.path()).unwrap();
            store
                .apply_batch(vec![
                    BatchOp::UpsertNode(node("a")),
                    BatchOp::UpsertNode(node("b")),
                    BatchOp::UpsertEdge(weighted_edge("e1", "a", "b", 0.5)),
                ])
                .unwrap();
        }

        let store = RocksStore::open(dir.path()).unwrap();
        let snapshot = store.load().unwrap();
        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.edges.len(), 1);
        assert_eq!(snapshot.edges[0].weight, 0.5);
    }

    #[test]
    fn test_delete_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();

        store.upsert_node(&node("a")).unwrap();
        store.upsert_node(&node("b")).unwrap();
        store.delete_node(&NodeId::new("a")).unwrap();

        let snapshot = store.load().unwrap();
        assert_eq!(snapshot.nodes.len(), 1);
        assert_eq!(snapshot.nodes[0].id, NodeId::new("b"));

        store.clear().unwrap();
        assert!(store.load().unwrap().nodes.is_empty());
    }
}
