//! Graph engine
//!
//! The engine owns the in-memory [`GraphState`] behind an `RwLock` and
//! mirrors every mutation to a [`DurableStore`] before touching memory.
//! The write guard is held across the persist-then-apply sequence, so a
//! failed durable write leaves memory exactly as it was and no reader ever
//! observes a half-applied mutation.
//!
//! The engine is constructed once by the composition root and shared by
//! reference; there is no global instance.

use super::cluster::Cluster;
use super::edge::{Edge, EdgeUpdate};
use super::event::GraphEvent;
use super::node::{Node, NodeUpdate};
use super::property::{PropertyMap, PropertyValue};
use super::state::{Degree, GraphState};
use super::types::{ClusterId, EdgeId, NodeId};
use crate::algo::{self, community, GraphView, PageRankConfig};
use crate::persistence::{BatchOp, DurableStore, LookupCache, StorageError};
use crate::query::{GraphQuery, QueryResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("edge source node not found: {0}")]
    InvalidEdgeSource(NodeId),

    #[error("edge target node not found: {0}")]
    InvalidEdgeTarget(NodeId),

    #[error("edge weight must be strictly positive, got {0}")]
    InvalidEdgeWeight(f64),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type GraphResult<T> = Result<T, GraphError>;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// TTL for cached node and edge lookups
    pub cache_ttl: Duration,
    /// Capacity of the event broadcast channel
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(3600),
            event_capacity: 256,
        }
    }
}

/// Node to be created inside a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub node_type: String,
    pub properties: PropertyMap,
}

/// Edge to be created inside a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub source: NodeId,
    pub target: NodeId,
    pub edge_type: String,
    pub weight: f64,
    pub properties: PropertyMap,
}

/// A resolved path between two nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphPath {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Summed traversal cost, `1 / weight` per hop
    pub cost: f64,
    /// Hop count
    pub length: usize,
}

/// Full graph contents for export and re-import
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub clusters: Vec<Cluster>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub cluster_count: usize,
    /// Mean total degree over all nodes
    pub avg_degree: f64,
    /// Edge count over `n * (n - 1)` possible directed edges
    pub density: f64,
}

/// What a prune pass removed
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PruneReport {
    pub orphan_nodes: usize,
    pub weak_edges: usize,
}

pub struct GraphEngine {
    state: RwLock<GraphState>,
    store: Arc<dyn DurableStore>,
    cache: Arc<dyn LookupCache>,
    events: broadcast::Sender<GraphEvent>,
    config: EngineConfig,
}

impl GraphEngine {
    /// Build an engine over the given collaborators, hydrating memory from
    /// whatever the durable store already holds.
    pub fn new(
        store: Arc<dyn DurableStore>,
        cache: Arc<dyn LookupCache>,
        config: EngineConfig,
    ) -> GraphResult<Self> {
        let snapshot = store.load()?;

        let mut state = GraphState::new();
        for node in snapshot.nodes {
            state.insert_node(node);
        }
        for edge in snapshot.edges {
            if state.contains_node(&edge.source) && state.contains_node(&edge.target) {
                state.insert_edge(edge);
            } else {
                warn!(edge = %edge.id, "skipping stored edge with missing endpoint");
            }
        }
        state.set_clusters(snapshot.clusters);

        info!(
            nodes = state.node_count(),
            edges = state.edge_count(),
            clusters = state.cluster_count(),
            "graph engine initialized"
        );

        let (events, _) = broadcast::channel(config.event_capacity);
        Ok(Self {
            state: RwLock::new(state),
            store,
            cache,
            events,
            config,
        })
    }

    /// Subscribe to mutation events. Lagging receivers miss events rather
    /// than slowing writers down.
    pub fn subscribe(&self) -> broadcast::Receiver<GraphEvent> {
        self.events.subscribe()
    }

    fn read_state(&self) -> RwLockReadGuard<'_, GraphState> {
        self.state.read().expect("graph state lock poisoned")
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, GraphState> {
        self.state.write().expect("graph state lock poisoned")
    }

    fn publish(&self, event: GraphEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn cache_put(&self, key: &str, value: &str) {
        if let Err(err) = self.cache.set(key, value, self.config.cache_ttl) {
            warn!(%key, %err, "cache write failed");
        }
    }

    fn cache_node(&self, node: &Node) {
        match serde_json::to_string(node) {
            Ok(json) => self.cache_put(&format!("graph:node:{}", node.id), &json),
            Err(err) => warn!(node = %node.id, %err, "node cache serialization failed"),
        }
    }

    fn cache_edge(&self, edge: &Edge) {
        match serde_json::to_string(edge) {
            Ok(json) => self.cache_put(&format!("graph:edge:{}", edge.id), &json),
            Err(err) => warn!(edge = %edge.id, %err, "edge cache serialization failed"),
        }
    }

    // ------------------------------------------------------------
    // Node operations
    // ------------------------------------------------------------

    pub fn create_node(
        &self,
        node_type: &str,
        properties: PropertyMap,
    ) -> GraphResult<Node> {
        let node = Node::new(NodeId::generate(node_type), node_type, properties);

        let mut state = self.write_state();
        self.store.upsert_node(&node)?;
        state.insert_node(node.clone());
        drop(state);

        debug!(node = %node.id, node_type, "node created");
        self.cache_node(&node);
        self.publish(GraphEvent::NodeCreated(node.clone()));
        Ok(node)
    }

    /// Apply a partial update; returns `Ok(None)` for an unknown node.
    pub fn update_node(&self, id: &NodeId, update: NodeUpdate) -> GraphResult<Option<Node>> {
        let mut state = self.write_state();
        let Some(mut node) = state.node(id).cloned() else {
            return Ok(None);
        };
        node.merge(update);

        self.store.upsert_node(&node)?;
        state.replace_node(node.clone());
        drop(state);

        self.cache_node(&node);
        self.publish(GraphEvent::NodeUpdated(node.clone()));
        Ok(Some(node))
    }

    /// Delete a node and every incident edge. Returns `Ok(false)` for an
    /// unknown node; deleting twice is not an error.
    pub fn delete_node(&self, id: &NodeId) -> GraphResult<bool> {
        let mut state = self.write_state();
        if !state.contains_node(id) {
            return Ok(false);
        }

        let incident = state.incident_edge_ids(id);
        let mut ops = Vec::with_capacity(incident.len() + 1);
        ops.extend(incident.into_iter().map(BatchOp::DeleteEdge));
        ops.push(BatchOp::DeleteNode(id.clone()));
        self.store.apply_batch(ops)?;

        let removed = state.remove_node(id);
        drop(state);

        if let Some((_, edges)) = removed {
            debug!(node = %id, cascaded_edges = edges.len(), "node deleted");
            for edge in edges {
                self.publish(GraphEvent::EdgeDeleted(edge.id));
            }
        }
        self.publish(GraphEvent::NodeDeleted(id.clone()));
        Ok(true)
    }

    pub fn get_node(&self, id: &NodeId) -> Option<Node> {
        self.read_state().node(id).cloned()
    }

    pub fn get_nodes_by_type(&self, node_type: &str) -> Vec<Node> {
        self.read_state()
            .nodes()
            .filter(|node| node.node_type == node_type)
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------
    // Edge operations
    // ------------------------------------------------------------

    pub fn create_edge(
        &self,
        source: &NodeId,
        target: &NodeId,
        edge_type: &str,
        weight: f64,
        properties: PropertyMap,
    ) -> GraphResult<Edge> {
        if weight <= 0.0 {
            return Err(GraphError::InvalidEdgeWeight(weight));
        }

        let mut state = self.write_state();
        if !state.contains_node(source) {
            return Err(GraphError::InvalidEdgeSource(source.clone()));
        }
        if !state.contains_node(target) {
            return Err(GraphError::InvalidEdgeTarget(target.clone()));
        }

        let edge = Edge::new(
            EdgeId::generate(edge_type),
            source.clone(),
            target.clone(),
            edge_type,
            weight,
            properties,
        );

        self.store.upsert_edge(&edge)?;
        state.insert_edge(edge.clone());
        drop(state);

        debug!(edge = %edge.id, %source, %target, "edge created");
        self.cache_edge(&edge);
        self.publish(GraphEvent::EdgeCreated(edge.clone()));
        Ok(edge)
    }

    /// Apply a partial update; endpoints are immutable. Returns `Ok(None)`
    /// for an unknown edge.
    pub fn update_edge(&self, id: &EdgeId, update: EdgeUpdate) -> GraphResult<Option<Edge>> {
        if let Some(weight) = update.weight {
            if weight <= 0.0 {
                return Err(GraphError::InvalidEdgeWeight(weight));
            }
        }

        let mut state = self.write_state();
        let Some(mut edge) = state.edge(id).cloned() else {
            return Ok(None);
        };
        edge.merge(update);

        self.store.upsert_edge(&edge)?;
        state.replace_edge(edge.clone());
        drop(state);

        self.cache_edge(&edge);
        self.publish(GraphEvent::EdgeUpdated(edge.clone()));
        Ok(Some(edge))
    }

    /// Returns `Ok(false)` for an unknown edge.
    pub fn delete_edge(&self, id: &EdgeId) -> GraphResult<bool> {
        let mut state = self.write_state();
        if state.edge(id).is_none() {
            return Ok(false);
        }

        self.store.delete_edge(id)?;
        state.remove_edge(id);
        drop(state);

        self.publish(GraphEvent::EdgeDeleted(id.clone()));
        Ok(true)
    }

    pub fn get_edge(&self, id: &EdgeId) -> Option<Edge> {
        self.read_state().edge(id).cloned()
    }

    /// All edges from `source` to `target`, in that direction
    pub fn get_edges_between(&self, source: &NodeId, target: &NodeId) -> Vec<Edge> {
        self.read_state()
            .edges_between(source, target)
            .into_iter()
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------
    // Traversal and pathfinding
    // ------------------------------------------------------------

    /// Level-order walk from `start`, bounded by `max_depth`. Unknown
    /// start nodes produce an empty result.
    pub fn traverse_bfs(&self, start: &NodeId, max_depth: usize) -> Vec<Node> {
        let state = self.read_state();
        let view = GraphView::new(&state);
        let Some(start_idx) = view.index_of(start) else {
            return Vec::new();
        };
        algo::Bfs::new(&view, start_idx, max_depth)
            .filter_map(|idx| state.node(view.node_id(idx)).cloned())
            .collect()
    }

    /// Pre-order depth-first walk from `start`, bounded by `max_depth`
    pub fn traverse_dfs(&self, start: &NodeId, max_depth: usize) -> Vec<Node> {
        let state = self.read_state();
        let view = GraphView::new(&state);
        let Some(start_idx) = view.index_of(start) else {
            return Vec::new();
        };
        algo::Dfs::new(&view, start_idx, max_depth)
            .filter_map(|idx| state.node(view.node_id(idx)).cloned())
            .collect()
    }

    /// Cheapest path from `source` to `target` over inverse-weight costs,
    /// or `None` when the target is unreachable.
    pub fn find_shortest_path(&self, source: &NodeId, target: &NodeId) -> Option<GraphPath> {
        let state = self.read_state();
        let view = GraphView::new(&state);
        let source_idx = view.index_of(source)?;
        let target_idx = view.index_of(target)?;

        let path = algo::shortest_path(&view, source_idx, target_idx)?;
        let nodes = path
            .nodes
            .iter()
            .filter_map(|&idx| state.node(view.node_id(idx)).cloned())
            .collect();
        let edges = path
            .edges
            .iter()
            .filter_map(|id| state.edge(id).cloned())
            .collect::<Vec<_>>();

        Some(GraphPath {
            length: edges.len(),
            nodes,
            edges,
            cost: path.cost,
        })
    }

    // ------------------------------------------------------------
    // Analytics
    // ------------------------------------------------------------

    /// Degree over distinct neighbors; zero for unknown nodes
    pub fn degree(&self, id: &NodeId) -> Degree {
        self.read_state().degree(id)
    }

    /// PageRank over a snapshot of the current topology
    pub fn calculate_pagerank(&self) -> HashMap<NodeId, f64> {
        let view = {
            let state = self.read_state();
            GraphView::new(&state)
        };
        algo::page_rank(&view, &PageRankConfig::default())
    }

    /// Run community detection and replace the persisted cluster snapshot.
    ///
    /// The heavy pass runs against a frozen view without holding any lock;
    /// the resulting clusters then replace the previous set, deleting any
    /// stale cluster ids from the durable store.
    pub fn detect_communities(&self) -> GraphResult<Vec<Cluster>> {
        let view = {
            let state = self.read_state();
            GraphView::new(&state)
        };
        let groups = community::detect(&view);

        let mut clusters = Vec::with_capacity(groups.len());
        for (idx, members) in groups.iter().enumerate() {
            let Some(&centroid_idx) = members
                .iter()
                .max_by_key(|&&member| view.total_degree(member))
            else {
                continue;
            };

            let n = members.len();
            let density = if n <= 1 {
                1.0
            } else {
                view.internal_edge_count(members) as f64 / (n * (n - 1)) as f64
            };

            let mut metadata = PropertyMap::new();
            metadata.insert("size".to_string(), PropertyValue::Integer(n as i64));

            clusters.push(Cluster {
                id: ClusterId::new(format!("cluster_{}", idx)),
                node_ids: members.iter().map(|&m| view.node_id(m).clone()).collect(),
                centroid: view.node_id(centroid_idx).clone(),
                density,
                metadata,
            });
        }

        let mut state = self.write_state();
        let stale: Vec<ClusterId> = state
            .clusters()
            .map(|cluster| cluster.id.clone())
            .filter(|id| !clusters.iter().any(|cluster| cluster.id == *id))
            .collect();

        let mut ops: Vec<BatchOp> = clusters
            .iter()
            .cloned()
            .map(BatchOp::UpsertCluster)
            .collect();
        ops.extend(stale.into_iter().map(BatchOp::DeleteCluster));
        self.store.apply_batch(ops)?;
        state.set_clusters(clusters.clone());
        drop(state);

        info!(clusters = clusters.len(), "community detection complete");
        Ok(clusters)
    }

    pub fn get_cluster(&self, id: &ClusterId) -> Option<Cluster> {
        self.read_state().cluster(id).cloned()
    }

    /// The cluster a node belonged to at the last detection run, if any
    pub fn get_node_cluster(&self, node_id: &NodeId) -> Option<Cluster> {
        self.read_state()
            .clusters()
            .find(|cluster| cluster.contains(node_id))
            .cloned()
    }

    pub fn get_graph_stats(&self) -> GraphStats {
        let state = self.read_state();
        let node_count = state.node_count();
        let edge_count = state.edge_count();

        let total_degree: usize = state.nodes().map(|node| state.degree(&node.id).total).sum();
        let avg_degree = if node_count > 0 {
            total_degree as f64 / node_count as f64
        } else {
            0.0
        };
        let density = if node_count > 1 {
            edge_count as f64 / (node_count * (node_count - 1)) as f64
        } else {
            0.0
        };

        GraphStats {
            node_count,
            edge_count,
            cluster_count: state.cluster_count(),
            avg_degree,
            density,
        }
    }

    // ------------------------------------------------------------
    // Query
    // ------------------------------------------------------------

    pub fn query(&self, query: &GraphQuery) -> QueryResult {
        crate::query::run(&self.read_state(), query)
    }

    // ------------------------------------------------------------
    // Batch operations
    // ------------------------------------------------------------

    /// Create all nodes inside one durable transaction. Memory is only
    /// touched after the transaction succeeds, so a failure leaves both
    /// sides unchanged.
    pub fn batch_create_nodes(&self, specs: Vec<NodeSpec>) -> GraphResult<Vec<Node>> {
        let nodes: Vec<Node> = specs
            .into_iter()
            .map(|spec| {
                Node::new(
                    NodeId::generate(&spec.node_type),
                    spec.node_type,
                    spec.properties,
                )
            })
            .collect();

        let mut state = self.write_state();
        self.store
            .apply_batch(nodes.iter().cloned().map(BatchOp::UpsertNode).collect())?;
        for node in &nodes {
            state.insert_node(node.clone());
        }
        drop(state);

        for node in &nodes {
            self.cache_node(node);
            self.publish(GraphEvent::NodeCreated(node.clone()));
        }
        debug!(count = nodes.len(), "batch node create committed");
        Ok(nodes)
    }

    /// Create all edges inside one durable transaction. Validation covers
    /// the whole batch before anything is written; see
    /// [`batch_create_nodes`](Self::batch_create_nodes) for the commit
    /// ordering.
    pub fn batch_create_edges(&self, specs: Vec<EdgeSpec>) -> GraphResult<Vec<Edge>> {
        let mut state = self.write_state();

        let mut edges = Vec::with_capacity(specs.len());
        for spec in specs {
            if spec.weight <= 0.0 {
                return Err(GraphError::InvalidEdgeWeight(spec.weight));
            }
            if !state.contains_node(&spec.source) {
                return Err(GraphError::InvalidEdgeSource(spec.source));
            }
            if !state.contains_node(&spec.target) {
                return Err(GraphError::InvalidEdgeTarget(spec.target));
            }
            edges.push(Edge::new(
                EdgeId::generate(&spec.edge_type),
                spec.source,
                spec.target,
                spec.edge_type,
                spec.weight,
                spec.properties,
            ));
        }

        self.store
            .apply_batch(edges.iter().cloned().map(BatchOp::UpsertEdge).collect())?;
        for edge in &edges {
            state.insert_edge(edge.clone());
        }
        drop(state);

        for edge in &edges {
            self.cache_edge(edge);
            self.publish(GraphEvent::EdgeCreated(edge.clone()));
        }
        debug!(count = edges.len(), "batch edge create committed");
        Ok(edges)
    }

    // ------------------------------------------------------------
    // Export, import, maintenance
    // ------------------------------------------------------------

    pub fn export_graph(&self) -> GraphExport {
        let state = self.read_state();
        GraphExport {
            nodes: state.nodes().cloned().collect(),
            edges: state.edges().cloned().collect(),
            clusters: state.clusters().cloned().collect(),
        }
    }

    /// Replace the whole graph with the exported contents. Every edge must
    /// reference a node inside the export.
    pub fn import_graph(&self, export: GraphExport) -> GraphResult<()> {
        for edge in &export.edges {
            if !export.nodes.iter().any(|node| node.id == edge.source) {
                return Err(GraphError::InvalidEdgeSource(edge.source.clone()));
            }
            if !export.nodes.iter().any(|node| node.id == edge.target) {
                return Err(GraphError::InvalidEdgeTarget(edge.target.clone()));
            }
        }

        let mut state = self.write_state();

        // Deletions of the current contents and upserts of the import go
        // through one batch, so a storage failure leaves the previous
        // graph durably intact. Re-imported ids are rewritten by the
        // later upsert.
        let mut ops: Vec<BatchOp> = Vec::new();
        ops.extend(state.nodes().map(|node| BatchOp::DeleteNode(node.id.clone())));
        ops.extend(state.edges().map(|edge| BatchOp::DeleteEdge(edge.id.clone())));
        ops.extend(
            state
                .clusters()
                .map(|cluster| BatchOp::DeleteCluster(cluster.id.clone())),
        );
        ops.extend(export.nodes.iter().cloned().map(BatchOp::UpsertNode));
        ops.extend(export.edges.iter().cloned().map(BatchOp::UpsertEdge));
        ops.extend(export.clusters.iter().cloned().map(BatchOp::UpsertCluster));
        self.store.apply_batch(ops)?;

        state.clear();
        for node in export.nodes {
            state.insert_node(node);
        }
        for edge in export.edges {
            state.insert_edge(edge);
        }
        state.set_clusters(export.clusters);

        info!(
            nodes = state.node_count(),
            edges = state.edge_count(),
            "graph imported"
        );
        Ok(())
    }

    pub fn clear_graph(&self) -> GraphResult<()> {
        let mut state = self.write_state();
        self.store.clear()?;
        state.clear();
        info!("graph cleared");
        Ok(())
    }

    /// Remove orphaned nodes (total degree zero) and edges weaker than
    /// `min_weight`, in one durable batch.
    pub fn prune(&self, min_weight: f64) -> GraphResult<PruneReport> {
        let mut state = self.write_state();

        let orphans: Vec<NodeId> = state
            .nodes()
            .filter(|node| state.degree(&node.id).total == 0)
            .map(|node| node.id.clone())
            .collect();
        let weak: Vec<EdgeId> = state
            .edges()
            .filter(|edge| edge.weight < min_weight)
            .map(|edge| edge.id.clone())
            .collect();

        let report = PruneReport {
            orphan_nodes: orphans.len(),
            weak_edges: weak.len(),
        };
        if orphans.is_empty() && weak.is_empty() {
            return Ok(report);
        }

        let mut ops: Vec<BatchOp> = Vec::with_capacity(orphans.len() + weak.len());
        ops.extend(orphans.iter().cloned().map(BatchOp::DeleteNode));
        ops.extend(weak.iter().cloned().map(BatchOp::DeleteEdge));
        self.store.apply_batch(ops)?;

        for id in &orphans {
            state.remove_node(id);
        }
        for id in &weak {
            state.remove_edge(id);
        }
        drop(state);

        for id in orphans {
            self.publish(GraphEvent::NodeDeleted(id));
        }
        for id in weak {
            self.publish(GraphEvent::EdgeDeleted(id));
        }

        info!(
            orphan_nodes = report.orphan_nodes,
            weak_edges = report.weak_edges,
            "prune pass complete"
        );
        Ok(report)
    }

    /// Rewrite every node and edge into the lookup cache with a fresh TTL.
    /// Individual cache failures are logged and skipped.
    pub fn sync_cache(&self) -> usize {
        let (nodes, edges) = {
            let state = self.read_state();
            (
                state.nodes().cloned().collect::<Vec<_>>(),
                state.edges().cloned().collect::<Vec<_>>(),
            )
        };

        let count = nodes.len() + edges.len();
        for node in &nodes {
            self.cache_node(node);
        }
        for edge in &edges {
            self.cache_edge(edge);
        }
        debug!(entries = count, "cache resynced");
        count
    }

    pub fn node_count(&self) -> usize {
        self.read_state().node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.read_state().edge_count()
    }
}
