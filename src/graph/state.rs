//! In-memory graph state
//!
//! Holds the authoritative in-memory node/edge maps, the forward/reverse
//! adjacency index derived from edges, and the cluster snapshot. Insertion
//! order is preserved so scans and traversals are deterministic.
//!
//! Adjacency invariant: `target` is in `source`'s forward set iff `source`
//! is in `target`'s reverse set. With parallel edges between the same
//! ordered pair, the neighbor entry is removed only when the last edge
//! between the pair goes away.

use super::cluster::Cluster;
use super::edge::Edge;
use super::node::Node;
use super::types::{ClusterId, EdgeId, NodeId};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// In- and out-degree of a node, counted over distinct neighbors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degree {
    pub in_degree: usize,
    pub out_degree: usize,
    pub total: usize,
}

#[derive(Debug, Default)]
pub struct GraphState {
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
    forward: HashMap<NodeId, IndexSet<NodeId>>,
    reverse: HashMap<NodeId, IndexSet<NodeId>>,
    clusters: IndexMap<ClusterId, Cluster>,
}

impl GraphState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.clusters.values()
    }

    pub fn cluster(&self, id: &ClusterId) -> Option<&Cluster> {
        self.clusters.get(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Distinct nodes reachable via one outgoing edge
    pub fn forward_neighbors(&self, id: &NodeId) -> Option<&IndexSet<NodeId>> {
        self.forward.get(id)
    }

    /// Distinct nodes with one incoming edge to this node
    pub fn reverse_neighbors(&self, id: &NodeId) -> Option<&IndexSet<NodeId>> {
        self.reverse.get(id)
    }

    pub fn degree(&self, id: &NodeId) -> Degree {
        let out_degree = self.forward.get(id).map_or(0, IndexSet::len);
        let in_degree = self.reverse.get(id).map_or(0, IndexSet::len);
        Degree {
            in_degree,
            out_degree,
            total: in_degree + out_degree,
        }
    }

    /// All edges from `source` to `target` (ordered pair)
    pub fn edges_between(&self, source: &NodeId, target: &NodeId) -> Vec<&Edge> {
        self.edges
            .values()
            .filter(|edge| edge.links(source, target))
            .collect()
    }

    /// All outgoing edges of a node
    pub fn edges_from(&self, source: &NodeId) -> Vec<&Edge> {
        self.edges
            .values()
            .filter(|edge| edge.source == *source)
            .collect()
    }

    /// Ids of all edges touching a node at either end
    pub fn incident_edge_ids(&self, node_id: &NodeId) -> Vec<EdgeId> {
        self.edges
            .values()
            .filter(|edge| edge.touches(node_id))
            .map(|edge| edge.id.clone())
            .collect()
    }

    // ------------------------------------------------------------
    // Mutations (called by the engine under its write guard)
    // ------------------------------------------------------------

    pub(crate) fn insert_node(&mut self, node: Node) {
        self.forward.entry(node.id.clone()).or_default();
        self.reverse.entry(node.id.clone()).or_default();
        self.nodes.insert(node.id.clone(), node);
    }

    pub(crate) fn replace_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Remove a node, cascading to all incident edges
    pub(crate) fn remove_node(&mut self, id: &NodeId) -> Option<(Node, Vec<Edge>)> {
        let node = self.nodes.shift_remove(id)?;

        let incident = self.incident_edge_ids(id);
        let mut removed_edges = Vec::with_capacity(incident.len());
        for edge_id in incident {
            if let Some(edge) = self.remove_edge(&edge_id) {
                removed_edges.push(edge);
            }
        }

        self.forward.remove(id);
        self.reverse.remove(id);

        Some((node, removed_edges))
    }

    pub(crate) fn insert_edge(&mut self, edge: Edge) {
        self.forward
            .entry(edge.source.clone())
            .or_default()
            .insert(edge.target.clone());
        self.reverse
            .entry(edge.target.clone())
            .or_default()
            .insert(edge.source.clone());
        self.edges.insert(edge.id.clone(), edge);
    }

    pub(crate) fn replace_edge(&mut self, edge: Edge) {
        self.edges.insert(edge.id.clone(), edge);
    }

    pub(crate) fn remove_edge(&mut self, id: &EdgeId) -> Option<Edge> {
        let edge = self.edges.shift_remove(id)?;

        // Drop the adjacency entry only when no parallel edge remains
        // between the same ordered pair.
        if self.edges_between(&edge.source, &edge.target).is_empty() {
            if let Some(set) = self.forward.get_mut(&edge.source) {
                set.shift_remove(&edge.target);
            }
            if let Some(set) = self.reverse.get_mut(&edge.target) {
                set.shift_remove(&edge.source);
            }
        }

        Some(edge)
    }

    pub(crate) fn set_clusters(&mut self, clusters: Vec<Cluster>) {
        self.clusters.clear();
        for cluster in clusters {
            self.clusters.insert(cluster.id.clone(), cluster);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.forward.clear();
        self.reverse.clear();
        self.clusters.clear();
    }
}
