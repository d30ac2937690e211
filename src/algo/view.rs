//! Immutable analytics snapshot
//!
//! Analytics passes iterate the whole graph; running them directly against
//! the live maps would mean holding the engine's read guard for the full
//! pass, or worse, observing a torn view. `GraphView` copies the topology
//! into dense integer-indexed adjacency lists once, and every algorithm in
//! this module runs against that frozen copy.

use crate::graph::{EdgeId, GraphState, NodeId};
use std::collections::{HashMap, HashSet};

pub struct GraphView {
    pub node_count: usize,
    /// Dense index (0..N) back to node id
    pub index_to_node: Vec<NodeId>,
    pub node_to_index: HashMap<NodeId, usize>,
    /// Distinct forward neighbors per node, insertion order
    pub outgoing: Vec<Vec<usize>>,
    /// Distinct reverse neighbors per node, insertion order
    pub incoming: Vec<Vec<usize>>,
    /// Every edge as (source index, target index); parallel edges repeat
    edges: Vec<(usize, usize)>,
    /// Cheapest edge per ordered pair, as (edge id, 1/weight cost)
    pair_costs: HashMap<(usize, usize), (EdgeId, f64)>,
    /// Summed edge weight per ordered pair
    pair_weights: HashMap<(usize, usize), f64>,
}

impl GraphView {
    pub fn new(state: &GraphState) -> Self {
        let mut index_to_node = Vec::with_capacity(state.node_count());
        let mut node_to_index = HashMap::with_capacity(state.node_count());

        for node in state.nodes() {
            node_to_index.insert(node.id.clone(), index_to_node.len());
            index_to_node.push(node.id.clone());
        }

        let node_count = index_to_node.len();
        let mut outgoing = vec![Vec::new(); node_count];
        let mut incoming = vec![Vec::new(); node_count];

        for (idx, node_id) in index_to_node.iter().enumerate() {
            if let Some(neighbors) = state.forward_neighbors(node_id) {
                for neighbor in neighbors {
                    if let Some(&n_idx) = node_to_index.get(neighbor) {
                        outgoing[idx].push(n_idx);
                    }
                }
            }
            if let Some(neighbors) = state.reverse_neighbors(node_id) {
                for neighbor in neighbors {
                    if let Some(&n_idx) = node_to_index.get(neighbor) {
                        incoming[idx].push(n_idx);
                    }
                }
            }
        }

        let mut edges = Vec::with_capacity(state.edge_count());
        let mut pair_costs: HashMap<(usize, usize), (EdgeId, f64)> = HashMap::new();
        let mut pair_weights: HashMap<(usize, usize), f64> = HashMap::new();

        for edge in state.edges() {
            let (Some(&src), Some(&dst)) = (
                node_to_index.get(&edge.source),
                node_to_index.get(&edge.target),
            ) else {
                continue;
            };

            edges.push((src, dst));
            *pair_weights.entry((src, dst)).or_insert(0.0) += edge.weight;

            // Weight is closeness, so traversal cost is its inverse; keep
            // the cheapest of any parallel edges.
            let cost = 1.0 / edge.weight;
            match pair_costs.get(&(src, dst)) {
                Some((_, existing)) if *existing <= cost => {}
                _ => {
                    pair_costs.insert((src, dst), (edge.id.clone(), cost));
                }
            }
        }

        Self {
            node_count,
            index_to_node,
            node_to_index,
            outgoing,
            incoming,
            edges,
            pair_costs,
            pair_weights,
        }
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.node_to_index.get(id).copied()
    }

    pub fn node_id(&self, idx: usize) -> &NodeId {
        &self.index_to_node[idx]
    }

    /// Total edge count, parallel edges included
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Traversal cost and edge id of the cheapest edge from `u` to `v`
    pub fn pair_cost(&self, u: usize, v: usize) -> Option<&(EdgeId, f64)> {
        self.pair_costs.get(&(u, v))
    }

    /// Summed weight of edges from `u` to `v`, zero when unconnected
    pub fn pair_weight(&self, u: usize, v: usize) -> f64 {
        self.pair_weights.get(&(u, v)).copied().unwrap_or(0.0)
    }

    pub fn out_degree(&self, idx: usize) -> usize {
        self.outgoing[idx].len()
    }

    pub fn in_degree(&self, idx: usize) -> usize {
        self.incoming[idx].len()
    }

    pub fn total_degree(&self, idx: usize) -> usize {
        self.out_degree(idx) + self.in_degree(idx)
    }

    /// Edges with both endpoints inside the member set, parallel included
    pub fn internal_edge_count(&self, members: &[usize]) -> usize {
        let set: HashSet<usize> = members.iter().copied().collect();
        self.edges
            .iter()
            .filter(|(src, dst)| set.contains(src) && set.contains(dst))
            .count()
    }
}
