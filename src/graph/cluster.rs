//! Derived community clusters
//!
//! Clusters are recomputable output of community detection, persisted as an
//! upsert-by-id snapshot. They are never patched incrementally; a node
//! deletion leaves its cluster membership stale until the next detection run.

use super::property::PropertyMap;
use super::types::{ClusterId, NodeId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,

    pub node_ids: Vec<NodeId>,

    /// Member with the highest total degree at detection time
    pub centroid: NodeId,

    /// Internal edge count / `n * (n - 1)`; 1.0 for singletons
    pub density: f64,

    pub metadata: PropertyMap,
}

impl Cluster {
    pub fn size(&self) -> usize {
        self.node_ids.len()
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.node_ids.iter().any(|id| id == node_id)
    }
}
