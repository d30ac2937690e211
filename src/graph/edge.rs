//! Edge entity

use super::property::{PropertyMap, PropertyValue};
use super::types::{now_millis, EdgeId, NodeId};
use serde::{Deserialize, Serialize};

/// A directed, weighted, typed relationship between two nodes
///
/// `weight` is interpreted as closeness: higher weight means a cheaper hop
/// for shortest-path computation. It must be strictly positive; the engine
/// rejects non-positive weights at create and update time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,

    /// The edge goes FROM this node
    pub source: NodeId,

    /// The edge goes TO this node
    pub target: NodeId,

    /// Relationship type (e.g. "follows", "attended")
    pub edge_type: String,

    pub weight: f64,

    pub properties: PropertyMap,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
}

/// Partial update applied to an existing edge
///
/// Endpoints are immutable; only type, weight, and properties can change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeUpdate {
    pub edge_type: Option<String>,
    pub weight: Option<f64>,
    pub properties: Option<PropertyMap>,
}

impl Edge {
    pub fn new(
        id: EdgeId,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<String>,
        weight: f64,
        properties: PropertyMap,
    ) -> Self {
        Edge {
            id,
            source,
            target,
            edge_type: edge_type.into(),
            weight,
            properties,
            created_at: now_millis(),
        }
    }

    /// Merge a partial update into this edge
    ///
    /// Weight validation happens in the engine before this is called.
    pub fn merge(&mut self, update: EdgeUpdate) {
        if let Some(edge_type) = update.edge_type {
            self.edge_type = edge_type;
        }
        if let Some(weight) = update.weight {
            self.weight = weight;
        }
        if let Some(properties) = update.properties {
            for (key, value) in properties {
                self.properties.insert(key, value);
            }
        }
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// True if the edge runs between the two nodes in the given direction
    pub fn links(&self, source: &NodeId, target: &NodeId) -> bool {
        self.source == *source && self.target == *target
    }

    /// True if the edge touches the node at either end
    pub fn touches(&self, node: &NodeId) -> bool {
        self.source == *node || self.target == *node
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}
