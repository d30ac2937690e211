//! Core graph domain types and the engine

pub mod cluster;
pub mod edge;
pub mod engine;
pub mod event;
pub mod node;
pub mod property;
pub mod state;
pub mod types;

pub use cluster::Cluster;
pub use edge::{Edge, EdgeUpdate};
pub use engine::{
    EdgeSpec, EngineConfig, GraphEngine, GraphError, GraphExport, GraphPath, GraphResult,
    GraphStats, NodeSpec, PruneReport,
};
pub use event::GraphEvent;
pub use node::{Node, NodeUpdate};
pub use property::{props, PropertyMap, PropertyValue};
pub use state::{Degree, GraphState};
pub use types::{ClusterId, EdgeId, NodeId};

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn node(id: &str) -> Node {
        Node::new(NodeId::new(id), "user", PropertyMap::new())
    }

    pub fn edge(id: &str, source: &str, target: &str) -> Edge {
        weighted_edge(id, source, target, 1.0)
    }

    pub fn weighted_edge(id: &str, source: &str, target: &str, weight: f64) -> Edge {
        Edge::new(
            EdgeId::new(id),
            NodeId::new(source),
            NodeId::new(target),
            "follows",
            weight,
            PropertyMap::new(),
        )
    }
}
