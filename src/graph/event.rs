//! Lifecycle events for external subscribers
//!
//! Mutations publish typed events on a bounded broadcast channel. Slow or
//! absent subscribers never block or fail the originating operation.

use super::edge::Edge;
use super::node::Node;
use super::types::{EdgeId, NodeId};

#[derive(Debug, Clone)]
pub enum GraphEvent {
    NodeCreated(Node),
    NodeUpdated(Node),
    NodeDeleted(NodeId),
    EdgeCreated(Edge),
    EdgeUpdated(Edge),
    EdgeDeleted(EdgeId),
}
