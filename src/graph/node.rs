//! Node entity

use super::property::{PropertyMap, PropertyValue};
use super::types::{now_millis, NodeId};
use serde::{Deserialize, Serialize};

/// A typed entity in the property graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,

    /// Entity type (e.g. "user", "event")
    pub node_type: String,

    pub properties: PropertyMap,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

/// Partial update applied to an existing node
///
/// Absent fields are left untouched; `properties` entries are merged key by
/// key into the existing map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeUpdate {
    pub node_type: Option<String>,
    pub properties: Option<PropertyMap>,
}

impl Node {
    pub fn new(id: NodeId, node_type: impl Into<String>, properties: PropertyMap) -> Self {
        let now = now_millis();
        Node {
            id,
            node_type: node_type.into(),
            properties,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a partial update into this node and bump `updated_at`
    pub fn merge(&mut self, update: NodeUpdate) {
        if let Some(node_type) = update.node_type {
            self.node_type = node_type;
        }
        if let Some(properties) = update.properties {
            for (key, value) in properties {
                self.properties.insert(key, value);
            }
        }
        self.updated_at = now_millis();
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key.into(), value.into());
        self.updated_at = now_millis();
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::property::props;

    #[test]
    fn test_new_node_timestamps_match() {
        let node = Node::new(NodeId::generate("user"), "user", PropertyMap::new());
        assert!(node.created_at > 0);
        assert_eq!(node.created_at, node.updated_at);
    }

    #[test]
    fn test_merge_preserves_unmentioned_properties() {
        let mut node = Node::new(
            NodeId::new("n1"),
            "user",
            props([("name", "alice"), ("city", "lisbon")]),
        );

        node.merge(NodeUpdate {
            node_type: None,
            properties: Some(props([("city", "porto")])),
        });

        assert_eq!(node.node_type, "user");
        assert_eq!(node.get_property("name").unwrap().as_str(), Some("alice"));
        assert_eq!(node.get_property("city").unwrap().as_str(), Some("porto"));
    }

    #[test]
    fn test_merge_bumps_updated_at() {
        let mut node = Node::new(NodeId::new("n1"), "user", PropertyMap::new());
        let created = node.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(5));
        node.merge(NodeUpdate::default());
        assert!(node.updated_at >= created);
        assert_eq!(node.created_at, created);
    }

    #[test]
    fn test_equality_is_by_id() {
        let a = Node::new(NodeId::new("n1"), "user", PropertyMap::new());
        let b = Node::new(NodeId::new("n1"), "event", PropertyMap::new());
        let c = Node::new(NodeId::new("n2"), "user", PropertyMap::new());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
