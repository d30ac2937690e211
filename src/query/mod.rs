//! Declarative graph queries
//!
//! A [`GraphQuery`] either expands outward from a start node (bounded BFS)
//! or scans the whole store. Either way the node and edge result lists are
//! truncated by `limit` independently of each other, so a returned edge may
//! reference a node that fell past the node limit.

use crate::graph::{Edge, GraphState, Node, NodeId, PropertyMap};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphQuery {
    /// Expand from this node instead of scanning everything
    pub start_node: Option<NodeId>,

    /// BFS depth bound; `None` means unbounded (the visited set still
    /// terminates the walk)
    pub depth: Option<usize>,

    /// Keep only nodes whose type is listed
    pub node_types: Option<Vec<String>>,

    /// Keep only edges whose type is listed
    pub edge_types: Option<Vec<String>>,

    /// Exact-match property filters, all of which a node must satisfy
    pub filters: Option<PropertyMap>,

    /// Independent cap on each result list
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

fn node_matches(node: &Node, query: &GraphQuery) -> bool {
    if let Some(types) = &query.node_types {
        if !types.contains(&node.node_type) {
            return false;
        }
    }
    if let Some(filters) = &query.filters {
        for (key, expected) in filters {
            if node.properties.get(key) != Some(expected) {
                return false;
            }
        }
    }
    true
}

fn edge_matches(edge: &Edge, query: &GraphQuery) -> bool {
    match &query.edge_types {
        Some(types) => types.contains(&edge.edge_type),
        None => true,
    }
}

/// Run a query against a consistent view of the graph state.
pub fn run(state: &GraphState, query: &GraphQuery) -> QueryResult {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();

    if let Some(start) = &query.start_node {
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut queue: VecDeque<(NodeId, usize)> = VecDeque::new();
        queue.push_back((start.clone(), 0));

        while let Some((node_id, depth)) = queue.pop_front() {
            if !visited.insert(node_id.clone()) {
                continue;
            }
            if query.depth.is_some_and(|max| depth > max) {
                continue;
            }

            let Some(node) = state.node(&node_id) else {
                continue;
            };

            // A node that fails the filters is dropped along with its
            // entire outward frontier.
            if !node_matches(node, query) {
                continue;
            }

            nodes.push(node.clone());

            for edge in state.edges_from(&node_id) {
                if !edge_matches(edge, query) {
                    continue;
                }
                edges.push(edge.clone());
                if !visited.contains(&edge.target) {
                    queue.push_back((edge.target.clone(), depth + 1));
                }
            }
        }
    } else {
        for node in state.nodes() {
            if node_matches(node, query) {
                nodes.push(node.clone());
            }
        }
        for edge in state.edges() {
            if edge_matches(edge, query) {
                edges.push(edge.clone());
            }
        }
    }

    if let Some(limit) = query.limit {
        nodes.truncate(limit);
        edges.truncate(limit);
    }

    QueryResult { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::props;
    use crate::graph::test_support::{edge, node};
    use crate::graph::{Edge, EdgeId, Node, PropertyMap};

    fn typed_node(id: &str, node_type: &str) -> Node {
        Node::new(NodeId::new(id), node_type, PropertyMap::new())
    }

    fn typed_edge(id: &str, source: &str, target: &str, edge_type: &str) -> Edge {
        Edge::new(
            EdgeId::new(id),
            NodeId::new(source),
            NodeId::new(target),
            edge_type,
            1.0,
            PropertyMap::new(),
        )
    }

    fn chain() -> GraphState {
        let mut state = GraphState::new();
        state.insert_node(typed_node("a", "user"));
        state.insert_node(typed_node("b", "user"));
        state.insert_node(typed_node("c", "event"));
        state.insert_edge(typed_edge("e1", "a", "b", "follows"));
        state.insert_edge(typed_edge("e2", "b", "c", "attended"));
        state
    }

    #[test]
    fn test_scan_filters_by_type() {
        let state = chain();
        let result = run(
            &state,
            &GraphQuery {
                node_types: Some(vec!["user".to_string()]),
                edge_types: Some(vec!["follows".to_string()]),
                ..Default::default()
            },
        );
        assert_eq!(result.nodes.len(), 2);
        assert_eq!(result.edges.len(), 1);
        assert_eq!(result.edges[0].id, EdgeId::new("e1"));
    }

    #[test]
    fn test_scan_filters_by_property() {
        let mut state = GraphState::new();
        let mut alice = typed_node("a", "user");
        alice.properties = props([("city", "lisbon")]);
        state.insert_node(alice);
        state.insert_node(typed_node("b", "user"));

        let result = run(
            &state,
            &GraphQuery {
                filters: Some(props([("city", "lisbon")])),
                ..Default::default()
            },
        );
        assert_eq!(result.nodes.len(), 1);
        assert_eq!(result.nodes[0].id, NodeId::new("a"));
    }

    #[test]
    fn test_bfs_respects_depth() {
        let state = chain();
        let result = run(
            &state,
            &GraphQuery {
                start_node: Some(NodeId::new("a")),
                depth: Some(1),
                ..Default::default()
            },
        );
        let ids: Vec<&str> = result.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_filtered_node_is_not_expanded() {
        let state = chain();
        // b fails the type filter, so c is never reached even though it
        // would pass.
        let result = run(
            &state,
            &GraphQuery {
                start_node: Some(NodeId::new("a")),
                node_types: Some(vec!["user".to_string(), "event".to_string()]),
                filters: Some(props([("missing", "x")])),
                ..Default::default()
            },
        );
        assert!(result.nodes.is_empty());
        assert!(result.edges.is_empty());
    }

    #[test]
    fn test_limit_truncates_nodes_and_edges_independently() {
        let mut state = GraphState::new();
        for id in ["a", "b", "c", "d"] {
            state.insert_node(node(id));
        }
        state.insert_edge(edge("e1", "a", "b"));
        state.insert_edge(edge("e2", "b", "c"));
        state.insert_edge(edge("e3", "c", "d"));

        let result = run(
            &state,
            &GraphQuery {
                start_node: Some(NodeId::new("a")),
                limit: Some(2),
                ..Default::default()
            },
        );

        // Two nodes and two edges survive, even though edge e2 leads to
        // node c, which was cut from the node list.
        assert_eq!(result.nodes.len(), 2);
        assert_eq!(result.edges.len(), 2);
        assert_eq!(result.edges[1].id, EdgeId::new("e2"));
    }

    #[test]
    fn test_missing_start_node_yields_empty_result() {
        let state = chain();
        let result = run(
            &state,
            &GraphQuery {
                start_node: Some(NodeId::new("ghost")),
                ..Default::default()
            },
        );
        assert!(result.nodes.is_empty());
        assert!(result.edges.is_empty());
    }
}
