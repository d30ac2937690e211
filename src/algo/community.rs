//! Greedy modularity community detection
//!
//! Single-level label moving: every node starts in its own community and
//! repeatedly adopts the neighboring community with the best modularity
//! gain, until a full sweep moves nothing or the sweep cap is hit. There is
//! no hierarchy pass; the labels produced by the final sweep are the
//! result.

use super::view::GraphView;
use indexmap::{IndexMap, IndexSet};

/// Sweeps over all nodes before the pass gives up on convergence
const MAX_SWEEPS: usize = 100;

/// Partition the snapshot into communities of dense node indices.
///
/// Communities are returned in order of first appearance, members in the
/// order they were assigned, so repeated runs over the same snapshot
/// produce the same partition.
pub fn detect(view: &GraphView) -> Vec<Vec<usize>> {
    let n = view.node_count;
    if n == 0 {
        return Vec::new();
    }

    let total_edges = view.edge_count() as f64;
    let mut community: Vec<usize> = (0..n).collect();

    if total_edges > 0.0 {
        for _ in 0..MAX_SWEEPS {
            let mut moved = false;

            for node in 0..n {
                // Undirected neighborhood: both edge directions count
                // toward community affinity.
                let mut neighbors: IndexSet<usize> = IndexSet::new();
                neighbors.extend(view.outgoing[node].iter().copied());
                neighbors.extend(view.incoming[node].iter().copied());
                neighbors.shift_remove(&node);

                if neighbors.is_empty() {
                    continue;
                }

                // Weight of this node's ties into each adjacent community.
                let mut ties: IndexMap<usize, f64> = IndexMap::new();
                for &neighbor in &neighbors {
                    let weight =
                        view.pair_weight(node, neighbor) + view.pair_weight(neighbor, node);
                    *ties.entry(community[neighbor]).or_insert(0.0) += weight;
                }

                let current = community[node];
                let current_ties = ties.get(&current).copied().unwrap_or(0.0);

                let mut best = current;
                let mut best_gain = 0.0;
                for (&candidate, &weight) in &ties {
                    if candidate == current {
                        continue;
                    }
                    let gain = (weight - current_ties) / total_edges;
                    if gain > best_gain {
                        best_gain = gain;
                        best = candidate;
                    }
                }

                if best != current {
                    community[node] = best;
                    moved = true;
                }
            }

            if !moved {
                break;
            }
        }
    }

    let mut groups: IndexMap<usize, Vec<usize>> = IndexMap::new();
    for (node, &label) in community.iter().enumerate() {
        groups.entry(label).or_default().push(node);
    }
    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::{edge, node};
    use crate::graph::{GraphState, NodeId};

    fn clique(state: &mut GraphState, ids: &[&str]) {
        for id in ids {
            state.insert_node(node(id));
        }
        for (i, a) in ids.iter().enumerate() {
            for b in ids.iter().skip(i + 1) {
                state.insert_edge(edge(&format!("{}-{}", a, b), a, b));
                state.insert_edge(edge(&format!("{}-{}", b, a), b, a));
            }
        }
    }

    #[test]
    fn test_two_cliques_split_into_two_communities() {
        let mut state = GraphState::new();
        clique(&mut state, &["a1", "a2", "a3", "a4", "a5"]);
        clique(&mut state, &["b1", "b2", "b3", "b4", "b5"]);
        // One weak bridge between the cliques.
        state.insert_edge(edge("bridge", "a1", "b1"));

        let view = GraphView::new(&state);
        let communities = detect(&view);

        assert_eq!(communities.len(), 2);
        for members in &communities {
            assert_eq!(members.len(), 5);
            let prefix = view.node_id(members[0]).as_str().chars().next().unwrap();
            for &member in members {
                assert!(view.node_id(member).as_str().starts_with(prefix));
            }
        }
    }

    #[test]
    fn test_isolated_nodes_stay_alone() {
        let mut state = GraphState::new();
        state.insert_node(node("a"));
        state.insert_node(node("b"));

        let view = GraphView::new(&state);
        let communities = detect(&view);
        assert_eq!(communities.len(), 2);
        assert_eq!(
            view.node_id(communities[0][0]),
            &NodeId::new("a")
        );
    }

    #[test]
    fn test_empty_graph() {
        let state = GraphState::new();
        let view = GraphView::new(&state);
        assert!(detect(&view).is_empty());
    }
}
