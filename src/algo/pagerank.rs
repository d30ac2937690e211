//! PageRank centrality

use super::view::GraphView;
use crate::graph::NodeId;
use std::collections::HashMap;

/// PageRank parameters
///
/// The iteration count is fixed: the pass always runs to `iterations`
/// without an early convergence check, trading a little wasted work for a
/// predictable cost per invocation.
#[derive(Debug, Clone)]
pub struct PageRankConfig {
    /// Damping factor (probability of following a link vs teleporting)
    pub damping: f64,
    pub iterations: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            iterations: 20,
        }
    }
}

/// Power-iteration PageRank over a snapshot
///
/// Every node starts at `1/N`; each iteration a node receives
/// `damping * rank(source) / out_degree(source)` from each in-neighbor plus
/// the uniform teleportation term `(1 - damping) / N`.
pub fn page_rank(view: &GraphView, config: &PageRankConfig) -> HashMap<NodeId, f64> {
    let n = view.node_count;
    if n == 0 {
        return HashMap::new();
    }

    let mut scores = vec![1.0 / n as f64; n];
    let mut next = vec![0.0; n];
    let base = (1.0 - config.damping) / n as f64;

    for _ in 0..config.iterations {
        for (idx, slot) in next.iter_mut().enumerate() {
            let mut incoming = 0.0;
            for &source in &view.incoming[idx] {
                let out_degree = view.out_degree(source);
                if out_degree > 0 {
                    incoming += scores[source] / out_degree as f64;
                }
            }
            *slot = base + config.damping * incoming;
        }
        scores.copy_from_slice(&next);
    }

    let mut result = HashMap::with_capacity(n);
    for (idx, score) in scores.into_iter().enumerate() {
        result.insert(view.node_id(idx).clone(), score);
    }
    result
}
