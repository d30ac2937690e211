//! Graph algorithms
//!
//! Everything here runs against a [`GraphView`] snapshot rather than the
//! live engine state, so long passes never block writers.

pub mod community;
pub mod pagerank;
pub mod pathfinding;
pub mod traversal;
pub mod view;

pub use pagerank::{page_rank, PageRankConfig};
pub use pathfinding::{shortest_path, ShortestPath};
pub use traversal::{Bfs, Dfs};
pub use view::GraphView;
