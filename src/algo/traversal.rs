//! Depth-bounded BFS and DFS over a graph snapshot
//!
//! Both traversals are lazy iterators: nothing past the last yielded node
//! has been explored, and a fresh iterator restarts from scratch. A node is
//! visited at most once; nodes at the depth bound are yielded but not
//! expanded.

use super::view::GraphView;
use std::collections::VecDeque;

/// Level-order traversal yielding dense node indices in discovery order
pub struct Bfs<'a> {
    view: &'a GraphView,
    queue: VecDeque<(usize, usize)>,
    visited: Vec<bool>,
    max_depth: usize,
}

impl<'a> Bfs<'a> {
    pub fn new(view: &'a GraphView, start: usize, max_depth: usize) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back((start, 0));
        Bfs {
            view,
            queue,
            visited: vec![false; view.node_count],
            max_depth,
        }
    }
}

impl Iterator for Bfs<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while let Some((node, depth)) = self.queue.pop_front() {
            if self.visited[node] {
                continue;
            }
            self.visited[node] = true;

            if depth < self.max_depth {
                for &neighbor in &self.view.outgoing[node] {
                    if !self.visited[neighbor] {
                        self.queue.push_back((neighbor, depth + 1));
                    }
                }
            }

            return Some(node);
        }
        None
    }
}

/// Pre-order depth-first traversal with the same depth bound and
/// once-only visitation as [`Bfs`]
pub struct Dfs<'a> {
    view: &'a GraphView,
    stack: Vec<(usize, usize)>,
    visited: Vec<bool>,
    max_depth: usize,
}

impl<'a> Dfs<'a> {
    pub fn new(view: &'a GraphView, start: usize, max_depth: usize) -> Self {
        Dfs {
            view,
            stack: vec![(start, 0)],
            visited: vec![false; view.node_count],
            max_depth,
        }
    }
}

impl Iterator for Dfs<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while let Some((node, depth)) = self.stack.pop() {
            if self.visited[node] {
                continue;
            }
            self.visited[node] = true;

            if depth < self.max_depth {
                // Reverse push so the first neighbor is explored first.
                for &neighbor in self.view.outgoing[node].iter().rev() {
                    if !self.visited[neighbor] {
                        self.stack.push((neighbor, depth + 1));
                    }
                }
            }

            return Some(node);
        }
        None
    }
}
