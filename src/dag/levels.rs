// src/dag/levels.rs

//! Cycle detection and level assignment.
//!
//! A node's level is the length of the *longest* path reaching it from any
//! root, so every successor sits strictly below all of its predecessors.

use tracing::{debug, warn};

use crate::dag::Graph;
use crate::errors::{DagboardError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    /// On the current DFS path.
    Visiting,
    Done,
}

impl Graph {
    /// Detect cycles and assign `level` to every node.
    ///
    /// On `Cycle` no level is modified.
    pub fn compute_levels(&mut self) -> Result<()> {
        let order = match topological_order(self) {
            Ok(order) => order,
            Err(err) => {
                warn!(error = %err, "cannot assign DAG levels");
                return Err(err);
            }
        };

        let mut levels = vec![0usize; self.len()];
        for &idx in &order {
            let next = levels[idx] + 1;
            for &child in self.successor_indices(idx) {
                levels[child] = levels[child].max(next);
            }
        }

        for (idx, level) in levels.into_iter().enumerate() {
            self.node_at_mut(idx).level = level;
        }

        debug!(nodes = self.len(), depth = self.depth(), "assigned DAG levels");
        Ok(())
    }

    /// Number of distinct levels (0 for an empty graph).
    pub fn depth(&self) -> usize {
        self.nodes().map(|n| n.level + 1).max().unwrap_or(0)
    }
}

/// Iterative DFS returning node indices in topological order.
///
/// Roots are explored first, in insertion order; any node left unvisited
/// afterwards can only be reached through a cycle, so it is explored too
/// and the cycle reported.
fn topological_order(graph: &Graph) -> Result<Vec<usize>> {
    let n = graph.len();
    let mut marks = vec![Mark::Unvisited; n];
    let mut post_order = Vec::with_capacity(n);
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for start in graph.root_indices().chain(0..n) {
        if marks[start] != Mark::Unvisited {
            continue;
        }

        marks[start] = Mark::Visiting;
        stack.push((start, 0));

        while let Some(&(idx, next_child)) = stack.last() {
            match graph.successor_indices(idx).get(next_child) {
                Some(&child) => {
                    if let Some(top) = stack.last_mut() {
                        top.1 += 1;
                    }
                    match marks[child] {
                        Mark::Visiting => {
                            return Err(DagboardError::Cycle(graph.node_at(child).name.clone()));
                        }
                        Mark::Unvisited => {
                            marks[child] = Mark::Visiting;
                            stack.push((child, 0));
                        }
                        Mark::Done => {}
                    }
                }
                None => {
                    marks[idx] = Mark::Done;
                    post_order.push(idx);
                    stack.pop();
                }
            }
        }
    }

    post_order.reverse();
    Ok(post_order)
}
