// src/layout/layers.rs

//! Level bucketing and dummy-node insertion.
//!
//! The layout engine works on a copy of the DAG in which every edge spans
//! exactly one level. Edges that skip levels are split into chains of
//! [`Slot::Dummy`] nodes, one per skipped level.

use crate::dag::Graph;

/// One entry in the working graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// A real DAG node, by its index in the source [`Graph`].
    Real(usize),
    /// Synthetic node on a skip edge; discarded before output.
    Dummy,
}

/// Working graph for one layout pass.
///
/// Real nodes keep their graph index as working index; dummies are appended
/// after them. `levels[l]` lists working indices in their current order
/// within level `l`.
#[derive(Debug, Clone)]
pub struct LayeredGraph {
    slots: Vec<Slot>,
    /// Predecessors of each working node, all exactly one level above it.
    predecessors: Vec<Vec<usize>>,
    levels: Vec<Vec<usize>>,
}

impl LayeredGraph {
    /// Bucket the nodes of `graph` by level and split skip edges.
    ///
    /// Assumes levels were assigned with [`Graph::compute_levels`]. Nodes are
    /// bucketed in insertion order; the dummies of a node's outgoing skip
    /// edges are appended to their levels right after the node itself is
    /// bucketed.
    pub fn build(graph: &Graph) -> Self {
        let n = graph.len();
        let mut layered = Self {
            slots: (0..n).map(Slot::Real).collect(),
            predecessors: vec![Vec::new(); n],
            levels: vec![Vec::new(); graph.depth()],
        };

        for idx in 0..n {
            let level = graph.node_at(idx).level;
            layered.levels[level].push(idx);

            for &child in graph.successor_indices(idx) {
                let child_level = graph.node_at(child).level;
                debug_assert!(child_level > level, "levels not assigned");

                let mut from = idx;
                for dummy_level in level + 1..child_level {
                    let dummy = layered.push_dummy(dummy_level);
                    layered.predecessors[dummy].push(from);
                    from = dummy;
                }
                layered.predecessors[child].push(from);
            }
        }

        layered
    }

    /// Number of working nodes, dummies included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn dummy_count(&self) -> usize {
        self.slots.iter().filter(|s| **s == Slot::Dummy).count()
    }

    pub fn slot(&self, working_idx: usize) -> Slot {
        self.slots[working_idx]
    }

    pub fn predecessors(&self, working_idx: usize) -> &[usize] {
        &self.predecessors[working_idx]
    }

    pub fn levels(&self) -> &[Vec<usize>] {
        &self.levels
    }

    /// Node names of one level in current order; `None` marks a dummy.
    pub fn level_names<'g>(&self, graph: &'g Graph, level: usize) -> Vec<Option<&'g str>> {
        self.levels
            .get(level)
            .map(|bucket| {
                bucket
                    .iter()
                    .map(|&w| match self.slots[w] {
                        Slot::Real(idx) => Some(graph.node_at(idx).name.as_str()),
                        Slot::Dummy => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn set_level_order(&mut self, level: usize, order: Vec<usize>) {
        self.levels[level] = order;
    }

    fn push_dummy(&mut self, level: usize) -> usize {
        let idx = self.slots.len();
        self.slots.push(Slot::Dummy);
        self.predecessors.push(Vec::new());
        self.levels[level].push(idx);
        idx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leveled(edges: &[(&str, &str)]) -> Graph {
        let mut graph = Graph::new();
        for (node, dep) in edges {
            graph.add_dependency(node, dep).unwrap();
        }
        graph.compute_levels().unwrap();
        graph
    }

    #[test]
    fn unit_edges_need_no_dummies() {
        let graph = leveled(&[("B", "A"), ("C", "A"), ("D", "B"), ("D", "C")]);
        let layered = LayeredGraph::build(&graph);

        assert_eq!(layered.dummy_count(), 0);
        assert_eq!(layered.level_names(&graph, 0), vec![Some("A")]);
        assert_eq!(layered.level_names(&graph, 1), vec![Some("B"), Some("C")]);
        assert_eq!(layered.level_names(&graph, 2), vec![Some("D")]);
    }

    #[test]
    fn skip_edge_gets_one_dummy_per_skipped_level() {
        // A -> D directly, plus A -> B -> C -> D.
        let graph = leveled(&[("D", "A"), ("B", "A"), ("C", "B"), ("D", "C")]);
        let layered = LayeredGraph::build(&graph);

        assert_eq!(layered.dummy_count(), 2);
        assert_eq!(layered.levels()[1].len(), 2);
        assert_eq!(layered.levels()[2].len(), 2);

        // Every predecessor sits exactly one level up.
        for (level, bucket) in layered.levels().iter().enumerate().skip(1) {
            for &w in bucket {
                for &p in layered.predecessors(w) {
                    assert!(layered.levels()[level - 1].contains(&p));
                }
            }
        }
    }

    #[test]
    fn dummy_chain_ends_at_the_real_target() {
        let graph = leveled(&[("C", "A"), ("B", "A"), ("C", "B")]);
        let layered = LayeredGraph::build(&graph);

        let c = layered.levels()[2][0];
        assert_eq!(layered.slot(c), Slot::Real(0));
        let preds = layered.predecessors(c);
        assert_eq!(preds.len(), 2);
        assert!(preds.iter().any(|&p| layered.slot(p) == Slot::Dummy));
    }
}
