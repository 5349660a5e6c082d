// src/dag/graph.rs

use std::collections::HashMap;

use tracing::debug;

use crate::dag::node::Node;
use crate::errors::{DagboardError, Result};

/// In-memory workflow DAG keyed by node name.
///
/// Nodes live in an arena in insertion order; edges are stored as index
/// lists in both directions. Edges can only be added through
/// [`Graph::add_dependency`], so once a run's graph has been handed to the
/// progress store its topology never changes.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    /// `successors[i]`: nodes unblocked by node `i` completing.
    successors: Vec<Vec<usize>>,
    /// `dependencies[i]`: nodes that must complete before node `i`.
    dependencies: Vec<Vec<usize>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the node called `name`, creating it (no edges, level 0) if it
    /// does not exist yet.
    pub fn add_node(&mut self, name: &str) -> &mut Node {
        let idx = self.ensure_node(name);
        &mut self.nodes[idx]
    }

    /// Declare that `depends_on` must complete before `node`.
    ///
    /// Unknown names are created on the fly. Fails without touching the
    /// graph on a self-dependency or a repeated (node, dependency) pair.
    pub fn add_dependency(&mut self, node: &str, depends_on: &str) -> Result<()> {
        if node == depends_on {
            return Err(DagboardError::SelfDependency(node.to_string()));
        }

        let child = self.ensure_node(node);
        let parent = self.ensure_node(depends_on);

        if self.dependencies[child].contains(&parent) {
            return Err(DagboardError::DuplicateDependency {
                node: node.to_string(),
                dependency: depends_on.to_string(),
            });
        }

        self.dependencies[child].push(parent);
        self.successors[parent].push(child);
        debug!(node = %node, depends_on = %depends_on, "added dependency");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.index.get(name).map(|&idx| &self.nodes[idx])
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut Node> {
        let idx = *self.index.get(name)?;
        Some(&mut self.nodes[idx])
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Immediate successors of a node (nodes that depend on it).
    pub fn successors_of(&self, name: &str) -> Vec<&str> {
        self.names_of(self.index.get(name).map(|&idx| self.successors[idx].as_slice()))
    }

    /// Immediate dependencies of a node.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        self.names_of(self.index.get(name).map(|&idx| self.dependencies[idx].as_slice()))
    }

    /// Nodes without declared dependencies, in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = &Node> {
        self.root_indices().map(|idx| &self.nodes[idx])
    }

    /// Every edge as a `(node, depends_on)` pair, in insertion order of the
    /// dependent node.
    pub fn edges(&self) -> Vec<(String, String)> {
        self.dependencies
            .iter()
            .enumerate()
            .flat_map(|(child, parents)| {
                parents.iter().map(move |&parent| {
                    (
                        self.nodes[child].name.clone(),
                        self.nodes[parent].name.clone(),
                    )
                })
            })
            .collect()
    }

    /// Character length of the longest node name (0 for an empty graph).
    pub fn longest_name_len(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| n.name.chars().count())
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn root_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.dependencies
            .iter()
            .enumerate()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(idx, _)| idx)
    }

    pub(crate) fn successor_indices(&self, idx: usize) -> &[usize] {
        &self.successors[idx]
    }

    pub(crate) fn node_at(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    pub(crate) fn node_at_mut(&mut self, idx: usize) -> &mut Node {
        &mut self.nodes[idx]
    }

    fn ensure_node(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }

        let idx = self.nodes.len();
        self.nodes.push(Node::new(name));
        self.index.insert(name.to_string(), idx);
        self.successors.push(Vec::new());
        self.dependencies.push(Vec::new());
        idx
    }

    fn names_of(&self, indices: Option<&[usize]>) -> Vec<&str> {
        indices
            .unwrap_or(&[])
            .iter()
            .map(|&idx| self.nodes[idx].name.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_node_is_idempotent() {
        let mut graph = Graph::new();
        graph.add_node("A").aliases.push("first".to_string());
        graph.add_node("A");

        assert_eq!(graph.len(), 1);
        assert_eq!(graph.node("A").map(|n| n.aliases.clone()), Some(vec!["first".to_string()]));
    }

    #[test]
    fn add_dependency_records_both_directions() {
        let mut graph = Graph::new();
        graph.add_dependency("B", "A").unwrap();

        assert_eq!(graph.successors_of("A"), vec!["B"]);
        assert_eq!(graph.dependencies_of("B"), vec!["A"]);
        let roots: Vec<_> = graph.roots().map(|n| n.name.as_str()).collect();
        assert_eq!(roots, vec!["A"]);
    }

    #[test]
    fn duplicate_dependency_is_rejected() {
        let mut graph = Graph::new();
        graph.add_dependency("X", "Y").unwrap();

        match graph.add_dependency("X", "Y") {
            Err(DagboardError::DuplicateDependency { node, dependency }) => {
                assert_eq!(node, "X");
                assert_eq!(dependency, "Y");
            }
            other => panic!("expected DuplicateDependency, got {other:?}"),
        }
        assert_eq!(graph.successors_of("Y"), vec!["X"]);
    }

    #[test]
    fn self_dependency_is_rejected_without_creating_nodes() {
        let mut graph = Graph::new();
        let err = graph.add_dependency("X", "X").unwrap_err();

        assert!(matches!(err, DagboardError::SelfDependency(ref n) if n == "X"));
        assert!(err.is_structural());
        assert!(graph.is_empty());
    }

    #[test]
    fn edges_lists_each_dependency_once() {
        let mut graph = Graph::new();
        graph.add_dependency("B", "A").unwrap();
        graph.add_dependency("C", "A").unwrap();
        graph.add_dependency("C", "B").unwrap();

        assert_eq!(
            graph.edges(),
            vec![
                ("B".to_string(), "A".to_string()),
                ("C".to_string(), "A".to_string()),
                ("C".to_string(), "B".to_string()),
            ]
        );
    }

    #[test]
    fn longest_name_len_counts_chars() {
        let mut graph = Graph::new();
        assert_eq!(graph.longest_name_len(), 0);
        graph.add_node("ab");
        graph.add_node("größe");
        assert_eq!(graph.longest_name_len(), 5);
    }
}
