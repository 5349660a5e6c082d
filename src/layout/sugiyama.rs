// src/layout/sugiyama.rs

//! Simplified two-pass Sugiyama layout.
//!
//! 1. bucket nodes by level and split skip edges ([`LayeredGraph`]);
//! 2. level 0 keeps insertion order;
//! 3. every later level is ordered once, top-down, by the barycenter of its
//!    predecessors' positions (stable sort, so ties keep prior order);
//! 4. ranks become coordinates, centred around `x = 0` on each level.
//!
//! There is no bottom-up sweep and no iteration to a fixed point.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::dag::{Graph, Position};
use crate::layout::layers::{LayeredGraph, Slot};
use crate::layout::options::LayoutOptions;

/// Placement of one real node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedNode {
    pub name: String,
    pub level: usize,
    /// Sort rank within the level, dummies included.
    pub rank: usize,
    pub position: Position,
}

/// Result of one layout pass: real nodes only, in graph insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub nodes: Vec<PlacedNode>,
    /// Dummy nodes used while ordering (not part of `nodes`).
    pub dummy_count: usize,
}

impl Layout {
    pub fn get(&self, name: &str) -> Option<&PlacedNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn position_of(&self, name: &str) -> Option<Position> {
        self.get(name).map(|n| n.position)
    }

    /// Every node's position keyed by name, for callers that look up many
    /// nodes at once.
    pub fn positions(&self) -> HashMap<&str, Position> {
        self.nodes
            .iter()
            .map(|n| (n.name.as_str(), n.position))
            .collect()
    }

    /// Copy the computed positions onto the matching nodes of `graph`.
    pub fn apply_to(&self, graph: &mut Graph) {
        for placed in &self.nodes {
            if let Some(node) = graph.node_mut(&placed.name) {
                node.position = Some(placed.position);
            }
        }
    }
}

/// Lay out `graph`, whose levels must already be assigned.
///
/// Pure function of topology and levels: the same graph always yields the
/// same coordinates.
pub fn compute_layout(graph: &Graph, options: &LayoutOptions) -> Layout {
    let mut layered = LayeredGraph::build(graph);
    let mut position = vec![0.0_f64; layered.len()];

    if let Some(first) = layered.levels().first() {
        for (rank, &w) in first.iter().enumerate() {
            position[w] = rank as f64;
        }
    }

    for level in 1..layered.levels().len() {
        order_by_barycenter(&mut layered, &mut position, level);
    }

    let level_width = options.level_width(graph.longest_name_len());
    let mut placed: Vec<Option<PlacedNode>> = vec![None; graph.len()];

    for (level, bucket) in layered.levels().iter().enumerate() {
        let count = bucket.len() as f64;
        let main_axis = level as f64 * options.level_height;

        for (rank, &w) in bucket.iter().enumerate() {
            let Slot::Real(idx) = layered.slot(w) else {
                continue;
            };

            let cross_axis = (rank as f64 - (count - 1.0) / 2.0) * level_width;
            let position = if options.landscape {
                Position {
                    x: main_axis,
                    y: cross_axis,
                }
            } else {
                Position {
                    x: cross_axis,
                    y: main_axis,
                }
            };

            placed[idx] = Some(PlacedNode {
                name: graph.node_at(idx).name.clone(),
                level,
                rank,
                position,
            });
        }
    }

    let layout = Layout {
        nodes: placed.into_iter().flatten().collect(),
        dummy_count: layered.dummy_count(),
    };

    debug!(
        nodes = layout.nodes.len(),
        dummies = layout.dummy_count,
        levels = layered.levels().len(),
        level_width,
        "computed layout"
    );

    layout
}

/// Reorder one level by the mean position of each node's predecessors.
fn order_by_barycenter(layered: &mut LayeredGraph, position: &mut [f64], level: usize) {
    let mut keyed: Vec<(f64, usize)> = layered.levels()[level]
        .iter()
        .map(|&w| (barycenter(layered.predecessors(w), position), w))
        .collect();

    // `sort_by` is stable: equal barycenters keep their prior relative order.
    keyed.sort_by(|a, b| a.0.total_cmp(&b.0));

    let order: Vec<usize> = keyed
        .into_iter()
        .enumerate()
        .map(|(rank, (_, w))| {
            position[w] = rank as f64;
            w
        })
        .collect();

    layered.set_level_order(level, order);
}

fn barycenter(predecessors: &[usize], position: &[f64]) -> f64 {
    if predecessors.is_empty() {
        return 0.0;
    }
    predecessors.iter().map(|&p| position[p]).sum::<f64>() / predecessors.len() as f64
}
