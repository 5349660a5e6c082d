// src/dag/mod.rs

//! Workflow DAG representation.
//!
//! - [`node`] holds the per-job record (descriptive tags + per-run state).
//! - [`graph`] owns the nodes and their dependency edges.
//! - [`levels`] detects cycles and assigns longest-path levels.

pub mod graph;
pub mod levels;
pub mod node;

pub use graph::Graph;
pub use node::{Node, Position};
