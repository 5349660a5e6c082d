// src/layout/mod.rs

//! Layered DAG layout: turns a leveled [`Graph`](crate::dag::Graph) into 2-D
//! node coordinates. Holds no state between calls.

pub mod layers;
pub mod options;
pub mod sugiyama;

pub use layers::{LayeredGraph, Slot};
pub use options::LayoutOptions;
pub use sugiyama::{compute_layout, Layout, PlacedNode};
