// src/progress/checkpoint.rs

//! Serializable copy of one run: topology, node states and event log.
//!
//! Produced by [`ProgressStore::save_checkpoint`](crate::progress::ProgressStore::save_checkpoint)
//! and fed back through
//! [`ProgressStore::restore_checkpoint`](crate::progress::ProgressStore::restore_checkpoint).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dag::{Graph, Node};
use crate::errors::Result;
use crate::progress::event::Event;
use crate::types::RunId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub run_id: RunId,
    pub created_at: i64,
    pub progress: u8,
    pub nodes: Vec<Node>,
    /// `(node, depends_on)` pairs.
    pub edges: Vec<(String, String)>,
    pub events: Vec<Event>,
}

impl Checkpoint {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        debug!(path = %path.display(), run_id = %self.run_id, "checkpoint written");
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Rebuild the graph through the normal construction API, keeping each
    /// node's saved state.
    pub(crate) fn build_graph(&self) -> Result<Graph> {
        let mut graph = Graph::new();
        for node in &self.nodes {
            *graph.add_node(&node.name) = node.clone();
        }
        for (node, depends_on) in &self.edges {
            graph.add_dependency(node, depends_on)?;
        }
        Ok(graph)
    }
}
