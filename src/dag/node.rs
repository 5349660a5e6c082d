// src/dag/node.rs

//! A single unit of work (job / stage) in a workflow DAG.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::NodeStatus;

/// 2-D coordinates assigned by the layout engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One node of a workflow DAG.
///
/// Edges are owned by [`Graph`](crate::dag::Graph); a node only carries its
/// own descriptive data and the mutable per-run state (`status`, `job_id`,
/// `metrics`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique, stable identifier within the DAG.
    pub name: String,

    /// External job identifier, assigned once the job actually starts.
    #[serde(default)]
    pub job_id: Option<String>,

    #[serde(default)]
    pub aliases: Vec<String>,

    #[serde(default)]
    pub features: Vec<String>,

    /// Longest-path distance from any root. Set by `Graph::compute_levels`.
    #[serde(default)]
    pub level: usize,

    /// Layout coordinates; `None` until a layout has been applied.
    #[serde(default)]
    pub position: Option<Position>,

    #[serde(default)]
    pub status: NodeStatus,

    /// Numeric job metrics, e.g. `progress`.
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,

    /// Free-form job configuration.
    #[serde(default)]
    pub configuration: BTreeMap<String, String>,
}

impl Node {
    /// Metric key used for per-job completion percentage.
    pub const PROGRESS_METRIC: &'static str = "progress";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            job_id: None,
            aliases: Vec::new(),
            features: Vec::new(),
            level: 0,
            position: None,
            status: NodeStatus::Pending,
            metrics: BTreeMap::new(),
            configuration: BTreeMap::new(),
        }
    }

    pub fn with_aliases(mut self, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_features(mut self, features: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.features = features.into_iter().map(Into::into).collect();
        self
    }

    /// Completion percentage reported for this job, if any.
    pub fn progress(&self) -> Option<f64> {
        self.metrics.get(Self::PROGRESS_METRIC).copied()
    }
}
