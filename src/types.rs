// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of one workflow run.
pub type RunId = String;

/// Identifier of one event. Strictly increasing per store, never reused.
///
/// Signed so that a cursor of `-1` can mean "from the beginning".
pub type EventId = i64;

/// Execution status of a single node (job) in a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl NodeStatus {
    /// `true` once the node will not change status again in this run.
    pub fn is_terminal(self) -> bool {
        matches!(self, NodeStatus::Succeeded | NodeStatus::Failed)
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Running => "running",
            NodeStatus::Succeeded => "succeeded",
            NodeStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl FromStr for NodeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(NodeStatus::Pending),
            "running" => Ok(NodeStatus::Running),
            "succeeded" => Ok(NodeStatus::Succeeded),
            "failed" => Ok(NodeStatus::Failed),
            other => Err(format!(
                "invalid node status: {other} (expected pending, running, succeeded or failed)"
            )),
        }
    }
}

/// Kind of a progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    JobStarted,
    JobProgress,
    JobFinished,
    JobFailed,
    WorkflowProgress,
}

impl EventType {
    /// Job-scoped events carry a node snapshot; workflow-scoped ones carry a
    /// percentage.
    pub fn is_job_scoped(self) -> bool {
        !matches!(self, EventType::WorkflowProgress)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventType::JobStarted => "JOB_STARTED",
            EventType::JobProgress => "JOB_PROGRESS",
            EventType::JobFinished => "JOB_FINISHED",
            EventType::JobFailed => "JOB_FAILED",
            EventType::WorkflowProgress => "WORKFLOW_PROGRESS",
        };
        f.write_str(s)
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "JOB_STARTED" => Ok(EventType::JobStarted),
            "JOB_PROGRESS" => Ok(EventType::JobProgress),
            "JOB_FINISHED" => Ok(EventType::JobFinished),
            "JOB_FAILED" => Ok(EventType::JobFailed),
            "WORKFLOW_PROGRESS" => Ok(EventType::WorkflowProgress),
            other => Err(format!("invalid event type: {other}")),
        }
    }
}

/// Aggregate status of a run, as shown in run listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    /// Derive a run status from the statuses of its nodes.
    ///
    /// Any failure fails the run; an empty run counts as running.
    pub fn from_nodes(statuses: impl IntoIterator<Item = NodeStatus>) -> Self {
        let mut seen_any = false;
        let mut all_succeeded = true;
        for status in statuses {
            seen_any = true;
            match status {
                NodeStatus::Failed => return RunStatus::Failed,
                NodeStatus::Succeeded => {}
                NodeStatus::Pending | NodeStatus::Running => all_succeeded = false,
            }
        }

        if seen_any && all_succeeded {
            RunStatus::Succeeded
        } else {
            RunStatus::Running
        }
    }
}
