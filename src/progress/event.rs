// src/progress/event.rs

//! Immutable progress events.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::dag::Node;
use crate::types::{EventId, EventType};

/// Payload of a `WORKFLOW_PROGRESS` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowProgress {
    /// Percent complete, `0..=100`.
    pub workflow_progress: u8,
}

/// What an event is about: one node, or the workflow as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventPayload {
    Workflow(WorkflowProgress),
    Node(Node),
}

impl EventPayload {
    pub fn workflow(percent: u8) -> Self {
        EventPayload::Workflow(WorkflowProgress {
            workflow_progress: percent.min(100),
        })
    }

    pub fn node(&self) -> Option<&Node> {
        match self {
            EventPayload::Node(node) => Some(node),
            EventPayload::Workflow(_) => None,
        }
    }

    pub fn workflow_progress(&self) -> Option<u8> {
        match self {
            EventPayload::Workflow(p) => Some(p.workflow_progress),
            EventPayload::Node(_) => None,
        }
    }

    /// Whether this payload is the right shape for `event_type`.
    pub fn fits(&self, event_type: EventType) -> bool {
        matches!(self, EventPayload::Node(_)) == event_type.is_job_scoped()
    }
}

/// One fact about workflow progress. Never mutated once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    /// Creation time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub payload: EventPayload,
}

impl Event {
    /// Stamp a new event with the current wall-clock time.
    pub(crate) fn new(id: EventId, event_type: EventType, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp: Utc::now().timestamp_millis(),
            event_type,
            payload,
        }
    }

    /// Name of the node this event describes, for job-scoped events.
    pub fn node_name(&self) -> Option<&str> {
        self.payload.node().map(|n| n.name.as_str())
    }
}
