// src/progress/reporter.rs

//! Entry points for workflow adapters.
//!
//! Each `report_*` call first updates node state in the store and then
//! appends the event describing that transition, so any reader that sees
//! the event also sees the state behind it.

use std::sync::Arc;

use tracing::{info, warn};

use crate::dag::{Graph, Node};
use crate::errors::{DagboardError, Result};
use crate::progress::event::EventPayload;
use crate::progress::store::{GraphStatus, ProgressStore};
use crate::types::{EventId, EventType, NodeStatus};

/// Result of submitting a run's DAG.
#[derive(Debug)]
pub struct SubmitOutcome {
    /// Edges that were refused while building the graph. The rest of the
    /// graph was still built and stored.
    pub rejected: Vec<DagboardError>,
    pub status: GraphStatus,
    /// ID of the initial 0% WORKFLOW_PROGRESS event.
    pub event_id: EventId,
}

impl SubmitOutcome {
    pub fn layout_available(&self) -> bool {
        self.status == GraphStatus::Leveled
    }
}

/// Cheap to clone; every clone writes into the same store.
#[derive(Debug, Clone)]
pub struct Reporter {
    store: Arc<ProgressStore>,
}

impl Reporter {
    pub fn new(store: Arc<ProgressStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<ProgressStore> {
        &self.store
    }

    /// Build the run's graph from `nodes` and `(node, depends_on)` edges,
    /// store it, and announce the run at 0%.
    ///
    /// Structural errors on individual edges are logged and collected; they
    /// do not abort the submission.
    pub fn submit_graph(
        &self,
        run_id: &str,
        nodes: impl IntoIterator<Item = Node>,
        edges: &[(String, String)],
    ) -> Result<SubmitOutcome> {
        let mut graph = Graph::new();
        for node in nodes {
            let name = node.name.clone();
            *graph.add_node(&name) = node;
        }

        let mut rejected = Vec::new();
        for (node, depends_on) in edges {
            if let Err(err) = graph.add_dependency(node, depends_on) {
                warn!(
                    run_id = %run_id,
                    node = %node,
                    depends_on = %depends_on,
                    error = %err,
                    "rejected dependency"
                );
                rejected.push(err);
            }
        }

        let status = self.store.submit_graph(run_id, graph)?;
        let event_id = self.report_workflow_progress(run_id, 0)?;

        info!(
            run_id = %run_id,
            rejected = rejected.len(),
            layout = status == GraphStatus::Leveled,
            "run registered"
        );

        Ok(SubmitOutcome {
            rejected,
            status,
            event_id,
        })
    }

    pub fn report_job_started(&self, run_id: &str, node: &str, job_id: &str) -> Result<EventId> {
        self.transition(run_id, node, EventType::JobStarted, |n| {
            n.status = NodeStatus::Running;
            n.job_id = Some(job_id.to_string());
        })
    }

    /// Record a job's completion percentage under the `progress` metric.
    ///
    /// A job that already finished keeps its terminal status.
    pub fn report_job_progress(&self, run_id: &str, node: &str, percent: f64) -> Result<EventId> {
        let percent = percent.clamp(0.0, 100.0);
        self.transition(run_id, node, EventType::JobProgress, |n| {
            if !n.status.is_terminal() {
                n.status = NodeStatus::Running;
            }
            n.metrics.insert(Node::PROGRESS_METRIC.to_string(), percent);
        })
    }

    pub fn report_job_finished(&self, run_id: &str, node: &str, succeeded: bool) -> Result<EventId> {
        let (status, event_type) = if succeeded {
            (NodeStatus::Succeeded, EventType::JobFinished)
        } else {
            (NodeStatus::Failed, EventType::JobFailed)
        };

        self.transition(run_id, node, event_type, |n| {
            n.status = status;
            if succeeded {
                n.metrics.insert(Node::PROGRESS_METRIC.to_string(), 100.0);
            }
        })
    }

    pub fn report_workflow_progress(&self, run_id: &str, percent: u8) -> Result<EventId> {
        self.store
            .append_event(run_id, EventType::WorkflowProgress, EventPayload::workflow(percent))
            .inspect_err(|err| warn!(run_id = %run_id, error = %err, "workflow progress dropped"))
    }

    fn transition(
        &self,
        run_id: &str,
        node: &str,
        event_type: EventType,
        update: impl FnOnce(&mut Node),
    ) -> Result<EventId> {
        let result = self
            .store
            .update_node(run_id, node, update)
            .and_then(|snapshot| {
                self.store
                    .append_event(run_id, event_type, EventPayload::Node(snapshot))
            });

        result.inspect_err(|err| {
            warn!(
                run_id = %run_id,
                node = %node,
                event_type = %event_type,
                error = %err,
                "job report dropped"
            )
        })
    }
}
