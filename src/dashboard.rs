// src/dashboard.rs

//! Read-only queries for polling dashboard clients.
//!
//! Layout is recomputed on every `get_dag` call from the stored topology and
//! levels; nothing about a layout is cached between calls.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::{DagboardError, Result};
use crate::layout::{Layout, LayoutOptions, compute_layout};
use crate::progress::{Event, ProgressStore, RunSummary};
use crate::types::{EventId, NodeStatus, RunId};

/// One node as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DagNodeView {
    pub name: String,
    /// `None` when layout is unavailable for the run.
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub level: usize,
    pub status: NodeStatus,
    pub job_id: Option<String>,
    pub aliases: Vec<String>,
    pub features: Vec<String>,
    pub successors: Vec<String>,
    pub metrics: BTreeMap<String, f64>,
    pub configuration: BTreeMap<String, String>,
}

/// Laid-out DAG of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DagView {
    pub run_id: RunId,
    pub nodes: Vec<DagNodeView>,
    /// Set when the run's graph has a cycle; nodes then carry no coordinates.
    pub layout_unavailable: bool,
}

impl DagView {
    pub fn node(&self, name: &str) -> Option<&DagNodeView> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct DashboardService {
    store: Arc<ProgressStore>,
    layout: LayoutOptions,
}

impl DashboardService {
    pub fn new(store: Arc<ProgressStore>, layout: LayoutOptions) -> Self {
        Self { store, layout }
    }

    /// Current node states of `run_id` with coordinates attached, nodes
    /// ordered by level and then by submission order.
    pub fn get_dag(&self, run_id: &str) -> Result<DagView> {
        let snapshot = self.store.graph_snapshot(run_id).inspect_err(|err| {
            warn!(run_id = %run_id, error = %err, "dag query failed");
        })?;

        let layout = match &snapshot.cycle {
            None => Some(compute_layout(&snapshot.graph, &self.layout)),
            Some(node) => {
                warn!(
                    run_id = %run_id,
                    node = %node,
                    "cycle detected; serving dag without coordinates"
                );
                None
            }
        };

        let positions = layout.as_ref().map(Layout::positions).unwrap_or_default();
        let graph = &snapshot.graph;
        let mut nodes: Vec<DagNodeView> = graph
            .nodes()
            .map(|node| {
                let position = positions.get(node.name.as_str()).copied();
                DagNodeView {
                    name: node.name.clone(),
                    x: position.map(|p| p.x),
                    y: position.map(|p| p.y),
                    level: node.level,
                    status: node.status,
                    job_id: node.job_id.clone(),
                    aliases: node.aliases.clone(),
                    features: node.features.clone(),
                    successors: graph
                        .successors_of(&node.name)
                        .into_iter()
                        .map(str::to_string)
                        .collect(),
                    metrics: node.metrics.clone(),
                    configuration: node.configuration.clone(),
                }
            })
            .collect();

        if layout.is_some() {
            nodes.sort_by_key(|n| n.level);
        }

        debug!(run_id = %run_id, nodes = nodes.len(), "served dag");
        Ok(DagView {
            run_id: run_id.to_string(),
            nodes,
            layout_unavailable: layout.is_none(),
        })
    }

    /// Events after `since_id`. An unknown run yields an empty list.
    pub fn get_events(&self, run_id: &str, since_id: EventId, max_events: usize) -> Vec<Event> {
        match self.store.events_since(run_id, since_id, max_events) {
            Ok(events) => events,
            Err(DagboardError::UnknownRun(_)) => {
                debug!(run_id = %run_id, since_id, "events requested for unknown run");
                Vec::new()
            }
            Err(err) => {
                warn!(run_id = %run_id, since_id, error = %err, "event query failed");
                Vec::new()
            }
        }
    }

    /// Summaries of every known run, oldest first.
    pub fn list_runs(&self) -> Result<Vec<RunSummary>> {
        self.store.summaries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::Graph;

    fn service_with(graph: Graph) -> DashboardService {
        let store = Arc::new(ProgressStore::new());
        store.submit_graph("r", graph).unwrap();
        DashboardService::new(store, LayoutOptions::default())
    }

    #[test]
    fn dag_nodes_carry_coordinates_and_successors() {
        let mut graph = Graph::new();
        graph.add_dependency("B", "A").unwrap();
        let view = service_with(graph).get_dag("r").unwrap();

        assert!(!view.layout_unavailable);
        let a = view.node("A").unwrap();
        assert_eq!((a.x, a.y), (Some(0.0), Some(0.0)));
        assert_eq!(a.successors, vec!["B"]);
    }

    #[test]
    fn cyclic_run_is_served_flat() {
        let mut graph = Graph::new();
        graph.add_dependency("B", "A").unwrap();
        graph.add_dependency("A", "B").unwrap();
        let view = service_with(graph).get_dag("r").unwrap();

        assert!(view.layout_unavailable);
        assert_eq!(view.nodes.len(), 2);
        assert!(view.nodes.iter().all(|n| n.x.is_none() && n.y.is_none()));
    }

    #[test]
    fn unknown_run_differs_between_dag_and_events() {
        let service = DashboardService::new(Arc::new(ProgressStore::new()), LayoutOptions::default());

        assert!(matches!(service.get_dag("nope"), Err(DagboardError::UnknownRun(_))));
        assert!(service.get_events("nope", -1, 10).is_empty());
    }

    #[test]
    fn view_serialises_with_camel_case_keys() {
        let mut graph = Graph::new();
        graph.add_node("A");
        let view = service_with(graph).get_dag("r").unwrap();
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["layoutUnavailable"], false);
        assert_eq!(json["nodes"][0]["status"], "pending");
        assert!(json["nodes"][0]["jobId"].is_null());
    }
}
