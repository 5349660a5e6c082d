// src/progress/store.rs

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::dag::{Graph, Node};
use crate::errors::{DagboardError, Result};
use crate::progress::checkpoint::Checkpoint;
use crate::progress::event::{Event, EventPayload};
use crate::types::{EventId, EventType, NodeStatus, RunId, RunStatus};

/// Default page size for event polls.
pub const DEFAULT_MAX_EVENTS: usize = 100;

/// Outcome of leveling a submitted graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphStatus {
    /// Levels assigned; layout is available.
    Leveled,
    /// A cycle was found; the run works but has no layout.
    Cyclic { node: String },
}

/// Point-in-time copy of a run's DAG.
#[derive(Debug, Clone)]
pub struct RunSnapshot {
    pub run_id: RunId,
    pub graph: Graph,
    /// Node at which a cycle was detected, if any.
    pub cycle: Option<String>,
    pub progress: u8,
    pub created_at: i64,
}

/// One line of a run listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: RunId,
    pub status: RunStatus,
    pub progress: u8,
    pub created_at: i64,
    pub node_count: usize,
    pub event_count: usize,
}

/// Everything the store keeps for one run.
#[derive(Debug)]
struct RunState {
    graph: Graph,
    cycle: Option<String>,
    /// Ascending by `id`: IDs are allocated while holding this run's lock.
    events: Vec<Event>,
    created_at: i64,
    progress: u8,
}

impl RunState {
    fn new(mut graph: Graph, created_at: i64) -> Self {
        let cycle = match graph.compute_levels() {
            Ok(()) => None,
            Err(DagboardError::Cycle(node)) => Some(node),
            Err(other) => {
                warn!(error = %other, "unexpected error while leveling graph");
                None
            }
        };

        Self {
            graph,
            cycle,
            events: Vec::new(),
            created_at,
            progress: 0,
        }
    }

    fn graph_status(&self) -> GraphStatus {
        match &self.cycle {
            Some(node) => GraphStatus::Cyclic { node: node.clone() },
            None => GraphStatus::Leveled,
        }
    }

    fn summary(&self, run_id: &str) -> RunSummary {
        RunSummary {
            run_id: run_id.to_string(),
            status: RunStatus::from_nodes(self.graph.nodes().map(|n| n.status)),
            progress: self.progress,
            created_at: self.created_at,
            node_count: self.graph.len(),
            event_count: self.events.len(),
        }
    }
}

type SharedRun = Arc<RwLock<RunState>>;

/// In-memory, thread-safe home of every run's DAG and event log.
///
/// - One `RwLock` guards the run table; each run has its own `RwLock`.
/// - Event IDs come from a single counter shared by all runs and are taken
///   while holding the run's write lock, so within a run the log order and
///   the ID order agree.
/// - Readers copy what they need under a read lock and filter afterwards.
///
/// This is the only component that mutates node state or appends events.
#[derive(Debug, Default)]
pub struct ProgressStore {
    runs: RwLock<HashMap<RunId, SharedRun>>,
    last_event_id: AtomicI64,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the topology for `run_id`, replacing any previous graph and
    /// event log for that run.
    ///
    /// Levels are computed here. A cycle does not fail the submission: the
    /// run keeps working and only layout is disabled.
    pub fn submit_graph(&self, run_id: &str, graph: Graph) -> Result<GraphStatus> {
        let state = RunState::new(graph, Utc::now().timestamp_millis());
        let status = state.graph_status();

        match &status {
            GraphStatus::Leveled => info!(
                run_id = %run_id,
                nodes = state.graph.len(),
                depth = state.graph.depth(),
                "graph submitted"
            ),
            GraphStatus::Cyclic { node } => warn!(
                run_id = %run_id,
                node = %node,
                "graph submitted with a cycle; layout disabled for this run"
            ),
        }

        self.insert_run(run_id, state)?;
        Ok(status)
    }

    /// Append an event to the run's log and return its ID.
    pub fn append_event(
        &self,
        run_id: &str,
        event_type: EventType,
        payload: EventPayload,
    ) -> Result<EventId> {
        if !payload.fits(event_type) {
            return Err(DagboardError::PayloadMismatch(event_type));
        }

        let run = self.run(run_id)?;
        let mut state = run.write().map_err(|_| poisoned("run state"))?;

        let id = self.last_event_id.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(percent) = payload.workflow_progress() {
            state.progress = percent;
        }
        state.events.push(Event::new(id, event_type, payload));

        debug!(run_id = %run_id, event_id = id, event_type = %event_type, "event appended");
        Ok(id)
    }

    /// Events with `id > since_id` (all events when `since_id < 0`), oldest
    /// first, at most `max_events` of them.
    pub fn events_since(
        &self,
        run_id: &str,
        since_id: EventId,
        max_events: usize,
    ) -> Result<Vec<Event>> {
        let run = self.run(run_id)?;
        let state = run.read().map_err(|_| poisoned("run state"))?;

        let start = if since_id < 0 {
            0
        } else {
            state.events.partition_point(|e| e.id <= since_id)
        };

        Ok(state.events[start..]
            .iter()
            .take(max_events)
            .cloned()
            .collect())
    }

    /// Copy of the run's current node states.
    pub fn graph_snapshot(&self, run_id: &str) -> Result<RunSnapshot> {
        let run = self.run(run_id)?;
        let state = run.read().map_err(|_| poisoned("run state"))?;

        Ok(RunSnapshot {
            run_id: run_id.to_string(),
            graph: state.graph.clone(),
            cycle: state.cycle.clone(),
            progress: state.progress,
            created_at: state.created_at,
        })
    }

    /// Set a node's status and, when given, its job ID. Returns the updated
    /// node so callers can publish it as an event payload.
    pub fn update_node_status(
        &self,
        run_id: &str,
        node: &str,
        status: NodeStatus,
        job_id: Option<&str>,
    ) -> Result<Node> {
        self.update_node(run_id, node, |n| {
            n.status = status;
            if let Some(id) = job_id {
                n.job_id = Some(id.to_string());
            }
        })
    }

    /// Drop a run and its events. Returns `false` if it did not exist.
    pub fn remove_run(&self, run_id: &str) -> Result<bool> {
        let mut runs = self.runs.write().map_err(|_| poisoned("run table"))?;
        let removed = runs.remove(run_id).is_some();
        if removed {
            info!(run_id = %run_id, "run removed");
        }
        Ok(removed)
    }

    pub fn contains_run(&self, run_id: &str) -> bool {
        self.runs
            .read()
            .map(|runs| runs.contains_key(run_id))
            .unwrap_or(false)
    }

    /// Summaries of all runs, oldest first.
    pub fn summaries(&self) -> Result<Vec<RunSummary>> {
        let runs: Vec<(RunId, SharedRun)> = {
            let table = self.runs.read().map_err(|_| poisoned("run table"))?;
            table
                .iter()
                .map(|(id, run)| (id.clone(), Arc::clone(run)))
                .collect()
        };

        let mut summaries = Vec::with_capacity(runs.len());
        for (run_id, run) in runs {
            let state = run.read().map_err(|_| poisoned("run state"))?;
            summaries.push(state.summary(&run_id));
        }

        summaries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.run_id.cmp(&b.run_id))
        });
        Ok(summaries)
    }

    /// Highest event ID handed out so far (0 before the first event).
    pub fn last_event_id(&self) -> EventId {
        self.last_event_id.load(Ordering::SeqCst)
    }

    /// Capture a run's graph, node states and events.
    pub fn save_checkpoint(&self, run_id: &str) -> Result<Checkpoint> {
        let run = self.run(run_id)?;
        let state = run.read().map_err(|_| poisoned("run state"))?;

        Ok(Checkpoint {
            run_id: run_id.to_string(),
            created_at: state.created_at,
            progress: state.progress,
            nodes: state.graph.nodes().cloned().collect(),
            edges: state.graph.edges(),
            events: state.events.clone(),
        })
    }

    /// Recreate a run from a checkpoint, replacing any run with the same ID.
    ///
    /// Restored events are renumbered from this store's counter in their
    /// saved order, so no ID is ever handed out twice in one store. Cursors
    /// taken against the saved run do not carry over.
    pub fn restore_checkpoint(&self, checkpoint: Checkpoint) -> Result<GraphStatus> {
        let graph = checkpoint.build_graph()?;
        let mut state = RunState::new(graph, checkpoint.created_at);
        state.progress = checkpoint.progress;

        let mut events = checkpoint.events;
        events.sort_by_key(|e| e.id);
        events.dedup_by_key(|e| e.id);

        let reserved = events.len() as EventId;
        let first = self.last_event_id.fetch_add(reserved, Ordering::SeqCst) + 1;
        for (id, event) in (first..).zip(events.iter_mut()) {
            event.id = id;
        }
        state.events = events;

        let status = state.graph_status();
        info!(
            run_id = %checkpoint.run_id,
            events = state.events.len(),
            "run restored from checkpoint"
        );
        self.insert_run(&checkpoint.run_id, state)?;
        Ok(status)
    }

    fn insert_run(&self, run_id: &str, state: RunState) -> Result<()> {
        let mut runs = self.runs.write().map_err(|_| poisoned("run table"))?;
        if runs
            .insert(run_id.to_string(), Arc::new(RwLock::new(state)))
            .is_some()
        {
            debug!(run_id = %run_id, "replaced existing run");
        }
        Ok(())
    }

    fn run(&self, run_id: &str) -> Result<SharedRun> {
        let runs = self.runs.read().map_err(|_| poisoned("run table"))?;
        runs.get(run_id)
            .cloned()
            .ok_or_else(|| DagboardError::UnknownRun(run_id.to_string()))
    }

    /// Apply `update` to one node under the run's write lock and return the
    /// node as it is afterwards.
    pub fn update_node(
        &self,
        run_id: &str,
        node: &str,
        update: impl FnOnce(&mut Node),
    ) -> Result<Node> {
        let run = self.run(run_id)?;
        let mut state = run.write().map_err(|_| poisoned("run state"))?;

        let target = state
            .graph
            .node_mut(node)
            .ok_or_else(|| DagboardError::UnknownNode {
                run_id: run_id.to_string(),
                node: node.to_string(),
            })?;
        update(target);
        Ok(target.clone())
    }
}

fn poisoned(what: &'static str) -> DagboardError {
    warn!(lock = what, "lock poisoned; rejecting operation");
    DagboardError::LockPoisoned(what)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Graph {
        let mut graph = Graph::new();
        graph.add_dependency("B", "A").unwrap();
        graph.add_dependency("C", "B").unwrap();
        graph
    }

    fn progress(store: &ProgressStore, run: &str, percent: u8) -> EventId {
        store
            .append_event(run, EventType::WorkflowProgress, EventPayload::workflow(percent))
            .unwrap()
    }

    #[test]
    fn submit_assigns_levels() {
        let store = ProgressStore::new();
        assert_eq!(store.submit_graph("r", chain()).unwrap(), GraphStatus::Leveled);

        let snapshot = store.graph_snapshot("r").unwrap();
        assert_eq!(snapshot.graph.node("C").map(|n| n.level), Some(2));
        assert!(snapshot.cycle.is_none());
    }

    #[test]
    fn cyclic_graph_is_accepted_but_flagged() {
        let mut graph = chain();
        graph.add_dependency("A", "C").unwrap();

        let store = ProgressStore::new();
        let status = store.submit_graph("r", graph).unwrap();

        assert!(matches!(status, GraphStatus::Cyclic { .. }));
        assert!(progress(&store, "r", 0) > 0);
    }

    #[test]
    fn ids_are_shared_across_runs() {
        let store = ProgressStore::new();
        store.submit_graph("r1", chain()).unwrap();
        store.submit_graph("r2", chain()).unwrap();

        let a = progress(&store, "r1", 0);
        let b = progress(&store, "r2", 0);
        let c = progress(&store, "r1", 50);

        assert!(a < b && b < c);
        let r1: Vec<_> = store.events_since("r1", -1, 10).unwrap().iter().map(|e| e.id).collect();
        assert_eq!(r1, vec![a, c]);
    }

    #[test]
    fn events_since_respects_cursor_and_cap() {
        let store = ProgressStore::new();
        store.submit_graph("r", chain()).unwrap();
        let ids: Vec<_> = (0..5).map(|i| progress(&store, "r", i * 20)).collect();

        let tail = store.events_since("r", ids[1], 2).unwrap();
        assert_eq!(tail.iter().map(|e| e.id).collect::<Vec<_>>(), vec![ids[2], ids[3]]);
        assert!(store.events_since("r", ids[4], 10).unwrap().is_empty());
        assert!(store.events_since("r", -1, 0).unwrap().is_empty());
    }

    #[test]
    fn unknown_run_and_node_are_reported() {
        let store = ProgressStore::new();
        assert!(matches!(
            store.events_since("nope", -1, 10),
            Err(DagboardError::UnknownRun(_))
        ));

        store.submit_graph("r", chain()).unwrap();
        assert!(matches!(
            store.update_node_status("r", "Z", NodeStatus::Running, None),
            Err(DagboardError::UnknownNode { .. })
        ));
    }

    #[test]
    fn mismatched_payload_is_rejected() {
        let store = ProgressStore::new();
        store.submit_graph("r", chain()).unwrap();

        let err = store
            .append_event("r", EventType::JobStarted, EventPayload::workflow(1))
            .unwrap_err();
        assert!(matches!(err, DagboardError::PayloadMismatch(EventType::JobStarted)));
        assert_eq!(store.last_event_id(), 0);
    }

    #[test]
    fn update_keeps_job_id_when_none_given() {
        let store = ProgressStore::new();
        store.submit_graph("r", chain()).unwrap();
        store
            .update_node_status("r", "A", NodeStatus::Running, Some("job_1"))
            .unwrap();
        let node = store
            .update_node_status("r", "A", NodeStatus::Succeeded, None)
            .unwrap();

        assert_eq!(node.job_id.as_deref(), Some("job_1"));
        assert_eq!(node.status, NodeStatus::Succeeded);
    }

    #[test]
    fn resubmitting_resets_the_run() {
        let store = ProgressStore::new();
        store.submit_graph("r", chain()).unwrap();
        let first = progress(&store, "r", 10);

        store.submit_graph("r", chain()).unwrap();
        assert!(store.events_since("r", -1, 10).unwrap().is_empty());
        assert!(progress(&store, "r", 0) > first);
    }

    #[test]
    fn summary_tracks_status_and_progress() {
        let store = ProgressStore::new();
        store.submit_graph("r", chain()).unwrap();
        progress(&store, "r", 30);
        store
            .update_node_status("r", "B", NodeStatus::Failed, None)
            .unwrap();

        let summaries = store.summaries().unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].status, RunStatus::Failed);
        assert_eq!(summaries[0].progress, 30);
        assert_eq!(summaries[0].node_count, 3);
        assert_eq!(summaries[0].event_count, 1);
    }

    #[test]
    fn restore_into_busy_store_never_reuses_ids() {
        let source = ProgressStore::new();
        source.submit_graph("old", chain()).unwrap();
        for percent in [0, 50, 100] {
            progress(&source, "old", percent);
        }
        let checkpoint = source.save_checkpoint("old").unwrap();

        let store = ProgressStore::new();
        store.submit_graph("live", chain()).unwrap();
        for percent in [0, 20, 40, 60, 80] {
            progress(&store, "live", percent);
        }
        store.restore_checkpoint(checkpoint).unwrap();

        let restored = store.events_since("old", -1, 10).unwrap();
        let percents: Vec<_> = restored.iter().map(|e| e.payload.workflow_progress()).collect();
        assert_eq!(percents, vec![Some(0), Some(50), Some(100)]);

        let mut ids: Vec<_> = store
            .events_since("live", -1, 10)
            .unwrap()
            .iter()
            .chain(restored.iter())
            .map(|e| e.id)
            .collect();
        assert_eq!(ids.len(), 8);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);

        assert_eq!(restored.iter().map(|e| e.id).collect::<Vec<_>>(), vec![6, 7, 8]);
        assert_eq!(store.last_event_id(), 8);
        assert!(progress(&store, "live", 90) > 8);
    }

    #[test]
    fn remove_run_forgets_it() {
        let store = ProgressStore::new();
        store.submit_graph("r", chain()).unwrap();

        assert!(store.remove_run("r").unwrap());
        assert!(!store.remove_run("r").unwrap());
        assert!(!store.contains_run("r"));
    }
}
