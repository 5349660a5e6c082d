mod common;

use std::sync::Arc;

use common::{edge, init_tracing, no_nodes, scenarios};
use dagboard::dag::Node;
use dagboard::dashboard::DashboardService;
use dagboard::errors::DagboardError;
use dagboard::layout::LayoutOptions;
use dagboard::layout::options::LEVEL_HEIGHT;
use dagboard::progress::{ProgressStore, Reporter};
use dagboard::types::{EventType, NodeStatus, RunStatus};

fn setup() -> (Reporter, DashboardService) {
    let store = Arc::new(ProgressStore::new());
    let reporter = Reporter::new(Arc::clone(&store));
    let dashboard = DashboardService::new(store, LayoutOptions::default());
    (reporter, dashboard)
}

#[test]
fn dag_view_reflects_reported_state() {
    init_tracing();
    let (reporter, dashboard) = setup();
    reporter
        .submit_graph(
            "run",
            [Node::new("A").with_aliases(["raw_logs"]).with_features(["LOAD"])],
            &scenarios::diamond().edges(),
        )
        .unwrap();
    reporter.report_job_started("run", "A", "job_run_1").unwrap();
    reporter.report_job_progress("run", "A", 40.0).unwrap();

    let view = dashboard.get_dag("run").unwrap();
    assert!(!view.layout_unavailable);

    let levels: Vec<_> = view.nodes.iter().map(|n| n.level).collect();
    assert!(levels.windows(2).all(|w| w[0] <= w[1]));

    let a = view.node("A").unwrap();
    assert_eq!(a.status, NodeStatus::Running);
    assert_eq!(a.job_id.as_deref(), Some("job_run_1"));
    assert_eq!(a.aliases, vec!["raw_logs"]);
    assert_eq!(a.metrics.get(Node::PROGRESS_METRIC), Some(&40.0));
    assert_eq!(a.successors, vec!["B", "C"]);

    let d = view.node("D").unwrap();
    assert_eq!((d.x, d.y), (Some(0.0), Some(2.0 * LEVEL_HEIGHT)));
}

#[test]
fn cyclic_run_falls_back_to_a_flat_list_but_keeps_streaming() {
    init_tracing();
    let (reporter, dashboard) = setup();
    let outcome = reporter
        .submit_graph(
            "run",
            no_nodes(),
            &[edge("B", "A"), edge("C", "B"), edge("A", "C")],
        )
        .unwrap();
    assert!(!outcome.layout_available());

    reporter.report_job_started("run", "B", "job_run_1").unwrap();

    let view = dashboard.get_dag("run").unwrap();
    assert!(view.layout_unavailable);
    assert_eq!(view.nodes.len(), 3);
    assert!(view.nodes.iter().all(|n| n.x.is_none() && n.y.is_none()));
    assert_eq!(view.node("B").map(|n| n.status), Some(NodeStatus::Running));

    let events = dashboard.get_events("run", outcome.event_id, 10);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::JobStarted);
    assert_eq!(events[0].node_name(), Some("B"));
}

#[test]
fn unknown_run_yields_error_for_dag_and_empty_events() {
    init_tracing();
    let (_reporter, dashboard) = setup();

    assert!(matches!(
        dashboard.get_dag("missing"),
        Err(DagboardError::UnknownRun(_))
    ));
    assert!(dashboard.get_events("missing", -1, 10).is_empty());
}

#[test]
fn run_listing_summarises_each_run() {
    init_tracing();
    let (reporter, dashboard) = setup();
    reporter
        .submit_graph("ok", no_nodes(), &scenarios::linear_chain().edges())
        .unwrap();
    reporter
        .submit_graph("broken", no_nodes(), &scenarios::linear_chain().edges())
        .unwrap();

    for node in ["A", "B", "C"] {
        reporter.report_job_finished("ok", node, true).unwrap();
    }
    reporter.report_workflow_progress("ok", 100).unwrap();
    reporter.report_job_finished("broken", "B", false).unwrap();

    let runs = dashboard.list_runs().unwrap();
    assert_eq!(runs.len(), 2);

    let ok = runs.iter().find(|r| r.run_id == "ok").unwrap();
    assert_eq!(ok.status, RunStatus::Succeeded);
    assert_eq!(ok.progress, 100);
    assert_eq!(ok.event_count, 5);

    let broken = runs.iter().find(|r| r.run_id == "broken").unwrap();
    assert_eq!(broken.status, RunStatus::Failed);
    assert_eq!(broken.node_count, 3);
}

#[test]
fn rejected_edges_are_reported_back_to_the_adapter() {
    init_tracing();
    let (reporter, dashboard) = setup();
    let outcome = reporter
        .submit_graph(
            "run",
            no_nodes(),
            &[edge("X", "Y"), edge("X", "Y"), edge("Z", "Z")],
        )
        .unwrap();

    assert_eq!(outcome.rejected.len(), 2);
    assert!(matches!(
        outcome.rejected[0],
        DagboardError::DuplicateDependency { .. }
    ));
    assert!(matches!(outcome.rejected[1], DagboardError::SelfDependency(_)));

    let view = dashboard.get_dag("run").unwrap();
    assert_eq!(view.nodes.len(), 2);
}
