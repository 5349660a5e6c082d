// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod dashboard;
pub mod errors;
pub mod layout;
pub mod logging;
pub mod progress;
pub mod simulate;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dashboard::DashboardService;
use crate::errors::DagboardError;
use crate::progress::{ProgressStore, Reporter, spawn_journal};
use crate::simulate::{SimulateOptions, SimulationReport, simulate_run};
use crate::types::EventId;

/// How often the journal and the event stream poll the store.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the progress store, reporter and dashboard service
/// - (optional) the event journal
/// - (optional) a simulated run with live event output
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;

    if args.dry_run {
        return print_dry_run(&cfg);
    }

    let layout = if args.landscape {
        cfg.layout.landscape(true)
    } else {
        cfg.layout
    };

    let store = Arc::new(ProgressStore::new());
    let reporter = Reporter::new(Arc::clone(&store));
    let dashboard = DashboardService::new(Arc::clone(&store), layout);
    let run_id = args.run_id.as_str();

    let outcome = reporter.submit_graph(run_id, cfg.nodes(), &cfg.edges())?;
    if !outcome.layout_available() {
        warn!(run_id = %run_id, "run has no layout");
    }
    debug!(run_id = %run_id, event_id = outcome.event_id, "initial progress event");

    let journal = match args.journal.clone().or_else(|| cfg.journal.path.clone()) {
        Some(path) => Some(spawn_journal(
            Arc::clone(&store),
            run_id,
            path,
            POLL_INTERVAL,
        )?),
        None => None,
    };

    let report = if args.simulate && !outcome.layout_available() {
        warn!(run_id = %run_id, "cyclic run cannot be simulated; skipping");
        None
    } else if args.simulate {
        Some(
            stream_simulation(
                &reporter,
                &dashboard,
                run_id,
                cfg.simulate_options(),
                cfg.store.max_events,
            )
            .await?,
        )
    } else {
        None
    };

    let view = dashboard.get_dag(run_id)?;
    println!("{}", serde_json::to_string_pretty(&view)?);

    if let Some(report) = report {
        info!(
            run_id = %run_id,
            succeeded = ?report.succeeded,
            failed = ?report.failed,
            skipped = ?report.skipped,
            "simulated run complete"
        );
        println!("{}", serde_json::to_string_pretty(&dashboard.list_runs()?)?);
    }

    if let Some(journal) = journal {
        let written = journal.finish().await?;
        info!(run_id = %run_id, written, "journal closed");
    }

    if let Some(path) = &args.checkpoint {
        store.save_checkpoint(run_id)?.write_to(path)?;
        info!(run_id = %run_id, path = %path.display(), "checkpoint saved");
    }

    Ok(())
}

/// Run the simulation in the background and print its events as JSON lines
/// by polling the event cursor, the way a dashboard client would.
async fn stream_simulation(
    reporter: &Reporter,
    dashboard: &DashboardService,
    run_id: &str,
    options: SimulateOptions,
    max_events: usize,
) -> Result<SimulationReport> {
    let sim = {
        let reporter = reporter.clone();
        let run_id = run_id.to_string();
        tokio::spawn(async move { simulate_run(reporter, &run_id, options).await })
    };

    let mut cursor: EventId = -1;
    loop {
        let finished = sim.is_finished();
        let events = dashboard.get_events(run_id, cursor, max_events);

        for event in &events {
            println!("{}", serde_json::to_string(event)?);
            cursor = event.id;
        }

        if events.is_empty() {
            if finished {
                break;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    let report = sim.await.context("simulation task panicked")??;
    Ok(report)
}

/// Simple dry-run output: print nodes with their levels and dependencies.
fn print_dry_run(cfg: &ConfigFile) -> Result<()> {
    let mut graph = cfg.to_graph()?;
    let cycle = match graph.compute_levels() {
        Ok(()) => None,
        Err(DagboardError::Cycle(node)) => Some(node),
        Err(other) => return Err(other.into()),
    };

    println!("dagboard dry-run");
    println!("  store.max_events = {}", cfg.store.max_events);
    println!("  layout.landscape = {}", cfg.layout.landscape);
    if let Some(path) = &cfg.journal.path {
        println!("  journal.path = {}", path.display());
    }
    println!();

    match &cycle {
        None => println!("nodes ({}, depth {}):", graph.len(), graph.depth()),
        Some(node) => {
            println!("note: cycle through '{node}'; layout unavailable, nodes are unleveled");
            println!("nodes ({}):", graph.len());
        }
    }
    for node in graph.nodes() {
        if cycle.is_some() {
            println!("  - {}", node.name);
        } else {
            println!("  - {} (level {})", node.name, node.level);
        }
        let deps = graph.dependencies_of(&node.name);
        if !deps.is_empty() {
            println!("      after: {:?}", deps);
        }
        if !node.aliases.is_empty() {
            println!("      aliases: {:?}", node.aliases);
        }
        if !node.features.is_empty() {
            println!("      features: {:?}", node.features);
        }
    }

    debug!("dry-run complete");
    Ok(())
}
