// src/simulate.rs

//! A stand-in workflow adapter that drives a submitted run to completion.
//!
//! Nodes run level by level; every node of a level is its own tokio task,
//! so the store sees concurrent writers the way it would with real
//! framework callbacks.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::errors::{DagboardError, Result};
use crate::progress::Reporter;

#[derive(Debug, Clone, Default)]
pub struct SimulateOptions {
    /// Pause between the steps of each simulated job.
    pub step_delay: Duration,
    /// Nodes that report failure instead of success.
    pub fail: HashSet<String>,
}

/// What happened to each node in a simulated run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
    /// Nodes never started because something upstream failed.
    pub skipped: Vec<String>,
}

/// Play out `run_id`, which must already be submitted and acyclic.
pub async fn simulate_run(
    reporter: Reporter,
    run_id: &str,
    options: SimulateOptions,
) -> Result<SimulationReport> {
    let snapshot = reporter.store().graph_snapshot(run_id)?;
    if let Some(node) = snapshot.cycle {
        return Err(DagboardError::Cycle(node));
    }

    let graph = snapshot.graph;
    let mut levels: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for node in graph.nodes() {
        levels.entry(node.level).or_default().push(node.name.clone());
    }

    let total_levels = levels.len().max(1);
    let mut report = SimulationReport::default();
    let mut blocked: HashSet<String> = HashSet::new();
    let mut job_counter = 0usize;

    info!(run_id = %run_id, levels = levels.len(), "simulation started");

    for (done, (level, names)) in levels.into_iter().enumerate() {
        let mut tasks = JoinSet::new();

        for name in names {
            let upstream_failed = graph
                .dependencies_of(&name)
                .iter()
                .any(|dep| blocked.contains(*dep));
            if upstream_failed {
                debug!(run_id = %run_id, node = %name, "skipping node after upstream failure");
                blocked.insert(name.clone());
                report.skipped.push(name);
                continue;
            }

            job_counter += 1;
            let job_id = format!("job_{run_id}_{job_counter}");
            let succeed = !options.fail.contains(&name);
            let reporter = reporter.clone();
            let run_id = run_id.to_string();
            let delay = options.step_delay;

            tasks.spawn(async move {
                run_job(&reporter, &run_id, &name, &job_id, succeed, delay).await?;
                Ok::<_, DagboardError>((name, succeed))
            });
        }

        let mut finished = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (name, succeeded) = joined
                .map_err(|err| DagboardError::Other(anyhow::anyhow!("simulated job panicked: {err}")))??;
            finished.push((name, succeeded));
        }
        // Completion order is nondeterministic; report in name order.
        finished.sort();

        for (name, succeeded) in finished {
            if succeeded {
                report.succeeded.push(name);
            } else {
                warn!(run_id = %run_id, node = %name, "simulated job failed");
                blocked.insert(name.clone());
                report.failed.push(name);
            }
        }

        let percent = ((done + 1) * 100 / total_levels) as u8;
        reporter.report_workflow_progress(run_id, percent)?;
        debug!(run_id = %run_id, level, percent, "level complete");
    }

    info!(
        run_id = %run_id,
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        "simulation finished"
    );
    Ok(report)
}

async fn run_job(
    reporter: &Reporter,
    run_id: &str,
    node: &str,
    job_id: &str,
    succeed: bool,
    delay: Duration,
) -> Result<()> {
    sleep(delay).await;
    reporter.report_job_started(run_id, node, job_id)?;
    sleep(delay).await;
    reporter.report_job_progress(run_id, node, 50.0)?;
    sleep(delay).await;
    reporter.report_job_finished(run_id, node, succeed)?;
    Ok(())
}
