// src/progress/journal.rs

//! Append a run's events to a JSON-lines file.
//!
//! The journal is a reader: it tails the run through the event cursor from
//! its own tokio task, so writers appending to the store never wait on disk.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{DagboardError, Result};
use crate::progress::store::{DEFAULT_MAX_EVENTS, ProgressStore};
use crate::types::{EventId, RunId};

/// Handle to a running journal task.
///
/// Dropping the handle stops the task after its current poll.
#[derive(Debug)]
pub struct JournalHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<usize>>,
}

impl JournalHandle {
    /// Write any events not yet journaled, stop the task and return the
    /// number of events written in total.
    pub async fn finish(mut self) -> Result<usize> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }

        match (&mut self.task).await {
            Ok(result) => result,
            Err(err) => Err(DagboardError::Other(anyhow::anyhow!(
                "journal task failed: {err}"
            ))),
        }
    }
}

/// Start journaling `run_id` into `path`, polling every `poll_interval`.
///
/// The file is opened (created if needed, appended to otherwise) before
/// this returns, so a bad path fails here rather than inside the task.
pub fn spawn_journal(
    store: Arc<ProgressStore>,
    run_id: impl Into<RunId>,
    path: impl Into<PathBuf>,
    poll_interval: Duration,
) -> Result<JournalHandle> {
    let run_id = run_id.into();
    let path = path.into();

    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    let mut file = File::from_std(file);
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
    let poll_interval = poll_interval.max(Duration::from_millis(1));

    info!(run_id = %run_id, path = %path.display(), "event journal started");

    let task = tokio::spawn(async move {
        let mut cursor: EventId = -1;
        let mut written = 0usize;
        let mut ticker = tokio::time::interval(poll_interval);

        loop {
            tokio::select! {
                _ = &mut stop_rx => {
                    written += drain(&store, &run_id, &mut cursor, &mut file).await?;
                    break;
                }
                _ = ticker.tick() => {
                    written += drain(&store, &run_id, &mut cursor, &mut file).await?;
                }
            }
        }

        file.flush().await?;
        info!(run_id = %run_id, written, "event journal stopped");
        Ok(written)
    });

    Ok(JournalHandle {
        stop: Some(stop_tx),
        task,
    })
}

/// Write every event after `cursor` and advance it.
async fn drain(
    store: &ProgressStore,
    run_id: &str,
    cursor: &mut EventId,
    file: &mut File,
) -> Result<usize> {
    let mut written = 0;

    loop {
        let batch = match store.events_since(run_id, *cursor, DEFAULT_MAX_EVENTS) {
            Ok(batch) => batch,
            Err(DagboardError::UnknownRun(_)) => {
                debug!(run_id = %run_id, "run not registered yet; journal waiting");
                return Ok(written);
            }
            Err(err) => {
                warn!(run_id = %run_id, error = %err, "journal poll failed");
                return Ok(written);
            }
        };

        let Some(last) = batch.last().map(|e| e.id) else {
            return Ok(written);
        };

        let mut buf = Vec::new();
        for event in &batch {
            serde_json::to_writer(&mut buf, event)?;
            buf.push(b'\n');
        }
        file.write_all(&buf).await?;

        written += batch.len();
        *cursor = last;
    }
}
