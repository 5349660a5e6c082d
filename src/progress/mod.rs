// src/progress/mod.rs

//! Event-sourced progress model.
//!
//! - [`ProgressStore`] owns every run's graph and append-only event log.
//! - [`Reporter`] is what workflow adapters call as jobs move along.
//! - [`Checkpoint`] captures a run so it can be restored later.
//! - [`spawn_journal`] tails a run's events into a JSON-lines file.

pub mod checkpoint;
pub mod event;
pub mod journal;
pub mod reporter;
pub mod store;

pub use checkpoint::Checkpoint;
pub use event::{Event, EventPayload, WorkflowProgress};
pub use journal::{JournalHandle, spawn_journal};
pub use reporter::{Reporter, SubmitOutcome};
pub use store::{DEFAULT_MAX_EVENTS, GraphStatus, ProgressStore, RunSnapshot, RunSummary};
