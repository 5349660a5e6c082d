// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::{EventType, RunId};

#[derive(Error, Debug)]
pub enum DagboardError {
    #[error("Dependency '{dependency}' already declared for node '{node}'")]
    DuplicateDependency { node: String, dependency: String },

    #[error("Node '{0}' cannot depend on itself")]
    SelfDependency(String),

    #[error("Cycle detected in DAG at node '{0}'")]
    Cycle(String),

    #[error("Unknown run: {0}")]
    UnknownRun(RunId),

    #[error("Unknown node '{node}' in run {run_id}")]
    UnknownNode { run_id: RunId, node: String },

    #[error("Payload does not match event type {0}")]
    PayloadMismatch(EventType),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(&'static str),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DagboardError {
    /// Structural errors raised while building a graph. Callers may skip the
    /// offending edge and keep going.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            DagboardError::DuplicateDependency { .. } | DagboardError::SelfDependency(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DagboardError>;
