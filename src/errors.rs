// src/errors.rs

//! Crate-wide error types.
//!
//! Three families, matching where a failure is detected:
//! - [`DagflowError`]: workflow/graph problems found before anything runs,
//!   plus I/O and parsing errors from the outer layers.
//! - [`PoolError`]: the worker pool refused the submission.
//! - [`JobError`]: a submitted job did not produce a value.
//!
//! Task failures are *not* errors: they travel as `TaskResult`s.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DagflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Duplicate task id: {0}")]
    DuplicateTask(String),

    #[error("Edge {edge} references unknown task '{task}'")]
    UnknownTask { edge: String, task: String },

    #[error("Invalid edge: {0}")]
    InvalidEdge(String),

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("Unsupported task type '{kind}' for task '{id}'")]
    UnsupportedTaskType { id: String, kind: String },

    #[error("Worker pool error: {0}")]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors surfaced synchronously to whoever submits work to the pool.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("worker pool is stopping, cannot submit")]
    Stopping,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Why a job future resolved without a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("job panicked: {0}")]
    Panicked(String),

    #[error("job was cancelled before it started")]
    Cancelled,

    #[error("job was dropped by the pool before it ran")]
    Abandoned,
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DagflowError>;
