// src/dag/mod.rs

//! DAG representation and execution.
//!
//! - [`graph`] validates a workflow and holds its adjacency and in-degrees.
//! - [`executor`] dispatches ready tasks onto the worker pool.
//! - [`report`] is the per-run outcome.

pub mod executor;
pub mod graph;
pub mod report;

pub use executor::Executor;
pub use graph::DagGraph;
pub use report::RunReport;
