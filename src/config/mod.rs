// src/config/mod.rs

//! Workflow description files.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a workflow file from disk (`loader.rs`).
//! - Validate ids, edges and acyclicity (`validate.rs`).
//! - Build runnable tasks through a [`TaskRegistry`](crate::task::TaskRegistry)
//!   (`assemble.rs`).

pub mod assemble;
pub mod loader;
pub mod model;
pub mod validate;

pub use assemble::assemble;
pub use loader::{default_workflow_path, load_and_validate, load_from_path, parse_str};
pub use model::{PoolSection, RawWorkflowFile, TaskDescriptor, WorkflowFile};
