// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawWorkflowFile, WorkflowFile};
use crate::errors::Result;

/// Load a workflow file from a given path and return the raw description.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (duplicate ids, edge shape, cycles). Use [`load_and_validate`]
/// for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWorkflowFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    parse_str(&contents)
}

/// Parse a workflow description held in memory.
pub fn parse_str(contents: &str) -> Result<RawWorkflowFile> {
    let raw: RawWorkflowFile = toml::from_str(contents)?;
    Ok(raw)
}

/// Load a workflow file from path and validate its structure.
///
/// Task `type`s are not checked here; that needs a registry and happens in
/// [`assemble`](crate::config::assemble::assemble).
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WorkflowFile> {
    let raw = load_from_path(&path)?;
    let workflow = WorkflowFile::try_from(raw)?;
    debug!(
        path = %path.as_ref().display(),
        tasks = workflow.tasks().len(),
        edges = workflow.edges().len(),
        "workflow loaded"
    );
    Ok(workflow)
}

/// `workflow.toml` in the current working directory.
pub fn default_workflow_path() -> PathBuf {
    PathBuf::from("workflow.toml")
}
