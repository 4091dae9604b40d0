// src/config/assemble.rs

use crate::config::model::WorkflowFile;
use crate::errors::Result;
use crate::task::TaskRegistry;
use crate::workflow::WorkflowSpec;

/// Turn a validated workflow file into something the executor can run.
///
/// Every task is built up front, so an unknown `type` or a bad parameter is
/// reported before anything executes.
pub fn assemble(file: &WorkflowFile, registry: &TaskRegistry) -> Result<WorkflowSpec> {
    let tasks = file
        .tasks()
        .iter()
        .map(|desc| registry.create(desc))
        .collect::<Result<Vec<_>>>()?;

    Ok(WorkflowSpec {
        tasks,
        edges: file.edges().to_vec(),
        final_key: file.final_key().map(str::to_string),
        vars: file.vars().clone(),
    })
}
