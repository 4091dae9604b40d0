// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{RawWorkflowFile, WorkflowFile};
use crate::dag::graph::{check_acyclic, check_edge_endpoints};
use crate::errors::{DagflowError, Result};
use crate::workflow::Edge;

impl TryFrom<RawWorkflowFile> for WorkflowFile {
    type Error = crate::errors::DagflowError;

    fn try_from(raw: RawWorkflowFile) -> std::result::Result<Self, Self::Error> {
        validate_tasks(&raw)?;
        let edges = parse_edges(&raw)?;
        validate_dag(&raw, &edges)?;
        Ok(WorkflowFile::new_unchecked(
            raw.final_key,
            edges,
            raw.pool,
            raw.vars,
            raw.tasks,
        ))
    }
}

fn validate_tasks(raw: &RawWorkflowFile) -> Result<()> {
    let mut seen = HashSet::new();
    for (index, task) in raw.tasks.iter().enumerate() {
        if task.id.trim().is_empty() {
            return Err(DagflowError::ConfigError(format!(
                "task #{} has an empty `id`",
                index + 1
            )));
        }
        if task.kind.trim().is_empty() {
            return Err(DagflowError::ConfigError(format!(
                "task '{}' has an empty `type`",
                task.id
            )));
        }
        if !seen.insert(task.id.as_str()) {
            return Err(DagflowError::DuplicateTask(task.id.clone()));
        }
    }

    if let Some(key) = &raw.final_key {
        if key.trim().is_empty() {
            return Err(DagflowError::ConfigError(
                "`final_key` must not be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn parse_edges(raw: &RawWorkflowFile) -> Result<Vec<Edge>> {
    raw.edges
        .iter()
        .map(|pair| match pair.as_slice() {
            [from, to] => Ok(Edge::new(from.as_str(), to.as_str())),
            other => Err(DagflowError::InvalidEdge(format!(
                "expected [from, to], got {} element(s): {:?}",
                other.len(),
                other
            ))),
        })
        .collect()
}

fn validate_dag(raw: &RawWorkflowFile, edges: &[Edge]) -> Result<()> {
    let ids: HashSet<&str> = raw.tasks.iter().map(|t| t.id.as_str()).collect();

    for edge in edges {
        check_edge_endpoints(edge, |id| ids.contains(id))?;
    }

    check_acyclic(raw.tasks.iter().map(|t| t.id.as_str()), edges)
}
