// src/workflow.rs

//! In-memory description of one run: tasks, edges, variables.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::task::Task;

/// `to` depends on `from`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Immutable bundle handed to the executor. Owned by the caller; the
/// executor only reads it.
#[derive(Debug, Clone, Default)]
pub struct WorkflowSpec {
    pub tasks: Vec<Arc<dyn Task>>,
    pub edges: Vec<Edge>,
    /// Context key to report once the run is over.
    pub final_key: Option<String>,
    /// Seeded into the context before the first task starts.
    pub vars: BTreeMap<String, String>,
}

impl WorkflowSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(mut self, task: impl Task + 'static) -> Self {
        self.tasks.push(Arc::new(task));
        self
    }

    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push(Edge::new(from, to));
        self
    }

    pub fn final_key(mut self, key: impl Into<String>) -> Self {
        self.final_key = Some(key.into());
        self
    }

    pub fn var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.id())
    }
}
