// src/dag/graph.rs

use std::collections::HashMap;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{DagflowError, Result};
use crate::task::Task;
use crate::types::TaskId;
use crate::workflow::{Edge, WorkflowSpec};

/// Static, validated view of a workflow's dependency structure.
///
/// Built once per run. Holds adjacency (dependents) and the initial in-degree
/// of every task; the executor copies the in-degrees into its own mutable
/// state.
#[derive(Debug, Clone)]
pub struct DagGraph {
    /// Task ids in declaration order.
    order: Vec<TaskId>,
    tasks: HashMap<TaskId, Arc<dyn Task>>,
    dependents: HashMap<TaskId, Vec<TaskId>>,
    indegree: HashMap<TaskId, usize>,
}

impl DagGraph {
    /// Build and validate the graph for `spec`.
    ///
    /// Rejects duplicate ids, edges naming undeclared tasks and any cycle.
    /// Nothing is executed here.
    pub fn prepare(spec: &WorkflowSpec) -> Result<Self> {
        let mut order = Vec::with_capacity(spec.tasks.len());
        let mut tasks: HashMap<TaskId, Arc<dyn Task>> = HashMap::new();

        for task in &spec.tasks {
            let id = task.id().to_string();
            if tasks.insert(id.clone(), Arc::clone(task)).is_some() {
                return Err(DagflowError::DuplicateTask(id));
            }
            order.push(id);
        }

        let mut dependents: HashMap<TaskId, Vec<TaskId>> =
            order.iter().map(|id| (id.clone(), Vec::new())).collect();
        let mut indegree: HashMap<TaskId, usize> =
            order.iter().map(|id| (id.clone(), 0)).collect();

        for edge in &spec.edges {
            check_edge_endpoints(edge, |id| tasks.contains_key(id))?;
            dependents
                .entry(edge.from.clone())
                .or_default()
                .push(edge.to.clone());
            *indegree.entry(edge.to.clone()).or_default() += 1;
        }

        check_acyclic(order.iter().map(String::as_str), &spec.edges)?;

        Ok(Self {
            order,
            tasks,
            dependents,
            indegree,
        })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Task ids in declaration order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn task(&self, id: &str) -> Option<&Arc<dyn Task>> {
        self.tasks.get(id)
    }

    /// Tasks that wait on `id`. An edge listed twice appears twice.
    pub fn dependents_of(&self, id: &str) -> &[TaskId] {
        self.dependents
            .get(id)
            .map(|d| d.as_slice())
            .unwrap_or(&[])
    }

    /// Number of incoming edges of `id` before anything ran.
    pub fn indegree_of(&self, id: &str) -> usize {
        self.indegree.get(id).copied().unwrap_or(0)
    }

    /// Tasks with no dependencies, in declaration order.
    pub fn roots(&self) -> Vec<TaskId> {
        self.order
            .iter()
            .filter(|id| self.indegree_of(id) == 0)
            .cloned()
            .collect()
    }

    pub(crate) fn into_parts(
        self,
    ) -> (
        HashMap<TaskId, Arc<dyn Task>>,
        HashMap<TaskId, Vec<TaskId>>,
        HashMap<TaskId, usize>,
    ) {
        (self.tasks, self.dependents, self.indegree)
    }
}

/// Both ends of `edge` must be declared tasks.
pub(crate) fn check_edge_endpoints<F>(edge: &Edge, is_known: F) -> Result<()>
where
    F: Fn(&str) -> bool,
{
    for end in [&edge.from, &edge.to] {
        if !is_known(end) {
            return Err(DagflowError::UnknownTask {
                edge: edge.to_string(),
                task: end.clone(),
            });
        }
    }
    Ok(())
}

/// Fail with [`DagflowError::DagCycle`] if the edges contain a cycle
/// (self-edges included).
pub(crate) fn check_acyclic<'a, I>(ids: I, edges: &'a [Edge]) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    // Edge direction: dependency -> dependent.
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for id in ids {
        graph.add_node(id);
    }
    for edge in edges {
        graph.add_edge(edge.from.as_str(), edge.to.as_str(), ());
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(DagflowError::DagCycle(format!(
            "cycle detected in task DAG involving task '{}'",
            cycle.node_id()
        ))),
    }
}
