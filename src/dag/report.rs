// src/dag/report.rs

use std::collections::BTreeMap;
use std::time::Duration;

use crate::types::{TaskId, TaskResult};

/// Outcome of one executor run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: u64,
    /// `true` iff every task produced a successful result.
    pub success: bool,
    pub results: BTreeMap<TaskId, TaskResult>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn new(run_id: u64, results: BTreeMap<TaskId, TaskResult>, elapsed: Duration) -> Self {
        let success = results.values().all(|r| r.success);
        Self {
            run_id,
            success,
            results,
            elapsed,
        }
    }

    /// Ids of failed tasks, sorted.
    pub fn failed(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, r)| !r.success)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn result(&self, id: &str) -> Option<&TaskResult> {
        self.results.get(id)
    }
}
