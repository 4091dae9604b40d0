// src/dag/executor.rs

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::context::TaskContext;
use crate::dag::graph::DagGraph;
use crate::dag::report::RunReport;
use crate::errors::Result;
use crate::events::{Event, EventBus};
use crate::pool::WorkerPool;
use crate::pool::job::panic_message;
use crate::task::Task;
use crate::types::{TaskId, TaskResult};
use crate::workflow::WorkflowSpec;

/// Drives a [`WorkflowSpec`] to completion on a
/// [`WorkerPool`].
///
/// Readiness is tracked by in-degree: a task is dispatched once every
/// predecessor has *finished*, whether it succeeded or not. Task failures do
/// not stop the run; they only turn the aggregate result false.
#[derive(Debug)]
pub struct Executor {
    bus: Arc<EventBus>,
    pool: Arc<WorkerPool>,
    /// Monotonically increasing run ID, for log correlation.
    run_counter: AtomicU64,
}

/// Mutable per-run bookkeeping, only touched under `RunShared::state`.
struct RunState {
    indegree: HashMap<TaskId, usize>,
    ready: VecDeque<TaskId>,
    /// Tasks not yet finished (queued, running or waiting on deps).
    outstanding: usize,
    results: BTreeMap<TaskId, TaskResult>,
    /// Set once the pool refused a submission; nothing more is released.
    halted: bool,
}

impl RunState {
    /// Stop releasing work and count every task that was never dispatched
    /// as finished. Tasks already on the pool still report in.
    fn halt(&mut self) -> usize {
        self.halted = true;

        let mut skipped: Vec<TaskId> = self.ready.drain(..).collect();
        skipped.extend(
            self.indegree
                .iter()
                .filter(|&(_, &remaining)| remaining > 0)
                .map(|(id, _)| id.clone()),
        );

        for id in &skipped {
            self.results.insert(
                id.clone(),
                TaskResult::failure("not dispatched: the worker pool stopped"),
            );
        }
        self.outstanding = self.outstanding.saturating_sub(skipped.len());
        skipped.len()
    }
}

/// Everything a dispatched task needs, shared with the worker threads.
struct RunShared {
    run_id: u64,
    tasks: HashMap<TaskId, Arc<dyn Task>>,
    dependents: HashMap<TaskId, Vec<TaskId>>,
    state: Mutex<RunState>,
    progress: Condvar,
    bus: Arc<EventBus>,
    ctx: Arc<TaskContext>,
}

impl Executor {
    pub fn new(bus: Arc<EventBus>, pool: Arc<WorkerPool>) -> Self {
        Self {
            bus,
            pool,
            run_counter: AtomicU64::new(0),
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Run the workflow and return `true` iff every task succeeded.
    ///
    /// Graph errors (duplicate id, dangling edge, cycle) are returned before
    /// any task runs. A pool that stops mid-run surfaces as
    /// [`DagflowError::Pool`](crate::errors::DagflowError::Pool) once the
    /// tasks it already accepted have finished.
    pub fn run(&self, spec: &WorkflowSpec, ctx: &Arc<TaskContext>) -> Result<bool> {
        Ok(self.run_with_report(spec, ctx)?.success)
    }

    /// Like [`Executor::run`], keeping every task's result.
    pub fn run_with_report(
        &self,
        spec: &WorkflowSpec,
        ctx: &Arc<TaskContext>,
    ) -> Result<RunReport> {
        let graph = DagGraph::prepare(spec)?;
        let run_id = self.run_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let started = Instant::now();

        info!(run_id, tasks = graph.len(), edges = spec.edges.len(), "starting DAG run");

        if !spec.vars.is_empty() {
            ctx.extend(spec.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
            debug!(run_id, vars = spec.vars.len(), "seeded initial variables");
        }

        let ready: VecDeque<TaskId> = graph.roots().into();
        let outstanding = graph.len();
        let (tasks, dependents, indegree) = graph.into_parts();

        let shared = Arc::new(RunShared {
            run_id,
            tasks,
            dependents,
            state: Mutex::new(RunState {
                indegree,
                ready,
                outstanding,
                results: BTreeMap::new(),
                halted: false,
            }),
            progress: Condvar::new(),
            bus: Arc::clone(&self.bus),
            ctx: Arc::clone(ctx),
        });

        self.dispatch_loop(&shared)?;

        let results = std::mem::take(&mut shared.lock().results);
        let report = RunReport::new(run_id, results, started.elapsed());

        if report.success {
            info!(run_id, elapsed = ?report.elapsed, "DAG run finished successfully");
        } else {
            warn!(
                run_id,
                elapsed = ?report.elapsed,
                failed = ?report.failed(),
                "DAG run finished with failures"
            );
        }

        Ok(report)
    }

    /// Pop ready tasks and hand them to the pool until nothing is outstanding.
    ///
    /// If the pool refuses a task, dispatching stops but the loop still waits
    /// for the tasks already handed out before returning the pool error.
    fn dispatch_loop(&self, shared: &Arc<RunShared>) -> Result<()> {
        let mut state = shared.lock();

        while state.outstanding > 0 {
            let Some(id) = state.ready.pop_front() else {
                state = shared
                    .progress
                    .wait_while(state, |s| s.ready.is_empty() && s.outstanding > 0)
                    .unwrap_or_else(PoisonError::into_inner);
                continue;
            };
            drop(state);

            let submitted = self.submit(shared, id);

            state = shared.lock();
            if let Err(err) = submitted {
                let skipped = state.halt();
                warn!(
                    run_id = shared.run_id,
                    skipped,
                    in_flight = state.outstanding,
                    error = %err,
                    "worker pool refused a task; waiting for in-flight tasks"
                );
                drop(
                    shared
                        .progress
                        .wait_while(state, |s| s.outstanding > 0)
                        .unwrap_or_else(PoisonError::into_inner),
                );
                return Err(err);
            }
        }

        Ok(())
    }

    fn submit(&self, shared: &Arc<RunShared>, id: TaskId) -> Result<()> {
        if let Some(task) = shared.tasks.get(&id) {
            let hints = &task.meta().hints;
            if !hints.is_default() {
                debug!(
                    run_id = shared.run_id,
                    task = %id,
                    ?hints,
                    "task declares execution hints; they are advisory and not enforced"
                );
            }
        }

        debug!(run_id = shared.run_id, task = %id, "dispatching task");

        let dispatch = Dispatch {
            shared: Arc::clone(shared),
            id,
            done: false,
        };

        // The handle is not needed: completion is reported through the
        // shared state, including when the pool drops the job unrun.
        self.pool.submit(move || dispatch.run())?;
        Ok(())
    }
}

impl RunShared {
    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run one task body on the current (worker) thread.
    fn execute(&self, id: &str) -> TaskResult {
        let Some(task) = self.tasks.get(id) else {
            return TaskResult::failure(format!("task '{id}' is not part of this run"));
        };

        self.bus.publish(&Event::started(id));

        match panic::catch_unwind(AssertUnwindSafe(|| task.run(&self.ctx))) {
            Ok(result) => result,
            Err(payload) => TaskResult::failure(format!(
                "task panicked: {}",
                panic_message(payload.as_ref())
            )),
        }
    }

    /// Record a finished task and release its dependents.
    fn complete(&self, id: &str, result: TaskResult) {
        self.bus.publish(&Event::finished(id, &result));

        if result.success {
            debug!(run_id = self.run_id, task = %id, "task finished");
        } else {
            warn!(
                run_id = self.run_id,
                task = %id,
                message = %result.message,
                "task failed; dependents still run"
            );
        }

        {
            let mut state = self.lock();
            state.results.insert(id.to_string(), result);

            let released = if state.halted {
                &[][..]
            } else {
                self.dependents.get(id).map(Vec::as_slice).unwrap_or(&[])
            };
            for next in released {
                if let Some(remaining) = state.indegree.get_mut(next) {
                    *remaining = remaining.saturating_sub(1);
                    if *remaining == 0 {
                        state.ready.push_back(next.clone());
                    }
                }
            }

            state.outstanding = state.outstanding.saturating_sub(1);
        }

        self.progress.notify_all();
    }
}

/// Pool job for one task.
///
/// Finishing happens on drop when the job never ran, so a job the pool
/// discards still releases its dependents and the run cannot hang.
struct Dispatch {
    shared: Arc<RunShared>,
    id: TaskId,
    done: bool,
}

impl Dispatch {
    fn run(mut self) {
        let result = self.shared.execute(&self.id);
        self.done = true;
        self.shared.complete(&self.id, result);
    }
}

impl Drop for Dispatch {
    fn drop(&mut self) {
        if !self.done {
            self.done = true;
            self.shared.complete(
                &self.id,
                TaskResult::failure("task was dropped by the worker pool before it ran"),
            );
        }
    }
}
