#![allow(dead_code)]

use std::sync::Arc;

use dagflow::context::TaskContext;
use dagflow::dag::{Executor, RunReport};
use dagflow::events::EventBus;
use dagflow::pool::WorkerPool;
use dagflow::workflow::WorkflowSpec;

pub use dagflow_test_utils::builders;
pub use dagflow_test_utils::init_tracing;

pub fn executor(workers: usize) -> Executor {
    executor_with_bus(workers, EventBus::new())
}

pub fn executor_with_bus(workers: usize, bus: EventBus) -> Executor {
    let pool = WorkerPool::new(workers).expect("pool should start");
    Executor::new(Arc::new(bus), Arc::new(pool))
}

/// Run `spec` on a fresh 4-worker executor with a default context.
pub fn run_spec(spec: &WorkflowSpec) -> (RunReport, Arc<TaskContext>) {
    let ctx = Arc::new(TaskContext::with_defaults());
    let report = executor(4)
        .run_with_report(spec, &ctx)
        .expect("run should not error");
    (report, ctx)
}
