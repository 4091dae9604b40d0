// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod dag;
pub mod errors;
pub mod events;
pub mod fs;
pub mod logging;
pub mod pool;
pub mod services;
pub mod task;
pub mod types;
pub mod workflow;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::model::WorkflowFile;
use crate::config::{assemble, load_and_validate};
use crate::context::TaskContext;
use crate::dag::Executor;
use crate::events::{EventBus, EventKind};
use crate::pool::WorkerPool;
use crate::task::TaskRegistry;

pub use crate::errors::DagflowError;
pub use crate::types::{TaskId, TaskResult};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the workflow, builds every task, runs the DAG on a
/// fresh pool and prints the value of `final_key` (if any) to stdout.
/// Returns the aggregate success of the run.
pub fn run(args: CliArgs) -> Result<bool> {
    let path = PathBuf::from(&args.workflow);
    let workflow = load_and_validate(&path)
        .with_context(|| format!("loading workflow {}", path.display()))?;

    let registry = TaskRegistry::with_builtins();
    let spec = assemble(&workflow, &registry)?;

    if args.dry_run {
        print_dry_run(&workflow);
        return Ok(true);
    }

    let workers = args.workers.unwrap_or(workflow.pool().workers);
    let pool = Arc::new(WorkerPool::new(workers)?);

    let mut bus = EventBus::new();
    bus.subscribe(|event| match event.kind {
        EventKind::TaskStarted => debug!(task = %event.id, "{}", event.kind),
        EventKind::TaskFinished => info!(
            task = %event.id,
            success = event.success,
            message = %event.message,
            "{}",
            event.kind
        ),
    });

    let ctx = Arc::new(TaskContext::with_defaults());
    let executor = Executor::new(Arc::new(bus), Arc::clone(&pool));
    let report = executor.run_with_report(&spec, &ctx)?;

    if let Some(key) = &spec.final_key {
        println!("{}", ctx.get(key));
    }

    pool.shutdown();
    info!(
        completed = pool.completed_task_count(),
        success = report.success,
        "run complete"
    );

    Ok(report.success)
}

/// Simple dry-run output: tasks, their types, params and edges.
fn print_dry_run(workflow: &WorkflowFile) {
    println!("dagflow dry-run");
    if workflow.pool().workers > 0 {
        println!("  pool.workers = {}", workflow.pool().workers);
    }
    if let Some(key) = workflow.final_key() {
        println!("  final_key = {key}");
    }
    println!();

    if !workflow.vars().is_empty() {
        println!("vars ({}):", workflow.vars().len());
        for (key, value) in workflow.vars() {
            println!("  {key} = {value}");
        }
        println!();
    }

    println!("tasks ({}):", workflow.tasks().len());
    for task in workflow.tasks() {
        println!("  - {} ({})", task.id, task.kind);
        for (name, value) in &task.params {
            println!("      {name}: {value}");
        }
        let hints = task.hints();
        if !hints.is_default() {
            println!("      hints: {hints:?} (not enforced)");
        }
    }

    if !workflow.edges().is_empty() {
        println!();
        println!("edges ({}):", workflow.edges().len());
        for edge in workflow.edges() {
            println!("  {edge}");
        }
    }

    debug!("dry-run complete (no execution)");
}
