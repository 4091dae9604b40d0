// src/task/mod.rs

//! Units of work executed by the DAG executor.
//!
//! - [`builtin`] has the constant and integer arithmetic tasks.
//! - [`shell`] runs external commands.
//! - [`template`] expands `{name}` placeholders from the context.
//! - [`registry`] maps workflow `type` names to task factories.
//!
//! New task kinds implement [`Task`]; the executor never needs to change.

pub mod builtin;
pub mod registry;
pub mod shell;
pub mod template;

use std::fmt;

use crate::context::TaskContext;
use crate::types::{CancelFlag, TaskResult};

pub use builtin::{ArithOp, ArithmeticTask, ConstTask};
pub use registry::{TaskFactory, TaskRegistry};
pub use shell::{PathFilter, ShellArg, ShellCommand, ShellTask};

/// Execution hints declared on a task.
///
/// None of these are enforced by the executor: no retries, no timeout, no
/// barrier semantics, and successors are released even when a task fails
/// regardless of `continue_on_failure`. They are carried for tooling and for
/// executors that want to build on them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskHints {
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    pub timeout_ms: u64,
    pub continue_on_failure: bool,
    pub is_barrier: bool,
}

impl TaskHints {
    pub fn is_default(&self) -> bool {
        *self == TaskHints::default()
    }
}

/// Metadata common to every task.
#[derive(Debug, Clone, Default)]
pub struct TaskMeta {
    /// Context keys the task reads. Informational only.
    pub inputs: Vec<String>,
    /// Context keys the task writes. Informational only.
    pub outputs: Vec<String>,
    pub hints: TaskHints,
    pub cancel: CancelFlag,
}

impl TaskMeta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inputs<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn outputs<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn hints(mut self, hints: TaskHints) -> Self {
        self.hints = hints;
        self
    }
}

/// A named unit of work run against the shared context.
///
/// A task instance is built for one run and executed at most once by the
/// executor; state it keeps in the context must be reset by the caller before
/// reuse.
pub trait Task: Send + Sync + fmt::Debug {
    /// Identity, unique within a workflow.
    fn id(&self) -> &str;

    /// Workflow `type` name, used in logs and dry-run output.
    fn kind(&self) -> &str {
        "custom"
    }

    fn meta(&self) -> &TaskMeta;

    /// Run the task. Failures are reported in the result, not by panicking;
    /// a panic is still caught and turned into a failed result.
    fn run(&self, ctx: &TaskContext) -> TaskResult;

    /// Raise the cooperative cancellation flag.
    fn cancel(&self) {
        self.meta().cancel.cancel();
    }

    fn is_cancelled(&self) -> bool {
        self.meta().cancel.is_cancelled()
    }
}

type TaskFn = dyn Fn(&TaskContext) -> TaskResult + Send + Sync;

/// Task backed by a closure. Handy for embedding and for tests.
pub struct FnTask {
    id: String,
    meta: TaskMeta,
    body: Box<TaskFn>,
}

impl FnTask {
    pub fn new<F>(id: impl Into<String>, body: F) -> Self
    where
        F: Fn(&TaskContext) -> TaskResult + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            meta: TaskMeta::default(),
            body: Box::new(body),
        }
    }

    pub fn with_meta(mut self, meta: TaskMeta) -> Self {
        self.meta = meta;
        self
    }
}

impl Task for FnTask {
    fn id(&self) -> &str {
        &self.id
    }

    fn meta(&self) -> &TaskMeta {
        &self.meta
    }

    fn run(&self, ctx: &TaskContext) -> TaskResult {
        (self.body)(ctx)
    }
}

impl fmt::Debug for FnTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTask")
            .field("id", &self.id)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}
