// src/task/builtin.rs

//! Constant and integer arithmetic tasks.

use tracing::debug;

use super::{Task, TaskMeta};
use crate::context::TaskContext;
use crate::types::TaskResult;

/// Writes a fixed value under a key.
#[derive(Debug, Clone)]
pub struct ConstTask {
    id: String,
    key: String,
    value: String,
    meta: TaskMeta,
}

impl ConstTask {
    pub fn new(id: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            id: id.into(),
            meta: TaskMeta::new().outputs([key.clone()]),
            key,
            value: value.into(),
        }
    }

    pub fn with_meta(mut self, meta: TaskMeta) -> Self {
        self.meta = meta;
        self
    }
}

impl Task for ConstTask {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> &str {
        "Const"
    }

    fn meta(&self) -> &TaskMeta {
        &self.meta
    }

    fn run(&self, ctx: &TaskContext) -> TaskResult {
        ctx.set(self.key.clone(), self.value.clone());
        TaskResult::ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Mul,
}

impl ArithOp {
    pub fn name(&self) -> &'static str {
        match self {
            ArithOp::Add => "Add",
            ArithOp::Mul => "Mul",
        }
    }

    fn apply(&self, a: i64, b: i64) -> Option<i64> {
        match self {
            ArithOp::Add => a.checked_add(b),
            ArithOp::Mul => a.checked_mul(b),
        }
    }
}

/// Reads two integer operands from the context and writes `a <op> b`.
#[derive(Debug, Clone)]
pub struct ArithmeticTask {
    id: String,
    op: ArithOp,
    a: String,
    b: String,
    out: String,
    meta: TaskMeta,
}

impl ArithmeticTask {
    pub fn new(
        id: impl Into<String>,
        op: ArithOp,
        a: impl Into<String>,
        b: impl Into<String>,
        out: impl Into<String>,
    ) -> Self {
        let (a, b, out) = (a.into(), b.into(), out.into());
        Self {
            id: id.into(),
            op,
            meta: TaskMeta::new()
                .inputs([a.clone(), b.clone()])
                .outputs([out.clone()]),
            a,
            b,
            out,
        }
    }

    pub fn add(
        id: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
        out: impl Into<String>,
    ) -> Self {
        Self::new(id, ArithOp::Add, a, b, out)
    }

    pub fn mul(
        id: impl Into<String>,
        a: impl Into<String>,
        b: impl Into<String>,
        out: impl Into<String>,
    ) -> Self {
        Self::new(id, ArithOp::Mul, a, b, out)
    }

    pub fn with_meta(mut self, meta: TaskMeta) -> Self {
        self.meta = meta;
        self
    }

    fn operand(&self, ctx: &TaskContext, key: &str) -> Result<i64, String> {
        let raw = ctx.get(key);
        raw.trim().parse::<i64>().map_err(|_| {
            format!(
                "{}: cannot parse '{}' = {:?} as an integer",
                self.op.name(),
                key,
                raw
            )
        })
    }
}

impl Task for ArithmeticTask {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> &str {
        self.op.name()
    }

    fn meta(&self) -> &TaskMeta {
        &self.meta
    }

    fn run(&self, ctx: &TaskContext) -> TaskResult {
        let (a, b) = match (self.operand(ctx, &self.a), self.operand(ctx, &self.b)) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(msg), _) | (_, Err(msg)) => return TaskResult::failure(msg),
        };

        match self.op.apply(a, b) {
            Some(value) => {
                debug!(task = %self.id, a, b, value, "arithmetic result");
                ctx.set(self.out.clone(), value.to_string());
                TaskResult::ok()
            }
            None => TaskResult::failure(format!(
                "{}: {} and {} overflow a 64-bit integer",
                self.op.name(),
                a,
                b
            )),
        }
    }
}
