// src/types.rs

//! Small value types shared by the pool, the tasks and the executor.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Canonical task identifier type used throughout the crate.
pub type TaskId = String;

/// Outcome of a single task run.
///
/// `message` is carried verbatim into events and run reports; it is the only
/// diagnostic a failing task gives back.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskResult {
    pub success: bool,
    pub message: String,
}

impl TaskResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: String::new(),
        }
    }

    pub fn ok_with(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "ok" } else { "failed" };
        if self.message.is_empty() {
            write!(f, "{status}")
        } else {
            write!(f, "{status}: {}", self.message)
        }
    }
}

/// Cooperative cancellation flag.
///
/// Cloning shares the flag. Nothing preempts a running body: the owner of the
/// work is expected to poll [`CancelFlag::is_cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear a previously raised flag.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
