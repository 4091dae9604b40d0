// src/services.rs

//! Logger and clock capabilities handed to task bodies through the context.

use std::fmt::Debug;
use std::time::Instant;

use tracing::{error, info, warn};

/// Sink for task-level diagnostics. Implementations must not panic.
pub trait TaskLogger: Send + Sync + Debug {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Default logger: forwards to `tracing` under the `dagflow::task` target.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger;

impl TaskLogger for TracingLogger {
    fn info(&self, message: &str) {
        info!(target: "dagflow::task", "{message}");
    }

    fn warn(&self, message: &str) {
        warn!(target: "dagflow::task", "{message}");
    }

    fn error(&self, message: &str) {
        error!(target: "dagflow::task", "{message}");
    }
}

/// Monotonic time source, for task timing and telemetry only.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
