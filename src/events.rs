// src/events.rs

//! Synchronous lifecycle event fan-out.
//!
//! Handlers are registered up front with `&mut self`; once the bus is shared
//! (typically behind an `Arc`) it can only publish. That is how "no subscribe
//! while a run is publishing" is enforced: the borrow checker refuses it.

use std::fmt;

use crate::types::{TaskId, TaskResult};

/// Kind of lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TaskStarted,
    TaskFinished,
}

impl EventKind {
    /// Wire name used by log lines and external sinks.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TaskStarted => "task_started",
            EventKind::TaskFinished => "task_finished",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lifecycle record. `success`/`message` are only meaningful for
/// [`EventKind::TaskFinished`]; a start event carries `true` and `""`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub id: TaskId,
    pub success: bool,
    pub message: String,
}

impl Event {
    pub fn started(id: impl Into<TaskId>) -> Self {
        Self {
            kind: EventKind::TaskStarted,
            id: id.into(),
            success: true,
            message: String::new(),
        }
    }

    pub fn finished(id: impl Into<TaskId>, result: &TaskResult) -> Self {
        Self {
            kind: EventKind::TaskFinished,
            id: id.into(),
            success: result.success,
            message: result.message.clone(),
        }
    }
}

/// Event handler. Runs on whichever worker thread published the event, so it
/// must be thread-safe and should not block.
pub type Handler = Box<dyn Fn(&Event) + Send + Sync>;

#[derive(Default)]
pub struct EventBus {
    handlers: Vec<Handler>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    /// Invoke every handler in registration order on the calling thread.
    pub fn publish(&self, event: &Event) {
        for handler in &self.handlers {
            handler(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers.len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}
