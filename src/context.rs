// src/context.rs

//! Shared key/value state for one workflow run.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::fs::{FileSystem, RealFileSystem};
use crate::services::{Clock, SystemClock, TaskLogger, TracingLogger};

/// Thread-safe string -> string store plus capability accessors.
///
/// Every read and write takes the same mutex, so a write is visible to any
/// task that starts after it. There is no multi-key transaction: two reads
/// may observe writes from concurrently running tasks in either order.
pub struct TaskContext {
    values: Mutex<HashMap<String, String>>,
    logger: Arc<dyn TaskLogger>,
    clock: Arc<dyn Clock>,
    fs: Arc<dyn FileSystem>,
}

impl TaskContext {
    pub fn new(
        logger: Arc<dyn TaskLogger>,
        clock: Arc<dyn Clock>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            logger,
            clock,
            fs,
        }
    }

    /// Context backed by `tracing`, the system clock and the real filesystem.
    pub fn with_defaults() -> Self {
        Self::new(
            Arc::new(TracingLogger),
            Arc::new(SystemClock),
            Arc::new(RealFileSystem),
        )
    }

    /// Same defaults, but with a caller-provided filesystem.
    pub fn with_fs(fs: Arc<dyn FileSystem>) -> Self {
        Self::new(Arc::new(TracingLogger), Arc::new(SystemClock), fs)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        // A panicking task cannot leave the map half-written.
        self.values.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Value for `key`, or `""` when it was never set.
    ///
    /// Absent and empty are indistinguishable here; use
    /// [`TaskContext::try_get`] when the difference matters.
    pub fn get(&self, key: &str) -> String {
        self.lock().get(key).cloned().unwrap_or_default()
    }

    pub fn try_get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().insert(key.into(), value.into());
    }

    /// Seed many keys at once (used for initial workflow variables).
    pub fn extend<I, K, V>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut values = self.lock();
        for (key, value) in entries {
            values.insert(key.into(), value.into());
        }
    }

    /// Sorted copy of the whole map.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Drop every key. Tasks are never reused across runs, but a context can
    /// be reset and handed to a fresh set of tasks.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn logger(&self) -> &dyn TaskLogger {
        self.logger.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }
}

impl Default for TaskContext {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for TaskContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskContext")
            .field("values", &self.snapshot())
            .field("logger", &self.logger)
            .field("clock", &self.clock)
            .field("fs", &self.fs)
            .finish()
    }
}
