#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use dagflow::context::TaskContext;
use dagflow::task::{Task, TaskMeta};
use dagflow::types::TaskResult;
use dagflow::workflow::WorkflowSpec;

/// What a [`RecordingTask`] did, in global order across threads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mark {
    Started(String),
    Finished(String),
}

/// Shared, thread-safe log of task starts and finishes.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    marks: Arc<Mutex<Vec<Mark>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, mark: Mark) {
        self.marks.lock().expect("recorder poisoned").push(mark);
    }

    pub fn marks(&self) -> Vec<Mark> {
        self.marks.lock().expect("recorder poisoned").clone()
    }

    /// Ids in the order they started.
    pub fn started(&self) -> Vec<String> {
        self.marks()
            .into_iter()
            .filter_map(|m| match m {
                Mark::Started(id) => Some(id),
                Mark::Finished(_) => None,
            })
            .collect()
    }

    pub fn times_started(&self, id: &str) -> usize {
        self.started().iter().filter(|s| s.as_str() == id).count()
    }

    fn position(&self, wanted: &Mark) -> Option<usize> {
        self.marks().iter().position(|m| m == wanted)
    }

    /// `true` if `before` finished before `after` started.
    pub fn finished_before_started(&self, before: &str, after: &str) -> bool {
        match (
            self.position(&Mark::Finished(before.to_string())),
            self.position(&Mark::Started(after.to_string())),
        ) {
            (Some(f), Some(s)) => f < s,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Succeed,
    Fail,
    Panic,
}

/// Task that logs its start/finish into a [`Recorder`].
#[derive(Debug)]
pub struct RecordingTask {
    id: String,
    recorder: Recorder,
    outcome: Outcome,
    delay: Duration,
    writes: Option<(String, String)>,
    meta: TaskMeta,
}

impl RecordingTask {
    pub fn new(id: &str, recorder: &Recorder) -> Self {
        Self {
            id: id.to_string(),
            recorder: recorder.clone(),
            outcome: Outcome::Succeed,
            delay: Duration::ZERO,
            writes: None,
            meta: TaskMeta::default(),
        }
    }

    pub fn failing(mut self) -> Self {
        self.outcome = Outcome::Fail;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.outcome = Outcome::Panic;
        self
    }

    pub fn sleep_ms(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }

    pub fn writes(mut self, key: &str, value: &str) -> Self {
        self.writes = Some((key.to_string(), value.to_string()));
        self
    }

    pub fn with_meta(mut self, meta: TaskMeta) -> Self {
        self.meta = meta;
        self
    }
}

impl Task for RecordingTask {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> &str {
        "Recording"
    }

    fn meta(&self) -> &TaskMeta {
        &self.meta
    }

    fn run(&self, ctx: &TaskContext) -> TaskResult {
        self.recorder.push(Mark::Started(self.id.clone()));
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        if let Some((key, value)) = &self.writes {
            ctx.set(key.clone(), value.clone());
        }
        // Record before panicking so ordering checks still see the finish.
        self.recorder.push(Mark::Finished(self.id.clone()));
        match self.outcome {
            Outcome::Succeed => TaskResult::ok(),
            Outcome::Fail => TaskResult::failure(format!("{} failed on purpose", self.id)),
            Outcome::Panic => panic!("{} panicked on purpose", self.id),
        }
    }
}

/// Builder for a `WorkflowSpec` made of [`RecordingTask`]s.
pub struct WorkflowSpecBuilder {
    recorder: Recorder,
    spec: WorkflowSpec,
}

impl WorkflowSpecBuilder {
    pub fn new() -> Self {
        Self {
            recorder: Recorder::new(),
            spec: WorkflowSpec::new(),
        }
    }

    pub fn recorder(&self) -> Recorder {
        self.recorder.clone()
    }

    /// Add a succeeding recording task.
    pub fn task(self, id: &str) -> Self {
        self.task_with(id, |t| t)
    }

    pub fn failing(self, id: &str) -> Self {
        self.task_with(id, RecordingTask::failing)
    }

    /// Add a recording task customised by `f`.
    pub fn task_with<F>(mut self, id: &str, f: F) -> Self
    where
        F: FnOnce(RecordingTask) -> RecordingTask,
    {
        let task = f(RecordingTask::new(id, &self.recorder));
        self.spec = self.spec.task(task);
        self
    }

    /// Add any task, e.g. a builtin.
    pub fn raw(mut self, task: impl Task + 'static) -> Self {
        self.spec = self.spec.task(task);
        self
    }

    pub fn edge(mut self, from: &str, to: &str) -> Self {
        self.spec = self.spec.edge(from, to);
        self
    }

    pub fn final_key(mut self, key: &str) -> Self {
        self.spec = self.spec.final_key(key);
        self
    }

    pub fn build(self) -> (WorkflowSpec, Recorder) {
        (self.spec, self.recorder)
    }
}

impl Default for WorkflowSpecBuilder {
    fn default() -> Self {
        Self::new()
    }
}
