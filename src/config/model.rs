// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::errors::{DagflowError, Result};
use crate::task::{TaskHints, TaskMeta};
use crate::workflow::Edge;

/// Workflow description exactly as read from a TOML file.
///
/// ```toml
/// final_key = "final"
/// edges = [["const1", "add"], ["add", "mul"]]
///
/// [pool]
/// workers = 4
///
/// [vars]
/// base_dir = "./workspace"
///
/// [[task]]
/// id = "const1"
/// type = "Const"
/// [task.params]
/// key = "k1"
/// value = "1"
/// ```
///
/// All sections are optional. No semantic checks happen here; see
/// [`WorkflowFile`] for the validated form.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawWorkflowFile {
    /// Context key whose value is reported after the run.
    #[serde(default)]
    pub final_key: Option<String>,

    /// Dependency edges as `[from, to]` pairs: `to` waits for `from`.
    ///
    /// Kept as plain lists so a wrong arity is reported by validation rather
    /// than as an opaque parse error.
    #[serde(default)]
    pub edges: Vec<Vec<String>>,

    #[serde(default)]
    pub pool: PoolSection,

    /// Initial context variables.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,

    /// All `[[task]]` entries, in file order.
    #[serde(default, rename = "task")]
    pub tasks: Vec<TaskDescriptor>,
}

/// `[pool]` section.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct PoolSection {
    /// Worker threads; `0` (the default) means one per available core.
    #[serde(default)]
    pub workers: usize,
}

/// One `[[task]]` entry.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TaskDescriptor {
    pub id: String,

    /// Registered task type, e.g. `"Const"`, `"Add"`, `"Shell"`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Type-specific parameters from `[task.params]`.
    #[serde(default)]
    pub params: toml::Table,

    /// Declared input keys (validation / visualisation only).
    #[serde(default)]
    pub inputs: Vec<String>,

    /// Declared output keys (validation / visualisation only).
    #[serde(default)]
    pub outputs: Vec<String>,

    #[serde(default)]
    pub max_retries: u32,

    #[serde(default)]
    pub retry_backoff_ms: u64,

    #[serde(default)]
    pub timeout_ms: u64,

    #[serde(default)]
    pub continue_on_failure: bool,

    #[serde(default)]
    pub barrier: bool,
}

impl TaskDescriptor {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            ..Self::default()
        }
    }

    /// Builder-style helper to set one parameter.
    pub fn param(mut self, name: &str, value: impl Into<toml::Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn hints(&self) -> TaskHints {
        TaskHints {
            max_retries: self.max_retries,
            retry_backoff_ms: self.retry_backoff_ms,
            timeout_ms: self.timeout_ms,
            continue_on_failure: self.continue_on_failure,
            is_barrier: self.barrier,
        }
    }

    /// Metadata for the task built from this descriptor. Declared
    /// inputs/outputs win over `defaults` when present.
    pub fn meta(&self, defaults: &TaskMeta) -> TaskMeta {
        let inputs = if self.inputs.is_empty() {
            defaults.inputs.clone()
        } else {
            self.inputs.clone()
        };
        let outputs = if self.outputs.is_empty() {
            defaults.outputs.clone()
        } else {
            self.outputs.clone()
        };
        TaskMeta::new()
            .inputs(inputs)
            .outputs(outputs)
            .hints(self.hints())
    }

    /// Scalar parameter rendered as a string, if present.
    pub fn opt_str(&self, name: &str) -> Result<Option<String>> {
        match self.params.get(name) {
            None => Ok(None),
            Some(toml::Value::String(s)) => Ok(Some(s.clone())),
            Some(toml::Value::Integer(i)) => Ok(Some(i.to_string())),
            Some(toml::Value::Float(f)) => Ok(Some(f.to_string())),
            Some(toml::Value::Boolean(b)) => Ok(Some(b.to_string())),
            Some(other) => Err(self.param_error(name, &format!(
                "expected a scalar, got {}",
                other.type_str()
            ))),
        }
    }

    /// Required scalar parameter.
    pub fn req_str(&self, name: &str) -> Result<String> {
        self.opt_str(name)?
            .ok_or_else(|| self.param_error(name, "missing required parameter"))
    }

    pub fn opt_bool(&self, name: &str) -> Result<Option<bool>> {
        match self.params.get(name) {
            None => Ok(None),
            Some(toml::Value::Boolean(b)) => Ok(Some(*b)),
            Some(other) => Err(self.param_error(name, &format!(
                "expected a boolean, got {}",
                other.type_str()
            ))),
        }
    }

    pub fn opt_array(&self, name: &str) -> Result<Option<&toml::value::Array>> {
        match self.params.get(name) {
            None => Ok(None),
            Some(toml::Value::Array(items)) => Ok(Some(items)),
            Some(other) => Err(self.param_error(name, &format!(
                "expected an array, got {}",
                other.type_str()
            ))),
        }
    }

    pub fn param_error(&self, name: &str, what: &str) -> DagflowError {
        DagflowError::ConfigError(format!(
            "task '{}' ({}): parameter '{}': {}",
            self.id, self.kind, name, what
        ))
    }
}

/// Validated workflow description.
///
/// Only obtainable through `TryFrom<RawWorkflowFile>`, which guarantees
/// unique non-empty ids, well-formed edges between known tasks, and no
/// cycles. Task types are checked later, against a registry.
#[derive(Debug, Clone)]
pub struct WorkflowFile {
    final_key: Option<String>,
    edges: Vec<Edge>,
    pool: PoolSection,
    vars: BTreeMap<String, String>,
    tasks: Vec<TaskDescriptor>,
}

impl WorkflowFile {
    pub(crate) fn new_unchecked(
        final_key: Option<String>,
        edges: Vec<Edge>,
        pool: PoolSection,
        vars: BTreeMap<String, String>,
        tasks: Vec<TaskDescriptor>,
    ) -> Self {
        Self {
            final_key,
            edges,
            pool,
            vars,
            tasks,
        }
    }

    pub fn final_key(&self) -> Option<&str> {
        self.final_key.as_deref()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn pool(&self) -> &PoolSection {
        &self.pool
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    pub fn tasks(&self) -> &[TaskDescriptor] {
        &self.tasks
    }
}
