// src/task/registry.rs

//! Workflow `type` name -> task constructor.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::shell::parse_filters;
use super::{ArithmeticTask, ConstTask, ShellArg, ShellCommand, ShellTask, Task};
use crate::config::model::TaskDescriptor;
use crate::errors::{DagflowError, Result};

/// Builds a task from its descriptor. Parameter errors are returned as
/// [`DagflowError::ConfigError`].
pub type TaskFactory = Arc<dyn Fn(&TaskDescriptor) -> Result<Arc<dyn Task>> + Send + Sync>;

#[derive(Clone, Default)]
pub struct TaskRegistry {
    factories: BTreeMap<String, TaskFactory>,
}

impl TaskRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `Const`, `Add`, `Mul` and `Shell`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert("Const", build_const);
        registry.insert("Add", build_add);
        registry.insert("Mul", build_mul);
        registry.insert("Shell", build_shell);
        registry
    }

    /// Register a factory. Fails if `kind` is already taken.
    pub fn register<F>(&mut self, kind: impl Into<String>, factory: F) -> Result<()>
    where
        F: Fn(&TaskDescriptor) -> Result<Arc<dyn Task>> + Send + Sync + 'static,
    {
        let kind = kind.into();
        if self.factories.contains_key(&kind) {
            return Err(DagflowError::ConfigError(format!(
                "task type '{kind}' is already registered"
            )));
        }
        self.insert(kind, factory);
        Ok(())
    }

    fn insert<F>(&mut self, kind: impl Into<String>, factory: F)
    where
        F: Fn(&TaskDescriptor) -> Result<Arc<dyn Task>> + Send + Sync + 'static,
    {
        self.factories.insert(kind.into(), Arc::new(factory));
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered type names, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(&self, desc: &TaskDescriptor) -> Result<Arc<dyn Task>> {
        let factory = self
            .factories
            .get(&desc.kind)
            .ok_or_else(|| DagflowError::UnsupportedTaskType {
                id: desc.id.clone(),
                kind: desc.kind.clone(),
            })?;
        factory(desc)
    }
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("kinds", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn build_const(desc: &TaskDescriptor) -> Result<Arc<dyn Task>> {
    let task = ConstTask::new(&desc.id, desc.req_str("key")?, desc.req_str("value")?);
    let meta = desc.meta(task.meta());
    Ok(Arc::new(task.with_meta(meta)))
}

fn build_add(desc: &TaskDescriptor) -> Result<Arc<dyn Task>> {
    let task = ArithmeticTask::add(
        &desc.id,
        desc.req_str("a")?,
        desc.req_str("b")?,
        desc.req_str("out")?,
    );
    let meta = desc.meta(task.meta());
    Ok(Arc::new(task.with_meta(meta)))
}

fn build_mul(desc: &TaskDescriptor) -> Result<Arc<dyn Task>> {
    let task = ArithmeticTask::mul(
        &desc.id,
        desc.req_str("a")?,
        desc.req_str("b")?,
        desc.req_str("out")?,
    );
    let meta = desc.meta(task.meta());
    Ok(Arc::new(task.with_meta(meta)))
}

/// `cmd = "..."`, or `script_path` plus optional `args`. Each arg is either a
/// string or `{ value = "...", filters = ["abspath", ...] }`.
fn build_shell(desc: &TaskDescriptor) -> Result<Arc<dyn Task>> {
    let command = match (desc.opt_str("cmd")?, desc.opt_str("script_path")?) {
        (Some(_), Some(_)) => {
            return Err(desc.param_error("cmd", "set either 'cmd' or 'script_path', not both"));
        }
        (Some(cmd), None) => ShellCommand::Inline(cmd),
        (None, Some(path)) => {
            let args = match desc.opt_array("args")? {
                Some(items) => items
                    .iter()
                    .map(|item| shell_arg(desc, item))
                    .collect::<Result<Vec<_>>>()?,
                None => Vec::new(),
            };
            ShellCommand::Script { path, args }
        }
        (None, None) => {
            return Err(desc.param_error("cmd", "one of 'cmd' or 'script_path' is required"));
        }
    };

    let mut task = ShellTask::new(&desc.id, command);
    if let Some(key) = desc.opt_str("out_key")? {
        let value = desc.opt_str("out_value")?.unwrap_or_default();
        let check_exists = desc.opt_bool("check_exists")?.unwrap_or(false);
        task = task.with_output(key, value, check_exists);
    }

    let meta = desc.meta(task.meta());
    Ok(Arc::new(task.with_meta(meta)))
}

fn shell_arg(desc: &TaskDescriptor, item: &toml::Value) -> Result<ShellArg> {
    match item {
        toml::Value::String(s) => Ok(ShellArg::Plain(s.clone())),
        toml::Value::Integer(i) => Ok(ShellArg::Plain(i.to_string())),
        toml::Value::Table(table) => {
            let value = match table.get("value") {
                Some(toml::Value::String(s)) => s.clone(),
                _ => return Err(desc.param_error("args", "table argument needs a string 'value'")),
            };
            let names: Vec<&str> = match table.get("filters") {
                None => Vec::new(),
                Some(toml::Value::Array(items)) => items
                    .iter()
                    .map(|v| {
                        v.as_str()
                            .ok_or_else(|| desc.param_error("args", "filter names must be strings"))
                    })
                    .collect::<Result<_>>()?,
                Some(_) => return Err(desc.param_error("args", "'filters' must be an array")),
            };
            let filters =
                parse_filters(names).map_err(|e| desc.param_error("args", &e.to_string()))?;
            if filters.is_empty() {
                Ok(ShellArg::Plain(value))
            } else {
                Ok(ShellArg::Filtered { value, filters })
            }
        }
        other => Err(desc.param_error(
            "args",
            &format!("expected a string or table, got {}", other.type_str()),
        )),
    }
}
