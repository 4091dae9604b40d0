// src/task/shell.rs

//! Task that runs an external command through the platform shell.

use std::path::Path;
use std::process::Command;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use super::template::expand;
use super::{Task, TaskMeta};
use crate::context::TaskContext;
use crate::types::TaskResult;

/// Number of trailing stderr lines kept in a failure message.
const STDERR_TAIL_LINES: usize = 5;

/// Path transformation applied to a script argument, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathFilter {
    Abspath,
    Normpath,
    Dirname,
    Basename,
    /// Create the directory, pass the path through.
    EnsureDir,
    /// Create the parent directory, pass the path through.
    EnsureParent,
}

impl FromStr for PathFilter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abspath" => Ok(PathFilter::Abspath),
            "normpath" => Ok(PathFilter::Normpath),
            "dirname" => Ok(PathFilter::Dirname),
            "basename" => Ok(PathFilter::Basename),
            "ensure_dir" => Ok(PathFilter::EnsureDir),
            "ensure_parent" => Ok(PathFilter::EnsureParent),
            other => Err(format!(
                "unknown filter: {other} (expected abspath, normpath, dirname, basename, ensure_dir or ensure_parent)"
            )),
        }
    }
}

impl PathFilter {
    fn apply(&self, ctx: &TaskContext, value: String) -> Result<String> {
        let fs = ctx.fs();
        let path = Path::new(&value);
        let out = match self {
            PathFilter::Abspath => fs.absolute(path)?.to_string_lossy().into_owned(),
            PathFilter::Normpath => fs.normalize(path).to_string_lossy().into_owned(),
            PathFilter::Dirname => fs.dirname(path).to_string_lossy().into_owned(),
            PathFilter::Basename => fs.basename(path),
            PathFilter::EnsureDir => {
                fs.ensure_dir(path)?;
                value
            }
            PathFilter::EnsureParent => {
                fs.ensure_parent_dir(path)?;
                value
            }
        };
        Ok(out)
    }
}

/// One argument passed to a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellArg {
    Plain(String),
    Filtered {
        value: String,
        filters: Vec<PathFilter>,
    },
}

/// What to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// A command line handed to the shell as-is (after expansion).
    Inline(String),
    /// A script path plus arguments, each quoted for the shell.
    Script { path: String, args: Vec<ShellArg> },
}

/// Runs a command; on exit code 0 optionally records an output key.
///
/// `{name}` placeholders in the command, script arguments and `out_value`
/// are expanded from the context when the task runs.
#[derive(Debug, Clone)]
pub struct ShellTask {
    id: String,
    command: ShellCommand,
    out_key: Option<String>,
    out_value: Option<String>,
    check_exists: bool,
    meta: TaskMeta,
}

impl ShellTask {
    pub fn new(id: impl Into<String>, command: ShellCommand) -> Self {
        Self {
            id: id.into(),
            command,
            out_key: None,
            out_value: None,
            check_exists: false,
            meta: TaskMeta::default(),
        }
    }

    pub fn inline(id: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self::new(id, ShellCommand::Inline(cmd.into()))
    }

    /// On success set `key = value`; with `check_exists`, `value` must name
    /// an existing path first.
    pub fn with_output(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        check_exists: bool,
    ) -> Self {
        let key = key.into();
        if !key.is_empty() {
            self.meta.outputs = vec![key.clone()];
        }
        self.out_key = Some(key);
        self.out_value = Some(value.into());
        self.check_exists = check_exists;
        self
    }

    pub fn with_meta(mut self, meta: TaskMeta) -> Self {
        self.meta = meta;
        self
    }

    fn expand(&self, ctx: &TaskContext, template: &str) -> String {
        let expanded = expand(template, |name| ctx.try_get(name));
        for name in &expanded.unresolved {
            ctx.logger().warn(&format!(
                "{}: no value for placeholder {{{}}}; left as-is",
                self.id, name
            ));
        }
        expanded.text
    }

    fn command_line(&self, ctx: &TaskContext) -> Result<String> {
        match &self.command {
            ShellCommand::Inline(cmd) => Ok(self.expand(ctx, cmd)),
            ShellCommand::Script { path, args } => {
                let mut parts = vec![shell_quote(&self.expand(ctx, path))];
                for arg in args {
                    let value = match arg {
                        ShellArg::Plain(value) => self.expand(ctx, value),
                        ShellArg::Filtered { value, filters } => {
                            let mut current = self.expand(ctx, value);
                            for filter in filters {
                                current = filter
                                    .apply(ctx, current)
                                    .with_context(|| format!("applying {filter:?} filter"))?;
                            }
                            current
                        }
                    };
                    parts.push(shell_quote(&value));
                }
                Ok(parts.join(" "))
            }
        }
    }

    fn execute(&self, ctx: &TaskContext, line: &str) -> Result<TaskResult> {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(line);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(line);
            c
        };

        let output = cmd
            .output()
            .with_context(|| format!("spawning process for task '{}'", self.id))?;

        for stdout_line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!(task = %self.id, "stdout: {}", stdout_line);
        }

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            let stderr = String::from_utf8_lossy(&output.stderr);
            let tail = stderr_tail(&stderr);
            let message = if tail.is_empty() {
                format!("command exited with code {code}")
            } else {
                format!("command exited with code {code}: {tail}")
            };
            return Ok(TaskResult::failure(message));
        }

        let Some(key) = self.out_key.as_deref().filter(|k| !k.is_empty()) else {
            return Ok(TaskResult::ok());
        };

        let value = self
            .out_value
            .as_deref()
            .map(|v| self.expand(ctx, v))
            .unwrap_or_default();

        if self.check_exists && !value.is_empty() && !ctx.fs().exists(Path::new(&value)) {
            return Ok(TaskResult::failure(format!(
                "expected output not found: {value}"
            )));
        }

        ctx.set(key, value);
        Ok(TaskResult::ok())
    }
}

impl Task for ShellTask {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> &str {
        "Shell"
    }

    fn meta(&self) -> &TaskMeta {
        &self.meta
    }

    fn run(&self, ctx: &TaskContext) -> TaskResult {
        if self.is_cancelled() {
            return TaskResult::failure("cancelled before the command was started");
        }

        let line = match self.command_line(ctx) {
            Ok(line) => line,
            Err(err) => return TaskResult::failure(format!("{err:#}")),
        };

        ctx.logger().info(&format!("{}: running `{}`", self.id, line));
        let started = ctx.clock().now();

        let result = self
            .execute(ctx, &line)
            .unwrap_or_else(|err| TaskResult::failure(format!("{err:#}")));

        let elapsed = ctx.clock().now().saturating_duration_since(started);
        if result.success {
            ctx.logger()
                .info(&format!("{}: finished in {:?}", self.id, elapsed));
        } else {
            ctx.logger().error(&format!(
                "{}: failed after {:?}: {}",
                self.id, elapsed, result.message
            ));
        }
        result
    }
}

/// Quote a single argument for `sh` (or pass it through on Windows).
fn shell_quote(arg: &str) -> String {
    if cfg!(windows) {
        return format!("\"{}\"", arg.replace('"', "\\\""));
    }
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join(" | ")
}

/// Parse a filter list, reporting the first unknown name.
pub fn parse_filters<I, S>(names: I) -> Result<Vec<PathFilter>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| PathFilter::from_str(name.as_ref()).map_err(|e| anyhow!(e)))
        .collect()
}
