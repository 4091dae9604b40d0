// tests/workflow_loading.rs

mod common;
use crate::common::init_tracing;

use std::io::Write;
use std::sync::Arc;

use tempfile::NamedTempFile;

use dagflow::cli::CliArgs;
use dagflow::config::{TaskDescriptor, assemble, load_and_validate, load_from_path};
use dagflow::context::TaskContext;
use dagflow::errors::DagflowError;
use dagflow::task::{ConstTask, Task, TaskRegistry};

fn write_workflow(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

const PIPELINE: &str = r#"
final_key = "final"
edges = [
    ["const2", "add"], ["const1", "add"], ["const1", "mul"],
    ["add", "mul"], ["mul", "plus3"], ["const3", "plus3"],
]

[pool]
workers = 3

[vars]
base = "10"

[[task]]
id = "const1"
type = "Const"
[task.params]
key = "k1"
value = "1"

[[task]]
id = "const2"
type = "Const"
[task.params]
key = "k2"
value = 2

[[task]]
id = "const3"
type = "Const"
[task.params]
key = "k3"
value = "3"

[[task]]
id = "add"
type = "Add"
[task.params]
a = "k2"
b = "k1"
out = "sum"

[[task]]
id = "mul"
type = "Mul"
max_retries = 3
timeout_ms = 500
[task.params]
a = "k1"
b = "sum"
out = "prod"

[[task]]
id = "plus3"
type = "Add"
[task.params]
a = "prod"
b = "k3"
out = "final"
"#;

#[test]
fn pipeline_file_loads_assembles_and_runs() {
    init_tracing();

    let file = write_workflow(PIPELINE);
    let workflow = load_and_validate(file.path()).unwrap();

    assert_eq!(workflow.final_key(), Some("final"));
    assert_eq!(workflow.pool().workers, 3);
    assert_eq!(workflow.vars()["base"], "10");
    assert_eq!(workflow.tasks().len(), 6);
    assert_eq!(workflow.edges().len(), 6);

    let spec = assemble(&workflow, &TaskRegistry::with_builtins()).unwrap();
    let mul = spec.tasks.iter().find(|t| t.id() == "mul").unwrap();
    assert_eq!(mul.kind(), "Mul");
    assert_eq!(mul.meta().hints.max_retries, 3);
    assert_eq!(mul.meta().hints.timeout_ms, 500);
    assert_eq!(mul.meta().inputs, vec!["k1".to_string(), "sum".to_string()]);

    let ctx = Arc::new(TaskContext::with_defaults());
    let ok = common::executor(3).run(&spec, &ctx).unwrap();

    assert!(ok);
    assert_eq!(ctx.get("final"), "6");
    assert_eq!(ctx.get("base"), "10");
}

#[test]
fn cli_entry_point_reports_success_and_failure() {
    init_tracing();

    let good = write_workflow(PIPELINE);
    let args = CliArgs {
        workflow: good.path().display().to_string(),
        workers: Some(2),
        log_level: None,
        dry_run: false,
    };
    assert!(dagflow::run(args).unwrap());

    let bad = write_workflow(
        r#"
[[task]]
id = "x"
type = "Add"
[task.params]
a = "nope"
b = "nope"
out = "y"
"#,
    );
    let args = CliArgs {
        workflow: bad.path().display().to_string(),
        workers: None,
        log_level: None,
        dry_run: false,
    };
    assert!(!dagflow::run(args).unwrap());
}

#[test]
fn dry_run_builds_but_does_not_execute() {
    init_tracing();

    let file = write_workflow(PIPELINE);
    let args = CliArgs {
        workflow: file.path().display().to_string(),
        workers: None,
        log_level: None,
        dry_run: true,
    };
    assert!(dagflow::run(args).unwrap());
}

#[test]
fn edge_with_wrong_arity_is_rejected() {
    let file = write_workflow(
        r#"
edges = [["a", "b", "c"]]

[[task]]
id = "a"
type = "Const"
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagflowError::InvalidEdge(msg)) => assert!(msg.contains("3 element")),
        other => panic!("expected InvalidEdge, got {other:?}"),
    }
}

#[test]
fn edge_to_unknown_task_is_rejected() {
    let file = write_workflow(
        r#"
edges = [["a", "missing"]]

[[task]]
id = "a"
type = "Const"
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagflowError::UnknownTask { task, .. }) => assert_eq!(task, "missing"),
        other => panic!("expected UnknownTask, got {other:?}"),
    }
}

#[test]
fn duplicate_task_ids_are_rejected() {
    let file = write_workflow(
        r#"
[[task]]
id = "a"
type = "Const"

[[task]]
id = "a"
type = "Add"
"#,
    );

    assert!(matches!(
        load_and_validate(file.path()),
        Err(DagflowError::DuplicateTask(id)) if id == "a"
    ));
}

#[test]
fn cycles_are_rejected_at_load_time() {
    let file = write_workflow(
        r#"
edges = [["a", "b"], ["b", "a"]]

[[task]]
id = "a"
type = "Const"

[[task]]
id = "b"
type = "Const"
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagflowError::DagCycle(msg)) => {
            assert!(msg.contains("cycle detected"));
            assert!(msg.contains('a') || msg.contains('b'));
        }
        other => panic!("expected DagCycle, got {other:?}"),
    }
}

#[test]
fn empty_type_is_a_config_error() {
    let file = write_workflow(
        r#"
[[task]]
id = "a"
type = ""
"#,
    );

    match load_and_validate(file.path()) {
        Err(DagflowError::ConfigError(msg)) => assert!(msg.contains("empty `type`")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn malformed_toml_and_missing_files_are_reported() {
    let file = write_workflow("edges = [[");
    assert!(matches!(
        load_from_path(file.path()),
        Err(DagflowError::TomlError(_))
    ));

    assert!(matches!(
        load_from_path("/definitely/not/here.toml"),
        Err(DagflowError::IoError(_))
    ));
}

#[test]
fn unsupported_type_fails_assembly() {
    let file = write_workflow(
        r#"
[[task]]
id = "a"
type = "Teleport"
"#,
    );

    let workflow = load_and_validate(file.path()).unwrap();
    match assemble(&workflow, &TaskRegistry::with_builtins()) {
        Err(DagflowError::UnsupportedTaskType { id, kind }) => {
            assert_eq!(id, "a");
            assert_eq!(kind, "Teleport");
        }
        other => panic!("expected UnsupportedTaskType, got {other:?}"),
    }
}

#[test]
fn missing_parameter_names_task_and_parameter() {
    let registry = TaskRegistry::with_builtins();
    let desc = TaskDescriptor::new("c", "Const").param("key", "k");

    let err = registry.create(&desc).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("task 'c'"), "{msg}");
    assert!(msg.contains("parameter 'value'"), "{msg}");
}

#[test]
fn shell_descriptor_parses_script_and_filters() {
    let registry = TaskRegistry::with_builtins();

    let mut arg = toml::Table::new();
    arg.insert("value".into(), "{base_dir}/out.txt".into());
    arg.insert(
        "filters".into(),
        toml::Value::Array(vec!["abspath".into(), "ensure_parent".into()]),
    );
    let desc = TaskDescriptor::new("sh", "Shell")
        .param("script_path", "./run.sh")
        .param(
            "args",
            toml::Value::Array(vec!["--fast".into(), toml::Value::Table(arg)]),
        )
        .param("out_key", "result")
        .param("out_value", "{base_dir}/out.txt")
        .param("check_exists", true);

    let task = registry.create(&desc).unwrap();
    assert_eq!(task.kind(), "Shell");
    assert_eq!(task.meta().outputs, vec!["result".to_string()]);

    let bad_filter = TaskDescriptor::new("sh", "Shell")
        .param("script_path", "./run.sh")
        .param(
            "args",
            toml::Value::Array(vec![toml::Value::Table({
                let mut t = toml::Table::new();
                t.insert("value".into(), "x".into());
                t.insert("filters".into(), toml::Value::Array(vec!["shrink".into()]));
                t
            })]),
        );
    let msg = registry.create(&bad_filter).unwrap_err().to_string();
    assert!(msg.contains("unknown filter: shrink"), "{msg}");

    let both = TaskDescriptor::new("sh", "Shell")
        .param("cmd", "true")
        .param("script_path", "./run.sh");
    assert!(registry.create(&both).is_err());

    let neither = TaskDescriptor::new("sh", "Shell");
    assert!(registry.create(&neither).is_err());
}

#[test]
fn custom_task_types_can_be_registered() {
    let mut registry = TaskRegistry::with_builtins();
    registry
        .register("Echo", |desc| {
            let value = desc.req_str("text")?;
            Ok(Arc::new(ConstTask::new(&desc.id, "echo", value)) as Arc<dyn Task>)
        })
        .unwrap();

    assert!(registry.contains("Echo"));
    assert_eq!(
        registry.kinds().collect::<Vec<_>>(),
        vec!["Add", "Const", "Echo", "Mul", "Shell"]
    );

    let task = registry
        .create(&TaskDescriptor::new("e", "Echo").param("text", "hi"))
        .unwrap();
    let ctx = TaskContext::with_defaults();
    assert!(task.run(&ctx).success);
    assert_eq!(ctx.get("echo"), "hi");

    let dup = registry.register("Const", |_desc| unreachable!());
    assert!(matches!(dup, Err(DagflowError::ConfigError(_))));
}
