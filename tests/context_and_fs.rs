// tests/context_and_fs.rs

mod common;
use crate::common::init_tracing;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use dagflow::context::TaskContext;
use dagflow::fs::mock::MockFileSystem;
use dagflow::fs::{FileSystem, RealFileSystem, normalize_lexically};
use dagflow::task::template::expand;
use tempfile::tempdir;

#[test]
fn missing_key_reads_as_empty_string() {
    let ctx = TaskContext::with_defaults();
    assert_eq!(ctx.get("nope"), "");
    assert_eq!(ctx.try_get("nope"), None);

    ctx.set("empty", "");
    assert_eq!(ctx.get("empty"), "");
    assert_eq!(ctx.try_get("empty"), Some(String::new()));
    assert!(ctx.contains("empty"));
}

#[test]
fn set_overwrites_and_snapshot_is_sorted() {
    let ctx = TaskContext::with_defaults();
    ctx.set("b", "1");
    ctx.set("a", "2");
    ctx.set("b", "3");

    let snap = ctx.snapshot();
    assert_eq!(snap.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(snap["b"], "3");
    assert_eq!(ctx.len(), 2);

    ctx.clear();
    assert!(ctx.is_empty());
}

#[test]
fn concurrent_writers_do_not_lose_keys() {
    init_tracing();

    let ctx = Arc::new(TaskContext::with_defaults());
    let writers: Vec<_> = (0..8)
        .map(|t| {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || {
                for i in 0..100 {
                    ctx.set(format!("t{t}-{i}"), i.to_string());
                }
            })
        })
        .collect();
    for w in writers {
        w.join().unwrap();
    }

    assert_eq!(ctx.len(), 800);
    assert_eq!(ctx.get("t7-99"), "99");
}

#[test]
fn template_leaves_shell_syntax_and_reports_unknowns() {
    let expanded = expand("{a}/${HOME}/{b}/{a}", |name| {
        (name == "a").then(|| "x".to_string())
    });
    assert_eq!(expanded.text, "x/${HOME}/{b}/x");
    assert_eq!(expanded.unresolved, vec!["b".to_string()]);
}

#[test]
fn lexical_normalisation() {
    assert_eq!(normalize_lexically(Path::new("a/./b/../c")), PathBuf::from("a/c"));
    assert_eq!(normalize_lexically(Path::new("../x")), PathBuf::from("../x"));
    assert_eq!(normalize_lexically(Path::new("/../x")), PathBuf::from("/x"));
    assert_eq!(normalize_lexically(Path::new("a/..")), PathBuf::from("."));
}

#[test]
fn path_helpers_have_lexical_defaults() {
    let fs = MockFileSystem::new();
    assert_eq!(fs.dirname(Path::new("a/b.txt")), PathBuf::from("a"));
    assert_eq!(fs.dirname(Path::new("b.txt")), PathBuf::from("."));
    assert_eq!(fs.basename(Path::new("a/b.txt")), "b.txt");
    assert_eq!(fs.join(Path::new("a"), Path::new("b")), PathBuf::from("a/b"));
    assert_eq!(
        fs.absolute(Path::new("x/../y")).unwrap(),
        PathBuf::from("/mock/y")
    );
}

#[test]
fn mock_filesystem_tracks_ancestors() {
    let fs = MockFileSystem::with_cwd("/work");
    fs.add_file("out/data/file.bin");

    assert!(fs.exists(Path::new("/work/out/data/file.bin")));
    assert!(fs.exists(Path::new("out/data")));
    assert!(!fs.exists(Path::new("out/other")));
    assert!(fs.ensure_dir(Path::new("")).is_err());
    assert!(fs.paths().contains(&PathBuf::from("/work/out")));
}

#[test]
fn real_filesystem_creates_directories() {
    let dir = tempdir().unwrap();
    let fs = RealFileSystem;

    let nested = dir.path().join("a/b/c");
    fs.ensure_dir(&nested).unwrap();
    assert!(fs.exists(&nested));

    let file = dir.path().join("x/y/out.txt");
    fs.ensure_parent_dir(&file).unwrap();
    assert!(fs.exists(&dir.path().join("x/y")));
    assert!(!fs.exists(&file));

    let abs = fs.absolute(Path::new("rel/../here")).unwrap();
    assert!(abs.is_absolute());
    assert!(abs.ends_with("here"));
}
