// src/fs/mod.rs

//! Filesystem capability used by task bodies.
//!
//! The executor never touches the filesystem; tasks reach it through
//! `TaskContext::fs()` so tests can swap in [`mock::MockFileSystem`].

use std::fmt::Debug;
use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;

/// Abstract filesystem interface.
///
/// The pure path helpers have lexical default implementations; only the
/// methods that observe or change real state need a backend.
pub trait FileSystem: Send + Sync + Debug {
    fn exists(&self, path: &Path) -> bool;

    /// Make `path` absolute against the backend's working directory and
    /// normalise it.
    fn absolute(&self, path: &Path) -> Result<PathBuf>;

    /// Create `dir` and all missing parents.
    fn ensure_dir(&self, dir: &Path) -> Result<()>;

    /// Create the parent directory of `path`, if it has one.
    fn ensure_parent_dir(&self, path: &Path) -> Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self.ensure_dir(parent),
            _ => Ok(()),
        }
    }

    fn join(&self, base: &Path, rest: &Path) -> PathBuf {
        base.join(rest)
    }

    fn dirname(&self, path: &Path) -> PathBuf {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            Some(_) => PathBuf::from("."),
            None => path.to_path_buf(),
        }
    }

    fn basename(&self, path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn normalize(&self, path: &Path) -> PathBuf {
        normalize_lexically(path)
    }
}

/// Resolve `.` and `..` components without touching the disk.
///
/// Leading `..` on a relative path are kept; `..` above the root is dropped.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn absolute(&self, path: &Path) -> Result<PathBuf> {
        let abs = std::path::absolute(path)
            .with_context(|| format!("making {:?} absolute", path))?;
        Ok(normalize_lexically(&abs))
    }

    fn ensure_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).with_context(|| format!("creating dir {:?}", dir))
    }
}
