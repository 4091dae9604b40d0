// src/fs/mock.rs

use super::{FileSystem, normalize_lexically};
use anyhow::{Result, bail};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// In-memory filesystem for tests.
///
/// Only tracks which paths exist. Relative paths are resolved against a
/// fixed working directory (`/mock` unless overridden).
#[derive(Debug, Clone)]
pub struct MockFileSystem {
    cwd: PathBuf,
    entries: Arc<Mutex<BTreeSet<PathBuf>>>,
}

impl Default for MockFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::with_cwd("/mock")
    }

    pub fn with_cwd(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            entries: Arc::new(Mutex::new(BTreeSet::new())),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        normalize_lexically(&self.cwd.join(path))
    }

    /// Register a file (and implicitly all of its ancestors).
    pub fn add_file(&self, path: impl AsRef<Path>) {
        let path = self.resolve(path.as_ref());
        let mut entries = self.entries.lock().unwrap();
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                entries.insert(ancestor.to_path_buf());
            }
        }
    }

    /// Every known path, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries.lock().unwrap().iter().cloned().collect()
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let path = self.resolve(path);
        self.entries.lock().unwrap().contains(&path)
    }

    fn absolute(&self, path: &Path) -> Result<PathBuf> {
        Ok(self.resolve(path))
    }

    fn ensure_dir(&self, dir: &Path) -> Result<()> {
        if dir.as_os_str().is_empty() {
            bail!("cannot create a directory with an empty path");
        }
        self.add_file(dir);
        Ok(())
    }
}
