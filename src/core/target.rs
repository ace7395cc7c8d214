//! Targets: file-existence predicates that decide whether a task is done.
//!
//! A target never inspects file contents. Completion means "the expected
//! paths are on disk", nothing more.

use std::path::{Path, PathBuf};

/// Output of a task.
pub trait Target {
    /// True when the task producing this target can be considered complete.
    fn exists(&self) -> bool;

    /// All paths this target covers.
    fn paths(&self) -> Vec<PathBuf>;

    /// Paths still absent. Empty when `exists()` is true.
    fn missing(&self) -> Vec<PathBuf> {
        self.paths().into_iter().filter(|p| !p.exists()).collect()
    }
}

/// A single local path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileTarget {
    path: PathBuf,
}

impl LocalFileTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Target for LocalFileTarget {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn paths(&self) -> Vec<PathBuf> {
        vec![self.path.clone()]
    }
}

/// A set of local files, complete only when every path is a regular file.
///
/// A directory sitting where a file is expected does not count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFilesTarget {
    paths: Vec<PathBuf>,
}

impl LocalFilesTarget {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Join each file name onto `dir`.
    pub fn in_dir(dir: &Path, filenames: &[&str]) -> Self {
        Self::new(filenames.iter().map(|name| dir.join(name)))
    }
}

impl Target for LocalFilesTarget {
    fn exists(&self) -> bool {
        self.paths.iter().all(|p| p.is_file())
    }

    fn paths(&self) -> Vec<PathBuf> {
        self.paths.clone()
    }

    fn missing(&self) -> Vec<PathBuf> {
        self.paths.iter().filter(|p| !p.is_file()).cloned().collect()
    }
}
