//! In-memory [`FileSystem`] for exercising the extractor without real files.

use crate::fs::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// Files and directories held in memory.
///
/// Parent directories are registered automatically when a file is added, so
/// `read_dir` and `is_dir` behave like a real tree.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: HashMap<PathBuf, String>,
    directories: HashSet<PathBuf>,
    /// Directories whose listing fails with `PermissionDenied`.
    denied: HashSet<PathBuf>,
}

impl MockFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content, creating its parent directories.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.files.insert(path, content.into());
    }

    /// Adds a directory and all of its ancestors.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let mut current = Some(path.as_ref());
        while let Some(dir) = current {
            if dir.as_os_str().is_empty() {
                break;
            }
            self.directories.insert(dir.to_path_buf());
            current = dir.parent();
        }
    }

    /// Adds an extracted database export: `restore.sql` plus one `.dat` file
    /// per `(file name, rows)` pair, all under `dir`.
    pub fn add_export(&mut self, dir: impl AsRef<Path>, restore_sql: &str, dat_files: &[(&str, &str)]) {
        let dir = dir.as_ref();
        self.add_file(dir.join("restore.sql"), restore_sql);
        for (name, rows) in dat_files {
            self.add_file(dir.join(name), *rows);
        }
    }

    /// Makes `read_dir` on `path` fail as an unreadable directory would.
    pub fn deny_read_dir(&mut self, path: impl AsRef<Path>) {
        self.denied.insert(path.as_ref().to_path_buf());
    }

    /// Number of files held.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {}", path.display()),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {}", path.display()),
            ));
        }
        if self.denied.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {}", path.display()),
            ));
        }

        let children = self
            .files
            .keys()
            .chain(self.directories.iter())
            .filter(|child| child.parent() == Some(path))
            .cloned()
            .collect();
        Ok(children)
    }
}
