use std::io;
use std::path::{Path, PathBuf};

/// Read access to a directory tree.
///
/// Implemented by [`RealFs`] for on-disk reports and by
/// [`MockFs`](super::mock::MockFs) for tests.
pub trait FileSystem {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Returns `true` if `path` names an existing file or directory.
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` names an existing directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Lists the direct children of a directory, in no particular order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

impl<F: FileSystem + ?Sized> FileSystem for &F {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        (**self).read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        (**self).is_dir(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        (**self).read_dir(path)
    }
}

/// Filesystem backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        // Export files written by older engines are not guaranteed to be UTF-8.
        let bytes = std::fs::read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(path)? {
            paths.push(entry?.path());
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_fs_reads_written_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("installed-rpms");
        std::fs::write(&path, "vdsm-4.16.30-1.el7.x86_64\n").unwrap();

        let fs = RealFs::new();
        assert!(fs.exists(&path));
        assert!(!fs.is_dir(&path));
        assert!(fs.is_dir(dir.path()));
        assert_eq!(
            fs.read_to_string(&path).unwrap(),
            "vdsm-4.16.30-1.el7.x86_64\n"
        );
    }

    #[test]
    fn test_real_fs_lossy_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1234.dat");
        std::fs::write(&path, b"id\tcaf\xe9\n").unwrap();

        let content = RealFs::new().read_to_string(&path).unwrap();
        assert!(content.starts_with("id\tcaf"));
    }

    #[test]
    fn test_real_fs_read_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.dat"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let mut entries = RealFs::new().read_dir(dir.path()).unwrap();
        entries.sort();
        assert_eq!(
            entries,
            vec![dir.path().join("a.dat"), dir.path().join("sub")]
        );
    }

    #[test]
    fn test_real_fs_missing_path() {
        let fs = RealFs::new();
        assert!(!fs.exists(Path::new("/nonexistent/sosreport/12345")));
        assert!(fs.read_to_string(Path::new("/nonexistent/sosreport/12345")).is_err());
    }
}
