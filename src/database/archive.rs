//! Unpacks a database export bundle and finds its dump script.
//!
//! Bundles are tar archives, optionally gzip- or zstd-compressed. The
//! compression is detected from the leading bytes, not from the file name.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, info};

use crate::fs::FileSystem;

/// File name of the dump script inside a bundle.
pub const DUMP_SCRIPT: &str = "restore.sql";

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const ZSTD_MAGIC: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];

/// Failure to produce an extracted export. Fatal for the whole extraction.
#[derive(Debug)]
pub enum ArchiveError {
    /// The bundle path does not exist.
    Missing(PathBuf),
    /// I/O error while reading the bundle or writing the extraction.
    Io(io::Error),
    /// The bundle is not a readable (compressed) tar archive.
    Unsupported(String),
    /// The archive unpacked but holds no dump script.
    NoDumpScript(PathBuf),
}

impl std::fmt::Display for ArchiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveError::Missing(path) => write!(f, "bundle not found: {}", path.display()),
            ArchiveError::Io(e) => write!(f, "I/O error: {}", e),
            ArchiveError::Unsupported(msg) => write!(f, "unsupported bundle: {}", msg),
            ArchiveError::NoDumpScript(dir) => {
                write!(f, "no {} found in {}", DUMP_SCRIPT, dir.display())
            }
        }
    }
}

impl std::error::Error for ArchiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArchiveError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ArchiveError {
    fn from(e: io::Error) -> Self {
        ArchiveError::Io(e)
    }
}

/// An unpacked bundle.
///
/// When the extraction lives in a temporary directory it is removed when
/// this value is dropped.
#[derive(Debug)]
pub struct Materialized {
    root: PathBuf,
    dump_script: PathBuf,
    _workdir: Option<TempDir>,
}

impl Materialized {
    /// Directory the bundle was unpacked into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the dump script and its data files.
    pub fn data_dir(&self) -> &Path {
        self.dump_script.parent().unwrap_or(&self.root)
    }

    pub fn dump_script(&self) -> &Path {
        &self.dump_script
    }
}

/// Unpacks `bundle` into `target`. The caller owns `target` and its cleanup.
pub fn materialize(bundle: &Path, target: &Path) -> Result<Materialized, ArchiveError> {
    unpack(bundle, target)?;
    let dump_script = find_dump_script(&crate::fs::RealFs, target)
        .ok_or_else(|| ArchiveError::NoDumpScript(target.to_path_buf()))?;
    info!(bundle = %bundle.display(), script = %dump_script.display(), "export unpacked");
    Ok(Materialized {
        root: target.to_path_buf(),
        dump_script,
        _workdir: None,
    })
}

/// Unpacks `bundle` into a fresh temporary directory.
pub fn materialize_temp(bundle: &Path) -> Result<Materialized, ArchiveError> {
    let workdir = tempfile::Builder::new().prefix("sosdb-").tempdir()?;
    let mut materialized = materialize(bundle, workdir.path())?;
    materialized._workdir = Some(workdir);
    Ok(materialized)
}

fn unpack(bundle: &Path, target: &Path) -> Result<(), ArchiveError> {
    if !bundle.exists() {
        return Err(ArchiveError::Missing(bundle.to_path_buf()));
    }
    let reader = open_bundle(bundle)?;
    std::fs::create_dir_all(target)?;

    // Reading a header fails on a non-tar input; writing an entry fails on
    // the target side.
    let unsupported = |e: io::Error| ArchiveError::Unsupported(format!("{}: {}", bundle.display(), e));
    let mut archive = tar::Archive::new(reader);
    for entry in archive.entries().map_err(unsupported)? {
        entry.map_err(unsupported)?.unpack_in(target)?;
    }
    Ok(())
}

fn open_bundle(bundle: &Path) -> Result<Box<dyn Read>, ArchiveError> {
    let mut reader = BufReader::new(File::open(bundle)?);
    let head = reader.fill_buf()?;

    if head.starts_with(GZIP_MAGIC) {
        debug!(bundle = %bundle.display(), "gzip-compressed bundle");
        Ok(Box::new(flate2::bufread::GzDecoder::new(reader)))
    } else if head.starts_with(ZSTD_MAGIC) {
        debug!(bundle = %bundle.display(), "zstd-compressed bundle");
        Ok(Box::new(zstd::stream::read::Decoder::with_buffer(reader)?))
    } else {
        Ok(Box::new(reader))
    }
}

/// Looks for the dump script at `root`, then one directory level below.
pub fn find_dump_script<F: FileSystem>(fs: &F, root: &Path) -> Option<PathBuf> {
    let direct = root.join(DUMP_SCRIPT);
    if fs.exists(&direct) && !fs.is_dir(&direct) {
        return Some(direct);
    }

    let mut children = fs.read_dir(root).ok()?;
    children.sort();
    children
        .into_iter()
        .filter(|child| fs.is_dir(child))
        .map(|dir| dir.join(DUMP_SCRIPT))
        .find(|candidate| fs.exists(candidate) && !fs.is_dir(candidate))
}
