//! Report-tree glue: where the database export lives in a sosreport and
//! which engine version produced it.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::database::VersionBand;
use crate::fs::FileSystem;

/// Package list written at the report root.
pub const INSTALLED_RPMS: &str = "installed-rpms";

/// Engine packages, newest naming last.
pub const ENGINE_PACKAGES: &[&str] = &["rhevm", "ovirt-engine"];

const BUNDLE_PREFIX: &str = "sos_pgdump";
const BUNDLE_SUFFIXES: &[&str] = &[".tar", ".tar.gz", ".tgz", ".tar.zst"];
const MAX_DEPTH: usize = 6;
const ARCHES: &[&str] = &["noarch", "x86_64", "i686", "ppc64le", "s390x", "aarch64"];

#[derive(Debug)]
pub enum SosError {
    Io(io::Error),
    NotFound(String),
}

impl std::fmt::Display for SosError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SosError::Io(e) => write!(f, "I/O error: {}", e),
            SosError::NotFound(what) => write!(f, "not found: {}", what),
        }
    }
}

impl std::error::Error for SosError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SosError::Io(e) => Some(e),
            SosError::NotFound(_) => None,
        }
    }
}

impl From<io::Error> for SosError {
    fn from(e: io::Error) -> Self {
        SosError::Io(e)
    }
}

/// Finds the database export bundle (`sos_pgdump.tar*`) under `root`.
///
/// Candidates are compared by full path so the pick does not depend on
/// directory listing order. Only an unreadable `root` is an error;
/// unreadable directories below it are skipped.
pub fn find_database_bundle<F: FileSystem>(fs: &F, root: &Path) -> Result<PathBuf, SosError> {
    let entries = fs.read_dir(root)?;
    let mut found = Vec::new();
    collect_bundles(fs, entries, 0, &mut found);
    found.sort();
    debug!(candidates = found.len(), root = %root.display(), "database bundle search");

    found
        .into_iter()
        .next()
        .ok_or_else(|| SosError::NotFound(format!("{}* under {}", BUNDLE_PREFIX, root.display())))
}

fn collect_bundles<F: FileSystem>(
    fs: &F,
    entries: Vec<PathBuf>,
    depth: usize,
    found: &mut Vec<PathBuf>,
) {
    for entry in entries {
        if fs.is_dir(&entry) {
            if depth >= MAX_DEPTH {
                continue;
            }
            match fs.read_dir(&entry) {
                Ok(children) => collect_bundles(fs, children, depth + 1, found),
                Err(e) => warn!(path = %entry.display(), error = %e, "skipping unreadable directory"),
            }
        } else if is_bundle_name(&entry) {
            found.push(entry);
        }
    }
}

/// Bundle names the archive reader can open: plain, gzip or zstd tar.
fn is_bundle_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            name.starts_with(BUNDLE_PREFIX)
                && BUNDLE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
        })
}

/// Version-release of package `name` as listed in `installed-rpms`.
pub fn package_version<F: FileSystem>(fs: &F, root: &Path, name: &str) -> Result<String, SosError> {
    let content = fs.read_to_string(&root.join(INSTALLED_RPMS))?;
    content
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .filter_map(split_nvra)
        .find(|(package, _)| *package == name)
        .map(|(_, version)| version.to_string())
        .ok_or_else(|| SosError::NotFound(format!("package {}", name)))
}

/// `rhevm-3.6.9.2-0.1.el6.noarch` → (`rhevm`, `3.6.9.2-0.1.el6`)
fn split_nvra(token: &str) -> Option<(&str, &str)> {
    let bytes = token.as_bytes();
    let idx = (0..bytes.len().saturating_sub(1))
        .find(|&i| bytes[i] == b'-' && bytes[i + 1].is_ascii_digit())?;
    let (name, rest) = (&token[..idx], &token[idx + 1..]);

    let version = match rest.rsplit_once('.') {
        Some((version, arch)) if ARCHES.contains(&arch) => version,
        _ => rest,
    };
    Some((name, version))
}

/// Version of the installed engine, trying each of [`ENGINE_PACKAGES`].
pub fn engine_version<F: FileSystem>(fs: &F, root: &Path) -> Result<String, SosError> {
    for &package in ENGINE_PACKAGES {
        match package_version(fs, root, package) {
            Ok(version) => {
                info!(package, version = %version, "engine version from package list");
                return Ok(version);
            }
            Err(SosError::NotFound(_)) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(SosError::NotFound(ENGINE_PACKAGES.join(" or ")))
}

/// What to open: the export bundle and the engine version it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub bundle: PathBuf,
    pub version: String,
}

/// Resolves a command-line path into a [`Source`].
///
/// A directory is treated as a report: the bundle is searched inside it and
/// the version read from its package list. Any other path is taken as the
/// bundle itself. `db_version` overrides the version in both cases; when no
/// version can be found the newest band is assumed.
pub fn resolve_source<F: FileSystem>(
    fs: &F,
    path: &Path,
    db_version: Option<&str>,
) -> Result<Source, SosError> {
    if !fs.is_dir(path) {
        return Ok(Source {
            bundle: path.to_path_buf(),
            version: db_version.map_or_else(assumed_version, str::to_string),
        });
    }

    let bundle = find_database_bundle(fs, path)?;
    let version = match db_version {
        Some(version) => version.to_string(),
        None => engine_version(fs, path).unwrap_or_else(|e| {
            debug!(error = %e, "no engine package in report");
            assumed_version()
        }),
    };
    Ok(Source { bundle, version })
}

fn assumed_version() -> String {
    let latest = VersionBand::latest();
    warn!(assumed = %latest, "engine version unknown, assuming the newest layouts");
    latest.as_str().to_string()
}
