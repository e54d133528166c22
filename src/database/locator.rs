//! Finds the data file of each exported table by scanning `restore.sql`.
//!
//! The dump script lists one `COPY` directive per table:
//!
//! ```text
//! COPY storage_pool (id, name, description, ...) FROM '$$PATH$$/3039.dat';
//! ```

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::schema::EntityKind;
use crate::fs::FileSystem;

const DATA_FILE_EXTENSION: &str = ".dat";

/// One `COPY` directive of the dump script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub table: String,
    /// Data file name, when the directive names a `.dat` file.
    pub data_file: Option<String>,
}

/// Table → data file lookup over a parsed dump script.
#[derive(Debug, Clone)]
pub struct TableLocator {
    data_dir: PathBuf,
    directives: Vec<Directive>,
}

impl TableLocator {
    /// Reads the dump script; data files resolve next to it.
    pub fn load<F: FileSystem>(fs: &F, dump_script: &Path) -> io::Result<Self> {
        let script = fs.read_to_string(dump_script)?;
        let data_dir = dump_script
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(Self::from_script(&script, data_dir))
    }

    pub fn from_script(script: &str, data_dir: impl Into<PathBuf>) -> Self {
        let directives: Vec<Directive> = script.lines().filter_map(parse_directive).collect();
        debug!(directives = directives.len(), "scanned dump script");
        Self {
            data_dir: data_dir.into(),
            directives,
        }
    }

    /// Path of the data file holding `table`'s rows.
    ///
    /// The first directive naming `table` with a `.dat` destination wins. No
    /// match means the table has no data, which is not an error.
    pub fn locate(&self, kind: EntityKind, table: &str) -> Option<PathBuf> {
        let found = self
            .directives
            .iter()
            .filter(|d| d.table == table)
            .find_map(|d| d.data_file.as_deref());

        match found {
            Some(file) => {
                debug!(%kind, table, file, "located data file");
                Some(self.data_dir.join(file))
            }
            None => {
                warn!(%kind, table, "no data file for table");
                None
            }
        }
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

fn parse_directive(line: &str) -> Option<Directive> {
    let mut tokens = line.split_whitespace();
    if !tokens.next()?.eq_ignore_ascii_case("copy") {
        return None;
    }
    let table = table_name(tokens.next()?);
    let data_file = line.find("PATH").and_then(|idx| data_file_name(&line[idx..]));
    Some(Directive { table, data_file })
}

/// `public."vds_static"(id` → `vds_static`
fn table_name(token: &str) -> String {
    let token = token.split('(').next().unwrap_or(token);
    let token = token.strip_prefix("public.").unwrap_or(token);
    token.trim_matches('"').to_string()
}

/// `PATH$$/3039.dat';` → `3039.dat`
fn data_file_name(from_marker: &str) -> Option<String> {
    let (_, after) = from_marker.split_once('/')?;
    let end = after
        .find(|c: char| c == '\'' || c == ';' || c.is_whitespace())
        .unwrap_or(after.len());
    let name = after[..end].rsplit('/').next()?;
    name.ends_with(DATA_FILE_EXTENSION).then(|| name.to_string())
}
