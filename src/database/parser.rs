//! Reader for the tab-separated `.dat` row files of a table export.
//!
//! Extraction is best effort at field granularity: a column a row cannot
//! supply is left out of that row and counted in [`ParsedRow::misses`], the
//! row itself is always kept.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::Lines;

use tracing::{debug, warn};

use super::schema::Schema;
use crate::fs::FileSystem;

/// Token the export writes for SQL `NULL`.
pub const NULL_SENTINEL: &str = "\\N";

/// Field values extracted from one row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRow {
    values: BTreeMap<&'static str, String>,
    misses: usize,
}

impl ParsedRow {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Moves a value out of the row.
    pub fn take(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    /// Number of schema fields this row could not supply.
    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rows of one file, produced lazily in file order.
pub struct Rows<'a> {
    lines: Lines<'a>,
    schema: Schema,
    line_no: usize,
}

impl Iterator for Rows<'_> {
    type Item = ParsedRow;

    fn next(&mut self) -> Option<ParsedRow> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            if !is_row(line) {
                continue;
            }
            let row = parse_row(line, &self.schema);
            if row.misses > 0 {
                debug!(
                    kind = %self.schema.kind(),
                    line = self.line_no,
                    misses = row.misses,
                    "row is shorter than its layout"
                );
            }
            return Some(row);
        }
        None
    }
}

/// Parses `content` with `schema`.
pub fn parse_rows<'a>(content: &'a str, schema: &Schema) -> Rows<'a> {
    Rows {
        lines: content.lines(),
        schema: *schema,
        line_no: 0,
    }
}

/// Reads and parses one data file.
///
/// An unreadable file yields no rows.
pub fn parse_file<F: FileSystem>(fs: &F, path: &Path, schema: &Schema) -> Vec<ParsedRow> {
    match fs.read_to_string(path) {
        Ok(content) => parse_rows(&content, schema).collect(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read data file");
            Vec::new()
        }
    }
}

/// A line holds a row when it is longer than two characters; this skips
/// blank lines and the `\.` end-of-data marker.
fn is_row(line: &str) -> bool {
    line.chars().count() > 2
}

fn parse_row(line: &str, schema: &Schema) -> ParsedRow {
    let columns: Vec<&str> = line.split('\t').collect();
    let mut row = ParsedRow::default();

    for &(name, idx) in schema.fields() {
        match columns.get(idx) {
            Some(raw) => {
                let value = if schema.strips_blanks() {
                    raw.trim_matches(' ')
                } else {
                    raw
                };
                let value = if value == NULL_SENTINEL { "" } else { value };
                row.values.insert(name, value.to_string());
            }
            None => row.misses += 1,
        }
    }

    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::schema::{EntityKind, field};
    use crate::fs::mock::MockFs;

    fn schema(kind: EntityKind) -> Schema {
        Schema::resolve(kind, "3.6").unwrap()
    }

    #[test]
    fn test_parse_data_center_row() {
        let content = "dc1\tDefault\tdesc\t1\t0\t1\t3\th1\t3.6\n\\.\n";
        let rows: Vec<_> = parse_rows(content, &schema(EntityKind::DataCenter)).collect();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.get(field::UUID), Some("dc1"));
        assert_eq!(row.get(field::NAME), Some("Default"));
        assert_eq!(row.get(field::STATUS), Some("1"));
        assert_eq!(row.get(field::SPM_UUID), Some("h1"));
        assert_eq!(row.get(field::COMPAT), Some("3.6"));
        assert_eq!(row.misses(), 0);
    }

    #[test]
    fn test_null_sentinel_becomes_empty() {
        let content = "dc1\tDefault\t\\N\t1\t0\t1\t3\t\\N\t3.6\n";
        let rows: Vec<_> = parse_rows(content, &schema(EntityKind::DataCenter)).collect();

        assert_eq!(rows[0].get(field::SPM_UUID), Some(""));
        assert!(rows[0].values.values().all(|v| v != NULL_SENTINEL));
    }

    #[test]
    fn test_short_row_keeps_available_fields() {
        let content = "dc1\tDefault\tdesc\n";
        let rows: Vec<_> = parse_rows(content, &schema(EntityKind::DataCenter)).collect();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(field::UUID), Some("dc1"));
        assert_eq!(rows[0].get(field::NAME), Some("Default"));
        assert_eq!(rows[0].get(field::STATUS), None);
        assert_eq!(rows[0].misses(), 3);
    }

    #[test]
    fn test_row_count_matches_non_blank_lines() {
        let content = "dc1\tA\n\nxy\n\\.\ndc2\tB\nnot-even-a-tab\n\n";
        let rows: Vec<_> = parse_rows(content, &schema(EntityKind::DataCenter)).collect();

        let expected = content.lines().filter(|l| l.chars().count() > 2).count();
        assert_eq!(rows.len(), expected);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].get(field::UUID), Some("not-even-a-tab"));
        assert_eq!(rows[2].get(field::NAME), None);
    }

    #[test]
    fn test_crlf_line_endings() {
        let content = "dc1\tDefault\td\t1\t0\t1\t3\th1\t3.6\r\n";
        let rows: Vec<_> = parse_rows(content, &schema(EntityKind::DataCenter)).collect();
        assert_eq!(rows[0].get(field::COMPAT), Some("3.6"));
    }

    #[test]
    fn test_blank_stripping_only_for_dynamic() {
        let mut cols = vec!["0"; 40];
        cols[0] = "h1";
        cols[25] = " RHEL - 6Server - 6.7.0.4.el6 ";
        cols[28] = "\\N";
        let line = cols.join("\t");

        let dynamic: Vec<_> = parse_rows(&line, &schema(EntityKind::HostDynamic)).collect();
        assert_eq!(
            dynamic[0].get(field::HOST_OS),
            Some("RHEL - 6Server - 6.7.0.4.el6")
        );
        assert_eq!(dynamic[0].get(field::KERNEL_VERSION), Some(""));

        let host_line = "h1\t  padded name  \t10.0.0.1";
        let hosts: Vec<_> = parse_rows(host_line, &schema(EntityKind::Host)).collect();
        assert_eq!(hosts[0].get(field::NAME), Some("  padded name  "));
    }

    #[test]
    fn test_padded_null_sentinel_in_dynamic() {
        let mut cols = vec!["0"; 40];
        cols[25] = " \\N ";
        let line = cols.join("\t");
        let rows: Vec<_> = parse_rows(&line, &schema(EntityKind::HostDynamic)).collect();
        assert_eq!(rows[0].get(field::HOST_OS), Some(""));
    }

    #[test]
    fn test_take_moves_value_out() {
        let mut row = parse_rows("dc1\tDefault", &schema(EntityKind::DataCenter))
            .next()
            .unwrap();
        assert_eq!(row.take(field::NAME), Some("Default".to_string()));
        assert_eq!(row.get(field::NAME), None);
        assert_eq!(row.len(), 1);
    }

    #[test]
    fn test_parse_file_missing_is_empty() {
        let fs = MockFs::new();
        let rows = parse_file(&fs, Path::new("/db/0000.dat"), &schema(EntityKind::Host));
        assert!(rows.is_empty());
    }

    #[test]
    fn test_parse_file_reads_through_fs() {
        let mut fs = MockFs::new();
        fs.add_file("/db/3041.dat", "h1\thostA\t10.0.0.1\n\\.\n\n");
        let rows = parse_file(&fs, Path::new("/db/3041.dat"), &schema(EntityKind::Host));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(field::NAME), Some("hostA"));
    }
}
