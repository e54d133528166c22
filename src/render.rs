//! Text and JSON output for an extracted [`Database`].

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use crate::database::schema::field;
use crate::database::{Cluster, DataCenter, Database, Entity, Host, StorageDomain};

/// Output sections, selectable with `--section`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum Section {
    Datacenters,
    Clusters,
    Hosts,
    Storage,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Datacenters,
        Section::Clusters,
        Section::Hosts,
        Section::Storage,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Datacenters => "Data Centers",
            Section::Clusters => "Clusters",
            Section::Hosts => "Hosts",
            Section::Storage => "Storage Domains",
        }
    }
}

/// One column of a text table: header, field key, width.
type Column = (&'static str, &'static str, usize);

const DATA_CENTER_COLUMNS: &[Column] = &[
    ("NAME", field::NAME, 20),
    ("STATUS", field::STATUS, 16),
    ("COMPAT", field::COMPAT, 8),
    ("SPM", "spm", 20),
    ("UUID", field::UUID, 36),
];

const CLUSTER_COLUMNS: &[Column] = &[
    ("NAME", field::NAME, 20),
    ("DATA CENTER", "datacenter", 20),
    ("COMPAT", field::COMPAT, 8),
    ("UUID", field::UUID, 36),
];

const HOST_COLUMNS: &[Column] = &[
    ("NAME", field::NAME, 16),
    ("HOST NAME", field::HOST_NAME, 24),
    ("CLUSTER", "cluster", 16),
    ("OS", field::HOST_OS, 22),
    ("KERNEL", field::KERNEL_VERSION, 30),
    ("VDSM", field::VDSM_VERSION, 12),
    ("UUID", field::UUID, 36),
];

const STORAGE_COLUMNS: &[Column] = &[
    ("NAME", field::NAME, 20),
    ("TYPE", field::STORAGE_DOMAIN_TYPE, 12),
    ("STORAGE", field::STORAGE_TYPE, 10),
    ("UUID", field::UUID, 36),
];

/// Renders the selected sections as fixed-width text tables.
///
/// An empty `sections` slice selects all of them.
pub fn render_text(db: &Database, sections: &[Section]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Engine database (version {})", display_version(&db.version));

    let inv = &db.inventory;
    for section in selected(sections) {
        out.push('\n');
        match section {
            Section::Datacenters => table(&mut out, section, DATA_CENTER_COLUMNS, &inv.data_centers),
            Section::Clusters => table(&mut out, section, CLUSTER_COLUMNS, &inv.clusters),
            Section::Hosts => table(&mut out, section, HOST_COLUMNS, &inv.hosts),
            Section::Storage => table(&mut out, section, STORAGE_COLUMNS, &inv.storage_domains),
        }
    }
    out
}

fn display_version(version: &str) -> &str {
    if version.is_empty() { "unknown" } else { version }
}

fn selected(sections: &[Section]) -> Vec<Section> {
    if sections.is_empty() {
        return Section::ALL.to_vec();
    }
    let mut picked = sections.to_vec();
    picked.sort();
    picked.dedup();
    picked
}

fn table<T: Entity>(out: &mut String, section: Section, columns: &[Column], rows: &[T]) {
    let _ = writeln!(out, "{} ({})", section.title(), rows.len());
    if rows.is_empty() {
        out.push_str("  (no data available)\n");
        return;
    }

    let header = columns
        .iter()
        .map(|&(title, _, width)| format!("{:<width$}", title, width = width))
        .collect::<Vec<_>>()
        .join(" ");
    let _ = writeln!(out, "  {}", header.trim_end());

    for row in rows {
        let line = columns
            .iter()
            .map(|&(_, key, width)| cell(row.field(key).unwrap_or(""), width))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(out, "  {}", line.trim_end());
    }
}

/// Pads `value` to `width` characters. Longer values are cut and end in
/// `~` so the following columns stay in place.
fn cell(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return format!("{:<width$}", value, width = width);
    }
    let mut cut: String = value.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

// ============================================================
// JSON
// ============================================================

#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'a str,
    /// Layout band used per table, `null` when none applied.
    bands: BTreeMap<&'static str, Option<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_centers: Option<&'a [DataCenter]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clusters: Option<&'a [Cluster]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hosts: Option<&'a [Host]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage_domains: Option<&'a [StorageDomain]>,
}

/// Renders the selected sections as pretty-printed JSON.
pub fn render_json(db: &Database, sections: &[Section]) -> serde_json::Result<String> {
    let picked = selected(sections);
    let has = |s: Section| picked.contains(&s);
    let inv = &db.inventory;

    let report = JsonReport {
        version: &db.version,
        bands: db
            .tables
            .iter()
            .map(|t| (t.kind.as_str(), t.band.map(|b| b.as_str())))
            .collect(),
        data_centers: has(Section::Datacenters).then_some(inv.data_centers.as_slice()),
        clusters: has(Section::Clusters).then_some(inv.clusters.as_slice()),
        hosts: has(Section::Hosts).then_some(inv.hosts.as_slice()),
        storage_domains: has(Section::Storage).then_some(inv.storage_domains.as_slice()),
    };
    serde_json::to_string_pretty(&report)
}
