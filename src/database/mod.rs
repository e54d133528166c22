//! Reader for the engine database export bundled in a sosreport.
//!
//! The pipeline runs once per report:
//! - [`archive`] unpacks the bundle and finds `restore.sql`
//! - [`locator`] maps each table to its `.dat` file
//! - [`schema`] picks the column layout for the product version
//! - [`parser`] turns rows into field maps
//! - [`linker`] resolves the foreign keys between entities
//!
//! Only a failure to unpack the bundle is fatal. A table without data file,
//! a version without layout, or a short row only empties that collection or
//! field.

pub mod archive;
pub mod linker;
pub mod locator;
pub mod model;
pub mod parser;
pub mod schema;

use std::path::Path;

use tracing::{info, warn};

pub use archive::{ArchiveError, Materialized};
pub use linker::Inventory;
pub use locator::{Directive, TableLocator};
pub use model::{Cluster, DataCenter, Entity, Host, HostDynamic, StorageDomain};
pub use schema::{EntityKind, Schema, VersionBand};

use crate::fs::{FileSystem, RealFs};

/// How one table fared during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableStatus {
    pub kind: EntityKind,
    /// Band of the layout used, `None` when the version had no layout.
    pub band: Option<VersionBand>,
    /// Export table name looked up in the dump script.
    pub table: Option<&'static str>,
    /// Data file name, `None` when the table was not found.
    pub data_file: Option<String>,
    pub rows: usize,
    /// Fields missing across all rows of the table.
    pub field_misses: usize,
}

impl TableStatus {
    fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            band: None,
            table: None,
            data_file: None,
            rows: 0,
            field_misses: 0,
        }
    }
}

/// The extracted, linked entities of one export.
#[derive(Debug)]
pub struct Database {
    pub version: String,
    pub inventory: Inventory,
    pub tables: Vec<TableStatus>,
    /// Every `COPY` directive of the dump script, for diagnostics.
    pub directives: Vec<Directive>,
}

impl Database {
    /// Unpacks `bundle` into a temporary directory and extracts it. The
    /// directory is removed before this returns.
    pub fn open(bundle: &Path, version: &str) -> Result<Database, ArchiveError> {
        let materialized = archive::materialize_temp(bundle)?;
        Database::from_export(&RealFs, materialized.dump_script(), version)
    }

    /// Unpacks `bundle` into `workdir`, which is left in place.
    pub fn open_in(bundle: &Path, workdir: &Path, version: &str) -> Result<Database, ArchiveError> {
        let materialized = archive::materialize(bundle, workdir)?;
        Database::from_export(&RealFs, materialized.dump_script(), version)
    }

    /// Extracts an already unpacked export.
    pub fn from_export<F: FileSystem>(
        fs: &F,
        dump_script: &Path,
        version: &str,
    ) -> Result<Database, ArchiveError> {
        let locator = TableLocator::load(fs, dump_script)?;
        let mut loader = Loader {
            fs,
            locator: &locator,
            version,
            tables: Vec::with_capacity(EntityKind::ALL.len()),
        };

        let data_centers: Vec<DataCenter> = loader.load();
        let clusters: Vec<Cluster> = loader.load();
        let hosts: Vec<Host> = loader.load();
        let host_dynamics: Vec<HostDynamic> = loader.load();
        let storage_domains: Vec<StorageDomain> = loader.load();
        let tables = loader.tables;

        let inventory = linker::link(
            data_centers,
            clusters,
            hosts,
            host_dynamics,
            storage_domains,
        );
        info!(
            data_centers = inventory.data_centers.len(),
            clusters = inventory.clusters.len(),
            hosts = inventory.hosts.len(),
            storage_domains = inventory.storage_domains.len(),
            "database extracted"
        );

        Ok(Database {
            version: version.to_string(),
            inventory,
            tables,
            directives: locator.directives().to_vec(),
        })
    }

    pub fn table(&self, kind: EntityKind) -> Option<&TableStatus> {
        self.tables.iter().find(|t| t.kind == kind)
    }
}

struct Loader<'a, F: FileSystem> {
    fs: &'a F,
    locator: &'a TableLocator,
    version: &'a str,
    tables: Vec<TableStatus>,
}

impl<F: FileSystem> Loader<'_, F> {
    fn load<T: Entity>(&mut self) -> Vec<T> {
        let kind = T::KIND;
        let mut status = TableStatus::new(kind);

        let entities = match Schema::resolve(kind, self.version) {
            Ok(schema) => {
                status.band = Some(schema.band());
                let table = kind.export_table(schema.band());
                status.table = Some(table);

                match self.locator.locate(kind, table) {
                    Some(path) => {
                        status.data_file = path
                            .file_name()
                            .map(|name| name.to_string_lossy().into_owned());
                        let rows = parser::parse_file(self.fs, &path, &schema);
                        status.rows = rows.len();
                        status.field_misses = rows.iter().map(parser::ParsedRow::misses).sum();
                        rows.into_iter().map(T::from_row).collect()
                    }
                    None => Vec::new(),
                }
            }
            Err(e) => {
                warn!(%kind, error = %e, "skipping table");
                Vec::new()
            }
        };

        self.tables.push(status);
        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::{MockFs, ids};
    use crate::database::model::DataCenterStatus;

    fn open(fs: &MockFs, version: &str) -> Database {
        Database::from_export(fs, Path::new("/export/restore.sql"), version).unwrap()
    }

    #[test]
    fn test_extract_3_6_export() {
        let fs = MockFs::engine_export_3_6();
        let db = open(&fs, "3.6.9.2-0.1.el6");
        let inv = &db.inventory;

        assert_eq!(inv.data_centers.len(), 2);
        assert_eq!(inv.clusters.len(), 1);
        assert_eq!(inv.hosts.len(), 2);
        assert_eq!(inv.storage_domains.len(), 3);

        let dc = &inv.data_centers[0];
        assert_eq!(dc.name.as_deref(), Some("Default"));
        assert_eq!(dc.status, Some(DataCenterStatus::Up));
        assert_eq!(dc.spm, "hyper1");

        assert_eq!(inv.clusters[0].datacenter, "Default");
        assert_eq!(inv.clusters[0].compat_version.as_deref(), Some("3.6"));

        let host = &inv.hosts[0];
        assert_eq!(host.id.as_deref(), Some(ids::HOST_1));
        assert_eq!(host.cluster, "Production");
        assert_eq!(host.os.as_deref(), Some("RHEL - 7.2 - 9.el7"));
        assert_eq!(host.vdsm_version.as_deref(), Some("4.17.35"));
    }

    #[test]
    fn test_extract_4_0_export_uses_cluster_table() {
        let fs = MockFs::engine_export_4_0();
        let db = open(&fs, "4.0.7.4");

        let clusters = db.table(EntityKind::Cluster).unwrap();
        assert_eq!(clusters.table, Some("cluster"));
        assert_eq!(clusters.band, Some(VersionBand::V4_0));
        assert_eq!(db.inventory.clusters[0].datacenter, "Default");
        assert_eq!(db.inventory.hosts[0].cluster, "Production");
    }

    #[test]
    fn test_missing_table_yields_empty_collection() {
        let fs = MockFs::engine_export_without_storage();
        let db = open(&fs, "3.6");

        assert!(db.inventory.storage_domains.is_empty());
        let status = db.table(EntityKind::StorageDomain).unwrap();
        assert_eq!(status.data_file, None);
        assert_eq!(status.rows, 0);
        // The rest of the export is still read.
        assert_eq!(db.inventory.hosts.len(), 2);
    }

    #[test]
    fn test_unresolvable_version_degrades_every_table() {
        let fs = MockFs::engine_export_3_6();
        let db = open(&fs, "not-a-version");

        assert!(db.inventory.is_empty());
        assert!(db.tables.iter().all(|t| t.band.is_none() && t.rows == 0));
    }

    #[test]
    fn test_old_version_only_loses_dynamic_fields() {
        let fs = MockFs::engine_export_3_6();
        let db = open(&fs, "3.0");

        assert_eq!(db.table(EntityKind::HostDynamic).unwrap().band, None);
        assert_eq!(db.inventory.hosts.len(), 2);
        assert_eq!(db.inventory.hosts[0].os, None);
    }

    #[test]
    fn test_table_status_reports_rows_and_misses() {
        let fs = MockFs::engine_export_3_6();
        let db = open(&fs, "3.6");

        assert_eq!(db.tables.len(), EntityKind::ALL.len());
        let hosts = db.table(EntityKind::Host).unwrap();
        assert_eq!(hosts.rows, 2);
        assert_eq!(hosts.data_file.as_deref(), Some("3041.dat"));

        // The second data center row is truncated after its name.
        let dcs = db.table(EntityKind::DataCenter).unwrap();
        assert_eq!(dcs.field_misses, 3);
    }

    #[test]
    fn test_directives_kept_for_diagnostics() {
        let fs = MockFs::engine_export_4_0();
        let db = open(&fs, "4.0");

        let tables: Vec<&str> = db.directives.iter().map(|d| d.table.as_str()).collect();
        assert_eq!(
            tables,
            ["storage_pool", "cluster", "vds_static", "vds_dynamic", "storage_domain_static"]
        );
        assert_eq!(db.directives[1].data_file.as_deref(), Some("4101.dat"));
    }

    #[test]
    fn test_missing_dump_script_is_fatal() {
        let fs = MockFs::new();
        let err = Database::from_export(&fs, Path::new("/export/restore.sql"), "3.6").unwrap_err();
        assert!(matches!(err, ArchiveError::Io(_)));
    }
}
