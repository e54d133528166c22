//! End-to-end extraction from generated export bundles.

use std::io::Write;
use std::path::Path;

use sosdb::database::{ArchiveError, Database, EntityKind};
use sosdb::fs::RealFs;
use sosdb::render::{self, Section};
use sosdb::sos;

const RESTORE_SQL: &str = "\
SET client_encoding = 'UTF8';
COPY storage_pool (id, name, description, storage_pool_type, storage_pool_format_type, status, master_domain_version, spm_vds_id, compatibility_version) FROM '$$PATH$$/2874.dat';
COPY vds_groups (vds_group_id, name) FROM '$$PATH$$/2880.dat';
COPY vds_static (vds_id, vds_name, ip, vds_unique_id, host_name) FROM '$$PATH$$/2902.dat';
COPY vds_dynamic (vds_id, status) FROM '$$PATH$$/2901.dat';
COPY storage_domain_static (id, storage, storage_name) FROM '$$PATH$$/2890.dat';
";

fn columns(width: usize, cells: &[(usize, &str)]) -> String {
    let mut row = vec!["\\N"; width];
    for &(idx, value) in cells {
        row[idx] = value;
    }
    row.join("\t")
}

fn export_files() -> Vec<(String, String)> {
    let dcs = columns(
        9,
        &[(0, "dc-1"), (1, "Default"), (5, "1"), (7, "host-1"), (8, "3.3")],
    );
    let clusters = columns(13, &[(0, "cl-1"), (1, "Prod"), (10, "dc-1"), (12, "3.3")]);
    let hosts = [
        columns(9, &[(0, "host-1"), (1, "rhevh1"), (4, "rhevh1.lab"), (6, "cl-1")]),
        columns(9, &[(0, "host-2"), (1, "rhevh2"), (4, "rhevh2.lab"), (6, "cl-1")]),
    ]
    .join("\n");
    let dynamic = columns(
        40,
        &[(0, "host-2"), (26, "RHEV Hypervisor - 6.5"), (29, "2.6.32-431.el6.x86_64"), (38, "4.13.2")],
    );
    let domains = columns(5, &[(0, "sd-1"), (2, "master"), (3, "0"), (4, "3")]);

    vec![
        ("restore.sql".into(), RESTORE_SQL.into()),
        ("2874.dat".into(), format!("{}\n\\.\n", dcs)),
        ("2880.dat".into(), format!("{}\n\\.\n", clusters)),
        ("2902.dat".into(), format!("{}\n\\.\n", hosts)),
        ("2901.dat".into(), format!("{}\n\\.\n", dynamic)),
        ("2890.dat".into(), format!("{}\n\\.\n\n", domains)),
    ]
}

fn tar_gz(prefix: &str) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, content) in export_files() {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{}{}", prefix, name), content.as_bytes())
            .unwrap();
    }
    let tar = builder.into_inner().unwrap();

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&tar).unwrap();
    encoder.finish().unwrap()
}

fn write_bundle(dir: &Path, prefix: &str) -> std::path::PathBuf {
    let bundle = dir.join("sos_pgdump.tar.gz");
    std::fs::write(&bundle, tar_gz(prefix)).unwrap();
    bundle
}

#[test]
fn test_open_bundle_links_entities() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = write_bundle(dir.path(), "");

    let db = Database::open(&bundle, "3.3.2-0.50.el6ev").unwrap();
    let inv = &db.inventory;

    assert_eq!(inv.data_centers[0].spm, "rhevh1");
    assert_eq!(inv.clusters[0].datacenter, "Default");
    assert_eq!(inv.hosts.len(), 2);
    assert!(inv.hosts.iter().all(|h| h.cluster == "Prod"));

    assert_eq!(inv.hosts[0].os, None);
    assert_eq!(inv.hosts[1].os.as_deref(), Some("RHEV Hypervisor - 6.5"));
    assert_eq!(inv.hosts[1].vdsm_version.as_deref(), Some("4.13.2"));

    let sd = &inv.storage_domains[0];
    assert_eq!(sd.name.as_deref(), Some("master"));
    assert_eq!(sd.storage_type.as_ref().map(|t| t.label()), Some("iSCSI"));
}

#[test]
fn test_open_in_keeps_workdir() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = write_bundle(dir.path(), "dump/");
    let workdir = dir.path().join("work");

    let db = Database::open_in(&bundle, &workdir, "3.3").unwrap();
    assert_eq!(
        db.table(EntityKind::Host).unwrap().data_file.as_deref(),
        Some("2902.dat")
    );
    assert!(workdir.join("dump/restore.sql").exists());
}

#[test]
fn test_report_directory_flow() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("sosreport-manager-20170109");
    let pg = report.join("sos_commands/postgresql");
    std::fs::create_dir_all(&pg).unwrap();
    write_bundle(&pg, "");
    std::fs::write(
        report.join("installed-rpms"),
        "rhevm-3.3.2-0.50.el6ev.noarch     Thu Apr 10 12:00:00 2014\n",
    )
    .unwrap();

    let source = sos::resolve_source(&RealFs::new(), &report, None).unwrap();
    assert_eq!(source.bundle, pg.join("sos_pgdump.tar.gz"));
    assert_eq!(source.version, "3.3.2-0.50.el6ev");

    let db = Database::open(&source.bundle, &source.version).unwrap();
    let text = render::render_text(&db, &[Section::Hosts]);
    assert!(text.contains("Hosts (2)"));
    assert!(text.contains("rhevh2.lab"));
}

#[test]
fn test_report_with_unsupported_compression_uses_readable_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("report");
    let xz_dir = report.join("a");
    let gz_dir = report.join("b");
    std::fs::create_dir_all(&xz_dir).unwrap();
    std::fs::create_dir_all(&gz_dir).unwrap();
    std::fs::write(
        xz_dir.join("sos_pgdump.tar.xz"),
        [0xfd, b'7', b'z', b'X', b'Z', 0x00, 0x00, 0x04],
    )
    .unwrap();
    write_bundle(&gz_dir, "");

    let source = sos::resolve_source(&RealFs::new(), &report, Some("3.3")).unwrap();
    assert_eq!(source.bundle, gz_dir.join("sos_pgdump.tar.gz"));
    let db = Database::open(&source.bundle, &source.version).unwrap();
    assert_eq!(db.inventory.hosts.len(), 2);
}

#[test]
fn test_unreadable_bundle_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = dir.path().join("sos_pgdump.tar");
    std::fs::write(&bundle, "not an archive\n".repeat(100)).unwrap();

    let err = Database::open(&bundle, "3.6").unwrap_err();
    assert!(matches!(err, ArchiveError::Unsupported(_)));
}
