//! Canned exports and report trees for tests.
//!
//! Rows are laid out column by column so each scenario matches the layouts
//! of the product version it stands for.

use super::filesystem::MockFs;

/// Entity ids used across the scenarios.
pub mod ids {
    pub const DC_DEFAULT: &str = "00000001-0001-0001-0001-000000000058";
    pub const DC_REMOTE: &str = "5849b030-626e-47cb-ad90-3ce782d831b3";
    pub const CLUSTER_1: &str = "00000002-0002-0002-0002-00000000017a";
    pub const HOST_1: &str = "d6d3b9a1-4b7e-4d3c-9d77-5f6a7c8e9f01";
    pub const HOST_2: &str = "0e5c2f7a-93b1-4a8e-b6c4-2d1f0a9b8c72";
    pub const SD_MASTER: &str = "a1b2c3d4-0000-4000-8000-000000000001";
    pub const SD_ISO: &str = "a1b2c3d4-0000-4000-8000-000000000002";
    pub const SD_EXPORT: &str = "a1b2c3d4-0000-4000-8000-000000000003";
}

/// Directory scenarios unpack their export into.
pub const EXPORT_DIR: &str = "/export";

/// Builds a tab-separated row of `width` columns, `\N` where not given.
fn row(width: usize, cells: &[(usize, &str)]) -> String {
    let mut columns = vec!["\\N"; width];
    for &(idx, value) in cells {
        columns[idx] = value;
    }
    columns.join("\t")
}

fn table(rows: &[String]) -> String {
    let mut out = rows.join("\n");
    out.push_str("\n\\.\n\n");
    out
}

fn restore_sql(tables: &[(&str, &str)]) -> String {
    let mut out = String::from(
        "--\n-- NOTE:\n--\n-- File paths need to be edited. Search for $$PATH$$ and\n\
         -- replace it with the path to the directory containing\n-- the extracted data files.\n--\n\
         SET statement_timeout = 0;\nSET client_encoding = 'UTF8';\n\n",
    );
    for (name, file) in tables {
        out.push_str(&format!(
            "COPY {} (id, name) FROM '$$PATH$$/{}';\n\n",
            name, file
        ));
    }
    out
}

fn data_centers() -> String {
    table(&[
        row(
            13,
            &[
                (0, ids::DC_DEFAULT),
                (1, "Default"),
                (2, "The default Data Center"),
                (5, "1"),
                (7, ids::HOST_1),
                (8, "3.6"),
            ],
        ),
        // Truncated row: only id and name survive.
        format!("{}\tRemote", ids::DC_REMOTE),
    ])
}

fn hosts() -> String {
    table(&[
        row(
            12,
            &[
                (0, ids::HOST_1),
                (1, "hyper1"),
                (2, "10.10.0.11"),
                (3, "54321"),
                (4, "hyper1.example.com"),
                (6, ids::CLUSTER_1),
                (8, "0"),
            ],
        ),
        row(
            12,
            &[
                (0, ids::HOST_2),
                (1, "hyper2"),
                (2, "10.10.0.12"),
                (3, "54321"),
                (4, "hyper2.example.com"),
                (6, ids::CLUSTER_1),
                (8, "0"),
            ],
        ),
    ])
}

fn host_dynamics() -> String {
    table(&[row(
        45,
        &[
            (0, ids::HOST_1),
            (25, " RHEL - 7.2 - 9.el7 "),
            (26, "2.3.0 - 31.el7_2.21"),
            (27, "0.12.4 - 19.el7"),
            (28, "3.10.0 - 327.36.3.el7.x86_64"),
            (36, "4.17.35"),
        ],
    )])
}

fn storage_domains() -> String {
    table(&[
        row(
            10,
            &[(0, ids::SD_MASTER), (2, "data_fc"), (3, "0"), (4, "2")],
        ),
        row(10, &[(0, ids::SD_ISO), (2, "iso"), (3, "2"), (4, "1")]),
        row(10, &[(0, ids::SD_EXPORT), (2, "export"), (3, "3"), (4, "1")]),
    ])
}

impl MockFs {
    /// Export of a 3.6 engine: two data centers (one truncated), one
    /// cluster, two hosts (one with runtime details), three storage domains.
    pub fn engine_export_3_6() -> Self {
        let clusters = table(&[row(
            20,
            &[
                (0, ids::CLUSTER_1),
                (1, "Production"),
                (10, ids::DC_DEFAULT),
                (13, "3.6"),
            ],
        )]);

        let mut fs = Self::new();
        fs.add_export(
            EXPORT_DIR,
            &restore_sql(&[
                ("storage_pool", "3039.dat"),
                ("vds_groups", "3040.dat"),
                ("vds_static", "3041.dat"),
                ("vds_dynamic", "3042.dat"),
                ("storage_domain_static", "3043.dat"),
            ]),
            &[
                ("3039.dat", data_centers().as_str()),
                ("3040.dat", clusters.as_str()),
                ("3041.dat", hosts().as_str()),
                ("3042.dat", host_dynamics().as_str()),
                ("3043.dat", storage_domains().as_str()),
            ],
        );
        fs
    }

    /// Export of a 4.0 engine, where clusters live in the `cluster` table.
    pub fn engine_export_4_0() -> Self {
        let clusters = table(&[row(
            16,
            &[
                (0, ids::CLUSTER_1),
                (1, "Production"),
                (6, ids::DC_DEFAULT),
                (8, "4.0"),
            ],
        )]);

        let mut fs = Self::new();
        fs.add_export(
            EXPORT_DIR,
            &restore_sql(&[
                ("public.storage_pool", "4100.dat"),
                ("public.cluster", "4101.dat"),
                ("public.vds_static", "4102.dat"),
                ("public.vds_dynamic", "4103.dat"),
                ("public.storage_domain_static", "4104.dat"),
            ]),
            &[
                ("4100.dat", data_centers().as_str()),
                ("4101.dat", clusters.as_str()),
                ("4102.dat", hosts().as_str()),
                ("4103.dat", host_dynamics().as_str()),
                ("4104.dat", storage_domains().as_str()),
            ],
        );
        fs
    }

    /// The 3.6 export with the storage domain directive removed.
    pub fn engine_export_without_storage() -> Self {
        let mut fs = Self::engine_export_3_6();
        fs.add_file(
            format!("{}/restore.sql", EXPORT_DIR),
            restore_sql(&[
                ("storage_pool", "3039.dat"),
                ("vds_groups", "3040.dat"),
                ("vds_static", "3041.dat"),
                ("vds_dynamic", "3042.dat"),
            ]),
        );
        fs
    }

    /// A manager sosreport with a 3.6 engine installed and its database
    /// export collected.
    pub fn manager_sosreport() -> Self {
        let mut fs = Self::new();
        fs.add_file(
            "/report/installed-rpms",
            "\
rhevm-backend-3.6.9.2-0.1.el6.noarch                        Mon Jan  9 10:00:00 2017
rhevm-3.6.9.2-0.1.el6.noarch                                Mon Jan  9 10:00:00 2017
postgresql-server-8.4.20-6.el6.x86_64                       Mon Jan  9 09:58:00 2017
",
        );
        fs.add_file("/report/sos_commands/logs/journal", "");
        fs.add_file(
            "/report/sos_commands/postgresql/sos_pgdump.tar",
            "binary placeholder",
        );
        fs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::FileSystem;
    use std::path::Path;

    #[test]
    fn test_row_fills_unset_columns() {
        assert_eq!(row(4, &[(1, "a"), (3, "b")]), "\\N\ta\t\\N\tb");
    }

    #[test]
    fn test_export_scenarios_are_complete() {
        let fs = MockFs::engine_export_3_6();
        assert_eq!(fs.file_count(), 6);
        assert!(fs.exists(Path::new("/export/3043.dat")));

        let script = MockFs::engine_export_without_storage()
            .read_to_string(Path::new("/export/restore.sql"))
            .unwrap();
        assert!(!script.contains("storage_domain_static"));
    }

    #[test]
    fn test_manager_sosreport_tree() {
        let fs = MockFs::manager_sosreport();
        assert!(fs.is_dir(Path::new("/report/sos_commands/postgresql")));
        let rpms = fs.read_to_string(Path::new("/report/installed-rpms")).unwrap();
        assert!(rpms.contains("rhevm-3.6.9.2"));
    }
}
