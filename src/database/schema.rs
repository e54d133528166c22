//! Column layouts of the exported engine tables, per product-version band.
//!
//! Each entity kind lists the bands it has a layout for. A product version is
//! mapped to a band by floor matching: the highest known band that is not
//! newer than the version. Versions newer than every known band use the
//! newest one; versions older than every known band have no layout.

use std::fmt;
use std::str::FromStr;

/// Field names used as keys in parsed rows and by the display layer.
pub mod field {
    pub const UUID: &str = "uuid";
    pub const NAME: &str = "name";
    pub const STATUS: &str = "status";
    pub const COMPAT: &str = "compat";
    pub const SPM_UUID: &str = "spm_uuid";
    pub const DC_UUID: &str = "dc_uuid";
    pub const IP_ADDR: &str = "ip_addr";
    pub const HOST_NAME: &str = "host_name";
    pub const HOST_CLUSTER_UUID: &str = "host_cluster_uuid";
    pub const HOST_TYPE: &str = "host_type";
    pub const STORAGE_TYPE: &str = "storage_type";
    pub const STORAGE_DOMAIN_TYPE: &str = "storage_domain_type";
    pub const HOST_OS: &str = "host_os";
    pub const KVM_VER: &str = "kvm_ver";
    pub const SPICE_VER: &str = "spice_ver";
    pub const KERNEL_VERSION: &str = "kernel_version";
    pub const VDSM_VERSION: &str = "vdsm_version";
}

use field::*;

/// Ordered mapping of field name to zero-based column index.
pub type FieldIndexMap = &'static [(&'static str, usize)];

// ============================================================
// VersionError
// ============================================================

/// A product version that no layout can be chosen for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    /// The string does not start with a `major[.minor]` number.
    Unparseable(String),
    /// The version is older than every band known for the entity kind.
    BelowKnownBands {
        kind: EntityKind,
        version: ProductVersion,
        lowest: VersionBand,
    },
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionError::Unparseable(s) => write!(f, "unparseable product version {:?}", s),
            VersionError::BelowKnownBands {
                kind,
                version,
                lowest,
            } => write!(
                f,
                "no {} layout for version {} (oldest known is {})",
                kind, version, lowest
            ),
        }
    }
}

impl std::error::Error for VersionError {}

// ============================================================
// ProductVersion
// ============================================================

/// The `major.minor` part of a product version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductVersion {
    pub major: u32,
    pub minor: u32,
}

impl ProductVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl FromStr for ProductVersion {
    type Err = VersionError;

    /// Reads the leading `major[.minor]` of strings such as `3.6.9.2-0.1.el6`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut parts = trimmed.split(|c: char| !c.is_ascii_digit());

        let major = parts
            .next()
            .filter(|p| !p.is_empty())
            .and_then(|p| p.parse().ok())
            .ok_or_else(|| VersionError::Unparseable(s.to_string()))?;

        // The minor only counts when it follows a literal '.'.
        let after_major = &trimmed[trimmed.find(|c: char| !c.is_ascii_digit()).unwrap_or(trimmed.len())..];
        let minor = match after_major.strip_prefix('.') {
            Some(rest) => {
                let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
                digits.parse().unwrap_or(0)
            }
            None => 0,
        };

        Ok(Self { major, minor })
    }
}

impl fmt::Display for ProductVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

// ============================================================
// VersionBand
// ============================================================

/// A product-version range sharing one column layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VersionBand {
    V3_0,
    V3_1,
    V3_2,
    V3_3,
    V3_4,
    V3_6,
    V4_0,
}

impl VersionBand {
    pub const ALL: [VersionBand; 7] = [
        VersionBand::V3_0,
        VersionBand::V3_1,
        VersionBand::V3_2,
        VersionBand::V3_3,
        VersionBand::V3_4,
        VersionBand::V3_6,
        VersionBand::V4_0,
    ];

    /// The first version the band applies to.
    pub const fn version(self) -> ProductVersion {
        match self {
            VersionBand::V3_0 => ProductVersion::new(3, 0),
            VersionBand::V3_1 => ProductVersion::new(3, 1),
            VersionBand::V3_2 => ProductVersion::new(3, 2),
            VersionBand::V3_3 => ProductVersion::new(3, 3),
            VersionBand::V3_4 => ProductVersion::new(3, 4),
            VersionBand::V3_6 => ProductVersion::new(3, 6),
            VersionBand::V4_0 => ProductVersion::new(4, 0),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            VersionBand::V3_0 => "3.0",
            VersionBand::V3_1 => "3.1",
            VersionBand::V3_2 => "3.2",
            VersionBand::V3_3 => "3.3",
            VersionBand::V3_4 => "3.4",
            VersionBand::V3_6 => "3.6",
            VersionBand::V4_0 => "4.0",
        }
    }

    pub fn latest() -> VersionBand {
        VersionBand::V4_0
    }

    /// Picks the highest band in `known` that is not newer than `version`.
    ///
    /// `known` must be sorted ascending. Returns `None` when `version` is
    /// older than every entry (or `known` is empty).
    pub fn floor(version: ProductVersion, known: &[VersionBand]) -> Option<VersionBand> {
        known
            .iter()
            .copied()
            .take_while(|band| band.version() <= version)
            .last()
    }
}

impl fmt::Display for VersionBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// EntityKind
// ============================================================

/// The engine tables the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    DataCenter,
    Cluster,
    Host,
    HostDynamic,
    StorageDomain,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::DataCenter,
        EntityKind::Cluster,
        EntityKind::Host,
        EntityKind::HostDynamic,
        EntityKind::StorageDomain,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            EntityKind::DataCenter => "data_centers",
            EntityKind::Cluster => "clusters",
            EntityKind::Host => "hosts",
            EntityKind::HostDynamic => "host_dynamic",
            EntityKind::StorageDomain => "storage_domains",
        }
    }

    /// Name of the exported table holding this entity's rows.
    ///
    /// Clusters moved from `vds_groups` to `cluster` in 4.0.
    pub const fn export_table(self, band: VersionBand) -> &'static str {
        match self {
            EntityKind::DataCenter => "storage_pool",
            EntityKind::Cluster => match band {
                VersionBand::V4_0 => "cluster",
                _ => "vds_groups",
            },
            EntityKind::Host => "vds_static",
            EntityKind::HostDynamic => "vds_dynamic",
            EntityKind::StorageDomain => "storage_domain_static",
        }
    }

    /// Bands with a known layout, ascending.
    pub fn known_bands(self) -> &'static [VersionBand] {
        match self {
            EntityKind::DataCenter | EntityKind::Host | EntityKind::StorageDomain => {
                &[VersionBand::V3_0]
            }
            EntityKind::Cluster => &[VersionBand::V3_0, VersionBand::V3_6, VersionBand::V4_0],
            EntityKind::HostDynamic => &[
                VersionBand::V3_1,
                VersionBand::V3_2,
                VersionBand::V3_3,
                VersionBand::V3_4,
            ],
        }
    }

    /// Fields the display layer reads for this kind.
    pub fn display_fields(self) -> &'static [&'static str] {
        match self {
            EntityKind::DataCenter => &[UUID, NAME, STATUS, COMPAT, SPM_UUID],
            EntityKind::Cluster => &[UUID, NAME, DC_UUID, COMPAT],
            EntityKind::Host => &[UUID, NAME, HOST_NAME, HOST_CLUSTER_UUID],
            EntityKind::HostDynamic => &[UUID, HOST_OS, KERNEL_VERSION],
            EntityKind::StorageDomain => &[UUID, NAME, STORAGE_TYPE],
        }
    }

    fn layout(self, band: VersionBand) -> Option<FieldIndexMap> {
        let layout: FieldIndexMap = match (self, band) {
            (EntityKind::DataCenter, VersionBand::V3_0) => {
                &[(UUID, 0), (NAME, 1), (STATUS, 5), (SPM_UUID, 7), (COMPAT, 8)]
            }
            (EntityKind::Host, VersionBand::V3_0) => &[
                (UUID, 0),
                (NAME, 1),
                (IP_ADDR, 2),
                (HOST_NAME, 4),
                (HOST_CLUSTER_UUID, 6),
                (HOST_TYPE, 8),
            ],
            (EntityKind::StorageDomain, VersionBand::V3_0) => &[
                (UUID, 0),
                (NAME, 2),
                (STORAGE_DOMAIN_TYPE, 3),
                (STORAGE_TYPE, 4),
            ],
            (EntityKind::Cluster, VersionBand::V3_0) => {
                &[(UUID, 0), (NAME, 1), (DC_UUID, 10), (COMPAT, 12)]
            }
            (EntityKind::Cluster, VersionBand::V3_6) => {
                &[(UUID, 0), (NAME, 1), (DC_UUID, 10), (COMPAT, 13)]
            }
            (EntityKind::Cluster, VersionBand::V4_0) => {
                &[(UUID, 0), (NAME, 1), (DC_UUID, 6), (COMPAT, 8)]
            }
            (EntityKind::HostDynamic, VersionBand::V3_1) => &[
                (UUID, 0),
                (HOST_OS, 27),
                (KVM_VER, 28),
                (SPICE_VER, 29),
                (KERNEL_VERSION, 30),
                (VDSM_VERSION, 39),
            ],
            (EntityKind::HostDynamic, VersionBand::V3_2) => &[
                (UUID, 0),
                (HOST_OS, 25),
                (KVM_VER, 26),
                (SPICE_VER, 27),
                (KERNEL_VERSION, 28),
                (VDSM_VERSION, 37),
            ],
            (EntityKind::HostDynamic, VersionBand::V3_3) => &[
                (UUID, 0),
                (HOST_OS, 26),
                (KVM_VER, 27),
                (SPICE_VER, 28),
                (KERNEL_VERSION, 29),
                (VDSM_VERSION, 38),
            ],
            (EntityKind::HostDynamic, VersionBand::V3_4) => &[
                (UUID, 0),
                (HOST_OS, 25),
                (KVM_VER, 26),
                (SPICE_VER, 27),
                (KERNEL_VERSION, 28),
                (VDSM_VERSION, 36),
            ],
            _ => return None,
        };
        Some(layout)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// Schema
// ============================================================

/// The layout used for one entity kind during one parse pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    kind: EntityKind,
    band: VersionBand,
    fields: FieldIndexMap,
}

impl Schema {
    /// Resolves the layout for `kind` at the given product version string.
    pub fn resolve(kind: EntityKind, version: &str) -> Result<Schema, VersionError> {
        let version: ProductVersion = version.parse()?;
        let known = kind.known_bands();
        let band = VersionBand::floor(version, known).ok_or(VersionError::BelowKnownBands {
            kind,
            version,
            lowest: known[0],
        })?;
        // Every entry of known_bands() has a layout.
        Schema::for_band(kind, band).ok_or(VersionError::BelowKnownBands {
            kind,
            version,
            lowest: known[0],
        })
    }

    /// Layout for an exact band, if `kind` defines one.
    pub fn for_band(kind: EntityKind, band: VersionBand) -> Option<Schema> {
        kind.layout(band).map(|fields| Schema { kind, band, fields })
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn band(&self) -> VersionBand {
        self.band
    }

    pub fn fields(&self) -> FieldIndexMap {
        self.fields
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, idx)| *idx)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// Whether extracted values have surrounding blanks removed.
    ///
    /// Only the dynamic host table pads its values.
    pub fn strips_blanks(&self) -> bool {
        self.kind == EntityKind::HostDynamic
    }
}
