//! Typed entities built from parsed export rows.
//!
//! Enumerated columns are translated from their numeric code once, when the
//! entity is built. Codes outside the known tables are kept verbatim.

use std::fmt;

use serde::{Serialize, Serializer};

use super::parser::ParsedRow;
use super::schema::{EntityKind, field};

/// An entity that can be built from a row of its export table.
pub trait Entity: Sized {
    const KIND: EntityKind;

    fn from_row(row: ParsedRow) -> Self;

    fn id(&self) -> Option<&str>;

    /// Reads a field by its display key. Resolved link fields are included.
    fn field(&self, name: &str) -> Option<&str>;
}

// ============================================================
// Code tables
// ============================================================

/// Data center state, from `storage_pool.status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataCenterStatus {
    Uninitialized,
    Up,
    Maintenance,
    NotOperational,
    NonResponsive,
    Contending,
    Other(String),
}

impl DataCenterStatus {
    pub fn from_code(code: &str) -> Self {
        match code {
            "0" => DataCenterStatus::Uninitialized,
            "1" => DataCenterStatus::Up,
            "2" => DataCenterStatus::Maintenance,
            "3" => DataCenterStatus::NotOperational,
            "4" => DataCenterStatus::NonResponsive,
            "5" => DataCenterStatus::Contending,
            other => DataCenterStatus::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            DataCenterStatus::Uninitialized => "Uninitialized",
            DataCenterStatus::Up => "Up",
            DataCenterStatus::Maintenance => "Maintenance",
            DataCenterStatus::NotOperational => "Not Operational",
            DataCenterStatus::NonResponsive => "Non-Responsive",
            DataCenterStatus::Contending => "Contending",
            DataCenterStatus::Other(raw) => raw,
        }
    }
}

/// Backing storage technology, from `storage_domain_static.storage_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    Unknown,
    Nfs,
    Fibre,
    Iscsi,
    LocalFs,
    Cifs,
    PosixFs,
    Gluster,
    Glance,
    Other(String),
}

impl StorageType {
    pub fn from_code(code: &str) -> Self {
        match code {
            "0" => StorageType::Unknown,
            "1" => StorageType::Nfs,
            "2" => StorageType::Fibre,
            "3" => StorageType::Iscsi,
            "4" => StorageType::LocalFs,
            "5" => StorageType::Cifs,
            "6" => StorageType::PosixFs,
            "7" => StorageType::Gluster,
            "8" => StorageType::Glance,
            other => StorageType::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StorageType::Unknown => "Unknown",
            StorageType::Nfs => "NFS",
            StorageType::Fibre => "Fibre",
            StorageType::Iscsi => "iSCSI",
            StorageType::LocalFs => "Local FS",
            StorageType::Cifs => "CIFS",
            StorageType::PosixFs => "POSIXFS",
            StorageType::Gluster => "Gluster",
            StorageType::Glance => "Glance",
            StorageType::Other(raw) => raw,
        }
    }
}

/// Role of a storage domain, from `storage_domain_static.storage_domain_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageDomainType {
    DataMaster,
    Data,
    Iso,
    Export,
    Unknown,
    Other(String),
}

impl StorageDomainType {
    pub fn from_code(code: &str) -> Self {
        match code {
            "0" => StorageDomainType::DataMaster,
            "1" => StorageDomainType::Data,
            "2" => StorageDomainType::Iso,
            "3" => StorageDomainType::Export,
            "4" => StorageDomainType::Unknown,
            other => StorageDomainType::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StorageDomainType::DataMaster => "DataMaster",
            StorageDomainType::Data => "Data",
            StorageDomainType::Iso => "ISO",
            StorageDomainType::Export => "Export",
            StorageDomainType::Unknown => "Unknown",
            StorageDomainType::Other(raw) => raw,
        }
    }
}

macro_rules! label_impls {
    ($($ty:ty),*) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.label())
            }
        }
    )*};
}

label_impls!(DataCenterStatus, StorageType, StorageDomainType);

// ============================================================
// Entities
// ============================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataCenter {
    #[serde(rename = "uuid")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub status: Option<DataCenterStatus>,
    #[serde(rename = "compat")]
    pub compat_version: Option<String>,
    #[serde(rename = "spm_uuid")]
    pub spm_id: Option<String>,
    /// Name of the SPM host, filled in by the linker.
    pub spm: String,
}

impl Entity for DataCenter {
    const KIND: EntityKind = EntityKind::DataCenter;

    fn from_row(mut row: ParsedRow) -> Self {
        DataCenter {
            id: row.take(field::UUID),
            name: row.take(field::NAME),
            status: row.take(field::STATUS).map(|c| DataCenterStatus::from_code(&c)),
            compat_version: row.take(field::COMPAT),
            spm_id: row.take(field::SPM_UUID),
            spm: String::new(),
        }
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            field::UUID => self.id.as_deref(),
            field::NAME => self.name.as_deref(),
            field::STATUS => self.status.as_ref().map(DataCenterStatus::label),
            field::COMPAT => self.compat_version.as_deref(),
            field::SPM_UUID => self.spm_id.as_deref(),
            "spm" => Some(self.spm.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cluster {
    #[serde(rename = "uuid")]
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "dc_uuid")]
    pub dc_id: Option<String>,
    #[serde(rename = "compat")]
    pub compat_version: Option<String>,
    /// Name of the owning data center, filled in by the linker.
    pub datacenter: String,
}

impl Entity for Cluster {
    const KIND: EntityKind = EntityKind::Cluster;

    fn from_row(mut row: ParsedRow) -> Self {
        Cluster {
            id: row.take(field::UUID),
            name: row.take(field::NAME),
            dc_id: row.take(field::DC_UUID),
            compat_version: row.take(field::COMPAT),
            datacenter: String::new(),
        }
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            field::UUID => self.id.as_deref(),
            field::NAME => self.name.as_deref(),
            field::DC_UUID => self.dc_id.as_deref(),
            field::COMPAT => self.compat_version.as_deref(),
            "datacenter" => Some(self.datacenter.as_str()),
            _ => None,
        }
    }
}

/// Runtime details of a host from `vds_dynamic`, merged into [`Host`] by the
/// linker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostDynamic {
    pub id: Option<String>,
    pub os: Option<String>,
    pub kvm_version: Option<String>,
    pub spice_version: Option<String>,
    pub kernel_version: Option<String>,
    pub vdsm_version: Option<String>,
}

impl Entity for HostDynamic {
    const KIND: EntityKind = EntityKind::HostDynamic;

    fn from_row(mut row: ParsedRow) -> Self {
        HostDynamic {
            id: row.take(field::UUID),
            os: row.take(field::HOST_OS),
            kvm_version: row.take(field::KVM_VER),
            spice_version: row.take(field::SPICE_VER),
            kernel_version: row.take(field::KERNEL_VERSION),
            vdsm_version: row.take(field::VDSM_VERSION),
        }
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            field::UUID => self.id.as_deref(),
            field::HOST_OS => self.os.as_deref(),
            field::KVM_VER => self.kvm_version.as_deref(),
            field::SPICE_VER => self.spice_version.as_deref(),
            field::KERNEL_VERSION => self.kernel_version.as_deref(),
            field::VDSM_VERSION => self.vdsm_version.as_deref(),
            _ => None,
        }
    }
}

/// A hypervisor host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Host {
    #[serde(rename = "uuid")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub ip_addr: Option<String>,
    pub host_name: Option<String>,
    #[serde(rename = "host_cluster_uuid")]
    pub cluster_id: Option<String>,
    pub host_type: Option<String>,
    /// Name of the owning cluster, filled in by the linker.
    pub cluster: String,
    #[serde(rename = "host_os")]
    pub os: Option<String>,
    #[serde(rename = "kvm_ver")]
    pub kvm_version: Option<String>,
    #[serde(rename = "spice_ver")]
    pub spice_version: Option<String>,
    pub kernel_version: Option<String>,
    pub vdsm_version: Option<String>,
}

impl Host {
    /// Takes over the runtime fields `dynamic` carries. Fields absent from
    /// `dynamic` keep their current value.
    pub fn absorb(&mut self, dynamic: HostDynamic) {
        let HostDynamic {
            id: _,
            os,
            kvm_version,
            spice_version,
            kernel_version,
            vdsm_version,
        } = dynamic;

        if os.is_some() {
            self.os = os;
        }
        if kvm_version.is_some() {
            self.kvm_version = kvm_version;
        }
        if spice_version.is_some() {
            self.spice_version = spice_version;
        }
        if kernel_version.is_some() {
            self.kernel_version = kernel_version;
        }
        if vdsm_version.is_some() {
            self.vdsm_version = vdsm_version;
        }
    }
}

impl Entity for Host {
    const KIND: EntityKind = EntityKind::Host;

    fn from_row(mut row: ParsedRow) -> Self {
        Host {
            id: row.take(field::UUID),
            name: row.take(field::NAME),
            ip_addr: row.take(field::IP_ADDR),
            host_name: row.take(field::HOST_NAME),
            cluster_id: row.take(field::HOST_CLUSTER_UUID),
            host_type: row.take(field::HOST_TYPE),
            ..Host::default()
        }
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            field::UUID => self.id.as_deref(),
            field::NAME => self.name.as_deref(),
            field::IP_ADDR => self.ip_addr.as_deref(),
            field::HOST_NAME => self.host_name.as_deref(),
            field::HOST_CLUSTER_UUID => self.cluster_id.as_deref(),
            field::HOST_TYPE => self.host_type.as_deref(),
            "cluster" => Some(self.cluster.as_str()),
            field::HOST_OS => self.os.as_deref(),
            field::KVM_VER => self.kvm_version.as_deref(),
            field::SPICE_VER => self.spice_version.as_deref(),
            field::KERNEL_VERSION => self.kernel_version.as_deref(),
            field::VDSM_VERSION => self.vdsm_version.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StorageDomain {
    #[serde(rename = "uuid")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub storage_type: Option<StorageType>,
    #[serde(rename = "storage_domain_type")]
    pub domain_type: Option<StorageDomainType>,
    /// Owning data center. The export has no join key for it, so it stays
    /// empty.
    #[serde(rename = "dc_uuid")]
    pub dc_id: String,
}

impl Entity for StorageDomain {
    const KIND: EntityKind = EntityKind::StorageDomain;

    fn from_row(mut row: ParsedRow) -> Self {
        StorageDomain {
            id: row.take(field::UUID),
            name: row.take(field::NAME),
            storage_type: row.take(field::STORAGE_TYPE).map(|c| StorageType::from_code(&c)),
            domain_type: row
                .take(field::STORAGE_DOMAIN_TYPE)
                .map(|c| StorageDomainType::from_code(&c)),
            dc_id: String::new(),
        }
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            field::UUID => self.id.as_deref(),
            field::NAME => self.name.as_deref(),
            field::STORAGE_TYPE => self.storage_type.as_ref().map(StorageType::label),
            field::STORAGE_DOMAIN_TYPE => self.domain_type.as_ref().map(StorageDomainType::label),
            field::DC_UUID => Some(self.dc_id.as_str()),
            _ => None,
        }
    }
}
