//! Foreign-key resolution between the parsed entity collections.
//!
//! Each pass is a full nested scan in input order, so when ids repeat the
//! last match wins. Absent or empty ids never match, and an unmatched key
//! leaves the resolved field empty.

use serde::Serialize;

use super::model::{Cluster, DataCenter, Entity, Host, HostDynamic, StorageDomain};

/// The linked entity graph handed to the display layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub data_centers: Vec<DataCenter>,
    pub clusters: Vec<Cluster>,
    pub hosts: Vec<Host>,
    pub storage_domains: Vec<StorageDomain>,
}

impl Inventory {
    /// Re-runs the join passes. Running it on linked data changes nothing.
    pub fn relink(&mut self) {
        resolve_spm(&mut self.data_centers, &self.hosts);
        resolve_data_centers(&mut self.clusters, &self.data_centers);
        resolve_clusters(&mut self.hosts, &self.clusters);
    }

    pub fn is_empty(&self) -> bool {
        self.data_centers.is_empty()
            && self.clusters.is_empty()
            && self.hosts.is_empty()
            && self.storage_domains.is_empty()
    }
}

/// Links the collections and folds the dynamic host records into their hosts.
pub fn link(
    data_centers: Vec<DataCenter>,
    clusters: Vec<Cluster>,
    hosts: Vec<Host>,
    host_dynamics: Vec<HostDynamic>,
    storage_domains: Vec<StorageDomain>,
) -> Inventory {
    let mut inventory = Inventory {
        data_centers,
        clusters,
        hosts,
        storage_domains,
    };
    inventory.relink();
    merge_dynamics(&mut inventory.hosts, host_dynamics);
    inventory
}

fn same_id(a: Option<&str>, b: Option<&str>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if !a.is_empty() && a == b)
}

/// Names each data center's SPM host.
pub fn resolve_spm(data_centers: &mut [DataCenter], hosts: &[Host]) {
    for dc in data_centers.iter_mut() {
        for host in hosts {
            if same_id(host.id(), dc.spm_id.as_deref()) {
                dc.spm = host.name.clone().unwrap_or_default();
            }
        }
    }
}

/// Names each cluster's data center.
pub fn resolve_data_centers(clusters: &mut [Cluster], data_centers: &[DataCenter]) {
    for cluster in clusters.iter_mut() {
        for dc in data_centers {
            if same_id(cluster.dc_id.as_deref(), dc.id()) {
                cluster.datacenter = dc.name.clone().unwrap_or_default();
            }
        }
    }
}

/// Names each host's cluster.
pub fn resolve_clusters(hosts: &mut [Host], clusters: &[Cluster]) {
    for host in hosts.iter_mut() {
        for cluster in clusters {
            if same_id(cluster.id(), host.cluster_id.as_deref()) {
                host.cluster = cluster.name.clone().unwrap_or_default();
            }
        }
    }
}

/// Consumes the dynamic records, merging each into every host sharing its id.
pub fn merge_dynamics(hosts: &mut [Host], host_dynamics: Vec<HostDynamic>) {
    for dynamic in host_dynamics {
        let Some(id) = dynamic.id().map(str::to_string) else {
            continue;
        };
        let mut targets = hosts
            .iter_mut()
            .filter(|host| same_id(host.id(), Some(id.as_str())))
            .peekable();

        while let Some(host) = targets.next() {
            if targets.peek().is_some() {
                host.absorb(dynamic.clone());
            } else {
                host.absorb(dynamic);
                break;
            }
        }
    }
}
