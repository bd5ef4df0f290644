//! Cross-pool footprint report for a single pool
//!
//! Lists every service deployed under the target physical cluster together
//! with the other pools it also lives in, which tells the operator whether
//! its instances can be shifted elsewhere.

use crate::classifier::PoolIndex;
use crate::models::{InventoryRow, InventoryTable, PoolSelector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Whether a service spans more than one physical cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentStatus {
    #[serde(rename = "多资源池")]
    MultiPool,
    #[serde(rename = "单资源池")]
    SinglePool,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::MultiPool => "多资源池",
            DeploymentStatus::SinglePool => "单资源池",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of the service's first row in the target pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSnapshot {
    pub instance_num: i64,
    pub cpu_limit: f64,
    pub mem_limit: f64,
    pub dept_level1: Option<String>,
    pub dept_level2: Option<String>,
    pub package: Option<String>,
    pub cluster_id: Option<String>,
}

impl From<&InventoryRow> for TargetSnapshot {
    fn from(row: &InventoryRow) -> Self {
        Self {
            instance_num: row.instance_num,
            cpu_limit: row.cpu_limit,
            mem_limit: row.mem_limit,
            dept_level1: row.dept_level1.clone(),
            dept_level2: row.dept_level2.clone(),
            package: row.package.clone(),
            cluster_id: row.cluster_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintRecord {
    pub psm: String,
    pub deployment_status: DeploymentStatus,
    /// `physical/iaas` of other physical clusters, first appearance order
    pub other_pools: Vec<String>,
    /// Raw number of rows outside the target physical cluster
    pub other_pool_cluster_count: usize,
    pub idc: String,
    pub pool: String,
    #[serde(flatten)]
    pub target: Option<TargetSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FootprintStats {
    pub total_psm: usize,
    pub migratable_psm: usize,
    pub available_pools: Vec<String>,
    pub total_clusters: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FootprintReport {
    pub records: Vec<FootprintRecord>,
    pub stats: FootprintStats,
}

impl FootprintStats {
    fn from_records(records: &[FootprintRecord]) -> Self {
        let available: BTreeSet<&str> = records
            .iter()
            .flat_map(|r| r.other_pools.iter().map(String::as_str))
            .collect();

        Self {
            total_psm: records.len(),
            migratable_psm: records
                .iter()
                .filter(|r| r.deployment_status == DeploymentStatus::MultiPool)
                .count(),
            available_pools: available.into_iter().map(str::to_string).collect(),
            total_clusters: records
                .iter()
                .map(|r| r.other_pool_cluster_count)
                .sum::<usize>()
                + records.len(),
        }
    }
}

fn footprint_record(
    psm: &str,
    rows: &[&InventoryRow],
    selector: &PoolSelector,
    idc: &str,
    pool: &str,
) -> FootprintRecord {
    // Rows arrive in table order, so the first target row has the lowest index
    let target = rows
        .iter()
        .find(|row| selector.matches(row))
        .map(|row| TargetSnapshot::from(*row));

    let others: Vec<&&InventoryRow> = rows
        .iter()
        .filter(|row| !selector.matches_physical(row))
        .collect();

    let mut other_pools: Vec<String> = Vec::new();
    for row in &others {
        let identifier = row.pool_key().identifier();
        if !other_pools.contains(&identifier) {
            other_pools.push(identifier);
        }
    }

    let deployment_status = if other_pools.is_empty() {
        DeploymentStatus::SinglePool
    } else {
        DeploymentStatus::MultiPool
    };

    FootprintRecord {
        psm: psm.to_string(),
        deployment_status,
        other_pools,
        other_pool_cluster_count: others.len(),
        idc: idc.to_string(),
        pool: pool.to_string(),
        target,
    }
}

/// Footprint of every service present under the target physical cluster.
///
/// `pool` may be a bare physical cluster name. Services are reported in the
/// order their first target-cluster row appears in `table`; an absent
/// target yields an empty report.
pub fn migratable_report(
    table: &InventoryTable,
    index: &PoolIndex,
    idc: &str,
    pool: &str,
) -> FootprintReport {
    let selector = PoolSelector::parse(pool);

    let mut targets: Vec<(usize, &str)> = index
        .services_on_physical(&selector.physical_cluster)
        .into_iter()
        .filter_map(|psm| {
            index
                .rows(table, psm)
                .find(|row| selector.matches_physical(row))
                .map(|row| (row.index, psm))
        })
        .collect();
    targets.sort_by_key(|(first_index, _)| *first_index);

    let records: Vec<FootprintRecord> = targets
        .into_iter()
        .map(|(_, psm)| {
            let rows: Vec<&InventoryRow> = index.rows(table, psm).collect();
            footprint_record(psm, &rows, &selector, idc, pool)
        })
        .collect();

    let stats = FootprintStats::from_records(&records);
    FootprintReport { records, stats }
}
