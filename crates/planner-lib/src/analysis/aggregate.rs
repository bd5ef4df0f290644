//! Shared ordering and grouped-sum aggregation for pool reports

use crate::models::{InventoryRow, PoolKey};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

/// Row-level detail of a service in one pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRow {
    pub psm: String,
    pub pool_identifier: String,
    pub package: Option<String>,
    pub physical_cluster: String,
    pub iaas_cluster: String,
    pub instance_num: i64,
    pub cpu_limit: f64,
    pub mem_limit: f64,
    pub cluster_name: String,
    pub dept_level1: Option<String>,
    pub dept_level2: Option<String>,
    pub host_type: Option<String>,
    pub idc: String,
}

impl DetailRow {
    /// Tag an inventory row with its pool identifier
    pub fn from_row(row: &InventoryRow) -> Self {
        Self {
            psm: row.psm.clone(),
            pool_identifier: row.pool_key().identifier(),
            package: row.package.clone(),
            physical_cluster: row.physical_cluster.clone(),
            iaas_cluster: row.iaas_cluster.clone(),
            instance_num: row.instance_num,
            cpu_limit: row.cpu_limit,
            mem_limit: row.mem_limit,
            cluster_name: row.cluster_name.clone(),
            dept_level1: row.dept_level1.clone(),
            dept_level2: row.dept_level2.clone(),
            host_type: row.host_type.clone(),
            idc: row.idc.clone(),
        }
    }
}

/// Grouped sums for one `(psm, pool_identifier[, package])`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub psm: String,
    pub pool_identifier: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub package: Option<String>,
    pub instance_num: i64,
    pub cpu_limit: f64,
    pub mem_limit: f64,
}

/// Whether `package` takes part in grouping: a table-wide decision,
/// true when at least one row carries a non-empty package
pub fn groups_by_package(detail: &[DetailRow]) -> bool {
    detail
        .iter()
        .any(|row| row.package.as_deref().map(|p| !p.is_empty()).unwrap_or(false))
}

/// Anchor-pool instance count per service.
///
/// Rows outside the anchor pool contribute nothing; when a service has
/// several anchor rows the last one in input order wins.
pub fn anchor_weights(detail: &[DetailRow], anchor: &PoolKey) -> HashMap<String, i64> {
    let anchor_id = anchor.identifier();
    let mut weights = HashMap::new();
    for row in detail.iter().filter(|row| row.pool_identifier == anchor_id) {
        weights.insert(row.psm.clone(), row.instance_num);
    }
    weights
}

fn weight_order(
    weights: &HashMap<String, i64>,
    a: (&str, &str),
    b: (&str, &str),
) -> Ordering {
    let weight = |psm: &str| weights.get(psm).copied().unwrap_or(0);
    weight(b.0)
        .cmp(&weight(a.0))
        .then_with(|| a.0.cmp(b.0))
        .then_with(|| a.1.cmp(b.1))
}

/// Order detail rows and build the grouped summary.
///
/// Both outputs are sorted by anchor weight descending, then psm and pool
/// identifier ascending. Sorting is stable, so ties keep input order.
pub fn sort_and_aggregate(
    mut detail: Vec<DetailRow>,
    anchor: &PoolKey,
) -> (Vec<DetailRow>, Vec<SummaryRow>) {
    let weights = anchor_weights(&detail, anchor);
    let include_package = groups_by_package(&detail);

    let mut groups: BTreeMap<(String, String, String), (i64, f64, f64)> = BTreeMap::new();
    for row in &detail {
        let package = if include_package {
            row.package.clone().unwrap_or_default()
        } else {
            String::new()
        };
        let sums = groups
            .entry((row.psm.clone(), row.pool_identifier.clone(), package))
            .or_insert((0, 0.0, 0.0));
        sums.0 += row.instance_num;
        sums.1 += row.cpu_limit;
        sums.2 += row.mem_limit;
    }

    let mut summary: Vec<SummaryRow> = groups
        .into_iter()
        .map(
            |((psm, pool_identifier, package), (instance_num, cpu_limit, mem_limit))| SummaryRow {
                psm,
                pool_identifier,
                package: include_package.then_some(package),
                instance_num,
                cpu_limit,
                mem_limit,
            },
        )
        .collect();

    detail.sort_by(|a, b| {
        weight_order(
            &weights,
            (a.psm.as_str(), a.pool_identifier.as_str()),
            (b.psm.as_str(), b.pool_identifier.as_str()),
        )
    });
    summary.sort_by(|a, b| {
        weight_order(
            &weights,
            (a.psm.as_str(), a.pool_identifier.as_str()),
            (b.psm.as_str(), b.pool_identifier.as_str()),
        )
    });

    (detail, summary)
}
