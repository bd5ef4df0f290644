//! Dual-pool migration candidates
//!
//! Finds services deployed under both pools, the lending pool A and the
//! receiving pool B, so instances can be moved from one to the other.

use super::aggregate::{groups_by_package, sort_and_aggregate, DetailRow, SummaryRow};
use crate::classifier::PoolIndex;
use crate::models::{InventoryTable, PoolKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Message reported when no service lives in both pools
pub const NO_DUAL_POOL_MATCH: &str = "没有找到同时部署在两个资源池的psm";

/// Statistics sheet of a migration report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStats {
    pub pool_a: String,
    pub pool_b: String,
    pub psm_count: usize,
}

/// Sorted detail and summary tables for a pool pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub pool_a: PoolKey,
    pub pool_b: PoolKey,
    pub detail: Vec<DetailRow>,
    pub summary: Vec<SummaryRow>,
    pub stats: MigrationStats,
    /// Whether `package` is part of the grouping and of the exported columns
    pub include_package: bool,
}

/// Result of a dual-pool search; no matches is not a failure
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationOutcome {
    NoMatches,
    Matches(MigrationReport),
}

impl MigrationOutcome {
    pub fn report(&self) -> Option<&MigrationReport> {
        match self {
            MigrationOutcome::Matches(report) => Some(report),
            MigrationOutcome::NoMatches => None,
        }
    }
}

/// Rows of services present in both pools, restricted to those two pools.
///
/// Qualification is set containment over the index: a service may also
/// live in other pools, but those rows are dropped. Output keeps table order.
pub fn find_dual_pool(
    table: &InventoryTable,
    index: &PoolIndex,
    pool_a: &PoolKey,
    pool_b: &PoolKey,
) -> Vec<DetailRow> {
    let qualifying: HashSet<&str> = index.services_in_both(pool_a, pool_b).into_iter().collect();

    table
        .rows()
        .iter()
        .filter(|row| qualifying.contains(row.psm.as_str()))
        .filter(|row| pool_a.matches(row) || pool_b.matches(row))
        .map(DetailRow::from_row)
        .collect()
}

/// Full migration analysis over an already scoped table
pub fn analyze_migration(
    table: &InventoryTable,
    index: &PoolIndex,
    pool_a: &PoolKey,
    pool_b: &PoolKey,
) -> MigrationOutcome {
    let rows = find_dual_pool(table, index, pool_a, pool_b);
    if rows.is_empty() {
        tracing::info!(pool_a = %pool_a, pool_b = %pool_b, "{}", NO_DUAL_POOL_MATCH);
        return MigrationOutcome::NoMatches;
    }

    let include_package = groups_by_package(&rows);
    let psm_count = rows
        .iter()
        .map(|row| row.psm.as_str())
        .collect::<HashSet<_>>()
        .len();

    let (detail, summary) = sort_and_aggregate(rows, pool_a);

    MigrationOutcome::Matches(MigrationReport {
        pool_a: pool_a.clone(),
        pool_b: pool_b.clone(),
        detail,
        summary,
        stats: MigrationStats {
            pool_a: pool_a.identifier(),
            pool_b: pool_b.identifier(),
            psm_count,
        },
        include_package,
    })
}
