//! Low-utilization scale-down recommendations

use crate::error::{PlannerError, Result};
use crate::loader::parse_number;
use crate::models::{columns, InventoryRow, InventoryTable, PoolKey};
use crate::policy::{filter_by_pool, ScopePolicy, SlackPolicy};
use serde::{Deserialize, Serialize};

/// Clusters with more slack than this are counted separately in stats
pub const LARGE_SLACK_CORES: i64 = 10;

const UNKNOWN: &str = "未知";

/// One cluster recommended for scale-down
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleDownRecord {
    pub psm: String,
    pub cluster_id: String,
    pub package: String,
    pub cpu_limit: f64,
    pub mem_limit: f64,
    pub save_cores: i64,
    pub cpu_util_max_1days: String,
    pub cpu_util_max_7days: String,
    pub mem_util_max_7days: String,
    pub business_line: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleDownStats {
    pub total_save_cores: i64,
    pub cluster_count: usize,
    pub clusters_over_threshold: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScaleDownReport {
    pub records: Vec<ScaleDownRecord>,
    pub stats: ScaleDownStats,
}

/// Where `save_cores` comes from for the rows in scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlackSource {
    Column,
    LimitMinusRequest,
}

fn slack_source(table: &InventoryTable) -> Result<SlackSource> {
    if table.has_column(columns::SAVE_CORES) {
        Ok(SlackSource::Column)
    } else if table.has_column(columns::CPU_LIMIT) && table.has_column(columns::CPU_REQUEST) {
        Ok(SlackSource::LimitMinusRequest)
    } else {
        Err(PlannerError::MissingColumn(columns::SAVE_CORES.to_string()))
    }
}

/// Integer slack of a row; `None` drops the row
fn slack_cores(row: &InventoryRow, source: SlackSource, policy: SlackPolicy) -> Option<i64> {
    let value = match source {
        SlackSource::Column => row.save_cores.as_deref().and_then(parse_number),
        SlackSource::LimitMinusRequest => row.cpu_request.map(|request| row.cpu_limit - request),
    };

    match (value, policy) {
        (Some(value), _) => Some(value.trunc() as i64),
        (None, SlackPolicy::ZeroFill) => Some(0),
        (None, SlackPolicy::DropUnparseable) => None,
    }
}

/// `dept_level1/dept_level2` with slashes around level 2 stripped
fn business_line(row: &InventoryRow) -> String {
    format!(
        "{}/{}",
        row.dept_level1.as_deref().unwrap_or(""),
        row.dept_level2.as_deref().unwrap_or("").trim_matches('/')
    )
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

impl ScaleDownRecord {
    fn from_row(row: &InventoryRow, save_cores: i64) -> Self {
        Self {
            psm: non_empty(&row.psm).unwrap_or(UNKNOWN).to_string(),
            cluster_id: row
                .cluster_id
                .as_deref()
                .or_else(|| non_empty(&row.cluster_name))
                .unwrap_or(UNKNOWN)
                .to_string(),
            package: row.package.clone().unwrap_or_default(),
            cpu_limit: row.cpu_limit,
            mem_limit: row.mem_limit,
            save_cores,
            cpu_util_max_1days: row.cpu_util_max_1days.clone().unwrap_or_default(),
            cpu_util_max_7days: row.cpu_util_max_7days.clone().unwrap_or_default(),
            mem_util_max_7days: row.mem_util_max_7days.clone().unwrap_or_default(),
            business_line: business_line(row),
        }
    }
}

/// Recommend clusters of one pool in one facility for scale-down.
///
/// `table` must already be scoped to the facility. An empty pool scope is a
/// [`PlannerError::NoDataForScope`] failure, while a scope where nothing
/// reaches `min_save_cores` yields an empty report.
pub fn recommend_scale_down(
    table: &InventoryTable,
    policy: &ScopePolicy,
    idc: &str,
    pool: &PoolKey,
    min_save_cores: i64,
) -> Result<ScaleDownReport> {
    let in_pool = filter_by_pool(table, pool);
    policy.check_scope(in_pool.len(), idc, &pool.identifier())?;

    let source = slack_source(table)?;
    let slack = policy.slack.unwrap_or(SlackPolicy::DropUnparseable);

    let mut scored: Vec<(i64, &InventoryRow)> = in_pool
        .rows()
        .iter()
        .filter_map(|row| slack_cores(row, source, slack).map(|cores| (cores, row)))
        .filter(|(cores, _)| *cores >= min_save_cores)
        .collect();

    // Stable: equal slack keeps source order
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    let records: Vec<ScaleDownRecord> = scored
        .into_iter()
        .map(|(cores, row)| ScaleDownRecord::from_row(row, cores))
        .collect();

    let stats = ScaleDownStats {
        total_save_cores: records.iter().map(|r| r.save_cores).sum(),
        cluster_count: records.len(),
        clusters_over_threshold: records
            .iter()
            .filter(|r| r.save_cores > LARGE_SLACK_CORES)
            .count(),
    };

    Ok(ScaleDownReport { records, stats })
}
