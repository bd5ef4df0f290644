//! Analysis pipeline: requests, the per-request planner and the three analyses
//!
//! Every call reloads the inventory, scopes it with the analysis policy,
//! builds the pool index once and runs the analysis to completion. Nothing
//! is cached between calls.

pub mod aggregate;
pub mod footprint;
pub mod migration;
pub mod scale_down;

#[cfg(test)]
mod tests;

pub use aggregate::{sort_and_aggregate, DetailRow, SummaryRow};
pub use footprint::{
    migratable_report, DeploymentStatus, FootprintRecord, FootprintReport, FootprintStats,
    TargetSnapshot,
};
pub use migration::{
    analyze_migration, find_dual_pool, MigrationOutcome, MigrationReport, MigrationStats,
    NO_DUAL_POOL_MATCH,
};
pub use scale_down::{
    recommend_scale_down, ScaleDownRecord, ScaleDownReport, ScaleDownStats, LARGE_SLACK_CORES,
};

use crate::classifier::PoolIndex;
use crate::error::{PlannerError, Result};
use crate::loader::InventorySource;
use crate::models::{InventoryTable, PoolKey};
use crate::observability::{PlannerMetrics, StructuredLogger};
use crate::policy::{Facilities, ScopePolicy, DUAL_POOL, FOOTPRINT, SCALE_DOWN};
use serde::{Deserialize, Serialize};
use std::time::Instant;

fn required(value: &str, name: &'static str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PlannerError::MissingParameter(name));
    }
    Ok(trimmed.to_string())
}

/// Parameters of a dual-pool migration search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationRequest {
    #[serde(default)]
    pub facilities: Facilities,
    pub pool_a: String,
    pub pool_b: String,
}

impl MigrationRequest {
    /// Parse both pool strings; runs before the inventory is touched
    pub fn validate(&self) -> Result<(PoolKey, PoolKey)> {
        let pool_a = PoolKey::parse(&required(&self.pool_a, "pool1")?)?;
        let pool_b = PoolKey::parse(&required(&self.pool_b, "pool2")?)?;
        Ok((pool_a, pool_b))
    }
}

/// Parameters of a scale-down recommendation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScaleDownRequest {
    pub idc: String,
    pub pool: String,
    #[serde(default)]
    pub min_save_cores: i64,
}

impl ScaleDownRequest {
    pub fn validate(&self) -> Result<(String, PoolKey)> {
        let idc = required(&self.idc, "idc")?;
        let pool = PoolKey::parse(&required(&self.pool, "pool")?)?;
        Ok((idc, pool))
    }
}

/// Parameters of a footprint report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FootprintRequest {
    pub idc: String,
    /// `physical/iaas` or a bare physical cluster name
    pub pool: String,
}

impl FootprintRequest {
    pub fn validate(&self) -> Result<(String, String)> {
        Ok((required(&self.idc, "idc")?, required(&self.pool, "pool")?))
    }
}

/// Runs analyses against an inventory source, one full pipeline per call
pub struct Planner {
    source: Box<dyn InventorySource>,
    metrics: PlannerMetrics,
    logger: StructuredLogger,
}

impl Planner {
    pub fn new(source: Box<dyn InventorySource>) -> Self {
        let logger = StructuredLogger::new(source.describe());
        Self {
            source,
            metrics: PlannerMetrics::new(),
            logger,
        }
    }

    /// Load and scope the inventory for a policy
    fn scoped(&self, policy: &ScopePolicy, facilities: &Facilities) -> Result<InventoryTable> {
        let loaded = self.source.load()?;
        self.metrics.set_inventory_rows(loaded.len() as i64);
        loaded.require_columns(&policy.required_columns())?;
        Ok(policy.scope(&loaded, facilities))
    }

    fn observe<T, F, O>(&self, policy: &ScopePolicy, run: F, outcome: O) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
        O: FnOnce(&T) -> (&'static str, usize),
    {
        let started = Instant::now();
        let result = run();
        let elapsed = started.elapsed();
        self.metrics
            .observe_analysis_latency(policy.name, elapsed.as_secs_f64());

        match &result {
            Ok(value) => {
                let (label, results) = outcome(value);
                self.metrics.inc_analyses(policy.name, label);
                self.logger
                    .log_analysis_completed(policy.name, label, results, elapsed);
            }
            Err(err) => {
                self.metrics.inc_analyses(policy.name, "error");
                self.logger.log_analysis_failed(policy.name, err);
            }
        }
        result
    }

    /// Services deployed under both pools, for moving capacity from A to B
    pub fn migration(&self, request: &MigrationRequest) -> Result<MigrationOutcome> {
        let policy = DUAL_POOL;
        self.observe(
            &policy,
            || {
                let (pool_a, pool_b) = request.validate()?;
                let table = self.scoped(&policy, &request.facilities)?;
                let index = PoolIndex::build(&table);
                Ok(analyze_migration(&table, &index, &pool_a, &pool_b))
            },
            |outcome| match outcome {
                MigrationOutcome::Matches(report) => ("success", report.detail.len()),
                MigrationOutcome::NoMatches => ("empty", 0),
            },
        )
    }

    /// Clusters of one pool whose slack reaches `min_save_cores`
    pub fn scale_down(&self, request: &ScaleDownRequest) -> Result<ScaleDownReport> {
        let policy = SCALE_DOWN;
        self.observe(
            &policy,
            || {
                let (idc, pool) = request.validate()?;
                let table = self.scoped(&policy, &Facilities::from_names([idc.as_str()]))?;
                recommend_scale_down(&table, &policy, &idc, &pool, request.min_save_cores)
            },
            |report| outcome_label(report.records.len()),
        )
    }

    /// Footprint of the services living under one pool
    pub fn footprint(&self, request: &FootprintRequest) -> Result<FootprintReport> {
        let policy = FOOTPRINT;
        self.observe(
            &policy,
            || {
                let (idc, pool) = request.validate()?;
                let table = self.scoped(&policy, &Facilities::from_names([idc.as_str()]))?;
                let index = PoolIndex::build(&table);
                Ok(migratable_report(&table, &index, &idc, &pool))
            },
            |report| outcome_label(report.records.len()),
        )
    }
}

fn outcome_label(results: usize) -> (&'static str, usize) {
    if results == 0 {
        ("empty", 0)
    } else {
        ("success", results)
    }
}
