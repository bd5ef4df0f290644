//! Core data models for the capacity inventory

use crate::error::{PlannerError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Canonical production sub-cluster name
pub const DEFAULT_CLUSTER: &str = "default";

/// Column names understood by the loaders
pub mod columns {
    pub const PSM: &str = "psm";
    pub const PHYSICAL_CLUSTER: &str = "physical_cluster";
    pub const IAAS_CLUSTER: &str = "iaas_cluster";
    pub const CLUSTER_NAME: &str = "cluster_name";
    pub const IDC: &str = "idc";
    pub const INSTANCE_NUM: &str = "instance_num";
    pub const CPU_LIMIT: &str = "cpu_limit";
    pub const MEM_LIMIT: &str = "mem_limit";
    pub const CPU_REQUEST: &str = "cpu_request";
    pub const DEPT_LEVEL1: &str = "dept_level1";
    pub const DEPT_LEVEL2: &str = "dept_level2";
    pub const HOST_TYPE: &str = "host_type";
    pub const PACKAGE: &str = "package";
    pub const CLUSTER_ID: &str = "cluster_id";
    pub const CPU_UTIL_MAX_1DAYS: &str = "cpu_util_max_1days";
    pub const CPU_UTIL_MAX_7DAYS: &str = "cpu_util_max_7days";
    pub const MEM_UTIL_MAX_7DAYS: &str = "mem_util_max_7days";
    pub const SAVE_CORES: &str = "save_cores";

    /// Every column the inventory model carries
    pub const ALL: &[&str] = &[
        PSM,
        PHYSICAL_CLUSTER,
        IAAS_CLUSTER,
        CLUSTER_NAME,
        IDC,
        INSTANCE_NUM,
        CPU_LIMIT,
        MEM_LIMIT,
        CPU_REQUEST,
        DEPT_LEVEL1,
        DEPT_LEVEL2,
        HOST_TYPE,
        PACKAGE,
        CLUSTER_ID,
        CPU_UTIL_MAX_1DAYS,
        CPU_UTIL_MAX_7DAYS,
        MEM_UTIL_MAX_7DAYS,
        SAVE_CORES,
    ];
}

/// Resource pool identity: a physical cluster plus an IaaS cluster
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PoolKey {
    pub physical_cluster: String,
    pub iaas_cluster: String,
}

impl PoolKey {
    pub fn new(physical_cluster: impl Into<String>, iaas_cluster: impl Into<String>) -> Self {
        Self {
            physical_cluster: physical_cluster.into(),
            iaas_cluster: iaas_cluster.into(),
        }
    }

    /// Parse a `physical_cluster/iaas_cluster` string.
    ///
    /// Exactly one separator is accepted and both trimmed components must be
    /// non-empty; anything else is an [`PlannerError::InvalidPool`].
    pub fn parse(input: &str) -> Result<Self> {
        let mut parts = input.split('/');
        let (physical, iaas) = match (parts.next(), parts.next(), parts.next()) {
            (Some(physical), Some(iaas), None) => (physical.trim(), iaas.trim()),
            _ => return Err(PlannerError::InvalidPool(input.to_string())),
        };

        if physical.is_empty() || iaas.is_empty() {
            return Err(PlannerError::InvalidPool(input.to_string()));
        }

        Ok(Self::new(physical, iaas))
    }

    pub fn matches(&self, row: &InventoryRow) -> bool {
        row.physical_cluster == self.physical_cluster && row.iaas_cluster == self.iaas_cluster
    }

    /// The `physical/iaas` string used as `pool_identifier` in reports
    pub fn identifier(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.physical_cluster, self.iaas_cluster)
    }
}

/// Loose pool target used by the footprint report.
///
/// Falls back to a physical-cluster-only match when the input is not a
/// well-formed pool string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSelector {
    pub physical_cluster: String,
    pub iaas_cluster: Option<String>,
}

impl PoolSelector {
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let mut parts = trimmed.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(physical), Some(iaas), None) => {
                let iaas = iaas.trim();
                Self {
                    physical_cluster: physical.trim().to_string(),
                    iaas_cluster: (!iaas.is_empty()).then(|| iaas.to_string()),
                }
            }
            _ => Self {
                physical_cluster: trimmed.to_string(),
                iaas_cluster: None,
            },
        }
    }

    pub fn matches_physical(&self, row: &InventoryRow) -> bool {
        row.physical_cluster == self.physical_cluster
    }

    /// Physical match, narrowed by IaaS cluster when one was given
    pub fn matches(&self, row: &InventoryRow) -> bool {
        self.matches_physical(row)
            && self
                .iaas_cluster
                .as_deref()
                .map(|iaas| row.iaas_cluster == iaas)
                .unwrap_or(true)
    }
}

/// One instance-group record from the capacity inventory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryRow {
    /// Position in the source table, used as the deterministic tie-break
    pub index: usize,
    pub psm: String,
    pub physical_cluster: String,
    pub iaas_cluster: String,
    pub cluster_name: String,
    pub idc: String,
    pub instance_num: i64,
    pub cpu_limit: f64,
    pub mem_limit: f64,
    pub cpu_request: Option<f64>,
    pub dept_level1: Option<String>,
    pub dept_level2: Option<String>,
    pub host_type: Option<String>,
    pub package: Option<String>,
    pub cluster_id: Option<String>,
    pub cpu_util_max_1days: Option<String>,
    pub cpu_util_max_7days: Option<String>,
    pub mem_util_max_7days: Option<String>,
    /// Raw cell text; coerced only by the scale-down analysis
    pub save_cores: Option<String>,
}

impl InventoryRow {
    pub fn pool_key(&self) -> PoolKey {
        PoolKey::new(&self.physical_cluster, &self.iaas_cluster)
    }

    pub fn is_default_cluster(&self) -> bool {
        self.cluster_name == DEFAULT_CLUSTER
    }

    pub fn has_package(&self) -> bool {
        self.package.as_deref().map(|p| !p.is_empty()).unwrap_or(false)
    }
}

/// In-memory inventory snapshot plus the set of columns the source provided
#[derive(Debug, Clone, Default)]
pub struct InventoryTable {
    columns: BTreeSet<String>,
    rows: Vec<InventoryRow>,
}

impl InventoryTable {
    pub fn new(columns: BTreeSet<String>, rows: Vec<InventoryRow>) -> Self {
        Self { columns, rows }
    }

    /// Build a table that claims every known column, mainly for tests
    pub fn from_rows(rows: Vec<InventoryRow>) -> Self {
        let columns = columns::ALL.iter().map(|c| c.to_string()).collect();
        Self { columns, rows }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    /// Fail with [`PlannerError::MissingColumn`] on the first absent column
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        match names.iter().find(|name| !self.has_column(name)) {
            Some(name) => Err(PlannerError::MissingColumn(name.to_string())),
            None => Ok(()),
        }
    }

    pub fn columns(&self) -> &BTreeSet<String> {
        &self.columns
    }

    pub fn rows(&self) -> &[InventoryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// New table with the rows matching `keep`; the receiver is left untouched
    pub fn filtered<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&InventoryRow) -> bool,
    {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }
}
