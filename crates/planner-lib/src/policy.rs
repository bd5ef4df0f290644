//! Filter stage and per-analysis scoping policies
//!
//! The three analyses scope the inventory differently. Those differences
//! live here as typed configuration rather than in each analysis body.

use crate::error::{PlannerError, Result};
use crate::models::{columns, InventoryTable, PoolKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Optional set of facility (idc) names
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facilities(BTreeSet<String>);

impl Facilities {
    /// Parse a comma-separated list; blank segments are ignored
    pub fn parse(input: &str) -> Self {
        Self(
            input
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, idc: &str) -> bool {
        self.0.contains(idc)
    }

    /// The only name in the set, if there is exactly one
    pub fn single(&self) -> Option<&str> {
        match self.0.len() {
            1 => self.0.iter().next().map(String::as_str),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Keep rows whose idc is in the set; an empty set keeps everything
pub fn filter_by_facility(table: &InventoryTable, facilities: &Facilities) -> InventoryTable {
    if facilities.is_empty() {
        return table.clone();
    }
    table.filtered(|row| facilities.contains(&row.idc))
}

/// Keep rows of the canonical production sub-cluster
pub fn filter_default_cluster(table: &InventoryTable) -> InventoryTable {
    table.filtered(|row| row.is_default_cluster())
}

/// Keep rows whose idc equals `idc` exactly
pub fn filter_by_idc(table: &InventoryTable, idc: &str) -> InventoryTable {
    table.filtered(|row| row.idc == idc)
}

/// Keep rows belonging to exactly this pool
pub fn filter_by_pool(table: &InventoryTable, pool: &PoolKey) -> InventoryTable {
    table.filtered(|row| pool.matches(row))
}

/// How the facility parameter restricts rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacilityMatch {
    /// Membership in an optional set
    AnyOf,
    /// Equality with a single required name
    Exact,
}

/// What an empty scope means for the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyScope {
    /// A successful "no matches" outcome
    Empty,
    /// A [`PlannerError::NoDataForScope`] failure
    Error,
}

/// Treatment of the `save_cores` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlackPolicy {
    /// Unparseable values count as 0, like the other quantity columns
    ZeroFill,
    /// Rows whose value cannot be coerced are dropped, never zero-filled
    DropUnparseable,
}

/// Scoping policy of one analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopePolicy {
    pub name: &'static str,
    pub facility: FacilityMatch,
    pub default_cluster_only: bool,
    pub empty_scope: EmptyScope,
    /// Only analyses that read `save_cores` carry one
    pub slack: Option<SlackPolicy>,
}

/// Dual-pool migration candidates
pub const DUAL_POOL: ScopePolicy = ScopePolicy {
    name: "migration",
    facility: FacilityMatch::AnyOf,
    default_cluster_only: true,
    empty_scope: EmptyScope::Empty,
    slack: None,
};

/// Low-utilization scale-down candidates
pub const SCALE_DOWN: ScopePolicy = ScopePolicy {
    name: "scale_down",
    facility: FacilityMatch::Exact,
    default_cluster_only: false,
    empty_scope: EmptyScope::Error,
    slack: Some(SlackPolicy::DropUnparseable),
};

/// Cross-pool footprint report
pub const FOOTPRINT: ScopePolicy = ScopePolicy {
    name: "footprint",
    facility: FacilityMatch::Exact,
    default_cluster_only: true,
    empty_scope: EmptyScope::Empty,
    slack: None,
};

impl ScopePolicy {
    /// Apply the facility and sub-cluster restrictions of this policy
    pub fn scope(&self, table: &InventoryTable, facilities: &Facilities) -> InventoryTable {
        let by_facility = match self.facility {
            FacilityMatch::AnyOf => filter_by_facility(table, facilities),
            // Exact matching always constrains, even to nothing
            FacilityMatch::Exact => match facilities.single() {
                Some(idc) => filter_by_idc(table, idc),
                None => table.filtered(|_| false),
            },
        };

        if self.default_cluster_only {
            filter_default_cluster(&by_facility)
        } else {
            by_facility
        }
    }

    /// Columns the source must provide for this policy to apply
    pub fn required_columns(&self) -> Vec<&'static str> {
        let mut required = vec![columns::PSM, columns::PHYSICAL_CLUSTER, columns::IAAS_CLUSTER];
        if self.facility == FacilityMatch::Exact {
            required.push(columns::IDC);
        }
        if self.default_cluster_only {
            required.push(columns::CLUSTER_NAME);
        }
        required
    }

    /// Enforce the empty-scope policy on the number of in-scope rows
    pub fn check_scope(&self, matched_rows: usize, idc: &str, pool: &str) -> Result<()> {
        if matched_rows == 0 && self.empty_scope == EmptyScope::Error {
            return Err(PlannerError::NoDataForScope {
                idc: idc.to_string(),
                pool: pool.to_string(),
            });
        }
        Ok(())
    }
}
