//! Inventory loading from external tabular sources
//!
//! A source yields one sheet of named columns. Numeric quantities are
//! coerced here (unparseable cells become 0); the raw `save_cores` text
//! is kept for the scale-down analysis, which applies its own policy.

mod csv_source;
mod json_source;


pub use csv_source::CsvSource;
pub use json_source::JsonSource;

use crate::error::{PlannerError, Result};
use crate::models::{columns, InventoryRow, InventoryTable};
use std::collections::BTreeSet;
use std::path::Path;

/// Trait for inventory source implementations
pub trait InventorySource: Send + Sync {
    /// Load the whole table; file-level failures are fatal
    fn load(&self) -> Result<InventoryTable>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// Create the appropriate source based on the file extension
pub fn open_source(path: &Path) -> Result<Box<dyn InventorySource>> {
    if !path.exists() {
        return Err(PlannerError::SourceNotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("csv") => Ok(Box::new(CsvSource::new(path))),
        Some("json") => Ok(Box::new(JsonSource::new(path))),
        _ => Err(PlannerError::UnsupportedSource(path.to_path_buf())),
    }
}

/// Parse a numeric cell; non-finite values count as unparseable
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalize a raw cell: trimmed, empty becomes absent
pub(crate) fn clean_cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('\u{feff}').trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Turns named cells into [`InventoryRow`]s and tracks coercions
#[derive(Debug, Default)]
pub(crate) struct RowDecoder {
    columns: BTreeSet<String>,
    coerced_cells: usize,
}

impl RowDecoder {
    pub(crate) fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: headers.into_iter().map(Into::into).collect(),
            coerced_cells: 0,
        }
    }

    pub(crate) fn add_column(&mut self, name: &str) {
        if !self.columns.contains(name) {
            self.columns.insert(name.to_string());
        }
    }

    pub(crate) fn coerced_cells(&self) -> usize {
        self.coerced_cells
    }

    /// Decode one record; `cell` returns the cleaned value of a column
    pub(crate) fn decode<F>(&mut self, index: usize, cell: F) -> InventoryRow
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str| cell(name).unwrap_or_default();

        InventoryRow {
            index,
            psm: text(columns::PSM),
            physical_cluster: text(columns::PHYSICAL_CLUSTER),
            iaas_cluster: text(columns::IAAS_CLUSTER),
            cluster_name: text(columns::CLUSTER_NAME),
            idc: text(columns::IDC),
            instance_num: self.quantity(cell(columns::INSTANCE_NUM)).trunc() as i64,
            cpu_limit: self.quantity(cell(columns::CPU_LIMIT)),
            mem_limit: self.quantity(cell(columns::MEM_LIMIT)),
            cpu_request: cell(columns::CPU_REQUEST).and_then(|raw| parse_number(&raw)),
            dept_level1: cell(columns::DEPT_LEVEL1),
            dept_level2: cell(columns::DEPT_LEVEL2),
            host_type: cell(columns::HOST_TYPE),
            package: cell(columns::PACKAGE),
            cluster_id: cell(columns::CLUSTER_ID),
            cpu_util_max_1days: cell(columns::CPU_UTIL_MAX_1DAYS),
            cpu_util_max_7days: cell(columns::CPU_UTIL_MAX_7DAYS),
            mem_util_max_7days: cell(columns::MEM_UTIL_MAX_7DAYS),
            save_cores: cell(columns::SAVE_CORES),
        }
    }

    /// Quantities are never negative; anything unusable maps to 0
    fn quantity(&mut self, raw: Option<String>) -> f64 {
        match raw.as_deref().map(parse_number) {
            None => 0.0,
            Some(Some(value)) if value >= 0.0 => value,
            Some(_) => {
                self.coerced_cells += 1;
                0.0
            }
        }
    }

    pub(crate) fn finish(self, rows: Vec<InventoryRow>, source: &str) -> InventoryTable {
        if self.coerced_cells > 0 {
            tracing::warn!(
                source = %source,
                coerced_cells = self.coerced_cells,
                "Non-numeric quantity cells coerced to 0"
            );
        }
        tracing::info!(source = %source, rows = rows.len(), "Loaded inventory");
        InventoryTable::new(self.columns, rows)
    }
}
