//! JSON inventory source (array of flat records)

use super::{clean_cell, InventorySource, RowDecoder};
use crate::error::{PlannerError, Result};
use crate::models::InventoryTable;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Inventory stored as `[{"psm": ..., "physical_cluster": ...}, ...]`
pub struct JsonSource {
    path: PathBuf,
}

impl JsonSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Build a table from already-parsed records
    pub fn table_from_records(records: &[Map<String, Value>], source: &str) -> InventoryTable {
        let mut decoder = RowDecoder::default();
        for record in records {
            for key in record.keys() {
                if let Some(name) = clean_cell(key) {
                    decoder.add_column(&name);
                }
            }
        }

        let rows = records
            .iter()
            .enumerate()
            .map(|(index, record)| decoder.decode(index, |name| record.get(name).and_then(cell_text)))
            .collect();

        decoder.finish(rows, source)
    }
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => clean_cell(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        // Nested values are carried as their JSON text
        other => Some(other.to_string()),
    }
}

impl InventorySource for JsonSource {
    fn load(&self) -> Result<InventoryTable> {
        let unreadable = |reason: String| PlannerError::SourceUnreadable {
            path: self.path.clone(),
            reason,
        };

        let content = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PlannerError::SourceNotFound(self.path.clone()),
            _ => unreadable(e.to_string()),
        })?;

        let records: Vec<Map<String, Value>> =
            serde_json::from_str(&content).map_err(|e| unreadable(e.to_string()))?;

        Ok(Self::table_from_records(&records, &self.describe()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
