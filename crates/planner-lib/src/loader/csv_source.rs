//! CSV inventory source

use super::{clean_cell, InventorySource, RowDecoder};
use crate::error::{PlannerError, Result};
use crate::models::InventoryTable;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Inventory stored as a CSV file with a header row
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read an inventory table from any CSV stream
    pub fn read_table<R: Read>(reader: R, source: &str) -> std::result::Result<InventoryTable, csv::Error> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| clean_cell(h).unwrap_or_default())
            .collect();

        // First occurrence wins for duplicated headers
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (idx, header) in headers.iter().enumerate() {
            if !header.is_empty() {
                positions.entry(header.as_str()).or_insert(idx);
            }
        }

        let mut decoder = RowDecoder::new(positions.keys().map(|h| h.to_string()));
        let mut rows = Vec::new();

        for (index, result) in rdr.records().enumerate() {
            let record = result?;
            let row = decoder.decode(index, |name| {
                positions
                    .get(name)
                    .and_then(|&pos| record.get(pos))
                    .and_then(clean_cell)
            });
            rows.push(row);
        }

        Ok(decoder.finish(rows, source))
    }
}

impl InventorySource for CsvSource {
    fn load(&self) -> Result<InventoryTable> {
        let unreadable = |reason: String| PlannerError::SourceUnreadable {
            path: self.path.clone(),
            reason,
        };

        let file = std::fs::File::open(&self.path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PlannerError::SourceNotFound(self.path.clone()),
            _ => unreadable(e.to_string()),
        })?;

        Self::read_table(file, &self.describe()).map_err(|e| unreadable(e.to_string()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
