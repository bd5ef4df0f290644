//! Report artifacts
//!
//! An analysis result is exported as a workbook: an ordered list of sheets,
//! each a header plus rows of scalar cells. List-valued fields are joined
//! into delimited strings before they reach a sheet. Artifacts are written
//! once; an existing target is never overwritten.

mod workbooks;

pub use workbooks::{footprint_workbook, migration_workbook, scale_down_workbook, LIST_DELIMITER};

use crate::error::{PlannerError, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// A scalar sheet cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Int(i64),
    Float(f64),
    Text(String),
    Empty,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn optional(value: Option<&str>) -> Self {
        value.map(Cell::text).unwrap_or(Cell::Empty)
    }

    fn render(&self) -> String {
        match self {
            Cell::Int(v) => v.to_string(),
            Cell::Float(v) => v.to_string(),
            Cell::Text(v) => v.clone(),
            Cell::Empty => String::new(),
        }
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Int(value as i64)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.columns.len(), "row width for sheet {}", self.name);
        self.rows.push(row);
    }

    /// Position of a column by name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Ordered sheets of one report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// On-disk layout of a report artifact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// One `<stem>.json` document holding every sheet
    #[default]
    Json,
    /// A `<stem>/` directory with one `NN_<sheet>.csv` per sheet
    Csv,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(format!("unknown report format: {other}")),
        }
    }
}

/// Base name of a report artifact: kind, local timestamp and a random suffix
pub fn report_stem(kind: &str, now: DateTime<Local>) -> String {
    format!(
        "{}_{}_{}",
        kind,
        now.format("%Y%m%d_%H%M%S"),
        Uuid::new_v4().simple()
    )
}

/// Write a workbook under `dir`; returns the artifact path
pub fn write_workbook(
    workbook: &Workbook,
    dir: &Path,
    stem: &str,
    format: ReportFormat,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;

    match format {
        ReportFormat::Json => {
            let path = dir.join(format!("{stem}.json"));
            let mut file = create_new(&path)?;
            let json = serde_json::to_vec_pretty(workbook)?;
            file.write_all(&json)?;
            Ok(path)
        }
        ReportFormat::Csv => {
            let path = dir.join(stem);
            std::fs::create_dir(&path).map_err(|e| already_exists(e, &path))?;
            for (position, sheet) in workbook.sheets.iter().enumerate() {
                let file = create_new(&path.join(format!("{:02}_{}.csv", position + 1, sheet.name)))?;
                write_sheet_csv(sheet, file)?;
            }
            Ok(path)
        }
    }
}

fn already_exists(err: std::io::Error, path: &Path) -> PlannerError {
    if err.kind() == ErrorKind::AlreadyExists {
        PlannerError::ExportTargetExists(path.to_path_buf())
    } else {
        PlannerError::Io(err)
    }
}

fn create_new(path: &Path) -> Result<std::fs::File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| already_exists(e, path))
}

/// Render one sheet as CSV with a header row
pub fn write_sheet_csv<W: Write>(sheet: &Sheet, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&sheet.columns)?;
    for row in &sheet.rows {
        wtr.write_record(row.iter().map(Cell::render))?;
    }
    wtr.flush()?;
    Ok(())
}
