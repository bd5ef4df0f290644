//! Subcommand implementations
//!
//! Each command runs either locally against an inventory file or remotely
//! against the planner service, then renders the same view.

pub mod migratable;
pub mod migration;
pub mod recommend;

use crate::client::ApiClient;
use crate::output::{print_success, OutputFormat};
use anyhow::{Context, Result};
use planner_lib::export::{self, ReportFormat, Workbook};
use planner_lib::loader::open_source;
use planner_lib::Planner;
use std::path::{Path, PathBuf};

/// Where analyses run
pub enum Backend {
    Local { inventory: PathBuf },
    Remote {
        client: ApiClient,
        /// Inventory file name the service should resolve under its data dir
        data_file: Option<String>,
    },
}

/// Resolved global options shared by every command
pub struct Session {
    pub backend: Backend,
    pub format: OutputFormat,
    pub export_dir: PathBuf,
    pub report_format: ReportFormat,
}

impl Session {
    fn planner(inventory: &Path) -> Result<Planner> {
        let source = open_source(inventory)
            .with_context(|| format!("opening inventory {}", inventory.display()))?;
        Ok(Planner::new(source))
    }

    /// Write a report artifact in local mode; returns its path
    fn export(&self, kind: &str, workbook: &Workbook) -> Result<String> {
        let stem = export::report_stem(kind, chrono::Local::now());
        let path = export::write_workbook(workbook, &self.export_dir, &stem, self.report_format)
            .context("writing report")?;
        tracing::debug!(path = %path.display(), sheets = workbook.sheets.len(), "Report exported");
        Ok(path.display().to_string())
    }
}

/// Announce a report artifact, whichever side wrote it
fn report_written(report_file: Option<&str>) {
    if let Some(file) = report_file {
        print_success(&format!("Report written: {}", file));
    }
}
