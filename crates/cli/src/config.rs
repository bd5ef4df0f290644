//! Configuration management for the CLI

use anyhow::{Context, Result};
use planner_lib::export::ReportFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_INVENTORY: &str = "all.csv";
const DEFAULT_EXPORT_DIR: &str = "uploads";

/// CLI configuration file contents
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Inventory file used in local mode
    pub inventory: Option<PathBuf>,
    /// Directory report artifacts are written to
    pub export_dir: Option<PathBuf>,
    /// Planner service URL; switches commands to remote mode
    pub api_url: Option<String>,
    pub report_format: Option<ReportFormat>,
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config file")
    }

    /// `~/.config/poolctl/config.json`
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("poolctl").join("config.json"))
    }

    pub fn inventory(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.inventory.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_INVENTORY))
    }

    pub fn export_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.export_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_EXPORT_DIR))
    }

    pub fn api_url(&self, flag: Option<String>) -> Option<String> {
        flag.or_else(|| self.api_url.clone())
    }

    pub fn report_format(&self, flag: Option<ReportFormat>) -> ReportFormat {
        flag.or(self.report_format).unwrap_or_default()
    }
}
