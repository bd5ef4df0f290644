//! Service configuration

use anyhow::{Context, Result};
use planner_lib::export::ReportFormat;
use serde::Deserialize;
use std::path::PathBuf;

/// Service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// HTTP port for the analysis API, health and metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Directory inventory files are resolved under
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Inventory file used when a request names none
    #[serde(default = "default_data_file")]
    pub default_data_file: String,

    /// Directory report artifacts are written to and downloaded from
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    #[serde(default)]
    pub report_format: ReportFormat,

    /// Cap on footprint records returned inline
    #[serde(default = "default_max_footprint_results")]
    pub max_footprint_results: usize,
}

fn default_api_port() -> u16 {
    8080
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_data_file() -> String {
    "all.csv".to_string()
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_footprint_results() -> usize {
    500
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            data_dir: default_data_dir(),
            default_data_file: default_data_file(),
            export_dir: default_export_dir(),
            report_format: ReportFormat::default(),
            max_footprint_results: default_max_footprint_results(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `PLANNER_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("PLANNER").try_parsing(true))
            .build()
            .context("reading PLANNER_* environment")?;

        config
            .try_deserialize()
            .context("invalid PLANNER_* configuration")
    }
}
