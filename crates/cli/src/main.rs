//! Resource pool planning CLI
//!
//! Runs the dual-pool migration, scale-down and footprint analyses against
//! a local inventory file, or against a planner service when an API URL
//! is configured.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{migratable, migration, recommend, Backend, Session};
use planner_lib::export::ReportFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Resource pool planning CLI
#[derive(Parser)]
#[command(name = "poolctl")]
#[command(author, version, about = "CLI for resource pool capacity planning", long_about = None)]
pub struct Cli {
    /// Inventory file (.csv or .json) for local analyses
    #[arg(long, env = "POOLCTL_INVENTORY")]
    pub inventory: Option<PathBuf>,

    /// Planner service URL; analyses run remotely when set
    #[arg(long, env = "POOLCTL_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Directory report artifacts are written to
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Report artifact layout (json or csv)
    #[arg(long)]
    pub report_format: Option<ReportFormat>,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Find PSMs deployed in both pools, for moving capacity from pool1 to pool2
    Migration {
        /// Pool lending capacity (physical_cluster/iaas_cluster)
        #[arg(long)]
        pool1: String,

        /// Pool receiving capacity (physical_cluster/iaas_cluster)
        #[arg(long)]
        pool2: String,

        /// Comma-separated facilities to restrict to
        #[arg(long)]
        idc: Option<String>,

        /// Write the report artifact
        #[arg(long)]
        export: bool,
    },

    /// Recommend clusters of a pool for scale-down
    Recommend {
        /// Facility
        #[arg(long)]
        idc: String,

        /// Pool (physical_cluster/iaas_cluster)
        #[arg(long)]
        pool: String,

        /// Minimum reclaimable cores per cluster
        #[arg(long, default_value_t = 0)]
        min_save_cores: i64,

        /// Write the report artifact
        #[arg(long)]
        export: bool,
    },

    /// List PSMs under a pool and the other pools they occupy
    Migratable {
        /// Facility
        #[arg(long)]
        idc: String,

        /// Pool (physical_cluster/iaas_cluster or a physical cluster name)
        #[arg(long)]
        pool: String,

        /// Write the report artifact
        #[arg(long)]
        export: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let config = config::Config::load()?;

    let backend = match config.api_url(cli.api_url.clone()) {
        Some(url) => Backend::Remote {
            client: client::ApiClient::new(&url)?,
            data_file: cli
                .inventory
                .as_ref()
                .and_then(|path| path.file_name())
                .map(|name| name.to_string_lossy().into_owned()),
        },
        None => Backend::Local {
            inventory: config.inventory(cli.inventory.clone()),
        },
    };

    let session = Session {
        backend,
        format: cli.format,
        export_dir: config.export_dir(cli.export_dir.clone()),
        report_format: config.report_format(cli.report_format),
    };

    // Execute command
    match cli.command {
        Commands::Migration {
            pool1,
            pool2,
            idc,
            export,
        } => {
            migration::run(&session, idc, pool1, pool2, export).await?;
        }
        Commands::Recommend {
            idc,
            pool,
            min_save_cores,
            export,
        } => {
            recommend::run(&session, idc, pool, min_save_cores, export).await?;
        }
        Commands::Migratable { idc, pool, export } => {
            migratable::run(&session, idc, pool, export).await?;
        }
    }

    Ok(())
}
