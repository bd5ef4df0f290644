//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a rounded table under a bold title
pub fn print_table<T: Tabled>(title: &str, rows: Vec<T>) {
    println!("{}", title.bold());
    if rows.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a core or GiB quantity without trailing zeros
pub fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

/// Color slack cores: large reclaimable amounts stand out
pub fn color_save_cores(cores: i64, threshold: i64) -> String {
    if cores > threshold {
        cores.to_string().green().bold().to_string()
    } else {
        cores.to_string()
    }
}

/// Color a deployment status label
pub fn color_deployment_status(status: &str, migratable: bool) -> String {
    if migratable {
        status.green().to_string()
    } else {
        status.yellow().to_string()
    }
}
