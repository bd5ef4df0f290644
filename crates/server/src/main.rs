//! Pool planner - resource pool capacity planning service
//!
//! Serves the dual-pool migration, scale-down and footprint analyses
//! over HTTP. Every request reloads the inventory file it names.

use anyhow::{Context, Result};
use planner_lib::{
    health::{components, HealthRegistry},
    observability::StructuredLogger,
};
use pool_planner::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const PLANNER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = ServerConfig::load()?;
    info!(
        data_dir = %config.data_dir.display(),
        export_dir = %config.export_dir.display(),
        default_data_file = %config.default_data_file,
        "Planner configured"
    );

    std::fs::create_dir_all(&config.export_dir).with_context(|| {
        format!("creating export directory {}", config.export_dir.display())
    })?;

    let health_registry = HealthRegistry::new();
    health_registry.register(components::INVENTORY).await;
    health_registry.register(components::EXPORTER).await;

    let logger = StructuredLogger::new("pool-planner");
    logger.log_startup(PLANNER_VERSION, &format!("0.0.0.0:{}", config.api_port));

    let app_state = Arc::new(api::AppState::new(config, health_registry.clone()));

    // Nothing is preloaded; the service is ready once the router is built
    health_registry.set_ready(true).await;

    api::serve(app_state).await?;
    info!("Shut down");

    Ok(())
}
