//! Resource-pool capacity planning over an exported inventory
//!
//! This crate provides the core functionality for:
//! - Loading the instance-group inventory from CSV or JSON
//! - Classifying services by the resource pools they occupy
//! - Dual-pool migration, scale-down and footprint analyses
//! - Report export, health checks and observability

pub mod analysis;
pub mod classifier;
pub mod error;
pub mod export;
pub mod health;
pub mod loader;
pub mod models;
pub mod observability;
pub mod policy;

pub use analysis::{
    FootprintRequest, MigrationOutcome, MigrationRequest, Planner, ScaleDownRequest,
};
pub use error::{PlannerError, Result};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{PlannerMetrics, StructuredLogger};
