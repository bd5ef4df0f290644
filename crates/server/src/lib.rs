//! Pool planner HTTP service
//!
//! Exposes the planning analyses over a JSON API next to the health,
//! readiness and Prometheus endpoints.

pub mod api;
pub mod config;
