//! Observability infrastructure for the pool planner
//!
//! Provides:
//! - Prometheus metrics (analysis latency and outcomes, inventory size, exports)
//! - Structured logging of analysis events with tracing

use crate::error::PlannerError;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, HistogramVec,
    IntCounterVec, IntGauge,
};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{info, warn};

/// Histogram buckets for analysis latency (in seconds); a request includes
/// the full inventory load
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PlannerMetricsInner> = OnceLock::new();

struct PlannerMetricsInner {
    analysis_latency_seconds: HistogramVec,
    analyses_total: IntCounterVec,
    inventory_rows: IntGauge,
    reports_exported: IntCounterVec,
}

impl PlannerMetricsInner {
    fn new() -> Self {
        Self {
            analysis_latency_seconds: register_histogram_vec!(
                "pool_planner_analysis_latency_seconds",
                "Time spent loading the inventory and running one analysis",
                &["analysis"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register analysis_latency_seconds"),

            analyses_total: register_int_counter_vec!(
                "pool_planner_analyses_total",
                "Analyses run, by analysis and outcome",
                &["analysis", "outcome"]
            )
            .expect("Failed to register analyses_total"),

            inventory_rows: register_int_gauge!(
                "pool_planner_inventory_rows",
                "Rows in the most recently loaded inventory"
            )
            .expect("Failed to register inventory_rows"),

            reports_exported: register_int_counter_vec!(
                "pool_planner_reports_exported_total",
                "Report artifacts written, by analysis",
                &["analysis"]
            )
            .expect("Failed to register reports_exported"),
        }
    }
}

/// Planner metrics for Prometheus exposition
///
/// A lightweight handle to the global metrics instance; clones share
/// the same underlying metrics.
#[derive(Clone)]
pub struct PlannerMetrics {
    _private: (),
}

impl Default for PlannerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PlannerMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PlannerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PlannerMetricsInner {
        GLOBAL_METRICS.get_or_init(PlannerMetricsInner::new)
    }

    pub fn observe_analysis_latency(&self, analysis: &str, duration_secs: f64) {
        self.inner()
            .analysis_latency_seconds
            .with_label_values(&[analysis])
            .observe(duration_secs);
    }

    pub fn inc_analyses(&self, analysis: &str, outcome: &str) {
        self.inner()
            .analyses_total
            .with_label_values(&[analysis, outcome])
            .inc();
    }

    pub fn set_inventory_rows(&self, rows: i64) {
        self.inner().inventory_rows.set(rows);
    }

    pub fn inc_reports_exported(&self, analysis: &str) {
        self.inner()
            .reports_exported
            .with_label_values(&[analysis])
            .inc();
    }
}

/// Structured logger for planner events
#[derive(Clone)]
pub struct StructuredLogger {
    source: String,
}

impl StructuredLogger {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn log_analysis_completed(
        &self,
        analysis: &str,
        outcome: &str,
        results: usize,
        elapsed: Duration,
    ) {
        info!(
            event = "analysis_completed",
            source = %self.source,
            analysis = %analysis,
            outcome = %outcome,
            results = results,
            elapsed_ms = elapsed.as_millis() as u64,
            "Analysis completed"
        );
    }

    pub fn log_analysis_failed(&self, analysis: &str, error: &PlannerError) {
        if error.is_request_error() {
            info!(
                event = "analysis_failed",
                source = %self.source,
                analysis = %analysis,
                kind = error.kind(),
                error = %error,
                "Analysis rejected"
            );
        } else {
            warn!(
                event = "analysis_failed",
                source = %self.source,
                analysis = %analysis,
                kind = error.kind(),
                error = %error,
                "Analysis failed"
            );
        }
    }

    pub fn log_report_exported(&self, analysis: &str, path: &Path, sheets: usize) {
        info!(
            event = "report_exported",
            source = %self.source,
            analysis = %analysis,
            path = %path.display(),
            sheets = sheets,
            "Report exported"
        );
    }

    pub fn log_startup(&self, version: &str, addr: &str) {
        info!(
            event = "service_started",
            source = %self.source,
            version = %version,
            addr = %addr,
            "Pool planner started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            source = %self.source,
            reason = %reason,
            "Pool planner shutting down"
        );
    }
}
