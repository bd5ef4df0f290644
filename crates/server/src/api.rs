//! HTTP API: analyses, report downloads, health checks and Prometheus metrics

use crate::config::ServerConfig;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use planner_lib::{
    analysis::{
        DetailRow, FootprintRecord, FootprintRequest, MigrationOutcome, MigrationRequest,
        Planner, ScaleDownRecord, ScaleDownRequest, SummaryRow, NO_DUAL_POOL_MATCH,
    },
    export::{self, Workbook},
    health::{components, ComponentStatus, HealthRegistry},
    loader::open_source,
    observability::{PlannerMetrics, StructuredLogger},
    policy::Facilities,
    PlannerError,
};
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub health_registry: HealthRegistry,
    pub metrics: PlannerMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(config: ServerConfig, health_registry: HealthRegistry) -> Self {
        Self {
            config,
            health_registry,
            metrics: PlannerMetrics::new(),
            logger: StructuredLogger::new("pool-planner"),
        }
    }

    /// Resolve a request's `data_file` under the data directory
    fn inventory_path(&self, data_file: Option<&str>) -> Result<PathBuf, ApiError> {
        let name = data_file
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(self.config.default_data_file.as_str());
        if !is_bare_file_name(name) {
            return Err(ApiError::InvalidFileName(name.to_string()));
        }
        Ok(self.config.data_dir.join(name))
    }

    /// Run one analysis off the async runtime against a fresh load of `path`
    async fn analyze<T, F>(&self, path: PathBuf, run: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Planner) -> planner_lib::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let result = tokio::task::spawn_blocking(move || {
            let planner = Planner::new(open_source(&path)?);
            run(&planner)
        })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

        match &result {
            Ok(_) => self.health_registry.set_healthy(components::INVENTORY).await,
            Err(err) if err.is_source_error() => {
                self.health_registry
                    .set_degraded(components::INVENTORY, err.to_string())
                    .await
            }
            Err(_) => {}
        }
        Ok(result?)
    }

    /// Write a report artifact; returns the name to pass to `/download`
    async fn export(
        &self,
        analysis: &'static str,
        kind: &'static str,
        workbook: Workbook,
    ) -> Result<String, ApiError> {
        let dir = self.config.export_dir.clone();
        let format = self.config.report_format;
        let sheets = workbook.sheets.len();

        let result = tokio::task::spawn_blocking(move || {
            let stem = export::report_stem(kind, chrono::Local::now());
            export::write_workbook(&workbook, &dir, &stem, format)
        })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

        self.health_registry
            .record(components::EXPORTER, &result)
            .await;
        let path = result?;

        self.metrics.inc_reports_exported(analysis);
        self.logger.log_report_exported(analysis, &path, sheets);

        Ok(path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default())
    }
}

/// A name with no path components
fn is_bare_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
}

/// Error response of the analysis and download endpoints
#[derive(Debug)]
pub enum ApiError {
    Planner(PlannerError),
    InvalidFileName(String),
    NotFound(String),
    Internal(String),
}

impl From<PlannerError> for ApiError {
    fn from(err: PlannerError) -> Self {
        ApiError::Planner(err)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Planner(err) => match err {
                PlannerError::InvalidPool(_) | PlannerError::MissingParameter(_) => {
                    StatusCode::BAD_REQUEST
                }
                PlannerError::SourceNotFound(_) => StatusCode::NOT_FOUND,
                PlannerError::MissingColumn(_) | PlannerError::NoDataForScope { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::InvalidFileName(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorBody {
        let (error, code) = match self {
            ApiError::Planner(err) => (err.to_string(), err.kind()),
            ApiError::InvalidFileName(name) => (format!("非法文件名: {name}"), "invalid_file_name"),
            ApiError::NotFound(name) => (format!("文件不存在: {name}"), "not_found"),
            ApiError::Internal(reason) => (reason.clone(), "internal"),
        };
        ErrorBody {
            success: false,
            error,
            code: code.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = ?self, "Request failed");
        }
        (status, Json(self.body())).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MigrationBody {
    /// Comma-separated facilities; empty means all
    pub idc: Option<String>,
    pub pool1: String,
    pub pool2: String,
    pub data_file: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MigrationResults {
    pub detail: Vec<DetailRow>,
    pub summary: Vec<SummaryRow>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MigrationSummary {
    pub psm_count: usize,
    pub source_pool: String,
    pub target_pool: String,
    pub idc: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MigrationResponse {
    pub success: bool,
    /// `success` or `empty`
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub results: MigrationResults,
    pub summary: MigrationSummary,
    pub report_file: Option<String>,
}

async fn migration(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MigrationBody>,
) -> Result<Json<MigrationResponse>, ApiError> {
    let idc = body.idc.unwrap_or_default();
    let request = MigrationRequest {
        facilities: Facilities::parse(&idc),
        pool_a: body.pool1,
        pool_b: body.pool2,
    };
    let (pool_a, pool_b) = request.validate()?;
    let path = state.inventory_path(body.data_file.as_deref())?;

    let outcome = state
        .analyze(path, move |planner| planner.migration(&request))
        .await?;

    let summary = |psm_count| MigrationSummary {
        psm_count,
        source_pool: pool_a.identifier(),
        target_pool: pool_b.identifier(),
        idc: idc.clone(),
    };

    let response = match outcome {
        MigrationOutcome::NoMatches => MigrationResponse {
            success: true,
            status: "empty".to_string(),
            message: Some(NO_DUAL_POOL_MATCH.to_string()),
            results: MigrationResults {
                detail: Vec::new(),
                summary: Vec::new(),
            },
            summary: summary(0),
            report_file: None,
        },
        MigrationOutcome::Matches(report) => {
            let report_file = state
                .export(
                    "migration",
                    "resource_migration",
                    export::migration_workbook(&report),
                )
                .await?;
            MigrationResponse {
                success: true,
                status: "success".to_string(),
                message: None,
                summary: summary(report.stats.psm_count),
                results: MigrationResults {
                    detail: report.detail,
                    summary: report.summary,
                },
                report_file: Some(report_file),
            }
        }
    };

    Ok(Json(response))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RecommendBody {
    pub idc: String,
    pub pool: String,
    pub min_save_cores: i64,
    pub data_file: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendSummary {
    pub total_cpu: i64,
    pub total_clusters: usize,
    pub clusters_over_threshold: usize,
    pub idc: String,
    pub pool: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub success: bool,
    pub results: Vec<ScaleDownRecord>,
    pub summary: RecommendSummary,
    pub report_file: Option<String>,
}

async fn recommend(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RecommendBody>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let request = ScaleDownRequest {
        idc: body.idc,
        pool: body.pool,
        min_save_cores: body.min_save_cores,
    };
    let (idc, pool) = request.validate()?;
    let path = state.inventory_path(body.data_file.as_deref())?;

    let report = state
        .analyze(path, move |planner| planner.scale_down(&request))
        .await?;

    let now = chrono::Local::now();
    let report_file = if report.records.is_empty() {
        None
    } else {
        let workbook = export::scale_down_workbook(&report, &idc, &pool.identifier(), now);
        Some(
            state
                .export("scale_down", "recommend_scale_down", workbook)
                .await?,
        )
    };

    Ok(Json(RecommendResponse {
        success: true,
        summary: RecommendSummary {
            total_cpu: report.stats.total_save_cores,
            total_clusters: report.stats.cluster_count,
            clusters_over_threshold: report.stats.clusters_over_threshold,
            idc,
            pool: pool.identifier(),
        },
        results: report.records,
        report_file,
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MigratableBody {
    pub idc: String,
    pub pool: String,
    pub data_file: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MigratableSummary {
    pub total_psm: usize,
    pub migratable_psm: usize,
    pub available_pools: Vec<String>,
    pub total_clusters: usize,
    pub idc: String,
    pub pool: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MigratableResponse {
    pub success: bool,
    pub results: Vec<FootprintRecord>,
    /// True when `results` was cut at the configured maximum
    pub truncated: bool,
    pub summary: MigratableSummary,
    pub report_file: Option<String>,
}

async fn migratable(
    State(state): State<Arc<AppState>>,
    Json(body): Json<MigratableBody>,
) -> Result<Json<MigratableResponse>, ApiError> {
    let request = FootprintRequest {
        idc: body.idc,
        pool: body.pool,
    };
    let (idc, pool) = request.validate()?;
    let path = state.inventory_path(body.data_file.as_deref())?;

    let report = state
        .analyze(path, move |planner| planner.footprint(&request))
        .await?;

    let report_file = if report.records.is_empty() {
        None
    } else {
        let workbook = export::footprint_workbook(&report, &idc, &pool, chrono::Local::now());
        Some(
            state
                .export("footprint", "migratable_clusters", workbook)
                .await?,
        )
    };

    let max = state.config.max_footprint_results;
    let truncated = report.records.len() > max;
    let mut results = report.records;
    results.truncate(max);

    Ok(Json(MigratableResponse {
        success: true,
        results,
        truncated,
        summary: MigratableSummary {
            total_psm: report.stats.total_psm,
            migratable_psm: report.stats.migratable_psm,
            available_pools: report.stats.available_pools,
            total_clusters: report.stats.total_clusters,
            idc,
            pool,
        },
        report_file,
    }))
}

/// Serve a report artifact from the export directory
async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    if !is_bare_file_name(&filename) {
        return Err(ApiError::InvalidFileName(filename));
    }

    let path = state.config.export_dir.join(&filename);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound(filename))
        }
        // A CSV report is a directory and cannot be served as one file
        Err(_) if path.is_dir() => return Err(ApiError::NotFound(filename)),
        Err(e) => return Err(ApiError::Internal(e.to_string())),
    };

    let content_type = if filename.ends_with(".json") {
        "application/json"
    } else {
        "application/octet-stream"
    };
    info!(file = %filename, bytes = bytes.len(), "Serving report");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Health check response - returns 200 if healthy, 503 if degraded/unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still serving requests
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Result<impl IntoResponse, ApiError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    ))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/migration", post(migration))
        .route("/api/recommend", post(recommend))
        .route("/api/migratable", post(migratable))
        .route("/download/:filename", get(download))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn shutdown_signal(logger: StructuredLogger) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    logger.log_shutdown("SIGINT received");
}

/// Start the API server; returns after a graceful shutdown
pub async fn serve(state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", state.config.api_port);
    let logger = state.logger.clone();
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(logger))
        .await?;

    Ok(())
}
