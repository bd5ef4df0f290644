//! API client for communicating with the pool planner service

use anyhow::{Context, Result};
use planner_lib::analysis::{DetailRow, FootprintRecord, ScaleDownRecord, SummaryRow};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// API client for the pool planner service
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err) => anyhow::bail!("API error ({}, {}): {}", status, err.code, err.error),
                Err(_) => anyhow::bail!("API error ({}): {}", status, body),
            }
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn migration(&self, request: &MigrationBody) -> Result<MigrationResponse> {
        self.post("api/migration", request).await
    }

    pub async fn recommend(&self, request: &RecommendBody) -> Result<RecommendResponse> {
        self.post("api/recommend", request).await
    }

    pub async fn migratable(&self, request: &MigratableBody) -> Result<MigratableResponse> {
        self.post("api/migratable", request).await
    }
}

// API request and response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idc: Option<String>,
    pub pool1: String,
    pub pool2: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResults {
    pub detail: Vec<DetailRow>,
    pub summary: Vec<SummaryRow>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationSummary {
    pub psm_count: usize,
    pub source_pool: String,
    pub target_pool: String,
    pub idc: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    pub results: MigrationResults,
    pub summary: MigrationSummary,
    pub report_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendBody {
    pub idc: String,
    pub pool: String,
    pub min_save_cores: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendSummary {
    pub total_cpu: i64,
    pub total_clusters: usize,
    pub clusters_over_threshold: usize,
    pub idc: String,
    pub pool: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub results: Vec<ScaleDownRecord>,
    pub summary: RecommendSummary,
    pub report_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigratableBody {
    pub idc: String,
    pub pool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigratableSummary {
    pub total_psm: usize,
    pub migratable_psm: usize,
    pub available_pools: Vec<String>,
    pub total_clusters: usize,
    pub idc: String,
    pub pool: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigratableResponse {
    pub results: Vec<FootprintRecord>,
    #[serde(default)]
    pub truncated: bool,
    pub summary: MigratableSummary,
    pub report_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
