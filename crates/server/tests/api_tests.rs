//! Integration tests for the planner API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use planner_lib::health::{components, HealthRegistry};
use pool_planner::{
    api::{create_router, AppState},
    config::ServerConfig,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const INVENTORY: &str = "\
psm,physical_cluster,iaas_cluster,cluster_name,idc,instance_num,cpu_limit,mem_limit,cluster_id,dept_level1,dept_level2,save_cores
svc.a,PC1,IC1,default,lf,5,10,20,c-1,Infra,Compute,4
svc.a,PC2,IC1,default,lf,3,6,12,c-2,Infra,Compute,12
svc.b,PC1,IC1,default,lf,2,4,8,c-3,Ads,Serving,1
svc.c,PC1,IC1,default,lf,7,14,28,c-4,Ads,Serving,20
svc.c,PC3,IC2,default,lf,1,2,4,c-5,Ads,Serving,0
";

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    dir: TempDir,
}

async fn setup_test_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("all.csv"), INVENTORY).unwrap();

    let config = ServerConfig {
        data_dir: dir.path().to_path_buf(),
        export_dir: dir.path().join("uploads"),
        max_footprint_results: 1,
        ..ServerConfig::default()
    };

    let health_registry = HealthRegistry::new();
    health_registry.register(components::INVENTORY).await;
    health_registry.register(components::EXPORTER).await;

    let state = Arc::new(AppState::new(config, health_registry));
    let router = create_router(state.clone());

    TestApp { router, state, dir }
}

async fn post(router: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn get(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

#[tokio::test]
async fn test_migration_returns_tables_and_report() {
    let app = setup_test_app().await;

    let (status, body) = post(
        app.router.clone(),
        "/api/migration",
        json!({"pool1": "PC1/IC1", "pool2": "PC2/IC1"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "success");
    assert_eq!(body["summary"]["psm_count"], 1);
    assert_eq!(body["summary"]["source_pool"], "PC1/IC1");
    assert_eq!(body["results"]["detail"].as_array().unwrap().len(), 2);
    assert_eq!(body["results"]["detail"][0]["pool_identifier"], "PC1/IC1");

    let report = body["report_file"].as_str().unwrap();
    assert!(report.starts_with("resource_migration_"));
    assert!(app.dir.path().join("uploads").join(report).exists());

    let (status, bytes) = get(app.router, &format!("/download/{report}")).await;
    assert_eq!(status, StatusCode::OK);
    let workbook: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(workbook["sheets"][0]["name"], "资源汇总");
}

#[tokio::test]
async fn test_concurrent_migrations_export_distinct_reports() {
    let app = setup_test_app().await;
    let body = json!({"pool1": "PC1/IC1", "pool2": "PC2/IC1"});

    let (first, second, third) = tokio::join!(
        post(app.router.clone(), "/api/migration", body.clone()),
        post(app.router.clone(), "/api/migration", body.clone()),
        post(app.router.clone(), "/api/migration", body),
    );

    let mut reports = Vec::new();
    for (status, body) in [first, second, third] {
        assert_eq!(status, StatusCode::OK, "{body}");
        reports.push(body["report_file"].as_str().unwrap().to_string());
    }
    reports.sort();
    reports.dedup();
    assert_eq!(reports.len(), 3);
}

#[tokio::test]
async fn test_migration_without_matches_is_empty_success() {
    let app = setup_test_app().await;

    let (status, body) = post(
        app.router,
        "/api/migration",
        json!({"pool1": "PC1/IC1", "pool2": "PC9/IC9"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "empty");
    assert_eq!(body["message"], "没有找到同时部署在两个资源池的psm");
    assert!(body["report_file"].is_null());
}

#[tokio::test]
async fn test_malformed_pool_is_bad_request() {
    let app = setup_test_app().await;

    let (status, body) = post(
        app.router,
        "/api/migration",
        json!({"pool1": "PC1", "pool2": "PC2/IC1", "data_file": "missing.csv"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "invalid_pool");
}

#[tokio::test]
async fn test_missing_data_file_is_not_found_and_degrades_inventory() {
    let app = setup_test_app().await;

    let (status, body) = post(
        app.router.clone(),
        "/api/migration",
        json!({"pool1": "PC1/IC1", "pool2": "PC2/IC1", "data_file": "missing.csv"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "source_not_found");

    let health = app.state.health_registry.health().await;
    assert_eq!(
        health.components[components::INVENTORY].status,
        planner_lib::ComponentStatus::Degraded
    );

    let (status, body) = post(
        app.router,
        "/api/migration",
        json!({"pool1": "PC1/IC1", "pool2": "PC2/IC1", "data_file": "../all.csv"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_file_name");
}

#[tokio::test]
async fn test_recommend_ranks_clusters() {
    let app = setup_test_app().await;

    let (status, body) = post(
        app.router,
        "/api/recommend",
        json!({"idc": "lf", "pool": "PC1/IC1", "min_save_cores": 2}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["cluster_id"], "c-4");
    assert_eq!(results[0]["save_cores"], 20);
    assert_eq!(body["summary"]["total_cpu"], 24);
    assert_eq!(body["summary"]["clusters_over_threshold"], 1);
    assert!(body["report_file"]
        .as_str()
        .unwrap()
        .starts_with("recommend_scale_down_"));
}

#[tokio::test]
async fn test_recommend_empty_scope_is_unprocessable() {
    let app = setup_test_app().await;

    let (status, body) = post(
        app.router.clone(),
        "/api/recommend",
        json!({"idc": "hl", "pool": "PC1/IC1"}),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "no_data_for_scope");

    let (status, body) = post(app.router, "/api/recommend", json!({"pool": "PC1/IC1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "missing_parameter");
}

#[tokio::test]
async fn test_migratable_truncates_results() {
    let app = setup_test_app().await;

    let (status, body) = post(
        app.router,
        "/api/migratable",
        json!({"idc": "lf", "pool": "PC1/IC1"}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["truncated"], true);
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
    assert_eq!(body["results"][0]["psm"], "svc.a");
    assert_eq!(body["results"][0]["deployment_status"], "多资源池");
    assert_eq!(body["summary"]["total_psm"], 3);
    assert_eq!(body["summary"]["migratable_psm"], 2);
    assert_eq!(
        body["summary"]["available_pools"],
        json!(["PC2/IC1", "PC3/IC2"])
    );
    assert_eq!(body["summary"]["total_clusters"], 5);
}

#[tokio::test]
async fn test_download_rejects_traversal() {
    let app = setup_test_app().await;

    let (status, _) = get(app.router.clone(), "/download/..%2Fall.csv").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(app.router, "/download/nothing.json").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_healthz_and_readyz() {
    let app = setup_test_app().await;

    let (status, body) = get(app.router.clone(), "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    let health: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "healthy");

    // Not ready until startup completes
    let (status, _) = get(app.router.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    app.state.health_registry.set_ready(true).await;
    let (status, _) = get(app.router.clone(), "/readyz").await;
    assert_eq!(status, StatusCode::OK);

    app.state
        .health_registry
        .set_unhealthy(components::EXPORTER, "export dir not writable")
        .await;
    let (status, _) = get(app.router, "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup_test_app().await;

    post(
        app.router.clone(),
        "/api/migration",
        json!({"pool1": "PC1/IC1", "pool2": "PC2/IC1"}),
    )
    .await;

    let (status, body) = get(app.router, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    assert!(text.contains("pool_planner_analyses_total"));
    assert!(text.contains("pool_planner_inventory_rows"));
}
