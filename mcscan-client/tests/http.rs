//! End-to-end tests of the reqwest transport against an in-process backend

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use mcscan_client::{ClientError, RequestOptions, ResilientClient, RetryPolicy};
use mcscan_core::dto::job::{StartScan, extract_job_id};
use mcscan_core::{JobRequest, ScanState, normalize};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Clone, Default)]
struct Backend {
    result_calls: Arc<AtomicUsize>,
}

async fn start_scan(Json(req): Json<Value>) -> Json<Value> {
    if req["directory"] == "/missing" {
        return Json(json!({ "success": false, "message": "directory does not exist" }));
    }

    Json(json!({
        "success": true,
        "data": {
            "scan_id": uuid::Uuid::new_v4().to_string(),
            "directory": req["directory"],
            "incremental": req["incremental"],
            "status": "started",
        },
    }))
}

async fn scan_status(Path(id): Path<String>) -> Response {
    if id == "gone" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Scan not found" })),
        )
            .into_response();
    }

    Json(json!({
        "success": true,
        "data": {
            "scan_id": id,
            "status": "scanning",
            "progress": 50.0,
            "current_file": "example_mod.jar",
            "processed_files": 5,
            "total_files": 10,
            "started_at": "2024-01-01T00:00:00Z",
        },
    }))
    .into_response()
}

// Fails twice with 503 before answering.
async fn scan_results(State(backend): State<Backend>, Path(id): Path<String>) -> Response {
    if backend.result_calls.fetch_add(1, Ordering::SeqCst) < 2 {
        return (StatusCode::SERVICE_UNAVAILABLE, "warming up").into_response();
    }

    Json(json!({ "success": true, "data": { "scan_id": id, "mods": [], "errors": [] } }))
        .into_response()
}

async fn active_scans() -> Json<Value> {
    Json(json!({ "success": true, "data": { "active_scans": [{ "scan_id": "a" }], "total": 1 } }))
}

async fn spawn_backend(backend: Backend) -> anyhow::Result<String> {
    let app = Router::new()
        .route("/api/v1/scan/start", post(start_scan))
        .route("/api/v1/scan/status/{id}", get(scan_status))
        .route("/api/v1/scan/results/{id}", get(scan_results))
        .route("/api/v1/scan/active", get(active_scans))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok(format!("http://{}/api/v1", addr))
}

fn fast_retries() -> RetryPolicy {
    RetryPolicy::new(Duration::from_millis(10), Duration::from_millis(50), 3)
}

#[tokio::test]
async fn test_start_and_status_round_trip() -> anyhow::Result<()> {
    let base_url = spawn_backend(Backend::default()).await?;
    let client = ResilientClient::new(base_url).with_retry_policy(fast_retries());
    let options = RequestOptions::default();

    let request = JobRequest::new("/instances/pack/mods");
    let started = client.start_scan(&StartScan::from(&request), &options).await?;
    let scan_id = extract_job_id(&started.body).expect("scan id");
    assert_eq!(started.data()["incremental"], true);

    let status = client.scan_status(&scan_id, &options).await?;
    let status = normalize(&scan_id, status.data());
    assert_eq!(status.status, ScanState::Running);
    assert_eq!(status.progress, 50.0);
    assert_eq!(status.processed_items, 5);
    assert_eq!(status.current_item.as_deref(), Some("example_mod.jar"));

    Ok(())
}

#[tokio::test]
async fn test_not_found_is_http_client_error() -> anyhow::Result<()> {
    let base_url = spawn_backend(Backend::default()).await?;
    let client = ResilientClient::new(base_url).with_retry_policy(fast_retries());

    let err = client
        .scan_status("gone", &RequestOptions::default())
        .await
        .unwrap_err();

    match err {
        ClientError::HttpClient { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Scan not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn test_rejected_start() -> anyhow::Result<()> {
    let base_url = spawn_backend(Backend::default()).await?;
    let client = ResilientClient::new(base_url);

    let request = JobRequest::new("/missing");
    let err = client
        .start_scan(&StartScan::from(&request), &RequestOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Rejected { .. }));
    Ok(())
}

#[tokio::test]
async fn test_unavailable_backend_is_retried() -> anyhow::Result<()> {
    let backend = Backend::default();
    let base_url = spawn_backend(backend.clone()).await?;
    let client = ResilientClient::new(base_url).with_retry_policy(fast_retries());

    let results = client
        .scan_results("abc", &RequestOptions::default())
        .await?;

    assert_eq!(backend.result_calls.load(Ordering::SeqCst), 3);
    assert_eq!(results.data()["scan_id"], "abc");
    Ok(())
}

#[tokio::test]
async fn test_active_scans() -> anyhow::Result<()> {
    let base_url = spawn_backend(Backend::default()).await?;
    let client = ResilientClient::new(base_url);

    let active = client.active_scans(&RequestOptions::default()).await?;
    assert_eq!(active.total, 1);
    assert_eq!(active.active_scans.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_connection_refused_is_network_error() -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let client = ResilientClient::new(format!("http://{}/api/v1", addr))
        .with_retry_policy(RetryPolicy::none());
    let err = client
        .scan_status("abc", &RequestOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Network(_)), "{err:?}");
    Ok(())
}
