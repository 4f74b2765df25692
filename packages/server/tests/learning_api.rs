//! API tests for the learning routes, driven through the router with mocks.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use harvester::testing::{MockFetcher, MockSearcher};
use harvester::{Harvester, HarvesterConfig};
use serde_json::{json, Value};
use server_core::server::build_app;
use tempfile::TempDir;
use tower::ServiceExt;

const PAGE_TEXT: &str = "Python generators\n\nUse yield to produce values lazily.";

fn app(dir: &TempDir) -> Router {
    let config = HarvesterConfig::new().with_knowledge_file(dir.path().join("kb.json"));
    let fetcher = MockFetcher::new().with_page("https://docs.python.org/3/gen", PAGE_TEXT);
    let harvester = Harvester::new(config, Arc::new(fetcher), Arc::new(MockSearcher::new()), None);
    build_app(Arc::new(harvester))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            request = request.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_enqueue() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(
        &app,
        "POST",
        "/api/learning/enqueue",
        Some(json!({"url": "https://docs.python.org/3/gen"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "message": "URL successfully added to queue"})
    );

    let (status, body) = send(
        &app,
        "POST",
        "/api/learning/enqueue",
        Some(json!({"url": "https://docs.python.org/3/gen"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Failed to add URL to queue");
}

#[tokio::test]
async fn test_missing_url_and_body() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(&app, "POST", "/api/learning/process", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "No URL provided"}));

    let (status, body) = send(&app, "POST", "/api/learning/enqueue", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "No data provided"}));
}

#[tokio::test]
async fn test_process_then_status_and_query() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(
        &app,
        "POST",
        "/api/learning/process",
        Some(json!({"url": "https://docs.python.org/3/gen"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true, "message": "URL successfully processed"}));

    let (status, body) = send(&app, "GET", "/api/learning/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
    assert_eq!(body["total_items"], 1);
    assert_eq!(body["categories"]["libraries"], 1);
    assert_eq!(body["processed_count"], 1);

    let (status, body) = send(
        &app,
        "GET",
        "/api/learning/knowledge?language=python&text=yield",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["item"]["title"], "Python generators");
    assert_eq!(body[0]["item"]["usage_count"], 1);
}

#[tokio::test]
async fn test_process_failure() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(
        &app,
        "POST",
        "/api/learning/process",
        Some(json!({"url": "https://docs.python.org/3/missing"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"success": false, "error": "Failed to process URL"}));

    let (status, body) =
        send(&app, "POST", "/api/learning/process", Some(json!({"url": "nope"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid URL");
}

#[tokio::test]
async fn test_content() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(
        &app,
        "POST",
        "/api/learning/content",
        Some(json!({"url": "https://docs.python.org/3/gen"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], PAGE_TEXT);

    let (_, status_body) = send(&app, "GET", "/api/learning/status", None).await;
    assert_eq!(status_body["queue_size"], 1);
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["knowledge_items"], 0);
}
