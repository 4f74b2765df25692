//! Learning API: enqueue, process, fetch content, status and knowledge queries.

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    Json,
};
use harvester::{KnowledgeHit, LearningStatus, DEFAULT_QUERY_LIMIT};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::server::app::AppState;

type JsonResponse = (StatusCode, Json<Value>);

/// Request body carrying a URL
#[derive(Debug, Deserialize)]
pub struct UrlRequest {
    #[serde(default)]
    pub url: Option<String>,
}

/// Query string for knowledge retrieval
#[derive(Debug, Default, Deserialize)]
pub struct KnowledgeQuery {
    pub topic: Option<String>,
    pub language: Option<String>,
    pub text: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    status: &'static str,
    #[serde(flatten)]
    learning: LearningStatus,
}

fn bad_request(body: Value) -> JsonResponse {
    (StatusCode::BAD_REQUEST, Json(body))
}

/// Pull the URL out of a request body, or the 400 to answer with
fn require_url(payload: Option<Json<UrlRequest>>) -> Result<String, JsonResponse> {
    let Some(Json(request)) = payload else {
        return Err(bad_request(json!({"error": "No data provided"})));
    };

    match request.url.map(|u| u.trim().to_string()) {
        Some(url) if !url.is_empty() => Ok(url),
        _ => Err(bad_request(json!({"error": "No URL provided"}))),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// POST /api/learning/enqueue
pub async fn enqueue_handler(
    Extension(state): Extension<AppState>,
    payload: Option<Json<UrlRequest>>,
) -> JsonResponse {
    let url = match require_url(payload) {
        Ok(url) => url,
        Err(response) => return response,
    };

    if state.harvester.enqueue(&url) {
        tracing::info!(url = %url, "URL queued via API");
        (
            StatusCode::OK,
            Json(json!({"success": true, "message": "URL successfully added to queue"})),
        )
    } else {
        bad_request(json!({"success": false, "error": "Failed to add URL to queue"}))
    }
}

/// POST /api/learning/process
pub async fn process_handler(
    Extension(state): Extension<AppState>,
    payload: Option<Json<UrlRequest>>,
) -> JsonResponse {
    let url = match require_url(payload) {
        Ok(url) => url,
        Err(response) => return response,
    };

    let report = state.harvester.process_now(&url).await;
    let status = if report.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(json!(report)))
}

/// POST /api/learning/content
pub async fn content_handler(
    Extension(state): Extension<AppState>,
    payload: Option<Json<UrlRequest>>,
) -> JsonResponse {
    let url = match require_url(payload) {
        Ok(url) => url,
        Err(response) => return response,
    };

    let content = state.harvester.fetch_content(&url).await;
    (StatusCode::OK, Json(json!({"content": content})))
}

/// GET /api/learning/status
pub async fn status_handler(Extension(state): Extension<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "active",
        learning: state.harvester.status(),
    })
}

/// GET /api/learning/knowledge?topic&language&text&limit
pub async fn knowledge_handler(
    Extension(state): Extension<AppState>,
    Query(query): Query<KnowledgeQuery>,
) -> Json<Vec<KnowledgeHit>> {
    let topic = non_empty(query.topic);
    let language = non_empty(query.language);
    let text = non_empty(query.text);

    Json(state.harvester.query_knowledge(
        topic.as_deref(),
        language.as_deref(),
        text.as_deref(),
        query.limit.unwrap_or(DEFAULT_QUERY_LIMIT),
    ))
}
