use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;

use crate::server::app::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    knowledge_items: usize,
    queue_size: usize,
    is_learning: bool,
}

/// Health check endpoint
///
/// Always 200 while the process serves requests; reports the size of the
/// knowledge base and frontier for quick inspection.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let status = state.harvester.status();

    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            knowledge_items: status.total_items,
            queue_size: status.queue_size,
            is_learning: status.is_learning,
        }),
    )
}
