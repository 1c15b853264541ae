//! Health and status endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::api::server::AppState;

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "rota-switch"
        })),
    )
}

/// Engine snapshot plus process uptime
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "validation_running": state.validation.is_running(),
        "rotation": state.engine.snapshot(),
    }))
}
