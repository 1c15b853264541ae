//! Rotation lifecycle handlers

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use tracing::info;

use crate::api::server::AppState;
use crate::error::RotaError;

pub async fn start(State(state): State<AppState>) -> Result<impl IntoResponse, RotaError> {
    state.engine.start().await?;
    Ok(Json(state.engine.snapshot()))
}

/// Always succeeds; reports whether a run was actually stopped
pub async fn stop(State(state): State<AppState>) -> impl IntoResponse {
    let stopped = state.engine.stop();
    Json(json!({
        "stopped": stopped,
        "rotation": state.engine.snapshot(),
    }))
}

pub async fn pause(State(state): State<AppState>) -> Result<impl IntoResponse, RotaError> {
    state.engine.pause()?;
    Ok(Json(state.engine.snapshot()))
}

pub async fn resume(State(state): State<AppState>) -> Result<impl IntoResponse, RotaError> {
    if let Some(outcome) = state.engine.resume().await? {
        info!("Resume switched away from a removed proxy: {:?}", outcome);
    }
    Ok(Json(state.engine.snapshot()))
}

/// Manual switch
pub async fn switch(State(state): State<AppState>) -> Result<impl IntoResponse, RotaError> {
    let outcome = state.engine.manual_switch().await?;
    info!("Manual switch via API: {:?}", outcome);
    Ok(Json(json!({
        "result": outcome,
        "rotation": state.engine.snapshot(),
    })))
}
