//! Rotation settings handlers

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::api::server::AppState;
use crate::error::RotaError;
use crate::models::RotationSettings;

pub async fn get_settings(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.engine.settings())
}

/// Replace the rotation profile; applies from the next switch
pub async fn update_settings(
    State(state): State<AppState>,
    Json(settings): Json<RotationSettings>,
) -> Result<impl IntoResponse, RotaError> {
    state.engine.update_settings(settings)?;
    Ok(Json(state.engine.settings()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::test_support::{app_with, send};
    use crate::engine::test_support::ScriptedProber;
    use crate::proxy::rotation::RotationStrategy;

    #[tokio::test]
    async fn test_update_settings_applies_partial_body() {
        let (state, app) = app_with(&["a:1"], ScriptedProber::new());

        let (status, body) = send(
            &app,
            "PUT",
            "/api/settings",
            Some(json!({ "strategy": "latency_based", "cooldown_minutes": 1 })),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["strategy"], "latency_based");
        assert_eq!(state.engine.settings().strategy, RotationStrategy::LatencyBased);
        assert_eq!(state.engine.settings().cooldown_minutes, 1);

        let (status, body) = send(&app, "GET", "/api/settings", None).await;
        assert_eq!(status, 200);
        assert_eq!(body["cooldown_minutes"], 1);
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let (_, app) = app_with(&["a:1"], ScriptedProber::new());
        let (status, _) = send(
            &app,
            "PUT",
            "/api/settings",
            Some(json!({ "switch_interval_secs": 0 })),
        )
        .await;
        assert_eq!(status, 400);
    }
}
