//! Proxy pool handlers: listing, validation batches and manual overrides

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::api::server::AppState;
use crate::error::RotaError;
use crate::models::ProxyRecord;
use crate::services::ValidationOptions;

/// A pool record annotated with its rotation state
#[derive(Debug, Serialize)]
pub struct ProxyView {
    #[serde(flatten)]
    pub record: ProxyRecord,
    pub is_active: bool,
    pub is_down: bool,
    pub is_removed: bool,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub addresses: Vec<String>,
    pub target_url: Option<String>,
    #[serde(default)]
    pub options: ValidationOptions,
}

pub async fn list_proxies(State(state): State<AppState>) -> impl IntoResponse {
    let engine = &state.engine;
    let active = engine.active_proxy();
    let registry = engine.registry();

    let proxies: Vec<ProxyView> = engine
        .store()
        .all()
        .into_iter()
        .map(|record| ProxyView {
            is_active: active.as_deref() == Some(record.address.as_str()),
            is_down: registry.is_down(&record.address),
            is_removed: registry.is_removed(&record.address),
            record,
        })
        .collect();

    Json(json!({
        "total": proxies.len(),
        "proxies": proxies,
    }))
}

/// Run a validation batch and load the results into the pool
pub async fn validate_proxies(
    State(state): State<AppState>,
    Json(req): Json<ValidateRequest>,
) -> Result<impl IntoResponse, RotaError> {
    let target_url = req
        .target_url
        .as_deref()
        .map(Url::parse)
        .transpose()
        .map_err(|e| RotaError::InvalidRequest(format!("invalid target_url: {}", e)))?;

    let summary = state
        .validation
        .run_batch(req.addresses, target_url, req.options)
        .await?;
    Ok(Json(summary))
}

pub async fn remove_proxy(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, RotaError> {
    let outcome = state.engine.remove_proxy(&address).await?;
    Ok(Json(json!({
        "address": address,
        "removed": true,
        "switch": outcome,
    })))
}

pub async fn reenable_proxy(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, RotaError> {
    let was_removed = state.engine.reenable_proxy(&address)?;
    Ok(Json(json!({
        "address": address,
        "was_removed": was_removed,
    })))
}

pub async fn pin_proxy(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, RotaError> {
    state.engine.set_pinned(&address, true)?;
    Ok(Json(json!({ "address": address, "is_pinned": true })))
}

pub async fn unpin_proxy(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, RotaError> {
    state.engine.set_pinned(&address, false)?;
    Ok(Json(json!({ "address": address, "is_pinned": false })))
}

pub async fn retest_proxy(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, RotaError> {
    let result = state.engine.retest_proxy(&address).await?;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::test_support::{app_with, send};
    use crate::engine::test_support::ScriptedProber;

    #[tokio::test]
    async fn test_list_proxies_annotates_state() {
        let (state, app) = app_with(&["a:1", "b:1"], ScriptedProber::new());
        state.engine.start().await.unwrap();
        state.engine.remove_proxy("b:1").await.unwrap();

        let (status, body) = send(&app, "GET", "/api/proxies", None).await;
        assert_eq!(status, 200);
        assert_eq!(body["total"], 2);
        assert_eq!(body["proxies"][0]["address"], "a:1");
        assert_eq!(body["proxies"][0]["is_active"], true);
        assert_eq!(body["proxies"][1]["is_removed"], true);
    }

    #[tokio::test]
    async fn test_pin_and_unpin() {
        let (state, app) = app_with(&["a:1"], ScriptedProber::new());

        let (status, _) = send(&app, "POST", "/api/proxies/a:1/pin", None).await;
        assert_eq!(status, 200);
        assert!(state.engine.store().get("a:1").unwrap().is_pinned);

        let (status, _) = send(&app, "POST", "/api/proxies/a:1/unpin", None).await;
        assert_eq!(status, 200);
        assert!(!state.engine.store().get("a:1").unwrap().is_pinned);

        let (status, _) = send(&app, "POST", "/api/proxies/z:1/pin", None).await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_remove_and_reenable() {
        let (state, app) = app_with(&["a:1", "b:1"], ScriptedProber::new());

        let (status, body) = send(&app, "POST", "/api/proxies/b:1/remove", None).await;
        assert_eq!(status, 200);
        assert!(body["switch"].is_null());
        assert!(state.engine.registry().is_removed("b:1"));

        let (status, body) = send(&app, "POST", "/api/proxies/b:1/reenable", None).await;
        assert_eq!(status, 200);
        assert_eq!(body["was_removed"], true);
    }

    #[tokio::test]
    async fn test_retest_reports_probe_result() {
        let prober = ScriptedProber::new();
        prober.fail_always("a:1");
        let (state, app) = app_with(&["a:1"], prober);

        let (status, body) = send(&app, "POST", "/api/proxies/a:1/retest", None).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], false);
        assert!(state.engine.registry().is_down("a:1"));
    }

    #[tokio::test]
    async fn test_validate_rejects_bad_target_url() {
        let (_, app) = app_with(&[], ScriptedProber::new());
        let (status, _) = send(
            &app,
            "POST",
            "/api/proxies/validate",
            Some(json!({ "addresses": ["a:1"], "target_url": "not a url" })),
        )
        .await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_validate_rejects_empty_batch() {
        let (_, app) = app_with(&[], ScriptedProber::new());
        let (status, _) = send(
            &app,
            "POST",
            "/api/proxies/validate",
            Some(json!({ "addresses": [] })),
        )
        .await;
        assert_eq!(status, 400);
    }
}
