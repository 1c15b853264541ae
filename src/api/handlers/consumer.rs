//! Consumer integration handlers

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::api::server::AppState;
use crate::engine::ProxyLease;
use crate::error::RotaError;

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub address: String,
    /// Run the lease was taken in; omitted reports are not run-checked
    pub run_id: Option<u64>,
    pub success: bool,
}

/// Lease the active proxy
pub async fn active_proxy(State(state): State<AppState>) -> Result<impl IntoResponse, RotaError> {
    let lease = state
        .consumer
        .acquire()
        .ok_or_else(|| RotaError::InvalidState("rotation is not running".into()))?;
    let record = state.engine.store().get(&lease.address);

    Ok(Json(json!({
        "lease": lease,
        "proxy": record,
    })))
}

pub async fn report_outcome(
    State(state): State<AppState>,
    Json(req): Json<ReportRequest>,
) -> Result<impl IntoResponse, RotaError> {
    if req.address.trim().is_empty() {
        return Err(RotaError::InvalidRequest("address is required".into()));
    }

    let outcome = match req.run_id {
        Some(run_id) => {
            let lease = ProxyLease {
                address: req.address,
                run_id,
                acquired_at: Utc::now(),
            };
            state.consumer.report(&lease, req.success).await?
        }
        None => state.engine.report_outcome(&req.address, req.success).await?,
    };

    Ok(Json(json!({
        "recorded": true,
        "switch": outcome,
    })))
}
