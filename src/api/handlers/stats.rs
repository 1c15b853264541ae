//! Session statistics and connection log handlers

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::api::server::AppState;

const DEFAULT_LOG_LIMIT: usize = 50;

#[derive(Debug, Deserialize, Default)]
pub struct LogQuery {
    pub limit: Option<usize>,
}

/// Per-proxy session counters and the health registry
pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    let engine = &state.engine;
    let sessions = engine.stats().snapshot();
    let (success, fail) = sessions
        .values()
        .fold((0u64, 0u64), |(s, f), stat| (s + stat.success, f + stat.fail));

    Json(json!({
        "total_success": success,
        "total_fail": fail,
        "proxies": sessions,
        "registry": engine.registry().snapshot(),
    }))
}

/// Most recent connectivity attempts, newest first
pub async fn connection_logs(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> impl IntoResponse {
    let log = state.engine.connection_log();
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT);

    Json(json!({
        "capacity": log.capacity(),
        "entries": log.recent(limit),
    }))
}
