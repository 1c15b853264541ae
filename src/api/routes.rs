//! API route definitions

use axum::routing::{get, post};
use axum::Router;

use super::handlers;
use super::server::AppState;
use super::websocket;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api", api_routes())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(handlers::health::status))
        // Lifecycle
        .route("/rotation/start", post(handlers::rotation::start))
        .route("/rotation/stop", post(handlers::rotation::stop))
        .route("/rotation/pause", post(handlers::rotation::pause))
        .route("/rotation/resume", post(handlers::rotation::resume))
        .route("/rotation/switch", post(handlers::rotation::switch))
        // Pool and manual overrides
        .route("/proxies", get(handlers::proxies::list_proxies))
        .route("/proxies/validate", post(handlers::proxies::validate_proxies))
        .route("/proxies/:address/remove", post(handlers::proxies::remove_proxy))
        .route(
            "/proxies/:address/reenable",
            post(handlers::proxies::reenable_proxy),
        )
        .route("/proxies/:address/pin", post(handlers::proxies::pin_proxy))
        .route("/proxies/:address/unpin", post(handlers::proxies::unpin_proxy))
        .route("/proxies/:address/retest", post(handlers::proxies::retest_proxy))
        // Consumer integration
        .route("/proxy/active", get(handlers::consumer::active_proxy))
        .route("/proxy/report", post(handlers::consumer::report_outcome))
        // Observability
        .route("/stats", get(handlers::stats::get_stats))
        .route("/connection-logs", get(handlers::stats::connection_logs))
        // Settings
        .route(
            "/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        // WebSocket
        .route("/ws/events", get(websocket::events::events_ws))
}
