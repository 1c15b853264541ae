//! Control API server using Axum
//!
//! Exposes the rotation engine over JSON endpoints and a WebSocket event
//! stream.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::config::ApiServerConfig;
use crate::engine::{ConsumerHandle, RotationEngine};
use crate::error::{Result, RotaError};
use crate::services::ValidationService;

use super::middleware::cors_layer;
use super::routes;

/// Shared state for API handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RotationEngine>,
    pub consumer: ConsumerHandle,
    pub validation: Arc<ValidationService>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(engine: Arc<RotationEngine>, validation: Arc<ValidationService>) -> Self {
        Self {
            consumer: ConsumerHandle::new(engine.clone()),
            engine,
            validation,
            started_at: Instant::now(),
        }
    }
}

/// API server
pub struct ApiServer {
    config: ApiServerConfig,
    state: AppState,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Build the router with CORS and request tracing
    pub fn router(&self) -> Router {
        let cors = cors_layer(&self.config.cors_origins);

        routes::create_router(self.state.clone())
            .layer(cors)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server until `shutdown` flips
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|e| RotaError::InvalidConfig(format!("invalid API address: {}", e)))?;

        let router = self.router();

        info!("API server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
            })
            .await
            .map_err(|e| RotaError::Internal(e.to_string()))?;

        info!("API server shut down");
        Ok(())
    }
}
