use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unified error type for the rotation engine and its control API
#[derive(Error, Debug)]
pub enum RotaError {
    // Pool errors
    #[error("No valid proxies in the pool")]
    NoValidProxies,

    #[error("No working proxies available")]
    NoWorkingProxies,

    #[error("Proxy not found: {address}")]
    ProxyNotFound { address: String },

    #[error("Invalid proxy address: {0}")]
    InvalidProxyAddress(String),

    // Engine errors
    #[error("Invalid rotation state: {0}")]
    InvalidState(String),

    #[error("A validation batch is already running")]
    BatchInProgress,

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for rotation operations
pub type Result<T> = std::result::Result<T, RotaError>;

impl RotaError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            RotaError::InvalidRequest(_)
            | RotaError::InvalidProxyAddress(_)
            | RotaError::InvalidConfig(_) => StatusCode::BAD_REQUEST,

            // 404 Not Found
            RotaError::ProxyNotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            RotaError::InvalidState(_) | RotaError::BatchInProgress => StatusCode::CONFLICT,

            // 422 Unprocessable Entity
            RotaError::NoValidProxies => StatusCode::UNPROCESSABLE_ENTITY,

            // 503 Service Unavailable
            RotaError::NoWorkingProxies => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            RotaError::Io(_) | RotaError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for RotaError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "error": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

impl From<url::ParseError> for RotaError {
    fn from(err: url::ParseError) -> Self {
        RotaError::InvalidConfig(err.to_string())
    }
}
