//! Connectivity prober boundary
//!
//! The engine validates a candidate through this interface before committing
//! to it. Implementations never fail: every transport problem is folded into
//! a `ProbeResult` with `success == false`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::debug;

/// Result of a round-trip through a candidate proxy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub success: bool,
    pub latency_ms: Option<u32>,
    pub ip: Option<String>,
    pub location: Option<String>,
    pub status_code: Option<u16>,
    pub response_excerpt: Option<String>,
    pub message: String,
}

impl ProbeResult {
    pub fn success(latency_ms: u32) -> Self {
        Self {
            success: true,
            latency_ms: Some(latency_ms),
            ip: None,
            location: None,
            status_code: None,
            response_excerpt: None,
            message: format!("connected in {} ms", latency_ms),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            latency_ms: None,
            ip: None,
            location: None,
            status_code: None,
            response_excerpt: None,
            message: message.into(),
        }
    }
}

/// Performs a network round-trip through a proxy
#[async_trait]
pub trait ConnectivityProber: Send + Sync {
    /// Probe a proxy by address. Must return within bounded time.
    async fn probe(&self, address: &str) -> ProbeResult;
}

#[async_trait]
impl<P: ConnectivityProber + ?Sized> ConnectivityProber for Arc<P> {
    async fn probe(&self, address: &str) -> ProbeResult {
        (**self).probe(address).await
    }
}

/// Enforces a deadline on any prober
pub struct TimeoutProber<P> {
    inner: P,
    deadline: Duration,
}

impl<P: ConnectivityProber> TimeoutProber<P> {
    pub fn new(inner: P, deadline: Duration) -> Self {
        Self { inner, deadline }
    }
}

#[async_trait]
impl<P: ConnectivityProber> ConnectivityProber for TimeoutProber<P> {
    async fn probe(&self, address: &str) -> ProbeResult {
        match timeout(self.deadline, self.inner.probe(address)).await {
            Ok(result) => result,
            Err(_) => {
                debug!("Probe of {} exceeded {:?}", address, self.deadline);
                ProbeResult::failure(format!(
                    "probe timed out after {} ms",
                    self.deadline.as_millis()
                ))
            }
        }
    }
}
