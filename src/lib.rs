//! Rota Switch - active proxy rotation engine
//!
//! Keeps one proxy active at a time and rotates it on a timer, after a
//! number of successful requests, on demand, or on failure.
//!
//! ## Features
//!
//! - Sequential, random, health, latency, pinned-first and adaptive ordering
//! - Failure cooldowns with automatic registry recovery
//! - Loop limits, pause/resume and manual overrides
//! - Lease-based consumer reporting
//! - Background health sweeps and bounded-concurrency validation batches
//! - JSON control API with a WebSocket event stream

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod pool;
pub mod proxy;
pub mod services;

pub use config::Config;
pub use engine::{ConsumerHandle, ProxyLease, RotationEngine, SwitchOutcome};
pub use error::{Result, RotaError};
