//! Proxy pool storage
//!
//! The record table the engine rotates over and the connection attempt log.

pub mod connection_log;
pub mod store;

pub use connection_log::{ConnectionLog, DEFAULT_CONNECTION_LOG_CAPACITY};
pub use store::ProxyStore;
