//! Control API
//!
//! JSON endpoints and a WebSocket event stream over the rotation engine.

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod websocket;

pub use server::{ApiServer, AppState};
