//! WebSocket handlers
//!
//! Each connection gets a bounded buffer fed with `try_send`; a slow client
//! loses events instead of growing memory.

pub mod events;

/// Maximum number of messages to buffer per WebSocket connection
pub const WS_BUFFER_SIZE: usize = 256;
