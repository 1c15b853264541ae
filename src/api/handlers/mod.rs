//! API request handlers

pub mod consumer;
pub mod health;
pub mod proxies;
pub mod rotation;
pub mod settings;
pub mod stats;
