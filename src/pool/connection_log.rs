//! Bounded history of connectivity attempts

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::models::ConnectionLogEntry;

pub const DEFAULT_CONNECTION_LOG_CAPACITY: usize = 200;

/// Ring buffer of connection attempts, most recent first
#[derive(Debug)]
pub struct ConnectionLog {
    entries: Mutex<VecDeque<ConnectionLogEntry>>,
    capacity: usize,
}

impl ConnectionLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest one on overflow
    pub fn push(&self, entry: ConnectionLogEntry) {
        let mut entries = self.entries.lock();
        entries.push_front(entry);
        entries.truncate(self.capacity);
    }

    /// Up to `limit` entries, newest first
    pub fn recent(&self, limit: usize) -> Vec<ConnectionLogEntry> {
        self.entries.lock().iter().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for ConnectionLog {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECTION_LOG_CAPACITY)
    }
}
