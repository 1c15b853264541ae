//! Per-session success/failure counters

use std::collections::BTreeMap;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Outcomes reported against one proxy during the current session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStat {
    pub success: u64,
    pub fail: u64,
}

impl SessionStat {
    pub fn total(&self) -> u64 {
        self.success + self.fail
    }

    /// Laplace-smoothed success ratio; 0.5 with no history
    pub fn success_ratio(&self) -> f64 {
        (self.success as f64 + 1.0) / (self.total() as f64 + 2.0)
    }
}

/// Session statistics keyed by proxy address
///
/// Cleared when the engine starts a new run, kept across `stop` for
/// inspection.
#[derive(Debug, Default)]
pub struct SessionStats {
    stats: DashMap<String, SessionStat>,
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            stats: DashMap::new(),
        }
    }

    pub fn record_success(&self, address: &str) {
        self.stats
            .entry(address.to_string())
            .and_modify(|s| s.success += 1)
            .or_insert(SessionStat {
                success: 1,
                fail: 0,
            });
    }

    pub fn record_failure(&self, address: &str) {
        self.stats
            .entry(address.to_string())
            .and_modify(|s| s.fail += 1)
            .or_insert(SessionStat {
                success: 0,
                fail: 1,
            });
    }

    pub fn get(&self, address: &str) -> SessionStat {
        self.stats.get(address).map(|s| *s).unwrap_or_default()
    }

    /// Copy of all counters, sorted by address
    pub fn snapshot(&self) -> BTreeMap<String, SessionStat> {
        self.stats
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    pub fn clear(&self) {
        self.stats.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}
