//! Sequential candidate ordering

use super::CandidateOrdering;
use crate::engine::stats::SessionStats;
use crate::models::ProxyRecord;

/// Keeps pool order
///
/// Also backs the aggressive strategy, which differs only in when the engine
/// triggers a switch.
pub struct SequentialOrdering {
    name: &'static str,
}

impl SequentialOrdering {
    pub fn new() -> Self {
        Self { name: "sequential" }
    }

    pub fn aggressive() -> Self {
        Self { name: "aggressive" }
    }
}

impl Default for SequentialOrdering {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateOrdering for SequentialOrdering {
    fn order(&self, candidates: Vec<ProxyRecord>, _stats: &SessionStats) -> Vec<ProxyRecord> {
        candidates
    }

    fn strategy_name(&self) -> &'static str {
        self.name
    }
}
