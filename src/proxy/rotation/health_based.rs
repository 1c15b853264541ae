//! Health-score candidate ordering

use std::cmp::Reverse;

use super::CandidateOrdering;
use crate::engine::stats::SessionStats;
use crate::models::ProxyRecord;

/// Highest health score first; a missing score counts as 0
pub struct HealthBasedOrdering;

impl CandidateOrdering for HealthBasedOrdering {
    fn order(&self, mut candidates: Vec<ProxyRecord>, _stats: &SessionStats) -> Vec<ProxyRecord> {
        candidates.sort_by_key(|r| Reverse(r.health_score.unwrap_or(0)));
        candidates
    }

    fn strategy_name(&self) -> &'static str {
        "health_based"
    }
}
