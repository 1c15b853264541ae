//! Latency candidate ordering

use super::CandidateOrdering;
use crate::engine::stats::SessionStats;
use crate::models::ProxyRecord;

/// Sort key for proxies that were never measured; worse than any real value
pub const MISSING_LATENCY_MS: u64 = u64::MAX;

/// Lowest measured latency first, untested proxies last
pub struct LatencyBasedOrdering;

impl CandidateOrdering for LatencyBasedOrdering {
    fn order(&self, mut candidates: Vec<ProxyRecord>, _stats: &SessionStats) -> Vec<ProxyRecord> {
        candidates.sort_by_key(|r| r.latency_ms.map(u64::from).unwrap_or(MISSING_LATENCY_MS));
        candidates
    }

    fn strategy_name(&self) -> &'static str {
        "latency_based"
    }
}
