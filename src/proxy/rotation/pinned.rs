//! Pinned-first candidate ordering

use super::CandidateOrdering;
use crate::engine::stats::SessionStats;
use crate::models::ProxyRecord;

/// Restricts rotation to pinned proxies while any of them is eligible
///
/// Candidates arrive already filtered for eligibility, so "any pinned
/// candidate" means "any pinned proxy currently eligible". Without one the
/// full set is used. Pool order is kept either way.
pub struct PinnedFirstOrdering;

impl CandidateOrdering for PinnedFirstOrdering {
    fn order(&self, candidates: Vec<ProxyRecord>, _stats: &SessionStats) -> Vec<ProxyRecord> {
        if !candidates.iter().any(|r| r.is_pinned) {
            return candidates;
        }
        candidates.into_iter().filter(|r| r.is_pinned).collect()
    }

    fn strategy_name(&self) -> &'static str {
        "prioritize_pinned"
    }
}
