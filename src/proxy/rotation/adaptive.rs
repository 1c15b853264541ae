//! Adaptive candidate ordering
//!
//! Blends what this session has observed about a proxy with what the
//! validator measured:
//!
//! ```text
//! score = 0.5 * session_success_ratio + 0.3 * latency_score + 0.2 * health
//! ```
//!
//! The success ratio is Laplace-smoothed, `(s + 1) / (s + f + 2)`, so a proxy
//! with no history starts at 0.5. Latency is capped at [`LATENCY_CAP_MS`] and
//! a missing measurement scores 0. Health defaults to 0.5 when absent.

use std::cmp::Ordering;

use super::CandidateOrdering;
use crate::engine::stats::{SessionStat, SessionStats};
use crate::models::ProxyRecord;

/// Latency at or above which the latency component bottoms out
pub const LATENCY_CAP_MS: u32 = 3000;

const SUCCESS_WEIGHT: f64 = 0.5;
const LATENCY_WEIGHT: f64 = 0.3;
const HEALTH_WEIGHT: f64 = 0.2;

/// Composite score in `[0, 1]`, higher is better
pub fn adaptive_score(record: &ProxyRecord, stat: SessionStat) -> f64 {
    let latency_score = match record.latency_ms {
        Some(latency) => 1.0 - f64::from(latency.min(LATENCY_CAP_MS)) / f64::from(LATENCY_CAP_MS),
        None => 0.0,
    };
    let health = record
        .health_score
        .map(|h| f64::from(h.min(100)) / 100.0)
        .unwrap_or(0.5);

    SUCCESS_WEIGHT * stat.success_ratio() + LATENCY_WEIGHT * latency_score + HEALTH_WEIGHT * health
}

/// Highest composite score first
pub struct AdaptiveOrdering;

impl CandidateOrdering for AdaptiveOrdering {
    fn order(&self, candidates: Vec<ProxyRecord>, stats: &SessionStats) -> Vec<ProxyRecord> {
        let mut scored: Vec<(f64, ProxyRecord)> = candidates
            .into_iter()
            .map(|r| (adaptive_score(&r, stats.get(&r.address)), r))
            .collect();

        scored.sort_by(|(a, _), (b, _)| b.partial_cmp(a).unwrap_or(Ordering::Equal));
        scored.into_iter().map(|(_, r)| r).collect()
    }

    fn strategy_name(&self) -> &'static str {
        "adaptive"
    }
}
