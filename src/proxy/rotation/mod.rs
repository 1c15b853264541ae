//! Proxy rotation strategies
//!
//! Each strategy orders an eligible candidate set; the engine then walks the
//! ordered list, probing candidates until one answers. Ordering is pure:
//! strategies never touch the pool or the registry.

mod adaptive;
mod health_based;
mod latency_based;
mod pinned;
mod random;
mod sequential;

pub use adaptive::{adaptive_score, AdaptiveOrdering, LATENCY_CAP_MS};
pub use health_based::HealthBasedOrdering;
pub use latency_based::{LatencyBasedOrdering, MISSING_LATENCY_MS};
pub use pinned::PinnedFirstOrdering;
pub use random::RandomOrdering;
pub use sequential::SequentialOrdering;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::engine::stats::SessionStats;
use crate::models::ProxyRecord;

/// Strategy types for proxy rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationStrategy {
    #[default]
    Sequential,
    Random,
    HealthBased,
    LatencyBased,
    /// Sequential order, but any reported failure forces a switch
    Aggressive,
    PrioritizePinned,
    Adaptive,
}

impl RotationStrategy {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "random" => Self::Random,
            "health_based" | "healthbased" | "health-based" | "health" => Self::HealthBased,
            "latency_based" | "latencybased" | "latency-based" | "latency" => Self::LatencyBased,
            "aggressive" => Self::Aggressive,
            "prioritize_pinned" | "prioritize-pinned" | "pinned" => Self::PrioritizePinned,
            "adaptive" => Self::Adaptive,
            _ => Self::Sequential,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Random => "random",
            Self::HealthBased => "health_based",
            Self::LatencyBased => "latency_based",
            Self::Aggressive => "aggressive",
            Self::PrioritizePinned => "prioritize_pinned",
            Self::Adaptive => "adaptive",
        }
    }

    /// Whether the ordered list keeps the pool's relative order
    pub fn preserves_pool_order(&self) -> bool {
        matches!(
            self,
            Self::Sequential | Self::Aggressive | Self::PrioritizePinned
        )
    }
}

impl std::fmt::Display for RotationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for candidate ordering strategies
pub trait CandidateOrdering: Send + Sync {
    /// Order the eligible candidates, best first
    fn order(&self, candidates: Vec<ProxyRecord>, stats: &SessionStats) -> Vec<ProxyRecord>;

    /// Get the strategy name
    fn strategy_name(&self) -> &'static str;
}

/// Create an ordering based on the strategy type
pub fn create_ordering(strategy: RotationStrategy) -> Box<dyn CandidateOrdering> {
    match strategy {
        RotationStrategy::Sequential => Box::new(SequentialOrdering::new()),
        RotationStrategy::Random => Box::new(RandomOrdering::new()),
        RotationStrategy::HealthBased => Box::new(HealthBasedOrdering),
        RotationStrategy::LatencyBased => Box::new(LatencyBasedOrdering),
        RotationStrategy::Aggressive => Box::new(SequentialOrdering::aggressive()),
        RotationStrategy::PrioritizePinned => Box::new(PinnedFirstOrdering),
        RotationStrategy::Adaptive => Box::new(AdaptiveOrdering),
    }
}

/// Order candidates and rotate the result so iteration starts right after
/// the active proxy
///
/// `pool` is the full record table in pool order; it locates an active proxy
/// that is no longer among the candidates so order-preserving strategies
/// still continue from where the rotation left off.
pub fn order(
    candidates: Vec<ProxyRecord>,
    strategy: RotationStrategy,
    stats: &SessionStats,
    active: Option<&str>,
    pool: &[ProxyRecord],
) -> Vec<ProxyRecord> {
    let ordered = create_ordering(strategy).order(candidates, stats);
    match active {
        Some(active) => rotate_after_active(ordered, active, strategy, pool),
        None => ordered,
    }
}

fn rotate_after_active(
    mut ordered: Vec<ProxyRecord>,
    active: &str,
    strategy: RotationStrategy,
    pool: &[ProxyRecord],
) -> Vec<ProxyRecord> {
    let len = ordered.len();
    if len == 0 {
        return ordered;
    }

    if let Some(pos) = ordered.iter().position(|r| r.address == active) {
        ordered.rotate_left((pos + 1) % len);
        return ordered;
    }

    if !strategy.preserves_pool_order() {
        return ordered;
    }

    let pool_index: HashMap<&str, usize> = pool
        .iter()
        .enumerate()
        .map(|(i, r)| (r.address.as_str(), i))
        .collect();
    let Some(&active_index) = pool_index.get(active) else {
        return ordered;
    };

    let start = ordered
        .iter()
        .position(|r| {
            pool_index
                .get(r.address.as_str())
                .is_some_and(|&i| i > active_index)
        })
        .unwrap_or(0);
    ordered.rotate_left(start);
    ordered
}
