//! Random candidate ordering

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::CandidateOrdering;
use crate::engine::stats::SessionStats;
use crate::models::ProxyRecord;

/// Uniform shuffle, reseeded on every call unless a seed is fixed
pub struct RandomOrdering {
    seed: Option<u64>,
}

impl RandomOrdering {
    pub fn new() -> Self {
        Self { seed: None }
    }

    /// Deterministic shuffle, for reproducible runs
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

impl Default for RandomOrdering {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateOrdering for RandomOrdering {
    fn order(&self, mut candidates: Vec<ProxyRecord>, _stats: &SessionStats) -> Vec<ProxyRecord> {
        match self.seed {
            Some(seed) => candidates.shuffle(&mut StdRng::seed_from_u64(seed)),
            None => candidates.shuffle(&mut rand::thread_rng()),
        }
        candidates
    }

    fn strategy_name(&self) -> &'static str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{addresses, record};
    use super::*;

    fn candidates() -> Vec<ProxyRecord> {
        (1..=8).map(|i| record(&format!("10.0.0.{}:80", i))).collect()
    }

    #[test]
    fn test_random_is_a_permutation() {
        let ordered = RandomOrdering::new().order(candidates(), &SessionStats::new());

        let mut got = addresses(&ordered);
        got.sort();
        let expected = candidates();
        let mut want = addresses(&expected);
        want.sort();
        assert_eq!(got, want);
    }

    #[test]
    fn test_seeded_random_is_deterministic() {
        let stats = SessionStats::new();
        let first = RandomOrdering::with_seed(42).order(candidates(), &stats);
        let second = RandomOrdering::with_seed(42).order(candidates(), &stats);
        assert_eq!(addresses(&first), addresses(&second));
    }

    #[test]
    fn test_random_empty_and_single() {
        let stats = SessionStats::new();
        assert!(RandomOrdering::new().order(vec![], &stats).is_empty());

        let ordered = RandomOrdering::new().order(vec![record("a:1")], &stats);
        assert_eq!(addresses(&ordered), vec!["a:1"]);
    }
}
