//! Health registry
//!
//! Two soft-exclusion structures over the proxy pool:
//!
//! - `downed`: proxies that failed a probe, with the failure time. They become
//!   eligible again once the cooldown has elapsed, and are cleared by the
//!   next successful probe.
//! - `removed`: proxies the operator took out of rotation. Cleared by
//!   re-enabling them, or by the engine once per full rotation cycle.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

#[derive(Debug, Default)]
struct RegistryInner {
    downed: HashMap<String, DateTime<Utc>>,
    removed: HashSet<String>,
}

/// Serializable view of the registry
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegistrySnapshot {
    pub downed: BTreeMap<String, DateTime<Utc>>,
    pub removed: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct HealthRegistry {
    inner: RwLock<RegistryInner>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed probe now
    pub fn mark_down(&self, address: &str) {
        self.mark_down_at(address, Utc::now());
    }

    pub fn mark_down_at(&self, address: &str, failed_at: DateTime<Utc>) {
        self.inner
            .write()
            .downed
            .insert(address.to_string(), failed_at);
    }

    pub fn clear_down(&self, address: &str) {
        self.inner.write().downed.remove(address);
    }

    pub fn is_down(&self, address: &str) -> bool {
        self.inner.read().downed.contains_key(address)
    }

    /// An address is eligible when it never failed, or failed at least
    /// `cooldown` before `now`
    pub fn is_eligible(&self, address: &str, cooldown: Duration, now: DateTime<Utc>) -> bool {
        let inner = self.inner.read();
        let Some(failed_at) = inner.downed.get(address) else {
            return true;
        };

        let cooldown = chrono::Duration::from_std(cooldown).unwrap_or(chrono::Duration::MAX);
        match failed_at.checked_add_signed(cooldown) {
            Some(eligible_at) => now >= eligible_at,
            None => false,
        }
    }

    pub fn mark_removed(&self, address: &str) {
        self.inner.write().removed.insert(address.to_string());
    }

    /// Returns whether the address was removed
    pub fn reenable(&self, address: &str) -> bool {
        self.inner.write().removed.remove(address)
    }

    pub fn is_removed(&self, address: &str) -> bool {
        self.inner.read().removed.contains(address)
    }

    pub fn clear_removed(&self) {
        self.inner.write().removed.clear();
    }

    pub fn removed_count(&self) -> usize {
        self.inner.read().removed.len()
    }

    pub fn downed_count(&self) -> usize {
        self.inner.read().downed.len()
    }

    /// Clear both the cooldown map and the removal set
    pub fn reset_all(&self) {
        let mut inner = self.inner.write();
        inner.downed.clear();
        inner.removed.clear();
    }

    /// Replace the registry with a fresh one whose cooldown map holds `downed`
    pub fn reset_with(&self, downed: HashMap<String, DateTime<Utc>>) {
        let mut inner = self.inner.write();
        inner.downed = downed;
        inner.removed.clear();
    }

    pub fn is_empty(&self) -> bool {
        let inner = self.inner.read();
        inner.downed.is_empty() && inner.removed.is_empty()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let inner = self.inner.read();
        RegistrySnapshot {
            downed: inner
                .downed
                .iter()
                .map(|(k, v)| (k.clone(), *v))
                .collect(),
            removed: inner.removed.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_secs(300);

    #[test]
    fn test_unknown_address_is_eligible() {
        let registry = HealthRegistry::new();
        assert!(registry.is_eligible("a:1", COOLDOWN, Utc::now()));
    }

    #[test]
    fn test_cooldown_window_boundaries() {
        let registry = HealthRegistry::new();
        let failed_at = Utc::now();
        registry.mark_down_at("a:1", failed_at);

        assert!(!registry.is_eligible("a:1", COOLDOWN, failed_at));
        assert!(!registry.is_eligible(
            "a:1",
            COOLDOWN,
            failed_at + chrono::Duration::seconds(299)
        ));
        assert!(!registry.is_eligible(
            "a:1",
            COOLDOWN,
            failed_at + chrono::Duration::milliseconds(299_999)
        ));
        assert!(registry.is_eligible(
            "a:1",
            COOLDOWN,
            failed_at + chrono::Duration::seconds(300)
        ));
    }

    #[test]
    fn test_zero_cooldown_is_immediately_eligible() {
        let registry = HealthRegistry::new();
        let failed_at = Utc::now();
        registry.mark_down_at("a:1", failed_at);
        assert!(registry.is_eligible("a:1", Duration::ZERO, failed_at));
    }

    #[test]
    fn test_clear_down_restores_eligibility() {
        let registry = HealthRegistry::new();
        registry.mark_down("a:1");
        assert!(registry.is_down("a:1"));
        assert!(!registry.is_eligible("a:1", COOLDOWN, Utc::now()));

        registry.clear_down("a:1");
        assert!(registry.is_eligible("a:1", COOLDOWN, Utc::now()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_manual_removal_and_reenable() {
        let registry = HealthRegistry::new();
        registry.mark_removed("a:1");
        assert!(registry.is_removed("a:1"));
        assert_eq!(registry.removed_count(), 1);

        assert!(registry.reenable("a:1"));
        assert!(!registry.reenable("a:1"));
        assert!(!registry.is_removed("a:1"));
    }

    #[test]
    fn test_reset_all_clears_both_structures() {
        let registry = HealthRegistry::new();
        registry.mark_down("a:1");
        registry.mark_removed("b:1");
        assert!(!registry.is_empty());

        registry.reset_all();
        assert!(registry.is_empty());
        assert_eq!(registry.downed_count(), 0);
    }

    #[test]
    fn test_reset_with_seeds_downed() {
        let registry = HealthRegistry::new();
        registry.mark_removed("b:1");
        registry.mark_down("c:1");

        let mut seed = HashMap::new();
        seed.insert("a:1".to_string(), Utc::now());
        registry.reset_with(seed);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.downed.keys().collect::<Vec<_>>(), vec!["a:1"]);
        assert!(snapshot.removed.is_empty());
    }
}
