//! Validated proxy table

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;

use crate::error::{Result, RotaError};
use crate::models::ProxyRecord;
use crate::proxy::probe::ProbeResult;

#[derive(Debug, Default)]
struct StoreInner {
    records: Vec<ProxyRecord>,
    /// address -> position in `records`
    index: HashMap<String, usize>,
}

impl StoreInner {
    fn get(&self, address: &str) -> Option<&ProxyRecord> {
        self.index.get(address).map(|&i| &self.records[i])
    }

    fn get_mut(&mut self, address: &str) -> Option<&mut ProxyRecord> {
        let i = *self.index.get(address)?;
        self.records.get_mut(i)
    }
}

/// In-memory table of proxy records, keyed by address, kept in pool order
///
/// Records are mutated in place and never removed; exclusion from rotation is
/// the health registry's job.
#[derive(Debug, Default)]
pub struct ProxyStore {
    inner: RwLock<StoreInner>,
}

impl ProxyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ProxyRecord>) -> Self {
        let store = Self::new();
        store.upsert_many(records);
        store
    }

    /// Insert new records and overwrite existing ones in place
    ///
    /// An overwritten record keeps its pin flag so a re-validation batch does
    /// not undo operator choices. Returns the number of new addresses.
    pub fn upsert_many(&self, incoming: Vec<ProxyRecord>) -> usize {
        let mut inner = self.inner.write();
        let mut added = 0;

        for mut record in incoming {
            match inner.get_mut(&record.address) {
                Some(existing) => {
                    record.is_pinned = existing.is_pinned;
                    *existing = record;
                }
                None => {
                    let position = inner.records.len();
                    inner.index.insert(record.address.clone(), position);
                    inner.records.push(record);
                    added += 1;
                }
            }
        }

        added
    }

    pub fn get(&self, address: &str) -> Option<ProxyRecord> {
        self.inner.read().get(address).cloned()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.inner.read().index.contains_key(address)
    }

    /// Position of an address in pool order
    pub fn position(&self, address: &str) -> Option<usize> {
        self.inner.read().index.get(address).copied()
    }

    pub fn all(&self) -> Vec<ProxyRecord> {
        self.inner.read().records.clone()
    }

    /// Valid records in pool order
    pub fn valid(&self) -> Vec<ProxyRecord> {
        self.inner
            .read()
            .records
            .iter()
            .filter(|r| r.is_valid)
            .cloned()
            .collect()
    }

    pub fn valid_count(&self) -> usize {
        self.inner.read().records.iter().filter(|r| r.is_valid).count()
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    /// Write a probe result back into the record
    ///
    /// Every probe refreshes `last_checked_at`; only a successful one replaces
    /// the latency measurement.
    pub fn record_probe(&self, address: &str, result: &ProbeResult) -> bool {
        let mut inner = self.inner.write();
        let Some(record) = inner.get_mut(address) else {
            return false;
        };

        record.last_checked_at = Some(Utc::now());
        if result.success && result.latency_ms.is_some() {
            record.latency_ms = result.latency_ms;
        }
        true
    }

    pub fn set_pinned(&self, address: &str, pinned: bool) -> Result<()> {
        let mut inner = self.inner.write();
        let record = inner
            .get_mut(address)
            .ok_or_else(|| RotaError::ProxyNotFound {
                address: address.to_string(),
            })?;
        record.is_pinned = pinned;
        Ok(())
    }

    /// Addresses of the `limit` valid proxies checked longest ago
    ///
    /// Never-checked proxies come first, ties keep pool order.
    pub fn least_recently_checked(&self, limit: usize) -> Vec<String> {
        let mut valid: Vec<_> = self
            .inner
            .read()
            .records
            .iter()
            .filter(|r| r.is_valid)
            .map(|r| (r.last_checked_at, r.address.clone()))
            .collect();

        // `None` orders before any `Some`
        valid.sort_by_key(|(checked, _)| *checked);
        valid
            .into_iter()
            .take(limit)
            .map(|(_, address)| address)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_upsert_preserves_order_and_pin() {
        let store = ProxyStore::new();
        let added = store.upsert_many(vec![
            ProxyRecord::valid("10.0.0.1:80"),
            ProxyRecord::valid("10.0.0.2:80"),
        ]);
        assert_eq!(added, 2);
        store.set_pinned("10.0.0.1:80", true).unwrap();

        let mut revalidated = ProxyRecord::new("10.0.0.1:80");
        revalidated.latency_ms = Some(50);
        let added = store.upsert_many(vec![revalidated, ProxyRecord::valid("10.0.0.3:80")]);
        assert_eq!(added, 1);

        let all = store.all();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].address, "10.0.0.1:80");
        assert!(all[0].is_pinned);
        assert!(!all[0].is_valid);
        assert_eq!(all[0].latency_ms, Some(50));
        assert_eq!(store.position("10.0.0.3:80"), Some(2));
        assert_eq!(store.valid_count(), 2);
    }

    #[test]
    fn test_record_probe_updates_latency_on_success_only() {
        let store = ProxyStore::with_records(vec![ProxyRecord::valid("10.0.0.1:80")]);

        assert!(store.record_probe("10.0.0.1:80", &ProbeResult::success(120)));
        let record = store.get("10.0.0.1:80").unwrap();
        assert_eq!(record.latency_ms, Some(120));
        assert!(record.last_checked_at.is_some());

        store.record_probe("10.0.0.1:80", &ProbeResult::failure("timeout"));
        assert_eq!(store.get("10.0.0.1:80").unwrap().latency_ms, Some(120));

        assert!(!store.record_probe("10.9.9.9:80", &ProbeResult::success(1)));
    }

    #[test]
    fn test_index_tracks_duplicates_within_one_batch() {
        let mut second = ProxyRecord::valid("10.0.0.1:80");
        second.latency_ms = Some(7);
        let store = ProxyStore::with_records(vec![
            ProxyRecord::valid("10.0.0.1:80"),
            ProxyRecord::valid("10.0.0.2:80"),
            second,
        ]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.position("10.0.0.2:80"), Some(1));
        assert_eq!(store.get("10.0.0.1:80").unwrap().latency_ms, Some(7));
        assert!(store.contains("10.0.0.2:80"));
        assert!(!store.contains("10.0.0.3:80"));
        assert_eq!(store.position("10.0.0.3:80"), None);
    }

    #[test]
    fn test_set_pinned_unknown_address() {
        let store = ProxyStore::new();
        assert!(matches!(
            store.set_pinned("10.0.0.1:80", true),
            Err(RotaError::ProxyNotFound { .. })
        ));
    }

    #[test]
    fn test_least_recently_checked() {
        let now = Utc::now();
        let mut a = ProxyRecord::valid("a:1");
        a.last_checked_at = Some(now);
        let mut b = ProxyRecord::valid("b:1");
        b.last_checked_at = Some(now - Duration::minutes(10));
        let c = ProxyRecord::valid("c:1");
        let mut d = ProxyRecord::new("d:1");
        d.last_checked_at = None;

        let store = ProxyStore::with_records(vec![a, b, c, d]);

        assert_eq!(store.least_recently_checked(2), vec!["c:1", "b:1"]);
        assert_eq!(store.least_recently_checked(10), vec!["c:1", "b:1", "a:1"]);
    }
}
