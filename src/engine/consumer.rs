//! Consumer integration
//!
//! A workload acquires a lease on the active proxy before issuing a request
//! and reports the outcome against that lease afterwards, so a switch that
//! happens while the request is in flight never misattributes the result.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use super::{RotationEngine, RotationStatus, SwitchOutcome};
use crate::error::Result;
use crate::models::RotationEvent;

/// Snapshot of the active proxy taken before a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyLease {
    pub address: String,
    pub run_id: u64,
    pub acquired_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct ConsumerHandle {
    engine: Arc<RotationEngine>,
}

impl ConsumerHandle {
    pub fn new(engine: Arc<RotationEngine>) -> Self {
        Self { engine }
    }

    /// Lease the active proxy; `None` unless the engine is running with an
    /// active proxy that has not been removed
    pub fn acquire(&self) -> Option<ProxyLease> {
        if self.engine.status() != RotationStatus::Running {
            return None;
        }
        let run_id = self.engine.run_id();
        let address = self.engine.active_proxy()?;
        if self.engine.registry().is_removed(&address) {
            return None;
        }

        Some(ProxyLease {
            address,
            run_id,
            acquired_at: Utc::now(),
        })
    }

    /// Report the outcome of a request made through `lease`
    ///
    /// Leases from an earlier run are dropped: the session statistics they
    /// would feed have been cleared.
    pub async fn report(&self, lease: &ProxyLease, success: bool) -> Result<Option<SwitchOutcome>> {
        if lease.run_id != self.engine.run_id() {
            debug!(
                address = %lease.address,
                lease_run = lease.run_id,
                "Dropping outcome for a lease from an earlier run"
            );
            return Ok(None);
        }
        self.engine.report_outcome(&lease.address, success).await
    }

    /// Stream of engine events, including forced rotations
    pub fn subscribe(&self) -> broadcast::Receiver<RotationEvent> {
        self.engine.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::ScriptedProber;
    use crate::models::{ProxyRecord, RotationSettings, SwitchMode, SwitchReason};
    use crate::pool::ProxyStore;
    use crate::proxy::rotation::RotationStrategy;

    fn engine(settings: RotationSettings) -> Arc<RotationEngine> {
        let store = Arc::new(ProxyStore::with_records(vec![
            ProxyRecord::valid("a:1"),
            ProxyRecord::valid("b:1"),
        ]));
        Arc::new(RotationEngine::new(store, ScriptedProber::new(), settings))
    }

    #[tokio::test]
    async fn test_acquire_requires_running_engine() {
        let engine = engine(RotationSettings::default());
        let consumer = ConsumerHandle::new(engine.clone());
        assert!(consumer.acquire().is_none());

        engine.start().await.unwrap();
        let lease = consumer.acquire().unwrap();
        assert_eq!(lease.address, "a:1");
        assert_eq!(lease.run_id, engine.run_id());

        engine.pause().unwrap();
        assert!(consumer.acquire().is_none());
    }

    #[tokio::test]
    async fn test_report_uses_leased_address_after_switch() {
        let settings = RotationSettings {
            switch_mode: SwitchMode::RequestCount,
            switch_request_count: 2,
            ..RotationSettings::default()
        };
        let engine = engine(settings);
        let consumer = ConsumerHandle::new(engine.clone());
        engine.start().await.unwrap();

        let lease = consumer.acquire().unwrap();
        engine.switch(SwitchReason::Manual).await.unwrap();

        // the outcome lands on a, which is no longer active
        let outcome = consumer.report(&lease, true).await.unwrap();
        assert!(outcome.is_none());
        assert_eq!(engine.stats().get("a:1").success, 1);
        assert_eq!(engine.snapshot().successful_requests_since_switch, 0);
    }

    #[tokio::test]
    async fn test_stale_run_lease_is_dropped() {
        let engine = engine(RotationSettings::default());
        let consumer = ConsumerHandle::new(engine.clone());
        engine.start().await.unwrap();
        let lease = consumer.acquire().unwrap();

        engine.stop();
        engine.start().await.unwrap();

        tokio_test::assert_ok!(consumer.report(&lease, false).await);
        assert!(engine.stats().is_empty());
    }

    #[tokio::test]
    async fn test_aggressive_failure_is_broadcast() {
        let settings = RotationSettings {
            strategy: RotationStrategy::Aggressive,
            ..RotationSettings::default()
        };
        let engine = engine(settings);
        let consumer = ConsumerHandle::new(engine.clone());
        engine.start().await.unwrap();
        let mut events = consumer.subscribe();

        let lease = consumer.acquire().unwrap();
        consumer.report(&lease, false).await.unwrap();

        match events.recv().await.unwrap() {
            RotationEvent::ProxySwitched { to, reason, .. } => {
                assert_eq!(to, "b:1");
                assert_eq!(reason, SwitchReason::Failure);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_proxy_removed_while_paused_is_never_leased() {
        let engine = engine(RotationSettings::default());
        let consumer = ConsumerHandle::new(engine.clone());
        engine.start().await.unwrap();

        engine.pause().unwrap();
        assert!(engine.remove_proxy("a:1").await.unwrap().is_none());
        assert_eq!(engine.active_proxy().as_deref(), Some("a:1"));

        let outcome = engine.resume().await.unwrap();
        assert!(matches!(outcome, Some(SwitchOutcome::Switched { ref to, .. }) if to == "b:1"));
        let lease = consumer.acquire().unwrap();
        assert_eq!(lease.address, "b:1");
    }
}
