//! Rotation engine
//!
//! Keeps exactly one active proxy while running and moves it along the pool
//! on a timer, after a number of successful requests, on operator request,
//! or (under the aggressive strategy) as soon as the consumer reports a
//! failure.
//!
//! Lifecycle: `stopped -> running <-> paused -> stopped`. Every switch goes
//! through a single-flight guard; triggers that arrive while a switch is in
//! flight are dropped rather than queued. State lives behind short critical
//! sections that are never held across a probe.

pub mod consumer;
pub mod registry;
pub mod state;
pub mod stats;

pub use consumer::{ConsumerHandle, ProxyLease};
pub use registry::{HealthRegistry, RegistrySnapshot};
pub use state::{RotationSnapshot, RotationStatus};
pub use stats::{SessionStat, SessionStats};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::error::{Result, RotaError};
use crate::models::{
    ConnectionLogEntry, ProxyRecord, RotationEvent, RotationSettings, StopReason, SwitchMode,
    SwitchReason,
};
use crate::pool::{ConnectionLog, ProxyStore};
use crate::proxy::probe::{ConnectivityProber, ProbeResult};
use crate::proxy::rotation::{self, RotationStrategy};
use state::RotationState;

/// Period of the countdown heartbeat
const HEARTBEAT_PERIOD: Duration = Duration::from_secs(1);

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Result of a switch attempt that did not fail
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SwitchOutcome {
    Switched {
        from: Option<String>,
        to: String,
        latency_ms: Option<u32>,
    },
    /// Another switch was in flight, or the engine was not running
    Skipped,
    /// The run ended while a probe was outstanding
    Cancelled,
    LoopComplete {
        switch_count: u64,
    },
}

enum Walk {
    Found(String, ProbeResult),
    Exhausted,
    Cancelled,
}

fn start_cancelled() -> RotaError {
    RotaError::InvalidState("rotation was stopped while starting".into())
}

/// Releases the single-flight flag on drop
struct SwitchGuard<'a>(&'a AtomicBool);

impl Drop for SwitchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct RotationEngine {
    store: Arc<ProxyStore>,
    prober: Arc<dyn ConnectivityProber>,
    connection_log: Arc<ConnectionLog>,
    registry: HealthRegistry,
    stats: SessionStats,
    settings: RwLock<RotationSettings>,
    state: Mutex<RotationState>,
    switching: AtomicBool,
    events: broadcast::Sender<RotationEvent>,
    heartbeat: Mutex<Option<watch::Sender<bool>>>,
}

impl RotationEngine {
    pub fn new(
        store: Arc<ProxyStore>,
        prober: Arc<dyn ConnectivityProber>,
        settings: RotationSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            prober,
            connection_log: Arc::new(ConnectionLog::default()),
            registry: HealthRegistry::new(),
            stats: SessionStats::new(),
            settings: RwLock::new(settings),
            state: Mutex::new(RotationState::default()),
            switching: AtomicBool::new(false),
            events,
            heartbeat: Mutex::new(None),
        }
    }

    pub fn with_connection_log(mut self, log: Arc<ConnectionLog>) -> Self {
        self.connection_log = log;
        self
    }

    pub fn store(&self) -> &Arc<ProxyStore> {
        &self.store
    }

    pub fn registry(&self) -> &HealthRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn connection_log(&self) -> &Arc<ConnectionLog> {
        &self.connection_log
    }

    pub fn settings(&self) -> RotationSettings {
        self.settings.read().clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RotationEvent> {
        self.events.subscribe()
    }

    pub fn status(&self) -> RotationStatus {
        self.state.lock().status
    }

    pub fn run_id(&self) -> u64 {
        self.state.lock().run_id
    }

    pub fn is_switching(&self) -> bool {
        self.switching.load(Ordering::Acquire)
    }

    /// Address of the active proxy, if any
    pub fn active_proxy(&self) -> Option<String> {
        self.state.lock().active.clone()
    }

    /// Live record of the active proxy
    pub fn active_record(&self) -> Option<ProxyRecord> {
        let address = self.active_proxy()?;
        self.store.get(&address)
    }

    pub fn snapshot(&self) -> RotationSnapshot {
        let settings = self.settings();
        let state = self.state.lock();
        let active_proxy = state.active.as_deref().and_then(|a| self.store.get(a));
        let seconds_until_switch = (settings.switch_mode == SwitchMode::Timer
            && state.status != RotationStatus::Stopped)
            .then_some(state.seconds_until_switch);

        RotationSnapshot {
            status: state.status,
            active_proxy,
            current_index: state.current_index,
            switch_count: state.switch_count,
            successful_requests_since_switch: state.successful_requests_since_switch,
            loop_count: state.loop_count,
            initial_pool_size: state.initial_pool_size,
            seconds_until_switch,
            switch_in_progress: self.is_switching(),
            start_in_progress: state.starting,
            strategy: settings.strategy,
            switch_mode: settings.switch_mode,
            pool_size: self.store.len(),
            valid_count: self.store.valid_count(),
            downed_count: self.registry.downed_count(),
            removed_count: self.registry.removed_count(),
            started_at: state.started_at,
            last_switch_at: state.last_switch_at,
        }
    }

    /// Replace the rotation profile; takes effect from the next switch
    pub fn update_settings(&self, settings: RotationSettings) -> Result<()> {
        settings.validate()?;

        {
            let mut state = self.state.lock();
            if state.status != RotationStatus::Stopped {
                state.seconds_until_switch = state
                    .seconds_until_switch
                    .min(settings.switch_interval_secs);
            }
        }

        info!(
            strategy = %settings.strategy,
            switch_mode = ?settings.switch_mode,
            "Rotation settings updated"
        );
        *self.settings.write() = settings;
        Ok(())
    }

    /// Enter `running` and select the first active proxy
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        let settings = self.settings();
        settings.validate()?;

        if self.status() != RotationStatus::Stopped {
            return Err(RotaError::InvalidState(
                "rotation is already running".into(),
            ));
        }

        let valid = self.store.valid();
        if valid.is_empty() {
            return Err(RotaError::NoValidProxies);
        }

        let Some(_guard) = self.try_begin_switch() else {
            return Err(RotaError::InvalidState(
                "a switch is already in progress".into(),
            ));
        };

        let token = {
            let mut state = self.state.lock();
            if state.status != RotationStatus::Stopped || state.starting {
                return Err(RotaError::InvalidState(
                    "rotation is already starting".into(),
                ));
            }
            state.run_id += 1;
            state.starting = true;
            state.run_id
        };

        let mut downed = HashMap::new();
        if settings.pre_test_on_start {
            info!("Pre-testing {} proxies before start", valid.len());
            for record in &valid {
                let result = self.probe_candidate(&record.address).await;
                if !self.is_start_pending(token) {
                    info!("Start cancelled during pre-test");
                    return Err(start_cancelled());
                }
                if !result.success {
                    downed.insert(record.address.clone(), Utc::now());
                    self.emit(RotationEvent::ProbeFailed {
                        address: record.address.clone(),
                        message: result.message,
                    });
                }
            }

            if downed.len() == valid.len() {
                warn!("No proxy survived the pre-test, start aborted");
                self.abandon_start(token);
                self.registry.reset_with(downed);
                return Err(RotaError::NoWorkingProxies);
            }
            info!(
                "Pre-test complete: {} passed, {} failed",
                valid.len() - downed.len(),
                downed.len()
            );
        }

        if !self.is_start_pending(token) {
            return Err(start_cancelled());
        }
        self.stats.clear();
        self.registry.reset_with(downed);

        let run_id = {
            let mut state = self.state.lock();
            if !(state.starting && state.run_id == token) {
                return Err(start_cancelled());
            }
            state.reset_to_stopped();
            state.status = RotationStatus::Running;
            state.loop_count = settings.loop_count;
            state.initial_pool_size = valid.len();
            state.seconds_until_switch = settings.switch_interval_secs;
            state.started_at = Some(Utc::now());
            state.run_id
        };

        info!(
            pool_size = valid.len(),
            strategy = %settings.strategy,
            "Rotation started"
        );
        self.emit(RotationEvent::Started {
            pool_size: valid.len(),
        });

        match self.switch_locked(SwitchReason::Initial).await? {
            SwitchOutcome::Switched { .. } if self.is_current_run(run_id) => {
                self.spawn_heartbeat(run_id);
                Ok(())
            }
            outcome => {
                debug!("Initial selection ended with {:?}", outcome);
                Err(start_cancelled())
            }
        }
    }

    fn is_start_pending(&self, token: u64) -> bool {
        let state = self.state.lock();
        state.starting && state.run_id == token
    }

    fn abandon_start(&self, token: u64) {
        let mut state = self.state.lock();
        if state.starting && state.run_id == token {
            state.starting = false;
            state.run_id += 1;
        }
    }

    /// Leave `running`/`paused`; the registry and session stats are kept
    ///
    /// Safe to call at any time, including while `start` is pre-testing. A
    /// probe in flight is not aborted, but its result is discarded. Returns
    /// whether a run or a pending start was stopped.
    pub fn stop(&self) -> bool {
        self.stop_with(StopReason::Manual, None)
    }

    pub fn pause(&self) -> Result<()> {
        {
            let mut state = self.state.lock();
            if state.status != RotationStatus::Running {
                return Err(RotaError::InvalidState(format!(
                    "cannot pause while {}",
                    state.status
                )));
            }
            state.status = RotationStatus::Paused;
        }

        info!("Rotation paused");
        self.emit(RotationEvent::Paused);
        Ok(())
    }

    /// Back to `running`; if the active proxy was removed while paused the
    /// engine switches away from it before returning
    pub async fn resume(&self) -> Result<Option<SwitchOutcome>> {
        let active = {
            let mut state = self.state.lock();
            if state.status != RotationStatus::Paused {
                return Err(RotaError::InvalidState(format!(
                    "cannot resume while {}",
                    state.status
                )));
            }
            state.status = RotationStatus::Running;
            state.active.clone()
        };

        info!("Rotation resumed");
        self.emit(RotationEvent::Resumed);

        match active {
            Some(address) if self.registry.is_removed(&address) => {
                info!("Active proxy {} was removed while paused", address);
                self.switch(SwitchReason::Removed).await.map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Operator-requested switch; counts like any automatic switch
    pub async fn manual_switch(&self) -> Result<SwitchOutcome> {
        if self.status() != RotationStatus::Running {
            return Err(RotaError::InvalidState(
                "manual switch requires a running rotation".into(),
            ));
        }
        self.switch(SwitchReason::Manual).await
    }

    /// Attempt a switch unless one is already in flight
    pub async fn switch(&self, reason: SwitchReason) -> Result<SwitchOutcome> {
        let Some(_guard) = self.try_begin_switch() else {
            debug!(?reason, "Switch already in progress, trigger dropped");
            return Ok(SwitchOutcome::Skipped);
        };
        self.switch_locked(reason).await
    }

    /// Record a consumer outcome against the proxy it used
    ///
    /// `address` must be the proxy the consumer captured before issuing its
    /// request, not whatever is active now. Only outcomes for the current
    /// active proxy drive the request-count and aggressive triggers.
    pub async fn report_outcome(
        &self,
        address: &str,
        success: bool,
    ) -> Result<Option<SwitchOutcome>> {
        if success {
            self.stats.record_success(address);
        } else {
            self.stats.record_failure(address);
        }

        let settings = self.settings();
        let trigger = {
            let mut state = self.state.lock();
            if state.status != RotationStatus::Running || state.active.as_deref() != Some(address)
            {
                None
            } else if success {
                state.successful_requests_since_switch += 1;
                let counted = settings.switch_mode == SwitchMode::RequestCount
                    && settings.strategy != RotationStrategy::Aggressive;
                (counted
                    && state.successful_requests_since_switch >= settings.switch_request_count)
                    .then_some(SwitchReason::RequestCount)
            } else if settings.strategy == RotationStrategy::Aggressive {
                Some(SwitchReason::Failure)
            } else {
                None
            }
        };

        match trigger {
            Some(reason) => {
                debug!(address, ?reason, "Outcome triggered a switch");
                self.switch(reason).await.map(Some)
            }
            None => Ok(None),
        }
    }

    /// Take a proxy out of rotation until re-enabled or the next cycle reset
    ///
    /// Removing the active proxy of a running engine switches away from it.
    pub async fn remove_proxy(&self, address: &str) -> Result<Option<SwitchOutcome>> {
        self.ensure_known(address)?;
        self.registry.mark_removed(address);
        info!("Proxy {} temporarily removed from rotation", address);

        let is_active = {
            let state = self.state.lock();
            state.status == RotationStatus::Running && state.active.as_deref() == Some(address)
        };
        if is_active {
            return self.switch(SwitchReason::Removed).await.map(Some);
        }
        Ok(None)
    }

    /// Returns whether the proxy had been removed
    pub fn reenable_proxy(&self, address: &str) -> Result<bool> {
        self.ensure_known(address)?;
        let removed = self.registry.reenable(address);
        if removed {
            info!("Proxy {} re-enabled", address);
        }
        Ok(removed)
    }

    pub fn set_pinned(&self, address: &str, pinned: bool) -> Result<()> {
        self.store.set_pinned(address, pinned)?;
        info!("Proxy {} pinned: {}", address, pinned);
        Ok(())
    }

    /// Probe a proxy on demand and update its record and health entry
    pub async fn retest_proxy(&self, address: &str) -> Result<ProbeResult> {
        self.ensure_known(address)?;
        let result = self.probe_candidate(address).await;
        self.apply_health(address, &result);
        Ok(result)
    }

    /// Re-test for background sweeps; discarded unless the engine stays
    /// stopped for the whole probe
    pub async fn retest_when_idle(&self, address: &str) -> Option<ProbeResult> {
        let run_id = {
            let state = self.state.lock();
            if state.status != RotationStatus::Stopped || self.is_switching() {
                return None;
            }
            state.run_id
        };

        let result = self.probe_candidate(address).await;

        {
            let state = self.state.lock();
            if state.status != RotationStatus::Stopped || state.run_id != run_id {
                debug!("Engine left stopped during sweep probe of {}", address);
                return None;
            }
        }
        self.apply_health(address, &result);
        Some(result)
    }

    fn apply_health(&self, address: &str, result: &ProbeResult) {
        if result.success {
            self.registry.clear_down(address);
        } else {
            self.registry.mark_down(address);
        }
    }

    fn ensure_known(&self, address: &str) -> Result<()> {
        if self.store.contains(address) {
            Ok(())
        } else {
            Err(RotaError::ProxyNotFound {
                address: address.to_string(),
            })
        }
    }

    fn try_begin_switch(&self) -> Option<SwitchGuard<'_>> {
        self.switching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SwitchGuard(&self.switching))
    }

    fn is_current_run(&self, run_id: u64) -> bool {
        let state = self.state.lock();
        state.run_id == run_id && state.status != RotationStatus::Stopped
    }

    fn emit(&self, event: RotationEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// The switch algorithm proper; the caller holds the single-flight guard
    async fn switch_locked(&self, reason: SwitchReason) -> Result<SwitchOutcome> {
        let settings = self.settings();
        let (run_id, previous, switch_count, loop_count, pool_size) = {
            let state = self.state.lock();
            if state.status != RotationStatus::Running {
                return Ok(SwitchOutcome::Skipped);
            }
            (
                state.run_id,
                state.active.clone(),
                state.switch_count,
                state.loop_count,
                state.initial_pool_size,
            )
        };

        if !reason.is_initial() && loop_count > 0 {
            let limit = (u64::from(loop_count) * pool_size as u64).saturating_sub(1);
            if switch_count >= limit {
                info!(switch_count, loop_count, "Loop count reached, stopping rotation");
                if self.stop_with(StopReason::LoopComplete, Some(run_id)) {
                    self.emit(RotationEvent::LoopComplete { switch_count });
                }
                return Ok(SwitchOutcome::LoopComplete { switch_count });
            }
        }

        let mut candidates = self.eligible_candidates(&settings);
        let mut healed = false;
        if candidates.is_empty() {
            if let Some(recovered) = self.recover_candidates(&settings) {
                candidates = recovered;
                healed = true;
            }
        }

        loop {
            if candidates.is_empty() {
                break;
            }

            let ordered = rotation::order(
                candidates,
                settings.strategy,
                &self.stats,
                previous.as_deref(),
                &self.store.all(),
            );

            match self.walk(ordered, previous.as_deref(), run_id).await {
                Walk::Found(address, result) => {
                    return Ok(self.commit(address, result, reason, previous, run_id, &settings));
                }
                Walk::Cancelled => {
                    debug!("Rotation stopped while probing, switch abandoned");
                    return Ok(SwitchOutcome::Cancelled);
                }
                Walk::Exhausted => {}
            }

            // One more pass only if the failures just drained the pool and
            // the registry reset hands everyone another chance
            if healed || !self.eligible_candidates(&settings).is_empty() {
                break;
            }
            match self.recover_candidates(&settings) {
                Some(recovered) => {
                    candidates = recovered;
                    healed = true;
                }
                None => break,
            }
        }

        self.exhausted(run_id)
    }

    /// Valid, not removed, out of cooldown, passing the country/ISP filter
    fn eligible_candidates(&self, settings: &RotationSettings) -> Vec<ProxyRecord> {
        let now = Utc::now();
        let cooldown = settings.cooldown();

        self.store
            .valid()
            .into_iter()
            .filter(|r| !self.registry.is_removed(&r.address))
            .filter(|r| self.registry.is_eligible(&r.address, cooldown, now))
            .filter(|r| r.matches_filter(settings))
            .collect()
    }

    /// Reset the registry when it alone is starving the rotation
    fn recover_candidates(&self, settings: &RotationSettings) -> Option<Vec<ProxyRecord>> {
        if self.store.valid_count() == 0 || self.registry.is_empty() {
            return None;
        }

        warn!("No eligible proxies left, resetting health registry");
        self.registry.reset_all();
        self.emit(RotationEvent::RegistryReset);

        Some(
            self.store
                .valid()
                .into_iter()
                .filter(|r| r.matches_filter(settings))
                .collect(),
        )
    }

    async fn walk(&self, ordered: Vec<ProxyRecord>, active: Option<&str>, run_id: u64) -> Walk {
        let skip_active = ordered.len() > 1;

        for candidate in ordered {
            if skip_active && active == Some(candidate.address.as_str()) {
                continue;
            }

            let result = self.probe_candidate(&candidate.address).await;
            if !self.is_current_run(run_id) {
                return Walk::Cancelled;
            }

            if result.success {
                return Walk::Found(candidate.address, result);
            }

            debug!("Candidate {} failed: {}", candidate.address, result.message);
            self.registry.mark_down(&candidate.address);
            self.emit(RotationEvent::ProbeFailed {
                address: candidate.address,
                message: result.message,
            });
        }

        Walk::Exhausted
    }

    fn commit(
        &self,
        address: String,
        result: ProbeResult,
        reason: SwitchReason,
        previous: Option<String>,
        run_id: u64,
        settings: &RotationSettings,
    ) -> SwitchOutcome {
        let index = self.store.position(&address);

        let (switch_count, cycle_complete) = {
            let mut state = self.state.lock();
            if state.run_id != run_id || state.status == RotationStatus::Stopped {
                return SwitchOutcome::Cancelled;
            }

            state.active = Some(address.clone());
            state.current_index = index;
            if !reason.is_initial() {
                state.switch_count += 1;
            }
            state.successful_requests_since_switch = 0;
            state.seconds_until_switch = settings.switch_interval_secs;
            state.last_switch_at = Some(Utc::now());

            let cycle = state.initial_pool_size as u64;
            let cycle_complete =
                !reason.is_initial() && cycle > 0 && state.switch_count % cycle == 0;
            (state.switch_count, cycle_complete)
        };

        self.registry.clear_down(&address);

        if cycle_complete && self.registry.removed_count() > 0 {
            info!("Rotation cycle complete, re-admitting removed proxies");
            self.registry.clear_removed();
            self.emit(RotationEvent::ManualRemovalsCleared);
        }

        info!(
            from = previous.as_deref().unwrap_or("-"),
            to = %address,
            ?reason,
            switch_count,
            latency_ms = result.latency_ms,
            "Switched active proxy"
        );
        self.emit(RotationEvent::ProxySwitched {
            from: previous.clone(),
            to: address.clone(),
            reason,
            switch_count,
            latency_ms: result.latency_ms,
        });

        SwitchOutcome::Switched {
            from: previous,
            to: address,
            latency_ms: result.latency_ms,
        }
    }

    fn exhausted(&self, run_id: u64) -> Result<SwitchOutcome> {
        warn!("No working proxies left, stopping rotation");
        if self.stop_with(StopReason::PoolExhausted, Some(run_id)) {
            self.emit(RotationEvent::PoolExhausted);
        }
        Err(RotaError::NoWorkingProxies)
    }

    /// Probe through the adapter, logging the attempt and writing the
    /// measurement back into the record
    async fn probe_candidate(&self, address: &str) -> ProbeResult {
        self.connection_log
            .push(ConnectionLogEntry::pending(address, "testing connection"));

        let result = self.prober.probe(address).await;

        self.connection_log
            .push(ConnectionLogEntry::from_probe(address, &result));
        self.store.record_probe(address, &result);
        result
    }

    fn stop_with(&self, reason: StopReason, expected_run: Option<u64>) -> bool {
        {
            let mut state = self.state.lock();
            if expected_run.is_some_and(|run| run != state.run_id) {
                return false;
            }
            if state.status == RotationStatus::Stopped && !state.starting {
                return false;
            }
            state.reset_to_stopped();
        }

        if let Some(tx) = self.heartbeat.lock().take() {
            let _ = tx.send(true);
        }

        info!(?reason, "Rotation stopped");
        self.emit(RotationEvent::Stopped { reason });
        true
    }

    fn spawn_heartbeat(self: &Arc<Self>, run_id: u64) {
        let (tx, mut shutdown) = watch::channel(false);
        if let Some(previous) = self.heartbeat.lock().replace(tx) {
            let _ = previous.send(true);
        }

        let engine = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(HEARTBEAT_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !engine.on_tick(run_id).await {
                            break;
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
            debug!(run_id, "Rotation heartbeat stopped");
        });
    }

    /// One heartbeat: advance the countdown and fire the timer trigger.
    /// Returns false once the run is over.
    async fn on_tick(&self, run_id: u64) -> bool {
        let timer_mode = self.settings.read().switch_mode == SwitchMode::Timer;

        let due = {
            let mut state = self.state.lock();
            if state.run_id != run_id || state.status == RotationStatus::Stopped {
                return false;
            }
            if state.status == RotationStatus::Paused || !timer_mode {
                return true;
            }
            state.seconds_until_switch = state.seconds_until_switch.saturating_sub(1);
            state.seconds_until_switch == 0
        };

        if due {
            if let Err(e) = self.switch(SwitchReason::Timer).await {
                error!("Timer switch failed: {}", e);
            }
        }
        true
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::sync::Notify;

    use crate::proxy::probe::{ConnectivityProber, ProbeResult};

    /// Prober answering from a per-address script; unscripted addresses
    /// succeed with a fixed latency
    #[derive(Default)]
    pub struct ScriptedProber {
        scripts: Mutex<HashMap<String, VecDeque<bool>>>,
        always_fail: Mutex<Vec<String>>,
        gates: Mutex<HashMap<String, Arc<Notify>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedProber {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn script(&self, address: &str, outcomes: &[bool]) {
            self.scripts
                .lock()
                .insert(address.to_string(), outcomes.iter().copied().collect());
        }

        pub fn fail_always(&self, address: &str) {
            self.always_fail.lock().push(address.to_string());
        }

        /// Hold the next check of `address` until the returned gate is
        /// notified; later checks of it are not held
        pub fn gate(&self, address: &str) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            self.gates.lock().insert(address.to_string(), gate.clone());
            gate
        }

        /// Yield until `address` has been checked `count` times
        pub async fn wait_for_calls(&self, address: &str, count: usize) {
            while self.calls_for(address) < count {
                tokio::task::yield_now().await;
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }

        pub fn calls_for(&self, address: &str) -> usize {
            self.calls.lock().iter().filter(|a| *a == address).count()
        }
    }

    #[async_trait]
    impl ConnectivityProber for ScriptedProber {
        async fn probe(&self, address: &str) -> ProbeResult {
            self.calls.lock().push(address.to_string());

            let gate = self.gates.lock().remove(address);
            if let Some(gate) = gate {
                gate.notified().await;
            }

            if self.always_fail.lock().iter().any(|a| a == address) {
                return ProbeResult::failure("scripted failure");
            }
            let scripted = self
                .scripts
                .lock()
                .get_mut(address)
                .and_then(|outcomes| outcomes.pop_front());
            match scripted {
                Some(false) => ProbeResult::failure("scripted failure"),
                _ => ProbeResult::success(100),
            }
        }
    }
}
