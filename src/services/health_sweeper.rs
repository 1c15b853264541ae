//! Background health sweeper
//!
//! While the engine is stopped and no validation batch is running, re-probes
//! a handful of the least recently checked valid proxies so the pool's
//! latency and downed state stay fresh between runs.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, instrument};

use super::validation::ValidationService;
use crate::engine::{RotationEngine, RotationStatus};

/// Health sweeper configuration
#[derive(Debug, Clone)]
pub struct HealthSweeperConfig {
    /// Interval between sweeps
    pub interval: Duration,
    /// Proxies re-probed per sweep
    pub batch_size: usize,
}

impl Default for HealthSweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            batch_size: 5,
        }
    }
}

/// Counts from one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub checked: usize,
    pub healthy: usize,
    /// The sweep stopped early because the engine left `stopped`
    pub aborted: bool,
}

pub struct HealthSweeper {
    engine: Arc<RotationEngine>,
    validation: Arc<ValidationService>,
    config: HealthSweeperConfig,
}

impl HealthSweeper {
    pub fn new(
        engine: Arc<RotationEngine>,
        validation: Arc<ValidationService>,
        config: HealthSweeperConfig,
    ) -> Self {
        Self {
            engine,
            validation,
            config,
        }
    }

    /// Run the sweeper (call in a spawned task)
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Starting health sweeper with {}s interval",
            self.config.interval.as_secs()
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately; the pool was just loaded
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(report) = self.sweep_once().await {
                        info!(
                            "Health sweep complete: {}/{} healthy{}",
                            report.healthy,
                            report.checked,
                            if report.aborted { " (aborted)" } else { "" }
                        );
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Health sweeper shutting down");
                        break;
                    }
                }
            }
        }
    }

    fn is_idle(&self) -> bool {
        self.engine.status() == RotationStatus::Stopped && !self.validation.is_running()
    }

    /// One sweep; `None` when skipped because something else is busy
    pub async fn sweep_once(&self) -> Option<SweepReport> {
        if !self.is_idle() {
            debug!("Engine or validation busy, skipping health sweep");
            return None;
        }

        let targets = self
            .engine
            .store()
            .least_recently_checked(self.config.batch_size);
        if targets.is_empty() {
            return None;
        }

        let mut report = SweepReport::default();
        for address in targets {
            if !self.is_idle() {
                report.aborted = true;
                break;
            }

            match self.engine.retest_when_idle(&address).await {
                Some(result) => {
                    report.checked += 1;
                    if result.success {
                        report.healthy += 1;
                    }
                }
                None => {
                    report.aborted = true;
                    break;
                }
            }
        }

        Some(report)
    }
}

/// Guard for managing health sweeper lifecycle
pub struct HealthSweeperHandle {
    shutdown_tx: watch::Sender<bool>,
}

impl HealthSweeperHandle {
    pub fn new() -> (Self, watch::Receiver<bool>) {
        let (tx, rx) = watch::channel(false);
        (Self { shutdown_tx: tx }, rx)
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
