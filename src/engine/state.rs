//! Rotation state machine variables

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{ProxyRecord, SwitchMode};
use crate::proxy::rotation::RotationStrategy;

/// Lifecycle of the rotation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationStatus {
    #[default]
    Stopped,
    Running,
    Paused,
}

impl RotationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationStatus::Stopped => "stopped",
            RotationStatus::Running => "running",
            RotationStatus::Paused => "paused",
        }
    }
}

impl std::fmt::Display for RotationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable state owned by the engine
#[derive(Debug, Default)]
pub(crate) struct RotationState {
    pub status: RotationStatus,
    /// Address of the active proxy; the record itself lives in the store
    pub active: Option<String>,
    pub current_index: Option<usize>,
    pub switch_count: u64,
    pub successful_requests_since_switch: u32,
    /// 0 = rotate forever
    pub loop_count: u32,
    pub initial_pool_size: usize,
    pub seconds_until_switch: u64,
    /// A start (possibly pre-testing) is in flight for the current `run_id`
    pub starting: bool,
    /// Bumped on every start and stop
    pub run_id: u64,
    pub started_at: Option<DateTime<Utc>>,
    pub last_switch_at: Option<DateTime<Utc>>,
}

impl RotationState {
    /// Back to `stopped` with every run counter cleared
    pub fn reset_to_stopped(&mut self) {
        self.status = RotationStatus::Stopped;
        self.active = None;
        self.current_index = None;
        self.switch_count = 0;
        self.successful_requests_since_switch = 0;
        self.loop_count = 0;
        self.initial_pool_size = 0;
        self.seconds_until_switch = 0;
        self.starting = false;
        self.started_at = None;
        self.last_switch_at = None;
        self.run_id += 1;
    }
}

/// Point-in-time view of the engine for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct RotationSnapshot {
    pub status: RotationStatus,
    pub active_proxy: Option<ProxyRecord>,
    pub current_index: Option<usize>,
    pub switch_count: u64,
    pub successful_requests_since_switch: u32,
    pub loop_count: u32,
    pub initial_pool_size: usize,
    /// Countdown to the next timer switch, timer mode only
    pub seconds_until_switch: Option<u64>,
    pub switch_in_progress: bool,
    pub start_in_progress: bool,
    pub strategy: RotationStrategy,
    pub switch_mode: SwitchMode,
    pub pool_size: usize,
    pub valid_count: usize,
    pub downed_count: usize,
    pub removed_count: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub last_switch_at: Option<DateTime<Utc>>,
}
