use serde::{Deserialize, Serialize};

/// Why a switch was attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchReason {
    /// First selection after `start`
    Initial,
    Timer,
    RequestCount,
    /// Aggressive policy reacting to a reported failure
    Failure,
    Manual,
    /// The active proxy was removed by the operator
    Removed,
}

impl SwitchReason {
    pub fn is_initial(&self) -> bool {
        matches!(self, SwitchReason::Initial)
    }
}

/// Why the machine went back to `stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Manual,
    LoopComplete,
    PoolExhausted,
}

/// Notification emitted by the rotation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RotationEvent {
    Started {
        pool_size: usize,
    },
    ProxySwitched {
        from: Option<String>,
        to: String,
        reason: SwitchReason,
        switch_count: u64,
        latency_ms: Option<u32>,
    },
    ProbeFailed {
        address: String,
        message: String,
    },
    RegistryReset,
    ManualRemovalsCleared,
    Paused,
    Resumed,
    Stopped {
        reason: StopReason,
    },
    PoolExhausted,
    LoopComplete {
        switch_count: u64,
    },
}
