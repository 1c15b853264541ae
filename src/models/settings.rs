use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RotaError};
use crate::proxy::rotation::RotationStrategy;

/// What triggers an automatic switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SwitchMode {
    #[default]
    Timer,
    RequestCount,
}

/// Country/ISP filtering applied to eligible candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    None,
    Whitelist,
    Blacklist,
}

/// Rotation profile
///
/// These are the fields a profile export carries; the engine reads them on
/// every switch, so updates apply from the next switch on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationSettings {
    pub switch_mode: SwitchMode,
    pub strategy: RotationStrategy,
    /// Timer period in seconds
    pub switch_interval_secs: u64,
    /// Successful requests before a switch in request-count mode
    pub switch_request_count: u32,
    /// Full passes over the pool before stopping (0 = infinite)
    pub loop_count: u32,
    pub cooldown_minutes: u64,
    pub filter_mode: FilterMode,
    pub filter_countries: Vec<String>,
    pub filter_isps: Vec<String>,
    /// Probe every valid proxy before entering `running`
    pub pre_test_on_start: bool,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            switch_mode: SwitchMode::Timer,
            strategy: RotationStrategy::Sequential,
            switch_interval_secs: 60,
            switch_request_count: 10,
            loop_count: 0,
            cooldown_minutes: 5,
            filter_mode: FilterMode::None,
            filter_countries: vec![],
            filter_isps: vec![],
            pre_test_on_start: false,
        }
    }
}

impl RotationSettings {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_minutes.saturating_mul(60))
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.switch_interval_secs == 0 {
            return Err(RotaError::InvalidConfig(
                "switch_interval_secs must be greater than 0".into(),
            ));
        }
        if self.switch_request_count == 0 {
            return Err(RotaError::InvalidConfig(
                "switch_request_count must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
