//! Background services

pub mod health_sweeper;
pub mod validation;

pub use health_sweeper::{HealthSweeper, HealthSweeperConfig, HealthSweeperHandle, SweepReport};
pub use validation::{
    ProbeValidator, ProxyValidator, ValidationOptions, ValidationService, ValidationSummary,
    DEFAULT_VALIDATION_WORKERS,
};
