//! Validation batch runner
//!
//! Validates a list of addresses with bounded concurrency and loads the
//! results into the proxy store. Only one batch runs at a time; the health
//! sweeper stays idle while one is in flight.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use url::Url;

use crate::error::{Result, RotaError};
use crate::models::{validate_address, ProxyProtocol, ProxyRecord};
use crate::pool::ProxyStore;
use crate::proxy::{ConnectivityProber, HttpProber};

/// Default number of concurrent validations
pub const DEFAULT_VALIDATION_WORKERS: usize = 20;

/// Latency at or above which a proxy scores zero health
const HEALTH_LATENCY_CEILING_MS: u32 = 5000;

/// Per-batch validation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Overrides the service's worker count when set
    pub workers: Option<usize>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            workers: None,
        }
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

/// Outcome counts of a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

/// Produces a fully annotated record for one address
#[async_trait]
pub trait ProxyValidator: Send + Sync {
    async fn validate(
        &self,
        address: &str,
        target_url: Option<&Url>,
        options: &ValidationOptions,
    ) -> ProxyRecord;
}

/// Validator backed by the HTTP connectivity probe
///
/// Classifies every reachable proxy as HTTP and derives a health score from
/// the measured latency; it does no geo, ISP or anonymity enrichment.
pub struct ProbeValidator {
    default_target: Url,
}

impl ProbeValidator {
    pub fn new(default_target: Url) -> Self {
        Self { default_target }
    }
}

#[async_trait]
impl ProxyValidator for ProbeValidator {
    async fn validate(
        &self,
        address: &str,
        target_url: Option<&Url>,
        options: &ValidationOptions,
    ) -> ProxyRecord {
        let target = target_url.unwrap_or(&self.default_target).clone();
        let result = HttpProber::new(target, options.timeout)
            .probe(address)
            .await;

        let mut record = ProxyRecord::new(address);
        record.last_checked_at = Some(Utc::now());
        if result.success {
            record.is_valid = true;
            record.port_type = Some(ProxyProtocol::Http);
            record.latency_ms = result.latency_ms;
            record.health_score = result.latency_ms.map(health_from_latency);
        }
        record
    }
}

/// Linear health score: 100 at 0 ms, 0 at the latency ceiling
pub fn health_from_latency(latency_ms: u32) -> u8 {
    let capped = latency_ms.min(HEALTH_LATENCY_CEILING_MS);
    (100 - capped * 100 / HEALTH_LATENCY_CEILING_MS) as u8
}

/// Trim, drop blanks and de-duplicate, keeping first-seen order
pub fn normalize_addresses(addresses: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    addresses
        .into_iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .filter(|a| seen.insert(a.clone()))
        .collect()
}

/// Clears the running flag on drop
struct BatchGuard<'a>(&'a AtomicBool);

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ValidationService {
    store: Arc<ProxyStore>,
    validator: Arc<dyn ProxyValidator>,
    workers: usize,
    running: AtomicBool,
}

impl ValidationService {
    pub fn new(store: Arc<ProxyStore>, validator: Arc<dyn ProxyValidator>, workers: usize) -> Self {
        Self {
            store,
            validator,
            workers: workers.max(1),
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Validate `addresses` and upsert every result into the store
    ///
    /// Malformed addresses are not probed and count as invalid.
    #[instrument(skip(self, addresses, options))]
    pub async fn run_batch(
        &self,
        addresses: Vec<String>,
        target_url: Option<Url>,
        options: ValidationOptions,
    ) -> Result<ValidationSummary> {
        let addresses = normalize_addresses(addresses);
        if addresses.is_empty() {
            return Err(RotaError::InvalidRequest(
                "no proxy addresses provided".into(),
            ));
        }

        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(RotaError::BatchInProgress);
        }
        let _guard = BatchGuard(&self.running);

        let total = addresses.len();
        let (well_formed, malformed): (Vec<_>, Vec<_>) = addresses
            .into_iter()
            .partition(|a| validate_address(a).is_ok());
        for address in &malformed {
            warn!("Skipping malformed proxy address: {}", address);
        }

        let workers = options.workers.unwrap_or(self.workers).max(1);
        info!("Validating {} proxies with {} workers", well_formed.len(), workers);

        let target = target_url.as_ref();
        let options = &options;
        let records: Vec<ProxyRecord> = futures::stream::iter(well_formed)
            .map(|address| async move {
                self.validator.validate(&address, target, options).await
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        let valid = records.iter().filter(|r| r.is_valid).count();
        let added = self.store.upsert_many(records);

        let summary = ValidationSummary {
            total,
            valid,
            invalid: total - valid,
        };
        info!(
            "Validation complete: {} valid, {} invalid, {} new",
            summary.valid, summary.invalid, added
        );
        Ok(summary)
    }
}
