use crate::error::{Result, RotaError};
use std::env;
use std::time::Duration;
use url::Url;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Control API configuration
    pub api: ApiServerConfig,
    /// Connectivity probe configuration
    pub probe: ProbeConfig,
    /// Background sweeper configuration
    pub sweep: SweepConfig,
    /// Validation batch configuration
    pub validation: ValidationConfig,
    /// Logging configuration
    pub log: LogConfig,
    /// Capacity of the connection log ring buffer
    pub connection_log_capacity: usize,
    /// Proxy addresses validated at startup
    pub seed_proxies: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port for the API server (default: 8001)
    pub port: u16,
    /// Host to bind to (default: 0.0.0.0)
    pub host: String,
    /// Allowed CORS origins (comma-separated, empty = localhost only)
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// URL requested through a candidate proxy
    pub target_url: Url,
    /// Upper bound for a single probe
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Interval between sweeps
    pub interval: Duration,
    /// Number of least-recently-checked proxies per sweep
    pub batch_size: usize,
}

#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Number of concurrent validation workers
    pub workers: usize,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let target_url = Url::parse(&get_env_or("PROBE_TARGET_URL", "http://httpbin.org/ip"))
            .map_err(|e| {
                RotaError::InvalidConfig(format!("PROBE_TARGET_URL must be a valid URL: {}", e))
            })?;
        if target_url.scheme() != "http" {
            return Err(RotaError::InvalidConfig(
                "PROBE_TARGET_URL must use the http scheme".into(),
            ));
        }

        Ok(Config {
            api: ApiServerConfig {
                port: get_env_or("API_PORT", "8001").parse().map_err(|_| {
                    RotaError::InvalidConfig("API_PORT must be a valid port number".into())
                })?,
                host: get_env_or("API_HOST", "0.0.0.0"),
                cors_origins: split_list(&get_env_or("CORS_ORIGINS", "")),
            },
            probe: ProbeConfig {
                target_url,
                timeout: Duration::from_secs(parse_positive("PROBE_TIMEOUT", "10")?),
            },
            sweep: SweepConfig {
                interval: Duration::from_secs(parse_positive("SWEEP_INTERVAL", "300")?),
                batch_size: parse_positive("SWEEP_BATCH_SIZE", "5")? as usize,
            },
            validation: ValidationConfig {
                workers: parse_positive("VALIDATION_WORKERS", "20")? as usize,
            },
            log: LogConfig {
                level: get_env_or("LOG_LEVEL", "info"),
                format: get_env_or("LOG_FORMAT", "json"),
            },
            connection_log_capacity: parse_positive("CONNECTION_LOG_CAPACITY", "200")? as usize,
            seed_proxies: split_list(&get_env_or("ROTA_PROXIES", "")),
        })
    }

    /// Get the API server address
    pub fn api_addr(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_positive(key: &str, default: &str) -> Result<u64> {
    match get_env_or(key, default).trim().parse::<u64>() {
        Ok(v) if v > 0 => Ok(v),
        _ => Err(RotaError::InvalidConfig(format!(
            "{} must be a positive integer",
            key
        ))),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Get environment variable with a default value
fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
