use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FilterMode, RotationSettings};
use crate::error::{Result, RotaError};

/// Proxy protocol classification reported by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks4,
    Socks5,
}

impl ProxyProtocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks4 => "socks4",
            ProxyProtocol::Socks5 => "socks5",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "http" => Some(ProxyProtocol::Http),
            "https" => Some(ProxyProtocol::Https),
            "socks4" => Some(ProxyProtocol::Socks4),
            "socks5" => Some(ProxyProtocol::Socks5),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProxyProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How much of the client identity the proxy leaks upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnonymityLevel {
    Transparent,
    Anonymous,
    Elite,
}

/// Geo annotations consumed by the automation workload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoInfo {
    pub timezone: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A validated proxy and its mutable annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyRecord {
    /// `host:port`, unique within the pool
    pub address: String,
    pub is_valid: bool,
    pub port_type: Option<ProxyProtocol>,
    pub api_type: Option<String>,
    pub latency_ms: Option<u32>,
    pub anonymity_level: Option<AnonymityLevel>,
    pub country: Option<String>,
    pub isp: Option<String>,
    /// 0-100
    pub health_score: Option<u8>,
    #[serde(default)]
    pub is_pinned: bool,
    pub last_checked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub geo: GeoInfo,
}

impl ProxyRecord {
    /// Create an unvalidated record for an address
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            is_valid: false,
            port_type: None,
            api_type: None,
            latency_ms: None,
            anonymity_level: None,
            country: None,
            isp: None,
            health_score: None,
            is_pinned: false,
            last_checked_at: None,
            geo: GeoInfo::default(),
        }
    }

    /// Create a valid record, mostly useful when seeding a pool directly
    pub fn valid(address: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            ..Self::new(address)
        }
    }

    /// Check the record against the country/ISP filter of a rotation profile
    ///
    /// Whitelist keeps a proxy whose country OR isp is listed. Blacklist drops
    /// a proxy whose country is listed and, independently, one whose isp is
    /// listed. Countries compare case-insensitively; ISPs match on a
    /// case-insensitive substring. A filter with both lists empty is inactive.
    pub fn matches_filter(&self, settings: &RotationSettings) -> bool {
        if settings.filter_countries.is_empty() && settings.filter_isps.is_empty() {
            return true;
        }

        let country_hit = self.country.as_deref().is_some_and(|country| {
            settings
                .filter_countries
                .iter()
                .any(|c| c.eq_ignore_ascii_case(country))
        });
        let isp_hit = self.isp.as_deref().is_some_and(|isp| {
            let isp = isp.to_lowercase();
            settings
                .filter_isps
                .iter()
                .any(|i| !i.is_empty() && isp.contains(&i.to_lowercase()))
        });

        match settings.filter_mode {
            FilterMode::None => true,
            FilterMode::Whitelist => country_hit || isp_hit,
            FilterMode::Blacklist => !country_hit && !isp_hit,
        }
    }
}

/// Validate that an address has `host:port` form
pub fn validate_address(address: &str) -> Result<()> {
    let (host, port) = address
        .rsplit_once(':')
        .ok_or_else(|| RotaError::InvalidProxyAddress(format!("missing port: {}", address)))?;

    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() || host.chars().any(char::is_whitespace) {
        return Err(RotaError::InvalidProxyAddress(format!(
            "invalid host: {}",
            address
        )));
    }

    match port.parse::<u16>() {
        Ok(p) if p > 0 => Ok(()),
        _ => Err(RotaError::InvalidProxyAddress(format!(
            "invalid port: {}",
            address
        ))),
    }
}
