use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::proxy::probe::ProbeResult;

/// Outcome of a connectivity attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionOutcome {
    Pending,
    Success,
    Fail,
}

impl ConnectionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionOutcome::Pending => "pending",
            ConnectionOutcome::Success => "success",
            ConnectionOutcome::Fail => "fail",
        }
    }
}

impl std::fmt::Display for ConnectionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Record of one connectivity attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionLogEntry {
    pub id: Uuid,
    pub address: String,
    pub timestamp: DateTime<Utc>,
    pub outcome: ConnectionOutcome,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_excerpt: Option<String>,
}

impl ConnectionLogEntry {
    pub fn pending(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            address: address.into(),
            timestamp: Utc::now(),
            outcome: ConnectionOutcome::Pending,
            message: message.into(),
            latency_ms: None,
            ip: None,
            location: None,
            status_code: None,
            response_excerpt: None,
        }
    }

    /// Entry describing a resolved probe
    pub fn from_probe(address: impl Into<String>, result: &ProbeResult) -> Self {
        let outcome = if result.success {
            ConnectionOutcome::Success
        } else {
            ConnectionOutcome::Fail
        };

        Self {
            outcome,
            latency_ms: result.latency_ms,
            ip: result.ip.clone(),
            location: result.location.clone(),
            status_code: result.status_code,
            response_excerpt: result.response_excerpt.clone(),
            ..Self::pending(address, result.message.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_from_probe_copies_details() {
        let result = ProbeResult {
            success: true,
            latency_ms: Some(120),
            ip: Some("203.0.113.9".to_string()),
            location: None,
            status_code: Some(200),
            response_excerpt: Some("HTTP/1.1 200 OK".to_string()),
            message: "ok".to_string(),
        };

        let entry = ConnectionLogEntry::from_probe("1.2.3.4:80", &result);
        assert_eq!(entry.outcome, ConnectionOutcome::Success);
        assert_eq!(entry.latency_ms, Some(120));
        assert_eq!(entry.status_code, Some(200));
        assert_eq!(entry.message, "ok");

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["outcome"], "success");
        assert!(value.get("location").is_none());
    }

    #[test]
    fn test_failed_probe_entry() {
        let entry = ConnectionLogEntry::from_probe("1.2.3.4:80", &ProbeResult::failure("refused"));
        assert_eq!(entry.outcome, ConnectionOutcome::Fail);
        assert_eq!(entry.outcome.to_string(), "fail");
        assert!(entry.latency_ms.is_none());
    }
}
