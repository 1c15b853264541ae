//! Default connectivity probe
//!
//! Sends a forward-proxy `GET` for the target URL to the proxy and waits for
//! the status line.

use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};
use url::Url;

use super::probe::{ConnectivityProber, ProbeResult};

const MAX_RESPONSE_BYTES: usize = 8 * 1024;
const EXCERPT_CHARS: usize = 200;

/// Parsed head of a proxied HTTP response
#[derive(Debug, Clone, PartialEq)]
struct ProbeResponse {
    status_code: u16,
    status_line: String,
    body: String,
}

/// Probes a proxy with a plain HTTP request in absolute form
pub struct HttpProber {
    target: Url,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(target: Url, timeout: Duration) -> Self {
        Self { target, timeout }
    }

    fn build_request(&self) -> String {
        let host = match (self.target.host_str(), self.target.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };

        format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\nUser-Agent: rota-switch\r\nAccept: */*\r\nConnection: close\r\n\r\n",
            self.target, host
        )
    }

    async fn exchange(&self, address: &str) -> anyhow::Result<ProbeResponse> {
        let mut stream = TcpStream::connect(address)
            .await
            .context("connection failed")?;

        stream
            .write_all(self.build_request().as_bytes())
            .await
            .context("write failed")?;

        let mut buf = Vec::with_capacity(1024);
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.context("read failed")?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if buf.len() >= MAX_RESPONSE_BYTES {
                break;
            }
        }

        if buf.is_empty() {
            bail!("empty response");
        }

        parse_response(&String::from_utf8_lossy(&buf))
    }
}

#[async_trait]
impl ConnectivityProber for HttpProber {
    #[instrument(skip(self), fields(target = %self.target))]
    async fn probe(&self, address: &str) -> ProbeResult {
        debug!("Probing proxy at {}", address);
        let started = Instant::now();

        let response = match timeout(self.timeout, self.exchange(address)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let msg = format!("{:#}", e);
                warn!("Proxy {} is unreachable: {}", address, msg);
                return ProbeResult::failure(msg);
            }
            Err(_) => {
                warn!("Proxy {} timed out", address);
                return ProbeResult::failure("probe timed out");
            }
        };

        let latency_ms = started.elapsed().as_millis().min(u32::MAX as u128) as u32;
        let excerpt: String = response.body.chars().take(EXCERPT_CHARS).collect();

        // 4xx/5xx here come from the proxy itself (auth required, upstream failure)
        if !(200..400).contains(&response.status_code) {
            warn!("Proxy {} answered {}", address, response.status_line);
            return ProbeResult {
                status_code: Some(response.status_code),
                response_excerpt: Some(excerpt),
                ..ProbeResult::failure(format!("unexpected status: {}", response.status_line))
            };
        }

        debug!("Proxy {} is healthy ({} ms)", address, latency_ms);
        ProbeResult {
            ip: origin_ip(&response.body),
            status_code: Some(response.status_code),
            response_excerpt: Some(excerpt),
            ..ProbeResult::success(latency_ms)
        }
    }
}

fn parse_response(raw: &str) -> anyhow::Result<ProbeResponse> {
    let status_line = raw.lines().next().unwrap_or_default().trim().to_string();
    if !status_line.starts_with("HTTP/") {
        bail!("invalid HTTP response");
    }

    let status_code = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| anyhow!("invalid status line: {}", status_line))?;

    let body = raw
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();

    Ok(ProbeResponse {
        status_code,
        status_line,
        body,
    })
}

/// Exit IP reported by echo services such as httpbin's `/ip`
fn origin_ip(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body.trim()).ok()?;
    value
        .get("origin")
        .or_else(|| value.get("ip"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}
