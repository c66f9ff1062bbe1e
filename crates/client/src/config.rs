//! Client configuration from environment variables.

use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const DEFAULT_SCAN_URL: &str = "ws://localhost:8080/ws";
/// Same-origin path in the browser. Native clients have no origin to resolve
/// against, so they default to a local backend.
#[cfg(target_arch = "wasm32")]
pub const DEFAULT_API_BASE: &str = "/api";
#[cfg(not(target_arch = "wasm32"))]
pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api";
pub const DEFAULT_RETRY_DELAY_MS: u64 = 2000;
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid scan URL {url:?}: {reason}")]
    InvalidScanUrl { url: String, reason: String },
    #[error("{var} must be a whole number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Reconnect behaviour of the scan socket.
///
/// Every retry waits the same `retry_delay`; there is no attempt limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectConfig {
    pub retry_delay: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// WebSocket endpoint of the scan gateway
    pub scan_url: String,
    /// Base URL of the processing API
    pub api_base: String,
    pub reconnect: ReconnectConfig,
    /// Per-request timeout for the processing API
    pub api_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            scan_url: DEFAULT_SCAN_URL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            reconnect: ReconnectConfig::default(),
            api_timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Read configuration from the process environment.
    ///
    /// Environment variables:
    /// - `MEETSCAN_SCAN_URL`: scan gateway socket (default: "ws://localhost:8080/ws")
    /// - `MEETSCAN_API_BASE`: processing API base URL (default: [`DEFAULT_API_BASE`])
    /// - `MEETSCAN_RETRY_DELAY_MS`: reconnect delay (default: 2000)
    /// - `MEETSCAN_API_TIMEOUT_SECS`: API request timeout (default: 300)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let scan_url = lookup("MEETSCAN_SCAN_URL").unwrap_or(defaults.scan_url);
        validate_scan_url(&scan_url)?;

        let api_base = lookup("MEETSCAN_API_BASE").unwrap_or(defaults.api_base);

        let reconnect = match lookup("MEETSCAN_RETRY_DELAY_MS") {
            Some(raw) => ReconnectConfig {
                retry_delay: Duration::from_millis(parse_number("MEETSCAN_RETRY_DELAY_MS", raw)?),
            },
            None => defaults.reconnect,
        };

        let api_timeout = match lookup("MEETSCAN_API_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number("MEETSCAN_API_TIMEOUT_SECS", raw)?),
            None => defaults.api_timeout,
        };

        Ok(Self {
            scan_url,
            api_base,
            reconnect,
            api_timeout,
        })
    }
}

/// The scan endpoint must be an absolute `ws://` or `wss://` URL.
pub fn validate_scan_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidScanUrl {
        url: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(invalid(format!("unsupported scheme {other:?}"))),
    }
}

fn parse_number(var: &'static str, raw: String) -> Result<u64, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber { var, value: raw })
}
