//! Runtime configuration
//!
//! Values come from compiled defaults, overridden by environment variables that the WASI host
//! passes through (`wasmtime serve --env FRONTEND_URL=...`). The listen address is chosen by the
//! host, not by the component.

use crate::error::ConfigError;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// Origin allowed to call the server when `FRONTEND_URL` is unset
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Large enough for voice notes and short video clips sent as chat payloads
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 100 * 1024 * 1024;

/// A socket.io client is dropped after one missed heartbeat (25s interval plus 20s grace)
pub const DEFAULT_PEER_TIMEOUT_SECS: u64 = 45;

const DEFAULT_LOG_FILTER: &str = "info";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Single origin echoed in CORS headers
    pub allowed_origin: String,
    /// Largest accepted request body
    pub max_payload_bytes: usize,
    /// Seconds without a poll or signal after which a participant is disconnected; 0 disables
    pub peer_timeout_secs: u64,
    /// `tracing_subscriber::EnvFilter` directive
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            peer_timeout_secs: DEFAULT_PEER_TIMEOUT_SECS,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `FRONTEND_URL`, `MAX_PAYLOAD_BYTES`, `PEER_TIMEOUT_SECS` and
    /// `RUST_LOG`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ServerConfig::from_env`], reading variables through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(origin) = lookup("FRONTEND_URL") {
            config.allowed_origin = parse_origin(origin)?;
        }
        if let Some(size) = lookup("MAX_PAYLOAD_BYTES") {
            config.max_payload_bytes = parse_payload_limit(size)?;
        }
        if let Some(secs) = lookup("PEER_TIMEOUT_SECS") {
            config.peer_timeout_secs = parse_peer_timeout(secs)?;
        }
        if let Some(filter) = lookup("RUST_LOG").filter(|f| !f.trim().is_empty()) {
            config.log_filter = filter;
        }

        Ok(config)
    }

    /// How long a participant may stay silent, or `None` when silence is never a disconnect
    pub fn peer_timeout(&self) -> Option<TimeDelta> {
        if self.peer_timeout_secs == 0 {
            return None;
        }
        TimeDelta::try_seconds(i64::try_from(self.peer_timeout_secs).ok()?)
    }
}

// Must be usable verbatim as a header value.
fn parse_origin(origin: String) -> Result<String, ConfigError> {
    let trimmed = origin.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(ConfigError::InvalidValue {
            key: "FRONTEND_URL",
            value: origin,
            reason: "expected a non-empty origin without spaces or control characters".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn parse_payload_limit(size: String) -> Result<usize, ConfigError> {
    match size.trim().parse::<usize>() {
        Ok(0) => Err(ConfigError::InvalidValue {
            key: "MAX_PAYLOAD_BYTES",
            value: size,
            reason: "must be greater than zero".to_string(),
        }),
        Ok(limit) => Ok(limit),
        Err(e) => Err(ConfigError::InvalidValue {
            key: "MAX_PAYLOAD_BYTES",
            value: size,
            reason: e.to_string(),
        }),
    }
}

fn parse_peer_timeout(secs: String) -> Result<u64, ConfigError> {
    secs.trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidValue {
            key: "PEER_TIMEOUT_SECS",
            value: secs,
            reason: e.to_string(),
        })
}
