use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Per-call timeout the management facade uses unless told otherwise.
pub const DEFAULT_MANAGEMENT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("hub endpoint cannot be empty")]
    EmptyEndpoint,
    #[error("call timeout cannot be zero")]
    ZeroTimeout,
}

/// Connection settings shared by both facades.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Hub address, `host:port` or `http://host:port`.
    pub endpoint: String,
    /// Deadline applied to every unary call (default: 10 seconds).
    pub timeout_ms: u64,
    /// Bound on establishing the TCP connection, `0` disables it (default: 5 seconds).
    pub connect_timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "localhost:10001".to_string(),
            timeout_ms: DEFAULT_MANAGEMENT_TIMEOUT.as_millis() as u64,
            connect_timeout_ms: 5_000,
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    /// Saturates at `u64::MAX` milliseconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_ms > 0).then(|| Duration::from_millis(self.connect_timeout_ms))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyEndpoint);
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}
