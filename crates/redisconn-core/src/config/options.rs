//! Typed view over the extra client options
//!
//! The merged options map is kept verbatim on the descriptor. The keys this
//! crate understands are read into [`ClientSettings`]; anything else is
//! carried along untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

use super::error::{ConfigError, Result};

/// Option key holding the key namespace
pub const KEY_PREFIX_OPTION: &str = "keyPrefix";

/// Client settings read from the merged options map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    /// Effective key prefix (user option, else the configured prefix)
    pub key_prefix: String,

    /// Logical database index
    #[serde(default)]
    pub db: Option<i64>,

    /// Timeout for establishing a connection, in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Timeout for a single command response, in milliseconds
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,

    /// How long `connect` waits for the first ready signal, in milliseconds
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,

    /// Reconnect and health monitoring configuration
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

/// Reconnect behaviour handed to the underlying client, plus the health
/// monitor that observes it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconnectConfig {
    /// Retries the connection manager performs per reconnect
    #[serde(default = "default_retries")]
    pub retries: usize,

    /// Exponential backoff base
    #[serde(default = "default_exponent_base")]
    pub exponent_base: u64,

    /// Backoff multiplier in milliseconds
    #[serde(default = "default_factor")]
    pub factor: u64,

    /// Upper bound for a single backoff delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Interval between health pings in milliseconds
    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval_ms: u64,

    /// Consecutive failed health pings before the connection is declared failed
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            exponent_base: default_exponent_base(),
            factor: default_factor(),
            max_delay_ms: default_max_delay_ms(),
            health_check_interval_ms: default_health_check_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl ClientSettings {
    /// Settings with every default applied
    pub fn with_prefix(key_prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            db: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            response_timeout_ms: default_response_timeout_ms(),
            ready_timeout_ms: default_ready_timeout_ms(),
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Read settings from a merged options map
    pub fn from_options(options: &Map<String, Value>) -> Result<Self> {
        serde_json::from_value(Value::Object(options.clone()))
            .map_err(|source| ConfigError::ClientOptionsParse { source })
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_millis(self.ready_timeout_ms)
    }
}

impl ReconnectConfig {
    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }
}

// Default value functions for serde
fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_response_timeout_ms() -> u64 {
    5_000
}

fn default_ready_timeout_ms() -> u64 {
    30_000
}

fn default_retries() -> usize {
    6
}

fn default_exponent_base() -> u64 {
    2
}

fn default_factor() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    5_000
}

fn default_health_check_interval_ms() -> u64 {
    5_000
}

fn default_max_attempts() -> u32 {
    10
}
