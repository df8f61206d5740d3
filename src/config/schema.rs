//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Default listen port when none is configured.
pub const DEFAULT_PORT: u16 = 8080;

/// Default cap on logged body bytes (10 KiB).
pub const DEFAULT_BODY_LOG_LIMIT: usize = 10 * 1024;

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Upstream origin every request is forwarded to.
    pub upstream: UpstreamConfig,

    /// Optional timeout hooks for the upstream leg.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Port bound on all interfaces (0.0.0.0).
    pub port: u16,
}

impl ListenerConfig {
    /// Full bind address for the listener.
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL, e.g. "https://api.example.com/v1/". Required.
    pub base_url: Option<String>,
}

/// Timeout configuration. Every field is unset by default, leaving the
/// transport's own behavior in place.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream TCP connect timeout in seconds.
    pub connect_secs: Option<u64>,

    /// Time allowed for the upstream response head to arrive, in seconds.
    pub request_secs: Option<u64>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log method, target, headers and capped bodies of every exchange.
    pub log_traffic: bool,

    /// Maximum body bytes included in a traffic log line.
    pub body_log_limit: usize,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_traffic: false,
            body_log_limit: DEFAULT_BODY_LOG_LIMIT,
        }
    }
}
