//! Environment-style configuration sources.
//!
//! # Responsibilities
//! - Parse dotenv files (`KEY=VALUE`, `#` comments, optional quotes)
//! - Merge the file with the process environment
//! - Apply recognized keys on top of a `RelayConfig`
//!
//! # Design Decisions
//! - Variables are collected into a map; the process environment is never mutated
//! - A missing dotenv file is silently ignored
//! - Unparsable numeric values keep the previous setting

use std::collections::HashMap;
use std::path::Path;

use crate::config::schema::RelayConfig;

pub const BASE_URL: &str = "BASE_URL";
pub const PORT: &str = "PORT";
pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const LOG_TRAFFIC: &str = "LOG_TRAFFIC";
pub const BODY_LOG_LIMIT: &str = "BODY_LOG_LIMIT";
pub const CONNECT_TIMEOUT_SECS: &str = "CONNECT_TIMEOUT_SECS";
pub const REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";

/// A snapshot of environment variables relevant to the relay.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    vars: HashMap<String, String>,
}

impl EnvSource {
    /// Build a source from explicit pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Collect the process environment, then let the dotenv file (if present)
    /// override it.
    pub fn collect(dotenv: &Path) -> Self {
        Self::collect_from(
            std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?))),
            dotenv,
        )
    }

    /// Like [`EnvSource::collect`], with `vars` standing in for the process
    /// environment.
    pub fn collect_from<I>(vars: I, dotenv: &Path) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut source = Self::from_pairs(vars);
        match std::fs::read_to_string(dotenv) {
            Ok(content) => {
                let parsed = parse_dotenv(&content);
                tracing::debug!(path = ?dotenv, keys = parsed.len(), "Loaded env file");
                source.vars.extend(parsed);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = ?dotenv, error = %e, "Ignoring unreadable env file");
            }
        }
        source
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Overlay recognized variables onto `config`.
    pub fn apply(&self, config: &mut RelayConfig) {
        if let Some(url) = self.get(BASE_URL) {
            config.upstream.base_url = Some(url.to_string());
        }
        if let Some(port) = self.get(PORT).and_then(|p| p.trim().parse().ok()) {
            config.listener.port = port;
        }
        if let Some(level) = self.get(LOG_LEVEL) {
            config.observability.log_level = level.to_string();
        }
        if let Some(flag) = self.get(LOG_TRAFFIC) {
            config.observability.log_traffic = parse_flag(flag);
        }
        if let Some(limit) = self.get(BODY_LOG_LIMIT).and_then(|v| v.trim().parse().ok()) {
            config.observability.body_log_limit = limit;
        }
        if let Some(secs) = self.get(CONNECT_TIMEOUT_SECS).and_then(|v| v.trim().parse().ok()) {
            config.timeouts.connect_secs = Some(secs);
        }
        if let Some(secs) = self.get(REQUEST_TIMEOUT_SECS).and_then(|v| v.trim().parse().ok()) {
            config.timeouts.request_secs = Some(secs);
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parse dotenv content into key/value pairs.
///
/// Lines look like `KEY=VALUE`. Leading/trailing whitespace is trimmed from
/// both sides, and one pair of surrounding quotes is removed from the value.
pub fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim_start();
            if line.starts_with('#') {
                return None;
            }
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() || key.contains('#') {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    let value = value
        .strip_prefix('"')
        .or_else(|| value.strip_prefix('\''))
        .unwrap_or(value);
    value
        .strip_suffix('"')
        .or_else(|| value.strip_suffix('\''))
        .unwrap_or(value)
}
