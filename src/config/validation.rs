//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Require a usable upstream base URL
//! - Validate value ranges (timeouts > 0, log limit > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use url::Url;

use crate::config::schema::RelayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("BASE_URL is not set")]
    MissingBaseUrl,

    #[error("BASE_URL {url:?} is not a valid URL: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("BASE_URL {url:?} must use http or https, not {scheme:?}")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("BASE_URL {0:?} has no host")]
    MissingHost(String),

    #[error("{0} must be greater than zero")]
    NonPositive(&'static str),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.upstream.base_url.as_deref() {
        None | Some("") => errors.push(ValidationError::MissingBaseUrl),
        Some(raw) => {
            if let Err(e) = check_base_url(raw) {
                errors.push(e);
            }
        }
    }

    if config.observability.body_log_limit == 0 {
        errors.push(ValidationError::NonPositive("observability.body_log_limit"));
    }
    if config.timeouts.connect_secs == Some(0) {
        errors.push(ValidationError::NonPositive("timeouts.connect_secs"));
    }
    if config.timeouts.request_secs == Some(0) {
        errors.push(ValidationError::NonPositive("timeouts.request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse and check an upstream base URL.
pub fn check_base_url(raw: &str) -> Result<Url, ValidationError> {
    let url = Url::parse(raw).map_err(|e| ValidationError::InvalidBaseUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::UnsupportedScheme {
            url: raw.to_string(),
            scheme: url.scheme().to_string(),
        });
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ValidationError::MissingHost(raw.to_string()));
    }
    Ok(url)
}
