//! Upstream target resolution.
//!
//! # Responsibilities
//! - Hold the parsed upstream base (scheme, host, port, base path)
//! - Combine it with an inbound path+query into the outbound URI
//! - Produce the `Host` header value for the outbound request
//!
//! # Design Decisions
//! - The upstream base path is a prefix, never replaced by the inbound path
//! - A trailing slash on the base path is dropped before concatenation
//! - Inbound targets that are empty or not in origin form map to `/`
//! - The base URL's own query and fragment are not forwarded

use axum::http::{HeaderValue, Uri};
use url::Url;

use crate::config::validation::{check_base_url, ValidationError};

/// Error building an outbound target.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("invalid upstream target {target:?}: {source}")]
    InvalidUri {
        target: String,
        #[source]
        source: axum::http::uri::InvalidUri,
    },

    #[error("invalid Host header value {0:?}")]
    InvalidHost(String),
}

/// The fixed upstream origin every request is forwarded to.
#[derive(Debug, Clone)]
pub struct Upstream {
    scheme: String,
    host: String,
    port: u16,
    explicit_port: bool,
    base_path: String,
}

impl Upstream {
    /// Parse an upstream base URL such as `https://api.example.com/v1/`.
    pub fn parse(base_url: &str) -> Result<Self, ValidationError> {
        Ok(Self::from_url(&check_base_url(base_url)?))
    }

    fn from_url(url: &Url) -> Self {
        let scheme = url.scheme().to_string();
        let default_port = if scheme == "https" { 443 } else { 80 };
        Self {
            host: url.host_str().unwrap_or_default().to_string(),
            port: url.port().unwrap_or(default_port),
            // `Url::port` is None when the port equals the scheme default.
            explicit_port: url.port().is_some(),
            base_path: url.path().trim_end_matches('/').to_string(),
            scheme,
        }
    }

    pub fn is_secure(&self) -> bool {
        self.scheme == "https"
    }

    /// Host with the port appended when it is not the scheme default.
    pub fn authority(&self) -> String {
        if self.explicit_port {
            format!("{}:{}", self.host, self.port)
        } else {
            self.host.clone()
        }
    }

    /// Resolve the outbound target for an inbound path and query.
    pub fn resolve(&self, path_and_query: Option<&str>) -> Result<TargetUrl, TargetError> {
        let inbound = match path_and_query {
            Some(pq) if pq.starts_with('/') => pq,
            _ => "/",
        };
        let authority = self.authority();
        let target = format!("{}://{}{}{}", self.scheme, authority, self.base_path, inbound);
        let uri = Uri::try_from(target.as_str()).map_err(|source| TargetError::InvalidUri {
            target: target.clone(),
            source,
        })?;
        let host_header =
            HeaderValue::from_str(&authority).map_err(|_| TargetError::InvalidHost(authority))?;

        Ok(TargetUrl { uri, host_header })
    }
}

impl std::fmt::Display for Upstream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority(), self.base_path)
    }
}

/// A fully resolved outbound target for one request.
#[derive(Debug, Clone)]
pub struct TargetUrl {
    uri: Uri,
    host_header: HeaderValue,
}

impl TargetUrl {
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Value to send as the outbound `Host` header.
    pub fn host_header(&self) -> &HeaderValue {
        &self.host_header
    }
}

impl std::fmt::Display for TargetUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}
