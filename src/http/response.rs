//! Upstream failure translation.
//!
//! # Responsibilities
//! - Classify why an upstream exchange could not complete
//! - Render the caller-facing 502 Bad Gateway response
//!
//! # Design Decisions
//! - Only reachable before any response bytes reach the caller
//! - The body carries the error's source chain and nothing else

use std::error::Error as StdError;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};

use crate::http::target::TargetError;

/// Prefix of every gateway error body.
pub const BAD_GATEWAY_PREFIX: &str = "Bad Gateway: ";

/// Why the relay could not obtain an upstream response.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("upstream request failed")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl RelayError {
    /// Human-readable description including every source in the chain.
    pub fn describe(&self) -> String {
        let mut description = self.to_string();
        let mut source = self.source();
        while let Some(err) = source {
            let text = err.to_string();
            if !description.ends_with(&text) {
                description.push_str(": ");
                description.push_str(&text);
            }
            source = err.source();
        }
        description
    }
}

/// Build the 502 response sent when the upstream cannot be reached.
pub fn bad_gateway(err: &RelayError) -> Response<Body> {
    let mut response = Response::new(Body::from(format!("{BAD_GATEWAY_PREFIX}{}", err.describe())));
    *response.status_mut() = StatusCode::BAD_GATEWAY;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}
