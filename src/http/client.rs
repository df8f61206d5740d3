//! Upstream HTTP client.
//!
//! # Responsibilities
//! - Build the pooled hyper client used for every outbound request
//! - Select plain or TLS transport from the target URI's scheme
//! - Apply the optional connect timeout
//!
//! # Design Decisions
//! - HTTP/1.1 only, so forwarded headers stay valid on the upstream leg
//! - TLS roots come from webpki-roots; no platform certificate store needed

use std::time::Duration;

use axum::body::Body;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TimeoutConfig;

/// Client type shared by all request tasks. Cloning is cheap.
pub type UpstreamClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Create the upstream client.
pub fn build_client(timeouts: &TimeoutConfig) -> UpstreamClient {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(timeouts.connect_secs.map(Duration::from_secs));

    let https = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Client::builder(TokioExecutor::new()).build(https)
}
