//! HTTP server setup and the relay handler.
//!
//! # Responsibilities
//! - Create the Axum router that sends every path and method to the relay
//! - Wire up middleware (tracing)
//! - Bind server to listener and serve until shutdown
//! - Forward each request to the upstream and stream the response back
//! - Translate upstream transport failures into 502 responses

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::config::validation::ValidationError;
use crate::http::client::{build_client, UpstreamClient};
use crate::http::response::{bad_gateway, RelayError};
use crate::http::target::Upstream;
use crate::observability::traffic::TrafficLogger;

/// Forwards requests to the configured upstream.
///
/// Holds only immutable configuration and a pooled client, so one instance
/// is shared by every request task.
#[derive(Clone)]
pub struct Relay {
    upstream: Upstream,
    client: UpstreamClient,
    request_timeout: Option<Duration>,
    traffic: Option<TrafficLogger>,
}

impl Relay {
    /// Build a relay from a validated configuration.
    pub fn new(config: &RelayConfig) -> Result<Self, ValidationError> {
        let base_url = config
            .upstream
            .base_url
            .as_deref()
            .ok_or(ValidationError::MissingBaseUrl)?;

        Ok(Self {
            upstream: Upstream::parse(base_url)?,
            client: build_client(&config.timeouts),
            request_timeout: config.timeouts.request_secs.map(Duration::from_secs),
            traffic: config
                .observability
                .log_traffic
                .then(|| TrafficLogger::new(config.observability.body_log_limit)),
        })
    }

    pub fn upstream(&self) -> &Upstream {
        &self.upstream
    }

    /// Relay one request. Upstream failures become a 502; this never errors.
    pub async fn forward(&self, request: Request) -> Response<Body> {
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        match self.try_forward(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    method = %method,
                    path = %path,
                    error = %e.describe(),
                    "Upstream request failed"
                );
                bad_gateway(&e)
            }
        }
    }

    async fn try_forward(&self, request: Request) -> Result<Response<Body>, RelayError> {
        let (parts, body) = request.into_parts();
        let target = self
            .upstream
            .resolve(parts.uri.path_and_query().map(|pq| pq.as_str()))?;

        let mut headers = HeaderMap::with_capacity(parts.headers.len());
        for (name, value) in parts.headers.iter() {
            if name != header::HOST {
                headers.append(name.clone(), value.clone());
            }
        }
        headers.insert(header::HOST, target.host_header().clone());

        let exchange = self
            .traffic
            .map(|log| (log, log.begin(&parts.method, &target, &parts.headers)));
        let body = match exchange {
            Some((log, id)) => log.tap_request(id, body),
            None => body,
        };

        let mut outbound = axum::http::Request::builder()
            .method(parts.method)
            .uri(target.uri().clone())
            .body(body)?;
        *outbound.headers_mut() = headers;

        tracing::debug!(url = %target, "Dispatching upstream request");

        let pending = self.client.request(outbound);
        let upstream_response = match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, pending)
                .await
                .map_err(|_| RelayError::Timeout(limit))??,
            None => pending.await?,
        };

        let (upstream_parts, incoming) = upstream_response.into_parts();
        let body = match exchange {
            Some((log, id)) => log.tap_response(id, upstream_parts.status, incoming),
            None => Body::new(incoming),
        };

        let mut response = Response::new(body);
        *response.status_mut() = upstream_parts.status;
        *response.headers_mut() = upstream_parts.headers;
        Ok(response)
    }
}

/// HTTP server for the relay.
pub struct RelayServer {
    router: Router,
    relay: Arc<Relay>,
}

impl RelayServer {
    /// Create a new server with the given configuration.
    pub fn new(config: &RelayConfig) -> Result<Self, ValidationError> {
        let relay = Arc::new(Relay::new(config)?);
        let router = Self::build_router(relay.clone());
        Ok(Self { router, relay })
    }

    /// Build the Axum router. Every path and method reaches the relay.
    fn build_router(relay: Arc<Relay>) -> Router {
        Router::new()
            .fallback(relay_handler)
            .with_state(relay)
            .layer(TraceLayer::new_for_http())
    }

    pub fn upstream(&self) -> &Upstream {
        self.relay.upstream()
    }

    /// The router, for driving the relay without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.upstream(),
            tls = self.upstream().is_secure(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn relay_handler(State(relay): State<Arc<Relay>>, request: Request) -> Response<Body> {
    relay.forward(request).await
}
