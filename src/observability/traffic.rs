//! Traffic logging for relayed exchanges.
//!
//! # Responsibilities
//! - Log method, resolved target and headers of each inbound request
//! - Capture request and response bodies up to a byte cap as they stream
//! - Log response status, at WARN when the upstream returned >= 400
//!
//! # Design Decisions
//! - Bodies are observed frame by frame; forwarded bytes, size hints and
//!   trailers pass through untouched
//! - A body log line is emitted exactly once: at end of stream, on error, or
//!   when the body is dropped early (caller or upstream went away)
//! - Logging has no error path that can reach the request

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, StatusCode};
use http_body::{Body as HttpBody, Frame, SizeHint};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::http::target::TargetUrl;

/// Correlates the request and response log lines of one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeId(Uuid);

impl ExchangeId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Writes traffic log events for relayed requests and responses.
#[derive(Debug, Clone, Copy)]
pub struct TrafficLogger {
    body_limit: usize,
}

impl TrafficLogger {
    pub fn new(body_limit: usize) -> Self {
        Self { body_limit }
    }

    /// Log the request line and headers, returning the exchange id.
    pub fn begin(&self, method: &Method, target: &TargetUrl, headers: &HeaderMap) -> ExchangeId {
        let id = ExchangeId::new();
        tracing::info!(
            exchange_id = %id,
            method = %method,
            url = %target,
            headers = %serialize_headers(headers),
            "Relay request"
        );
        id
    }

    /// Wrap an inbound request body so its content is logged once forwarded.
    pub fn tap_request(&self, id: ExchangeId, body: Body) -> Body {
        Body::new(TapBody::new(body, Capture::new(id, Exchange::Request, self.body_limit)))
    }

    /// Wrap an upstream response body so status and content are logged once relayed.
    pub fn tap_response<B>(&self, id: ExchangeId, status: StatusCode, body: B) -> Body
    where
        B: HttpBody<Data = Bytes> + Unpin + Send + 'static,
        B::Error: Into<axum::BoxError>,
    {
        Body::new(TapBody::new(
            body,
            Capture::new(id, Exchange::Response(status), self.body_limit),
        ))
    }
}

/// Serialize headers as a JSON object. Repeated headers become arrays.
pub fn serialize_headers(headers: &HeaderMap) -> String {
    let mut map = Map::new();
    for name in headers.keys() {
        let mut values: Vec<Value> = headers
            .get_all(name)
            .iter()
            .map(|v| Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        map.insert(name.as_str().to_string(), value);
    }
    Value::Object(map).to_string()
}

/// Render captured bytes, marking anything past the cap as truncated.
pub fn render_body(captured: &[u8], total: usize) -> String {
    let text = String::from_utf8_lossy(captured);
    if total > captured.len() {
        format!("{text}... [truncated, {total} bytes total]")
    } else {
        text.into_owned()
    }
}

#[derive(Debug, Clone, Copy)]
enum Exchange {
    Request,
    Response(StatusCode),
}

/// Bounded copy of the bytes seen on one body.
#[derive(Debug)]
struct Capture {
    id: ExchangeId,
    exchange: Exchange,
    limit: usize,
    buf: Vec<u8>,
    total: usize,
}

impl Capture {
    fn new(id: ExchangeId, exchange: Exchange, limit: usize) -> Self {
        Self {
            id,
            exchange,
            limit,
            buf: Vec::new(),
            total: 0,
        }
    }

    fn record(&mut self, data: &[u8]) {
        self.total += data.len();
        let room = self.limit.saturating_sub(self.buf.len()).min(data.len());
        self.buf.extend_from_slice(&data[..room]);
    }

    fn emit(self, complete: bool) {
        let body = render_body(&self.buf, self.total);
        match self.exchange {
            Exchange::Request => tracing::info!(
                exchange_id = %self.id,
                bytes = self.total,
                complete,
                body = %body,
                "Relay request body"
            ),
            Exchange::Response(status) if status.as_u16() >= 400 => tracing::warn!(
                exchange_id = %self.id,
                status = status.as_u16(),
                bytes = self.total,
                complete,
                body = %body,
                "Relay response"
            ),
            Exchange::Response(status) => tracing::info!(
                exchange_id = %self.id,
                status = status.as_u16(),
                bytes = self.total,
                complete,
                body = %body,
                "Relay response"
            ),
        }
    }
}

/// Body wrapper that records data frames into a `Capture`.
struct TapBody<B: HttpBody> {
    inner: B,
    capture: Option<Capture>,
}

impl<B: HttpBody> TapBody<B> {
    fn new(inner: B, capture: Capture) -> Self {
        Self {
            inner,
            capture: Some(capture),
        }
    }

    fn finish(&mut self, complete: bool) {
        if let Some(capture) = self.capture.take() {
            capture.emit(complete);
        }
    }
}

impl<B> HttpBody for TapBody<B>
where
    B: HttpBody<Data = Bytes> + Unpin,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let polled = Pin::new(&mut self.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(Some(Ok(frame))) => {
                if let (Some(data), Some(capture)) = (frame.data_ref(), self.capture.as_mut()) {
                    capture.record(data);
                }
                if self.inner.is_end_stream() {
                    self.finish(true);
                }
            }
            Poll::Ready(Some(Err(_))) => self.finish(false),
            Poll::Ready(None) => self.finish(true),
            Poll::Pending => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl<B: HttpBody> Drop for TapBody<B> {
    fn drop(&mut self) {
        // Empty bodies are never polled; a pending capture on a live stream was cut short.
        let complete = self.inner.is_end_stream();
        self.finish(complete);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn headers_serialize_with_repeats_as_arrays() {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.append("x-tag", HeaderValue::from_static("a"));
        headers.append("x-tag", HeaderValue::from_static("b"));

        let value: Value = serde_json::from_str(&serialize_headers(&headers)).unwrap();
        assert_eq!(value["content-type"], "application/json");
        assert_eq!(value["x-tag"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn body_within_cap_is_verbatim() {
        assert_eq!(render_body(b"{\"id\":5}", 8), "{\"id\":5}");
    }

    #[test]
    fn body_over_cap_is_marked() {
        assert_eq!(render_body(b"hello", 11), "hello... [truncated, 11 bytes total]");
    }

    #[test]
    fn capture_stops_at_limit() {
        let mut capture = Capture::new(ExchangeId::new(), Exchange::Request, 4);
        capture.record(b"ab");
        capture.record(b"cdef");
        capture.record(b"gh");
        assert_eq!(capture.buf, b"abcd");
        assert_eq!(capture.total, 8);
    }

    #[tokio::test]
    async fn tapped_body_forwards_every_byte() {
        let payload = vec![7u8; 64 * 1024];
        let logger = TrafficLogger::new(16);
        let body = logger.tap_request(ExchangeId::new(), Body::from(payload.clone()));
        assert_eq!(body.size_hint().exact(), Some(payload.len() as u64));

        let forwarded = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(&forwarded[..], &payload[..]);
    }

    #[tokio::test]
    async fn tapped_empty_body_stays_empty() {
        let logger = TrafficLogger::new(16);
        let body = logger.tap_response(ExchangeId::new(), StatusCode::NO_CONTENT, Body::empty());
        assert!(body.is_end_stream());
        let forwarded = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        assert!(forwarded.is_empty());
    }
}
