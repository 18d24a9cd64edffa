// crates/anomaly-gate-axum/src/capture.rs
// ============================================================================
// Module: Request and Response Capture
// Description: Adapters from axum types to the core capture model.
// Purpose: Extract request parts and buffer response bodies for snapshots.
// Dependencies: anomaly-gate-core, axum, bytes
// ============================================================================

//! ## Overview
//! Adapters between axum's request/response model and the core capture
//! types. Request extraction consumes only the fields the pipeline needs
//! (method, URL, headers, client address); response buffering collects the
//! full body for delivery and truncates only the telemetry copy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::net::SocketAddr;

use anomaly_gate_core::CapturedBody;
use anomaly_gate_core::CapturedHeaders;
use anomaly_gate_core::RequestParts;
use axum::body::Body;
use axum::body::HttpBody;
use axum::body::to_bytes;
use axum::extract::ConnectInfo;
use axum::extract::Request;
use axum::http::HeaderMap;
use axum::response::Response;
use bytes::Bytes;

// ============================================================================
// SECTION: Request Capture
// ============================================================================

/// Extracts the request fields consumed by the snapshot builder.
///
/// The client address comes from the [`ConnectInfo`] extension when the
/// server was started with connect info; otherwise the address is empty.
#[must_use]
pub fn request_parts(request: &Request) -> RequestParts {
    let ip_address = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_default();
    RequestParts {
        method: request.method().to_string(),
        url: request.uri().to_string(),
        ip_address,
        headers: CapturedHeaders::Map(header_map(request.headers())),
    }
}

/// Flattens a header map into name/value pairs with deterministic order.
///
/// Multi-valued headers are joined with `", "`; non-UTF-8 values are decoded
/// lossily.
fn header_map(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for name in headers.keys() {
        let joined = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect::<Vec<String>>()
            .join(", ");
        map.insert(name.as_str().to_string(), joined);
    }
    map
}

// ============================================================================
// SECTION: Response Capture
// ============================================================================

/// Bodies without a known end, or declaring more than this, are streamed
/// through uncaptured.
const MAX_BUFFER_BYTES: u64 = 32 * 1024 * 1024;

/// Buffered response ready for snapshot capture and redelivery.
pub struct BufferedResponse {
    /// Response head (status, headers, extensions).
    pub head: axum::http::response::Parts,
    /// Complete body bytes; empty when buffering failed.
    pub bytes: Bytes,
    /// Body-stream error observed while buffering, if any.
    pub buffer_error: Option<String>,
}

/// Outcome of buffering a response for capture.
pub enum Buffered {
    /// Body fully collected; capture and redelivery both possible.
    Complete(BufferedResponse),
    /// Unbounded or oversized body; it must reach the client as a stream,
    /// so nothing is captured and the response is returned untouched.
    Streaming(Response),
}

/// Buffers the full response body so it can be both captured and delivered.
///
/// Bounded bodies up to [`MAX_BUFFER_BYTES`] are collected whole. Bodies
/// with no known end (server-sent events, long-lived streams) or declaring
/// more than the limit are handed back untouched; awaiting their end would
/// stall delivery indefinitely. A body-stream failure yields an empty body
/// plus the error; the caller still delivers what it can (fail-open) and
/// diagnoses the failure.
pub async fn buffer_response(response: Response) -> Buffered {
    let bounded = HttpBody::size_hint(response.body())
        .upper()
        .is_some_and(|declared| declared <= MAX_BUFFER_BYTES);
    if !bounded {
        return Buffered::Streaming(response);
    }
    let (head, body) = response.into_parts();
    match to_bytes(body, usize::MAX).await {
        Ok(bytes) => Buffered::Complete(BufferedResponse {
            head,
            bytes,
            buffer_error: None,
        }),
        Err(err) => Buffered::Complete(BufferedResponse {
            head,
            bytes: Bytes::new(),
            buffer_error: Some(err.to_string()),
        }),
    }
}

/// Builds the telemetry copy of the body, truncated to the capture limit.
///
/// Delivery always uses the untruncated bytes; only the snapshot sees the
/// truncated copy. A cut that would land inside a UTF-8 sequence backs up
/// to the previous character boundary so a text body stays text.
#[must_use]
pub fn capture_body(bytes: &Bytes, max_capture_bytes: usize) -> CapturedBody {
    let mut end = bytes.len().min(max_capture_bytes);
    if end < bytes.len() {
        let floor = end.saturating_sub(3);
        while end > floor && (bytes[end] & 0xC0) == 0x80 {
            end -= 1;
        }
    }
    CapturedBody::from_bytes(&bytes[..end])
}

/// Reassembles the original response from its buffered pieces.
#[must_use]
pub fn rebuild_response(head: axum::http::response::Parts, bytes: Bytes) -> Response {
    Response::from_parts(head, Body::from(bytes))
}

// ============================================================================
// SECTION: Tests
// ============================================================================
