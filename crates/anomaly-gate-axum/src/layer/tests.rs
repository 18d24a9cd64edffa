// crates/anomaly-gate-axum/src/layer/tests.rs
// ============================================================================
// Module: Layer Unit Tests
// Description: Unit tests for middleware construction and block synthesis.
// Purpose: Validate fail-closed construction and the block payload shape.
// Dependencies: anomaly-gate-axum, axum
// ============================================================================

//! ## Overview
//! Exercises [`crate::layer::AnomalyGate`] construction and the synthesized
//! block response.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use anomaly_gate_core::GateConfig;
use axum::body::to_bytes;
use axum::http::StatusCode;
use serde_json::Value;

use crate::layer::AnomalyGate;
use crate::layer::BLOCK_MESSAGE;
use crate::layer::block_response;

// ============================================================================
// SECTION: Construction Tests
// ============================================================================

/// Tests construction rejects invalid configuration.
#[test]
fn new_rejects_empty_credentials() {
    let config = GateConfig::new("", "app-1");
    assert!(AnomalyGate::new(&config, None).is_err());
}

/// Tests construction succeeds without an endpoint (telemetry skipped).
#[test]
fn new_accepts_missing_endpoint() {
    let config = GateConfig::new("key-1", "app-1");
    assert!(AnomalyGate::new(&config, None).is_ok());
}

// ============================================================================
// SECTION: Block Response Tests
// ============================================================================

/// Tests the block payload keeps the handler's status and headers while
/// replacing the body-describing headers.
#[tokio::test]
async fn block_response_keeps_handler_status_and_headers() {
    let (head, _) = axum::response::Response::builder()
        .status(StatusCode::FORBIDDEN)
        .header("set-cookie", "sid=1")
        .header("content-type", "text/plain")
        .header("content-length", "11")
        .body(axum::body::Body::empty())
        .unwrap()
        .into_parts();
    let response = block_response(head);
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        response.headers().get("set-cookie").map(|v| v.as_bytes()),
        Some(&b"sid=1"[..])
    );
    assert_eq!(
        response.headers().get("content-type").map(|v| v.as_bytes()),
        Some(&b"application/json"[..])
    );
    assert!(response.headers().get("content-length").is_none());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["message"], BLOCK_MESSAGE);
}
