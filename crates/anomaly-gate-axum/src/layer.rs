// crates/anomaly-gate-axum/src/layer.rs
// ============================================================================
// Module: Anomaly Gate Middleware Layer
// Description: Per-request orchestration of capture, decision, and dispatch.
// Purpose: Wrap a router so every response flows through the interceptor.
// Dependencies: anomaly-gate-core, anomaly-gate-collector, axum, tokio
// ============================================================================

//! ## Overview
//! [`AnomalyGate`] holds the shared, read-only pipeline state (settings,
//! collector, diagnostics) and attaches an interception middleware to an
//! axum router. Each request gets its own [`ResponseInterceptor`]; the only
//! detached work is telemetry dispatch.
//! Invariants:
//! - Per request: snapshot build happens before gate evaluation, which
//!   happens before telemetry dispatch, which happens before (and never
//!   blocks) final response delivery.
//! - The block payload replaces the body if and only if real-time blocking
//!   is enabled and the verdict flags an anomaly; the status code stays
//!   whatever the handler set.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Instant;

use anomaly_gate_collector::CollectDiagnostic;
use anomaly_gate_collector::CollectError;
use anomaly_gate_collector::Collector;
use anomaly_gate_collector::DiagnosticSink;
use anomaly_gate_collector::StderrDiagnosticSink;
use anomaly_gate_core::ConfigError;
use anomaly_gate_core::GateConfig;
use anomaly_gate_core::Intercept;
use anomaly_gate_core::InterceptSettings;
use anomaly_gate_core::PolicyGate;
use anomaly_gate_core::ResponseInterceptor;
use anomaly_gate_core::SendDecision;
use axum::Router;
use axum::body::Body;
use axum::extract::Request;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::http::header;
use axum::middleware::Next;
use axum::middleware::from_fn_with_state;
use axum::response::Response;
use thiserror::Error;

use crate::capture::Buffered;
use crate::capture::buffer_response;
use crate::capture::capture_body;
use crate::capture::rebuild_response;
use crate::capture::request_parts;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Body message of the synthesized block response.
pub const BLOCK_MESSAGE: &str = "Anomaly Detected.";

// ============================================================================
// SECTION: Initialization Errors
// ============================================================================

/// Errors returned while building the middleware.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum GateInitError {
    /// Configuration failed validation.
    #[error("gate config failure: {0}")]
    Config(#[from] ConfigError),
    /// Collector construction failed.
    #[error("gate collector failure: {0}")]
    Collector(#[from] CollectError),
}

// ============================================================================
// SECTION: Anomaly Gate
// ============================================================================

/// Shared, read-only state for the interception middleware.
struct GateState {
    /// Interceptor settings applied to every request.
    settings: InterceptSettings,
    /// Telemetry collector shared across requests.
    collector: Arc<Collector>,
    /// Sink receiving decision-path failure diagnostics.
    diagnostics: Arc<dyn DiagnosticSink>,
    /// Telemetry capture limit for response bodies.
    max_capture_bytes: usize,
}

/// Anomaly Gate middleware factory.
///
/// # Invariants
/// - Configuration is validated and the collection endpoint resolved once,
///   at construction; nothing is re-read per request.
pub struct AnomalyGate {
    /// Shared middleware state.
    state: Arc<GateState>,
}

impl AnomalyGate {
    /// Builds the middleware from a configuration and an optional policy
    /// gate.
    ///
    /// The gate is consulted only when `block_realtime` is enabled; passing
    /// `None` leaves the pipeline in remote-only evaluation mode.
    ///
    /// # Errors
    ///
    /// Returns [`GateInitError`] when the configuration is invalid or the
    /// collector cannot be constructed.
    pub fn new(
        config: &GateConfig,
        gate: Option<Arc<dyn PolicyGate>>,
    ) -> Result<Self, GateInitError> {
        config.validate()?;
        let collector = Arc::new(Collector::from_config(config)?);
        Ok(Self::assemble(config, gate, collector, Arc::new(StderrDiagnosticSink)))
    }

    /// Builds the middleware with a preconfigured collector and diagnostics
    /// sink.
    ///
    /// # Errors
    ///
    /// Returns [`GateInitError`] when the configuration is invalid.
    pub fn with_collector(
        config: &GateConfig,
        gate: Option<Arc<dyn PolicyGate>>,
        collector: Arc<Collector>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Result<Self, GateInitError> {
        config.validate()?;
        Ok(Self::assemble(config, gate, collector, diagnostics))
    }

    /// Assembles the shared state from validated pieces.
    fn assemble(
        config: &GateConfig,
        gate: Option<Arc<dyn PolicyGate>>,
        collector: Arc<Collector>,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            state: Arc::new(GateState {
                settings: InterceptSettings {
                    block_realtime: config.block_realtime,
                    gate,
                },
                collector,
                diagnostics,
                max_capture_bytes: config.max_capture_bytes,
            }),
        }
    }

    /// Attaches the interception middleware to a router.
    #[must_use]
    pub fn attach(self, router: Router) -> Router {
        router.layer(from_fn_with_state(self.state, intercept))
    }
}

// ============================================================================
// SECTION: Interception Middleware
// ============================================================================

/// Per-request interception: capture, decide, dispatch, deliver.
async fn intercept(
    State(state): State<Arc<GateState>>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let parts = request_parts(&request);

    let mut interceptor = ResponseInterceptor::new(state.settings.clone());
    interceptor.arm();

    let response = next.run(request).await;
    let status = response.status();
    let buffered = match buffer_response(response).await {
        Buffered::Complete(buffered) => buffered,
        // Unbounded bodies stream straight through; capturing one would
        // stall delivery until the stream ends.
        Buffered::Streaming(streamed) => return streamed,
    };
    if let Some(reason) = &buffered.buffer_error {
        state.diagnostics.record(&CollectDiagnostic::decision_failed(
            &parts.method,
            &parts.url,
            status.as_u16(),
            reason,
        ));
    }
    let captured = capture_body(&buffered.bytes, state.max_capture_bytes);
    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    let outcome = interceptor.fire(&parts, captured, status.as_u16(), duration_ms);
    let delivered = match outcome {
        Intercept::Decided {
            snapshot,
            send,
            gate_error,
        } => {
            if let Some(err) = gate_error {
                state.diagnostics.record(&CollectDiagnostic::decision_failed(
                    &parts.method,
                    &parts.url,
                    status.as_u16(),
                    &err.to_string(),
                ));
            }
            // Telemetry is started before delivery but never awaited.
            state.collector.collect_detached(snapshot);
            match send {
                SendDecision::Deliver => rebuild_response(buffered.head, buffered.bytes),
                SendDecision::Block => block_response(buffered.head),
            }
        }
        Intercept::Failed(err) => {
            state.diagnostics.record(&CollectDiagnostic::decision_failed(
                &parts.method,
                &parts.url,
                status.as_u16(),
                &err.to_string(),
            ));
            rebuild_response(buffered.head, buffered.bytes)
        }
        Intercept::PassThrough => rebuild_response(buffered.head, buffered.bytes),
    };
    interceptor.restore();
    delivered
}

/// Synthesizes the block response onto the handler's response head.
///
/// Status and headers the handler already set (cookies, CORS) are kept;
/// only the body-describing headers are replaced to match the block
/// payload.
fn block_response(mut head: axum::http::response::Parts) -> Response {
    let body = serde_json::json!({ "message": BLOCK_MESSAGE }).to_string();
    head.headers.remove(header::CONTENT_LENGTH);
    head.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(head, Body::from(body))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
