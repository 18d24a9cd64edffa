// crates/anomaly-gate-collector/src/diagnostics.rs
// ============================================================================
// Module: Collector Diagnostics
// Description: Diagnostic events and sinks for telemetry delivery outcomes.
// Purpose: Surface skipped and failed deliveries without touching the client.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Delivery failures are invisible to the end client; they surface only as
//! diagnostic events recorded through a [`DiagnosticSink`]. Events carry
//! request metadata and the failure reason but never captured bodies or
//! headers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

// ============================================================================
// SECTION: Diagnostic Events
// ============================================================================

/// Diagnostic event for one delivery attempt.
///
/// # Invariants
/// - Never carries snapshot bodies or headers.
#[derive(Debug, Clone, Serialize)]
pub struct CollectDiagnostic {
    /// Stable event label.
    pub event: &'static str,
    /// Delivery outcome label (`skipped` or `failed`).
    pub outcome: &'static str,
    /// Request method from the snapshot.
    pub method: String,
    /// Request URL from the snapshot.
    pub url: String,
    /// Response status code from the snapshot.
    pub status_code: u16,
    /// Failure reason.
    pub reason: String,
}

impl CollectDiagnostic {
    /// Builds a skipped-delivery event (no endpoint configured).
    #[must_use]
    pub fn skipped(method: &str, url: &str, status_code: u16, reason: &str) -> Self {
        Self {
            event: "anomaly_gate_collect",
            outcome: "skipped",
            method: method.to_string(),
            url: url.to_string(),
            status_code,
            reason: reason.to_string(),
        }
    }

    /// Builds a failed-delivery event.
    #[must_use]
    pub fn failed(method: &str, url: &str, status_code: u16, reason: &str) -> Self {
        Self {
            event: "anomaly_gate_collect",
            outcome: "failed",
            method: method.to_string(),
            url: url.to_string(),
            status_code,
            reason: reason.to_string(),
        }
    }

    /// Builds a decision-path failure event (snapshot or gate error that
    /// fell open).
    #[must_use]
    pub fn decision_failed(method: &str, url: &str, status_code: u16, reason: &str) -> Self {
        Self {
            event: "anomaly_gate_decision",
            outcome: "failed",
            method: method.to_string(),
            url: url.to_string(),
            status_code,
            reason: reason.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Diagnostic Sinks
// ============================================================================

/// Sink for collector diagnostic events.
pub trait DiagnosticSink: Send + Sync {
    /// Records one diagnostic event.
    fn record(&self, event: &CollectDiagnostic);
}

/// Diagnostic sink that logs JSON lines to stderr.
pub struct StderrDiagnosticSink;

impl DiagnosticSink for StderrDiagnosticSink {
    #[allow(clippy::print_stderr, reason = "Stderr is the diagnostic channel for this sink.")]
    fn record(&self, event: &CollectDiagnostic) {
        if let Ok(payload) = serde_json::to_string(event) {
            eprintln!("{payload}");
        }
    }
}

/// No-op diagnostic sink for tests.
pub struct NoopDiagnosticSink;

impl DiagnosticSink for NoopDiagnosticSink {
    fn record(&self, _event: &CollectDiagnostic) {}
}
