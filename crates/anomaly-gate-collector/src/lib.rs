// crates/anomaly-gate-collector/src/lib.rs
// ============================================================================
// Module: Anomaly Gate Collector Library
// Description: Best-effort telemetry delivery to the collection service.
// Purpose: Dispatch snapshots asynchronously without touching the response path.
// Dependencies: anomaly-gate-core, reqwest, serde_json, tokio, url
// ============================================================================

//! ## Overview
//! `anomaly-gate-collector` delivers [`anomaly_gate_core::RequestSnapshot`]
//! records to the remote collection service over a single HTTP POST.
//! Delivery is best-effort and at-most-once: no retry, no backoff, and no
//! error ever escapes into the caller's response path.
//! Invariants:
//! - [`Collector::collect`] makes exactly one delivery attempt.
//! - [`Collector::collect_detached`] never blocks its caller and reports
//!   failures only through the diagnostics sink.
//! - A missing endpoint skips delivery and is diagnosed, never fatal.
//!
//! Security posture: snapshot bodies are sensitive captured traffic; the
//! diagnostics sink must never emit them.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod collector;
pub mod diagnostics;
pub mod wire;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use collector::CollectError;
pub use collector::Collector;
pub use diagnostics::CollectDiagnostic;
pub use diagnostics::DiagnosticSink;
pub use diagnostics::NoopDiagnosticSink;
pub use diagnostics::StderrDiagnosticSink;
pub use wire::CollectEnvelope;
pub use wire::CollectResponse;
pub use wire::StoredSnapshot;
