// crates/anomaly-gate-axum/src/lib.rs
// ============================================================================
// Module: Anomaly Gate Axum Library
// Description: Axum middleware wiring for the anomaly gate pipeline.
// Purpose: Drive the interceptor over real requests and responses.
// Dependencies: anomaly-gate-core, anomaly-gate-collector, axum
// ============================================================================

//! ## Overview
//! `anomaly-gate-axum` attaches the Anomaly Gate pipeline to an axum
//! [`axum::Router`]. Per request it captures the outbound response exactly
//! once, builds a snapshot, optionally evaluates the policy gate, fires
//! detached telemetry, and delivers either the original response or the
//! synthesized block payload.
//! Invariants:
//! - The wrapped handler observes no difference from an unmodified response
//!   except status/body when blocked.
//! - Response delivery never waits on telemetry completion or failure.
//! - Internal failures are invisible to the client; the original response is
//!   always delivered (fail-open).
//!
//! Security posture: captured bodies and headers are untrusted traffic;
//! they are forwarded to the collection service and never logged locally.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod capture;
pub mod layer;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use layer::AnomalyGate;
pub use layer::BLOCK_MESSAGE;
pub use layer::GateInitError;
