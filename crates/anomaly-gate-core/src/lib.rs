// crates/anomaly-gate-core/src/lib.rs
// ============================================================================
// Module: Anomaly Gate Core Library
// Description: Snapshot model, policy gate interface, and interceptor core.
// Purpose: Framework-agnostic decision pipeline for response interception.
// Dependencies: serde, serde_json, thiserror, toml, url
// ============================================================================

//! ## Overview
//! `anomaly-gate-core` defines the framework-agnostic pieces of the Anomaly
//! Gate pipeline: the immutable [`RequestSnapshot`] record and its builder,
//! the [`PolicyGate`] interface to the external policy engine, the one-shot
//! [`ResponseInterceptor`] state machine, and the validated [`GateConfig`]
//! model.
//! Invariants:
//! - A snapshot is built at most once per request/response cycle.
//! - Snapshot enrichment copies the record; snapshots are never mutated.
//! - The interceptor decision path fails open: internal errors never block
//!   or drop the original response.
//!
//! Security posture: captured bodies and headers originate from untrusted
//! clients and handlers; treat them as sensitive payloads.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod gate;
pub mod interceptor;
pub mod snapshot;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::ConfigError;
pub use config::GateConfig;
pub use config::COLLECTION_ENDPOINT_ENV;
pub use gate::AllowAllGate;
pub use gate::AnomalyVerdict;
pub use gate::CallbackGate;
pub use gate::GateError;
pub use gate::PolicyGate;
pub use interceptor::Intercept;
pub use interceptor::InterceptSettings;
pub use interceptor::InterceptState;
pub use interceptor::ResponseInterceptor;
pub use interceptor::SendDecision;
pub use snapshot::CapturedBody;
pub use snapshot::CapturedHeaders;
pub use snapshot::RequestParts;
pub use snapshot::RequestSnapshot;
pub use snapshot::SnapshotError;
pub use snapshot::build_snapshot;
