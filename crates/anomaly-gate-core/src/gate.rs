// crates/anomaly-gate-core/src/gate.rs
// ============================================================================
// Module: Anomaly Gate Policy Interface
// Description: Verdict type and the seam to the external policy engine.
// Purpose: Consume boolean-plus-metadata verdicts without inspecting rules.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! The policy engine is an external collaborator: the core only consumes an
//! [`AnomalyVerdict`] from it and never inspects how the verdict was derived.
//! [`PolicyGate`] is synchronous and sits on the client's critical path when
//! real-time blocking is enabled; its latency budget is a collaborator
//! responsibility.
//! Invariants:
//! - Gate failures are fail-open: callers treat an error as "no verdict" and
//!   deliver the original response.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::snapshot::RequestSnapshot;

// ============================================================================
// SECTION: Verdict
// ============================================================================

/// Policy verdict for one snapshot.
///
/// Opaque to the core beyond these two fields; the policy engine may attach
/// more context on its own side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyVerdict {
    /// True when the policy flags this cycle as anomalous.
    pub is_anomaly: bool,
    /// Identifier of the policy that produced this verdict.
    pub detected_by_policy_id: String,
}

// ============================================================================
// SECTION: Gate Errors
// ============================================================================

/// Errors returned by policy gate implementations.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum GateError {
    /// Policy engine reported an evaluation failure.
    #[error("policy evaluation failed: {0}")]
    Evaluation(String),
}

// ============================================================================
// SECTION: Policy Gate
// ============================================================================

/// Synchronous seam to the external policy engine.
pub trait PolicyGate: Send + Sync {
    /// Evaluates the snapshot and returns a verdict.
    ///
    /// # Errors
    ///
    /// Returns [`GateError`] when the policy engine cannot produce a verdict.
    /// Callers must fail open on error.
    fn evaluate(&self, snapshot: &RequestSnapshot) -> Result<AnomalyVerdict, GateError>;
}

// ============================================================================
// SECTION: Reference Implementations
// ============================================================================

/// Gate that never flags a snapshot.
///
/// Useful for wiring the pipeline before a real policy engine is attached.
pub struct AllowAllGate;

impl PolicyGate for AllowAllGate {
    fn evaluate(&self, _snapshot: &RequestSnapshot) -> Result<AnomalyVerdict, GateError> {
        Ok(AnomalyVerdict {
            is_anomaly: false,
            detected_by_policy_id: String::new(),
        })
    }
}

/// Closure-backed gate for tests and embedded policy engines.
pub struct CallbackGate<F>
where
    F: Fn(&RequestSnapshot) -> Result<AnomalyVerdict, GateError> + Send + Sync,
{
    /// Evaluation handler invoked per snapshot.
    handler: F,
}

impl<F> CallbackGate<F>
where
    F: Fn(&RequestSnapshot) -> Result<AnomalyVerdict, GateError> + Send + Sync,
{
    /// Creates a gate that delegates evaluation to the handler.
    pub const fn new(handler: F) -> Self {
        Self {
            handler,
        }
    }
}

impl<F> PolicyGate for CallbackGate<F>
where
    F: Fn(&RequestSnapshot) -> Result<AnomalyVerdict, GateError> + Send + Sync,
{
    fn evaluate(&self, snapshot: &RequestSnapshot) -> Result<AnomalyVerdict, GateError> {
        (self.handler)(snapshot)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
