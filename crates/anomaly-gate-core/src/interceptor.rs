// crates/anomaly-gate-core/src/interceptor.rs
// ============================================================================
// Module: Anomaly Gate Response Interceptor
// Description: One-shot state machine around the response-send operation.
// Purpose: Guarantee exactly-once snapshot, decision, and telemetry per cycle.
// Dependencies: crate::gate, crate::snapshot
// ============================================================================

//! ## Overview
//! [`ResponseInterceptor`] is the orchestrating state machine of the
//! pipeline. Each request gets its own interceptor; there is no shared
//! mutable state across requests. The machine moves
//! `Unarmed -> Armed -> Fired -> Restored`, and only the first
//! [`ResponseInterceptor::fire`] call in the `Armed` state produces a
//! decision — every later call passes through untouched, which is the
//! exactly-once guarantee around the host framework's send operation.
//! Invariants:
//! - Snapshot build happens before gate evaluation, which happens before the
//!   caller dispatches telemetry, which happens before (and never blocks)
//!   final response delivery.
//! - The decision path fails open: snapshot or gate errors still result in
//!   the original response being delivered.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::gate::GateError;
use crate::gate::PolicyGate;
use crate::snapshot::CapturedBody;
use crate::snapshot::RequestParts;
use crate::snapshot::RequestSnapshot;
use crate::snapshot::SnapshotError;
use crate::snapshot::build_snapshot;

// ============================================================================
// SECTION: Interceptor State
// ============================================================================

/// Per-request interceptor lifecycle state.
///
/// # Invariants
/// - Transitions are monotonic; no state is ever re-entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptState {
    /// Interceptor constructed but not yet guarding a send operation.
    Unarmed,
    /// Guard installed; the next fire produces the decision.
    Armed,
    /// Decision produced; further fires pass through.
    Fired,
    /// Response delivered; terminal.
    Restored,
}

/// Per-request interceptor settings.
///
/// # Invariants
/// - `gate` is consulted only when `block_realtime` is true.
#[derive(Clone)]
pub struct InterceptSettings {
    /// Whether the verdict is computed synchronously before the response is
    /// sent, allowing the response to be replaced.
    pub block_realtime: bool,
    /// Policy gate consulted in real-time blocking mode.
    pub gate: Option<Arc<dyn PolicyGate>>,
}

// ============================================================================
// SECTION: Intercept Outcome
// ============================================================================

/// Final send decision for one request/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendDecision {
    /// Deliver the original response unchanged.
    Deliver,
    /// Replace the response with the synthesized block payload.
    Block,
}

/// Outcome of a fire attempt.
#[derive(Debug)]
pub enum Intercept {
    /// First fire: snapshot built and decision made. The caller dispatches
    /// telemetry with the snapshot and then delivers per `send`.
    Decided {
        /// Snapshot for this cycle, verdict-enriched when the gate ran.
        snapshot: RequestSnapshot,
        /// Whether to deliver the original response or the block payload.
        send: SendDecision,
        /// Gate failure observed while deciding; the decision fell open.
        gate_error: Option<GateError>,
    },
    /// First fire, but the snapshot could not be built. The caller delivers
    /// the original response and skips telemetry (fail-open).
    Failed(SnapshotError),
    /// Re-entrant or out-of-state fire; the caller delivers untouched.
    PassThrough,
}

// ============================================================================
// SECTION: Response Interceptor
// ============================================================================

/// One-shot guard around a single request's response-send operation.
///
/// # Invariants
/// - `fire` produces [`Intercept::Decided`] or [`Intercept::Failed`] at most
///   once per interceptor; every later call yields [`Intercept::PassThrough`].
/// - All state is closure-scoped to one request; nothing is shared.
pub struct ResponseInterceptor {
    /// Current lifecycle state.
    state: InterceptState,
    /// Settings for this request.
    settings: InterceptSettings,
}

impl ResponseInterceptor {
    /// Creates an unarmed interceptor for one request.
    #[must_use]
    pub const fn new(settings: InterceptSettings) -> Self {
        Self {
            state: InterceptState::Unarmed,
            settings,
        }
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> InterceptState {
        self.state
    }

    /// Installs the one-shot guard (`Unarmed -> Armed`).
    ///
    /// Arming is valid exactly once, before the wrapped handler runs; calls
    /// from any other state are ignored.
    pub fn arm(&mut self) {
        if matches!(self.state, InterceptState::Unarmed) {
            self.state = InterceptState::Armed;
        }
    }

    /// Handles a send attempt (`Armed -> Fired` on first entry).
    ///
    /// The state transition happens before any other work, so a re-entrant
    /// send triggered from inside the decision path still passes through.
    /// Ordering within the first fire: snapshot build, then gate evaluation
    /// (real-time mode only), then the decision. Telemetry dispatch is the
    /// caller's next step and must not block delivery.
    pub fn fire(
        &mut self,
        parts: &RequestParts,
        body: CapturedBody,
        status_code: u16,
        duration_ms: u64,
    ) -> Intercept {
        if !matches!(self.state, InterceptState::Armed) {
            return Intercept::PassThrough;
        }
        self.state = InterceptState::Fired;

        let snapshot = match build_snapshot(parts, body, status_code, duration_ms) {
            Ok(snapshot) => snapshot,
            Err(err) => return Intercept::Failed(err),
        };

        if !self.settings.block_realtime {
            return Intercept::Decided {
                snapshot,
                send: SendDecision::Deliver,
                gate_error: None,
            };
        }

        match self.settings.gate.as_ref().map(|gate| gate.evaluate(&snapshot)) {
            Some(Ok(verdict)) => {
                let send = if verdict.is_anomaly {
                    SendDecision::Block
                } else {
                    SendDecision::Deliver
                };
                Intercept::Decided {
                    snapshot: snapshot.with_verdict(verdict),
                    send,
                    gate_error: None,
                }
            }
            Some(Err(err)) => Intercept::Decided {
                snapshot,
                send: SendDecision::Deliver,
                gate_error: Some(err),
            },
            None => Intercept::Decided {
                snapshot,
                send: SendDecision::Deliver,
                gate_error: None,
            },
        }
    }

    /// Marks the response as delivered (`Fired -> Restored`); terminal.
    pub fn restore(&mut self) {
        if matches!(self.state, InterceptState::Fired) {
            self.state = InterceptState::Restored;
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
