// crates/anomaly-gate-core/src/snapshot.rs
// ============================================================================
// Module: Anomaly Gate Snapshot Model
// Description: Immutable request/response snapshots and their builder.
// Purpose: Canonicalize one request/response cycle for evaluation and telemetry.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`RequestSnapshot`] is the immutable record of one request/response cycle.
//! [`build_snapshot`] is the pure transformation from raw request parts plus
//! a captured body into that record; it performs no network or disk access.
//! Invariants:
//! - Bodies and headers are string-encoded exactly once: values that are
//!   already strings pass through unchanged, everything else is serialized
//!   to JSON a single time.
//! - Snapshots are never mutated after construction; enrichment produces a
//!   new record via [`RequestSnapshot::with_verdict`].
//!
//! Security posture: snapshot bodies and headers are untrusted client and
//! handler data; treat them as sensitive when diagnosing failures.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::gate::AnomalyVerdict;
use crate::time::unix_seconds_now;

// ============================================================================
// SECTION: Snapshot Errors
// ============================================================================

/// Errors returned by the snapshot builder.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Body or header serialization failed.
    #[error("snapshot serialization failed: {0}")]
    Serialization(String),
}

// ============================================================================
// SECTION: Captured Input
// ============================================================================

/// Response body as captured from the host framework.
///
/// # Invariants
/// - [`CapturedBody::Text`] carries bodies that are already strings and must
///   pass through without re-encoding.
/// - [`CapturedBody::Structured`] carries values that are serialized to JSON
///   exactly once at snapshot-build time.
/// - [`CapturedBody::Bytes`] carries raw bodies that did not decode as UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedBody {
    /// Body that is already a string.
    Text(String),
    /// Structured body serialized once at build time.
    Structured(Value),
    /// Raw non-UTF-8 body bytes.
    Bytes(Vec<u8>),
}

impl CapturedBody {
    /// Builds a captured body from raw response bytes.
    ///
    /// UTF-8 bytes become [`CapturedBody::Text`] so the single-encoding rule
    /// applies; anything else is kept as raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self::Text(text.to_string()),
            Err(_) => Self::Bytes(bytes.to_vec()),
        }
    }

    /// Canonicalizes the body into its single string encoding.
    fn into_canonical(self) -> Result<String, SnapshotError> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Structured(value) => serde_json::to_string(&value)
                .map_err(|err| SnapshotError::Serialization(err.to_string())),
            Self::Bytes(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        }
    }
}

/// Request headers as captured from the host framework.
///
/// # Invariants
/// - [`CapturedHeaders::Text`] passes through unchanged.
/// - [`CapturedHeaders::Map`] is serialized to a JSON object exactly once,
///   with deterministic key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedHeaders {
    /// Headers already flattened to a string.
    Text(String),
    /// Header name/value map; multi-valued headers are pre-joined by the host
    /// adapter.
    Map(BTreeMap<String, String>),
}

impl CapturedHeaders {
    /// Canonicalizes the headers into their single string encoding.
    fn to_canonical(&self) -> Result<String, SnapshotError> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::Map(map) => serde_json::to_string(map)
                .map_err(|err| SnapshotError::Serialization(err.to_string())),
        }
    }
}

/// Request fields consumed from the host framework.
///
/// # Invariants
/// - `method` and `url` are copied verbatim from the request.
/// - `ip_address` is empty when the client address is unavailable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParts {
    /// Request method, verbatim.
    pub method: String,
    /// Request URL, verbatim.
    pub url: String,
    /// Client IP address, empty when unavailable.
    pub ip_address: String,
    /// Request headers as captured.
    pub headers: CapturedHeaders,
}

// ============================================================================
// SECTION: Request Snapshot
// ============================================================================

/// Immutable record of one request/response cycle.
///
/// # Invariants
/// - Built at most once per cycle, after the final body and status are known.
/// - Never mutated after construction; [`RequestSnapshot::with_verdict`]
///   returns an enriched copy.
/// - Field names on the wire match the collection service contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    /// Canonical response body string.
    pub body: String,
    /// Canonical request headers string.
    pub headers: String,
    /// Client IP address, empty when unavailable.
    #[serde(rename = "ipAddress")]
    pub ip_address: String,
    /// Request method.
    pub method: String,
    /// Request URL.
    pub url: String,
    /// Response status code, 0 when not yet assigned.
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// Whole seconds since epoch at snapshot-build time.
    pub timestamp: i64,
    /// Elapsed milliseconds between request start and snapshot build.
    pub duration_ms: u64,
    /// Local policy verdict; `None` means "not evaluated locally".
    pub anomaly: Option<AnomalyVerdict>,
    /// Identifier of the detecting policy, empty until a verdict is attached.
    pub detected_by_policy_id: String,
    /// Blocked flag (0/1), always 0 at snapshot-build time.
    pub blocked: u8,
}

impl RequestSnapshot {
    /// Returns an enriched copy carrying the provided verdict.
    ///
    /// The original snapshot is left untouched; enrichment is always by copy.
    #[must_use]
    pub fn with_verdict(&self, verdict: AnomalyVerdict) -> Self {
        let mut enriched = self.clone();
        enriched.detected_by_policy_id = verdict.detected_by_policy_id.clone();
        enriched.anomaly = Some(verdict);
        enriched
    }

    /// Returns true when an attached verdict flags this cycle as anomalous.
    #[must_use]
    pub fn is_flagged(&self) -> bool {
        self.anomaly.as_ref().is_some_and(|verdict| verdict.is_anomaly)
    }
}

// ============================================================================
// SECTION: Snapshot Builder
// ============================================================================

/// Builds a snapshot from raw request parts and the captured response.
///
/// Pure and synchronous: the only ambient input is the wall-clock timestamp.
/// The status code defaults to 0 upstream when the framework has not yet
/// assigned one; this builder records whatever it is handed.
///
/// # Errors
///
/// Returns [`SnapshotError::Serialization`] when the body or headers cannot
/// be serialized to JSON.
pub fn build_snapshot(
    parts: &RequestParts,
    body: CapturedBody,
    status_code: u16,
    duration_ms: u64,
) -> Result<RequestSnapshot, SnapshotError> {
    Ok(RequestSnapshot {
        body: body.into_canonical()?,
        headers: parts.headers.to_canonical()?,
        ip_address: parts.ip_address.clone(),
        method: parts.method.clone(),
        url: parts.url.clone(),
        status_code,
        timestamp: unix_seconds_now(),
        duration_ms,
        anomaly: None,
        detected_by_policy_id: String::new(),
        blocked: 0,
    })
}

// ============================================================================
// SECTION: Tests
// ============================================================================
