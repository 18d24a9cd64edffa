// crates/anomaly-gate-collector/src/wire.rs
// ============================================================================
// Module: Collection Wire Contract
// Description: Request/response JSON shapes for the collection service.
// Purpose: Pin the exact field names of the collection exchange.
// Dependencies: anomaly-gate-core, serde
// ============================================================================

//! ## Overview
//! One exchange per snapshot: the SDK POSTs
//! `{ "requestDataFromSDK": <RequestSnapshot> }` and a successful response
//! carries `{ "newRequestDataAtClickhouse": <StoredSnapshot> }` with
//! server-assigned fields. Any missing field is treated as failure by the
//! collector.

// ============================================================================
// SECTION: Imports
// ============================================================================

use anomaly_gate_core::RequestSnapshot;
use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Request body sent to the collection endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectEnvelope {
    /// Snapshot as captured by this SDK.
    #[serde(rename = "requestDataFromSDK")]
    pub request_data_from_sdk: RequestSnapshot,
}

/// Success response body from the collection endpoint.
///
/// # Invariants
/// - `new_request_data_at_clickhouse` must be present; responses without it
///   are malformed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectResponse {
    /// Snapshot as durably stored, with server-assigned fields.
    #[serde(rename = "newRequestDataAtClickhouse")]
    pub new_request_data_at_clickhouse: StoredSnapshot,
}

/// Snapshot record as stored by the collection service.
///
/// The service may enrich the record (request identifier, remote verdict,
/// final blocked flag); unknown server-side fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSnapshot {
    /// The snapshot fields, as echoed back by the service.
    #[serde(flatten)]
    pub snapshot: RequestSnapshot,
    /// Server-assigned record identifier, when provided.
    #[serde(default)]
    pub request_id: Option<String>,
}

// ============================================================================
// SECTION: Tests
// ============================================================================
