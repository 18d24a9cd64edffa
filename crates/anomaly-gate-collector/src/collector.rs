// crates/anomaly-gate-collector/src/collector.rs
// ============================================================================
// Module: Telemetry Collector
// Description: Single-attempt HTTP delivery of snapshots to the collector.
// Purpose: Report snapshots and verdicts without delaying the response path.
// Dependencies: anomaly-gate-core, reqwest, tokio, url
// ============================================================================

//! ## Overview
//! [`Collector`] posts one [`RequestSnapshot`] per call to the configured
//! collection endpoint, authenticated by the caller-supplied API key and
//! application id headers. Delivery is at-most-once: a failure is returned
//! to direct callers and diagnosed, never retried.
//! Invariants:
//! - [`Collector::collect_detached`] spawns a detached task whose result is
//!   discarded; rejections never propagate into the caller's control flow.
//! - The endpoint is resolved once at construction, not per request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use anomaly_gate_core::GateConfig;
use anomaly_gate_core::RequestSnapshot;
use reqwest::Client;
use reqwest::redirect::Policy;
use thiserror::Error;
use url::Url;

use crate::diagnostics::CollectDiagnostic;
use crate::diagnostics::DiagnosticSink;
use crate::diagnostics::StderrDiagnosticSink;
use crate::wire::CollectEnvelope;
use crate::wire::CollectResponse;
use crate::wire::StoredSnapshot;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the caller's API key.
pub const HEADER_API_KEY: &str = "x-api-key";
/// Header carrying the caller's application id.
pub const HEADER_APP_ID: &str = "x-app-id";
/// Request timeout for collection deliveries.
const COLLECT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// SECTION: Collector Errors
// ============================================================================

/// Errors returned by the collector.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - None of these errors may reach the client response path.
#[derive(Debug, Error)]
pub enum CollectError {
    /// No collection endpoint is configured; delivery is skipped.
    #[error("collection endpoint is not configured")]
    MissingEndpoint,
    /// Configuration could not be resolved.
    #[error("collector config failure: {0}")]
    Config(String),
    /// HTTP client construction failed.
    #[error("collector client init failed: {0}")]
    ClientInit(String),
    /// Network-level delivery failure.
    #[error("collect transport failure: {0}")]
    Transport(String),
    /// Collection endpoint responded with a non-success status.
    #[error("collect rejected with http status {code}")]
    Status {
        /// HTTP status code returned by the endpoint.
        code: u16,
    },
    /// Success status but the response body did not match the contract.
    #[error("collect response malformed: {0}")]
    MalformedResponse(String),
}

// ============================================================================
// SECTION: Collector
// ============================================================================

/// Best-effort, at-most-once snapshot delivery client.
///
/// # Invariants
/// - One HTTP POST per [`Collector::collect`] call; no retry, no backoff.
/// - Shared across requests behind [`Arc`]; holds no per-request state.
pub struct Collector {
    /// HTTP client used for delivery.
    client: Client,
    /// Collection endpoint; `None` skips delivery.
    endpoint: Option<Url>,
    /// API key sent as [`HEADER_API_KEY`].
    api_key: String,
    /// Application id sent as [`HEADER_APP_ID`].
    app_id: String,
    /// Sink receiving skip/failure diagnostics from detached deliveries.
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl Collector {
    /// Builds a collector from a validated gate configuration, resolving the
    /// collection endpoint exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError`] when the endpoint is invalid or the HTTP
    /// client cannot be constructed. A merely absent endpoint is not an
    /// error; deliveries are skipped and diagnosed instead.
    pub fn from_config(config: &GateConfig) -> Result<Self, CollectError> {
        let endpoint = config
            .resolve_collection_endpoint()
            .map_err(|err| CollectError::Config(err.to_string()))?;
        Self::new(endpoint, config.api_key.clone(), config.app_id.clone())
    }

    /// Builds a collector with an explicit endpoint and credentials.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::ClientInit`] when the HTTP client cannot be
    /// constructed.
    pub fn new(
        endpoint: Option<Url>,
        api_key: impl Into<String>,
        app_id: impl Into<String>,
    ) -> Result<Self, CollectError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(COLLECT_TIMEOUT)
            .build()
            .map_err(|err| CollectError::ClientInit(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            app_id: app_id.into(),
            diagnostics: Arc::new(StderrDiagnosticSink),
        })
    }

    /// Replaces the diagnostics sink.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Returns true when an endpoint is configured.
    #[must_use]
    pub const fn has_endpoint(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Delivers one snapshot and returns the stored record.
    ///
    /// Direct callers may await the enriched record; the middleware never
    /// awaits this before responding to the client.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError`] on missing configuration, transport failure,
    /// non-success status, or a malformed response body.
    pub async fn collect(&self, snapshot: &RequestSnapshot) -> Result<StoredSnapshot, CollectError> {
        let endpoint = self.endpoint.as_ref().ok_or(CollectError::MissingEndpoint)?;
        let envelope = CollectEnvelope {
            request_data_from_sdk: snapshot.clone(),
        };
        let response = self
            .client
            .post(endpoint.clone())
            .header(HEADER_API_KEY, &self.api_key)
            .header(HEADER_APP_ID, &self.app_id)
            .json(&envelope)
            .send()
            .await
            .map_err(|err| CollectError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CollectError::Status {
                code: status.as_u16(),
            });
        }
        let body: CollectResponse = response
            .json()
            .await
            .map_err(|err| CollectError::MalformedResponse(err.to_string()))?;
        Ok(body.new_request_data_at_clickhouse)
    }

    /// Fires a delivery on a detached task and returns immediately.
    ///
    /// The task's result is discarded; failures surface only through the
    /// diagnostics sink. Must be called from within a tokio runtime. If the
    /// client disconnects and the runtime drops, the in-flight delivery is
    /// abandoned, consistent with best-effort semantics.
    pub fn collect_detached(self: &Arc<Self>, snapshot: RequestSnapshot) {
        let collector = Arc::clone(self);
        let _ = tokio::spawn(async move {
            if let Err(err) = collector.collect(&snapshot).await {
                let event = match err {
                    CollectError::MissingEndpoint => CollectDiagnostic::skipped(
                        &snapshot.method,
                        &snapshot.url,
                        snapshot.status_code,
                        &err.to_string(),
                    ),
                    _ => CollectDiagnostic::failed(
                        &snapshot.method,
                        &snapshot.url,
                        snapshot.status_code,
                        &err.to_string(),
                    ),
                };
                collector.diagnostics.record(&event);
            }
        });
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
