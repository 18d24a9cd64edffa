// crates/anomaly-gate-core/src/config.rs
// ============================================================================
// Module: Anomaly Gate Configuration
// Description: Validated middleware configuration model.
// Purpose: Single source of truth for gate credentials and capture limits.
// Dependencies: serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! [`GateConfig`] carries the caller-supplied middleware options: collection
//! credentials, the real-time blocking switch, the collection endpoint, and
//! the capture size limit. Validation is strict and fails closed; runtime
//! telemetry failures are handled elsewhere and fail open.
//! Invariants:
//! - `api_key` and `app_id` are required and non-empty.
//! - The collection endpoint is resolved once, at configuration time, from
//!   the explicit field or the process environment; it is never re-read per
//!   request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable consulted for the collection endpoint when the
/// config file omits one.
pub const COLLECTION_ENDPOINT_ENV: &str = "ANOMALY_GATE_COLLECTION_ENDPOINT";

/// Default maximum number of response-body bytes captured for telemetry.
pub(crate) const DEFAULT_MAX_CAPTURE_BYTES: usize = 64 * 1024;
/// Minimum allowed capture limit in bytes.
pub(crate) const MIN_MAX_CAPTURE_BYTES: usize = 1024;
/// Maximum allowed capture limit in bytes.
pub(crate) const MAX_MAX_CAPTURE_BYTES: usize = 8 * 1024 * 1024;

// ============================================================================
// SECTION: Configuration Errors
// ============================================================================

/// Errors returned by configuration parsing and validation.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML parsing failed.
    #[error("config parse failure: {0}")]
    Parse(String),
    /// Configuration failed validation.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Anomaly Gate middleware configuration.
///
/// # Invariants
/// - Unknown fields are rejected at parse time.
/// - `validate` must pass before the configuration is used.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    /// API key sent to the collection service as `x-api-key`.
    pub api_key: String,
    /// Application identifier sent to the collection service as `x-app-id`.
    pub app_id: String,
    /// Whether anomalies are evaluated synchronously and blocked in
    /// real time. Defaults to false (remote-only evaluation).
    #[serde(default)]
    pub block_realtime: bool,
    /// Collection endpoint URL. When absent, the process environment is
    /// consulted once at resolution time; when both are absent, telemetry
    /// is skipped and diagnosed, never fatal.
    #[serde(default)]
    pub collection_endpoint: Option<String>,
    /// Maximum response-body bytes captured for telemetry. Larger bodies
    /// are captured truncated but always delivered intact.
    #[serde(default = "default_max_capture_bytes")]
    pub max_capture_bytes: usize,
}

/// Returns the default capture limit.
const fn default_max_capture_bytes() -> usize {
    DEFAULT_MAX_CAPTURE_BYTES
}

impl GateConfig {
    /// Creates a configuration with required credentials and defaults for
    /// everything else.
    #[must_use]
    pub fn new(api_key: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            app_id: app_id.into(),
            block_realtime: false,
            collection_endpoint: None,
            max_capture_bytes: DEFAULT_MAX_CAPTURE_BYTES,
        }
    }

    /// Parses and validates a configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when credentials are empty, the
    /// capture limit is out of range, or the endpoint does not parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Invalid("api_key must not be empty".to_string()));
        }
        if self.app_id.trim().is_empty() {
            return Err(ConfigError::Invalid("app_id must not be empty".to_string()));
        }
        if self.max_capture_bytes < MIN_MAX_CAPTURE_BYTES
            || self.max_capture_bytes > MAX_MAX_CAPTURE_BYTES
        {
            return Err(ConfigError::Invalid(format!(
                "max_capture_bytes must be between {MIN_MAX_CAPTURE_BYTES} and \
                 {MAX_MAX_CAPTURE_BYTES}"
            )));
        }
        if let Some(endpoint) = &self.collection_endpoint {
            parse_endpoint(endpoint)?;
        }
        Ok(())
    }

    /// Resolves the collection endpoint once, preferring the explicit field
    /// over the process environment.
    ///
    /// Returns `None` when neither is set; the caller skips telemetry in
    /// that case.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a configured endpoint fails to
    /// parse as an http(s) URL.
    pub fn resolve_collection_endpoint(&self) -> Result<Option<Url>, ConfigError> {
        if let Some(endpoint) = &self.collection_endpoint {
            return parse_endpoint(endpoint).map(Some);
        }
        match std::env::var(COLLECTION_ENDPOINT_ENV) {
            Ok(endpoint) if !endpoint.trim().is_empty() => parse_endpoint(&endpoint).map(Some),
            _ => Ok(None),
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses an endpoint string into an http(s) URL.
fn parse_endpoint(endpoint: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(endpoint)
        .map_err(|err| ConfigError::Invalid(format!("collection_endpoint: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(ConfigError::Invalid(format!(
            "collection_endpoint scheme must be http or https, got {scheme}"
        ))),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
