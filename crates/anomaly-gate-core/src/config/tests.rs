// crates/anomaly-gate-core/src/config/tests.rs
// ============================================================================
// Module: Configuration Unit Tests
// Description: Unit tests for config parsing, defaults, and validation.
// Purpose: Validate fail-closed configuration handling.
// Dependencies: anomaly-gate-core
// ============================================================================

//! ## Overview
//! Exercises [`crate::config::GateConfig`] parsing, defaults, validation,
//! and endpoint resolution.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::config::DEFAULT_MAX_CAPTURE_BYTES;
use crate::config::GateConfig;

// ============================================================================
// SECTION: Parsing Tests
// ============================================================================

/// Tests a minimal TOML config parses with defaults applied.
#[test]
fn minimal_toml_applies_defaults() {
    let config = GateConfig::from_toml_str(
        r#"
        api_key = "key-1"
        app_id = "app-1"
        "#,
    )
    .unwrap();
    assert!(!config.block_realtime);
    assert!(config.collection_endpoint.is_none());
    assert_eq!(config.max_capture_bytes, DEFAULT_MAX_CAPTURE_BYTES);
}

/// Tests unknown fields are rejected at parse time.
#[test]
fn unknown_fields_are_rejected() {
    let err = GateConfig::from_toml_str(
        r#"
        api_key = "key-1"
        app_id = "app-1"
        surprise = true
        "#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("parse"));
}

// ============================================================================
// SECTION: Validation Tests
// ============================================================================

/// Tests empty credentials fail validation.
#[test]
fn empty_credentials_fail_validation() {
    assert!(GateConfig::new("", "app-1").validate().is_err());
    assert!(GateConfig::new("key-1", "  ").validate().is_err());
    assert!(GateConfig::new("key-1", "app-1").validate().is_ok());
}

/// Tests capture limits outside the allowed range fail validation.
#[test]
fn capture_limit_range_is_enforced() {
    let mut config = GateConfig::new("key-1", "app-1");
    config.max_capture_bytes = 1;
    assert!(config.validate().is_err());
    config.max_capture_bytes = usize::MAX;
    assert!(config.validate().is_err());
}

/// Tests malformed and non-http endpoints fail validation.
#[test]
fn endpoint_must_be_http_or_https() {
    let mut config = GateConfig::new("key-1", "app-1");
    config.collection_endpoint = Some("not a url".to_string());
    assert!(config.validate().is_err());
    config.collection_endpoint = Some("ftp://collect.example.test".to_string());
    assert!(config.validate().is_err());
    config.collection_endpoint = Some("https://collect.example.test/requests".to_string());
    assert!(config.validate().is_ok());
}

// ============================================================================
// SECTION: Endpoint Resolution Tests
// ============================================================================

/// Tests the explicit endpoint field wins and parses to a URL.
#[test]
fn explicit_endpoint_resolves() {
    let mut config = GateConfig::new("key-1", "app-1");
    config.collection_endpoint = Some("https://collect.example.test/requests".to_string());
    let endpoint = config.resolve_collection_endpoint().unwrap();
    assert_eq!(
        endpoint.map(|url| url.to_string()),
        Some("https://collect.example.test/requests".to_string())
    );
}

/// Tests a missing endpoint resolves to none without failing.
#[test]
fn missing_endpoint_resolves_to_none() {
    let config = GateConfig::new("key-1", "app-1");
    // Environment fallback is unset in the test environment.
    if std::env::var(crate::config::COLLECTION_ENDPOINT_ENV).is_err() {
        assert!(config.resolve_collection_endpoint().unwrap().is_none());
    }
}
