// crates/anomaly-gate-core/src/time.rs
// ============================================================================
// Module: Anomaly Gate Time Helpers
// Description: Wall-clock capture for snapshot timestamps.
// Purpose: Provide whole-second epoch timestamps at snapshot-build time.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Snapshot timestamps are whole seconds since the unix epoch, captured once
//! when the snapshot is built. Durations are supplied by callers so the core
//! stays replayable in tests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

// ============================================================================
// SECTION: Clock Helpers
// ============================================================================

/// Returns the current unix time in whole seconds.
///
/// Clocks set before the epoch yield 0 rather than failing; the timestamp is
/// advisory metadata, not a correctness input.
#[must_use]
pub fn unix_seconds_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}
