// crates/attribution-core/src/core/time.rs
// ============================================================================
// Module: Attribution Time Model
// Description: Millisecond-epoch timestamps for sources, triggers, and reports.
// Purpose: Provide deterministic, replayable time values across measurement records.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The attribution engine works entirely in unix-epoch milliseconds embedded
//! in registered entities. The core never reads wall-clock time; every
//! temporal decision (windows, rate limits, report scheduling) derives from
//! timestamps supplied by the datastore, which keeps pipeline runs
//! deterministic and replayable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Milliseconds in one day.
pub const MILLIS_PER_DAY: i64 = 86_400_000;

/// Milliseconds in one hour.
pub const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Milliseconds in one minute.
pub const MILLIS_PER_MINUTE: i64 = 60_000;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Canonical timestamp in unix-epoch milliseconds.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads wall-clock time.
/// - No validation is performed; monotonicity is a caller responsibility.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix-epoch milliseconds.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix-epoch milliseconds.
    #[must_use]
    pub const fn millis(self) -> i64 {
        self.0
    }

    /// Rounds the timestamp down to the start of its UTC day.
    #[must_use]
    pub const fn round_down_to_day(self) -> Self {
        Self(self.0.div_euclid(MILLIS_PER_DAY) * MILLIS_PER_DAY)
    }

    /// Adds a millisecond duration, saturating at the representable bounds.
    #[must_use]
    pub const fn saturating_add_millis(self, millis: i64) -> Self {
        Self(self.0.saturating_add(millis))
    }

    /// Subtracts a millisecond duration, saturating at the representable bounds.
    #[must_use]
    pub const fn saturating_sub_millis(self, millis: i64) -> Self {
        Self(self.0.saturating_sub(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Time Range
// ============================================================================

/// Half-open time range `[start, end)` used by sliding-window queries.
///
/// # Invariants
/// - `start <= end`; construction clamps inverted ranges to empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Inclusive lower bound.
    start: Timestamp,
    /// Exclusive upper bound.
    end: Timestamp,
}

impl TimeRange {
    /// Creates a range from an inclusive start and exclusive end.
    #[must_use]
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Builds the sliding window ending at `end` with the provided length.
    #[must_use]
    pub fn window_ending_at(end: Timestamp, window_millis: i64) -> Self {
        Self::new(end.saturating_sub_millis(window_millis), end)
    }

    /// Returns the inclusive lower bound.
    #[must_use]
    pub const fn start(&self) -> Timestamp {
        self.start
    }

    /// Returns the exclusive upper bound.
    #[must_use]
    pub const fn end(&self) -> Timestamp {
        self.end
    }

    /// Reports whether the range contains the timestamp.
    #[must_use]
    pub fn contains(&self, at: Timestamp) -> bool {
        self.start <= at && at < self.end
    }
}
