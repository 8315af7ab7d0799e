// crates/attribution-core/src/core/identifiers.rs
// ============================================================================
// Module: Attribution Identifiers
// Description: Canonical opaque identifiers for measurement entities.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the canonical identifiers used throughout the
//! attribution engine. Entity identifiers are opaque strings assigned by the
//! registration pipeline and serialize transparently on the wire. Measurement
//! values carried as opaque 64-bit integers (event ids, trigger data, dedup
//! keys, debug keys) get their own newtypes so they cannot be confused with
//! one another at call sites.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: String Identifiers
// ============================================================================

/// Declares a string-backed identifier newtype with the shared accessors.
macro_rules! string_id {
    ($(#[$docs:meta])* $name:ident) => {
        $(#[$docs])*
        ///
        /// # Invariants
        /// - Opaque UTF-8 string; no normalization or validation is applied by this type.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from the provided value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

string_id! {
    /// Source (impression) identifier assigned at registration.
    SourceId
}

string_id! {
    /// Trigger (conversion) identifier assigned at registration.
    TriggerId
}

string_id! {
    /// Event report identifier.
    EventReportId
}

string_id! {
    /// Aggregate report identifier.
    AggregateReportId
}

string_id! {
    /// Attribution bookkeeping row identifier.
    AttributionId
}

string_id! {
    /// Reporting-party (ad tech) enrollment identifier; the privacy unit for
    /// rate limits.
    EnrollmentId
}

string_id! {
    /// Registrant identifier recorded on triggers and attribution rows.
    RegistrantId
}

// ============================================================================
// SECTION: Opaque 64-Bit Values
// ============================================================================

/// Declares a `u64`-backed opaque value newtype with the shared accessors.
macro_rules! opaque_u64 {
    ($(#[$docs:meta])* $name:ident) => {
        $(#[$docs])*
        ///
        /// # Invariants
        /// - The value is opaque; the engine never interprets its bits.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new value from the raw integer.
            #[must_use]
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the raw integer value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

opaque_u64! {
    /// Source event identifier carried into event reports.
    EventId
}

opaque_u64! {
    /// Coarse trigger data carried by an event-trigger specification.
    TriggerData
}

opaque_u64! {
    /// Deduplication key preventing a second report of the same logical event
    /// for a given source.
    DedupKey
}

opaque_u64! {
    /// Debug key attached to reports when both sides permit debugging.
    DebugKey
}
