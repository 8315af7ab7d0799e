// crates/attribution-core/src/core/destination.rs
// ============================================================================
// Module: Attribution Destinations
// Description: Destination typing and the shared destination-match predicate.
// Purpose: Give every datastore implementation one definition of "same destination".
// Dependencies: crate::core::sites, serde
// ============================================================================

//! ## Overview
//! A destination is the app or web surface where a conversion fired. App
//! destinations compare by base URI; web destinations compare at site level
//! (top private domain plus scheme) with an exact-string fallback when the
//! URI cannot be normalized. Both datastore implementations and the report
//! capacity counters route through the helpers here so candidate matching
//! stays consistent everywhere.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::sites;

// ============================================================================
// SECTION: Destination Type
// ============================================================================

/// Surface type of a publisher or destination URI.
///
/// # Invariants
/// - Variants are stable for serialization and datastore encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationType {
    /// Android application destination; compared by base URI.
    App,
    /// Web destination; compared by top private domain and scheme.
    Web,
}

// ============================================================================
// SECTION: Source Destinations
// ============================================================================

/// Destination lists registered for a source.
///
/// # Invariants
/// - Lists preserve registration order; entries are raw URIs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDestinations {
    /// App destination URIs.
    pub app: Vec<String>,
    /// Web destination URIs.
    pub web: Vec<String>,
}

// ============================================================================
// SECTION: Match Predicates
// ============================================================================

/// Reports whether two destination URIs address the same destination for the
/// given type.
#[must_use]
pub fn same_destination(left: &str, right: &str, destination_type: DestinationType) -> bool {
    match destination_type {
        DestinationType::App => left == right,
        DestinationType::Web => match (
            sites::top_private_domain_and_scheme(left),
            sites::top_private_domain_and_scheme(right),
        ) {
            (Some(left_site), Some(right_site)) => left_site == right_site,
            _ => left == right,
        },
    }
}

/// Reports whether any of the registered destinations addresses the trigger
/// destination for the given type.
#[must_use]
pub fn any_destination_matches(
    destinations: &[String],
    trigger_destination: &str,
    destination_type: DestinationType,
) -> bool {
    destinations
        .iter()
        .any(|registered| same_destination(registered, trigger_destination, destination_type))
}
