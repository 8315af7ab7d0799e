// crates/attribution-core/src/core/filters.rs
// ============================================================================
// Module: Attribution Filter Data
// Description: Filter maps and filter sets attached to sources and triggers.
// Purpose: Model the name-to-values filter vocabulary with untrusted JSON parsing.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Filter data maps a name to an ordered sequence of string values. Sources
//! carry a single filter map describing themselves; triggers carry sequences
//! of filter maps (filter sets) restricting which sources they accept. All
//! filter JSON arrives from untrusted registrations and is parsed at use;
//! callers map parse failures to the fail-closed "no match" branch rather
//! than propagating an error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Parse Errors
// ============================================================================

/// Error raised when a JSON field attached to an entity fails to parse.
///
/// # Invariants
/// - Carries only the field name; the malformed payload is never echoed back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("malformed {field} json")]
pub struct MalformedField {
    /// Name of the entity field that failed to parse.
    pub field: &'static str,
}

impl MalformedField {
    /// Creates a malformed-field marker for the named field.
    #[must_use]
    pub const fn new(field: &'static str) -> Self {
        Self {
            field,
        }
    }
}

// ============================================================================
// SECTION: Filter Map
// ============================================================================

/// Mapping from a filter name to an ordered sequence of string values.
///
/// # Invariants
/// - Keys are unique; value order is preserved as registered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterMap(BTreeMap<String, Vec<String>>);

impl FilterMap {
    /// Creates an empty filter map.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the values registered under the name, if any.
    #[must_use]
    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    /// Inserts a name-to-values entry, replacing any existing entry.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.0.insert(name.into(), values);
    }

    /// Inserts a name-to-values entry only when the name is absent.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.0.entry(name.into()).or_insert(values);
    }

    /// Reports whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the name-to-values entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.0.iter()
    }

    /// Parses a filter map from raw registration JSON.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedField`] when the JSON does not decode to a map of
    /// string arrays.
    pub fn parse(json: &str, field: &'static str) -> Result<Self, MalformedField> {
        serde_json::from_str(json).map_err(|_| MalformedField::new(field))
    }
}

// ============================================================================
// SECTION: Filter Set
// ============================================================================

/// Parses a filter set (a sequence of filter maps) from raw registration JSON.
///
/// A filter set matches when any of its maps matches; the match rules live in
/// the runtime filter module.
///
/// # Errors
///
/// Returns [`MalformedField`] when the JSON does not decode to an array of
/// filter maps.
pub fn parse_filter_set(json: &str, field: &'static str) -> Result<Vec<FilterMap>, MalformedField> {
    serde_json::from_str(json).map_err(|_| MalformedField::new(field))
}
