// crates/attribution-core/src/runtime/filter.rs
// ============================================================================
// Module: Attribution Filter Matching
// Description: Positive and negative filter-set evaluation against source data.
// Purpose: Convert untrusted filter expressions into deterministic match outcomes.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Filter matching compares a trigger-side filter set against a source's
//! filter data. A set matches when any of its maps matches; a map matches by
//! intersecting value sequences key by key, where only keys present on both
//! sides constrain the outcome. Positive matching requires a non-empty
//! intersection per shared key, negative matching an empty one. Empty or
//! absent expressions impose no restriction. Evaluation is pure and never
//! suspends.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::EventTriggerSpec;
use crate::core::FilterMap;

// ============================================================================
// SECTION: Filter-Set Matching
// ============================================================================

/// Evaluates a filter set against the source's filter data.
///
/// With `positive` set, a map matches when every key shared with the source
/// data has intersecting values; cleared, when every shared key has disjoint
/// values. Either side being empty yields a match.
#[must_use]
pub fn is_filter_match(source_data: &FilterMap, filter_set: &[FilterMap], positive: bool) -> bool {
    if filter_set.is_empty() || source_data.is_empty() {
        return true;
    }
    filter_set.iter().any(|map| filter_map_matches(source_data, map, positive))
}

/// Evaluates one filter map against the source's filter data.
fn filter_map_matches(source_data: &FilterMap, map: &FilterMap, positive: bool) -> bool {
    map.iter().all(|(name, values)| {
        source_data.values(name).is_none_or(|source_values| {
            let intersects = values.iter().any(|value| source_values.contains(value));
            intersects == positive
        })
    })
}

// ============================================================================
// SECTION: Event-Trigger Selection
// ============================================================================

/// Returns the first event-trigger specification whose event-level filters
/// accept the source's filter data.
#[must_use]
pub fn first_matching_event_trigger<'a>(
    source_data: &FilterMap,
    specs: &'a [EventTriggerSpec],
) -> Option<&'a EventTriggerSpec> {
    specs.iter().find(|spec| {
        is_filter_match(source_data, &spec.filters, true)
            && is_filter_match(source_data, &spec.not_filters, false)
    })
}
