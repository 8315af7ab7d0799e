// crates/attribution-core/src/runtime/aggregate.rs
// ============================================================================
// Module: Attribution Aggregate Helpers
// Description: Dedup-key extraction and histogram contribution generation.
// Purpose: Turn aggregatable specs into budget-checked contributions deterministically.
// Dependencies: crate::core, crate::runtime::filter
// ============================================================================

//! ## Overview
//! The aggregate path's pure pieces live here. Dedup-key extraction walks the
//! trigger's predicates in order and returns the key of the first predicate
//! whose filters accept the source's filter data; malformed predicate JSON
//! yields an absent key so the path continues. Contribution generation ORs
//! matching trigger key pieces into the source's aggregation keys and pairs
//! every named key with its positive aggregatable value, emitting
//! contributions in key-name order. Malformed payload JSON fails generation,
//! which drops the path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::AggregateHistogramContribution;
use crate::core::DedupKey;
use crate::core::FilterMap;
use crate::core::MalformedField;
use crate::core::Source;
use crate::core::Trigger;
use crate::core::trigger::parse_key_piece;
use crate::runtime::filter::is_filter_match;

// ============================================================================
// SECTION: Dedup-Key Extraction
// ============================================================================

/// Extracts the aggregate dedup key for the pair, if any predicate matches.
///
/// Malformed predicate JSON is treated as an absent key.
#[must_use]
pub fn extract_aggregate_dedup_key(
    source_data: &FilterMap,
    trigger: &Trigger,
) -> Option<DedupKey> {
    let specs = trigger.parsed_aggregatable_dedup_keys().ok()?;
    specs
        .iter()
        .find(|spec| {
            is_filter_match(source_data, &spec.filters, true)
                && is_filter_match(source_data, &spec.not_filters, false)
        })
        .and_then(|spec| spec.deduplication_key)
}

// ============================================================================
// SECTION: Contribution Generation
// ============================================================================

/// Generates the ordered histogram contributions for the pair.
///
/// # Errors
///
/// Returns [`MalformedField`] when the source's aggregation keys or the
/// trigger's aggregatable specs fail to parse; the caller drops the path.
pub fn generate_contributions(
    source: &Source,
    source_data: &FilterMap,
    trigger: &Trigger,
) -> Result<Vec<AggregateHistogramContribution>, MalformedField> {
    let mut keys = parsed_aggregation_keys(source)?;
    let trigger_data = trigger.parsed_aggregatable_trigger_data()?;
    let values = trigger.parsed_aggregatable_values()?;

    for entry in &trigger_data {
        if !is_filter_match(source_data, &entry.filters, true)
            || !is_filter_match(source_data, &entry.not_filters, false)
        {
            continue;
        }
        let piece = entry
            .key_piece_bits()
            .ok_or_else(|| MalformedField::new("aggregatable_trigger_data"))?;
        match &entry.source_keys {
            Some(names) => {
                for name in names {
                    if let Some(key) = keys.get_mut(name) {
                        *key |= piece;
                    }
                }
            }
            None => {
                for key in keys.values_mut() {
                    *key |= piece;
                }
            }
        }
    }

    Ok(keys
        .into_iter()
        .filter_map(|(name, key)| {
            let value = values.get(&name).copied().filter(|value| *value > 0)?;
            Some(AggregateHistogramContribution {
                key,
                value,
            })
        })
        .collect())
}

/// Parses the source's aggregation keys into name-to-bits form.
fn parsed_aggregation_keys(source: &Source) -> Result<BTreeMap<String, u128>, MalformedField> {
    let Some(json) = source.aggregation_keys.as_deref() else {
        return Ok(BTreeMap::new());
    };
    let raw: BTreeMap<String, String> =
        serde_json::from_str(json).map_err(|_| MalformedField::new("aggregation_keys"))?;
    raw.into_iter()
        .map(|(name, piece)| {
            let bits = parse_key_piece(&piece)
                .ok_or_else(|| MalformedField::new("aggregation_keys"))?;
            Ok((name, bits))
        })
        .collect()
}

// ============================================================================
// SECTION: Budget Summation
// ============================================================================

/// Sums contribution values, or `None` on overflow.
#[must_use]
pub fn sum_contribution_values(
    contributions: &[AggregateHistogramContribution],
) -> Option<u32> {
    contributions
        .iter()
        .try_fold(0_u32, |total, contribution| total.checked_add(contribution.value))
}
