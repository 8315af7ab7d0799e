// crates/attribution-core/src/runtime/selector.rs
// ============================================================================
// Module: Attribution Source Selector
// Description: Candidate assembly and deterministic winner selection.
// Purpose: Pick at most one source per trigger by a stable total order.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! The selector assembles the candidate pool for a trigger and ranks it by a
//! total composite order: install-attributed sources inside their cooldown
//! window first, then priority, then recency, with the source id as the final
//! tie break. With cross-network attribution enabled and an attribution
//! config present, the pool is the union of own-enrollment sources and
//! derived sources synthesised from foreign-enrollment parents; otherwise it
//! is the ordinary same-enrollment match set. For identical datastore inputs
//! the selection is bit-for-bit identical regardless of query order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use crate::core::AttributionConfig;
use crate::core::EnrollmentId;
use crate::core::Source;
use crate::core::SourceId;
use crate::core::Timestamp;
use crate::core::Trigger;
use crate::interfaces::DatastoreError;
use crate::interfaces::DatastoreTransaction;
use crate::interfaces::DerivedSourceCreator;

// ============================================================================
// SECTION: Selection Result
// ============================================================================

/// Outcome of source selection for one trigger.
///
/// # Invariants
/// - `others` holds every losing candidate exactly once, in rank order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelection {
    /// No source matched the trigger.
    NoCandidate,
    /// A winner was selected; the rest await ignoring on success.
    Candidate {
        /// Highest-ranked matching source.
        winner: Box<Source>,
        /// Remaining matching sources in rank order.
        others: Vec<Source>,
    },
}

// ============================================================================
// SECTION: Selection
// ============================================================================

/// Selects the attribution source for a trigger.
///
/// # Errors
///
/// Returns [`DatastoreError`] when a candidate query fails.
pub fn select_source<T: DatastoreTransaction>(
    tx: &mut T,
    trigger: &Trigger,
    config: &AttributionConfig,
    creator: &impl DerivedSourceCreator,
) -> Result<SourceSelection, DatastoreError> {
    let mut candidates = load_candidates(tx, trigger, config, creator)?;
    candidates.sort_by(|left, right| {
        ranking_key(right, trigger.trigger_time).cmp(&ranking_key(left, trigger.trigger_time))
    });

    let mut iter = candidates.into_iter();
    iter.next().map_or(Ok(SourceSelection::NoCandidate), |winner| {
        Ok(SourceSelection::Candidate {
            winner: Box::new(winner),
            others: iter.collect(),
        })
    })
}

/// Loads the candidate pool, synthesising derived sources when enabled.
fn load_candidates<T: DatastoreTransaction>(
    tx: &mut T,
    trigger: &Trigger,
    config: &AttributionConfig,
    creator: &impl DerivedSourceCreator,
) -> Result<Vec<Source>, DatastoreError> {
    let entries = if config.cross_network_enabled {
        trigger.attribution_config_entries()
    } else {
        None
    };
    let Some(entries) = entries else {
        return tx.matching_active_sources(trigger);
    };

    let mut enrollments: BTreeSet<EnrollmentId> =
        entries.into_iter().map(|entry| entry.source_network).collect();
    enrollments.insert(trigger.enrollment_id.clone());

    let pool = tx.matching_sources_for_enrollments(trigger, &enrollments)?;
    let (own, foreign): (Vec<Source>, Vec<Source>) =
        pool.into_iter().partition(|source| source.enrollment_id == trigger.enrollment_id);

    let mut candidates = own;
    candidates.extend(creator.derive_sources(trigger, &foreign));
    Ok(candidates)
}

/// Composite ranking key; larger keys win.
fn ranking_key(source: &Source, trigger_time: Timestamp) -> (bool, i64, Timestamp, SourceId) {
    let cooldown_end = source.event_time.saturating_add_millis(source.install_cooldown_window);
    let install_boost = source.install_attributed && trigger_time < cooldown_end;
    (install_boost, source.priority, source.event_time, source.id.clone())
}
