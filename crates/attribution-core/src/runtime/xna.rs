// crates/attribution-core/src/runtime/xna.rs
// ============================================================================
// Module: Cross-Network Source Derivation
// Description: Default derived-source creator for cross-network attribution.
// Purpose: Synthesise attributable sources from foreign-enrollment parents.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! With cross-network attribution enabled, a trigger's attribution config
//! names the foreign enrollments whose sources may compete under the
//! trigger's own enrollment. The default creator synthesises one derived
//! source per foreign parent named by the config: the derivative inherits the
//! parent's measurement fields, is stamped with the trigger's enrollment,
//! carries `parent_id = parent.id`, and honours the config entry's optional
//! priority override. Derived sources never produce event reports and are
//! never flushed back to the datastore.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::AttributionConfigEntry;
use crate::core::Source;
use crate::core::SourceId;
use crate::core::Trigger;
use crate::core::destination::any_destination_matches;
use crate::interfaces::DerivedSourceCreator;

// ============================================================================
// SECTION: Default Creator
// ============================================================================

/// Default cross-network derived-source creator.
#[derive(Debug, Clone, Copy, Default)]
pub struct CrossNetworkSourceCreator;

impl CrossNetworkSourceCreator {
    /// Creates the default creator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DerivedSourceCreator for CrossNetworkSourceCreator {
    fn derive_sources(&self, trigger: &Trigger, foreign_sources: &[Source]) -> Vec<Source> {
        let entries = trigger.attribution_config_entries().unwrap_or_default();
        foreign_sources
            .iter()
            .filter(|parent| destination_match(parent, trigger))
            .filter_map(|parent| {
                let entry = entry_for(&entries, parent)?;
                Some(derive_from(parent, trigger, entry))
            })
            .collect()
    }
}

/// Finds the config entry naming the parent's enrollment.
fn entry_for<'a>(
    entries: &'a [AttributionConfigEntry],
    parent: &Source,
) -> Option<&'a AttributionConfigEntry> {
    entries.iter().find(|entry| entry.source_network == parent.enrollment_id)
}

/// Applies the ordinary destination-match predicate to the parent.
fn destination_match(parent: &Source, trigger: &Trigger) -> bool {
    any_destination_matches(
        parent.destinations(trigger.destination_type),
        &trigger.attribution_destination,
        trigger.destination_type,
    )
}

/// Builds the derivative for one foreign parent.
fn derive_from(parent: &Source, trigger: &Trigger, entry: &AttributionConfigEntry) -> Source {
    let mut derived = parent.clone();
    derived.id = SourceId::new(format!("{}::{}", parent.id, trigger.enrollment_id));
    derived.parent_id = Some(parent.id.clone());
    derived.enrollment_id = trigger.enrollment_id.clone();
    if let Some(priority) = entry.priority {
        derived.priority = priority;
    }
    derived
}
