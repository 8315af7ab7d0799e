// crates/attribution-core/src/core/attribution.rs
// ============================================================================
// Module: Attribution Bookkeeping
// Description: The attribution row and the rate-limit scope derived from it.
// Purpose: Record successful attributions in the form the privacy gates query.
// Dependencies: crate::core::{destination, identifiers, sites, source, time, trigger}, serde
// ============================================================================

//! ## Overview
//! Every successful attribution inserts exactly one attribution row. The row
//! stores the normalized site and origin forms of the publisher and the
//! destination so the sliding-window rate-limit gates can count rows without
//! re-parsing URIs. When a URI cannot be normalized the row falls back to the
//! raw string; only the gates take a "cannot verify" branch on parse failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::AttributionId;
use crate::core::identifiers::EnrollmentId;
use crate::core::identifiers::RegistrantId;
use crate::core::identifiers::SourceId;
use crate::core::identifiers::TriggerId;
use crate::core::sites;
use crate::core::source::Source;
use crate::core::time::Timestamp;
use crate::core::trigger::Trigger;

// ============================================================================
// SECTION: Attribution Row
// ============================================================================

/// Bookkeeping entry counted by the rate-limit gates.
///
/// # Invariants
/// - Inserted exactly once per successful attribution.
/// - `source_time` is the winning source's event time, not the trigger's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionRow {
    /// Row identifier.
    pub id: AttributionId,
    /// Site form of the publisher URI.
    pub source_site: String,
    /// Origin form of the publisher URI.
    pub source_origin: String,
    /// Site form of the destination URI.
    pub destination_site: String,
    /// Origin form of the destination URI.
    pub destination_origin: String,
    /// Enrollment the attribution was reported under.
    pub enrollment_id: EnrollmentId,
    /// Winning source's event time.
    pub source_time: Timestamp,
    /// Registrant copied from the trigger.
    pub registrant: RegistrantId,
    /// Winning source identifier (the parent for derived winners).
    pub source_id: SourceId,
    /// Attributed trigger identifier.
    pub trigger_id: TriggerId,
}

impl AttributionRow {
    /// Builds the attribution row for a winning source and its trigger.
    #[must_use]
    pub fn for_pair(source: &Source, trigger: &Trigger) -> Self {
        let source_id =
            source.parent_id.as_ref().map_or_else(|| source.id.clone(), Clone::clone);
        Self {
            id: AttributionId::new(format!("attribution-{}", trigger.id)),
            source_site: sites::site_for(&source.publisher, source.publisher_type)
                .unwrap_or_else(|| source.publisher.clone()),
            source_origin: sites::origin(&source.publisher)
                .unwrap_or_else(|| source.publisher.clone()),
            destination_site: sites::site_for(
                &trigger.attribution_destination,
                trigger.destination_type,
            )
            .unwrap_or_else(|| trigger.attribution_destination.clone()),
            destination_origin: sites::origin(&trigger.attribution_destination)
                .unwrap_or_else(|| trigger.attribution_destination.clone()),
            enrollment_id: trigger.enrollment_id.clone(),
            source_time: source.event_time,
            registrant: trigger.registrant.clone(),
            source_id,
            trigger_id: trigger.id.clone(),
        }
    }
}

// ============================================================================
// SECTION: Rate-Limit Scope
// ============================================================================

/// Key tuple the attribution-quota gate counts rows under.
///
/// # Invariants
/// - Site fields use the same normalization as [`AttributionRow`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitScope {
    /// Site form of the publisher URI.
    pub source_site: String,
    /// Site form of the destination URI.
    pub destination_site: String,
    /// Enrollment the attribution is reported under.
    pub enrollment_id: EnrollmentId,
    /// Registrant from the trigger.
    pub registrant: RegistrantId,
}

impl RateLimitScope {
    /// Builds the scope for a candidate pair, or `None` when either URI
    /// cannot be normalized (the gate then passes as "cannot verify").
    #[must_use]
    pub fn for_pair(source: &Source, trigger: &Trigger) -> Option<Self> {
        let source_site = sites::site_for(&source.publisher, source.publisher_type)?;
        let destination_site =
            sites::site_for(&trigger.attribution_destination, trigger.destination_type)?;
        Some(Self {
            source_site,
            destination_site,
            enrollment_id: trigger.enrollment_id.clone(),
            registrant: trigger.registrant.clone(),
        })
    }

    /// Reports whether the attribution row falls inside this scope.
    #[must_use]
    pub fn matches(&self, row: &AttributionRow) -> bool {
        row.source_site == self.source_site
            && row.destination_site == self.destination_site
            && row.enrollment_id == self.enrollment_id
            && row.registrant == self.registrant
    }
}
