// crates/attribution-core/src/core/source.rs
// ============================================================================
// Module: Attribution Sources
// Description: The source (impression) entity and its lifecycle enums.
// Purpose: Model registered impressions as the attribution pipeline reads and mutates them.
// Dependencies: crate::core::{destination, filters, identifiers, time}, serde
// ============================================================================

//! ## Overview
//! A source records an ad impression that may later win attribution for a
//! conversion. The pipeline treats sources as read-mostly: the only mutations
//! are dedup-key additions, the running aggregate-contribution total, and the
//! transition to `Ignored` when a competing source wins. Registration-time
//! JSON (filter data, aggregation keys) is kept raw and parsed at use so
//! malformed payloads degrade per the fail-closed filter rules instead of
//! failing the pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::core::destination::DestinationType;
use crate::core::filters::FilterMap;
use crate::core::filters::MalformedField;
use crate::core::identifiers::DebugKey;
use crate::core::identifiers::DedupKey;
use crate::core::identifiers::EnrollmentId;
use crate::core::identifiers::EventId;
use crate::core::identifiers::SourceId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Source Enums
// ============================================================================

/// Interaction kind that registered the source.
///
/// # Invariants
/// - Variants are stable for serialization and datastore encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// View-through impression.
    Event,
    /// Click-through impression.
    Navigation,
}

impl SourceType {
    /// Returns the filter-data value registered implicitly for the type.
    #[must_use]
    pub const fn filter_value(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Navigation => "navigation",
        }
    }
}

/// Source lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization and datastore encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    /// Source is eligible for attribution.
    Active,
    /// Source lost to a competing source and is excluded from attribution.
    Ignored,
    /// Source is queued for deletion by the maintenance job.
    MarkedToDelete,
}

/// Attribution truthfulness mode assigned at registration.
///
/// # Invariants
/// - Only `Truthfully` sources produce event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionMode {
    /// Report real attributions.
    Truthfully,
    /// Suppress event reports for this source.
    Never,
    /// Source was selected for noised (fake) reporting at registration.
    Falsely,
}

// ============================================================================
// SECTION: Source Entity
// ============================================================================

/// Registered impression eligible to win attribution for a trigger.
///
/// # Invariants
/// - `parent_id` is non-null exactly for derived (cross-network) sources;
///   derived sources are never flushed back to the datastore.
/// - `aggregate_contributions` never exceeds the configured per-source budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Source identifier.
    pub id: SourceId,
    /// Opaque event identifier carried into event reports.
    pub event_id: EventId,
    /// Publisher URI where the impression was registered.
    pub publisher: String,
    /// Surface type of the publisher URI.
    pub publisher_type: DestinationType,
    /// Reporting-party enrollment that registered the source.
    pub enrollment_id: EnrollmentId,
    /// Parent source identifier; present only on derived sources.
    pub parent_id: Option<SourceId>,
    /// Registration timestamp.
    pub event_time: Timestamp,
    /// Expiry timestamp; the source stops matching at this instant.
    pub expiry_time: Timestamp,
    /// End of the event-report acceptance window.
    pub event_report_window: Timestamp,
    /// End of the aggregatable-report acceptance window.
    pub aggregatable_report_window: Timestamp,
    /// Registration priority used by the source selector.
    pub priority: i64,
    /// Interaction kind that registered the source.
    pub source_type: SourceType,
    /// Lifecycle status.
    pub status: SourceStatus,
    /// Attribution truthfulness mode.
    pub attribution_mode: AttributionMode,
    /// Whether the source has been credited with an app install.
    pub install_attributed: bool,
    /// Cooldown window (milliseconds) during which install attribution boosts
    /// selector ranking.
    pub install_cooldown_window: i64,
    /// Raw filter-data JSON registered with the source.
    pub filter_data: Option<String>,
    /// Raw aggregation-keys JSON (name to 128-bit key piece).
    pub aggregation_keys: Option<String>,
    /// Running sum of aggregate contribution values already reported.
    pub aggregate_contributions: u32,
    /// Dedup keys consumed by prior event reports.
    pub event_report_dedup_keys: BTreeSet<DedupKey>,
    /// Dedup keys consumed by prior aggregate reports.
    pub aggregate_report_dedup_keys: BTreeSet<DedupKey>,
    /// App destination URIs registered for the source.
    pub app_destinations: Vec<String>,
    /// Web destination URIs registered for the source.
    pub web_destinations: Vec<String>,
    /// Debug key registered with the source.
    pub debug_key: Option<DebugKey>,
    /// Whether the registering party opted into debug reports.
    pub debug_reporting: bool,
}

impl Source {
    /// Reports whether this source was derived from a foreign-enrollment
    /// parent at attribution time.
    #[must_use]
    pub const fn is_derived(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Returns the per-source event-report quota for the source type.
    #[must_use]
    pub const fn max_event_reports(&self) -> usize {
        match self.source_type {
            SourceType::Event => 1,
            SourceType::Navigation => 3,
        }
    }

    /// Returns the registered destinations for the requested surface type.
    #[must_use]
    pub fn destinations(&self, destination_type: DestinationType) -> &[String] {
        match destination_type {
            DestinationType::App => &self.app_destinations,
            DestinationType::Web => &self.web_destinations,
        }
    }

    /// Parses the source's filter data, adding the implicit `source_type`
    /// entry when the registration did not set one explicitly.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedField`] when the registered filter-data JSON does
    /// not decode to a filter map.
    pub fn parsed_filter_data(&self) -> Result<FilterMap, MalformedField> {
        let mut data = match &self.filter_data {
            Some(json) => FilterMap::parse(json, "filter_data")?,
            None => FilterMap::new(),
        };
        data.insert_if_absent("source_type", vec![self.source_type.filter_value().to_string()]);
        Ok(data)
    }
}
