// crates/attribution-core/src/core/debug.rs
// ============================================================================
// Module: Attribution Debug Tags
// Description: Tag vocabulary for verbose debug-report scheduling.
// Purpose: Name every drop decision the pipeline can take for a trigger.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Each business-rule drop schedules exactly one debug report identified by a
//! tag from this closed vocabulary. Delivery is owned by an external
//! transport; the core only hands the tag and the affected trigger to the
//! configured scheduler. Wire names keep the transport's `TRIGGER_*` form.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Debug Tags
// ============================================================================

/// Verbose debug-report tags scheduled on trigger drop decisions.
///
/// # Invariants
/// - Wire names are stable for transport matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebugTag {
    /// No active source matched the trigger.
    #[serde(rename = "TRIGGER_NO_MATCHING_SOURCE")]
    NoMatchingSource,
    /// Top-level filters rejected the selected source.
    #[serde(rename = "TRIGGER_NO_MATCHING_FILTER_DATA")]
    NoMatchingFilterData,
    /// The trigger fired after the source's event-report window.
    #[serde(rename = "TRIGGER_EVENT_REPORT_WINDOW_PASSED")]
    EventReportWindowPassed,
    /// No event-trigger specification matched the source's filter data.
    #[serde(rename = "TRIGGER_EVENT_NO_MATCHING_CONFIGURATIONS")]
    EventNoMatchingConfigurations,
    /// The event-trigger dedup key was already consumed.
    #[serde(rename = "TRIGGER_EVENT_DEDUPLICATED")]
    EventDeduplicated,
    /// The source exhausted its event-report quota with no evictable report.
    #[serde(rename = "TRIGGER_EVENT_EXCESSIVE_REPORTS")]
    EventExcessiveReports,
    /// An existing report in the bucket outranks the tentative report.
    #[serde(rename = "TRIGGER_EVENT_LOW_PRIORITY")]
    EventLowPriority,
    /// The publisher-destination attribution quota is exhausted.
    #[serde(rename = "TRIGGER_ATTRIBUTIONS_PER_SOURCE_DESTINATION_LIMIT")]
    AttributionsPerSourceDestinationLimit,
    /// The distinct reporting-origin bound is exhausted.
    #[serde(rename = "TRIGGER_REPORTING_ORIGIN_LIMIT")]
    ReportingOriginLimit,
}

impl DebugTag {
    /// Returns the stable wire name of the tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoMatchingSource => "TRIGGER_NO_MATCHING_SOURCE",
            Self::NoMatchingFilterData => "TRIGGER_NO_MATCHING_FILTER_DATA",
            Self::EventReportWindowPassed => "TRIGGER_EVENT_REPORT_WINDOW_PASSED",
            Self::EventNoMatchingConfigurations => "TRIGGER_EVENT_NO_MATCHING_CONFIGURATIONS",
            Self::EventDeduplicated => "TRIGGER_EVENT_DEDUPLICATED",
            Self::EventExcessiveReports => "TRIGGER_EVENT_EXCESSIVE_REPORTS",
            Self::EventLowPriority => "TRIGGER_EVENT_LOW_PRIORITY",
            Self::AttributionsPerSourceDestinationLimit => {
                "TRIGGER_ATTRIBUTIONS_PER_SOURCE_DESTINATION_LIMIT"
            }
            Self::ReportingOriginLimit => "TRIGGER_REPORTING_ORIGIN_LIMIT",
        }
    }
}

impl fmt::Display for DebugTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
