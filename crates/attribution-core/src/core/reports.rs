// crates/attribution-core/src/core/reports.rs
// ============================================================================
// Module: Attribution Reports
// Description: Event and aggregate report entities materialised by the pipeline.
// Purpose: Model the two report kinds with stable serialized forms.
// Dependencies: crate::core::{destination, identifiers, time}, serde
// ============================================================================

//! ## Overview
//! Event reports carry coarse per-trigger data and compete for per-source
//! quota by priority. Aggregate reports carry a histogram of `(key, value)`
//! contributions under a per-source value budget and are never evicted by the
//! core. Histogram keys are 128-bit; they serialize as `0x`-prefixed hex
//! strings so report payloads stay valid JSON everywhere.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::destination::DestinationType;
use crate::core::identifiers::AggregateReportId;
use crate::core::identifiers::DebugKey;
use crate::core::identifiers::DedupKey;
use crate::core::identifiers::EnrollmentId;
use crate::core::identifiers::EventReportId;
use crate::core::identifiers::SourceId;
use crate::core::identifiers::TriggerData;
use crate::core::identifiers::TriggerId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Report Status
// ============================================================================

/// Delivery status of a materialised report.
///
/// # Invariants
/// - The core only creates `Pending` reports; delivery transitions are owned
///   by the reporting job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Awaiting delivery.
    Pending,
    /// Delivered to the reporting origin.
    Delivered,
}

/// Debug-report status stamped on aggregate reports.
///
/// # Invariants
/// - `Pending` requires both the source and the trigger to have opted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugReportStatus {
    /// A debug copy is scheduled alongside the report.
    Pending,
    /// No debug copy will be produced.
    None,
}

// ============================================================================
// SECTION: Event Report
// ============================================================================

/// Per-trigger report carrying coarse trigger data.
///
/// # Invariants
/// - `report_time` identifies the delivery bucket; eviction competes only
///   within one bucket.
/// - At most one event report exists per `(source, dedup key)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventReport {
    /// Report identifier.
    pub id: EventReportId,
    /// Source that won attribution.
    pub source_id: SourceId,
    /// Trigger that fired the report.
    pub trigger_id: TriggerId,
    /// Coarse trigger data from the matching event-trigger spec.
    pub trigger_data: TriggerData,
    /// Priority from the matching event-trigger spec.
    pub trigger_priority: i64,
    /// Conversion timestamp.
    pub trigger_time: Timestamp,
    /// Delivery bucket; the end of the source's event-report window.
    pub report_time: Timestamp,
    /// Dedup key consumed by this report, if any.
    pub trigger_dedup_key: Option<DedupKey>,
    /// Destination URIs the report is addressed to.
    pub attribution_destinations: Vec<String>,
    /// Surface type of the destinations.
    pub destination_type: DestinationType,
    /// Delivery status.
    pub status: ReportStatus,
}

// ============================================================================
// SECTION: Aggregate Report
// ============================================================================

/// One `(key, value)` bucket contribution inside an aggregate report.
///
/// # Invariants
/// - `value` is positive; zero-valued contributions are never materialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateHistogramContribution {
    /// 128-bit histogram bucket key.
    #[serde(with = "hex_u128")]
    pub key: u128,
    /// Contribution value counted against the source budget.
    pub value: u32,
}

/// Histogram-style report carrying bucket contributions.
///
/// # Invariants
/// - Never evicted by the core once inserted.
/// - At most one aggregate report exists per `(source, dedup key)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateReport {
    /// Report identifier.
    pub id: AggregateReportId,
    /// Source that won attribution.
    pub source_id: SourceId,
    /// Trigger that fired the report.
    pub trigger_id: TriggerId,
    /// Source registration time floored to its UTC day.
    pub source_registration_time: Timestamp,
    /// Jittered delivery time.
    pub scheduled_report_time: Timestamp,
    /// Destination URI the report is addressed to.
    pub attribution_destination: String,
    /// Surface type of the destination.
    pub destination_type: DestinationType,
    /// Reporting-party enrollment receiving the report.
    pub enrollment_id: EnrollmentId,
    /// Ordered histogram contributions.
    pub contributions: Vec<AggregateHistogramContribution>,
    /// Dedup key consumed by this report, if any.
    pub dedup_key: Option<DedupKey>,
    /// Source-side debug key, carried only when debugging is permitted.
    pub source_debug_key: Option<DebugKey>,
    /// Trigger-side debug key, carried only when debugging is permitted.
    pub trigger_debug_key: Option<DebugKey>,
    /// API version stamped into the produced report.
    pub api_version: String,
    /// Delivery status.
    pub status: ReportStatus,
    /// Debug-copy status.
    pub debug_report_status: DebugReportStatus,
}

// ============================================================================
// SECTION: Hex Key Serialization
// ============================================================================

/// Serde adapter encoding 128-bit histogram keys as `0x`-prefixed hex strings.
mod hex_u128 {
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;
    use serde::de::Error;

    /// Serializes the key as a lowercase hex string.
    pub fn serialize<S: Serializer>(key: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{key:#x}"))
    }

    /// Deserializes a `0x`-prefixed hex string into the key.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let text = String::deserialize(deserializer)?;
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .ok_or_else(|| D::Error::custom("histogram key must be 0x-prefixed hex"))?;
        u128::from_str_radix(digits, 16).map_err(D::Error::custom)
    }
}
