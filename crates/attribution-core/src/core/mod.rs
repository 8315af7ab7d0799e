// crates/attribution-core/src/core/mod.rs
// ============================================================================
// Module: Attribution Core Types
// Description: Entity model shared by the runtime and datastore implementations.
// Purpose: Define sources, triggers, reports, bookkeeping rows, and configuration.
// Dependencies: crate::core submodules
// ============================================================================

//! ## Overview
//! Core types mirror the datastore's logical entity kinds. They carry no
//! behaviour beyond parsing their own untrusted registration JSON and
//! deriving normalized forms; every decision lives in the runtime modules.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod attribution;
pub mod config;
pub mod debug;
pub mod destination;
pub mod filters;
pub mod identifiers;
pub mod reports;
pub mod sites;
pub mod source;
pub mod time;
pub mod trigger;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use attribution::AttributionRow;
pub use attribution::RateLimitScope;
pub use config::AttributionConfig;
pub use config::ConfigError;
pub use debug::DebugTag;
pub use destination::DestinationType;
pub use destination::SourceDestinations;
pub use filters::FilterMap;
pub use filters::MalformedField;
pub use identifiers::AggregateReportId;
pub use identifiers::AttributionId;
pub use identifiers::DebugKey;
pub use identifiers::DedupKey;
pub use identifiers::EnrollmentId;
pub use identifiers::EventId;
pub use identifiers::EventReportId;
pub use identifiers::RegistrantId;
pub use identifiers::SourceId;
pub use identifiers::TriggerData;
pub use identifiers::TriggerId;
pub use reports::AggregateHistogramContribution;
pub use reports::AggregateReport;
pub use reports::DebugReportStatus;
pub use reports::EventReport;
pub use reports::ReportStatus;
pub use source::AttributionMode;
pub use source::Source;
pub use source::SourceStatus;
pub use source::SourceType;
pub use time::TimeRange;
pub use time::Timestamp;
pub use trigger::AggregateDedupKeySpec;
pub use trigger::AggregateTriggerData;
pub use trigger::AttributionConfigEntry;
pub use trigger::EventTriggerSpec;
pub use trigger::Trigger;
pub use trigger::TriggerStatus;
