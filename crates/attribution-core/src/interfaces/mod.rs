// crates/attribution-core/src/interfaces/mod.rs
// ============================================================================
// Module: Attribution Interfaces
// Description: Backend-agnostic interfaces for storage, debug scheduling, and
//              cross-network derivation.
// Purpose: Define the contract surfaces consumed by the attribution runtime.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how the attribution engine integrates with external
//! systems without embedding backend-specific details. The datastore contract
//! is transactional: each per-trigger pipeline run executes inside exactly one
//! write transaction, and every mutation either lands atomically or not at
//! all. Implementations must be deterministic and fail closed on missing or
//! invalid data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::AttributionRow;
use crate::core::DebugTag;
use crate::core::DestinationType;
use crate::core::EnrollmentId;
use crate::core::EventReport;
use crate::core::EventReportId;
use crate::core::RateLimitScope;
use crate::core::Source;
use crate::core::SourceDestinations;
use crate::core::SourceId;
use crate::core::SourceStatus;
use crate::core::TimeRange;
use crate::core::Trigger;
use crate::core::TriggerId;
use crate::core::TriggerStatus;
use crate::core::reports::AggregateReport;

// ============================================================================
// SECTION: Datastore Errors
// ============================================================================

/// Datastore boundary errors.
///
/// Every failure crossing the datastore boundary is retriable from the
/// engine's point of view: the enclosing transaction rolls back and the batch
/// driver reports retry-needed.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum DatastoreError {
    /// Datastore I/O error.
    #[error("datastore io error: {0}")]
    Io(String),
    /// Datastore data is corrupted or fails integrity checks.
    #[error("datastore corruption: {0}")]
    Corrupt(String),
    /// Datastore data is invalid.
    #[error("datastore invalid data: {0}")]
    Invalid(String),
    /// Datastore reported an error.
    #[error("datastore error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Transaction Scope
// ============================================================================

/// Operation surface available inside one datastore transaction.
///
/// All reads observe the transaction's snapshot; all writes become visible
/// atomically at commit. Candidate queries apply the destination, time-window,
/// and status predicates of the entity model; in-memory re-sorting is the
/// engine's job and implementations must not be relied on for ordering.
pub trait DatastoreTransaction {
    /// Loads a trigger by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the read fails.
    fn trigger(&mut self, id: &TriggerId) -> Result<Option<Trigger>, DatastoreError>;

    /// Loads a source by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the read fails.
    fn source(&mut self, id: &SourceId) -> Result<Option<Source>, DatastoreError>;

    /// Returns the active sources matching the trigger's destination and time
    /// window under the trigger's own enrollment.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the read fails.
    fn matching_active_sources(
        &mut self,
        trigger: &Trigger,
    ) -> Result<Vec<Source>, DatastoreError>;

    /// Returns the active sources matching the trigger's destination and time
    /// window whose enrollment is in the provided set, excluding sources
    /// carrying an ignored-enrollment marker for the trigger's enrollment.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the read fails.
    fn matching_sources_for_enrollments(
        &mut self,
        trigger: &Trigger,
        enrollments: &BTreeSet<EnrollmentId>,
    ) -> Result<Vec<Source>, DatastoreError>;

    /// Counts event reports targeted at the destination.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the read fails.
    fn num_event_reports_per_destination(
        &mut self,
        destination: &str,
        destination_type: DestinationType,
    ) -> Result<usize, DatastoreError>;

    /// Counts aggregate reports targeted at the destination.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the read fails.
    fn num_aggregate_reports_per_destination(
        &mut self,
        destination: &str,
        destination_type: DestinationType,
    ) -> Result<usize, DatastoreError>;

    /// Returns every event report referencing the source.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the read fails.
    fn source_event_reports(
        &mut self,
        source_id: &SourceId,
    ) -> Result<Vec<EventReport>, DatastoreError>;

    /// Returns the registered destination lists for the source.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the read fails.
    fn source_destinations(
        &mut self,
        source_id: &SourceId,
    ) -> Result<SourceDestinations, DatastoreError>;

    /// Counts attribution rows inside the scope whose source time falls in
    /// the half-open range.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the read fails.
    fn attributions_in_window(
        &mut self,
        scope: &RateLimitScope,
        range: &TimeRange,
    ) -> Result<usize, DatastoreError>;

    /// Counts distinct enrollments other than the excluded one that appear in
    /// attribution rows for the publisher-destination pair inside the range.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the read fails.
    fn distinct_enrollments_in_attribution(
        &mut self,
        publisher_site: &str,
        destination_site: &str,
        excluded_enrollment: &EnrollmentId,
        range: &TimeRange,
    ) -> Result<usize, DatastoreError>;

    /// Inserts an event report.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the write fails.
    fn insert_event_report(&mut self, report: &EventReport) -> Result<(), DatastoreError>;

    /// Inserts an aggregate report.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the write fails.
    fn insert_aggregate_report(&mut self, report: &AggregateReport)
    -> Result<(), DatastoreError>;

    /// Inserts an attribution row.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the write fails.
    fn insert_attribution(&mut self, attribution: &AttributionRow)
    -> Result<(), DatastoreError>;

    /// Deletes an event report evicted by a higher-priority report.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the write fails.
    fn delete_event_report(&mut self, id: &EventReportId) -> Result<(), DatastoreError>;

    /// Updates the status of the identified sources.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the write fails.
    fn update_source_status(
        &mut self,
        ids: &[SourceId],
        status: SourceStatus,
    ) -> Result<(), DatastoreError>;

    /// Records an ignored-enrollment marker excluding the parent source from
    /// the enrollment's future attributions.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the write fails.
    fn insert_ignored_enrollment_source(
        &mut self,
        parent_id: &SourceId,
        enrollment_id: &EnrollmentId,
    ) -> Result<(), DatastoreError>;

    /// Persists the source's event-report dedup-key set.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the write fails.
    fn update_source_event_report_dedup_keys(
        &mut self,
        source: &Source,
    ) -> Result<(), DatastoreError>;

    /// Persists the source's aggregate-report dedup-key set.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the write fails.
    fn update_source_aggregate_report_dedup_keys(
        &mut self,
        source: &Source,
    ) -> Result<(), DatastoreError>;

    /// Persists the source's running aggregate-contribution total.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the write fails.
    fn update_source_aggregate_contributions(
        &mut self,
        source: &Source,
    ) -> Result<(), DatastoreError>;

    /// Updates the status of the identified triggers.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the write fails.
    fn update_trigger_status(
        &mut self,
        ids: &[TriggerId],
        status: TriggerStatus,
    ) -> Result<(), DatastoreError>;
}

// ============================================================================
// SECTION: Datastore
// ============================================================================

/// Transactional datastore consumed by the attribution engine.
///
/// # Invariants
/// - `transact` commits iff the closure returns `Ok`; an `Err` return rolls
///   every mutation back and no partial state is visible.
pub trait Datastore {
    /// Transaction scope type handed to `transact` closures.
    type Tx<'a>: DatastoreTransaction
    where
        Self: 'a;

    /// Returns the identifiers of pending triggers in ascending id order,
    /// read inside a read-only transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the read fails.
    fn pending_trigger_ids(&mut self) -> Result<Vec<TriggerId>, DatastoreError>;

    /// Runs the closure inside one write transaction, committing on `Ok` and
    /// rolling back on `Err`.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the transaction cannot be opened or
    /// committed, or when the closure fails.
    fn transact<'s, T>(
        &'s mut self,
        work: impl FnOnce(&mut Self::Tx<'s>) -> Result<T, DatastoreError>,
    ) -> Result<T, DatastoreError>;
}

// ============================================================================
// SECTION: Debug-Report Scheduler
// ============================================================================

/// Schedules verbose debug reports for trigger drop decisions.
///
/// Delivery is asynchronous and owned by an external transport; scheduling
/// must not fail the pipeline.
pub trait DebugReportScheduler {
    /// Schedules one debug report for the trigger under the tag.
    fn schedule(&self, trigger: &Trigger, tag: DebugTag);
}

// ============================================================================
// SECTION: Derived-Source Creator
// ============================================================================

/// Synthesises cross-network derived sources at attribution time.
///
/// Each derived source must carry `parent_id = foreign.id`, the trigger's
/// enrollment, and must satisfy the same destination-match predicate as
/// ordinary matching sources. Derived sources are never persisted.
pub trait DerivedSourceCreator {
    /// Derives attributable sources from foreign-enrollment parents.
    fn derive_sources(&self, trigger: &Trigger, foreign_sources: &[Source]) -> Vec<Source>;
}
