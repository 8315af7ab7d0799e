// crates/attribution-core/src/runtime/store.rs
// ============================================================================
// Module: In-Memory Datastore
// Description: Snapshot-transactional in-memory datastore for tests and examples.
// Purpose: Provide a deterministic Datastore implementation without external deps.
// Dependencies: crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! This module provides an in-memory implementation of the transactional
//! [`Datastore`] contract for tests and local demos. A transaction works on a
//! cloned snapshot of the state; the snapshot replaces the shared state only
//! when the closure succeeds, so rollback semantics match a real store.
//! Entity maps are ordered, which keeps every query result deterministic. It
//! is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::AggregateReport;
use crate::core::AggregateReportId;
use crate::core::AttributionRow;
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
use crate::core::destination::any_destination_matches;
use crate::core::destination::same_destination;
use crate::interfaces::Datastore;
use crate::interfaces::DatastoreError;
use crate::interfaces::DatastoreTransaction;

// ============================================================================
// SECTION: Store State
// ============================================================================

/// Entity tables held by the in-memory store.
#[derive(Debug, Clone, Default)]
struct StoreState {
    /// Sources keyed by identifier.
    sources: BTreeMap<SourceId, Source>,
    /// Triggers keyed by identifier.
    triggers: BTreeMap<TriggerId, Trigger>,
    /// Event reports keyed by identifier.
    event_reports: BTreeMap<EventReportId, EventReport>,
    /// Aggregate reports keyed by identifier.
    aggregate_reports: BTreeMap<AggregateReportId, AggregateReport>,
    /// Attribution rows in insertion order.
    attributions: Vec<AttributionRow>,
    /// Ignored-enrollment markers for cross-network parents.
    ignored_enrollment_sources: BTreeSet<(SourceId, EnrollmentId)>,
}

impl StoreState {
    /// Reports whether the source matches the trigger's destination and
    /// time window and is active.
    fn source_matches(source: &Source, trigger: &Trigger) -> bool {
        source.status == SourceStatus::Active
            && source.event_time <= trigger.trigger_time
            && trigger.trigger_time < source.expiry_time
            && any_destination_matches(
                source.destinations(trigger.destination_type),
                &trigger.attribution_destination,
                trigger.destination_type,
            )
    }
}

/// Maps a poisoned-mutex failure onto the datastore error kind.
fn poisoned() -> DatastoreError {
    DatastoreError::Store("datastore mutex poisoned".to_string())
}

// ============================================================================
// SECTION: In-Memory Datastore
// ============================================================================

/// In-memory datastore for tests and examples.
///
/// Clones share the underlying state, letting tests keep an inspection handle
/// while the engine owns its own clone.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDatastore {
    /// Shared entity tables protected by a mutex.
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryDatastore {
    /// Creates an empty in-memory datastore.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a source.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the store is unavailable.
    pub fn insert_source(&self, source: Source) -> Result<(), DatastoreError> {
        let mut guard = self.state.lock().map_err(|_| poisoned())?;
        guard.sources.insert(source.id.clone(), source);
        Ok(())
    }

    /// Seeds a trigger.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the store is unavailable.
    pub fn insert_trigger(&self, trigger: Trigger) -> Result<(), DatastoreError> {
        let mut guard = self.state.lock().map_err(|_| poisoned())?;
        guard.triggers.insert(trigger.id.clone(), trigger);
        Ok(())
    }

    /// Seeds an event report.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the store is unavailable.
    pub fn insert_event_report(&self, report: EventReport) -> Result<(), DatastoreError> {
        let mut guard = self.state.lock().map_err(|_| poisoned())?;
        guard.event_reports.insert(report.id.clone(), report);
        Ok(())
    }

    /// Seeds an attribution row.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the store is unavailable.
    pub fn insert_attribution(&self, attribution: AttributionRow) -> Result<(), DatastoreError> {
        let mut guard = self.state.lock().map_err(|_| poisoned())?;
        guard.attributions.push(attribution);
        Ok(())
    }

    /// Returns the source with the identifier, if present.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the store is unavailable.
    pub fn source(&self, id: &SourceId) -> Result<Option<Source>, DatastoreError> {
        let guard = self.state.lock().map_err(|_| poisoned())?;
        Ok(guard.sources.get(id).cloned())
    }

    /// Returns the trigger with the identifier, if present.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the store is unavailable.
    pub fn trigger(&self, id: &TriggerId) -> Result<Option<Trigger>, DatastoreError> {
        let guard = self.state.lock().map_err(|_| poisoned())?;
        Ok(guard.triggers.get(id).cloned())
    }

    /// Returns every event report in id order.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the store is unavailable.
    pub fn event_reports(&self) -> Result<Vec<EventReport>, DatastoreError> {
        let guard = self.state.lock().map_err(|_| poisoned())?;
        Ok(guard.event_reports.values().cloned().collect())
    }

    /// Returns every aggregate report in id order.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the store is unavailable.
    pub fn aggregate_reports(&self) -> Result<Vec<AggregateReport>, DatastoreError> {
        let guard = self.state.lock().map_err(|_| poisoned())?;
        Ok(guard.aggregate_reports.values().cloned().collect())
    }

    /// Returns every attribution row in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the store is unavailable.
    pub fn attributions(&self) -> Result<Vec<AttributionRow>, DatastoreError> {
        let guard = self.state.lock().map_err(|_| poisoned())?;
        Ok(guard.attributions.clone())
    }

    /// Returns every ignored-enrollment marker in key order.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the store is unavailable.
    pub fn ignored_enrollment_sources(
        &self,
    ) -> Result<Vec<(SourceId, EnrollmentId)>, DatastoreError> {
        let guard = self.state.lock().map_err(|_| poisoned())?;
        Ok(guard.ignored_enrollment_sources.iter().cloned().collect())
    }
}

impl Datastore for InMemoryDatastore {
    type Tx<'a>
        = InMemoryTransaction
    where
        Self: 'a;

    fn pending_trigger_ids(&mut self) -> Result<Vec<TriggerId>, DatastoreError> {
        let guard = self.state.lock().map_err(|_| poisoned())?;
        Ok(guard
            .triggers
            .values()
            .filter(|trigger| trigger.status == TriggerStatus::Pending)
            .map(|trigger| trigger.id.clone())
            .collect())
    }

    fn transact<'s, T>(
        &'s mut self,
        work: impl FnOnce(&mut Self::Tx<'s>) -> Result<T, DatastoreError>,
    ) -> Result<T, DatastoreError> {
        let mut guard = self.state.lock().map_err(|_| poisoned())?;
        let mut tx = InMemoryTransaction {
            state: guard.clone(),
        };
        let value = work(&mut tx)?;
        *guard = tx.state;
        Ok(value)
    }
}

// ============================================================================
// SECTION: Transaction Scope
// ============================================================================

/// Snapshot transaction over the in-memory tables.
///
/// # Invariants
/// - Mutations stay private to the snapshot until the enclosing closure
///   returns `Ok`.
#[derive(Debug)]
pub struct InMemoryTransaction {
    /// Working copy of the shared tables.
    state: StoreState,
}

impl DatastoreTransaction for InMemoryTransaction {
    fn trigger(&mut self, id: &TriggerId) -> Result<Option<Trigger>, DatastoreError> {
        Ok(self.state.triggers.get(id).cloned())
    }

    fn source(&mut self, id: &SourceId) -> Result<Option<Source>, DatastoreError> {
        Ok(self.state.sources.get(id).cloned())
    }

    fn matching_active_sources(
        &mut self,
        trigger: &Trigger,
    ) -> Result<Vec<Source>, DatastoreError> {
        Ok(self
            .state
            .sources
            .values()
            .filter(|source| {
                source.enrollment_id == trigger.enrollment_id
                    && StoreState::source_matches(source, trigger)
            })
            .cloned()
            .collect())
    }

    fn matching_sources_for_enrollments(
        &mut self,
        trigger: &Trigger,
        enrollments: &BTreeSet<EnrollmentId>,
    ) -> Result<Vec<Source>, DatastoreError> {
        Ok(self
            .state
            .sources
            .values()
            .filter(|source| {
                enrollments.contains(&source.enrollment_id)
                    && StoreState::source_matches(source, trigger)
                    && !self
                        .state
                        .ignored_enrollment_sources
                        .contains(&(source.id.clone(), trigger.enrollment_id.clone()))
            })
            .cloned()
            .collect())
    }

    fn num_event_reports_per_destination(
        &mut self,
        destination: &str,
        destination_type: DestinationType,
    ) -> Result<usize, DatastoreError> {
        Ok(self
            .state
            .event_reports
            .values()
            .filter(|report| {
                report.destination_type == destination_type
                    && report
                        .attribution_destinations
                        .iter()
                        .any(|registered| {
                            same_destination(registered, destination, destination_type)
                        })
            })
            .count())
    }

    fn num_aggregate_reports_per_destination(
        &mut self,
        destination: &str,
        destination_type: DestinationType,
    ) -> Result<usize, DatastoreError> {
        Ok(self
            .state
            .aggregate_reports
            .values()
            .filter(|report| {
                report.destination_type == destination_type
                    && same_destination(
                        &report.attribution_destination,
                        destination,
                        destination_type,
                    )
            })
            .count())
    }

    fn source_event_reports(
        &mut self,
        source_id: &SourceId,
    ) -> Result<Vec<EventReport>, DatastoreError> {
        Ok(self
            .state
            .event_reports
            .values()
            .filter(|report| &report.source_id == source_id)
            .cloned()
            .collect())
    }

    fn source_destinations(
        &mut self,
        source_id: &SourceId,
    ) -> Result<SourceDestinations, DatastoreError> {
        Ok(self.state.sources.get(source_id).map_or_else(SourceDestinations::default, |source| {
            SourceDestinations {
                app: source.app_destinations.clone(),
                web: source.web_destinations.clone(),
            }
        }))
    }

    fn attributions_in_window(
        &mut self,
        scope: &RateLimitScope,
        range: &TimeRange,
    ) -> Result<usize, DatastoreError> {
        Ok(self
            .state
            .attributions
            .iter()
            .filter(|row| scope.matches(row) && range.contains(row.source_time))
            .count())
    }

    fn distinct_enrollments_in_attribution(
        &mut self,
        publisher_site: &str,
        destination_site: &str,
        excluded_enrollment: &EnrollmentId,
        range: &TimeRange,
    ) -> Result<usize, DatastoreError> {
        let enrollments: BTreeSet<&EnrollmentId> = self
            .state
            .attributions
            .iter()
            .filter(|row| {
                row.source_site == publisher_site
                    && row.destination_site == destination_site
                    && &row.enrollment_id != excluded_enrollment
                    && range.contains(row.source_time)
            })
            .map(|row| &row.enrollment_id)
            .collect();
        Ok(enrollments.len())
    }

    fn insert_event_report(&mut self, report: &EventReport) -> Result<(), DatastoreError> {
        if self.state.event_reports.insert(report.id.clone(), report.clone()).is_some() {
            return Err(DatastoreError::Invalid(format!(
                "duplicate event report id: {}",
                report.id
            )));
        }
        Ok(())
    }

    fn insert_aggregate_report(
        &mut self,
        report: &AggregateReport,
    ) -> Result<(), DatastoreError> {
        if self.state.aggregate_reports.insert(report.id.clone(), report.clone()).is_some() {
            return Err(DatastoreError::Invalid(format!(
                "duplicate aggregate report id: {}",
                report.id
            )));
        }
        Ok(())
    }

    fn insert_attribution(&mut self, attribution: &AttributionRow) -> Result<(), DatastoreError> {
        self.state.attributions.push(attribution.clone());
        Ok(())
    }

    fn delete_event_report(&mut self, id: &EventReportId) -> Result<(), DatastoreError> {
        self.state
            .event_reports
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DatastoreError::Invalid(format!("missing event report: {id}")))
    }

    fn update_source_status(
        &mut self,
        ids: &[SourceId],
        status: SourceStatus,
    ) -> Result<(), DatastoreError> {
        for id in ids {
            let source = self
                .state
                .sources
                .get_mut(id)
                .ok_or_else(|| DatastoreError::Invalid(format!("missing source: {id}")))?;
            source.status = status;
        }
        Ok(())
    }

    fn insert_ignored_enrollment_source(
        &mut self,
        parent_id: &SourceId,
        enrollment_id: &EnrollmentId,
    ) -> Result<(), DatastoreError> {
        self.state
            .ignored_enrollment_sources
            .insert((parent_id.clone(), enrollment_id.clone()));
        Ok(())
    }

    fn update_source_event_report_dedup_keys(
        &mut self,
        source: &Source,
    ) -> Result<(), DatastoreError> {
        let stored = self
            .state
            .sources
            .get_mut(&source.id)
            .ok_or_else(|| DatastoreError::Invalid(format!("missing source: {}", source.id)))?;
        stored.event_report_dedup_keys = source.event_report_dedup_keys.clone();
        Ok(())
    }

    fn update_source_aggregate_report_dedup_keys(
        &mut self,
        source: &Source,
    ) -> Result<(), DatastoreError> {
        let stored = self
            .state
            .sources
            .get_mut(&source.id)
            .ok_or_else(|| DatastoreError::Invalid(format!("missing source: {}", source.id)))?;
        stored.aggregate_report_dedup_keys = source.aggregate_report_dedup_keys.clone();
        Ok(())
    }

    fn update_source_aggregate_contributions(
        &mut self,
        source: &Source,
    ) -> Result<(), DatastoreError> {
        let stored = self
            .state
            .sources
            .get_mut(&source.id)
            .ok_or_else(|| DatastoreError::Invalid(format!("missing source: {}", source.id)))?;
        stored.aggregate_contributions = source.aggregate_contributions;
        Ok(())
    }

    fn update_trigger_status(
        &mut self,
        ids: &[TriggerId],
        status: TriggerStatus,
    ) -> Result<(), DatastoreError> {
        for id in ids {
            let trigger = self
                .state
                .triggers
                .get_mut(id)
                .ok_or_else(|| DatastoreError::Invalid(format!("missing trigger: {id}")))?;
            trigger.status = status;
        }
        Ok(())
    }
}
