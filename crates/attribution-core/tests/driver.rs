// crates/attribution-core/tests/driver.rs
// ============================================================================
// Module: Batch Driver Tests
// Description: Validate the batch budget, idempotence, and retry semantics.
// Purpose: Ensure the driver drains pending work and fails closed on datastore errors.
// Dependencies: attribution-core
// ============================================================================

//! Batch driver behaviour: the per-invocation budget, the drained flag,
//! no-op re-runs, and retry-needed on datastore failures.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use attribution_core::AttributionConfig;
use attribution_core::AttributionEngine;
use attribution_core::AttributionOutcome;
use attribution_core::CrossNetworkSourceCreator;
use attribution_core::Datastore;
use attribution_core::DatastoreError;
use attribution_core::InMemoryDatastore;
use attribution_core::RecordingDebugReportScheduler;
use attribution_core::TriggerId;
use attribution_core::TriggerStatus;
use attribution_core::runtime::InMemoryTransaction;
use common::engine_for;
use common::sample_source;
use common::sample_trigger;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Datastore double that fails every call at the boundary.
struct FailingDatastore;

impl Datastore for FailingDatastore {
    type Tx<'a>
        = InMemoryTransaction
    where
        Self: 'a;

    fn pending_trigger_ids(&mut self) -> Result<Vec<TriggerId>, DatastoreError> {
        Err(DatastoreError::Io("disk unavailable".to_string()))
    }

    fn transact<'s, T>(
        &'s mut self,
        _work: impl FnOnce(&mut Self::Tx<'s>) -> Result<T, DatastoreError>,
    ) -> Result<T, DatastoreError> {
        Err(DatastoreError::Io("disk unavailable".to_string()))
    }
}

/// Datastore double whose transactions fail after listing pending work.
struct FlakyDatastore {
    /// Store answering the pending-id query.
    inner: InMemoryDatastore,
}

impl Datastore for FlakyDatastore {
    type Tx<'a>
        = InMemoryTransaction
    where
        Self: 'a;

    fn pending_trigger_ids(&mut self) -> Result<Vec<TriggerId>, DatastoreError> {
        self.inner.pending_trigger_ids()
    }

    fn transact<'s, T>(
        &'s mut self,
        _work: impl FnOnce(&mut Self::Tx<'s>) -> Result<T, DatastoreError>,
    ) -> Result<T, DatastoreError> {
        Err(DatastoreError::Io("commit failed".to_string()))
    }
}

#[test]
fn backlog_over_budget_reports_more_work() {
    let store = InMemoryDatastore::new();
    store.insert_source(sample_source("src-1")).expect("seed source");
    store.insert_trigger(sample_trigger("t-a")).expect("seed trigger");
    store.insert_trigger(sample_trigger("t-b")).expect("seed trigger");

    let config = AttributionConfig {
        max_attributions_per_invocation: 1,
        ..AttributionConfig::default()
    };
    let (mut engine, _scheduler) = engine_for(&store, config);

    assert!(!engine.process_pending_triggers());
    let first = store.trigger(&TriggerId::new("t-a")).expect("read").expect("trigger");
    assert_eq!(first.status, TriggerStatus::Attributed);
    let second = store.trigger(&TriggerId::new("t-b")).expect("read").expect("trigger");
    assert_eq!(second.status, TriggerStatus::Pending);

    assert!(engine.process_pending_triggers());
    let second = store.trigger(&TriggerId::new("t-b")).expect("read").expect("trigger");
    assert_ne!(second.status, TriggerStatus::Pending);
}

#[test]
fn second_invocation_is_a_no_op() {
    let store = InMemoryDatastore::new();
    store.insert_source(sample_source("src-1")).expect("seed source");
    store.insert_trigger(sample_trigger("t-1")).expect("seed trigger");

    let (mut engine, _scheduler) = engine_for(&store, AttributionConfig::default());
    assert!(engine.process_pending_triggers());
    let reports = store.event_reports().expect("reports");
    let attributions = store.attributions().expect("attributions");

    assert!(engine.process_pending_triggers());
    assert_eq!(store.event_reports().expect("reports"), reports);
    assert_eq!(store.attributions().expect("attributions"), attributions);
}

#[test]
fn terminal_trigger_is_a_no_op() {
    let store = InMemoryDatastore::new();
    store.insert_source(sample_source("src-1")).expect("seed source");
    let mut trigger = sample_trigger("t-1");
    trigger.status = TriggerStatus::Attributed;
    store.insert_trigger(trigger).expect("seed trigger");

    let (mut engine, _scheduler) = engine_for(&store, AttributionConfig::default());
    let outcome = engine.attribute_trigger(&TriggerId::new("t-1")).expect("pipeline");
    assert_eq!(outcome, AttributionOutcome::Noop);
    assert!(store.event_reports().expect("reports").is_empty());
}

#[test]
fn pending_fetch_failure_requests_retry() {
    let mut engine = AttributionEngine::new(
        FailingDatastore,
        CrossNetworkSourceCreator::new(),
        RecordingDebugReportScheduler::new(),
        StdRng::seed_from_u64(7),
        AttributionConfig::default(),
    )
    .expect("valid config");
    assert!(!engine.process_pending_triggers());
}

#[test]
fn transaction_failure_requests_retry_and_leaves_no_state() {
    let inner = InMemoryDatastore::new();
    inner.insert_source(sample_source("src-1")).expect("seed source");
    inner.insert_trigger(sample_trigger("t-1")).expect("seed trigger");

    let mut engine = AttributionEngine::new(
        FlakyDatastore {
            inner: inner.clone(),
        },
        CrossNetworkSourceCreator::new(),
        RecordingDebugReportScheduler::new(),
        StdRng::seed_from_u64(7),
        AttributionConfig::default(),
    )
    .expect("valid config");

    assert!(!engine.process_pending_triggers());
    let trigger = inner.trigger(&TriggerId::new("t-1")).expect("read").expect("trigger");
    assert_eq!(trigger.status, TriggerStatus::Pending);
    assert!(inner.event_reports().expect("reports").is_empty());
}
