// crates/attribution-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Store Unit Tests
// Description: Targeted tests for the SQLite datastore implementation.
// Purpose: Validate entity round-trips, matching predicates, window queries,
//          transaction rollback, and schema version handling.
// ============================================================================

//! ## Overview
//! Unit-level tests for the `SQLite` datastore:
//! - Entity round-trips including dedup-key sets and hex histogram keys
//! - Candidate matching predicates (status, window, destination)
//! - Sliding-window attribution counts
//! - Rollback on transaction failure
//! - Schema version mismatch rejection
//! - A full pipeline run driven through the store

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

use std::collections::BTreeSet;

use attribution_core::AggregateHistogramContribution;
use attribution_core::AggregateReport;
use attribution_core::AggregateReportId;
use attribution_core::AttributionConfig;
use attribution_core::AttributionEngine;
use attribution_core::AttributionMode;
use attribution_core::AttributionRow;
use attribution_core::CrossNetworkSourceCreator;
use attribution_core::Datastore;
use attribution_core::DatastoreError;
use attribution_core::DatastoreTransaction;
use attribution_core::DebugKey;
use attribution_core::DebugReportStatus;
use attribution_core::DedupKey;
use attribution_core::DestinationType;
use attribution_core::EnrollmentId;
use attribution_core::EventId;
use attribution_core::EventReport;
use attribution_core::EventReportId;
use attribution_core::LogDebugReportScheduler;
use attribution_core::RateLimitScope;
use attribution_core::RegistrantId;
use attribution_core::ReportStatus;
use attribution_core::Source;
use attribution_core::SourceId;
use attribution_core::SourceStatus;
use attribution_core::SourceType;
use attribution_core::TimeRange;
use attribution_core::Timestamp;
use attribution_core::Trigger;
use attribution_core::TriggerData;
use attribution_core::TriggerId;
use attribution_core::TriggerStatus;
use attribution_store_sqlite::SCHEMA_VERSION;
use attribution_store_sqlite::SqliteDatastore;
use attribution_store_sqlite::SqliteStoreConfig;
use attribution_store_sqlite::SqliteStoreError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rusqlite::Connection;
use tempfile::TempDir;

/// App destination shared by the fixtures.
const APP_DESTINATION: &str = "android-app://com.example.shop";

/// Builds a fully populated source fixture.
fn sample_source(id: &str) -> Source {
    Source {
        id: SourceId::new(id),
        event_id: EventId::new(u64::MAX),
        publisher: "android-app://com.example.news".to_string(),
        publisher_type: DestinationType::App,
        enrollment_id: EnrollmentId::new("enrollment-1"),
        parent_id: None,
        event_time: Timestamp::from_millis(10),
        expiry_time: Timestamp::from_millis(1_000),
        event_report_window: Timestamp::from_millis(500),
        aggregatable_report_window: Timestamp::from_millis(500),
        priority: 100,
        source_type: SourceType::Navigation,
        status: SourceStatus::Active,
        attribution_mode: AttributionMode::Truthfully,
        install_attributed: true,
        install_cooldown_window: 250,
        filter_data: Some(r#"{"product": ["shoes"]}"#.to_string()),
        aggregation_keys: Some(r#"{"campaign": "0x159"}"#.to_string()),
        aggregate_contributions: 123,
        event_report_dedup_keys: BTreeSet::from([DedupKey::new(1), DedupKey::new(u64::MAX)]),
        aggregate_report_dedup_keys: BTreeSet::from([DedupKey::new(9)]),
        app_destinations: vec![APP_DESTINATION.to_string()],
        web_destinations: vec!["https://shop.example".to_string()],
        debug_key: Some(DebugKey::new(77)),
        debug_reporting: true,
    }
}

/// Builds a pending trigger fixture with one event-trigger spec.
fn sample_trigger(id: &str) -> Trigger {
    Trigger {
        id: TriggerId::new(id),
        attribution_destination: APP_DESTINATION.to_string(),
        destination_type: DestinationType::App,
        enrollment_id: EnrollmentId::new("enrollment-1"),
        registrant: RegistrantId::new("registrant-1"),
        trigger_time: Timestamp::from_millis(50),
        status: TriggerStatus::Pending,
        filters: None,
        not_filters: None,
        event_triggers: Some(r#"[{"trigger_data": 7, "priority": 1}]"#.to_string()),
        aggregatable_trigger_data: None,
        aggregatable_values: None,
        aggregatable_dedup_keys: None,
        attribution_config: None,
        debug_key: Some(DebugKey::new(88)),
        debug_reporting: false,
    }
}

#[test]
fn source_round_trips_with_destinations_and_dedup_keys() {
    let store = SqliteDatastore::open_in_memory().expect("open");
    let source = sample_source("src-1");
    store.insert_source(&source).expect("write");

    let loaded = store.source(&SourceId::new("src-1")).expect("read").expect("source");
    assert_eq!(loaded, source);
}

#[test]
fn trigger_round_trips_with_raw_json_fields() {
    let store = SqliteDatastore::open_in_memory().expect("open");
    let mut trigger = sample_trigger("t-1");
    trigger.aggregatable_trigger_data = Some(r#"[{"key_piece": "0x400"}]"#.to_string());
    trigger.aggregatable_values = Some(r#"{"campaign": 600}"#.to_string());
    trigger.attribution_config = Some(r#"[{"source_network": "enrollment-x"}]"#.to_string());
    store.insert_trigger(&trigger).expect("write");

    let loaded = store.trigger(&TriggerId::new("t-1")).expect("read").expect("trigger");
    assert_eq!(loaded, trigger);
}

#[test]
fn aggregate_report_round_trips_hex_histogram_keys() {
    let store = SqliteDatastore::open_in_memory().expect("open");
    let report = AggregateReport {
        id: AggregateReportId::new("aggregate-t-1"),
        source_id: SourceId::new("src-1"),
        trigger_id: TriggerId::new("t-1"),
        source_registration_time: Timestamp::from_millis(0),
        scheduled_report_time: Timestamp::from_millis(3_600_050),
        attribution_destination: APP_DESTINATION.to_string(),
        destination_type: DestinationType::App,
        enrollment_id: EnrollmentId::new("enrollment-1"),
        contributions: vec![AggregateHistogramContribution {
            key: 0xffff_ffff_ffff_ffff_ffff_ffff_ffff_ffff,
            value: 600,
        }],
        dedup_key: Some(DedupKey::new(u64::MAX)),
        source_debug_key: Some(DebugKey::new(77)),
        trigger_debug_key: None,
        api_version: "0.1".to_string(),
        status: ReportStatus::Pending,
        debug_report_status: DebugReportStatus::Pending,
    };
    let mut owned = store;
    owned
        .transact(|tx| tx.insert_aggregate_report(&report))
        .expect("write");

    let reports = owned.aggregate_reports().expect("read");
    assert_eq!(reports, vec![report]);
}

#[test]
fn matching_respects_status_window_and_destination() {
    let mut store = SqliteDatastore::open_in_memory().expect("open");
    store.insert_source(&sample_source("src-match")).expect("write");

    let mut ignored = sample_source("src-ignored");
    ignored.status = SourceStatus::Ignored;
    store.insert_source(&ignored).expect("write");

    let mut expired = sample_source("src-expired");
    expired.expiry_time = Timestamp::from_millis(40);
    store.insert_source(&expired).expect("write");

    let mut elsewhere = sample_source("src-elsewhere");
    elsewhere.app_destinations = vec!["android-app://com.other.app".to_string()];
    store.insert_source(&elsewhere).expect("write");

    let trigger = sample_trigger("t-1");
    let matched = store
        .transact(|tx| tx.matching_active_sources(&trigger))
        .expect("query");
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].id, SourceId::new("src-match"));
}

#[test]
fn pending_trigger_ids_are_ordered_and_filtered() {
    let mut store = SqliteDatastore::open_in_memory().expect("open");
    store.insert_trigger(&sample_trigger("t-b")).expect("write");
    store.insert_trigger(&sample_trigger("t-a")).expect("write");
    let mut terminal = sample_trigger("t-c");
    terminal.status = TriggerStatus::Attributed;
    store.insert_trigger(&terminal).expect("write");

    let pending = store.pending_trigger_ids().expect("query");
    assert_eq!(pending, vec![TriggerId::new("t-a"), TriggerId::new("t-b")]);
}

#[test]
fn attribution_window_counts_are_half_open() {
    let mut store = SqliteDatastore::open_in_memory().expect("open");
    let source = sample_source("src-1");
    let trigger = sample_trigger("t-seed");
    let mut row = AttributionRow::for_pair(&source, &trigger);
    row.source_time = Timestamp::from_millis(40);
    store.insert_attribution(&row).expect("write");

    let scope = RateLimitScope::for_pair(&source, &trigger).expect("scope");
    let covering = TimeRange::new(Timestamp::from_millis(40), Timestamp::from_millis(41));
    let below = TimeRange::new(Timestamp::from_millis(0), Timestamp::from_millis(40));
    let counts = store
        .transact(|tx| {
            Ok((
                tx.attributions_in_window(&scope, &covering)?,
                tx.attributions_in_window(&scope, &below)?,
            ))
        })
        .expect("query");
    assert_eq!(counts, (1, 0));
}

#[test]
fn distinct_enrollments_exclude_the_own_enrollment() {
    let mut store = SqliteDatastore::open_in_memory().expect("open");
    let source = sample_source("src-1");
    for (index, enrollment) in ["enrollment-1", "enrollment-2", "enrollment-3"]
        .iter()
        .enumerate()
    {
        let mut trigger = sample_trigger(&format!("t-seed-{index}"));
        trigger.enrollment_id = EnrollmentId::new(*enrollment);
        store.insert_attribution(&AttributionRow::for_pair(&source, &trigger)).expect("write");
    }

    let scope = RateLimitScope::for_pair(&source, &sample_trigger("t-1")).expect("scope");
    let range = TimeRange::new(Timestamp::from_millis(0), Timestamp::from_millis(100));
    let distinct = store
        .transact(|tx| {
            tx.distinct_enrollments_in_attribution(
                &scope.source_site,
                &scope.destination_site,
                &EnrollmentId::new("enrollment-1"),
                &range,
            )
        })
        .expect("query");
    assert_eq!(distinct, 2);
}

#[test]
fn failed_transaction_rolls_back_every_write() {
    let mut store = SqliteDatastore::open_in_memory().expect("open");
    let report = EventReport {
        id: EventReportId::new("event-t-1"),
        source_id: SourceId::new("src-1"),
        trigger_id: TriggerId::new("t-1"),
        trigger_data: TriggerData::new(7),
        trigger_priority: 1,
        trigger_time: Timestamp::from_millis(50),
        report_time: Timestamp::from_millis(500),
        trigger_dedup_key: None,
        attribution_destinations: vec![APP_DESTINATION.to_string()],
        destination_type: DestinationType::App,
        status: ReportStatus::Pending,
    };

    let result: Result<(), DatastoreError> = store.transact(|tx| {
        tx.insert_event_report(&report)?;
        Err(DatastoreError::Io("simulated failure".to_string()))
    });
    assert!(result.is_err());
    assert!(store.event_reports().expect("read").is_empty());
}

#[test]
fn incompatible_schema_version_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("measurement.db");
    let config = SqliteStoreConfig::for_path(&path);
    drop(SqliteDatastore::open(&config).expect("bootstrap"));

    let conn = Connection::open(&path).expect("raw open");
    conn.pragma_update(None, "user_version", 99_i64).expect("tamper");
    drop(conn);

    match SqliteDatastore::open(&config) {
        Err(SqliteStoreError::VersionMismatch {
            found,
            expected,
        }) => {
            assert_eq!(found, 99);
            assert_eq!(expected, SCHEMA_VERSION);
        }
        Err(err) => panic!("expected version mismatch, got {err:?}"),
        Ok(_) => panic!("expected version mismatch, got a datastore"),
    }
}

#[test]
fn full_pipeline_attributes_through_sqlite() {
    let store = SqliteDatastore::open_in_memory().expect("open");
    let mut source = sample_source("src-1");
    source.event_report_dedup_keys = BTreeSet::new();
    source.aggregate_report_dedup_keys = BTreeSet::new();
    source.aggregate_contributions = 0;
    store.insert_source(&source).expect("write");
    let mut trigger = sample_trigger("t-1");
    trigger.aggregatable_trigger_data =
        Some(r#"[{"key_piece": "0x400", "source_keys": ["campaign"]}]"#.to_string());
    trigger.aggregatable_values = Some(r#"{"campaign": 600}"#.to_string());
    store.insert_trigger(&trigger).expect("write");

    let mut engine = AttributionEngine::new(
        store,
        CrossNetworkSourceCreator::new(),
        LogDebugReportScheduler::new(),
        StdRng::seed_from_u64(7),
        AttributionConfig::default(),
    )
    .expect("valid config");
    assert!(engine.process_pending_triggers());

    let store = engine.datastore();
    let event_reports = store.event_reports().expect("read");
    assert_eq!(event_reports.len(), 1);
    assert_eq!(event_reports[0].trigger_data, TriggerData::new(7));

    let aggregate_reports = store.aggregate_reports().expect("read");
    assert_eq!(aggregate_reports.len(), 1);
    assert_eq!(aggregate_reports[0].contributions[0].key, 0x559);

    let trigger = store.trigger(&TriggerId::new("t-1")).expect("read").expect("trigger");
    assert_eq!(trigger.status, TriggerStatus::Attributed);
    assert_eq!(store.attributions().expect("read").len(), 1);

    let source = store.source(&SourceId::new("src-1")).expect("read").expect("source");
    assert_eq!(source.aggregate_contributions, 600);
}
