// crates/attribution-core/tests/aggregate_path.rs
// ============================================================================
// Module: Aggregate Path Tests
// Description: Validate aggregate-report generation, dedup, and budgets.
// Purpose: Ensure the aggregate path honours windows, budgets, and malformed input.
// Dependencies: attribution-core
// ============================================================================

//! Aggregate-report pipeline behaviour: contribution generation, window
//! boundaries, dedup keys, budget enforcement, and malformed payload JSON.

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
use attribution_core::DebugReportStatus;
use attribution_core::DedupKey;
use attribution_core::InMemoryDatastore;
use attribution_core::Source;
use attribution_core::SourceId;
use attribution_core::Timestamp;
use attribution_core::Trigger;
use attribution_core::TriggerId;
use attribution_core::TriggerStatus;
use common::engine_for;
use common::sample_source;
use common::sample_trigger;

/// Source with one aggregation key (`campaign -> 0x159`).
fn aggregatable_source(id: &str) -> Source {
    let mut source = sample_source(id);
    source.aggregation_keys = Some(r#"{"campaign": "0x159"}"#.to_string());
    source
}

/// Trigger contributing `600` to the campaign key with piece `0x400`.
fn aggregatable_trigger(id: &str) -> Trigger {
    let mut trigger = sample_trigger(id);
    trigger.event_triggers = None;
    trigger.aggregatable_trigger_data =
        Some(r#"[{"key_piece": "0x400", "source_keys": ["campaign"]}]"#.to_string());
    trigger.aggregatable_values = Some(r#"{"campaign": 600}"#.to_string());
    trigger
}

#[test]
fn clean_aggregate_attribution_materialises_one_report() {
    let store = InMemoryDatastore::new();
    store.insert_source(aggregatable_source("src-1")).expect("seed source");
    store.insert_trigger(aggregatable_trigger("t-1")).expect("seed trigger");

    let config = AttributionConfig::default();
    let (mut engine, _scheduler) = engine_for(&store, config.clone());
    assert!(engine.process_pending_triggers());

    let reports = store.aggregate_reports().expect("reports");
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.contributions.len(), 1);
    assert_eq!(report.contributions[0].key, 0x559);
    assert_eq!(report.contributions[0].value, 600);
    assert_eq!(report.source_registration_time, Timestamp::from_millis(0));
    assert_eq!(report.api_version, config.api_version);
    assert_eq!(report.debug_report_status, DebugReportStatus::None);

    let min = Timestamp::from_millis(50 + config.aggregate_min_report_delay_millis);
    let max = Timestamp::from_millis(50 + config.aggregate_max_report_delay_millis);
    assert!(report.scheduled_report_time >= min);
    assert!(report.scheduled_report_time < max);

    let source = store.source(&SourceId::new("src-1")).expect("read").expect("source");
    assert_eq!(source.aggregate_contributions, 600);

    let trigger = store.trigger(&TriggerId::new("t-1")).expect("read").expect("trigger");
    assert_eq!(trigger.status, TriggerStatus::Attributed);
    assert_eq!(store.attributions().expect("attributions").len(), 1);
}

#[test]
fn contribution_budget_drop_leaves_source_untouched() {
    let mut source = aggregatable_source("src-1");
    source.aggregate_contributions = 65_000;

    let store = InMemoryDatastore::new();
    store.insert_source(source).expect("seed source");
    store.insert_trigger(aggregatable_trigger("t-1")).expect("seed trigger");

    let (mut engine, _scheduler) = engine_for(&store, AttributionConfig::default());
    assert!(engine.process_pending_triggers());

    assert!(store.aggregate_reports().expect("reports").is_empty());
    let source = store.source(&SourceId::new("src-1")).expect("read").expect("source");
    assert_eq!(source.aggregate_contributions, 65_000);
    let trigger = store.trigger(&TriggerId::new("t-1")).expect("read").expect("trigger");
    assert_eq!(trigger.status, TriggerStatus::Ignored);
}

#[test]
fn budget_exact_fit_is_accepted() {
    let mut source = aggregatable_source("src-1");
    source.aggregate_contributions = 64_936;

    let store = InMemoryDatastore::new();
    store.insert_source(source).expect("seed source");
    store.insert_trigger(aggregatable_trigger("t-1")).expect("seed trigger");

    let (mut engine, _scheduler) = engine_for(&store, AttributionConfig::default());
    assert!(engine.process_pending_triggers());

    assert_eq!(store.aggregate_reports().expect("reports").len(), 1);
    let source = store.source(&SourceId::new("src-1")).expect("read").expect("source");
    assert_eq!(source.aggregate_contributions, 65_536);
}

#[test]
fn window_boundary_is_inclusive() {
    let store = InMemoryDatastore::new();
    store.insert_source(aggregatable_source("src-1")).expect("seed source");
    let mut trigger = aggregatable_trigger("t-1");
    trigger.trigger_time = Timestamp::from_millis(500);
    store.insert_trigger(trigger).expect("seed trigger");

    let (mut engine, _scheduler) = engine_for(&store, AttributionConfig::default());
    assert!(engine.process_pending_triggers());

    assert_eq!(store.aggregate_reports().expect("reports").len(), 1);
}

#[test]
fn window_overrun_by_one_drops() {
    let store = InMemoryDatastore::new();
    store.insert_source(aggregatable_source("src-1")).expect("seed source");
    let mut trigger = aggregatable_trigger("t-1");
    trigger.trigger_time = Timestamp::from_millis(501);
    store.insert_trigger(trigger).expect("seed trigger");

    let (mut engine, _scheduler) = engine_for(&store, AttributionConfig::default());
    assert!(engine.process_pending_triggers());

    assert!(store.aggregate_reports().expect("reports").is_empty());
    let trigger = store.trigger(&TriggerId::new("t-1")).expect("read").expect("trigger");
    assert_eq!(trigger.status, TriggerStatus::Ignored);
}

#[test]
fn consumed_aggregate_dedup_key_drops() {
    let mut source = aggregatable_source("src-1");
    source.aggregate_report_dedup_keys.insert(DedupKey::new(11));

    let store = InMemoryDatastore::new();
    store.insert_source(source).expect("seed source");
    let mut trigger = aggregatable_trigger("t-1");
    trigger.aggregatable_dedup_keys = Some(r#"[{"deduplication_key": 11}]"#.to_string());
    store.insert_trigger(trigger).expect("seed trigger");

    let (mut engine, _scheduler) = engine_for(&store, AttributionConfig::default());
    assert!(engine.process_pending_triggers());

    assert!(store.aggregate_reports().expect("reports").is_empty());
}

#[test]
fn fresh_dedup_key_is_recorded_on_success() {
    let store = InMemoryDatastore::new();
    store.insert_source(aggregatable_source("src-1")).expect("seed source");
    let mut trigger = aggregatable_trigger("t-1");
    trigger.aggregatable_dedup_keys = Some(r#"[{"deduplication_key": 11}]"#.to_string());
    store.insert_trigger(trigger).expect("seed trigger");

    let (mut engine, _scheduler) = engine_for(&store, AttributionConfig::default());
    assert!(engine.process_pending_triggers());

    let reports = store.aggregate_reports().expect("reports");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].dedup_key, Some(DedupKey::new(11)));
    let source = store.source(&SourceId::new("src-1")).expect("read").expect("source");
    assert!(source.aggregate_report_dedup_keys.contains(&DedupKey::new(11)));
}

#[test]
fn malformed_dedup_predicates_are_treated_as_absent() {
    let store = InMemoryDatastore::new();
    store.insert_source(aggregatable_source("src-1")).expect("seed source");
    let mut trigger = aggregatable_trigger("t-1");
    trigger.aggregatable_dedup_keys = Some("not json".to_string());
    store.insert_trigger(trigger).expect("seed trigger");

    let (mut engine, _scheduler) = engine_for(&store, AttributionConfig::default());
    assert!(engine.process_pending_triggers());

    let reports = store.aggregate_reports().expect("reports");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].dedup_key, None);
}

#[test]
fn malformed_payload_json_drops() {
    let store = InMemoryDatastore::new();
    store.insert_source(aggregatable_source("src-1")).expect("seed source");
    let mut trigger = aggregatable_trigger("t-1");
    trigger.aggregatable_values = Some("not json".to_string());
    store.insert_trigger(trigger).expect("seed trigger");

    let (mut engine, _scheduler) = engine_for(&store, AttributionConfig::default());
    assert!(engine.process_pending_triggers());

    assert!(store.aggregate_reports().expect("reports").is_empty());
    let trigger = store.trigger(&TriggerId::new("t-1")).expect("read").expect("trigger");
    assert_eq!(trigger.status, TriggerStatus::Ignored);
}

#[test]
fn debug_keys_are_carried_only_when_both_sides_opt_in() {
    let mut source = aggregatable_source("src-1");
    source.debug_key = Some(attribution_core::DebugKey::new(77));
    source.debug_reporting = true;
    let mut trigger = aggregatable_trigger("t-1");
    trigger.debug_key = Some(attribution_core::DebugKey::new(88));
    trigger.debug_reporting = true;

    let store = InMemoryDatastore::new();
    store.insert_source(source).expect("seed source");
    store.insert_trigger(trigger).expect("seed trigger");

    let (mut engine, _scheduler) = engine_for(&store, AttributionConfig::default());
    assert!(engine.process_pending_triggers());

    let reports = store.aggregate_reports().expect("reports");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].debug_report_status, DebugReportStatus::Pending);
    assert_eq!(reports[0].source_debug_key, Some(attribution_core::DebugKey::new(77)));
    assert_eq!(reports[0].trigger_debug_key, Some(attribution_core::DebugKey::new(88)));
}
