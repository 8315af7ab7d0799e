// crates/attribution-core/tests/filters.rs
// ============================================================================
// Module: Filter Engine Tests
// Description: Validate positive/negative filter matching and malformed JSON.
// Purpose: Ensure filter evaluation is fail-closed and key-intersection based.
// Dependencies: attribution-core
// ============================================================================

//! Filter-match rules: shared-key intersection semantics, empty-side
//! acceptance, the implicit `source_type` entry, event-level spec selection,
//! and the no-match branch for malformed registration JSON.

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
use attribution_core::DebugTag;
use attribution_core::FilterMap;
use attribution_core::InMemoryDatastore;
use attribution_core::TriggerId;
use attribution_core::TriggerStatus;
use attribution_core::filters::parse_filter_set;
use attribution_core::runtime::filter::first_matching_event_trigger;
use attribution_core::runtime::filter::is_filter_match;
use common::engine_for;
use common::event_triggers_json;
use common::sample_source;
use common::sample_trigger;

/// Builds a filter map from `(name, values)` pairs.
fn filter_map(entries: &[(&str, &[&str])]) -> FilterMap {
    let mut map = FilterMap::new();
    for (name, values) in entries {
        map.insert(*name, values.iter().map(ToString::to_string).collect());
    }
    map
}

#[test]
fn positive_match_requires_intersection_on_shared_keys() {
    let data = filter_map(&[("product", &["shoes", "bags"])]);
    let matching = vec![filter_map(&[("product", &["shoes"])])];
    let disjoint = vec![filter_map(&[("product", &["hats"])])];

    assert!(is_filter_match(&data, &matching, true));
    assert!(!is_filter_match(&data, &matching, false));
    assert!(!is_filter_match(&data, &disjoint, true));
    assert!(is_filter_match(&data, &disjoint, false));
}

#[test]
fn keys_on_one_side_only_are_ignored() {
    let data = filter_map(&[("product", &["shoes"])]);
    let unrelated = vec![filter_map(&[("geo", &["us"])])];

    assert!(is_filter_match(&data, &unrelated, true));
    assert!(is_filter_match(&data, &unrelated, false));
}

#[test]
fn any_map_in_the_set_may_match() {
    let data = filter_map(&[("product", &["shoes"])]);
    let set = vec![
        filter_map(&[("product", &["hats"])]),
        filter_map(&[("product", &["shoes"])]),
    ];

    assert!(is_filter_match(&data, &set, true));
}

#[test]
fn empty_sides_impose_no_restriction() {
    let data = filter_map(&[("product", &["shoes"])]);

    assert!(is_filter_match(&data, &[], true));
    assert!(is_filter_match(&FilterMap::new(), &[filter_map(&[("geo", &["us"])])], true));
}

#[test]
fn malformed_filter_set_fails_to_parse() {
    assert!(parse_filter_set("not json", "filters").is_err());
    assert!(parse_filter_set(r#"{"product": ["shoes"]}"#, "filters").is_err());
    assert!(parse_filter_set(r#"[{"product": ["shoes"]}]"#, "filters").is_ok());
}

#[test]
fn source_filter_data_carries_the_implicit_source_type() {
    let source = sample_source("src-1");
    let data = source.parsed_filter_data().expect("filter data");
    assert_eq!(data.values("source_type"), Some(["navigation".to_string()].as_slice()));

    let mut explicit = sample_source("src-2");
    explicit.filter_data = Some(r#"{"source_type": ["event"]}"#.to_string());
    let data = explicit.parsed_filter_data().expect("filter data");
    assert_eq!(data.values("source_type"), Some(["event".to_string()].as_slice()));
}

#[test]
fn first_matching_spec_wins() {
    let data = filter_map(&[("product", &["shoes"])]);
    let json = r#"[
        {"trigger_data": 1, "filters": [{"product": ["hats"]}]},
        {"trigger_data": 2, "filters": [{"product": ["shoes"]}]},
        {"trigger_data": 3}
    ]"#;
    let specs: Vec<attribution_core::EventTriggerSpec> =
        serde_json::from_str(json).expect("specs");

    let spec = first_matching_event_trigger(&data, &specs).expect("match");
    assert_eq!(spec.trigger_data.get(), 2);
}

#[test]
fn mismatched_top_level_filters_drop_with_tag() {
    let mut source = sample_source("src-1");
    source.filter_data = Some(r#"{"product": ["shoes"]}"#.to_string());
    let mut trigger = sample_trigger("t-1");
    trigger.filters = Some(r#"[{"product": ["hats"]}]"#.to_string());

    let store = InMemoryDatastore::new();
    store.insert_source(source).expect("seed source");
    store.insert_trigger(trigger).expect("seed trigger");

    let (mut engine, scheduler) = engine_for(&store, AttributionConfig::default());
    assert!(engine.process_pending_triggers());

    assert_eq!(
        scheduler.scheduled(),
        vec![(TriggerId::new("t-1"), DebugTag::NoMatchingFilterData)]
    );
    let trigger = store.trigger(&TriggerId::new("t-1")).expect("read").expect("trigger");
    assert_eq!(trigger.status, TriggerStatus::Ignored);
}

#[test]
fn malformed_top_level_filters_count_as_no_match() {
    let mut trigger = sample_trigger("t-1");
    trigger.filters = Some("not json".to_string());

    let store = InMemoryDatastore::new();
    store.insert_source(sample_source("src-1")).expect("seed source");
    store.insert_trigger(trigger).expect("seed trigger");

    let (mut engine, scheduler) = engine_for(&store, AttributionConfig::default());
    assert!(engine.process_pending_triggers());

    assert_eq!(
        scheduler.scheduled(),
        vec![(TriggerId::new("t-1"), DebugTag::NoMatchingFilterData)]
    );
}

#[test]
fn negative_top_level_filters_gate_on_shared_keys() {
    let mut source = sample_source("src-1");
    source.filter_data = Some(r#"{"product": ["shoes"]}"#.to_string());
    let mut trigger = sample_trigger("t-1");
    trigger.not_filters = Some(r#"[{"product": ["shoes"]}]"#.to_string());

    let store = InMemoryDatastore::new();
    store.insert_source(source).expect("seed source");
    store.insert_trigger(trigger).expect("seed trigger");

    let (mut engine, scheduler) = engine_for(&store, AttributionConfig::default());
    assert!(engine.process_pending_triggers());

    assert_eq!(
        scheduler.scheduled(),
        vec![(TriggerId::new("t-1"), DebugTag::NoMatchingFilterData)]
    );
}

#[test]
fn event_level_filters_select_the_matching_spec() {
    let mut source = sample_source("src-1");
    source.filter_data = Some(r#"{"product": ["shoes"]}"#.to_string());
    let mut trigger = sample_trigger("t-1");
    trigger.event_triggers = Some(
        r#"[
            {"trigger_data": 1, "priority": 9, "filters": [{"product": ["hats"]}]},
            {"trigger_data": 2, "priority": 1}
        ]"#
        .to_string(),
    );

    let store = InMemoryDatastore::new();
    store.insert_source(source).expect("seed source");
    store.insert_trigger(trigger).expect("seed trigger");

    let (mut engine, _scheduler) = engine_for(&store, AttributionConfig::default());
    assert!(engine.process_pending_triggers());

    let reports = store.event_reports().expect("reports");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].trigger_data.get(), 2);
}

#[test]
fn sample_event_triggers_round_trip_through_json() {
    let json = event_triggers_json(&[(7, 1, Some(5))]);
    let specs: Vec<attribution_core::EventTriggerSpec> =
        serde_json::from_str(&json).expect("specs");
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].trigger_data.get(), 7);
    assert_eq!(specs[0].priority, 1);
    assert_eq!(specs[0].deduplication_key, Some(attribution_core::DedupKey::new(5)));
}
