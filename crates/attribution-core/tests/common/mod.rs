// crates/attribution-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Utilities
// Description: Shared builders for attribution-core integration tests.
// Purpose: Provide reusable sources, triggers, and engine wiring.
// Dependencies: attribution-core, rand, serde_json
// ============================================================================

//! ## Overview
//! Provides shared entity builders and engine wiring for the attribution
//! pipeline tests. Builders produce fully populated entities with neutral
//! defaults; tests override the fields under test.

#![allow(
    dead_code,
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only helpers; not every test binary uses every builder."
)]

use std::collections::BTreeSet;

use attribution_core::AttributionConfig;
use attribution_core::AttributionEngine;
use attribution_core::AttributionMode;
use attribution_core::CrossNetworkSourceCreator;
use attribution_core::DestinationType;
use attribution_core::EnrollmentId;
use attribution_core::EventId;
use attribution_core::InMemoryDatastore;
use attribution_core::RecordingDebugReportScheduler;
use attribution_core::RegistrantId;
use attribution_core::Source;
use attribution_core::SourceId;
use attribution_core::SourceStatus;
use attribution_core::SourceType;
use attribution_core::Timestamp;
use attribution_core::Trigger;
use attribution_core::TriggerId;
use attribution_core::TriggerStatus;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// App destination every sample trigger converts on.
pub const APP_DESTINATION: &str = "android-app://com.example.shop";

/// App publisher every sample source was registered on.
pub const APP_PUBLISHER: &str = "android-app://com.example.news";

/// Enrollment shared by sample sources and triggers.
pub const ENROLLMENT: &str = "enrollment-1";

/// Engine wiring used by the pipeline tests.
pub type TestEngine = AttributionEngine<
    InMemoryDatastore,
    CrossNetworkSourceCreator,
    RecordingDebugReportScheduler,
    StdRng,
>;

/// Builds an active navigation source matching the sample trigger.
pub fn sample_source(id: &str) -> Source {
    Source {
        id: SourceId::new(id),
        event_id: EventId::new(42),
        publisher: APP_PUBLISHER.to_string(),
        publisher_type: DestinationType::App,
        enrollment_id: EnrollmentId::new(ENROLLMENT),
        parent_id: None,
        event_time: Timestamp::from_millis(10),
        expiry_time: Timestamp::from_millis(1_000),
        event_report_window: Timestamp::from_millis(500),
        aggregatable_report_window: Timestamp::from_millis(500),
        priority: 100,
        source_type: SourceType::Navigation,
        status: SourceStatus::Active,
        attribution_mode: AttributionMode::Truthfully,
        install_attributed: false,
        install_cooldown_window: 0,
        filter_data: None,
        aggregation_keys: None,
        aggregate_contributions: 0,
        event_report_dedup_keys: BTreeSet::new(),
        aggregate_report_dedup_keys: BTreeSet::new(),
        app_destinations: vec![APP_DESTINATION.to_string()],
        web_destinations: Vec::new(),
        debug_key: None,
        debug_reporting: false,
    }
}

/// Builds a pending trigger with one event-trigger spec (`trigger_data = 7`).
pub fn sample_trigger(id: &str) -> Trigger {
    Trigger {
        id: TriggerId::new(id),
        attribution_destination: APP_DESTINATION.to_string(),
        destination_type: DestinationType::App,
        enrollment_id: EnrollmentId::new(ENROLLMENT),
        registrant: RegistrantId::new("registrant-1"),
        trigger_time: Timestamp::from_millis(50),
        status: TriggerStatus::Pending,
        filters: None,
        not_filters: None,
        event_triggers: Some(event_triggers_json(&[(7, 1, None)])),
        aggregatable_trigger_data: None,
        aggregatable_values: None,
        aggregatable_dedup_keys: None,
        attribution_config: None,
        debug_key: None,
        debug_reporting: false,
    }
}

/// Renders event-trigger specs as registration JSON.
///
/// Each entry is `(trigger_data, priority, deduplication_key)`.
pub fn event_triggers_json(specs: &[(u64, i64, Option<u64>)]) -> String {
    let entries: Vec<serde_json::Value> = specs
        .iter()
        .map(|(trigger_data, priority, dedup_key)| {
            let mut entry = serde_json::json!({
                "trigger_data": trigger_data,
                "priority": priority,
            });
            if let Some(key) = dedup_key {
                entry["deduplication_key"] = (*key).into();
            }
            entry
        })
        .collect();
    serde_json::Value::Array(entries).to_string()
}

/// Wires an engine over a clone of the store with a recording scheduler.
pub fn engine_for(
    store: &InMemoryDatastore,
    config: AttributionConfig,
) -> (TestEngine, RecordingDebugReportScheduler) {
    let scheduler = RecordingDebugReportScheduler::new();
    let engine = AttributionEngine::new(
        store.clone(),
        CrossNetworkSourceCreator::new(),
        scheduler.clone(),
        StdRng::seed_from_u64(7),
        config,
    )
    .expect("valid config");
    (engine, scheduler)
}
