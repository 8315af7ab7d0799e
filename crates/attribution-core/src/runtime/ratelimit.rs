// crates/attribution-core/src/runtime/ratelimit.rs
// ============================================================================
// Module: Attribution Rate-Limit Gates
// Description: Attribution quota and distinct reporting-origin privacy bounds.
// Purpose: Block over-quota attributions before any report generation.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! Two sliding-window gates run after the top-level filter gate and before
//! either report path. The attribution quota counts prior attribution rows
//! for the `(source site, destination site, enrollment, registrant)` tuple;
//! the privacy bound counts distinct foreign enrollments for the
//! `(publisher, destination)` pair. A URI that cannot be normalized leaves
//! the corresponding gate unverifiable, which passes with a log line rather
//! than blocking. Each block schedules its debug tag before rejecting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing::debug;
use tracing::warn;

use crate::core::AttributionConfig;
use crate::core::DebugTag;
use crate::core::RateLimitScope;
use crate::core::Source;
use crate::core::TimeRange;
use crate::core::Trigger;
use crate::core::sites;
use crate::interfaces::DatastoreError;
use crate::interfaces::DatastoreTransaction;
use crate::interfaces::DebugReportScheduler;

// ============================================================================
// SECTION: Gate Evaluation
// ============================================================================

/// Runs both rate-limit gates for the candidate pair.
///
/// Returns `true` when the trigger may proceed to report generation.
///
/// # Errors
///
/// Returns [`DatastoreError`] when a window query fails.
pub fn within_rate_limits<T: DatastoreTransaction>(
    tx: &mut T,
    source: &Source,
    trigger: &Trigger,
    config: &AttributionConfig,
    scheduler: &impl DebugReportScheduler,
) -> Result<bool, DatastoreError> {
    let range = TimeRange::window_ending_at(trigger.trigger_time, config.rate_limit_window_millis);

    if !attribution_quota_allows(tx, source, trigger, config, &range)? {
        scheduler.schedule(trigger, DebugTag::AttributionsPerSourceDestinationLimit);
        return Ok(false);
    }

    if !reporting_origins_within_bound(tx, source, trigger, config, &range)? {
        scheduler.schedule(trigger, DebugTag::ReportingOriginLimit);
        return Ok(false);
    }

    Ok(true)
}

/// Checks the per-tuple attribution quota.
fn attribution_quota_allows<T: DatastoreTransaction>(
    tx: &mut T,
    source: &Source,
    trigger: &Trigger,
    config: &AttributionConfig,
    range: &TimeRange,
) -> Result<bool, DatastoreError> {
    let Some(scope) = RateLimitScope::for_pair(source, trigger) else {
        warn!(trigger = %trigger.id, "attribution quota unverifiable, passing");
        return Ok(true);
    };
    let count = tx.attributions_in_window(&scope, range)?;
    let allowed = count < config.max_attributions_per_rate_limit_window;
    if !allowed {
        debug!(trigger = %trigger.id, count, "attribution quota exhausted");
    }
    Ok(allowed)
}

/// Checks the distinct reporting-origin privacy bound.
fn reporting_origins_within_bound<T: DatastoreTransaction>(
    tx: &mut T,
    source: &Source,
    trigger: &Trigger,
    config: &AttributionConfig,
    range: &TimeRange,
) -> Result<bool, DatastoreError> {
    let publisher = sites::site_for(&source.publisher, source.publisher_type);
    let destination =
        sites::site_for(&trigger.attribution_destination, trigger.destination_type);
    let (Some(publisher), Some(destination)) = (publisher, destination) else {
        warn!(trigger = %trigger.id, "reporting-origin bound unverifiable, passing");
        return Ok(true);
    };
    let distinct = tx.distinct_enrollments_in_attribution(
        &publisher,
        &destination,
        &trigger.enrollment_id,
        range,
    )?;
    let allowed = distinct < config.max_distinct_reporting_origins;
    if !allowed {
        debug!(trigger = %trigger.id, distinct, "reporting-origin bound exhausted");
    }
    Ok(allowed)
}
