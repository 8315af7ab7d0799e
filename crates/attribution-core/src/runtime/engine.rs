// crates/attribution-core/src/runtime/engine.rs
// ============================================================================
// Module: Attribution Engine
// Description: Batch driver and per-trigger attribution pipeline.
// Purpose: Select a source per trigger and materialise reports under every gate.
// Dependencies: crate::{core, interfaces, runtime}, rand, tracing
// ============================================================================

//! ## Overview
//! The engine is the single canonical execution path for attribution. The
//! batch driver fetches pending trigger ids and runs each through the
//! pipeline inside its own write transaction: source selection, top-level
//! filters, rate-limit gates, the aggregate path, the event path, and
//! finalisation. Business-rule failures are explicit drop decisions that
//! commit; only datastore failures roll back and surface to the driver as
//! retry-needed. All ordering is deterministic for identical datastore
//! inputs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Reverse;

use rand::Rng;
use tracing::debug;
use tracing::warn;

use crate::core::AggregateReport;
use crate::core::AggregateReportId;
use crate::core::AttributionConfig;
use crate::core::AttributionMode;
use crate::core::AttributionRow;
use crate::core::ConfigError;
use crate::core::DebugReportStatus;
use crate::core::DebugTag;
use crate::core::EventReport;
use crate::core::EventReportId;
use crate::core::EventTriggerSpec;
use crate::core::FilterMap;
use crate::core::ReportStatus;
use crate::core::Source;
use crate::core::SourceId;
use crate::core::SourceStatus;
use crate::core::Trigger;
use crate::core::TriggerId;
use crate::core::TriggerStatus;
use crate::interfaces::Datastore;
use crate::interfaces::DatastoreError;
use crate::interfaces::DatastoreTransaction;
use crate::interfaces::DebugReportScheduler;
use crate::interfaces::DerivedSourceCreator;
use crate::runtime::aggregate::extract_aggregate_dedup_key;
use crate::runtime::aggregate::generate_contributions;
use crate::runtime::aggregate::sum_contribution_values;
use crate::runtime::filter::first_matching_event_trigger;
use crate::runtime::filter::is_filter_match;
use crate::runtime::ratelimit::within_rate_limits;
use crate::runtime::selector::SourceSelection;
use crate::runtime::selector::select_source;

// ============================================================================
// SECTION: Pipeline Outcomes
// ============================================================================

/// Terminal outcome of one per-trigger pipeline run.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributionOutcome {
    /// A report path succeeded; the trigger was marked attributed.
    Attributed,
    /// Every gate or path dropped; the trigger was marked ignored.
    Ignored,
    /// The trigger was missing or already terminal; nothing changed.
    Noop,
}

/// Outcome of one report path for a selected source.
///
/// # Invariants
/// - `Dropped` carries the debug tag to schedule, when the drop has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOutcome {
    /// The path materialised its report.
    Attributed,
    /// The path dropped; the trigger may still attribute via the other path.
    Dropped(Option<DebugTag>),
}

impl PathOutcome {
    /// Reports whether the path materialised its report.
    #[must_use]
    pub const fn is_attributed(self) -> bool {
        matches!(self, Self::Attributed)
    }
}

/// Outcome of the event-report quota provisioning step.
enum Provision {
    /// Quota available, possibly after evicting a lower-priority report.
    Proceed,
    /// Quota exhausted; the event path drops with the tag.
    Dropped(DebugTag),
}

// ============================================================================
// SECTION: Attribution Engine
// ============================================================================

/// Attribution engine wiring a datastore, a derived-source creator, a
/// debug-report scheduler, and a seedable delay RNG.
pub struct AttributionEngine<D, X, G, R> {
    /// Transactional datastore implementation.
    datastore: D,
    /// Cross-network derived-source creator.
    creator: X,
    /// Debug-report scheduler for drop decisions.
    scheduler: G,
    /// RNG drawing the aggregate-report delay.
    rng: R,
    /// Immutable configuration surface.
    config: AttributionConfig,
}

impl<D, X, G, R> AttributionEngine<D, X, G, R>
where
    D: Datastore,
    X: DerivedSourceCreator,
    G: DebugReportScheduler,
    R: Rng,
{
    /// Creates a new engine over the provided collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the configuration fails validation.
    pub fn new(
        datastore: D,
        creator: X,
        scheduler: G,
        rng: R,
        config: AttributionConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            datastore,
            creator,
            scheduler,
            rng,
            config,
        })
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &AttributionConfig {
        &self.config
    }

    /// Returns the underlying datastore.
    #[must_use]
    pub const fn datastore(&self) -> &D {
        &self.datastore
    }

    /// Processes pending triggers up to the configured batch budget.
    ///
    /// Returns `true` iff the pending backlog fit inside the budget, meaning
    /// no further work remains. Datastore failures log and return `false` so
    /// the host retries the invocation; no partial transaction state is
    /// visible after a failure.
    pub fn process_pending_triggers(&mut self) -> bool {
        let pending = match self.datastore.pending_trigger_ids() {
            Ok(pending) => pending,
            Err(err) => {
                warn!(error = %err, "pending trigger fetch failed, retry needed");
                return false;
            }
        };

        let budget = self.config.max_attributions_per_invocation;
        for trigger_id in pending.iter().take(budget) {
            match self.attribute_trigger(trigger_id) {
                Ok(outcome) => {
                    debug!(trigger = %trigger_id, ?outcome, "trigger processed");
                }
                Err(err) => {
                    warn!(trigger = %trigger_id, error = %err, "attribution failed, retry needed");
                    return false;
                }
            }
        }

        pending.len() <= budget
    }

    /// Runs the attribution pipeline for one trigger inside its own write
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the transaction fails; the host treats
    /// the whole invocation as retriable.
    pub fn attribute_trigger(
        &mut self,
        trigger_id: &TriggerId,
    ) -> Result<AttributionOutcome, DatastoreError> {
        let Self {
            datastore,
            creator,
            scheduler,
            rng,
            config,
        } = self;
        let mut pipeline = Pipeline {
            config,
            creator,
            scheduler,
            rng,
        };
        datastore.transact(|tx| pipeline.run(tx, trigger_id))
    }
}

// ============================================================================
// SECTION: Per-Trigger Pipeline
// ============================================================================

/// Borrowed pipeline state for one transaction-scoped run.
struct Pipeline<'a, X, G, R> {
    /// Immutable configuration surface.
    config: &'a AttributionConfig,
    /// Cross-network derived-source creator.
    creator: &'a X,
    /// Debug-report scheduler for drop decisions.
    scheduler: &'a G,
    /// RNG drawing the aggregate-report delay.
    rng: &'a mut R,
}

impl<X, G, R> Pipeline<'_, X, G, R>
where
    X: DerivedSourceCreator,
    G: DebugReportScheduler,
    R: Rng,
{
    /// Runs the full pipeline for one trigger.
    fn run<T: DatastoreTransaction>(
        &mut self,
        tx: &mut T,
        trigger_id: &TriggerId,
    ) -> Result<AttributionOutcome, DatastoreError> {
        let Some(trigger) = tx.trigger(trigger_id)? else {
            debug!(trigger = %trigger_id, "trigger missing, skipping");
            return Ok(AttributionOutcome::Noop);
        };
        if trigger.status != TriggerStatus::Pending {
            return Ok(AttributionOutcome::Noop);
        }

        let selection = select_source(tx, &trigger, self.config, self.creator)?;
        let SourceSelection::Candidate {
            winner,
            others,
        } = selection
        else {
            self.scheduler.schedule(&trigger, DebugTag::NoMatchingSource);
            return self.ignore_trigger(tx, &trigger);
        };
        let mut source = *winner;

        let Some(source_data) = self.matched_filter_data(&source, &trigger) else {
            self.scheduler.schedule(&trigger, DebugTag::NoMatchingFilterData);
            return self.ignore_trigger(tx, &trigger);
        };

        if !within_rate_limits(tx, &source, &trigger, self.config, self.scheduler)? {
            return self.ignore_trigger(tx, &trigger);
        }

        let aggregate = self.aggregate_path(tx, &mut source, &source_data, &trigger)?;
        self.schedule_drop(&trigger, aggregate);
        let event = self.event_path(tx, &mut source, &source_data, &trigger)?;
        self.schedule_drop(&trigger, event);

        if aggregate.is_attributed() || event.is_attributed() {
            self.ignore_competing_sources(tx, &others, &trigger)?;
            tx.update_trigger_status(&[trigger.id.clone()], TriggerStatus::Attributed)?;
            tx.insert_attribution(&AttributionRow::for_pair(&source, &trigger))?;
            Ok(AttributionOutcome::Attributed)
        } else {
            self.ignore_trigger(tx, &trigger)
        }
    }

    /// Parses the source's filter data and applies the top-level filter gate.
    ///
    /// Returns the parsed data when both filter sets accept it; malformed
    /// JSON on either side counts as no match.
    fn matched_filter_data(&self, source: &Source, trigger: &Trigger) -> Option<FilterMap> {
        let source_data = source.parsed_filter_data().ok()?;
        let filters = trigger.parsed_filters().ok()?;
        let not_filters = trigger.parsed_not_filters().ok()?;
        let matched = is_filter_match(&source_data, &filters, true)
            && is_filter_match(&source_data, &not_filters, false);
        matched.then_some(source_data)
    }

    /// Schedules the debug tag carried by a path drop, if any.
    fn schedule_drop(&self, trigger: &Trigger, outcome: PathOutcome) {
        if let PathOutcome::Dropped(Some(tag)) = outcome {
            self.scheduler.schedule(trigger, tag);
        }
    }

    /// Marks the trigger ignored and commits the run as a rule drop.
    fn ignore_trigger<T: DatastoreTransaction>(
        &self,
        tx: &mut T,
        trigger: &Trigger,
    ) -> Result<AttributionOutcome, DatastoreError> {
        tx.update_trigger_status(&[trigger.id.clone()], TriggerStatus::Ignored)?;
        Ok(AttributionOutcome::Ignored)
    }

    // ------------------------------------------------------------------
    // Aggregate path
    // ------------------------------------------------------------------

    /// Runs the aggregate-report path for the selected source.
    fn aggregate_path<T: DatastoreTransaction>(
        &mut self,
        tx: &mut T,
        source: &mut Source,
        source_data: &FilterMap,
        trigger: &Trigger,
    ) -> Result<PathOutcome, DatastoreError> {
        if trigger.trigger_time > source.aggregatable_report_window {
            debug!(trigger = %trigger.id, "aggregatable report window passed");
            return Ok(PathOutcome::Dropped(None));
        }

        let count = tx.num_aggregate_reports_per_destination(
            &trigger.attribution_destination,
            trigger.destination_type,
        )?;
        if count >= self.config.max_aggregate_reports_per_destination {
            warn!(trigger = %trigger.id, count, "aggregate reports per destination exhausted");
            return Ok(PathOutcome::Dropped(None));
        }

        let dedup_key = extract_aggregate_dedup_key(source_data, trigger);
        if let Some(key) = dedup_key
            && source.aggregate_report_dedup_keys.contains(&key)
        {
            debug!(trigger = %trigger.id, "aggregate report deduplicated");
            return Ok(PathOutcome::Dropped(None));
        }

        let contributions = match generate_contributions(source, source_data, trigger) {
            Ok(contributions) => contributions,
            Err(err) => {
                warn!(trigger = %trigger.id, error = %err, "aggregate payload malformed");
                return Ok(PathOutcome::Dropped(None));
            }
        };
        if contributions.is_empty() {
            return Ok(PathOutcome::Dropped(None));
        }

        let budget = self.config.max_sum_of_aggregate_values_per_source;
        let Some(new_total) = sum_contribution_values(&contributions)
            .and_then(|sum| source.aggregate_contributions.checked_add(sum))
            .filter(|total| *total <= budget)
        else {
            warn!(trigger = %trigger.id, "aggregate contribution budget exceeded");
            return Ok(PathOutcome::Dropped(None));
        };

        let debug_permitted = source.debug_reporting && trigger.debug_reporting;
        let report = AggregateReport {
            id: AggregateReportId::new(format!("aggregate-{}", trigger.id)),
            source_id: source.id.clone(),
            trigger_id: trigger.id.clone(),
            source_registration_time: source.event_time.round_down_to_day(),
            scheduled_report_time: trigger.trigger_time.saturating_add_millis(self.random_delay()),
            attribution_destination: trigger.attribution_destination.clone(),
            destination_type: trigger.destination_type,
            enrollment_id: trigger.enrollment_id.clone(),
            contributions,
            dedup_key,
            source_debug_key: source.debug_key.filter(|_| debug_permitted),
            trigger_debug_key: trigger.debug_key.filter(|_| debug_permitted),
            api_version: self.config.api_version.clone(),
            status: ReportStatus::Pending,
            debug_report_status: if debug_permitted {
                DebugReportStatus::Pending
            } else {
                DebugReportStatus::None
            },
        };

        if let Some(key) = dedup_key {
            source.aggregate_report_dedup_keys.insert(key);
        }
        source.aggregate_contributions = new_total;
        if !source.is_derived() {
            tx.update_source_aggregate_contributions(source)?;
            tx.update_source_aggregate_report_dedup_keys(source)?;
        }
        tx.insert_aggregate_report(&report)?;
        Ok(PathOutcome::Attributed)
    }

    /// Draws the aggregate-report delay from the configured jitter interval.
    fn random_delay(&mut self) -> i64 {
        let span = self.config.aggregate_max_report_delay_millis
            - self.config.aggregate_min_report_delay_millis;
        self.config.aggregate_min_report_delay_millis + self.rng.gen_range(0..span)
    }

    // ------------------------------------------------------------------
    // Event path
    // ------------------------------------------------------------------

    /// Runs the event-report path for the selected source.
    fn event_path<T: DatastoreTransaction>(
        &mut self,
        tx: &mut T,
        source: &mut Source,
        source_data: &FilterMap,
        trigger: &Trigger,
    ) -> Result<PathOutcome, DatastoreError> {
        if source.is_derived() {
            return Ok(PathOutcome::Dropped(None));
        }
        if source.attribution_mode != AttributionMode::Truthfully {
            return Ok(PathOutcome::Dropped(None));
        }
        if trigger.trigger_time > source.event_report_window {
            return Ok(PathOutcome::Dropped(Some(DebugTag::EventReportWindowPassed)));
        }

        let Ok(specs) = trigger.parsed_event_triggers() else {
            return Ok(PathOutcome::Dropped(Some(
                DebugTag::EventNoMatchingConfigurations,
            )));
        };
        let Some(spec) = first_matching_event_trigger(source_data, &specs).cloned() else {
            return Ok(PathOutcome::Dropped(Some(
                DebugTag::EventNoMatchingConfigurations,
            )));
        };

        if let Some(key) = spec.deduplication_key
            && source.event_report_dedup_keys.contains(&key)
        {
            return Ok(PathOutcome::Dropped(Some(DebugTag::EventDeduplicated)));
        }

        let count = tx.num_event_reports_per_destination(
            &trigger.attribution_destination,
            trigger.destination_type,
        )?;
        if count >= self.config.max_event_reports_per_destination {
            warn!(trigger = %trigger.id, count, "event reports per destination exhausted");
            return Ok(PathOutcome::Dropped(None));
        }

        let destinations = tx.source_destinations(&source.id)?;
        source.app_destinations = destinations.app;
        source.web_destinations = destinations.web;

        let tentative = build_event_report(source, trigger, &spec);
        match self.provision_event_report_quota(tx, source, &tentative)? {
            Provision::Proceed => {}
            Provision::Dropped(tag) => return Ok(PathOutcome::Dropped(Some(tag))),
        }

        if let Some(key) = spec.deduplication_key {
            source.event_report_dedup_keys.insert(key);
        }
        tx.update_source_event_report_dedup_keys(source)?;
        tx.insert_event_report(&tentative)?;
        Ok(PathOutcome::Attributed)
    }

    /// Checks the per-source report quota, evicting a lower-priority report
    /// from the tentative report's delivery bucket when possible.
    fn provision_event_report_quota<T: DatastoreTransaction>(
        &self,
        tx: &mut T,
        source: &mut Source,
        tentative: &EventReport,
    ) -> Result<Provision, DatastoreError> {
        let existing = tx.source_event_reports(&source.id)?;
        if existing.len() < source.max_event_reports() {
            return Ok(Provision::Proceed);
        }

        let mut bucket: Vec<&EventReport> = existing
            .iter()
            .filter(|report| {
                report.status == ReportStatus::Pending
                    && report.report_time == tentative.report_time
            })
            .collect();
        if bucket.is_empty() {
            return Ok(Provision::Dropped(DebugTag::EventExcessiveReports));
        }

        bucket.sort_by_key(|report| {
            (report.trigger_priority, Reverse(report.trigger_time), report.id.clone())
        });
        let Some(candidate) = bucket.first() else {
            return Ok(Provision::Dropped(DebugTag::EventExcessiveReports));
        };
        if candidate.trigger_priority >= tentative.trigger_priority {
            return Ok(Provision::Dropped(DebugTag::EventLowPriority));
        }

        if let Some(key) = candidate.trigger_dedup_key {
            source.event_report_dedup_keys.remove(&key);
        }
        tx.delete_event_report(&candidate.id)?;
        Ok(Provision::Proceed)
    }

    // ------------------------------------------------------------------
    // Finalisation
    // ------------------------------------------------------------------

    /// Moves every losing candidate out of future attributions: originals
    /// flip to ignored, derivatives record an ignored-enrollment marker for
    /// their parent.
    fn ignore_competing_sources<T: DatastoreTransaction>(
        &self,
        tx: &mut T,
        others: &[Source],
        trigger: &Trigger,
    ) -> Result<(), DatastoreError> {
        let original_ids: Vec<SourceId> = others
            .iter()
            .filter(|source| !source.is_derived())
            .map(|source| source.id.clone())
            .collect();
        if !original_ids.is_empty() {
            tx.update_source_status(&original_ids, SourceStatus::Ignored)?;
        }
        for derived in others.iter().filter(|source| source.is_derived()) {
            if let Some(parent_id) = &derived.parent_id {
                tx.insert_ignored_enrollment_source(parent_id, &trigger.enrollment_id)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Report Construction
// ============================================================================

/// Builds the tentative event report for the matched spec.
fn build_event_report(source: &Source, trigger: &Trigger, spec: &EventTriggerSpec) -> EventReport {
    let mut destinations = source.destinations(trigger.destination_type).to_vec();
    if destinations.is_empty() {
        destinations.push(trigger.attribution_destination.clone());
    }
    EventReport {
        id: EventReportId::new(format!("event-{}", trigger.id)),
        source_id: source.id.clone(),
        trigger_id: trigger.id.clone(),
        trigger_data: spec.trigger_data,
        trigger_priority: spec.priority,
        trigger_time: trigger.trigger_time,
        report_time: source.event_report_window,
        trigger_dedup_key: spec.deduplication_key,
        attribution_destinations: destinations,
        destination_type: trigger.destination_type,
        status: ReportStatus::Pending,
    }
}
