// crates/attribution-core/src/core/trigger.rs
// ============================================================================
// Module: Attribution Triggers
// Description: The trigger (conversion) entity and its embedded specifications.
// Purpose: Model pending conversions and the untrusted JSON specs they carry.
// Dependencies: crate::core::{destination, filters, identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! A trigger records a conversion awaiting attribution. Beyond its scalar
//! fields it carries several registration-time JSON documents: top-level
//! filter sets, event-trigger specifications, the aggregatable trigger spec,
//! dedup-key predicates, and the optional cross-network attribution config.
//! Those documents stay raw on the entity and are parsed on demand; each
//! accessor maps malformed JSON to the branch the pipeline takes for it
//! (no match, no matching configuration, absent key, or disabled config).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::destination::DestinationType;
use crate::core::filters::FilterMap;
use crate::core::filters::MalformedField;
use crate::core::filters::parse_filter_set;
use crate::core::identifiers::DebugKey;
use crate::core::identifiers::DedupKey;
use crate::core::identifiers::EnrollmentId;
use crate::core::identifiers::RegistrantId;
use crate::core::identifiers::TriggerData;
use crate::core::identifiers::TriggerId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Trigger Status
// ============================================================================

/// Trigger lifecycle status.
///
/// # Invariants
/// - Exactly one terminal transition per trigger: `Attributed` or `Ignored`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerStatus {
    /// Awaiting attribution.
    Pending,
    /// Won attribution; reports were materialised.
    Attributed,
    /// Dropped by a rule gate or for lack of a matching source.
    Ignored,
}

// ============================================================================
// SECTION: Embedded Specifications
// ============================================================================

/// Event-trigger specification embedded in a trigger.
///
/// # Invariants
/// - Never mutated after registration; order within the trigger is
///   significant (first matching spec wins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTriggerSpec {
    /// Coarse trigger data copied into the event report.
    pub trigger_data: TriggerData,
    /// Priority competing against existing event reports.
    #[serde(default)]
    pub priority: i64,
    /// Optional dedup key preventing duplicate event reports.
    #[serde(default)]
    pub deduplication_key: Option<DedupKey>,
    /// Positive filter set evaluated against the source's filter data.
    #[serde(default)]
    pub filters: Vec<FilterMap>,
    /// Negative filter set evaluated against the source's filter data.
    #[serde(default)]
    pub not_filters: Vec<FilterMap>,
}

/// Aggregatable-trigger-data entry ORing a key piece into named source keys.
///
/// # Invariants
/// - `key_piece` is a `0x`-prefixed hex string of at most 128 bits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateTriggerData {
    /// Hex-encoded key piece ORed into matching source keys.
    pub key_piece: String,
    /// Source key names the piece applies to; all keys when absent.
    #[serde(default)]
    pub source_keys: Option<Vec<String>>,
    /// Positive filter set gating the entry.
    #[serde(default)]
    pub filters: Vec<FilterMap>,
    /// Negative filter set gating the entry.
    #[serde(default)]
    pub not_filters: Vec<FilterMap>,
}

impl AggregateTriggerData {
    /// Decodes the hex key piece, or `None` when it is malformed.
    #[must_use]
    pub fn key_piece_bits(&self) -> Option<u128> {
        parse_key_piece(&self.key_piece)
    }
}

/// Dedup-key predicate for aggregate reports.
///
/// # Invariants
/// - The first predicate whose filters match yields the dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateDedupKeySpec {
    /// Dedup key produced when the predicate matches.
    #[serde(default)]
    pub deduplication_key: Option<DedupKey>,
    /// Positive filter set gating the predicate.
    #[serde(default)]
    pub filters: Vec<FilterMap>,
    /// Negative filter set gating the predicate.
    #[serde(default)]
    pub not_filters: Vec<FilterMap>,
}

/// Cross-network attribution config entry naming a foreign enrollment.
///
/// # Invariants
/// - `source_network` identifies the enrollment whose sources may be derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionConfigEntry {
    /// Foreign enrollment whose sources participate in derivation.
    pub source_network: EnrollmentId,
    /// Optional priority override applied to derived sources.
    #[serde(default)]
    pub priority: Option<i64>,
}

/// Decodes a `0x`-prefixed hex key piece into its 128-bit value.
#[must_use]
pub fn parse_key_piece(piece: &str) -> Option<u128> {
    let digits = piece.strip_prefix("0x").or_else(|| piece.strip_prefix("0X"))?;
    if digits.is_empty() {
        return None;
    }
    u128::from_str_radix(digits, 16).ok()
}

// ============================================================================
// SECTION: Trigger Entity
// ============================================================================

/// Registered conversion awaiting attribution.
///
/// # Invariants
/// - Status transitions exactly once from `Pending` to a terminal state.
/// - Raw JSON fields are untrusted registration input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Trigger identifier.
    pub id: TriggerId,
    /// Destination URI where the conversion fired.
    pub attribution_destination: String,
    /// Surface type of the destination URI.
    pub destination_type: DestinationType,
    /// Reporting-party enrollment that registered the trigger.
    pub enrollment_id: EnrollmentId,
    /// Registrant recorded on the attribution row.
    pub registrant: RegistrantId,
    /// Conversion timestamp.
    pub trigger_time: Timestamp,
    /// Lifecycle status.
    pub status: TriggerStatus,
    /// Raw top-level positive filter-set JSON.
    pub filters: Option<String>,
    /// Raw top-level negative filter-set JSON.
    pub not_filters: Option<String>,
    /// Raw event-trigger specification JSON (ordered array).
    pub event_triggers: Option<String>,
    /// Raw aggregatable-trigger-data JSON (ordered array).
    pub aggregatable_trigger_data: Option<String>,
    /// Raw aggregatable-values JSON (name to value).
    pub aggregatable_values: Option<String>,
    /// Raw aggregate dedup-key predicate JSON (ordered array).
    pub aggregatable_dedup_keys: Option<String>,
    /// Raw cross-network attribution config JSON (ordered array).
    pub attribution_config: Option<String>,
    /// Debug key registered with the trigger.
    pub debug_key: Option<DebugKey>,
    /// Whether the registering party opted into debug reports.
    pub debug_reporting: bool,
}

impl Trigger {
    /// Parses the top-level positive filter sets; absent means unrestricted.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedField`] when the JSON does not decode; callers
    /// treat that as "no match".
    pub fn parsed_filters(&self) -> Result<Vec<FilterMap>, MalformedField> {
        parse_optional_filter_set(self.filters.as_deref(), "filters")
    }

    /// Parses the top-level negative filter sets; absent means unrestricted.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedField`] when the JSON does not decode; callers
    /// treat that as "no match".
    pub fn parsed_not_filters(&self) -> Result<Vec<FilterMap>, MalformedField> {
        parse_optional_filter_set(self.not_filters.as_deref(), "not_filters")
    }

    /// Parses the ordered event-trigger specifications; absent means none.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedField`] when the JSON does not decode; callers
    /// treat that as "no matching configurations".
    pub fn parsed_event_triggers(&self) -> Result<Vec<EventTriggerSpec>, MalformedField> {
        match self.event_triggers.as_deref() {
            Some(json) => {
                serde_json::from_str(json).map_err(|_| MalformedField::new("event_triggers"))
            }
            None => Ok(Vec::new()),
        }
    }

    /// Parses the ordered aggregatable-trigger-data entries; absent means none.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedField`] when the JSON does not decode; callers drop
    /// the aggregate path.
    pub fn parsed_aggregatable_trigger_data(
        &self,
    ) -> Result<Vec<AggregateTriggerData>, MalformedField> {
        match self.aggregatable_trigger_data.as_deref() {
            Some(json) => serde_json::from_str(json)
                .map_err(|_| MalformedField::new("aggregatable_trigger_data")),
            None => Ok(Vec::new()),
        }
    }

    /// Parses the aggregatable values; absent means none.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedField`] when the JSON does not decode; callers drop
    /// the aggregate path.
    pub fn parsed_aggregatable_values(&self) -> Result<BTreeMap<String, u32>, MalformedField> {
        match self.aggregatable_values.as_deref() {
            Some(json) => {
                serde_json::from_str(json).map_err(|_| MalformedField::new("aggregatable_values"))
            }
            None => Ok(BTreeMap::new()),
        }
    }

    /// Parses the ordered aggregate dedup-key predicates; absent means none.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedField`] when the JSON does not decode; callers
    /// treat the dedup key as absent.
    pub fn parsed_aggregatable_dedup_keys(
        &self,
    ) -> Result<Vec<AggregateDedupKeySpec>, MalformedField> {
        match self.aggregatable_dedup_keys.as_deref() {
            Some(json) => serde_json::from_str(json)
                .map_err(|_| MalformedField::new("aggregatable_dedup_keys")),
            None => Ok(Vec::new()),
        }
    }

    /// Parses the cross-network attribution config entries.
    ///
    /// Returns `None` when the config is absent or malformed; the selector
    /// then falls back to same-enrollment candidates only.
    #[must_use]
    pub fn attribution_config_entries(&self) -> Option<Vec<AttributionConfigEntry>> {
        let json = self.attribution_config.as_deref()?;
        serde_json::from_str(json).ok()
    }
}

/// Parses an optional filter-set field, defaulting to unrestricted.
fn parse_optional_filter_set(
    json: Option<&str>,
    field: &'static str,
) -> Result<Vec<FilterMap>, MalformedField> {
    match json {
        Some(json) => parse_filter_set(json, field),
        None => Ok(Vec::new()),
    }
}
