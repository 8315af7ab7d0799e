// crates/attribution-core/src/core/config.rs
// ============================================================================
// Module: Attribution Configuration
// Description: Closed configuration surface injected into the engine.
// Purpose: Carry every tunable gate limit as an immutable, validated value.
// Dependencies: crate::core::time, serde, thiserror
// ============================================================================

//! ## Overview
//! The engine never consults a global configuration source; the full option
//! surface is a value handed to it at construction and re-read at the start
//! of each invocation by the host. Defaults match the production limits.
//! `validate` rejects configurations that would make a gate unsatisfiable or
//! the delay jitter empty.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::time::MILLIS_PER_DAY;
use crate::core::time::MILLIS_PER_HOUR;
use crate::core::time::MILLIS_PER_MINUTE;

// ============================================================================
// SECTION: Config Errors
// ============================================================================

/// Configuration validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Batch budget must admit at least one trigger per invocation.
    #[error("max_attributions_per_invocation must be at least 1")]
    EmptyBatchBudget,
    /// The aggregate delay interval must be non-empty and non-negative.
    #[error("aggregate report delay interval is empty or negative")]
    EmptyDelayInterval,
    /// The rate-limit window must be positive.
    #[error("rate_limit_window_millis must be positive")]
    NonPositiveRateLimitWindow,
}

// ============================================================================
// SECTION: Attribution Config
// ============================================================================

/// Closed configuration surface for the attribution engine.
///
/// # Invariants
/// - Treated as immutable for the duration of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributionConfig {
    /// Maximum pending triggers processed per invocation.
    pub max_attributions_per_invocation: usize,
    /// Maximum aggregate reports targeted at one destination.
    pub max_aggregate_reports_per_destination: usize,
    /// Maximum event reports targeted at one destination.
    pub max_event_reports_per_destination: usize,
    /// Attribution quota within one rate-limit window.
    pub max_attributions_per_rate_limit_window: usize,
    /// Distinct-enrollment bound per publisher-destination pair.
    pub max_distinct_reporting_origins: usize,
    /// Sliding rate-limit window length in milliseconds.
    pub rate_limit_window_millis: i64,
    /// Minimum aggregate report delay in milliseconds.
    pub aggregate_min_report_delay_millis: i64,
    /// Exclusive upper bound of the aggregate report delay in milliseconds.
    pub aggregate_max_report_delay_millis: i64,
    /// Per-source budget for the sum of aggregate contribution values.
    pub max_sum_of_aggregate_values_per_source: u32,
    /// Master switch for cross-network derived sources.
    pub cross_network_enabled: bool,
    /// API version stamped into produced aggregate reports.
    pub api_version: String,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            max_attributions_per_invocation: 100,
            max_aggregate_reports_per_destination: 1024,
            max_event_reports_per_destination: 1024,
            max_attributions_per_rate_limit_window: 100,
            max_distinct_reporting_origins: 10,
            rate_limit_window_millis: 30 * MILLIS_PER_DAY,
            aggregate_min_report_delay_millis: 10 * MILLIS_PER_MINUTE,
            aggregate_max_report_delay_millis: MILLIS_PER_HOUR,
            max_sum_of_aggregate_values_per_source: 65_536,
            cross_network_enabled: false,
            api_version: "0.1".to_string(),
        }
    }
}

impl AttributionConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a limit would make a gate unsatisfiable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attributions_per_invocation == 0 {
            return Err(ConfigError::EmptyBatchBudget);
        }
        if self.aggregate_min_report_delay_millis < 0
            || self.aggregate_max_report_delay_millis <= self.aggregate_min_report_delay_millis
        {
            return Err(ConfigError::EmptyDelayInterval);
        }
        if self.rate_limit_window_millis <= 0 {
            return Err(ConfigError::NonPositiveRateLimitWindow);
        }
        Ok(())
    }
}
