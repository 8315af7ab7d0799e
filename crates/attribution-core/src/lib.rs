// crates/attribution-core/src/lib.rs
// ============================================================================
// Module: Attribution Core Library
// Description: Public API surface for the attribution engine core.
// Purpose: Expose core types, interfaces, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Attribution core provides deterministic conversion attribution for
//! privacy-preserving measurement: it selects at most one source per pending
//! trigger and materialises event and aggregate reports under window,
//! capacity, deduplication, rate-limit, and contribution-budget rules. It is
//! backend-agnostic and integrates through explicit interfaces rather than
//! embedding a storage engine.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use self::core::*;

pub use interfaces::Datastore;
pub use interfaces::DatastoreError;
pub use interfaces::DatastoreTransaction;
pub use interfaces::DebugReportScheduler;
pub use interfaces::DerivedSourceCreator;
pub use runtime::AttributionEngine;
pub use runtime::AttributionOutcome;
pub use runtime::CrossNetworkSourceCreator;
pub use runtime::InMemoryDatastore;
pub use runtime::LogDebugReportScheduler;
pub use runtime::PathOutcome;
pub use runtime::RecordingDebugReportScheduler;
pub use runtime::SourceSelection;
pub use runtime::select_source;
