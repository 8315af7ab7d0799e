// crates/attribution-core/src/runtime/debug.rs
// ============================================================================
// Module: Debug-Report Scheduler Implementations
// Description: Log-based and recording schedulers for drop decisions.
// Purpose: Provide a production log scheduler and a test-observable scheduler.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! The engine schedules one debug report per drop decision through the
//! [`DebugReportScheduler`] interface. The log scheduler emits a structured
//! trace event and is the production default when no transport is wired in;
//! the recording scheduler captures `(trigger, tag)` pairs for tests and
//! local inspection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use tracing::debug;

use crate::core::DebugTag;
use crate::core::Trigger;
use crate::core::TriggerId;
use crate::interfaces::DebugReportScheduler;

// ============================================================================
// SECTION: Log Scheduler
// ============================================================================

/// Scheduler that records drop decisions as structured trace events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDebugReportScheduler;

impl LogDebugReportScheduler {
    /// Creates the log scheduler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DebugReportScheduler for LogDebugReportScheduler {
    fn schedule(&self, trigger: &Trigger, tag: DebugTag) {
        debug!(trigger = %trigger.id, tag = tag.as_str(), "debug report scheduled");
    }
}

// ============================================================================
// SECTION: Recording Scheduler
// ============================================================================

/// Scheduler that captures scheduled tags for tests and examples.
///
/// # Invariants
/// - Captured pairs preserve scheduling order.
#[derive(Debug, Clone, Default)]
pub struct RecordingDebugReportScheduler {
    /// Captured `(trigger, tag)` pairs protected by a mutex.
    scheduled: Arc<Mutex<Vec<(TriggerId, DebugTag)>>>,
}

impl RecordingDebugReportScheduler {
    /// Creates an empty recording scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the captured `(trigger, tag)` pairs in scheduling order.
    #[must_use]
    pub fn scheduled(&self) -> Vec<(TriggerId, DebugTag)> {
        self.scheduled.lock().map_or_else(|_| Vec::new(), |guard| guard.clone())
    }
}

impl DebugReportScheduler for RecordingDebugReportScheduler {
    fn schedule(&self, trigger: &Trigger, tag: DebugTag) {
        if let Ok(mut guard) = self.scheduled.lock() {
            guard.push((trigger.id.clone(), tag));
        }
    }
}
