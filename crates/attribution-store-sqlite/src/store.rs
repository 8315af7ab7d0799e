// crates/attribution-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Attribution Datastore
// Description: Durable Datastore implementation backed by SQLite WAL.
// Purpose: Persist measurement entities and run the pipeline inside real transactions.
// Dependencies: attribution-core, rusqlite, serde_json, thiserror
// ============================================================================

//! ## Overview
//! This module implements the core's transactional [`Datastore`] contract on
//! `SQLite`. Scalar entity fields map to columns; registration JSON stays as
//! the raw text the core parses itself; dedup-key sets and histogram
//! contributions round-trip through `serde_json`. Opaque 64-bit values are
//! stored as decimal text so the full unsigned range survives the integer
//! column type. Candidate queries filter scalar predicates in SQL and apply
//! the core's shared destination predicate in memory, keeping match semantics
//! identical to the in-memory store. Database contents are untrusted; decode
//! failures surface as corruption errors and abort the transaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use attribution_core::AggregateHistogramContribution;
use attribution_core::AggregateReport;
use attribution_core::AggregateReportId;
use attribution_core::AttributionId;
use attribution_core::AttributionMode;
use attribution_core::AttributionRow;
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
use attribution_core::RateLimitScope;
use attribution_core::RegistrantId;
use attribution_core::ReportStatus;
use attribution_core::Source;
use attribution_core::SourceDestinations;
use attribution_core::SourceId;
use attribution_core::SourceStatus;
use attribution_core::SourceType;
use attribution_core::TimeRange;
use attribution_core::Timestamp;
use attribution_core::Trigger;
use attribution_core::TriggerData;
use attribution_core::TriggerId;
use attribution_core::TriggerStatus;
use attribution_core::destination::any_destination_matches;
use attribution_core::destination::same_destination;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::Row;
use rusqlite::ToSql;
use rusqlite::params;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
pub const SCHEMA_VERSION: i64 = 1;

/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Column list shared by source reads and writes.
const SOURCE_COLUMNS: &str = "id, event_id, publisher, publisher_type, enrollment_id, parent_id, \
     event_time, expiry_time, event_report_window, aggregatable_report_window, priority, \
     source_type, status, attribution_mode, install_attributed, install_cooldown_window, \
     filter_data, aggregation_keys, aggregate_contributions, event_report_dedup_keys, \
     aggregate_report_dedup_keys, debug_key, debug_reporting";

/// Column list shared by trigger reads and writes.
const TRIGGER_COLUMNS: &str = "id, attribution_destination, destination_type, enrollment_id, \
     registrant, trigger_time, status, filters, not_filters, event_triggers, \
     aggregatable_trigger_data, aggregatable_values, aggregatable_dedup_keys, \
     attribution_config, debug_key, debug_reporting";

/// Column list shared by event-report reads and writes.
const EVENT_REPORT_COLUMNS: &str = "id, source_id, trigger_id, trigger_data, trigger_priority, \
     trigger_time, report_time, trigger_dedup_key, attribution_destinations, destination_type, \
     status";

/// Column list shared by aggregate-report reads and writes.
const AGGREGATE_REPORT_COLUMNS: &str = "id, source_id, trigger_id, source_registration_time, \
     scheduled_report_time, attribution_destination, destination_type, enrollment_id, \
     contributions, dedup_key, source_debug_key, trigger_debug_key, api_version, status, \
     debug_report_status";

/// Column list shared by attribution reads and writes.
const ATTRIBUTION_COLUMNS: &str = "id, source_site, source_origin, destination_site, \
     destination_origin, enrollment_id, source_time, registrant, source_id, trigger_id";

/// Idempotent schema bootstrap.
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS sources (
    id                          TEXT PRIMARY KEY,
    event_id                    TEXT NOT NULL,
    publisher                   TEXT NOT NULL,
    publisher_type              TEXT NOT NULL,
    enrollment_id               TEXT NOT NULL,
    parent_id                   TEXT,
    event_time                  INTEGER NOT NULL,
    expiry_time                 INTEGER NOT NULL,
    event_report_window         INTEGER NOT NULL,
    aggregatable_report_window  INTEGER NOT NULL,
    priority                    INTEGER NOT NULL,
    source_type                 TEXT NOT NULL,
    status                      TEXT NOT NULL,
    attribution_mode            TEXT NOT NULL,
    install_attributed          INTEGER NOT NULL,
    install_cooldown_window     INTEGER NOT NULL,
    filter_data                 TEXT,
    aggregation_keys            TEXT,
    aggregate_contributions     INTEGER NOT NULL,
    event_report_dedup_keys     TEXT NOT NULL,
    aggregate_report_dedup_keys TEXT NOT NULL,
    debug_key                   TEXT,
    debug_reporting             INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS source_destinations (
    source_id        TEXT NOT NULL,
    destination_type TEXT NOT NULL,
    destination      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_source_destinations_source
    ON source_destinations (source_id);
CREATE TABLE IF NOT EXISTS triggers (
    id                        TEXT PRIMARY KEY,
    attribution_destination   TEXT NOT NULL,
    destination_type          TEXT NOT NULL,
    enrollment_id             TEXT NOT NULL,
    registrant                TEXT NOT NULL,
    trigger_time              INTEGER NOT NULL,
    status                    TEXT NOT NULL,
    filters                   TEXT,
    not_filters               TEXT,
    event_triggers            TEXT,
    aggregatable_trigger_data TEXT,
    aggregatable_values       TEXT,
    aggregatable_dedup_keys   TEXT,
    attribution_config        TEXT,
    debug_key                 TEXT,
    debug_reporting           INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_triggers_status ON triggers (status, id);
CREATE TABLE IF NOT EXISTS event_reports (
    id                       TEXT PRIMARY KEY,
    source_id                TEXT NOT NULL,
    trigger_id               TEXT NOT NULL,
    trigger_data             TEXT NOT NULL,
    trigger_priority         INTEGER NOT NULL,
    trigger_time             INTEGER NOT NULL,
    report_time              INTEGER NOT NULL,
    trigger_dedup_key        TEXT,
    attribution_destinations TEXT NOT NULL,
    destination_type         TEXT NOT NULL,
    status                   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_event_reports_source ON event_reports (source_id);
CREATE TABLE IF NOT EXISTS aggregate_reports (
    id                       TEXT PRIMARY KEY,
    source_id                TEXT NOT NULL,
    trigger_id               TEXT NOT NULL,
    source_registration_time INTEGER NOT NULL,
    scheduled_report_time    INTEGER NOT NULL,
    attribution_destination  TEXT NOT NULL,
    destination_type         TEXT NOT NULL,
    enrollment_id            TEXT NOT NULL,
    contributions            TEXT NOT NULL,
    dedup_key                TEXT,
    source_debug_key         TEXT,
    trigger_debug_key        TEXT,
    api_version              TEXT NOT NULL,
    status                   TEXT NOT NULL,
    debug_report_status      TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS attributions (
    id                 TEXT PRIMARY KEY,
    source_site        TEXT NOT NULL,
    source_origin      TEXT NOT NULL,
    destination_site   TEXT NOT NULL,
    destination_origin TEXT NOT NULL,
    enrollment_id      TEXT NOT NULL,
    source_time        INTEGER NOT NULL,
    registrant         TEXT NOT NULL,
    source_id          TEXT NOT NULL,
    trigger_id         TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_attributions_scope
    ON attributions (source_site, destination_site, enrollment_id);
CREATE TABLE IF NOT EXISTS ignored_enrollment_sources (
    source_id     TEXT NOT NULL,
    enrollment_id TEXT NOT NULL,
    PRIMARY KEY (source_id, enrollment_id)
);
";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` store configuration.
///
/// # Invariants
/// - `path` points at a database file; parent directories must exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteStoreConfig {
    /// Database file path.
    pub path: PathBuf,
    /// Busy timeout applied to the connection, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl SqliteStoreConfig {
    /// Creates a configuration for the database path with default options.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Errors raised while opening or preparing the `SQLite` store.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Database open failed.
    #[error("sqlite open failed: {0}")]
    Open(String),
    /// Schema bootstrap failed.
    #[error("sqlite schema setup failed: {0}")]
    Schema(String),
    /// Database file carries an incompatible schema version.
    #[error("sqlite store version mismatch (found {found}, expected {expected})")]
    VersionMismatch {
        /// Version found in the database file.
        found: i64,
        /// Version this build expects.
        expected: i64,
    },
}

/// Maps a `rusqlite` failure onto the core's datastore error kind.
fn store_err(err: rusqlite::Error) -> DatastoreError {
    DatastoreError::Store(err.to_string())
}

/// Builds a corruption error for an undecodable column value.
fn corrupt(what: &str) -> DatastoreError {
    DatastoreError::Corrupt(format!("undecodable {what}"))
}

// ============================================================================
// SECTION: SQLite Datastore
// ============================================================================

/// Durable datastore backed by one `SQLite` connection.
pub struct SqliteDatastore {
    /// Owned database connection.
    conn: Connection,
}

impl SqliteDatastore {
    /// Opens (and bootstraps) the database at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or the
    /// schema version is incompatible.
    pub fn open(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        let conn = Connection::open_with_flags(&config.path, flags)
            .map_err(|err| SqliteStoreError::Open(err.to_string()))?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .map_err(|err| SqliteStoreError::Open(err.to_string()))?;
        conn.query_row("PRAGMA journal_mode = WAL", [], |_row| Ok(()))
            .map_err(|err| SqliteStoreError::Open(err.to_string()))?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(|err| SqliteStoreError::Open(err.to_string()))?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn,
        })
    }

    /// Opens a private in-memory database for tests and examples.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|err| SqliteStoreError::Open(err.to_string()))?;
        Self::initialize(&conn)?;
        Ok(Self {
            conn,
        })
    }

    /// Bootstraps the schema and verifies the stored version.
    fn initialize(conn: &Connection) -> Result<(), SqliteStoreError> {
        let found: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(|err| SqliteStoreError::Schema(err.to_string()))?;
        if found != 0 && found != SCHEMA_VERSION {
            return Err(SqliteStoreError::VersionMismatch {
                found,
                expected: SCHEMA_VERSION,
            });
        }
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|err| SqliteStoreError::Schema(err.to_string()))?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .map_err(|err| SqliteStoreError::Schema(err.to_string()))?;
        Ok(())
    }

    /// Seeds a source together with its destination rows.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the write fails.
    pub fn insert_source(&self, source: &Source) -> Result<(), DatastoreError> {
        write_source(&self.conn, source)
    }

    /// Seeds a trigger.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the write fails.
    pub fn insert_trigger(&self, trigger: &Trigger) -> Result<(), DatastoreError> {
        write_trigger(&self.conn, trigger)
    }

    /// Seeds an event report.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the write fails.
    pub fn insert_event_report(&self, report: &EventReport) -> Result<(), DatastoreError> {
        write_event_report(&self.conn, report)
    }

    /// Seeds an attribution row.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the write fails.
    pub fn insert_attribution(&self, attribution: &AttributionRow) -> Result<(), DatastoreError> {
        write_attribution(&self.conn, attribution)
    }

    /// Returns the source with the identifier, if present.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the read fails.
    pub fn source(&self, id: &SourceId) -> Result<Option<Source>, DatastoreError> {
        read_source(&self.conn, id)
    }

    /// Returns the trigger with the identifier, if present.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the read fails.
    pub fn trigger(&self, id: &TriggerId) -> Result<Option<Trigger>, DatastoreError> {
        read_trigger(&self.conn, id)
    }

    /// Returns every event report in id order.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the read fails.
    pub fn event_reports(&self) -> Result<Vec<EventReport>, DatastoreError> {
        let sql = format!("SELECT {EVENT_REPORT_COLUMNS} FROM event_reports ORDER BY id");
        collect_rows(&self.conn, &sql, &[], event_report_from_row)
    }

    /// Returns every aggregate report in id order.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the read fails.
    pub fn aggregate_reports(&self) -> Result<Vec<AggregateReport>, DatastoreError> {
        let sql = format!("SELECT {AGGREGATE_REPORT_COLUMNS} FROM aggregate_reports ORDER BY id");
        collect_rows(&self.conn, &sql, &[], aggregate_report_from_row)
    }

    /// Returns every attribution row in id order.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the read fails.
    pub fn attributions(&self) -> Result<Vec<AttributionRow>, DatastoreError> {
        let sql = format!("SELECT {ATTRIBUTION_COLUMNS} FROM attributions ORDER BY id");
        collect_rows(&self.conn, &sql, &[], attribution_from_row)
    }

    /// Returns every ignored-enrollment marker in key order.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] when the read fails.
    pub fn ignored_enrollment_sources(
        &self,
    ) -> Result<Vec<(SourceId, EnrollmentId)>, DatastoreError> {
        collect_rows(
            &self.conn,
            "SELECT source_id, enrollment_id FROM ignored_enrollment_sources \
             ORDER BY source_id, enrollment_id",
            &[],
            |row| {
                let source_id: String = row.get(0).map_err(store_err)?;
                let enrollment_id: String = row.get(1).map_err(store_err)?;
                Ok((SourceId::new(source_id), EnrollmentId::new(enrollment_id)))
            },
        )
    }
}

impl Datastore for SqliteDatastore {
    type Tx<'a>
        = SqliteTransaction<'a>
    where
        Self: 'a;

    fn pending_trigger_ids(&mut self) -> Result<Vec<TriggerId>, DatastoreError> {
        collect_rows(
            &self.conn,
            "SELECT id FROM triggers WHERE status = 'pending' ORDER BY id",
            &[],
            |row| {
                let id: String = row.get(0).map_err(store_err)?;
                Ok(TriggerId::new(id))
            },
        )
    }

    fn transact<'s, T>(
        &'s mut self,
        work: impl FnOnce(&mut Self::Tx<'s>) -> Result<T, DatastoreError>,
    ) -> Result<T, DatastoreError> {
        let tx = self.conn.transaction().map_err(store_err)?;
        let mut scope = SqliteTransaction {
            tx,
        };
        match work(&mut scope) {
            Ok(value) => {
                let SqliteTransaction {
                    tx,
                } = scope;
                tx.commit().map_err(store_err)?;
                Ok(value)
            }
            Err(err) => {
                let SqliteTransaction {
                    tx,
                } = scope;
                drop(tx.rollback());
                Err(err)
            }
        }
    }
}

// ============================================================================
// SECTION: Transaction Scope
// ============================================================================

/// One write transaction over the `SQLite` datastore.
///
/// # Invariants
/// - Mutations become visible only at commit; rollback leaves no trace.
pub struct SqliteTransaction<'a> {
    /// Underlying `SQLite` transaction.
    tx: rusqlite::Transaction<'a>,
}

impl DatastoreTransaction for SqliteTransaction<'_> {
    fn trigger(&mut self, id: &TriggerId) -> Result<Option<Trigger>, DatastoreError> {
        read_trigger(&self.tx, id)
    }

    fn source(&mut self, id: &SourceId) -> Result<Option<Source>, DatastoreError> {
        read_source(&self.tx, id)
    }

    fn matching_active_sources(
        &mut self,
        trigger: &Trigger,
    ) -> Result<Vec<Source>, DatastoreError> {
        let sql = format!(
            "SELECT {SOURCE_COLUMNS} FROM sources \
             WHERE enrollment_id = ?1 AND status = 'active' \
               AND event_time <= ?2 AND expiry_time > ?2 \
             ORDER BY id"
        );
        let time = trigger.trigger_time.millis();
        let candidates = collect_rows(
            &self.tx,
            &sql,
            params![trigger.enrollment_id.as_str(), time],
            source_from_row,
        )?;
        attach_and_filter_destinations(&self.tx, candidates, trigger)
    }

    fn matching_sources_for_enrollments(
        &mut self,
        trigger: &Trigger,
        enrollments: &BTreeSet<EnrollmentId>,
    ) -> Result<Vec<Source>, DatastoreError> {
        if enrollments.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; enrollments.len()].join(", ");
        let sql = format!(
            "SELECT {SOURCE_COLUMNS} FROM sources \
             WHERE status = 'active' AND event_time <= ? AND expiry_time > ? \
               AND enrollment_id IN ({placeholders}) \
               AND NOT EXISTS (SELECT 1 FROM ignored_enrollment_sources i \
                               WHERE i.source_id = sources.id AND i.enrollment_id = ?) \
             ORDER BY id"
        );
        let time = trigger.trigger_time.millis();
        let own = trigger.enrollment_id.as_str();
        let enrollment_strs: Vec<&str> = enrollments.iter().map(EnrollmentId::as_str).collect();
        let mut values: Vec<&dyn ToSql> = vec![&time, &time];
        for enrollment in &enrollment_strs {
            values.push(enrollment);
        }
        values.push(&own);
        let candidates = collect_rows(&self.tx, &sql, &values, source_from_row)?;
        attach_and_filter_destinations(&self.tx, candidates, trigger)
    }

    fn num_event_reports_per_destination(
        &mut self,
        destination: &str,
        destination_type: DestinationType,
    ) -> Result<usize, DatastoreError> {
        let rows = collect_rows(
            &self.tx,
            "SELECT attribution_destinations FROM event_reports WHERE destination_type = ?1",
            params![destination_type_to_str(destination_type)],
            |row| {
                let json: String = row.get(0).map_err(store_err)?;
                decode_string_list(&json, "event report destinations")
            },
        )?;
        Ok(rows
            .iter()
            .filter(|destinations| {
                destinations
                    .iter()
                    .any(|registered| same_destination(registered, destination, destination_type))
            })
            .count())
    }

    fn num_aggregate_reports_per_destination(
        &mut self,
        destination: &str,
        destination_type: DestinationType,
    ) -> Result<usize, DatastoreError> {
        let rows = collect_rows(
            &self.tx,
            "SELECT attribution_destination FROM aggregate_reports WHERE destination_type = ?1",
            params![destination_type_to_str(destination_type)],
            |row| row.get::<_, String>(0).map_err(store_err),
        )?;
        Ok(rows
            .iter()
            .filter(|registered| same_destination(registered, destination, destination_type))
            .count())
    }

    fn source_event_reports(
        &mut self,
        source_id: &SourceId,
    ) -> Result<Vec<EventReport>, DatastoreError> {
        let sql = format!(
            "SELECT {EVENT_REPORT_COLUMNS} FROM event_reports WHERE source_id = ?1 ORDER BY id"
        );
        collect_rows(&self.tx, &sql, params![source_id.as_str()], event_report_from_row)
    }

    fn source_destinations(
        &mut self,
        source_id: &SourceId,
    ) -> Result<SourceDestinations, DatastoreError> {
        destinations_for(&self.tx, source_id)
    }

    fn attributions_in_window(
        &mut self,
        scope: &RateLimitScope,
        range: &TimeRange,
    ) -> Result<usize, DatastoreError> {
        let count: i64 = self
            .tx
            .query_row(
                "SELECT COUNT(*) FROM attributions \
                 WHERE source_site = ?1 AND destination_site = ?2 \
                   AND enrollment_id = ?3 AND registrant = ?4 \
                   AND source_time >= ?5 AND source_time < ?6",
                params![
                    scope.source_site,
                    scope.destination_site,
                    scope.enrollment_id.as_str(),
                    scope.registrant.as_str(),
                    range.start().millis(),
                    range.end().millis(),
                ],
                |row| row.get(0),
            )
            .map_err(store_err)?;
        usize::try_from(count).map_err(|_| corrupt("attribution count"))
    }

    fn distinct_enrollments_in_attribution(
        &mut self,
        publisher_site: &str,
        destination_site: &str,
        excluded_enrollment: &EnrollmentId,
        range: &TimeRange,
    ) -> Result<usize, DatastoreError> {
        let count: i64 = self
            .tx
            .query_row(
                "SELECT COUNT(DISTINCT enrollment_id) FROM attributions \
                 WHERE source_site = ?1 AND destination_site = ?2 \
                   AND enrollment_id <> ?3 \
                   AND source_time >= ?4 AND source_time < ?5",
                params![
                    publisher_site,
                    destination_site,
                    excluded_enrollment.as_str(),
                    range.start().millis(),
                    range.end().millis(),
                ],
                |row| row.get(0),
            )
            .map_err(store_err)?;
        usize::try_from(count).map_err(|_| corrupt("enrollment count"))
    }

    fn insert_event_report(&mut self, report: &EventReport) -> Result<(), DatastoreError> {
        write_event_report(&self.tx, report)
    }

    fn insert_aggregate_report(
        &mut self,
        report: &AggregateReport,
    ) -> Result<(), DatastoreError> {
        write_aggregate_report(&self.tx, report)
    }

    fn insert_attribution(&mut self, attribution: &AttributionRow) -> Result<(), DatastoreError> {
        write_attribution(&self.tx, attribution)
    }

    fn delete_event_report(&mut self, id: &EventReportId) -> Result<(), DatastoreError> {
        let deleted = self
            .tx
            .execute("DELETE FROM event_reports WHERE id = ?1", params![id.as_str()])
            .map_err(store_err)?;
        if deleted == 0 {
            return Err(DatastoreError::Invalid(format!("missing event report: {id}")));
        }
        Ok(())
    }

    fn update_source_status(
        &mut self,
        ids: &[SourceId],
        status: SourceStatus,
    ) -> Result<(), DatastoreError> {
        for id in ids {
            let updated = self
                .tx
                .execute(
                    "UPDATE sources SET status = ?1 WHERE id = ?2",
                    params![source_status_to_str(status), id.as_str()],
                )
                .map_err(store_err)?;
            if updated == 0 {
                return Err(DatastoreError::Invalid(format!("missing source: {id}")));
            }
        }
        Ok(())
    }

    fn insert_ignored_enrollment_source(
        &mut self,
        parent_id: &SourceId,
        enrollment_id: &EnrollmentId,
    ) -> Result<(), DatastoreError> {
        self.tx
            .execute(
                "INSERT OR IGNORE INTO ignored_enrollment_sources (source_id, enrollment_id) \
                 VALUES (?1, ?2)",
                params![parent_id.as_str(), enrollment_id.as_str()],
            )
            .map_err(store_err)?;
        Ok(())
    }

    fn update_source_event_report_dedup_keys(
        &mut self,
        source: &Source,
    ) -> Result<(), DatastoreError> {
        let keys = encode_dedup_keys(&source.event_report_dedup_keys)?;
        let updated = self
            .tx
            .execute(
                "UPDATE sources SET event_report_dedup_keys = ?1 WHERE id = ?2",
                params![keys, source.id.as_str()],
            )
            .map_err(store_err)?;
        if updated == 0 {
            return Err(DatastoreError::Invalid(format!("missing source: {}", source.id)));
        }
        Ok(())
    }

    fn update_source_aggregate_report_dedup_keys(
        &mut self,
        source: &Source,
    ) -> Result<(), DatastoreError> {
        let keys = encode_dedup_keys(&source.aggregate_report_dedup_keys)?;
        let updated = self
            .tx
            .execute(
                "UPDATE sources SET aggregate_report_dedup_keys = ?1 WHERE id = ?2",
                params![keys, source.id.as_str()],
            )
            .map_err(store_err)?;
        if updated == 0 {
            return Err(DatastoreError::Invalid(format!("missing source: {}", source.id)));
        }
        Ok(())
    }

    fn update_source_aggregate_contributions(
        &mut self,
        source: &Source,
    ) -> Result<(), DatastoreError> {
        let updated = self
            .tx
            .execute(
                "UPDATE sources SET aggregate_contributions = ?1 WHERE id = ?2",
                params![i64::from(source.aggregate_contributions), source.id.as_str()],
            )
            .map_err(store_err)?;
        if updated == 0 {
            return Err(DatastoreError::Invalid(format!("missing source: {}", source.id)));
        }
        Ok(())
    }

    fn update_trigger_status(
        &mut self,
        ids: &[TriggerId],
        status: TriggerStatus,
    ) -> Result<(), DatastoreError> {
        for id in ids {
            let updated = self
                .tx
                .execute(
                    "UPDATE triggers SET status = ?1 WHERE id = ?2",
                    params![trigger_status_to_str(status), id.as_str()],
                )
                .map_err(store_err)?;
            if updated == 0 {
                return Err(DatastoreError::Invalid(format!("missing trigger: {id}")));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Query Helpers
// ============================================================================

/// Runs a query and maps every row through the decoder.
fn collect_rows<T>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
    decode: impl Fn(&Row<'_>) -> Result<T, DatastoreError>,
) -> Result<Vec<T>, DatastoreError> {
    let mut stmt = conn.prepare(sql).map_err(store_err)?;
    let mut rows = stmt.query(params).map_err(store_err)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(store_err)? {
        out.push(decode(row)?);
    }
    Ok(out)
}

/// Loads destination lists for the candidates and keeps destination matches.
fn attach_and_filter_destinations(
    conn: &Connection,
    candidates: Vec<Source>,
    trigger: &Trigger,
) -> Result<Vec<Source>, DatastoreError> {
    let mut matching = Vec::new();
    for mut source in candidates {
        let destinations = destinations_for(conn, &source.id)?;
        source.app_destinations = destinations.app;
        source.web_destinations = destinations.web;
        if any_destination_matches(
            source.destinations(trigger.destination_type),
            &trigger.attribution_destination,
            trigger.destination_type,
        ) {
            matching.push(source);
        }
    }
    Ok(matching)
}

/// Reads the destination lists registered for a source.
fn destinations_for(
    conn: &Connection,
    source_id: &SourceId,
) -> Result<SourceDestinations, DatastoreError> {
    let rows = collect_rows(
        conn,
        "SELECT destination_type, destination FROM source_destinations \
         WHERE source_id = ?1 ORDER BY rowid",
        params![source_id.as_str()],
        |row| {
            let kind: String = row.get(0).map_err(store_err)?;
            let destination: String = row.get(1).map_err(store_err)?;
            Ok((destination_type_from_str(&kind)?, destination))
        },
    )?;
    let mut destinations = SourceDestinations::default();
    for (kind, destination) in rows {
        match kind {
            DestinationType::App => destinations.app.push(destination),
            DestinationType::Web => destinations.web.push(destination),
        }
    }
    Ok(destinations)
}

/// Reads a source (with destinations) by identifier.
fn read_source(conn: &Connection, id: &SourceId) -> Result<Option<Source>, DatastoreError> {
    let sql = format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE id = ?1");
    let mut sources = collect_rows(conn, &sql, params![id.as_str()], source_from_row)?;
    let Some(mut source) = sources.pop() else {
        return Ok(None);
    };
    let destinations = destinations_for(conn, id)?;
    source.app_destinations = destinations.app;
    source.web_destinations = destinations.web;
    Ok(Some(source))
}

/// Writes a source row and replaces its destination rows.
fn write_source(conn: &Connection, source: &Source) -> Result<(), DatastoreError> {
    let sql = format!(
        "INSERT OR REPLACE INTO sources ({SOURCE_COLUMNS}) VALUES \
         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, \
          ?19, ?20, ?21, ?22, ?23)"
    );
    conn.execute(
        &sql,
        params![
            source.id.as_str(),
            source.event_id.get().to_string(),
            source.publisher,
            destination_type_to_str(source.publisher_type),
            source.enrollment_id.as_str(),
            source.parent_id.as_ref().map(SourceId::as_str),
            source.event_time.millis(),
            source.expiry_time.millis(),
            source.event_report_window.millis(),
            source.aggregatable_report_window.millis(),
            source.priority,
            source_type_to_str(source.source_type),
            source_status_to_str(source.status),
            attribution_mode_to_str(source.attribution_mode),
            source.install_attributed,
            source.install_cooldown_window,
            source.filter_data,
            source.aggregation_keys,
            i64::from(source.aggregate_contributions),
            encode_dedup_keys(&source.event_report_dedup_keys)?,
            encode_dedup_keys(&source.aggregate_report_dedup_keys)?,
            source.debug_key.map(|key| key.get().to_string()),
            source.debug_reporting,
        ],
    )
    .map_err(store_err)?;
    conn.execute(
        "DELETE FROM source_destinations WHERE source_id = ?1",
        params![source.id.as_str()],
    )
    .map_err(store_err)?;
    for destination in &source.app_destinations {
        conn.execute(
            "INSERT INTO source_destinations (source_id, destination_type, destination) \
             VALUES (?1, 'app', ?2)",
            params![source.id.as_str(), destination],
        )
        .map_err(store_err)?;
    }
    for destination in &source.web_destinations {
        conn.execute(
            "INSERT INTO source_destinations (source_id, destination_type, destination) \
             VALUES (?1, 'web', ?2)",
            params![source.id.as_str(), destination],
        )
        .map_err(store_err)?;
    }
    Ok(())
}

/// Decodes a source row (without destinations).
fn source_from_row(row: &Row<'_>) -> Result<Source, DatastoreError> {
    let id: String = row.get(0).map_err(store_err)?;
    let event_id: String = row.get(1).map_err(store_err)?;
    let publisher: String = row.get(2).map_err(store_err)?;
    let publisher_type: String = row.get(3).map_err(store_err)?;
    let enrollment_id: String = row.get(4).map_err(store_err)?;
    let parent_id: Option<String> = row.get(5).map_err(store_err)?;
    let event_time: i64 = row.get(6).map_err(store_err)?;
    let expiry_time: i64 = row.get(7).map_err(store_err)?;
    let event_report_window: i64 = row.get(8).map_err(store_err)?;
    let aggregatable_report_window: i64 = row.get(9).map_err(store_err)?;
    let priority: i64 = row.get(10).map_err(store_err)?;
    let source_type: String = row.get(11).map_err(store_err)?;
    let status: String = row.get(12).map_err(store_err)?;
    let attribution_mode: String = row.get(13).map_err(store_err)?;
    let install_attributed: bool = row.get(14).map_err(store_err)?;
    let install_cooldown_window: i64 = row.get(15).map_err(store_err)?;
    let filter_data: Option<String> = row.get(16).map_err(store_err)?;
    let aggregation_keys: Option<String> = row.get(17).map_err(store_err)?;
    let aggregate_contributions: i64 = row.get(18).map_err(store_err)?;
    let event_report_dedup_keys: String = row.get(19).map_err(store_err)?;
    let aggregate_report_dedup_keys: String = row.get(20).map_err(store_err)?;
    let debug_key: Option<String> = row.get(21).map_err(store_err)?;
    let debug_reporting: bool = row.get(22).map_err(store_err)?;

    Ok(Source {
        id: SourceId::new(id),
        event_id: EventId::new(u64_from_text(&event_id, "source event_id")?),
        publisher,
        publisher_type: destination_type_from_str(&publisher_type)?,
        enrollment_id: EnrollmentId::new(enrollment_id),
        parent_id: parent_id.map(SourceId::new),
        event_time: Timestamp::from_millis(event_time),
        expiry_time: Timestamp::from_millis(expiry_time),
        event_report_window: Timestamp::from_millis(event_report_window),
        aggregatable_report_window: Timestamp::from_millis(aggregatable_report_window),
        priority,
        source_type: source_type_from_str(&source_type)?,
        status: source_status_from_str(&status)?,
        attribution_mode: attribution_mode_from_str(&attribution_mode)?,
        install_attributed,
        install_cooldown_window,
        filter_data,
        aggregation_keys,
        aggregate_contributions: u32::try_from(aggregate_contributions)
            .map_err(|_| corrupt("source aggregate_contributions"))?,
        event_report_dedup_keys: decode_dedup_keys(&event_report_dedup_keys)?,
        aggregate_report_dedup_keys: decode_dedup_keys(&aggregate_report_dedup_keys)?,
        app_destinations: Vec::new(),
        web_destinations: Vec::new(),
        debug_key: debug_key
            .map(|key| u64_from_text(&key, "source debug_key").map(DebugKey::new))
            .transpose()?,
        debug_reporting,
    })
}

/// Reads a trigger by identifier.
fn read_trigger(conn: &Connection, id: &TriggerId) -> Result<Option<Trigger>, DatastoreError> {
    let sql = format!("SELECT {TRIGGER_COLUMNS} FROM triggers WHERE id = ?1");
    let mut triggers = collect_rows(conn, &sql, params![id.as_str()], trigger_from_row)?;
    Ok(triggers.pop())
}

/// Writes a trigger row.
fn write_trigger(conn: &Connection, trigger: &Trigger) -> Result<(), DatastoreError> {
    let sql = format!(
        "INSERT OR REPLACE INTO triggers ({TRIGGER_COLUMNS}) VALUES \
         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
    );
    conn.execute(
        &sql,
        params![
            trigger.id.as_str(),
            trigger.attribution_destination,
            destination_type_to_str(trigger.destination_type),
            trigger.enrollment_id.as_str(),
            trigger.registrant.as_str(),
            trigger.trigger_time.millis(),
            trigger_status_to_str(trigger.status),
            trigger.filters,
            trigger.not_filters,
            trigger.event_triggers,
            trigger.aggregatable_trigger_data,
            trigger.aggregatable_values,
            trigger.aggregatable_dedup_keys,
            trigger.attribution_config,
            trigger.debug_key.map(|key| key.get().to_string()),
            trigger.debug_reporting,
        ],
    )
    .map_err(store_err)?;
    Ok(())
}

/// Decodes a trigger row.
fn trigger_from_row(row: &Row<'_>) -> Result<Trigger, DatastoreError> {
    let id: String = row.get(0).map_err(store_err)?;
    let attribution_destination: String = row.get(1).map_err(store_err)?;
    let destination_type: String = row.get(2).map_err(store_err)?;
    let enrollment_id: String = row.get(3).map_err(store_err)?;
    let registrant: String = row.get(4).map_err(store_err)?;
    let trigger_time: i64 = row.get(5).map_err(store_err)?;
    let status: String = row.get(6).map_err(store_err)?;
    let filters: Option<String> = row.get(7).map_err(store_err)?;
    let not_filters: Option<String> = row.get(8).map_err(store_err)?;
    let event_triggers: Option<String> = row.get(9).map_err(store_err)?;
    let aggregatable_trigger_data: Option<String> = row.get(10).map_err(store_err)?;
    let aggregatable_values: Option<String> = row.get(11).map_err(store_err)?;
    let aggregatable_dedup_keys: Option<String> = row.get(12).map_err(store_err)?;
    let attribution_config: Option<String> = row.get(13).map_err(store_err)?;
    let debug_key: Option<String> = row.get(14).map_err(store_err)?;
    let debug_reporting: bool = row.get(15).map_err(store_err)?;

    Ok(Trigger {
        id: TriggerId::new(id),
        attribution_destination,
        destination_type: destination_type_from_str(&destination_type)?,
        enrollment_id: EnrollmentId::new(enrollment_id),
        registrant: RegistrantId::new(registrant),
        trigger_time: Timestamp::from_millis(trigger_time),
        status: trigger_status_from_str(&status)?,
        filters,
        not_filters,
        event_triggers,
        aggregatable_trigger_data,
        aggregatable_values,
        aggregatable_dedup_keys,
        attribution_config,
        debug_key: debug_key
            .map(|key| u64_from_text(&key, "trigger debug_key").map(DebugKey::new))
            .transpose()?,
        debug_reporting,
    })
}

/// Writes an event report row.
fn write_event_report(conn: &Connection, report: &EventReport) -> Result<(), DatastoreError> {
    let sql = format!(
        "INSERT INTO event_reports ({EVENT_REPORT_COLUMNS}) VALUES \
         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
    );
    let destinations = serde_json::to_string(&report.attribution_destinations)
        .map_err(|err| DatastoreError::Invalid(err.to_string()))?;
    conn.execute(
        &sql,
        params![
            report.id.as_str(),
            report.source_id.as_str(),
            report.trigger_id.as_str(),
            report.trigger_data.get().to_string(),
            report.trigger_priority,
            report.trigger_time.millis(),
            report.report_time.millis(),
            report.trigger_dedup_key.map(|key| key.get().to_string()),
            destinations,
            destination_type_to_str(report.destination_type),
            report_status_to_str(report.status),
        ],
    )
    .map_err(store_err)?;
    Ok(())
}

/// Decodes an event report row.
fn event_report_from_row(row: &Row<'_>) -> Result<EventReport, DatastoreError> {
    let id: String = row.get(0).map_err(store_err)?;
    let source_id: String = row.get(1).map_err(store_err)?;
    let trigger_id: String = row.get(2).map_err(store_err)?;
    let trigger_data: String = row.get(3).map_err(store_err)?;
    let trigger_priority: i64 = row.get(4).map_err(store_err)?;
    let trigger_time: i64 = row.get(5).map_err(store_err)?;
    let report_time: i64 = row.get(6).map_err(store_err)?;
    let trigger_dedup_key: Option<String> = row.get(7).map_err(store_err)?;
    let attribution_destinations: String = row.get(8).map_err(store_err)?;
    let destination_type: String = row.get(9).map_err(store_err)?;
    let status: String = row.get(10).map_err(store_err)?;

    Ok(EventReport {
        id: EventReportId::new(id),
        source_id: SourceId::new(source_id),
        trigger_id: TriggerId::new(trigger_id),
        trigger_data: TriggerData::new(u64_from_text(&trigger_data, "report trigger_data")?),
        trigger_priority,
        trigger_time: Timestamp::from_millis(trigger_time),
        report_time: Timestamp::from_millis(report_time),
        trigger_dedup_key: trigger_dedup_key
            .map(|key| u64_from_text(&key, "report dedup key").map(DedupKey::new))
            .transpose()?,
        attribution_destinations: decode_string_list(
            &attribution_destinations,
            "event report destinations",
        )?,
        destination_type: destination_type_from_str(&destination_type)?,
        status: report_status_from_str(&status)?,
    })
}

/// Writes an aggregate report row.
fn write_aggregate_report(
    conn: &Connection,
    report: &AggregateReport,
) -> Result<(), DatastoreError> {
    let sql = format!(
        "INSERT INTO aggregate_reports ({AGGREGATE_REPORT_COLUMNS}) VALUES \
         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
    );
    let contributions = serde_json::to_string(&report.contributions)
        .map_err(|err| DatastoreError::Invalid(err.to_string()))?;
    conn.execute(
        &sql,
        params![
            report.id.as_str(),
            report.source_id.as_str(),
            report.trigger_id.as_str(),
            report.source_registration_time.millis(),
            report.scheduled_report_time.millis(),
            report.attribution_destination,
            destination_type_to_str(report.destination_type),
            report.enrollment_id.as_str(),
            contributions,
            report.dedup_key.map(|key| key.get().to_string()),
            report.source_debug_key.map(|key| key.get().to_string()),
            report.trigger_debug_key.map(|key| key.get().to_string()),
            report.api_version,
            report_status_to_str(report.status),
            debug_report_status_to_str(report.debug_report_status),
        ],
    )
    .map_err(store_err)?;
    Ok(())
}

/// Decodes an aggregate report row.
fn aggregate_report_from_row(row: &Row<'_>) -> Result<AggregateReport, DatastoreError> {
    let id: String = row.get(0).map_err(store_err)?;
    let source_id: String = row.get(1).map_err(store_err)?;
    let trigger_id: String = row.get(2).map_err(store_err)?;
    let source_registration_time: i64 = row.get(3).map_err(store_err)?;
    let scheduled_report_time: i64 = row.get(4).map_err(store_err)?;
    let attribution_destination: String = row.get(5).map_err(store_err)?;
    let destination_type: String = row.get(6).map_err(store_err)?;
    let enrollment_id: String = row.get(7).map_err(store_err)?;
    let contributions: String = row.get(8).map_err(store_err)?;
    let dedup_key: Option<String> = row.get(9).map_err(store_err)?;
    let source_debug_key: Option<String> = row.get(10).map_err(store_err)?;
    let trigger_debug_key: Option<String> = row.get(11).map_err(store_err)?;
    let api_version: String = row.get(12).map_err(store_err)?;
    let status: String = row.get(13).map_err(store_err)?;
    let debug_report_status: String = row.get(14).map_err(store_err)?;

    let contributions: Vec<AggregateHistogramContribution> =
        serde_json::from_str(&contributions).map_err(|_| corrupt("report contributions"))?;

    Ok(AggregateReport {
        id: AggregateReportId::new(id),
        source_id: SourceId::new(source_id),
        trigger_id: TriggerId::new(trigger_id),
        source_registration_time: Timestamp::from_millis(source_registration_time),
        scheduled_report_time: Timestamp::from_millis(scheduled_report_time),
        attribution_destination,
        destination_type: destination_type_from_str(&destination_type)?,
        enrollment_id: EnrollmentId::new(enrollment_id),
        contributions,
        dedup_key: dedup_key
            .map(|key| u64_from_text(&key, "report dedup key").map(DedupKey::new))
            .transpose()?,
        source_debug_key: source_debug_key
            .map(|key| u64_from_text(&key, "report debug key").map(DebugKey::new))
            .transpose()?,
        trigger_debug_key: trigger_debug_key
            .map(|key| u64_from_text(&key, "report debug key").map(DebugKey::new))
            .transpose()?,
        api_version,
        status: report_status_from_str(&status)?,
        debug_report_status: debug_report_status_from_str(&debug_report_status)?,
    })
}

/// Writes an attribution row.
fn write_attribution(conn: &Connection, attribution: &AttributionRow) -> Result<(), DatastoreError> {
    let sql = format!(
        "INSERT INTO attributions ({ATTRIBUTION_COLUMNS}) VALUES \
         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
    );
    conn.execute(
        &sql,
        params![
            attribution.id.as_str(),
            attribution.source_site,
            attribution.source_origin,
            attribution.destination_site,
            attribution.destination_origin,
            attribution.enrollment_id.as_str(),
            attribution.source_time.millis(),
            attribution.registrant.as_str(),
            attribution.source_id.as_str(),
            attribution.trigger_id.as_str(),
        ],
    )
    .map_err(store_err)?;
    Ok(())
}

/// Decodes an attribution row.
fn attribution_from_row(row: &Row<'_>) -> Result<AttributionRow, DatastoreError> {
    let id: String = row.get(0).map_err(store_err)?;
    let source_site: String = row.get(1).map_err(store_err)?;
    let source_origin: String = row.get(2).map_err(store_err)?;
    let destination_site: String = row.get(3).map_err(store_err)?;
    let destination_origin: String = row.get(4).map_err(store_err)?;
    let enrollment_id: String = row.get(5).map_err(store_err)?;
    let source_time: i64 = row.get(6).map_err(store_err)?;
    let registrant: String = row.get(7).map_err(store_err)?;
    let source_id: String = row.get(8).map_err(store_err)?;
    let trigger_id: String = row.get(9).map_err(store_err)?;

    Ok(AttributionRow {
        id: AttributionId::new(id),
        source_site,
        source_origin,
        destination_site,
        destination_origin,
        enrollment_id: EnrollmentId::new(enrollment_id),
        source_time: Timestamp::from_millis(source_time),
        registrant: RegistrantId::new(registrant),
        source_id: SourceId::new(source_id),
        trigger_id: TriggerId::new(trigger_id),
    })
}

// ============================================================================
// SECTION: Value Codecs
// ============================================================================

/// Parses a decimal text column into the full unsigned 64-bit range.
fn u64_from_text(text: &str, what: &str) -> Result<u64, DatastoreError> {
    text.parse().map_err(|_| corrupt(what))
}

/// Encodes a dedup-key set as a JSON array.
fn encode_dedup_keys(keys: &BTreeSet<DedupKey>) -> Result<String, DatastoreError> {
    serde_json::to_string(keys).map_err(|err| DatastoreError::Invalid(err.to_string()))
}

/// Decodes a dedup-key set from its JSON array column.
fn decode_dedup_keys(json: &str) -> Result<BTreeSet<DedupKey>, DatastoreError> {
    serde_json::from_str(json).map_err(|_| corrupt("dedup key set"))
}

/// Decodes a JSON string-array column.
fn decode_string_list(json: &str, what: &str) -> Result<Vec<String>, DatastoreError> {
    serde_json::from_str(json).map_err(|_| corrupt(what))
}

/// Encodes a destination type.
const fn destination_type_to_str(value: DestinationType) -> &'static str {
    match value {
        DestinationType::App => "app",
        DestinationType::Web => "web",
    }
}

/// Decodes a destination type.
fn destination_type_from_str(value: &str) -> Result<DestinationType, DatastoreError> {
    match value {
        "app" => Ok(DestinationType::App),
        "web" => Ok(DestinationType::Web),
        _ => Err(corrupt("destination type")),
    }
}

/// Encodes a source type.
const fn source_type_to_str(value: SourceType) -> &'static str {
    match value {
        SourceType::Event => "event",
        SourceType::Navigation => "navigation",
    }
}

/// Decodes a source type.
fn source_type_from_str(value: &str) -> Result<SourceType, DatastoreError> {
    match value {
        "event" => Ok(SourceType::Event),
        "navigation" => Ok(SourceType::Navigation),
        _ => Err(corrupt("source type")),
    }
}

/// Encodes a source status.
const fn source_status_to_str(value: SourceStatus) -> &'static str {
    match value {
        SourceStatus::Active => "active",
        SourceStatus::Ignored => "ignored",
        SourceStatus::MarkedToDelete => "marked_to_delete",
    }
}

/// Decodes a source status.
fn source_status_from_str(value: &str) -> Result<SourceStatus, DatastoreError> {
    match value {
        "active" => Ok(SourceStatus::Active),
        "ignored" => Ok(SourceStatus::Ignored),
        "marked_to_delete" => Ok(SourceStatus::MarkedToDelete),
        _ => Err(corrupt("source status")),
    }
}

/// Encodes an attribution mode.
const fn attribution_mode_to_str(value: AttributionMode) -> &'static str {
    match value {
        AttributionMode::Truthfully => "truthfully",
        AttributionMode::Never => "never",
        AttributionMode::Falsely => "falsely",
    }
}

/// Decodes an attribution mode.
fn attribution_mode_from_str(value: &str) -> Result<AttributionMode, DatastoreError> {
    match value {
        "truthfully" => Ok(AttributionMode::Truthfully),
        "never" => Ok(AttributionMode::Never),
        "falsely" => Ok(AttributionMode::Falsely),
        _ => Err(corrupt("attribution mode")),
    }
}

/// Encodes a trigger status.
const fn trigger_status_to_str(value: TriggerStatus) -> &'static str {
    match value {
        TriggerStatus::Pending => "pending",
        TriggerStatus::Attributed => "attributed",
        TriggerStatus::Ignored => "ignored",
    }
}

/// Decodes a trigger status.
fn trigger_status_from_str(value: &str) -> Result<TriggerStatus, DatastoreError> {
    match value {
        "pending" => Ok(TriggerStatus::Pending),
        "attributed" => Ok(TriggerStatus::Attributed),
        "ignored" => Ok(TriggerStatus::Ignored),
        _ => Err(corrupt("trigger status")),
    }
}

/// Encodes a report status.
const fn report_status_to_str(value: ReportStatus) -> &'static str {
    match value {
        ReportStatus::Pending => "pending",
        ReportStatus::Delivered => "delivered",
    }
}

/// Decodes a report status.
fn report_status_from_str(value: &str) -> Result<ReportStatus, DatastoreError> {
    match value {
        "pending" => Ok(ReportStatus::Pending),
        "delivered" => Ok(ReportStatus::Delivered),
        _ => Err(corrupt("report status")),
    }
}

/// Encodes a debug-report status.
const fn debug_report_status_to_str(value: DebugReportStatus) -> &'static str {
    match value {
        DebugReportStatus::Pending => "pending",
        DebugReportStatus::None => "none",
    }
}

/// Decodes a debug-report status.
fn debug_report_status_from_str(value: &str) -> Result<DebugReportStatus, DatastoreError> {
    match value {
        "pending" => Ok(DebugReportStatus::Pending),
        "none" => Ok(DebugReportStatus::None),
        _ => Err(corrupt("debug report status")),
    }
}
