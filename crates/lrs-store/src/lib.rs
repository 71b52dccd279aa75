//! Storage layer for the learning record store.
//!
//! Persists stored events in an embedded SQLite database via `rusqlite` and
//! exposes the multi-tenant query surface the service layer is built on.
//!
//! # Thread Safety
//!
//! [`EventStore`] wraps a `rusqlite::Connection`, which is `Send` but not
//! `Sync`. Each request is expected to run on its own thread/task; for shared
//! access, serialize behind a `Mutex` or open one store per thread.
//! Durability and uniqueness are delegated to SQLite — this layer implements
//! no locking, transactions across requests, or retries.
//!
//! # Schema
//!
//! Partition keys (tenant, organization, class, user) and the event id and
//! timestamp are extracted into indexed columns; the full event rides along
//! as a JSON payload column. Timestamps are stored as RFC 3339 text with
//! millisecond precision and a `Z` suffix so lexicographic ordering matches
//! chronological ordering.

use std::path::Path;

use lrs_core::{Error, Event, StoredEvent, TimeRange, format_event_time};
use rusqlite::{Connection, Row, params, params_from_iter};
use uuid::Uuid;

mod service;

pub use service::EventService;

/// Role labels recognized as "student" when filtering class statistics.
///
/// Matched by set membership against the event's membership roles, never by
/// substring.
pub const STUDENT_ROLES: [&str; 3] = [
    "http://purl.imsglobal.org/vocab/lis/v2/membership#Learner",
    "student",
    "Student",
];

const SELECT_COLUMNS: &str =
    "storage_id, tenant_id, organization_id, class_id, user_id, event_id, event";

/// Event store backed by SQLite.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct EventStore {
    conn: Connection,
}

impl EventStore {
    /// Opens a store at the given path, creating it if necessary.
    ///
    /// The schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, Error> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Opens an in-memory store.
    ///
    /// Useful for testing. The data is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init()?;
        Ok(store)
    }

    /// Initializes the schema. Idempotent.
    fn init(&self) -> Result<(), Error> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS events (
                storage_id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                organization_id TEXT NOT NULL,
                class_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                event_id TEXT NOT NULL,
                event_time TEXT NOT NULL,
                event TEXT NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_events_tenant_org_event
                ON events(tenant_id, organization_id, event_id);
            CREATE INDEX IF NOT EXISTS idx_events_class_user
                ON events(tenant_id, organization_id, class_id, user_id);
            CREATE INDEX IF NOT EXISTS idx_events_user_time
                ON events(tenant_id, organization_id, user_id, event_time);
            ",
        )?;
        Ok(())
    }

    /// Persists a stored event and returns the inner event's id.
    ///
    /// The storage-level surrogate id is assigned here and is distinct from
    /// the event id. Fails with [`Error::Persistence`] when the per-tenant
    /// uniqueness of the event id is violated or the store is unusable.
    pub fn save(&mut self, record: &StoredEvent) -> Result<String, Error> {
        let event = &record.event;
        if !event.has_id() {
            return Err(Error::IllegalArgument("event id"));
        }
        let Some(event_time) = event.event_time else {
            return Err(Error::IllegalArgument("eventTime"));
        };

        let storage_id = Uuid::new_v4().to_string();
        let payload = serde_json::to_string(event).map_err(|err| Error::Payload {
            event_id: event.id.clone(),
            message: err.to_string(),
        })?;
        self.conn.execute(
            "
            INSERT INTO events
            (storage_id, tenant_id, organization_id, class_id, user_id, event_id, event_time, event)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                storage_id,
                record.tenant_id,
                record.organization_id,
                record.class_id,
                record.user_id,
                event.id,
                format_event_time(event_time),
                payload,
            ],
        )?;
        tracing::debug!(
            event_id = %event.id,
            tenant_id = %record.tenant_id,
            organization_id = %record.organization_id,
            "stored event"
        );
        Ok(event.id.clone())
    }

    /// Point lookup by (tenant, organization, event id). Absence is not an
    /// error.
    pub fn find_by_id(
        &self,
        tenant_id: &str,
        organization_id: &str,
        event_id: &str,
    ) -> Result<Option<StoredEvent>, Error> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM events
             WHERE tenant_id = ? AND organization_id = ? AND event_id = ?"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query_map(params![tenant_id, organization_id, event_id], row_to_raw)?;
        match rows.next() {
            Some(row) => Ok(Some(into_record(row?)?)),
            None => Ok(None),
        }
    }

    /// All events for an organization, ordered by time. Empty when nothing
    /// matches.
    pub fn find_all(
        &self,
        tenant_id: &str,
        organization_id: &str,
    ) -> Result<Vec<StoredEvent>, Error> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM events
             WHERE tenant_id = ? AND organization_id = ?
             ORDER BY event_time ASC, event_id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![tenant_id, organization_id], row_to_raw)?;
        collect_records(rows)
    }

    /// Events for a class and user. The user id comparison is
    /// case-insensitive; the class id is matched exactly.
    pub fn find_by_class_and_user(
        &self,
        tenant_id: &str,
        organization_id: &str,
        class_id: &str,
        user_id: &str,
    ) -> Result<Vec<StoredEvent>, Error> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM events
             WHERE tenant_id = ? AND organization_id = ? AND class_id = ?
               AND user_id = ? COLLATE NOCASE
             ORDER BY event_time ASC, event_id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![tenant_id, organization_id, class_id, user_id],
            row_to_raw,
        )?;
        collect_records(rows)
    }

    /// Events for a class. With `students_only`, keeps only records whose
    /// membership role set intersects [`STUDENT_ROLES`].
    pub fn find_by_class(
        &self,
        tenant_id: &str,
        organization_id: &str,
        class_id: &str,
        students_only: bool,
    ) -> Result<Vec<StoredEvent>, Error> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM events
             WHERE tenant_id = ? AND organization_id = ? AND class_id = ?
             ORDER BY event_time ASC, event_id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![tenant_id, organization_id, class_id], row_to_raw)?;
        let mut records = collect_records(rows)?;
        if students_only {
            records.retain(|record| has_student_role(&record.event));
        }
        Ok(records)
    }

    /// Time-bounded events for a user. Bounds are strict; see
    /// [`TimeRange`]. Zero matches is a caller-visible [`Error::NotFound`] —
    /// unlike the other lookups, which return empty collections.
    pub fn find_by_user_in_range(
        &self,
        tenant_id: &str,
        organization_id: &str,
        user_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<StoredEvent>, Error> {
        let mut sql = format!(
            "SELECT {SELECT_COLUMNS} FROM events
             WHERE tenant_id = ? AND organization_id = ? AND user_id = ?"
        );
        let mut bind: Vec<String> = vec![
            tenant_id.to_string(),
            organization_id.to_string(),
            user_id.to_string(),
        ];
        if let Some(after) = range.after {
            sql.push_str(" AND event_time > ?");
            bind.push(format_event_time(after));
        }
        if let Some(before) = range.before {
            sql.push_str(" AND event_time < ?");
            bind.push(format_event_time(before));
        }
        sql.push_str(" ORDER BY event_time ASC, event_id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind.iter()), row_to_raw)?;
        let records = collect_records(rows)?;
        if records.is_empty() {
            return Err(Error::NotFound("Events not found.".to_string()));
        }
        Ok(records)
    }

    /// Removes every stored event. Intended for tests and tooling.
    pub fn delete_all(&mut self) -> Result<usize, Error> {
        let deleted = self.conn.execute("DELETE FROM events", [])?;
        tracing::debug!(deleted, "cleared event store");
        Ok(deleted)
    }
}

/// Raw row shape before the JSON payload is deserialized.
struct EventRow {
    storage_id: String,
    tenant_id: String,
    organization_id: String,
    class_id: String,
    user_id: String,
    event_id: String,
    payload: String,
}

fn row_to_raw(row: &Row) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        storage_id: row.get(0)?,
        tenant_id: row.get(1)?,
        organization_id: row.get(2)?,
        class_id: row.get(3)?,
        user_id: row.get(4)?,
        event_id: row.get(5)?,
        payload: row.get(6)?,
    })
}

fn into_record(row: EventRow) -> Result<StoredEvent, Error> {
    let event: Event = serde_json::from_str(&row.payload).map_err(|err| Error::Payload {
        event_id: row.event_id,
        message: err.to_string(),
    })?;
    Ok(StoredEvent {
        storage_id: Some(row.storage_id),
        tenant_id: row.tenant_id,
        organization_id: row.organization_id,
        class_id: row.class_id,
        user_id: row.user_id,
        event,
    })
}

fn collect_records<I>(rows: I) -> Result<Vec<StoredEvent>, Error>
where
    I: Iterator<Item = rusqlite::Result<EventRow>>,
{
    let mut records = Vec::new();
    for row in rows {
        records.push(into_record(row?)?);
    }
    Ok(records)
}

fn has_student_role(event: &Event) -> bool {
    event.membership.as_ref().is_some_and(|membership| {
        membership
            .roles
            .iter()
            .any(|role| STUDENT_ROLES.contains(&role.as_str()))
    })
}
