//! SQLite-based store implementation

use chrono::{DateTime, Local, TimeZone};
use fieldtrack_api::DomainEvent;
use fieldtrack_util::SessionId;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{EventStore, SessionSnapshot, SessionSummary, StoreError, StoreResult};

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".into()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Domain event log (append-only)
            CREATE TABLE IF NOT EXISTS events (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                event_id TEXT NOT NULL UNIQUE,
                timestamp_ms INTEGER NOT NULL,
                kind TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            -- Latest state per session
            CREATE TABLE IF NOT EXISTS snapshots (
                session_id TEXT PRIMARY KEY,
                snapshot_json TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_events_session_time
                ON events(session_id, timestamp_ms, seq);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

fn local_from_millis(ms: i64) -> StoreResult<DateTime<Local>> {
    Local
        .timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| StoreError::Serialization(format!("invalid timestamp {}", ms)))
}

impl EventStore for SqliteStore {
    fn append_event(&self, session_id: &SessionId, event: &DomainEvent) -> StoreResult<()> {
        let conn = self.conn()?;
        let event_json = serde_json::to_string(event)?;

        conn.execute(
            "INSERT INTO events (session_id, event_id, timestamp_ms, kind, event_json) VALUES (?, ?, ?, ?, ?)",
            params![
                session_id.as_str(),
                event.id.to_string(),
                event.timestamp.timestamp_millis(),
                event.kind.as_str(),
                event_json
            ],
        )?;

        debug!(
            session_id = %session_id,
            event_id = %event.id,
            kind = %event.kind,
            seq = conn.last_insert_rowid(),
            "Event appended"
        );

        Ok(())
    }

    fn load_events(&self, session_id: &SessionId) -> StoreResult<Vec<DomainEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT event_json FROM events WHERE session_id = ? ORDER BY timestamp_ms ASC, seq ASC",
        )?;

        let rows = stmt.query_map([session_id.as_str()], |row| row.get::<_, String>(0))?;

        let mut events = Vec::new();
        for row in rows {
            let event: DomainEvent = serde_json::from_str(&row?)?;
            events.push(event);
        }

        Ok(events)
    }

    fn list_sessions(&self) -> StoreResult<Vec<SessionSummary>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT session_id, MIN(timestamp_ms), MAX(timestamp_ms), COUNT(*)
            FROM events
            GROUP BY session_id
            ORDER BY MIN(timestamp_ms) ASC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let session_id: String = row.get(0)?;
            let first_ms: i64 = row.get(1)?;
            let last_ms: i64 = row.get(2)?;
            let count: i64 = row.get(3)?;
            Ok((session_id, first_ms, last_ms, count))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (session_id, first_ms, last_ms, count) = row?;
            sessions.push(SessionSummary {
                session_id: SessionId::new(session_id),
                first_event_at: local_from_millis(first_ms)?,
                last_event_at: local_from_millis(last_ms)?,
                event_count: count.max(0) as usize,
            });
        }

        Ok(sessions)
    }

    fn load_snapshot(&self, session_id: &SessionId) -> StoreResult<Option<SessionSnapshot>> {
        let conn = self.conn()?;

        let json: Option<String> = conn
            .query_row(
                "SELECT snapshot_json FROM snapshots WHERE session_id = ?",
                [session_id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        match json {
            Some(s) => {
                let snapshot: SessionSnapshot = serde_json::from_str(&s)?;
                Ok(Some(snapshot))
            }
            None => Ok(None),
        }
    }

    fn save_snapshot(&self, snapshot: &SessionSnapshot) -> StoreResult<()> {
        let conn = self.conn()?;
        let json = serde_json::to_string(snapshot)?;

        conn.execute(
            r#"
            INSERT INTO snapshots (session_id, snapshot_json)
            VALUES (?, ?)
            ON CONFLICT(session_id)
            DO UPDATE SET snapshot_json = excluded.snapshot_json
            "#,
            params![snapshot.session_id.as_str(), json],
        )?;

        debug!(session_id = %snapshot.session_id, state = %snapshot.state, "Snapshot saved");
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}
