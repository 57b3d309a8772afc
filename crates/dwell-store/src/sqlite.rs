//! SQLite-based store implementation

use chrono::{DateTime, Utc};
use dwell_api::SessionEntry;
use dwell_util::{ProgressKey, SessionId, SubsectionId, UserId, format_timestamp, parse_timestamp};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    AuditEvent, AuditEventType, HeartbeatSample, ProgressRecord, Store, StoreError, StoreResult,
};

const PROGRESS_COLUMNS: &str = "user_id, subsection_id, session_id, time_spent_seconds, \
     last_activity_at, session_start_at, completion_percentage, is_completed, is_viewed, \
     viewed_at, session_history, created_at, updated_at";

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path.
    ///
    /// `busy_timeout` bounds how long a write waits for another connection's lock.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
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
            .map_err(|_| StoreError::Busy("store lock poisoned".into()))
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- One row per (learner, subsection)
            CREATE TABLE IF NOT EXISTS progress (
                user_id INTEGER NOT NULL,
                subsection_id INTEGER NOT NULL,
                session_id TEXT,
                time_spent_seconds INTEGER NOT NULL DEFAULT 0,
                last_activity_at TEXT,
                session_start_at TEXT,
                completion_percentage REAL NOT NULL DEFAULT 0,
                is_completed INTEGER NOT NULL DEFAULT 0,
                is_viewed INTEGER NOT NULL DEFAULT 0,
                viewed_at TEXT,
                session_history TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (user_id, subsection_id)
            );

            -- Accepted heartbeats
            CREATE TABLE IF NOT EXISTS heartbeats (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                subsection_id INTEGER NOT NULL,
                at TEXT NOT NULL,
                interval_secs REAL
            );

            -- Verification-required markers
            CREATE TABLE IF NOT EXISTS verification (
                user_id INTEGER PRIMARY KEY,
                until TEXT NOT NULL
            );

            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_progress_open ON progress(user_id, session_start_at);
            CREATE INDEX IF NOT EXISTS idx_heartbeats_key ON heartbeats(user_id, subsection_id, id);
            CREATE INDEX IF NOT EXISTS idx_heartbeats_user_at ON heartbeats(user_id, at);
            CREATE INDEX IF NOT EXISTS idx_heartbeats_at ON heartbeats(at);
            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

fn upsert_progress(conn: &Connection, record: &ProgressRecord) -> StoreResult<()> {
    let history = serde_json::to_string(&record.session_history)?;

    conn.execute(
        &format!(
            r#"
            INSERT INTO progress ({PROGRESS_COLUMNS})
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(user_id, subsection_id) DO UPDATE SET
                session_id = excluded.session_id,
                time_spent_seconds = excluded.time_spent_seconds,
                last_activity_at = excluded.last_activity_at,
                session_start_at = excluded.session_start_at,
                completion_percentage = excluded.completion_percentage,
                is_completed = excluded.is_completed,
                is_viewed = excluded.is_viewed,
                viewed_at = excluded.viewed_at,
                session_history = excluded.session_history,
                updated_at = excluded.updated_at
            "#
        ),
        params![
            record.key.user_id.get(),
            record.key.subsection_id.get(),
            record.session_id.as_ref().map(|id| id.to_string()),
            record.time_spent_seconds as i64,
            record.last_activity_at.as_ref().map(format_timestamp),
            record.session_start_at.as_ref().map(format_timestamp),
            record.completion_percentage,
            record.is_completed,
            record.is_viewed,
            record.viewed_at.as_ref().map(format_timestamp),
            history,
            format_timestamp(&record.created_at),
            format_timestamp(&record.updated_at),
        ],
    )?;

    Ok(())
}

/// Columns of a `progress` row before timestamp and JSON decoding
struct ProgressRow {
    user_id: i64,
    subsection_id: i64,
    session_id: Option<String>,
    time_spent_seconds: i64,
    last_activity_at: Option<String>,
    session_start_at: Option<String>,
    completion_percentage: f64,
    is_completed: bool,
    is_viewed: bool,
    viewed_at: Option<String>,
    session_history: String,
    created_at: String,
    updated_at: String,
}

impl ProgressRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            subsection_id: row.get(1)?,
            session_id: row.get(2)?,
            time_spent_seconds: row.get(3)?,
            last_activity_at: row.get(4)?,
            session_start_at: row.get(5)?,
            completion_percentage: row.get(6)?,
            is_completed: row.get(7)?,
            is_viewed: row.get(8)?,
            viewed_at: row.get(9)?,
            session_history: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    fn into_record(self) -> StoreResult<ProgressRecord> {
        let session_history: Vec<SessionEntry> = serde_json::from_str(&self.session_history)?;
        let session_id = self
            .session_id
            .map(|s| Uuid::parse_str(&s).map(SessionId::from_uuid))
            .transpose()?;

        Ok(ProgressRecord {
            key: ProgressKey::new(UserId::new(self.user_id), SubsectionId::new(self.subsection_id)),
            session_id,
            time_spent_seconds: self.time_spent_seconds.max(0) as u64,
            last_activity_at: parse_optional(self.last_activity_at)?,
            session_start_at: parse_optional(self.session_start_at)?,
            completion_percentage: self.completion_percentage,
            is_completed: self.is_completed,
            is_viewed: self.is_viewed,
            viewed_at: parse_optional(self.viewed_at)?,
            session_history,
            created_at: parse_required(&self.created_at)?,
            updated_at: parse_required(&self.updated_at)?,
        })
    }
}

fn parse_required(s: &str) -> StoreResult<DateTime<Utc>> {
    parse_timestamp(s).ok_or_else(|| StoreError::Serialization(format!("bad timestamp: {s}")))
}

fn parse_optional(s: Option<String>) -> StoreResult<Option<DateTime<Utc>>> {
    s.as_deref().map(parse_required).transpose()
}

impl Store for SqliteStore {
    fn get_progress(&self, key: &ProgressKey) -> StoreResult<Option<ProgressRecord>> {
        let conn = self.conn()?;

        let row = conn
            .query_row(
                &format!(
                    "SELECT {PROGRESS_COLUMNS} FROM progress WHERE user_id = ? AND subsection_id = ?"
                ),
                params![key.user_id.get(), key.subsection_id.get()],
                ProgressRow::from_row,
            )
            .optional()?;

        row.map(ProgressRow::into_record).transpose()
    }

    fn save_progress(&self, record: &ProgressRecord) -> StoreResult<()> {
        let conn = self.conn()?;
        upsert_progress(&conn, record)?;
        debug!(key = %record.key, time_spent_secs = record.time_spent_seconds, "Progress saved");
        Ok(())
    }

    fn commit_heartbeat(
        &self,
        record: &ProgressRecord,
        sample: &HeartbeatSample,
    ) -> StoreResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        upsert_progress(&tx, record)?;
        tx.execute(
            "INSERT INTO heartbeats (user_id, subsection_id, at, interval_secs) VALUES (?, ?, ?, ?)",
            params![
                sample.key.user_id.get(),
                sample.key.subsection_id.get(),
                format_timestamp(&sample.at),
                sample.interval_secs,
            ],
        )?;

        tx.commit()?;

        debug!(
            key = %record.key,
            time_spent_secs = record.time_spent_seconds,
            interval_secs = ?sample.interval_secs,
            "Heartbeat committed"
        );
        Ok(())
    }

    fn count_open_sessions(
        &self,
        user_id: UserId,
        active_since: DateTime<Utc>,
    ) -> StoreResult<usize> {
        let conn = self.conn()?;

        let count: i64 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM progress
            WHERE user_id = ?
              AND session_start_at IS NOT NULL
              AND MAX(COALESCE(last_activity_at, session_start_at), session_start_at) >= ?
            "#,
            params![user_id.get(), format_timestamp(&active_since)],
            |row| row.get(0),
        )?;

        Ok(count as usize)
    }

    fn list_progress_for_user(&self, user_id: UserId) -> StoreResult<Vec<ProgressRecord>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {PROGRESS_COLUMNS} FROM progress WHERE user_id = ? ORDER BY subsection_id"
        ))?;
        let rows = stmt.query_map([user_id.get()], ProgressRow::from_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }

        Ok(records)
    }

    fn recent_intervals(&self, key: &ProgressKey, limit: usize) -> StoreResult<Vec<Option<f64>>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT interval_secs FROM heartbeats
            WHERE user_id = ? AND subsection_id = ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )?;
        let rows = stmt.query_map(
            params![key.user_id.get(), key.subsection_id.get(), limit as i64],
            |row| row.get::<_, Option<f64>>(0),
        )?;

        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn user_intervals_since(&self, user_id: UserId, since: DateTime<Utc>) -> StoreResult<Vec<f64>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT interval_secs FROM heartbeats
            WHERE user_id = ? AND at >= ? AND interval_secs IS NOT NULL
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![user_id.get(), format_timestamp(&since)], |row| {
            row.get::<_, f64>(0)
        })?;

        Ok(rows.collect::<Result<_, _>>()?)
    }

    fn prune_heartbeats(&self, before: DateTime<Utc>) -> StoreResult<usize> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM heartbeats WHERE at < ?",
            [format_timestamp(&before)],
        )?;

        debug!(removed, before = %before, "Heartbeat log pruned");
        Ok(removed)
    }

    fn get_verification_until(&self, user_id: UserId) -> StoreResult<Option<DateTime<Utc>>> {
        let conn = self.conn()?;

        let until: Option<String> = conn
            .query_row(
                "SELECT until FROM verification WHERE user_id = ?",
                [user_id.get()],
                |row| row.get(0),
            )
            .optional()?;

        parse_optional(until)
    }

    fn set_verification_until(&self, user_id: UserId, until: DateTime<Utc>) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute(
            r#"
            INSERT INTO verification (user_id, until)
            VALUES (?, ?)
            ON CONFLICT(user_id)
            DO UPDATE SET until = excluded.until
            "#,
            params![user_id.get(), format_timestamp(&until)],
        )?;

        debug!(user_id = %user_id, until = %until, "Verification marker set");
        Ok(())
    }

    fn clear_verification(&self, user_id: UserId) -> StoreResult<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM verification WHERE user_id = ?", [user_id.get()])?;
        Ok(())
    }

    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.conn()?;
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![format_timestamp(&event.timestamp), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let timestamp = parse_required(&timestamp_str)?;
            let event: AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
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
