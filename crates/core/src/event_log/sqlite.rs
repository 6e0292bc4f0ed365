//! SQLite-backed processed-event log.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use super::{EventLog, EventLogError, EventRecord};

/// SQLite-backed event log. The idempotency key is the primary key, so
/// `INSERT OR IGNORE` + `changes()` gives an atomic insert-if-absent.
pub struct SqliteEventLog {
    conn: Mutex<Connection>,
}

impl SqliteEventLog {
    /// Open (or create) the event log at the given path.
    pub fn new(path: &Path) -> Result<Self, EventLogError> {
        let conn = Connection::open(path).map_err(|e| EventLogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory event log (useful for testing).
    pub fn in_memory() -> Result<Self, EventLogError> {
        let conn =
            Connection::open_in_memory().map_err(|e| EventLogError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), EventLogError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS processed_events (
                idempotency_key TEXT PRIMARY KEY,
                event_type TEXT NOT NULL,
                payment_id TEXT NOT NULL,
                received_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_processed_events_payment_id
                ON processed_events(payment_id);
            "#,
        )
        .map_err(|e| EventLogError::Database(e.to_string()))?;

        Ok(())
    }
}

impl EventLog for SqliteEventLog {
    fn insert_if_absent(
        &self,
        idempotency_key: &str,
        record: &EventRecord,
    ) -> Result<bool, EventLogError> {
        let conn = self.conn.lock().unwrap();

        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO processed_events (idempotency_key, event_type, payment_id, received_at) VALUES (?, ?, ?, ?)",
                params![
                    idempotency_key,
                    record.event_type,
                    record.payment_id,
                    record.received_at.to_rfc3339(),
                ],
            )
            .map_err(|e| EventLogError::Database(e.to_string()))?;

        Ok(inserted > 0)
    }

    fn contains(&self, idempotency_key: &str) -> Result<bool, EventLogError> {
        let conn = self.conn.lock().unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM processed_events WHERE idempotency_key = ?",
                params![idempotency_key],
                |row| row.get(0),
            )
            .map_err(|e| EventLogError::Database(e.to_string()))?;

        Ok(count > 0)
    }
}
