//! SQLite-backed error sink.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{ErrorContext, ErrorRecord, ErrorSink};

/// SQLite-backed error sink. Write failures are logged and swallowed.
pub struct SqliteErrorSink {
    conn: Mutex<Connection>,
}

impl SqliteErrorSink {
    /// Open (or create) the error log at the given path.
    pub fn new(path: &Path) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory error sink (useful for testing).
    pub fn in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS error_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                component TEXT NOT NULL,
                order_id TEXT,
                message TEXT NOT NULL,
                details TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_error_log_component ON error_log(component);
            CREATE INDEX IF NOT EXISTS idx_error_log_order_id ON error_log(order_id);
            "#,
        )
    }

    /// Read back recent records, newest first. Mostly for tests and
    /// operator inspection.
    pub fn recent(&self, limit: i64) -> Result<Vec<ErrorRecord>, rusqlite::Error> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, component, order_id, message, details, created_at FROM error_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map(params![limit], |row| {
            let details_json: Option<String> = row.get(4)?;
            let created_at_str: String = row.get(5)?;
            Ok(ErrorRecord {
                id: row.get(0)?,
                component: row.get(1)?,
                order_id: row.get(2)?,
                message: row.get(3)?,
                details: details_json.and_then(|json| serde_json::from_str(&json).ok()),
                created_at: DateTime::parse_from_rfc3339(&created_at_str)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            })
        })?;

        rows.collect()
    }
}

impl ErrorSink for SqliteErrorSink {
    fn record(&self, message: &str, context: ErrorContext) {
        let details_json = context
            .details
            .as_ref()
            .and_then(|d| serde_json::to_string(d).ok());

        let conn = self.conn.lock().unwrap();
        let result = conn.execute(
            "INSERT INTO error_log (component, order_id, message, details, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                context.component,
                context.order_id,
                message,
                details_json,
                Utc::now().to_rfc3339(),
            ],
        );

        if let Err(e) = result {
            tracing::error!(
                component = %context.component,
                order_id = ?context.order_id,
                "failed to persist error record ({}): {}",
                e,
                message
            );
        }
    }
}
