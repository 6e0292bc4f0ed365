//! SQLite-backed order store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{
    CreateOrderRequest, Order, OrderError, OrderStatus, OrderStore, OrderUpdate, PaymentStatus,
};

/// SQLite-backed order store.
pub struct SqliteOrderStore {
    conn: Mutex<Connection>,
}

impl SqliteOrderStore {
    /// Create a new SQLite order store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, OrderError> {
        let conn = Connection::open(path).map_err(|e| OrderError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite order store (useful for testing).
    pub fn in_memory() -> Result<Self, OrderError> {
        let conn =
            Connection::open_in_memory().map_err(|e| OrderError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), OrderError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS orders (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                prompt TEXT NOT NULL,
                resolution INTEGER NOT NULL,
                duration_secs INTEGER NOT NULL,
                aspect_ratio TEXT NOT NULL,
                payment_status TEXT NOT NULL,
                status TEXT NOT NULL,
                payment_chain_id TEXT,
                payment_tx_hash TEXT,
                video_url TEXT,
                error TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                completed_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
            CREATE INDEX IF NOT EXISTS idx_orders_payment_status ON orders(payment_status);
            CREATE INDEX IF NOT EXISTS idx_orders_updated_at ON orders(updated_at);
            "#,
        )
        .map_err(|e| OrderError::Database(e.to_string()))?;

        // Migration: add processing_time_secs column if it doesn't exist
        let _ = conn.execute(
            "ALTER TABLE orders ADD COLUMN processing_time_secs INTEGER",
            [],
        );

        Ok(())
    }

    fn row_to_order(row: &rusqlite::Row) -> rusqlite::Result<Order> {
        let id: String = row.get(0)?;
        let email: String = row.get(1)?;
        let prompt: String = row.get(2)?;
        let resolution: u32 = row.get(3)?;
        let duration_secs: u32 = row.get(4)?;
        let aspect_ratio: String = row.get(5)?;
        let payment_status_str: String = row.get(6)?;
        let status_str: String = row.get(7)?;
        let payment_chain_id: Option<String> = row.get(8)?;
        let payment_tx_hash: Option<String> = row.get(9)?;
        let video_url: Option<String> = row.get(10)?;
        let error: Option<String> = row.get(11)?;
        let created_at_str: String = row.get(12)?;
        let updated_at_str: String = row.get(13)?;
        let completed_at_str: Option<String> = row.get(14)?;
        let processing_time_secs: Option<i64> = row.get(15)?;

        let payment_status =
            PaymentStatus::from_str(&payment_status_str).unwrap_or(PaymentStatus::None);
        let status = OrderStatus::from_str(&status_str).unwrap_or(OrderStatus::PendingGeneration);

        let created_at = parse_timestamp(&created_at_str);
        let updated_at = parse_timestamp(&updated_at_str);
        let completed_at = completed_at_str.as_deref().map(parse_timestamp);

        Ok(Order {
            id,
            email,
            prompt,
            resolution,
            duration_secs,
            aspect_ratio,
            payment_status,
            status,
            payment_chain_id,
            payment_tx_hash,
            video_url,
            error,
            created_at,
            updated_at,
            completed_at,
            processing_time_secs,
        })
    }
}

const ORDER_COLUMNS: &str = "id, email, prompt, resolution, duration_secs, aspect_ratio, payment_status, status, payment_chain_id, payment_tx_hash, video_url, error, created_at, updated_at, completed_at, processing_time_secs";

fn parse_timestamp(s: impl AsRef<str>) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s.as_ref())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

impl OrderStore for SqliteOrderStore {
    fn create(&self, request: CreateOrderRequest) -> Result<Order, OrderError> {
        let conn = self.conn.lock().unwrap();

        let now = Utc::now();

        let result = conn.execute(
            "INSERT INTO orders (id, email, prompt, resolution, duration_secs, aspect_ratio, payment_status, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                request.id,
                request.email,
                request.prompt,
                request.resolution,
                request.duration_secs,
                request.aspect_ratio,
                PaymentStatus::None.as_str(),
                OrderStatus::PendingGeneration.as_str(),
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(OrderError::AlreadyExists(request.id));
            }
            Err(e) => return Err(OrderError::Database(e.to_string())),
        }

        Ok(Order {
            id: request.id,
            email: request.email,
            prompt: request.prompt,
            resolution: request.resolution,
            duration_secs: request.duration_secs,
            aspect_ratio: request.aspect_ratio,
            payment_status: PaymentStatus::None,
            status: OrderStatus::PendingGeneration,
            payment_chain_id: None,
            payment_tx_hash: None,
            video_url: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            processing_time_secs: None,
        })
    }

    fn get(&self, id: &str) -> Result<Option<Order>, OrderError> {
        let conn = self.conn.lock().unwrap();

        let sql = format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS);
        let result = conn.query_row(&sql, params![id], Self::row_to_order);

        match result {
            Ok(order) => Ok(Some(order)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(OrderError::Database(e.to_string())),
        }
    }

    fn update(&self, id: &str, update: OrderUpdate) -> Result<Order, OrderError> {
        let conn = self.conn.lock().unwrap();

        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(payment_status) = update.payment_status {
            sets.push("payment_status = ?");
            values.push(Box::new(payment_status.as_str().to_string()));
        }
        if let Some(status) = update.status {
            sets.push("status = ?");
            values.push(Box::new(status.as_str().to_string()));
        }
        if let Some(chain_id) = update.payment_chain_id {
            sets.push("payment_chain_id = ?");
            values.push(Box::new(chain_id));
        }
        if let Some(tx_hash) = update.payment_tx_hash {
            sets.push("payment_tx_hash = ?");
            values.push(Box::new(tx_hash));
        }
        if let Some(video_url) = update.video_url {
            sets.push("video_url = ?");
            values.push(Box::new(video_url));
        }
        if let Some(error) = update.error {
            sets.push("error = ?");
            values.push(Box::new(error));
        }
        if let Some(completed_at) = update.completed_at {
            sets.push("completed_at = ?");
            values.push(Box::new(completed_at.to_rfc3339()));
        }
        if let Some(processing_time_secs) = update.processing_time_secs {
            sets.push("processing_time_secs = ?");
            values.push(Box::new(processing_time_secs));
        }

        sets.push("updated_at = ?");
        values.push(Box::new(Utc::now().to_rfc3339()));

        let sql = format!("UPDATE orders SET {} WHERE id = ?", sets.join(", "));
        values.push(Box::new(id.to_string()));

        let param_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();

        let changed = conn
            .execute(&sql, param_refs.as_slice())
            .map_err(|e| OrderError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(OrderError::NotFound(id.to_string()));
        }

        let sql = format!("SELECT {} FROM orders WHERE id = ?", ORDER_COLUMNS);
        conn.query_row(&sql, params![id], Self::row_to_order)
            .map_err(|e| OrderError::Database(e.to_string()))
    }

    fn count_by_status(&self, status: OrderStatus) -> Result<i64, OrderError> {
        let conn = self.conn.lock().unwrap();

        conn.query_row(
            "SELECT COUNT(*) FROM orders WHERE status = ?",
            params![status.as_str()],
            |row| row.get(0),
        )
        .map_err(|e| OrderError::Database(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_request(id: &str) -> CreateOrderRequest {
        CreateOrderRequest {
            id: id.to_string(),
            email: "customer@example.com".to_string(),
            prompt: "a red fox running through snow".to_string(),
            resolution: 720,
            duration_secs: 10,
            aspect_ratio: "16:9".to_string(),
        }
    }

    #[test]
    fn test_create_and_get() {
        let store = SqliteOrderStore::in_memory().unwrap();

        let created = store.create(make_request("order-1")).unwrap();
        assert_eq!(created.payment_status, PaymentStatus::None);
        assert_eq!(created.status, OrderStatus::PendingGeneration);

        let fetched = store.get("order-1").unwrap().unwrap();
        assert_eq!(fetched.id, "order-1");
        assert_eq!(fetched.prompt, "a red fox running through snow");
        assert_eq!(fetched.resolution, 720);
        assert!(fetched.video_url.is_none());
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = SqliteOrderStore::in_memory().unwrap();
        assert!(store.get("nope").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_create_rejected() {
        let store = SqliteOrderStore::in_memory().unwrap();
        store.create(make_request("order-1")).unwrap();

        let result = store.create(make_request("order-1"));
        assert!(matches!(result, Err(OrderError::AlreadyExists(_))));
    }

    #[test]
    fn test_partial_update() {
        let store = SqliteOrderStore::in_memory().unwrap();
        store.create(make_request("order-1")).unwrap();

        let updated = store
            .update(
                "order-1",
                OrderUpdate::new()
                    .with_payment_status(PaymentStatus::PaymentCompleted)
                    .with_status(OrderStatus::Queued),
            )
            .unwrap();

        assert_eq!(updated.payment_status, PaymentStatus::PaymentCompleted);
        assert_eq!(updated.status, OrderStatus::Queued);
        // Untouched fields survive
        assert_eq!(updated.email, "customer@example.com");
        assert!(updated.error.is_none());
    }

    #[test]
    fn test_update_stamps_updated_at() {
        let store = SqliteOrderStore::in_memory().unwrap();
        let created = store.create(make_request("order-1")).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(5));
        let updated = store
            .update(
                "order-1",
                OrderUpdate::new().with_status(OrderStatus::Processing),
            )
            .unwrap();

        assert!(updated.updated_at > created.updated_at);
    }

    #[test]
    fn test_update_missing_order() {
        let store = SqliteOrderStore::in_memory().unwrap();
        let result = store.update(
            "ghost",
            OrderUpdate::new().with_status(OrderStatus::Failed),
        );
        assert!(matches!(result, Err(OrderError::NotFound(_))));
    }

    #[test]
    fn test_completion_fields() {
        let store = SqliteOrderStore::in_memory().unwrap();
        store.create(make_request("order-1")).unwrap();

        let completed_at = Utc::now();
        let updated = store
            .update(
                "order-1",
                OrderUpdate {
                    status: Some(OrderStatus::Completed),
                    video_url: Some("https://cdn.example.com/video.mp4".to_string()),
                    completed_at: Some(completed_at),
                    processing_time_secs: Some(312),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.status, OrderStatus::Completed);
        assert_eq!(
            updated.video_url.as_deref(),
            Some("https://cdn.example.com/video.mp4")
        );
        assert_eq!(updated.processing_time_secs, Some(312));
        assert!(updated.completed_at.is_some());
    }

    #[test]
    fn test_count_by_status() {
        let store = SqliteOrderStore::in_memory().unwrap();
        store.create(make_request("order-1")).unwrap();
        store.create(make_request("order-2")).unwrap();
        store
            .update(
                "order-2",
                OrderUpdate::new().with_status(OrderStatus::Failed),
            )
            .unwrap();

        assert_eq!(
            store.count_by_status(OrderStatus::PendingGeneration).unwrap(),
            1
        );
        assert_eq!(store.count_by_status(OrderStatus::Failed).unwrap(), 1);
        assert_eq!(store.count_by_status(OrderStatus::Completed).unwrap(), 0);
    }

    #[test]
    fn test_on_disk_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.db");

        {
            let store = SqliteOrderStore::new(&path).unwrap();
            store.create(make_request("order-1")).unwrap();
        }

        // Reopen and verify persistence + idempotent schema init
        let store = SqliteOrderStore::new(&path).unwrap();
        assert!(store.get("order-1").unwrap().is_some());
    }
}
