//! sqlite-store — SQLite implementation of the StringStore port.
//!
//! Purpose
//! - Provide a persistent, file-based string key-value backend so stored
//!   values survive process restarts, like browser local storage does.
//! - Implements the `StringStore` trait from the `domain` crate.
//!
//! Notes
//! - Uses `rusqlite` with the `bundled` feature for portability.
//! - One table, one row per key; `set` is an upsert (last writer wins).

use std::path::Path;
use std::sync::Mutex;

use domain::{StoreError, StringStore};
use rusqlite::{params, Connection, OptionalExtension};

/// SQLite-backed string store for local persistence.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at the given path and ensure schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(map_sqerr)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Construct from env var `KV_DB_PATH` (defaults to `./data/typed-kv.db`).
    pub fn from_env() -> Result<Self, StoreError> {
        let path = std::env::var("KV_DB_PATH").unwrap_or_else(|_| "./data/typed-kv.db".to_string());
        // Ensure directory exists
        if let Some(dir) = Path::new(&path).parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        Self::new(path)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("mutex poisoned".into()))
    }
}

fn init_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS kv_entries (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )
    .map_err(map_sqerr)?;
    Ok(())
}

fn map_sqerr<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Backend(format!("sqlite error: {e}"))
}

impl StringStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT value FROM kv_entries WHERE key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(map_sqerr)
    }

    fn set(&self, key: &str, raw: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO kv_entries(key, value) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, raw],
        )
        .map_err(map_sqerr)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM kv_entries WHERE key = ?1", params![key])
            .map_err(map_sqerr)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::schema;
    use domain::{SchemaMap, TypedStore};
    use serde_json::json;

    fn temp_db() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("kv.db");
        (dir, path)
    }

    #[test]
    fn raw_roundtrip_and_upsert() {
        let (_dir, path) = temp_db();
        let store = SqliteStore::new(&path).expect("open");
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("two".to_string()));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn values_survive_reopen() {
        let (_dir, path) = temp_db();
        {
            let store = SqliteStore::new(&path).expect("open");
            store.set("count", "42").unwrap();
        }
        let store = SqliteStore::new(&path).expect("reopen");
        assert_eq!(store.get("count").unwrap(), Some("42".to_string()));
    }

    #[test]
    fn typed_store_over_sqlite() {
        let (_dir, path) = temp_db();
        let schemas = SchemaMap::new()
            .with(
                "user",
                schema::object()
                    .field("id", schema::string())
                    .field("name", schema::string()),
            )
            .with("count", schema::number());
        let store = TypedStore::new(SqliteStore::new(&path).expect("open"), schemas);

        store
            .set("user", &json!({"id": "1", "name": "Alice"}))
            .unwrap();
        assert_eq!(
            store.get("user").unwrap(),
            Some(json!({"id": "1", "name": "Alice"}))
        );
        assert!(store.set("count", &json!("not a number")).is_err());
        assert_eq!(store.get("count").unwrap(), None);
    }

    #[test]
    fn corrupted_row_reads_as_absent() {
        let (_dir, path) = temp_db();
        let backend = SqliteStore::new(&path).expect("open");
        backend.set("count", "{not json}").unwrap();
        let store = TypedStore::new(
            backend,
            SchemaMap::new().with("count", schema::number()),
        );
        assert_eq!(store.get("count").unwrap(), None);
    }
}
