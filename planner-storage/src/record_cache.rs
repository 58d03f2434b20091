//! The local record cache.
//!
//! Records are stored as JSON under composite keys of the form
//! `{APP_PREFIX}{collection}:{id}`. Writes overwrite silently and never
//! fail observably (errors are logged, not surfaced); corrupt entries are
//! treated as absent, not repaired. There is no eviction — entries
//! accumulate until an explicit `clear`.

use crate::error::StorageResult;
use planner_types::{Collection, RecordId, RecordPayload};
use rusqlite::{Connection, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{error, warn};

/// Fixed namespace prefix for every entry written by the planner.
pub const APP_PREFIX: &str = "family_planner_";

/// SQLite-backed key-value cache of individual records.
#[derive(Clone)]
pub struct RecordCache {
    conn: Arc<Mutex<Connection>>,
}

impl RecordCache {
    /// Opens or creates a cache at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory cache (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Stores a record under its composite key, overwriting silently.
    pub fn put(&self, record: &RecordPayload) {
        let key = record_key(record.collection(), record.id());
        if let Err(e) = self.put_serialized(&key, record) {
            error!("cache write failed for {key}: {e}");
        }
    }

    /// Loads a record. Missing and corrupt entries both return `None`;
    /// corruption is logged, not repaired.
    pub fn get(&self, collection: Collection, id: RecordId) -> Option<RecordPayload> {
        let key = record_key(collection, id);
        let raw = self.read_raw(&key)?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("corrupt cache entry at {key}, treating as absent: {e}");
                None
            }
        }
    }

    /// Removes a record entry. Missing keys are a no-op.
    pub fn remove(&self, collection: Collection, id: RecordId) {
        let key = record_key(collection, id);
        if let Err(e) = self.delete_raw(&key) {
            error!("cache delete failed for {key}: {e}");
        }
    }

    /// Linear scan over all entries of one collection, filtered by owning
    /// family and optional exact-match field filters, ordered by creation
    /// timestamp descending.
    pub fn query_by_family(
        &self,
        collection: Collection,
        family_id: RecordId,
        filters: &[(String, serde_json::Value)],
    ) -> Vec<RecordPayload> {
        let prefix = format!("{APP_PREFIX}{}:", collection.as_str());
        let pattern = format!("{}%", escape_like(&prefix));
        let rows = match self.scan_raw(&pattern) {
            Ok(rows) => rows,
            Err(e) => {
                error!("cache scan failed for {pattern}: {e}");
                return Vec::new();
            }
        };

        let mut records: Vec<RecordPayload> = Vec::new();
        for (key, raw) in rows {
            let record: RecordPayload = match serde_json::from_str(&raw) {
                Ok(record) => record,
                Err(e) => {
                    warn!("corrupt cache entry at {key}, skipping: {e}");
                    continue;
                }
            };
            if record.family_id() != family_id {
                continue;
            }
            if !matches_filters(&record, filters) {
                continue;
            }
            records.push(record);
        }

        records.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        records
    }

    /// Stores an arbitrary JSON-serializable value under a short key
    /// (queue snapshot, session snapshot, preferences). Never fails
    /// observably.
    pub fn put_value<T: Serialize>(&self, key: &str, value: &T) {
        let full = prefixed(key);
        if let Err(e) = self.put_serialized(&full, value) {
            error!("cache write failed for {full}: {e}");
        }
    }

    /// Loads a value stored with [`put_value`](Self::put_value). Corrupt
    /// entries return `None`.
    pub fn get_value<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let full = prefixed(key);
        let raw = self.read_raw(&full)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("corrupt cache entry at {full}, treating as absent: {e}");
                None
            }
        }
    }

    /// Removes a value stored with [`put_value`](Self::put_value).
    pub fn remove_value(&self, key: &str) {
        let full = prefixed(key);
        if let Err(e) = self.delete_raw(&full) {
            error!("cache delete failed for {full}: {e}");
        }
    }

    /// Returns the raw stored string for a short key, without parsing.
    /// Lets callers distinguish a corrupt entry from a missing one.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.read_raw(&prefixed(key))
    }

    /// Writes a raw string under a short key. Used by tests and migrations;
    /// normal writes go through [`put`](Self::put) / [`put_value`](Self::put_value).
    pub fn put_raw(&self, key: &str, raw: &str) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (cache_key, value) VALUES (?1, ?2)",
            params![prefixed(key), raw],
        )?;
        Ok(())
    }

    /// Removes every entry under the application prefix.
    pub fn clear(&self) {
        let conn = self.conn.lock().unwrap();
        let pattern = format!("{}%", escape_like(APP_PREFIX));
        if let Err(e) = conn.execute(
            "DELETE FROM cache_entries WHERE cache_key LIKE ?1 ESCAPE '\\'",
            params![pattern],
        ) {
            error!("cache clear failed: {e}");
        }
    }

    /// Number of entries under the application prefix.
    pub fn entry_count(&self) -> usize {
        let conn = self.conn.lock().unwrap();
        let pattern = format!("{}%", escape_like(APP_PREFIX));
        conn.query_row(
            "SELECT COUNT(*) FROM cache_entries WHERE cache_key LIKE ?1 ESCAPE '\\'",
            params![pattern],
            |row| row.get::<_, i64>(0),
        )
        .map(|n| n as usize)
        .unwrap_or(0)
    }

    fn put_serialized<T: Serialize>(&self, full_key: &str, value: &T) -> StorageResult<()> {
        let raw = serde_json::to_string(value)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO cache_entries (cache_key, value) VALUES (?1, ?2)",
            params![full_key, raw],
        )?;
        Ok(())
    }

    fn read_raw(&self, full_key: &str) -> Option<String> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT value FROM cache_entries WHERE cache_key = ?1",
            params![full_key],
            |row| row.get::<_, String>(0),
        ) {
            Ok(raw) => Some(raw),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => {
                error!("cache read failed for {full_key}: {e}");
                None
            }
        }
    }

    fn delete_raw(&self, full_key: &str) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM cache_entries WHERE cache_key = ?1",
            params![full_key],
        )?;
        Ok(())
    }

    fn scan_raw(&self, pattern: &str) -> StorageResult<Vec<(String, String)>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT cache_key, value FROM cache_entries WHERE cache_key LIKE ?1 ESCAPE '\\'",
        )?;
        let rows = stmt
            .query_map(params![pattern], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .filter_map(|r| r.ok())
            .collect();
        Ok(rows)
    }
}

fn prefixed(key: &str) -> String {
    format!("{APP_PREFIX}{key}")
}

/// Escapes `LIKE` wildcards so a key prefix matches literally.
fn escape_like(prefix: &str) -> String {
    prefix
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn record_key(collection: Collection, id: RecordId) -> String {
    format!("{APP_PREFIX}{}:{id}", collection.as_str())
}

/// Exact-match comparison of top-level record fields against filter values.
/// String filter values are coerced against numbers and booleans, matching
/// what a query-string layer would send.
fn matches_filters(record: &RecordPayload, filters: &[(String, serde_json::Value)]) -> bool {
    if filters.is_empty() {
        return true;
    }
    let Ok(value) = serde_json::to_value(record) else {
        return false;
    };
    filters.iter().all(|(field, expected)| {
        match value.get(field) {
            Some(actual) => filter_value_eq(actual, expected),
            None => false,
        }
    })
}

fn filter_value_eq(actual: &serde_json::Value, expected: &serde_json::Value) -> bool {
    use serde_json::Value;
    match (actual, expected) {
        (Value::String(a), Value::String(e)) => a == e,
        (Value::Number(a), Value::String(e)) => a.to_string() == *e,
        (Value::Bool(a), Value::String(e)) => a.to_string() == *e,
        _ => actual == expected,
    }
}

fn initialize_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS cache_entries (
            cache_key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}
