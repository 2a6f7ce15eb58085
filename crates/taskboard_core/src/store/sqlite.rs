//! SQLite-backed durable key-value store.
//!
//! # Responsibility
//! - Persist board keys in the migrated `kv_entries` table.
//! - Detect writes made through other connections to the same file.
//!
//! # Invariants
//! - Every write stamps the entry with a fresh value from `kv_sequence`, so
//!   versions are unique across keys and never reused after a delete.
//! - `observed` holds the last version this instance wrote or read per key.

use super::{KeyValueStore, StorageEvent, StoreError, StoreResult};
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{open_db, open_db_in_memory};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{HashMap, HashSet};
use std::path::Path;

const KV_TABLE: &str = "kv_entries";
const SEQUENCE_TABLE: &str = "kv_sequence";

/// Durable `KeyValueStore` over one SQLite connection.
///
/// Two instances opened on the same database file behave like two browser
/// tabs sharing local storage: each sees the other's writes via
/// `poll_changes`.
pub struct SqliteKeyValueStore {
    conn: Connection,
    observed: HashMap<String, i64>,
}

impl SqliteKeyValueStore {
    /// Wraps an already migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` for a foreign schema.
    pub fn try_new(conn: Connection) -> StoreResult<Self> {
        ensure_kv_connection_ready(&conn)?;
        let observed = load_versions(&conn)?;
        Ok(Self { conn, observed })
    }

    /// Opens (creating if needed) a database file and wraps it.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&mut self, key: &str) -> StoreResult<Option<String>> {
        let row = self
            .conn
            .query_row(
                "SELECT value, version FROM kv_entries WHERE key = ?1;",
                [key],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()?;

        match row {
            Some((value, version)) => {
                self.observed.insert(key.to_string(), version);
                Ok(Some(value))
            }
            None => {
                self.observed.remove(key);
                Ok(None)
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        let version: i64 = tx.query_row(
            "UPDATE kv_sequence SET value = value + 1 WHERE id = 1 RETURNING value;",
            [],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO kv_entries (key, value, version, updated_at)
             VALUES (?1, ?2, ?3, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                version = excluded.version,
                updated_at = excluded.updated_at;",
            params![key, value, version],
        )?;
        tx.commit()?;

        self.observed.insert(key.to_string(), version);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        self.observed.remove(key);
        Ok(())
    }

    fn poll_changes(&mut self) -> StoreResult<Vec<StorageEvent>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value, version FROM kv_entries ORDER BY key ASC;")?;
        let mut rows = stmt.query([])?;

        let mut events = Vec::new();
        let mut present = HashSet::new();
        while let Some(row) = rows.next()? {
            let key: String = row.get(0)?;
            let version: i64 = row.get(2)?;
            present.insert(key.clone());
            if self.observed.get(&key) == Some(&version) {
                continue;
            }
            let value: String = row.get(1)?;
            self.observed.insert(key.clone(), version);
            events.push(StorageEvent::changed(key, value));
        }

        let vanished: Vec<String> = self
            .observed
            .keys()
            .filter(|key| !present.contains(*key))
            .cloned()
            .collect();
        for key in vanished {
            self.observed.remove(&key);
            events.push(StorageEvent::removed(key));
        }

        if !events.is_empty() {
            debug!(
                "event=kv_poll module=store status=ok changed_keys={}",
                events.len()
            );
        }
        Ok(events)
    }
}

fn load_versions(conn: &Connection) -> StoreResult<HashMap<String, i64>> {
    let mut stmt = conn.prepare("SELECT key, version FROM kv_entries;")?;
    let mut rows = stmt.query([])?;
    let mut versions = HashMap::new();
    while let Some(row) = rows.next()? {
        versions.insert(row.get::<_, String>(0)?, row.get::<_, i64>(1)?);
    }
    Ok(versions)
}

fn ensure_kv_connection_ready(conn: &Connection) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for table in [KV_TABLE, SEQUENCE_TABLE] {
        if !table_exists(conn, table)? {
            return Err(StoreError::MissingRequiredTable(table));
        }
    }

    for column in ["key", "value", "version", "updated_at"] {
        if !table_has_column(conn, KV_TABLE, column)? {
            return Err(StoreError::MissingRequiredColumn {
                table: KV_TABLE,
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> StoreResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> StoreResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
