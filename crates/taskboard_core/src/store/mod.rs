//! Durable key-value storage behind the board.
//!
//! # Responsibility
//! - Define the `KeyValueStore` contract the repository persists through.
//! - Provide SQLite (durable) and in-memory backends.
//! - Surface writes made by other board instances as `StorageEvent`s.
//!
//! # Invariants
//! - Values are opaque UTF-8 text; JSON encoding lives in `PersistentSlot`.
//! - A store never reports its own writes through `poll_changes`.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod slot;
mod sqlite;

pub use memory::MemoryKeyValueStore;
pub use slot::{PersistentSlot, SlotError};
pub use sqlite::SqliteKeyValueStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-layer error.
#[derive(Debug)]
pub enum StoreError {
    Db(DbError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Backend cannot be reached (quota, permissions, detached medium).
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "key-value store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "key-value store requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "key-value store requires column `{column}` in table `{table}`"
            ),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Change notification for one key, written by another board instance.
///
/// `new_value` is `None` when the key was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub new_value: Option<String>,
}

impl StorageEvent {
    pub fn changed(key: impl Into<String>, new_value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            new_value: Some(new_value.into()),
        }
    }

    pub fn removed(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            new_value: None,
        }
    }
}

/// Synchronous string key-value storage.
pub trait KeyValueStore {
    /// Reads the current value of `key`.
    fn get(&mut self, key: &str) -> StoreResult<Option<String>>;
    /// Writes `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> StoreResult<()>;
    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> StoreResult<()>;
    /// Returns changes made by other writers since the last observation.
    ///
    /// Backends without a shared medium never observe foreign writes.
    fn poll_changes(&mut self) -> StoreResult<Vec<StorageEvent>> {
        Ok(Vec::new())
    }
}
