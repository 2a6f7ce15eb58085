//! JSON value bound to one storage key.
//!
//! # Responsibility
//! - Decode a stored value, falling back to an initial value when the key is
//!   missing, unreadable or corrupt.
//! - Encode and write values without ever failing the caller.
//! - Decode change notifications addressed to the same key.
//!
//! # Invariants
//! - `load` and `save` never panic and never propagate errors.
//! - Failures are logged with the key name only, never with the payload.

use super::{KeyValueStore, StorageEvent, StoreError};
use log::{error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure reading a persisted JSON value.
#[derive(Debug)]
pub enum SlotError {
    Store(StoreError),
    Decode {
        key: String,
        source: serde_json::Error,
    },
}

impl Display for SlotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Decode { key, source } => {
                write!(f, "stored value under `{key}` is not valid JSON: {source}")
            }
        }
    }
}

impl Error for SlotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Decode { source, .. } => Some(source),
        }
    }
}

impl From<StoreError> for SlotError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Typed view over a single key of a `KeyValueStore`.
#[derive(Debug, Clone)]
pub struct PersistentSlot<T> {
    key: String,
    initial: T,
}

impl<T> PersistentSlot<T>
where
    T: Serialize + DeserializeOwned + Clone,
{
    pub fn new(key: impl Into<String>, initial: T) -> Self {
        Self {
            key: key.into(),
            initial,
        }
    }

    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// Reads and decodes the stored value.
    ///
    /// Returns `Ok(None)` when the key is missing or holds an empty string.
    ///
    /// # Errors
    /// - `Store` when the backend read fails.
    /// - `Decode` when the stored text is not a valid encoding of `T`.
    pub fn try_load<S>(&self, store: &mut S) -> Result<Option<T>, SlotError>
    where
        S: KeyValueStore + ?Sized,
    {
        let Some(raw) = store.get(&self.key)? else {
            return Ok(None);
        };
        if raw.is_empty() {
            return Ok(None);
        }
        self.decode(&raw).map(Some)
    }

    /// Reads the stored value, falling back to the initial value.
    pub fn load<S>(&self, store: &mut S) -> T
    where
        S: KeyValueStore + ?Sized,
    {
        match self.try_load(store) {
            Ok(Some(value)) => value,
            Ok(None) => self.initial.clone(),
            Err(err) => {
                warn!(
                    "event=slot_load module=store status=fallback key={} error={}",
                    self.key, err
                );
                self.initial.clone()
            }
        }
    }

    /// Encodes and writes `value`.
    ///
    /// Returns `false` when the write was dropped. The in-memory value stays
    /// authoritative for the caller either way.
    pub fn save<S>(&self, store: &mut S, value: &T) -> bool
    where
        S: KeyValueStore + ?Sized,
    {
        let encoded = match serde_json::to_string(value) {
            Ok(encoded) => encoded,
            Err(err) => {
                error!(
                    "event=slot_save module=store status=error key={} error_code=encode_failed error={}",
                    self.key, err
                );
                return false;
            }
        };

        match store.set(&self.key, &encoded) {
            Ok(()) => true,
            Err(err) => {
                error!(
                    "event=slot_save module=store status=error key={} error_code=write_failed error={}",
                    self.key, err
                );
                false
            }
        }
    }

    /// Decodes a change notification for this slot.
    ///
    /// Returns `None` for other keys, removals, empty values and undecodable
    /// payloads (the last case is logged).
    pub fn decode_event(&self, event: &StorageEvent) -> Option<T> {
        if event.key != self.key {
            return None;
        }
        let raw = event.new_value.as_deref().filter(|raw| !raw.is_empty())?;
        match self.decode(raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    "event=slot_event module=store status=skip key={} error={}",
                    self.key, err
                );
                None
            }
        }
    }

    fn decode(&self, raw: &str) -> Result<T, SlotError> {
        serde_json::from_str(raw).map_err(|source| SlotError::Decode {
            key: self.key.clone(),
            source,
        })
    }
}
