//! Local Durable Store: one collection, one key, two interchangeable backends.
//!
//! # Invariants
//! - `read` before any `write` returns an empty collection.
//! - The in-memory fallback is owned by the store instance, so independent
//!   instances never share state.

use crate::config::StoreConfig;
use crate::model::record::Record;
use crate::storage::{KeyValueStore, SqliteKeyValueStore, StorageError, StorageResult};
use log::{debug, warn};
use std::sync::{Mutex, PoisonError};

enum Backend {
    Durable(Box<dyn KeyValueStore>),
    Memory(Mutex<Option<Vec<Record>>>),
}

/// Whole-collection persistence under one fixed logical key.
pub struct LocalDurableStore {
    key: String,
    backend: Backend,
}

impl LocalDurableStore {
    /// Uses `store` as the durable backend.
    pub fn durable(key: impl Into<String>, store: impl KeyValueStore + 'static) -> Self {
        Self {
            key: key.into(),
            backend: Backend::Durable(Box::new(store)),
        }
    }

    /// Uses a process-local fallback that lives as long as this instance.
    pub fn in_memory(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            backend: Backend::Memory(Mutex::new(None)),
        }
    }

    /// Builds a store from config.
    ///
    /// Falls back to memory when `db_path` is unset or the database cannot
    /// be opened; the failure is logged, not returned.
    pub fn open(config: &StoreConfig) -> Self {
        let Some(path) = config.db_path.as_ref() else {
            debug!(
                "event=storage_open module=storage status=ok backend=memory key={}",
                config.storage_key
            );
            return Self::in_memory(config.storage_key.clone());
        };

        match SqliteKeyValueStore::open(path) {
            Ok(store) => {
                debug!(
                    "event=storage_open module=storage status=ok backend=sqlite key={}",
                    config.storage_key
                );
                Self::durable(config.storage_key.clone(), store)
            }
            Err(err) => {
                warn!(
                    "event=storage_open module=storage status=fallback backend=memory key={} error={}",
                    config.storage_key, err
                );
                Self::in_memory(config.storage_key.clone())
            }
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_durable(&self) -> bool {
        matches!(self.backend, Backend::Durable(_))
    }

    /// Returns the stored collection, or `[]` when nothing (valid) is stored.
    ///
    /// # Errors
    /// - Backend I/O failures. Malformed JSON is not an error.
    pub fn read(&self) -> StorageResult<Vec<Record>> {
        match &self.backend {
            Backend::Memory(slot) => Ok(slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
                .unwrap_or_default()),
            Backend::Durable(store) => {
                let Some(raw) = store.get_item(&self.key)? else {
                    return Ok(Vec::new());
                };
                match serde_json::from_str::<Vec<Record>>(&raw) {
                    Ok(records) => Ok(records),
                    Err(err) => {
                        warn!(
                            "event=storage_read module=storage status=malformed key={} bytes={} error={}",
                            self.key,
                            raw.len(),
                            err
                        );
                        Ok(Vec::new())
                    }
                }
            }
        }
    }

    /// Replaces the whole stored collection.
    pub fn write(&self, records: &[Record]) -> StorageResult<()> {
        match &self.backend {
            Backend::Memory(slot) => {
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(records.to_vec());
            }
            Backend::Durable(store) => {
                let raw = serde_json::to_string(records).map_err(|source| {
                    StorageError::Encode {
                        key: self.key.clone(),
                        source,
                    }
                })?;
                store.set_item(&self.key, &raw)?;
            }
        }
        debug!(
            "event=storage_write module=storage status=ok key={} count={}",
            self.key,
            records.len()
        );
        Ok(())
    }

    /// Drops the stored collection. Administrative; not used by repositories.
    pub fn clear(&self) -> StorageResult<()> {
        match &self.backend {
            Backend::Memory(slot) => {
                *slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
            }
            Backend::Durable(store) => store.remove_item(&self.key)?,
        }
        Ok(())
    }
}
