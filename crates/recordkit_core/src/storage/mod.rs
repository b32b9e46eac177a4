//! Local durable persistence for whole record collections.
//!
//! # Responsibility
//! - Abstract a keyed string store (`KeyValueStore`) with a SQLite backend.
//! - Provide `LocalDurableStore`, which keeps one collection under one key and
//!   falls back to process memory when no durable backend is available.
//!
//! # Invariants
//! - Writes replace the whole collection in one backend call.
//! - A malformed stored value reads back as an empty collection.

use crate::db::DbError;
use thiserror::Error;

mod local;
mod sqlite;

pub use local::LocalDurableStore;
pub use sqlite::SqliteKeyValueStore;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("failed to encode collection `{key}`: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable keyed string storage, shaped after browser `localStorage`.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    /// Replaces the value stored under `key` in one step.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}
