//! Local-first record store: durable single-key collections, typed CRUD
//! repositories (local with simulated latency, or REST) and a view-facing
//! application store.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod storage;

pub use config::{RemoteConfig, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::patch::RecordPatch;
pub use model::record::{Record, RecordId};
pub use model::schema::{FieldKind, RecordSchema, ValidationError};
pub use repo::local_repo::LocalRecordRepository;
pub use repo::remote_repo::RemoteRecordRepository;
pub use repo::{RecordFilter, RecordRepository, RepoError, RepoResult};
pub use service::app_store::AppStore;
pub use service::view::ViewConfig;
pub use storage::{KeyValueStore, LocalDurableStore, SqliteKeyValueStore, StorageError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
