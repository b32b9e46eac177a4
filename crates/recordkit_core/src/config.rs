//! Store and remote-backend configuration.
//!
//! # Invariants
//! - Every field has a usable default; an empty JSON object is a valid config.
//! - Unknown keys are rejected so typos do not silently fall back to defaults.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_STORAGE_KEY: &str = "records";
pub const DEFAULT_SIMULATED_DELAY_MS: u64 = 150;
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the local (durable or in-memory) record store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Fixed logical key the whole collection is stored under.
    pub storage_key: String,
    /// Artificial latency injected before every repository operation.
    pub simulated_delay_ms: u64,
    /// SQLite file for durable storage. `None` selects the in-memory fallback.
    pub db_path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            simulated_delay_ms: DEFAULT_SIMULATED_DELAY_MS,
            db_path: None,
        }
    }
}

impl StoreConfig {
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn simulated_delay(&self) -> Duration {
        Duration::from_millis(self.simulated_delay_ms)
    }
}

/// Configuration for a REST backend exposing one resource collection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    pub base_url: String,
    /// Resource path segment, e.g. `tasks` for `/tasks` and `/tasks/<id>`.
    pub resource: String,
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            resource: DEFAULT_STORAGE_KEY.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RemoteConfig {
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
