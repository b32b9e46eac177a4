//! Record repository contract and its local/remote implementations.
//!
//! # Responsibility
//! - Define the typed CRUD + filter surface the application store calls.
//! - Keep backend details (durable store, HTTP) behind that surface.
//!
//! # Invariants
//! - "Not found" is never an error: `Option::None` or `false`.
//! - Only validation and transport failures (plus local storage I/O) are
//!   reported as `RepoError`.
//! - Every returned record is an owned copy, independent of stored state.

use crate::model::patch::RecordPatch;
use crate::model::record::{Record, RecordId};
use crate::model::schema::{RecordSchema, ValidationError};
use crate::storage::StorageError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

pub mod local_repo;
pub mod remote_repo;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Non-success HTTP response from a remote backend.
    #[error("HTTP error! status: {status}")]
    Transport { status: u16 },
    /// Request could not be sent or the response body could not be decoded.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Narrowing query for `RecordRepository::filter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordFilter {
    /// Case-insensitive equality on the string form of one field.
    FieldEquals { field: String, value: String },
    /// Case-insensitive substring over the schema's search fields.
    Search(String),
}

impl RecordFilter {
    pub fn field_equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn search(text: impl Into<String>) -> Self {
        Self::Search(text.into())
    }

    /// Lowercased, whitespace-normalized query text; `None` when blank.
    pub fn normalized_query(&self) -> Option<String> {
        let raw = match self {
            Self::FieldEquals { value, .. } => value,
            Self::Search(text) => text,
        };
        let normalized = normalize_text(raw);
        (!normalized.is_empty()).then_some(normalized)
    }

    pub fn matches(&self, record: &Record, schema: &RecordSchema) -> bool {
        let Some(query) = self.normalized_query() else {
            return false;
        };
        match self {
            Self::FieldEquals { field, .. } => record
                .text(field)
                .is_some_and(|text| normalize_text(&text) == query),
            Self::Search(_) => schema.search_fields().iter().any(|field| {
                record
                    .text(field)
                    .is_some_and(|text| normalize_text(&text).contains(&query))
            }),
        }
    }
}

/// Trimmed, lowercased, with whitespace runs collapsed to one space.
///
/// Applied to both the query and the record text so they compare alike.
fn normalize_text(raw: &str) -> String {
    WHITESPACE_RE.replace_all(raw.trim(), " ").to_lowercase()
}

/// Repository interface for record CRUD operations.
///
/// Implementations suspend only at their backend boundary; callers on a
/// single-threaded runtime may interleave calls at those points.
#[allow(async_fn_in_trait)]
pub trait RecordRepository {
    /// All records, in collection order.
    async fn list(&self) -> RepoResult<Vec<Record>>;
    async fn get_by_id(&self, id: &RecordId) -> RepoResult<Option<Record>>;
    /// Validates and creates a record from an untyped payload.
    async fn create(&self, payload: &Value) -> RepoResult<Record>;
    /// Shallow-merges `patch` and stamps `updatedAt`; `None` if `id` is unknown.
    async fn update(&self, id: &RecordId, patch: &RecordPatch) -> RepoResult<Option<Record>>;
    /// Returns `false` if `id` is unknown.
    async fn delete(&self, id: &RecordId) -> RepoResult<bool>;
    /// Matching records; `[]` for a blank query.
    async fn filter(&self, filter: &RecordFilter) -> RepoResult<Vec<Record>>;
}
