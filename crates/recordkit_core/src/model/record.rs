//! Record and record-id model.
//!
//! # Responsibility
//! - Define the persisted/wire shape of one entity instance.
//! - Generate ids and ISO-8601 timestamps.
//!
//! # Invariants
//! - `id` is compared as a string, whatever JSON type it arrived as.
//! - `fields` never contains `id`, `createdAt` or `updatedAt`.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// System-managed keys that payloads and patches can never set.
pub const RESERVED_FIELDS: [&str; 3] = ["id", "createdAt", "updatedAt"];

const ID_SUFFIX_LEN: usize = 7;

/// Collection-local record identifier.
///
/// Format is `<base36 millis>-<7 base36 random chars>`. Informational only:
/// ids read back from storage or a remote backend are accepted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Generates a fresh id from the current time and a random suffix.
    pub fn generate() -> Self {
        let millis = u128::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        let mut random = Uuid::new_v4().as_u128();
        let mut suffix = String::with_capacity(ID_SUFFIX_LEN);
        for _ in 0..ID_SUFFIX_LEN {
            suffix.push(base36_digit(random % 36));
            random /= 36;
        }
        Self(format!("{}-{suffix}", to_base36(millis)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // REST backends commonly hand out numeric ids.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => Self(text),
            RawId::Number(number) => Self(number.to_string()),
        })
    }
}

/// One entity instance: system fields plus an opaque, ordered payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    /// ISO-8601 creation time, set once.
    pub created_at: String,
    /// ISO-8601 time of the last update; `None` until the first update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Domain payload in insertion/merge order.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Creates a record with the given identity and an empty payload.
    pub fn new(id: RecordId, created_at: impl Into<String>) -> Self {
        Self {
            id,
            created_at: created_at.into(),
            updated_at: None,
            fields: Map::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Returns the string form of a payload field (`None` for null/missing).
    pub fn text(&self, name: &str) -> Option<String> {
        self.field(name).and_then(value_text)
    }

    /// Returns the truthiness of a payload field; missing fields are `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.field(name).is_some_and(is_truthy)
    }
}

/// Current time as an ISO-8601 UTC string with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Loose boolean interpretation used for flags coming from untyped payloads.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// String form of a scalar value; `None` for null.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

fn to_base36(mut value: u128) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(base36_digit(value % 36));
        value /= 36;
    }
    digits.iter().rev().collect()
}

fn base36_digit(value: u128) -> char {
    // value < 36 at every call site
    char::from_digit(value as u32, 36).unwrap_or('0')
}
