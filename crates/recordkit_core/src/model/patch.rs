//! Partial-update patch with shallow, key-by-key merge semantics.

use crate::model::record::{Record, RESERVED_FIELDS};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Partial record: each present key overwrites the same key on merge.
///
/// # Invariants
/// - `id`, `createdAt` and `updatedAt` entries are ignored on merge.
/// - Keys absent from the patch leave the target untouched.
/// - Existing keys keep their position; new keys are appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordPatch {
    fields: Map<String, Value>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a patch from a JSON object; any other JSON value yields an
    /// empty patch.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            _ => Self::default(),
        }
    }

    /// Builder-style setter.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Merges this patch over `record`'s payload.
    ///
    /// Timestamps are owned by the repository and are not touched here.
    pub fn apply_to(&self, record: &mut Record) {
        for (field, value) in &self.fields {
            if RESERVED_FIELDS.contains(&field.as_str()) {
                continue;
            }
            record.fields.insert(field.clone(), value.clone());
        }
    }
}

impl From<Map<String, Value>> for RecordPatch {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::RecordPatch;
    use crate::model::record::{Record, RecordId};
    use serde_json::json;

    #[test]
    fn merge_keeps_id_and_appends_new_keys() {
        let mut record = Record::new(RecordId::from("abc-1234567"), "2024-01-01T00:00:00.000Z");
        record.fields.insert("title".into(), json!("Buy milk"));
        record.fields.insert("done".into(), json!(false));

        RecordPatch::new()
            .set("id", "hijacked")
            .set("createdAt", "1999-01-01T00:00:00.000Z")
            .set("extra", 3)
            .set("title", "Buy bread")
            .apply_to(&mut record);

        assert_eq!(record.id.as_str(), "abc-1234567");
        assert_eq!(record.created_at, "2024-01-01T00:00:00.000Z");
        let keys: Vec<_> = record.fields.keys().cloned().collect();
        assert_eq!(keys, ["title", "done", "extra"]);
        assert_eq!(record.fields["title"], "Buy bread");
    }

    #[test]
    fn non_object_value_is_empty_patch() {
        assert!(RecordPatch::from_value(json!([1, 2])).is_empty());
    }
}
