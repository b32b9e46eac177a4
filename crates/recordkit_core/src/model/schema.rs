//! Creation-time schema: required title field, declared field coercions and
//! searchable fields.
//!
//! # Invariants
//! - A record is only constructed after `validate` succeeds.
//! - Declared fields are always present on a created record (default when
//!   missing from the payload).
//! - Undeclared payload fields pass through untouched, reserved keys excepted.

use crate::model::record::{
    is_truthy, now_timestamp, value_text, Record, RecordId, RESERVED_FIELDS,
};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Typed validation outcome for record creation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("record must have a non-empty `{field}`")]
    MissingTitle { field: String },
}

/// Coercion applied to a declared field at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Stringified and trimmed.
    Text,
    /// Parsed to a JSON number.
    Number,
    /// Reduced to a JSON boolean by truthiness.
    Flag,
    /// Copied as-is.
    Passthrough,
}

impl FieldKind {
    fn default_value(self) -> Value {
        match self {
            Self::Text => Value::String(String::new()),
            Self::Number => Value::from(0),
            Self::Flag => Value::Bool(false),
            Self::Passthrough => Value::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub default: Value,
}

/// Per-entity-kind creation schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    title_field: String,
    fields: Vec<FieldSpec>,
    search_fields: Vec<String>,
}

impl RecordSchema {
    /// Creates a schema whose only requirement is a non-blank `title_field`.
    pub fn new(title_field: impl Into<String>) -> Self {
        let title_field = title_field.into();
        Self {
            search_fields: vec![title_field.clone()],
            title_field,
            fields: Vec::new(),
        }
    }

    /// Declares a field with the kind's default (`""`, `0`, `false`, `null`).
    pub fn field(self, name: impl Into<String>, kind: FieldKind) -> Self {
        let default = kind.default_value();
        self.field_with_default(name, kind, default)
    }

    pub fn field_with_default(
        mut self,
        name: impl Into<String>,
        kind: FieldKind,
        default: impl Into<Value>,
    ) -> Self {
        self.fields.push(FieldSpec {
            name: name.into(),
            kind,
            default: default.into(),
        });
        self
    }

    /// Adds a field to the free-text search set.
    pub fn searchable(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.search_fields.contains(&name) {
            self.search_fields.push(name);
        }
        self
    }

    /// Task tracker: title, description, stats, priority and due date.
    pub fn tasks() -> Self {
        Self::new("title")
            .field("description", FieldKind::Text)
            .field_with_default("stats", FieldKind::Text, "all")
            .field_with_default("priority", FieldKind::Text, "normal")
            .field("dueDate", FieldKind::Passthrough)
            .searchable("description")
    }

    /// Study sessions: title, subject, duration and completion flags.
    pub fn sessions() -> Self {
        Self::new("title")
            .field("subject", FieldKind::Text)
            .field("duration", FieldKind::Number)
            .field("completed", FieldKind::Flag)
            .field("favorite", FieldKind::Flag)
            .searchable("subject")
    }

    /// Dish catalog: name, description, price, category and availability.
    pub fn dishes() -> Self {
        Self::new("name")
            .field("description", FieldKind::Text)
            .field("price", FieldKind::Number)
            .field("category", FieldKind::Text)
            .field("available", FieldKind::Flag)
            .field("imageUrl", FieldKind::Text)
            .searchable("description")
    }

    pub fn title_field(&self) -> &str {
        &self.title_field
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn search_fields(&self) -> &[String] {
        &self.search_fields
    }

    /// Checks the payload and returns the trimmed title.
    ///
    /// # Errors
    /// - `MissingTitle` when the payload is not an object, or its title field
    ///   is missing, null or blank after trimming.
    pub fn validate(&self, payload: &Value) -> Result<String, ValidationError> {
        let title = payload
            .as_object()
            .and_then(|object| object.get(&self.title_field))
            .and_then(value_text)
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        if title.is_empty() {
            return Err(ValidationError::MissingTitle {
                field: self.title_field.clone(),
            });
        }
        Ok(title)
    }

    /// Validates, coerces and stamps a new record with a fresh id and
    /// `createdAt`.
    pub fn build_record(&self, payload: &Value) -> Result<Record, ValidationError> {
        self.build_record_with_id(payload, RecordId::generate(), now_timestamp())
    }

    /// Same as `build_record` with caller-provided identity.
    pub fn build_record_with_id(
        &self,
        payload: &Value,
        id: RecordId,
        created_at: String,
    ) -> Result<Record, ValidationError> {
        let title = self.validate(payload)?;
        let empty = Map::new();
        let source = payload.as_object().unwrap_or(&empty);

        let mut record = Record::new(id, created_at);
        record
            .fields
            .insert(self.title_field.clone(), Value::String(title));

        for spec in &self.fields {
            let value = coerce(spec, source.get(&spec.name));
            record.fields.insert(spec.name.clone(), value);
        }

        for (name, value) in source {
            if RESERVED_FIELDS.contains(&name.as_str()) || record.fields.contains_key(name) {
                continue;
            }
            record.fields.insert(name.clone(), value.clone());
        }

        Ok(record)
    }
}

fn coerce(spec: &FieldSpec, value: Option<&Value>) -> Value {
    let Some(value) = value.filter(|value| !value.is_null()) else {
        return spec.default.clone();
    };

    match spec.kind {
        FieldKind::Text => Value::String(value_text(value).unwrap_or_default().trim().to_string()),
        FieldKind::Flag => Value::Bool(is_truthy(value)),
        FieldKind::Passthrough => value.clone(),
        FieldKind::Number => coerce_number(spec, value),
    }
}

/// Numeric coercion; text that does not parse becomes `null`.
fn coerce_number(spec: &FieldSpec, value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::Bool(flag) => Value::from(i64::from(*flag)),
        Value::String(text) => {
            let text = text.trim();
            if text.is_empty() {
                return spec.default.clone();
            }
            if let Ok(integer) = text.parse::<i64>() {
                return Value::from(integer);
            }
            text.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map_or(Value::Null, Value::Number)
        }
        _ => Value::Null,
    }
}
