//! Pure derived views over an in-memory record list.
//!
//! # Invariants
//! - Functions here never mutate their input.
//! - `sort_records` is stable: ties keep collection order.

use crate::model::record::Record;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Field names driving the derived views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    pub favorite_field: String,
    pub completed_field: String,
    pub archived_field: String,
    pub priority_field: String,
    /// Priority values from most to least urgent; anything else ranks last.
    pub priority_ranks: Vec<String>,
    pub due_date_field: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            favorite_field: "favorite".to_string(),
            completed_field: "completed".to_string(),
            archived_field: "archived".to_string(),
            priority_field: "priority".to_string(),
            priority_ranks: ["high", "medium", "low"].map(String::from).to_vec(),
            due_date_field: "dueDate".to_string(),
        }
    }
}

/// Favorite first, then priority rank, then earliest due date (absent last).
///
/// Archived records are dropped unless `include_archived` is set.
pub fn sort_records(records: &[Record], config: &ViewConfig, include_archived: bool) -> Vec<Record> {
    let mut visible: Vec<Record> = records
        .iter()
        .filter(|record| include_archived || !record.flag(&config.archived_field))
        .cloned()
        .collect();
    visible.sort_by(|a, b| compare_records(a, b, config));
    visible
}

pub fn compare_records(a: &Record, b: &Record, config: &ViewConfig) -> Ordering {
    let favorite = &config.favorite_field;
    b.flag(favorite)
        .cmp(&a.flag(favorite))
        .then_with(|| priority_rank(a, config).cmp(&priority_rank(b, config)))
        .then_with(|| {
            let field = &config.due_date_field;
            match (due_date(a, field), due_date(b, field)) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        })
}

pub fn count_where(records: &[Record], field: &str) -> usize {
    records.iter().filter(|record| record.flag(field)).count()
}

/// Groups by the string form of `field`; missing values group under `""`.
pub fn group_by(records: &[Record], field: &str) -> BTreeMap<String, Vec<Record>> {
    let mut groups: BTreeMap<String, Vec<Record>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.text(field).unwrap_or_default())
            .or_default()
            .push(record.clone());
    }
    groups
}

/// Records whose `field` string form equals `value` exactly.
pub fn by_field(records: &[Record], field: &str, value: &str) -> Vec<Record> {
    records
        .iter()
        .filter(|record| record.text(field).as_deref() == Some(value))
        .cloned()
        .collect()
}

fn priority_rank(record: &Record, config: &ViewConfig) -> usize {
    let value = record
        .text(&config.priority_field)
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    config
        .priority_ranks
        .iter()
        .position(|rank| rank.eq_ignore_ascii_case(&value))
        .unwrap_or(config.priority_ranks.len())
}

fn due_date(record: &Record, field: &str) -> Option<DateTime<Utc>> {
    parse_date(record.text(field)?.trim())
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M") {
        return Some(parsed.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}
