//! Query filters.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Top-level field equality, optional ordering, optional limit.
///
/// Ordering compares timestamps chronologically, numbers numerically and
/// other strings lexically. Ties keep key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub equals: Vec<(String, Value)>,
    pub sort_by: Option<String>,
    pub limit: Option<usize>,
}

impl RecordFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((field.into(), value.into()));
        self
    }

    #[must_use]
    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort_by = Some(field.into());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn matches(&self, document: &Value) -> bool {
        self.equals
            .iter()
            .all(|(field, expected)| document.get(field) == Some(expected))
    }

    /// Filter, order and truncate `rows` (already in key order).
    #[must_use]
    pub fn apply(&self, rows: Vec<(String, Value)>) -> Vec<(String, Value)> {
        let mut rows: Vec<_> = rows.into_iter().filter(|(_, v)| self.matches(v)).collect();
        if let Some(field) = &self.sort_by {
            rows.sort_by(|(_, a), (_, b)| compare_field(a.get(field), b.get(field)));
        }
        if let Some(limit) = self.limit {
            rows.truncate(limit);
        }
        rows
    }
}

fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => {
            match (
                a.parse::<DateTime<Utc>>(),
                b.parse::<DateTime<Utc>>(),
            ) {
                (Ok(a), Ok(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        }
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        // Documents missing the field sort last.
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
