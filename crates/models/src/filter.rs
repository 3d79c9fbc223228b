use serde_json::Value;

use crate::record::Record;

/// Query filter. Only exact single-field equality is ever needed.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    Eq { field: String, value: Value },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq { field: field.into(), value: value.into() }
    }

    /// Equality on an optional value; `None` matches records where the field is null or absent.
    pub fn eq_opt(field: impl Into<String>, value: Option<String>) -> Self {
        Filter::Eq { field: field.into(), value: value.map(Value::String).unwrap_or(Value::Null) }
    }

    /// Document-store equality: a missing field compares equal to null.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq { field, value } => record.get(field).unwrap_or(&Value::Null) == value,
        }
    }
}

/// Ordering and cap for a find.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindSpec {
    /// Reverse insertion order.
    pub newest_first: bool,
    pub limit: Option<i64>,
}

impl FindSpec {
    pub fn newest(limit: i64) -> Self {
        Self { newest_first: true, limit: Some(limit) }
    }
}
