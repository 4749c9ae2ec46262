use serde_json::Value;

use super::errors::DocumentError;

/// Equality predicates over the top-level fields of a document.
///
/// This is the whole query language the user store needs. Backends either
/// translate it to their native query syntax or evaluate [`Filter::matches`]
/// over the stored documents.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every document in the collection
    All,
    /// `document[field] == value`, a missing field compares equal to `null`
    Eq(String, Value),
    /// `document[field]` is an array holding `value`
    Contains(String, Value),
    /// All of the nested filters hold
    And(Vec<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Contains(field.into(), value.into())
    }

    /// Combine two filters, flattening nested conjunctions.
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Self::All, other) => other,
            (this, Self::All) => this,
            (Self::And(mut filters), other) => {
                filters.push(other);
                Self::And(filters)
            }
            (this, other) => Self::And(vec![this, other]),
        }
    }

    /// Evaluate the filter against a JSON document.
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Self::All => true,
            Self::Eq(field, value) => {
                scalar_eq(document.get(field).unwrap_or(&Value::Null), value)
            }
            Self::Contains(field, value) => document
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.iter().any(|item| scalar_eq(item, value))),
            Self::And(filters) => filters.iter().all(|filter| filter.matches(document)),
        }
    }

    /// Reject filters that cannot be expressed safely by every backend.
    ///
    /// Field names end up inside SQL JSON paths, so only `[A-Za-z0-9_]` is
    /// accepted. Compared values must be JSON scalars.
    pub fn validate(&self) -> Result<(), DocumentError> {
        match self {
            Self::All => Ok(()),
            Self::Eq(field, value) => {
                validate_field_name(field)?;
                validate_scalar(field, value)
            }
            Self::Contains(field, value) => {
                validate_field_name(field)?;
                validate_scalar(field, value)?;
                if value.is_null() {
                    return Err(DocumentError::InvalidQuery(format!(
                        "Contains filter on '{field}' cannot compare against null"
                    )));
                }
                Ok(())
            }
            Self::And(filters) => filters.iter().try_for_each(Filter::validate),
        }
    }
}

/// JSON equality where numbers compare by value, so `2` equals `2.0` as it
/// does in the SQL backends.
fn scalar_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                a == b
            } else if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                a == b
            } else {
                a.as_f64() == b.as_f64()
            }
        }
        _ => left == right,
    }
}

fn validate_field_name(field: &str) -> Result<(), DocumentError> {
    if field.is_empty() {
        return Err(DocumentError::InvalidQuery(
            "Field name cannot be empty".to_string(),
        ));
    }

    if !field
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(DocumentError::InvalidQuery(format!(
            "Field name '{field}' contains unsupported characters"
        )));
    }

    Ok(())
}

fn validate_scalar(field: &str, value: &Value) -> Result<(), DocumentError> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(DocumentError::InvalidQuery(format!(
            "Filter on '{field}' must compare against a scalar value"
        ))),
        _ => Ok(()),
    }
}
