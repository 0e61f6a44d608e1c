//! Normalized query result types.
//!
//! Every backend converts its native rows into these shapes; nothing
//! backend-specific escapes this module's boundary. Values are limited
//! to the JSON-safe scalar set, so a result can always be serialized
//! for a UI or an LLM without surprises.

use crate::error::{CharterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Represents the result of executing a SQL statement.
///
/// For row-producing statements, `columns` and `rows` are populated and
/// `row_count == rows.len()`. For mutation statements, `columns` and
/// `rows` are empty and `row_count` is the number of affected rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Ordered column names. Duplicates from backend aliasing are
    /// disambiguated with a positional suffix before they get here.
    pub columns: Vec<String>,

    /// Rows in exactly the order the backend returned them. Each row
    /// has one value per entry in `columns`, in the same order.
    pub rows: Vec<Row>,

    /// Number of returned rows, or affected rows for mutations.
    pub row_count: usize,
}

impl QueryResult {
    /// Creates a result from columns and rows of a row-producing statement.
    pub fn with_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let row_count = rows.len();
        Self {
            columns,
            rows,
            row_count,
        }
    }

    /// Creates a result for a mutation statement with the given
    /// affected-row count.
    pub fn mutation(affected: u64) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: affected as usize,
        }
    }

    /// Returns true if this result came from a mutation statement.
    pub fn is_mutation(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns true if the result has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the first index of the named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Renders each row as a column-name -> scalar mapping, preserving
    /// column order.
    pub fn row_objects(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row.iter())
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect()
            })
            .collect()
    }
}

/// A row of data from a query result.
pub type Row = Vec<Value>;

/// A single scalar value crossing the normalization boundary.
///
/// Binary data never becomes a `Value`; backends reject it with
/// `UnsupportedTypeError` instead of stringifying it. Date and time
/// values arrive here already coerced to ISO-8601 text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// NULL value.
    #[default]
    Null,

    /// Boolean value.
    Bool(bool),

    /// Signed integer (up to i64).
    Int(i64),

    /// Floating point number.
    Float(f64),

    /// Text value, including ISO-8601 dates and times.
    String(String),
}

impl Value {
    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts the value to its JSON representation.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::String(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Converts a JSON scalar into a `Value`. Arrays and objects are
    /// outside the contract and fail with `UnsupportedTypeError`.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Int(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(Value::Float(f))
                } else {
                    Ok(Value::Float(0.0))
                }
            }
            serde_json::Value::String(s) => Ok(Value::String(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(
                CharterError::unsupported_type("only scalar values may appear in a query result"),
            ),
        }
    }

    /// Renders the value for plain-text display.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

/// Disambiguates duplicate column names by appending a positional
/// suffix to the second and later occurrences (`x`, `x_2`, `x_3`).
///
/// Backends may legitimately report the same name twice after aliasing;
/// dropping one would lose a column in the row-to-mapping conversion,
/// so both are kept. A suffixed candidate that matches another column
/// (real or already emitted) bumps the counter until it is unique, so
/// the output never contains a duplicate.
pub fn dedupe_column_names(names: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut taken: HashSet<String> = names.iter().cloned().collect();
    let mut result = Vec::with_capacity(names.len());

    for name in names {
        let count = seen.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            result.push(name);
            continue;
        }

        let mut candidate = format!("{name}_{count}");
        while taken.contains(&candidate) {
            *count += 1;
            candidate = format!("{name}_{count}");
        }
        taken.insert(candidate.clone());
        result.push(candidate);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_display_string(), "NULL");
        assert_eq!(Value::Bool(true).to_display_string(), "true");
        assert_eq!(Value::Int(42).to_display_string(), "42");
        assert_eq!(Value::Float(2.71).to_display_string(), "2.71");
        assert_eq!(
            Value::String("hello".to_string()).to_display_string(),
            "hello"
        );
    }

    #[test]
    fn test_value_json_round_trip() {
        let values = vec![
            Value::Null,
            Value::Bool(false),
            Value::Int(7),
            Value::Float(1.5),
            Value::String("text".to_string()),
        ];
        for value in values {
            assert_eq!(Value::from_json(&value.to_json()).unwrap(), value);
        }
    }

    #[test]
    fn test_value_from_json_rejects_composites() {
        let err = Value::from_json(&serde_json::json!([1, 2])).unwrap_err();
        assert_eq!(err.kind(), "UnsupportedTypeError");

        let err = Value::from_json(&serde_json::json!({"a": 1})).unwrap_err();
        assert_eq!(err.kind(), "UnsupportedTypeError");
    }

    #[test]
    fn test_json_preserves_int_float_distinction() {
        assert_eq!(Value::from_json(&serde_json::json!(3)).unwrap(), Value::Int(3));
        assert_eq!(
            Value::from_json(&serde_json::json!(3.0)).unwrap(),
            Value::Float(3.0)
        );
    }

    #[test]
    fn test_query_result_with_rows() {
        let result = QueryResult::with_rows(
            vec!["id".to_string(), "name".to_string()],
            vec![
                vec![Value::Int(1), Value::String("Alice".to_string())],
                vec![Value::Int(2), Value::Null],
            ],
        );

        assert_eq!(result.row_count, 2);
        assert!(!result.is_mutation());
        assert_eq!(result.column_index("name"), Some(1));
        assert_eq!(result.column_index("missing"), None);
    }

    #[test]
    fn test_query_result_mutation() {
        let result = QueryResult::mutation(3);
        assert!(result.is_mutation());
        assert!(result.columns.is_empty());
        assert!(result.rows.is_empty());
        assert_eq!(result.row_count, 3);
    }

    #[test]
    fn test_row_objects_preserve_order_and_nulls() {
        let result = QueryResult::with_rows(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![Value::Int(1), Value::Null]],
        );

        let objects = result.row_objects();
        assert_eq!(objects.len(), 1);
        let keys: Vec<&String> = objects[0].keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(objects[0]["a"], serde_json::json!(1));
        assert_eq!(objects[0]["b"], serde_json::Value::Null);
    }

    #[test]
    fn test_dedupe_column_names() {
        let names = vec!["x".to_string(), "x".to_string(), "y".to_string(), "x".to_string()];
        assert_eq!(dedupe_column_names(names), vec!["x", "x_2", "y", "x_3"]);
    }

    #[test]
    fn test_dedupe_leaves_unique_names_alone() {
        let names = vec!["a".to_string(), "b".to_string()];
        assert_eq!(dedupe_column_names(names), vec!["a", "b"]);
    }

    #[test]
    fn test_dedupe_skips_suffix_taken_by_a_real_column() {
        // A real x_2 column occupies the first candidate suffix; the
        // duplicate x must not shadow it.
        let names = vec!["x".to_string(), "x_2".to_string(), "x".to_string()];
        let deduped = dedupe_column_names(names);
        assert_eq!(deduped, vec!["x", "x_2", "x_3"]);

        let unique: HashSet<&String> = deduped.iter().collect();
        assert_eq!(unique.len(), deduped.len());
    }

    #[test]
    fn test_row_objects_keep_every_column_after_suffix_collision() {
        let columns = dedupe_column_names(vec![
            "x".to_string(),
            "x_2".to_string(),
            "x".to_string(),
        ]);
        let result = QueryResult::with_rows(
            columns,
            vec![vec![Value::Int(1), Value::Int(2), Value::Int(3)]],
        );

        let objects = result.row_objects();
        assert_eq!(objects[0].len(), 3);
        assert_eq!(objects[0]["x"], serde_json::json!(1));
        assert_eq!(objects[0]["x_2"], serde_json::json!(2));
        assert_eq!(objects[0]["x_3"], serde_json::json!(3));
    }
}
