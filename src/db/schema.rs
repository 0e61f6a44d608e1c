//! Schema descriptor types.
//!
//! Table and column metadata as reported by backend introspection,
//! with native type names normalized to a small closed vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized column type vocabulary.
///
/// Backend-native type strings are mapped here by substring match;
/// anything unrecognized becomes `Other` rather than failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Integer,
    Real,
    Boolean,
    Date,
    #[default]
    Other,
}

impl ColumnType {
    /// Maps a backend-native type name to the normalized vocabulary.
    pub fn from_native(native: &str) -> Self {
        let lower = native.to_lowercase();

        if lower.contains("bool") {
            Self::Boolean
        } else if lower.contains("int") || lower == "year" {
            Self::Integer
        } else if lower.contains("float")
            || lower.contains("double")
            || lower.contains("real")
            || lower.contains("decimal")
            || lower.contains("numeric")
        {
            Self::Real
        } else if lower.contains("date") || lower.contains("time") {
            Self::Date
        } else if lower.contains("char")
            || lower.contains("text")
            || lower.contains("clob")
            || lower.contains("enum")
        {
            Self::Text
        } else {
            Self::Other
        }
    }

    /// Returns the vocabulary name as used in responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata for one column of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,

    /// Normalized column type.
    pub column_type: ColumnType,

    /// Backend-native type string, kept for display.
    pub native_type: String,

    /// Whether the column allows NULL values.
    pub nullable: bool,

    /// Whether the column is part of the primary key.
    pub is_key: bool,
}

impl ColumnDescriptor {
    /// Creates a descriptor, normalizing the native type name.
    pub fn new(name: impl Into<String>, native_type: impl Into<String>) -> Self {
        let native_type = native_type.into();
        Self {
            name: name.into(),
            column_type: ColumnType::from_native(&native_type),
            native_type,
            nullable: true,
            is_key: false,
        }
    }

    /// Sets whether the column is nullable.
    pub fn nullable(self, nullable: bool) -> Self {
        Self { nullable, ..self }
    }

    /// Sets whether the column is part of the primary key.
    pub fn key(self, is_key: bool) -> Self {
        Self { is_key, ..self }
    }
}

/// A table name with its ordered columns.
///
/// Produced fresh on every introspection call; the schema is assumed to
/// change between requests.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name.
    pub name: String,

    /// Columns in catalog order.
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    /// Creates a descriptor with the given name and columns.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Renders the table as a CREATE TABLE-style block for schema
    /// context. Uses the native type names, since those are what a SQL
    /// author writing against this database needs to see.
    pub fn create_table_sql(&self) -> String {
        let column_lines = self
            .columns
            .iter()
            .map(|col| {
                let mut line = format!("{} {}", col.name, col.native_type);
                if col.is_key {
                    line.push_str(" PRIMARY KEY");
                }
                if !col.nullable && !col.is_key {
                    line.push_str(" NOT NULL");
                }
                line
            })
            .collect::<Vec<_>>()
            .join(",\n    ");

        format!("CREATE TABLE {} (\n    {}\n)", self.name, column_lines)
    }
}
