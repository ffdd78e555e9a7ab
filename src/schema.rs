//! Self-describing record schemas as reported by the warehouse.
//!
//! Declared types are matched case-insensitively against the warehouse's
//! documented tags. Aliases (`INT64` for `INTEGER`, `BOOL` for `BOOLEAN`,
//! `STRUCT` for `RECORD`, ...) collapse onto one variant. Any tag outside the
//! documented set is kept verbatim in [`FieldType::Other`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a warehouse column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    String,
    Bytes,
    /// `INTEGER` or `INT64`
    Integer,
    /// `FLOAT` or `FLOAT64`
    Float,
    Numeric,
    BigNumeric,
    /// `BOOLEAN` or `BOOL`
    Boolean,
    Timestamp,
    Date,
    Time,
    DateTime,
    Interval,
    /// `RECORD` or `STRUCT`
    Record,
    /// Any tag the warehouse may report that is not listed above (e.g. `GEOGRAPHY`).
    Other(String),
}

impl FieldType {
    /// Parse a declared type tag. Never fails: unknown tags become [`FieldType::Other`].
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag.to_ascii_uppercase().as_str() {
            "STRING" => Self::String,
            "BYTES" => Self::Bytes,
            "INTEGER" | "INT64" => Self::Integer,
            "FLOAT" | "FLOAT64" => Self::Float,
            "NUMERIC" => Self::Numeric,
            "BIGNUMERIC" => Self::BigNumeric,
            "BOOLEAN" | "BOOL" => Self::Boolean,
            "TIMESTAMP" => Self::Timestamp,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "DATETIME" => Self::DateTime,
            "INTERVAL" => Self::Interval,
            "RECORD" | "STRUCT" => Self::Record,
            _ => Self::Other(tag.to_string()),
        }
    }

    /// Canonical tag for this type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "STRING",
            Self::Bytes => "BYTES",
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Numeric => "NUMERIC",
            Self::BigNumeric => "BIGNUMERIC",
            Self::Boolean => "BOOLEAN",
            Self::Timestamp => "TIMESTAMP",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::DateTime => "DATETIME",
            Self::Interval => "INTERVAL",
            Self::Record => "RECORD",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for FieldType {
    fn from(tag: &str) -> Self {
        Self::parse(tag)
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<FieldType> for String {
    fn from(t: FieldType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column of a result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Sub-fields of a `RECORD`/`STRUCT` column. Not used by conversion.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSchema>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, field_type: impl Into<FieldType>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Vec<FieldSchema>) -> Self {
        self.fields = fields;
        self
    }
}

/// Ordered list of fields; a record's values are positional against it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableSchema {
    fields: Vec<FieldSchema>,
}

impl TableSchema {
    #[must_use]
    pub fn new(fields: Vec<FieldSchema>) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of the first field called `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

impl FromIterator<FieldSchema> for TableSchema {
    fn from_iter<I: IntoIterator<Item = FieldSchema>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
