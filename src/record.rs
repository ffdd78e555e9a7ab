//! Raw warehouse records.
//!
//! A [`Record`] is one result-set row: the shared schema plus one [`RawValue`]
//! per field, by position.

use crate::schema::{FieldSchema, FieldType, TableSchema};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::sync::Arc;

/// An untyped value as delivered by the record reader.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// A nested record, as name/value pairs in schema order.
    Record(Vec<(String, RawValue)>),
}

impl RawValue {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Name of the representation, for error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::Record(_) => "record",
        }
    }

    /// JSON rendering. Bytes become base64 text, records become objects.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Number((*i).into()),
            Self::Float(x) => Number::from_f64(*x).map_or_else(|| Value::String(x.to_string()), Value::Number),
            Self::Text(s) => Value::String(s.clone()),
            Self::Bytes(b) => Value::String(STANDARD.encode(b)),
            Self::Record(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }

    /// Interpret a JSON cell according to its declared field.
    ///
    /// `BYTES` cells are expected as base64 text (the warehouse's JSON encoding)
    /// or as an array of octets; anything that cannot be read as bytes is kept as
    /// text so the converter can report the cast failure. Nested objects become
    /// records using the field's sub-schema order where it is known.
    #[must_use]
    pub fn from_json(field: &FieldSchema, value: &Value) -> Self {
        match (value, &field.field_type) {
            (Value::Null, _) => Self::Null,
            (Value::String(s), FieldType::Bytes) => {
                STANDARD.decode(s).map_or_else(|_| Self::Text(s.clone()), Self::Bytes)
            }
            (Value::Array(items), FieldType::Bytes) => items
                .iter()
                .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
                .collect::<Option<Vec<u8>>>()
                .map_or_else(|| Self::Text(value.to_string()), Self::Bytes),
            (Value::Bool(b), _) => Self::Bool(*b),
            (Value::Number(n), _) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or_else(|| Self::Text(n.to_string())),
            (Value::String(s), _) => Self::Text(s.clone()),
            (Value::Object(obj), _) => Self::Record(nested_from_json(&field.fields, obj)),
            (Value::Array(_), _) => Self::Text(value.to_string()),
        }
    }
}

fn nested_from_json(sub_fields: &[FieldSchema], obj: &Map<String, Value>) -> Vec<(String, RawValue)> {
    if sub_fields.is_empty() {
        let untyped = FieldSchema::new("", FieldType::String);
        return obj
            .iter()
            .map(|(k, v)| (k.clone(), RawValue::from_json(&untyped, v)))
            .collect();
    }
    sub_fields
        .iter()
        .map(|f| {
            let v = obj.get(&f.name).unwrap_or(&Value::Null);
            (f.name.clone(), RawValue::from_json(f, v))
        })
        .collect()
}

/// Textual representation used by the string rules and the fallback rule.
impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            // Debug keeps the fraction of integral values: `7.0`, not `7`.
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Text(s) => f.write_str(s),
            Self::Bytes(b) => f.write_str(&String::from_utf8_lossy(b)),
            Self::Record(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RawValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for RawValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for RawValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for RawValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Vec<u8>> for RawValue {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// One result-set row with its schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    schema: Arc<TableSchema>,
    values: Vec<RawValue>,
}

impl Record {
    #[must_use]
    pub fn new(schema: Arc<TableSchema>, values: Vec<RawValue>) -> Self {
        Self { schema, values }
    }

    #[must_use]
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    #[must_use]
    pub fn values(&self) -> &[RawValue] {
        &self.values
    }

    #[must_use]
    pub fn get(&self, pos: usize) -> Option<&RawValue> {
        self.values.get(pos)
    }

    /// Value of the first field called `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&RawValue> {
        self.schema.position(name).and_then(|pos| self.get(pos))
    }

    /// JSON object of field name to raw value, for diagnostics.
    ///
    /// Values beyond the schema are listed under `_extra`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut obj: Map<String, Value> = self
            .schema
            .fields()
            .iter()
            .zip(&self.values)
            .map(|(f, v)| (f.name.clone(), v.to_json()))
            .collect();
        if self.values.len() > self.schema.len() {
            let extra = self.values[self.schema.len()..]
                .iter()
                .map(RawValue::to_json)
                .collect();
            obj.insert("_extra".to_string(), Value::Array(extra));
        }
        Value::Object(obj)
    }
}
