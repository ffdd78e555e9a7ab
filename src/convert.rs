//! Record to document-field conversion.
//!
//! | Declared type                          | Value           |
//! |----------------------------------------|-----------------|
//! | `STRING`                               | string          |
//! | `BYTES`                                | bytes           |
//! | `INTEGER`, `INT64`                     | integer (`i64`) |
//! | `FLOAT`, `FLOAT64`                     | double (`f64`)  |
//! | everything else                        | string          |
//!
//! Every field of the schema yields exactly one value. A SQL NULL yields the
//! null value whatever the declared type. Booleans, temporal types and nested
//! records are written as their plain text; the boolean and timestamp values are
//! never produced here.

use crate::error::ConvertError;
use crate::record::{RawValue, Record};
use crate::schema::{FieldSchema, FieldType};
use crate::value::{Fields, TaggedValue};

/// Convert every field of `record` against its schema.
///
/// Later fields overwrite earlier ones with the same name.
///
/// # Errors
///
/// Fails when a numeric field holds malformed text, a `BYTES` field holds a
/// non-byte value, or the record's value count does not match its schema. No
/// partial document is returned.
pub fn convert_record(record: &Record) -> Result<Fields, ConvertError> {
    let schema = record.schema();
    if schema.len() != record.values().len() {
        return Err(ConvertError::Arity {
            expected: schema.len(),
            found: record.values().len(),
        });
    }

    schema
        .fields()
        .iter()
        .zip(record.values())
        .try_fold(Fields::with_capacity(schema.len()), |mut fields, (field, raw)| {
            fields.insert(field.name.clone(), convert_value(field, raw)?);
            Ok(fields)
        })
}

/// Convert one raw value according to its field's declared type.
///
/// # Errors
///
/// See [`convert_record`].
pub fn convert_value(field: &FieldSchema, raw: &RawValue) -> Result<TaggedValue, ConvertError> {
    if raw.is_null() {
        return Ok(TaggedValue::Null);
    }

    match &field.field_type {
        FieldType::String => Ok(TaggedValue::String(raw.to_string())),
        FieldType::Bytes => match raw {
            RawValue::Bytes(b) => Ok(TaggedValue::Bytes(b.clone())),
            other => Err(ConvertError::Cast {
                field: field.name.clone(),
                expected: "bytes",
                found: other.kind(),
            }),
        },
        FieldType::Integer => parse_integer(field, raw).map(TaggedValue::Integer),
        FieldType::Float => parse_double(field, raw).map(TaggedValue::Double),
        // Known gap: the boolean value is defined but booleans keep their text.
        FieldType::Boolean
        | FieldType::Timestamp
        | FieldType::Numeric
        | FieldType::BigNumeric
        | FieldType::Date
        | FieldType::Time
        | FieldType::DateTime
        | FieldType::Interval
        // Nested records are not converted field by field.
        | FieldType::Record
        | FieldType::Other(_) => Ok(TaggedValue::String(raw.to_string())),
    }
}

fn parse_integer(field: &FieldSchema, raw: &RawValue) -> Result<i64, ConvertError> {
    if let RawValue::Int(i) = raw {
        return Ok(*i);
    }
    let text = raw.to_string();
    text.parse::<i64>().map_err(|e| ConvertError::Parse {
        field: field.name.clone(),
        target: "64-bit integer",
        reason: e.to_string(),
        text,
    })
}

fn parse_double(field: &FieldSchema, raw: &RawValue) -> Result<f64, ConvertError> {
    if let RawValue::Float(x) = raw {
        return Ok(*x);
    }
    let text = raw.to_string();
    text.parse::<f64>().map_err(|e| ConvertError::Parse {
        field: field.name.clone(),
        target: "double",
        reason: e.to_string(),
        text,
    })
}
