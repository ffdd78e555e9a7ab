//! Fixtures and assertions for testing exports.
//!
//! # Quick Start
//!
//! ```
//! use rowdoc::testing::*;
//! use rowdoc::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let warehouse = sample_warehouse("events");
//! let store = FakeDocumentStore::new();
//! let options = ExportOptions::new("SELECT * FROM events", "exports", "run-1")
//!     .with_project_id("proj");
//!
//! let report = run_export(&options, &warehouse, &store, &WriteQos::default(), &Runner::default())?;
//! assert_eq!(report.documents_written, sample_rows().len());
//! # Ok(())
//! # }
//! ```

use crate::document::{DocumentPath, DocumentTarget};
use crate::io::cloud::fake::FakeWarehouseIO;
use crate::record::{RawValue, Record};
use crate::schema::{FieldSchema, TableSchema};
use crate::value::{Fields, TaggedValue};
use std::sync::Arc;
use uuid::Uuid;

/// `[id INTEGER, label STRING, blob BYTES]`
#[must_use]
pub fn sample_schema() -> TableSchema {
    TableSchema::new(vec![
        FieldSchema::new("id", "INTEGER"),
        FieldSchema::new("label", "STRING"),
        FieldSchema::new("blob", "BYTES"),
    ])
}

/// Three well-formed rows for [`sample_schema`].
#[must_use]
pub fn sample_rows() -> Vec<Vec<RawValue>> {
    vec![
        vec![7i64.into(), "hello".into(), vec![1u8, 2].into()],
        vec![8i64.into(), "world".into(), Vec::<u8>::new().into()],
        vec!["9".into(), RawValue::Null, vec![255u8].into()],
    ]
}

/// A fake warehouse holding [`sample_rows`] as table `table`.
#[must_use]
pub fn sample_warehouse(table: &str) -> FakeWarehouseIO {
    let warehouse = FakeWarehouseIO::new();
    warehouse.add_table(table, sample_schema(), sample_rows());
    warehouse
}

/// Build a record from `(name, type, value)` triples.
#[must_use]
pub fn record_of(cells: Vec<(&str, &str, RawValue)>) -> Record {
    let (fields, values): (Vec<_>, Vec<_>) = cells
        .into_iter()
        .map(|(name, ty, value)| (FieldSchema::new(name, ty), value))
        .unzip();
    Record::new(Arc::new(TableSchema::new(fields)), values)
}

/// Build a [`Fields`] map from `(name, value)` pairs.
#[must_use]
pub fn fields_of(pairs: Vec<(&str, TaggedValue)>) -> Fields {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

/// Assert that `path` lies in `target`'s output collection and ends in a
/// hyphenated v4 UUID.
///
/// # Panics
///
/// Panics if the prefix differs or the last segment is not a v4 UUID.
pub fn assert_document_path(path: &DocumentPath, target: &DocumentTarget) {
    let prefix = format!("{}/{}/", target.database_root(), target.output_collection());
    assert!(
        path.as_str().starts_with(&prefix),
        "Document path mismatch:\n  Expected prefix: {prefix}\n  Actual: {path}"
    );
    let id = &path.as_str()[prefix.len()..];
    let uuid = Uuid::parse_str(id)
        .unwrap_or_else(|e| panic!("Document id {id:?} is not a UUID: {e}"));
    assert_eq!(uuid.get_version_num(), 4, "Document id {id} is not a v4 UUID");
    assert_eq!(id, uuid.hyphenated().to_string(), "Document id {id} is not hyphenated lowercase");
}
