//! # rowdoc
//!
//! Export the rows of an analytical warehouse query as documents in a
//! hierarchical document store, one document per row.
//!
//! Each record is converted field by field according to its declared column
//! type, given a fresh random document id, and written under
//! `<collection>/<run-id>/output/` of the target database. A record that cannot
//! be converted is logged and skipped; the rest of the run continues.
//!
//! ## Quick Start
//!
//! ```
//! use rowdoc::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let warehouse = FakeWarehouseIO::new();
//! warehouse.add_table(
//!     "events",
//!     TableSchema::new(vec![
//!         FieldSchema::new("id", "INTEGER"),
//!         FieldSchema::new("label", "STRING"),
//!     ]),
//!     vec![vec![7i64.into(), "hello".into()]],
//! );
//! let store = FakeDocumentStore::new();
//!
//! let options = ExportOptions::new("SELECT * FROM events", "exports", "run-42")
//!     .with_project_id("proj");
//! let report = run_export(&options, &warehouse, &store, &WriteQos::default(), &Runner::default())?;
//!
//! assert_eq!(report.documents_written, 1);
//! assert_eq!(store.list_documents("exports/run-42/output")?.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Conversion
//!
//! [`convert_record`] maps a [`Record`] to [`Fields`] using the declared
//! [`FieldType`] of each column. `STRING`, `BYTES`, `INTEGER`/`INT64` and
//! `FLOAT`/`FLOAT64` get their own [`TaggedValue`]; every other type, known or
//! not, is written as its plain text.
//!
//! ### Assembly
//!
//! A [`DocumentAssembler`] bound to one [`DocumentTarget`] wraps converted
//! fields in a [`DocumentWrite`] at a new [`DocumentPath`].
//!
//! ### Execution
//!
//! [`run_export`] builds a deferred [`Pipeline`]: a [`PCollection`] of records
//! from [`read_query`], one fused convert-and-assemble stage, then the
//! [`DocumentSink`]. The stage runs sequentially or on rayon workers depending
//! on the [`Runner`]'s [`ExecMode`].
//!
//! ## Feature Flags
//!
//! - `io-jsonl` - JSONL-backed local warehouse and document store
//! - `cli` - the `rowdoc` command-line runner

pub mod collection;
pub mod config;
pub mod convert;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod export;
pub mod io;
pub mod node;
pub mod pipeline;
pub mod record;
pub mod runner;
pub mod schema;
pub mod sink;
pub mod source;
pub mod testing;
pub mod value;

// General re-exports
pub use collection::{PCollection, RFBound, from_vec};
pub use config::{DEFAULT_DATABASE_ID, ExportOptions, PROJECT_ENV_VARS};
pub use convert::{convert_record, convert_value};
pub use diagnostics::{DiagnosticsCollector, DroppedRecord, Stage};
pub use document::{
    DocumentAssembler, DocumentPath, DocumentTarget, DocumentWrite, OUTPUT_SEGMENT, new_document_id,
};
pub use error::{AssembleError, ConfigError, ConvertError, RecordError};
pub use export::{ExportReport, record_to_write, run_export, to_writes};
pub use io::cloud::helpers::RetryConfig;
pub use io::cloud::{
    CloudIOError, CloudResult, DocumentStoreIO, ErrorKind, FakeDocumentStore, FakeWarehouseIO,
    QueryResult, WarehouseIO,
};
pub use node::Partition;
pub use pipeline::{NodeId, Pipeline};
pub use record::{RawValue, Record};
pub use runner::{ExecMode, Runner};
pub use schema::{FieldSchema, FieldType, TableSchema};
pub use sink::{DocumentSink, MAX_BATCH_SIZE, SinkReport, WriteQos};
pub use source::{read_query, read_query_with};
pub use value::{Fields, TaggedValue, Timestamp};

// Gated re-exports
#[cfg(feature = "io-jsonl")]
pub use io::jsonl::{JsonlDocumentStore, JsonlWarehouse, read_jsonl_vec};
