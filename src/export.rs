//! The export driver: query rows in, one document per row out.
//!
//! ```text
//! warehouse query ─► Record ─► convert ─► assemble ─► DocumentWrite ─► sink
//!                                  │           │
//!                                  └───────────┴─► DroppedRecord (diagnostics)
//! ```
//!
//! Conversion and assembly run as one fused stateless stage under the chosen
//! [`Runner`]. A record that fails either step is logged and skipped; store,
//! warehouse and configuration errors abort the run.

use crate::collection::PCollection;
use crate::config::ExportOptions;
use crate::convert::convert_record;
use crate::diagnostics::{DiagnosticsCollector, DroppedRecord};
use crate::document::{DocumentAssembler, DocumentTarget, DocumentWrite};
use crate::io::cloud::traits::{DocumentStoreIO, WarehouseIO};
use crate::pipeline::Pipeline;
use crate::record::Record;
use crate::runner::Runner;
use crate::sink::{DocumentSink, WriteQos};
use crate::source::read_query;
use anyhow::{Context, Result};
use std::fmt;
use tracing::info;

/// Outcome of a completed run.
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub records_read: usize,
    pub documents_written: usize,
    pub batches: usize,
    pub retries: usize,
    pub diagnostics: DiagnosticsCollector,
}

impl ExportReport {
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.diagnostics.dropped_count()
    }

    /// Dropped records as a pretty JSON array.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn diagnostics_json(&self) -> Result<String> {
        Ok(self.diagnostics.to_json()?)
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read {} records, wrote {} documents in {} batches ({} retries), dropped {}",
            self.records_read,
            self.documents_written,
            self.batches,
            self.retries,
            self.dropped()
        )
    }
}

/// Convert one record and give it a fresh document path.
///
/// # Errors
///
/// Returns the dropped record, carrying its content and the failure.
pub fn record_to_write(assembler: &DocumentAssembler, record: &Record) -> Result<DocumentWrite, DroppedRecord> {
    let fields = convert_record(record).map_err(|e| DroppedRecord::conversion(record, e))?;
    let name = assembler
        .next_path()
        .map_err(|e| DroppedRecord::assembly(&fields, e))?;
    Ok(DocumentWrite::update(name, fields))
}

/// Attach the convert-and-assemble stage to a collection of records.
pub fn to_writes(
    records: PCollection<Record>,
    target: DocumentTarget,
) -> PCollection<Result<DocumentWrite, DroppedRecord>> {
    let assembler = DocumentAssembler::new(target);
    records.try_map(move |record: &Record| record_to_write(&assembler, record))
}

/// Run one export end to end.
///
/// # Errors
///
/// Fails on invalid options or write settings, an unresolvable project id, a
/// failed query, or a store write that cannot be completed.
pub fn run_export<W, S>(
    options: &ExportOptions,
    warehouse: &W,
    store: &S,
    qos: &WriteQos,
    runner: &Runner,
) -> Result<ExportReport>
where
    W: WarehouseIO + ?Sized,
    S: DocumentStoreIO + ?Sized,
{
    let target = options
        .document_target()
        .context("resolve export configuration")?;
    let mut sink = DocumentSink::new(store, *qos).context("configure document sink")?;
    info!(
        collection = %target.output_collection(),
        database = %target.database_id,
        project = %target.project_id,
        mode = ?runner.mode,
        "starting export"
    );

    let p = Pipeline::default();
    let records = read_query(&p, warehouse, &options.query)?;
    let (writes, dropped) = to_writes(records, target)
        .collect_split(runner)
        .context("convert records")?;

    let mut report = ExportReport {
        records_read: writes.len() + dropped.len(),
        ..ExportReport::default()
    };
    for d in dropped {
        report.diagnostics.record(d);
    }

    let written = sink.write_all(&writes).context("write documents")?;
    report.documents_written = written.documents_written;
    report.batches = written.batches;
    report.retries = written.retries;

    info!(
        records = report.records_read,
        written = report.documents_written,
        dropped = report.dropped(),
        batches = report.batches,
        retries = report.retries,
        "export finished"
    );
    Ok(report)
}
