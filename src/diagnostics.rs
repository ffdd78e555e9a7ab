//! Dropped-record reporting.
//!
//! A record that fails conversion or path construction is dropped and the run
//! continues. Each drop becomes a [`DroppedRecord`] carrying the offending
//! content and the error text; the export driver logs it and accumulates it in
//! a [`DiagnosticsCollector`] so callers needing strict correctness can audit
//! the run afterwards.

use crate::error::{AssembleError, ConvertError, RecordError};
use crate::record::Record;
use crate::value::Fields;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::{fmt, io};
use tracing::error;

/// Stage at which a record was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Convert,
    Assemble,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Convert => "convert",
            Self::Assemble => "assemble",
        })
    }
}

/// One dropped record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedRecord {
    pub stage: Stage,
    /// JSON rendering of the raw record or converted document.
    pub content: String,
    pub error: String,
    #[serde(skip)]
    pub cause: Option<RecordError>,
}

impl DroppedRecord {
    #[must_use]
    pub fn conversion(record: &Record, err: ConvertError) -> Self {
        Self {
            stage: Stage::Convert,
            content: record.to_json().to_string(),
            error: err.to_string(),
            cause: Some(err.into()),
        }
    }

    #[must_use]
    pub fn assembly(fields: &Fields, err: AssembleError) -> Self {
        Self {
            stage: Stage::Assemble,
            content: serde_json::to_string(fields).unwrap_or_else(|e| format!("<unrenderable: {e}>")),
            error: err.to_string(),
            cause: Some(err.into()),
        }
    }
}

impl fmt::Display for DroppedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed for {}: {}", self.stage, self.content, self.error)
    }
}

/// Accumulates dropped records for one run.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticsCollector {
    dropped: Vec<DroppedRecord>,
}

impl DiagnosticsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `dropped` at error level and keep it.
    pub fn record(&mut self, dropped: DroppedRecord) {
        error!(
            stage = %dropped.stage,
            record = %dropped.content,
            error = %dropped.error,
            "dropping record"
        );
        self.dropped.push(dropped);
    }

    #[must_use]
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dropped.is_empty()
    }

    #[must_use]
    pub fn dropped(&self) -> &[DroppedRecord] {
        &self.dropped
    }

    /// Drops counted per stage.
    #[must_use]
    pub fn count_by_stage(&self, stage: Stage) -> usize {
        self.dropped.iter().filter(|d| d.stage == stage).count()
    }

    /// Pretty JSON array of every dropped record.
    ///
    /// # Errors
    ///
    /// Propagates serializer failures.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.dropped)
    }

    /// Write [`to_json`](Self::to_json) to `path`.
    ///
    /// # Errors
    ///
    /// Fails when serialization or the write fails.
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let json = self.to_json().map_err(io::Error::other)?;
        std::fs::write(path, json)
    }
}

impl fmt::Display for DiagnosticsCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DiagnosticsCollector({} dropped)", self.dropped_count())
    }
}
