//! Error types for record conversion, document assembly and configuration.
//!
//! Record-level errors are `Clone` so they can travel through a pipeline as
//! element values.

use thiserror::Error;

/// Failure converting one record into document fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// Numeric text that does not parse as the declared type.
    #[error("field `{field}`: cannot parse {text:?} as {target}: {reason}")]
    Parse {
        field: String,
        target: &'static str,
        text: String,
        reason: String,
    },

    /// A raw value whose representation cannot be read as the declared type.
    #[error("field `{field}`: expected {expected}, found {found}")]
    Cast {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("record has {found} values but its schema declares {expected} fields")]
    Arity { expected: usize, found: usize },
}

/// Failure building a document path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssembleError {
    #[error("{segment} must not be empty")]
    EmptySegment { segment: &'static str },

    #[error("collection path {path:?} contains an empty segment")]
    MalformedCollection { path: String },

    #[error("document id {id:?} is empty or contains '/'")]
    InvalidDocumentId { id: String },

    /// Documents live at even depths; `collection/run/output/id` needs an odd collection depth.
    #[error("collection path {path:?} has {depth} segments; document paths need an odd collection depth")]
    CollectionDepth { path: String, depth: usize },
}

/// Either per-record failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("conversion failed: {0}")]
    Convert(#[from] ConvertError),

    #[error("path construction failed: {0}")]
    Assemble(#[from] AssembleError),
}

/// Invalid or unresolvable run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required option `{0}`")]
    Missing(String),

    #[error("run id {0:?} must not contain '/'")]
    InvalidRunId(String),

    #[error("project id is not set and none of {vars} is defined")]
    ProjectUnresolved { vars: String },

    #[error("invalid document target: {0}")]
    Target(#[from] AssembleError),

    #[error("invalid write settings: {0}")]
    Qos(String),
}
