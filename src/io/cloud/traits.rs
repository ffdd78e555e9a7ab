//! Collaborator traits for the warehouse and the document store.
//!
//! Both are synchronous. Implementations backed by async SDKs block internally.

use crate::document::{DocumentPath, DocumentWrite};
use crate::record::{RawValue, Record};
use crate::schema::TableSchema;
use crate::value::Fields;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Core Error Type
// ============================================================================

/// Error reported by a cloud collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudIOError {
    pub message: String,
    pub kind: ErrorKind,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Authentication,
    Authorization,
    NotFound,
    InvalidInput,
    Network,
    Timeout,
    ServiceUnavailable,
    RateLimited,
    Aborted,
    InternalError,
    Other,
}

impl ErrorKind {
    /// Transient kinds worth retrying.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::Network | Self::Timeout | Self::ServiceUnavailable | Self::RateLimited | Self::Aborted
        )
    }
}

impl fmt::Display for CloudIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)?;
        if let Some(source) = &self.source {
            write!(f, " ({source})")?;
        }
        Ok(())
    }
}

impl Error for CloudIOError {}

impl CloudIOError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

pub type CloudResult<T> = Result<T, CloudIOError>;

// ============================================================================
// WarehouseIO - Analytical Databases
// ============================================================================

/// Result set of a warehouse query: one schema shared by every row.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub schema: Arc<TableSchema>,
    pub rows: Vec<Vec<RawValue>>,
}

impl QueryResult {
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Pair every row with the shared schema.
    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        let schema = self.schema;
        self.rows
            .into_iter()
            .map(|values| Record::new(Arc::clone(&schema), values))
            .collect()
    }
}

/// Analytical warehouse the records are read from.
pub trait WarehouseIO: Send + Sync {
    /// Execute a standard-SQL query and return its full result set.
    ///
    /// # Errors
    ///
    /// Returns an error if the query is invalid, execution fails, or there's a connection issue
    fn query(&self, sql: &str) -> CloudResult<QueryResult>;

    /// Check if a table exists
    ///
    /// # Errors
    ///
    /// Returns an error if there's a connection issue or insufficient permissions
    fn table_exists(&self, table: &str) -> CloudResult<bool>;
}

// ============================================================================
// DocumentStoreIO - Hierarchical Document Stores
// ============================================================================

/// Outcome of one write inside a batch, in request order.
pub type WriteStatus = CloudResult<()>;

/// Hierarchical document store the documents are written to.
pub trait DocumentStoreIO: Send + Sync {
    /// Apply a batch of full-document writes. Writes are independent: one may
    /// fail while the others apply.
    ///
    /// # Errors
    ///
    /// Returns an error when the whole batch is rejected; per-write failures are
    /// reported in the returned statuses instead.
    fn batch_write(&self, writes: &[DocumentWrite]) -> CloudResult<Vec<WriteStatus>>;

    /// Read a document's fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached
    fn get_document(&self, path: &DocumentPath) -> CloudResult<Option<Fields>>;

    /// Names of the documents directly inside `collection`, a path relative to
    /// the database root such as `exports/run-42/output`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached
    fn list_documents(&self, collection: &str) -> CloudResult<Vec<DocumentPath>>;
}
