//! In-memory fakes for tests and local runs.

use crate::document::{DocumentPath, DocumentWrite};
use crate::io::cloud::helpers::table_of_query;
use crate::io::cloud::traits::{
    CloudIOError, CloudResult, DocumentStoreIO, ErrorKind, QueryResult, WarehouseIO, WriteStatus,
};
use crate::record::RawValue;
use crate::schema::TableSchema;
use crate::value::Fields;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// FakeWarehouseIO
// ============================================================================

#[derive(Clone, Default)]
pub struct FakeWarehouseIO {
    tables: Arc<Mutex<HashMap<String, QueryResult>>>,
}

impl FakeWarehouseIO {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table. `SELECT * FROM <name>` then returns every row.
    pub fn add_table(&self, name: &str, schema: TableSchema, rows: Vec<Vec<RawValue>>) {
        lock(&self.tables).insert(
            name.to_string(),
            QueryResult {
                schema: Arc::new(schema),
                rows,
            },
        );
    }
}

impl WarehouseIO for FakeWarehouseIO {
    fn query(&self, sql: &str) -> CloudResult<QueryResult> {
        let table = table_of_query(sql).ok_or_else(|| {
            CloudIOError::new(ErrorKind::InvalidInput, format!("unsupported query: {sql}"))
        })?;
        lock(&self.tables)
            .get(table)
            .cloned()
            .ok_or_else(|| CloudIOError::new(ErrorKind::NotFound, format!("Table {table} not found")))
    }

    fn table_exists(&self, table: &str) -> CloudResult<bool> {
        Ok(lock(&self.tables).contains_key(table))
    }
}

// ============================================================================
// FakeDocumentStore
// ============================================================================

/// Injected failure for upcoming `batch_write` calls.
#[derive(Debug, Clone)]
enum Fault {
    /// Reject the whole batch.
    Batch(ErrorKind),
    /// Fail only the write at this index; the rest apply.
    Write(usize, ErrorKind),
}

#[derive(Clone, Default)]
pub struct FakeDocumentStore {
    documents: Arc<Mutex<BTreeMap<DocumentPath, Fields>>>,
    faults: Arc<Mutex<VecDeque<Fault>>>,
    batch_calls: Arc<AtomicUsize>,
    batch_sizes: Arc<Mutex<Vec<usize>>>,
}

impl FakeDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `times` batches with `kind`.
    pub fn fail_next_batches(&self, times: usize, kind: ErrorKind) {
        lock(&self.faults).extend(std::iter::repeat_n(Fault::Batch(kind), times));
    }

    /// In the next batch, fail only the write at `index` with `kind`.
    pub fn fail_next_write(&self, index: usize, kind: ErrorKind) {
        lock(&self.faults).push_back(Fault::Write(index, kind));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.documents).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.documents).is_empty()
    }

    /// Snapshot of every stored document, ordered by path.
    #[must_use]
    pub fn documents(&self) -> Vec<(DocumentPath, Fields)> {
        lock(&self.documents)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of `batch_write` calls, including rejected ones.
    #[must_use]
    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    /// Size of every batch received, including rejected ones.
    #[must_use]
    pub fn batch_sizes(&self) -> Vec<usize> {
        lock(&self.batch_sizes).clone()
    }
}

impl DocumentStoreIO for FakeDocumentStore {
    fn batch_write(&self, writes: &[DocumentWrite]) -> CloudResult<Vec<WriteStatus>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.batch_sizes).push(writes.len());

        let fault = lock(&self.faults).pop_front();
        if let Some(Fault::Batch(kind)) = fault {
            return Err(CloudIOError::new(kind, "injected batch failure"));
        }

        let mut documents = lock(&self.documents);
        let statuses = writes
            .iter()
            .enumerate()
            .map(|(i, w)| match &fault {
                Some(Fault::Write(idx, kind)) if *idx == i => {
                    Err(CloudIOError::new(*kind, format!("injected failure for {}", w.name)))
                }
                _ => {
                    // Full replace: previous fields are discarded.
                    documents.insert(w.name.clone(), w.fields.clone());
                    Ok(())
                }
            })
            .collect();
        drop(documents);
        Ok(statuses)
    }

    fn get_document(&self, path: &DocumentPath) -> CloudResult<Option<Fields>> {
        Ok(lock(&self.documents).get(path).cloned())
    }

    fn list_documents(&self, collection: &str) -> CloudResult<Vec<DocumentPath>> {
        Ok(lock(&self.documents)
            .keys()
            .filter(|p| p.collection() == collection)
            .cloned()
            .collect())
    }
}
