//! JSON Lines (JSONL) stand-in backends for local runs.
//!
//! - [`JsonlWarehouse`]: a directory of tables. Table `t` is `t.schema.json`
//!   (a JSON array of field schemas) plus `t.jsonl` (one JSON array of
//!   positional cell values per line).
//! - [`JsonlDocumentStore`]: appends every applied write to one JSONL file as
//!   `{"name": ..., "fields": {...}}`. Later lines for the same name replace
//!   earlier ones on read.
//!
//! # Notes
//! - Empty/whitespace-only lines are skipped on read.
//! - Only `SELECT * FROM <table>` style queries are understood.

use crate::document::{DocumentPath, DocumentWrite};
use crate::io::cloud::helpers::table_of_query;
use crate::io::cloud::traits::{
    CloudIOError, CloudResult, DocumentStoreIO, ErrorKind, QueryResult, WarehouseIO, WriteStatus,
};
use crate::record::RawValue;
use crate::schema::TableSchema;
use crate::value::Fields;
use anyhow::{Context, Result, bail};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Read a JSONL file into a typed `Vec<T>`.
///
/// # Errors
/// Returns an error if the file cannot be opened or read, or if any line fails
/// to parse into `T`. Errors include the line number.
pub fn read_jsonl_vec<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Vec<T>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut out = Vec::<T>::new();
    for (i, line) in BufReader::new(f).lines().enumerate() {
        let line = line.with_context(|| format!("read line {} in {}", i + 1, path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let v: T = serde_json::from_str(&line).with_context(|| {
            format!("parse JSONL line {} in {}: {}", i + 1, path.display(), line)
        })?;
        out.push(v);
    }
    Ok(out)
}

fn io_error(kind: ErrorKind, err: &anyhow::Error) -> CloudIOError {
    CloudIOError::new(kind, format!("{err:#}"))
}

// ============================================================================
// JsonlWarehouse
// ============================================================================

#[derive(Debug, Clone)]
pub struct JsonlWarehouse {
    dir: PathBuf,
}

impl JsonlWarehouse {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn schema_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.schema.json"))
    }

    fn rows_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.jsonl"))
    }

    /// Write `schema` and `rows` as table `table`, replacing any existing one.
    ///
    /// # Errors
    /// Fails when the directory or files cannot be written.
    pub fn write_table(&self, table: &str, schema: &TableSchema, rows: &[Vec<RawValue>]) -> Result<()> {
        create_dir_all(&self.dir).with_context(|| format!("mkdir -p {}", self.dir.display()))?;
        let schema_path = self.schema_path(table);
        let json = serde_json::to_string_pretty(schema)?;
        std::fs::write(&schema_path, json)
            .with_context(|| format!("write {}", schema_path.display()))?;

        let rows_path = self.rows_path(table);
        let f = File::create(&rows_path).with_context(|| format!("create {}", rows_path.display()))?;
        let mut w = BufWriter::new(f);
        for (i, row) in rows.iter().enumerate() {
            let cells: Vec<Value> = row.iter().map(RawValue::to_json).collect();
            serde_json::to_writer(&mut w, &cells)
                .with_context(|| format!("serialize row {i} to {}", rows_path.display()))?;
            w.write_all(b"\n")?;
        }
        w.flush()?;
        Ok(())
    }

    /// Load table `table`: its schema and every row, typed by the schema.
    ///
    /// # Errors
    /// Fails when a file is missing or malformed, or a row's length differs
    /// from the schema's.
    pub fn load_table(&self, table: &str) -> Result<QueryResult> {
        let schema_path = self.schema_path(table);
        let text = std::fs::read_to_string(&schema_path)
            .with_context(|| format!("open {}", schema_path.display()))?;
        let schema: TableSchema = serde_json::from_str(&text)
            .with_context(|| format!("parse schema {}", schema_path.display()))?;

        let rows_path = self.rows_path(table);
        let raw_rows: Vec<Vec<Value>> = read_jsonl_vec(&rows_path)?;
        let mut rows = Vec::with_capacity(raw_rows.len());
        for (i, cells) in raw_rows.into_iter().enumerate() {
            if cells.len() != schema.len() {
                bail!(
                    "row {} in {} has {} cells, schema has {} fields",
                    i + 1,
                    rows_path.display(),
                    cells.len(),
                    schema.len()
                );
            }
            rows.push(
                schema
                    .fields()
                    .iter()
                    .zip(&cells)
                    .map(|(field, cell)| RawValue::from_json(field, cell))
                    .collect(),
            );
        }
        Ok(QueryResult {
            schema: Arc::new(schema),
            rows,
        })
    }
}

impl WarehouseIO for JsonlWarehouse {
    fn query(&self, sql: &str) -> CloudResult<QueryResult> {
        let table = table_of_query(sql).ok_or_else(|| {
            CloudIOError::new(ErrorKind::InvalidInput, format!("unsupported query: {sql}"))
        })?;
        if !self.table_exists(table)? {
            return Err(CloudIOError::new(
                ErrorKind::NotFound,
                format!("Table {table} not found in {}", self.dir.display()),
            ));
        }
        self.load_table(table)
            .map_err(|e| io_error(ErrorKind::InvalidInput, &e))
    }

    fn table_exists(&self, table: &str) -> CloudResult<bool> {
        Ok(self.schema_path(table).is_file() && self.rows_path(table).is_file())
    }
}

// ============================================================================
// JsonlDocumentStore
// ============================================================================

#[derive(Debug, Clone)]
pub struct JsonlDocumentStore {
    path: PathBuf,
    // Serializes appends from concurrent batches.
    write_lock: Arc<Mutex<()>>,
}

impl JsonlDocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, writes: &[DocumentWrite]) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
        }
        let f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open {}", self.path.display()))?;
        let mut w = BufWriter::new(f);
        for write in writes {
            serde_json::to_writer(&mut w, write)
                .with_context(|| format!("serialize {}", write.name))?;
            w.write_all(b"\n")?;
        }
        w.flush()
            .with_context(|| format!("flush {}", self.path.display()))?;
        Ok(())
    }

    /// Current state of every document, last write per name winning.
    ///
    /// # Errors
    /// Fails when the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<BTreeMap<DocumentPath, Fields>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let writes: Vec<DocumentWrite> = read_jsonl_vec(&self.path)?;
        Ok(writes.into_iter().map(|w| (w.name, w.fields)).collect())
    }
}

impl DocumentStoreIO for JsonlDocumentStore {
    fn batch_write(&self, writes: &[DocumentWrite]) -> CloudResult<Vec<WriteStatus>> {
        self.append(writes)
            .map_err(|e| io_error(ErrorKind::Other, &e))?;
        Ok(vec![Ok(()); writes.len()])
    }

    fn get_document(&self, path: &DocumentPath) -> CloudResult<Option<Fields>> {
        let mut docs = self.load().map_err(|e| io_error(ErrorKind::Other, &e))?;
        Ok(docs.remove(path))
    }

    fn list_documents(&self, collection: &str) -> CloudResult<Vec<DocumentPath>> {
        let docs = self.load().map_err(|e| io_error(ErrorKind::Other, &e))?;
        Ok(docs
            .into_keys()
            .filter(|p| p.collection() == collection)
            .collect())
    }
}
