//! Document paths and write intents.
//!
//! Every converted record becomes one document at
//! `projects/<project>/databases/<database>/documents/<collection>/<run-id>/output/<id>`,
//! where `<id>` is a fresh random UUID. Paths are never reused, so a record
//! delivered twice produces two documents.

use crate::error::AssembleError;
use crate::value::Fields;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Sub-collection under `<collection>/<run-id>` that receives the documents.
pub const OUTPUT_SEGMENT: &str = "output";

/// Where a run writes its documents. Read-only for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentTarget {
    pub project_id: String,
    pub database_id: String,
    /// Collection root; may itself be a nested path such as `tenants/t1/exports`.
    pub collection: String,
    pub run_id: String,
}

impl DocumentTarget {
    pub fn new(
        project_id: impl Into<String>,
        database_id: impl Into<String>,
        collection: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: database_id.into(),
            collection: collection.into(),
            run_id: run_id.into(),
        }
    }

    /// Check that every path component is usable.
    ///
    /// The run id's character set is not checked here.
    ///
    /// # Errors
    ///
    /// Returns the first empty or malformed component.
    pub fn validate(&self) -> Result<(), AssembleError> {
        for (segment, value) in [
            ("project id", &self.project_id),
            ("database id", &self.database_id),
            ("collection", &self.collection),
            ("run id", &self.run_id),
        ] {
            if value.is_empty() {
                return Err(AssembleError::EmptySegment { segment });
            }
        }
        let depth = self.collection.split('/').count();
        if self.collection.split('/').any(str::is_empty) {
            return Err(AssembleError::MalformedCollection {
                path: self.collection.clone(),
            });
        }
        if depth % 2 == 0 {
            return Err(AssembleError::CollectionDepth {
                path: self.collection.clone(),
                depth,
            });
        }
        Ok(())
    }

    /// `projects/<project>/databases/<database>/documents`
    #[must_use]
    pub fn database_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database_id
        )
    }

    /// `<collection>/<run-id>/output`, relative to the database root.
    #[must_use]
    pub fn output_collection(&self) -> String {
        format!("{}/{}/{OUTPUT_SEGMENT}", self.collection, self.run_id)
    }
}

/// Fully qualified document name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentPath(String);

impl DocumentPath {
    /// Build the path of document `document_id` in the target's output collection.
    ///
    /// # Errors
    ///
    /// Fails when the target is invalid or `document_id` is empty or contains `/`.
    pub fn new(target: &DocumentTarget, document_id: &str) -> Result<Self, AssembleError> {
        target.validate()?;
        if document_id.is_empty() || document_id.contains('/') {
            return Err(AssembleError::InvalidDocumentId {
                id: document_id.to_string(),
            });
        }
        Ok(Self(format!(
            "{}/{}/{document_id}",
            target.database_root(),
            target.output_collection()
        )))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment.
    #[must_use]
    pub fn document_id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Path below `.../documents/`.
    #[must_use]
    pub fn relative(&self) -> &str {
        self.0
            .split_once("/documents/")
            .map_or(self.0.as_str(), |(_, rel)| rel)
    }

    /// Parent collection path below `.../documents/`.
    #[must_use]
    pub fn collection(&self) -> &str {
        let rel = self.relative();
        rel.rsplit_once('/').map_or(rel, |(parent, _)| parent)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Create-or-replace of a whole document: afterwards it holds exactly `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentWrite {
    pub name: DocumentPath,
    pub fields: Fields,
}

impl DocumentWrite {
    #[must_use]
    pub fn update(name: DocumentPath, fields: Fields) -> Self {
        Self { name, fields }
    }
}

/// Fresh document id: a random (v4) UUID, hyphenated.
#[must_use]
pub fn new_document_id() -> String {
    Uuid::new_v4().to_string()
}

/// Turns converted records into write intents for one target.
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    target: DocumentTarget,
}

impl DocumentAssembler {
    #[must_use]
    pub fn new(target: DocumentTarget) -> Self {
        Self { target }
    }

    #[must_use]
    pub fn target(&self) -> &DocumentTarget {
        &self.target
    }

    /// A new, unique path in the target's output collection.
    ///
    /// # Errors
    ///
    /// See [`DocumentPath::new`].
    pub fn next_path(&self) -> Result<DocumentPath, AssembleError> {
        DocumentPath::new(&self.target, &new_document_id())
    }

    /// Wrap `fields` in a write intent at a fresh path.
    ///
    /// # Errors
    ///
    /// Fails when the path cannot be built; `fields` is dropped.
    pub fn assemble(&self, fields: Fields) -> Result<DocumentWrite, AssembleError> {
        Ok(DocumentWrite::update(self.next_path()?, fields))
    }
}
