//! Run configuration.
//!
//! [`ExportOptions`] is resolved once at startup, from flags, a config file
//! (any serde format) or the environment, and is read-only afterwards. The
//! project id falls back to the ambient cloud environment the same way the
//! store's client libraries resolve it.

use crate::document::DocumentTarget;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Database used when none is configured.
pub const DEFAULT_DATABASE_ID: &str = "(default)";

/// Environment variables consulted, in order, for the project id.
pub const PROJECT_ENV_VARS: [&str; 2] = ["GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT"];

fn default_database_id() -> String {
    DEFAULT_DATABASE_ID.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOptions {
    /// SQL executed against the warehouse.
    pub query: String,
    /// Collection root the run writes under.
    pub collection: String,
    /// Path segment scoping this run's documents.
    pub run_id: String,
    #[serde(default = "default_database_id")]
    pub database_id: String,
    /// Resolved from [`PROJECT_ENV_VARS`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl ExportOptions {
    pub fn new(
        query: impl Into<String>,
        collection: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            collection: collection.into(),
            run_id: run_id.into(),
            database_id: default_database_id(),
            project_id: None,
        }
    }

    #[must_use]
    pub fn with_database_id(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = database_id.into();
        self
    }

    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Read `<PREFIX>_QUERY`, `<PREFIX>_COLLECTION`, `<PREFIX>_RUN_ID`,
    /// `<PREFIX>_DATABASE_ID` and `<PREFIX>_PROJECT_ID` from the process environment.
    ///
    /// # Errors
    ///
    /// Fails when one of the first three is unset.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(prefix, |key| std::env::var(key).ok())
    }

    /// [`from_env`](Self::from_env) against an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Fails when a required key is missing.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = |name: &str| format!("{prefix}_{name}");
        let required = |name: &str| {
            let k = key(name);
            lookup(&k).ok_or(ConfigError::Missing(k))
        };

        Ok(Self {
            query: required("QUERY")?,
            collection: required("COLLECTION")?,
            run_id: required("RUN_ID")?,
            database_id: lookup(&key("DATABASE_ID")).unwrap_or_else(default_database_id),
            project_id: lookup(&key("PROJECT_ID")),
        })
    }

    /// Reject options that cannot produce a valid run.
    ///
    /// # Errors
    ///
    /// Fails on an empty query, collection, run id or database id, or a run id
    /// containing `/`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("query", &self.query),
            ("collection", &self.collection),
            ("run id", &self.run_id),
            ("database id", &self.database_id),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name.to_string()));
            }
        }
        if self.run_id.contains('/') {
            return Err(ConfigError::InvalidRunId(self.run_id.clone()));
        }
        Ok(())
    }

    /// Explicit project id, else the first non-empty variable of [`PROJECT_ENV_VARS`].
    ///
    /// # Errors
    ///
    /// Fails when neither source yields a project id.
    pub fn resolve_project_id<F>(&self, lookup: F) -> Result<String, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(project) = self.project_id.as_ref().filter(|p| !p.is_empty()) {
            return Ok(project.clone());
        }
        PROJECT_ENV_VARS
            .iter()
            .find_map(|var| lookup(var).filter(|v| !v.is_empty()))
            .ok_or_else(|| ConfigError::ProjectUnresolved {
                vars: PROJECT_ENV_VARS.join(", "),
            })
    }

    /// Validate and resolve into the assembler's target, using the process environment.
    ///
    /// # Errors
    ///
    /// See [`validate`](Self::validate), [`resolve_project_id`](Self::resolve_project_id)
    /// and [`DocumentTarget::validate`].
    pub fn document_target(&self) -> Result<DocumentTarget, ConfigError> {
        self.document_target_with(|key| std::env::var(key).ok())
    }

    /// [`document_target`](Self::document_target) against an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`document_target`](Self::document_target).
    pub fn document_target_with<F>(&self, lookup: F) -> Result<DocumentTarget, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.validate()?;
        let target = DocumentTarget::new(
            self.resolve_project_id(lookup)?,
            self.database_id.clone(),
            self.collection.clone(),
            self.run_id.clone(),
        );
        target.validate()?;
        Ok(target)
    }
}
