//! Whole-document record store.
//!
//! Every operation loads the entire document, works on it in memory and,
//! for writes, saves the entire document back. There is no locking across
//! load and save: two writers racing on the same backend resolve as
//! last-writer-wins.

mod backend;
mod json_file;
mod sort;
mod sqlite;

pub use backend::*;
pub use json_file::*;
pub use sort::*;
pub use sqlite::*;

use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::{PatientRecord, SchemaRules, ValidationError, DERIVED_FIELDS};

/// Failures of the persistence layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No document found at {0}")]
    Missing(String),

    #[error("Corrupt document: {0}")]
    Corrupt(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Stored record {id} is invalid: {source}")]
    InvalidRecord {
        id: String,
        #[source]
        source: ValidationError,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Store operation errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("Patient already exists: {0}")]
    Conflict(String),

    #[error("Invalid sort field '{0}', select from {valid}", valid = SortField::valid_names())]
    InvalidSortField(String),

    #[error("Invalid order '{0}', select from asc or desc")]
    InvalidSortOrder(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A stored entry that no longer passes validation.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditFinding {
    pub id: String,
    pub error: ValidationError,
}

impl From<AuditFinding> for StorageError {
    fn from(finding: AuditFinding) -> Self {
        StorageError::InvalidRecord {
            id: finding.id,
            source: finding.error,
        }
    }
}

/// Patient records kept in a single document.
pub struct RecordStore<B: DocumentBackend> {
    backend: B,
    rules: SchemaRules,
}

impl<B: DocumentBackend> RecordStore<B> {
    pub fn new(backend: B, rules: SchemaRules) -> Self {
        Self { backend, rules }
    }

    pub fn rules(&self) -> &SchemaRules {
        &self.rules
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Create an empty document if none exists. Returns whether one was created.
    pub fn init(&self) -> StoreResult<bool> {
        if self.backend.exists()? {
            return Ok(false);
        }
        self.backend.save(&Document::new())?;
        info!(location = %self.backend.describe(), "Initialized empty patient document");
        Ok(true)
    }

    /// Read the whole document.
    pub fn load(&self) -> StoreResult<Document> {
        let document = self.backend.load()?;
        debug!(records = document.len(), "Loaded patient document");
        Ok(document)
    }

    /// Replace the whole document.
    pub fn save(&self, document: &Document) -> StoreResult<()> {
        self.backend.save(document)?;
        debug!(records = document.len(), "Saved patient document");
        Ok(())
    }

    /// Fetch and validate one record.
    pub fn get(&self, id: &str) -> StoreResult<PatientRecord> {
        let document = self.load()?;
        let fields = document
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        Ok(self.read_entry(id, fields).map_err(StorageError::from)?)
    }

    /// All records sorted by `sort_by`, in `order` (`asc` or `desc`).
    ///
    /// Both arguments are checked before the document is read.
    pub fn list(&self, sort_by: &str, order: &str) -> StoreResult<Vec<PatientRecord>> {
        let field: SortField = sort_by
            .parse()
            .map_err(|_| StoreError::InvalidSortField(sort_by.to_string()))?;
        let order: SortOrder = order
            .parse()
            .map_err(|_| StoreError::InvalidSortOrder(order.to_string()))?;

        let document = self.load()?;
        let mut records = document
            .iter()
            .map(|(id, fields)| self.read_entry(id, fields))
            .collect::<Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;

        sort_records(&mut records, field, order);
        Ok(records)
    }

    /// Insert a new record.
    pub fn create(&self, record: &PatientRecord) -> StoreResult<()> {
        let mut document = self.load()?;
        if document.contains_key(record.id()) {
            return Err(StoreError::Conflict(record.id().to_string()));
        }

        document.insert(record.id().to_string(), Value::Object(record.to_stored()));
        self.save(&document)?;
        info!(id = record.id(), "Created patient");
        Ok(())
    }

    /// Validate raw input and insert it.
    pub fn create_from_raw(&self, raw: &Map<String, Value>) -> StoreResult<PatientRecord> {
        let record = PatientRecord::parse(raw, &self.rules)?;
        self.create(&record)?;
        Ok(record)
    }

    /// Overlay `partial` onto the stored fields and re-validate the result.
    ///
    /// Fields absent from `partial` keep their stored values. `id` and the
    /// derived fields are ignored if present.
    pub fn update(&self, id: &str, partial: &Map<String, Value>) -> StoreResult<PatientRecord> {
        let mut document = self.load()?;
        let existing = document
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        let mut merged = match existing {
            Value::Object(fields) => fields.clone(),
            _ => Map::new(),
        };
        for (key, value) in partial {
            if key == "id" || DERIVED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            merged.insert(key.clone(), value.clone());
        }

        let record = PatientRecord::from_stored(id, &merged, &self.rules)?;
        document.insert(id.to_string(), Value::Object(record.to_stored()));
        self.save(&document)?;
        info!(id, fields = partial.len(), "Updated patient");
        Ok(record)
    }

    /// Remove a record.
    pub fn delete(&self, id: &str) -> StoreResult<()> {
        let mut document = self.load()?;
        if document.shift_remove(id).is_none() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.save(&document)?;
        info!(id, "Deleted patient");
        Ok(())
    }

    /// Validate every stored entry and report the ones that fail.
    pub fn audit(&self) -> StoreResult<Vec<AuditFinding>> {
        let document = self.load()?;
        let findings: Vec<_> = document
            .iter()
            .filter_map(|(id, fields)| self.read_entry(id, fields).err())
            .collect();

        for finding in &findings {
            warn!(id = %finding.id, error = %finding.error, "Stored patient fails validation");
        }
        Ok(findings)
    }

    fn read_entry(&self, id: &str, fields: &Value) -> Result<PatientRecord, AuditFinding> {
        let finding = |error| AuditFinding {
            id: id.to_string(),
            error,
        };
        let fields = fields.as_object().ok_or_else(|| {
            finding(ValidationError::single("id", "stored entry is not an object"))
        })?;
        PatientRecord::from_stored(id, fields, &self.rules).map_err(finding)
    }
}
