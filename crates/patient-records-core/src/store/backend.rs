//! Persistence backends for the whole store document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use super::json_file::JsonFileBackend;
use super::sqlite::SqliteBackend;
use super::{StorageError, StorageResult};

/// The whole store document: patient id → stored fields, in insertion order.
pub type Document = Map<String, Value>;

/// Loads and saves the whole document.
///
/// `save` must either persist the new document completely or leave the
/// previous one in place.
pub trait DocumentBackend {
    fn load(&self) -> StorageResult<Document>;

    fn save(&self, document: &Document) -> StorageResult<()>;

    /// Whether a document has been persisted yet.
    fn exists(&self) -> StorageResult<bool>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Which backend a deployment stores its document in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Json,
    Sqlite,
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(BackendKind::Json),
            "sqlite" => Ok(BackendKind::Sqlite),
            other => Err(format!("unknown backend '{}' (expected json or sqlite)", other)),
        }
    }
}

/// Backend chosen at runtime from configuration.
pub enum AnyBackend {
    Json(JsonFileBackend),
    Sqlite(SqliteBackend),
}

impl AnyBackend {
    pub fn open<P: AsRef<Path>>(kind: BackendKind, path: P) -> StorageResult<Self> {
        match kind {
            BackendKind::Json => Ok(AnyBackend::Json(JsonFileBackend::new(path))),
            BackendKind::Sqlite => Ok(AnyBackend::Sqlite(SqliteBackend::open(path)?)),
        }
    }
}

impl DocumentBackend for AnyBackend {
    fn load(&self) -> StorageResult<Document> {
        match self {
            AnyBackend::Json(b) => b.load(),
            AnyBackend::Sqlite(b) => b.load(),
        }
    }

    fn save(&self, document: &Document) -> StorageResult<()> {
        match self {
            AnyBackend::Json(b) => b.save(document),
            AnyBackend::Sqlite(b) => b.save(document),
        }
    }

    fn exists(&self) -> StorageResult<bool> {
        match self {
            AnyBackend::Json(b) => b.exists(),
            AnyBackend::Sqlite(b) => b.exists(),
        }
    }

    fn describe(&self) -> String {
        match self {
            AnyBackend::Json(b) => b.describe(),
            AnyBackend::Sqlite(b) => b.describe(),
        }
    }
}

/// Parse document text, requiring a top-level object.
pub(crate) fn parse_document(text: &str) -> StorageResult<Document> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(_) => Err(StorageError::Corrupt(
            "top-level value must be an object keyed by patient id".into(),
        )),
        Err(e) => Err(StorageError::Corrupt(e.to_string())),
    }
}
