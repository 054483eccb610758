//! JSON file backend.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::backend::{parse_document, Document, DocumentBackend};
use super::{StorageError, StorageResult};

/// Stores the document as a pretty-printed JSON file.
///
/// Saves go to a temporary file in the same directory which is then renamed
/// over the target, so readers never observe a truncated document.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn render(document: &Document) -> StorageResult<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        document.serialize(&mut serializer)?;
        buf.push(b'\n');
        Ok(buf)
    }
}

impl DocumentBackend for JsonFileBackend {
    fn load(&self) -> StorageResult<Document> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::Missing(self.describe()));
            }
            Err(e) => return Err(self.io_error(e)),
        };
        parse_document(&text)
    }

    fn save(&self, document: &Document) -> StorageResult<()> {
        let bytes = Self::render(document)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(&bytes).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;
        Ok(())
    }

    fn exists(&self) -> StorageResult<bool> {
        Ok(self.path.is_file())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}
