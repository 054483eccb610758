//! SQLite backend.
//!
//! Keeps the whole document as one JSON text in a single-row table, so the
//! store contract stays whole-document while writes get SQLite's atomicity.

use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use super::backend::{parse_document, Document, DocumentBackend};
use super::{StorageError, StorageResult};

/// Schema for the document table.
pub const SCHEMA: &str = r#"
-- Single row holding the current document (updated atomically)
CREATE TABLE IF NOT EXISTS patient_document (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    body TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Document storage backed by a SQLite database.
pub struct SqliteBackend {
    conn: Connection,
    location: String,
}

impl SqliteBackend {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let location = format!("sqlite:{}", path.as_ref().display());
        let conn = Connection::open(path)?;
        let backend = Self { conn, location };
        backend.initialize()?;
        Ok(backend)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let backend = Self {
            conn,
            location: "sqlite::memory:".to_string(),
        };
        backend.initialize()?;
        Ok(backend)
    }

    fn initialize(&self) -> StorageResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

impl DocumentBackend for SqliteBackend {
    fn load(&self) -> StorageResult<Document> {
        let body: Option<String> = self
            .conn
            .query_row("SELECT body FROM patient_document WHERE id = 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match body {
            Some(body) => parse_document(&body),
            None => Err(StorageError::Missing(self.describe())),
        }
    }

    fn save(&self, document: &Document) -> StorageResult<()> {
        let body = serde_json::to_string(document)?;
        self.conn.execute(
            r#"
            INSERT INTO patient_document (id, body, updated_at)
            VALUES (1, ?1, datetime('now'))
            ON CONFLICT(id) DO UPDATE SET
                body = excluded.body,
                updated_at = excluded.updated_at
            "#,
            [body],
        )?;
        Ok(())
    }

    fn exists(&self) -> StorageResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM patient_document WHERE id = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn describe(&self) -> String {
        self.location.clone()
    }
}
