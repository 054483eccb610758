//! Patient Records Core Library
//!
//! Validated patient records persisted in a single whole-document store.
//!
//! # Architecture
//!
//! ```text
//!   untrusted JSON (API body / stored entry)
//!                  │
//!        PatientRecord::parse(rules)
//!      presence → bounds → normalize → cross-field
//!                  │
//!           PatientRecord ── bmi / verdict computed on access
//!                  │
//!     RecordStore: load ─ mutate in memory ─ save
//!                  │
//!          ┌───────┴────────┐
//!          ▼                ▼
//!   JsonFileBackend    SqliteBackend
//!  (temp file+rename)  (single-row upsert)
//! ```
//!
//! # Modules
//!
//! - [`models`]: Patient schema, validation rules, derived vitals
//! - [`store`]: Whole-document record store and its backends

pub mod models;
pub mod store;

// Re-export commonly used types
pub use models::{
    compute_bmi, normalize_name, Address, AddressField, FieldViolation, Gender, PatientRecord,
    SchemaRules, SchemaVariant, ValidationError, Verdict,
};
pub use store::{
    AnyBackend, AuditFinding, BackendKind, Document, DocumentBackend, JsonFileBackend,
    RecordStore, SortField, SortOrder, SqliteBackend, StorageError, StoreError, StoreResult,
};
