//! Record store contract tests, run against every backend.

use patient_records_core::store::{
    DocumentBackend, JsonFileBackend, RecordStore, SqliteBackend, StorageError, StoreError,
};
use patient_records_core::{PatientRecord, SchemaRules, Verdict};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use tempfile::TempDir;

fn patient(id: &str, name: &str, age: u32) -> Map<String, Value> {
    let contact = if age > 60 {
        json!({"email": "abc@gmail.com", "emergency": "555-0199"})
    } else {
        json!({"email": "abc@gmail.com"})
    };
    json!({
        "id": id,
        "name": name,
        "email": "abc@gmail.com",
        "linkedin": "https://www.linkedin.com/in/john-doe/",
        "age": age,
        "married": null,
        "gender": "Male",
        "address": "123 Main St",
        "phone": "123-456-7890",
        "city": "New York",
        "contact": contact,
        "allergies": ["Penicillin"],
        "height": 180,
        "weight": 75
    })
    .as_object()
    .unwrap()
    .clone()
}

fn json_store(dir: &TempDir) -> RecordStore<JsonFileBackend> {
    let store = RecordStore::new(
        JsonFileBackend::new(dir.path().join("patients.json")),
        SchemaRules::api(),
    );
    store.init().unwrap();
    store
}

fn sqlite_store() -> RecordStore<SqliteBackend> {
    let store = RecordStore::new(SqliteBackend::open_in_memory().unwrap(), SchemaRules::api());
    store.init().unwrap();
    store
}

/// Runs a contract check against both backends.
fn for_each_backend(check: impl Fn(&dyn Fn() -> Box<dyn Contract>)) {
    check(&|| -> Box<dyn Contract> {
        let dir = TempDir::new().unwrap();
        Box::new((json_store(&dir), dir))
    });
    check(&|| -> Box<dyn Contract> { Box::new(sqlite_store()) });
}

/// Object-safe view over a store, independent of its backend type.
trait Contract {
    fn create(&self, raw: &Map<String, Value>) -> Result<PatientRecord, StoreError>;
    fn get(&self, id: &str) -> Result<PatientRecord, StoreError>;
    fn update(&self, id: &str, partial: &Map<String, Value>) -> Result<PatientRecord, StoreError>;
    fn delete(&self, id: &str) -> Result<(), StoreError>;
    fn list(&self, sort_by: &str, order: &str) -> Result<Vec<PatientRecord>, StoreError>;
    fn ids(&self) -> Vec<String>;
}

impl<B: DocumentBackend> Contract for RecordStore<B> {
    fn create(&self, raw: &Map<String, Value>) -> Result<PatientRecord, StoreError> {
        self.create_from_raw(raw)
    }
    fn get(&self, id: &str) -> Result<PatientRecord, StoreError> {
        RecordStore::get(self, id)
    }
    fn update(&self, id: &str, partial: &Map<String, Value>) -> Result<PatientRecord, StoreError> {
        RecordStore::update(self, id, partial)
    }
    fn delete(&self, id: &str) -> Result<(), StoreError> {
        RecordStore::delete(self, id)
    }
    fn list(&self, sort_by: &str, order: &str) -> Result<Vec<PatientRecord>, StoreError> {
        RecordStore::list(self, sort_by, order)
    }
    fn ids(&self) -> Vec<String> {
        self.load().unwrap().keys().cloned().collect()
    }
}

// Keeps the temp directory alive for as long as the store is used.
impl<B: DocumentBackend> Contract for (RecordStore<B>, TempDir) {
    fn create(&self, raw: &Map<String, Value>) -> Result<PatientRecord, StoreError> {
        Contract::create(&self.0, raw)
    }
    fn get(&self, id: &str) -> Result<PatientRecord, StoreError> {
        Contract::get(&self.0, id)
    }
    fn update(&self, id: &str, partial: &Map<String, Value>) -> Result<PatientRecord, StoreError> {
        Contract::update(&self.0, id, partial)
    }
    fn delete(&self, id: &str) -> Result<(), StoreError> {
        Contract::delete(&self.0, id)
    }
    fn list(&self, sort_by: &str, order: &str) -> Result<Vec<PatientRecord>, StoreError> {
        Contract::list(&self.0, sort_by, order)
    }
    fn ids(&self) -> Vec<String> {
        self.0.ids()
    }
}

#[test]
fn test_create_then_get_returns_normalized_record() {
    for_each_backend(|open| {
        let store = open();
        let created = store.create(&patient("P001", "john doe", 30)).unwrap();
        let fetched = store.get("P001").unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.name(), "JOHN DOE");
        assert_eq!(fetched.bmi(), 23.15);
        assert_eq!(fetched.verdict(), Verdict::Normal);
    });
}

#[test]
fn test_partial_update_keeps_other_fields() {
    for_each_backend(|open| {
        let store = open();
        let before = store.create(&patient("P001", "John", 30)).unwrap();

        let after = store
            .update("P001", json!({"city": "Chicago"}).as_object().unwrap())
            .unwrap();

        assert_eq!(after.city(), "Chicago");
        assert_eq!(after.name(), before.name());
        assert_eq!(after.email(), before.email());
        assert_eq!(after.contact(), before.contact());
        assert_eq!(after.allergies(), before.allergies());
        assert_eq!(after.height(), before.height());
    });
}

#[test]
fn test_update_past_sixty_without_emergency_contact_fails() {
    for_each_backend(|open| {
        let store = open();
        store.create(&patient("P001", "John", 60)).unwrap();

        let err = store
            .update("P001", json!({"age": 61}).as_object().unwrap())
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(e) if e.has_field("contact")));
        assert_eq!(store.get("P001").unwrap().age(), 60);
    });
}

#[test]
fn test_delete_then_get_is_not_found() {
    for_each_backend(|open| {
        let store = open();
        store.create(&patient("P001", "John", 30)).unwrap();
        store.delete("P001").unwrap();

        assert!(matches!(store.get("P001"), Err(StoreError::NotFound(_))));
        assert!(store.ids().is_empty());
    });
}

#[test]
fn test_sequential_creates_keep_both() {
    for_each_backend(|open| {
        let store = open();
        store.create(&patient("P001", "John", 30)).unwrap();
        store.create(&patient("P002", "Jane", 40)).unwrap();

        assert_eq!(store.ids(), vec!["P001".to_string(), "P002".to_string()]);
    });
}

#[test]
fn test_conflict_on_duplicate_id() {
    for_each_backend(|open| {
        let store = open();
        store.create(&patient("P001", "John", 30)).unwrap();
        assert!(matches!(
            store.create(&patient("P001", "Jane", 40)),
            Err(StoreError::Conflict(_))
        ));
        assert_eq!(store.ids().len(), 1);
    });
}

#[test]
fn test_list_age_desc_is_stable() {
    for_each_backend(|open| {
        let store = open();
        store.create(&patient("P001", "Ann", 40)).unwrap();
        store.create(&patient("P002", "Bob", 55)).unwrap();
        store.create(&patient("P003", "Cid", 40)).unwrap();
        store.create(&patient("P004", "Dee", 70)).unwrap();

        let ids: Vec<_> = store
            .list("age", "desc")
            .unwrap()
            .into_iter()
            .map(|p| p.id().to_string())
            .collect();
        assert_eq!(ids, vec!["P004", "P002", "P001", "P003"]);

        let ids: Vec<_> = store
            .list("age", "asc")
            .unwrap()
            .into_iter()
            .map(|p| p.id().to_string())
            .collect();
        assert_eq!(ids, vec!["P001", "P003", "P002", "P004"]);
    });
}

#[test]
fn test_json_document_layout() {
    let dir = TempDir::new().unwrap();
    let store = json_store(&dir);
    store.create_from_raw(&patient("P001", "John", 30)).unwrap();

    let text = std::fs::read_to_string(dir.path().join("patients.json")).unwrap();
    let document: Value = serde_json::from_str(&text).unwrap();

    let entry = &document["P001"];
    assert!(entry.get("id").is_none());
    assert_eq!(entry["name"], json!("JOHN"));
    assert_eq!(entry["bmi"], json!(23.15));
    assert_eq!(entry["verdict"], json!("Normal"));
}

#[test]
fn test_hand_edited_document_is_validated_on_read() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("patients.json");
    let mut entry = patient("P001", "lower case", 30);
    entry.remove("id");
    entry.insert("bmi".into(), json!(1.0));
    std::fs::write(&path, json!({"P001": entry}).to_string()).unwrap();

    let store = RecordStore::new(JsonFileBackend::new(&path), SchemaRules::api());
    let record = store.get("P001").unwrap();
    assert_eq!(record.name(), "LOWER CASE");
    assert_eq!(record.bmi(), 23.15);
}

#[test]
fn test_corrupt_document_is_storage_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("patients.json");
    std::fs::write(&path, "not json").unwrap();

    let store = RecordStore::new(JsonFileBackend::new(&path), SchemaRules::api());
    assert!(matches!(
        store.get("P001"),
        Err(StoreError::Storage(StorageError::Corrupt(_)))
    ));
    assert!(matches!(
        store.create_from_raw(&patient("P001", "John", 30)),
        Err(StoreError::Storage(StorageError::Corrupt(_)))
    ));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "not json");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn list_desc_is_non_increasing(ages in proptest::collection::vec(1u32..100, 1..12)) {
        let store = sqlite_store();
        for (i, age) in ages.iter().enumerate() {
            store.create_from_raw(&patient(&format!("P{:03}", i), "Someone", *age)).unwrap();
        }

        let listed = store.list("age", "desc").unwrap();
        prop_assert_eq!(listed.len(), ages.len());
        for pair in listed.windows(2) {
            prop_assert!(pair[0].age() >= pair[1].age());
            if pair[0].age() == pair[1].age() {
                prop_assert!(pair[0].id() < pair[1].id());
            }
        }
    }
}
