//! Integration tests for the export and import jobs.
//!
//! Verifies:
//! - export -> import reproduces the payload fields
//! - empty collections produce no file
//! - skip and overwrite conflict policies
//! - one failing document never stops the batch, and the tally adds up

use async_trait::async_trait;
use firebridge::{
    export_collection, import_collection, import_documents, ConflictPolicy, DocumentStore, Error,
    ExportOptions, ExportOutcome, ImportOptions, MemoryStore, NoopProgress, RemoteDocument,
    Result,
};
use parking_lot::Mutex;
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;

const COLLECTION: &str = "first_aid_procedures";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn fields(value: Value) -> Map<String, Value> {
    value.as_object().unwrap().clone()
}

fn procedure(name: &str) -> Map<String, Value> {
    fields(json!({
        "name": name,
        "description": format!("How to handle {}", name.to_lowercase()),
        "keywords": [name.to_lowercase(), "first aid"],
        "notes": "",
        "steps": [
            "Check the scene is safe",
            { "title": "Call", "detail": "Call emergency services" }
        ]
    }))
}

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.insert(COLLECTION, "bleeding", procedure("Bleeding"));
    store.insert(COLLECTION, "burns", procedure("Burns"));
    store.insert(COLLECTION, "choking", procedure("Choking"));
    store
}

fn export_options(dir: &Path) -> ExportOptions {
    ExportOptions {
        collection: COLLECTION.to_string(),
        output_path: dir.join("export.json"),
    }
}

fn import_options(path: &Path, policy: ConflictPolicy) -> ImportOptions {
    ImportOptions {
        collection: COLLECTION.to_string(),
        input_path: path.to_path_buf(),
        conflict_policy: policy,
    }
}

fn write_envelope(dir: &Path, documents: Value) -> std::path::PathBuf {
    let count = documents.as_array().map_or(0, Vec::len);
    let path = dir.join("input.json");
    let envelope = json!({
        "collection": COLLECTION,
        "documentCount": count,
        "exportedAt": "2024-05-01T10:00:00.000Z",
        "documents": documents
    });
    std::fs::write(&path, serde_json::to_string_pretty(&envelope).unwrap()).unwrap();
    path
}

/// Wraps a `MemoryStore` and fails reads or writes for chosen ids.
struct FailingStore {
    inner: MemoryStore,
    fail_get: HashSet<String>,
    fail_write: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FailingStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_get: HashSet::new(),
            fail_write: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn list_all(&self, collection: &str) -> Result<Vec<RemoteDocument>> {
        self.inner.list_all(collection).await
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<RemoteDocument>> {
        self.calls.lock().push(format!("get:{}", id));
        if self.fail_get.contains(id) {
            return Err(Error::Api {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        self.inner.get(collection, id).await
    }

    async fn set_merge(&self, collection: &str, id: &str, fields: Map<String, Value>) -> Result<()> {
        self.calls.lock().push(format!("set:{}", id));
        if self.fail_write.contains(id) {
            return Err(Error::Api {
                status: 500,
                message: "write rejected".to_string(),
            });
        }
        self.inner.set_merge(collection, id, fields).await
    }

    fn backend_name(&self) -> &'static str {
        "failing"
    }
}

/// A store whose preflight check always fails.
struct UnreachableStore;

#[async_trait]
impl DocumentStore for UnreachableStore {
    async fn list_all(&self, _collection: &str) -> Result<Vec<RemoteDocument>> {
        Err(Error::Config("unreachable".to_string()))
    }

    async fn get(&self, _collection: &str, _id: &str) -> Result<Option<RemoteDocument>> {
        Err(Error::Config("unreachable".to_string()))
    }

    async fn set_merge(&self, _c: &str, _id: &str, _f: Map<String, Value>) -> Result<()> {
        Err(Error::Config("unreachable".to_string()))
    }

    async fn check_connection(&self, _collection: &str) -> Result<()> {
        Err(Error::Config("unreachable".to_string()))
    }

    fn backend_name(&self) -> &'static str {
        "unreachable"
    }
}

// =========================================================================
// Export
// =========================================================================

#[tokio::test]
async fn test_export_writes_envelope() {
    let temp = TempDir::new().unwrap();
    let store = seeded_store();
    let options = export_options(temp.path());

    let outcome = export_collection(&store, &options, &NoopProgress).await.unwrap();
    assert_eq!(
        outcome,
        ExportOutcome::Written {
            path: options.output_path.clone(),
            document_count: 3
        }
    );

    let content = std::fs::read_to_string(&options.output_path).unwrap();
    let envelope: Value = serde_json::from_str(&content).unwrap();
    assert_eq!(envelope["collection"], json!(COLLECTION));
    assert_eq!(
        envelope["documentCount"].as_u64().unwrap() as usize,
        envelope["documents"].as_array().unwrap().len()
    );
    assert!(envelope["exportedAt"].as_str().unwrap().ends_with('Z'));

    let ids: Vec<&str> = envelope["documents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["bleeding", "burns", "choking"]);
    assert_eq!(envelope["documents"][1]["name"], json!("Burns"));
}

#[tokio::test]
async fn test_export_keeps_all_stored_fields() {
    let temp = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let mut doc = procedure("Sprains");
    doc.insert("severity".to_string(), json!("minor"));
    store.insert(COLLECTION, "sprains", doc);

    let options = export_options(temp.path());
    export_collection(&store, &options, &NoopProgress).await.unwrap();

    let envelope: Value =
        serde_json::from_str(&std::fs::read_to_string(&options.output_path).unwrap()).unwrap();
    assert_eq!(envelope["documents"][0]["severity"], json!("minor"));
}

#[tokio::test]
async fn test_export_empty_collection_writes_nothing() {
    let temp = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let options = export_options(temp.path());

    let outcome = export_collection(&store, &options, &NoopProgress).await.unwrap();
    assert_eq!(outcome, ExportOutcome::Empty);
    assert!(!options.output_path.exists());
}

#[tokio::test]
async fn test_export_overwrites_previous_file() {
    let temp = TempDir::new().unwrap();
    let options = export_options(temp.path());
    std::fs::write(&options.output_path, "stale contents").unwrap();

    export_collection(&seeded_store(), &options, &NoopProgress)
        .await
        .unwrap();

    let content = std::fs::read_to_string(&options.output_path).unwrap();
    assert!(!content.contains("stale"));
    assert!(serde_json::from_str::<Value>(&content).is_ok());
}

#[tokio::test]
async fn test_export_store_failure_aborts() {
    let temp = TempDir::new().unwrap();
    let options = export_options(temp.path());

    let result = export_collection(&UnreachableStore, &options, &NoopProgress).await;
    assert!(result.is_err());
    assert!(!options.output_path.exists());
}

// =========================================================================
// Export -> Import round-trip
// =========================================================================

#[tokio::test]
async fn test_export_import_round_trip() {
    let temp = TempDir::new().unwrap();
    let source = seeded_store();
    let options = export_options(temp.path());
    export_collection(&source, &options, &NoopProgress).await.unwrap();

    let target = MemoryStore::new();
    let summary = import_collection(
        &target,
        &import_options(&options.output_path, ConflictPolicy::Overwrite),
        &NoopProgress,
    )
    .await
    .unwrap();

    assert_eq!(summary.total, 3);
    assert_eq!(summary.imported, 3);
    assert!(summary.is_complete());

    for id in ["bleeding", "burns", "choking"] {
        let original = source.document(COLLECTION, id).unwrap();
        let copied = target.document(COLLECTION, id).unwrap();
        assert_eq!(original, copied, "document {id} differs");
        assert!(!copied.contains_key("id"));
    }
}

#[tokio::test]
async fn test_round_trip_keeps_loose_values() {
    let temp = TempDir::new().unwrap();
    let source = MemoryStore::new();
    let mut no_notes = procedure("Sprain");
    no_notes.insert("notes".to_string(), Value::Null);
    source.insert(COLLECTION, "sprain", no_notes);
    let mut odd_steps = procedure("Nosebleed");
    odd_steps.insert("steps".to_string(), json!(["Lean forward", ["pinch", "hold"], 10]));
    source.insert(COLLECTION, "nosebleed", odd_steps);

    let options = export_options(temp.path());
    export_collection(&source, &options, &NoopProgress).await.unwrap();

    let target = MemoryStore::new();
    let summary = import_collection(
        &target,
        &import_options(&options.output_path, ConflictPolicy::Overwrite),
        &NoopProgress,
    )
    .await
    .unwrap();

    assert_eq!(summary.imported, 2, "failures: {:?}", summary.failures);
    assert_eq!(summary.errors, 0);

    let sprain = target.document(COLLECTION, "sprain").unwrap();
    assert_eq!(sprain["notes"], Value::Null);
    let nosebleed = target.document(COLLECTION, "nosebleed").unwrap();
    assert_eq!(nosebleed["steps"], json!(["Lean forward", ["pinch", "hold"], 10]));
}

// =========================================================================
// Conflict policies
// =========================================================================

#[tokio::test]
async fn test_skip_existing_leaves_document_unchanged() {
    let temp = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let existing = fields(json!({ "name": "Remote CPR", "reviewedBy": "dr. who" }));
    store.insert(COLLECTION, "A", existing.clone());

    let mut incoming = procedure("File CPR");
    incoming.insert("id".to_string(), json!("A"));
    let mut fresh = procedure("Fresh");
    fresh.insert("id".to_string(), json!("B"));
    let path = write_envelope(temp.path(), json!([incoming, fresh]));

    let summary = import_collection(
        &store,
        &import_options(&path, ConflictPolicy::Skip),
        &NoopProgress,
    )
    .await
    .unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.errors, 0);
    assert_eq!(store.document(COLLECTION, "A").unwrap(), existing);
    assert_eq!(store.document(COLLECTION, "B").unwrap()["name"], json!("Fresh"));
}

#[tokio::test]
async fn test_overwrite_merges_and_keeps_other_fields() {
    let temp = TempDir::new().unwrap();
    let store = MemoryStore::new();
    store.insert(
        COLLECTION,
        "A",
        fields(json!({ "name": "Remote CPR", "reviewedBy": "dr. who", "keywords": ["old"] })),
    );

    let mut incoming = procedure("File CPR");
    incoming.insert("id".to_string(), json!("A"));
    incoming.insert("extra".to_string(), json!("not written"));
    let path = write_envelope(temp.path(), json!([incoming]));

    let summary = import_collection(
        &store,
        &import_options(&path, ConflictPolicy::Overwrite),
        &NoopProgress,
    )
    .await
    .unwrap();

    assert_eq!(summary.imported, 1);
    assert_eq!(summary.skipped, 0);

    let doc = store.document(COLLECTION, "A").unwrap();
    assert_eq!(doc["name"], json!("File CPR"));
    assert_eq!(doc["keywords"], json!(["file cpr", "first aid"]));
    assert_eq!(doc["reviewedBy"], json!("dr. who"));
    assert!(!doc.contains_key("extra"));
    assert!(!doc.contains_key("id"));
}

// =========================================================================
// Partial failure
// =========================================================================

#[tokio::test]
async fn test_failed_write_does_not_stop_batch() {
    let mut store = FailingStore::new(MemoryStore::new());
    store.fail_write.insert("d2".to_string());

    let entries: Vec<Value> = (1..=4)
        .map(|i| {
            let mut doc = procedure(&format!("Doc {i}"));
            doc.insert("id".to_string(), json!(format!("d{i}")));
            Value::Object(doc)
        })
        .collect();

    let summary = import_documents(
        &store,
        COLLECTION,
        &entries,
        ConflictPolicy::Overwrite,
        &NoopProgress,
    )
    .await;

    assert_eq!(summary.imported, 3);
    assert_eq!(summary.errors, 1);
    assert!(summary.is_complete());
    assert_eq!(summary.failures[0].id, "d2");
    assert!(summary.failures[0].reason.contains("write rejected"));

    assert!(store.inner.document(COLLECTION, "d3").is_some());
    assert!(store.inner.document(COLLECTION, "d4").is_some());
    assert!(store.inner.document(COLLECTION, "d2").is_none());

    let calls = store.calls.lock().clone();
    assert_eq!(
        calls,
        vec![
            "get:d1", "set:d1", "get:d2", "set:d2", "get:d3", "set:d3", "get:d4", "set:d4"
        ]
    );
}

#[tokio::test]
async fn test_failed_existence_check_is_counted() {
    let mut store = FailingStore::new(MemoryStore::new());
    store.fail_get.insert("d1".to_string());

    let mut doc = procedure("One");
    doc.insert("id".to_string(), json!("d1"));
    let summary = import_documents(
        &store,
        COLLECTION,
        &[Value::Object(doc)],
        ConflictPolicy::Skip,
        &NoopProgress,
    )
    .await;

    assert_eq!(summary.errors, 1);
    assert_eq!(store.calls.lock().as_slice(), ["get:d1"]);
}

#[tokio::test]
async fn test_malformed_entries_are_counted() {
    let temp = TempDir::new().unwrap();
    let store = MemoryStore::new();
    let mut good = procedure("Good");
    good.insert("id".to_string(), json!("good"));
    let path = write_envelope(
        temp.path(),
        json!([
            { "name": "no id" },
            "not an object",
            { "id": "partial", "name": "Partial" },
            good
        ]),
    );

    let summary = import_collection(
        &store,
        &import_options(&path, ConflictPolicy::Overwrite),
        &NoopProgress,
    )
    .await
    .unwrap();

    assert_eq!(summary.total, 4);
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.errors, 3);
    assert!(summary.is_complete());
    let ids: Vec<&str> = summary.failures.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["<entry 0>", "<entry 1>", "partial"]);
    assert_eq!(store.len(COLLECTION), 1);
}

// =========================================================================
// Fatal import errors
// =========================================================================

#[tokio::test]
async fn test_missing_file_aborts() {
    let temp = TempDir::new().unwrap();
    let result = import_collection(
        &MemoryStore::new(),
        &import_options(&temp.path().join("missing.json"), ConflictPolicy::Overwrite),
        &NoopProgress,
    )
    .await;
    assert!(matches!(result, Err(e) if e.is_not_found()));
}

#[tokio::test]
async fn test_unparsable_file_aborts() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("broken.json");
    std::fs::write(&path, "{ \"documents\": [").unwrap();

    let store = MemoryStore::new();
    let result = import_collection(
        &store,
        &import_options(&path, ConflictPolicy::Overwrite),
        &NoopProgress,
    )
    .await;
    assert!(result.is_err());
    assert!(store.is_empty(COLLECTION));
}

#[tokio::test]
async fn test_unreachable_store_aborts_before_any_document() {
    let temp = TempDir::new().unwrap();
    let mut doc = procedure("One");
    doc.insert("id".to_string(), json!("d1"));
    let path = write_envelope(temp.path(), json!([doc]));

    let result = import_collection(
        &UnreachableStore,
        &import_options(&path, ConflictPolicy::Overwrite),
        &NoopProgress,
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_envelope_without_documents_imports_nothing() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bare.json");
    std::fs::write(&path, r#"{ "collection": "first_aid_procedures" }"#).unwrap();

    let summary = import_collection(
        &MemoryStore::new(),
        &import_options(&path, ConflictPolicy::Overwrite),
        &NoopProgress,
    )
    .await
    .unwrap();
    assert_eq!(summary.total, 0);
    assert!(summary.is_complete());
}

// =========================================================================
// Tally invariant
// =========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_tally_accounts_for_every_entry(
        plan in prop::collection::vec((0u8..5, any::<bool>()), 0..24),
        skip in any::<bool>(),
    ) {
        // Per entry: 0 = valid, 1 = malformed, 2 = get fails, 3 = write fails,
        // 4 = already exists. The bool picks a duplicate id.
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let mut store = FailingStore::new(MemoryStore::new());
        let mut entries = Vec::new();

        for (i, (kind, duplicate)) in plan.iter().enumerate() {
            let id = if *duplicate { "dup".to_string() } else { format!("doc{i}") };
            match kind {
                1 => {
                    entries.push(json!({ "id": id }));
                    continue;
                }
                2 => { store.fail_get.insert(id.clone()); }
                3 => { store.fail_write.insert(id.clone()); }
                4 => store.inner.insert(COLLECTION, &id, Map::new()),
                _ => {}
            }
            let mut doc = procedure("Generated");
            doc.insert("id".to_string(), json!(id));
            entries.push(Value::Object(doc));
        }

        let policy = if skip { ConflictPolicy::Skip } else { ConflictPolicy::Overwrite };
        let summary = runtime.block_on(import_documents(
            &store,
            COLLECTION,
            &entries,
            policy,
            &NoopProgress,
        ));

        prop_assert_eq!(summary.total, entries.len());
        prop_assert!(summary.is_complete());
        prop_assert_eq!(summary.failures.len(), summary.errors);
        if !skip {
            prop_assert_eq!(summary.skipped, 0);
        }
    }
}
