//! Repository Integration Tests
//!
//! Runs the document store contract against the SQLite and in-memory
//! backends.

use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::BackendConfig;
use crate::domain::{Document, Fields};
use crate::repository::{open_store, DocumentStore, MemoryStore, SqliteStore, StoreOp};

fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap_or_default()
}

fn backends() -> Vec<(&'static str, Arc<dyn DocumentStore>)> {
    let sqlite: Arc<dyn DocumentStore> =
        Arc::new(SqliteStore::open_in_memory().expect("Failed to init test DB"));
    let memory: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    vec![("sqlite", sqlite), ("memory", memory)]
}

#[tokio::test]
async fn test_create_then_list() {
    for (name, store) in backends() {
        let a = store.create("pantry", fields(json!({"name": "Milk", "quantity": 0}))).await.unwrap();
        let b = store.create("pantry", fields(json!({"name": "Eggs", "quantity": 0}))).await.unwrap();
        assert_ne!(a, b, "{}", name);

        let docs = store.list_all("pantry").await.expect("List failed");
        assert_eq!(docs.len(), 2, "{}", name);
        assert_eq!(docs[0].id, a, "{}", name);
        assert_eq!(docs[0].fields.get("name"), Some(&json!("Milk")), "{}", name);
        assert_eq!(docs[1].id, b, "{}", name);
    }
}

#[tokio::test]
async fn test_list_empty_collection() {
    for (name, store) in backends() {
        let docs = store.list_all("pantry").await.expect("List failed");
        assert!(docs.is_empty(), "{}", name);
    }
}

#[tokio::test]
async fn test_collections_are_separate() {
    for (name, store) in backends() {
        store.create("pantry", fields(json!({"name": "Milk"}))).await.unwrap();
        store.create("other", fields(json!({"name": "Nails"}))).await.unwrap();

        let docs = store.list_all("pantry").await.unwrap();
        assert_eq!(docs.len(), 1, "{}", name);
    }
}

#[tokio::test]
async fn test_update_merges_fields() {
    for (name, store) in backends() {
        let id = store.create("pantry", fields(json!({"name": "Milk", "quantity": 0}))).await.unwrap();
        store.update_fields("pantry", &id, fields(json!({"quantity": 3}))).await.expect("Update failed");

        let docs = store.list_all("pantry").await.unwrap();
        assert_eq!(Value::Object(docs[0].fields.clone()), json!({"name": "Milk", "quantity": 3}), "{}", name);
    }
}

#[tokio::test]
async fn test_update_missing_document_fails() {
    for (name, store) in backends() {
        let result = store.update_fields("pantry", "404", fields(json!({"quantity": 1}))).await;
        assert!(result.is_err(), "{}", name);

        let result = store.update_fields("pantry", "not-a-row", fields(json!({"quantity": 1}))).await;
        assert!(result.is_err(), "{}", name);
    }
}

#[tokio::test]
async fn test_delete() {
    for (name, store) in backends() {
        let id = store.create("pantry", fields(json!({"name": "Milk"}))).await.unwrap();
        store.delete_by_id("pantry", &id).await.expect("Delete failed");

        let docs = store.list_all("pantry").await.unwrap();
        assert!(docs.is_empty(), "{}", name);
    }
}

#[tokio::test]
async fn test_delete_missing_document_succeeds() {
    for (name, store) in backends() {
        assert!(store.delete_by_id("pantry", "999").await.is_ok(), "{}", name);
        assert!(store.delete_by_id("pantry", "nope").await.is_ok(), "{}", name);
    }
}

#[tokio::test]
async fn test_sqlite_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("pantry.db");

    let id = {
        let store = SqliteStore::open(&db_path).unwrap();
        store.create("pantry", fields(json!({"name": "Rice", "quantity": 2}))).await.unwrap()
    };

    let store = SqliteStore::open(&db_path).unwrap();
    let docs = store.list_all("pantry").await.unwrap();
    assert_eq!(docs, vec![Document::new(id, fields(json!({"name": "Rice", "quantity": 2})))]);
}

#[tokio::test]
async fn test_memory_store_failure_injection() {
    let store = MemoryStore::new();
    store.fail(StoreOp::Create);

    assert!(store.create("pantry", fields(json!({"name": "Milk"}))).await.is_err());
    assert_eq!(store.calls(StoreOp::Create), 1);
    assert!(store.documents("pantry").is_empty());

    store.recover(StoreOp::Create);
    assert!(store.create("pantry", fields(json!({"name": "Milk"}))).await.is_ok());
    assert_eq!(store.calls(StoreOp::Create), 2);
    assert_eq!(store.total_calls(), 2);
}

#[tokio::test]
async fn test_memory_store_ids_skip_seeded() {
    let store = MemoryStore::with_documents(
        "pantry",
        vec![Document::new("doc-1", fields(json!({"name": "Seeded"})))],
    );

    let id = store.create("pantry", fields(json!({"name": "New"}))).await.unwrap();
    assert_eq!(id, "doc-2");
}

#[tokio::test]
async fn test_open_store_backends() {
    let dir = tempfile::tempdir().unwrap();

    let local = open_store(&BackendConfig::default(), dir.path()).unwrap();
    local.create("pantry", fields(json!({"name": "Salt"}))).await.unwrap();
    assert!(dir.path().join(crate::config::DEFAULT_DB_FILE).exists());

    let memory = open_store(&BackendConfig::Memory, dir.path()).unwrap();
    assert!(memory.list_all("pantry").await.unwrap().is_empty());
}
