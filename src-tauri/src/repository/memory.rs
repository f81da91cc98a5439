//! In-Memory Document Store
//!
//! Process-local store. Counts calls per operation and can be told to fail
//! specific operations, which is what the synchronizer tests lean on.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::domain::{Document, Fields, RemoteError, RemoteResult};
use super::traits::DocumentStore;

/// Store operation, for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Create,
    Delete,
    Update,
}

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<Document>>,
    next_id: u64,
    failing: HashSet<StoreOp>,
    calls: HashMap<StoreOp, usize>,
}

impl Inner {
    /// Count the call and fail it if requested
    fn begin(&mut self, op: StoreOp) -> RemoteResult<()> {
        *self.calls.entry(op).or_insert(0) += 1;
        if self.failing.contains(&op) {
            return Err(RemoteError::new(format!("injected {:?} failure", op)));
        }
        Ok(())
    }

    fn fresh_id(&mut self, collection: &str) -> String {
        loop {
            self.next_id += 1;
            let id = format!("doc-{}", self.next_id);
            let taken = self
                .collections
                .get(collection)
                .map(|docs| docs.iter().any(|d| d.id == id))
                .unwrap_or(false);
            if !taken {
                return id;
            }
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with raw documents in `collection`
    pub fn with_documents(collection: &str, documents: Vec<Document>) -> Self {
        let store = Self::new();
        store
            .lock()
            .collections
            .insert(collection.to_string(), documents);
        store
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make every subsequent `op` call fail
    pub fn fail(&self, op: StoreOp) {
        self.lock().failing.insert(op);
    }

    /// Stop failing `op` calls
    pub fn recover(&self, op: StoreOp) {
        self.lock().failing.remove(&op);
    }

    /// Number of `op` calls received so far, failed ones included
    pub fn calls(&self, op: StoreOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    /// Current documents of a collection
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.lock()
            .collections
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_all(&self, collection: &str) -> RemoteResult<Vec<Document>> {
        let mut inner = self.lock();
        inner.begin(StoreOp::List)?;
        Ok(inner.collections.get(collection).cloned().unwrap_or_default())
    }

    async fn create(&self, collection: &str, fields: Fields) -> RemoteResult<String> {
        let mut inner = self.lock();
        inner.begin(StoreOp::Create)?;
        let id = inner.fresh_id(collection);
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(Document::new(id.clone(), fields));
        Ok(id)
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> RemoteResult<()> {
        let mut inner = self.lock();
        inner.begin(StoreOp::Delete)?;
        if let Some(docs) = inner.collections.get_mut(collection) {
            docs.retain(|d| d.id != id);
        }
        Ok(())
    }

    async fn update_fields(&self, collection: &str, id: &str, fields: Fields) -> RemoteResult<()> {
        let mut inner = self.lock();
        inner.begin(StoreOp::Update)?;
        let doc = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
            .ok_or_else(|| RemoteError::new(format!("No document to update: {}", id)))?;
        doc.fields.extend(fields);
        Ok(())
    }
}
