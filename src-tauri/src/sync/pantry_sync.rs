//! Pantry Synchronizer
//!
//! Every operation is confirm-first: the store call runs to completion
//! before the mirror changes, so a failed call leaves the mirror exactly as
//! it was.
//!
//! The state lock is only held for short synchronous sections, never across
//! a store call. Operations started concurrently interleave at their store
//! calls. Two concurrent `adjust_quantity` calls on the same item both read
//! the same starting quantity and the mirror ends up with whichever write
//! finishes last (lost update). Nothing serializes them.

use log::{debug, error, info};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::{normalize_name, Fields, Item, SyncError, QUANTITY_FIELD};
use crate::repository::DocumentStore;
use super::state::{ItemView, Notification, PantrySnapshot, SyncState};

/// The single collection holding pantry items
pub const PANTRY_COLLECTION: &str = "pantry";

/// Marks a store call as outstanding until dropped
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn start(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory mirror of the pantry collection
pub struct PantrySync {
    store: Arc<dyn DocumentStore>,
    state: Mutex<SyncState>,
    in_flight: AtomicUsize,
}

impl PantrySync {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            state: Mutex::new(SyncState::default()),
            in_flight: AtomicUsize::new(0),
        }
    }

    // ========================
    // Operations
    // ========================

    /// Replace the mirror with the full collection
    pub async fn refresh(&self) -> Result<Vec<Item>, SyncError> {
        let _in_flight = InFlight::start(&self.in_flight);

        match self.store.list_all(PANTRY_COLLECTION).await {
            Ok(documents) => {
                let items: Vec<Item> = documents.iter().map(Item::from_document).collect();
                info!("Fetched {} pantry items", items.len());
                self.state.lock().await.items = items.clone();
                Ok(items)
            }
            Err(e) => Err(self.record_failure(SyncError::Fetch(e)).await),
        }
    }

    /// Create an item named `name` (trimmed) with quantity 0.
    ///
    /// Returns `Ok(None)` without touching the store when the name is blank.
    pub async fn add_item(&self, name: &str) -> Result<Option<Item>, SyncError> {
        let Some(name) = normalize_name(name) else {
            debug!("Ignoring add with blank name");
            return Ok(None);
        };
        let _in_flight = InFlight::start(&self.in_flight);

        match self.store.create(PANTRY_COLLECTION, Item::new_fields(name)).await {
            Ok(id) => {
                let item = Item::new(id, name.to_string());
                info!("Added pantry item {} ({})", item.id, item.name);

                let mut state = self.state.lock().await;
                state.items.push(item.clone());
                state.notification = Some(Notification::Success);
                Ok(Some(item))
            }
            Err(e) => Err(self.record_failure(SyncError::Add(e)).await),
        }
    }

    /// Delete `id` from the store, then from the mirror.
    ///
    /// The store call is made even if the mirror has no such item.
    pub async fn remove_item(&self, id: &str) -> Result<(), SyncError> {
        let _in_flight = InFlight::start(&self.in_flight);

        match self.store.delete_by_id(PANTRY_COLLECTION, id).await {
            Ok(()) => {
                info!("Removed pantry item {}", id);

                let mut state = self.state.lock().await;
                state.items.retain(|item| item.id != id);
                state.notification = Some(Notification::Success);
                Ok(())
            }
            Err(e) => Err(self.record_failure(SyncError::Remove(e)).await),
        }
    }

    /// Change the quantity of `id` by `delta`, clamped at 0.
    ///
    /// Returns the new quantity, or `Ok(None)` when the mirror has no such
    /// item (no store call is made).
    pub async fn adjust_quantity(&self, id: &str, delta: i64) -> Result<Option<u64>, SyncError> {
        let quantity = {
            let state = self.state.lock().await;
            state
                .items
                .iter()
                .find(|item| item.id == id)
                .map(|item| item.adjusted_quantity(delta))
        };
        let Some(quantity) = quantity else {
            debug!("Ignoring quantity change for unknown item {}", id);
            return Ok(None);
        };
        let _in_flight = InFlight::start(&self.in_flight);

        let mut fields = Fields::new();
        fields.insert(QUANTITY_FIELD.to_string(), quantity.into());

        match self.store.update_fields(PANTRY_COLLECTION, id, fields).await {
            Ok(()) => {
                info!("Set quantity of {} to {}", id, quantity);

                let mut state = self.state.lock().await;
                if let Some(item) = state.items.iter_mut().find(|item| item.id == id) {
                    item.quantity = quantity;
                }
                Ok(Some(quantity))
            }
            Err(e) => Err(self.record_failure(SyncError::UpdateQuantity(e)).await),
        }
    }

    async fn record_failure(&self, err: SyncError) -> SyncError {
        error!("{}: {}", err, err.remote());

        let mut state = self.state.lock().await;
        state.notification = Some(Notification::for_error(&err));
        state.last_error = Some(err.clone());
        err
    }

    // ========================
    // Exposed state
    // ========================

    /// Copy of the mirror, in insertion / fetch order
    pub async fn items(&self) -> Vec<Item> {
        self.state.lock().await.items.clone()
    }

    /// True while any store call is outstanding
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn last_error(&self) -> Option<SyncError> {
        self.state.lock().await.last_error.clone()
    }

    /// Clear the error slot; the mirror is not touched
    pub async fn clear_error(&self) {
        self.state.lock().await.last_error = None;
    }

    pub async fn notification(&self) -> Option<Notification> {
        self.state.lock().await.notification.clone()
    }

    pub async fn dismiss_notification(&self) {
        self.state.lock().await.notification = None;
    }

    pub async fn snapshot(&self) -> PantrySnapshot {
        let state = self.state.lock().await;
        PantrySnapshot {
            items: state.items.iter().map(ItemView::from).collect(),
            loading: self.is_loading(),
            last_error: state.last_error.as_ref().map(|e| e.to_string()),
            notification: state.notification.clone(),
        }
    }
}
