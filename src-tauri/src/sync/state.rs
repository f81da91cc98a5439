//! Sync State
//!
//! What the synchronizer exposes to the presentation layer.

use serde::Serialize;

use crate::domain::{Item, SyncError};

/// Generic acknowledgment shown after a successful add or remove
pub const SUCCESS_MESSAGE: &str = "Operation successful!";

/// Transient, dismissible outcome banner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Notification {
    Success,
    Error(String),
}

impl Notification {
    pub fn for_error(error: &SyncError) -> Self {
        Notification::Error(format!("{}. Please try again.", error))
    }

    pub fn message(&self) -> &str {
        match self {
            Notification::Success => SUCCESS_MESSAGE,
            Notification::Error(msg) => msg,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notification::Error(_))
    }
}

/// Mutable state behind the synchronizer's lock
#[derive(Debug, Default)]
pub(super) struct SyncState {
    pub items: Vec<Item>,
    pub last_error: Option<SyncError>,
    pub notification: Option<Notification>,
}

/// An item as rendered: the stored fields plus display helpers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: Item,
    pub display_name: String,
    /// False at quantity 0, where "-" is disabled
    pub can_decrement: bool,
}

impl From<&Item> for ItemView {
    fn from(item: &Item) -> Self {
        Self {
            item: item.clone(),
            display_name: item.display_name(),
            can_decrement: item.can_decrement(),
        }
    }
}

/// Read-only copy of everything the presentation layer renders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PantrySnapshot {
    /// Mirror contents in insertion / fetch order
    pub items: Vec<ItemView>,
    /// True while any store call is outstanding
    pub loading: bool,
    pub last_error: Option<String>,
    pub notification: Option<Notification>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RemoteError;

    #[test]
    fn test_notification_messages() {
        assert_eq!(Notification::Success.message(), "Operation successful!");

        let notice = Notification::for_error(&SyncError::Remove(RemoteError::new("x")));
        assert_eq!(notice.message(), "Failed to remove item. Please try again.");
        assert!(notice.is_error());
    }

    #[test]
    fn test_notification_serialization() {
        let json = serde_json::to_value(Notification::Error("boom".to_string())).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "error", "message": "boom"}));

        let json = serde_json::to_value(Notification::Success).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "success"}));
    }

    #[test]
    fn test_item_view_serialization() {
        let mut item = Item::new("a".to_string(), "milk".to_string());
        let json = serde_json::to_value(ItemView::from(&item)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "a",
                "name": "milk",
                "quantity": 0,
                "display_name": "Milk",
                "can_decrement": false
            })
        );

        item.quantity = 2;
        assert!(ItemView::from(&item).can_decrement);
    }
}
