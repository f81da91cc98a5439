//! Tauri Commands for the Pantry
//!
//! Mutating commands return the snapshot after the operation, so the
//! frontend can render straight from the response. Failures come back as
//! the operation's fixed message.

use tauri::State;

use crate::sync::PantrySnapshot;
use crate::AppState;

/// Current mirror, loading flag, error and notification
#[tauri::command]
pub async fn get_pantry(state: State<'_, AppState>) -> Result<PantrySnapshot, String> {
    Ok(state.sync.snapshot().await)
}

/// Re-fetch the whole collection
#[tauri::command]
pub async fn refresh_pantry(state: State<'_, AppState>) -> Result<PantrySnapshot, String> {
    state.sync.refresh().await.map_err(|e| e.to_string())?;
    Ok(state.sync.snapshot().await)
}

/// Add an item; a blank name is ignored
#[tauri::command]
pub async fn add_pantry_item(state: State<'_, AppState>, name: String) -> Result<PantrySnapshot, String> {
    state.sync.add_item(&name).await.map_err(|e| e.to_string())?;
    Ok(state.sync.snapshot().await)
}

#[tauri::command]
pub async fn remove_pantry_item(state: State<'_, AppState>, id: String) -> Result<PantrySnapshot, String> {
    state.sync.remove_item(&id).await.map_err(|e| e.to_string())?;
    Ok(state.sync.snapshot().await)
}

/// Increment / decrement (typically +1 / -1)
#[tauri::command]
pub async fn adjust_item_quantity(
    state: State<'_, AppState>,
    id: String,
    delta: i64,
) -> Result<PantrySnapshot, String> {
    state.sync.adjust_quantity(&id, delta).await.map_err(|e| e.to_string())?;
    Ok(state.sync.snapshot().await)
}

#[tauri::command]
pub async fn clear_pantry_error(state: State<'_, AppState>) -> Result<PantrySnapshot, String> {
    state.sync.clear_error().await;
    Ok(state.sync.snapshot().await)
}

#[tauri::command]
pub async fn dismiss_notification(state: State<'_, AppState>) -> Result<PantrySnapshot, String> {
    state.sync.dismiss_notification().await;
    Ok(state.sync.snapshot().await)
}
