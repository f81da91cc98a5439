//! Pantry Backend
//!
//! Layered architecture:
//! - domain: Item entity, store documents, errors
//! - repository: Document store abstraction and backends
//! - sync: In-memory mirror of the pantry collection
//! - commands: Tauri command handlers (desktop builds)

pub mod config;
pub mod domain;
pub mod repository;
pub mod sync;

#[cfg(feature = "desktop")]
mod commands;

#[cfg(feature = "desktop")]
pub use desktop::{run, AppState};

#[cfg(feature = "desktop")]
mod desktop {
    use tauri::{Emitter, Manager};

    use crate::commands;
    use crate::config::{PantryConfig, CONFIG_FILE};
    use crate::repository;
    use crate::sync::PantrySync;

    /// Event carrying a fresh `PantrySnapshot` after the startup fetch
    pub const PANTRY_CHANGED_EVENT: &str = "pantry-changed";

    /// Application state shared across commands
    pub struct AppState {
        pub sync: PantrySync,
    }

    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        tauri::Builder::default()
            .setup(|app| {
                // Single instance check - must be first!
                #[cfg(desktop)]
                app.handle().plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
                    if let Some(window) = app.get_webview_window("main") {
                        let _ = window.set_focus();
                    }
                }))?;

                let app_handle = app.handle().clone();

                rolling_logger::init_logger(app_handle.path().app_log_dir()?, "Pantry")?;

                let data_dir = app_handle.path().app_data_dir()?;
                std::fs::create_dir_all(&data_dir)?;

                let config = PantryConfig::load_or_init(&data_dir.join(CONFIG_FILE))?.apply_env();
                let store = repository::open_store(&config.backend, &data_dir)?;
                app.manage(AppState {
                    sync: PantrySync::new(store),
                });
                log::info!("Pantry backend ready ({})", config.backend.kind());

                // Initial fetch; the UI renders whatever snapshot arrives
                tauri::async_runtime::spawn(async move {
                    let state = app_handle.state::<AppState>();
                    let _ = state.sync.refresh().await;
                    let snapshot = state.sync.snapshot().await;
                    if let Err(e) = app_handle.emit(PANTRY_CHANGED_EVENT, snapshot) {
                        log::warn!("Failed to emit {}: {}", PANTRY_CHANGED_EVENT, e);
                    }
                });

                Ok(())
            })
            .invoke_handler(tauri::generate_handler![
                commands::get_pantry,
                commands::refresh_pantry,
                commands::add_pantry_item,
                commands::remove_pantry_item,
                commands::adjust_item_quantity,
                commands::clear_pantry_error,
                commands::dismiss_notification,
            ])
            .run(tauri::generate_context!())
            .expect("error while running tauri application");
    }
}
