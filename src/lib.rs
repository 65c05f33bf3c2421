// Learn more about Tauri commands at https://tauri.app/develop/calling-rust/
mod commands;
mod dialog;
mod drag;
mod events;
mod logging;
mod migrate;
mod models;
mod state;
mod storage;
mod tags;
mod toast;

#[cfg(all(feature = "app", not(test)))]
use tauri::Manager;

#[cfg(all(feature = "app", not(test)))]
use crate::commands::*;
#[cfg(all(feature = "app", not(test)))]
use crate::dialog::Dialogs;
#[cfg(all(feature = "app", not(test)))]
use crate::drag::DragController;
#[cfg(all(feature = "app", not(test)))]
use crate::models::PersistedState;
#[cfg(all(feature = "app", not(test)))]
use crate::state::AppState;
#[cfg(all(feature = "app", not(test)))]
use crate::storage::Storage;
#[cfg(all(feature = "app", not(test)))]
use crate::toast::Toaster;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
#[cfg(all(feature = "app", not(test)))]
pub fn run() {
    tauri::Builder::default()
        .setup(|app| {
            let data_dir = app.path().app_data_dir()?;
            if let Err(error) = logging::init_logging(&data_dir) {
                eprintln!("logging init failed: {error}");
            }

            let storage = Storage::new(data_dir);
            storage.ensure_dirs()?;

            let state = AppState::new(
                storage
                    .load_state()
                    .unwrap_or_else(PersistedState::default_state),
            );
            // Write the migrated/healed form back so the next start reads the
            // current schema.
            storage.save_state(&state.snapshot())?;

            app.manage(state);
            app.manage(Dialogs::default());
            app.manage(DragController::default());
            app.manage(Toaster::default());

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            load_state,
            create_list,
            request_rename_list,
            request_delete_list,
            set_active_list,
            set_sort_mode,
            create_task,
            request_edit_task,
            toggle_task,
            request_delete_task,
            request_clear_done,
            confirm_dialog,
            dismiss_dialog,
            begin_drag,
            drag_over,
            commit_drag,
            cancel_drag,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
