use std::sync::{Arc, Mutex};

/// How long a toast stays up before the hide event fires.
pub const TOAST_HIDE_DELAY_MS: u64 = 1400;

/// Generation counter behind the self-cancelling hide timer: every new toast
/// bumps the generation, and a hide timer only fires its event if no newer
/// toast replaced it in the meantime.
#[derive(Clone, Default)]
pub struct Toaster {
    generation: Arc<Mutex<u64>>,
}

impl Toaster {
    pub fn bump(&self) -> u64 {
        let mut guard = self.generation.lock().expect("toast state poisoned");
        *guard += 1;
        *guard
    }

    pub fn is_current(&self, generation: u64) -> bool {
        let guard = self.generation.lock().expect("toast state poisoned");
        *guard == generation
    }
}

#[cfg(all(feature = "app", not(test)))]
pub fn show_toast<R: tauri::Runtime>(app: &tauri::AppHandle<R>, toaster: &Toaster, text: &str) {
    use tauri::Emitter;

    use crate::events::{ToastPayload, EVENT_TOAST_HIDE, EVENT_TOAST_SHOW};

    let generation = toaster.bump();
    let _ = app.emit(
        EVENT_TOAST_SHOW,
        ToastPayload {
            text: text.to_string(),
        },
    );

    let app = app.clone();
    let toaster = toaster.clone();
    tauri::async_runtime::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(TOAST_HIDE_DELAY_MS)).await;
        if toaster.is_current(generation) {
            let _ = app.emit(EVENT_TOAST_HIDE, ());
        }
    });
}
