use serde::Serialize;

use crate::models::{List, SortMode, Task};

pub const EVENT_STATE_UPDATED: &str = "state_updated";
pub const EVENT_DIALOG_CHANGED: &str = "dialog_changed";
pub const EVENT_TOAST_SHOW: &str = "toast_show";
pub const EVENT_TOAST_HIDE: &str = "toast_hide";

/// Full projection pushed to the frontend after every mutation. The view
/// rebuilds the sidebar from `lists` and the task panel from
/// `visible_tasks`, which already carries the sort-mode-derived order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePayload {
    pub active_list_id: String,
    pub sort_mode: SortMode,
    pub lists: Vec<List>,
    pub visible_tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToastPayload {
    pub text: String,
}
