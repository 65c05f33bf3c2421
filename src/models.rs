use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Timestamp = i64;

pub const DEFAULT_LIST_NAME: &str = "My Day";

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Priority values outside 1..=3 collapse to the middle priority, matching
/// what the add/edit forms submit for a missing or garbled selection.
pub fn coerce_prio(raw: Option<i64>) -> u8 {
    match raw {
        Some(p @ 1..=3) => p as u8,
        _ => 2,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Manual,
    Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub done: bool,
    pub created_at: Timestamp,
    pub prio: u8,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

/// The single persisted blob. `lists` is never empty and `active_list_id`
/// always references a member once the state has passed through
/// `AppState::new` (stale ids heal to the first list).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    pub schema_version: u32,
    pub active_list_id: String,
    #[serde(default)]
    pub sort_mode: SortMode,
    pub lists: Vec<List>,
}

impl PersistedState {
    pub fn default_state() -> Self {
        let id = new_id();
        Self {
            schema_version: crate::migrate::SCHEMA_VERSION,
            active_list_id: id.clone(),
            sort_mode: SortMode::Manual,
            lists: vec![List {
                id,
                name: DEFAULT_LIST_NAME.to_string(),
                tasks: Vec::new(),
            }],
        }
    }
}

/// Raw form submission for creating a task or saving the edit prompt.
/// `tags` is the comma-separated string the user typed; normalization
/// happens in the command layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub text: String,
    #[serde(default)]
    pub prio: Option<i64>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
}

/// Cleaned field updates applied to an existing task. Fields left as `None`
/// keep their current value.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub text: Option<String>,
    pub prio: Option<u8>,
    pub time: Option<String>,
    pub tags: Option<Vec<String>>,
}
