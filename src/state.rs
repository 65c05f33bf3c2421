use std::sync::{Arc, Mutex};

use crate::models::{new_id, List, PersistedState, SortMode, Task, TaskPatch};

/// Shared in-memory state. All mutation goes through this container; commands
/// never reach into the data directly.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Mutex<PersistedState>>,
}

impl AppState {
    pub fn new(mut state: PersistedState) -> Self {
        heal(&mut state);
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    pub fn snapshot(&self) -> PersistedState {
        let guard = self.inner.lock().expect("state poisoned");
        guard.clone()
    }

    pub fn sort_mode(&self) -> SortMode {
        let guard = self.inner.lock().expect("state poisoned");
        guard.sort_mode
    }

    pub fn set_sort_mode(&self, mode: SortMode) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.sort_mode = mode;
    }

    pub fn active_list_id(&self) -> String {
        let guard = self.inner.lock().expect("state poisoned");
        guard.active_list_id.clone()
    }

    /// Switches the active list. Unknown ids leave the state untouched.
    pub fn set_active_list(&self, id: &str) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        if !guard.lists.iter().any(|l| l.id == id) {
            return false;
        }
        guard.active_list_id = id.to_string();
        true
    }

    pub fn list_count(&self) -> usize {
        let guard = self.inner.lock().expect("state poisoned");
        guard.lists.len()
    }

    pub fn list(&self, id: &str) -> Option<List> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.lists.iter().find(|l| l.id == id).cloned()
    }

    /// Creates a list from an already-trimmed name, inserts it at the head of
    /// the sequence, and makes it active.
    pub fn add_list(&self, name: String) -> List {
        let mut guard = self.inner.lock().expect("state poisoned");
        let list = List {
            id: new_id(),
            name,
            tasks: Vec::new(),
        };
        guard.active_list_id = list.id.clone();
        guard.lists.insert(0, list.clone());
        list
    }

    pub fn rename_list(&self, id: &str, name: String) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        match guard.lists.iter_mut().find(|l| l.id == id) {
            Some(list) => {
                list.name = name;
                true
            }
            None => false,
        }
    }

    /// Removes a list by id; the active pointer shifts to the new first list
    /// when the removed list was active. The caller guards the last-list case.
    pub fn remove_list(&self, id: &str) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        let before = guard.lists.len();
        guard.lists.retain(|l| l.id != id);
        if guard.lists.len() == before {
            return false;
        }
        if guard.active_list_id == id {
            guard.active_list_id = guard.lists[0].id.clone();
        }
        true
    }

    /// Prepends a task to the active list (most-recent-first).
    pub fn add_task(&self, task: Task) {
        let mut guard = self.inner.lock().expect("state poisoned");
        let index = active_index(&guard);
        guard.lists[index].tasks.insert(0, task);
    }

    pub fn find_task(&self, id: &str) -> Option<Task> {
        let guard = self.inner.lock().expect("state poisoned");
        let index = active_index(&guard);
        guard.lists[index].tasks.iter().find(|t| t.id == id).cloned()
    }

    /// Shallow-merges the patch into the task. Unknown ids are a no-op.
    pub fn update_task(&self, id: &str, patch: TaskPatch) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        let index = active_index(&guard);
        let Some(task) = guard.lists[index].tasks.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        if let Some(text) = patch.text {
            task.text = text;
        }
        if let Some(prio) = patch.prio {
            task.prio = prio;
        }
        if let Some(time) = patch.time {
            task.time = time;
        }
        if let Some(tags) = patch.tags {
            task.tags = tags;
        }
        true
    }

    /// Flips `done` and returns the new value, or `None` for unknown ids.
    pub fn toggle_task(&self, id: &str) -> Option<bool> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let index = active_index(&guard);
        let task = guard.lists[index].tasks.iter_mut().find(|t| t.id == id)?;
        task.done = !task.done;
        Some(task.done)
    }

    pub fn remove_task(&self, id: &str) -> bool {
        let mut guard = self.inner.lock().expect("state poisoned");
        let index = active_index(&guard);
        let before = guard.lists[index].tasks.len();
        guard.lists[index].tasks.retain(|t| t.id != id);
        guard.lists[index].tasks.len() != before
    }

    pub fn done_count(&self) -> usize {
        let guard = self.inner.lock().expect("state poisoned");
        let index = active_index(&guard);
        guard.lists[index].tasks.iter().filter(|t| t.done).count()
    }

    /// Removes every completed task from the active list and returns how many
    /// were dropped.
    pub fn clear_done(&self) -> usize {
        let mut guard = self.inner.lock().expect("state poisoned");
        let index = active_index(&guard);
        let before = guard.lists[index].tasks.len();
        guard.lists[index].tasks.retain(|t| !t.done);
        before - guard.lists[index].tasks.len()
    }

    /// Render order of the active list. Manual mode shows the stored order;
    /// priority mode is a derived view (stable sort, descending priority,
    /// ties by most recent creation) and leaves the stored order untouched.
    pub fn visible_tasks(&self) -> Vec<Task> {
        let guard = self.inner.lock().expect("state poisoned");
        let index = active_index(&guard);
        let mut tasks = guard.lists[index].tasks.clone();
        if guard.sort_mode == SortMode::Priority {
            tasks.sort_by(|a, b| {
                b.prio
                    .cmp(&a.prio)
                    .then_with(|| b.created_at.cmp(&a.created_at))
            });
        }
        tasks
    }

    /// Rewrites the active list's stored order to follow `ids`. Ids unknown to
    /// the model are skipped; model tasks missing from `ids` are appended at
    /// the end in their previous relative order, never dropped.
    pub fn reorder_active_tasks(&self, ids: &[String]) {
        let mut guard = self.inner.lock().expect("state poisoned");
        let index = active_index(&guard);
        let mut remaining: Vec<Task> = std::mem::take(&mut guard.lists[index].tasks);
        let mut ordered: Vec<Task> = Vec::with_capacity(remaining.len());
        for id in ids {
            if let Some(pos) = remaining.iter().position(|t| &t.id == id) {
                ordered.push(remaining.remove(pos));
            }
        }
        ordered.extend(remaining);
        guard.lists[index].tasks = ordered;
    }
}

/// Restores the §3 invariants on loaded data: `lists` non-empty and
/// `active_list_id` pointing at a member (stale pointers heal to the first
/// list).
fn heal(state: &mut PersistedState) {
    if state.lists.is_empty() {
        let fallback = PersistedState::default_state();
        state.lists = fallback.lists;
    }
    if !state.lists.iter().any(|l| l.id == state.active_list_id) {
        state.active_list_id = state.lists[0].id.clone();
    }
}

/// The active list's index, falling back to the first list when the pointer
/// is stale mid-call.
fn active_index(state: &PersistedState) -> usize {
    state
        .lists
        .iter()
        .position(|l| l.id == state.active_list_id)
        .unwrap_or(0)
}
