use std::path::PathBuf;

use chrono::Utc;
use serde_json::Value;

use crate::dialog::{Dialog, DialogField, Dialogs, PendingAction, SelectOption};
use crate::drag::DragController;
use crate::events::StatePayload;
use crate::models::{coerce_prio, new_id, List, SortMode, Task, TaskInput, TaskPatch};
use crate::state::AppState;
use crate::storage::{Storage, StorageError};
use crate::tags::normalize_tags;

#[cfg(all(feature = "app", not(test)))]
use crate::events::{EVENT_DIALOG_CHANGED, EVENT_STATE_UPDATED};
#[cfg(all(feature = "app", not(test)))]
use crate::toast::Toaster;
#[cfg(all(feature = "app", not(test)))]
use tauri::{AppHandle, Emitter, Manager, Runtime, State};

#[derive(Debug, serde::Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

trait CommandCtx {
    fn app_data_dir(&self) -> Result<PathBuf, StorageError>;
    fn emit_state_updated(&self, payload: StatePayload);
    fn emit_dialog_changed(&self, dialog: Option<Dialog>);
    fn show_toast(&self, text: &str);
}

fn ok<T>(data: T) -> CommandResult<T> {
    CommandResult {
        ok: true,
        data: Some(data),
        error: None,
    }
}

fn err<T>(message: &str) -> CommandResult<T> {
    CommandResult {
        ok: false,
        data: None,
        error: Some(message.to_string()),
    }
}

fn state_payload(state: &AppState) -> StatePayload {
    let snapshot = state.snapshot();
    StatePayload {
        active_list_id: snapshot.active_list_id,
        sort_mode: snapshot.sort_mode,
        lists: snapshot.lists,
        visible_tasks: state.visible_tasks(),
    }
}

fn persist(ctx: &impl CommandCtx, state: &AppState) -> Result<(), StorageError> {
    let root = ctx.app_data_dir()?;
    let storage = Storage::new(root);
    storage.ensure_dirs()?;
    storage.save_state(&state.snapshot())?;
    ctx.emit_state_updated(state_payload(state));
    Ok(())
}

/// Validation failures surface as a blocking alert; any dialog already on
/// screen (e.g. the prompt that produced the bad input) is replaced.
fn alert(ctx: &impl CommandCtx, dialogs: &Dialogs, title: &str, body: &str) {
    let dialog = dialogs.open(Dialog::alert(title, body));
    ctx.emit_dialog_changed(Some(dialog));
}

fn open_dialog(ctx: &impl CommandCtx, dialogs: &Dialogs, dialog: Dialog) {
    let dialog = dialogs.open(dialog);
    ctx.emit_dialog_changed(Some(dialog));
}

fn prio_options() -> Vec<SelectOption> {
    [(1, "Low"), (2, "Medium"), (3, "High")]
        .into_iter()
        .map(|(value, label)| SelectOption {
            value: value.to_string(),
            label: label.to_string(),
        })
        .collect()
}

type DialogValues = serde_json::Map<String, Value>;

fn field_str(values: Option<&DialogValues>, key: &str) -> String {
    values
        .and_then(|v| v.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Select inputs submit their value as a string; tolerate both shapes.
fn field_i64(values: Option<&DialogValues>, key: &str) -> Option<i64> {
    match values?.get(key)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn load_state_impl(state: &AppState) -> CommandResult<StatePayload> {
    ok(state_payload(state))
}

fn create_list_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    dialogs: &Dialogs,
    name: String,
) -> CommandResult<List> {
    let name = name.trim();
    if name.is_empty() {
        alert(ctx, dialogs, "List not created", "Enter a list name.");
        return err("list name is empty");
    }
    let list = state.add_list(name.to_string());
    if let Err(error) = persist(ctx, state) {
        return err(&format!("storage error: {error:?}"));
    }
    ctx.show_toast("List created");
    ok(list)
}

fn request_rename_list_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    dialogs: &Dialogs,
    list_id: String,
) -> CommandResult<bool> {
    // Stale handler after a concurrent delete: silently do nothing.
    let Some(list) = state.list(&list_id) else {
        return ok(false);
    };
    open_dialog(
        ctx,
        dialogs,
        Dialog::prompt(
            "Rename list",
            vec![DialogField::text("name", "Name", &list.name)],
            PendingAction::RenameList { list_id },
        ),
    );
    ok(true)
}

fn request_delete_list_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    dialogs: &Dialogs,
    list_id: String,
) -> CommandResult<bool> {
    if state.list_count() == 1 {
        alert(ctx, dialogs, "Not allowed", "At least one list is required.");
        return err("cannot delete the last list");
    }
    let Some(list) = state.list(&list_id) else {
        return ok(false);
    };
    open_dialog(
        ctx,
        dialogs,
        Dialog::confirm(
            "Delete list",
            &format!("Delete the list \"{}\"?", list.name),
            "Delete",
            PendingAction::DeleteList { list_id },
        ),
    );
    ok(true)
}

fn set_active_list_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    list_id: String,
) -> CommandResult<bool> {
    if !state.set_active_list(&list_id) {
        return ok(false);
    }
    if let Err(error) = persist(ctx, state) {
        return err(&format!("storage error: {error:?}"));
    }
    ok(true)
}

fn set_sort_mode_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    mode: SortMode,
) -> CommandResult<SortMode> {
    state.set_sort_mode(mode);
    if let Err(error) = persist(ctx, state) {
        return err(&format!("storage error: {error:?}"));
    }
    ok(mode)
}

fn create_task_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    dialogs: &Dialogs,
    input: TaskInput,
) -> CommandResult<Task> {
    let text = input.text.trim();
    if text.is_empty() {
        alert(ctx, dialogs, "Task not added", "Enter a task description.");
        return err("task text is empty");
    }
    let task = Task {
        id: new_id(),
        text: text.to_string(),
        done: false,
        created_at: Utc::now().timestamp_millis(),
        prio: coerce_prio(input.prio),
        time: input.time.as_deref().unwrap_or_default().trim().to_string(),
        tags: normalize_tags(input.tags.as_deref().unwrap_or_default()),
    };
    state.add_task(task.clone());
    if let Err(error) = persist(ctx, state) {
        return err(&format!("storage error: {error:?}"));
    }
    ctx.show_toast("Task added");
    ok(task)
}

fn request_edit_task_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    dialogs: &Dialogs,
    task_id: String,
) -> CommandResult<bool> {
    let Some(task) = state.find_task(&task_id) else {
        return ok(false);
    };
    open_dialog(
        ctx,
        dialogs,
        Dialog::prompt(
            "Edit task",
            vec![
                DialogField::text("text", "Description", &task.text),
                DialogField::select("prio", "Priority", &task.prio.to_string(), prio_options()),
                DialogField::time("time", "Time", &task.time),
                DialogField::text("tags", "Tags, comma-separated", &task.tags.join(", ")),
            ],
            PendingAction::EditTask { task_id },
        ),
    );
    ok(true)
}

fn toggle_task_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    task_id: String,
) -> CommandResult<bool> {
    let Some(done) = state.toggle_task(&task_id) else {
        return ok(false);
    };
    if let Err(error) = persist(ctx, state) {
        return err(&format!("storage error: {error:?}"));
    }
    ok(done)
}

fn request_delete_task_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    dialogs: &Dialogs,
    task_id: String,
) -> CommandResult<bool> {
    let Some(task) = state.find_task(&task_id) else {
        return ok(false);
    };
    open_dialog(
        ctx,
        dialogs,
        Dialog::confirm(
            "Delete task",
            &format!("Delete the task \"{}\"?", task.text),
            "Delete",
            PendingAction::DeleteTask { task_id },
        ),
    );
    ok(true)
}

fn request_clear_done_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    dialogs: &Dialogs,
) -> CommandResult<bool> {
    if state.done_count() == 0 {
        ctx.show_toast("No completed tasks");
        return ok(false);
    }
    open_dialog(
        ctx,
        dialogs,
        Dialog::confirm(
            "Clear completed",
            "Remove all completed tasks?",
            "Clear",
            PendingAction::ClearDone,
        ),
    );
    ok(true)
}

/// Runs the action the confirmed dialog was holding. `values` carries the
/// prompt field submissions; confirm dialogs send none. A dialog id that no
/// longer matches the open dialog resolves to nothing.
fn confirm_dialog_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    dialogs: &Dialogs,
    dialog_id: String,
    values: Option<DialogValues>,
) -> CommandResult<bool> {
    let Some(action) = dialogs.resolve(&dialog_id) else {
        return ok(false);
    };
    ctx.emit_dialog_changed(None);

    match action {
        PendingAction::Acknowledge => ok(true),
        PendingAction::DeleteList { list_id } => {
            if !state.remove_list(&list_id) {
                return ok(false);
            }
            if let Err(error) = persist(ctx, state) {
                return err(&format!("storage error: {error:?}"));
            }
            ctx.show_toast("List deleted");
            ok(true)
        }
        PendingAction::DeleteTask { task_id } => {
            if !state.remove_task(&task_id) {
                return ok(false);
            }
            if let Err(error) = persist(ctx, state) {
                return err(&format!("storage error: {error:?}"));
            }
            ctx.show_toast("Task deleted");
            ok(true)
        }
        PendingAction::ClearDone => {
            let removed = state.clear_done();
            if let Err(error) = persist(ctx, state) {
                return err(&format!("storage error: {error:?}"));
            }
            ctx.show_toast("Cleared");
            ok(removed > 0)
        }
        PendingAction::RenameList { list_id } => {
            let name = field_str(values.as_ref(), "name");
            let name = name.trim();
            if name.is_empty() {
                alert(ctx, dialogs, "Rename failed", "The list name must not be empty.");
                return err("list name is empty");
            }
            if !state.rename_list(&list_id, name.to_string()) {
                return ok(false);
            }
            if let Err(error) = persist(ctx, state) {
                return err(&format!("storage error: {error:?}"));
            }
            ctx.show_toast("Saved");
            ok(true)
        }
        PendingAction::EditTask { task_id } => {
            let text = field_str(values.as_ref(), "text");
            let text = text.trim();
            if text.is_empty() {
                alert(
                    ctx,
                    dialogs,
                    "Edit failed",
                    "The task description must not be empty.",
                );
                return err("task text is empty");
            }
            let patch = TaskPatch {
                text: Some(text.to_string()),
                prio: Some(coerce_prio(field_i64(values.as_ref(), "prio"))),
                time: Some(field_str(values.as_ref(), "time").trim().to_string()),
                tags: Some(normalize_tags(&field_str(values.as_ref(), "tags"))),
            };
            if !state.update_task(&task_id, patch) {
                return ok(false);
            }
            if let Err(error) = persist(ctx, state) {
                return err(&format!("storage error: {error:?}"));
            }
            ctx.show_toast("Task updated");
            ok(true)
        }
    }
}

fn dismiss_dialog_impl(ctx: &impl CommandCtx, dialogs: &Dialogs) -> CommandResult<bool> {
    dialogs.close();
    ctx.emit_dialog_changed(None);
    ok(true)
}

fn begin_drag_impl(
    state: &AppState,
    drag: &DragController,
    task_id: String,
) -> CommandResult<bool> {
    let visible: Vec<String> = state.visible_tasks().into_iter().map(|t| t.id).collect();
    ok(drag.begin(&task_id, visible))
}

fn drag_over_impl(
    drag: &DragController,
    target_id: String,
    before: bool,
) -> CommandResult<Vec<String>> {
    drag.move_over(&target_id, before);
    match drag.preview() {
        Some(order) => ok(order),
        None => err("no active drag"),
    }
}

fn commit_drag_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    drag: &DragController,
) -> CommandResult<bool> {
    let Some(order) = drag.commit() else {
        return ok(false);
    };
    state.reorder_active_tasks(&order);
    // A reorder gesture overrides the priority display.
    if state.sort_mode() != SortMode::Manual {
        state.set_sort_mode(SortMode::Manual);
    }
    if let Err(error) = persist(ctx, state) {
        return err(&format!("storage error: {error:?}"));
    }
    ctx.show_toast("Order changed");
    ok(true)
}

fn cancel_drag_impl(
    ctx: &impl CommandCtx,
    state: &AppState,
    drag: &DragController,
) -> CommandResult<bool> {
    if !drag.cancel() {
        return ok(false);
    }
    // Nothing was mutated; re-emit so the view snaps back to the stored order.
    ctx.emit_state_updated(state_payload(state));
    ok(true)
}

#[cfg(all(feature = "app", not(test)))]
struct TauriCommandCtx<'a, R: Runtime> {
    app: &'a AppHandle<R>,
}

#[cfg(all(feature = "app", not(test)))]
impl<R: Runtime> CommandCtx for TauriCommandCtx<'_, R> {
    fn app_data_dir(&self) -> Result<PathBuf, StorageError> {
        self.app
            .path()
            .app_data_dir()
            .map_err(|err| StorageError::Io(std::io::Error::other(err.to_string())))
    }

    fn emit_state_updated(&self, payload: StatePayload) {
        let _ = self.app.emit(EVENT_STATE_UPDATED, payload);
    }

    fn emit_dialog_changed(&self, dialog: Option<Dialog>) {
        let _ = self.app.emit(EVENT_DIALOG_CHANGED, dialog);
    }

    fn show_toast(&self, text: &str) {
        let toaster = self.app.state::<Toaster>();
        crate::toast::show_toast(self.app, &toaster, text);
    }
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn load_state(state: State<AppState>) -> CommandResult<StatePayload> {
    load_state_impl(state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn create_list(
    app: AppHandle,
    state: State<AppState>,
    dialogs: State<Dialogs>,
    name: String,
) -> CommandResult<List> {
    let ctx = TauriCommandCtx { app: &app };
    create_list_impl(&ctx, state.inner(), dialogs.inner(), name)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn request_rename_list(
    app: AppHandle,
    state: State<AppState>,
    dialogs: State<Dialogs>,
    list_id: String,
) -> CommandResult<bool> {
    let ctx = TauriCommandCtx { app: &app };
    request_rename_list_impl(&ctx, state.inner(), dialogs.inner(), list_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn request_delete_list(
    app: AppHandle,
    state: State<AppState>,
    dialogs: State<Dialogs>,
    list_id: String,
) -> CommandResult<bool> {
    let ctx = TauriCommandCtx { app: &app };
    request_delete_list_impl(&ctx, state.inner(), dialogs.inner(), list_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn set_active_list(
    app: AppHandle,
    state: State<AppState>,
    list_id: String,
) -> CommandResult<bool> {
    let ctx = TauriCommandCtx { app: &app };
    set_active_list_impl(&ctx, state.inner(), list_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn set_sort_mode(
    app: AppHandle,
    state: State<AppState>,
    mode: SortMode,
) -> CommandResult<SortMode> {
    let ctx = TauriCommandCtx { app: &app };
    set_sort_mode_impl(&ctx, state.inner(), mode)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn create_task(
    app: AppHandle,
    state: State<AppState>,
    dialogs: State<Dialogs>,
    input: TaskInput,
) -> CommandResult<Task> {
    let ctx = TauriCommandCtx { app: &app };
    create_task_impl(&ctx, state.inner(), dialogs.inner(), input)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn request_edit_task(
    app: AppHandle,
    state: State<AppState>,
    dialogs: State<Dialogs>,
    task_id: String,
) -> CommandResult<bool> {
    let ctx = TauriCommandCtx { app: &app };
    request_edit_task_impl(&ctx, state.inner(), dialogs.inner(), task_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn toggle_task(app: AppHandle, state: State<AppState>, task_id: String) -> CommandResult<bool> {
    let ctx = TauriCommandCtx { app: &app };
    toggle_task_impl(&ctx, state.inner(), task_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn request_delete_task(
    app: AppHandle,
    state: State<AppState>,
    dialogs: State<Dialogs>,
    task_id: String,
) -> CommandResult<bool> {
    let ctx = TauriCommandCtx { app: &app };
    request_delete_task_impl(&ctx, state.inner(), dialogs.inner(), task_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn request_clear_done(
    app: AppHandle,
    state: State<AppState>,
    dialogs: State<Dialogs>,
) -> CommandResult<bool> {
    let ctx = TauriCommandCtx { app: &app };
    request_clear_done_impl(&ctx, state.inner(), dialogs.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn confirm_dialog(
    app: AppHandle,
    state: State<AppState>,
    dialogs: State<Dialogs>,
    dialog_id: String,
    values: Option<serde_json::Map<String, Value>>,
) -> CommandResult<bool> {
    let ctx = TauriCommandCtx { app: &app };
    confirm_dialog_impl(&ctx, state.inner(), dialogs.inner(), dialog_id, values)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn dismiss_dialog(app: AppHandle, dialogs: State<Dialogs>) -> CommandResult<bool> {
    let ctx = TauriCommandCtx { app: &app };
    dismiss_dialog_impl(&ctx, dialogs.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn begin_drag(
    state: State<AppState>,
    drag: State<DragController>,
    task_id: String,
) -> CommandResult<bool> {
    begin_drag_impl(state.inner(), drag.inner(), task_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn drag_over(
    drag: State<DragController>,
    target_id: String,
    before: bool,
) -> CommandResult<Vec<String>> {
    drag_over_impl(drag.inner(), target_id, before)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn commit_drag(
    app: AppHandle,
    state: State<AppState>,
    drag: State<DragController>,
) -> CommandResult<bool> {
    let ctx = TauriCommandCtx { app: &app };
    commit_drag_impl(&ctx, state.inner(), drag.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn cancel_drag(
    app: AppHandle,
    state: State<AppState>,
    drag: State<DragController>,
) -> CommandResult<bool> {
    let ctx = TauriCommandCtx { app: &app };
    cancel_drag_impl(&ctx, state.inner(), drag.inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::DialogKind;
    use crate::models::PersistedState;
    use std::sync::Mutex;

    struct TestCtx {
        root: tempfile::TempDir,
        app_data_dir_error: Option<String>,
        emitted: Mutex<Vec<StatePayload>>,
        dialog_events: Mutex<Vec<Option<Dialog>>>,
        toasts: Mutex<Vec<String>>,
    }

    impl TestCtx {
        fn new() -> Self {
            Self {
                root: tempfile::tempdir().unwrap(),
                app_data_dir_error: None,
                emitted: Mutex::new(Vec::new()),
                dialog_events: Mutex::new(Vec::new()),
                toasts: Mutex::new(Vec::new()),
            }
        }

        fn with_app_data_dir_error(message: &str) -> Self {
            let mut ctx = Self::new();
            ctx.app_data_dir_error = Some(message.to_string());
            ctx
        }

        fn root_path(&self) -> &std::path::Path {
            self.root.path()
        }

        fn state_file_exists(&self) -> bool {
            self.root_path().join("state.json").is_file()
        }

        fn toasts(&self) -> Vec<String> {
            self.toasts.lock().unwrap().clone()
        }

        fn emitted_count(&self) -> usize {
            self.emitted.lock().unwrap().len()
        }

        fn last_payload(&self) -> StatePayload {
            self.emitted.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl CommandCtx for TestCtx {
        fn app_data_dir(&self) -> Result<PathBuf, StorageError> {
            if let Some(message) = &self.app_data_dir_error {
                return Err(StorageError::Io(std::io::Error::other(message.clone())));
            }
            Ok(self.root.path().to_path_buf())
        }

        fn emit_state_updated(&self, payload: StatePayload) {
            self.emitted.lock().unwrap().push(payload);
        }

        fn emit_dialog_changed(&self, dialog: Option<Dialog>) {
            self.dialog_events.lock().unwrap().push(dialog);
        }

        fn show_toast(&self, text: &str) {
            self.toasts.lock().unwrap().push(text.to_string());
        }
    }

    fn make_env() -> (TestCtx, AppState, Dialogs, DragController) {
        (
            TestCtx::new(),
            AppState::new(PersistedState::default_state()),
            Dialogs::default(),
            DragController::default(),
        )
    }

    fn add_task(ctx: &TestCtx, state: &AppState, dialogs: &Dialogs, text: &str, prio: i64) -> Task {
        let res = create_task_impl(
            ctx,
            state,
            dialogs,
            TaskInput {
                text: text.to_string(),
                prio: Some(prio),
                ..TaskInput::default()
            },
        );
        assert!(res.ok);
        res.data.unwrap()
    }

    fn confirm_open(ctx: &TestCtx, state: &AppState, dialogs: &Dialogs) -> CommandResult<bool> {
        let dialog = dialogs.current().expect("a dialog should be open");
        confirm_dialog_impl(ctx, state, dialogs, dialog.id, None)
    }

    #[test]
    fn ok_and_err_helpers_construct_expected_shape() {
        let r = ok(123);
        assert!(r.ok);
        assert_eq!(r.data, Some(123));
        assert_eq!(r.error, None);

        let r: CommandResult<i32> = err("nope");
        assert!(!r.ok);
        assert_eq!(r.data, None);
        assert_eq!(r.error, Some("nope".to_string()));
    }

    #[test]
    fn load_state_returns_the_current_projection() {
        let (_ctx, state, _dialogs, _drag) = make_env();
        let res = load_state_impl(&state);
        assert!(res.ok);
        let payload = res.data.unwrap();
        assert_eq!(payload.lists.len(), 1);
        assert_eq!(payload.active_list_id, payload.lists[0].id);
        assert!(payload.visible_tasks.is_empty());
    }

    #[test]
    fn create_list_adds_at_head_activates_and_persists() {
        let (ctx, state, dialogs, _drag) = make_env();

        let res = create_list_impl(&ctx, &state, &dialogs, "  Groceries  ".to_string());
        assert!(res.ok);
        let list = res.data.unwrap();
        assert_eq!(list.name, "Groceries");

        assert_eq!(state.list_count(), 2);
        let snapshot = state.snapshot();
        assert_eq!(snapshot.lists[0].id, list.id);
        assert_eq!(snapshot.active_list_id, list.id);

        assert!(ctx.state_file_exists());
        assert_eq!(ctx.emitted_count(), 1);
        assert_eq!(ctx.toasts(), vec!["List created"]);
    }

    #[test]
    fn create_list_rejects_blank_names_with_an_alert_and_no_mutation() {
        let (ctx, state, dialogs, _drag) = make_env();

        let res = create_list_impl(&ctx, &state, &dialogs, "   ".to_string());
        assert!(!res.ok);
        assert_eq!(state.list_count(), 1);
        assert!(!ctx.state_file_exists());
        assert!(ctx.toasts().is_empty());

        let dialog = dialogs.current().expect("alert should be open");
        assert_eq!(dialog.kind, DialogKind::Alert);
        assert_eq!(dialog.title, "List not created");
    }

    #[test]
    fn create_list_surfaces_storage_errors() {
        let ctx = TestCtx::with_app_data_dir_error("nope");
        let state = AppState::new(PersistedState::default_state());
        let dialogs = Dialogs::default();
        let res = create_list_impl(&ctx, &state, &dialogs, "Groceries".to_string());
        assert!(!res.ok);
        assert!(res.error.unwrap().contains("storage error"));
    }

    #[test]
    fn delete_list_refuses_the_sole_remaining_list() {
        let (ctx, state, dialogs, _drag) = make_env();
        let only = state.active_list_id();

        let res = request_delete_list_impl(&ctx, &state, &dialogs, only);
        assert!(!res.ok);
        assert_eq!(state.list_count(), 1);
        assert!(!ctx.state_file_exists());

        let dialog = dialogs.current().expect("alert should be open");
        assert_eq!(dialog.kind, DialogKind::Alert);
        assert_eq!(dialog.title, "Not allowed");
    }

    #[test]
    fn delete_list_commits_only_after_explicit_confirmation() {
        let (ctx, state, dialogs, _drag) = make_env();
        let first = state.active_list_id();
        let second = create_list_impl(&ctx, &state, &dialogs, "Second".to_string())
            .data
            .unwrap();

        let res = request_delete_list_impl(&ctx, &state, &dialogs, second.id.clone());
        assert!(res.ok);
        // Requesting only opens the dialog; nothing is deleted yet.
        assert_eq!(state.list_count(), 2);
        let dialog = dialogs.current().expect("confirm should be open");
        assert_eq!(dialog.kind, DialogKind::Confirm);
        assert!(dialog.body.contains("Second"));

        let res = confirm_open(&ctx, &state, &dialogs);
        assert!(res.ok);
        assert_eq!(state.list_count(), 1);
        // The deleted list was active, so the pointer shifted to the first.
        assert_eq!(state.active_list_id(), first);
        assert!(ctx.toasts().contains(&"List deleted".to_string()));
        assert!(dialogs.current().is_none());
    }

    #[test]
    fn dismiss_and_stale_confirm_never_fire_the_pending_action() {
        let (ctx, state, dialogs, _drag) = make_env();
        let second = create_list_impl(&ctx, &state, &dialogs, "Second".to_string())
            .data
            .unwrap();

        request_delete_list_impl(&ctx, &state, &dialogs, second.id.clone());
        let dialog = dialogs.current().unwrap();

        // Dismissing closes without deleting.
        let res = dismiss_dialog_impl(&ctx, &dialogs);
        assert!(res.ok);
        assert_eq!(state.list_count(), 2);

        // Confirming the already-dismissed dialog id is a silent no-op.
        let res = confirm_dialog_impl(&ctx, &state, &dialogs, dialog.id, None);
        assert!(res.ok);
        assert_eq!(res.data, Some(false));
        assert_eq!(state.list_count(), 2);
    }

    #[test]
    fn delete_list_with_unknown_id_is_a_silent_no_op() {
        let (ctx, state, dialogs, _drag) = make_env();
        create_list_impl(&ctx, &state, &dialogs, "Second".to_string());

        let res = request_delete_list_impl(&ctx, &state, &dialogs, "ghost".to_string());
        assert!(res.ok);
        assert_eq!(res.data, Some(false));
        assert!(dialogs.current().is_none());
    }

    #[test]
    fn rename_list_flow_prefills_validates_and_saves() {
        let (ctx, state, dialogs, _drag) = make_env();
        let list_id = state.active_list_id();

        // Unknown id: silent no-op, no dialog.
        let res = request_rename_list_impl(&ctx, &state, &dialogs, "ghost".to_string());
        assert!(res.ok);
        assert_eq!(res.data, Some(false));
        assert!(dialogs.current().is_none());

        let res = request_rename_list_impl(&ctx, &state, &dialogs, list_id.clone());
        assert!(res.ok);
        let dialog = dialogs.current().unwrap();
        assert_eq!(dialog.kind, DialogKind::Prompt);
        assert_eq!(dialog.fields[0].value, "My Day");

        // Submitting a blank name replaces the prompt with an alert and keeps
        // the old name.
        let mut values = DialogValues::new();
        values.insert("name".to_string(), Value::from("   "));
        let res = confirm_dialog_impl(&ctx, &state, &dialogs, dialog.id, Some(values));
        assert!(!res.ok);
        assert_eq!(state.snapshot().lists[0].name, "My Day");
        let alert = dialogs.current().expect("alert should replace the prompt");
        assert_eq!(alert.kind, DialogKind::Alert);

        // A fresh prompt with a valid name goes through.
        request_rename_list_impl(&ctx, &state, &dialogs, list_id).data.unwrap();
        let dialog = dialogs.current().unwrap();
        let mut values = DialogValues::new();
        values.insert("name".to_string(), Value::from("  Focus  "));
        let res = confirm_dialog_impl(&ctx, &state, &dialogs, dialog.id, Some(values));
        assert!(res.ok);
        assert_eq!(state.snapshot().lists[0].name, "Focus");
        assert!(ctx.toasts().contains(&"Saved".to_string()));
    }

    #[test]
    fn create_task_prepends_with_defaults_and_normalized_input() {
        let (ctx, state, dialogs, _drag) = make_env();

        // Scenario: default state plus one plain task.
        let res = create_task_impl(
            &ctx,
            &state,
            &dialogs,
            TaskInput {
                text: "Buy milk".to_string(),
                prio: Some(2),
                time: Some("".to_string()),
                tags: Some("".to_string()),
            },
        );
        assert!(res.ok);
        let task = res.data.unwrap();
        assert!(!task.done);
        assert_eq!(task.prio, 2);
        assert!(task.tags.is_empty());
        assert_eq!(state.snapshot().lists[0].tasks.len(), 1);
        assert_eq!(ctx.toasts(), vec!["Task added"]);

        // Garbled prio collapses to mid; time is trimmed; tags normalize.
        let res = create_task_impl(
            &ctx,
            &state,
            &dialogs,
            TaskInput {
                text: "  Call mom  ".to_string(),
                prio: Some(99),
                time: Some(" 18:30 ".to_string()),
                tags: Some("Family, family, CALLS".to_string()),
            },
        );
        let task = res.data.unwrap();
        assert_eq!(task.text, "Call mom");
        assert_eq!(task.prio, 2);
        assert_eq!(task.time, "18:30");
        assert_eq!(task.tags, vec!["Family", "CALLS"]);

        // Most-recent-first: the new task sits at the head.
        let stored = state.snapshot().lists[0].tasks.clone();
        assert_eq!(stored[0].text, "Call mom");
        assert_eq!(stored[1].text, "Buy milk");
    }

    #[test]
    fn create_task_rejects_blank_text_with_an_alert() {
        let (ctx, state, dialogs, _drag) = make_env();
        let res = create_task_impl(
            &ctx,
            &state,
            &dialogs,
            TaskInput {
                text: "   ".to_string(),
                ..TaskInput::default()
            },
        );
        assert!(!res.ok);
        assert!(state.snapshot().lists[0].tasks.is_empty());
        assert!(!ctx.state_file_exists());
        let dialog = dialogs.current().unwrap();
        assert_eq!(dialog.title, "Task not added");
    }

    #[test]
    fn edit_task_flow_prefills_and_applies_the_patch() {
        let (ctx, state, dialogs, _drag) = make_env();
        let task = add_task(&ctx, &state, &dialogs, "Original", 1);

        // Unknown id: silent no-op.
        let res = request_edit_task_impl(&ctx, &state, &dialogs, "ghost".to_string());
        assert_eq!(res.data, Some(false));
        assert!(dialogs.current().is_none());

        let res = request_edit_task_impl(&ctx, &state, &dialogs, task.id.clone());
        assert!(res.ok);
        let dialog = dialogs.current().unwrap();
        assert_eq!(dialog.kind, DialogKind::Prompt);
        assert_eq!(dialog.fields[0].value, "Original");
        assert_eq!(dialog.fields[1].value, "1");
        assert_eq!(dialog.fields[1].options.len(), 3);

        let mut values = DialogValues::new();
        values.insert("text".to_string(), Value::from(" Updated "));
        values.insert("prio".to_string(), Value::from("3"));
        values.insert("time".to_string(), Value::from("07:45"));
        values.insert("tags".to_string(), Value::from("a, b, a"));
        let res = confirm_dialog_impl(&ctx, &state, &dialogs, dialog.id, Some(values));
        assert!(res.ok);

        let updated = state.find_task(&task.id).unwrap();
        assert_eq!(updated.text, "Updated");
        assert_eq!(updated.prio, 3);
        assert_eq!(updated.time, "07:45");
        assert_eq!(updated.tags, vec!["a", "b"]);
        assert!(ctx.toasts().contains(&"Task updated".to_string()));
    }

    #[test]
    fn edit_task_rejects_blank_text_and_keeps_the_task() {
        let (ctx, state, dialogs, _drag) = make_env();
        let task = add_task(&ctx, &state, &dialogs, "Keep me", 2);

        request_edit_task_impl(&ctx, &state, &dialogs, task.id.clone());
        let dialog = dialogs.current().unwrap();
        let mut values = DialogValues::new();
        values.insert("text".to_string(), Value::from(""));
        let res = confirm_dialog_impl(&ctx, &state, &dialogs, dialog.id, Some(values));
        assert!(!res.ok);
        assert_eq!(state.find_task(&task.id).unwrap().text, "Keep me");
        assert_eq!(dialogs.current().unwrap().title, "Edit failed");
    }

    #[test]
    fn edit_task_confirm_after_deletion_is_a_silent_no_op() {
        let (ctx, state, dialogs, _drag) = make_env();
        let task = add_task(&ctx, &state, &dialogs, "Vanishing", 2);

        request_edit_task_impl(&ctx, &state, &dialogs, task.id.clone());
        let dialog = dialogs.current().unwrap();
        state.remove_task(&task.id);

        let mut values = DialogValues::new();
        values.insert("text".to_string(), Value::from("whatever"));
        let res = confirm_dialog_impl(&ctx, &state, &dialogs, dialog.id, Some(values));
        assert!(res.ok);
        assert_eq!(res.data, Some(false));
    }

    #[test]
    fn toggle_task_flips_done_and_ignores_unknown_ids() {
        let (ctx, state, dialogs, _drag) = make_env();
        let task = add_task(&ctx, &state, &dialogs, "Toggle me", 2);
        let emitted_before = ctx.emitted_count();

        let res = toggle_task_impl(&ctx, &state, task.id.clone());
        assert!(res.ok);
        assert_eq!(res.data, Some(true));
        assert!(state.find_task(&task.id).unwrap().done);
        assert_eq!(ctx.emitted_count(), emitted_before + 1);

        // Unknown id: nothing flips, nothing persists, nothing emits.
        let res = toggle_task_impl(&ctx, &state, "ghost".to_string());
        assert!(res.ok);
        assert_eq!(res.data, Some(false));
        assert_eq!(ctx.emitted_count(), emitted_before + 1);
    }

    #[test]
    fn delete_task_commits_only_after_confirmation() {
        let (ctx, state, dialogs, _drag) = make_env();
        let task = add_task(&ctx, &state, &dialogs, "Doomed", 2);

        let res = request_delete_task_impl(&ctx, &state, &dialogs, "ghost".to_string());
        assert_eq!(res.data, Some(false));
        assert!(dialogs.current().is_none());

        request_delete_task_impl(&ctx, &state, &dialogs, task.id.clone());
        assert!(state.find_task(&task.id).is_some());
        let dialog = dialogs.current().unwrap();
        assert!(dialog.body.contains("Doomed"));

        let res = confirm_dialog_impl(&ctx, &state, &dialogs, dialog.id, None);
        assert!(res.ok);
        assert!(state.find_task(&task.id).is_none());
        assert!(ctx.toasts().contains(&"Task deleted".to_string()));
    }

    #[test]
    fn clear_done_with_no_completed_tasks_only_toasts() {
        let (ctx, state, dialogs, _drag) = make_env();
        add_task(&ctx, &state, &dialogs, "Open task", 2);
        let emitted_before = ctx.emitted_count();

        let res = request_clear_done_impl(&ctx, &state, &dialogs);
        assert!(res.ok);
        assert_eq!(res.data, Some(false));
        // No confirmation dialog, no mutation, no persistence.
        assert!(dialogs.current().is_none());
        assert_eq!(state.snapshot().lists[0].tasks.len(), 1);
        assert_eq!(ctx.emitted_count(), emitted_before);
        assert!(ctx.toasts().contains(&"No completed tasks".to_string()));
    }

    #[test]
    fn clear_done_removes_completed_tasks_after_confirmation() {
        let (ctx, state, dialogs, _drag) = make_env();
        let done = add_task(&ctx, &state, &dialogs, "Done", 2);
        add_task(&ctx, &state, &dialogs, "Open", 2);
        toggle_task_impl(&ctx, &state, done.id.clone());

        let res = request_clear_done_impl(&ctx, &state, &dialogs);
        assert!(res.ok);
        assert_eq!(state.snapshot().lists[0].tasks.len(), 2);

        let res = confirm_open(&ctx, &state, &dialogs);
        assert!(res.ok);
        let tasks = state.snapshot().lists[0].tasks.clone();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].text, "Open");
        assert!(ctx.toasts().contains(&"Cleared".to_string()));
    }

    #[test]
    fn set_sort_mode_changes_only_the_derived_view() {
        let (ctx, state, dialogs, _drag) = make_env();
        // Added in prio order 1, 3, 2.
        add_task(&ctx, &state, &dialogs, "low", 1);
        add_task(&ctx, &state, &dialogs, "high", 3);
        add_task(&ctx, &state, &dialogs, "mid", 2);
        let toasts_before = ctx.toasts().len();

        let res = set_sort_mode_impl(&ctx, &state, SortMode::Priority);
        assert!(res.ok);

        let payload = ctx.last_payload();
        let visible: Vec<String> = payload.visible_tasks.iter().map(|t| t.text.clone()).collect();
        assert_eq!(visible, vec!["high", "mid", "low"]);

        // Stored order keeps the prepend sequence; only the view is sorted.
        let stored: Vec<String> = payload.lists[0].tasks.iter().map(|t| t.text.clone()).collect();
        assert_eq!(stored, vec!["mid", "high", "low"]);

        // No toast, no dialog: the mode change persists and re-renders only.
        assert_eq!(ctx.toasts().len(), toasts_before);
        assert!(dialogs.current().is_none());
    }

    #[test]
    fn set_active_list_persists_known_ids_and_ignores_unknown() {
        let (ctx, state, dialogs, _drag) = make_env();
        let first = state.active_list_id();
        create_list_impl(&ctx, &state, &dialogs, "Second".to_string());
        let emitted_before = ctx.emitted_count();

        let res = set_active_list_impl(&ctx, &state, first.clone());
        assert!(res.ok);
        assert_eq!(state.active_list_id(), first);
        assert_eq!(ctx.emitted_count(), emitted_before + 1);

        let res = set_active_list_impl(&ctx, &state, "ghost".to_string());
        assert_eq!(res.data, Some(false));
        assert_eq!(ctx.emitted_count(), emitted_before + 1);
    }

    #[test]
    fn drag_commit_applies_the_read_order_and_forces_manual_mode() {
        let (ctx, state, dialogs, drag) = make_env();
        let a = add_task(&ctx, &state, &dialogs, "a", 1);
        let b = add_task(&ctx, &state, &dialogs, "b", 3);
        let c = add_task(&ctx, &state, &dialogs, "c", 2);
        set_sort_mode_impl(&ctx, &state, SortMode::Priority);

        // The gesture starts from the priority-derived view: [b, c, a].
        let res = begin_drag_impl(&state, &drag, a.id.clone());
        assert_eq!(res.data, Some(true));
        // A second gesture cannot start mid-drag.
        let res = begin_drag_impl(&state, &drag, b.id.clone());
        assert_eq!(res.data, Some(false));

        let res = drag_over_impl(&drag, b.id.clone(), true);
        assert!(res.ok);
        assert_eq!(res.data.unwrap(), vec![a.id.clone(), b.id.clone(), c.id.clone()]);

        let res = commit_drag_impl(&ctx, &state, &drag);
        assert!(res.ok);
        let stored: Vec<String> = state
            .snapshot()
            .lists[0]
            .tasks
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(stored, vec![a.id, b.id, c.id]);
        // The reorder gesture overrides the priority display.
        assert_eq!(state.sort_mode(), SortMode::Manual);
        assert!(ctx.toasts().contains(&"Order changed".to_string()));
    }

    #[test]
    fn drag_commit_appends_tasks_missing_from_the_read_order() {
        let (ctx, state, dialogs, drag) = make_env();
        let a = add_task(&ctx, &state, &dialogs, "a", 2);
        let b = add_task(&ctx, &state, &dialogs, "b", 2);

        // Stored order is [b, a]; the gesture snapshots it.
        assert_eq!(begin_drag_impl(&state, &drag, b.id.clone()).data, Some(true));
        drag_over_impl(&drag, a.id.clone(), false);

        // A task created mid-gesture is absent from the tracked order.
        let late = add_task(&ctx, &state, &dialogs, "late", 2);

        let res = commit_drag_impl(&ctx, &state, &drag);
        assert!(res.ok);
        let stored: Vec<String> = state
            .snapshot()
            .lists[0]
            .tasks
            .iter()
            .map(|t| t.id.clone())
            .collect();
        // Tracked order first, then the id the order never saw.
        assert_eq!(stored, vec![a.id, b.id, late.id]);
    }

    #[test]
    fn drag_cancel_keeps_the_stored_order_and_re_renders() {
        let (ctx, state, dialogs, drag) = make_env();
        let a = add_task(&ctx, &state, &dialogs, "a", 2);
        let b = add_task(&ctx, &state, &dialogs, "b", 2);
        let stored_before: Vec<String> = state
            .snapshot()
            .lists[0]
            .tasks
            .iter()
            .map(|t| t.id.clone())
            .collect();
        let emitted_before = ctx.emitted_count();
        let toasts_before = ctx.toasts().len();

        assert_eq!(begin_drag_impl(&state, &drag, a.id.clone()).data, Some(true));
        drag_over_impl(&drag, b.id, true);

        let res = cancel_drag_impl(&ctx, &state, &drag);
        assert!(res.ok);
        assert_eq!(res.data, Some(true));
        let stored_after: Vec<String> = state
            .snapshot()
            .lists[0]
            .tasks
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(stored_before, stored_after);
        // Re-render without persistence side effects beyond the emission.
        assert_eq!(ctx.emitted_count(), emitted_before + 1);
        assert_eq!(ctx.toasts().len(), toasts_before);
        // The blob on disk still holds the order from the last real mutation.
        let storage = Storage::new(ctx.root_path().to_path_buf());
        let persisted: Vec<String> = storage.load_state().unwrap().lists[0]
            .tasks
            .iter()
            .map(|t| t.id.clone())
            .collect();
        assert_eq!(persisted, stored_before);

        // Cancel and commit outside a gesture are no-ops.
        assert_eq!(cancel_drag_impl(&ctx, &state, &drag).data, Some(false));
        assert_eq!(commit_drag_impl(&ctx, &state, &drag).data, Some(false));
    }

    #[test]
    fn drag_over_outside_a_gesture_is_an_error() {
        let (_ctx, _state, _dialogs, drag) = make_env();
        let res = drag_over_impl(&drag, "a".to_string(), true);
        assert!(!res.ok);
        assert_eq!(res.error, Some("no active drag".to_string()));
    }

    #[test]
    fn persisted_state_round_trips_through_the_command_layer() {
        let (ctx, state, dialogs, _drag) = make_env();
        add_task(&ctx, &state, &dialogs, "Persist me", 3);
        set_sort_mode_impl(&ctx, &state, SortMode::Priority);

        let storage = Storage::new(ctx.root_path().to_path_buf());
        let loaded = storage.load_state().expect("state should reload");
        assert_eq!(loaded, state.snapshot());
    }

    #[test]
    fn field_helpers_tolerate_missing_and_mistyped_values() {
        let mut values = DialogValues::new();
        values.insert("name".to_string(), Value::from("x"));
        values.insert("prio".to_string(), Value::from("3"));
        values.insert("numeric".to_string(), Value::from(2));
        values.insert("junk".to_string(), Value::Bool(true));
        let values = Some(values);

        assert_eq!(field_str(values.as_ref(), "name"), "x");
        assert_eq!(field_str(values.as_ref(), "missing"), "");
        assert_eq!(field_str(values.as_ref(), "numeric"), "");
        assert_eq!(field_i64(values.as_ref(), "prio"), Some(3));
        assert_eq!(field_i64(values.as_ref(), "numeric"), Some(2));
        assert_eq!(field_i64(values.as_ref(), "junk"), None);
        assert_eq!(field_i64(None, "prio"), None);
    }
}
