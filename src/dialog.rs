use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::models::new_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogKind {
    Alert,
    Confirm,
    Prompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Time,
    Select,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// One input inside a prompt dialog. The frontend renders it and submits the
/// entered value back under `name`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub value: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

impl DialogField {
    pub fn text(name: &str, label: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Text,
            value: value.to_string(),
            options: Vec::new(),
        }
    }

    pub fn time(name: &str, label: &str, value: &str) -> Self {
        Self {
            kind: FieldKind::Time,
            ..Self::text(name, label, value)
        }
    }

    pub fn select(name: &str, label: &str, value: &str, options: Vec<SelectOption>) -> Self {
        Self {
            kind: FieldKind::Select,
            options,
            ..Self::text(name, label, value)
        }
    }
}

/// What a confirmation or prompt submission executes. Kept out of the wire
/// payload; only the command layer acts on it.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    Acknowledge,
    RenameList { list_id: String },
    EditTask { task_id: String },
    DeleteList { list_id: String },
    DeleteTask { task_id: String },
    ClearDone,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dialog {
    pub id: String,
    pub kind: DialogKind,
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<DialogField>,
    pub ok_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_label: Option<String>,
    #[serde(skip)]
    pub action: PendingAction,
}

impl Dialog {
    pub fn alert(title: &str, body: &str) -> Self {
        Self {
            id: new_id(),
            kind: DialogKind::Alert,
            title: title.to_string(),
            body: body.to_string(),
            fields: Vec::new(),
            ok_label: "OK".to_string(),
            cancel_label: None,
            action: PendingAction::Acknowledge,
        }
    }

    pub fn confirm(title: &str, body: &str, ok_label: &str, action: PendingAction) -> Self {
        Self {
            id: new_id(),
            kind: DialogKind::Confirm,
            title: title.to_string(),
            body: body.to_string(),
            fields: Vec::new(),
            ok_label: ok_label.to_string(),
            cancel_label: Some("Cancel".to_string()),
            action,
        }
    }

    pub fn prompt(title: &str, fields: Vec<DialogField>, action: PendingAction) -> Self {
        Self {
            id: new_id(),
            kind: DialogKind::Prompt,
            title: title.to_string(),
            body: String::new(),
            fields,
            ok_label: "Save".to_string(),
            cancel_label: Some("Cancel".to_string()),
            action,
        }
    }
}

/// The single dialog slot. Opening a new dialog replaces whatever was shown;
/// there is no stacking. The pending action fires only through `resolve`,
/// which requires the caller to name the dialog it is confirming.
#[derive(Clone, Default)]
pub struct Dialogs {
    slot: Arc<Mutex<Option<Dialog>>>,
}

impl Dialogs {
    /// Replaces the current dialog and returns the stored copy for emission.
    pub fn open(&self, dialog: Dialog) -> Dialog {
        let mut slot = self.slot.lock().expect("dialog slot poisoned");
        *slot = Some(dialog.clone());
        dialog
    }

    pub fn close(&self) {
        let mut slot = self.slot.lock().expect("dialog slot poisoned");
        *slot = None;
    }

    pub fn current(&self) -> Option<Dialog> {
        let slot = self.slot.lock().expect("dialog slot poisoned");
        slot.clone()
    }

    /// Consumes the open dialog and hands back its pending action, but only
    /// when `id` names it. A stale confirmation (the dialog was replaced or
    /// already closed) yields `None` and changes nothing.
    pub fn resolve(&self, id: &str) -> Option<PendingAction> {
        let mut slot = self.slot.lock().expect("dialog slot poisoned");
        if slot.as_ref().map(|d| d.id == id) != Some(true) {
            return None;
        }
        slot.take().map(|d| d.action)
    }
}
