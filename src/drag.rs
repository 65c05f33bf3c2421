use std::sync::{Arc, Mutex};

/// One drag gesture: the grabbed task plus the order being previewed. The
/// original order survives untouched until commit so a cancelled gesture
/// loses nothing.
#[derive(Debug, Clone, PartialEq)]
struct Session {
    task_id: String,
    order: Vec<String>,
}

/// Serializes reorder gestures: exactly one session at a time, and the stored
/// task order only changes through `commit`. Mid-drag moves update the
/// tracked id order, never the model.
#[derive(Clone, Default)]
pub struct DragController {
    session: Arc<Mutex<Option<Session>>>,
}

impl DragController {
    /// Starts a gesture from the currently visible id order. Rejected while
    /// another gesture is active or when the grabbed id is not visible.
    pub fn begin(&self, task_id: &str, visible_order: Vec<String>) -> bool {
        let mut guard = self.session.lock().expect("drag session poisoned");
        if guard.is_some() {
            return false;
        }
        if !visible_order.iter().any(|id| id == task_id) {
            return false;
        }
        *guard = Some(Session {
            task_id: task_id.to_string(),
            order: visible_order,
        });
        true
    }

    pub fn is_active(&self) -> bool {
        let guard = self.session.lock().expect("drag session poisoned");
        guard.is_some()
    }

    /// Moves the dragged id before or after `target_id` in the tracked order.
    /// No-ops outside a gesture, when the target is the dragged task itself,
    /// or when the target has meanwhile disappeared from the order.
    pub fn move_over(&self, target_id: &str, before: bool) -> bool {
        let mut guard = self.session.lock().expect("drag session poisoned");
        let Some(session) = guard.as_mut() else {
            return false;
        };
        if target_id == session.task_id {
            return false;
        }
        let Some(from) = session.order.iter().position(|id| *id == session.task_id) else {
            return false;
        };
        if !session.order.iter().any(|id| id == target_id) {
            return false;
        }

        let dragged = session.order.remove(from);
        // Target index is re-found after the removal shifted everything.
        let target = session
            .order
            .iter()
            .position(|id| id == target_id)
            .unwrap_or(session.order.len());
        let insert_at = if before { target } else { target + 1 };
        session.order.insert(insert_at.min(session.order.len()), dragged);
        true
    }

    /// The order currently shown as the live preview.
    pub fn preview(&self) -> Option<Vec<String>> {
        let guard = self.session.lock().expect("drag session poisoned");
        guard.as_ref().map(|s| s.order.clone())
    }

    /// Ends the gesture and hands back the final order for the command layer
    /// to apply.
    pub fn commit(&self) -> Option<Vec<String>> {
        let mut guard = self.session.lock().expect("drag session poisoned");
        guard.take().map(|s| s.order)
    }

    /// Abandons the gesture; the stored order never saw the preview, so the
    /// view simply snaps back.
    pub fn cancel(&self) -> bool {
        let mut guard = self.session.lock().expect("drag session poisoned");
        guard.take().is_some()
    }
}
