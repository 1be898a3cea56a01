// Drag-and-drop entry point over TaskStore::reorder

use crate::error::Result;
use crate::models::TaskId;
use crate::store::TaskStore;
use tracing::debug;

/// Tracks the task being dragged between drag start and drop
///
/// Holds only an id; the move itself is [`TaskStore::reorder`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragState {
    dragged: Option<TaskId>,
}

impl DragState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, id: TaskId) {
        self.dragged = Some(id);
    }

    pub fn dragged(&self) -> Option<TaskId> {
        self.dragged
    }

    pub fn cancel(&mut self) {
        self.dragged = None;
    }

    /// Drop the dragged task in front of `target`
    ///
    /// Returns `false` without touching the store when nothing is being
    /// dragged. The drag ends either way, including when the move fails.
    pub fn drop_onto(&mut self, store: &mut TaskStore, target: TaskId) -> Result<bool> {
        let Some(source) = self.dragged.take() else {
            debug!(%target, "drop_onto: no drag in progress");
            return Ok(false);
        };
        store.reorder(source, target)?;
        Ok(true)
    }
}
