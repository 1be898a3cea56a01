// Ordered task collection for one list

use crate::error::{Result, TaskError};
use crate::models::{Priority, Task, TaskId, normalize_text};
use crate::record::Snapshot;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Result of [`TaskStore::edit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Text replaced; completion and priority kept
    Updated,
    /// New text was blank so the task was removed
    Deleted(Task),
}

#[derive(Debug, Clone)]
struct Entry {
    id: TaskId,
    task: Task,
}

/// Ordered collection of tasks
///
/// Insertion order is display order until a task is moved with
/// [`reorder`](Self::reorder). Every operation validates its arguments before
/// touching the sequence, so a failed call leaves the store exactly as it was.
///
/// Tasks are addressed by [`TaskId`]. The `*_at` variants take a position in
/// the full sequence instead and resolve it first.
///
/// Serializes as a plain JSON array of tasks. Two stores compare equal when
/// their task sequences are equal; ids are not part of equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Task>", into = "Vec<Task>")]
pub struct TaskStore {
    entries: Vec<Entry>,
    next_id: u64,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tasks in order, with their ids
    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &Task)> {
        self.entries.iter().map(|e| (e.id, &e.task))
    }

    /// Copy of the task sequence without ids
    pub fn tasks(&self) -> Vec<Task> {
        self.entries.iter().map(|e| e.task.clone()).collect()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.entries.iter().find(|e| e.id == id).map(|e| &e.task)
    }

    /// Current position of a task in the sequence
    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Id of the task at `index`
    pub fn id_at(&self, index: usize) -> Result<TaskId> {
        self.entries
            .get(index)
            .map(|e| e.id)
            .ok_or(TaskError::IndexOutOfBounds {
                index,
                len: self.entries.len(),
            })
    }

    /// Number of tasks not yet completed
    pub fn remaining(&self) -> usize {
        self.entries.iter().filter(|e| !e.task.completed).count()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a new incomplete, low priority task
    pub fn add(&mut self, text: &str) -> Result<TaskId> {
        self.add_with(text, false, Priority::Low)
    }

    /// Append a new task with explicit completion and priority
    pub fn add_with(&mut self, text: &str, completed: bool, priority: Priority) -> Result<TaskId> {
        let task = Task::new(text, completed, priority)?;
        let id = self.push(task);
        debug!(%id, len = self.entries.len(), "add: appended task");
        Ok(id)
    }

    /// Flip completion, returning the new value
    pub fn toggle(&mut self, id: TaskId) -> Result<bool> {
        let index = self.index_of(id)?;
        let task = &mut self.entries[index].task;
        task.completed = !task.completed;
        debug!(%id, completed = task.completed, "toggle: flipped completion");
        Ok(task.completed)
    }

    /// Remove a task; later tasks shift down by one
    pub fn delete(&mut self, id: TaskId) -> Result<Task> {
        let index = self.index_of(id)?;
        let entry = self.entries.remove(index);
        debug!(%id, index, len = self.entries.len(), "delete: removed task");
        Ok(entry.task)
    }

    /// Replace a task's text
    ///
    /// Blank text (after trimming) deletes the task instead of failing.
    pub fn edit(&mut self, id: TaskId, new_text: &str) -> Result<EditOutcome> {
        let index = self.index_of(id)?;
        match normalize_text(new_text) {
            Some(text) => {
                self.entries[index].task.text = text;
                debug!(%id, "edit: replaced text");
                Ok(EditOutcome::Updated)
            }
            None => {
                debug!(%id, "edit: blank text, deleting");
                Ok(EditOutcome::Deleted(self.delete(id)?))
            }
        }
    }

    pub fn set_priority(&mut self, id: TaskId, priority: Priority) -> Result<()> {
        let index = self.index_of(id)?;
        self.entries[index].task.priority = priority;
        debug!(%id, %priority, "set_priority: updated");
        Ok(())
    }

    /// Drop every completed task, keeping the order of the rest
    ///
    /// Returns how many were removed.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !e.task.completed);
        let removed = before - self.entries.len();
        debug!(removed, len = self.entries.len(), "clear_completed");
        removed
    }

    /// Move `from` to just before `to`
    ///
    /// Insertion, not swap: everything between the two positions shifts by
    /// one. Moving a task onto itself does nothing.
    pub fn reorder(&mut self, from: TaskId, to: TaskId) -> Result<()> {
        let from_index = self.index_of(from)?;
        let to_index = self.index_of(to)?;
        if from_index == to_index {
            return Ok(());
        }

        let entry = self.entries.remove(from_index);
        let insert_at = if to_index > from_index { to_index - 1 } else { to_index };
        self.entries.insert(insert_at, entry);

        debug!(%from, %to, from_index, insert_at, "reorder: moved task");
        Ok(())
    }

    // ========================================================================
    // Positional entry points
    // ========================================================================

    pub fn toggle_at(&mut self, index: usize) -> Result<bool> {
        let id = self.id_at(index)?;
        self.toggle(id)
    }

    pub fn delete_at(&mut self, index: usize) -> Result<Task> {
        let id = self.id_at(index)?;
        self.delete(id)
    }

    pub fn edit_at(&mut self, index: usize, new_text: &str) -> Result<EditOutcome> {
        let id = self.id_at(index)?;
        self.edit(id, new_text)
    }

    pub fn set_priority_at(&mut self, index: usize, priority: Priority) -> Result<()> {
        let id = self.id_at(index)?;
        self.set_priority(id, priority)
    }

    /// Move the task at `from_index` to just before the task at `to_index`
    pub fn reorder_at(&mut self, from_index: usize, to_index: usize) -> Result<()> {
        let from = self.id_at(from_index)?;
        let to = self.id_at(to_index)?;
        self.reorder(from, to)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn push(&mut self, task: Task) -> TaskId {
        self.next_id += 1;
        let id = TaskId::from_raw(self.next_id);
        self.entries.push(Entry { id, task });
        id
    }

    fn index_of(&self, id: TaskId) -> Result<usize> {
        self.position(id).ok_or(TaskError::UnknownTask(id))
    }
}

impl PartialEq for TaskStore {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().zip(&other.entries).all(|(a, b)| a.task == b.task)
    }
}

impl Eq for TaskStore {}

impl From<Vec<Task>> for TaskStore {
    fn from(tasks: Vec<Task>) -> Self {
        let mut store = Self::new();
        for task in tasks {
            store.push(task);
        }
        store
    }
}

impl From<TaskStore> for Vec<Task> {
    fn from(store: TaskStore) -> Self {
        store.entries.into_iter().map(|e| e.task).collect()
    }
}

impl Snapshot for TaskStore {
    fn storage_key() -> &'static str {
        "tasks"
    }

    fn item_count(&self) -> usize {
        self.len()
    }
}
