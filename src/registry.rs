// Named task lists with a current selection

use crate::error::{Result, TaskError};
use crate::record::Snapshot;
use crate::store::TaskStore;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One named list of tasks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub name: String,
    #[serde(default)]
    pub tasks: TaskStore,
}

impl TaskList {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: TaskStore::new(),
        }
    }
}

/// Ordered collection of [`TaskList`]s, one of which is current
///
/// `current` is `Some` exactly when there is at least one list. Only the lists
/// are persisted; a loaded registry starts on its first list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TaskList>", into = "Vec<TaskList>")]
pub struct ListRegistry {
    lists: Vec<TaskList>,
    current: Option<usize>,
}

impl ListRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    pub fn lists(&self) -> &[TaskList] {
        &self.lists
    }

    pub fn get(&self, index: usize) -> Option<&TaskList> {
        self.lists.get(index)
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&TaskList> {
        self.current.and_then(|i| self.lists.get(i))
    }

    pub fn current_mut(&mut self) -> Option<&mut TaskList> {
        self.current.and_then(|i| self.lists.get_mut(i))
    }

    /// Task store of the current list
    pub fn current_store(&self) -> Result<&TaskStore> {
        self.current().map(|l| &l.tasks).ok_or(TaskError::NoCurrentList)
    }

    pub fn current_store_mut(&mut self) -> Result<&mut TaskStore> {
        self.current_mut().map(|l| &mut l.tasks).ok_or(TaskError::NoCurrentList)
    }

    /// Append an empty list and return its index
    ///
    /// The first list added to an empty registry becomes current.
    pub fn add_list(&mut self, name: impl Into<String>) -> usize {
        self.lists.push(TaskList::new(name));
        let index = self.lists.len() - 1;
        if self.current.is_none() {
            self.current = Some(index);
        }
        debug!(index, len = self.lists.len(), "add_list");
        index
    }

    /// Remove a list, keeping the current selection valid
    ///
    /// Lists after the removed one shift down, and the selection follows the
    /// list it pointed at. If the current list itself is removed, the list
    /// that slides into its place (or the new last list) becomes current.
    /// Removing the last remaining list leaves no current list.
    pub fn delete_list(&mut self, index: usize) -> Result<TaskList> {
        self.check_index(index)?;
        let removed = self.lists.remove(index);

        self.current = match self.current {
            _ if self.lists.is_empty() => None,
            Some(current) if index < current => Some(current - 1),
            Some(current) => Some(current.min(self.lists.len() - 1)),
            None => Some(0),
        };

        debug!(index, current = ?self.current, len = self.lists.len(), "delete_list");
        Ok(removed)
    }

    pub fn switch_to(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        self.current = Some(index);
        debug!(index, "switch_to");
        Ok(())
    }

    pub fn rename_list(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        self.check_index(index)?;
        self.lists[index].name = name.into();
        Ok(())
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.lists.len() {
            Ok(())
        } else {
            Err(TaskError::IndexOutOfBounds {
                index,
                len: self.lists.len(),
            })
        }
    }
}

impl From<Vec<TaskList>> for ListRegistry {
    fn from(lists: Vec<TaskList>) -> Self {
        let current = if lists.is_empty() { None } else { Some(0) };
        Self { lists, current }
    }
}

impl From<ListRegistry> for Vec<TaskList> {
    fn from(registry: ListRegistry) -> Self {
        registry.lists
    }
}

impl Snapshot for ListRegistry {
    fn storage_key() -> &'static str {
        "taskLists"
    }

    fn item_count(&self) -> usize {
        self.len()
    }
}
