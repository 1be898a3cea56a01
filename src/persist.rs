// Persistence adapter: snapshot <-> JSON under a fixed storage key

use crate::error::{Result, TaskError};
use crate::models::{Priority, Task, TaskId};
use crate::record::Snapshot;
use crate::registry::{ListRegistry, TaskList};
use crate::storage::Storage;
use crate::store::{EditOutcome, TaskStore};
use tracing::{debug, info, warn};

/// What to do when a stored snapshot exists but cannot be parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecoveryPolicy {
    /// Return [`TaskError::CorruptState`] to the caller
    #[default]
    Fail,
    /// Log a warning and start from empty state; the bad value is
    /// overwritten by the next save
    Reset,
}

/// Saves and loads [`Snapshot`]s through a [`Storage`] backend
pub struct Persistence<S> {
    storage: S,
}

impl<S: Storage> Persistence<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Serialize `state` and write it under its storage key
    pub fn save<T: Snapshot>(&mut self, state: &T) -> Result<()> {
        let key = T::storage_key();
        let json = serde_json::to_string(state).map_err(|e| TaskError::storage("Failed to serialize state", e))?;
        self.storage.set(key, &json)?;
        debug!(key, items = state.item_count(), "save: persisted snapshot");
        Ok(())
    }

    /// Read the snapshot stored under `T`'s key
    ///
    /// A missing key yields empty state. A present but unparsable value is
    /// [`TaskError::CorruptState`].
    pub fn load<T: Snapshot>(&self) -> Result<T> {
        let key = T::storage_key();
        let Some(json) = self.storage.get(key)? else {
            info!(key, "load: nothing stored, starting empty");
            return Ok(T::default());
        };

        let state: T = serde_json::from_str(&json).map_err(|source| TaskError::CorruptState {
            key: key.to_string(),
            source,
        })?;
        info!(key, items = state.item_count(), "load: restored snapshot");
        Ok(state)
    }

    /// [`load`](Self::load), resolving corrupt data according to `policy`
    pub fn load_with<T: Snapshot>(&self, policy: RecoveryPolicy) -> Result<T> {
        match self.load() {
            Err(TaskError::CorruptState { key, source }) if policy == RecoveryPolicy::Reset => {
                warn!(key = %key, error = %source, "load: stored state is corrupt, resetting to empty");
                Ok(T::default())
            }
            other => other,
        }
    }
}

/// In-memory state that is saved after every successful mutation
///
/// Mutations run against a copy of the state. The copy is saved and only
/// then replaces the live state, so when a mutation or its save fails the
/// live state is exactly what it was before the call.
pub struct Persisted<T, S> {
    state: T,
    persistence: Persistence<S>,
}

pub type PersistedStore<S> = Persisted<TaskStore, S>;
pub type PersistedRegistry<S> = Persisted<ListRegistry, S>;

impl<T: Snapshot, S: Storage> Persisted<T, S> {
    /// Load state from `storage`
    pub fn open(storage: S, policy: RecoveryPolicy) -> Result<Self> {
        let persistence = Persistence::new(storage);
        let state = persistence.load_with(policy)?;
        Ok(Self { state, persistence })
    }

    pub fn state(&self) -> &T {
        &self.state
    }

    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    pub fn into_parts(self) -> (T, Persistence<S>) {
        (self.state, self.persistence)
    }

    /// Apply `f` to the state and persist the result
    pub fn mutate<R>(&mut self, f: impl FnOnce(&mut T) -> Result<R>) -> Result<R> {
        let mut next = self.state.clone();
        let out = f(&mut next)?;
        self.persistence.save(&next)?;
        self.state = next;
        Ok(out)
    }
}

impl<S: Storage> Persisted<TaskStore, S> {
    pub fn add(&mut self, text: &str) -> Result<TaskId> {
        self.mutate(|store| store.add(text))
    }

    pub fn add_with(&mut self, text: &str, completed: bool, priority: Priority) -> Result<TaskId> {
        self.mutate(|store| store.add_with(text, completed, priority))
    }

    pub fn toggle(&mut self, id: TaskId) -> Result<bool> {
        self.mutate(|store| store.toggle(id))
    }

    pub fn delete(&mut self, id: TaskId) -> Result<Task> {
        self.mutate(|store| store.delete(id))
    }

    pub fn edit(&mut self, id: TaskId, new_text: &str) -> Result<EditOutcome> {
        self.mutate(|store| store.edit(id, new_text))
    }

    pub fn set_priority(&mut self, id: TaskId, priority: Priority) -> Result<()> {
        self.mutate(|store| store.set_priority(id, priority))
    }

    pub fn clear_completed(&mut self) -> Result<usize> {
        self.mutate(|store| Ok(store.clear_completed()))
    }

    pub fn reorder(&mut self, from: TaskId, to: TaskId) -> Result<()> {
        self.mutate(|store| store.reorder(from, to))
    }
}

impl<S: Storage> Persisted<ListRegistry, S> {
    pub fn add_list(&mut self, name: &str) -> Result<usize> {
        self.mutate(|registry| Ok(registry.add_list(name)))
    }

    pub fn delete_list(&mut self, index: usize) -> Result<TaskList> {
        self.mutate(|registry| registry.delete_list(index))
    }

    pub fn switch_to(&mut self, index: usize) -> Result<()> {
        self.mutate(|registry| registry.switch_to(index))
    }

    pub fn rename_list(&mut self, index: usize, name: &str) -> Result<()> {
        self.mutate(|registry| registry.rename_list(index, name))
    }

    /// Run a task store operation against the current list
    pub fn with_current<R>(&mut self, f: impl FnOnce(&mut TaskStore) -> Result<R>) -> Result<R> {
        self.mutate(|registry| f(registry.current_store_mut()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::storage::{FileStorage, MemoryStorage};
    use tempfile::TempDir;

    /// Accepts reads, fails every write
    #[derive(Default)]
    struct ReadOnlyStorage {
        inner: MemoryStorage,
    }

    impl Storage for ReadOnlyStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(TaskError::storage("read-only", std::io::Error::other("read-only storage")))
        }

        fn remove(&mut self, _key: &str) -> Result<()> {
            Err(TaskError::storage("read-only", std::io::Error::other("read-only storage")))
        }
    }

    fn stored(persisted: &PersistedStore<MemoryStorage>) -> String {
        persisted.persistence().storage().get("tasks").unwrap().unwrap()
    }

    #[test]
    fn test_load_missing_key_is_empty() {
        let persistence = Persistence::new(MemoryStorage::new());

        let store: TaskStore = persistence.load().unwrap();
        assert!(store.is_empty());

        let registry: ListRegistry = persistence.load().unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.current_index(), None);
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let mut store = TaskStore::new();
        store.add_with("a", true, Priority::High).unwrap();
        store.add("b").unwrap();
        store.add_with("c", false, Priority::Medium).unwrap();
        store.reorder_at(2, 0).unwrap();

        let mut persistence = Persistence::new(MemoryStorage::new());
        persistence.save(&store).unwrap();
        let loaded: TaskStore = persistence.load().unwrap();

        assert_eq!(loaded, store);
    }

    #[test]
    fn test_registry_roundtrip() {
        let mut registry = ListRegistry::new();
        registry.add_list("Home");
        registry.add_list("Work");
        registry.current_store_mut().unwrap().add("sweep").unwrap();

        let mut persistence = Persistence::new(MemoryStorage::new());
        persistence.save(&registry).unwrap();
        let loaded: ListRegistry = persistence.load().unwrap();

        assert_eq!(loaded, registry);
    }

    #[test]
    fn test_load_defaults_missing_priority() {
        let mut storage = MemoryStorage::new();
        storage
            .set("tasks", r#"[{"text":"old","completed":true},{"text":"new","completed":false,"priority":"high"}]"#)
            .unwrap();

        let store: TaskStore = Persistence::new(storage).load().unwrap();
        let tasks = store.tasks();
        assert_eq!(tasks[0].priority, Priority::Low);
        assert!(tasks[0].completed);
        assert_eq!(tasks[1].priority, Priority::High);
    }

    #[test]
    fn test_load_corrupt_fails() {
        let mut storage = MemoryStorage::new();
        storage.set("tasks", "{not json").unwrap();
        let persistence = Persistence::new(storage);

        let err = persistence.load::<TaskStore>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupt);
        assert!(matches!(err, TaskError::CorruptState { ref key, .. } if key == "tasks"));

        let err = persistence.load_with::<TaskStore>(RecoveryPolicy::Fail).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Corrupt);
    }

    #[test]
    fn test_load_wrong_shape_is_corrupt() {
        let mut storage = MemoryStorage::new();
        storage.set("tasks", r#"[{"completed":true}]"#).unwrap();
        storage.set("taskLists", r#"{"name":"x"}"#).unwrap();
        let persistence = Persistence::new(storage);

        assert!(matches!(persistence.load::<TaskStore>(), Err(TaskError::CorruptState { .. })));
        assert!(matches!(persistence.load::<ListRegistry>(), Err(TaskError::CorruptState { .. })));
    }

    #[test]
    fn test_reset_policy_recovers() {
        let mut storage = MemoryStorage::new();
        storage.set("tasks", "garbage").unwrap();

        let mut persisted = PersistedStore::open(storage, RecoveryPolicy::Reset).unwrap();
        assert!(persisted.state().is_empty());

        // Stored value is left alone until the next save
        assert_eq!(stored(&persisted), "garbage");
        persisted.add("fresh").unwrap();
        assert_eq!(stored(&persisted), r#"[{"text":"fresh","completed":false,"priority":"low"}]"#);
    }

    #[test]
    fn test_open_with_fail_policy_surfaces_corruption() {
        let mut storage = MemoryStorage::new();
        storage.set("taskLists", "[").unwrap();

        let result = PersistedRegistry::open(storage, RecoveryPolicy::Fail);
        assert!(matches!(result, Err(TaskError::CorruptState { .. })));
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let mut persisted = PersistedStore::open(MemoryStorage::new(), RecoveryPolicy::Fail).unwrap();

        let a = persisted.add("a").unwrap();
        let b = persisted.add("b").unwrap();
        assert_eq!(stored(&persisted).matches("text").count(), 2);

        persisted.toggle(a).unwrap();
        assert!(stored(&persisted).contains(r#"{"text":"a","completed":true"#));

        persisted.set_priority(b, Priority::High).unwrap();
        assert!(stored(&persisted).contains(r#""priority":"high""#));

        persisted.reorder(b, a).unwrap();
        assert!(stored(&persisted).starts_with(r#"[{"text":"b""#));

        persisted.edit(b, "bee").unwrap();
        assert!(stored(&persisted).contains("bee"));

        assert_eq!(persisted.clear_completed().unwrap(), 1);
        assert_eq!(stored(&persisted).matches("text").count(), 1);

        persisted.delete(b).unwrap();
        assert_eq!(stored(&persisted), "[]");
    }

    #[test]
    fn test_failed_operation_is_not_persisted() {
        let mut persisted = PersistedStore::open(MemoryStorage::new(), RecoveryPolicy::Fail).unwrap();
        persisted.add("a").unwrap();
        let before = stored(&persisted);

        assert!(matches!(persisted.add("  "), Err(TaskError::EmptyText)));
        let err = persisted.mutate(|store| store.delete_at(5)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Index);

        assert_eq!(stored(&persisted), before);
        assert_eq!(persisted.state().len(), 1);
    }

    #[test]
    fn test_failed_save_leaves_state_unchanged() {
        let mut storage = ReadOnlyStorage::default();
        storage.inner.set("tasks", r#"[{"text":"kept"}]"#).unwrap();

        let mut persisted = PersistedStore::open(storage, RecoveryPolicy::Fail).unwrap();
        let before = persisted.state().clone();

        let err = persisted.add("lost").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert_eq!(persisted.state(), &before);

        let id = persisted.state().id_at(0).unwrap();
        assert!(persisted.toggle(id).is_err());
        assert!(!persisted.state().get(id).unwrap().completed);
    }

    #[test]
    fn test_registry_operations_persist() {
        let mut persisted = PersistedRegistry::open(MemoryStorage::new(), RecoveryPolicy::Fail).unwrap();

        assert!(matches!(
            persisted.with_current(|store| store.add("orphan")),
            Err(TaskError::NoCurrentList)
        ));

        persisted.add_list("Home").unwrap();
        persisted.add_list("Work").unwrap();
        persisted.switch_to(1).unwrap();
        persisted.with_current(|store| store.add("report")).unwrap();
        persisted.rename_list(0, "House").unwrap();

        let json = persisted.persistence().storage().get("taskLists").unwrap().unwrap();
        assert_eq!(
            json,
            r#"[{"name":"House","tasks":[]},{"name":"Work","tasks":[{"text":"report","completed":false,"priority":"low"}]}]"#
        );

        persisted.delete_list(1).unwrap();
        assert_eq!(persisted.state().current_index(), Some(0));
        persisted.delete_list(0).unwrap();
        assert_eq!(persisted.state().current_index(), None);
        assert_eq!(persisted.persistence().storage().get("taskLists").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_file_backed_store_reopens() {
        let temp = TempDir::new().unwrap();
        {
            let storage = FileStorage::open(temp.path()).unwrap();
            let mut persisted = PersistedStore::open(storage, RecoveryPolicy::Fail).unwrap();
            persisted.add("a").unwrap();
            let b = persisted.add("b").unwrap();
            persisted.toggle(b).unwrap();
        }

        let storage = FileStorage::open(temp.path()).unwrap();
        let persisted = PersistedStore::open(storage, RecoveryPolicy::Fail).unwrap();
        let tasks = persisted.state().tasks();
        assert_eq!(tasks.len(), 2);
        assert!(tasks[1].completed);
    }
}
