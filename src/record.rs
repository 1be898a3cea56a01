// Snapshot trait for any state persisted under a single storage key

use serde::{Deserialize, Serialize};

/// State that is saved and loaded as one JSON document
pub trait Snapshot: Serialize + for<'de> Deserialize<'de> + Clone + Default + 'static {
    /// Fixed key this state is stored under (e.g., "tasks", "taskLists")
    fn storage_key() -> &'static str
    where
        Self: Sized;

    /// Number of items in the snapshot, for log lines
    fn item_count(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    struct TestSnapshot {
        names: Vec<String>,
    }

    impl Snapshot for TestSnapshot {
        fn storage_key() -> &'static str {
            "test"
        }
    }

    #[test]
    fn test_snapshot_trait_implementation() {
        let snapshot = TestSnapshot {
            names: vec!["a".to_string()],
        };

        assert_eq!(TestSnapshot::storage_key(), "test");
        assert_eq!(snapshot.item_count(), 0);
        assert_eq!(snapshot.names.len(), 1);
    }
}
