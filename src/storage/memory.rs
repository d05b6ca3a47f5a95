//! In-memory checkpoint storage.
//!
//! A thread-safe implementation of the CheckpointStore trait, for embedding
//! hosts that persist elsewhere and for unit tests.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::config::DEFAULT_CHECKPOINT_SIZE_LIMIT;
use crate::core::ExplorationCheckpoint;
use crate::error::Result;
use crate::storage::{CheckpointState, CheckpointStore, StoredCheckpoint};

/// In-memory checkpoint store.
///
/// Thread-safe implementation using `RwLock<HashMap>`.
/// Checkpoints are lost when the store is dropped.
#[derive(Debug)]
pub struct MemoryCheckpointStore {
    checkpoints: RwLock<HashMap<String, StoredCheckpoint>>,
    size_limit: u64,
}

impl MemoryCheckpointStore {
    /// Create a new empty store with the default size limit.
    pub fn new() -> Self {
        Self::with_size_limit(DEFAULT_CHECKPOINT_SIZE_LIMIT)
    }

    /// Create a new empty store with a custom size limit in bytes.
    pub fn with_size_limit(size_limit: u64) -> Self {
        Self {
            checkpoints: RwLock::new(HashMap::new()),
            size_limit,
        }
    }

    /// Get the number of checkpoints in the store.
    pub fn len(&self) -> usize {
        self.checkpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all checkpoints from the store.
    pub fn clear(&self) {
        self.checkpoints
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for MemoryCheckpointStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn get(&self, exploration_id: &str) -> Result<Option<StoredCheckpoint>> {
        let checkpoints = self
            .checkpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(checkpoints.get(exploration_id).cloned())
    }

    fn put(
        &self,
        exploration_id: &str,
        checkpoint: &ExplorationCheckpoint,
    ) -> Result<CheckpointState> {
        let stored = StoredCheckpoint::new(exploration_id, checkpoint.clone());
        {
            let mut checkpoints = self
                .checkpoints
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            checkpoints.insert(exploration_id.to_string(), stored);
        }
        let total = self.total_size()?;
        tracing::debug!(exploration_id, total_size = total, "saved checkpoint");
        Ok(CheckpointState::after_save(total, self.size_limit))
    }

    fn list(&self, limit: usize) -> Result<Vec<StoredCheckpoint>> {
        let checkpoints = self
            .checkpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut result: Vec<StoredCheckpoint> = checkpoints.values().cloned().collect();

        // Most recent first
        result.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        result.truncate(limit);

        Ok(result)
    }

    fn delete(&self, exploration_id: &str) -> Result<()> {
        let mut checkpoints = self
            .checkpoints
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        checkpoints.remove(exploration_id);
        Ok(())
    }

    fn total_size(&self) -> Result<u64> {
        let checkpoints = self
            .checkpoints
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        checkpoints
            .values()
            .map(StoredCheckpoint::serialized_size)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::tests::{sample_checkpoint, test_checkpoint_store_crud};

    #[test]
    fn test_memory_store_crud() {
        let store = MemoryCheckpointStore::new();
        test_checkpoint_store_crud(&store);
    }

    #[test]
    fn test_len_and_clear() {
        let store = MemoryCheckpointStore::default();
        assert!(store.is_empty());

        store.put("a", &sample_checkpoint("A")).unwrap();
        store.put("b", &sample_checkpoint("B")).unwrap();
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_put_replaces_existing() {
        let store = MemoryCheckpointStore::new();

        store.put("exp", &sample_checkpoint("Old")).unwrap();
        store.put("exp", &sample_checkpoint("New")).unwrap();

        assert_eq!(store.len(), 1);
        let stored = store.get("exp").unwrap().unwrap();
        assert_eq!(stored.checkpoint.exploration_title, "New");
    }

    #[test]
    fn test_put_reports_exceeded_limit() {
        let one_size = StoredCheckpoint::new("exp-0", sample_checkpoint("T"))
            .serialized_size()
            .unwrap();
        // Room for one checkpoint, not two
        let store = MemoryCheckpointStore::with_size_limit(one_size + one_size / 2);

        let first = store.put("exp-0", &sample_checkpoint("T")).unwrap();
        assert_eq!(first, CheckpointState::SavedDatabaseNotExceededLimit);

        let second = store.put("exp-1", &sample_checkpoint("T")).unwrap();
        assert_eq!(second, CheckpointState::SavedDatabaseExceededLimit);

        // Still saved
        assert!(store.exists("exp-1").unwrap());
    }

    #[test]
    fn test_list_ordering_and_limit() {
        use chrono::{Duration, Utc};

        let store = MemoryCheckpointStore::new();
        for id in ["old", "mid", "new"] {
            store.put(id, &sample_checkpoint(id)).unwrap();
        }
        {
            let mut checkpoints = store.checkpoints.write().unwrap();
            let now = Utc::now();
            checkpoints.get_mut("old").unwrap().saved_at = now - Duration::seconds(100);
            checkpoints.get_mut("mid").unwrap().saved_at = now - Duration::seconds(50);
            checkpoints.get_mut("new").unwrap().saved_at = now;
        }

        let ids: Vec<String> = store
            .list(10)
            .unwrap()
            .into_iter()
            .map(|c| c.exploration_id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
        assert_eq!(store.list(2).unwrap().len(), 2);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(MemoryCheckpointStore::new());
        let mut handles = vec![];

        for i in 0..10 {
            let store_clone = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                let id = format!("exp-{}", i);
                store_clone.put(&id, &sample_checkpoint("T")).unwrap();
                store_clone.get(&id).unwrap();
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 10);
    }
}
