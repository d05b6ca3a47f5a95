//! Checkpoint storage traits for statedeck.
//!
//! This module defines the `CheckpointStore` trait for checkpoint
//! persistence, keyed by exploration id.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ExplorationCheckpoint;
use crate::error::{DeckError, Result};

/// A checkpoint as held by a store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredCheckpoint {
    /// Exploration the checkpoint belongs to.
    pub exploration_id: String,
    /// When the store last wrote this checkpoint.
    pub saved_at: DateTime<Utc>,
    pub checkpoint: ExplorationCheckpoint,
}

impl StoredCheckpoint {
    pub fn new(exploration_id: impl Into<String>, checkpoint: ExplorationCheckpoint) -> Self {
        Self {
            exploration_id: exploration_id.into(),
            saved_at: Utc::now(),
            checkpoint,
        }
    }

    /// Serialized size in bytes, as counted against the store's limit.
    pub fn serialized_size(&self) -> Result<u64> {
        Ok(serde_json::to_vec(self)?.len() as u64)
    }
}

/// Result of the latest checkpoint save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointState {
    /// Nothing saved yet.
    #[default]
    Unsaved,
    /// Saved, and the store is within its size limit.
    SavedDatabaseNotExceededLimit,
    /// Saved, but the store is now over its size limit.
    SavedDatabaseExceededLimit,
}

impl CheckpointState {
    /// Classify a completed save by the store's total size.
    pub fn after_save(total_size: u64, size_limit: u64) -> Self {
        if total_size > size_limit {
            CheckpointState::SavedDatabaseExceededLimit
        } else {
            CheckpointState::SavedDatabaseNotExceededLimit
        }
    }

    pub fn is_saved(&self) -> bool {
        !matches!(self, CheckpointState::Unsaved)
    }
}

/// Trait for checkpoint storage backends.
///
/// Implementations hold at most one checkpoint per exploration id.
pub trait CheckpointStore: Send + Sync {
    /// Retrieve the checkpoint for an exploration.
    ///
    /// Returns `Ok(None)` if none is stored.
    fn get(&self, exploration_id: &str) -> Result<Option<StoredCheckpoint>>;

    /// Save a checkpoint, replacing any previous one for the exploration.
    ///
    /// The checkpoint is saved even when the store ends up over its limit;
    /// the returned state says whether it did.
    fn put(&self, exploration_id: &str, checkpoint: &ExplorationCheckpoint)
        -> Result<CheckpointState>;

    /// List stored checkpoints.
    ///
    /// Returns up to `limit` checkpoints, most recently saved first.
    fn list(&self, limit: usize) -> Result<Vec<StoredCheckpoint>>;

    /// Delete a checkpoint.
    ///
    /// Returns `Ok(())` even if the checkpoint doesn't exist.
    fn delete(&self, exploration_id: &str) -> Result<()>;

    /// Total serialized size of all stored checkpoints, in bytes.
    fn total_size(&self) -> Result<u64>;

    /// Check if a checkpoint exists.
    fn exists(&self, exploration_id: &str) -> Result<bool> {
        Ok(self.get(exploration_id)?.is_some())
    }
}

/// Blanket implementation of CheckpointStore for Arc-wrapped stores.
///
/// This allows using `Arc<T>` where `T: CheckpointStore` is expected,
/// so one store can back several sessions.
impl<T: CheckpointStore + ?Sized> CheckpointStore for Arc<T> {
    fn get(&self, exploration_id: &str) -> Result<Option<StoredCheckpoint>> {
        (**self).get(exploration_id)
    }

    fn put(
        &self,
        exploration_id: &str,
        checkpoint: &ExplorationCheckpoint,
    ) -> Result<CheckpointState> {
        (**self).put(exploration_id, checkpoint)
    }

    fn list(&self, limit: usize) -> Result<Vec<StoredCheckpoint>> {
        (**self).list(limit)
    }

    fn delete(&self, exploration_id: &str) -> Result<()> {
        (**self).delete(exploration_id)
    }

    fn total_size(&self) -> Result<u64> {
        (**self).total_size()
    }
}

/// Fetch the checkpoint for an exploration, failing if none is stored.
pub fn retrieve_checkpoint<S: CheckpointStore + ?Sized>(
    store: &S,
    exploration_id: &str,
) -> Result<StoredCheckpoint> {
    store
        .get(exploration_id)?
        .ok_or_else(|| DeckError::checkpoint_not_found(exploration_id))
}

/// Test utilities for CheckpointStore implementations.
#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::core::{AnswerAndResponse, InteractionObject, SubtitledHtml};

    /// Build a small checkpoint for store tests.
    pub fn sample_checkpoint(title: &str) -> ExplorationCheckpoint {
        ExplorationCheckpoint {
            completed_states_in_checkpoint: Vec::new(),
            pending_state_name: "Introduction".to_string(),
            revealed_hint_index: None,
            pending_user_answers: vec![AnswerAndResponse::new(
                InteractionObject::Text("42".to_string()),
                SubtitledHtml::new("feedback", "Not quite"),
            )],
            solution_is_revealed: false,
            state_index: 0,
            exploration_version: 1,
            exploration_title: title.to_string(),
            timestamp_of_first_checkpoint: Utc::now(),
        }
    }

    /// Test helper to verify CheckpointStore implementations.
    pub fn test_checkpoint_store_crud<S: CheckpointStore>(store: &S) {
        let checkpoint = sample_checkpoint("Fractions");

        // Initially should not exist
        assert!(!store.exists("exp-1").unwrap());
        assert!(store.get("exp-1").unwrap().is_none());
        assert!(matches!(
            retrieve_checkpoint(store, "exp-1"),
            Err(DeckError::CheckpointNotFound { .. })
        ));

        let state = store.put("exp-1", &checkpoint).unwrap();
        assert!(state.is_saved());

        assert!(store.exists("exp-1").unwrap());

        let retrieved = retrieve_checkpoint(store, "exp-1").unwrap();
        assert_eq!(retrieved.exploration_id, "exp-1");
        assert_eq!(retrieved.checkpoint, checkpoint);
        assert!(store.total_size().unwrap() > 0);

        let listed = store.list(10).unwrap();
        assert!(listed.iter().any(|c| c.exploration_id == "exp-1"));

        store.delete("exp-1").unwrap();

        assert!(!store.exists("exp-1").unwrap());
        assert!(store.get("exp-1").unwrap().is_none());
        assert_eq!(store.total_size().unwrap(), 0);

        // Delete again should succeed
        store.delete("exp-1").unwrap();
    }

    #[test]
    fn test_after_save_threshold() {
        assert_eq!(
            CheckpointState::after_save(100, 100),
            CheckpointState::SavedDatabaseNotExceededLimit
        );
        assert_eq!(
            CheckpointState::after_save(101, 100),
            CheckpointState::SavedDatabaseExceededLimit
        );
        assert!(!CheckpointState::default().is_saved());
    }

    #[test]
    fn test_serialized_size_matches_json() {
        let stored = StoredCheckpoint::new("exp", sample_checkpoint("t"));
        let json = serde_json::to_vec(&stored).unwrap();
        assert_eq!(stored.serialized_size().unwrap(), json.len() as u64);
    }
}
