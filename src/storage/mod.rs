//! Checkpoint storage for statedeck.
//!
//! This module provides persistent storage for exploration checkpoints,
//! supporting file-based and in-memory backends.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileCheckpointStore;
pub use memory::MemoryCheckpointStore;
pub use traits::{retrieve_checkpoint, CheckpointState, CheckpointStore, StoredCheckpoint};
