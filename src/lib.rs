//! statedeck - lesson playback core
//!
//! statedeck tracks a learner's progress through an interactive lesson: a
//! navigable deck of answered cards, routing of answers through the lesson
//! graph, hint and solution reveals, and resumable checkpoints.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;
pub mod util;

pub use config::Config;
pub use core::{
    EphemeralState, ExplorationCheckpoint, HelpIndex, InteractionIdTerminalChecker, State,
    StateDeck, StateGraph, StateList, TerminalStateChecker,
};
pub use error::{DeckError, Result};
pub use storage::{CheckpointStore, FileCheckpointStore, MemoryCheckpointStore};

// CLI commands
pub use cli::{CleanCommand, DeleteCommand, ListCommand, ShowCommand};
