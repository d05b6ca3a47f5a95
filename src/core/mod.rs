//! Core types and logic for statedeck.
//!
//! This module contains the lesson data model, the exploration graph and
//! practice list, the deck state machine, and checkpoint records.

pub mod checkpoint;
pub mod deck;
pub mod graph;
pub mod help;
pub mod list;
pub mod state;

pub use checkpoint::{CompletedStateInCheckpoint, ExplorationCheckpoint};
pub use deck::{
    DeckPosition, InteractionIdTerminalChecker, StateDeck, TerminalStateChecker,
    DEFAULT_TERMINAL_INTERACTION_ID,
};
pub use graph::StateGraph;
pub use help::HelpIndex;
pub use list::StateList;
pub use state::{
    AnswerAndResponse, AnswerDestination, AnswerGroup, AnswerOutcome, AnsweredQuestionOutcome,
    CompletedState, EphemeralState, Hint, Interaction, InteractionObject, Outcome, PendingState,
    RuleSpec, Solution, State, StateKind, SubtitledHtml,
};
