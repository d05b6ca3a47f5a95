//! Exploration checkpoint record.
//!
//! A serializable snapshot of a deck, enough to resume a session later.
//! The deck only produces these; restoring a deck from one is the job of
//! whoever owns the session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::state::{AnswerAndResponse, CompletedState};

/// A finished card as recorded in a checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompletedStateInCheckpoint {
    pub state_name: String,
    pub completed_state: CompletedState,
}

/// Snapshot of a learner's progress through one exploration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExplorationCheckpoint {
    /// Finished cards, in push order.
    pub completed_states_in_checkpoint: Vec<CompletedStateInCheckpoint>,
    /// Name of the open card at the top of the deck.
    pub pending_state_name: String,
    /// Latest revealed hint on the open card.
    pub revealed_hint_index: Option<usize>,
    /// Answers submitted to the open card so far.
    pub pending_user_answers: Vec<AnswerAndResponse>,
    pub solution_is_revealed: bool,
    /// Card the learner was viewing.
    pub state_index: usize,
    pub exploration_version: u32,
    pub exploration_title: String,
    pub timestamp_of_first_checkpoint: DateTime<Utc>,
}

impl ExplorationCheckpoint {
    /// Number of finished cards.
    pub fn completed_count(&self) -> usize {
        self.completed_states_in_checkpoint.len()
    }

    /// Total answers recorded, finished cards and open card together.
    pub fn total_answer_count(&self) -> usize {
        self.completed_states_in_checkpoint
            .iter()
            .map(|c| c.completed_state.answers.len())
            .sum::<usize>()
            + self.pending_user_answers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::{InteractionObject, SubtitledHtml};

    fn answer(text: &str) -> AnswerAndResponse {
        AnswerAndResponse::new(
            InteractionObject::Text(text.to_string()),
            SubtitledHtml::new("feedback", "ok"),
        )
    }

    fn checkpoint() -> ExplorationCheckpoint {
        ExplorationCheckpoint {
            completed_states_in_checkpoint: vec![CompletedStateInCheckpoint {
                state_name: "Welcome".to_string(),
                completed_state: CompletedState {
                    answers: vec![answer("a"), answer("b")],
                },
            }],
            pending_state_name: "Fractions".to_string(),
            revealed_hint_index: Some(0),
            pending_user_answers: vec![answer("c")],
            solution_is_revealed: false,
            state_index: 1,
            exploration_version: 3,
            exploration_title: "Fractions 101".to_string(),
            timestamp_of_first_checkpoint: Utc::now(),
        }
    }

    #[test]
    fn test_counts() {
        let checkpoint = checkpoint();
        assert_eq!(checkpoint.completed_count(), 1);
        assert_eq!(checkpoint.total_answer_count(), 3);
    }

    #[test]
    fn test_json_field_names() {
        let value = serde_json::to_value(checkpoint()).unwrap();
        assert_eq!(value["pending_state_name"], "Fractions");
        assert_eq!(value["revealed_hint_index"], 0);
        assert_eq!(
            value["completed_states_in_checkpoint"][0]["state_name"],
            "Welcome"
        );
    }
}
