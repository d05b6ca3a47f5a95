//! Exploration state graph.
//!
//! Lookup access for an exploration's states plus classification of a
//! learner's answer outcome into a navigation destination. Holds no session
//! state; the deck owns that.

use std::collections::HashMap;

use crate::core::state::{AnswerDestination, AnswerOutcome, Hint, Outcome, Solution, State};
use crate::error::{DeckError, Result};

/// Name-keyed graph of an exploration's states.
#[derive(Debug, Clone, Default)]
pub struct StateGraph {
    states: HashMap<String, State>,
}

impl StateGraph {
    /// Create a graph over the given name→state mapping.
    pub fn new(states: HashMap<String, State>) -> Self {
        Self { states }
    }

    /// Replace the graph wholesale, e.g. when a new exploration starts.
    pub fn reset(&mut self, states: HashMap<String, State>) {
        tracing::debug!(state_count = states.len(), "resetting state graph");
        self.states = states;
    }

    /// Return the state with the given name.
    pub fn get_state(&self, state_name: &str) -> Result<&State> {
        self.states
            .get(state_name)
            .ok_or_else(|| DeckError::state_not_found(state_name))
    }

    /// Whether the graph defines a state with this name.
    pub fn contains(&self, state_name: &str) -> bool {
        self.states.contains_key(state_name)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Classify the outcome of an answer submitted to `current_state`.
    ///
    /// Precedence: refresher exploration, missing prerequisite skill, same
    /// state, named destination.
    pub fn compute_answer_outcome_for_result(
        &self,
        current_state: &State,
        outcome: &Outcome,
    ) -> AnswerOutcome {
        let destination = if !outcome.refresher_exploration_id.is_empty() {
            AnswerDestination::RefresherExploration(outcome.refresher_exploration_id.clone())
        } else if !outcome.missing_prerequisite_skill_id.is_empty() {
            AnswerDestination::MissingPrerequisiteSkill(
                outcome.missing_prerequisite_skill_id.clone(),
            )
        } else if outcome.dest_state_name == current_state.name {
            AnswerDestination::SameState
        } else {
            AnswerDestination::State(outcome.dest_state_name.clone())
        };

        AnswerOutcome {
            feedback: outcome.feedback.clone(),
            is_correct_answer: outcome.labelled_as_correct,
            destination,
        }
    }

    /// Repackage the hint at `hint_index` with the given reveal flag.
    pub fn compute_hint_for_result(
        &self,
        state: &State,
        hint_is_revealed: bool,
        hint_index: usize,
    ) -> Result<Hint> {
        state.interaction.hint_for_result(hint_is_revealed, hint_index)
    }

    /// Repackage the state's solution, marked revealed.
    pub fn compute_solution_for_result(&self, state: &State) -> Result<Solution> {
        state.solution_for_result()
    }
}
