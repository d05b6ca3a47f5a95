//! Ordered list of practice questions.
//!
//! The sibling of [`StateGraph`](crate::core::graph::StateGraph) for
//! skill-practice sessions. Questions are played in order; there is no
//! routing, only a correct/incorrect classification.

use crate::core::state::{AnsweredQuestionOutcome, Hint, Outcome, Solution, State};
use crate::error::{DeckError, Result};

/// Ordered training questions for one practice session.
#[derive(Debug, Clone, Default)]
pub struct StateList {
    questions: Vec<State>,
}

impl StateList {
    /// Create a list over the given questions.
    pub fn new(questions: Vec<State>) -> Self {
        Self { questions }
    }

    /// Replace the question list.
    pub fn reset(&mut self, questions: Vec<State>) {
        tracing::debug!(question_count = questions.len(), "resetting state list");
        self.questions = questions;
    }

    /// Return the question at `index`.
    pub fn get_state(&self, index: usize) -> Result<&State> {
        self.questions
            .get(index)
            .ok_or_else(|| DeckError::index_out_of_range("question", index, self.questions.len()))
    }

    /// Return the first question; fails on an empty list.
    pub fn get_first_state(&self) -> Result<&State> {
        self.get_state(0)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Classify a practice answer. Questions have no destinations.
    pub fn compute_answer_outcome_for_result(&self, outcome: &Outcome) -> AnsweredQuestionOutcome {
        AnsweredQuestionOutcome {
            feedback: outcome.feedback.clone(),
            is_correct_answer: outcome.labelled_as_correct,
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

    /// Repackage the question's solution, marked revealed.
    pub fn compute_solution_for_result(&self, state: &State) -> Result<Solution> {
        state.solution_for_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::SubtitledHtml;

    fn question(name: &str) -> State {
        State::new(name, SubtitledHtml::new("question", name), "NumericInput")
    }

    #[test]
    fn test_get_state_by_index() {
        let list = StateList::new(vec![question("q1"), question("q2")]);
        assert_eq!(list.get_state(1).unwrap().name, "q2");
        assert_eq!(list.get_first_state().unwrap().name, "q1");
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_get_state_out_of_range() {
        let list = StateList::new(vec![question("q1")]);
        let err = list.get_state(1).unwrap_err();
        assert!(matches!(
            err,
            DeckError::IndexOutOfRange {
                kind: "question",
                index: 1,
                len: 1
            }
        ));
    }

    #[test]
    fn test_get_first_state_empty_list() {
        let list = StateList::default();
        assert!(list.is_empty());
        assert!(list.get_first_state().is_err());
    }

    #[test]
    fn test_reset_replaces_questions() {
        let mut list = StateList::new(vec![question("q1")]);
        list.reset(vec![question("a"), question("b"), question("c")]);
        assert_eq!(list.len(), 3);
        assert_eq!(list.get_first_state().unwrap().name, "a");
    }

    #[test]
    fn test_outcome_is_correctness_only() {
        let list = StateList::new(vec![question("q1")]);
        let outcome = Outcome {
            refresher_exploration_id: "ignored".to_string(),
            ..Outcome::to_state("elsewhere", SubtitledHtml::new("fb", "Correct!")).labelled_correct()
        };

        let result = list.compute_answer_outcome_for_result(&outcome);

        assert!(result.is_correct_answer);
        assert_eq!(result.feedback.html, "Correct!");
    }

    #[test]
    fn test_hint_and_solution() {
        let list = StateList::default();
        let q = question("q1").with_hints(vec![Hint::new(SubtitledHtml::new("h", "Carry the one"))]);

        let hint = list.compute_hint_for_result(&q, false, 0).unwrap();
        assert!(!hint.hint_is_revealed);
        assert!(list.compute_solution_for_result(&q).is_err());
    }
}
