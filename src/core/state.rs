//! Lesson and session record types.
//!
//! [`State`] and everything it contains is immutable lesson data supplied by
//! whoever loads the exploration. [`EphemeralState`] and friends are views
//! the deck computes for rendering; they are never persisted directly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::help::HelpIndex;
use crate::error::{DeckError, Result};

/// Rich text with a translation content id.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubtitledHtml {
    /// Identifier used to look up translations and voiceovers.
    pub content_id: String,
    /// HTML body.
    pub html: String,
}

impl SubtitledHtml {
    /// Create a new piece of rich text.
    pub fn new(content_id: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            html: html.into(),
        }
    }
}

/// A learner-submitted answer value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum InteractionObject {
    /// Free-form text.
    Text(String),
    /// A non-negative integer, e.g. a multiple choice index.
    NonNegativeInt(u32),
    /// A real number.
    Real(f64),
    /// A set of HTML choices (item selection).
    SetOfHtmlStrings(Vec<String>),
    /// A normalized string form produced by an input parser
    /// (fractions, ratios, numbers with units).
    Normalized(String),
}

/// Raw classification of a submitted answer, produced by the rule engine.
///
/// Empty id strings mean the field is absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Outcome {
    /// Name of the state the answer routes to.
    pub dest_state_name: String,
    /// Feedback shown to the learner.
    pub feedback: SubtitledHtml,
    /// Whether the answer group is labelled correct.
    pub labelled_as_correct: bool,
    /// Refresher exploration to send the learner to, if any.
    pub refresher_exploration_id: String,
    /// Skill the learner is missing, if any.
    pub missing_prerequisite_skill_id: String,
}

impl Outcome {
    /// Create an outcome routing to `dest_state_name`.
    pub fn to_state(dest_state_name: impl Into<String>, feedback: SubtitledHtml) -> Self {
        Self {
            dest_state_name: dest_state_name.into(),
            feedback,
            ..Default::default()
        }
    }

    /// Mark this outcome as labelled correct.
    pub fn labelled_correct(mut self) -> Self {
        self.labelled_as_correct = true;
        self
    }
}

/// A single rule; evaluated by the external classifier, opaque here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RuleSpec {
    /// Rule type, e.g. `Equals` or `IsGreaterThan`.
    pub rule_type: String,
    /// Named rule inputs.
    pub inputs: BTreeMap<String, InteractionObject>,
}

/// Rules that share one outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnswerGroup {
    pub outcome: Outcome,
    pub rule_specs: Vec<RuleSpec>,
}

/// A hint attached to an interaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hint {
    /// Whether the learner has revealed this hint.
    pub hint_is_revealed: bool,
    /// Hint body.
    pub hint_content: SubtitledHtml,
}

impl Hint {
    /// Create an unrevealed hint.
    pub fn new(hint_content: SubtitledHtml) -> Self {
        Self {
            hint_is_revealed: false,
            hint_content,
        }
    }
}

/// A worked solution attached to an interaction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Solution {
    /// Whether the correct answer is the only one accepted.
    pub answer_is_exclusive: bool,
    /// The correct answer, when the interaction has a single one.
    pub correct_answer: Option<InteractionObject>,
    /// Explanation shown with the answer.
    pub explanation: SubtitledHtml,
    /// Whether the learner has revealed the solution.
    pub solution_is_revealed: bool,
}

/// The interaction a state asks the learner to complete.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Interaction {
    /// Interaction type id, e.g. `TextInput` or `EndExploration`.
    pub id: String,
    pub answer_groups: Vec<AnswerGroup>,
    pub default_outcome: Option<Outcome>,
    pub hints: Vec<Hint>,
    pub solution: Option<Solution>,
}

impl Interaction {
    /// Return the hint at `hint_index` with the given reveal flag.
    pub fn hint_for_result(&self, hint_is_revealed: bool, hint_index: usize) -> Result<Hint> {
        let hint = self
            .hints
            .get(hint_index)
            .ok_or_else(|| DeckError::index_out_of_range("hint", hint_index, self.hints.len()))?;
        Ok(Hint {
            hint_is_revealed,
            hint_content: hint.hint_content.clone(),
        })
    }

    /// Whether the interaction offers any help at all.
    pub fn has_help(&self) -> bool {
        !self.hints.is_empty() || self.solution.is_some()
    }
}

/// A single lesson card.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct State {
    /// Name of the state; unique within its graph.
    pub name: String,
    /// Card content.
    pub content: SubtitledHtml,
    /// Interaction the learner must complete.
    pub interaction: Interaction,
}

impl State {
    /// Create a state with the given name, content, and interaction id.
    pub fn new(
        name: impl Into<String>,
        content: SubtitledHtml,
        interaction_id: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            content,
            interaction: Interaction {
                id: interaction_id.into(),
                ..Default::default()
            },
        }
    }

    /// Attach hints to this state's interaction.
    pub fn with_hints(mut self, hints: Vec<Hint>) -> Self {
        self.interaction.hints = hints;
        self
    }

    /// Attach a solution to this state's interaction.
    pub fn with_solution(mut self, solution: Solution) -> Self {
        self.interaction.solution = Some(solution);
        self
    }

    /// Compute the repackaged solution for this state, marked revealed.
    pub fn solution_for_result(&self) -> Result<Solution> {
        let solution = self
            .interaction
            .solution
            .as_ref()
            .ok_or_else(|| DeckError::missing_solution(&self.name))?;
        Ok(Solution {
            solution_is_revealed: true,
            ..solution.clone()
        })
    }
}

/// One submitted answer with the feedback it received.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerAndResponse {
    pub user_answer: InteractionObject,
    pub feedback: SubtitledHtml,
}

impl AnswerAndResponse {
    pub fn new(user_answer: InteractionObject, feedback: SubtitledHtml) -> Self {
        Self {
            user_answer,
            feedback,
        }
    }
}

/// Where an exploration answer sends the learner.
///
/// Exactly one destination applies per answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum AnswerDestination {
    /// Leave for a refresher exploration.
    RefresherExploration(String),
    /// Route to remediation for a missing prerequisite skill.
    MissingPrerequisiteSkill(String),
    /// Stay on the current card and re-prompt.
    SameState,
    /// Advance to the named state.
    State(String),
}

/// Classified outcome of an exploration answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub feedback: SubtitledHtml,
    pub is_correct_answer: bool,
    pub destination: AnswerDestination,
}

impl AnswerOutcome {
    /// Name of the next state, if this outcome advances the learner.
    pub fn state_name(&self) -> Option<&str> {
        match &self.destination {
            AnswerDestination::State(name) => Some(name),
            _ => None,
        }
    }
}

/// Classified outcome of a practice question answer. No routing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnsweredQuestionOutcome {
    pub feedback: SubtitledHtml,
    pub is_correct_answer: bool,
}

/// Answers and help state for the card the learner is still working.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PendingState {
    /// Answers submitted so far; none of them finalized the card.
    pub wrong_answers: Vec<AnswerAndResponse>,
    /// What help the learner can use next.
    pub help_index: HelpIndex,
}

/// Answer history of a finished card.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompletedState {
    pub answers: Vec<AnswerAndResponse>,
}

/// Which of the three card views an [`EphemeralState`] is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    Pending(PendingState),
    Completed(CompletedState),
    Terminal,
}

/// What the learner should see right now.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EphemeralState {
    pub state: State,
    pub has_previous_state: bool,
    pub has_next_state: bool,
    pub kind: StateKind,
}

impl EphemeralState {
    /// Whether this is the session end marker.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, StateKind::Terminal)
    }

    /// The pending view, if this is the open card.
    pub fn pending_state(&self) -> Option<&PendingState> {
        match &self.kind {
            StateKind::Pending(pending) => Some(pending),
            _ => None,
        }
    }

    /// The completed view, if this is a finished card.
    pub fn completed_state(&self) -> Option<&CompletedState> {
        match &self.kind {
            StateKind::Completed(completed) => Some(completed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hinted_state() -> State {
        State::new("Q1", SubtitledHtml::new("content", "What is 1/2 + 1/4?"), "FractionInput")
            .with_hints(vec![
                Hint::new(SubtitledHtml::new("hint_0", "Find a common denominator")),
                Hint::new(SubtitledHtml::new("hint_1", "Quarters")),
            ])
    }

    #[test]
    fn test_hint_for_result_copies_content() {
        let state = hinted_state();
        let hint = state.interaction.hint_for_result(true, 1).unwrap();

        assert!(hint.hint_is_revealed);
        assert_eq!(hint.hint_content.html, "Quarters");
    }

    #[test]
    fn test_hint_for_result_out_of_range() {
        let state = hinted_state();
        let err = state.interaction.hint_for_result(true, 2).unwrap_err();
        assert!(matches!(
            err,
            DeckError::IndexOutOfRange {
                kind: "hint",
                index: 2,
                len: 2
            }
        ));
    }

    #[test]
    fn test_solution_for_result_marks_revealed() {
        let state = hinted_state().with_solution(Solution {
            correct_answer: Some(InteractionObject::Normalized("3/4".to_string())),
            explanation: SubtitledHtml::new("solution", "2/4 + 1/4"),
            ..Default::default()
        });

        let solution = state.solution_for_result().unwrap();
        assert!(solution.solution_is_revealed);
        assert_eq!(solution.explanation.html, "2/4 + 1/4");
    }

    #[test]
    fn test_solution_for_result_missing() {
        let err = hinted_state().solution_for_result().unwrap_err();
        assert!(matches!(err, DeckError::MissingSolution { .. }));
    }

    #[test]
    fn test_has_help() {
        assert!(hinted_state().interaction.has_help());
        let bare = State::new("End", SubtitledHtml::default(), "EndExploration");
        assert!(!bare.interaction.has_help());
    }

    #[test]
    fn test_answer_outcome_state_name() {
        let outcome = AnswerOutcome {
            feedback: SubtitledHtml::default(),
            is_correct_answer: true,
            destination: AnswerDestination::State("Next".to_string()),
        };
        assert_eq!(outcome.state_name(), Some("Next"));

        let same = AnswerOutcome {
            destination: AnswerDestination::SameState,
            ..outcome
        };
        assert_eq!(same.state_name(), None);
    }

    #[test]
    fn test_interaction_object_serialization() {
        let answer = InteractionObject::Text("one half".to_string());
        let json = serde_json::to_string(&answer).unwrap();
        assert_eq!(json, r#"{"type":"text","value":"one half"}"#);
    }
}
