//! The learner's card deck.
//!
//! A deck is the navigable history of one playback session: the cards the
//! learner has finished, plus the single open card on top. The learner can
//! page back through finished cards and forward again, but answers, hints,
//! and pushes only ever apply to the top. All mutations go through
//! [`StateDeck`], and every rejected operation leaves the deck untouched.

use std::mem;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::checkpoint::{CompletedStateInCheckpoint, ExplorationCheckpoint};
use crate::core::help::HelpIndex;
use crate::core::state::{
    AnswerAndResponse, CompletedState, EphemeralState, Hint, InteractionObject, PendingState,
    Solution, State, StateKind, SubtitledHtml,
};
use crate::error::{DeckError, Result};

/// Interaction id that marks the end of an exploration.
pub const DEFAULT_TERMINAL_INTERACTION_ID: &str = "EndExploration";

/// Decides whether the card on top of the deck ends the session.
pub trait TerminalStateChecker {
    fn is_terminal(&self, state: &State) -> bool;
}

impl<F> TerminalStateChecker for F
where
    F: Fn(&State) -> bool,
{
    fn is_terminal(&self, state: &State) -> bool {
        self(state)
    }
}

/// Treats a state as terminal when its interaction has a given id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractionIdTerminalChecker {
    terminal_interaction_id: String,
}

impl InteractionIdTerminalChecker {
    pub fn new(terminal_interaction_id: impl Into<String>) -> Self {
        Self {
            terminal_interaction_id: terminal_interaction_id.into(),
        }
    }

    pub fn interaction_id(&self) -> &str {
        &self.terminal_interaction_id
    }
}

impl Default for InteractionIdTerminalChecker {
    fn default() -> Self {
        Self::new(DEFAULT_TERMINAL_INTERACTION_ID)
    }
}

impl TerminalStateChecker for InteractionIdTerminalChecker {
    fn is_terminal(&self, state: &State) -> bool {
        state.interaction.id == self.terminal_interaction_id
    }
}

/// Where the learner's cursor sits in the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeckPosition {
    /// On the first card, nothing finished yet.
    Initial,
    /// On the open card at the top, with finished cards behind it.
    Pending,
    /// Browsing a finished card behind the top.
    Reviewing,
    /// On a terminal card at the top.
    Terminal,
}

impl DeckPosition {
    fn name(&self) -> &'static str {
        match self {
            DeckPosition::Initial => "Initial",
            DeckPosition::Pending => "Pending",
            DeckPosition::Reviewing => "Reviewing",
            DeckPosition::Terminal => "Terminal",
        }
    }
}

/// Session state machine over a stack of cards.
///
/// Invariant: `state_index <= previous_states.len()`, and the cursor is at
/// the top exactly when they are equal.
#[derive(Debug, Clone, PartialEq)]
pub struct StateDeck<C = InteractionIdTerminalChecker> {
    /// Most recently reached card, possibly still open.
    pending_top_state: State,
    /// Finished cards, oldest first.
    previous_states: Vec<EphemeralState>,
    /// Answers submitted to the top card since it was opened.
    current_dialog_interactions: Vec<AnswerAndResponse>,
    /// Card the learner is viewing.
    state_index: usize,
    /// Hint reveal records for the top card.
    hint_list: Vec<Hint>,
    /// Latest hint revealed on the top card.
    revealed_hint_index: Option<usize>,
    /// Solution reveal record for the top card.
    solution: Option<Solution>,
    solution_is_revealed: bool,
    is_top_of_deck_terminal: C,
}

impl StateDeck<InteractionIdTerminalChecker> {
    /// Create a deck that treats `EndExploration` cards as terminal.
    pub fn with_default_checker(initial_state: State) -> Self {
        Self::new(initial_state, InteractionIdTerminalChecker::default())
    }
}

impl<C: TerminalStateChecker> StateDeck<C> {
    /// Create a new deck opened on `initial_state`.
    pub fn new(initial_state: State, is_top_of_deck_terminal: C) -> Self {
        Self {
            pending_top_state: initial_state,
            previous_states: Vec::new(),
            current_dialog_interactions: Vec::new(),
            state_index: 0,
            hint_list: Vec::new(),
            revealed_hint_index: None,
            solution: None,
            solution_is_revealed: false,
            is_top_of_deck_terminal,
        }
    }

    /// Reset this deck in place to a new initial state.
    pub fn reset_deck(&mut self, initial_state: State) {
        tracing::debug!(state_name = %initial_state.name, "resetting deck");
        self.pending_top_state = initial_state;
        self.previous_states.clear();
        self.current_dialog_interactions.clear();
        self.state_index = 0;
        self.reset_help_tracking();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The latest card in the deck, whichever card the learner is viewing.
    pub fn pending_top_state(&self) -> &State {
        &self.pending_top_state
    }

    /// Index of the card the learner is viewing.
    pub fn state_index(&self) -> usize {
        self.state_index
    }

    /// Number of finished cards.
    pub fn completed_state_count(&self) -> usize {
        self.previous_states.len()
    }

    /// Answers submitted to the top card so far.
    pub fn pending_answers(&self) -> &[AnswerAndResponse] {
        &self.current_dialog_interactions
    }

    /// Hint reveal records for the top card.
    pub fn revealed_hints(&self) -> &[Hint] {
        &self.hint_list
    }

    /// Solution reveal record for the top card.
    pub fn revealed_solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    /// Index of the latest hint shown on the top card, if any.
    pub fn revealed_hint_index(&self) -> Option<usize> {
        self.revealed_hint_index
    }

    /// Whether the top card's solution has been shown.
    pub fn solution_is_revealed(&self) -> bool {
        self.solution_is_revealed
    }

    /// Whether the learner is viewing the first card.
    pub fn is_current_state_initial(&self) -> bool {
        self.state_index == 0
    }

    /// Whether the learner is viewing the most recent card.
    pub fn is_current_state_top_of_deck(&self) -> bool {
        self.state_index == self.previous_states.len()
    }

    /// Whether the learner is viewing a terminal card.
    ///
    /// Only the top card can be terminal.
    pub fn is_current_state_terminal(&self) -> bool {
        self.is_current_state_top_of_deck() && self.is_top_of_deck_terminal()
    }

    fn is_top_of_deck_terminal(&self) -> bool {
        self.is_top_of_deck_terminal
            .is_terminal(&self.pending_top_state)
    }

    /// Where the cursor currently sits.
    pub fn position(&self) -> DeckPosition {
        if self.is_current_state_terminal() {
            DeckPosition::Terminal
        } else if !self.is_current_state_top_of_deck() {
            DeckPosition::Reviewing
        } else if self.previous_states.is_empty() {
            DeckPosition::Initial
        } else {
            DeckPosition::Pending
        }
    }

    /// Help available on the top card.
    pub fn help_index(&self) -> HelpIndex {
        HelpIndex::compute(
            &self.pending_top_state.interaction,
            self.revealed_hint_index,
            self.solution_is_revealed,
            self.current_dialog_interactions.len(),
        )
    }

    /// The card the learner is viewing, ready to render.
    pub fn current_ephemeral_state(&self) -> EphemeralState {
        if self.is_current_state_terminal() {
            self.current_terminal_state()
        } else if self.is_current_state_top_of_deck() {
            self.current_pending_state()
        } else {
            // state_index < previous_states.len() when not at the top.
            self.previous_states[self.state_index].clone()
        }
    }

    fn current_pending_state(&self) -> EphemeralState {
        EphemeralState {
            state: self.pending_top_state.clone(),
            has_previous_state: !self.is_current_state_initial(),
            has_next_state: false,
            kind: StateKind::Pending(PendingState {
                wrong_answers: self.current_dialog_interactions.clone(),
                help_index: self.help_index(),
            }),
        }
    }

    fn current_terminal_state(&self) -> EphemeralState {
        EphemeralState {
            state: self.pending_top_state.clone(),
            has_previous_state: !self.is_current_state_initial(),
            has_next_state: false,
            kind: StateKind::Terminal,
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Move the cursor back one card.
    pub fn navigate_to_previous_state(&mut self) -> Result<()> {
        if self.is_current_state_initial() {
            return Err(DeckError::navigation(
                "Cannot navigate to previous state; at initial state",
            ));
        }
        self.state_index -= 1;
        tracing::debug!(state_index = self.state_index, "navigated to previous state");
        Ok(())
    }

    /// Move the cursor forward one card.
    ///
    /// The card being left learns that it has a next card only now, the
    /// first time the learner actually moves past it.
    pub fn navigate_to_next_state(&mut self) -> Result<()> {
        if self.is_current_state_top_of_deck() {
            return Err(DeckError::navigation(
                "Cannot navigate to next state; at most recent state",
            ));
        }
        self.previous_states[self.state_index].has_next_state = true;
        self.state_index += 1;
        tracing::debug!(state_index = self.state_index, "navigated to next state");
        Ok(())
    }

    // =========================================================================
    // Transitions on the top card
    // =========================================================================

    /// Finalize the top card and open `state` as the new top.
    ///
    /// Requires the cursor at the top, a non-terminal top, and at least one
    /// submitted answer. With `prohibit_same_state_name`, a card cannot be
    /// followed by a card of the same name. The cursor stays pinned to the
    /// top, so it follows the new card.
    pub fn push_state(&mut self, state: State, prohibit_same_state_name: bool) -> Result<()> {
        self.check_top_of_deck("push a new state")?;
        if self.current_dialog_interactions.is_empty() {
            return Err(DeckError::invalid_state(
                "Cannot push another state without an answer",
            ));
        }
        if prohibit_same_state_name && state.name == self.pending_top_state.name {
            return Err(DeckError::invalid_state(format!(
                "Cannot route from state {} to itself as a new card",
                state.name
            )));
        }

        let has_previous_state = !self.is_current_state_initial();
        let finished = mem::replace(&mut self.pending_top_state, state);
        let answers = mem::take(&mut self.current_dialog_interactions);
        tracing::debug!(
            state_name = %finished.name,
            answer_count = answers.len(),
            next_state_name = %self.pending_top_state.name,
            "pushed state"
        );
        self.previous_states.push(EphemeralState {
            state: finished,
            has_previous_state,
            has_next_state: false,
            kind: StateKind::Completed(CompletedState { answers }),
        });
        self.state_index = self.previous_states.len();
        self.reset_help_tracking();
        Ok(())
    }

    /// Record an answer and its feedback against the top card.
    pub fn submit_answer(
        &mut self,
        user_answer: InteractionObject,
        feedback: SubtitledHtml,
    ) -> Result<()> {
        self.check_top_of_deck("submit an answer")?;
        self.current_dialog_interactions
            .push(AnswerAndResponse::new(user_answer, feedback));
        tracing::debug!(
            state_name = %self.pending_top_state.name,
            answer_count = self.current_dialog_interactions.len(),
            "submitted answer"
        );
        Ok(())
    }

    /// Record that the hint at `hint_index` of `state` was shown or hidden.
    pub fn submit_hint_revealed(
        &mut self,
        state: &State,
        hint_is_revealed: bool,
        hint_index: usize,
    ) -> Result<()> {
        let hint = state
            .interaction
            .hint_for_result(hint_is_revealed, hint_index)?;
        self.hint_list.push(hint);
        Ok(())
    }

    /// Record that the solution of `state` was shown.
    pub fn submit_solution_revealed(&mut self, state: &State) -> Result<()> {
        self.solution = Some(state.solution_for_result()?);
        Ok(())
    }

    /// Reveal the hint at `hint_index` on the top card.
    ///
    /// Hints are revealed in order. The top card is replaced by a copy with
    /// that hint marked revealed; the learner is still on the same card.
    pub fn push_state_for_hint(
        &mut self,
        state: &State,
        hint_index: usize,
    ) -> Result<EphemeralState> {
        self.check_top_of_deck("reveal a hint")?;
        self.check_same_card(state)?;

        let hint_count = self.pending_top_state.interaction.hints.len();
        if hint_index >= hint_count {
            return Err(DeckError::index_out_of_range("hint", hint_index, hint_count));
        }
        let expected = self.revealed_hint_index.map_or(0, |latest| latest + 1);
        if hint_index != expected {
            return Err(DeckError::invalid_state(format!(
                "Cannot reveal hint {} before hint {}",
                hint_index, expected
            )));
        }

        self.pending_top_state.interaction.hints[hint_index].hint_is_revealed = true;
        self.revealed_hint_index = Some(hint_index);
        tracing::debug!(
            state_name = %self.pending_top_state.name,
            hint_index,
            "revealed hint"
        );
        Ok(self.current_pending_state())
    }

    /// Reveal the solution on the top card.
    ///
    /// Once revealed, the solution stays revealed until the next push or
    /// reset.
    pub fn push_state_for_solution(&mut self, state: &State) -> Result<EphemeralState> {
        self.check_top_of_deck("reveal the solution")?;
        self.check_same_card(state)?;

        let name = self.pending_top_state.name.clone();
        let solution = self
            .pending_top_state
            .interaction
            .solution
            .as_mut()
            .ok_or_else(|| DeckError::missing_solution(&name))?;
        solution.solution_is_revealed = true;
        self.solution_is_revealed = true;
        tracing::debug!(state_name = %name, "revealed solution");
        Ok(self.current_pending_state())
    }

    // =========================================================================
    // Checkpointing
    // =========================================================================

    /// Snapshot the deck for resuming later. Does not mutate the deck.
    pub fn create_exploration_checkpoint(
        &self,
        exploration_version: u32,
        exploration_title: impl Into<String>,
        timestamp_of_first_checkpoint: DateTime<Utc>,
    ) -> ExplorationCheckpoint {
        let completed_states_in_checkpoint = self
            .previous_states
            .iter()
            .filter_map(|previous| {
                previous
                    .completed_state()
                    .map(|completed| CompletedStateInCheckpoint {
                        state_name: previous.state.name.clone(),
                        completed_state: completed.clone(),
                    })
            })
            .collect();

        ExplorationCheckpoint {
            completed_states_in_checkpoint,
            pending_state_name: self.pending_top_state.name.clone(),
            revealed_hint_index: self.revealed_hint_index,
            pending_user_answers: self.current_dialog_interactions.clone(),
            solution_is_revealed: self.solution_is_revealed,
            state_index: self.state_index,
            exploration_version,
            exploration_title: exploration_title.into(),
            timestamp_of_first_checkpoint,
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Fail unless the cursor is on a non-terminal top card.
    fn check_top_of_deck(&self, action: &str) -> Result<()> {
        match self.position() {
            DeckPosition::Initial | DeckPosition::Pending => Ok(()),
            position @ (DeckPosition::Reviewing | DeckPosition::Terminal) => {
                Err(DeckError::invalid_state(format!(
                    "Cannot {} in {} position",
                    action,
                    position.name()
                )))
            }
        }
    }

    fn check_same_card(&self, state: &State) -> Result<()> {
        if state.name != self.pending_top_state.name {
            return Err(DeckError::invalid_state(format!(
                "State {} is not the current card {}",
                state.name, self.pending_top_state.name
            )));
        }
        Ok(())
    }

    fn reset_help_tracking(&mut self) {
        self.hint_list.clear();
        self.revealed_hint_index = None;
        self.solution = None;
        self.solution_is_revealed = false;
    }
}
