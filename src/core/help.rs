//! Help availability for the pending card.
//!
//! Reveal timing (how long a learner waits before a hint unlocks) belongs to
//! the UI. This module only answers the deterministic part: given what has
//! been revealed so far, what is the next piece of help.

use serde::{Deserialize, Serialize};

use crate::core::state::Interaction;

/// What help the learner can use next on the pending card.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "type", content = "index")]
pub enum HelpIndex {
    /// Nothing to offer yet.
    #[default]
    Unavailable,
    /// The hint at this index can be revealed.
    NextAvailableHint(usize),
    /// The hint at this index is the most recently revealed one.
    LatestRevealedHint(usize),
    /// All hints are revealed and the solution can be shown.
    ShowSolution,
    /// Every hint and the solution have been revealed.
    EverythingRevealed,
}

impl HelpIndex {
    /// Derive the help index for a card.
    ///
    /// `revealed_hint_index` is the latest revealed hint, if any. Hints are
    /// revealed in order, so every hint up to and including it is revealed.
    pub fn compute(
        interaction: &Interaction,
        revealed_hint_index: Option<usize>,
        solution_is_revealed: bool,
        wrong_answer_count: usize,
    ) -> Self {
        if !interaction.has_help() {
            return HelpIndex::Unavailable;
        }
        if solution_is_revealed {
            return HelpIndex::EverythingRevealed;
        }

        let hint_count = interaction.hints.len();
        let has_solution = interaction.solution.is_some();

        match revealed_hint_index {
            Some(latest) if latest + 1 >= hint_count => {
                if has_solution {
                    HelpIndex::ShowSolution
                } else {
                    HelpIndex::EverythingRevealed
                }
            }
            Some(latest) => HelpIndex::LatestRevealedHint(latest),
            None if wrong_answer_count == 0 => HelpIndex::Unavailable,
            None if hint_count > 0 => HelpIndex::NextAvailableHint(0),
            None => HelpIndex::ShowSolution,
        }
    }

    /// Whether the learner has used every piece of help on offer.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, HelpIndex::EverythingRevealed)
    }
}
