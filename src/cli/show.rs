//! Show command for statedeck.
//!
//! Prints one stored checkpoint in detail.

use serde::{Deserialize, Serialize};

use crate::core::InteractionObject;
use crate::storage::{retrieve_checkpoint, CheckpointStore, StoredCheckpoint};

/// Options for the show command.
#[derive(Debug, Clone, Default)]
pub struct ShowOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the show command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowOutput {
    /// Whether the command was successful.
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<StoredCheckpoint>,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ShowOutput {
    /// Create a successful output.
    pub fn success(checkpoint: StoredCheckpoint) -> Self {
        Self {
            success: true,
            checkpoint: Some(checkpoint),
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            checkpoint: None,
            error: Some(error.into()),
        }
    }

    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        let stored = match (&self.checkpoint, self.success) {
            (Some(stored), true) => stored,
            _ => {
                return format!(
                    "Show failed: {}",
                    self.error.as_deref().unwrap_or("unknown error")
                )
            }
        };
        let checkpoint = &stored.checkpoint;

        let mut lines = vec![
            format!("Exploration: {}", stored.exploration_id),
            format!(
                "Title:       {} (v{})",
                checkpoint.exploration_title, checkpoint.exploration_version
            ),
            format!("Saved:       {}", stored.saved_at.to_rfc3339()),
            format!(
                "Started:     {}",
                checkpoint.timestamp_of_first_checkpoint.to_rfc3339()
            ),
            format!("Viewing:     card {}", checkpoint.state_index),
            String::new(),
            format!(
                "Completed cards ({}):",
                checkpoint.completed_states_in_checkpoint.len()
            ),
        ];

        for completed in &checkpoint.completed_states_in_checkpoint {
            lines.push(format!(
                "  {} ({} answer(s))",
                completed.state_name,
                completed.completed_state.answers.len()
            ));
        }

        lines.push(String::new());
        lines.push(format!("Pending card: {}", checkpoint.pending_state_name));
        for answer in &checkpoint.pending_user_answers {
            lines.push(format!("  answered {}", describe_answer(&answer.user_answer)));
        }
        if let Some(index) = checkpoint.revealed_hint_index {
            lines.push(format!("  hints revealed through #{}", index));
        }
        if checkpoint.solution_is_revealed {
            lines.push("  solution revealed".to_string());
        }

        lines.join("\n")
    }
}

/// Render an answer value on one line.
fn describe_answer(answer: &InteractionObject) -> String {
    match answer {
        InteractionObject::Text(text) | InteractionObject::Normalized(text) => {
            format!("{:?}", text)
        }
        InteractionObject::NonNegativeInt(n) => n.to_string(),
        InteractionObject::Real(x) => x.to_string(),
        InteractionObject::SetOfHtmlStrings(items) => format!("[{}]", items.join(", ")),
    }
}

/// The show command implementation.
pub struct ShowCommand<S: CheckpointStore> {
    store: S,
}

impl<S: CheckpointStore> ShowCommand<S> {
    /// Create a new show command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Run the show command.
    pub fn run(&self, exploration_id: &str) -> ShowOutput {
        match retrieve_checkpoint(&self.store, exploration_id) {
            Ok(stored) => ShowOutput::success(stored),
            Err(e) => ShowOutput::failure(e.to_string()),
        }
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ShowOutput, options: &ShowOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            output.format_text()
        }
    }
}
