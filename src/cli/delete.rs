//! Delete command for statedeck.
//!
//! Removes the stored checkpoint of one exploration.

use serde::{Deserialize, Serialize};

use crate::error::{DeckError, Result};
use crate::storage::CheckpointStore;

/// Options for the delete command.
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the delete command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteOutput {
    /// Whether the command was successful.
    pub success: bool,
    pub exploration_id: String,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeleteOutput {
    pub fn success(exploration_id: impl Into<String>) -> Self {
        Self {
            success: true,
            exploration_id: exploration_id.into(),
            error: None,
        }
    }

    pub fn failure(exploration_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            exploration_id: exploration_id.into(),
            error: Some(error.into()),
        }
    }

    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        if self.success {
            format!("Deleted checkpoint {}", self.exploration_id)
        } else {
            format!(
                "Delete failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

/// The delete command implementation.
pub struct DeleteCommand<S: CheckpointStore> {
    store: S,
}

impl<S: CheckpointStore> DeleteCommand<S> {
    /// Create a new delete command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Run the delete command. Deleting an unknown id is a failure.
    pub fn run(&self, exploration_id: &str) -> DeleteOutput {
        match self.delete_checkpoint(exploration_id) {
            Ok(()) => DeleteOutput::success(exploration_id),
            Err(e) => DeleteOutput::failure(exploration_id, e.to_string()),
        }
    }

    fn delete_checkpoint(&self, exploration_id: &str) -> Result<()> {
        if !self.store.exists(exploration_id)? {
            return Err(DeckError::checkpoint_not_found(exploration_id));
        }
        self.store.delete(exploration_id)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &DeleteOutput, options: &DeleteOptions) -> String {
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
