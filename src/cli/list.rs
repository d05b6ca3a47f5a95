//! List command for statedeck.
//!
//! Lists stored checkpoints with their exploration ids, useful for finding
//! ids to pass to `statedeck show` and `statedeck delete`.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::{CheckpointStore, StoredCheckpoint};

/// Options for the list command.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Maximum number of checkpoints to show.
    pub limit: usize,
}

/// Summary of a single checkpoint for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointSummary {
    pub exploration_id: String,
    pub title: String,
    pub version: u32,
    /// Card the learner will resume on.
    pub pending_state_name: String,
    /// Number of finished cards.
    pub completed_count: usize,
    /// Save timestamp (RFC 3339).
    pub saved_at: String,
}

impl From<&StoredCheckpoint> for CheckpointSummary {
    fn from(stored: &StoredCheckpoint) -> Self {
        Self {
            exploration_id: stored.exploration_id.clone(),
            title: stored.checkpoint.exploration_title.clone(),
            version: stored.checkpoint.exploration_version,
            pending_state_name: stored.checkpoint.pending_state_name.clone(),
            completed_count: stored.checkpoint.completed_count(),
            saved_at: stored.saved_at.to_rfc3339(),
        }
    }
}

/// Output format for the list command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOutput {
    /// Whether the command was successful.
    pub success: bool,
    pub checkpoints: Vec<CheckpointSummary>,
    /// Total count of checkpoints returned.
    pub count: usize,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ListOutput {
    /// Create a successful output.
    pub fn success(checkpoints: Vec<CheckpointSummary>) -> Self {
        let count = checkpoints.len();
        Self {
            success: true,
            checkpoints,
            count,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            checkpoints: vec![],
            count: 0,
            error: Some(error.into()),
        }
    }

    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        if !self.success {
            return format!(
                "List failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            );
        }

        if self.checkpoints.is_empty() {
            return "No checkpoints found.".to_string();
        }

        let mut lines = vec![format!("Checkpoints ({} found):", self.count)];
        lines.push(String::new());

        lines.push(format!(
            "{:<24}  {:<24}  {:>4}  {:<20}  {:<20}",
            "EXPLORATION", "TITLE", "VER", "PENDING", "SAVED"
        ));
        lines.push("-".repeat(100));

        for summary in &self.checkpoints {
            // YYYY-MM-DDTHH:MM:SS
            let saved: String = summary.saved_at.chars().take(19).collect();
            lines.push(format!(
                "{:<24}  {:<24}  {:>4}  {:<20}  {:<20}",
                summary.exploration_id,
                truncate(&summary.title, 24),
                summary.version,
                truncate(&summary.pending_state_name, 20),
                saved
            ));
        }

        lines.join("\n")
    }
}

/// Truncate to `max` characters, marking the cut with an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// The list command implementation.
pub struct ListCommand<S: CheckpointStore> {
    store: S,
}

impl<S: CheckpointStore> ListCommand<S> {
    /// Create a new list command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Run the list command.
    pub fn run(&self, options: &ListOptions) -> ListOutput {
        match self.list_checkpoints(options.limit) {
            Ok(checkpoints) => {
                ListOutput::success(checkpoints.iter().map(CheckpointSummary::from).collect())
            }
            Err(e) => ListOutput::failure(format!("Failed to list checkpoints: {}", e)),
        }
    }

    fn list_checkpoints(&self, limit: usize) -> Result<Vec<StoredCheckpoint>> {
        self.store.list(limit)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ListOutput, options: &ListOptions) -> String {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::tests::sample_checkpoint;
    use crate::storage::MemoryCheckpointStore;
    use std::sync::Arc;

    fn create_test_store() -> Arc<MemoryCheckpointStore> {
        Arc::new(MemoryCheckpointStore::new())
    }

    fn options(limit: usize) -> ListOptions {
        ListOptions {
            limit,
            ..Default::default()
        }
    }

    #[test]
    fn test_list_empty() {
        let cmd = ListCommand::new(create_test_store());

        let output = cmd.run(&options(10));
        assert!(output.success);
        assert_eq!(output.count, 0);
        assert!(output.format_text().contains("No checkpoints found"));
    }

    #[test]
    fn test_list_with_data() {
        let store = create_test_store();
        store.put("exp-1", &sample_checkpoint("Fractions")).unwrap();
        store.put("exp-2", &sample_checkpoint("Ratios")).unwrap();

        let cmd = ListCommand::new(store);
        let output = cmd.run(&options(10));

        assert!(output.success);
        assert_eq!(output.count, 2);
        let text = output.format_text();
        assert!(text.contains("Fractions"));
        assert!(text.contains("Introduction"));
    }

    #[test]
    fn test_list_respects_limit() {
        let store = create_test_store();
        for i in 0..5 {
            store
                .put(&format!("exp-{}", i), &sample_checkpoint("T"))
                .unwrap();
        }

        let cmd = ListCommand::new(store);
        assert_eq!(cmd.run(&options(3)).count, 3);
    }

    #[test]
    fn test_summary_from_stored() {
        let stored = StoredCheckpoint::new("exp-9", sample_checkpoint("Algebra"));
        let summary = CheckpointSummary::from(&stored);

        assert_eq!(summary.exploration_id, "exp-9");
        assert_eq!(summary.title, "Algebra");
        assert_eq!(summary.version, 1);
        assert_eq!(summary.completed_count, 0);
    }

    #[test]
    fn test_format_output_json_and_quiet() {
        let cmd = ListCommand::new(create_test_store());
        let output = ListOutput::success(vec![]);

        let json = cmd.format_output(
            &output,
            &ListOptions {
                json: true,
                ..Default::default()
            },
        );
        assert!(json.contains("\"success\": true"));

        let quiet = cmd.format_output(
            &output,
            &ListOptions {
                quiet: true,
                ..Default::default()
            },
        );
        assert!(quiet.is_empty());
    }

    #[test]
    fn test_list_output_failure() {
        let output = ListOutput::failure("disk on fire");
        assert!(!output.success);
        assert!(output.format_text().contains("disk on fire"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long title", 6), "a ver…");
    }
}
