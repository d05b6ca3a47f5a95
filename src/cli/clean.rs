//! Clean command for statedeck.
//!
//! Removes old checkpoints and temp files left by interrupted writes.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::warn;

use crate::error::Result;
use crate::storage::{CheckpointStore, FileCheckpointStore};

/// Options for the clean command.
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Remove checkpoints saved longer ago than this (e.g., "7d", "24h").
    pub before: Option<String>,
    /// Also remove orphaned temp files.
    pub orphans: bool,
    /// Dry run - show what would be deleted without deleting.
    pub dry_run: bool,
}

/// Output format for the clean command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanOutput {
    /// Whether the command was successful.
    pub success: bool,
    pub checkpoints_deleted: usize,
    pub orphans_deleted: usize,
    /// Total bytes freed.
    pub bytes_freed: u64,
    /// Exploration ids whose checkpoints were deleted.
    pub deleted_ids: Vec<String>,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CleanOutput {
    /// Create a successful output.
    pub fn success(
        checkpoints_deleted: usize,
        orphans_deleted: usize,
        bytes_freed: u64,
        deleted_ids: Vec<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            success: true,
            checkpoints_deleted,
            orphans_deleted,
            bytes_freed,
            deleted_ids,
            dry_run,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            checkpoints_deleted: 0,
            orphans_deleted: 0,
            bytes_freed: 0,
            deleted_ids: Vec::new(),
            dry_run: false,
            error: Some(error.into()),
        }
    }
}

/// The clean command implementation.
pub struct CleanCommand {
    store: FileCheckpointStore,
}

impl CleanCommand {
    /// Create a new clean command over a file store.
    pub fn new(store: FileCheckpointStore) -> Self {
        Self { store }
    }

    /// Run the clean command.
    pub fn run(&self, options: &CleanOptions) -> CleanOutput {
        let cutoff = match &options.before {
            Some(duration_str) => match parse_duration(duration_str) {
                Ok(duration) => match Utc::now().checked_sub_signed(duration) {
                    Some(cutoff) => cutoff,
                    None => return CleanOutput::failure("Duration out of range"),
                },
                Err(e) => return CleanOutput::failure(e),
            },
            None => return CleanOutput::failure("--before is required"),
        };

        match self.clean(cutoff, options) {
            Ok(output) => output,
            Err(e) => CleanOutput::failure(format!("Failed to clean checkpoints: {}", e)),
        }
    }

    fn clean(&self, cutoff: chrono::DateTime<Utc>, options: &CleanOptions) -> Result<CleanOutput> {
        let mut bytes_freed = 0u64;
        let mut deleted_ids = Vec::new();

        for stored in self.store.list(usize::MAX)? {
            if stored.saved_at >= cutoff {
                continue;
            }

            let path = self.store.checkpoint_path(&stored.exploration_id);
            let file_size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

            if !options.dry_run {
                if let Err(e) = self.store.delete(&stored.exploration_id) {
                    warn!(
                        exploration_id = %stored.exploration_id,
                        error = %e,
                        "Failed to delete checkpoint (fail-open: continuing)"
                    );
                    continue;
                }
            }

            deleted_ids.push(stored.exploration_id);
            bytes_freed += file_size;
        }

        let mut orphans_deleted = 0;
        if options.orphans {
            for path in self.store.orphan_temp_files()? {
                let file_size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                if !options.dry_run {
                    if let Err(e) = fs::remove_file(&path) {
                        warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to delete orphan file (fail-open: continuing)"
                        );
                        continue;
                    }
                }
                orphans_deleted += 1;
                bytes_freed += file_size;
            }
        }

        Ok(CleanOutput::success(
            deleted_ids.len(),
            orphans_deleted,
            bytes_freed,
            deleted_ids,
            options.dry_run,
        ))
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &CleanOutput, options: &CleanOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            Self::format_human_readable(output)
        }
    }

    /// Format output as human-readable text.
    fn format_human_readable(output: &CleanOutput) -> String {
        if !output.success {
            return format!(
                "Clean failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        let prefix = if output.dry_run { "[dry-run] " } else { "" };

        if output.checkpoints_deleted == 0 && output.orphans_deleted == 0 {
            return format!("{}No checkpoints to clean.\n", prefix);
        }

        let mut lines = Vec::new();

        if output.checkpoints_deleted > 0 {
            lines.push(format!(
                "{}Deleted {} checkpoint(s)",
                prefix, output.checkpoints_deleted
            ));
        }

        if output.orphans_deleted > 0 {
            lines.push(format!(
                "{}Deleted {} orphan(s)",
                prefix, output.orphans_deleted
            ));
        }

        lines.push(format!("{}Freed {}", prefix, format_bytes(output.bytes_freed)));

        if !output.deleted_ids.is_empty() && output.deleted_ids.len() <= 10 {
            lines.push(String::new());
            lines.push("Deleted checkpoints:".to_string());
            for id in &output.deleted_ids {
                lines.push(format!("  {}", id));
            }
        } else if output.deleted_ids.len() > 10 {
            lines.push(format!(
                "\n({} checkpoints deleted)",
                output.deleted_ids.len()
            ));
        }

        lines.join("\n") + "\n"
    }
}

/// Parse a duration string like "7d", "24h", "30m", "10s".
///
/// A bare number is read as days.
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Duration cannot be empty".to_string());
    }

    let (num_str, unit) = if let Some(stripped) = s.strip_suffix('d') {
        (stripped, 'd')
    } else if let Some(stripped) = s.strip_suffix('h') {
        (stripped, 'h')
    } else if let Some(stripped) = s.strip_suffix('m') {
        (stripped, 'm')
    } else if let Some(stripped) = s.strip_suffix('s') {
        (stripped, 's')
    } else {
        (s, 'd')
    };

    let num: i64 = num_str
        .parse()
        .map_err(|_| format!("Invalid duration number: {}", num_str))?;

    if num <= 0 {
        return Err("Duration must be positive".to_string());
    }

    let duration = match unit {
        'd' => Duration::try_days(num),
        'h' => Duration::try_hours(num),
        'm' => Duration::try_minutes(num),
        's' => Duration::try_seconds(num),
        _ => return Err(format!("Invalid duration unit: {}", unit)),
    };

    duration.ok_or_else(|| "Duration out of range".to_string())
}

/// Format bytes as human-readable string.
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
