//! Error types for statedeck.
//!
//! Errors fall into two families. Contract violations (bad navigation,
//! out-of-sequence pushes, unknown states) mean the calling session
//! controller invoked an operation it should not have; they are returned
//! immediately and never retried. Infrastructure errors (storage, config,
//! serialization) come from the checkpoint store and config loading, and
//! the CLI handles those fail-open.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for statedeck operations.
#[derive(Error, Debug)]
pub enum DeckError {
    /// No previous or next card to navigate to.
    #[error("invalid navigation: {message}")]
    Navigation { message: String },

    /// An operation was invoked out of sequence (push, submit, reveal).
    #[error("invalid state: {message}")]
    InvalidState { message: String },

    /// A state name is not present in the graph.
    #[error("state not found: {state_name}")]
    StateNotFound { state_name: String },

    /// An index into questions or hints is past the end.
    #[error("{kind} index {index} out of range (len {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    /// A solution was requested from an interaction that has none.
    #[error("state {state_name} has no solution")]
    MissingSolution { state_name: String },

    /// No checkpoint stored for the exploration.
    #[error("checkpoint not found: {exploration_id}")]
    CheckpointNotFound { exploration_id: String },

    /// I/O errors from checkpoint file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON or TOML serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },
}

/// A specialized Result type for statedeck operations.
pub type Result<T> = std::result::Result<T, DeckError>;

impl DeckError {
    /// Create a navigation error.
    pub fn navigation(message: impl Into<String>) -> Self {
        Self::Navigation {
            message: message.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Create a state not found error.
    pub fn state_not_found(state_name: impl Into<String>) -> Self {
        Self::StateNotFound {
            state_name: state_name.into(),
        }
    }

    /// Create an index out of range error.
    pub fn index_out_of_range(kind: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { kind, index, len }
    }

    /// Create a missing solution error.
    pub fn missing_solution(state_name: impl Into<String>) -> Self {
        Self::MissingSolution {
            state_name: state_name.into(),
        }
    }

    /// Create a checkpoint not found error.
    pub fn checkpoint_not_found(exploration_id: impl Into<String>) -> Self {
        Self::CheckpointNotFound {
            exploration_id: exploration_id.into(),
        }
    }

    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error is a caller bug rather than an infrastructure failure.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::Navigation { .. }
                | Self::InvalidState { .. }
                | Self::StateNotFound { .. }
                | Self::IndexOutOfRange { .. }
                | Self::MissingSolution { .. }
        )
    }
}

impl From<io::Error> for DeckError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for DeckError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Fail-open handling for infrastructure errors.
///
/// Logs the error and substitutes a fallback. Only use this for storage and
/// config paths; contract violations must reach the caller.
pub trait FailOpen<T> {
    /// Handle an error by logging a warning and returning the default value.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;

    /// Handle an error by logging a warning and returning the provided fallback.
    fn fail_open_with(self, context: &str, fallback: T) -> T;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using default)", context, err);
                T::default()
            }
        }
    }

    fn fail_open_with(self, context: &str, fallback: T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("{}: {} (fail-open: using fallback)", context, err);
                fallback
            }
        }
    }
}

/// Exit codes for the statedeck CLI.
pub mod exit_codes {
    /// Command completed.
    pub const SUCCESS: u8 = 0;

    /// Command failed.
    pub const FAILURE: u8 = 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_error_display() {
        let err = DeckError::navigation("at initial state");
        assert_eq!(err.to_string(), "invalid navigation: at initial state");
    }

    #[test]
    fn test_invalid_state_error_display() {
        let err = DeckError::invalid_state("cannot push without an answer");
        assert!(err.to_string().contains("invalid state"));
    }

    #[test]
    fn test_state_not_found_display() {
        let err = DeckError::state_not_found("Fractions 3");
        assert_eq!(err.to_string(), "state not found: Fractions 3");
    }

    #[test]
    fn test_index_out_of_range_display() {
        let err = DeckError::index_out_of_range("hint", 4, 2);
        assert_eq!(err.to_string(), "hint index 4 out of range (len 2)");
    }

    #[test]
    fn test_storage_error_display() {
        let err = DeckError::storage(
            "/tmp/checkpoint.json",
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        );
        assert!(err.to_string().contains("storage error"));
        assert!(err.to_string().contains("/tmp/checkpoint.json"));
    }

    #[test]
    fn test_contract_violation_classification() {
        let contract = vec![
            DeckError::navigation("test"),
            DeckError::invalid_state("test"),
            DeckError::state_not_found("test"),
            DeckError::index_out_of_range("question", 1, 0),
            DeckError::missing_solution("test"),
        ];
        for err in contract {
            assert!(err.is_contract_violation(), "{err} should be a contract violation");
        }

        let infra = vec![
            DeckError::checkpoint_not_found("exp"),
            DeckError::serde("test"),
            DeckError::config("test"),
            DeckError::from(io::Error::new(io::ErrorKind::Other, "disk")),
        ];
        for err in infra {
            assert!(!err.is_contract_violation(), "{err} should be infrastructure");
        }
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: DeckError = json_err.into();
        assert!(matches!(err, DeckError::Serde { .. }));
    }

    #[test]
    fn test_fail_open_default() {
        let result: Result<Vec<String>> = Err(DeckError::config("test"));
        let value = result.fail_open_default("test context");
        assert!(value.is_empty());
    }

    #[test]
    fn test_fail_open_with() {
        let result: Result<u64> = Err(DeckError::serde("test"));
        assert_eq!(result.fail_open_with("test context", 42), 42);
    }

    #[test]
    fn test_fail_open_success() {
        let result: Result<u64> = Ok(100);
        assert_eq!(result.fail_open_default("test context"), 100);
    }
}
