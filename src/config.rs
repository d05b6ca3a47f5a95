//! Configuration loading for statedeck.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.statedeck/config.toml`)
//! 3. User config (`~/.statedeck/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional. The system runs with sensible defaults
//! when no config exists.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{InteractionIdTerminalChecker, DEFAULT_TERMINAL_INTERACTION_ID};
use crate::error::{DeckError, FailOpen, Result};

/// Default checkpoint database size limit (2 MiB).
pub const DEFAULT_CHECKPOINT_SIZE_LIMIT: u64 = 2 * 1024 * 1024;

/// Default number of checkpoints shown by `list`.
pub const DEFAULT_LIST_LIMIT: usize = 20;

/// Main configuration struct for statedeck.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Deck behavior configuration.
    pub deck: DeckConfig,
    /// Checkpoint storage configuration.
    pub checkpoint: CheckpointConfig,
}

/// Deck behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeckConfig {
    /// Interaction id that marks a terminal card.
    pub terminal_interaction_id: String,
}

impl DeckConfig {
    /// Check if a terminal interaction id is valid (non-empty, no whitespace).
    pub fn is_valid_interaction_id(value: &str) -> bool {
        !value.is_empty() && !value.chars().any(char::is_whitespace)
    }
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            terminal_interaction_id: DEFAULT_TERMINAL_INTERACTION_ID.to_string(),
        }
    }
}

/// Checkpoint storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CheckpointConfig {
    /// Total serialized size above which saves report an exceeded limit.
    pub size_limit_bytes: u64,
    /// Default number of checkpoints listed.
    pub list_limit: usize,
}

impl CheckpointConfig {
    pub fn is_valid_size_limit(value: u64) -> bool {
        value > 0
    }

    pub fn is_valid_list_limit(value: usize) -> bool {
        value > 0
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            size_limit_bytes: DEFAULT_CHECKPOINT_SIZE_LIMIT,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Project config (`.statedeck/config.toml` in cwd)
    /// 3. User config (`~/.statedeck/config.toml`)
    /// 4. Defaults
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Load user config from `~/.statedeck/config.toml`.
    ///
    /// An unreadable or malformed file is skipped with a warning.
    fn load_user_config() -> Option<Config> {
        let home = statedeck_home()?;
        let config_path = home.join("config.toml");
        Self::load_optional(&config_path).fail_open_default("loading user config")
    }

    /// Load project config from `.statedeck/config.toml` in the given directory.
    ///
    /// An unreadable or malformed file is skipped with a warning.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        Self::load_optional(&project_config_path(cwd)).fail_open_default("loading project config")
    }

    /// Load config from a file that may not exist.
    ///
    /// A missing file is `Ok(None)`. Any other read failure and any parse
    /// failure is an error.
    pub fn load_optional(path: &Path) -> Result<Option<Config>> {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(path, &content).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DeckError::storage(path, e)),
        }
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| DeckError::storage(path, e))?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Config> {
        toml::from_str(content).map_err(|e| DeckError::config(format!("{}: {}", path.display(), e)))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // STATEDECK_TERMINAL_INTERACTION_ID
        if let Ok(val) = env::var("STATEDECK_TERMINAL_INTERACTION_ID") {
            if DeckConfig::is_valid_interaction_id(&val) {
                self.deck.terminal_interaction_id = val;
            } else {
                eprintln!(
                    "Warning: Invalid STATEDECK_TERMINAL_INTERACTION_ID value '{}'. \
                    Must be non-empty without whitespace. Using default '{}'.",
                    val, self.deck.terminal_interaction_id
                );
            }
        }

        // STATEDECK_CHECKPOINT_SIZE_LIMIT
        if let Ok(val) = env::var("STATEDECK_CHECKPOINT_SIZE_LIMIT") {
            match val.parse::<u64>() {
                Ok(n) if CheckpointConfig::is_valid_size_limit(n) => {
                    self.checkpoint.size_limit_bytes = n;
                }
                _ => eprintln!(
                    "Warning: Invalid STATEDECK_CHECKPOINT_SIZE_LIMIT value '{}'. \
                    Expected a positive integer. Using default '{}'.",
                    val, self.checkpoint.size_limit_bytes
                ),
            }
        }

        // STATEDECK_LIST_LIMIT
        if let Ok(val) = env::var("STATEDECK_LIST_LIMIT") {
            match val.parse::<usize>() {
                Ok(n) if CheckpointConfig::is_valid_list_limit(n) => {
                    self.checkpoint.list_limit = n;
                }
                _ => eprintln!(
                    "Warning: Invalid STATEDECK_LIST_LIMIT value '{}'. \
                    Expected a positive integer. Using default '{}'.",
                    val, self.checkpoint.list_limit
                ),
            }
        }
    }

    /// Merge another config into this one, field by field.
    ///
    /// A field in `other` wins only when it differs from the default, so a
    /// higher layer cannot reset a lower layer's value back to the default
    /// by restating it. Each layer only needs to list its customizations.
    fn merge(mut self, other: Config) -> Self {
        let default_deck = DeckConfig::default();
        if other.deck.terminal_interaction_id != default_deck.terminal_interaction_id {
            self.deck.terminal_interaction_id = other.deck.terminal_interaction_id;
        }

        let default_checkpoint = CheckpointConfig::default();
        if other.checkpoint.size_limit_bytes != default_checkpoint.size_limit_bytes {
            self.checkpoint.size_limit_bytes = other.checkpoint.size_limit_bytes;
        }
        if other.checkpoint.list_limit != default_checkpoint.list_limit {
            self.checkpoint.list_limit = other.checkpoint.list_limit;
        }

        self
    }

    /// Build the terminal checker this config describes.
    pub fn terminal_checker(&self) -> InteractionIdTerminalChecker {
        InteractionIdTerminalChecker::new(self.deck.terminal_interaction_id.clone())
    }
}

/// Get the statedeck home directory.
///
/// Checks `STATEDECK_HOME` environment variable first, then falls back to
/// `~/.statedeck`.
///
/// An empty `STATEDECK_HOME` is ignored. A relative one is canonicalized
/// when it exists and used as-is otherwise.
pub fn statedeck_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("STATEDECK_HOME") {
        if home.is_empty() {
            tracing::warn!("STATEDECK_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("STATEDECK_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".statedeck"));
    }

    // Containerized or minimal environments without HOME
    let fallback_path = fallback_statedeck_home();
    tracing::warn!(
        "HOME not set, using fallback location: {}",
        fallback_path.display()
    );
    Some(fallback_path)
}

#[cfg(unix)]
fn fallback_statedeck_home() -> PathBuf {
    use std::os::unix::fs::MetadataExt;
    let uid = std::fs::metadata("/").map(|m| m.uid()).unwrap_or(0);
    PathBuf::from(format!("/tmp/statedeck-{}", uid))
}

#[cfg(not(unix))]
fn fallback_statedeck_home() -> PathBuf {
    std::env::temp_dir().join("statedeck")
}

/// Get the checkpoints directory.
///
/// Returns `<statedeck_home>/checkpoints/`.
pub fn checkpoints_dir() -> Option<PathBuf> {
    statedeck_home().map(|h| h.join("checkpoints"))
}

/// Get the project config path.
///
/// Returns `<cwd>/.statedeck/config.toml`.
pub fn project_config_path(cwd: &Path) -> PathBuf {
    cwd.join(".statedeck").join("config.toml")
}
