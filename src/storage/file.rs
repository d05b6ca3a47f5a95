//! File-based checkpoint storage for statedeck.
//!
//! Checkpoints are stored as one JSON file per exploration in
//! `~/.statedeck/checkpoints/`. Atomic writes are achieved via temp file +
//! rename pattern.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::config::{checkpoints_dir, DEFAULT_CHECKPOINT_SIZE_LIMIT};
use crate::core::ExplorationCheckpoint;
use crate::error::{DeckError, FailOpen, Result};
use crate::storage::{CheckpointState, CheckpointStore, StoredCheckpoint};
use crate::util::read_to_string_limited;

/// File-based checkpoint storage.
///
/// Stores checkpoints as JSON files in a configurable directory.
/// Uses atomic writes via temp file + rename pattern.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    /// Directory where checkpoint files are stored.
    checkpoints_dir: PathBuf,
    /// Total size on disk above which saves report an exceeded limit.
    size_limit: u64,
}

impl FileCheckpointStore {
    /// Create a new file checkpoint store with the default directory.
    ///
    /// Uses `~/.statedeck/checkpoints/` or `$STATEDECK_HOME/checkpoints/`.
    pub fn new() -> Result<Self> {
        let dir = checkpoints_dir().ok_or_else(|| {
            DeckError::config("Could not determine checkpoints directory (no home directory)")
        })?;
        Self::with_dir(dir)
    }

    /// Create a new file checkpoint store with a custom directory.
    pub fn with_dir(checkpoints_dir: impl Into<PathBuf>) -> Result<Self> {
        let checkpoints_dir = checkpoints_dir.into();

        if !checkpoints_dir.exists() {
            fs::create_dir_all(&checkpoints_dir)
                .map_err(|e| DeckError::storage(&checkpoints_dir, e))?;
        }

        Ok(Self {
            checkpoints_dir,
            size_limit: DEFAULT_CHECKPOINT_SIZE_LIMIT,
        })
    }

    /// Set the size limit in bytes.
    pub fn with_size_limit(mut self, size_limit: u64) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Directory holding the checkpoint files.
    pub fn dir(&self) -> &Path {
        &self.checkpoints_dir
    }

    /// Get the path for a checkpoint file.
    pub fn checkpoint_path(&self, exploration_id: &str) -> PathBuf {
        self.checkpoints_dir.join(format!("{}.json", exploration_id))
    }

    /// Get the path for a temp file used during atomic writes.
    fn temp_path(&self, exploration_id: &str) -> PathBuf {
        self.checkpoints_dir
            .join(format!(".{}.json.tmp", exploration_id))
    }

    /// Reject ids that cannot be used as a plain file name.
    fn validate_id(&self, exploration_id: &str) -> Result<()> {
        let valid = !exploration_id.is_empty()
            && !exploration_id.starts_with('.')
            && !exploration_id.contains(['/', '\\']);
        if valid {
            Ok(())
        } else {
            Err(DeckError::storage(
                self.checkpoint_path(exploration_id),
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("invalid exploration id '{}'", exploration_id),
                ),
            ))
        }
    }

    /// Write a checkpoint atomically using temp file + rename.
    fn atomic_write(&self, stored: &StoredCheckpoint) -> Result<()> {
        let final_path = self.checkpoint_path(&stored.exploration_id);
        let temp_path = self.temp_path(&stored.exploration_id);

        let json = serde_json::to_string_pretty(stored)?;

        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| DeckError::storage(&temp_path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| DeckError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| DeckError::storage(&temp_path, e))?;
        }

        // Atomic on POSIX
        fs::rename(&temp_path, &final_path).map_err(|e| DeckError::storage(&final_path, e))?;

        Ok(())
    }

    /// Checkpoint files in the directory, with their modification times.
    fn checkpoint_files(&self) -> Result<Vec<(PathBuf, u64, SystemTime)>> {
        if !self.checkpoints_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.checkpoints_dir)
            .map_err(|e| DeckError::storage(&self.checkpoints_dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DeckError::storage(&self.checkpoints_dir, e))?;
            let path = entry.path();

            // Skip non-JSON files and temp files
            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            if is_hidden(&path) {
                continue;
            }

            if let Ok(metadata) = entry.metadata() {
                let mtime = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                files.push((path, metadata.len(), mtime));
            }
        }

        Ok(files)
    }

    /// Leftover temp files from interrupted writes.
    pub fn orphan_temp_files(&self) -> Result<Vec<PathBuf>> {
        if !self.checkpoints_dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.checkpoints_dir)
            .map_err(|e| DeckError::storage(&self.checkpoints_dir, e))?;

        let mut orphans = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DeckError::storage(&self.checkpoints_dir, e))?;
            let path = entry.path();
            if is_hidden(&path) && path.extension().map(|e| e == "tmp").unwrap_or(false) {
                orphans.push(path);
            }
        }
        orphans.sort();

        Ok(orphans)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(true)
}

impl CheckpointStore for FileCheckpointStore {
    fn get(&self, exploration_id: &str) -> Result<Option<StoredCheckpoint>> {
        self.validate_id(exploration_id)?;
        let path = self.checkpoint_path(exploration_id);

        if !path.exists() {
            return Ok(None);
        }

        read_stored(&path).map(Some)
    }

    fn put(
        &self,
        exploration_id: &str,
        checkpoint: &ExplorationCheckpoint,
    ) -> Result<CheckpointState> {
        self.validate_id(exploration_id)?;
        let stored = StoredCheckpoint::new(exploration_id, checkpoint.clone());
        self.atomic_write(&stored)?;

        let total = self.total_size()?;
        tracing::debug!(exploration_id, total_size = total, "saved checkpoint");
        Ok(CheckpointState::after_save(total, self.size_limit))
    }

    fn list(&self, limit: usize) -> Result<Vec<StoredCheckpoint>> {
        let mut checkpoints: Vec<(StoredCheckpoint, SystemTime)> = Vec::new();

        for (path, _, mtime) in self.checkpoint_files()? {
            let context = format!("skipping checkpoint file {}", path.display());
            if let Some(stored) = read_stored(&path).map(Some).fail_open_with(&context, None) {
                checkpoints.push((stored, mtime));
            }
        }

        // Most recent first
        checkpoints.sort_by(|a, b| b.1.cmp(&a.1));

        Ok(checkpoints
            .into_iter()
            .take(limit)
            .map(|(c, _)| c)
            .collect())
    }

    fn delete(&self, exploration_id: &str) -> Result<()> {
        self.validate_id(exploration_id)?;
        let path = self.checkpoint_path(exploration_id);

        if path.exists() {
            fs::remove_file(&path).map_err(|e| DeckError::storage(&path, e))?;
            tracing::debug!(exploration_id, "deleted checkpoint");
        }

        let temp_path = self.temp_path(exploration_id);
        if temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }

        Ok(())
    }

    fn total_size(&self) -> Result<u64> {
        Ok(self
            .checkpoint_files()?
            .iter()
            .map(|(_, size, _)| size)
            .sum())
    }
}

fn read_stored(path: &Path) -> Result<StoredCheckpoint> {
    let content = read_to_string_limited(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::traits::tests::{sample_checkpoint, test_checkpoint_store_crud};
    use crate::storage::retrieve_checkpoint;
    use tempfile::TempDir;

    fn create_test_store() -> (FileCheckpointStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::with_dir(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn test_file_checkpoint_store_crud() {
        let (store, _dir) = create_test_store();
        test_checkpoint_store_crud(&store);
    }

    #[test]
    fn test_with_dir_creates_directory() {
        let dir = TempDir::new().unwrap();
        let checkpoints_path = dir.path().join("checkpoints");

        assert!(!checkpoints_path.exists());

        let store = FileCheckpointStore::with_dir(&checkpoints_path).unwrap();

        assert!(checkpoints_path.is_dir());
        assert_eq!(store.dir(), checkpoints_path);
    }

    #[test]
    fn test_put_writes_valid_json() {
        let (store, _dir) = create_test_store();
        store.put("exp-1", &sample_checkpoint("Fractions")).unwrap();

        let content = fs::read_to_string(store.checkpoint_path("exp-1")).unwrap();
        let parsed: StoredCheckpoint = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.checkpoint.exploration_title, "Fractions");
        assert!(!store.temp_path("exp-1").exists());
    }

    #[test]
    fn test_put_replaces_existing() {
        let (store, _dir) = create_test_store();
        store.put("exp-1", &sample_checkpoint("Old")).unwrap();
        store.put("exp-1", &sample_checkpoint("New")).unwrap();

        let stored = retrieve_checkpoint(&store, "exp-1").unwrap();
        assert_eq!(stored.checkpoint.exploration_title, "New");
        assert_eq!(store.list(10).unwrap().len(), 1);
    }

    #[test]
    fn test_put_reports_exceeded_limit() {
        let dir = TempDir::new().unwrap();
        let store = FileCheckpointStore::with_dir(dir.path())
            .unwrap()
            .with_size_limit(10);

        let state = store.put("exp-1", &sample_checkpoint("T")).unwrap();

        assert_eq!(state, CheckpointState::SavedDatabaseExceededLimit);
        assert!(store.exists("exp-1").unwrap());
    }

    #[test]
    fn test_list_most_recent_first() {
        let (store, _dir) = create_test_store();

        for id in ["exp-1", "exp-2", "exp-3"] {
            store.put(id, &sample_checkpoint(id)).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(10));
        }

        let listed = store.list(10).unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].exploration_id, "exp-3");
        assert_eq!(store.list(2).unwrap().len(), 2);
    }

    #[test]
    fn test_list_ignores_temp_and_invalid_files() {
        let (store, dir) = create_test_store();
        store.put("valid", &sample_checkpoint("T")).unwrap();

        fs::write(dir.path().join(".stale.json.tmp"), "{}").unwrap();
        fs::write(dir.path().join("invalid.json"), "not valid json").unwrap();
        fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        let listed = store.list(10).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].exploration_id, "valid");
    }

    #[test]
    fn test_list_warns_on_corrupt_file() {
        let (store, dir) = create_test_store();
        store.put("valid", &sample_checkpoint("T")).unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();

        let (listed, logs) = crate::util::capture_logs(|| store.list(10).unwrap());

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].exploration_id, "valid");
        assert!(logs.contains("skipping checkpoint file"));
        assert!(logs.contains("broken.json"));
    }

    #[test]
    fn test_get_corrupt_file_errors() {
        let (store, dir) = create_test_store();
        fs::write(dir.path().join("broken.json"), "{").unwrap();

        assert!(matches!(store.get("broken"), Err(DeckError::Serde { .. })));
    }

    #[test]
    fn test_invalid_ids_rejected() {
        let (store, _dir) = create_test_store();

        for id in ["", ".hidden", "../escape", "a\\b"] {
            assert!(store.put(id, &sample_checkpoint("T")).is_err(), "{id}");
            assert!(store.get(id).is_err(), "{id}");
        }
    }

    #[test]
    fn test_orphan_temp_files() {
        let (store, dir) = create_test_store();
        store.put("exp-1", &sample_checkpoint("T")).unwrap();
        fs::write(dir.path().join(".exp-2.json.tmp"), "{").unwrap();

        let orphans = store.orphan_temp_files().unwrap();
        assert_eq!(orphans, vec![dir.path().join(".exp-2.json.tmp")]);
    }

    #[test]
    fn test_delete_removes_temp_file() {
        let (store, dir) = create_test_store();
        store.put("exp-1", &sample_checkpoint("T")).unwrap();
        fs::write(dir.path().join(".exp-1.json.tmp"), "{").unwrap();

        store.delete("exp-1").unwrap();

        assert!(!store.exists("exp-1").unwrap());
        assert!(store.orphan_temp_files().unwrap().is_empty());
    }

    #[test]
    fn test_total_size_counts_files() {
        let (store, _dir) = create_test_store();
        assert_eq!(store.total_size().unwrap(), 0);

        store.put("exp-1", &sample_checkpoint("T")).unwrap();
        let on_disk = fs::metadata(store.checkpoint_path("exp-1")).unwrap().len();
        assert_eq!(store.total_size().unwrap(), on_disk);
    }
}
