//! Storage backends for the persisted document.
//!
//! [`SnapshotStore`] is the seam between the service and the disk. The
//! file backend rewrites the whole document on every save; the memory
//! backend backs tests and ephemeral deployments.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::document::PersistedState;
use crate::error::DbError;

/// A place the service snapshot can be loaded from and saved to.
///
/// Implementations are called from the blocking thread pool, so they may
/// perform synchronous I/O.
pub trait SnapshotStore: Send + Sync + 'static {
    /// Load the last saved document, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<PersistedState>, DbError>;

    /// Replace the saved document.
    fn save(&self, state: &PersistedState) -> Result<(), DbError>;
}

// =========================================================================
// JSON file
// =========================================================================

/// Stores the document as pretty-printed JSON in a single file.
///
/// Saves go to a sibling `.tmp` file which is then renamed over the
/// target, so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store bound to `path`. The file need not exist yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> Result<Option<PersistedState>, DbError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        PersistedState::from_json(&raw).map(Some)
    }

    fn save(&self, state: &PersistedState) -> Result<(), DbError> {
        let json = state.to_json()?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.tmp_path();
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "Saved snapshot");
        Ok(())
    }
}

// =========================================================================
// Memory
// =========================================================================

/// Keeps the last saved document in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<PersistedState>>,
    saves: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `state`.
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            saves: AtomicU64::new(0),
        }
    }

    /// The most recently saved document.
    pub fn latest(&self) -> Option<PersistedState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Number of completed saves.
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::Acquire)
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Option<PersistedState>, DbError> {
        Ok(self.latest())
    }

    fn save(&self, state: &PersistedState) -> Result<(), DbError> {
        *self
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(state.clone());
        self.saves.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn file_store_missing_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_saves_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("data.json"));
        let state = PersistedState {
            emotes_rev: 9,
            ..PersistedState::default()
        };
        store.save(&state).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.emotes_rev, 9);
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn file_store_empty_file_loads_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "  \n").unwrap();
        assert!(JsonFileStore::new(path).load().unwrap().is_none());
    }

    #[test]
    fn file_store_reports_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(JsonFileStore::new(path).load().is_err());
    }

    #[test]
    fn memory_store_counts_saves() {
        let store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&PersistedState::default()).unwrap();
        store.save(&PersistedState::default()).unwrap();
        assert_eq!(store.save_count(), 2);
        assert!(store.latest().is_some());
    }
}
