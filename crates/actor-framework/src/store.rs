//! # Durable State Stores
//!
//! The [`StateStore`] trait is the boundary between an activation and whatever
//! keeps its state durable. Stores are byte-agnostic key/value maps of JSON
//! documents with **save-if-unchanged** semantics: every document carries an
//! etag, and a save must present the etag it last observed.
//!
//! Two implementations ship with the framework:
//!
//! - [`InMemoryStateStore`] - process-local, used by tests and the demo.
//! - [`FileStateStore`] - one JSON file per key, survives process restarts.

use crate::error::StoreError;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// A persisted document together with its version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredState {
    pub etag: u64,
    pub state: serde_json::Value,
}

/// Key/value persistence consumed by the actor runtime.
///
/// Keys are opaque strings of the form `"{state_name}/{actor_key}"`.
#[async_trait]
pub trait StateStore: Send + Sync + 'static {
    /// Returns the stored document, or `None` if the key was never written.
    async fn load(&self, key: &str) -> Result<Option<StoredState>, StoreError>;

    /// Overwrites the document if its current etag equals `expected`
    /// (`None` meaning "must not exist yet"). Returns the new etag.
    async fn save(
        &self,
        key: &str,
        state: serde_json::Value,
        expected: Option<u64>,
    ) -> Result<u64, StoreError>;

    /// Lists every stored key starting with `prefix`.
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

// =============================================================================
// IN-MEMORY
// =============================================================================

/// Process-local store. Each key lives in its own map entry, so saves for
/// different keys never contend on a shared lock.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    entries: DashMap<String, StoredState>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, key: &str) -> Result<Option<StoredState>, StoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn save(
        &self,
        key: &str,
        state: serde_json::Value,
        expected: Option<u64>,
    ) -> Result<u64, StoreError> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let actual = occupied.get().etag;
                if expected != Some(actual) {
                    return Err(StoreError::Conflict {
                        key: key.to_string(),
                        expected,
                        actual: Some(actual),
                    });
                }
                let etag = actual + 1;
                occupied.insert(StoredState { etag, state });
                trace!(key, etag, "Saved");
                Ok(etag)
            }
            Entry::Vacant(vacant) => {
                if expected.is_some() {
                    return Err(StoreError::Conflict {
                        key: key.to_string(),
                        expected,
                        actual: None,
                    });
                }
                vacant.insert(StoredState { etag: 1, state });
                trace!(key, etag = 1, "Saved");
                Ok(1)
            }
        }
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect())
    }
}

// =============================================================================
// FILE
// =============================================================================

const FILE_EXTENSION: &str = "json";
const KEY_SEPARATOR: char = '/';
const FILE_SEPARATOR: char = '~';

/// Stores each key as `<root>/<key with '/' replaced by '~'>.json`.
///
/// Writes go to a sibling `.tmp` file which is then renamed over the target,
/// so a crash mid-write leaves the previous document intact.
#[derive(Debug, Clone)]
pub struct FileStateStore {
    root: PathBuf,
}

impl FileStateStore {
    /// Opens (and creates if needed) the store directory.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", root.display())))?;
        debug!(root = %root.display(), "File state store opened");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let file = key.replace(KEY_SEPARATOR, &FILE_SEPARATOR.to_string());
        self.root.join(format!("{file}.{FILE_EXTENSION}"))
    }

    fn key_for(file_name: &str) -> Option<String> {
        file_name
            .strip_suffix(&format!(".{FILE_EXTENSION}"))
            .map(|stem| stem.replace(FILE_SEPARATOR, &KEY_SEPARATOR.to_string()))
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self, key: &str) -> Result<Option<StoredState>, StoreError> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(format!("{}: {e}", path.display()))),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    async fn save(
        &self,
        key: &str,
        state: serde_json::Value,
        expected: Option<u64>,
    ) -> Result<u64, StoreError> {
        let actual = self.load(key).await?.map(|stored| stored.etag);
        if actual != expected {
            return Err(StoreError::Conflict {
                key: key.to_string(),
                expected,
                actual,
            });
        }
        let etag = actual.map_or(1, |etag| etag + 1);
        let bytes = serde_json::to_vec_pretty(&StoredState { etag, state }).map_err(|e| {
            StoreError::Corrupt {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })?;

        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", path.display())))?;
        trace!(key, etag, "Saved");
        Ok(etag)
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let mut dir = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| StoreError::Io(format!("{}: {e}", self.root.display())))?;
        let mut keys = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?
        {
            let name = entry.file_name();
            if let Some(key) = name.to_str().and_then(Self::key_for) {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
