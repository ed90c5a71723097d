//! # Persistent State
//!
//! [`PersistentState`] binds one activation to its document in a
//! [`StateStore`]. It remembers the etag of the last successful read or write,
//! so every save is conditional on nobody else having written in between.

use crate::error::{FrameworkError, StoreError};
use crate::store::StateStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

pub struct PersistentState<S> {
    storage_key: String,
    etag: Option<u64>,
    store: Arc<dyn StateStore>,
    _state: PhantomData<fn() -> S>,
}

impl<S> PersistentState<S>
where
    S: Serialize + DeserializeOwned + Default,
{
    pub fn new(storage_key: String, store: Arc<dyn StateStore>) -> Self {
        Self {
            storage_key,
            etag: None,
            store,
            _state: PhantomData,
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// The etag of the last document observed, `None` if never persisted.
    pub fn etag(&self) -> Option<u64> {
        self.etag
    }

    /// Loads the document, yielding `S::default()` when nothing was stored yet.
    pub async fn read(&mut self) -> Result<S, FrameworkError> {
        match self.store.load(&self.storage_key).await? {
            Some(stored) => {
                let state = serde_json::from_value(stored.state).map_err(|e| {
                    FrameworkError::Persistence(StoreError::Corrupt {
                        key: self.storage_key.clone(),
                        reason: e.to_string(),
                    })
                })?;
                self.etag = Some(stored.etag);
                debug!(key = %self.storage_key, etag = stored.etag, "State loaded");
                Ok(state)
            }
            None => {
                self.etag = None;
                debug!(key = %self.storage_key, "No stored state");
                Ok(S::default())
            }
        }
    }

    /// Persists `state`. The etag only advances once the store confirms.
    pub async fn write(&mut self, state: &S) -> Result<(), FrameworkError> {
        let value = serde_json::to_value(state)
            .map_err(|e| FrameworkError::Serialization(e.to_string()))?;
        let etag = self.store.save(&self.storage_key, value, self.etag).await?;
        self.etag = Some(etag);
        Ok(())
    }
}
