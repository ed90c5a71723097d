//! # Test Doubles & Testing Guide
//!
//! Actors are easy to test against an [`InMemoryStateStore`]. What is hard to
//! reproduce with a real store are the failure paths: a disk that rejects a
//! write, a slow database, a load that times out. [`FlakyStore`] wraps any
//! [`StateStore`] and lets a test script those conditions.
//!
//! ## Testing Strategies
//!
//! | Pattern | Store | Use Case |
//! |---------|-------|----------|
//! | **Single actor** | `InMemoryStateStore` | State machine rules |
//! | **Failure injection** | `FlakyStore` | Persistence errors and retry |
//! | **Timing** | `FlakyStore::set_save_delay` + paused clock | Serialization vs parallelism |
//! | **Restart** | `FileStateStore` in a temp dir | Durability across registries |
//!
//! ## Example
//!
//! ```rust
//! use actor_framework::mock::FlakyStore;
//! use actor_framework::store::{InMemoryStateStore, StateStore};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = FlakyStore::new(Arc::new(InMemoryStateStore::new()));
//!     store.fail_next_saves(1);
//!
//!     assert!(store.save("k/1", serde_json::json!(1), None).await.is_err());
//!     assert!(store.save("k/1", serde_json::json!(1), None).await.is_ok());
//!     assert_eq!(store.save_count(), 1);
//! }
//! ```
//!
//! ## Timing Tests
//!
//! Under `#[tokio::test(start_paused = true)]` a save delay is deterministic:
//! two saves that run in parallel finish after one delay, two serialized
//! saves after two.

use crate::error::StoreError;
use crate::store::{StateStore, StoredState};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A [`StateStore`] wrapper with scriptable failures and latency.
pub struct FlakyStore {
    inner: Arc<dyn StateStore>,
    failing_saves: AtomicUsize,
    failing_loads: AtomicUsize,
    saves: AtomicUsize,
    save_delay: Mutex<Duration>,
}

impl FlakyStore {
    pub fn new(inner: Arc<dyn StateStore>) -> Self {
        Self {
            inner,
            failing_saves: AtomicUsize::new(0),
            failing_loads: AtomicUsize::new(0),
            saves: AtomicUsize::new(0),
            save_delay: Mutex::new(Duration::ZERO),
        }
    }

    /// The next `n` saves fail with [`StoreError::Io`] without touching the
    /// wrapped store.
    pub fn fail_next_saves(&self, n: usize) {
        self.failing_saves.store(n, Ordering::SeqCst);
    }

    /// The next `n` loads fail with [`StoreError::Io`].
    pub fn fail_next_loads(&self, n: usize) {
        self.failing_loads.store(n, Ordering::SeqCst);
    }

    /// Every save sleeps this long before reaching the wrapped store.
    pub fn set_save_delay(&self, delay: Duration) {
        if let Ok(mut current) = self.save_delay.lock() {
            *current = delay;
        }
    }

    /// Number of saves that reached the wrapped store successfully.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn take_failure(counter: &AtomicUsize) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl StateStore for FlakyStore {
    async fn load(&self, key: &str) -> Result<Option<StoredState>, StoreError> {
        if Self::take_failure(&self.failing_loads) {
            return Err(StoreError::Io(format!("injected load failure for {key}")));
        }
        self.inner.load(key).await
    }

    async fn save(
        &self,
        key: &str,
        state: serde_json::Value,
        expected: Option<u64>,
    ) -> Result<u64, StoreError> {
        let delay = self
            .save_delay
            .lock()
            .map(|delay| *delay)
            .unwrap_or(Duration::ZERO);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if Self::take_failure(&self.failing_saves) {
            return Err(StoreError::Io(format!("injected save failure for {key}")));
        }
        let etag = self.inner.save(key, state, expected).await?;
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(etag)
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        self.inner.keys(prefix).await
    }
}
