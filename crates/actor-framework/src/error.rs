//! # Framework Errors
//!
//! This module defines the common error types used throughout the actor framework.
//! Entity error types convert from [`FrameworkError`] so that callers see one
//! error type per actor, whether the failure came from the domain logic or from
//! the plumbing underneath it.

/// Errors raised by a [`StateStore`](crate::store::StateStore) implementation.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backing medium failed (disk, network, ...).
    #[error("Storage I/O error: {0}")]
    Io(String),
    /// The stored etag no longer matches the one the writer last observed.
    #[error("Etag conflict on {key}: expected {expected:?}, found {actual:?}")]
    Conflict {
        key: String,
        expected: Option<u64>,
        actual: Option<u64>,
    },
    /// A stored document could not be decoded.
    #[error("Corrupt state for {key}: {reason}")]
    Corrupt { key: String, reason: String },
}

/// Errors that can occur within the actor framework itself.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Persistence failed: {0}")]
    Persistence(#[from] StoreError),
    #[error("State serialization failed: {0}")]
    Serialization(String),
    #[error("Timer service unavailable")]
    TimerUnavailable,
    /// The entity's `on_activate` hook rejected the activation.
    #[error("Activation failed: {0}")]
    ActivationFailed(String),
}
