//! Error types for the Table Order actor.

use crate::model::OrderItemId;
use actor_framework::FrameworkError;
use thiserror::Error;

/// Errors that can occur during table order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TableOrderError {
    /// The table's open/closed state forbids the operation.
    #[error("Invalid table state: {0}")]
    InvalidState(String),

    /// No item with this id is on the table's current order.
    #[error("Order item not found: {0}")]
    NotFound(OrderItemId),

    /// The item payload was rejected (blank name, negative cost, zero quantity).
    #[error("Invalid order item: {0}")]
    InvalidItem(String),

    /// Loading or saving the table's state did not complete. Nothing was
    /// committed, so the same call can be retried.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    /// Arming or disarming the expiry reminder failed.
    #[error("Timer service failure: {0}")]
    TimerServiceFailure(String),

    /// The actor could not be reached (shut down or repeatedly deactivating).
    #[error("Actor unavailable: {0}")]
    ActorUnavailable(String),
}

impl TableOrderError {
    /// Whether the same call may succeed if simply retried. Domain rule
    /// violations never do.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TableOrderError::PersistenceFailure(_)
                | TableOrderError::TimerServiceFailure(_)
                | TableOrderError::ActorUnavailable(_)
        )
    }
}

impl From<FrameworkError> for TableOrderError {
    fn from(e: FrameworkError) -> Self {
        match e {
            FrameworkError::Persistence(_) | FrameworkError::Serialization(_) => {
                TableOrderError::PersistenceFailure(e.to_string())
            }
            FrameworkError::TimerUnavailable => TableOrderError::TimerServiceFailure(e.to_string()),
            FrameworkError::ActorClosed
            | FrameworkError::ActorDropped
            | FrameworkError::ActivationFailed(_) => {
                TableOrderError::ActorUnavailable(e.to_string())
            }
        }
    }
}
