//! # ActorEntity Trait
//!
//! The `ActorEntity` trait defines the contract that every keyed actor must
//! implement to be hosted by an [`ActorRegistry`](crate::ActorRegistry). It
//! names the key that addresses an instance, the durable state the instance
//! owns, the actions it accepts and the error type callers see.
//!
//! # Architecture Note
//! There is exactly one live activation per key. The framework hydrates it
//! from the [`StateStore`](crate::store::StateStore), feeds it one envelope at
//! a time and evicts it when idle. The entity only writes business logic; it
//! never sees channels, tasks or locks.
//!
//! # Provided Methods (Hooks)
//! - [`ActorEntity::on_activate`]
//! - [`ActorEntity::receive_reminder`]
//! - [`ActorEntity::on_deactivate`]
//!
//! You do **not** need to implement these unless you want to customize
//! behavior. The defaults do nothing.

use crate::context::Activation;
use crate::error::FrameworkError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::{Debug, Display};
use std::hash::Hash;

#[async_trait]
pub trait ActorEntity: Sized + Send + 'static {
    /// Identifies one instance. Also forms the storage key via `Display`.
    type Key: Eq + Hash + Clone + Send + Sync + Display + Debug + 'static;

    /// The durable payload. `Default` is the state of a never-persisted key.
    type State: Default + Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Enum of the operations the actor accepts.
    type Action: Send + Debug + 'static;

    /// The result type returned by actions.
    type ActionResult: Send + Debug + 'static;

    /// Dependencies shared by every activation, injected when the registry
    /// is built. Use `()` if none are needed.
    type Context: Send + Sync + 'static;

    /// The single error type for this actor.
    ///
    /// # Design Note
    /// Framework failures (closed mailbox, persistence, timers) convert into
    /// it, so a caller matches on one enum whatever went wrong.
    type Error: std::error::Error + From<FrameworkError> + Send + Sync + 'static;

    /// Storage namespace. Documents live under `"{STATE_NAME}/{key}"`.
    const STATE_NAME: &'static str;

    /// Rebuild the in-memory instance from hydrated state.
    fn from_state(key: &Self::Key, state: Self::State) -> Self;

    // --- Lifecycle Hooks (Async) ---

    /// Called once after hydration, before the first envelope is served.
    /// An error here fails every queued request and ends the activation.
    async fn on_activate(&mut self, _activation: &mut Activation<Self>) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Handle one action. Calls for the same key never overlap.
    async fn handle_action(
        &mut self,
        action: Self::Action,
        activation: &mut Activation<Self>,
    ) -> Result<Self::ActionResult, Self::Error>;

    /// Called when a reminder registered through the activation fires.
    /// Delivery is at-least-once, so implementations must tolerate repeats.
    async fn receive_reminder(
        &mut self,
        _name: &str,
        _activation: &mut Activation<Self>,
    ) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called after the mailbox has been drained, before the instance drops.
    async fn on_deactivate(&mut self, _activation: &mut Activation<Self>) {}
}
