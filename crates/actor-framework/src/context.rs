//! # Activation Context
//!
//! An [`Activation`] is handed to every entity hook. It is the entity's only
//! window onto the runtime: its key, the shared context, its durable state and
//! its reminders.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::state::PersistentState;
use crate::store::StateStore;
use crate::timer::{ReminderHandle, ReminderTick, TimerService};
use std::sync::Arc;
use std::time::Duration;

pub struct Activation<A: ActorEntity> {
    key: A::Key,
    id: u64,
    context: Arc<A::Context>,
    state: PersistentState<A::State>,
    timers: TimerService<A::Key>,
}

impl<A: ActorEntity> Activation<A> {
    pub(crate) fn new(
        key: A::Key,
        id: u64,
        context: Arc<A::Context>,
        store: Arc<dyn StateStore>,
        timers: TimerService<A::Key>,
    ) -> Self {
        let storage_key = format!("{}/{}", A::STATE_NAME, key);
        Self {
            key,
            id,
            context,
            state: PersistentState::new(storage_key, store),
            timers,
        }
    }

    pub fn key(&self) -> &A::Key {
        &self.key
    }

    /// Distinguishes successive activations of the same key.
    pub fn activation_id(&self) -> u64 {
        self.id
    }

    pub fn context(&self) -> &A::Context {
        &self.context
    }

    pub fn storage_key(&self) -> &str {
        self.state.storage_key()
    }

    pub(crate) async fn read_state(&mut self) -> Result<A::State, FrameworkError> {
        self.state.read().await
    }

    /// Durably saves `state`. Entities should commit the new state in memory
    /// only after this returns `Ok`.
    pub async fn write_state(&mut self, state: &A::State) -> Result<(), FrameworkError> {
        self.state.write(state).await
    }

    /// Arms `name` for this key, replacing any reminder already armed under it.
    pub fn register_or_update_reminder(
        &self,
        name: &str,
        due: Duration,
        period: Duration,
    ) -> Result<ReminderHandle<A::Key>, FrameworkError> {
        self.timers.schedule(self.key.clone(), name, due, period)
    }

    /// Disarms the reminder. A no-op if it already fired or was replaced.
    pub fn unregister_reminder(&self, handle: &ReminderHandle<A::Key>) -> bool {
        self.timers.cancel(handle)
    }

    pub(crate) fn claim_tick(&self, tick: &ReminderTick<A::Key>) -> bool {
        self.timers.claim(tick)
    }

    /// The reminder currently armed under `name`, which may predate this
    /// activation.
    pub fn current_reminder(&self, name: &str) -> Option<ReminderHandle<A::Key>> {
        self.timers.current(&self.key, name)
    }
}
