//! # Actor Registry
//!
//! The registry maps each key to exactly one live activation and creates
//! activations lazily on first reference.
//!
//! ## Concurrency Model
//!
//! - Every activation is its own Tokio task with its own bounded mailbox, so
//!   calls on one key are served strictly in arrival order.
//! - Calls on different keys share nothing but a sharded map lookup; they run
//!   in parallel.
//! - An idle activation deactivates itself. A call racing with the
//!   deactivation finds the mailbox closed and is redelivered to a fresh
//!   activation, which waits for its predecessor to retire before hydrating.
//!
//! ## Reminders
//!
//! The registry owns the [`TimerService`] and a dispatcher task that routes
//! reminder ticks into mailboxes, reactivating evicted actors as needed. A
//! tick that reaches an activation which then fails to hydrate is delivered
//! again after [`REMINDER_RETRY_DELAY`], for as long as its reminder stays
//! armed.

use crate::actor::KeyedActor;
use crate::client::{ActorRef, Delivery};
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::Envelope;
use crate::store::StateStore;
use crate::timer::{ReminderTick, TimerService};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::AbortHandle;
use tracing::{debug, info, trace, warn};

/// Delivery is retried this many times when it races with a deactivation.
const MAX_DELIVERY_ATTEMPTS: usize = 3;

/// Base delay between activation attempts during recovery; grows linearly.
const ACTIVATION_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Delay before a reminder tick is offered again after a failed activation.
pub const REMINDER_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Tuning for a registry.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Capacity of each activation's mailbox. Senders wait when it is full.
    pub mailbox_capacity: usize,
    /// Deactivate an activation after this long without envelopes.
    /// `None` keeps activations resident until shutdown.
    pub idle_timeout: Option<Duration>,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            mailbox_capacity: 32,
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }
}

/// Outcome of [`ActorRegistry::activate_persisted`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecoveryReport<K> {
    /// Keys that hydrated.
    pub activated: usize,
    /// Keys that still failed after retrying, with the last error.
    pub failed: Vec<(K, FrameworkError)>,
}

pub(crate) struct RegistryInner<A: ActorEntity> {
    pub(crate) actors: DashMap<A::Key, ActorRef<A>>,
    pub(crate) store: Arc<dyn StateStore>,
    pub(crate) timers: TimerService<A::Key>,
    pub(crate) context: Arc<A::Context>,
    pub(crate) options: RegistryOptions,
    next_activation: AtomicU64,
    shutting_down: AtomicBool,
    dispatcher: OnceLock<AbortHandle>,
}

impl<A: ActorEntity> RegistryInner<A> {
    pub(crate) fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }
}

/// Hosts every activation of one entity type.
///
/// # Usage Pattern
///
/// ```rust,ignore
/// let registry = ActorRegistry::<TableOrder>::new(store, settings, RegistryOptions::default());
/// registry.ask(&key, TableAction::Open).await?;
/// ```
///
/// Must be created inside a Tokio runtime; the reminder dispatcher is spawned
/// immediately.
pub struct ActorRegistry<A: ActorEntity> {
    inner: Arc<RegistryInner<A>>,
}

impl<A: ActorEntity> Clone for ActorRegistry<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: ActorEntity> ActorRegistry<A> {
    pub fn new(store: Arc<dyn StateStore>, context: A::Context, options: RegistryOptions) -> Self {
        let (timers, ticks) = TimerService::new();
        let inner = Arc::new(RegistryInner {
            actors: DashMap::new(),
            store,
            timers,
            context: Arc::new(context),
            options,
            next_activation: AtomicU64::new(1),
            shutting_down: AtomicBool::new(false),
            dispatcher: OnceLock::new(),
        });
        let dispatcher = tokio::spawn(dispatch_reminders(Arc::downgrade(&inner), ticks));
        let _ = inner.dispatcher.set(dispatcher.abort_handle());
        Self { inner }
    }

    /// Returns the live activation for `key`, creating one if needed.
    pub fn resolve(&self, key: &A::Key) -> ActorRef<A> {
        match self.inner.actors.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                if !occupied.get().is_closed() {
                    return occupied.get().clone();
                }
                let predecessor = occupied.get().finished();
                let actor = self.spawn_activation(key.clone(), Some(predecessor));
                occupied.insert(actor.clone());
                actor
            }
            Entry::Vacant(vacant) => {
                let actor = self.spawn_activation(key.clone(), None);
                vacant.insert(actor.clone());
                actor
            }
        }
    }

    fn spawn_activation(
        &self,
        key: A::Key,
        predecessor: Option<watch::Receiver<bool>>,
    ) -> ActorRef<A> {
        let id = self.inner.next_activation.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.inner.options.mailbox_capacity);
        let (finished_tx, finished_rx) = watch::channel(false);
        let actor = KeyedActor::new(
            key.clone(),
            id,
            receiver,
            self.inner.clone(),
            predecessor,
            finished_tx,
        );
        tokio::spawn(actor.run());
        debug!(%key, activation = id, "Activation spawned");
        ActorRef::new(key, id, sender, finished_rx)
    }

    /// Sends `action` to the activation for `key` and waits for its answer.
    #[tracing::instrument(skip_all, fields(%key))]
    pub async fn ask(&self, key: &A::Key, action: A::Action) -> Result<A::ActionResult, A::Error> {
        let mut action = action;
        for attempt in 1..=MAX_DELIVERY_ATTEMPTS {
            if self.is_shutting_down() {
                return Err(FrameworkError::ActorClosed.into());
            }
            match self.resolve(key).try_ask(action).await {
                Delivery::Answered(result) => return result,
                Delivery::Undelivered(returned) => {
                    debug!(attempt, "Mailbox closed, redelivering");
                    action = returned;
                }
            }
        }
        warn!(attempts = MAX_DELIVERY_ATTEMPTS, "Delivery failed");
        Err(FrameworkError::ActorClosed.into())
    }

    /// Activates `key` and waits until its state is loaded and
    /// [`ActorEntity::on_activate`] has run.
    pub async fn activate(&self, key: &A::Key) -> Result<(), FrameworkError> {
        for _ in 0..MAX_DELIVERY_ATTEMPTS {
            if self.is_shutting_down() {
                return Err(FrameworkError::ActorClosed);
            }
            let (respond_to, ready) = oneshot::channel();
            if self.resolve(key).send(Envelope::Ready(respond_to)).await.is_ok() {
                return ready.await.unwrap_or(Err(FrameworkError::ActorDropped));
            }
        }
        Err(FrameworkError::ActorClosed)
    }

    async fn activate_with_retry(&self, key: &A::Key) -> Result<(), FrameworkError> {
        let mut attempt = 1;
        loop {
            match self.activate(key).await {
                Ok(()) => return Ok(()),
                Err(error) if attempt < MAX_DELIVERY_ATTEMPTS && !self.is_shutting_down() => {
                    debug!(%key, attempt, %error, "Activation failed, retrying");
                    tokio::time::sleep(ACTIVATION_RETRY_DELAY * attempt as u32).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }

    async fn deliver_reminder(&self, tick: ReminderTick<A::Key>) {
        let key = tick.handle.owner().clone();
        let mut envelope = Envelope::Reminder(tick);
        for _ in 0..MAX_DELIVERY_ATTEMPTS {
            if self.is_shutting_down() {
                return;
            }
            match self.resolve(&key).send(envelope).await {
                Ok(()) => return,
                Err(returned) => envelope = returned,
            }
        }
        warn!(%key, "Reminder undeliverable");
    }

    pub fn is_active(&self, key: &A::Key) -> bool {
        self.inner
            .actors
            .get(key)
            .is_some_and(|actor| !actor.is_closed())
    }

    /// Number of activations currently accepting envelopes.
    pub fn active_count(&self) -> usize {
        self.inner
            .actors
            .iter()
            .filter(|entry| !entry.value().is_closed())
            .count()
    }

    pub fn timers(&self) -> &TimerService<A::Key> {
        &self.inner.timers
    }

    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.inner.store
    }

    fn is_shutting_down(&self) -> bool {
        self.inner.is_shutting_down()
    }

    /// Activates every key with persisted state so their `on_activate` hooks
    /// can re-arm reminders after a restart.
    ///
    /// Each key is waited on until it has hydrated. A key that fails is
    /// retried a few times and then reported in [`RecoveryReport::failed`].
    pub async fn activate_persisted(&self) -> Result<RecoveryReport<A::Key>, FrameworkError>
    where
        A::Key: FromStr,
    {
        let prefix = format!("{}/", A::STATE_NAME);
        let mut report = RecoveryReport {
            activated: 0,
            failed: Vec::new(),
        };
        for storage_key in self.inner.store.keys(&prefix).await? {
            let parsed = storage_key
                .strip_prefix(&prefix)
                .and_then(|raw| raw.parse::<A::Key>().ok());
            let Some(key) = parsed else {
                warn!(storage_key, "Skipping unparseable storage key");
                continue;
            };
            match self.activate_with_retry(&key).await {
                Ok(()) => report.activated += 1,
                Err(error) => {
                    warn!(%key, %error, "Persisted activation failed");
                    report.failed.push((key, error));
                }
            }
        }
        info!(
            activated = report.activated,
            failed = report.failed.len(),
            "Persisted activations restored"
        );
        Ok(report)
    }

    /// Stops every timer and activation and waits for them to retire.
    /// Calls made afterwards fail with [`FrameworkError::ActorClosed`].
    pub async fn shutdown(&self) {
        if self.inner.shutting_down.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.timers.shutdown();
        if let Some(dispatcher) = self.inner.dispatcher.get() {
            dispatcher.abort();
        }

        // Calls already past the shutdown check can still activate keys;
        // repeat until no unseen activation is left
        let mut stopped = HashSet::new();
        loop {
            let actors: Vec<ActorRef<A>> = self
                .inner
                .actors
                .iter()
                .filter(|entry| !stopped.contains(&entry.value().activation_id()))
                .map(|entry| entry.value().clone())
                .collect();
            if actors.is_empty() {
                break;
            }
            for actor in &actors {
                actor.stop().await;
            }
            for actor in &actors {
                actor.wait_finished().await;
                stopped.insert(actor.activation_id());
            }
        }
        info!(stopped = stopped.len(), "Registry shut down");
    }
}

/// Offers `tick` to its owner again after [`REMINDER_RETRY_DELAY`], unless the
/// reminder has been disarmed or replaced in the meantime.
pub(crate) fn redeliver_reminder_later<A: ActorEntity>(
    inner: &Arc<RegistryInner<A>>,
    tick: ReminderTick<A::Key>,
) {
    debug!(
        owner = %tick.handle.owner(),
        reminder = tick.handle.name(),
        delay = ?REMINDER_RETRY_DELAY,
        "Reminder deferred"
    );
    let registry = Arc::downgrade(inner);
    tokio::spawn(async move {
        tokio::time::sleep(REMINDER_RETRY_DELAY).await;
        let Some(inner) = registry.upgrade() else {
            return;
        };
        if inner.is_shutting_down() || !inner.timers.is_current(&tick.handle) {
            trace!(owner = %tick.handle.owner(), reminder = tick.handle.name(), "Deferred tick no longer needed");
            return;
        }
        ActorRegistry { inner }.deliver_reminder(tick).await;
    });
}

async fn dispatch_reminders<A: ActorEntity>(
    registry: Weak<RegistryInner<A>>,
    mut ticks: mpsc::UnboundedReceiver<ReminderTick<A::Key>>,
) {
    while let Some(tick) = ticks.recv().await {
        let Some(inner) = registry.upgrade() else {
            break;
        };
        // Checked again by the actor, in mailbox order, before delivery
        if !inner.timers.is_current(&tick.handle) {
            trace!(owner = %tick.handle.owner(), reminder = tick.handle.name(), "Dropping stale tick");
            continue;
        }

        // Delivery may wait on a full mailbox; don't hold up other keys
        let registry = ActorRegistry { inner };
        tokio::spawn(async move { registry.deliver_reminder(tick).await });
    }
    debug!("Reminder dispatcher stopped");
}
