//! # Timer Service
//!
//! Reminders are named, per-owner timers. Scheduling a reminder under a name
//! that is already armed for the same owner *replaces* it, so an owner never
//! has two live timers with the same purpose.
//!
//! The service does not call actors directly. Each firing is pushed as a
//! [`ReminderTick`] onto the channel returned by [`TimerService::new`]; the
//! registry drains that channel and routes ticks into actor mailboxes,
//! reactivating evicted actors on the way.

use crate::error::FrameworkError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Opaque reference to one armed reminder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderHandle<K> {
    owner: K,
    name: String,
    id: u64,
}

impl<K> ReminderHandle<K> {
    pub fn owner(&self) -> &K {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One firing of a reminder. `sequence` starts at 1.
#[derive(Debug, Clone)]
pub struct ReminderTick<K> {
    pub handle: ReminderHandle<K>,
    pub sequence: u64,
}

struct ArmedTimer {
    id: u64,
    one_shot: bool,
    task: JoinHandle<()>,
}

struct TimerInner<K> {
    timers: DashMap<(K, String), ArmedTimer>,
    next_id: AtomicU64,
    ticks: mpsc::UnboundedSender<ReminderTick<K>>,
    stopped: AtomicBool,
}

pub struct TimerService<K> {
    inner: Arc<TimerInner<K>>,
}

impl<K> Clone for TimerService<K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K> TimerService<K>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
{
    /// Creates the service and the receiving end of its tick channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReminderTick<K>>) {
        let (ticks, receiver) = mpsc::unbounded_channel();
        let service = Self {
            inner: Arc::new(TimerInner {
                timers: DashMap::new(),
                next_id: AtomicU64::new(1),
                ticks,
                stopped: AtomicBool::new(false),
            }),
        };
        (service, receiver)
    }

    /// Arms (or re-arms) the reminder `name` for `owner`.
    ///
    /// The first tick fires after `initial_delay`; a non-zero `period` makes
    /// it recur until cancelled. Must be called from within a Tokio runtime.
    pub fn schedule(
        &self,
        owner: K,
        name: &str,
        initial_delay: Duration,
        period: Duration,
    ) -> Result<ReminderHandle<K>, FrameworkError> {
        if self.inner.stopped.load(Ordering::Acquire) || self.inner.ticks.is_closed() {
            return Err(FrameworkError::TimerUnavailable);
        }

        let handle = ReminderHandle {
            owner: owner.clone(),
            name: name.to_string(),
            id: self.inner.next_id.fetch_add(1, Ordering::Relaxed),
        };

        // The entry guard is held across the spawn so a zero-delay tick can't
        // be judged stale before the timer is registered.
        let entry = self.inner.timers.entry((owner, name.to_string()));
        let task = tokio::spawn(run_timer(
            handle.clone(),
            self.inner.ticks.clone(),
            initial_delay,
            period,
        ));
        let armed = ArmedTimer {
            id: handle.id,
            one_shot: period.is_zero(),
            task,
        };
        match entry {
            Entry::Occupied(mut occupied) => {
                let previous = occupied.insert(armed);
                previous.task.abort();
                debug!(owner = ?handle.owner, name, replaced = previous.id, "Reminder re-armed");
            }
            Entry::Vacant(vacant) => {
                vacant.insert(armed);
                debug!(owner = ?handle.owner, name, ?initial_delay, ?period, "Reminder armed");
            }
        }
        Ok(handle)
    }

    /// Stops the reminder if `handle` is still the armed one.
    ///
    /// Returns whether a timer was actually stopped; stale, fired and
    /// already-cancelled handles are a silent no-op.
    pub fn cancel(&self, handle: &ReminderHandle<K>) -> bool {
        let key = (handle.owner.clone(), handle.name.clone());
        match self.inner.timers.remove_if(&key, |_, armed| armed.id == handle.id) {
            Some((_, armed)) => {
                armed.task.abort();
                debug!(owner = ?handle.owner, name = %handle.name, "Reminder cancelled");
                true
            }
            None => {
                trace!(owner = ?handle.owner, name = %handle.name, "Cancel ignored, reminder not armed");
                false
            }
        }
    }

    /// The currently armed reminder `name` for `owner`, if any.
    pub fn current(&self, owner: &K, name: &str) -> Option<ReminderHandle<K>> {
        self.inner
            .timers
            .get(&(owner.clone(), name.to_string()))
            .map(|armed| ReminderHandle {
                owner: owner.clone(),
                name: name.to_string(),
                id: armed.id,
            })
    }

    pub fn is_current(&self, handle: &ReminderHandle<K>) -> bool {
        self.inner
            .timers
            .get(&(handle.owner.clone(), handle.name.clone()))
            .is_some_and(|armed| armed.id == handle.id)
    }

    /// Claims `tick` for delivery to its owner.
    ///
    /// Returns `false` if the reminder was cancelled or replaced since the
    /// tick fired. A claimed one-shot reminder is forgotten.
    pub fn claim(&self, tick: &ReminderTick<K>) -> bool {
        let key = (tick.handle.owner.clone(), tick.handle.name.clone());
        match self.inner.timers.entry(key) {
            Entry::Occupied(occupied) if occupied.get().id == tick.handle.id => {
                if occupied.get().one_shot {
                    occupied.remove();
                }
                true
            }
            _ => false,
        }
    }

    pub fn armed_count(&self) -> usize {
        self.inner.timers.len()
    }

    /// Aborts every timer. Later calls to [`schedule`](Self::schedule) fail.
    pub fn shutdown(&self) {
        self.inner.stopped.store(true, Ordering::Release);
        self.inner.timers.retain(|_, armed| {
            armed.task.abort();
            false
        });
        debug!("Timer service stopped");
    }
}

async fn run_timer<K>(
    handle: ReminderHandle<K>,
    ticks: mpsc::UnboundedSender<ReminderTick<K>>,
    initial_delay: Duration,
    period: Duration,
) where
    K: Clone,
{
    tokio::time::sleep(initial_delay).await;
    let mut sequence = 0;
    loop {
        sequence += 1;
        let tick = ReminderTick {
            handle: handle.clone(),
            sequence,
        };
        if ticks.send(tick).is_err() || period.is_zero() {
            break;
        }
        tokio::time::sleep(period).await;
    }
}
