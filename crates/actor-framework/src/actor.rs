//! # Keyed Actor Server
//!
//! This module defines the task that runs one activation. It implements the
//! "Server" side of the Actor Model for a single key: it owns the entity and
//! the receiving end of the mailbox, and processes envelopes sequentially.

use crate::context::Activation;
use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::Envelope;
use crate::registry::{self, RegistryInner};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, info_span, warn, Instrument};

/// One activation of an entity.
///
/// # Lifecycle
///
/// 1. **Wait**: if an earlier activation of the same key is still draining,
///    wait until it has finished, so two activations never overlap.
/// 2. **Hydrate**: load the state from the store and call
///    [`ActorEntity::on_activate`].
/// 3. **Serve**: process envelopes one at a time until stopped or idle.
/// 4. **Drain**: close the mailbox and serve whatever was already queued.
/// 5. **Retire**: run [`ActorEntity::on_deactivate`], unregister from the
///    registry and signal completion.
///
/// If hydration fails, every queued request is answered with the failure and
/// the activation retires immediately. The next call activates afresh, and
/// queued reminder ticks are redelivered after a short delay. An activation
/// spawned while the registry shuts down retires the same way without
/// hydrating.
pub(crate) struct KeyedActor<A: ActorEntity> {
    key: A::Key,
    id: u64,
    receiver: mpsc::Receiver<Envelope<A>>,
    registry: Arc<RegistryInner<A>>,
    predecessor: Option<watch::Receiver<bool>>,
    finished: watch::Sender<bool>,
}

impl<A: ActorEntity> KeyedActor<A> {
    pub(crate) fn new(
        key: A::Key,
        id: u64,
        receiver: mpsc::Receiver<Envelope<A>>,
        registry: Arc<RegistryInner<A>>,
        predecessor: Option<watch::Receiver<bool>>,
        finished: watch::Sender<bool>,
    ) -> Self {
        Self {
            key,
            id,
            receiver,
            registry,
            predecessor,
            finished,
        }
    }

    pub(crate) async fn run(self) {
        // Extract just the type name (e.g., "TableOrder" instead of "table_orders::...::TableOrder")
        let entity_type = std::any::type_name::<A>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        let span = info_span!("actor", entity_type, key = %self.key, activation = self.id);
        self.run_activation().instrument(span).await
    }

    async fn run_activation(mut self) {
        if let Some(mut predecessor) = self.predecessor.take() {
            debug!("Waiting for previous activation to retire");
            let _ = predecessor.wait_for(|finished| *finished).await;
        }

        let mut activation = Activation::new(
            self.key.clone(),
            self.id,
            self.registry.context.clone(),
            self.registry.store.clone(),
            self.registry.timers.clone(),
        );

        let hydrated = if self.registry.is_shutting_down() {
            Err(FrameworkError::ActorClosed)
        } else {
            Self::hydrate(&self.key, &mut activation).await
        };
        match hydrated {
            Ok(mut entity) => {
                info!("Activated");
                self.serve(&mut entity, &mut activation).await;

                self.receiver.close();
                while let Some(envelope) = self.receiver.recv().await {
                    Self::dispatch(&mut entity, &mut activation, envelope).await;
                }
                entity.on_deactivate(&mut activation).await;
            }
            Err(error) => {
                warn!(%error, "Activation failed");
                self.receiver.close();
                while let Some(envelope) = self.receiver.recv().await {
                    match envelope {
                        Envelope::Action { respond_to, .. } => {
                            let _ = respond_to.send(Err(error.clone().into()));
                        }
                        Envelope::Ready(respond_to) => {
                            let _ = respond_to.send(Err(error.clone()));
                        }
                        // Not claimed yet, so it is still owed to the key
                        Envelope::Reminder(tick) => {
                            registry::redeliver_reminder_later(&self.registry, tick);
                        }
                        Envelope::Stop => {}
                    }
                }
            }
        }

        let id = self.id;
        self.registry
            .actors
            .remove_if(&self.key, |_, current| current.activation_id() == id);
        let _ = self.finished.send(true);
        info!("Deactivated");
    }

    async fn hydrate(key: &A::Key, activation: &mut Activation<A>) -> Result<A, FrameworkError> {
        let state = activation.read_state().await?;
        let mut entity = A::from_state(key, state);
        entity
            .on_activate(activation)
            .await
            .map_err(|e| FrameworkError::ActivationFailed(e.to_string()))?;
        Ok(entity)
    }

    async fn serve(&mut self, entity: &mut A, activation: &mut Activation<A>) {
        let idle_timeout = self.registry.options.idle_timeout;
        loop {
            let next = match idle_timeout {
                Some(idle) => match tokio::time::timeout(idle, self.receiver.recv()).await {
                    Ok(next) => next,
                    Err(_) => {
                        debug!(?idle, "Idle, deactivating");
                        return;
                    }
                },
                None => self.receiver.recv().await,
            };
            match next {
                Some(Envelope::Stop) => {
                    debug!("Stop requested");
                    return;
                }
                Some(envelope) => Self::dispatch(entity, activation, envelope).await,
                None => return,
            }
        }
    }

    async fn dispatch(entity: &mut A, activation: &mut Activation<A>, envelope: Envelope<A>) {
        match envelope {
            Envelope::Action { action, respond_to } => {
                debug!(?action, "Action");
                let result = entity.handle_action(action, activation).await;
                match &result {
                    Ok(_) => info!("Action ok"),
                    Err(e) => warn!(error = %e, "Action failed"),
                }
                let _ = respond_to.send(result);
            }
            Envelope::Reminder(tick) => {
                if !activation.claim_tick(&tick) {
                    debug!(reminder = tick.handle.name(), "Reminder disarmed before delivery");
                    return;
                }
                debug!(reminder = tick.handle.name(), sequence = tick.sequence, "Reminder");
                if let Err(e) = entity
                    .receive_reminder(tick.handle.name(), activation)
                    .await
                {
                    warn!(reminder = tick.handle.name(), error = %e, "Reminder failed");
                }
            }
            Envelope::Ready(respond_to) => {
                let _ = respond_to.send(Ok(()));
            }
            // Already deactivating
            Envelope::Stop => {}
        }
    }
}
