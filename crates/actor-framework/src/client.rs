//! # Actor References
//!
//! An [`ActorRef`] is the sending half of one activation's mailbox.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::message::Envelope;
use tokio::sync::{mpsc, oneshot, watch};

/// Outcome of offering an action to a mailbox.
pub(crate) enum Delivery<A: ActorEntity> {
    Answered(Result<A::ActionResult, A::Error>),
    /// The mailbox was already closed; the action is handed back untouched.
    Undelivered(A::Action),
}

/// A handle to one activation, as returned by
/// [`ActorRegistry::resolve`](crate::ActorRegistry::resolve).
///
/// * **Cloneable** - holds only a sender and a completion watch.
/// * **Pinned** - it addresses one activation. Once that activation has been
///   evicted, [`ask`](Self::ask) fails with `ActorClosed`; go through the
///   registry to reach its successor.
pub struct ActorRef<A: ActorEntity> {
    key: A::Key,
    activation: u64,
    sender: mpsc::Sender<Envelope<A>>,
    finished: watch::Receiver<bool>,
}

impl<A: ActorEntity> Clone for ActorRef<A> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            activation: self.activation,
            sender: self.sender.clone(),
            finished: self.finished.clone(),
        }
    }
}

impl<A: ActorEntity> ActorRef<A> {
    pub(crate) fn new(
        key: A::Key,
        activation: u64,
        sender: mpsc::Sender<Envelope<A>>,
        finished: watch::Receiver<bool>,
    ) -> Self {
        Self {
            key,
            activation,
            sender,
            finished,
        }
    }

    pub fn key(&self) -> &A::Key {
        &self.key
    }

    pub fn activation_id(&self) -> u64 {
        self.activation
    }

    /// True once the activation stopped accepting envelopes.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub async fn ask(&self, action: A::Action) -> Result<A::ActionResult, A::Error> {
        match self.try_ask(action).await {
            Delivery::Answered(result) => result,
            Delivery::Undelivered(_) => Err(FrameworkError::ActorClosed.into()),
        }
    }

    pub(crate) async fn try_ask(&self, action: A::Action) -> Delivery<A> {
        let (respond_to, response) = oneshot::channel();
        match self
            .sender
            .send(Envelope::Action { action, respond_to })
            .await
        {
            Ok(()) => Delivery::Answered(
                response
                    .await
                    .unwrap_or_else(|_| Err(FrameworkError::ActorDropped.into())),
            ),
            Err(mpsc::error::SendError(Envelope::Action { action, .. })) => {
                Delivery::Undelivered(action)
            }
            Err(mpsc::error::SendError(_)) => {
                Delivery::Answered(Err(FrameworkError::ActorClosed.into()))
            }
        }
    }

    pub(crate) async fn send(&self, envelope: Envelope<A>) -> Result<(), Envelope<A>> {
        self.sender.send(envelope).await.map_err(|e| e.0)
    }

    /// Asks the activation to deactivate once its queue is drained.
    pub(crate) async fn stop(&self) {
        let _ = self.sender.send(Envelope::Stop).await;
    }

    pub(crate) fn finished(&self) -> watch::Receiver<bool> {
        self.finished.clone()
    }

    /// Resolves once the activation has fully deactivated.
    pub async fn wait_finished(&self) {
        let mut finished = self.finished.clone();
        // A dropped sender means the task is gone, which is just as final
        let _ = finished.wait_for(|done| *done).await;
    }
}
