//! # Generic Messages
//!
//! This module defines the envelopes that travel through an activation's
//! mailbox.

use crate::entity::ActorEntity;
use crate::error::FrameworkError;
use crate::timer::ReminderTick;
use tokio::sync::oneshot;

/// Type alias for the one-shot response channel used by actors.
pub type Response<A> =
    oneshot::Sender<Result<<A as ActorEntity>::ActionResult, <A as ActorEntity>::Error>>;

/// Internal message type sent to an activation.
///
/// Every envelope for a key goes through the same FIFO mailbox, so actions
/// and reminder ticks interleave in arrival order and never concurrently.
pub enum Envelope<A: ActorEntity> {
    Action {
        action: A::Action,
        respond_to: Response<A>,
    },
    Reminder(ReminderTick<A::Key>),
    /// Answered once the activation has hydrated, or with the reason it
    /// could not.
    Ready(oneshot::Sender<Result<(), FrameworkError>>),
    /// Deactivate after the envelopes already queued have been served.
    Stop,
}
