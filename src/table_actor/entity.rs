//! [`ActorEntity`] implementation for table orders.
//!
//! Every mutation follows the same discipline: build the next state from a
//! copy, persist it through the activation, and only then commit it in
//! memory. A failed save therefore leaves the actor exactly as it was, and the
//! caller can retry the same call.
//!
//! # Expiry Reminder
//!
//! `Open` arms the `"TableOrderExpired"` reminder, due after the configured
//! expiry window and repeating with the same period until `Close` disarms it.
//! When it fires on an open table the actor closes itself; on a closed table
//! it does nothing. Reminders outlive idle eviction, and a reactivated open
//! table with no live reminder (after a restart) re-arms it for whatever is
//! left of the window.

use super::actions::{TableAction, TableActionResult};
use super::error::TableOrderError;
use crate::model::{NewOrderItem, OrderItem, OrderItemId, TableKey, TableOrderState};
use actor_framework::{Activation, ActorEntity, ReminderHandle};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Name of the auto-close reminder.
///
/// Armed by `Open` with both the first delay and the period set to the expiry
/// window. It is not fired immediately, since an expiry tick on an open table
/// closes it.
pub const TABLE_EXPIRED_REMINDER: &str = "TableOrderExpired";

/// Default auto-close window: three hours.
pub const DEFAULT_EXPIRY_WINDOW: Duration = Duration::from_secs(3 * 60 * 60);

/// Settings shared by every table activation.
#[derive(Debug, Clone)]
pub struct TableOrderSettings {
    /// How long a table may stay open before it closes itself.
    pub expiry_window: Duration,
}

impl Default for TableOrderSettings {
    fn default() -> Self {
        Self {
            expiry_window: DEFAULT_EXPIRY_WINDOW,
        }
    }
}

/// The resident instance of one table order.
pub struct TableOrder {
    key: TableKey,
    state: TableOrderState,
    reminder: Option<ReminderHandle<TableKey>>,
}

impl TableOrder {
    pub fn key(&self) -> &TableKey {
        &self.key
    }

    pub fn state(&self) -> &TableOrderState {
        &self.state
    }

    async fn open(&mut self, activation: &mut Activation<Self>) -> Result<(), TableOrderError> {
        if self.state.is_open {
            return Err(TableOrderError::InvalidState(
                "Table has already opened".to_string(),
            ));
        }

        let window = activation.context().expiry_window;
        let handle = activation.register_or_update_reminder(TABLE_EXPIRED_REMINDER, window, window)?;

        let next = TableOrderState::opened(Utc::now());
        if let Err(e) = activation.write_state(&next).await {
            // Open must not leave a reminder behind for a table that stayed closed
            activation.unregister_reminder(&handle);
            return Err(e.into());
        }
        self.state = next;
        self.reminder = Some(handle);
        info!(table = %self.key, "Table opened");
        Ok(())
    }

    async fn close(&mut self, activation: &mut Activation<Self>) -> Result<(), TableOrderError> {
        if !self.state.is_open {
            return Err(TableOrderError::InvalidState(
                "Table has already closed".to_string(),
            ));
        }

        let discarded = self.state.items.len();
        let next = TableOrderState::default();
        activation.write_state(&next).await?;
        self.state = next;

        let handle = self
            .reminder
            .take()
            .or_else(|| activation.current_reminder(TABLE_EXPIRED_REMINDER));
        if let Some(handle) = handle {
            activation.unregister_reminder(&handle);
        }
        info!(table = %self.key, discarded, "Table closed");
        Ok(())
    }

    async fn add_item(
        &mut self,
        item: NewOrderItem,
        activation: &mut Activation<Self>,
    ) -> Result<OrderItemId, TableOrderError> {
        if !self.state.is_open {
            return Err(TableOrderError::InvalidState(
                "Table should be opened".to_string(),
            ));
        }
        item.validate().map_err(TableOrderError::InvalidItem)?;

        let id = OrderItemId::new();
        let mut next = self.state.clone();
        next.items.push(item.into_item(id));
        activation.write_state(&next).await?;
        self.state = next;
        debug!(item_id = %id, items = self.state.items.len(), "Item added");
        Ok(id)
    }

    async fn remove_item(
        &mut self,
        id: OrderItemId,
        activation: &mut Activation<Self>,
    ) -> Result<(), TableOrderError> {
        let position = self
            .state
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(TableOrderError::NotFound(id))?;

        let mut next = self.state.clone();
        next.items.remove(position);
        activation.write_state(&next).await?;
        self.state = next;
        debug!(item_id = %id, items = self.state.items.len(), "Item removed");
        Ok(())
    }

    fn get_item(&self, id: OrderItemId) -> Result<OrderItem, TableOrderError> {
        self.state
            .item(id)
            .cloned()
            .ok_or(TableOrderError::NotFound(id))
    }

    /// Adopts the reminder that survived eviction, or arms a new one for the
    /// rest of the window.
    fn ensure_reminder(&mut self, activation: &Activation<Self>) -> Result<(), TableOrderError> {
        if let Some(handle) = activation.current_reminder(TABLE_EXPIRED_REMINDER) {
            self.reminder = Some(handle);
            return Ok(());
        }

        let window = activation.context().expiry_window;
        let due = remaining_window(window, self.state.opened_at, Utc::now());
        let handle = activation.register_or_update_reminder(TABLE_EXPIRED_REMINDER, due, window)?;
        info!(table = %self.key, ?due, "Expiry reminder re-armed");
        self.reminder = Some(handle);
        Ok(())
    }
}

/// Time left before an order opened at `opened_at` expires. Zero when the
/// window has already passed or the opening time is unknown.
fn remaining_window(
    window: Duration,
    opened_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Duration {
    let Some(opened_at) = opened_at else {
        return Duration::ZERO;
    };
    // A timestamp in the future (clock skew) counts as just opened
    let elapsed = now
        .signed_duration_since(opened_at)
        .to_std()
        .unwrap_or(Duration::ZERO);
    window.saturating_sub(elapsed)
}

#[async_trait]
impl ActorEntity for TableOrder {
    type Key = TableKey;
    type State = TableOrderState;
    type Action = TableAction;
    type ActionResult = TableActionResult;
    type Context = TableOrderSettings;
    type Error = TableOrderError;

    const STATE_NAME: &'static str = "table-order";

    fn from_state(key: &TableKey, state: TableOrderState) -> Self {
        Self {
            key: *key,
            state,
            reminder: None,
        }
    }

    /// Re-arms the expiry reminder for tables that were open when they were
    /// last persisted.
    async fn on_activate(&mut self, activation: &mut Activation<Self>) -> Result<(), TableOrderError> {
        if self.state.is_open {
            self.ensure_reminder(activation)?;
        }
        debug!(is_open = self.state.is_open, items = self.state.items.len(), "Table hydrated");
        Ok(())
    }

    /// Handles table actions.
    ///
    /// # Actions
    /// - `Open` / `Close`: state transitions, arming and disarming the reminder
    /// - `AddItem` / `RemoveItem`: item list mutations, persisted before commit
    /// - `GetItem` / `ListItems` / `Status`: read-only snapshots
    async fn handle_action(
        &mut self,
        action: TableAction,
        activation: &mut Activation<Self>,
    ) -> Result<TableActionResult, TableOrderError> {
        match action {
            TableAction::Open => self.open(activation).await.map(TableActionResult::Open),
            TableAction::Close => self.close(activation).await.map(TableActionResult::Close),
            TableAction::AddItem(item) => self
                .add_item(item, activation)
                .await
                .map(TableActionResult::AddItem),
            TableAction::RemoveItem(id) => self
                .remove_item(id, activation)
                .await
                .map(TableActionResult::RemoveItem),
            TableAction::GetItem(id) => self.get_item(id).map(TableActionResult::GetItem),
            TableAction::ListItems => Ok(TableActionResult::ListItems(self.state.items.clone())),
            TableAction::Status => Ok(TableActionResult::Status(self.state.status())),
        }
    }

    async fn receive_reminder(
        &mut self,
        name: &str,
        activation: &mut Activation<Self>,
    ) -> Result<(), TableOrderError> {
        if name != TABLE_EXPIRED_REMINDER {
            warn!(reminder = name, "Unknown reminder");
            return Ok(());
        }
        if !self.state.is_open {
            // Raced with an explicit close
            debug!("Expiry reminder on closed table ignored");
            return Ok(());
        }
        info!(table = %self.key, "Table order expired");
        self.close(activation).await
    }
}
