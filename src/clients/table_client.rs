//! # Table Order Client
//!
//! Provides a high‑level API for interacting with table order actors.
//! It wraps an `ActorRegistry<TableOrder>` and exposes one method per
//! operation, each addressed by a [`TableKey`].
use crate::model::{NewOrderItem, OrderItem, OrderItemId, TableKey, TableStatus};
use crate::table_actor::{TableAction, TableActionResult, TableOrder, TableOrderError};
use actor_framework::ActorRegistry;
use tracing::{debug, instrument};

/// Client for interacting with table order actors.
#[derive(Clone)]
pub struct TableOrderClient {
    registry: ActorRegistry<TableOrder>,
}

impl TableOrderClient {
    pub fn new(registry: ActorRegistry<TableOrder>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ActorRegistry<TableOrder> {
        &self.registry
    }

    /// Opens the table's tab.
    ///
    /// Fails with [`TableOrderError::InvalidState`] if it is already open.
    #[instrument(skip(self, table), fields(table = %table))]
    pub async fn open(&self, table: &TableKey) -> Result<(), TableOrderError> {
        debug!("Sending request");
        match self.registry.ask(table, TableAction::Open).await? {
            TableActionResult::Open(()) => Ok(()),
            _ => unreachable!("Open action must return Open result"),
        }
    }

    /// Closes the table's tab, discarding its items.
    ///
    /// Fails with [`TableOrderError::InvalidState`] if it is already closed.
    #[instrument(skip(self, table), fields(table = %table))]
    pub async fn close(&self, table: &TableKey) -> Result<(), TableOrderError> {
        debug!("Sending request");
        match self.registry.ask(table, TableAction::Close).await? {
            TableActionResult::Close(()) => Ok(()),
            _ => unreachable!("Close action must return Close result"),
        }
    }

    /// Adds an item to an open table and returns its new id.
    #[instrument(skip(self, table, item), fields(table = %table, item = %item.name))]
    pub async fn add_item(
        &self,
        table: &TableKey,
        item: NewOrderItem,
    ) -> Result<OrderItemId, TableOrderError> {
        debug!(?item, "add_item called");
        match self.registry.ask(table, TableAction::AddItem(item)).await? {
            TableActionResult::AddItem(id) => Ok(id),
            _ => unreachable!("AddItem action must return AddItem result"),
        }
    }

    #[instrument(skip(self, table, id), fields(table = %table, item_id = %id))]
    pub async fn remove_item(&self, table: &TableKey, id: OrderItemId) -> Result<(), TableOrderError> {
        debug!("Sending request");
        match self.registry.ask(table, TableAction::RemoveItem(id)).await? {
            TableActionResult::RemoveItem(()) => Ok(()),
            _ => unreachable!("RemoveItem action must return RemoveItem result"),
        }
    }

    /// Returns a copy of one item; later changes to the table don't affect it.
    #[instrument(skip(self, table, id), fields(table = %table, item_id = %id))]
    pub async fn get_item(
        &self,
        table: &TableKey,
        id: OrderItemId,
    ) -> Result<OrderItem, TableOrderError> {
        debug!("Sending request");
        match self.registry.ask(table, TableAction::GetItem(id)).await? {
            TableActionResult::GetItem(item) => Ok(item),
            _ => unreachable!("GetItem action must return GetItem result"),
        }
    }

    /// Snapshot of the items in insertion order. Empty for a closed table.
    #[instrument(skip(self, table), fields(table = %table))]
    pub async fn list_items(&self, table: &TableKey) -> Result<Vec<OrderItem>, TableOrderError> {
        debug!("Sending request");
        match self.registry.ask(table, TableAction::ListItems).await? {
            TableActionResult::ListItems(items) => Ok(items),
            _ => unreachable!("ListItems action must return ListItems result"),
        }
    }

    #[instrument(skip(self, table), fields(table = %table))]
    pub async fn status(&self, table: &TableKey) -> Result<TableStatus, TableOrderError> {
        debug!("Sending request");
        match self.registry.ask(table, TableAction::Status).await? {
            TableActionResult::Status(status) => Ok(status),
            _ => unreachable!("Status action must return Status result"),
        }
    }
}
