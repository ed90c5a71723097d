//! Actions for the Table Order actor.
//!
//! Every operation on a table is one [`TableAction`]. The registry delivers
//! them to [`TableOrder`](super::TableOrder) one at a time, in arrival order.

use crate::model::{NewOrderItem, OrderItem, OrderItemId, TableStatus};

/// Operations accepted by a table order actor.
#[derive(Debug, Clone)]
pub enum TableAction {
    /// Opens the tab and arms the expiry reminder.
    ///
    /// # Errors
    /// Fails with `InvalidState` if the table is already open.
    Open,
    /// Closes the tab, discarding its items, and disarms the reminder.
    ///
    /// # Errors
    /// Fails with `InvalidState` if the table is already closed.
    Close,
    /// Adds a line item and returns its generated id.
    AddItem(NewOrderItem),
    /// Removes exactly the item with this id.
    RemoveItem(OrderItemId),
    /// Returns a copy of one item.
    GetItem(OrderItemId),
    /// Returns a snapshot of all items in insertion order.
    ListItems,
    /// Returns the open flag, item count and opening time.
    Status,
}

/// Results from TableActions - variants match 1:1 with TableAction
#[derive(Debug, Clone)]
pub enum TableActionResult {
    Open(()),
    Close(()),
    AddItem(OrderItemId),
    RemoveItem(()),
    GetItem(OrderItem),
    ListItems(Vec<OrderItem>),
    Status(TableStatus),
}
