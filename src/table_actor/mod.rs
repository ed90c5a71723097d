//! # Table Order Actor
//!
//! This module implements the per-table actor: one [`TableOrder`] instance
//! per [`TableKey`](crate::model::TableKey), hosted by an
//! [`ActorRegistry`] that serializes every call on the same table.
//!
//! ## Structure
//!
//! - [`entity`] - [`ActorEntity`](actor_framework::ActorEntity) implementation for [`TableOrder`]
//! - [`error`] - [`TableOrderError`] type for type-safe error handling
//! - [`actions`] - [`TableAction`] and [`TableActionResult`]
//! - [`new()`] - Factory function that creates the registry
//!
//! ## State Machine
//!
//! ```text
//!            Open                    AddItem / RemoveItem
//!   Closed ────────▶ Open ◀──────────────────────────────┐
//!     ▲               │  └───────────────────────────────┘
//!     └───────────────┘
//!       Close, or the TableOrderExpired reminder
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use actor_framework::store::InMemoryStateStore;
//! use actor_framework::RegistryOptions;
//! use std::sync::Arc;
//! use table_orders::clients::TableOrderClient;
//! use table_orders::model::{NewOrderItem, TableKey};
//! use table_orders::table_actor::{self, TableOrderSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = table_actor::new(
//!         Arc::new(InMemoryStateStore::new()),
//!         TableOrderSettings::default(),
//!         RegistryOptions::default(),
//!     );
//!     let client = TableOrderClient::new(registry);
//!
//!     let table = TableKey::new(uuid::Uuid::new_v4(), 4);
//!     client.open(&table).await?;
//!     let id = client.add_item(&table, NewOrderItem::new("Pizza", 10.0, 1)).await?;
//!     assert_eq!(client.get_item(&table, id).await?.name, "Pizza");
//!     client.close(&table).await?;
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use entity::*;
pub use error::*;

use actor_framework::store::StateStore;
use actor_framework::{ActorRegistry, RegistryOptions};
use std::sync::Arc;

/// Creates the registry hosting every table order.
pub fn new(
    store: Arc<dyn StateStore>,
    settings: TableOrderSettings,
    options: RegistryOptions,
) -> ActorRegistry<TableOrder> {
    ActorRegistry::new(store, settings, options)
}
