use super::item::{OrderItem, OrderItemId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Compound key identifying one physical table: a restaurant and a table
/// number within it.
///
/// `Display` renders `"{restaurant_id}/{table_number}"`, which is also the
/// suffix of the storage key. `FromStr` parses the same format back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableKey {
    pub restaurant_id: Uuid,
    pub table_number: u32,
}

impl TableKey {
    pub fn new(restaurant_id: Uuid, table_number: u32) -> Self {
        Self {
            restaurant_id,
            table_number,
        }
    }
}

impl Display for TableKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.restaurant_id, self.table_number)
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseTableKeyError {
    #[error("expected \"<restaurant-id>/<table-number>\", got {0:?}")]
    Format(String),

    #[error("invalid restaurant id: {0}")]
    RestaurantId(String),

    #[error("invalid table number: {0}")]
    TableNumber(String),
}

impl FromStr for TableKey {
    type Err = ParseTableKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (restaurant, table) = s
            .split_once('/')
            .ok_or_else(|| ParseTableKeyError::Format(s.to_string()))?;
        let restaurant_id = restaurant
            .parse::<Uuid>()
            .map_err(|e| ParseTableKeyError::RestaurantId(e.to_string()))?;
        let table_number = table
            .parse::<u32>()
            .map_err(|e| ParseTableKeyError::TableNumber(e.to_string()))?;
        Ok(Self::new(restaurant_id, table_number))
    }
}

/// Durable state of one table order.
///
/// A never-opened table is the `Default`: closed, no items. Closing a table
/// returns it to that value, discarding its items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableOrderState {
    pub is_open: bool,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    /// When the current tab was opened. Used to recompute the remaining
    /// auto-close delay after a reactivation.
    #[serde(default)]
    pub opened_at: Option<DateTime<Utc>>,
}

impl TableOrderState {
    /// A freshly opened tab with no items.
    pub fn opened(at: DateTime<Utc>) -> Self {
        Self {
            is_open: true,
            items: Vec::new(),
            opened_at: Some(at),
        }
    }

    pub fn item(&self, id: OrderItemId) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn status(&self) -> TableStatus {
        TableStatus {
            is_open: self.is_open,
            item_count: self.items.len(),
            opened_at: self.opened_at,
        }
    }
}

/// Read-only summary of a table order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableStatus {
    pub is_open: bool,
    pub item_count: usize,
    pub opened_at: Option<DateTime<Utc>>,
}
