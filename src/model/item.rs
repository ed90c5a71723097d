use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

/// Type-safe identifier for order items.
///
/// Ids are random 128-bit values generated by the table actor, so they are
/// never reused within a table's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderItemId(pub Uuid);

impl OrderItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OrderItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for OrderItemId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl Display for OrderItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One line item on an open table order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub name: String,
    pub unit_cost: f64,
    pub quantity: u32,
}

impl OrderItem {
    /// Total cost of the line.
    pub fn line_total(&self) -> f64 {
        self.unit_cost * f64::from(self.quantity)
    }
}

/// Payload for adding an item to a table order.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub name: String,
    pub unit_cost: f64,
    pub quantity: u32,
}

impl NewOrderItem {
    pub fn new(name: impl Into<String>, unit_cost: f64, quantity: u32) -> Self {
        Self {
            name: name.into(),
            unit_cost,
            quantity,
        }
    }

    /// Checks the payload, returning a description of the first problem found.
    ///
    /// # Rules
    /// - `name` must not be blank
    /// - `unit_cost` must be finite and non-negative
    /// - `quantity` must be positive
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("item name must not be blank".to_string());
        }
        if !self.unit_cost.is_finite() || self.unit_cost < 0.0 {
            return Err(format!(
                "unit cost must be a non-negative amount, got {}",
                self.unit_cost
            ));
        }
        if self.quantity == 0 {
            return Err("quantity must be positive".to_string());
        }
        Ok(())
    }

    pub(crate) fn into_item(self, id: OrderItemId) -> OrderItem {
        OrderItem {
            id,
            name: self.name,
            unit_cost: self.unit_cost,
            quantity: self.quantity,
        }
    }
}
