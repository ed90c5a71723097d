//! Pure data structures for table orders: the compound key, the durable state
//! and its line items.

pub mod item;
pub mod table;

pub use item::*;
pub use table::*;
