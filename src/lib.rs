#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Table Orders
//!
//! > **Per-table order tabs on keyed, durable actors.**
//!
//! Each physical restaurant table has an open tab: opened, filled with line
//! items, and closed either explicitly or automatically once its expiry window
//! passes. Every table is one actor addressed by a [`TableKey`](model::TableKey).
//! Calls on one table never interleave, and calls on different tables run in
//! parallel.
//!
//! ## 🏗️ Design Philosophy
//!
//! ### Why Keyed Actors?
//!
//! - **Single writer**: one activation per table processes requests in arrival
//!   order, so concurrent `AddItem` calls can't lose updates. No locks.
//! - **Durable truth**: the resident actor is a cache; state is persisted
//!   before every commit and reloaded after eviction or restart.
//! - **Self-scheduled expiry**: an open table owns one reminder that closes it
//!   when it fires. Closing disarms it.
//!
//! ## 👩‍💻 Architecture Notes
//!
//! ### 1. Type-Safe Error Handling
//! Every table operation returns a [`TableOrderError`](table_actor::TableOrderError).
//! Framework failures (persistence, timers, closed mailboxes) convert into it, so
//! a caller matches on one enum. [`is_retryable`](table_actor::TableOrderError::is_retryable)
//! separates infrastructure failures from rule violations.
//!
//! ### 2. Stage, Persist, Commit
//! Mutations build the next state, save it, and only then replace the
//! in-memory copy. A failed save changes nothing, so the caller can retry.
//!
//! ### 3. Observability
//! We use `tracing` everywhere with structured logging. The framework wraps
//! each activation in a span carrying its key.
//! See the [`lifecycle::tracing`] module for details.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Model ([`model`])
//! - **Role**: Plain serializable data: keys, items, durable state.
//! - **Key items**: [`TableKey`](model::TableKey), [`OrderItem`](model::OrderItem),
//!   [`TableOrderState`](model::TableOrderState).
//!
//! ### 2. The Actor ([`table_actor`])
//! - **Role**: The open/closed state machine, implemented as an
//!   [`ActorEntity`](actor_framework::ActorEntity).
//! - **Key items**: [`TableOrder`](table_actor::TableOrder), [`TableAction`](table_actor::TableAction).
//!
//! ### 3. The Interface ([`clients`])
//! - **Role**: Hides message passing behind typed methods.
//! - **Key items**: [`TableOrderClient`](clients::TableOrderClient).
//!
//! ### 4. The Orchestrator ([`lifecycle`])
//! - **Role**: Configuration, store selection, recovery and shutdown.
//! - **Key items**: [`TableOrderSystem`](lifecycle::TableOrderSystem),
//!   [`TableOrderConfig`](lifecycle::TableOrderConfig).
//!
//! ## 🚀 Quick Start
//!
//! ### Running the Demo
//!
//! ```bash
//! # Run with info logs
//! RUST_LOG=info cargo run
//!
//! # Persist tables across runs
//! TABLE_STATE_DIR=./tables RUST_LOG=info cargo run
//! ```
//!
//! ### Running Tests
//!
//! ```bash
//! cargo test --workspace
//! ```

pub mod clients;
pub mod lifecycle;
pub mod model;
pub mod table_actor;
