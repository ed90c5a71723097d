//! # Actor Framework
//!
//! This crate provides the building blocks for **keyed actors**: one logical
//! instance of mutable state per key, activated on demand, served by a single
//! writer and backed by a durable store.
//!
//! ## Why Keyed Actors?
//!
//! ### Actor Model
//!
//! - Isolated state (no shared memory, no locks)
//! - Message-passing concurrency
//! - Sequential processing within each actor eliminates race conditions
//!
//! ### Virtual Activation
//!
//! - Callers address an actor by key; it exists whether or not it is resident
//! - The registry activates it on first use and evicts it when idle
//! - State lives in a [`StateStore`](store::StateStore); the resident instance
//!   is a cache of it
//!
//! **Further Reading**:
//! - [Actor Model (Wikipedia)](https://en.wikipedia.org/wiki/Actor_model) - Foundational concurrency pattern by Carl Hewitt
//! - [Actors in Rust](https://ryhl.io/blog/actors-with-tokio/) - Practical guide to implementing actors with Tokio
//!
//! ## Architecture Overview
//!
//! 1. **Entity Layer** ([`ActorEntity`]) - Your business logic and durable state
//! 2. **Runtime Layer** ([`ActorRegistry`]) - Activation, mailboxes, eviction
//! 3. **Services** ([`store`], [`timer`]) - Durability and reminders
//!
//! ## Example
//!
//! ```rust
//! use actor_framework::store::InMemoryStateStore;
//! use actor_framework::{Activation, ActorEntity, ActorRegistry, FrameworkError, RegistryOptions};
//! use async_trait::async_trait;
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct Visits { count: u32 }
//!
//! struct Page { visits: Visits }
//!
//! #[derive(Debug)] enum PageAction { Visit }
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error(transparent)]
//! struct PageError(#[from] FrameworkError);
//!
//! #[async_trait]
//! impl ActorEntity for Page {
//!     type Key = String;
//!     type State = Visits;
//!     type Action = PageAction;
//!     type ActionResult = u32;
//!     type Context = ();
//!     type Error = PageError;
//!     const STATE_NAME: &'static str = "page";
//!
//!     fn from_state(_key: &String, visits: Visits) -> Self { Self { visits } }
//!
//!     async fn handle_action(&mut self, _: PageAction, act: &mut Activation<Self>) -> Result<u32, PageError> {
//!         let next = Visits { count: self.visits.count + 1 };
//!         act.write_state(&next).await?;
//!         self.visits = next;
//!         Ok(self.visits.count)
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = ActorRegistry::<Page>::new(
//!         Arc::new(InMemoryStateStore::new()),
//!         (),
//!         RegistryOptions::default(),
//!     );
//!     let home = "home".to_string();
//!     assert_eq!(registry.ask(&home, PageAction::Visit).await.unwrap(), 1);
//!     assert_eq!(registry.ask(&home, PageAction::Visit).await.unwrap(), 2);
//!     registry.shutdown().await;
//! }
//! ```
//!
//! ## Concurrency Model
//!
//! - Each activation runs in its own Tokio task
//! - Envelopes for one key are processed **sequentially** (no locks needed!)
//! - Different keys run in **parallel**
//!
//! ## Testing
//!
//! See the [`mock`] module for a store that injects failures and latency.

mod actor;
pub mod client;
pub mod context;
pub mod entity;
pub mod error;
pub mod message;
pub mod mock;
pub mod registry;
pub mod state;
pub mod store;
pub mod timer;

// Re-export core types for convenience
pub use client::ActorRef;
pub use context::Activation;
pub use entity::ActorEntity;
pub use error::{FrameworkError, StoreError};
pub use message::{Envelope, Response};
pub use registry::{ActorRegistry, RecoveryReport, RegistryOptions};
pub use timer::{ReminderHandle, ReminderTick, TimerService};
