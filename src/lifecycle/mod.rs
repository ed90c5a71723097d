//! # System Lifecycle & Orchestration
//!
//! This module manages the runtime lifecycle of the table order system:
//! reading configuration, choosing a state store, starting the registry,
//! recovering persisted tables and shutting everything down.
//!
//! **Key Responsibilities:**
//! 1. **Configuration** - [`TableOrderConfig::from_env`]
//! 2. **Wiring** - [`TableOrderSystem`] builds the store, registry and client
//! 3. **Recovery** - reactivate tables persisted before a restart so their
//!    expiry reminders run again
//! 4. **Graceful Shutdown** - stop timers, drain and deactivate every actor
//! 5. **Observability Setup** - [`setup_tracing`]
//!
//! ## Recovery
//!
//! Reminders live in memory, so a restart loses them. The durable state keeps
//! the time each open table was opened; [`TableOrderSystem::recover`]
//! activates every persisted table and the actor re-arms its reminder for the
//! rest of the window. A table whose window passed while the process was down
//! closes right away.
//!
//! ## Graceful Shutdown
//!
//! [`TableOrderSystem::shutdown`] stops the timer service first, so no
//! reminder can reactivate a table mid-shutdown. Each actor then drains its
//! queued requests before it deactivates. No accepted request is dropped.

pub mod config;
pub mod table_system;
pub mod tracing;

pub use self::tracing::setup_tracing;
pub use config::*;
pub use table_system::*;
