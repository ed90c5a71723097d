//! # Observability & Tracing
//!
//! The [`setup_tracing`] function initializes structured logging with the
//! `tracing` crate for the whole table order system.
//!
//! ## Configuration
//!
//! - **Structured logging** with `tracing` fields (`table`, `item_id`, `activation`)
//! - **Hierarchical spans**: every actor runs inside an `actor` span carrying
//!   `entity_type`, `key` and `activation`; client calls add their own span
//! - **Configurable log levels** via the `RUST_LOG` environment variable
//! - **Compact format** without module paths (`with_target(false)`)
//!
//! ## Usage Examples
//!
//! ```bash
//! # Lifecycle events: opened, closed, expired, activated, deactivated
//! RUST_LOG=info cargo run
//!
//! # Every request and reminder, with payloads
//! RUST_LOG=debug cargo run
//!
//! # Only the framework internals
//! RUST_LOG=actor_framework=trace cargo run
//! ```
//!
//! ## Workflow Trace Example
//!
//! **With `RUST_LOG=info`**:
//!
//! ```text
//! INFO actor: Activated entity_type="TableOrder" key=5a1c.../1 activation=1
//! INFO actor: Table opened table=5a1c.../1
//! INFO actor: Action ok
//! INFO actor: Table order expired table=5a1c.../1
//! INFO actor: Table closed table=5a1c.../1 discarded=2
//! INFO actor: Deactivated
//! ```

/// Installs the global `fmt` subscriber, filtered by `RUST_LOG`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
