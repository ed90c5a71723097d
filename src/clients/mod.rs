//! Type-safe wrappers around [`ActorRegistry`](actor_framework::ActorRegistry).

pub mod table_client;

pub use table_client::*;
