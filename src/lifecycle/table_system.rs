use super::config::{ConfigError, TableOrderConfig};
use crate::clients::TableOrderClient;
use crate::model::TableKey;
use crate::table_actor::{self, TableOrderSettings};
use actor_framework::store::{FileStateStore, InMemoryStateStore, StateStore};
use actor_framework::{FrameworkError, RegistryOptions, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info};

/// Errors raised while starting the system.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("State store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("Recovery failed: {0}")]
    Recovery(#[from] FrameworkError),

    /// Persisted tables that could not be reactivated. Their expiry reminders
    /// are not armed.
    #[error("{} persisted tables could not be recovered", .failed.len())]
    Unrecovered { failed: Vec<TableKey> },
}

/// The runtime orchestrator for table orders.
///
/// `TableOrderSystem` is responsible for:
/// - **Wiring**: choosing the state store and building the registry and client
/// - **Recovery**: reactivating persisted tables so their reminders re-arm
/// - **Shutdown**: stopping timers and every live actor
///
/// # Example
///
/// ```ignore
/// let system = TableOrderSystem::from_config(TableOrderConfig::from_env()?).await?;
///
/// system.table_client.open(&table).await?;
/// let id = system.table_client.add_item(&table, item).await?;
///
/// // Gracefully shut down when done
/// system.shutdown().await;
/// ```
pub struct TableOrderSystem {
    /// Client for interacting with table order actors
    pub table_client: TableOrderClient,
}

impl TableOrderSystem {
    /// Creates a system backed by an in-memory store with default settings.
    ///
    /// Must be called inside a Tokio runtime; the registry spawns its reminder
    /// dispatcher immediately.
    pub fn new() -> Self {
        Self::with_store(
            Arc::new(InMemoryStateStore::new()),
            &TableOrderConfig::default(),
        )
    }

    /// Creates a system on top of `store`. `config.state_dir` is ignored.
    /// Same runtime requirement as [`new`](Self::new).
    pub fn with_store(store: Arc<dyn StateStore>, config: &TableOrderConfig) -> Self {
        let settings = TableOrderSettings {
            expiry_window: config.expiry_window,
        };
        let options = RegistryOptions {
            mailbox_capacity: config.mailbox_capacity,
            idle_timeout: config.idle_timeout,
        };
        let registry = table_actor::new(store, settings, options);
        info!(
            expiry_window = ?config.expiry_window,
            idle_timeout = ?config.idle_timeout,
            "Table order system started"
        );
        Self {
            table_client: TableOrderClient::new(registry),
        }
    }

    /// Creates a system from configuration and recovers persisted tables.
    ///
    /// With `state_dir` set, state lives in JSON files under that directory
    /// and survives restarts; otherwise it is kept in memory.
    pub async fn from_config(config: TableOrderConfig) -> Result<Self, SystemError> {
        let store: Arc<dyn StateStore> = match &config.state_dir {
            Some(dir) => {
                info!(dir = %dir.display(), "Using file state store");
                Arc::new(FileStateStore::open(dir.clone()).await?)
            }
            None => Arc::new(InMemoryStateStore::new()),
        };
        let system = Self::with_store(store, &config);
        system.recover().await?;
        Ok(system)
    }

    /// Activates every persisted table so open ones re-arm their expiry
    /// reminder. Returns how many tables were recovered.
    ///
    /// Fails with [`SystemError::Unrecovered`] if any table still could not
    /// be loaded after retrying; the others are recovered regardless.
    pub async fn recover(&self) -> Result<usize, SystemError> {
        let report = self.table_client.registry().activate_persisted().await?;
        if !report.failed.is_empty() {
            for (table, error) in &report.failed {
                error!(%table, %error, "Table not recovered");
            }
            return Err(SystemError::Unrecovered {
                failed: report.failed.into_iter().map(|(table, _)| table).collect(),
            });
        }
        info!(recovered = report.activated, "Recovery complete");
        Ok(report.activated)
    }

    /// Gracefully shuts down the entire system.
    ///
    /// Timers stop first, then every live actor drains its mailbox and
    /// deactivates. Calls made through surviving clients fail afterwards.
    pub async fn shutdown(self) {
        info!("Shutting down system...");
        self.table_client.registry().shutdown().await;
        info!("System shutdown complete.");
    }
}

/// Same as [`TableOrderSystem::new`], including its runtime requirement.
impl Default for TableOrderSystem {
    fn default() -> Self {
        Self::new()
    }
}
