//! # Table Orders Demo
//!
//! Opens one table, adds and removes items, lists them and closes the table,
//! logging each step.
//!
//! ```bash
//! RUST_LOG=info cargo run
//! ```

use table_orders::lifecycle::{setup_tracing, TableOrderConfig, TableOrderSystem};
use table_orders::model::{NewOrderItem, TableKey};
use table_orders::table_actor::TableOrderError;
use tracing::{error, info, Instrument};
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = TableOrderConfig::from_env()?;
    info!(?config, "Starting table order system");
    let system = TableOrderSystem::from_config(config).await?;
    let client = system.table_client.clone();

    let table = TableKey::new(Uuid::new_v4(), 1);

    let span = tracing::info_span!("table_service", %table);
    let result = async {
        client.open(&table).await?;
        info!("Table opened");

        let pizza = client
            .add_item(&table, NewOrderItem::new("Pizza", 10.0, 1))
            .await?;
        let soda = client
            .add_item(&table, NewOrderItem::new("Soda", 2.5, 2))
            .await?;
        info!(%pizza, %soda, "Items added");

        let items = client.list_items(&table).await?;
        let total: f64 = items.iter().map(|item| item.line_total()).sum();
        info!(count = items.len(), total, "Current order");

        client.remove_item(&table, pizza).await?;
        let remaining = client.get_item(&table, soda).await?;
        info!(item = %remaining.name, quantity = remaining.quantity, "Pizza removed");

        client.close(&table).await?;
        let items = client.list_items(&table).await?;
        info!(count = items.len(), "Table closed");
        Ok::<_, TableOrderError>(())
    }
    .instrument(span)
    .await;

    if let Err(e) = &result {
        error!(error = %e, "Table service failed");
    }

    // Shutdown system gracefully
    system.shutdown().await;

    info!("Application completed");
    result.map_err(Into::into)
}
