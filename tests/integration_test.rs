use actor_framework::mock::FlakyStore;
use actor_framework::store::{FileStateStore, InMemoryStateStore, StateStore};
use chrono::{TimeDelta, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use table_orders::lifecycle::{SystemError, TableOrderConfig, TableOrderSystem};
use table_orders::model::{NewOrderItem, OrderItemId, TableKey, TableOrderState};
use table_orders::table_actor::TableOrderError;
use tokio::time::Instant;
use uuid::Uuid;

fn table(number: u32) -> TableKey {
    TableKey::new(Uuid::new_v4(), number)
}

fn file_config(dir: &std::path::Path) -> TableOrderConfig {
    TableOrderConfig {
        state_dir: Some(dir.to_path_buf()),
        ..TableOrderConfig::default()
    }
}

#[tokio::test]
async fn test_concurrent_adds_never_lose_updates() {
    let system = TableOrderSystem::new();
    let t1 = table(1);
    system.table_client.open(&t1).await.unwrap();

    let mut tasks = Vec::new();
    for n in 0..50 {
        let client = system.table_client.clone();
        tasks.push(tokio::spawn(async move {
            client
                .add_item(&t1, NewOrderItem::new(format!("Dish {n}"), 1.5, 1))
                .await
        }));
    }
    let mut ids = HashSet::new();
    for task in tasks {
        ids.insert(task.await.unwrap().unwrap());
    }

    assert_eq!(ids.len(), 50);
    let items = system.table_client.list_items(&t1).await.unwrap();
    assert_eq!(items.len(), 50);
    let listed: HashSet<OrderItemId> = items.iter().map(|item| item.id).collect();
    assert_eq!(listed, ids);

    system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_different_tables_do_not_block_each_other() {
    let store = Arc::new(FlakyStore::new(Arc::new(InMemoryStateStore::new())));
    store.set_save_delay(Duration::from_millis(100));
    let system = TableOrderSystem::with_store(store.clone(), &TableOrderConfig::default());
    let client = &system.table_client;
    let (t1, t2) = (table(1), table(2));

    let started = Instant::now();
    let (first, second) = tokio::join!(client.open(&t1), client.open(&t2));
    first.unwrap();
    second.unwrap();
    assert!(started.elapsed() < Duration::from_millis(150));

    // The same table serializes its saves
    let started = Instant::now();
    let (first, second) = tokio::join!(
        client.add_item(&t1, NewOrderItem::new("Pizza", 10.0, 1)),
        client.add_item(&t1, NewOrderItem::new("Soda", 2.5, 2))
    );
    first.unwrap();
    second.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(store.save_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_evicted_table_reloads_and_still_expires() {
    let config = TableOrderConfig {
        idle_timeout: Some(Duration::from_secs(1)),
        ..TableOrderConfig::default()
    };
    let system = TableOrderSystem::with_store(Arc::new(InMemoryStateStore::new()), &config);
    let client = &system.table_client;
    let t1 = table(1);
    client.open(&t1).await.unwrap();
    let id = client
        .add_item(&t1, NewOrderItem::new("Pizza", 10.0, 1))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!client.registry().is_active(&t1));

    // Transparently reactivated from the store
    assert_eq!(client.get_item(&t1, id).await.unwrap().name, "Pizza");
    assert!(client.registry().is_active(&t1));

    // The reminder outlives eviction and reactivates the table to close it
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(!client.registry().is_active(&t1));
    tokio::time::sleep(Duration::from_secs(3 * 60 * 60)).await;
    assert!(!client.status(&t1).await.unwrap().is_open);
    assert!(client.list_items(&t1).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_open_table_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let t1 = table(7);

    let system = TableOrderSystem::from_config(file_config(dir.path())).await.unwrap();
    system.table_client.open(&t1).await.unwrap();
    let id = system
        .table_client
        .add_item(&t1, NewOrderItem::new("Soda", 2.5, 2))
        .await
        .unwrap();
    system.shutdown().await;

    let system = TableOrderSystem::from_config(file_config(dir.path())).await.unwrap();
    let client = &system.table_client;
    let items = client.list_items(&t1).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, id);
    assert!(client.status(&t1).await.unwrap().is_open);
    assert_eq!(
        client.registry().timers().armed_count(),
        1,
        "recovery re-arms the expiry reminder"
    );

    // Mutations keep working on top of the reloaded state
    client.close(&t1).await.unwrap();
    system.shutdown().await;
}

#[tokio::test]
async fn test_recovery_closes_tables_whose_window_passed() {
    let dir = tempfile::tempdir().unwrap();
    let t1 = table(3);
    let overdue = TableOrderState {
        is_open: true,
        items: Vec::new(),
        opened_at: Some(Utc::now() - TimeDelta::hours(4)),
    };
    let store = FileStateStore::open(dir.path()).await.unwrap();
    store
        .save(
            &format!("table-order/{t1}"),
            serde_json::to_value(&overdue).unwrap(),
            None,
        )
        .await
        .unwrap();

    let system = TableOrderSystem::from_config(file_config(dir.path())).await.unwrap();
    let client = &system.table_client;

    let mut closed = false;
    for _ in 0..100 {
        if !client.status(&t1).await.unwrap().is_open {
            closed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(closed, "overdue table should close right after recovery");
    system.shutdown().await;
}

#[tokio::test]
async fn test_recover_counts_persisted_tables() {
    let store: Arc<dyn StateStore> = Arc::new(InMemoryStateStore::new());
    let system = TableOrderSystem::with_store(store.clone(), &TableOrderConfig::default());
    for n in 1..=3 {
        system.table_client.open(&table(n)).await.unwrap();
    }
    system.shutdown().await;

    let system = TableOrderSystem::with_store(store, &TableOrderConfig::default());
    assert_eq!(system.recover().await.unwrap(), 3);
    system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_recovery_retries_a_failed_load_and_rearms() {
    let config = TableOrderConfig {
        expiry_window: Duration::from_secs(60),
        idle_timeout: None,
        ..TableOrderConfig::default()
    };
    let store = Arc::new(FlakyStore::new(Arc::new(InMemoryStateStore::new())));
    let t1 = table(4);
    let system = TableOrderSystem::with_store(store.clone(), &config);
    system.table_client.open(&t1).await.unwrap();
    system.shutdown().await;

    let system = TableOrderSystem::with_store(store.clone(), &config);
    store.fail_next_loads(1);
    assert_eq!(system.recover().await.unwrap(), 1);
    let client = &system.table_client;
    assert_eq!(client.registry().timers().armed_count(), 1);

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert!(!client.status(&t1).await.unwrap().is_open);
    assert_eq!(client.registry().timers().armed_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_recovery_reports_tables_it_cannot_load() {
    let store = Arc::new(FlakyStore::new(Arc::new(InMemoryStateStore::new())));
    let t1 = table(5);
    let system = TableOrderSystem::with_store(store.clone(), &TableOrderConfig::default());
    system.table_client.open(&t1).await.unwrap();
    system.shutdown().await;

    let system = TableOrderSystem::with_store(store.clone(), &TableOrderConfig::default());
    store.fail_next_loads(10);
    match system.recover().await {
        Err(SystemError::Unrecovered { failed }) => assert_eq!(failed, vec![t1]),
        other => panic!("expected Unrecovered, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_expiry_survives_a_failed_reactivation() {
    let config = TableOrderConfig {
        expiry_window: Duration::from_secs(60),
        idle_timeout: Some(Duration::from_secs(5)),
        ..TableOrderConfig::default()
    };
    let store = Arc::new(FlakyStore::new(Arc::new(InMemoryStateStore::new())));
    let system = TableOrderSystem::with_store(store.clone(), &config);
    let client = &system.table_client;
    let t1 = table(6);
    client.open(&t1).await.unwrap();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(!client.registry().is_active(&t1));

    // The expiry tick reactivates the table, and that first load fails
    store.fail_next_loads(1);
    tokio::time::sleep(Duration::from_secs(55)).await;
    assert!(!client.status(&t1).await.unwrap().is_open);
    assert_eq!(client.registry().timers().armed_count(), 0);
}

#[tokio::test]
async fn test_calls_after_shutdown_fail() {
    let system = TableOrderSystem::new();
    let client = system.table_client.clone();
    let t1 = table(1);
    client.open(&t1).await.unwrap();

    system.shutdown().await;

    let err = client.close(&t1).await.unwrap_err();
    assert!(matches!(err, TableOrderError::ActorUnavailable(_)));
}
