use actor_framework::mock::FlakyStore;
use actor_framework::store::{InMemoryStateStore, StateStore};
use actor_framework::{Activation, ActorEntity, ActorRegistry, FrameworkError, RegistryOptions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

// --- Test Entity ---

const RING: &str = "ring";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct AlarmState {
    bumps: u32,
    rings: u32,
}

struct Alarm {
    state: AlarmState,
}

#[derive(Debug)]
enum AlarmAction {
    Bump,
    Arm { due: Duration, period: Duration },
    Disarm,
    Snapshot,
}

#[derive(Debug, thiserror::Error)]
#[error("alarm error: {0}")]
struct AlarmError(#[from] FrameworkError);

#[async_trait]
impl ActorEntity for Alarm {
    type Key = String;
    type State = AlarmState;
    type Action = AlarmAction;
    type ActionResult = AlarmState;
    type Context = ();
    type Error = AlarmError;

    const STATE_NAME: &'static str = "alarm";

    fn from_state(_key: &String, state: AlarmState) -> Self {
        Self { state }
    }

    async fn handle_action(
        &mut self,
        action: AlarmAction,
        activation: &mut Activation<Self>,
    ) -> Result<AlarmState, AlarmError> {
        match action {
            AlarmAction::Bump => {
                let mut next = self.state.clone();
                next.bumps += 1;
                activation.write_state(&next).await?;
                self.state = next;
            }
            AlarmAction::Arm { due, period } => {
                activation.register_or_update_reminder(RING, due, period)?;
            }
            AlarmAction::Disarm => {
                if let Some(handle) = activation.current_reminder(RING) {
                    activation.unregister_reminder(&handle);
                }
            }
            AlarmAction::Snapshot => {}
        }
        Ok(self.state.clone())
    }

    async fn receive_reminder(
        &mut self,
        name: &str,
        activation: &mut Activation<Self>,
    ) -> Result<(), AlarmError> {
        assert_eq!(name, RING);
        let mut next = self.state.clone();
        next.rings += 1;
        activation.write_state(&next).await?;
        self.state = next;
        Ok(())
    }
}

fn registry_with(
    store: Arc<dyn StateStore>,
    idle_timeout: Option<Duration>,
) -> ActorRegistry<Alarm> {
    ActorRegistry::new(
        store,
        (),
        RegistryOptions {
            mailbox_capacity: 16,
            idle_timeout,
        },
    )
}

fn registry() -> ActorRegistry<Alarm> {
    registry_with(Arc::new(InMemoryStateStore::new()), None)
}

async fn snapshot(registry: &ActorRegistry<Alarm>, key: &str) -> AlarmState {
    registry
        .ask(&key.to_string(), AlarmAction::Snapshot)
        .await
        .unwrap()
}

// --- Tests ---

#[tokio::test]
async fn test_concurrent_calls_on_one_key_never_lose_updates() {
    let registry = registry();
    let key = "kitchen".to_string();

    let mut tasks = Vec::new();
    for _ in 0..100 {
        let registry = registry.clone();
        let key = key.clone();
        tasks.push(tokio::spawn(async move {
            registry.ask(&key, AlarmAction::Bump).await.unwrap().bumps
        }));
    }
    let mut seen = Vec::new();
    for task in tasks {
        seen.push(task.await.unwrap());
    }
    seen.sort();

    // Every call observed a distinct predecessor state
    assert_eq!(seen, (1..=100).collect::<Vec<u32>>());
    assert_eq!(snapshot(&registry, "kitchen").await.bumps, 100);
}

#[tokio::test(start_paused = true)]
async fn test_different_keys_persist_in_parallel() {
    let store = Arc::new(FlakyStore::new(Arc::new(InMemoryStateStore::new())));
    store.set_save_delay(Duration::from_millis(100));
    let registry = registry_with(store.clone(), None);
    let (a, b) = ("a".to_string(), "b".to_string());

    let started = Instant::now();
    let (first, second) = tokio::join!(
        registry.ask(&a, AlarmAction::Bump),
        registry.ask(&b, AlarmAction::Bump)
    );
    first.unwrap();
    second.unwrap();
    assert!(started.elapsed() < Duration::from_millis(150));

    let started = Instant::now();
    let (first, second) = tokio::join!(
        registry.ask(&a, AlarmAction::Bump),
        registry.ask(&a, AlarmAction::Bump)
    );
    first.unwrap();
    second.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(store.save_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_reminder_is_delivered_through_the_mailbox() {
    let registry = registry();
    let key = "hall".to_string();
    registry
        .ask(
            &key,
            AlarmAction::Arm {
                due: Duration::from_secs(10),
                period: Duration::ZERO,
            },
        )
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(snapshot(&registry, "hall").await.rings, 1);
    // One-shot reminders are forgotten once delivered
    assert_eq!(registry.timers().armed_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_disarmed_reminder_stops_ringing() {
    let registry = registry();
    let key = "porch".to_string();
    registry
        .ask(
            &key,
            AlarmAction::Arm {
                due: Duration::from_secs(10),
                period: Duration::from_secs(10),
            },
        )
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(snapshot(&registry, "porch").await.rings, 2);

    registry.ask(&key, AlarmAction::Disarm).await.unwrap();
    // Disarming twice is harmless
    registry.ask(&key, AlarmAction::Disarm).await.unwrap();

    tokio::time::sleep(Duration::from_secs(100)).await;
    assert_eq!(snapshot(&registry, "porch").await.rings, 2);
}

#[tokio::test(start_paused = true)]
async fn test_reminder_reactivates_evicted_actor() {
    let store: Arc<InMemoryStateStore> = Arc::new(InMemoryStateStore::new());
    let registry = registry_with(store.clone(), Some(Duration::from_secs(1)));
    let key = "cellar".to_string();
    registry
        .ask(
            &key,
            AlarmAction::Arm {
                due: Duration::from_secs(60),
                period: Duration::ZERO,
            },
        )
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!registry.is_active(&key));

    tokio::time::sleep(Duration::from_secs(60)).await;
    let stored = store.load("alarm/cellar").await.unwrap().unwrap();
    assert_eq!(stored.state["rings"].as_u64(), Some(1));
}

#[tokio::test]
async fn test_failed_hydration_is_retried_on_next_call() {
    let store = Arc::new(FlakyStore::new(Arc::new(InMemoryStateStore::new())));
    let registry = registry_with(store.clone(), None);
    let key = "attic".to_string();
    registry.ask(&key, AlarmAction::Bump).await.unwrap();
    registry.shutdown().await;

    let registry = registry_with(store.clone(), None);
    store.fail_next_loads(1);
    let err = registry.ask(&key, AlarmAction::Snapshot).await.unwrap_err();
    assert!(matches!(err, AlarmError(FrameworkError::Persistence(_))));

    // The failed activation retired itself; the next call hydrates afresh
    assert_eq!(snapshot(&registry, "attic").await.bumps, 1);
}

#[tokio::test]
async fn test_failed_save_leaves_state_untouched() {
    let store = Arc::new(FlakyStore::new(Arc::new(InMemoryStateStore::new())));
    let registry = registry_with(store.clone(), None);
    let key = "garage".to_string();

    store.fail_next_saves(1);
    assert!(registry.ask(&key, AlarmAction::Bump).await.is_err());
    assert_eq!(snapshot(&registry, "garage").await.bumps, 0);

    assert_eq!(registry.ask(&key, AlarmAction::Bump).await.unwrap().bumps, 1);
}

#[tokio::test(start_paused = true)]
async fn test_tick_is_redelivered_when_reactivation_fails() {
    let store = Arc::new(FlakyStore::new(Arc::new(InMemoryStateStore::new())));
    let registry = registry_with(store.clone(), Some(Duration::from_secs(1)));
    let key = "shed".to_string();
    registry
        .ask(
            &key,
            AlarmAction::Arm {
                due: Duration::from_secs(60),
                period: Duration::ZERO,
            },
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!registry.is_active(&key));

    // The tick reactivates the key, and that first load fails
    store.fail_next_loads(1);
    tokio::time::sleep(Duration::from_secs(60)).await;

    let stored = store.load("alarm/shed").await.unwrap().unwrap();
    assert_eq!(stored.state["rings"].as_u64(), Some(1));
    assert_eq!(registry.timers().armed_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_activate_persisted_waits_and_retries() {
    let store = Arc::new(FlakyStore::new(Arc::new(InMemoryStateStore::new())));
    let registry = registry_with(store.clone(), None);
    registry.ask(&"den".to_string(), AlarmAction::Bump).await.unwrap();
    registry.shutdown().await;

    let registry = registry_with(store.clone(), None);
    store.fail_next_loads(1);
    let report = registry.activate_persisted().await.unwrap();
    assert_eq!(report.activated, 1);
    assert!(report.failed.is_empty());
    assert!(registry.is_active(&"den".to_string()));
    registry.shutdown().await;

    let registry = registry_with(store.clone(), None);
    store.fail_next_loads(10);
    let report = registry.activate_persisted().await.unwrap();
    assert_eq!(report.activated, 0);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "den");
    assert!(matches!(report.failed[0].1, FrameworkError::Persistence(_)));
}
