use std::sync::Arc;

use detour_adapters::{FailingStorageArea, MemoryStorage, SqliteStorage};
use detour_core::{
    AreaId, ChangeFeed, ConfigStore, Reconciled, Rule, StorageArea, StorageAreas, StoreError,
    METRICS_KEY, RULES_KEY, SETTINGS_KEY,
};
use futures::StreamExt;
use serde_json::json;

fn synced_areas(storage: &MemoryStorage) -> StorageAreas {
    let sync: Arc<dyn StorageArea> = Arc::new(storage.area(AreaId::Sync));
    let local: Arc<dyn StorageArea> = Arc::new(storage.area(AreaId::Local));
    StorageAreas::resolve(Some(sync), local)
}

#[tokio::test]
async fn settings_written_by_one_instance_reach_the_other() {
    let storage = MemoryStorage::new();
    let mut first = ConfigStore::open(synced_areas(&storage)).await;
    let mut second = ConfigStore::open(synced_areas(&storage)).await;
    let mut changes = storage.subscribe();

    first.set_hourly_rate("45").await.unwrap();

    let change = changes.next().await.unwrap();
    assert_eq!(change.key, SETTINGS_KEY);
    assert_eq!(second.handle_change(&change), Some(Reconciled::Settings));
    assert_eq!(second.settings().hourly_rate, Some(45.0));
}

#[tokio::test]
async fn metrics_written_by_the_redirect_engine_are_reconciled() {
    let storage = MemoryStorage::new();
    let mut store = ConfigStore::open(synced_areas(&storage)).await;
    let mut changes = storage.subscribe();

    storage
        .area(AreaId::Local)
        .set(
            METRICS_KEY,
            json!({ "total_redirects": 4, "per_rule": { "r1": 4 } }),
        )
        .await
        .unwrap();

    let change = changes.next().await.unwrap();
    assert_eq!(store.handle_change(&change), Some(Reconciled::Metrics));
    assert_eq!(store.metrics().count_for("r1"), 4);
    assert_eq!(store.savings().duration_label(), "1h 10m");
}

#[tokio::test]
async fn rules_from_another_instance_wait_for_reload() {
    let storage = MemoryStorage::new();
    let mut first = ConfigStore::open(synced_areas(&storage)).await;
    let mut second = ConfigStore::open(synced_areas(&storage)).await;
    let mut changes = storage.subscribe();

    let rule = first
        .add_rule("news.example.com", "https://docs.example.com/")
        .await
        .unwrap();

    let change = changes.next().await.unwrap();
    assert_eq!(change.key, RULES_KEY);
    assert_eq!(second.handle_change(&change), None);
    assert!(second.rules().is_empty());

    second.load_rules().await;
    assert_eq!(second.rules(), &[rule]);
}

#[tokio::test]
async fn concurrent_rule_edits_resolve_to_the_last_write() {
    let storage = MemoryStorage::new();
    let mut first = ConfigStore::open(synced_areas(&storage)).await;
    let mut second = ConfigStore::open(synced_areas(&storage)).await;

    first
        .add_rule("a.example.com", "https://b.example.com")
        .await
        .unwrap();
    let kept = second
        .add_rule("c.example.com", "https://d.example.com")
        .await
        .unwrap();

    let stored = storage.value(AreaId::Sync, RULES_KEY).unwrap();
    assert_eq!(Rule::list_from_stored(&stored), vec![kept]);
}

#[tokio::test]
async fn end_to_end_rule_metrics_and_rate() {
    let storage = MemoryStorage::new();
    let mut store = ConfigStore::open(synced_areas(&storage)).await;
    let mut changes = storage.subscribe();

    let rule = store
        .add_rule("Video.Example.com", "https://focus.example.com/start")
        .await
        .unwrap();
    assert_eq!(rule.source_hostname, "video.example.com");
    store.set_hourly_rate("20").await.unwrap();

    storage
        .area(AreaId::Local)
        .set(
            METRICS_KEY,
            json!({ "total_redirects": 4, "per_rule": { rule.id.clone(): 4 } }),
        )
        .await
        .unwrap();

    while let Some(change) = changes.next().await {
        if store.handle_change(&change) == Some(Reconciled::Metrics) {
            break;
        }
    }

    let savings = store.rule_savings(&rule.id);
    assert_eq!(savings.minutes, 70.0);
    assert_eq!(savings.money_label(), "$23.33");
}

#[tokio::test]
async fn unavailable_sync_area_falls_back_to_defaults_and_reports_writes() {
    let sync: Arc<dyn StorageArea> = Arc::new(FailingStorageArea::unavailable(AreaId::Sync));
    let local: Arc<dyn StorageArea> = Arc::new(MemoryStorage::new().area(AreaId::Local));
    let mut store = ConfigStore::open(StorageAreas::resolve(Some(sync), local)).await;

    assert!(store.rules().is_empty());
    assert_eq!(store.settings().hourly_rate, None);

    let result = store.set_hourly_rate("30").await;

    assert!(matches!(result, Err(StoreError::Persist(_))));
    assert_eq!(store.settings().hourly_rate, Some(30.0));
}

#[tokio::test]
async fn sqlite_backed_stores_share_rules_across_handles() {
    let storage = SqliteStorage::in_memory().unwrap();
    let areas = || {
        let sync: Arc<dyn StorageArea> = Arc::new(storage.area(AreaId::Sync));
        let local: Arc<dyn StorageArea> = Arc::new(storage.area(AreaId::Local));
        StorageAreas::resolve(Some(sync), local)
    };
    let mut writer = ConfigStore::open(areas()).await;

    let rule = writer
        .add_rule("a.example.com", "https://b.example.com/")
        .await
        .unwrap();
    writer.set_rule_enabled(&rule.id, false).await.unwrap();

    let reader = ConfigStore::open(areas()).await;
    assert_eq!(reader.rules().len(), 1);
    assert!(!reader.rules()[0].enabled);
}

#[tokio::test]
async fn rejected_write_keeps_the_in_process_change() {
    let sync: Arc<dyn StorageArea> = Arc::new(FailingStorageArea::read_only(AreaId::Sync));
    let local: Arc<dyn StorageArea> = Arc::new(MemoryStorage::new().area(AreaId::Local));
    let mut store = ConfigStore::open(StorageAreas::resolve(Some(sync), local)).await;

    let added = store
        .add_rule("a.example.com", "https://b.example.com/")
        .await;
    let rated = store.set_hourly_rate("15").await;

    assert!(matches!(added, Err(StoreError::Persist(_))));
    assert!(matches!(rated, Err(StoreError::Persist(_))));
    assert_eq!(store.rules().len(), 1);
    assert_eq!(store.rules()[0].source_hostname, "a.example.com");
    assert_eq!(store.settings().hourly_rate, Some(15.0));
}

#[tokio::test]
async fn unreadable_area_still_accepts_writes() {
    let sync: Arc<dyn StorageArea> = Arc::new(FailingStorageArea::write_only(AreaId::Sync));
    let local: Arc<dyn StorageArea> = Arc::new(MemoryStorage::new().area(AreaId::Local));
    let mut store = ConfigStore::open(StorageAreas::resolve(Some(sync), local)).await;

    assert!(store.rules().is_empty());
    assert_eq!(store.settings().hourly_rate, None);

    assert_eq!(store.set_hourly_rate("12.5").await.unwrap(), Some(12.5));
    let rule = store
        .add_rule("a.example.com", "https://b.example.com/")
        .await
        .unwrap();
    assert_eq!(store.rules(), &[rule]);
}

#[tokio::test]
async fn rules_stored_without_ids_keep_their_minted_id_across_opens() {
    let storage = SqliteStorage::in_memory().unwrap();
    storage
        .area(AreaId::Sync)
        .set(
            RULES_KEY,
            json!([{
                "enabled": true,
                "source_hostname": "a.example.com",
                "target_url": "https://b.example.com/"
            }]),
        )
        .await
        .unwrap();
    let areas = || {
        let sync: Arc<dyn StorageArea> = Arc::new(storage.area(AreaId::Sync));
        let local: Arc<dyn StorageArea> = Arc::new(storage.area(AreaId::Local));
        StorageAreas::resolve(Some(sync), local)
    };

    let listed = ConfigStore::open(areas()).await.rules()[0].id.clone();
    let mut next = ConfigStore::open(areas()).await;

    assert_eq!(next.rules()[0].id, listed);
    assert!(next.delete_rule(&listed).await.is_ok());
}
