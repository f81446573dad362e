use std::time::Duration;

use riserva::{DataType, ProviderKey, Riserva, Source};
use riserva_mock::MockBehavior;

use crate::helpers::{AAPL, MSFT, cached, quote, scripted, seed};

#[tokio::test]
async fn fresh_entry_is_served_without_provider_calls() {
    let (p, ctl) = scripted("p1", &[DataType::Quote]);
    ctl.set(DataType::Quote, AAPL, MockBehavior::Return(quote(AAPL, 2.0)))
        .await;
    let riserva = Riserva::builder()
        .with_provider(p)
        .ttl(DataType::Quote, Duration::from_secs(60))
        .build()
        .unwrap();
    let seeded = seed(
        &riserva,
        "p1",
        AAPL,
        DataType::Quote,
        quote(AAPL, 1.0),
        Duration::from_secs(10),
    )
    .await;

    let res = riserva.resolve("aapl", DataType::Quote).await.unwrap();
    assert_eq!(res.source, Source::Cache);
    assert!(!res.stale);
    assert_eq!(res.payload["price"], 1.0);
    assert_eq!(res.last_updated, Some(seeded.last_updated));
    assert_eq!(res.key.symbol(), AAPL);
    assert_eq!(ctl.calls().await, 0);
}

#[tokio::test]
async fn expired_entry_is_revalidated() {
    let (p, ctl) = scripted("p1", &[DataType::Quote]);
    ctl.set(DataType::Quote, AAPL, MockBehavior::Return(quote(AAPL, 2.0)))
        .await;
    let riserva = Riserva::builder()
        .with_provider(p)
        .ttl(DataType::Quote, Duration::from_secs(60))
        .build()
        .unwrap();
    seed(
        &riserva,
        "p1",
        AAPL,
        DataType::Quote,
        quote(AAPL, 1.0),
        Duration::from_secs(61),
    )
    .await;

    let res = riserva.resolve(AAPL, DataType::Quote).await.unwrap();
    assert_eq!(res.source, Source::Provider(ProviderKey::new("p1")));
    assert_eq!(res.payload["price"], 2.0);
    assert_eq!(ctl.fetches_for(AAPL).await, 1);

    let entry = cached(&riserva, AAPL, DataType::Quote).await.unwrap();
    assert_eq!(entry.payload["price"], 2.0);
    assert_eq!(Some(entry.last_updated), res.last_updated);
}

#[tokio::test]
async fn default_ttl_applies_without_override() {
    let (p, ctl) = scripted("p1", &[DataType::Profile]);
    let riserva = Riserva::builder().with_provider(p).build().unwrap();
    // profiles stay fresh for a day by default
    seed(
        &riserva,
        "p1",
        MSFT,
        DataType::Profile,
        serde_json::json!({"name": "Microsoft"}),
        Duration::from_secs(6 * 60 * 60),
    )
    .await;

    let res = riserva.resolve(MSFT, DataType::Profile).await.unwrap();
    assert_eq!(res.source, Source::Cache);
    assert!(!res.stale);
    assert_eq!(ctl.calls().await, 0);
}

#[tokio::test]
async fn synthetic_entries_are_never_fresh() {
    let (p, ctl) = scripted("p1", &[DataType::Quote]);
    ctl.set(DataType::Quote, AAPL, MockBehavior::Return(quote(AAPL, 3.0)))
        .await;
    let riserva = Riserva::builder().with_provider(p).build().unwrap();

    let key = riserva::CacheKey::new(AAPL, DataType::Quote).unwrap();
    riserva
        .store()
        .put(riserva::CacheEntry::new(
            key,
            quote(AAPL, 0.5),
            Source::Synthetic,
        ))
        .await
        .unwrap();

    let res = riserva.resolve(AAPL, DataType::Quote).await.unwrap();
    assert_eq!(res.payload["price"], 3.0);
    assert_eq!(ctl.calls().await, 1);
}

#[tokio::test]
async fn refresh_bypasses_freshness() {
    let (p, ctl) = scripted("p1", &[DataType::Quote]);
    ctl.set(DataType::Quote, AAPL, MockBehavior::Return(quote(AAPL, 5.0)))
        .await;
    let riserva = Riserva::builder().with_provider(p).build().unwrap();
    seed(
        &riserva,
        "p1",
        AAPL,
        DataType::Quote,
        quote(AAPL, 4.0),
        Duration::from_secs(1),
    )
    .await;

    let res = riserva.refresh(AAPL, DataType::Quote).await.unwrap();
    assert_eq!(res.payload["price"], 5.0);
    assert!(!res.stale);
    assert_eq!(ctl.calls().await, 1);
}

#[tokio::test]
async fn refresh_keeps_a_fresh_entry_when_providers_fail() {
    let (p, ctl) = scripted("p1", &[DataType::Quote]);
    ctl.set(
        DataType::Quote,
        AAPL,
        MockBehavior::Fail(riserva::RiservaError::connector("p1", "503")),
    )
    .await;
    let riserva = Riserva::builder().with_provider(p).build().unwrap();
    seed(
        &riserva,
        "p1",
        AAPL,
        DataType::Quote,
        quote(AAPL, 4.0),
        Duration::from_secs(1),
    )
    .await;

    let res = riserva.refresh(AAPL, DataType::Quote).await.unwrap();
    assert_eq!(res.source, Source::Cache);
    assert_eq!(res.payload["price"], 4.0);
    // the entry is still within its TTL
    assert!(!res.stale);
    assert_eq!(res.warnings.len(), 1);
}

#[tokio::test]
async fn repeated_writes_leave_one_entry_with_the_latest_timestamp() {
    let (p, ctl) = scripted("p1", &[DataType::Quote]);
    ctl.set(DataType::Quote, AAPL, MockBehavior::Return(quote(AAPL, 1.0)))
        .await;
    let store = std::sync::Arc::new(riserva::MemoryCacheStore::new(100));
    let riserva = Riserva::builder()
        .with_provider(p)
        .with_store(store.clone())
        .build()
        .unwrap();

    let first = riserva.refresh(AAPL, DataType::Quote).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = riserva.refresh(AAPL, DataType::Quote).await.unwrap();
    assert!(second.last_updated > first.last_updated);

    store.sync().await;
    assert_eq!(store.entry_count(), 1);
    let entry = cached(&riserva, AAPL, DataType::Quote).await.unwrap();
    assert_eq!(Some(entry.last_updated), second.last_updated);
}
