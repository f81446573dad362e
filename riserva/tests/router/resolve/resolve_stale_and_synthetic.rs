use std::time::Duration;

use riserva::{DataType, ProviderKey, Riserva, RiservaError, Source, SyntheticGenerator};
use riserva_mock::MockBehavior;

use crate::helpers::{AAPL, MSFT, NVDA, cached, quote, scripted, seed};

fn quote_chain() -> (
    Riserva,
    riserva_mock::DynamicMockController,
    riserva_mock::DynamicMockController,
) {
    let (a, ca) = scripted("A", &[DataType::Quote]);
    let (b, cb) = scripted("B", &[DataType::Quote]);
    let riserva = Riserva::builder()
        .with_provider(a.clone())
        .with_provider(b.clone())
        .prefer_for(DataType::Quote, &[a, b])
        .ttl(DataType::Quote, Duration::from_secs(60))
        .build()
        .unwrap();
    (riserva, ca, cb)
}

#[tokio::test]
async fn quota_on_first_provider_serves_the_stale_entry() {
    let (riserva, ca, cb) = quote_chain();
    ca.set_default(
        DataType::Quote,
        MockBehavior::Fail(RiservaError::QuotaExceeded {
            connector: "A".into(),
            remaining: 0,
            reset_in_ms: 60_000,
        }),
    )
    .await;
    cb.set_default(DataType::Quote, MockBehavior::Return(quote(AAPL, 99.0)))
        .await;
    let seeded = seed(
        &riserva,
        "A",
        AAPL,
        DataType::Quote,
        quote(AAPL, 180.0),
        Duration::from_secs(3600),
    )
    .await;

    let res = riserva.resolve(AAPL, DataType::Quote).await.unwrap();
    assert_eq!(res.source, Source::Cache);
    assert!(res.stale);
    assert!(res.is_degraded());
    assert_eq!(res.payload["price"], 180.0);
    assert_eq!(res.last_updated, Some(seeded.last_updated));
    assert_eq!(cb.calls().await, 0);
}

#[tokio::test]
async fn quota_on_first_provider_without_cache_is_synthetic() {
    let (riserva, ca, cb) = quote_chain();
    ca.set_default(
        DataType::Quote,
        MockBehavior::Fail(RiservaError::quota_exceeded("A")),
    )
    .await;
    cb.set_default(DataType::Quote, MockBehavior::Return(quote(MSFT, 99.0)))
        .await;

    let res = riserva.resolve(MSFT, DataType::Quote).await.unwrap();
    assert_eq!(res.source, Source::Synthetic);
    assert!(res.stale);
    assert_eq!(res.last_updated, None);
    assert_eq!(res.payload["synthetic"], true);
    assert_ne!(res.source, Source::Provider(ProviderKey::new("B")));
    assert_eq!(cb.calls().await, 0);
}

#[tokio::test]
async fn exhausted_chain_prefers_the_stale_entry() {
    let (riserva, ca, cb) = quote_chain();
    ca.set_default(
        DataType::Quote,
        MockBehavior::Fail(RiservaError::connector("A", "HTTP 502")),
    )
    .await;
    cb.set_default(
        DataType::Quote,
        MockBehavior::Fail(RiservaError::connector("B", "connection reset")),
    )
    .await;
    seed(
        &riserva,
        "B",
        NVDA,
        DataType::Quote,
        quote(NVDA, 120.0),
        Duration::from_secs(2 * 24 * 3600),
    )
    .await;

    let res = riserva.resolve(NVDA, DataType::Quote).await.unwrap();
    assert!(res.stale);
    assert_eq!(res.source, Source::Cache);
    assert_eq!(res.payload, quote(NVDA, 120.0));
    assert_eq!(res.warnings.len(), 2);
}

#[tokio::test]
async fn stale_entry_beats_permanent_errors() {
    let (riserva, ca, cb) = quote_chain();
    ca.set_default(DataType::Quote, MockBehavior::Fail(RiservaError::not_found("x")))
        .await;
    cb.set_default(DataType::Quote, MockBehavior::Fail(RiservaError::not_found("y")))
        .await;
    seed(
        &riserva,
        "A",
        AAPL,
        DataType::Quote,
        quote(AAPL, 1.0),
        Duration::from_secs(120),
    )
    .await;

    let res = riserva.resolve(AAPL, DataType::Quote).await.unwrap();
    assert!(res.stale);
    assert_eq!(res.payload["price"], 1.0);
}

#[tokio::test]
async fn synthetic_payloads_are_deterministic_and_not_cached() {
    let (riserva, ca, cb) = quote_chain();
    ca.set_default(
        DataType::Quote,
        MockBehavior::Fail(RiservaError::connector("A", "down")),
    )
    .await;
    cb.set_default(
        DataType::Quote,
        MockBehavior::Fail(RiservaError::connector("B", "down")),
    )
    .await;

    let first = riserva.resolve("ACME", DataType::Quote).await.unwrap();
    let second = riserva.resolve("acme", DataType::Quote).await.unwrap();
    assert_eq!(first.source, Source::Synthetic);
    assert_eq!(first.payload, second.payload);
    assert_eq!(first.payload["symbol"], "ACME");

    let (base, vol) = SyntheticGenerator::anchor("ACME");
    let price = first.payload["price"].as_f64().unwrap();
    assert!(price >= base * (1.0 - vol) - 0.01 && price <= base * (1.0 + vol) + 0.01);

    assert!(cached(&riserva, "ACME", DataType::Quote).await.is_none());
    // both calls walked the whole chain
    assert_eq!(ca.calls().await, 2);
    assert_eq!(cb.calls().await, 2);
}

#[tokio::test]
async fn synthesis_can_be_disabled() {
    let (a, ca) = scripted("A", &[DataType::Quote]);
    ca.set_default(
        DataType::Quote,
        MockBehavior::Fail(RiservaError::quota_exceeded("A")),
    )
    .await;
    let riserva = Riserva::builder()
        .with_provider(a)
        .synthetic_fallback(false)
        .build()
        .unwrap();

    let err = riserva.resolve(AAPL, DataType::Quote).await.unwrap_err();
    assert!(err.is_quota());
    assert_eq!(err.flatten().len(), 1);
}
