use std::time::Duration;

use riserva::{DataType, FetchStatus, ProviderKey, Riserva, RiservaError, Source};
use riserva_mock::MockBehavior;

use crate::helpers::{AAPL, MSFT, quote, scripted, scripted_batching, seed};

#[tokio::test]
async fn whole_call_quota_stops_the_walk_and_serves_stale() {
    let (a, ca) = scripted_batching("A", DataType::Quote, 10);
    let (b, cb) = scripted("B", &[DataType::Quote]);
    ca.fail_batches(DataType::Quote, RiservaError::quota_exceeded("A"))
        .await;
    cb.set_default(DataType::Quote, MockBehavior::Return(quote("X", 1.0)))
        .await;
    let riserva = Riserva::builder()
        .with_provider(a)
        .with_provider(b)
        .ttl(DataType::Quote, Duration::from_secs(60))
        .build()
        .unwrap();
    seed(
        &riserva,
        "A",
        AAPL,
        DataType::Quote,
        quote(AAPL, 150.0),
        Duration::from_secs(300),
    )
    .await;

    let out = riserva
        .batch()
        .symbols([AAPL, MSFT])
        .data_types(&[DataType::Quote])
        .run()
        .await
        .unwrap();

    let aapl = out.get(DataType::Quote, AAPL).unwrap();
    assert!(aapl.is_ok());
    assert!(aapl.stale);
    assert_eq!(aapl.source, Some(Source::Cache));
    assert_eq!(aapl.payload.as_ref().unwrap()["price"], 150.0);

    let msft = out.get(DataType::Quote, MSFT).unwrap();
    assert_eq!(msft.status, FetchStatus::QuotaExceeded);

    assert_eq!(cb.calls().await, 0);
    assert_eq!(out.metrics.stale_served, 1);
    assert_eq!(out.metrics.api_calls_made, 1);
}

#[tokio::test]
async fn per_symbol_quota_stops_only_that_symbol() {
    let (a, ca) = scripted_batching("A", DataType::Quote, 10);
    let (b, cb) = scripted("B", &[DataType::Quote]);
    // AAPL has no rule, so the multi-symbol answer omits it
    ca.set(
        DataType::Quote,
        MSFT,
        MockBehavior::Fail(RiservaError::quota_exceeded("A")),
    )
    .await;
    cb.set_default(DataType::Quote, MockBehavior::Return(quote(AAPL, 2.0)))
        .await;
    let riserva = Riserva::builder()
        .with_provider(a)
        .with_provider(b)
        .build()
        .unwrap();

    let out = riserva
        .batch()
        .symbols([AAPL, MSFT])
        .data_types(&[DataType::Quote])
        .run()
        .await
        .unwrap();

    let aapl = out.get(DataType::Quote, AAPL).unwrap();
    assert_eq!(aapl.source, Some(Source::Provider(ProviderKey::new("B"))));
    assert_eq!(
        out.get(DataType::Quote, MSFT).unwrap().status,
        FetchStatus::QuotaExceeded
    );
    assert_eq!(cb.fetches_for(AAPL).await, 1);
    assert_eq!(cb.fetches_for(MSFT).await, 0);
}

#[tokio::test]
async fn quota_from_a_single_call_spares_the_rest_of_the_chunk() {
    let (a, ca) = scripted("A", &[DataType::Quote]);
    ca.set(
        DataType::Quote,
        AAPL,
        MockBehavior::Fail(RiservaError::quota_exceeded("A")),
    )
    .await;
    ca.set_default(DataType::Quote, MockBehavior::Return(quote("X", 1.0)))
        .await;
    let riserva = Riserva::builder().with_provider(a).build().unwrap();

    let out = riserva
        .batch()
        .symbols([AAPL, MSFT])
        .data_types(&[DataType::Quote])
        .chunk_size(2)
        .run()
        .await
        .unwrap();

    assert_eq!(ca.fetches_for(MSFT).await, 0);
    assert!(out.cells().all(|(_, _, c)| c.status == FetchStatus::QuotaExceeded));
    assert_eq!(out.metrics.api_calls_made, 1);
}

#[tokio::test]
async fn fresh_cache_hits_skip_providers() {
    let (a, ca) = scripted("A", &[DataType::Quote]);
    ca.set_default(DataType::Quote, MockBehavior::Return(quote("X", 1.0)))
        .await;
    let riserva = Riserva::builder().with_provider(a).build().unwrap();
    seed(
        &riserva,
        "A",
        AAPL,
        DataType::Quote,
        quote(AAPL, 10.0),
        Duration::from_secs(1),
    )
    .await;

    let out = riserva
        .batch()
        .symbols([AAPL, MSFT])
        .data_types(&[DataType::Quote])
        .run()
        .await
        .unwrap();

    let aapl = out.get(DataType::Quote, AAPL).unwrap();
    assert_eq!(aapl.source, Some(Source::Cache));
    assert!(!aapl.stale);
    assert_eq!(ca.fetches_for(AAPL).await, 0);
    assert_eq!(ca.fetches_for(MSFT).await, 1);
    assert_eq!(out.metrics.cache_hits, 1);
}
