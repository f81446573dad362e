use std::time::Duration;

use riserva::{DataType, FetchStatus, ProviderKey, Riserva, RiservaError, Source};
use riserva_mock::MockBehavior;

use crate::helpers::{AAPL, cached, quote, scripted};

#[tokio::test]
async fn transient_failure_falls_through_to_the_next_provider() {
    let (a, ca) = scripted("a", &[DataType::Quote]);
    let (b, cb) = scripted("b", &[DataType::Quote]);
    ca.set(
        DataType::Quote,
        AAPL,
        MockBehavior::Fail(RiservaError::connector("a", "HTTP 503")),
    )
    .await;
    cb.set(DataType::Quote, AAPL, MockBehavior::Return(quote(AAPL, 7.5)))
        .await;

    let riserva = Riserva::builder()
        .with_provider(a.clone())
        .with_provider(b.clone())
        .prefer_for(DataType::Quote, &[a, b])
        .build()
        .unwrap();

    let res = riserva.resolve(AAPL, DataType::Quote).await.unwrap();
    assert_eq!(res.payload, quote(AAPL, 7.5));
    assert_eq!(res.source, Source::Provider(ProviderKey::new("b")));
    assert!(!res.is_degraded());
    assert_eq!(res.warnings.len(), 1);
    assert_eq!(res.warnings[0].status(), FetchStatus::TransientError);

    let entry = cached(&riserva, AAPL, DataType::Quote).await.unwrap();
    assert_eq!(entry.source, Source::Provider(ProviderKey::new("b")));
    assert_eq!(entry.payload, quote(AAPL, 7.5));
}

#[tokio::test]
async fn chain_order_follows_configuration_not_registration() {
    let (a, ca) = scripted("a", &[DataType::Quote]);
    let (b, cb) = scripted("b", &[DataType::Quote]);
    ca.set_default(DataType::Quote, MockBehavior::Return(quote(AAPL, 1.0)))
        .await;
    cb.set_default(DataType::Quote, MockBehavior::Return(quote(AAPL, 2.0)))
        .await;

    let riserva = Riserva::builder()
        .with_provider(a.clone())
        .with_provider(b.clone())
        .prefer_for(DataType::Quote, &[b, a])
        .build()
        .unwrap();
    assert_eq!(
        riserva.registry().spec(DataType::Quote).unwrap().provider_names(),
        vec!["b", "a"]
    );

    let res = riserva.resolve(AAPL, DataType::Quote).await.unwrap();
    assert_eq!(res.payload["price"], 2.0);
    assert_eq!(ca.calls().await, 0);
}

#[tokio::test]
async fn permanent_failure_falls_through_as_well() {
    let (a, ca) = scripted("a", &[DataType::Ratios]);
    let (b, cb) = scripted("b", &[DataType::Ratios]);
    ca.set(
        DataType::Ratios,
        AAPL,
        MockBehavior::Fail(RiservaError::Data("unparseable".into())),
    )
    .await;
    cb.set(
        DataType::Ratios,
        AAPL,
        MockBehavior::Return(serde_json::json!({"pe_ratio": 30.1})),
    )
    .await;
    let riserva = Riserva::builder()
        .with_provider(a)
        .with_provider(b)
        .build()
        .unwrap();

    let res = riserva.resolve(AAPL, DataType::Ratios).await.unwrap();
    assert_eq!(res.payload["pe_ratio"], 30.1);
}

#[tokio::test]
async fn slow_provider_times_out_and_the_chain_proceeds() {
    let (a, ca) = scripted("a", &[DataType::Quote]);
    let (b, cb) = scripted("b", &[DataType::Quote]);
    ca.set(DataType::Quote, AAPL, MockBehavior::Hang).await;
    cb.set(DataType::Quote, AAPL, MockBehavior::Return(quote(AAPL, 9.0)))
        .await;
    let riserva = Riserva::builder()
        .with_provider(a)
        .with_provider(b)
        .provider_timeout(Duration::from_millis(50))
        .build()
        .unwrap();

    let res = riserva.resolve(AAPL, DataType::Quote).await.unwrap();
    assert_eq!(res.payload["price"], 9.0);
    assert!(matches!(
        &res.warnings[0],
        RiservaError::ProviderTimeout { connector, data_type } if connector == "a" && data_type == "quote"
    ));
}

#[tokio::test]
async fn empty_payload_is_not_success_and_never_cached() {
    let (a, ca) = scripted("a", &[DataType::Quote]);
    ca.set(DataType::Quote, AAPL, MockBehavior::Return(serde_json::Value::Null))
        .await;
    let riserva = Riserva::builder().with_provider(a).build().unwrap();

    let err = riserva.resolve(AAPL, DataType::Quote).await.unwrap_err();
    assert_eq!(err.status(), FetchStatus::PermanentError);
    assert!(cached(&riserva, AAPL, DataType::Quote).await.is_none());
}

#[tokio::test]
async fn empty_payload_falls_through_to_a_real_one() {
    let (a, ca) = scripted("a", &[DataType::News]);
    let (b, cb) = scripted("b", &[DataType::News]);
    ca.set(DataType::News, AAPL, MockBehavior::Return(serde_json::json!({})))
        .await;
    cb.set(
        DataType::News,
        AAPL,
        MockBehavior::Return(serde_json::json!({"articles": [{"title": "t"}]})),
    )
    .await;
    let riserva = Riserva::builder()
        .with_provider(a)
        .with_provider(b)
        .build()
        .unwrap();

    let res = riserva.resolve(AAPL, DataType::News).await.unwrap();
    assert_eq!(res.source, Source::Provider(ProviderKey::new("b")));
    assert!(matches!(res.warnings[0], RiservaError::Data(_)));
}

#[tokio::test]
async fn quota_stops_the_chain() {
    let (a, ca) = scripted("a", &[DataType::Quote]);
    let (b, cb) = scripted("b", &[DataType::Quote]);
    ca.set(
        DataType::Quote,
        AAPL,
        MockBehavior::Fail(RiservaError::quota_exceeded("a")),
    )
    .await;
    cb.set(DataType::Quote, AAPL, MockBehavior::Return(quote(AAPL, 1.0)))
        .await;
    let riserva = Riserva::builder()
        .with_provider(a)
        .with_provider(b)
        .build()
        .unwrap();

    let res = riserva.resolve(AAPL, DataType::Quote).await.unwrap();
    assert_eq!(cb.calls().await, 0);
    assert_ne!(res.source, Source::Provider(ProviderKey::new("b")));
    assert_eq!(res.source, Source::Synthetic);
    assert!(res.warnings[0].is_quota());
}

#[tokio::test]
async fn all_not_found_without_cache_is_surfaced() {
    // neither provider has a rule for the symbol, so both answer not found
    let (a, _ca) = scripted("a", &[DataType::Profile]);
    let (b, _cb) = scripted("b", &[DataType::Profile]);
    let riserva = Riserva::builder()
        .with_provider(a)
        .with_provider(b)
        .build()
        .unwrap();

    let err = riserva.resolve("zzzz", DataType::Profile).await.unwrap_err();
    match err {
        RiservaError::NotFound { what } => assert_eq!(what, "profile for ZZZZ"),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn all_timeouts_collapse_into_one_error_when_synthesis_is_off() {
    let (a, ca) = scripted("a", &[DataType::Quote]);
    let (b, cb) = scripted("b", &[DataType::Quote]);
    ca.set_default(DataType::Quote, MockBehavior::Hang).await;
    cb.set_default(DataType::Quote, MockBehavior::Hang).await;
    let riserva = Riserva::builder()
        .with_provider(a)
        .with_provider(b)
        .provider_timeout(Duration::from_millis(20))
        .synthetic_fallback(false)
        .build()
        .unwrap();

    let err = riserva.resolve(AAPL, DataType::Quote).await.unwrap_err();
    assert!(matches!(err, RiservaError::AllProvidersTimedOut { ref data_type } if data_type == "quote"));
    assert_eq!(err.status(), FetchStatus::TransientError);
}
