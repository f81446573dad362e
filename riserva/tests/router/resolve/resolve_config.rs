use std::sync::Arc;

use riserva::{DataType, DataTypeConfig, Provider, Riserva, RiservaConfig, RiservaError};
use riserva_mock::{MockBehavior, MockProvider};
use tokio_test::assert_ok;

use crate::helpers::{AAPL, quote, scripted};

#[test]
fn build_requires_a_provider() {
    let err = Riserva::builder().build().err().unwrap();
    assert!(matches!(err, RiservaError::InvalidArg(_)));
}

#[test]
fn build_rejects_zero_concurrency() {
    let (a, _) = scripted("a", &[DataType::Quote]);
    let err = Riserva::builder()
        .with_provider(a)
        .max_concurrency(0)
        .build()
        .err()
        .unwrap();
    assert!(err.is_configuration());
}

#[test]
fn unknown_provider_in_order_fails_build() {
    let (a, _) = scripted("a", &[DataType::Quote]);
    let mut cfg = RiservaConfig::default();
    cfg.data_types.insert(
        DataType::Quote,
        DataTypeConfig {
            provider_order: vec!["a".into(), "ghost".into()],
            ..DataTypeConfig::default()
        },
    );
    let err = Riserva::builder().with_provider(a).config(cfg).build().err().unwrap();
    assert!(matches!(err, RiservaError::UnknownProvider { ref provider } if provider == "ghost"));
}

#[test]
fn provider_that_does_not_serve_the_type_fails_build() {
    let (a, _) = scripted("a", &[DataType::Quote]);
    let (news, _) = scripted("news", &[DataType::News]);
    let err = Riserva::builder()
        .with_provider(a)
        .with_provider(news.clone())
        .prefer_for(DataType::Quote, &[news])
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, RiservaError::Configuration(_)));
}

#[tokio::test]
async fn empty_chain_is_a_configuration_error() {
    let (a, ca) = scripted("a", &[DataType::Quote]);
    let riserva = Riserva::builder().with_provider(a).build().unwrap();

    let err = riserva.resolve(AAPL, DataType::Sector).await.unwrap_err();
    assert!(matches!(err, RiservaError::EmptyProviderChain { ref data_type } if data_type == "sector"));
    assert!(err.is_configuration());
    assert_eq!(ca.calls().await, 0);
}

#[tokio::test]
async fn blank_symbol_is_rejected() {
    let (a, ca) = scripted("a", &[DataType::Quote]);
    let riserva = Riserva::builder().with_provider(a).build().unwrap();
    let err = riserva.resolve("   ", DataType::Quote).await.unwrap_err();
    assert!(matches!(err, RiservaError::InvalidArg(_)));
    assert_eq!(ca.calls().await, 0);
}

#[tokio::test]
async fn json_config_drives_the_chain() {
    let (a, ca) = scripted("a", &[DataType::Quote]);
    let (b, cb) = scripted("b", &[DataType::Quote]);
    ca.set_default(DataType::Quote, MockBehavior::Return(quote(AAPL, 1.0)))
        .await;
    cb.set_default(DataType::Quote, MockBehavior::Return(quote(AAPL, 2.0)))
        .await;

    let cfg: RiservaConfig = serde_json::from_value(serde_json::json!({
        "data_types": { "quote": { "ttl_ms": 60000, "provider_order": ["b"] } },
        "provider_timeout_ms": 250
    }))
    .unwrap();
    let riserva = Riserva::builder()
        .with_provider(a)
        .with_provider(b)
        .config(cfg)
        .build()
        .unwrap();
    assert_eq!(riserva.config().provider_timeout_ms, 250);
    assert_eq!(riserva.config().chunk_size, 10);

    let res = assert_ok!(riserva.resolve(AAPL, DataType::Quote).await);
    assert_eq!(res.payload["price"], 2.0);
    assert_eq!(ca.calls().await, 0);
}

#[tokio::test]
async fn fixture_mock_resolves_every_data_type() {
    let mock: Arc<dyn Provider> = Arc::new(MockProvider::new());
    let riserva = Riserva::builder().with_provider(mock).build().unwrap();
    for dt in DataType::ALL {
        let res = assert_ok!(riserva.resolve(AAPL, dt).await);
        assert!(!res.is_degraded(), "{dt} was degraded");
    }
}
