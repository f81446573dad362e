use std::sync::Arc;
use std::time::Duration;

use riserva::{DataType, FetchStatus, Provider, Riserva, RiservaError};
use riserva_mock::MockBehavior;

use crate::helpers::{AAPL, GaugeProvider, MSFT, NVDA, PanickingProvider, quote, scripted};

#[tokio::test]
async fn panicking_chunk_does_not_affect_its_siblings() {
    let p: Arc<dyn Provider> = Arc::new(PanickingProvider { trigger: "P3" });
    let riserva = Riserva::builder().with_provider(p).build().unwrap();

    let out = riserva
        .batch()
        .symbols(["P1", "P2", "P3", "P4", "P5", "P6"])
        .data_types(&[DataType::Quote])
        .chunk_size(2)
        .run()
        .await
        .unwrap();

    assert_eq!(out.metrics.chunks, 3);
    assert_eq!(out.metrics.chunks_failed, 1);
    for ok in ["P1", "P2", "P5", "P6"] {
        let cell = out.get(DataType::Quote, ok).unwrap();
        assert!(cell.is_ok(), "{ok}: {cell:?}");
        assert_eq!(cell.payload.as_ref().unwrap()["symbol"], ok);
    }
    for failed in ["P3", "P4"] {
        let cell = out.get(DataType::Quote, failed).unwrap();
        assert_eq!(cell.status, FetchStatus::TransientError);
        assert!(matches!(cell.error, Some(RiservaError::Other(_))));
    }
    assert_eq!(out.metrics.total_data_points, 4);
    assert_eq!(out.metrics.errors, 2);
}

#[tokio::test]
async fn configuration_error_on_any_type_fails_the_call() {
    let (p, ctl) = scripted("p", &[DataType::Quote]);
    let riserva = Riserva::builder().with_provider(p).build().unwrap();

    let err = riserva
        .batch()
        .symbols([AAPL])
        .data_types(&[DataType::Quote, DataType::News])
        .run()
        .await
        .unwrap_err();
    assert!(matches!(err, RiservaError::EmptyProviderChain { ref data_type } if data_type == "news"));
    assert_eq!(ctl.calls().await, 0);
}

#[tokio::test]
async fn deadline_abandons_pending_chunks_only() {
    let (p, ctl) = scripted("p", &[DataType::Quote, DataType::News]);
    ctl.set_default(DataType::Quote, MockBehavior::Return(quote("X", 1.0)))
        .await;
    ctl.set_default(
        DataType::News,
        MockBehavior::Return(serde_json::json!({"articles": []})),
    )
    .await;
    ctl.set(DataType::News, NVDA, MockBehavior::Hang).await;
    let riserva = Riserva::builder()
        .with_provider(p)
        .provider_timeout(Duration::from_secs(30))
        .build()
        .unwrap();

    let out = riserva
        .batch()
        .symbols([AAPL, NVDA])
        .data_types(&[DataType::Quote, DataType::News])
        .chunk_size(1)
        .deadline(Duration::from_millis(150))
        .run()
        .await
        .unwrap();

    let hung = out.get(DataType::News, NVDA).unwrap();
    assert_eq!(hung.status, FetchStatus::TransientError);
    assert!(matches!(hung.error, Some(RiservaError::RequestTimeout { ref data_type }) if data_type == "news"));
    assert!(out.get(DataType::News, AAPL).unwrap().is_ok());
    assert!(out.get(DataType::Quote, AAPL).unwrap().is_ok());
    assert!(out.get(DataType::Quote, NVDA).unwrap().is_ok());
    assert_eq!(out.metrics.chunks, 4);
    assert_eq!(out.metrics.chunks_failed, 1);
}

#[tokio::test]
async fn batches_do_not_synthesize() {
    let (p, ctl) = scripted("p", &[DataType::Quote]);
    ctl.set_default(
        DataType::Quote,
        MockBehavior::Fail(RiservaError::connector("p", "HTTP 500")),
    )
    .await;
    let riserva = Riserva::builder().with_provider(p).build().unwrap();

    let out = riserva
        .batch()
        .symbols([AAPL, MSFT])
        .data_types(&[DataType::Quote])
        .run()
        .await
        .unwrap();
    for (_, _, cell) in out.cells() {
        assert_eq!(cell.status, FetchStatus::TransientError);
        assert!(cell.payload.is_none());
        assert!(cell.source.is_none());
    }
    assert_eq!(out.metrics.errors, 2);
    assert_eq!(out.metrics.total_data_points, 0);
}

#[tokio::test]
async fn chunk_concurrency_is_bounded() {
    let gauge = Arc::new(GaugeProvider::default());
    let p: Arc<dyn Provider> = gauge.clone();
    let riserva = Riserva::builder()
        .with_provider(p)
        .max_concurrency(2)
        .build()
        .unwrap();

    let out = riserva
        .batch()
        .symbols(["S1", "S2", "S3", "S4", "S5", "S6"])
        .data_types(&[DataType::Quote])
        .chunk_size(1)
        .run()
        .await
        .unwrap();
    assert_eq!(out.metrics.total_data_points, 6);
    assert!(gauge.peak() <= 2, "peak {}", gauge.peak());
    assert!(gauge.peak() >= 1);
}
