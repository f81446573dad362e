use std::sync::Arc;

use riserva::{BatchMetrics, DataType, Provider, ProviderKey, Riserva, Source};
use riserva_mock::MockProvider;

use crate::helpers::{AAPL, MSFT, NVDA};

fn mock_riserva() -> Riserva {
    let mock: Arc<dyn Provider> = Arc::new(MockProvider::new());
    Riserva::builder().with_provider(mock).build().unwrap()
}

#[tokio::test]
async fn metrics_count_points_errors_and_saved_calls() {
    let riserva = mock_riserva();
    let out = riserva
        .batch()
        .symbols([AAPL, MSFT, NVDA, "ZZZZ"])
        .data_types(&[DataType::Quote, DataType::Ratios])
        .run()
        .await
        .unwrap();

    assert_eq!(
        out.metrics,
        BatchMetrics {
            symbols_requested: 4,
            endpoints_requested: 2,
            total_data_points: 6,
            // one multi-symbol quote call, four single ratio calls
            api_calls_made: 5,
            api_calls_saved: 3,
            cache_hits: 0,
            stale_served: 0,
            errors: 2,
            chunks: 2,
            chunks_failed: 0,
        }
    );
    let missing = out.get(DataType::Quote, "ZZZZ").unwrap();
    assert!(missing.error.as_ref().unwrap().is_permanent());
    assert_eq!(
        out.get(DataType::Ratios, AAPL).unwrap().source,
        Some(Source::Provider(ProviderKey::new("riserva-mock")))
    );
}

#[tokio::test]
async fn second_batch_is_served_from_cache() {
    let riserva = mock_riserva();
    let run = || {
        riserva
            .batch()
            .symbols([AAPL, MSFT, NVDA, "ZZZZ"])
            .data_types(&[DataType::Quote, DataType::Ratios])
            .run()
    };
    run().await.unwrap();
    let out = run().await.unwrap();

    assert_eq!(out.metrics.cache_hits, 6);
    // only the unknown symbol goes upstream again
    assert_eq!(out.metrics.api_calls_made, 2);
    assert_eq!(out.metrics.api_calls_saved, 6);
}

#[tokio::test]
async fn result_serializes_with_kebab_case_statuses() {
    let riserva = mock_riserva();
    let out = riserva
        .batch()
        .symbols([AAPL, "ZZZZ"])
        .data_types(&[DataType::Quote])
        .run()
        .await
        .unwrap();
    let v = serde_json::to_value(&out).unwrap();
    assert_eq!(v["data"]["quote"]["AAPL"]["status"], "ok");
    assert_eq!(v["data"]["quote"]["ZZZZ"]["status"], "permanent-error");
    assert_eq!(v["metrics"]["symbols_requested"], 2);
}
