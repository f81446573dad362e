use std::sync::Arc;

use riserva::{BatchRequest, DataType, Provider, Riserva};
use riserva_mock::{MockBehavior, MockProvider};

use crate::helpers::{AAPL, GOOGL, MSFT, NVDA, TSLA, quote, scripted, scripted_batching};

#[tokio::test]
async fn multi_symbol_provider_gets_one_call_per_sub_chunk() {
    let (fmp, ctl) = scripted_batching("fmp", DataType::Quote, 2);
    ctl.set_default(DataType::Quote, MockBehavior::Return(quote("X", 1.0)))
        .await;
    let riserva = Riserva::builder().with_provider(fmp).build().unwrap();

    let out = riserva
        .batch()
        .symbols([AAPL, MSFT, NVDA, TSLA, GOOGL])
        .data_types(&[DataType::Quote])
        .chunk_size(5)
        .run()
        .await
        .unwrap();

    assert_eq!(
        ctl.batch_requests().await,
        vec![
            vec![AAPL.to_string(), MSFT.to_string()],
            vec![NVDA.to_string(), TSLA.to_string()],
            vec![GOOGL.to_string()],
        ]
    );
    assert_eq!(out.metrics.chunks, 1);
    assert_eq!(out.metrics.api_calls_made, 3);
    assert_eq!(out.metrics.api_calls_saved, 2);
    assert_eq!(out.metrics.total_data_points, 5);
}

#[tokio::test]
async fn request_chunk_size_overrides_configuration() {
    let (p, ctl) = scripted("p", &[DataType::Quote]);
    ctl.set_default(DataType::Quote, MockBehavior::Return(quote("X", 1.0)))
        .await;
    let riserva = Riserva::builder()
        .with_provider(p)
        .chunk_size(10)
        .build()
        .unwrap();

    let out = riserva
        .batch()
        .symbols([AAPL, MSFT, NVDA, TSLA, GOOGL])
        .data_types(&[DataType::Quote])
        .chunk_size(2)
        .run()
        .await
        .unwrap();
    assert_eq!(out.metrics.chunks, 3);
    // one call per symbol, nothing saved
    assert_eq!(out.metrics.api_calls_made, 5);
    assert_eq!(out.metrics.api_calls_saved, 0);
}

#[tokio::test]
async fn per_type_chunk_size_applies_between_request_and_global() {
    let mock: Arc<dyn Provider> = Arc::new(MockProvider::new());
    let riserva = Riserva::builder()
        .with_provider(mock)
        .chunk_size(10)
        .chunk_size_for(DataType::Profile, 1)
        .build()
        .unwrap();

    let out = riserva
        .resolve_batch(BatchRequest::new(
            [AAPL, MSFT, NVDA],
            [DataType::Quote, DataType::Profile],
        ))
        .await
        .unwrap();
    // one quote chunk, three profile chunks
    assert_eq!(out.metrics.chunks, 4);
    assert_eq!(out.metrics.api_calls_made, 4);
    assert_eq!(out.metrics.api_calls_saved, 2);
    assert_eq!(out.metrics.total_data_points, 6);
}

#[tokio::test]
async fn symbols_and_types_are_normalized() {
    let (p, ctl) = scripted("p", &[DataType::Quote]);
    ctl.set_default(DataType::Quote, MockBehavior::Return(quote("X", 1.0)))
        .await;
    let riserva = Riserva::builder().with_provider(p).build().unwrap();

    let out = riserva
        .batch()
        .symbols([" aapl", "AAPL", "", "msft "])
        .data_types(&[DataType::Quote, DataType::Quote])
        .run()
        .await
        .unwrap();
    assert_eq!(out.symbols, vec![AAPL, MSFT]);
    assert_eq!(out.metrics.symbols_requested, 2);
    assert_eq!(out.metrics.endpoints_requested, 1);
    assert_eq!(out.data[&DataType::Quote].len(), 2);
    assert_eq!(ctl.fetches_for(AAPL).await, 1);
}

#[tokio::test]
async fn empty_symbol_list_is_an_empty_result() {
    let (p, ctl) = scripted("p", &[DataType::Quote]);
    let riserva = Riserva::builder().with_provider(p).build().unwrap();

    let out = riserva
        .batch()
        .data_types(&[DataType::Quote])
        .run()
        .await
        .unwrap();
    assert!(out.symbols.is_empty());
    assert!(out.data[&DataType::Quote].is_empty());
    assert_eq!(out.metrics.chunks, 0);
    assert_eq!(ctl.calls().await, 0);
}

#[test]
fn builder_assembles_the_request() {
    let (p, _) = scripted("p", &[DataType::Quote]);
    let riserva = Riserva::builder().with_provider(p).build().unwrap();
    let b = riserva
        .batch()
        .symbols([AAPL])
        .add_symbol(MSFT)
        .data_types(&[DataType::Quote])
        .add_data_type(DataType::News)
        .chunk_size(7)
        .deadline(std::time::Duration::from_secs(2));
    let req = b.request();
    assert_eq!(req.symbols, vec![AAPL, MSFT]);
    assert_eq!(req.data_types, vec![DataType::Quote, DataType::News]);
    assert_eq!(req.chunk_size, Some(7));
    assert_eq!(req.deadline_ms, Some(2000));
}
