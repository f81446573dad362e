use std::sync::Arc;

use riserva::{DataType, ProviderKey, Riserva, RiservaError, Source};
use riserva_mock::MockBehavior;

use crate::helpers::{AAPL, FailingStore, quote, scripted};

#[tokio::test]
async fn unavailable_store_degrades_to_a_miss() {
    let (a, ca) = scripted("a", &[DataType::Quote]);
    ca.set(DataType::Quote, AAPL, MockBehavior::Return(quote(AAPL, 3.0)))
        .await;
    let riserva = Riserva::builder()
        .with_provider(a)
        .with_store(Arc::new(FailingStore))
        .build()
        .unwrap();

    let res = riserva.resolve(AAPL, DataType::Quote).await.unwrap();
    assert_eq!(res.source, Source::Provider(ProviderKey::new("a")));
    assert_eq!(res.payload["price"], 3.0);

    // nothing was written, so the next call goes upstream again
    riserva.resolve(AAPL, DataType::Quote).await.unwrap();
    assert_eq!(ca.calls().await, 2);
}

#[tokio::test]
async fn unavailable_store_cannot_serve_stale() {
    let (a, ca) = scripted("a", &[DataType::Quote]);
    ca.set_default(
        DataType::Quote,
        MockBehavior::Fail(RiservaError::connector("a", "down")),
    )
    .await;
    let riserva = Riserva::builder()
        .with_provider(a)
        .with_store(Arc::new(FailingStore))
        .build()
        .unwrap();

    let res = riserva.resolve(AAPL, DataType::Quote).await.unwrap();
    assert_eq!(res.source, Source::Synthetic);
}
