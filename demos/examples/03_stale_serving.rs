use std::sync::Arc;
use std::time::Duration;

use riserva::{DataType, Provider, ProviderBuilder, QuotaConfig, QuotaConsumptionStrategy, Riserva};
use riserva_mock::MockProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1) A provider with a budget of two calls a day, wrapped in quota and
    //    blacklist middleware.
    let raw: Arc<dyn Provider> = Arc::new(MockProvider::named("tight-budget"));
    let provider = ProviderBuilder::new(raw)
        .with_quota(&QuotaConfig {
            limit: 2,
            window: Duration::from_secs(24 * 60 * 60),
            strategy: QuotaConsumptionStrategy::Unit,
        })
        .with_blacklist(Duration::from_secs(60))
        .build();

    // 2) A zero TTL makes every cached value stale immediately.
    let riserva = Riserva::builder()
        .with_provider(provider)
        .ttl(DataType::Quote, Duration::ZERO)
        .build()?;

    // 3) Spend the budget: both calls reach the provider and fill the cache.
    for symbol in ["AAPL", "MSFT"] {
        let r = riserva.resolve(symbol, DataType::Quote).await?;
        println!("{symbol}: source={} stale={}", r.source, r.stale);
    }

    // 4) Over budget: the cached AAPL value is served stale instead of an error.
    let r = riserva.resolve("AAPL", DataType::Quote).await?;
    println!("AAPL again: source={} stale={} price={}", r.source, r.stale, r.payload["price"]);

    // 5) Never seen before and over budget: a synthetic payload, clearly tagged.
    let r = riserva.resolve("NVDA", DataType::Quote).await?;
    println!("NVDA: source={} stale={} synthetic={}", r.source, r.stale, r.payload["synthetic"]);

    Ok(())
}
