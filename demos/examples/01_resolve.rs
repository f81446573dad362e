use riserva::{DataType, Riserva};
use riserva_demos::common::get_provider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Create a provider (mock in CI when RISERVA_DEMOS_USE_MOCK is set).
    let provider = get_provider();

    // 2. Build the resolver and register the provider.
    let riserva = Riserva::builder().with_provider(provider).build()?;

    // 3. Resolve a quote. The first call goes upstream and fills the cache.
    let first = riserva.resolve("AAPL", DataType::Quote).await?;
    println!("first:  source={} stale={}", first.source, first.stale);

    // 4. The second call is served from the cache while it is fresh.
    let second = riserva.resolve("AAPL", DataType::Quote).await?;
    println!("second: source={} stale={}", second.source, second.stale);

    println!("{}", serde_json::to_string_pretty(&second.payload)?);
    Ok(())
}
