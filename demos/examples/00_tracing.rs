use riserva::{DataType, Riserva};
use riserva_demos::common::get_provider;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize a human-friendly tracing subscriber with env-based filtering.
    // Suggested: RUST_LOG=info,riserva=debug,riserva_http=debug
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .try_init();

    let riserva = Riserva::builder().with_provider(get_provider()).build()?;

    // Cold read, then a cache hit.
    let _ = riserva.resolve("AAPL", DataType::Quote).await?;
    let _ = riserva.resolve("AAPL", DataType::Quote).await?;

    // A small batch.
    let out = riserva
        .batch()
        .symbols(["AAPL", "MSFT"])
        .data_types(&[DataType::Quote, DataType::Profile])
        .run()
        .await?;
    tracing::info!(metrics = ?out.metrics, "batch done");

    Ok(())
}
