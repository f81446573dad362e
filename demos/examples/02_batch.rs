use std::time::Duration;

use riserva::{DataType, Riserva};
use riserva_demos::common::get_provider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let riserva = Riserva::builder()
        .with_provider(get_provider())
        .max_concurrency(2)
        .chunk_size_for(DataType::Profile, 10)
        .build()?;

    let out = riserva
        .batch()
        .symbols(["AAPL", "MSFT", "GOOGL", "NVDA", "TSLA", "NOPE"])
        .data_types(&[DataType::Quote, DataType::Profile, DataType::Ratios])
        .chunk_size(50)
        .deadline(Duration::from_secs(30))
        .run()
        .await?;

    for (data_type, symbol, outcome) in out.cells() {
        println!("{:>8} {symbol:<6} {}", data_type.to_string(), outcome.status);
    }
    println!("{:#?}", out.metrics);
    Ok(())
}
