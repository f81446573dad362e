use std::sync::Arc;

use riserva::{DataType, MiddlewareStack, Provider, ProviderBuilder, Riserva, RiservaConfig};
use riserva_mock::MockProvider;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Resolver settings as they would come from a config file.
    let cfg: RiservaConfig = serde_json::from_str(
        r#"{
            "data_types": {
                "quote": { "ttl_ms": 60000, "provider_order": ["primary", "secondary"] },
                "profile": { "provider_order": ["secondary"], "chunk_size": 10 }
            },
            "chunk_size": 25,
            "provider_timeout_ms": 3000,
            "max_concurrency": 4
        }"#,
    )?;

    // Middleware stack for the primary provider, also from JSON.
    let stack: MiddlewareStack = serde_json::from_str(
        r#"{ "layers": [
            { "name": "BlacklistingProvider", "config": { "default_duration_ms": 300000 } },
            { "name": "QuotaAwareProvider", "config": { "limit": 250, "window_ms": 86400000, "strategy": "Unit" } },
            { "name": "RawProvider", "config": { "name": "primary" } }
        ] }"#,
    )?;

    let raw: Arc<dyn Provider> = Arc::new(MockProvider::named("primary"));
    let primary = ProviderBuilder::from_stack(raw, &stack)?.build();
    let secondary: Arc<dyn Provider> = Arc::new(MockProvider::named("secondary"));

    let riserva = Riserva::builder()
        .with_provider(primary)
        .with_provider(secondary)
        .config(cfg)
        .build()?;

    for dt in [DataType::Quote, DataType::Profile] {
        let spec = riserva.registry().spec(dt)?;
        println!("{dt}: chain={:?} ttl={:?}", spec.provider_names(), spec.ttl);
    }

    let r = riserva.resolve("MSFT", DataType::Profile).await?;
    println!("MSFT profile from {}", r.source);
    Ok(())
}
