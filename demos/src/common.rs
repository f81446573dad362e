use std::sync::Arc;

use riserva::Provider;
use riserva_http::presets;

/// Set to use the fixture mock instead of live upstreams.
pub const USE_MOCK_ENV: &str = "RISERVA_DEMOS_USE_MOCK";

/// Return a provider for demos.
///
/// Uses the rate-limited FMP preset when `FMP_API_KEY` is set, and the fixture
/// mock otherwise or when `RISERVA_DEMOS_USE_MOCK` is set.
///
/// # Panics
/// Panics if the FMP preset fails to build.
#[must_use]
pub fn get_provider() -> Arc<dyn Provider> {
    match std::env::var("FMP_API_KEY") {
        Ok(key) if std::env::var(USE_MOCK_ENV).is_err() => presets::fmp(key)
            .build()
            .expect("fmp preset builds")
            .rate_limited()
            .build(),
        _ => {
            println!("--- (Using Mock Provider) ---");
            Arc::new(riserva_mock::MockProvider::new())
        }
    }
}
