use std::sync::Arc;
use std::time::Duration;

use riserva_core::Provider;
use riserva_middleware::ProviderBuilder;
use riserva_types::QuotaConfig;

use crate::HttpProvider;

const DEFAULT_BLACKLIST: Duration = Duration::from_secs(5 * 60);

impl HttpProvider {
    /// Returns an unconfigured middleware builder around this provider.
    ///
    /// Customize with the builder methods before calling `.build()`.
    #[must_use]
    pub fn into_middleware(self) -> ProviderBuilder {
        let raw: Arc<dyn Provider> = Arc::new(self);
        ProviderBuilder::new(raw)
    }

    /// Returns a builder enforcing the upstream plan budget locally and
    /// blacklisting the provider once the budget (or the upstream) says no.
    ///
    /// Uses the preset's [`quota_hint`](Self::quota_hint) when present and
    /// [`QuotaConfig::default`] otherwise.
    #[must_use]
    pub fn rate_limited(self) -> ProviderBuilder {
        let cfg = self.quota_hint().cloned().unwrap_or_default();
        self.into_middleware()
            .with_quota(&cfg)
            .with_blacklist(DEFAULT_BLACKLIST)
    }

    /// Like [`rate_limited`](Self::rate_limited) with an explicit budget.
    #[must_use]
    pub fn rate_limited_with(self, cfg: &QuotaConfig) -> ProviderBuilder {
        self.into_middleware()
            .with_quota(cfg)
            .with_blacklist(DEFAULT_BLACKLIST)
    }
}
