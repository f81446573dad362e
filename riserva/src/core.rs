use std::sync::Arc;
use std::time::Duration;

use riserva_core::{
    CacheEntry, CacheKey, CacheStore, DataType, DataTypeConfig, DataTypeRegistry,
    MemoryCacheStore, Provider, RiservaConfig, RiservaError, SyntheticGenerator,
};
use tokio::sync::Semaphore;

/// Orchestrator that resolves `(symbol, data_type)` keys against the cache and
/// the registered providers.
pub struct Riserva {
    pub(crate) registry: DataTypeRegistry,
    pub(crate) store: Arc<dyn CacheStore>,
    pub(crate) synthetic: SyntheticGenerator,
    pub(crate) cfg: RiservaConfig,
    pub(crate) permits: Arc<Semaphore>,
}

/// Builder for constructing a `Riserva` orchestrator with custom configuration.
pub struct RiservaBuilder {
    providers: Vec<Arc<dyn Provider>>,
    store: Option<Arc<dyn CacheStore>>,
    cfg: RiservaConfig,
}

impl Default for RiservaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RiservaBuilder {
    /// Create a new builder with sensible defaults.
    ///
    /// Behavior and trade-offs:
    /// - Starts with no providers; you must register at least one via [`with_provider`](Self::with_provider).
    /// - Defaults: in-memory cache store, per data type TTLs from
    ///   [`DataType::default_ttl`], chunks of 10 symbols, 3 chunks in flight,
    ///   5s provider timeout, no batch deadline, synthetic fallback enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: vec![],
            store: None,
            cfg: RiservaConfig::default(),
        }
    }

    /// Register a provider.
    ///
    /// Behavior and trade-offs:
    /// - Registration order is the chain order for every data type without an
    ///   explicit `provider_order`.
    /// - Providers are looked up by [`Provider::name`]; registering two providers
    ///   under the same name makes the second unreachable from explicit orders.
    #[must_use]
    pub fn with_provider(mut self, p: Arc<dyn Provider>) -> Self {
        self.providers.push(p);
        self
    }

    /// Use `store` instead of the default in-memory store.
    ///
    /// Behavior and trade-offs:
    /// - The store is shared by every resolution and batch; it must tolerate
    ///   concurrent `get`/`put`.
    /// - Store failures never fail a resolution: reads degrade to a miss and
    ///   writes are dropped.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn CacheStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the whole configuration, e.g. one deserialized from JSON.
    ///
    /// Setters called afterwards adjust the replaced configuration.
    #[must_use]
    pub fn config(mut self, cfg: RiservaConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Set the provider chain for a data type using provider instances.
    ///
    /// Behavior and trade-offs:
    /// - The chain is made of exactly these providers, in order; registered
    ///   providers that are not listed are not consulted for `data_type`.
    /// - Every listed provider must also be registered with `with_provider` and
    ///   must support `data_type`, otherwise `build` fails.
    #[must_use]
    pub fn prefer_for(mut self, data_type: DataType, providers: &[Arc<dyn Provider>]) -> Self {
        self.data_type_cfg(data_type).provider_order =
            providers.iter().map(|p| p.name().to_string()).collect();
        self
    }

    /// Override the freshness threshold of a data type.
    #[must_use]
    pub fn ttl(mut self, data_type: DataType, ttl: Duration) -> Self {
        self.data_type_cfg(data_type).ttl_ms = Some(duration_ms(ttl));
        self
    }

    /// Override the batch chunk size of a data type.
    #[must_use]
    pub fn chunk_size_for(mut self, data_type: DataType, size: usize) -> Self {
        self.data_type_cfg(data_type).chunk_size = Some(size);
        self
    }

    /// Default number of symbols per batch chunk.
    ///
    /// Smaller chunks isolate failures better and keep upstream URLs short, at the
    /// cost of more multi-symbol calls.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.cfg.chunk_size = size;
        self
    }

    /// Timeout applied to every individual provider call.
    ///
    /// A timed out call is a transient failure and the chain moves on.
    #[must_use]
    pub fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.provider_timeout_ms = duration_ms(timeout);
        self
    }

    /// Maximum number of batch chunks in flight at once.
    #[must_use]
    pub const fn max_concurrency(mut self, n: usize) -> Self {
        self.cfg.max_concurrency = n;
        self
    }

    /// Overall deadline for batch calls; pending chunks are abandoned when it elapses.
    #[must_use]
    pub fn batch_deadline(mut self, deadline: Duration) -> Self {
        self.cfg.batch_deadline_ms = Some(duration_ms(deadline));
        self
    }

    /// Toggle the synthetic fallback of single-key resolution.
    ///
    /// Behavior and trade-offs:
    /// - Enabled: a key with no live value and no cache entry resolves to a
    ///   deterministic synthetic payload tagged `Source::Synthetic`.
    /// - Disabled: the collapsed provider errors are returned instead.
    #[must_use]
    pub const fn synthetic_fallback(mut self, yes: bool) -> Self {
        self.cfg.synthetic_fallback = yes;
        self
    }

    /// Capacity of the default in-memory store. Ignored with [`with_store`](Self::with_store).
    #[must_use]
    pub const fn cache_capacity(mut self, capacity: u64) -> Self {
        self.cfg.cache_capacity = capacity;
        self
    }

    fn data_type_cfg(&mut self, data_type: DataType) -> &mut DataTypeConfig {
        self.cfg.data_types.entry(data_type).or_default()
    }

    /// Build the `Riserva` orchestrator.
    ///
    /// Provider chains are resolved once here; requests never look providers up by name.
    ///
    /// # Errors
    /// Returns `InvalidArg` when no provider is registered, `UnknownProvider` or
    /// `Configuration` when a configured `provider_order` names an unregistered
    /// provider or one that does not serve the data type, and `Configuration`
    /// when `max_concurrency` is zero.
    pub fn build(self) -> Result<Riserva, RiservaError> {
        if self.providers.is_empty() {
            return Err(RiservaError::InvalidArg(
                "no providers registered; add at least one via with_provider(...)".to_string(),
            ));
        }
        if self.cfg.max_concurrency == 0 {
            return Err(RiservaError::Configuration(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        let registry = DataTypeRegistry::from_config(&self.providers, &self.cfg)?;
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryCacheStore::new(self.cfg.cache_capacity)));

        #[cfg(feature = "tracing")]
        tracing::debug!(
            providers = ?self.providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            store = store.name(),
            "riserva built"
        );

        Ok(Riserva {
            registry,
            store,
            synthetic: SyntheticGenerator::new(),
            permits: Arc::new(Semaphore::new(self.cfg.max_concurrency)),
            cfg: self.cfg,
        })
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Riserva {
    /// Start building an orchestrator.
    #[must_use]
    pub fn builder() -> RiservaBuilder {
        RiservaBuilder::new()
    }

    /// Effective configuration.
    #[must_use]
    pub const fn config(&self) -> &RiservaConfig {
        &self.cfg
    }

    /// Per data type chains resolved at build time.
    #[must_use]
    pub const fn registry(&self) -> &DataTypeRegistry {
        &self.registry
    }

    /// Shared cache store.
    #[must_use]
    pub fn store(&self) -> Arc<dyn CacheStore> {
        Arc::clone(&self.store)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "riserva::core::provider_call_with_timeout",
            skip(fut),
            fields(
                provider = provider_name,
                data_type = data_type,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            ),
        )
    )]
    pub(crate) async fn provider_call_with_timeout<T, Fut>(
        provider_name: &'static str,
        data_type: &'static str,
        timeout: Duration,
        fut: Fut,
    ) -> Result<T, RiservaError>
    where
        Fut: std::future::Future<Output = Result<T, RiservaError>>,
    {
        (tokio::time::timeout(timeout, fut).await)
            .unwrap_or_else(|_| Err(RiservaError::provider_timeout(provider_name, data_type)))
    }

    /// Read the cache, treating store failures as a miss.
    pub(crate) async fn cache_get(&self, key: &CacheKey) -> Option<CacheEntry> {
        match self.store.get(key).await {
            Ok(entry) => entry,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(key = %key, store = self.store.name(), error = %_e, "cache read failed; treating as miss");
                None
            }
        }
    }

    /// Write the cache, dropping store failures.
    pub(crate) async fn cache_put(&self, entry: CacheEntry) {
        #[cfg(feature = "tracing")]
        let key = entry.key.clone();
        if let Err(_e) = self.store.put(entry).await {
            #[cfg(feature = "tracing")]
            tracing::warn!(key = %key, store = self.store.name(), error = %_e, "cache write failed");
        }
    }
}
