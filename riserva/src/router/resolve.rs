use chrono::Utc;
use riserva_core::{
    CacheEntry, CacheKey, DataType, DataTypeSpec, Resolution, RiservaError, Source,
    is_empty_payload,
};

use crate::Riserva;
use crate::router::util::collapse_errors;

impl Riserva {
    /// Resolve one `(symbol, data_type)` key.
    ///
    /// Behavior and trade-offs:
    /// - A cache entry younger than the data type's TTL is returned without
    ///   contacting any provider.
    /// - Otherwise providers are tried one at a time, in chain order, each under
    ///   the provider timeout. The first non-empty payload is cached and returned.
    /// - Transient and permanent failures move on to the next provider; a quota
    ///   failure stops the chain at once so lower-priority budgets are not burnt.
    /// - When the chain is exhausted the last cached value is served with
    ///   `stale = true`, whatever its age. Without one, a synthetic payload is
    ///   generated (never cached) unless every failure was permanent.
    ///
    /// # Errors
    /// Returns a configuration error when `data_type` has no usable chain,
    /// `InvalidArg` for a blank symbol, and the collapsed provider errors when
    /// nothing can be served.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "riserva::resolve",
            skip(self),
            fields(symbol = %symbol, data_type = %data_type),
        )
    )]
    pub async fn resolve(
        &self,
        symbol: &str,
        data_type: DataType,
    ) -> Result<Resolution, RiservaError> {
        self.resolve_key(symbol, data_type, false).await
    }

    /// Resolve a key skipping the freshness check.
    ///
    /// Providers are always consulted first; the stale and synthetic fallbacks
    /// still apply when they all fail.
    ///
    /// # Errors
    /// Same as [`resolve`](Self::resolve).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "riserva::refresh",
            skip(self),
            fields(symbol = %symbol, data_type = %data_type),
        )
    )]
    pub async fn refresh(
        &self,
        symbol: &str,
        data_type: DataType,
    ) -> Result<Resolution, RiservaError> {
        self.resolve_key(symbol, data_type, true).await
    }

    async fn resolve_key(
        &self,
        symbol: &str,
        data_type: DataType,
        force: bool,
    ) -> Result<Resolution, RiservaError> {
        let spec = self.registry.spec(data_type)?;
        let key = CacheKey::new(symbol, data_type)?;

        let cached = self.cache_get(&key).await;
        if !force
            && let Some(entry) = &cached
            && is_fresh_hit(entry, spec)
        {
            #[cfg(feature = "tracing")]
            tracing::debug!(key = %key, "fresh cache hit");
            return Ok(Resolution {
                key,
                payload: entry.payload.clone(),
                source: Source::Cache,
                stale: false,
                last_updated: Some(entry.last_updated),
                warnings: vec![],
            });
        }

        let mut errors: Vec<RiservaError> = Vec::new();
        for p in &spec.chain {
            let res = Self::provider_call_with_timeout(
                p.name(),
                data_type.as_str(),
                self.cfg.provider_timeout(),
                p.fetch(key.symbol(), data_type),
            )
            .await;
            match res {
                Ok(payload) if !is_empty_payload(&payload) => {
                    let source = Source::Provider(p.key());
                    let entry = CacheEntry::new(key.clone(), payload, source.clone());
                    let last_updated = entry.last_updated;
                    let payload = entry.payload.clone();
                    self.cache_put(entry).await;
                    return Ok(Resolution {
                        key,
                        payload,
                        source,
                        stale: false,
                        last_updated: Some(last_updated),
                        warnings: errors,
                    });
                }
                Ok(_) => errors.push(RiservaError::Data(format!(
                    "{} returned an empty {data_type} payload for {}",
                    p.name(),
                    key.symbol()
                ))),
                Err(e) => {
                    let quota = e.is_quota();
                    #[cfg(feature = "tracing")]
                    tracing::debug!(provider = p.name(), error = %e, status = %e.status(), "provider attempt failed");
                    errors.push(e);
                    if quota {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(provider = p.name(), key = %key, "quota exhausted; skipping the rest of the chain");
                        break;
                    }
                }
            }
        }

        if let Some(entry) = cached {
            #[cfg(feature = "tracing")]
            tracing::warn!(key = %key, "serving stale cache entry");
            let stale = !is_fresh_hit(&entry, spec);
            return Ok(Resolution {
                key,
                payload: entry.payload,
                source: Source::Cache,
                stale,
                last_updated: Some(entry.last_updated),
                warnings: errors,
            });
        }

        if !self.cfg.synthetic_fallback || errors.iter().all(RiservaError::is_permanent) {
            let what = format!("{data_type} for {}", key.symbol());
            return Err(collapse_errors(data_type, errors, what));
        }

        #[cfg(feature = "tracing")]
        tracing::warn!(key = %key, "no live or cached value; serving synthetic payload");
        Ok(Resolution {
            payload: self.synthetic.generate(key.symbol(), data_type),
            key,
            source: Source::Synthetic,
            stale: true,
            last_updated: None,
            warnings: errors,
        })
    }
}

/// A cached entry that may be served as fresh: real data younger than the TTL.
pub(crate) fn is_fresh_hit(entry: &CacheEntry, spec: &DataTypeSpec) -> bool {
    entry.source != Source::Synthetic && entry.is_fresh(spec.ttl, Utc::now())
}
