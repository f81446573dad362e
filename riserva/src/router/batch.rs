use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use riserva_core::{
    BatchMetrics, BatchRequest, BatchResult, CacheEntry, CacheKey, DataType, DataTypeSpec,
    FetchOutcome, Provider, RiservaError, Source, is_empty_payload,
};
use serde_json::Value;

use crate::Riserva;
use crate::router::resolve::is_fresh_hit;
use crate::router::util::{
    chunk_symbols, collapse_errors, dedup_data_types, join_until_deadline, normalize_symbols,
};

/// Builder to resolve many symbols across several data types in one call.
pub struct BatchBuilder<'a> {
    pub(crate) riserva: &'a Riserva,
    pub(crate) request: BatchRequest,
}

impl<'a> BatchBuilder<'a> {
    /// Create a new builder bound to a `Riserva` instance.
    ///
    /// Behavior:
    /// - Starts with no symbols and no data types.
    /// - Chunk size and deadline default to the orchestrator configuration.
    #[must_use]
    pub fn new(riserva: &'a Riserva) -> Self {
        Self {
            riserva,
            request: BatchRequest::default(),
        }
    }

    /// Replace the symbol list. Symbols are normalized and de-duplicated by `run`.
    #[must_use]
    pub fn symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.request.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    /// Append one symbol.
    #[must_use]
    pub fn add_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.request.symbols.push(symbol.into());
        self
    }

    /// Replace the data types to resolve for every symbol.
    #[must_use]
    pub fn data_types(mut self, data_types: &[DataType]) -> Self {
        self.request.data_types = data_types.to_vec();
        self
    }

    /// Append one data type.
    #[must_use]
    pub fn add_data_type(mut self, data_type: DataType) -> Self {
        self.request.data_types.push(data_type);
        self
    }

    /// Override the chunk size for this call only.
    ///
    /// Takes precedence over per data type and global settings. Zero is treated as one.
    #[must_use]
    pub const fn chunk_size(mut self, size: usize) -> Self {
        self.request.chunk_size = Some(size);
        self
    }

    /// Override the overall deadline for this call only.
    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.request.deadline_ms = Some(u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// The request assembled so far.
    #[must_use]
    pub const fn request(&self) -> &BatchRequest {
        &self.request
    }

    /// Execute the batch.
    ///
    /// # Errors
    /// Same as [`Riserva::resolve_batch`].
    pub async fn run(self) -> Result<BatchResult, RiservaError> {
        self.riserva.resolve_batch(self.request).await
    }
}

/// Outcomes of one chunk plus the counters it contributes.
#[derive(Default)]
struct ChunkReport {
    outcomes: Vec<(String, FetchOutcome)>,
    cache_hits: usize,
    stale_served: usize,
}

impl ChunkReport {
    fn failed(symbols: &[String], error: &RiservaError) -> Self {
        Self {
            outcomes: symbols
                .iter()
                .map(|s| (s.clone(), FetchOutcome::failed(error.clone())))
                .collect(),
            ..Self::default()
        }
    }
}

impl Riserva {
    /// Start a fluent batch request.
    #[must_use]
    pub fn batch(&self) -> BatchBuilder<'_> {
        BatchBuilder::new(self)
    }

    /// Resolve every requested symbol for every requested data type.
    ///
    /// Behavior and trade-offs:
    /// - Symbols are split per data type into chunks (request override, then
    ///   per data type setting, then global setting). All chunks run
    ///   concurrently, at most `max_concurrency` at a time.
    /// - Within a chunk, fresh cache hits are served first. Remaining symbols walk
    ///   the chain: providers with a `max_batch_size` get one multi-symbol call per
    ///   sub-chunk, the others one call per symbol.
    /// - A quota failure stops the walk for the symbols it covers, and a provider
    ///   that answered a whole call with quota is not called again for the chunk.
    /// - Symbols nothing could serve get their stale cache entry, or an error
    ///   outcome. Batches never synthesize.
    /// - A chunk that panics, or is still pending when the deadline elapses, turns
    ///   into transient error outcomes for its symbols only.
    ///
    /// # Errors
    /// Returns a configuration error when any requested data type has no usable
    /// chain. Per-symbol failures never fail the call.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "riserva::resolve_batch",
            skip(self, req),
            fields(
                symbols = req.symbols.len(),
                data_types = req.data_types.len(),
            ),
        )
    )]
    pub async fn resolve_batch(&self, req: BatchRequest) -> Result<BatchResult, RiservaError> {
        let symbols = normalize_symbols(&req.symbols);
        let data_types = dedup_data_types(&req.data_types);
        let specs = data_types
            .iter()
            .map(|dt| self.registry.spec(*dt))
            .collect::<Result<Vec<&DataTypeSpec>, RiservaError>>()?;
        let deadline = req
            .deadline_ms
            .map(Duration::from_millis)
            .or_else(|| self.cfg.batch_deadline());

        let mut jobs: Vec<(&DataTypeSpec, Vec<String>)> = Vec::new();
        for spec in &specs {
            let size = req
                .chunk_size
                .or(spec.chunk_size)
                .unwrap_or(self.cfg.chunk_size);
            for chunk in chunk_symbols(&symbols, size) {
                jobs.push((*spec, chunk));
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(chunks = jobs.len(), deadline_ms = ?deadline.map(|d| d.as_millis()), "dispatching batch");

        let calls = AtomicUsize::new(0);
        let tasks = jobs
            .iter()
            .map(|(spec, chunk)| self.settle_chunk(spec, chunk, &calls));
        let settled = join_until_deadline(tasks, deadline).await;

        let mut metrics = BatchMetrics {
            symbols_requested: symbols.len(),
            endpoints_requested: data_types.len(),
            chunks: jobs.len(),
            ..BatchMetrics::default()
        };
        let mut data: BTreeMap<DataType, BTreeMap<String, FetchOutcome>> = data_types
            .iter()
            .map(|dt| (*dt, BTreeMap::new()))
            .collect();

        for ((spec, chunk), report) in jobs.iter().zip(settled) {
            let report = match report {
                Some(Ok(report)) => report,
                Some(Err(e)) => {
                    metrics.chunks_failed += 1;
                    ChunkReport::failed(chunk, &e)
                }
                None => {
                    metrics.chunks_failed += 1;
                    #[cfg(feature = "tracing")]
                    tracing::warn!(data_type = %spec.data_type, symbols = ?chunk, "chunk abandoned at deadline");
                    ChunkReport::failed(chunk, &RiservaError::request_timeout(spec.data_type.as_str()))
                }
            };
            metrics.cache_hits += report.cache_hits;
            metrics.stale_served += report.stale_served;
            let cells = data.entry(spec.data_type).or_default();
            for (symbol, outcome) in report.outcomes {
                if outcome.is_ok() {
                    metrics.total_data_points += 1;
                } else {
                    metrics.errors += 1;
                }
                cells.insert(symbol, outcome);
            }
        }

        metrics.api_calls_made = calls.load(Ordering::Relaxed);
        metrics.api_calls_saved = (metrics.symbols_requested * metrics.endpoints_requested)
            .saturating_sub(metrics.api_calls_made);

        #[cfg(feature = "tracing")]
        tracing::debug!(?metrics, "batch settled");

        Ok(BatchResult {
            symbols,
            data,
            metrics,
        })
    }

    /// Run one chunk under a concurrency permit, turning a panic into an error.
    async fn settle_chunk(
        &self,
        spec: &DataTypeSpec,
        symbols: &[String],
        calls: &AtomicUsize,
    ) -> Result<ChunkReport, RiservaError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| RiservaError::Other(format!("batch permits unavailable: {e}")))?;
        AssertUnwindSafe(self.run_chunk(spec, symbols, calls))
            .catch_unwind()
            .await
            .map_err(|panic| {
                #[cfg(feature = "tracing")]
                tracing::warn!(data_type = %spec.data_type, "chunk task panicked");
                RiservaError::Other(format!(
                    "{} chunk panicked: {}",
                    spec.data_type,
                    panic_message(&*panic)
                ))
            })
    }

    async fn run_chunk(
        &self,
        spec: &DataTypeSpec,
        symbols: &[String],
        calls: &AtomicUsize,
    ) -> ChunkReport {
        let data_type = spec.data_type;
        let mut report = ChunkReport::default();
        let mut cached: HashMap<String, CacheEntry> = HashMap::new();
        let mut pending: Vec<String> = Vec::with_capacity(symbols.len());

        for symbol in symbols {
            let key = match CacheKey::new(symbol, data_type) {
                Ok(k) => k,
                Err(e) => {
                    report.outcomes.push((symbol.clone(), FetchOutcome::failed(e)));
                    continue;
                }
            };
            match self.cache_get(&key).await {
                Some(entry) if is_fresh_hit(&entry, spec) => {
                    report.cache_hits += 1;
                    report.outcomes.push((
                        symbol.clone(),
                        FetchOutcome::ok(entry.payload, Source::Cache, false, Some(entry.last_updated)),
                    ));
                }
                Some(entry) => {
                    cached.insert(symbol.clone(), entry);
                    pending.push(symbol.clone());
                }
                None => pending.push(symbol.clone()),
            }
        }

        let mut errors: HashMap<String, Vec<RiservaError>> = HashMap::new();
        let mut stopped: Vec<String> = Vec::new();
        for p in &spec.chain {
            if pending.is_empty() {
                break;
            }
            let mut next: Vec<String> = Vec::new();
            for (symbol, res) in self.provider_pass(p, data_type, &pending, calls).await {
                match res {
                    Ok(payload) if !is_empty_payload(&payload) => {
                        let source = Source::Provider(p.key());
                        let last_updated = Utc::now();
                        if let Ok(key) = CacheKey::new(&symbol, data_type) {
                            let entry =
                                CacheEntry::at(key, payload.clone(), source.clone(), last_updated);
                            self.cache_put(entry).await;
                        }
                        report.outcomes.push((
                            symbol,
                            FetchOutcome::ok(payload, source, false, Some(last_updated)),
                        ));
                    }
                    Ok(_) => {
                        errors.entry(symbol.clone()).or_default().push(RiservaError::Data(
                            format!("{} returned an empty {data_type} payload for {symbol}", p.name()),
                        ));
                        next.push(symbol);
                    }
                    Err(e) => {
                        let quota = e.is_quota();
                        errors.entry(symbol.clone()).or_default().push(e);
                        if quota {
                            stopped.push(symbol);
                        } else {
                            next.push(symbol);
                        }
                    }
                }
            }
            pending = next;
        }

        for symbol in pending.into_iter().chain(stopped) {
            if let Some(entry) = cached.remove(&symbol) {
                report.stale_served += 1;
                report.outcomes.push((
                    symbol,
                    FetchOutcome::ok(entry.payload, Source::Cache, true, Some(entry.last_updated)),
                ));
                continue;
            }
            let errs = errors.remove(&symbol).unwrap_or_default();
            let what = format!("{data_type} for {symbol}");
            report
                .outcomes
                .push((symbol, FetchOutcome::failed(collapse_errors(data_type, errs, what))));
        }
        report
    }

    /// Ask one provider for every symbol in `symbols`.
    ///
    /// Returns one result per symbol, in input order. Once the provider answers a
    /// whole call with a quota error, the remaining symbols get that error without
    /// another call.
    async fn provider_pass(
        &self,
        p: &Arc<dyn Provider>,
        data_type: DataType,
        symbols: &[String],
        calls: &AtomicUsize,
    ) -> Vec<(String, Result<Value, RiservaError>)> {
        let timeout = self.cfg.provider_timeout();
        let mut out = Vec::with_capacity(symbols.len());
        let mut exhausted: Option<RiservaError> = None;

        if let Some(max) = p.max_batch_size(data_type) {
            for sub in symbols.chunks(max.max(1)) {
                if let Some(e) = &exhausted {
                    out.extend(sub.iter().map(|s| (s.clone(), Err(e.clone()))));
                    continue;
                }
                calls.fetch_add(1, Ordering::Relaxed);
                let res = Self::provider_call_with_timeout(
                    p.name(),
                    data_type.as_str(),
                    timeout,
                    p.fetch_batch(sub, data_type),
                )
                .await;
                match res {
                    Ok(mut payloads) => {
                        for s in sub {
                            let r = payloads.remove(s).unwrap_or_else(|| {
                                Err(RiservaError::not_found(format!("{data_type} for {s}")))
                            });
                            out.push((s.clone(), r));
                        }
                    }
                    Err(e) => {
                        #[cfg(feature = "tracing")]
                        tracing::debug!(provider = p.name(), error = %e, symbols = sub.len(), "multi-symbol call failed");
                        if e.is_quota() {
                            exhausted = Some(e.clone());
                        }
                        out.extend(sub.iter().map(|s| (s.clone(), Err(e.clone()))));
                    }
                }
            }
        } else {
            for s in symbols {
                if let Some(e) = &exhausted {
                    out.push((s.clone(), Err(e.clone())));
                    continue;
                }
                calls.fetch_add(1, Ordering::Relaxed);
                let res = Self::provider_call_with_timeout(
                    p.name(),
                    data_type.as_str(),
                    timeout,
                    p.fetch(s, data_type),
                )
                .await;
                if let Err(e) = &res
                    && e.is_quota()
                {
                    exhausted = Some(e.clone());
                }
                out.push((s.clone(), res));
            }
        }
        out
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
