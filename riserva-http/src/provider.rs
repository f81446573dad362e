use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use riserva_core::{BatchPayloads, DataType, Provider, RiservaError, is_empty_payload};
use riserva_types::QuotaConfig;
use serde_json::Value;
use url::Url;

use crate::auth::Auth;
use crate::endpoint::Endpoint;
use crate::rules::ErrorRules;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("riserva-http/", env!("CARGO_PKG_VERSION"));

/// Provider backed by a JSON-over-HTTP upstream.
///
/// Construct with [`HttpProvider::builder`] or one of the [`presets`](crate::presets).
pub struct HttpProvider {
    name: &'static str,
    vendor: &'static str,
    client: reqwest::Client,
    base_url: Url,
    auth: Auth,
    rules: ErrorRules,
    endpoints: BTreeMap<DataType, Endpoint>,
    quota: Option<QuotaConfig>,
}

impl std::fmt::Debug for HttpProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpProvider")
            .field("name", &self.name)
            .field("base_url", &self.base_url.as_str())
            .field("auth", &self.auth)
            .field("data_types", &self.endpoints.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl HttpProvider {
    /// Start configuring a provider registered under `name`.
    #[must_use]
    pub fn builder(name: &'static str) -> HttpProviderBuilder {
        HttpProviderBuilder::new(name)
    }

    /// Base URL requests are issued against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Classification rules.
    #[must_use]
    pub const fn rules(&self) -> &ErrorRules {
        &self.rules
    }

    /// Upstream plan budget, when the preset knows it.
    #[must_use]
    pub const fn quota_hint(&self) -> Option<&QuotaConfig> {
        self.quota.as_ref()
    }

    fn endpoint(&self, data_type: DataType) -> Result<&Endpoint, RiservaError> {
        self.endpoints.get(&data_type).ok_or_else(|| {
            RiservaError::InvalidArg(format!("{} does not serve {data_type}", self.name))
        })
    }

    /// Full request URL for `endpoint` with `subject` substituted.
    ///
    /// Path segments are percent-encoded, so symbols such as `BRK/B` or `A#B`
    /// cannot change the path, the query or the fragment. Commas joining a
    /// multi-symbol subject are kept as is.
    ///
    /// # Errors
    /// Returns `Configuration` when the base URL cannot carry a path.
    pub fn request_url(&self, endpoint: &Endpoint, subject: &str) -> Result<Url, RiservaError> {
        let (segments, query) = endpoint.render(subject);
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                RiservaError::Configuration(format!(
                    "{}: base url {} cannot carry a path",
                    self.name, self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(&segments);
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &query {
                pairs.append_pair(k, v);
            }
            if let Auth::Query { param, value } = &self.auth {
                pairs.append_pair(param, value);
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        Ok(url)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "riserva_http::request",
            skip(self, endpoint),
            fields(provider = self.name),
        )
    )]
    async fn request(&self, endpoint: &Endpoint, subject: &str) -> Result<Value, RiservaError> {
        let url = self.request_url(endpoint, subject)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(url = %self.auth.redact(url.as_str()), "http request");

        let mut req = self.client.get(url);
        if let Auth::Header { name, value } = &self.auth {
            req = req.header(name.as_str(), value.as_str());
        }
        let resp = req.send().await.map_err(|e| self.transport(&e))?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| self.transport(&e))?;

        let classified = self.rules.classify(status, &body);

        #[cfg(feature = "tracing")]
        if let Err(e) = &classified {
            tracing::debug!(status, error = %e, "upstream rejected request");
        }

        classified
    }

    fn transport(&self, e: &reqwest::Error) -> RiservaError {
        let msg = if e.is_timeout() {
            "request timed out".to_string()
        } else {
            self.auth.redact(&e.to_string())
        };
        RiservaError::connector(self.name, msg)
    }

    fn finish(symbol: &str, data_type: DataType, payload: Value) -> Result<Value, RiservaError> {
        if is_empty_payload(&payload) {
            Err(RiservaError::not_found(format!("{data_type} for {symbol}")))
        } else {
            Ok(payload)
        }
    }
}

#[async_trait]
impl Provider for HttpProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn vendor(&self) -> &'static str {
        self.vendor
    }

    fn supports(&self, data_type: DataType) -> bool {
        self.endpoints.contains_key(&data_type)
    }

    fn max_batch_size(&self, data_type: DataType) -> Option<usize> {
        self.endpoints.get(&data_type).and_then(Endpoint::max_batch)
    }

    async fn fetch(&self, symbol: &str, data_type: DataType) -> Result<Value, RiservaError> {
        let endpoint = self.endpoint(data_type)?;
        let raw = self.request(endpoint, symbol).await?;
        Self::finish(symbol, data_type, endpoint.normalize(symbol, &raw))
    }

    async fn fetch_batch(
        &self,
        symbols: &[String],
        data_type: DataType,
    ) -> Result<BatchPayloads, RiservaError> {
        let endpoint = self.endpoint(data_type)?;
        let mut out = BatchPayloads::with_capacity(symbols.len());
        if endpoint.max_batch().is_none() {
            for s in symbols {
                out.insert(s.clone(), self.fetch(s, data_type).await);
            }
            return Ok(out);
        }

        let raw = self.request(endpoint, &symbols.join(",")).await?;
        let mut items: BTreeMap<String, Value> = endpoint.split(&raw).into_iter().collect();
        for s in symbols {
            let res = match items.remove(&s.to_ascii_uppercase()) {
                Some(item) => Self::finish(s, data_type, endpoint.normalize(s, &item)),
                None => Err(RiservaError::not_found(format!("{data_type} for {s}"))),
            };
            out.insert(s.clone(), res);
        }
        Ok(out)
    }
}

/// Builder for [`HttpProvider`].
pub struct HttpProviderBuilder {
    name: &'static str,
    vendor: &'static str,
    base_url: Option<String>,
    auth: Auth,
    rules: Option<ErrorRules>,
    endpoints: BTreeMap<DataType, Endpoint>,
    client: Option<reqwest::Client>,
    timeout: Duration,
    quota: Option<QuotaConfig>,
}

impl HttpProviderBuilder {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            vendor: "unknown",
            base_url: None,
            auth: Auth::None,
            rules: None,
            endpoints: BTreeMap::new(),
            client: None,
            timeout: DEFAULT_TIMEOUT,
            quota: None,
        }
    }

    /// Human-readable vendor name.
    #[must_use]
    pub const fn vendor(mut self, vendor: &'static str) -> Self {
        self.vendor = vendor;
        self
    }

    /// Base URL (scheme, host and path prefix).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Credentials.
    #[must_use]
    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    /// Classification rules; defaults to [`ErrorRules::generic`].
    #[must_use]
    pub fn rules(mut self, rules: ErrorRules) -> Self {
        self.rules = Some(rules);
        self
    }

    /// Serve `data_type` from `endpoint`, replacing any previous mapping.
    #[must_use]
    pub fn endpoint(mut self, data_type: DataType, endpoint: Endpoint) -> Self {
        self.endpoints.insert(data_type, endpoint);
        self
    }

    /// Stop serving `data_type`.
    #[must_use]
    pub fn without(mut self, data_type: DataType) -> Self {
        self.endpoints.remove(&data_type);
        self
    }

    /// Use an existing `reqwest::Client` (the timeout setting is then ignored).
    #[must_use]
    pub fn client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Transport-level timeout for requests made by the internal client.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Record the upstream plan budget for [`HttpProvider::rate_limited`].
    #[must_use]
    pub fn quota(mut self, quota: QuotaConfig) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Finish the provider.
    ///
    /// # Errors
    /// Returns `Configuration` when the base URL is missing or invalid, when no
    /// endpoint is configured, or when the HTTP client cannot be built.
    pub fn build(self) -> Result<HttpProvider, RiservaError> {
        let raw_url = self.base_url.ok_or_else(|| {
            RiservaError::Configuration(format!("{}: base url is required", self.name))
        })?;
        let base_url = Url::parse(&raw_url).map_err(|e| {
            RiservaError::Configuration(format!("{}: invalid base url {raw_url}: {e}", self.name))
        })?;
        if self.endpoints.is_empty() {
            return Err(RiservaError::Configuration(format!(
                "{}: at least one endpoint is required",
                self.name
            )));
        }
        let client = match self.client {
            Some(c) => c,
            None => reqwest::Client::builder()
                .timeout(self.timeout)
                .user_agent(USER_AGENT)
                .build()
                .map_err(|e| RiservaError::Configuration(format!("{}: {e}", self.name)))?,
        };
        Ok(HttpProvider {
            name: self.name,
            vendor: self.vendor,
            client,
            base_url,
            auth: self.auth,
            rules: self.rules.unwrap_or_else(|| ErrorRules::generic(self.name)),
            endpoints: self.endpoints,
            quota: self.quota,
        })
    }
}
