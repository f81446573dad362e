use riserva_core::RiservaError;
use serde_json::Value;

const SNIPPET_LEN: usize = 200;

/// Per-vendor rules turning an HTTP status and body into data or a classified error.
///
/// Vendors signal quota exhaustion and unknown symbols in different ways: some
/// use status codes, others answer `200 OK` with a message member in the JSON
/// body. Markers are matched case-insensitively against the string members
/// named in `message_keys` (or against the raw body when it is not JSON).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRules {
    /// Provider name stamped on produced errors.
    pub connector: &'static str,
    /// Statuses meaning the quota is spent.
    pub quota_statuses: Vec<u16>,
    /// Lowercase message fragments meaning the quota is spent.
    pub quota_markers: Vec<&'static str>,
    /// Statuses meaning the symbol is unknown.
    pub not_found_statuses: Vec<u16>,
    /// Lowercase message fragments meaning the symbol is unknown.
    pub not_found_markers: Vec<&'static str>,
    /// Top-level members whose presence in a 2xx body means the request was rejected.
    pub not_found_keys: Vec<&'static str>,
    /// Top-level members carrying vendor messages.
    pub message_keys: Vec<&'static str>,
}

impl ErrorRules {
    /// Rules for an upstream that follows HTTP conventions.
    #[must_use]
    pub fn generic(connector: &'static str) -> Self {
        Self {
            connector,
            quota_statuses: vec![429],
            quota_markers: vec!["rate limit", "too many requests"],
            not_found_statuses: vec![404],
            not_found_markers: vec!["not found"],
            not_found_keys: Vec::new(),
            message_keys: vec!["error", "message"],
        }
    }

    /// Financial Modeling Prep: 429 and 403 both mean the plan limit, and the
    /// body carries `"Error Message": "Limit Reach ..."`.
    #[must_use]
    pub fn fmp(connector: &'static str) -> Self {
        Self {
            connector,
            quota_statuses: vec![429, 403],
            quota_markers: vec!["limit reach"],
            not_found_statuses: vec![404],
            not_found_markers: vec!["not found", "invalid ticker"],
            not_found_keys: vec!["Error Message"],
            message_keys: vec!["Error Message", "error", "message"],
        }
    }

    /// Alpha Vantage answers `200 OK` for everything; throttling shows up in
    /// `Note` or `Information`, unknown symbols in `Error Message`.
    #[must_use]
    pub fn alpha_vantage(connector: &'static str) -> Self {
        Self {
            connector,
            quota_statuses: vec![429],
            quota_markers: vec![
                "api call frequency",
                "rate limit",
                "requests per day",
            ],
            not_found_statuses: vec![404],
            not_found_markers: vec!["invalid api call"],
            not_found_keys: vec!["Error Message"],
            message_keys: vec!["Note", "Information", "Error Message"],
        }
    }

    /// Finnhub: 429 for throttling, `{"error": ...}` bodies otherwise.
    #[must_use]
    pub fn finnhub(connector: &'static str) -> Self {
        Self {
            connector,
            quota_statuses: vec![429],
            quota_markers: vec!["api limit reached"],
            not_found_statuses: vec![404],
            not_found_markers: vec!["symbol not supported", "no data"],
            not_found_keys: Vec::new(),
            message_keys: vec!["error"],
        }
    }

    /// Marketaux: 429 when throttled, 402 with `usage_limit_reached` when the
    /// daily allowance is gone.
    #[must_use]
    pub fn marketaux(connector: &'static str) -> Self {
        Self {
            connector,
            quota_statuses: vec![429, 402],
            quota_markers: vec!["usage_limit_reached", "rate_limit_reached"],
            not_found_statuses: vec![404],
            not_found_markers: vec!["not found"],
            not_found_keys: Vec::new(),
            message_keys: vec!["error"],
        }
    }

    /// Classify a response.
    ///
    /// Order: quota statuses, quota markers, not-found statuses, other non-2xx
    /// statuses (transient), not-found keys and markers, then JSON parsing.
    ///
    /// # Errors
    /// `QuotaExceeded`, `NotFound`, `Connector` or `Data` as described above.
    pub fn classify(&self, status: u16, body: &str) -> Result<Value, RiservaError> {
        if self.quota_statuses.contains(&status) {
            return Err(self.quota());
        }

        let parsed = serde_json::from_str::<Value>(body).ok();
        let messages = self.messages(parsed.as_ref(), body);
        let mentions = |markers: &[&str]| {
            messages
                .iter()
                .any(|m| markers.iter().any(|k| m.contains(k)))
        };

        if mentions(&self.quota_markers) {
            return Err(self.quota());
        }
        if self.not_found_statuses.contains(&status) {
            return Err(RiservaError::not_found(format!(
                "{} returned HTTP {status}",
                self.connector
            )));
        }
        if !(200..300).contains(&status) {
            return Err(RiservaError::connector(
                self.connector,
                format!("HTTP {status}: {}", snippet(body)),
            ));
        }

        let rejected = parsed
            .as_ref()
            .and_then(Value::as_object)
            .is_some_and(|o| self.not_found_keys.iter().any(|k| o.contains_key(*k)));
        if rejected || mentions(&self.not_found_markers) {
            return Err(RiservaError::not_found(format!(
                "{}: {}",
                self.connector,
                messages.first().map_or("no data", String::as_str)
            )));
        }

        parsed.ok_or_else(|| {
            RiservaError::Data(format!(
                "{} returned a non-JSON body: {}",
                self.connector,
                snippet(body)
            ))
        })
    }

    fn quota(&self) -> RiservaError {
        RiservaError::quota_exceeded(self.connector)
    }

    fn messages(&self, parsed: Option<&Value>, body: &str) -> Vec<String> {
        match parsed {
            Some(Value::Object(o)) => self
                .message_keys
                .iter()
                .filter_map(|k| o.get(*k))
                .filter(|v| !v.is_null())
                .map(|v| match v {
                    Value::String(s) => s.to_lowercase(),
                    other => other.to_string().to_lowercase(),
                })
                .collect(),
            Some(_) => Vec::new(),
            None => vec![snippet(body).to_lowercase()],
        }
    }
}

fn snippet(body: &str) -> &str {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(SNIPPET_LEN) {
        Some((idx, _)) => &trimmed[..idx],
        None => trimmed,
    }
}
