use serde_json::Value;

/// Turns a raw vendor response for one symbol into the canonical payload.
///
/// Returning `Value::Null` (or an object carrying only `symbol`) means the
/// upstream had nothing for the symbol.
pub type Normalizer = fn(symbol: &str, raw: &Value) -> Value;

/// Splits a multi-symbol response into `(symbol, raw item)` pairs.
pub type Splitter = fn(raw: &Value) -> Vec<(String, Value)>;

/// Request template for one data type.
///
/// `{symbol}` and `{symbols}` placeholders in the path and query values are
/// replaced by the requested symbol, or by the comma-joined symbol list for
/// multi-symbol calls.
#[derive(Debug, Clone)]
pub struct Endpoint {
    path: String,
    query: Vec<(String, String)>,
    max_batch: Option<usize>,
    normalizer: Normalizer,
    splitter: Splitter,
}

impl Endpoint {
    /// Endpoint at `path` (relative to the provider base URL).
    pub fn new(path: impl Into<String>, normalizer: Normalizer) -> Self {
        Self {
            path: path.into(),
            query: Vec::new(),
            max_batch: None,
            normalizer,
            splitter: split_by_symbol,
        }
    }

    /// Add a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Accept up to `max` comma-joined symbols per request.
    #[must_use]
    pub fn batched(mut self, max: usize) -> Self {
        self.max_batch = Some(max.max(1));
        self
    }

    /// Override how multi-symbol responses are split.
    #[must_use]
    pub fn splitter(mut self, splitter: Splitter) -> Self {
        self.splitter = splitter;
        self
    }

    /// Multi-symbol capacity, if any.
    #[must_use]
    pub const fn max_batch(&self) -> Option<usize> {
        self.max_batch
    }

    /// Path segments and query with placeholders replaced by `subject`.
    ///
    /// Segments are split from the template before substitution, so a `/` in
    /// `subject` stays inside its segment. Values are returned unencoded.
    #[must_use]
    pub fn render(&self, subject: &str) -> (Vec<String>, Vec<(String, String)>) {
        let fill = |s: &str| s.replace("{symbols}", subject).replace("{symbol}", subject);
        let path = self
            .path
            .split('/')
            .filter(|seg| !seg.is_empty())
            .map(fill)
            .collect();
        let query = self
            .query
            .iter()
            .map(|(k, v)| (k.clone(), fill(v)))
            .collect();
        (path, query)
    }

    /// Apply the normalizer.
    #[must_use]
    pub fn normalize(&self, symbol: &str, raw: &Value) -> Value {
        (self.normalizer)(symbol, raw)
    }

    /// Apply the splitter.
    #[must_use]
    pub fn split(&self, raw: &Value) -> Vec<(String, Value)> {
        (self.splitter)(raw)
    }
}

/// Default splitter: an array of objects keyed by their `symbol` member.
///
/// A single object carrying `symbol` is treated as a one-element array.
#[must_use]
pub fn split_by_symbol(raw: &Value) -> Vec<(String, Value)> {
    let items: Vec<&Value> = match raw {
        Value::Array(a) => a.iter().collect(),
        Value::Object(_) => vec![raw],
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| {
            let sym = item.get("symbol")?.as_str()?;
            Some((sym.trim().to_ascii_uppercase(), wrap_single(item)))
        })
        .collect()
}

// Normalizers expect the shape of a single-symbol response, which is an array
// for the vendors that batch natively.
fn wrap_single(item: &Value) -> Value {
    Value::Array(vec![item.clone()])
}
