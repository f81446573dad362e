use std::fmt;

/// How an API key is attached to outgoing requests.
#[derive(Clone, Default)]
pub enum Auth {
    /// No credentials.
    #[default]
    None,
    /// Append `param=value` to the query string.
    Query {
        /// Query parameter name (e.g. `apikey`, `token`).
        param: String,
        /// Secret value.
        value: String,
    },
    /// Send `name: value` as a request header.
    Header {
        /// Header name (e.g. `X-Finnhub-Token`).
        name: String,
        /// Secret value.
        value: String,
    },
}

impl Auth {
    /// Query parameter authentication.
    pub fn query(param: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Query {
            param: param.into(),
            value: value.into(),
        }
    }

    /// Header authentication.
    pub fn header(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Header {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Replace the secret in `text` so it can be logged.
    #[must_use]
    pub fn redact(&self, text: &str) -> String {
        match self {
            Self::Query { value, .. } | Self::Header { value, .. } if !value.is_empty() => {
                text.replace(value.as_str(), "***")
            }
            _ => text.to_string(),
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Query { param, .. } => f
                .debug_struct("Query")
                .field("param", param)
                .field("value", &"***")
                .finish(),
            Self::Header { name, .. } => f
                .debug_struct("Header")
                .field("name", name)
                .field("value", &"***")
                .finish(),
        }
    }
}
