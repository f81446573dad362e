//! Provider metadata types usable across crates.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Typed key for identifying providers in chain configuration and attribution.
///
/// Keys built in code borrow a static name; keys read back from a serialized
/// cache entry or configuration own their string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderKey(Cow<'static, str>);

impl ProviderKey {
    /// Construct a new typed provider key from a static name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Construct a key from an owned name (e.g. parsed from configuration).
    #[must_use]
    pub fn owned(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Returns the inner string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ProviderKey {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}
