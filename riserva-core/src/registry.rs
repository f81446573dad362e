//! Data type registry: TTL, provider chain and chunking per data type.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::{DataType, Provider, RiservaConfig, RiservaError};

/// Resolution settings for one data type.
#[derive(Clone)]
pub struct DataTypeSpec {
    /// Data type this spec applies to.
    pub data_type: DataType,
    /// Freshness threshold.
    pub ttl: Duration,
    /// Providers in priority order.
    pub chain: Vec<Arc<dyn Provider>>,
    /// Batch chunk size override.
    pub chunk_size: Option<usize>,
}

impl DataTypeSpec {
    /// Create a spec with the default TTL for `data_type` and no chunk override.
    #[must_use]
    pub fn new(data_type: DataType, chain: Vec<Arc<dyn Provider>>) -> Self {
        Self {
            data_type,
            ttl: data_type.default_ttl(),
            chain,
            chunk_size: None,
        }
    }

    /// Names of the providers in the chain, in priority order.
    #[must_use]
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.chain.iter().map(|p| p.name()).collect()
    }
}

impl core::fmt::Debug for DataTypeSpec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DataTypeSpec")
            .field("data_type", &self.data_type)
            .field("ttl", &self.ttl)
            .field("chain", &self.provider_names())
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

/// Immutable mapping from data type to its [`DataTypeSpec`].
#[derive(Debug, Clone, Default)]
pub struct DataTypeRegistry {
    specs: BTreeMap<DataType, DataTypeSpec>,
}

impl DataTypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            specs: BTreeMap::new(),
        }
    }

    /// Insert or replace the spec for its data type.
    pub fn insert(&mut self, spec: DataTypeSpec) {
        self.specs.insert(spec.data_type, spec);
    }

    /// Look up the spec for a data type.
    ///
    /// # Errors
    /// Returns `UnknownDataType` when the data type is not registered and
    /// `EmptyProviderChain` when its chain has no providers.
    pub fn spec(&self, data_type: DataType) -> Result<&DataTypeSpec, RiservaError> {
        let spec = self
            .specs
            .get(&data_type)
            .ok_or_else(|| RiservaError::UnknownDataType {
                data_type: data_type.to_string(),
            })?;
        if spec.chain.is_empty() {
            return Err(RiservaError::EmptyProviderChain {
                data_type: data_type.to_string(),
            });
        }
        Ok(spec)
    }

    /// Registered data types.
    pub fn data_types(&self) -> impl Iterator<Item = DataType> + '_ {
        self.specs.keys().copied()
    }

    /// Resolve configured provider keys against registered providers.
    ///
    /// Every [`DataType`] gets an entry. A data type without an explicit
    /// `provider_order` gets every registered provider that supports it, in
    /// registration order; such chains may be empty and are rejected at request
    /// time.
    ///
    /// # Errors
    /// - `UnknownProvider` if a configured key matches no registered provider.
    /// - `Configuration` if a configured provider does not support the data type.
    pub fn from_config(
        providers: &[Arc<dyn Provider>],
        cfg: &RiservaConfig,
    ) -> Result<Self, RiservaError> {
        let mut reg = Self::new();
        for data_type in DataType::ALL {
            let dt_cfg = cfg.data_types.get(&data_type);
            let order = dt_cfg.map(|c| c.provider_order.as_slice()).unwrap_or_default();

            let chain: Vec<Arc<dyn Provider>> = if order.is_empty() {
                providers
                    .iter()
                    .filter(|p| p.supports(data_type))
                    .cloned()
                    .collect()
            } else {
                let mut seen: HashSet<&str> = HashSet::new();
                let mut chain = Vec::with_capacity(order.len());
                for key in order {
                    let provider = providers
                        .iter()
                        .find(|p| p.name() == key.as_str())
                        .ok_or_else(|| RiservaError::UnknownProvider {
                            provider: key.clone(),
                        })?;
                    if !provider.supports(data_type) {
                        return Err(RiservaError::Configuration(format!(
                            "provider {key} does not support {data_type}"
                        )));
                    }
                    if seen.insert(provider.name()) {
                        chain.push(Arc::clone(provider));
                    }
                }
                chain
            };

            #[cfg(feature = "tracing")]
            tracing::debug!(
                data_type = %data_type,
                chain = ?chain.iter().map(|p| p.name()).collect::<Vec<_>>(),
                "registered provider chain"
            );

            reg.insert(DataTypeSpec {
                data_type,
                ttl: cfg.ttl(data_type),
                chain,
                chunk_size: dt_cfg.and_then(|c| c.chunk_size),
            });
        }
        Ok(reg)
    }
}
