//! Data providers for view renders
//!
//! Views whose definition configures a `provider` fetch their records
//! through a [`ViewProvider`] resolved from the [`ProviderRegistry`]. The
//! registry is keyed by name; `provider = "auto"` resolves the entry
//! registered under the owning module's id, an explicit name resolves that
//! entry directly. Providers are constructed per render by their
//! [`ProviderFactory`] so they can hold request-scoped state.

use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;

use crate::core::ViewmillError;
use crate::options::{Conditions, ProviderSpec};

/// Name under which `provider = "auto"` reports a resolution failure.
pub const AUTO_PROVIDER: &str = "auto";

/// A fetched record collection with its paging facts.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    /// The records, in provider order.
    pub records: Vec<Value>,
    /// Total matching records, ignoring paging.
    pub total_count: u64,
    /// The limit the fetch was performed with, if any.
    pub limit: Option<u64>,
    /// Zero-based page the fetch was performed with.
    pub page: u64,
    /// The conditions the provider actually applied.
    pub conditions: Conditions,
}

/// Outcome of a provider invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    /// Records were found.
    Records(RecordSet),
    /// Nothing matched the conditions.
    Empty,
}

impl Fetched {
    /// True when the fetch produced no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Records(set) => set.records.is_empty(),
            Self::Empty => true,
        }
    }
}

/// Fetches the data a view renders.
pub trait ViewProvider {
    /// Fetch records matching `conditions`.
    fn fetch(&self, conditions: &Conditions) -> Result<Fetched>;
}

/// Constructs a [`ViewProvider`] for a single render.
pub trait ProviderFactory: Send + Sync {
    /// Create a provider instance.
    fn create(&self) -> Box<dyn ViewProvider>;
}

/// Name-keyed provider factories.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: HashMap<String, Box<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, replacing any previous one.
    ///
    /// Registering under a module id makes the factory the module's
    /// convention entry, resolved by `provider = "auto"`.
    pub fn register(&mut self, name: impl Into<String>, factory: Box<dyn ProviderFactory>) {
        self.factories.insert(name.into(), factory);
    }

    /// Resolve a definition's provider spec to a fresh provider instance.
    pub fn resolve(&self, spec: &ProviderSpec, module: &str) -> Result<Box<dyn ViewProvider>> {
        let (key, name) = match spec {
            ProviderSpec::Auto => (module, AUTO_PROVIDER),
            ProviderSpec::Named(name) => (name.as_str(), name.as_str()),
        };

        self.factories.get(key).map(|factory| factory.create()).ok_or_else(|| {
            ViewmillError::ProviderNotFound {
                module: module.to_string(),
                name: name.to_string(),
            }
            .into()
        })
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("factories", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}
