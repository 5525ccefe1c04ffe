//! Backend Registry
//!
//! Maps a backend kind name to the function that builds it, so callers can
//! pick a storage engine from configuration.

use std::collections::BTreeMap;

use crate::backend::Backend;
use crate::config::Config;
use crate::error::{ColKvError, Result};
use crate::logstore::{self, LogBackend};
use crate::memory::{self, MemoryBackend};

/// Builds a backend instance from its name and the shared configuration
pub type BackendFactory = fn(&str, &Config) -> Result<Backend>;

/// Known backend kinds
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
}

impl BackendRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the bundled `memory` and `log` backends
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(memory::KIND, MemoryBackend::create);
        registry.register(logstore::KIND, LogBackend::create);
        registry
    }

    /// Add or replace a backend kind, returning the factory it replaced
    pub fn register(&mut self, kind: &str, factory: BackendFactory) -> Option<BackendFactory> {
        let previous = self.factories.insert(kind.to_string(), factory);
        if previous.is_some() {
            tracing::debug!(kind, "replaced backend factory");
        }
        previous
    }

    /// Build a backend of the given kind
    pub fn create(&self, kind: &str, instance: &str, config: &Config) -> Result<Backend> {
        let factory = self
            .factories
            .get(kind)
            .ok_or_else(|| ColKvError::UnknownBackend(kind.to_string()))?;
        tracing::info!(kind, instance, "creating backend");
        factory(instance, config)
    }

    /// Registered kind names, sorted
    pub fn kinds(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}
