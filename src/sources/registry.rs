//! Source registry mapping unique keys to [`SourceAdapter`] implementations.
//!
//! The registry is assembled once at startup and shared immutably afterwards
//! (wrap it in an `Arc`); there are no concurrent-write concerns after init.
//! Tests construct isolated registries directly rather than going through any
//! process-wide state.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};

use super::adapter::{SourceAdapter, SourceDescriptor};
use super::providers::{GoogleBooksAdapter, MercadoEditorialAdapter, OpenLibraryAdapter};

/// Catalog of external sources in registration order, keyed by descriptor key.
#[derive(Default)]
pub struct SourceRegistry {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    by_key: HashMap<String, usize>,
}

impl SourceRegistry {
    /// Create an empty registry with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source adapter under its descriptor key.
    ///
    /// Fails with [`Error::DuplicateSourceKey`] if the key is already taken.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) -> Result<()> {
        let key = adapter.descriptor().key.clone();
        if self.by_key.contains_key(&key) {
            return Err(Error::DuplicateSourceKey(key));
        }
        self.by_key.insert(key, self.adapters.len());
        self.adapters.push(adapter);
        Ok(())
    }

    /// Look up an adapter by key.
    pub fn get(&self, key: &str) -> Result<&Arc<dyn SourceAdapter>> {
        self.by_key
            .get(key)
            .map(|&idx| &self.adapters[idx])
            .ok_or_else(|| Error::unknown_source(key))
    }

    /// All registered descriptors, in registration order.
    pub fn all(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.adapters.iter().map(|a| a.descriptor())
    }

    /// All registered keys, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.adapters.iter().map(|a| a.descriptor().key.as_str())
    }

    /// All registered adapters, in registration order.
    pub(crate) fn adapters(&self) -> impl Iterator<Item = &Arc<dyn SourceAdapter>> {
        self.adapters.iter()
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

/// Assemble the built-in adapters from configuration.
///
/// Adapters are always registered so their descriptors remain listable;
/// sources disabled in the config report themselves as not enabled and are
/// skipped by the aggregator.
pub fn registry_from_config(config: &Config) -> Result<SourceRegistry> {
    let mut registry = SourceRegistry::new();
    let sources = &config.sources;

    registry.register(Arc::new(GoogleBooksAdapter::new(
        sources.google_books.clone(),
        &sources.locale,
    )))?;
    registry.register(Arc::new(OpenLibraryAdapter::new(
        sources.open_library.clone(),
    )))?;
    registry.register(Arc::new(MercadoEditorialAdapter::new(
        sources.mercado_editorial.clone(),
    )))?;

    Ok(registry)
}
