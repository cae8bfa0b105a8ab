//! Dependency-Resolution Hook
//!
//! Filters can be declared by capability key instead of by value. Resolution
//! goes through an explicit registry mapping each key to a factory; there is
//! no reflection-style type lookup.

use crate::error::ProviderError;
use crate::filter::AgentFilter;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves a named capability to a filter instance.
///
/// Consumed by the filter contexts when a script applies a filter by key
/// rather than by value. Hosts may implement this directly or use
/// [`FilterRegistry`].
pub trait DependencyResolver: Send + Sync {
    fn resolve_filter(&self, key: &str) -> Result<Arc<dyn AgentFilter>, ProviderError>;
}

type FilterFactory = Box<dyn Fn() -> Arc<dyn AgentFilter> + Send + Sync>;

/// Explicit capability-key → filter-factory registry.
#[derive(Default)]
pub struct FilterRegistry {
    factories: RwLock<HashMap<String, FilterFactory>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under a capability key, replacing any previous one.
    pub fn register<F>(&self, key: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn AgentFilter> + Send + Sync + 'static,
    {
        self.factories.write().insert(key.into(), Box::new(factory));
    }

    /// Register an already-constructed filter under a capability key.
    pub fn register_instance(&self, key: impl Into<String>, filter: Arc<dyn AgentFilter>) {
        self.register(key, move || Arc::clone(&filter));
    }
}

impl DependencyResolver for FilterRegistry {
    fn resolve_filter(&self, key: &str) -> Result<Arc<dyn AgentFilter>, ProviderError> {
        let factories = self.factories.read();
        factories
            .get(key)
            .map(|factory| factory())
            .ok_or_else(|| ProviderError::UnknownCapability(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FnFilter;

    #[test]
    fn test_resolve_registered_filter() {
        let registry = FilterRegistry::new();
        registry.register("redact", || {
            Arc::new(FnFilter::from_sync("redact", Some))
        });

        let filter = registry.resolve_filter("redact").unwrap();
        assert_eq!(filter.name(), "redact");
    }

    #[test]
    fn test_unknown_capability_is_explicit() {
        let registry = FilterRegistry::new();
        let error = registry.resolve_filter("missing").err().unwrap();
        assert!(matches!(error, ProviderError::UnknownCapability(key) if key == "missing"));
    }

    #[test]
    fn test_register_replaces_previous_factory() {
        let registry = FilterRegistry::new();
        registry.register_instance("f", Arc::new(FnFilter::from_sync("first", Some)));
        registry.register_instance("f", Arc::new(FnFilter::from_sync("second", Some)));

        assert_eq!(registry.resolve_filter("f").unwrap().name(), "second");
    }
}
