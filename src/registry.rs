//! Binding and instance storage for the container
//!
//! Uses DashMap for concurrent access; resolution never holds a map guard
//! while building.

use crate::factory::Binding;
use crate::provider::Service;
use ahash::RandomState;
use dashmap::DashMap;
use std::sync::Arc;

/// The container's two maps: `bindings` (key to factory and singleton flag)
/// and `instances` (key to an already-built value).
pub struct Registry {
    bindings: DashMap<String, Binding, RandomState>,
    instances: DashMap<String, Service, RandomState>,
}

impl Registry {
    /// Create new empty storage.
    ///
    /// Uses 8 shards; typical composition roots hold a few dozen keys.
    #[inline]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create with pre-allocated capacity
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        let shard_amount = if capacity <= 64 { 8 } else { 32 };
        Self {
            bindings: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount,
            ),
            instances: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount,
            ),
        }
    }

    /// Install or overwrite a binding; a cached instance is left alone
    #[inline]
    pub fn bind(&self, key: impl Into<String>, binding: Binding) -> Option<Binding> {
        self.bindings.insert(key.into(), binding)
    }

    /// Install or replace a cached instance
    #[inline]
    pub fn set_instance(&self, key: impl Into<String>, value: Service) -> Option<Service> {
        self.instances.insert(key.into(), value)
    }

    /// Clone of the binding for `key`
    #[inline]
    pub fn binding(&self, key: &str) -> Option<Binding> {
        self.bindings.get(key).map(|b| b.value().clone())
    }

    /// The cached instance for `key`
    #[inline]
    pub fn instance(&self, key: &str) -> Option<Service> {
        self.instances.get(key).map(|i| Arc::clone(i.value()))
    }

    #[inline]
    pub fn has_binding(&self, key: &str) -> bool {
        self.bindings.contains_key(key)
    }

    #[inline]
    pub fn has_instance(&self, key: &str) -> bool {
        self.instances.contains_key(key)
    }

    /// True if either map holds `key`
    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.has_instance(key) || self.has_binding(key)
    }

    /// Remove both the binding and the cached instance; true if either existed
    #[inline]
    pub fn remove(&self, key: &str) -> bool {
        let had_binding = self.bindings.remove(key).is_some();
        let had_instance = self.instances.remove(key).is_some();
        had_binding || had_instance
    }

    /// Number of registered bindings
    #[inline]
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Number of cached instances
    #[inline]
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.instances.is_empty()
    }

    /// Clear both maps
    #[inline]
    pub fn clear(&self) {
        self.bindings.clear();
        self.instances.clear();
    }

    /// All keys that have a binding
    pub fn bound_keys(&self) -> Vec<String> {
        self.bindings.iter().map(|r| r.key().clone()).collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("bindings", &self.binding_count())
            .field("instances", &self.instance_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::Factory;

    #[test]
    fn test_registry_bind_and_lookup() {
        let registry = Registry::new();
        assert!(!registry.contains("db"));

        registry.bind("db", Binding::new(Factory::from("Database"), true));

        assert!(registry.has_binding("db"));
        assert!(registry.binding("db").unwrap().singleton);
        assert_eq!(registry.binding("db").unwrap().factory.describe(), "Database");
    }

    #[test]
    fn test_registry_instance_independent_of_binding() {
        let registry = Registry::new();
        registry.set_instance("value", Arc::new(123_i32));

        assert!(registry.contains("value"));
        assert!(!registry.has_binding("value"));

        registry.bind("value", Binding::to_self("value", false));
        assert!(registry.has_instance("value"));
    }

    #[test]
    fn test_registry_remove_clears_both() {
        let registry = Registry::new();
        registry.bind("k", Binding::to_self("k", false));
        registry.set_instance("k", Arc::new(1_u8));

        assert!(registry.remove("k"));
        assert!(!registry.contains("k"));
        assert!(!registry.remove("k"));
    }
}
