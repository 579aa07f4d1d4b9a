//! In-memory implementation of ConfigStore.

use crate::error::EnvError;
use crate::ConfigStore;
use std::collections::HashMap;
use tracing::debug;

/// Config store backed by a plain map.
///
/// `load()` and `save()` have nothing to move, so they only count calls.
/// Used by hosts that persist settings themselves and by tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    values: HashMap<String, String>,
    loads: u32,
    saves: u32,
}

impl MemoryConfigStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with values.
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            ..Self::default()
        }
    }

    /// Number of `load()` calls so far.
    pub fn load_count(&self) -> u32 {
        self.loads
    }

    /// Number of `save()` calls so far.
    pub fn save_count(&self) -> u32 {
        self.saves
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&mut self) -> Result<(), EnvError> {
        self.loads += 1;
        Ok(())
    }

    fn save(&mut self) -> Result<(), EnvError> {
        self.saves += 1;
        debug!(keys = self.values.len(), "memory config saved");
        Ok(())
    }

    fn get_value(&self, key: &str) -> Result<Option<String>, EnvError> {
        Ok(self.values.get(key).cloned())
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<(), EnvError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryConfigStore::new();
        store.set_value("mode", "by_name").unwrap();
        assert_eq!(store.get_value("mode").unwrap().as_deref(), Some("by_name"));
        assert_eq!(store.get_value("missing").unwrap(), None);
    }

    #[test]
    fn test_memory_store_default_fallback() {
        let store = MemoryConfigStore::with_values([("a", "1")]);
        assert_eq!(store.get_value_or("a", "x"), "1");
        assert_eq!(store.get_value_or("b", "x"), "x");
    }

    #[test]
    fn test_memory_store_counts_persistence_calls() {
        let mut store = MemoryConfigStore::new();
        store.load().unwrap();
        store.save().unwrap();
        store.save().unwrap();
        assert_eq!(store.load_count(), 1);
        assert_eq!(store.save_count(), 2);
    }
}
