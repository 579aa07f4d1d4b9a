//! Queue configuration and persisted settings.
//!
//! - `QueueConfig`: tuning knobs handed to the queue at construction
//! - `SledConfigStore`: embedded key/value store implementing `ConfigStore`

use crate::guard::DEFAULT_LEAD_TIME_SECS;
use maneuver_env::{ConfigStore, EnvError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Key holding the last selected mode.
pub const MODE_KEY: &str = "maneuver_queue.mode";

/// Key holding the host's secondary display filter.
pub const FILTER_KEY: &str = "maneuver_queue.filter";

/// What happens to the host's display filter around the ByEventTime mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterRestorePolicy {
    /// Leave the filter alone
    Never,

    /// Remember the filter on entering ByEventTime, put it back on leaving
    #[default]
    RestoreOnLeave,
}

/// Configuration for a maneuver queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Lead time for the guard and classifier (simulated seconds)
    #[serde(default = "default_lead_time")]
    pub lead_time_secs: f64,

    /// Filter restore policy
    #[serde(default)]
    pub filter_restore: FilterRestorePolicy,
}

fn default_lead_time() -> f64 {
    DEFAULT_LEAD_TIME_SECS
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            lead_time_secs: DEFAULT_LEAD_TIME_SECS,
            filter_restore: FilterRestorePolicy::default(),
        }
    }
}

// ============================================================================
// SLED STORE
// ============================================================================

/// Sled-backed settings store.
///
/// Values live in memory between `load()` and `save()`; `save()` writes every
/// value back and flushes.
pub struct SledConfigStore {
    db: sled::Db,
    values: HashMap<String, String>,
}

impl SledConfigStore {
    /// Open a persistent store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, EnvError> {
        let db = sled::open(path)
            .map_err(|e| EnvError::storage(format!("Failed to open sled DB: {}", e)))?;
        Ok(Self {
            db,
            values: HashMap::new(),
        })
    }

    /// Create a temporary store (for testing)
    pub fn open_temp() -> Result<Self, EnvError> {
        let config = sled::Config::new().temporary(true);
        let db = config
            .open()
            .map_err(|e| EnvError::storage(format!("Failed to open temp DB: {}", e)))?;
        Ok(Self {
            db,
            values: HashMap::new(),
        })
    }
}

impl ConfigStore for SledConfigStore {
    fn load(&mut self) -> Result<(), EnvError> {
        let mut values = HashMap::new();
        for result in self.db.iter() {
            let (key, value) =
                result.map_err(|e| EnvError::storage(format!("Iteration failed: {}", e)))?;
            match (std::str::from_utf8(&key), std::str::from_utf8(&value)) {
                (Ok(key), Ok(value)) => {
                    values.insert(key.to_string(), value.to_string());
                }
                _ => warn!("skipping non-UTF-8 settings entry"),
            }
        }

        debug!(keys = values.len(), "settings loaded");
        self.values = values;
        Ok(())
    }

    fn save(&mut self) -> Result<(), EnvError> {
        for (key, value) in &self.values {
            self.db
                .insert(key.as_bytes(), value.as_bytes())
                .map_err(|e| EnvError::storage(format!("Insert failed: {}", e)))?;
        }
        self.db
            .flush()
            .map_err(|e| EnvError::storage(format!("Flush failed: {}", e)))?;
        debug!(keys = self.values.len(), "settings saved");
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
    fn test_queue_config_default() {
        let config = QueueConfig::default();
        assert_eq!(config.lead_time_secs, 900.0);
        assert_eq!(config.filter_restore, FilterRestorePolicy::RestoreOnLeave);
    }

    #[test]
    fn test_queue_config_missing_fields_use_defaults() {
        let config: QueueConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, QueueConfig::default());

        let config: QueueConfig =
            serde_json::from_str(r#"{"lead_time_secs": 600.0, "filter_restore": "never"}"#).unwrap();
        assert_eq!(config.lead_time_secs, 600.0);
        assert_eq!(config.filter_restore, FilterRestorePolicy::Never);
    }

    #[test]
    fn test_sled_store_persists_across_load() {
        let mut store = SledConfigStore::open_temp().unwrap();
        store.set_value(MODE_KEY, "by_name").unwrap();
        store.save().unwrap();

        // Drop the in-memory copy and hydrate from disk.
        store.values.clear();
        assert_eq!(store.get_value(MODE_KEY).unwrap(), None);
        store.load().unwrap();

        assert_eq!(store.get_value(MODE_KEY).unwrap().as_deref(), Some("by_name"));
    }

    #[test]
    fn test_sled_store_unsaved_values_are_lost_on_load() {
        let mut store = SledConfigStore::open_temp().unwrap();
        store.set_value(FILTER_KEY, "probes").unwrap();

        store.load().unwrap();

        assert_eq!(store.get_value_or(FILTER_KEY, "none"), "none");
    }
}
