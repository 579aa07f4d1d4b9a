//! Key/value configuration contract.

use crate::error::EnvError;

/// Persistent key/value settings owned by the host.
///
/// # Implementations
///
/// - **Production**: `MemoryConfigStore` or a sled-backed store
/// - **Simulation**: any of the above, or a deliberately failing store
///
/// Values are opaque strings; interpreting them is the caller's job.
pub trait ConfigStore {
    /// Reads persisted values into memory.
    fn load(&mut self) -> Result<(), EnvError>;

    /// Writes in-memory values back to persistent storage.
    fn save(&mut self) -> Result<(), EnvError>;

    /// Returns the value stored under `key`, or `None` when unset.
    fn get_value(&self, key: &str) -> Result<Option<String>, EnvError>;

    /// Stores `value` under `key` (in memory until `save()`).
    fn set_value(&mut self, key: &str, value: &str) -> Result<(), EnvError>;

    /// Returns the value under `key`, falling back to `default` when the key
    /// is unset or the store cannot be read.
    fn get_value_or(&self, key: &str, default: &str) -> String {
        match self.get_value(key) {
            Ok(Some(value)) => value,
            _ => default.to_string(),
        }
    }
}
