//! Simulated tracking-station display and settings file.

use maneuver_env::{
    ConfigStore, DisplaySink, EntityId, EntitySnapshot, EnvError, MemoryConfigStore, SeverityMap,
};
use std::cell::RefCell;
use std::rc::Rc;

/// The list most recently handed to the display.
#[derive(Debug, Clone, Default)]
pub struct PublishedList {
    pub entities: Vec<EntitySnapshot>,
    pub severities: SeverityMap,
}

impl PublishedList {
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.iter().map(|e| e.id).collect()
    }
}

#[derive(Debug, Default)]
struct DisplayState {
    last: Option<PublishedList>,
    publishes: u64,
    rejected: u64,
    selected: Option<EntityId>,
    hidden: bool,
}

/// The host's vessel list widget.
///
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct SimDisplay {
    state: Rc<RefCell<DisplayState>>,
}

impl SimDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hides the widget; publishes fail until it is shown again.
    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().hidden = !available;
    }

    /// Player clicks a vessel.
    pub fn click(&self, id: EntityId) {
        self.state.borrow_mut().selected = Some(id);
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.state.borrow().selected
    }

    pub fn last(&self) -> Option<PublishedList> {
        self.state.borrow().last.clone()
    }

    pub fn publish_count(&self) -> u64 {
        self.state.borrow().publishes
    }

    /// Publishes refused while hidden.
    pub fn rejected_count(&self) -> u64 {
        self.state.borrow().rejected
    }
}

impl DisplaySink for SimDisplay {
    fn publish(&mut self, entities: &[EntitySnapshot], severities: &SeverityMap) -> Result<(), EnvError> {
        let mut state = self.state.borrow_mut();
        if state.hidden {
            state.rejected += 1;
            return Err(EnvError::unavailable("vessel list hidden"));
        }

        // A vessel that left the list cannot stay selected.
        if let Some(id) = state.selected {
            if !entities.iter().any(|e| e.id == id) {
                state.selected = None;
            }
        }
        state.last = Some(PublishedList {
            entities: entities.to_vec(),
            severities: severities.clone(),
        });
        state.publishes += 1;
        Ok(())
    }

    fn selected_entity(&self) -> Option<EntityId> {
        self.state.borrow().selected
    }

    fn set_selected_entity(&mut self, id: EntityId) {
        self.state.borrow_mut().selected = Some(id);
    }
}

#[derive(Debug, Default)]
struct SettingsState {
    inner: MemoryConfigStore,
    offline: bool,
}

/// The host's settings file, which can become unreadable.
///
/// Clones share the same values.
#[derive(Debug, Clone, Default)]
pub struct SimSettings {
    state: Rc<RefCell<SettingsState>>,
}

impl SimSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates values (a settings file from an earlier session).
    pub fn with_values<'a>(values: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            state: Rc::new(RefCell::new(SettingsState {
                inner: MemoryConfigStore::with_values(values),
                offline: false,
            })),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().offline = !available;
    }

    /// Reads a value directly, bypassing the offline flag.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.state.borrow().inner.get_value(key).ok().flatten()
    }

    /// Writes a value directly, as the host UI would.
    pub fn poke(&self, key: &str, value: &str) {
        // The in-memory store cannot fail.
        let _ = self.state.borrow_mut().inner.set_value(key, value);
    }

    pub fn save_count(&self) -> u32 {
        self.state.borrow().inner.save_count()
    }

    fn check(&self) -> Result<(), EnvError> {
        if self.state.borrow().offline {
            return Err(EnvError::storage("settings file locked"));
        }
        Ok(())
    }
}

impl ConfigStore for SimSettings {
    fn load(&mut self) -> Result<(), EnvError> {
        self.check()?;
        self.state.borrow_mut().inner.load()
    }

    fn save(&mut self) -> Result<(), EnvError> {
        self.check()?;
        self.state.borrow_mut().inner.save()
    }

    fn get_value(&self, key: &str) -> Result<Option<String>, EnvError> {
        self.check()?;
        self.state.borrow().inner.get_value(key)
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<(), EnvError> {
        self.check()?;
        self.state.borrow_mut().inner.set_value(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_display_rejects_publish() {
        let display = SimDisplay::new();
        let mut sink = display.clone();
        display.set_available(false);

        assert!(sink.publish(&[], &SeverityMap::new()).is_err());
        assert_eq!(display.publish_count(), 0);
        assert_eq!(display.rejected_count(), 1);

        display.set_available(true);
        assert!(sink.publish(&[], &SeverityMap::new()).is_ok());
        assert_eq!(display.publish_count(), 1);
    }

    #[test]
    fn test_selection_dropped_when_vessel_leaves_list() {
        let display = SimDisplay::new();
        let mut sink = display.clone();
        let kept = EntitySnapshot::new(EntityId::from_seed(1), "Relay");
        display.click(EntityId::from_seed(2));

        sink.publish(&[kept], &SeverityMap::new()).unwrap();

        assert_eq!(display.selected(), None);
    }

    #[test]
    fn test_offline_settings_fail_every_call() {
        let settings = SimSettings::with_values([("k", "v")]);
        let mut store = settings.clone();
        settings.set_available(false);

        assert!(store.get_value("k").is_err());
        assert!(store.set_value("k", "w").is_err());
        assert!(store.save().is_err());
        assert_eq!(settings.peek("k").as_deref(), Some("v"));

        settings.set_available(true);
        assert_eq!(store.get_value_or("k", "none"), "v");
    }

    #[test]
    fn test_poke_is_visible_through_the_store() {
        let settings = SimSettings::new();
        let mut store = settings.clone();

        settings.poke("maneuver_queue.filter", "probes");
        store.save().unwrap();

        assert_eq!(store.get_value_or("maneuver_queue.filter", "none"), "probes");
        assert_eq!(settings.save_count(), 1);
    }
}
