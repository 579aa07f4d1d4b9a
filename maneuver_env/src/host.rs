//! Vessel source and display abstractions for the host runtime.

use crate::error::EnvError;
use crate::types::{EntityId, EntitySnapshot, LifecycleEvent, SeverityMap};

/// The host's list of tracked vessels.
///
/// # Implementations
///
/// - **Production**: the host's tracking list, mapped into snapshots
/// - **Simulation**: `SimFleet` - seeded vessels with scripted churn
///
/// # Notification Flow
///
/// ```text
/// Host                         EntitySource                   Queue core
///   |                               |                              |
///   |-- vessel created ------------>|                              |
///   |                               |-- drain_events() ----------->|-- invalidate()
///   |                               |<-- list_entities() ----------|   (on next read)
/// ```
pub trait EntitySource {
    /// Returns every tracked vessel in the host's own order.
    ///
    /// # Returns
    /// * `Ok(entities)` - The full current list (may be empty)
    /// * `Err(EnvError::Unavailable)` - The host list cannot be read right now
    fn list_entities(&self) -> Result<Vec<EntitySnapshot>, EnvError>;

    /// Drains lifecycle notifications raised since the previous call.
    ///
    /// Hosts that push notifications directly into the queue can rely on
    /// the default, which reports nothing.
    fn drain_events(&mut self) -> Vec<LifecycleEvent> {
        Vec::new()
    }
}

/// Where the ordered vessel list is shown.
pub trait DisplaySink {
    /// Replaces the displayed list.
    ///
    /// # Arguments
    /// * `entities` - Vessels in display order
    /// * `severities` - Severity per vessel; vessels without an entry are unclassified
    fn publish(&mut self, entities: &[EntitySnapshot], severities: &SeverityMap) -> Result<(), EnvError>;

    /// Returns the vessel currently selected in the host UI, if any.
    fn selected_entity(&self) -> Option<EntityId>;

    /// Selects a vessel in the host UI.
    fn set_selected_entity(&mut self, id: EntityId);
}
