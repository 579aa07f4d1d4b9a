//! Common types shared by the queue core and its host.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for a tracked vessel.
///
/// Hosts that already key vessels by GUID map them straight through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Creates a deterministic EntityId from a seed (for simulation).
    pub fn from_seed(seed: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0..8].copy_from_slice(&seed.to_le_bytes());
        bytes[8..16].copy_from_slice(&seed.wrapping_mul(0x517cc1b727220a95).to_le_bytes());
        Self(Uuid::from_bytes(bytes))
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show first 8 chars for readability
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// A scheduled maneuver node: when it fires and how large the burn is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ManeuverNode {
    /// Universal time of the burn (simulated seconds)
    pub time: f64,

    /// Burn magnitude (delta-v, m/s)
    pub magnitude: f64,
}

impl ManeuverNode {
    pub fn new(time: f64, magnitude: f64) -> Self {
        Self { time, magnitude }
    }

    /// Seconds remaining until the node, negative once it has passed.
    pub fn time_until(&self, now: f64) -> f64 {
        self.time - now
    }
}

/// Immutable view of one vessel as of the last refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Stable identity
    pub id: EntityId,

    /// Display name, compared ordinally
    pub name: String,

    /// Next scheduled maneuver node, if any
    pub next_event: Option<ManeuverNode>,
}

impl EntitySnapshot {
    /// Creates a snapshot with no scheduled event.
    pub fn new(id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            next_event: None,
        }
    }

    /// Attaches a maneuver node.
    pub fn with_event(mut self, time: f64, magnitude: f64) -> Self {
        self.next_event = Some(ManeuverNode::new(time, magnitude));
        self
    }

    /// Returns the next event if it carries a usable timestamp.
    ///
    /// A node whose time is NaN is treated as no scheduled event.
    pub fn scheduled_event(&self) -> Option<&ManeuverNode> {
        self.next_event.as_ref().filter(|node| !node.time.is_nan())
    }

    /// Shorthand for the scheduled event's time.
    pub fn event_time(&self) -> Option<f64> {
        self.scheduled_event().map(|node| node.time)
    }
}

/// Host notifications that make the current vessel list stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    /// A vessel came into existence
    Created(EntityId),

    /// A vessel was destroyed or recovered
    Destroyed(EntityId),

    /// A vessel was discovered or its tracking visibility changed
    VisibilityChanged(EntityId),

    /// A vessel was renamed
    Renamed(EntityId),
}

impl LifecycleEvent {
    /// Returns the vessel the notification is about.
    pub fn entity(&self) -> EntityId {
        match self {
            LifecycleEvent::Created(id)
            | LifecycleEvent::Destroyed(id)
            | LifecycleEvent::VisibilityChanged(id)
            | LifecycleEvent::Renamed(id) => *id,
        }
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleEvent::Created(_) => "created",
            LifecycleEvent::Destroyed(_) => "destroyed",
            LifecycleEvent::VisibilityChanged(_) => "visibility_changed",
            LifecycleEvent::Renamed(_) => "renamed",
        }
    }
}

/// How urgently a vessel's next node needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Comfortably in the future
    Normal,

    /// Inside the lead-time window, or clustered with a neighbouring node
    Warning,

    /// Already in the past
    Passed,
}

impl Severity {
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Normal => "normal",
            Severity::Warning => "warning",
            Severity::Passed => "passed",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Classification of every scheduled vessel in a published list.
pub type SeverityMap = HashMap<EntityId, Severity>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_from_seed_is_deterministic() {
        assert_eq!(EntityId::from_seed(7), EntityId::from_seed(7));
        assert_ne!(EntityId::from_seed(7), EntityId::from_seed(8));
    }

    #[test]
    fn test_entity_id_display_is_short() {
        let id = EntityId::from_seed(1);
        assert_eq!(id.to_string().len(), 8);
    }

    #[test]
    fn test_nan_event_is_unscheduled() {
        let id = EntityId::from_seed(1);
        let vessel = EntitySnapshot::new(id, "Probe").with_event(f64::NAN, 10.0);
        assert!(vessel.next_event.is_some());
        assert!(vessel.scheduled_event().is_none());
        assert_eq!(vessel.event_time(), None);
    }

    #[test]
    fn test_time_until() {
        let node = ManeuverNode::new(1000.0, 5.0);
        assert_eq!(node.time_until(400.0), 600.0);
        assert_eq!(node.time_until(1200.0), -200.0);
    }

    #[test]
    fn test_lifecycle_event_entity() {
        let id = EntityId::from_seed(3);
        assert_eq!(LifecycleEvent::Renamed(id).entity(), id);
        assert_eq!(LifecycleEvent::Destroyed(id).kind(), "destroyed");
    }

    #[test]
    fn test_severity_serializes_snake_case() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }
}
