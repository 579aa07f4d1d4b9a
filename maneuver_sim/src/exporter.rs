//! JSON exporter for published frames.
//!
//! Captures what the display showed over a run so it can be replayed or
//! diffed between seeds.

use crate::display::PublishedList;
use maneuver_core::{GuardState, Mode};
use maneuver_env::Severity;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use uuid::Uuid;

/// A single captured frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Universal time in seconds
    pub time_sec: f64,

    /// Active mode when captured
    pub mode: Mode,

    /// Warp multiplier in effect
    pub warp_rate: f64,

    /// Displayed vessels, in display order
    pub vessels: Vec<VesselRow>,

    pub guard_state: GuardState,

    /// Guarded vessel ids, soonest node first
    pub guarded: Vec<Uuid>,

    /// Events (clamps, blackouts, etc.)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<SimEvent>,
}

/// One row of the displayed list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VesselRow {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

impl VesselRow {
    /// Rows for every vessel of a published list.
    pub fn from_published(list: &PublishedList) -> Vec<Self> {
        list.entities
            .iter()
            .map(|e| Self {
                id: e.id.as_uuid(),
                name: e.name.clone(),
                event_time: e.event_time(),
                severity: list.severities.get(&e.id).copied(),
            })
            .collect()
    }
}

/// Simulation event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimEvent {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl SimEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: None,
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: Some("warn".to_string()),
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Universal time covered by the frames
    pub duration_sec: f64,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    pub passed: bool,

    /// Warp clamps issued over the run
    pub clamps: u64,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            frames: Vec::new(),
            passed: false,
            clamps: 0,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        if let Some(first) = self.frames.first() {
            self.duration_sec = frame.time_sec - first.time_sec;
        }
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, clamps: u64) {
        self.passed = passed;
        self.clamps = clamps;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maneuver_env::{EntityId, EntitySnapshot, SeverityMap};

    fn frame(time_sec: f64) -> SimFrame {
        SimFrame {
            time_sec,
            mode: Mode::ByEventTime,
            warp_rate: 1.0,
            vessels: Vec::new(),
            guard_state: GuardState::Idle,
            guarded: Vec::new(),
            events: Vec::new(),
        }
    }

    #[test]
    fn test_duration_tracks_frames() {
        let mut export = SimExport::new("baseline", 42);
        export.add_frame(frame(100.0));
        export.add_frame(frame(160.0));

        assert_eq!(export.duration_sec, 60.0);
        assert_eq!(export.frames.len(), 2);
    }

    #[test]
    fn test_rows_carry_severity_and_skip_empty_fields() {
        let id = EntityId::from_seed(2);
        let mut severities = SeverityMap::new();
        severities.insert(id, Severity::Warning);
        let list = PublishedList {
            entities: vec![
                EntitySnapshot::new(EntityId::from_seed(1), "Bravo"),
                EntitySnapshot::new(id, "Alpha").with_event(1000.0, 35.0),
            ],
            severities,
        };

        let rows = VesselRow::from_published(&list);
        let json = serde_json::to_value(&rows).unwrap();

        assert!(json[0].get("severity").is_none());
        assert!(json[0].get("event_time").is_none());
        assert_eq!(json[1]["severity"], "warning");
        assert_eq!(json[1]["event_time"], 1000.0);
    }

    #[test]
    fn test_export_serializes_mode_names() {
        let mut export = SimExport::new("mode_flip", 7);
        export.add_frame(frame(0.0));
        export.finalize(true, 3);

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["frames"][0]["mode"], "by_event_time");
        assert_eq!(json["frames"][0]["guard_state"], "idle");
        assert_eq!(json["clamps"], 3);
        assert!(json["frames"][0].get("events").is_none());
    }
}
