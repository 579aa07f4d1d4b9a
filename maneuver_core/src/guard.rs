//! The Scheduling Guard - stops time warp before an imminent maneuver node.
//!
//! # State machine
//!
//! ```text
//!                rebuild (non-empty)
//!   ┌──────┐  ─────────────────────────►  ┌───────┐
//!   │ Idle │                              │ Armed │ ──tick: now ≥ t₀ − lead──► clamp + drop head
//!   └──────┘  ◄─────────────────────────  └───────┘
//!                last guarded vessel dropped
//! ```
//!
//! The guarded set is rebuilt from scratch whenever the ByEventTime view is
//! recomputed, and only ever shrinks in between. Each vessel triggers at most
//! one clamp per generation.

use crate::master_set::Generation;
use maneuver_env::{AccelerationController, EntityId, EntitySnapshot};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info};

/// Minimum margin before a node at which warp is dropped (15 minutes).
pub const DEFAULT_LEAD_TIME_SECS: f64 = 900.0;

/// Whether any vessel is still waiting to trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardState {
    Idle,
    Armed,
}

/// Emitted when a guard tick clamps the warp rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuardTrigger {
    /// Vessel whose node entered the lead-time window
    pub entity: EntityId,

    /// Time of that node
    pub event_time: f64,

    /// Clock reading when the clamp was issued
    pub now: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Guarded {
    id: EntityId,
    event_time: f64,
}

/// Tracks vessels whose node is still outside the lead-time window.
#[derive(Debug, Clone)]
pub struct SchedulingGuard {
    /// Lead time in simulated seconds
    lead_time: f64,

    /// Guarded vessels, soonest node at the front
    guarded: VecDeque<Guarded>,

    /// Generation of the view the set was last rebuilt from
    generation: Option<Generation>,

    /// Total clamps issued
    clamps: u64,
}

impl SchedulingGuard {
    pub fn new(lead_time: f64) -> Self {
        Self {
            lead_time,
            guarded: VecDeque::new(),
            generation: None,
            clamps: 0,
        }
    }

    pub fn lead_time(&self) -> f64 {
        self.lead_time
    }

    pub fn state(&self) -> GuardState {
        if self.guarded.is_empty() {
            GuardState::Idle
        } else {
            GuardState::Armed
        }
    }

    /// Generation of the last rebuild, `None` before the first one.
    pub fn generation(&self) -> Option<Generation> {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.guarded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guarded.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.guarded.iter().any(|g| g.id == id)
    }

    /// Guarded vessel ids, soonest node first.
    pub fn guarded_ids(&self) -> Vec<EntityId> {
        self.guarded.iter().map(|g| g.id).collect()
    }

    /// Clock reading at which the next clamp will fire.
    pub fn next_trigger_time(&self) -> Option<f64> {
        self.guarded.front().map(|g| g.event_time - self.lead_time)
    }

    /// Total clamps issued since creation.
    pub fn clamp_count(&self) -> u64 {
        self.clamps
    }

    /// Rebuilds the guarded set from a freshly computed ByEventTime view.
    ///
    /// Keeps every vessel whose node is strictly more than the lead time
    /// away from `now`.
    pub fn rebuild(&mut self, by_event_time: &[EntitySnapshot], now: f64, generation: Generation) {
        let lead_time = self.lead_time;
        let mut guarded: Vec<Guarded> = by_event_time
            .iter()
            .filter_map(|e| {
                let node = e.scheduled_event()?;
                (node.time_until(now) > lead_time).then_some(Guarded {
                    id: e.id,
                    event_time: node.time,
                })
            })
            .collect();
        // Input is normally already ordered; sorting keeps `rebuild` correct for any slice.
        guarded.sort_by(|a, b| a.event_time.total_cmp(&b.event_time));

        self.guarded = guarded.into();
        self.generation = Some(generation);

        debug!(
            generation,
            guarded = self.guarded.len(),
            state = ?self.state(),
            "guard rebuilt"
        );
    }

    /// Runs one guard tick.
    ///
    /// If the soonest guarded node has entered the lead-time window, clamps
    /// the warp rate (when a controller is present), drops that vessel from
    /// the guarded set and reports the trigger. Acts on at most one vessel.
    pub fn tick<A>(&mut self, now: f64, acceleration: Option<&mut A>) -> Option<GuardTrigger>
    where
        A: AccelerationController + ?Sized,
    {
        let next = *self.guarded.front()?;
        if now < next.event_time - self.lead_time {
            return None;
        }

        self.guarded.pop_front();
        if let Some(acceleration) = acceleration {
            acceleration.clamp_to_normal_rate();
        }
        self.clamps += 1;

        info!(
            vessel = %next.id,
            event_time = next.event_time,
            now,
            remaining = self.guarded.len(),
            "maneuver node inside lead time, warp clamped"
        );
        if self.guarded.is_empty() {
            debug!("guard idle");
        }

        Some(GuardTrigger {
            entity: next.id,
            event_time: next.event_time,
            now,
        })
    }
}

impl Default for SchedulingGuard {
    fn default() -> Self {
        Self::new(DEFAULT_LEAD_TIME_SECS)
    }
}
