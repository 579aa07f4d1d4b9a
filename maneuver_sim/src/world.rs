//! SimWorld - The simulation harness container.

use crate::context::{SimClock, SimWarp};
use crate::display::{SimDisplay, SimSettings};
use crate::exporter::{SimEvent, SimExport, SimFrame, VesselRow};
use crate::fleet::SimFleet;

use maneuver_core::{GuardTrigger, HostBindings, ManeuverQueue, QueueConfig, DEFAULT_LEAD_TIME_SECS};
use maneuver_env::ConfigStore;
use tracing::debug;

/// Configuration for a simulation run.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Master seed for determinism
    pub seed: u64,

    /// Vessels launched at start
    pub num_vessels: usize,

    /// Tick rate in Hz (physics steps per real second)
    pub tick_rate_hz: u32,

    /// Warp rate the player asks for
    pub warp_rate: f64,

    /// Maximum real duration in seconds
    pub max_duration_secs: f64,

    /// Lead time handed to the queue
    pub lead_time_secs: f64,

    /// Capture a frame every N ticks (None = no capture)
    pub record_interval: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_vessels: 12,
            tick_rate_hz: 30,
            warp_rate: 1_000.0,
            max_duration_secs: 60.0,
            lead_time_secs: DEFAULT_LEAD_TIME_SECS,
            record_interval: None,
        }
    }
}

impl SimConfig {
    /// Physics seed, derived so that tick-rate changes don't reshuffle the fleet.
    pub fn physics_seed(&self) -> u64 {
        self.seed.wrapping_mul(0x9e3779b97f4a7c15)
    }

    /// Seed for scripted player and host behaviour.
    pub fn script_seed(&self) -> u64 {
        self.seed.wrapping_mul(0x517cc1b727220a95)
    }

    /// Total ticks a run lasts.
    pub fn target_ticks(&self) -> u64 {
        (self.max_duration_secs * self.tick_rate_hz as f64) as u64
    }
}

/// What one tick produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickOutcome {
    /// Universal time before the tick
    pub previous_time: f64,

    /// Guard clamp issued this tick
    pub trigger: Option<GuardTrigger>,

    /// Whether the display received a new list
    pub published: bool,

    /// Warp rate the tick advanced with
    pub warp_rate: f64,
}

/// The SimWorld - a tracking station with a queue installed.
pub struct SimWorld {
    /// Configuration
    pub config: SimConfig,

    /// Shared virtual clock
    pub clock: SimClock,

    /// Ground truth fleet
    pub fleet: SimFleet,

    pub display: SimDisplay,

    pub warp: SimWarp,

    /// Settings handle, when the queue uses `SimSettings`
    pub settings: Option<SimSettings>,

    /// The system under test
    pub queue: ManeuverQueue,

    /// Current tick count
    tick_count: u64,

    /// Every clamp, in order
    triggers: Vec<GuardTrigger>,

    /// Guard generations observed
    guard_rebuilds: u64,
    last_guard_generation: Option<u64>,

    /// Captured frames
    export: Option<SimExport>,

    /// Events waiting for the next captured frame
    pending_events: Vec<SimEvent>,
}

impl SimWorld {
    /// Creates a world whose settings live in a `SimSettings`.
    pub fn new(config: SimConfig) -> Self {
        let settings = SimSettings::new();
        let mut world = Self::with_store(config, settings.clone());
        world.settings = Some(settings);
        world
    }

    /// Creates a world with the given settings store.
    pub fn with_store(config: SimConfig, store: impl ConfigStore + 'static) -> Self {
        let clock = SimClock::new(0.0);
        let fleet = SimFleet::new(config.physics_seed());
        let display = SimDisplay::new();
        let warp = SimWarp::new();
        warp.set_rate(config.warp_rate);

        let host = HostBindings::new(fleet.clone(), clock.clone())
            .with_display(display.clone())
            .with_acceleration(warp.clone())
            .with_store(store);
        let queue_config = QueueConfig {
            lead_time_secs: config.lead_time_secs,
            ..QueueConfig::default()
        };

        Self {
            config,
            clock,
            fleet,
            display,
            warp,
            settings: None,
            queue: ManeuverQueue::new(host, queue_config),
            tick_count: 0,
            triggers: Vec::new(),
            guard_rebuilds: 0,
            last_guard_generation: None,
            export: None,
            pending_events: Vec::new(),
        }
    }

    /// Launches the configured number of random vessels.
    pub fn populate(&mut self) {
        self.fleet
            .populate(self.config.num_vessels, self.clock.time(), self.config.lead_time_secs);
    }

    /// Starts frame capture under the given scenario name.
    pub fn start_recording(&mut self, scenario: &str) {
        self.export = Some(SimExport::new(scenario, self.config.seed));
    }

    /// Notes an event on the next captured frame.
    pub fn record_event(&mut self, event: SimEvent) {
        if self.export.is_some() {
            self.pending_events.push(event);
        }
    }

    /// Advances simulation by one tick: time moves at the current warp rate,
    /// then the queue runs its guard step and display refresh.
    pub fn tick(&mut self) -> TickOutcome {
        let warp_rate = self.warp.rate();
        let previous_time = self.clock.time();
        self.clock.advance(warp_rate / self.config.tick_rate_hz as f64);

        let trigger = self.queue.simulation_step();
        let published = self.queue.display_refresh();
        self.tick_count += 1;

        self.observe_guard();
        if let Some(trigger) = trigger {
            self.triggers.push(trigger);
            self.record_event(SimEvent::warn(format!(
                "warp clamped for {} ({:.0}s to node)",
                trigger.entity,
                trigger.event_time - trigger.now
            )));
        }
        self.capture_frame(false);

        TickOutcome {
            previous_time,
            trigger,
            published,
            warp_rate,
        }
    }

    fn observe_guard(&mut self) {
        let generation = self.queue.guard().generation();
        if generation.is_some() && generation != self.last_guard_generation {
            self.guard_rebuilds += 1;
            self.last_guard_generation = generation;
        }
    }

    /// Captures a frame if recording is on and the interval is due (or `force`).
    pub fn capture_frame(&mut self, force: bool) {
        if self.export.is_none() {
            return;
        }
        let due = match self.config.record_interval {
            Some(interval) if interval > 0 => self.tick_count % interval == 0,
            _ => false,
        };
        if !force && !due {
            return;
        }

        let vessels = self
            .display
            .last()
            .map(|list| VesselRow::from_published(&list))
            .unwrap_or_default();
        let frame = SimFrame {
            time_sec: self.clock.time(),
            mode: self.queue.mode(),
            warp_rate: self.warp.rate(),
            vessels,
            guard_state: self.queue.guard().state(),
            guarded: self
                .queue
                .guard()
                .guarded_ids()
                .iter()
                .map(|id| id.as_uuid())
                .collect(),
            events: std::mem::take(&mut self.pending_events),
        };

        if let Some(export) = self.export.as_mut() {
            debug!(time = frame.time_sec, rows = frame.vessels.len(), "frame captured");
            export.add_frame(frame);
        }
    }

    /// Ends capture and returns the export, if recording was on.
    pub fn finish_recording(&mut self, passed: bool) -> Option<SimExport> {
        self.capture_frame(true);
        let mut export = self.export.take()?;
        export.finalize(passed, self.warp.clamp_count());
        Some(export)
    }

    /// Returns the current universal time in seconds.
    pub fn time(&self) -> f64 {
        self.clock.time()
    }

    /// Returns the current tick count.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn triggers(&self) -> &[GuardTrigger] {
        &self.triggers
    }

    /// Guard rebuilds observed across ticks.
    pub fn guard_rebuilds(&self) -> u64 {
        self.guard_rebuilds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maneuver_core::Mode;

    #[test]
    fn test_sim_world_tick_advances_at_warp_rate() {
        let config = SimConfig {
            tick_rate_hz: 10,
            warp_rate: 100.0,
            ..Default::default()
        };
        let mut world = SimWorld::new(config);
        world.queue.start();

        assert_eq!(world.tick_count(), 0);
        let outcome = world.tick();

        assert_eq!(world.tick_count(), 1);
        assert_eq!(outcome.warp_rate, 100.0);
        assert!((world.time() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_sim_world_determinism() {
        let config = SimConfig::default();
        let mut world1 = SimWorld::new(config.clone());
        let mut world2 = SimWorld::new(config);

        world1.populate();
        world2.populate();

        assert_eq!(world1.fleet.vessels(), world2.fleet.vessels());
    }

    #[test]
    fn test_world_start_publishes_fleet() {
        let mut world = SimWorld::new(SimConfig::default());
        world.populate();
        world.queue.start();
        world.queue.set_mode(Mode::ByName);
        world.tick();

        let shown = world.display.last().unwrap();
        assert_eq!(shown.entities.len(), world.config.num_vessels);
        assert_eq!(world.queue.mode(), Mode::ByName);
    }

    #[test]
    fn test_locked_settings_fall_back_to_default_mode() {
        let mut world = SimWorld::new(SimConfig::default());
        let settings = world.settings.clone().unwrap();
        settings.poke(maneuver_core::MODE_KEY, "by_name");
        settings.set_available(false);
        world.populate();

        world.queue.start();

        assert_eq!(world.queue.mode(), Mode::Default);
        assert_eq!(world.display.publish_count(), 1);
        assert_eq!(settings.save_count(), 0);
    }

    #[test]
    fn test_recording_captures_frames() {
        let config = SimConfig {
            record_interval: Some(5),
            ..Default::default()
        };
        let mut world = SimWorld::new(config);
        world.populate();
        world.queue.start();
        world.start_recording("test");

        for _ in 0..10 {
            world.tick();
        }
        let export = world.finish_recording(true).unwrap();

        // Ticks 5 and 10, plus the closing frame.
        assert_eq!(export.frames.len(), 3);
        assert!(export.passed);
    }
}
