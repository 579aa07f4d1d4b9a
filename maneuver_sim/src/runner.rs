//! Scenario runner - executes deterministic host scenarios.

use crate::display::SimSettings;
use crate::exporter::{SimEvent, SimExport};
use crate::scenarios::ScenarioId;
use crate::world::{SimConfig, SimWorld, TickOutcome};

use maneuver_core::{classify_sequence, Mode, SledConfigStore, FILTER_KEY, MODE_KEY};
use maneuver_env::{ConfigStore, EntityId, EntitySnapshot, LifecycleEvent, ManeuverNode, Severity};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Ticks a scripted warp loop may run before giving up.
const MAX_SCRIPTED_TICKS: u64 = 20_000;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total ticks executed
    pub total_ticks: u64,

    /// Final universal time in seconds
    pub final_time_secs: f64,

    /// Vessels tracked at the end
    pub final_vessel_count: usize,

    /// Failure message if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioMetrics {
    /// Lists accepted by the display
    pub publishes: u64,

    /// Publishes refused by a hidden display
    pub rejected_publishes: u64,

    /// Warp clamps issued
    pub clamps: u64,

    /// Lifecycle notifications raised by the fleet
    pub lifecycle_events: u64,

    /// Guard rebuilds observed
    pub guard_rebuilds: u64,

    /// View transforms run
    pub view_recomputes: u64,

    /// Mode changes requested by the script
    pub mode_changes: u64,
}

type Check = Result<(), String>;

fn ensure(condition: bool, reason: impl FnOnce() -> String) -> Check {
    if condition {
        Ok(())
    } else {
        Err(reason())
    }
}

/// Ordering the display should show for the fleet as it is now.
fn expected_list(world: &SimWorld) -> Vec<EntitySnapshot> {
    world.queue.mode().view().transform(&world.fleet.visible_snapshots())
}

/// The displayed list (and its classification) matches the live fleet.
fn check_display_matches_fleet(world: &SimWorld) -> Check {
    let shown = world.display.last().ok_or_else(|| "nothing was published".to_string())?;
    let expected = expected_list(world);
    ensure(shown.entities == expected, || {
        format!(
            "{} list out of date at t={:.1}: shown {} vessels, fleet has {}",
            world.queue.mode(),
            world.time(),
            shown.entities.len(),
            expected.len()
        )
    })?;

    if world.queue.mode() == Mode::ByEventTime {
        let severities = classify_sequence(&expected, world.time(), world.config.lead_time_secs);
        ensure(shown.severities == severities, || {
            format!("classification mismatch at t={:.1}", world.time())
        })?;
    } else {
        ensure(shown.severities.is_empty(), || {
            format!("{} list carried a classification", world.queue.mode())
        })?;
    }
    Ok(())
}

/// Every clamp happened before its node.
fn check_trigger_margins(world: &SimWorld) -> Check {
    let lead = world.config.lead_time_secs;
    for trigger in world.triggers() {
        let margin = trigger.event_time - trigger.now;
        ensure(margin > 0.0 && margin <= lead, || {
            format!(
                "clamp for {} at t={:.1} left {:.1}s (lead {:.0}s)",
                trigger.entity, trigger.now, margin, lead
            )
        })?;
    }
    Ok(())
}

fn last_severity(world: &SimWorld, id: EntityId) -> Option<Severity> {
    world.display.last()?.severities.get(&id).copied()
}

fn current_filter(world: &SimWorld) -> Option<String> {
    world.queue.config_store()?.get_value(FILTER_KEY).ok().flatten()
}

/// Runs host scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Vessels launched by populating scenarios
    num_vessels: usize,

    /// Tick rate in Hz
    tick_rate_hz: u32,

    /// Warp rate the scripted player asks for
    warp_rate: f64,

    /// Maximum duration in seconds
    max_duration_secs: f64,

    /// Capture a frame every N ticks when exporting
    record_interval: u64,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64, num_vessels: usize) -> Self {
        Self {
            seed,
            num_vessels,
            tick_rate_hz: 30,
            warp_rate: 1_000.0,
            max_duration_secs: 60.0,
            record_interval: 10,
        }
    }

    /// Sets the tick rate.
    pub fn with_tick_rate(mut self, hz: u32) -> Self {
        self.tick_rate_hz = hz.max(1);
        self
    }

    /// Sets the maximum duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.max_duration_secs = secs;
        self
    }

    /// Sets the warp rate the player asks for.
    pub fn with_warp_rate(mut self, rate: f64) -> Self {
        self.warp_rate = rate;
        self
    }

    /// Sets the export frame interval.
    pub fn with_record_interval(mut self, ticks: u64) -> Self {
        self.record_interval = ticks.max(1);
        self
    }

    fn config(&self) -> SimConfig {
        SimConfig {
            seed: self.seed,
            num_vessels: self.num_vessels,
            tick_rate_hz: self.tick_rate_hz,
            warp_rate: self.warp_rate,
            max_duration_secs: self.max_duration_secs,
            record_interval: Some(self.record_interval),
            ..SimConfig::default()
        }
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.execute(scenario, false).0
    }

    /// Runs a scenario while capturing published frames.
    pub fn run_with_export(&self, scenario: ScenarioId) -> (ScenarioResult, Option<SimExport>) {
        self.execute(scenario, true)
    }

    fn execute(&self, scenario: ScenarioId, record: bool) -> (ScenarioResult, Option<SimExport>) {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);

        let mut world = match self.build_world(scenario) {
            Ok(world) => world,
            Err(reason) => return (self.setup_failure(scenario, reason), None),
        };
        if record {
            world.start_recording(scenario.name());
        }
        world.queue.start();

        let mut metrics = ScenarioMetrics::default();
        let outcome = match scenario {
            ScenarioId::Baseline => self.run_baseline(&mut world, &mut metrics),
            ScenarioId::NodeRush => self.run_node_rush(&mut world, &mut metrics),
            ScenarioId::FleetChurn => self.run_fleet_churn(&mut world, &mut metrics),
            ScenarioId::TimeSlip => self.run_time_slip(&mut world, &mut metrics),
            ScenarioId::Blackout => self.run_blackout(&mut world, &mut metrics),
            ScenarioId::ModeFlip => self.run_mode_flip(&mut world, &mut metrics),
        };

        metrics.publishes = world.display.publish_count();
        metrics.rejected_publishes = world.display.rejected_count();
        metrics.clamps = world.warp.clamp_count();
        metrics.lifecycle_events = world.fleet.events_emitted();
        metrics.guard_rebuilds = world.guard_rebuilds();
        metrics.view_recomputes = world.queue.view_index().recompute_count();

        let passed = outcome.is_ok();
        if passed {
            info!(
                "✓ {} complete: {} publishes, {} clamps, {} lifecycle events",
                scenario.name(),
                metrics.publishes,
                metrics.clamps,
                metrics.lifecycle_events
            );
        }
        let export = world.finish_recording(passed);

        let result = ScenarioResult {
            scenario,
            seed: self.seed,
            passed,
            total_ticks: world.tick_count(),
            final_time_secs: world.time(),
            final_vessel_count: world.fleet.len(),
            failure_reason: outcome.err(),
            metrics,
        };
        (result, export)
    }

    fn build_world(&self, scenario: ScenarioId) -> Result<SimWorld, String> {
        let config = self.config();
        if scenario != ScenarioId::ModeFlip {
            return Ok(SimWorld::new(config));
        }

        // A settings file from an earlier session, with a filter set.
        let mut store = SledConfigStore::open_temp().map_err(|e| e.to_string())?;
        store.set_value(FILTER_KEY, "probes").map_err(|e| e.to_string())?;
        store.save().map_err(|e| e.to_string())?;
        Ok(SimWorld::with_store(config, store))
    }

    fn setup_failure(&self, scenario: ScenarioId, reason: String) -> ScenarioResult {
        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: false,
            total_ticks: 0,
            final_time_secs: 0.0,
            final_vessel_count: 0,
            failure_reason: Some(reason),
            metrics: ScenarioMetrics::default(),
        }
    }

    /// One tick; the player puts warp back unless the guard just clamped it.
    fn warp_tick(&self, world: &mut SimWorld) -> TickOutcome {
        let outcome = world.tick();
        if outcome.trigger.is_none() {
            world.warp.set_rate(self.warp_rate);
        }

        if world.tick_count() % self.tick_rate_hz as u64 == 0 {
            debug!(
                "  t={:.0}s | warp={}x | vessels={} | guarded={}",
                world.time(),
                world.warp.rate(),
                world.fleet.len(),
                world.queue.guard().len()
            );
        }
        outcome
    }

    /// Warps at `rate` until universal time reaches `target`.
    fn warp_until(&self, world: &mut SimWorld, target: f64, rate: f64) -> Check {
        world.warp.set_rate(rate);
        let mut ticks = 0;
        while world.time() < target {
            let outcome = world.tick();
            if outcome.trigger.is_none() {
                world.warp.set_rate(rate);
            }
            ticks += 1;
            ensure(ticks < MAX_SCRIPTED_TICKS, || format!("never reached t={:.0}", target))?;
        }
        Ok(())
    }

    /// MQ-001: Baseline - the reference fleet end to end.
    fn run_baseline(&self, world: &mut SimWorld, metrics: &mut ScenarioMetrics) -> Check {
        info!("MQ-001: Baseline - reference fleet");

        world.fleet.launch("Bravo", None);
        let alpha = world.fleet.launch("Alpha", Some(ManeuverNode::new(1000.0, 35.0)));
        let charlie = world.fleet.launch("Charlie", Some(ManeuverNode::new(1100.0, 12.5)));
        world.queue.display_refresh();
        check_display_matches_fleet(world)?;

        world.queue.set_mode(Mode::ByName);
        metrics.mode_changes += 1;
        let names: Vec<String> = world
            .display
            .last()
            .map(|list| list.entities.into_iter().map(|e| e.name).collect())
            .unwrap_or_default();
        ensure(names == ["Alpha", "Bravo", "Charlie"], || format!("ByName showed {:?}", names))?;

        world.queue.set_mode(Mode::ByEventTime);
        metrics.mode_changes += 1;
        let shown = world.display.last().map(|list| list.ids()).unwrap_or_default();
        ensure(shown == [alpha, charlie], || "ByEventTime must list Alpha then Charlie".to_string())?;
        for id in [alpha, charlie] {
            ensure(last_severity(world, id) == Some(Severity::Warning), || {
                format!("{} should be a clustered warning", id)
            })?;
        }
        ensure(world.queue.guard().guarded_ids() == [alpha, charlie], || {
            "both nodes are more than 900 s out and must be guarded".to_string()
        })?;

        self.warp_until(world, 1_200.0, 100.0)?;

        let clamped: Vec<EntityId> = world.triggers().iter().map(|t| t.entity).collect();
        ensure(clamped == [alpha, charlie], || format!("clamps went to {:?}", clamped))?;
        check_trigger_margins(world)?;
        for id in [alpha, charlie] {
            ensure(last_severity(world, id) == Some(Severity::Passed), || {
                format!("{} should have passed", id)
            })?;
        }
        check_display_matches_fleet(world)
    }

    /// MQ-002: NodeRush - every guarded node gets its clamp in time.
    fn run_node_rush(&self, world: &mut SimWorld, metrics: &mut ScenarioMetrics) -> Check {
        info!("MQ-002: NodeRush - warp into a node cluster");

        world.populate();
        let rush_start = world.time() + 5_000.0;
        for (i, offset) in [0.0, 10.0, 20.0, 400.0].into_iter().enumerate() {
            world
                .fleet
                .launch(format!("Rush {}", i + 1), Some(ManeuverNode::new(rush_start + offset, 50.0)));
        }
        world.queue.pump_events();
        world.queue.set_mode(Mode::ByEventTime);
        metrics.mode_changes += 1;

        let lead = world.config.lead_time_secs;
        let guarded: Vec<(EntityId, f64)> = world
            .queue
            .guard()
            .guarded_ids()
            .into_iter()
            .filter_map(|id| Some((id, world.fleet.vessel(id)?.node?.time)))
            .collect();
        ensure(guarded.len() >= 4, || format!("only {} vessels guarded", guarded.len()))?;

        for _ in 0..world.config.target_ticks() {
            self.warp_tick(world);
            check_display_matches_fleet(world)?;
        }

        check_trigger_margins(world)?;
        let clamped: HashSet<EntityId> = world.triggers().iter().map(|t| t.entity).collect();
        ensure(clamped.len() == world.triggers().len(), || "a vessel was clamped twice".to_string())?;

        let now = world.time();
        let due: Vec<EntityId> = guarded
            .iter()
            .filter(|(_, t)| t - lead <= now)
            .map(|(id, _)| *id)
            .collect();
        let pending = due.iter().filter(|id| world.queue.guard().contains(**id)).count();
        ensure(clamped.len() + pending == due.len(), || {
            format!(
                "{} nodes came due, {} clamped, {} pending",
                due.len(),
                clamped.len(),
                pending
            )
        })?;
        ensure(world.guard_rebuilds() == 1, || {
            format!("guard rebuilt {} times without lifecycle events", world.guard_rebuilds())
        })
    }

    /// MQ-003: FleetChurn - the list stays coherent through constant churn.
    fn run_fleet_churn(&self, world: &mut SimWorld, metrics: &mut ScenarioMetrics) -> Check {
        info!("MQ-003: FleetChurn - lifecycle storm under warp");

        world.populate();
        world.queue.pump_events();
        world.queue.set_mode(Mode::ByEventTime);
        metrics.mode_changes += 1;

        let mut rng = ChaCha8Rng::seed_from_u64(world.config.script_seed());
        let lead = world.config.lead_time_secs;
        let mut clamped_per_generation: HashMap<u64, HashSet<EntityId>> = HashMap::new();
        let mut last_guard = (world.queue.guard().generation(), world.queue.guard().len());

        for tick in 0..world.config.target_ticks() {
            if rng.gen_bool(0.2) {
                let kind = world.fleet.churn(world.time(), lead);
                world.record_event(SimEvent::info(format!("churn: {:?}", kind)));
            }
            if tick % 60 == 59 {
                let next = Mode::SELECTABLE[(tick / 60 % 3) as usize];
                world.queue.set_mode(next);
                metrics.mode_changes += 1;
            }

            let outcome = self.warp_tick(world);
            check_display_matches_fleet(world)?;

            let guard = world.queue.guard();
            let generation = guard.generation();
            if generation == last_guard.0 {
                ensure(guard.len() <= last_guard.1, || {
                    format!("guarded set grew without a rebuild at tick {}", tick)
                })?;
            }
            last_guard = (generation, guard.len());

            if let Some(trigger) = outcome.trigger {
                let seen = clamped_per_generation.entry(generation.unwrap_or(0)).or_default();
                ensure(seen.insert(trigger.entity), || {
                    format!("{} clamped twice in one generation", trigger.entity)
                })?;
            }
        }

        check_trigger_margins(world)
    }

    /// MQ-004: TimeSlip - a backward clock jump re-evaluates without re-arming.
    fn run_time_slip(&self, world: &mut SimWorld, metrics: &mut ScenarioMetrics) -> Check {
        info!("MQ-004: TimeSlip - save reload");

        let relay = world.fleet.launch("Relay", Some(ManeuverNode::new(3_000.0, 40.0)));
        let lander = world.fleet.launch("Lander", Some(ManeuverNode::new(6_000.0, 310.0)));
        let station = world.fleet.launch("Station", Some(ManeuverNode::new(9_000.0, 12.0)));
        world.queue.pump_events();
        world.queue.set_mode(Mode::ByEventTime);
        metrics.mode_changes += 1;

        self.warp_until(world, 5_200.0, 100.0)?;
        ensure(world.triggers().len() == 2, || {
            format!("expected 2 clamps before the reload, got {}", world.triggers().len())
        })?;
        ensure(last_severity(world, relay) == Some(Severity::Passed), || {
            "Relay's node should have passed".to_string()
        })?;

        // Quickload: the clock jumps back with no lifecycle notification yet.
        world.clock.set_time(500.0);
        world.record_event(SimEvent::warn("save loaded: t=500"));
        world.warp.set_rate(1.0);
        for _ in 0..30 {
            world.tick();
        }
        ensure(world.triggers().len() == 2, || "guard re-armed without a rebuild".to_string())?;
        ensure(world.queue.guard().guarded_ids() == [station], || {
            "only Station should still be guarded".to_string()
        })?;
        ensure(last_severity(world, relay) == Some(Severity::Normal), || {
            "Relay should be back to normal after the jump".to_string()
        })?;

        // The reload recreates the vessels.
        world.fleet.announce(LifecycleEvent::Created(relay));
        world.tick();
        ensure(world.queue.guard().guarded_ids() == [relay, lander, station], || {
            format!("guard holds {:?} after reload", world.queue.guard().guarded_ids())
        })?;

        self.warp_until(world, 5_200.0, 100.0)?;
        let clamped: Vec<EntityId> = world.triggers().iter().map(|t| t.entity).collect();
        ensure(clamped == [relay, lander, relay, lander], || format!("clamps went to {:?}", clamped))?;
        check_trigger_margins(world)
    }

    /// MQ-005: Blackout - degraded collaborators never wedge the queue.
    fn run_blackout(&self, world: &mut SimWorld, metrics: &mut ScenarioMetrics) -> Check {
        info!("MQ-005: Blackout - collaborators offline");

        let settings: SimSettings = world
            .settings
            .clone()
            .ok_or_else(|| "blackout needs simulated settings".to_string())?;
        let lead = world.config.lead_time_secs;
        let phase = (world.config.target_ticks() / 3).max(3);

        world.populate();
        world.queue.pump_events();
        world.queue.set_mode(Mode::ByName);
        metrics.mode_changes += 1;
        for _ in 0..phase {
            self.warp_tick(world);
        }
        check_display_matches_fleet(world)?;
        let known: HashSet<EntityId> = world
            .display
            .last()
            .map(|list| list.ids())
            .unwrap_or_default()
            .into_iter()
            .collect();

        // Stall: the tracking list and the settings file cannot be read.
        world.fleet.set_available(false);
        settings.set_available(false);
        world.record_event(SimEvent::warn("tracking list and settings offline"));
        for i in 0..phase {
            if i % 5 == 0 {
                world.fleet.churn(world.time(), lead);
            }
            self.warp_tick(world);
        }
        world.queue.set_mode(Mode::ByEventTime);
        metrics.mode_changes += 1;
        world.tick();
        ensure(world.queue.mode() == Mode::ByEventTime, || "mode change lost during stall".to_string())?;
        let shown = world.display.last().map(|l| l.ids()).unwrap_or_default();
        ensure(shown.iter().all(|id| known.contains(id)), || {
            "display showed vessels the queue could not have read".to_string()
        })?;

        // Scene switch: the list is hidden.
        world.queue.suspend();
        world.display.set_available(false);
        let publishes = world.display.publish_count();
        for i in 0..phase {
            if i % 5 == 0 {
                world.fleet.churn(world.time(), lead);
            }
            self.warp_tick(world);
        }
        ensure(world.display.publish_count() == publishes, || "published while suspended".to_string())?;
        ensure(world.display.rejected_count() == 0, || "publish attempted while suspended".to_string())?;

        // Recovery.
        world.fleet.set_available(true);
        settings.set_available(true);
        world.display.set_available(true);
        world.record_event(SimEvent::info("collaborators back online"));
        ensure(world.queue.resume(), || "resume did not republish".to_string())?;
        check_display_matches_fleet(world)?;
        self.warp_tick(world);
        check_display_matches_fleet(world)?;

        let saves = settings.save_count();
        world.queue.shutdown();
        ensure(settings.save_count() > saves, || "shutdown did not save settings".to_string())?;
        ensure(settings.peek(MODE_KEY).as_deref() == Some("by_event_time"), || {
            format!("settings hold {:?} after shutdown", settings.peek(MODE_KEY))
        })
    }

    /// MQ-006: ModeFlip - idempotent switching and filter restore over sled.
    fn run_mode_flip(&self, world: &mut SimWorld, metrics: &mut ScenarioMetrics) -> Check {
        info!("MQ-006: ModeFlip - rapid mode switching");

        world.populate();
        world.queue.pump_events();
        world.queue.display_refresh();
        let lead = world.config.lead_time_secs;
        let mut rng = ChaCha8Rng::seed_from_u64(world.config.script_seed());

        for round in 0..40 {
            let current = world.queue.mode();
            let target = if rng.gen_bool(0.3) {
                current
            } else {
                Mode::SELECTABLE.choose(&mut rng).copied().unwrap_or(Mode::Default)
            };

            let before = world.display.publish_count();
            let switched = world.queue.set_mode(target);
            let published = world.display.publish_count() - before;

            if target == current {
                ensure(!switched && published == 0, || {
                    format!("round {}: re-selecting {} republished", round, target)
                })?;
            } else {
                ensure(switched && published == 1, || {
                    format!("round {}: {} -> {} published {} times", round, current, target, published)
                })?;
                metrics.mode_changes += 1;
            }

            if current == Mode::ByEventTime && target != Mode::ByEventTime {
                ensure(current_filter(world).as_deref() == Some("probes"), || {
                    format!("round {}: filter not restored, found {:?}", round, current_filter(world))
                })?;
            }
            if target == Mode::ByEventTime {
                // The player widens the host filter while looking at nodes.
                if let Some(store) = world.queue.config_store_mut() {
                    store.set_value(FILTER_KEY, "all").map_err(|e| e.to_string())?;
                }
            }

            if rng.gen_bool(0.5) {
                world.fleet.churn(world.time(), lead);
            }
            for _ in 0..5 {
                self.warp_tick(world);
            }
            check_display_matches_fleet(world)?;
        }

        let last = world.queue.mode();
        world.queue.shutdown();
        if let Some(store) = world.queue.config_store_mut() {
            store.load().map_err(|e| e.to_string())?;
        }
        ensure(world.queue.persisted_mode() == last, || {
            format!("sled holds {} but {} was active", world.queue.persisted_mode(), last)
        })
    }
}
