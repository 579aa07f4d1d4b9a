//! Test doubles for the host collaborators.
//!
//! Sources, displays and clocks share their state through `Rc` so a test can
//! keep a handle after moving a clone into `HostBindings`.

use maneuver_env::{
    AccelerationController, Clock, ConfigStore, DisplaySink, EntityId, EntitySnapshot, EntitySource,
    EnvError, LifecycleEvent, SeverityMap,
};
use proptest::prelude::*;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

// ============================================================================
// FLEETS
// ============================================================================

/// Bravo (no node), Alpha (node at 1000), Charlie (node at 1100).
pub fn scenario_fleet() -> Vec<EntitySnapshot> {
    vec![
        EntitySnapshot::new(EntityId::from_seed(1), "Bravo"),
        EntitySnapshot::new(EntityId::from_seed(2), "Alpha").with_event(1000.0, 35.0),
        EntitySnapshot::new(EntityId::from_seed(3), "Charlie").with_event(1100.0, 12.5),
    ]
}

/// Fleets with unique ids, colliding names and a mix of scheduled and idle vessels.
pub fn arb_fleet() -> impl Strategy<Value = Vec<EntitySnapshot>> {
    let vessel = (
        prop::sample::select(vec!["Alpha", "alpha", "Bravo", "Relay", "Probe", "Zulu", "Ärger", ""]),
        prop::option::of(-100_000.0f64..100_000.0),
        0.0f64..2_000.0,
    );

    prop::collection::vec(vessel, 0..24).prop_map(|vessels| {
        vessels
            .into_iter()
            .enumerate()
            .map(|(i, (name, time, magnitude))| {
                let entity = EntitySnapshot::new(EntityId::from_seed(i as u64 + 1), name);
                match time {
                    Some(time) => entity.with_event(time, magnitude),
                    None => entity,
                }
            })
            .collect()
    })
}

// ============================================================================
// SOURCE
// ============================================================================

#[derive(Debug, Default)]
struct SourceState {
    entities: Vec<EntitySnapshot>,
    events: Vec<LifecycleEvent>,
    unavailable: bool,
}

/// Scriptable vessel list. Mutations do not raise events on their own.
#[derive(Debug, Clone, Default)]
pub struct FakeSource {
    state: Rc<RefCell<SourceState>>,
}

impl FakeSource {
    pub fn new(entities: Vec<EntitySnapshot>) -> Self {
        Self {
            state: Rc::new(RefCell::new(SourceState {
                entities,
                ..SourceState::default()
            })),
        }
    }

    /// Idle vessels with ids seeded 1, 2, 3...
    pub fn with_names(names: &[&str]) -> Self {
        Self::new(
            names
                .iter()
                .enumerate()
                .map(|(i, name)| EntitySnapshot::new(EntityId::from_seed(i as u64 + 1), *name))
                .collect(),
        )
    }

    pub fn entities(&self) -> Vec<EntitySnapshot> {
        self.state.borrow().entities.clone()
    }

    pub fn push(&self, entity: EntitySnapshot) {
        self.state.borrow_mut().entities.push(entity);
    }

    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().unavailable = !available;
    }

    /// Queues a lifecycle notification for the next `drain_events()`.
    pub fn emit(&self, event: LifecycleEvent) {
        self.state.borrow_mut().events.push(event);
    }
}

impl EntitySource for FakeSource {
    fn list_entities(&self) -> Result<Vec<EntitySnapshot>, EnvError> {
        let state = self.state.borrow();
        if state.unavailable {
            return Err(EnvError::unavailable("fake source offline"));
        }
        Ok(state.entities.clone())
    }

    fn drain_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.state.borrow_mut().events)
    }
}

// ============================================================================
// TIME
// ============================================================================

#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<f64>>,
}

impl ManualClock {
    pub fn new(now: f64) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    pub fn set(&self, now: f64) {
        self.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

/// Counts clamps in a plain field.
#[derive(Debug, Default)]
pub struct RecordingWarp {
    pub clamps: u32,
}

impl AccelerationController for RecordingWarp {
    fn clamp_to_normal_rate(&mut self) {
        self.clamps += 1;
    }
}

/// Like `RecordingWarp`, but clones share one counter.
#[derive(Debug, Clone, Default)]
pub struct SharedWarp {
    clamps: Rc<Cell<u32>>,
}

impl SharedWarp {
    pub fn clamp_count(&self) -> u32 {
        self.clamps.get()
    }
}

impl AccelerationController for SharedWarp {
    fn clamp_to_normal_rate(&mut self) {
        self.clamps.set(self.clamps.get() + 1);
    }
}

// ============================================================================
// DISPLAY
// ============================================================================

#[derive(Debug, Default)]
struct DisplayState {
    published: Vec<(Vec<EntitySnapshot>, SeverityMap)>,
    selected: Option<EntityId>,
    selection_writes: u32,
    unavailable: bool,
}

/// Records every publish and selection write.
#[derive(Debug, Clone, Default)]
pub struct FakeDisplay {
    state: Rc<RefCell<DisplayState>>,
}

impl FakeDisplay {
    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().unavailable = !available;
    }

    /// Simulates the user clicking a vessel.
    pub fn select(&self, id: EntityId) {
        self.state.borrow_mut().selected = Some(id);
    }

    pub fn selected(&self) -> Option<EntityId> {
        self.state.borrow().selected
    }

    pub fn selection_writes(&self) -> u32 {
        self.state.borrow().selection_writes
    }

    pub fn publish_count(&self) -> usize {
        self.state.borrow().published.len()
    }

    pub fn last_ids(&self) -> Vec<EntityId> {
        self.last(|entities, _| entities.iter().map(|e| e.id).collect())
    }

    pub fn last_names(&self) -> Vec<String> {
        self.last(|entities, _| entities.iter().map(|e| e.name.clone()).collect())
    }

    pub fn last_severities(&self) -> SeverityMap {
        self.last(|_, severities| severities.clone())
    }

    fn last<T: Default>(&self, f: impl FnOnce(&[EntitySnapshot], &SeverityMap) -> T) -> T {
        let state = self.state.borrow();
        state
            .published
            .last()
            .map(|(entities, severities)| f(entities, severities))
            .unwrap_or_default()
    }
}

impl DisplaySink for FakeDisplay {
    fn publish(&mut self, entities: &[EntitySnapshot], severities: &SeverityMap) -> Result<(), EnvError> {
        let mut state = self.state.borrow_mut();
        if state.unavailable {
            return Err(EnvError::unavailable("fake display hidden"));
        }
        state.published.push((entities.to_vec(), severities.clone()));
        Ok(())
    }

    fn selected_entity(&self) -> Option<EntityId> {
        self.state.borrow().selected
    }

    fn set_selected_entity(&mut self, id: EntityId) {
        let mut state = self.state.borrow_mut();
        state.selected = Some(id);
        state.selection_writes += 1;
    }
}

// ============================================================================
// SETTINGS
// ============================================================================

#[derive(Debug, Default)]
struct StoreState {
    values: HashMap<String, String>,
    saves: u32,
    offline: bool,
}

/// Settings store that can be locked. Clones share one map.
#[derive(Debug, Clone, Default)]
pub struct FakeStore {
    state: Rc<RefCell<StoreState>>,
}

impl FakeStore {
    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().offline = !available;
    }

    pub fn save_count(&self) -> u32 {
        self.state.borrow().saves
    }

    fn check(&self) -> Result<(), EnvError> {
        if self.state.borrow().offline {
            return Err(EnvError::storage("fake settings locked"));
        }
        Ok(())
    }
}

impl ConfigStore for FakeStore {
    fn load(&mut self) -> Result<(), EnvError> {
        self.check()
    }

    fn save(&mut self) -> Result<(), EnvError> {
        self.check()?;
        self.state.borrow_mut().saves += 1;
        Ok(())
    }

    fn get_value(&self, key: &str) -> Result<Option<String>, EnvError> {
        self.check()?;
        Ok(self.state.borrow().values.get(key).cloned())
    }

    fn set_value(&mut self, key: &str, value: &str) -> Result<(), EnvError> {
        self.check()?;
        self.state
            .borrow_mut()
            .values
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[test]
fn arb_fleet_ids_are_unique() {
    let mut runner = proptest::test_runner::TestRunner::default();
    runner
        .run(&arb_fleet(), |fleet| {
            let ids: HashSet<EntityId> = fleet.iter().map(|e| e.id).collect();
            prop_assert_eq!(ids.len(), fleet.len());
            Ok(())
        })
        .unwrap();
}
