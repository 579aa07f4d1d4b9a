//! Ground truth fleet for simulation.
//!
//! The fleet is the host's tracking list as the simulation sees it:
//! - Every vessel, including hidden ones, in launch order
//! - Scheduled maneuver nodes
//! - Lifecycle notifications raised by launches, losses, renames and
//!   visibility changes

use maneuver_env::{EntityId, EntitySnapshot, EntitySource, EnvError, LifecycleEvent, ManeuverNode};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

const NAME_PREFIXES: [&str; 8] = [
    "Relay", "Probe", "Lander", "Station", "Tug", "Rover", "Comsat", "Hopper",
];

/// A vessel as the host knows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimVessel {
    pub id: EntityId,
    pub name: String,
    pub node: Option<ManeuverNode>,

    /// Hidden vessels are filtered out of the tracking list
    pub visible: bool,
}

impl SimVessel {
    fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id,
            name: self.name.clone(),
            next_event: self.node,
        }
    }
}

/// Random churn applied by `SimFleet::churn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChurnKind {
    Launch,
    Destroy,
    Rename,
    Hide,
    Reveal,
}

struct FleetState {
    /// RNG for launches and churn
    rng: ChaCha8Rng,

    /// Vessels in launch order
    vessels: Vec<SimVessel>,

    /// Notifications not yet drained
    pending: Vec<LifecycleEvent>,

    /// Seed for the next vessel id
    next_seed: u64,

    /// False while the host list cannot be read
    available: bool,

    /// Notifications raised so far
    emitted: u64,
}

impl FleetState {
    fn emit(&mut self, event: LifecycleEvent) {
        debug!(event = event.kind(), vessel = %event.entity(), "fleet event");
        self.pending.push(event);
        self.emitted += 1;
    }

    fn position(&self, id: EntityId) -> Option<usize> {
        self.vessels.iter().position(|v| v.id == id)
    }

    fn random_name(&mut self) -> String {
        let prefix = NAME_PREFIXES.choose(&mut self.rng).copied().unwrap_or("Vessel");
        format!("{} {}", prefix, self.rng.gen_range(1..100))
    }

    /// A node somewhere between just outside the lead time and ~20 lead times out.
    fn random_node(&mut self, now: f64, lead_time: f64) -> ManeuverNode {
        let offset = self.rng.gen_range(lead_time + 60.0..lead_time * 20.0);
        let z: f64 = self.rng.sample(StandardNormal);
        ManeuverNode::new(now + offset, (180.0 + 70.0 * z).abs())
    }
}

/// The simulated tracking list.
///
/// Clones share the same fleet, so scenarios can keep scripting the fleet
/// after handing a clone to the queue as its `EntitySource`.
#[derive(Clone)]
pub struct SimFleet {
    state: Rc<RefCell<FleetState>>,
}

impl SimFleet {
    /// Creates an empty fleet with the given physics seed.
    pub fn new(physics_seed: u64) -> Self {
        Self {
            state: Rc::new(RefCell::new(FleetState {
                rng: ChaCha8Rng::seed_from_u64(physics_seed),
                vessels: Vec::new(),
                pending: Vec::new(),
                next_seed: 1,
                available: true,
                emitted: 0,
            })),
        }
    }

    /// Launches a vessel and returns its id.
    pub fn launch(&self, name: impl Into<String>, node: Option<ManeuverNode>) -> EntityId {
        let mut state = self.state.borrow_mut();
        let id = EntityId::from_seed(state.next_seed);
        state.next_seed += 1;

        state.vessels.push(SimVessel {
            id,
            name: name.into(),
            node,
            visible: true,
        });
        state.emit(LifecycleEvent::Created(id));
        id
    }

    /// Launches a randomly named vessel; most get a node in the future.
    pub fn launch_random(&self, now: f64, lead_time: f64) -> EntityId {
        let (name, node) = {
            let mut state = self.state.borrow_mut();
            let name = state.random_name();
            let node = state
                .rng
                .gen_bool(0.7)
                .then(|| state.random_node(now, lead_time));
            (name, node)
        };
        self.launch(name, node)
    }

    /// Launches `count` random vessels.
    pub fn populate(&self, count: usize, now: f64, lead_time: f64) -> Vec<EntityId> {
        (0..count).map(|_| self.launch_random(now, lead_time)).collect()
    }

    /// Removes a vessel. Returns false if it was not tracked.
    pub fn destroy(&self, id: EntityId) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(pos) = state.position(id) else {
            return false;
        };
        state.vessels.remove(pos);
        state.emit(LifecycleEvent::Destroyed(id));
        true
    }

    pub fn rename(&self, id: EntityId, name: impl Into<String>) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(pos) = state.position(id) else {
            return false;
        };
        state.vessels[pos].name = name.into();
        state.emit(LifecycleEvent::Renamed(id));
        true
    }

    pub fn set_visible(&self, id: EntityId, visible: bool) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(pos) = state.position(id) else {
            return false;
        };
        if state.vessels[pos].visible == visible {
            return false;
        }
        state.vessels[pos].visible = visible;
        state.emit(LifecycleEvent::VisibilityChanged(id));
        true
    }

    /// Edits a vessel's node. The host raises no notification for this.
    pub fn set_node(&self, id: EntityId, node: Option<ManeuverNode>) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(pos) = state.position(id) else {
            return false;
        };
        state.vessels[pos].node = node;
        true
    }

    /// Raises a notification without changing the fleet (a save reload
    /// recreating every vessel, for instance).
    pub fn announce(&self, event: LifecycleEvent) {
        self.state.borrow_mut().emit(event);
    }

    /// Applies one random lifecycle change and returns what happened.
    pub fn churn(&self, now: f64, lead_time: f64) -> ChurnKind {
        let (kind, target) = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            let roll = state.rng.gen_range(0..100);
            let target = state.vessels.choose(&mut state.rng).map(|v| (v.id, v.visible));
            let kind = match (roll, target) {
                (_, None) | (0..=29, _) => ChurnKind::Launch,
                (30..=49, _) => ChurnKind::Destroy,
                (50..=69, _) => ChurnKind::Rename,
                (_, Some((_, true))) => ChurnKind::Hide,
                (_, Some((_, false))) => ChurnKind::Reveal,
            };
            (kind, target.map(|(id, _)| id))
        };

        match (kind, target) {
            (ChurnKind::Launch, _) | (_, None) => {
                self.launch_random(now, lead_time);
                ChurnKind::Launch
            }
            (ChurnKind::Destroy, Some(id)) => {
                self.destroy(id);
                kind
            }
            (ChurnKind::Rename, Some(id)) => {
                let name = self.state.borrow_mut().random_name();
                self.rename(id, name);
                kind
            }
            (ChurnKind::Hide, Some(id)) => {
                self.set_visible(id, false);
                kind
            }
            (ChurnKind::Reveal, Some(id)) => {
                self.set_visible(id, true);
                kind
            }
        }
    }

    /// Takes the host list offline (scene change) or back online.
    pub fn set_available(&self, available: bool) {
        self.state.borrow_mut().available = available;
    }

    /// Every vessel, hidden ones included.
    pub fn vessels(&self) -> Vec<SimVessel> {
        self.state.borrow().vessels.clone()
    }

    /// What the tracking list currently shows, in host order.
    pub fn visible_snapshots(&self) -> Vec<EntitySnapshot> {
        self.state
            .borrow()
            .vessels
            .iter()
            .filter(|v| v.visible)
            .map(SimVessel::snapshot)
            .collect()
    }

    pub fn vessel(&self, id: EntityId) -> Option<SimVessel> {
        let state = self.state.borrow();
        state.position(id).map(|pos| state.vessels[pos].clone())
    }

    pub fn len(&self) -> usize {
        self.state.borrow().vessels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.borrow().vessels.is_empty()
    }

    /// Notifications raised since creation.
    pub fn events_emitted(&self) -> u64 {
        self.state.borrow().emitted
    }
}

impl EntitySource for SimFleet {
    fn list_entities(&self) -> Result<Vec<EntitySnapshot>, EnvError> {
        if !self.state.borrow().available {
            return Err(EnvError::unavailable("tracking list not loaded"));
        }
        Ok(self.visible_snapshots())
    }

    fn drain_events(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.state.borrow_mut().pending)
    }
}
