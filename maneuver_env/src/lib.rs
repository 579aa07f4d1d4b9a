//! Maneuver Queue Environment Abstraction Layer
//!
//! This crate provides the narrow contracts through which the queue core
//! talks to its host, so the same core runs inside a real host runtime or
//! inside the deterministic simulation harness.
//!
//! # Collaborators
//!
//! The core never reaches into host state. Everything it needs flows
//! through five traits:
//! - Time (`Clock::now()`)
//! - Vessels (`EntitySource::list_entities()`, `drain_events()`)
//! - Display (`DisplaySink::publish()`, selection)
//! - Time acceleration (`AccelerationController::clamp_to_normal_rate()`)
//! - Persistence (`ConfigStore` key/value contract)
//!
//! # Example
//!
//! ```ignore
//! use maneuver_env::{Clock, EntitySource};
//!
//! fn imminent<C: Clock, S: EntitySource>(clock: &C, source: &S, lead: f64) -> usize {
//!     let now = clock.now();
//!     source
//!         .list_entities()
//!         .unwrap_or_default()
//!         .iter()
//!         .filter_map(|e| e.event_time())
//!         .filter(|t| t - now <= lead)
//!         .count()
//! }
//! ```

mod context;
mod host;
mod types;
mod error;
mod store;
mod memory_impl;

pub use context::{AccelerationController, Clock};
pub use host::{DisplaySink, EntitySource};
pub use types::{EntityId, EntitySnapshot, LifecycleEvent, ManeuverNode, Severity, SeverityMap};
pub use error::EnvError;
pub use store::ConfigStore;
pub use memory_impl::MemoryConfigStore;
