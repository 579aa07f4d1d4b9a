//! Maneuver Queue Deterministic Simulation Harness
//!
//! This crate provides a simulated tracking station: every host
//! collaborator the queue talks to, scripted so that a whole session runs
//! deterministically from one seed.
//!
//! # Core Principle: Everything Is Scripted
//!
//! All sources of non-determinism are intercepted and controlled:
//! - **Time**: Virtual universal time advances per tick at the warp rate
//! - **Fleet**: Launches, losses, renames and nodes come from seeded RNGs
//! - **Faults**: The tracking list, display and settings can go offline
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         SimWorld                            │
//! │  ┌──────────────┐   ┌──────────────┐   ┌────────────────┐   │
//! │  │  SimClock    │   │   SimWarp    │   │  SimSettings   │   │
//! │  │ (universal   │   │ (rate ladder │   │ (key/value,    │   │
//! │  │  time)       │   │  + clamps)   │   │  can lock)     │   │
//! │  └──────┬───────┘   └──────▲───────┘   └───────▲────────┘   │
//! │         │                  │                   │            │
//! │  ┌──────▼──────────────────┴───────────────────┴────────┐   │
//! │  │                   ManeuverQueue                      │   │
//! │  └──────▲───────────────────────────────────┬───────────┘   │
//! │         │ list_entities / drain_events      │ publish       │
//! │  ┌──────┴───────┐                    ┌──────▼───────┐       │
//! │  │   SimFleet   │                    │  SimDisplay  │       │
//! │  │ (ground truth│                    │ (last list,  │       │
//! │  │  + churn)    │                    │  selection)  │       │
//! │  └──────────────┘                    └──────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use maneuver_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let runner = ScenarioRunner::new(42, 12).with_duration(10.0);
//! let result = runner.run(ScenarioId::NodeRush);
//! assert!(result.passed);
//! ```

mod context;
mod world;
mod fleet;
mod display;
mod runner;
mod exporter;
pub mod scenarios;

pub use context::{SimClock, SimWarp, WARP_RATES};
pub use world::{SimWorld, SimConfig, TickOutcome};
pub use fleet::{SimFleet, SimVessel, ChurnKind};
pub use display::{SimDisplay, SimSettings, PublishedList};
pub use runner::{ScenarioRunner, ScenarioResult, ScenarioMetrics};
pub use exporter::{SimExport, SimFrame, SimEvent, VesselRow};
