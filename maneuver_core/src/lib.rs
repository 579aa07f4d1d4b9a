//! Maneuver Queue Core - ordered vessel views with a time-warp guard
//!
//! This library keeps a host's list of tracked vessels available in three
//! orderings and stops time acceleration before a scheduled maneuver node
//! slips by:
//! 1. **Stale List Problem**: a shared generation counter retires every
//!    cached view at once when the host reports a lifecycle change
//! 2. **Wasted Sort Problem**: views are computed on first read and reused
//!    until the next invalidation
//! 3. **Missed Burn Problem**: the Scheduling Guard clamps warp to 1x once
//!    per vessel when its node enters the lead-time window

pub mod master_set;
pub mod ordering;
pub mod view_index;
pub mod guard;
pub mod severity;
pub mod mode;
pub mod settings;
pub mod queue_runtime;

#[cfg(test)]
mod testing;

// Re-export key types for convenience
pub use master_set::{Generation, MasterSet};
pub use view_index::{ViewIndex, ViewKind, ViewRead};
pub use guard::{GuardState, GuardTrigger, SchedulingGuard, DEFAULT_LEAD_TIME_SECS};
pub use severity::{classify, classify_sequence};
pub use mode::Mode;
pub use settings::{FilterRestorePolicy, QueueConfig, SledConfigStore, FILTER_KEY, MODE_KEY};
pub use queue_runtime::{HostBindings, ManeuverQueue};
