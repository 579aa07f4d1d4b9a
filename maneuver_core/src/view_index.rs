//! The View Index - three lazily memoized orderings of the Master Set.
//!
//! Each slot holds the derived sequence together with the generation it was
//! computed at. A slot is valid only while that stamp equals the Master Set's
//! current generation, so one invalidation retires all three at once and
//! views nobody reads are never recomputed.
//!
//! ```text
//!   MasterSet (gen N) ──read(kind)──► slot stamp == N ? ──yes──► cached Arc
//!                                             │
//!                                             no
//!                                             ▼
//!                                     transform + stamp N
//! ```

use crate::master_set::{Generation, MasterSet};
use crate::ordering;
use maneuver_env::EntitySnapshot;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Which derived ordering to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    /// Host order
    Default,

    /// Scheduled vessels only, soonest node first
    ByEventTime,

    /// Ordinal by name
    ByName,
}

impl ViewKind {
    pub const ALL: [ViewKind; 3] = [ViewKind::Default, ViewKind::ByEventTime, ViewKind::ByName];

    /// Applies this ordering to a snapshot.
    pub fn transform(self, entities: &[EntitySnapshot]) -> Vec<EntitySnapshot> {
        match self {
            ViewKind::Default => ordering::default_order(entities),
            ViewKind::ByEventTime => ordering::by_event_time(entities),
            ViewKind::ByName => ordering::by_name(entities),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ViewKind::Default => "default",
            ViewKind::ByEventTime => "by_event_time",
            ViewKind::ByName => "by_name",
        }
    }
}

/// A memoized sequence and the generation it reflects.
#[derive(Debug, Clone)]
struct CachedView {
    stamp: Generation,
    entities: Arc<[EntitySnapshot]>,
}

/// Result of reading a view.
#[derive(Debug, Clone)]
pub struct ViewRead {
    /// The ordered vessels
    pub entities: Arc<[EntitySnapshot]>,

    /// True if this read ran the transform
    pub recomputed: bool,
}

/// Memoized Default / ByEventTime / ByName views.
#[derive(Debug, Default)]
pub struct ViewIndex {
    default: Option<CachedView>,
    by_event_time: Option<CachedView>,
    by_name: Option<CachedView>,

    /// Total transforms run
    recomputes: u64,
}

impl ViewIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, kind: ViewKind) -> Option<&CachedView> {
        match kind {
            ViewKind::Default => self.default.as_ref(),
            ViewKind::ByEventTime => self.by_event_time.as_ref(),
            ViewKind::ByName => self.by_name.as_ref(),
        }
    }

    fn slot_mut(&mut self, kind: ViewKind) -> &mut Option<CachedView> {
        match kind {
            ViewKind::Default => &mut self.default,
            ViewKind::ByEventTime => &mut self.by_event_time,
            ViewKind::ByName => &mut self.by_name,
        }
    }

    /// Returns true if the slot holds a sequence computed at `generation`.
    pub fn is_valid(&self, kind: ViewKind, generation: Generation) -> bool {
        self.slot(kind).is_some_and(|c| c.stamp == generation)
    }

    /// Returns the cached sequence only if it is still valid.
    pub fn cached(&self, kind: ViewKind, generation: Generation) -> Option<Arc<[EntitySnapshot]>> {
        self.slot(kind)
            .filter(|c| c.stamp == generation)
            .map(|c| Arc::clone(&c.entities))
    }

    /// Reads a view, recomputing it from `master` if its slot is stale.
    ///
    /// The caller is responsible for refreshing `master` first if it is stale.
    pub fn read(&mut self, kind: ViewKind, master: &MasterSet) -> ViewRead {
        let generation = master.generation();

        if let Some(entities) = self.cached(kind, generation) {
            return ViewRead {
                entities,
                recomputed: false,
            };
        }

        let entities: Arc<[EntitySnapshot]> = Arc::from(kind.transform(master.entities()));
        debug!(
            view = kind.name(),
            generation,
            len = entities.len(),
            "view recomputed"
        );

        *self.slot_mut(kind) = Some(CachedView {
            stamp: generation,
            entities: Arc::clone(&entities),
        });
        self.recomputes += 1;

        ViewRead {
            entities,
            recomputed: true,
        }
    }

    /// Total transforms run since creation.
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }
}
