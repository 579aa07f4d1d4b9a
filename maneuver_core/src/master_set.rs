//! The Master Set - authoritative vessel list pulled from the host.
//!
//! Holds the last snapshot the host reported, in host order, plus the
//! generation counter every cached view is stamped against. Lifecycle
//! notifications only mark the set stale; the pull happens lazily on the
//! next read.

use maneuver_env::{EntitySnapshot, EntitySource};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Monotonic stamp used to detect cache staleness.
pub type Generation = u64;

/// Order-preserving collection of vessel snapshots.
#[derive(Debug, Clone)]
pub struct MasterSet {
    /// Last successfully pulled snapshot (host order)
    entities: Arc<[EntitySnapshot]>,

    /// Bumped on every invalidation and every successful refresh
    generation: Generation,

    /// True until the next refresh attempt after an invalidation
    stale: bool,

    /// Number of successful pulls from the host
    refreshes: u64,
}

impl MasterSet {
    /// Creates an empty, stale set. The first read triggers a refresh.
    pub fn new() -> Self {
        Self {
            entities: Arc::from(Vec::<EntitySnapshot>::new()),
            generation: 0,
            stale: true,
            refreshes: 0,
        }
    }

    /// Marks the snapshot stale without clearing it.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.stale = true;
    }

    /// Pulls the current vessel list from the host and replaces the snapshot.
    ///
    /// Never fails: if the host cannot be read, the previous snapshot
    /// (possibly empty) is retained and the set is considered refreshed
    /// until the next invalidation.
    ///
    /// Returns true if the snapshot was replaced.
    pub fn refresh(&mut self, source: &dyn EntitySource) -> bool {
        self.stale = false;

        match source.list_entities() {
            Ok(entities) => {
                self.entities = Arc::from(dedup_by_id(entities));
                self.generation += 1;
                self.refreshes += 1;
                debug!(
                    generation = self.generation,
                    vessels = self.entities.len(),
                    "master set refreshed"
                );
                true
            }
            Err(e) => {
                warn!(
                    retained = self.entities.len(),
                    "vessel source unavailable, keeping last snapshot: {}", e
                );
                false
            }
        }
    }

    /// Refreshes only if stale. Returns the generation the caller may stamp against.
    pub fn ensure_fresh(&mut self, source: &dyn EntitySource) -> Generation {
        if self.stale {
            self.refresh(source);
        }
        self.generation
    }

    /// Returns true if the snapshot must be refreshed before reading.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Returns the current generation.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns the snapshot in host order.
    pub fn entities(&self) -> &[EntitySnapshot] {
        &self.entities
    }

    /// Returns a shared handle to the snapshot.
    pub fn snapshot(&self) -> Arc<[EntitySnapshot]> {
        Arc::clone(&self.entities)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of successful pulls from the host.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }
}

impl Default for MasterSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps the first occurrence of each id, preserving host order.
fn dedup_by_id(entities: Vec<EntitySnapshot>) -> Vec<EntitySnapshot> {
    let mut seen = HashSet::with_capacity(entities.len());
    let total = entities.len();
    let unique: Vec<EntitySnapshot> = entities
        .into_iter()
        .filter(|e| seen.insert(e.id))
        .collect();

    if unique.len() != total {
        warn!(dropped = total - unique.len(), "host reported duplicate vessel ids");
    }
    unique
}
