//! Queue Runtime - the Mode Controller tying the engines to the host.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        ManeuverQueue                         │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │                HostBindings (collaborators)             │  │
//! │  │  • source  → list_entities(), drain_events()           │  │
//! │  │  • clock   → now()                                     │  │
//! │  │  • display → publish(), selection      (optional)      │  │
//! │  │  • warp    → clamp_to_normal_rate()    (optional)      │  │
//! │  │  • store   → mode + filter persistence (optional)      │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! │                              │                               │
//! │  ┌───────────┐ ┌───────────┐ ┌────────────┐ ┌────────────┐   │
//! │  │  MASTER   │ │   VIEW    │ │ SCHEDULING │ │  SEVERITY  │   │
//! │  │   SET     │ │   INDEX   │ │   GUARD    │ │ CLASSIFIER │   │
//! │  └───────────┘ └───────────┘ └────────────┘ └────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The host drives two entry points: `simulation_step()` once per physics
//! step (guard) and `display_refresh()` once per UI frame (publishing).
//! Neither blocks, and neither surfaces collaborator failures.
//!
//! # Usage
//!
//! ```ignore
//! use maneuver_core::{HostBindings, ManeuverQueue, Mode, QueueConfig};
//!
//! let host = HostBindings::new(source, clock)
//!     .with_display(display)
//!     .with_acceleration(warp)
//!     .with_store(store);
//! let mut queue = ManeuverQueue::new(host, QueueConfig::default());
//!
//! queue.start();
//! loop {
//!     queue.simulation_step();
//!     queue.display_refresh();
//! }
//! ```

use crate::guard::{GuardTrigger, SchedulingGuard};
use crate::master_set::{Generation, MasterSet};
use crate::mode::Mode;
use crate::settings::{FilterRestorePolicy, QueueConfig, FILTER_KEY, MODE_KEY};
use crate::severity::classify_sequence;
use crate::view_index::{ViewIndex, ViewKind};

use maneuver_env::{
    AccelerationController, Clock, ConfigStore, DisplaySink, EntitySnapshot, EntitySource,
    LifecycleEvent, SeverityMap,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The host collaborators a queue runs against.
///
/// Source and clock are mandatory; the rest may be absent, in which case the
/// corresponding side effects are skipped.
pub struct HostBindings {
    pub source: Box<dyn EntitySource>,
    pub clock: Box<dyn Clock>,
    pub display: Option<Box<dyn DisplaySink>>,
    pub acceleration: Option<Box<dyn AccelerationController>>,
    pub store: Option<Box<dyn ConfigStore>>,
}

impl HostBindings {
    pub fn new(source: impl EntitySource + 'static, clock: impl Clock + 'static) -> Self {
        Self {
            source: Box::new(source),
            clock: Box::new(clock),
            display: None,
            acceleration: None,
            store: None,
        }
    }

    pub fn with_display(mut self, display: impl DisplaySink + 'static) -> Self {
        self.display = Some(Box::new(display));
        self
    }

    pub fn with_acceleration(mut self, acceleration: impl AccelerationController + 'static) -> Self {
        self.acceleration = Some(Box::new(acceleration));
        self
    }

    pub fn with_store(mut self, store: impl ConfigStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }
}

/// What was last handed to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PublishedView {
    mode: Mode,
    generation: Generation,
}

/// Session state exchanged with the config store.
#[derive(Debug, Default)]
struct SessionState {
    /// Filter value in effect before entering ByEventTime
    saved_filter: Option<String>,
}

/// The Mode Controller: owns the Master Set, View Index and Guard.
pub struct ManeuverQueue {
    host: HostBindings,
    config: QueueConfig,

    mode: Mode,
    master: MasterSet,
    views: ViewIndex,
    guard: SchedulingGuard,

    session: SessionState,
    published: Option<PublishedView>,
    suspended: bool,

    /// Successful publishes
    publishes: u64,
}

impl ManeuverQueue {
    /// Creates a queue in the `Uninitialized` mode. Nothing is read from
    /// the host until `start()` or the first view read.
    pub fn new(host: HostBindings, config: QueueConfig) -> Self {
        let guard = SchedulingGuard::new(config.lead_time_secs);

        Self {
            host,
            config,
            mode: Mode::Uninitialized,
            master: MasterSet::new(),
            views: ViewIndex::new(),
            guard,
            session: SessionState::default(),
            published: None,
            suspended: false,
            publishes: 0,
        }
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Loads settings and establishes the persisted mode (or `Default`).
    pub fn start(&mut self) {
        if let Some(store) = self.host.store.as_deref_mut() {
            if let Err(e) = store.load() {
                warn!("settings load failed, using defaults: {}", e);
            }
        }

        let mode = self.persisted_mode();
        info!(%mode, lead_time = self.config.lead_time_secs, "maneuver queue started");
        self.set_mode(mode);
    }

    /// Persists the current mode and flushes settings.
    ///
    /// Ending in ByEventTime puts the remembered filter back first; the next
    /// session remembers it again when it reopens the view.
    pub fn shutdown(&mut self) {
        if self.mode == Mode::ByEventTime {
            self.restore_filter();
        }
        if self.mode.is_selectable() {
            self.persist_mode(self.mode);
        } else {
            self.save_settings();
        }
        info!(mode = %self.mode, "maneuver queue shut down");
    }

    /// Stops publishing (the list is hidden). Guard ticks keep running.
    pub fn suspend(&mut self) {
        if !self.suspended {
            debug!("display suspended");
        }
        self.suspended = true;
    }

    /// Resumes publishing and republishes the current view.
    ///
    /// The host list may have changed unnoticed while hidden, so the Master
    /// Set is re-pulled first.
    pub fn resume(&mut self) -> bool {
        if !self.suspended {
            return false;
        }
        self.suspended = false;
        self.master.invalidate();
        debug!("display resumed");
        self.publish_current()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    // ========================================================================
    // MODES
    // ========================================================================

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switches the displayed ordering.
    ///
    /// Setting the current mode again is a no-op while its published view is
    /// still valid, and never rewrites settings. Returns true if the view was
    /// (re)selected.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if mode == self.mode && self.has_current_view() {
            return false;
        }

        let previous = self.mode;
        if previous == Mode::ByEventTime && mode != Mode::ByEventTime {
            self.restore_filter();
            self.master.invalidate();
        }
        if mode == Mode::ByEventTime && previous != Mode::ByEventTime {
            self.remember_filter();
        }

        self.mode = mode;
        if previous != mode {
            info!(from = %previous, to = %mode, "view mode changed");
        }

        self.publish_current();

        if mode.is_selectable() && mode != previous {
            self.persist_mode(mode);
        }
        true
    }

    /// The mode stored in settings, or `Default` if unset, unreadable or invalid.
    pub fn persisted_mode(&self) -> Mode {
        let Some(store) = self.host.store.as_deref() else {
            return Mode::Default;
        };

        match store.get_value(MODE_KEY) {
            Ok(Some(value)) => value.parse::<Mode>().unwrap_or_else(|e| {
                warn!("ignoring stored mode: {}", e);
                Mode::Default
            }),
            Ok(None) => Mode::Default,
            Err(e) => {
                warn!("settings unreadable, falling back to default mode: {}", e);
                Mode::Default
            }
        }
    }

    fn persist_mode(&mut self, mode: Mode) {
        let Some(store) = self.host.store.as_deref_mut() else {
            return;
        };
        if let Err(e) = store.set_value(MODE_KEY, mode.name()) {
            warn!("failed to store mode: {}", e);
            return;
        }
        self.save_settings();
    }

    fn save_settings(&mut self) {
        if let Some(store) = self.host.store.as_deref_mut() {
            if let Err(e) = store.save() {
                warn!("settings save failed: {}", e);
            }
        }
    }

    /// Captures the host filter before the ByEventTime view takes over.
    fn remember_filter(&mut self) {
        if self.config.filter_restore != FilterRestorePolicy::RestoreOnLeave {
            return;
        }
        let Some(store) = self.host.store.as_deref() else {
            return;
        };

        match store.get_value(FILTER_KEY) {
            Ok(value) => {
                debug!(filter = ?value, "filter remembered");
                self.session.saved_filter = value;
            }
            Err(e) => warn!("could not read display filter: {}", e),
        }
    }

    /// Reinstates the filter captured by `remember_filter`.
    fn restore_filter(&mut self) {
        let Some(filter) = self.session.saved_filter.take() else {
            return;
        };
        let Some(store) = self.host.store.as_deref_mut() else {
            return;
        };

        match store.set_value(FILTER_KEY, &filter) {
            Ok(()) => debug!(%filter, "filter restored"),
            Err(e) => warn!("could not restore display filter: {}", e),
        }
    }

    // ========================================================================
    // INVALIDATION
    // ========================================================================

    /// Handles one host lifecycle notification.
    pub fn notify(&mut self, event: LifecycleEvent) {
        debug!(event = event.kind(), vessel = %event.entity(), "lifecycle notification");
        self.master.invalidate();
    }

    /// Marks the Master Set stale.
    pub fn invalidate(&mut self) {
        self.master.invalidate();
    }

    /// Drains pending lifecycle notifications from the source.
    pub fn pump_events(&mut self) -> usize {
        let events = self.host.source.drain_events();
        let count = events.len();
        for event in events {
            self.notify(event);
        }
        count
    }

    // ========================================================================
    // VIEWS
    // ========================================================================

    /// Reads a view, refreshing the Master Set first if it is stale.
    ///
    /// Rebuilds the guard whenever the ByEventTime view is recomputed.
    pub fn view(&mut self, kind: ViewKind) -> Arc<[EntitySnapshot]> {
        self.master.ensure_fresh(self.host.source.as_ref());
        let read = self.views.read(kind, &self.master);

        if read.recomputed && kind == ViewKind::ByEventTime {
            let now = self.host.clock.now();
            self.guard.rebuild(&read.entities, now, self.master.generation());
        }
        read.entities
    }

    /// The view selected by the current mode.
    pub fn current_view(&mut self) -> Arc<[EntitySnapshot]> {
        self.view(self.mode.view())
    }

    /// Classifies the ByEventTime view against the current clock.
    pub fn classification(&mut self) -> SeverityMap {
        let view = self.view(ViewKind::ByEventTime);
        classify_sequence(&view, self.host.clock.now(), self.config.lead_time_secs)
    }

    fn has_current_view(&self) -> bool {
        self.published.is_some_and(|p| {
            p.mode == self.mode && p.generation == self.master.generation() && !self.master.is_stale()
        })
    }

    /// Selects the current mode's view and hands it to the display.
    ///
    /// A failed publish is not recorded, so the next display refresh retries it.
    fn publish_current(&mut self) -> bool {
        let entities = self.current_view();
        let published = PublishedView {
            mode: self.mode,
            generation: self.master.generation(),
        };

        if self.suspended {
            return false;
        }

        let severities = if self.mode == Mode::ByEventTime {
            classify_sequence(&entities, self.host.clock.now(), self.config.lead_time_secs)
        } else {
            SeverityMap::new()
        };

        let Some(display) = self.host.display.as_deref_mut() else {
            self.published = Some(published);
            return false;
        };

        let selected = display.selected_entity();
        if let Err(e) = display.publish(&entities, &severities) {
            warn!(mode = %self.mode, "publish failed: {}", e);
            return false;
        }
        if let Some(id) = selected.filter(|id| entities.iter().any(|e| e.id == *id)) {
            display.set_selected_entity(id);
        }

        self.published = Some(published);
        self.publishes += 1;
        debug!(
            mode = %self.mode,
            vessels = entities.len(),
            classified = severities.len(),
            "view published"
        );
        true
    }

    // ========================================================================
    // TICKS
    // ========================================================================

    /// Once per simulation step: pumps notifications and runs one guard tick.
    pub fn simulation_step(&mut self) -> Option<GuardTrigger> {
        self.pump_events();
        self.view(ViewKind::ByEventTime);

        if self.guard.is_empty() {
            return None;
        }
        let now = self.host.clock.now();
        self.guard.tick(now, self.host.acceleration.as_deref_mut())
    }

    /// Once per display frame: republishes if the view went stale, or every
    /// frame while ByEventTime is shown (its classification is time-dependent).
    pub fn display_refresh(&mut self) -> bool {
        self.pump_events();

        if self.suspended {
            return false;
        }
        if !self.has_current_view() || self.mode == Mode::ByEventTime {
            return self.publish_current();
        }
        false
    }

    // ========================================================================
    // INTROSPECTION
    // ========================================================================

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn guard(&self) -> &SchedulingGuard {
        &self.guard
    }

    pub fn master_set(&self) -> &MasterSet {
        &self.master
    }

    pub fn view_index(&self) -> &ViewIndex {
        &self.views
    }

    /// Successful publishes so far.
    pub fn publish_count(&self) -> u64 {
        self.publishes
    }

    pub fn now(&self) -> f64 {
        self.host.clock.now()
    }

    pub fn config_store(&self) -> Option<&dyn ConfigStore> {
        self.host.store.as_deref()
    }

    pub fn config_store_mut(&mut self) -> Option<&mut (dyn ConfigStore + 'static)> {
        self.host.store.as_deref_mut()
    }
}
