//! Simulation clock and time-warp lever.

use maneuver_env::{AccelerationController, Clock};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::debug;

/// Virtual universal time shared between the world and the queue.
///
/// Clones share the same underlying time.
#[derive(Debug, Clone)]
pub struct SimClock {
    /// Current universal time (simulated seconds)
    seconds: Rc<Cell<f64>>,
}

impl SimClock {
    /// Creates a clock starting at the given universal time.
    pub fn new(start: f64) -> Self {
        Self {
            seconds: Rc::new(Cell::new(start)),
        }
    }

    /// Advances universal time by the given number of seconds.
    pub fn advance(&self, secs: f64) {
        self.seconds.set(self.seconds.get() + secs);
    }

    /// Jumps to a specific time. Jumping backwards models a save being loaded.
    pub fn set_time(&self, secs: f64) {
        debug!(from = self.seconds.get(), to = secs, "clock jump");
        self.seconds.set(secs);
    }

    pub fn time(&self) -> f64 {
        self.seconds.get()
    }
}

impl Clock for SimClock {
    fn now(&self) -> f64 {
        self.seconds.get()
    }
}

/// Warp rates offered by the host, slowest first.
pub const WARP_RATES: [f64; 8] = [1.0, 5.0, 10.0, 50.0, 100.0, 1_000.0, 10_000.0, 100_000.0];

#[derive(Debug, Default)]
struct WarpState {
    /// Index into `WARP_RATES`
    index: usize,

    /// Clamp requests received
    clamps: u64,
}

/// The host's time-warp lever.
///
/// Clones share the same state, so the world keeps a handle while the queue
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct SimWarp {
    state: Rc<RefCell<WarpState>>,
}

impl SimWarp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current multiplier of simulated time per real second.
    pub fn rate(&self) -> f64 {
        WARP_RATES[self.state.borrow().index]
    }

    /// Selects the fastest offered rate not above `rate`.
    pub fn set_rate(&self, rate: f64) {
        let index = WARP_RATES.iter().rposition(|r| *r <= rate).unwrap_or(0);
        self.state.borrow_mut().index = index;
    }

    pub fn is_warping(&self) -> bool {
        self.state.borrow().index > 0
    }

    /// Number of clamps the queue has requested.
    pub fn clamp_count(&self) -> u64 {
        self.state.borrow().clamps
    }
}

impl AccelerationController for SimWarp {
    fn clamp_to_normal_rate(&mut self) {
        let mut state = self.state.borrow_mut();
        state.clamps += 1;
        state.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_advance_and_jump() {
        let clock = SimClock::new(0.0);
        clock.advance(30.0);
        clock.advance(1.5);
        assert_eq!(clock.now(), 31.5);

        clock.set_time(-100.0);
        assert_eq!(clock.now(), -100.0);
    }

    #[test]
    fn test_clock_clone_shares_time() {
        let clock1 = SimClock::new(10.0);
        let clock2 = clock1.clone();

        clock1.advance(5.0);

        assert_eq!(clock1.now(), clock2.now());
    }

    #[test]
    fn test_warp_snaps_to_offered_rates() {
        let warp = SimWarp::new();
        warp.set_rate(1_500.0);
        assert_eq!(warp.rate(), 1_000.0);

        warp.set_rate(0.25);
        assert_eq!(warp.rate(), 1.0);
        assert!(!warp.is_warping());
    }

    #[test]
    fn test_clamp_resets_rate_and_counts() {
        let warp = SimWarp::new();
        warp.set_rate(10_000.0);

        let mut lever = warp.clone();
        lever.clamp_to_normal_rate();
        lever.clamp_to_normal_rate();

        assert_eq!(warp.rate(), 1.0);
        assert_eq!(warp.clamp_count(), 2);
    }
}
