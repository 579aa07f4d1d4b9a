//! Host time controls: the simulation clock and the time-warp lever.

/// Source of simulated universal time.
///
/// # Implementations
///
/// - **Production**: the host's universal-time accessor
/// - **Simulation**: `SimClock` - a virtual clock advanced per tick
///
/// # Discontinuities
///
/// Time is monotonic within a session but may jump in either direction
/// when the host loads a save. Consumers re-evaluate their thresholds on
/// every call instead of assuming ordering between calls.
pub trait Clock {
    /// Returns the current simulated time in seconds.
    fn now(&self) -> f64;
}

/// The external time-acceleration mechanism.
///
/// The queue core only ever pulls this lever one way: back to normal speed.
pub trait AccelerationController {
    /// Forces the acceleration rate back to 1x.
    ///
    /// Must be safe to call when the rate is already 1x.
    fn clamp_to_normal_rate(&mut self);
}
