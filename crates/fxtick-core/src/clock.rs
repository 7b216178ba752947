//! Logical clocks
//!
//! The scheduler never reads a clock on its own; the host reads one when it
//! builds a scheduler and again for every tick it pumps.

use std::cell::Cell;
use std::time::Instant;

/// Source of logical time
pub trait Clock {
    fn now(&self) -> u64;
}

/// Low-resolution millisecond counter since the clock was created
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Clock advanced explicitly by the host (or a test)
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self { now: Cell::new(start) }
    }

    /// Advance by `delta`, returning the new time
    pub fn advance(&self, delta: u64) -> u64 {
        let next = self.now.get().saturating_add(delta);
        self.now.set(next);
        next
    }

    /// Jump to `time`. Going backwards is ignored.
    pub fn set(&self, time: u64) {
        if time > self.now.get() {
            self.now.set(time);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u64 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_never_goes_backwards() {
        let clock = ManualClock::new(100);
        assert_eq!(clock.advance(5), 105);
        clock.set(50);
        assert_eq!(clock.now(), 105);
        clock.set(200);
        assert_eq!(clock.now(), 200);
    }

    #[test]
    fn test_monotonic_clock_is_non_decreasing() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
