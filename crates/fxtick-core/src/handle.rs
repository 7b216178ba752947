//! Timer handles and ticker ids
//!
//! Ids are issued from monotonic 64-bit counters and never reused. Zero is
//! never issued, so it doubles as the "no handle" value scripts pass to
//! the clear functions.

use std::fmt;

/// Opaque handle returned by the timer registration functions
///
/// Equality and hashing use the numeric id only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Wrap a raw id, e.g. one read back from script code
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Numeric id of this handle
    pub const fn id(self) -> u64 {
        self.0
    }

    /// Zero is never allocated; clearing it is a no-op
    pub const fn is_falsy(self) -> bool {
        self.0 == 0
    }

    /// Keep-alive compatibility stub. There is no process keep-alive here.
    pub const fn r#ref(self) -> Self {
        self
    }

    /// Keep-alive compatibility stub.
    pub const fn unref(self) -> Self {
        self
    }

    /// Always true, see [`TimerHandle::r#ref`].
    pub const fn has_ref(self) -> bool {
        true
    }
}

impl From<TimerHandle> for u64 {
    fn from(handle: TimerHandle) -> Self {
        handle.0
    }
}

impl PartialEq<u64> for TimerHandle {
    fn eq(&self, other: &u64) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ticker registration id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TickerId(u64);

impl TickerId {
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub const fn id(self) -> u64 {
        self.0
    }

    pub const fn is_falsy(self) -> bool {
        self.0 == 0
    }
}

impl From<TickerId> for u64 {
    fn from(id: TickerId) -> Self {
        id.0
    }
}

impl fmt::Display for TickerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id source for timers and tickers
#[derive(Debug, Default)]
pub struct HandleAllocator {
    last_timer: u64,
    last_ticker: u64,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next timer handle
    pub fn next_timer_handle(&mut self) -> TimerHandle {
        self.last_timer += 1;
        TimerHandle(self.last_timer)
    }

    /// Allocate the next ticker id (separate counter from timers)
    pub fn next_ticker_id(&mut self) -> TickerId {
        self.last_ticker += 1;
        TickerId(self.last_ticker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_monotonic_and_nonzero() {
        let mut alloc = HandleAllocator::new();
        let a = alloc.next_timer_handle();
        let b = alloc.next_timer_handle();

        assert_eq!(a.id(), 1);
        assert!(b > a);
        assert!(!a.is_falsy());
    }

    #[test]
    fn test_timer_and_ticker_counters_are_independent() {
        let mut alloc = HandleAllocator::new();
        alloc.next_timer_handle();
        alloc.next_timer_handle();

        assert_eq!(alloc.next_ticker_id().id(), 1);
        assert_eq!(alloc.next_timer_handle().id(), 3);
    }

    #[test]
    fn test_handle_coerces_to_id() {
        let handle = TimerHandle::from_raw(42);
        let mut keys = HashSet::new();
        keys.insert(handle);

        assert!(keys.contains(&TimerHandle::from_raw(42)));
        assert_eq!(u64::from(handle), 42);
        assert!(handle == 42);
        assert_eq!(handle.to_string(), "42");
    }

    #[test]
    fn test_ref_stubs() {
        let handle = TimerHandle::from_raw(7);
        assert_eq!(handle.r#ref().unref(), handle);
        assert!(handle.has_ref());
    }
}
