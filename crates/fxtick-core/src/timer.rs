//! Timer table
//!
//! Handles are allocated in increasing order, so a `BTreeMap` keyed by
//! handle iterates in registration order.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::{Interval, TimerHandle};

/// Whether a timer survives its first firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// setInterval
    Repeating,
    /// setTimeout / setImmediate: removed right after the single invocation
    OneShot,
}

/// One timer registration
#[derive(Debug)]
pub struct TimerRecord<T> {
    pub callback: Rc<T>,
    pub interval: Interval,
    pub last_run_at: u64,
    pub kind: TimerKind,
}

impl<T> TimerRecord<T> {
    pub fn new(callback: T, interval: Interval, now: u64, kind: TimerKind) -> Self {
        Self {
            callback: Rc::new(callback),
            interval,
            last_run_at: now,
            kind,
        }
    }

    pub fn is_due(&self, now: u64) -> bool {
        self.interval.is_due(now.saturating_sub(self.last_run_at))
    }
}

/// Live timers keyed by handle
#[derive(Debug)]
pub struct TimerTable<T> {
    timers: BTreeMap<TimerHandle, TimerRecord<T>>,
}

impl<T> TimerTable<T> {
    pub fn new() -> Self {
        Self { timers: BTreeMap::new() }
    }

    pub fn insert(&mut self, handle: TimerHandle, record: TimerRecord<T>) {
        self.timers.insert(handle, record);
    }

    pub fn remove(&mut self, handle: TimerHandle) -> Option<TimerRecord<T>> {
        self.timers.remove(&handle)
    }

    pub fn get(&self, handle: TimerHandle) -> Option<&TimerRecord<T>> {
        self.timers.get(&handle)
    }

    pub fn get_mut(&mut self, handle: TimerHandle) -> Option<&mut TimerRecord<T>> {
        self.timers.get_mut(&handle)
    }

    pub fn contains(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle)
    }

    /// Handles of every live timer, in registration order
    pub fn snapshot(&self) -> Vec<TimerHandle> {
        self.timers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }
}

impl<T> Default for TimerTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_table() {
        let mut table = TimerTable::new();
        let a = TimerHandle::from_raw(1);
        let b = TimerHandle::from_raw(2);

        table.insert(b, TimerRecord::new("cb2", Interval::MIN, 0, TimerKind::OneShot));
        table.insert(a, TimerRecord::new("cb1", Interval::MIN, 0, TimerKind::Repeating));
        assert_eq!(table.snapshot(), vec![a, b]);

        assert!(table.remove(a).is_some());
        assert!(table.remove(a).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_record_due() {
        let record = TimerRecord::new((), Interval::clamp(Some(10.0)), 100, TimerKind::Repeating);
        assert!(!record.is_due(110));
        assert!(record.is_due(111));
        // Time before registration never counts as elapsed
        assert!(!record.is_due(50));
    }
}
