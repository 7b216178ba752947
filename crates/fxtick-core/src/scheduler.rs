//! Scheduler and tick driver
//!
//! [`Scheduler`] is a cheap, clonable handle to one set of tables. The
//! registration functions and the tick driver all go through it, and it is
//! safe to call back into it from a callback the driver is running: the
//! driver never holds a borrow of the tables across an invocation.
//!
//! Per tick:
//! 1. Idle fast path: nothing registered, record the time and flush
//! 2. Timers, in registration order
//! 3. Tickers, in registration order, skipping suspended ones
//! 4. Animation frames, newest first
//! 5. Record the time
//! 6. Flush the host's deferred backlog

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::{
    CallbackError, Clock, Completion, DiagnosticSink, FailureSource, FrameQueue, HandleAllocator,
    Interval, TaskHost, TickerId, TickerRecord, TickerTable, TimerHandle, TimerKind, TimerRecord,
    TimerTable, TracingSink,
};

/// What a single tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Took the idle fast path
    pub idle: bool,
    pub timers_fired: usize,
    pub tickers_run: usize,
    pub frames_run: usize,
    /// Callback and settlement failures handed to the sink
    pub failures: usize,
    /// Backlog entries run by the host flush
    pub deferred_flushed: usize,
}

/// Cumulative scheduler statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub active_timers: usize,
    pub active_tickers: usize,
    pub queued_frames: usize,
    pub current_time: u64,
    pub ticks: u64,
    pub idle_ticks: u64,
    /// Timer and ticker table passes. Idle ticks never scan.
    pub table_scans: u64,
}

#[derive(Debug, Default)]
struct Counters {
    ticks: u64,
    idle_ticks: u64,
    table_scans: u64,
}

struct State<T> {
    handles: HandleAllocator,
    timers: TimerTable<T>,
    tickers: TickerTable<T>,
    frames: FrameQueue<T>,
    now: u64,
    counters: Counters,
}

impl<T> State<T> {
    fn is_idle(&self) -> bool {
        self.timers.is_empty() && self.tickers.is_empty() && self.frames.is_empty()
    }
}

struct Shared<T> {
    state: RefCell<State<T>>,
    sink: Box<dyn DiagnosticSink>,
}

/// Timer, ticker and animation-frame scheduler
pub struct Scheduler<T> {
    shared: Rc<Shared<T>>,
}

impl<T> Clone for Scheduler<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T> Scheduler<T> {
    /// Create a scheduler whose logical time starts at `start_time`.
    /// Failures are logged through `tracing`.
    pub fn new(start_time: u64) -> Self {
        Self::with_sink(start_time, TracingSink)
    }

    /// Create a scheduler starting at the clock's current reading
    pub fn from_clock(clock: &dyn Clock) -> Self {
        Self::new(clock.now())
    }

    /// Create a scheduler that reports callback failures to `sink`
    pub fn with_sink(start_time: u64, sink: impl DiagnosticSink + 'static) -> Self {
        let state = State {
            handles: HandleAllocator::new(),
            timers: TimerTable::new(),
            tickers: TickerTable::new(),
            frames: FrameQueue::new(),
            now: start_time,
            counters: Counters::default(),
        };
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(state),
                sink: Box::new(sink),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    /// Register a repeating timer
    pub fn set_interval(&self, callback: T, interval_ticks: Option<f64>) -> TimerHandle {
        self.insert_timer(callback, Interval::clamp(interval_ticks), TimerKind::Repeating)
    }

    /// Register a one-shot timer
    pub fn set_timeout(&self, callback: T, delay_ticks: Option<f64>) -> TimerHandle {
        self.insert_timer(callback, Interval::clamp(delay_ticks), TimerKind::OneShot)
    }

    /// One-shot timer with the minimum delay. There is a single timer
    /// queue, so this does not jump ahead of other due timers.
    pub fn set_immediate(&self, callback: T) -> TimerHandle {
        self.set_timeout(callback, Some(0.0))
    }

    fn insert_timer(&self, callback: T, interval: Interval, kind: TimerKind) -> TimerHandle {
        let mut state = self.shared.state.borrow_mut();
        let handle = state.handles.next_timer_handle();
        let record = TimerRecord::new(callback, interval, state.now, kind);
        state.timers.insert(handle, record);
        tracing::debug!(
            timer = handle.id(),
            interval = interval.ticks(),
            ?kind,
            "Timer registered"
        );
        handle
    }

    /// Cancel a timer. Unknown and already-cleared handles are ignored.
    /// Returns whether a timer was removed.
    pub fn clear_timer(&self, handle: TimerHandle) -> bool {
        if handle.is_falsy() {
            return false;
        }
        let removed = self.shared.state.borrow_mut().timers.remove(handle);
        if removed.is_some() {
            tracing::debug!(timer = handle.id(), "Timer cleared");
        }
        removed.is_some()
    }

    pub fn clear_interval(&self, handle: TimerHandle) -> bool {
        self.clear_timer(handle)
    }

    pub fn clear_timeout(&self, handle: TimerHandle) -> bool {
        self.clear_timer(handle)
    }

    pub fn clear_immediate(&self, handle: TimerHandle) -> bool {
        self.clear_timer(handle)
    }

    /// Restart the timer's period from the current logical time. Returns
    /// false if the timer is gone.
    pub fn refresh(&self, handle: TimerHandle) -> bool {
        let mut state = self.shared.state.borrow_mut();
        let now = state.now;
        match state.timers.get_mut(handle) {
            Some(record) => {
                record.last_run_at = now;
                true
            }
            None => false,
        }
    }

    pub fn has_timer(&self, handle: TimerHandle) -> bool {
        self.shared.state.borrow().timers.contains(handle)
    }

    // ------------------------------------------------------------------
    // Tickers
    // ------------------------------------------------------------------

    /// Register a per-frame ticker
    pub fn set_tick(&self, callback: T) -> TickerId {
        let mut state = self.shared.state.borrow_mut();
        let id = state.handles.next_ticker_id();
        state.tickers.insert(id, TickerRecord::new(callback));
        tracing::debug!(ticker = id.id(), "Ticker registered");
        id
    }

    /// Cancel a ticker. An outstanding deferred result is dropped with it.
    pub fn clear_tick(&self, id: TickerId) -> bool {
        if id.is_falsy() {
            return false;
        }
        let removed = self.shared.state.borrow_mut().tickers.remove(id);
        if removed.is_some() {
            tracing::debug!(ticker = id.id(), "Ticker cleared");
        }
        removed.is_some()
    }

    pub fn has_ticker(&self, id: TickerId) -> bool {
        self.shared.state.borrow().tickers.get(id).is_some()
    }

    /// Whether the ticker is waiting on a deferred result
    pub fn is_ticker_suspended(&self, id: TickerId) -> bool {
        self.shared
            .state
            .borrow()
            .tickers
            .get(id)
            .is_some_and(TickerRecord::is_suspended)
    }

    // ------------------------------------------------------------------
    // Animation frames
    // ------------------------------------------------------------------

    /// Queue a callback for the next frames phase
    pub fn request_animation_frame(&self, callback: T) {
        self.shared.state.borrow_mut().frames.push(callback);
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn active_timer_count(&self) -> usize {
        self.shared.state.borrow().timers.len()
    }

    pub fn active_ticker_count(&self) -> usize {
        self.shared.state.borrow().tickers.len()
    }

    pub fn queued_frame_count(&self) -> usize {
        self.shared.state.borrow().frames.len()
    }

    /// Logical time recorded by the last tick (or the start time)
    pub fn current_time(&self) -> u64 {
        self.shared.state.borrow().now
    }

    pub fn stats(&self) -> SchedulerStats {
        let state = self.shared.state.borrow();
        SchedulerStats {
            active_timers: state.timers.len(),
            active_tickers: state.tickers.len(),
            queued_frames: state.frames.len(),
            current_time: state.now,
            ticks: state.counters.ticks,
            idle_ticks: state.counters.idle_ticks,
            table_scans: state.counters.table_scans,
        }
    }

    /// Drop every registration. Used when the owning runtime shuts down.
    pub fn clear(&self) {
        let (timers, tickers, frames) = {
            let mut state = self.shared.state.borrow_mut();
            (
                std::mem::take(&mut state.timers),
                std::mem::take(&mut state.tickers),
                state.frames.take_batch(),
            )
        };
        tracing::debug!(
            timers = timers.len(),
            tickers = tickers.len(),
            frames = frames.len(),
            "Scheduler cleared"
        );
    }

    // ------------------------------------------------------------------
    // Tick driver
    // ------------------------------------------------------------------

    /// Run one frame's worth of scheduled work at logical time `now`.
    ///
    /// Callback failures are reported to the sink and never abort the tick.
    /// The host's deferred backlog is flushed on every call.
    pub fn tick<H>(&self, now: u64, host: &mut H) -> TickReport
    where
        H: TaskHost<Callback = T>,
    {
        let mut report = TickReport::default();

        let idle = {
            let mut state = self.shared.state.borrow_mut();
            state.counters.ticks += 1;
            let idle = state.is_idle();
            if idle {
                state.counters.idle_ticks += 1;
                state.now = now;
            }
            idle
        };

        if idle {
            report.idle = true;
        } else {
            self.run_timers(now, host, &mut report);
            self.run_tickers(host, &mut report);
            self.run_frames(host, &mut report);
            self.shared.state.borrow_mut().now = now;
        }

        report.deferred_flushed = host.flush_deferred();

        tracing::trace!(
            now,
            idle = report.idle,
            timers = report.timers_fired,
            tickers = report.tickers_run,
            frames = report.frames_run,
            failures = report.failures,
            flushed = report.deferred_flushed,
            "Tick complete"
        );
        report
    }

    fn run_timers<H>(&self, now: u64, host: &mut H, report: &mut TickReport)
    where
        H: TaskHost<Callback = T>,
    {
        let handles = {
            let mut state = self.shared.state.borrow_mut();
            state.counters.table_scans += 1;
            state.timers.snapshot()
        };

        for handle in handles {
            // Cleared earlier in this phase, or not due yet
            let (callback, kind) = {
                let state = self.shared.state.borrow();
                match state.timers.get(handle) {
                    Some(record) if record.is_due(now) => {
                        (Rc::clone(&record.callback), record.kind)
                    }
                    _ => continue,
                }
            };

            let result = host.invoke(&callback, FailureSource::Timer);
            report.timers_fired += 1;

            // Advance even on failure so a throwing interval cannot spin
            let finished = {
                let mut state = self.shared.state.borrow_mut();
                match kind {
                    TimerKind::OneShot => state.timers.remove(handle),
                    TimerKind::Repeating => {
                        if let Some(record) = state.timers.get_mut(handle) {
                            record.last_run_at = now;
                        }
                        None
                    }
                }
            };
            drop(finished);

            if let Err(error) = result {
                self.report_failure(FailureSource::Timer, &error, report);
            }
        }
    }

    fn run_tickers<H>(&self, host: &mut H, report: &mut TickReport)
    where
        H: TaskHost<Callback = T>,
    {
        let ids = {
            let mut state = self.shared.state.borrow_mut();
            state.counters.table_scans += 1;
            state.tickers.snapshot()
        };

        for id in ids {
            let pending = {
                let mut state = self.shared.state.borrow_mut();
                match state.tickers.get_mut(id) {
                    Some(record) => record.pending.take(),
                    None => continue,
                }
            };

            if let Some(mut pending) = pending {
                match pending.poll_settled() {
                    None => {
                        let mut state = self.shared.state.borrow_mut();
                        if let Some(record) = state.tickers.get_mut(id) {
                            record.pending = Some(pending);
                        }
                        continue;
                    }
                    Some(Ok(())) => {}
                    Some(Err(error)) => self.report_failure(FailureSource::Ticker, &error, report),
                }
            }

            let callback = {
                let state = self.shared.state.borrow();
                match state.tickers.get(id) {
                    Some(record) => Rc::clone(&record.callback),
                    None => continue,
                }
            };

            let result = host.invoke(&callback, FailureSource::Ticker);
            report.tickers_run += 1;

            match result {
                Ok(Completion::Immediate) => {}
                Ok(Completion::Deferred(pending)) => {
                    // Cleared by its own body: the result has nowhere to go
                    let orphan = {
                        let mut state = self.shared.state.borrow_mut();
                        match state.tickers.get_mut(id) {
                            Some(record) => {
                                record.pending = Some(pending);
                                None
                            }
                            None => Some(pending),
                        }
                    };
                    drop(orphan);
                }
                Err(error) => self.report_failure(FailureSource::Ticker, &error, report),
            }
        }
    }

    fn run_frames<H>(&self, host: &mut H, report: &mut TickReport)
    where
        H: TaskHost<Callback = T>,
    {
        let batch = self.shared.state.borrow_mut().frames.take_batch();

        for callback in batch.into_iter().rev() {
            let result = host.invoke(&callback, FailureSource::AnimationFrame);
            report.frames_run += 1;
            if let Err(error) = result {
                self.report_failure(FailureSource::AnimationFrame, &error, report);
            }
        }
    }

    fn report_failure(
        &self,
        source: FailureSource,
        error: &CallbackError,
        report: &mut TickReport,
    ) {
        report.failures += 1;
        self.shared.sink.report(source, error);
    }
}

impl<T> fmt::Debug for Scheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("Scheduler")
            .field("timers", &stats.active_timers)
            .field("tickers", &stats.active_tickers)
            .field("frames", &stats.queued_frames)
            .field("now", &stats.current_time)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NativeHost;

    fn noop() -> crate::NativeCallback {
        NativeHost::callback(|| Ok(Completion::Immediate))
    }

    #[test]
    fn test_counts_follow_tables() {
        let scheduler = Scheduler::new(0);
        let a = scheduler.set_interval(noop(), Some(10.0));
        let b = scheduler.set_timeout(noop(), None);
        let t = scheduler.set_tick(noop());
        assert_eq!(scheduler.active_timer_count(), 2);
        assert_eq!(scheduler.active_ticker_count(), 1);

        assert!(scheduler.clear_interval(a));
        assert!(!scheduler.clear_interval(a));
        assert!(scheduler.clear_timeout(b));
        assert!(scheduler.clear_tick(t));
        assert_eq!(scheduler.active_timer_count(), 0);
        assert_eq!(scheduler.active_ticker_count(), 0);
    }

    #[test]
    fn test_falsy_ids_are_ignored() {
        let scheduler: Scheduler<crate::NativeCallback> = Scheduler::new(0);
        assert!(!scheduler.clear_timer(TimerHandle::from_raw(0)));
        assert!(!scheduler.clear_tick(TickerId::from_raw(0)));
        assert!(!scheduler.clear_timer(TimerHandle::from_raw(99)));
    }

    #[test]
    fn test_refresh_uses_current_time() {
        let scheduler = Scheduler::new(0);
        let mut host = NativeHost::new();
        let handle = scheduler.set_interval(noop(), Some(5.0));

        scheduler.tick(4, &mut host);
        assert!(scheduler.refresh(handle));
        // Period restarts at 4: 9 is not due, 10 is
        assert_eq!(scheduler.tick(9, &mut host).timers_fired, 0);
        assert_eq!(scheduler.tick(10, &mut host).timers_fired, 1);

        scheduler.clear_timer(handle);
        assert!(!scheduler.refresh(handle));
    }

    #[test]
    fn test_clear_drops_everything() {
        let scheduler = Scheduler::new(0);
        scheduler.set_interval(noop(), Some(1.0));
        scheduler.set_tick(noop());
        scheduler.request_animation_frame(noop());

        scheduler.clear();
        let stats = scheduler.stats();
        assert_eq!((stats.active_timers, stats.active_tickers, stats.queued_frames), (0, 0, 0));
    }
}
