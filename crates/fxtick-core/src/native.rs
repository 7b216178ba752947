//! Closure-based host
//!
//! Runs plain Rust closures and owns a microtask backlog, for embedding the
//! scheduler without a script engine.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::{CallbackError, Completion, FailureSource, TaskHost};

/// Callback type stored by a `Scheduler<NativeCallback>`
pub type NativeCallback = Box<dyn Fn() -> Result<Completion, CallbackError>>;

type Job = Box<dyn FnOnce()>;

/// Shared FIFO of deferred jobs, drained at the end of every tick
#[derive(Clone, Default)]
pub struct MicrotaskQueue {
    jobs: Rc<RefCell<VecDeque<Job>>>,
}

impl MicrotaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, job: impl FnOnce() + 'static) {
        self.jobs.borrow_mut().push_back(Box::new(job));
    }

    pub fn len(&self) -> usize {
        self.jobs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.borrow().is_empty()
    }

    fn pop(&self) -> Option<Job> {
        self.jobs.borrow_mut().pop_front()
    }
}

impl fmt::Debug for MicrotaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MicrotaskQueue").field("len", &self.len()).finish()
    }
}

/// [`TaskHost`] for boxed Rust closures
#[derive(Debug, Default)]
pub struct NativeHost {
    microtasks: MicrotaskQueue,
}

impl NativeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing backlog, typically one shared with the callbacks
    pub fn with_microtasks(microtasks: MicrotaskQueue) -> Self {
        Self { microtasks }
    }

    pub fn microtasks(&self) -> &MicrotaskQueue {
        &self.microtasks
    }

    /// Box a closure as a [`NativeCallback`]
    pub fn callback<F>(f: F) -> NativeCallback
    where
        F: Fn() -> Result<Completion, CallbackError> + 'static,
    {
        Box::new(f)
    }
}

impl TaskHost for NativeHost {
    type Callback = NativeCallback;

    fn invoke(
        &mut self,
        callback: &NativeCallback,
        source: FailureSource,
    ) -> Result<Completion, CallbackError> {
        let completion = callback()?;
        match source {
            FailureSource::Ticker => Ok(completion),
            FailureSource::Timer | FailureSource::AnimationFrame => Ok(Completion::Immediate),
        }
    }

    /// Runs jobs until the queue is empty, including jobs queued by jobs.
    fn flush_deferred(&mut self) -> usize {
        let mut drained = 0;
        while let Some(job) = self.microtasks.pop() {
            job();
            drained += 1;
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_flush_runs_nested_jobs() {
        let queue = MicrotaskQueue::new();
        let mut host = NativeHost::with_microtasks(queue.clone());
        let hits = Rc::new(Cell::new(0));

        let inner_queue = queue.clone();
        let inner_hits = Rc::clone(&hits);
        queue.enqueue(move || {
            inner_hits.set(inner_hits.get() + 1);
            let nested_hits = Rc::clone(&inner_hits);
            inner_queue.enqueue(move || nested_hits.set(nested_hits.get() + 1));
        });

        assert_eq!(host.flush_deferred(), 2);
        assert_eq!(hits.get(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_non_ticker_completion_is_dropped() {
        let mut host = NativeHost::new();
        let callback = NativeHost::callback(|| Ok(Completion::Deferred(crate::deferred().0)));

        let timer = host.invoke(&callback, FailureSource::Timer).unwrap();
        assert!(matches!(timer, Completion::Immediate));

        let ticker = host.invoke(&callback, FailureSource::Ticker).unwrap();
        assert!(matches!(ticker, Completion::Deferred(_)));
    }
}
