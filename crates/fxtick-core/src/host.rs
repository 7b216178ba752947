//! Host seam
//!
//! The scheduler stores callbacks opaquely; the embedding engine knows how
//! to run them and how to drain its own deferred backlog.

use crate::{CallbackError, Completion, FailureSource};

/// Runs scheduled callbacks on behalf of the tick driver
pub trait TaskHost {
    type Callback;

    /// Invoke one callback. `source` says which phase is calling; only
    /// [`FailureSource::Ticker`] invocations have their [`Completion`]
    /// tracked, the other phases drop it.
    fn invoke(
        &mut self,
        callback: &Self::Callback,
        source: FailureSource,
    ) -> Result<Completion, CallbackError>;

    /// Drain the deferred (microtask-like) backlog. Returns the number of
    /// entries run.
    fn flush_deferred(&mut self) -> usize;
}
