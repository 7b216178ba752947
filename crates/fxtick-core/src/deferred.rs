//! Deferred results returned by ticker callbacks
//!
//! A ticker that starts asynchronous work hands back a [`Deferred`]. The
//! scheduler checks it once per tick without blocking and keeps the ticker
//! suspended until it resolves.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use futures::FutureExt;
use futures::channel::oneshot;

use crate::CallbackError;

/// What a callback invocation produced
#[derive(Debug)]
pub enum Completion {
    /// Ran to completion synchronously
    Immediate,
    /// Started work that settles later
    Deferred(Deferred),
}

impl From<Deferred> for Completion {
    fn from(deferred: Deferred) -> Self {
        Completion::Deferred(deferred)
    }
}

/// Handle to an asynchronous result that has not settled yet
pub struct Deferred {
    future: Pin<Box<dyn Future<Output = Result<(), CallbackError>>>>,
}

impl Deferred {
    /// Wrap any future. It is polled from inside the tick driver, so it must
    /// not block.
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<(), CallbackError>> + 'static,
    {
        Self { future: future.boxed_local() }
    }

    /// Poll once. `Some` means settled; the deferred must not be polled again.
    pub fn poll_settled(&mut self) -> Option<Result<(), CallbackError>> {
        (&mut self.future).now_or_never()
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}

/// Settles the [`Deferred`] it was created with. Dropping it unsettled
/// settles the deferred as [`CallbackError::Abandoned`].
#[derive(Debug)]
pub struct Settler {
    sender: oneshot::Sender<Result<(), CallbackError>>,
}

impl Settler {
    pub fn resolve(self) {
        self.settle(Ok(()));
    }

    pub fn reject(self, error: CallbackError) {
        self.settle(Err(error));
    }

    fn settle(self, result: Result<(), CallbackError>) {
        // The deferred may already be gone (its ticker was cleared)
        let _ = self.sender.send(result);
    }
}

/// Create an unsettled [`Deferred`] and the [`Settler`] that completes it
pub fn deferred() -> (Deferred, Settler) {
    let (sender, receiver) = oneshot::channel();
    let settlement = receiver.map(|received| received.unwrap_or(Err(CallbackError::Abandoned)));
    (Deferred::from_future(settlement), Settler { sender })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_until_resolved() {
        let (mut pending, settler) = deferred();
        assert!(pending.poll_settled().is_none());

        settler.resolve();
        assert_eq!(pending.poll_settled(), Some(Ok(())));
    }

    #[test]
    fn test_rejection_carries_error() {
        let (mut pending, settler) = deferred();
        settler.reject(CallbackError::thrown("boom"));

        assert_eq!(pending.poll_settled(), Some(Err(CallbackError::thrown("boom"))));
    }

    #[test]
    fn test_dropped_settlers_abandon() {
        let (mut pending, settler) = deferred();
        assert!(pending.poll_settled().is_none());

        drop(settler);
        assert_eq!(pending.poll_settled(), Some(Err(CallbackError::Abandoned)));
    }

    #[test]
    fn test_settling_after_deferred_dropped() {
        let (pending, settler) = deferred();
        drop(pending);
        settler.resolve();
    }

    #[test]
    fn test_from_ready_future() {
        let mut ready = Deferred::from_future(std::future::ready(Ok(())));
        assert_eq!(ready.poll_settled(), Some(Ok(())));
    }
}
