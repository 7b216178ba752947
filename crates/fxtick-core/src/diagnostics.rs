//! Failure reporting
//!
//! Callback failures never escape the tick driver; they are handed to a
//! [`DiagnosticSink`] tagged with the phase that raised them.

use std::fmt;

use crate::CallbackError;

/// Phase a failing callback belonged to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureSource {
    Timer,
    Ticker,
    AnimationFrame,
}

impl FailureSource {
    /// Tag used in diagnostics
    pub const fn as_str(self) -> &'static str {
        match self {
            FailureSource::Timer => "timer",
            FailureSource::Ticker => "ticker",
            FailureSource::AnimationFrame => "animationFrame",
        }
    }
}

impl fmt::Display for FailureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives callback failures
pub trait DiagnosticSink {
    fn report(&self, source: FailureSource, error: &CallbackError);
}

/// Default sink: logs through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, source: FailureSource, error: &CallbackError) {
        tracing::error!(source = source.as_str(), "Error in {} callback: {}", source, error);
    }
}

impl<F> DiagnosticSink for F
where
    F: Fn(FailureSource, &CallbackError),
{
    fn report(&self, source: FailureSource, error: &CallbackError) {
        self(source, error)
    }
}
