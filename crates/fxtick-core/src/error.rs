//! Scheduler errors

/// Registration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl SchedulerError {
    /// Error for a registration call whose callback cannot be invoked
    pub fn not_invocable(function: &str) -> Self {
        Self::InvalidArgument(format!("{function}: callback is not a function"))
    }
}

/// Failure raised by a scheduled callback or by its deferred result
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallbackError {
    #[error("{0}")]
    Thrown(String),

    #[error("deferred result was dropped before it settled")]
    Abandoned,
}

impl CallbackError {
    pub fn thrown(message: impl Into<String>) -> Self {
        Self::Thrown(message.into())
    }
}
