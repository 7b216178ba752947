//! fxtick scheduler core
//!
//! Host-driven cooperative scheduler for embedded script engines that have
//! no event loop of their own. The host calls [`Scheduler::tick`] once per
//! frame with a non-decreasing logical time; everything else happens inside
//! that call.
//!
//! Features:
//! - Timers (setTimeout, setInterval, setImmediate) with clamped intervals
//! - Tickers: per-frame callbacks with at most one outstanding async body
//! - Animation frames: single-shot callbacks batched per tick
//! - Deferred backlog flush after every tick, idle ticks included
//!
//! # Example
//! ```rust
//! use fxtick_core::{Completion, NativeHost, Scheduler};
//!
//! let scheduler = Scheduler::new(0);
//! let mut host = NativeHost::new();
//!
//! scheduler.set_timeout(NativeHost::callback(|| Ok(Completion::Immediate)), Some(5.0));
//! for now in 1..=6 {
//!     scheduler.tick(now, &mut host);
//! }
//! assert_eq!(scheduler.active_timer_count(), 0);
//! ```

mod clock;
mod deferred;
mod diagnostics;
mod error;
mod frame;
mod handle;
mod host;
mod interval;
mod native;
mod scheduler;
mod ticker;
mod timer;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use deferred::{Completion, Deferred, Settler, deferred};
pub use diagnostics::{DiagnosticSink, FailureSource, TracingSink};
pub use error::{CallbackError, SchedulerError};
pub use frame::FrameQueue;
pub use handle::{HandleAllocator, TickerId, TimerHandle};
pub use host::TaskHost;
pub use interval::Interval;
pub use native::{MicrotaskQueue, NativeCallback, NativeHost};
pub use scheduler::{Scheduler, SchedulerStats, TickReport};
pub use ticker::{TickerRecord, TickerTable};
pub use timer::{TimerKind, TimerRecord, TimerTable};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
