//! fxtick JavaScript runtime
//!
//! QuickJS-based script runtime whose timer globals are pumped by the host.
//!
//! Features:
//! - QuickJS runtime via rquickjs
//! - Timers (setTimeout, setInterval, setImmediate and their clear functions)
//! - Tickers (setTick, clearTick) with promise backpressure
//! - requestAnimationFrame
//! - Promise job queue drained once per host tick
//!
//! # Example
//! ```rust,ignore
//! use fxtick_js::{RuntimeConfig, ScriptRuntime};
//!
//! let runtime = ScriptRuntime::new(RuntimeConfig::default())?;
//! runtime.exec("setTick(() => { globalThis.frames = (globalThis.frames || 0) + 1 })")?;
//! for now in 0..60 {
//!     runtime.tick(now * 16);
//! }
//! ```

mod config;
mod host;
mod runtime;
mod timers;

pub use config::RuntimeConfig;
pub use host::JsHost;
pub use runtime::ScriptRuntime;
pub use timers::{JsCallback, install_timers};

pub use fxtick_core::{SchedulerStats, TickReport};

/// Execute JavaScript code in a fresh runtime
pub fn eval(code: &str) -> Result<JsValue, JsError> {
    let runtime = ScriptRuntime::new(RuntimeConfig::default())?;
    runtime.eval(code)
}

/// JavaScript value
#[derive(Debug, Clone, PartialEq)]
pub enum JsValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object,
    Array,
    Function,
}

/// JavaScript error
#[derive(Debug, thiserror::Error)]
pub enum JsError {
    #[error("JavaScript error: {0}")]
    Runtime(String),

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Type error: {0}")]
    TypeError(String),
}
