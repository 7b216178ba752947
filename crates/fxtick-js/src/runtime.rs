//! Script runtime

use fxtick_core::{Clock, Scheduler, SchedulerStats, TickReport};
use rquickjs::{CaughtError, Context, Ctx, Runtime, Value};

use crate::host::JsHost;
use crate::timers::install_timers;
use crate::{JsCallback, JsError, JsValue, RuntimeConfig};

/// QuickJS runtime with the timer globals installed, pumped by [`ScriptRuntime::tick`]
pub struct ScriptRuntime {
    scheduler: Scheduler<JsCallback>,
    config: RuntimeConfig,
    context: Context,
    runtime: Runtime,
}

impl ScriptRuntime {
    /// Create a runtime whose logical clock starts at zero
    pub fn new(config: RuntimeConfig) -> Result<Self, JsError> {
        Self::with_scheduler(config, Scheduler::new(0))
    }

    /// Create a runtime whose logical clock starts at `clock.now()`
    pub fn with_clock(config: RuntimeConfig, clock: &dyn Clock) -> Result<Self, JsError> {
        Self::with_scheduler(config, Scheduler::from_clock(clock))
    }

    /// Create a runtime around an existing scheduler, e.g. one built with a
    /// custom diagnostic sink
    pub fn with_scheduler(
        config: RuntimeConfig,
        scheduler: Scheduler<JsCallback>,
    ) -> Result<Self, JsError> {
        tracing::info!(memory_limit = config.memory_limit, "Creating script runtime");

        let runtime = Runtime::new().map_err(|e| JsError::Runtime(e.to_string()))?;
        runtime.set_memory_limit(config.memory_limit);
        if let Some(size) = config.max_stack_size {
            runtime.set_max_stack_size(size);
        }

        let context = Context::full(&runtime).map_err(|e| JsError::Runtime(e.to_string()))?;
        context.with(|ctx| {
            install_timers(&ctx, &scheduler).map_err(|e| JsError::Runtime(e.to_string()))
        })?;

        Ok(Self {
            scheduler,
            config,
            context,
            runtime,
        })
    }

    /// Evaluate JavaScript code
    pub fn eval(&self, code: &str) -> Result<JsValue, JsError> {
        self.context.with(|ctx| {
            let result: Value = ctx.eval(code).map_err(|e| script_error(&ctx, e))?;
            Ok(convert_value(&result))
        })
    }

    /// Execute JavaScript (ignore result)
    pub fn exec(&self, code: &str) -> Result<(), JsError> {
        self.context.with(|ctx| {
            let _: Value = ctx.eval(code).map_err(|e| script_error(&ctx, e))?;
            Ok(())
        })
    }

    /// Advance the scheduler to `now` and drain the promise job queue
    pub fn tick(&self, now: u64) -> TickReport {
        let mut host = JsHost::new(&self.runtime, &self.context)
            .with_job_limit(self.config.max_jobs_per_flush);
        self.scheduler.tick(now, &mut host)
    }

    pub fn scheduler(&self) -> &Scheduler<JsCallback> {
        &self.scheduler
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }
}

impl Drop for ScriptRuntime {
    fn drop(&mut self) {
        // Saved callbacks must be released before the QuickJS runtime is freed
        self.scheduler.clear();
    }
}

fn convert_value(value: &Value<'_>) -> JsValue {
    if value.is_undefined() {
        JsValue::Undefined
    } else if value.is_null() {
        JsValue::Null
    } else if let Some(b) = value.as_bool() {
        JsValue::Bool(b)
    } else if let Some(n) = value.as_number() {
        JsValue::Number(n)
    } else if let Some(s) = value.as_string() {
        s.to_string().map(JsValue::String).unwrap_or(JsValue::Undefined)
    } else if value.is_array() {
        JsValue::Array
    } else if value.is_function() {
        JsValue::Function
    } else {
        JsValue::Object
    }
}

fn script_error(ctx: &Ctx<'_>, err: rquickjs::Error) -> JsError {
    match CaughtError::from_error(ctx, err) {
        CaughtError::Exception(exception) => {
            let name: Option<String> = exception.as_object().get("name").ok();
            let message = exception.message().unwrap_or_default();
            match name.as_deref() {
                Some("SyntaxError") => JsError::Syntax(message),
                Some("TypeError") => JsError::TypeError(message),
                _ => JsError::Runtime(message),
            }
        }
        other => JsError::Runtime(other.to_string()),
    }
}
