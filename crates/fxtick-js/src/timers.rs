//! Timer APIs
//!
//! Installs setTimeout, setInterval, setImmediate, the clear functions,
//! setTick/clearTick and requestAnimationFrame as globals backed by a
//! shared [`Scheduler`].

use fxtick_core::{Scheduler, SchedulerError, TickerId, TimerHandle};
use rquickjs::convert::Coerced;
use rquickjs::function::{Opt, Rest, This};
use rquickjs::{Ctx, Exception, FromJs, Function, Object, Persistent, Value};

/// A script callback plus the arguments bound at registration
#[derive(Clone)]
pub struct JsCallback {
    target: Persistent<Value<'static>>,
    args: Vec<Persistent<Value<'static>>>,
}

impl JsCallback {
    /// Keep `target` alive outside the current context scope. No check that
    /// it is callable; invoking a non-function fails at call time.
    pub fn new<'js>(ctx: &Ctx<'js>, target: Value<'js>, args: Vec<Value<'js>>) -> Self {
        Self {
            target: Persistent::save(ctx, target),
            args: args.into_iter().map(|arg| Persistent::save(ctx, arg)).collect(),
        }
    }

    /// Like [`JsCallback::new`] but rejects anything that is not a function
    pub fn function<'js>(
        ctx: &Ctx<'js>,
        api: &str,
        target: Option<Value<'js>>,
        args: Vec<Value<'js>>,
    ) -> Result<Self, SchedulerError> {
        match target {
            Some(target) if target.is_function() => Ok(Self::new(ctx, target, args)),
            _ => Err(SchedulerError::not_invocable(api)),
        }
    }

    /// Invoke with the bound arguments and an undefined `this`
    pub fn call<'js>(&self, ctx: &Ctx<'js>) -> rquickjs::Result<Value<'js>> {
        let target = self.target.clone().restore(ctx)?;
        let args = self
            .args
            .iter()
            .map(|arg| arg.clone().restore(ctx))
            .collect::<rquickjs::Result<Vec<_>>>()?;

        match target.as_function() {
            Some(function) => function.call((Rest(args),)),
            None => Err(Exception::throw_type(ctx, "scheduled callback is not a function")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum TimerApi {
    Timeout,
    Interval,
    Immediate,
}

impl TimerApi {
    const fn name(self) -> &'static str {
        match self {
            TimerApi::Timeout => "setTimeout",
            TimerApi::Interval => "setInterval",
            TimerApi::Immediate => "setImmediate",
        }
    }
}

/// Install timer APIs into the global object
pub fn install_timers<'js>(
    ctx: &Ctx<'js>,
    scheduler: &Scheduler<JsCallback>,
) -> rquickjs::Result<()> {
    let globals = ctx.globals();

    for api in [TimerApi::Timeout, TimerApi::Interval, TimerApi::Immediate] {
        let sched = scheduler.clone();
        globals.set(
            api.name(),
            Function::new(
                ctx.clone(),
                move |ctx: Ctx<'js>, args: Rest<Value<'js>>| -> rquickjs::Result<Object<'js>> {
                    register_timer(&ctx, &sched, api, args.0)
                },
            )?,
        )?;
    }

    // clearTimeout, clearInterval and clearImmediate are the same function
    for name in ["clearTimeout", "clearInterval", "clearImmediate"] {
        let sched = scheduler.clone();
        globals.set(
            name,
            Function::new(
                ctx.clone(),
                move |ctx: Ctx<'js>, handle: Opt<Value<'js>>| -> rquickjs::Result<()> {
                    if let Some(id) = numeric_id(&ctx, handle.0)? {
                        sched.clear_timer(TimerHandle::from_raw(id));
                    }
                    Ok(())
                },
            )?,
        )?;
    }

    // setTick
    let sched = scheduler.clone();
    globals.set(
        "setTick",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, callback: Opt<Value<'js>>| -> rquickjs::Result<f64> {
                let callback = JsCallback::function(&ctx, "setTick", callback.0, Vec::new())
                    .map_err(|err| throw_invalid(&ctx, &err))?;
                Ok(sched.set_tick(callback).id() as f64)
            },
        )?,
    )?;

    // clearTick
    let sched = scheduler.clone();
    globals.set(
        "clearTick",
        Function::new(
            ctx.clone(),
            move |ctx: Ctx<'js>, id: Opt<Value<'js>>| -> rquickjs::Result<()> {
                if let Some(id) = numeric_id(&ctx, id.0)? {
                    sched.clear_tick(TickerId::from_raw(id));
                }
                Ok(())
            },
        )?,
    )?;

    // requestAnimationFrame: accepted as is, failures surface when the frame runs
    let sched = scheduler.clone();
    globals.set(
        "requestAnimationFrame",
        Function::new(ctx.clone(), move |ctx: Ctx<'js>, callback: Opt<Value<'js>>| {
            let target = callback.0.unwrap_or_else(|| Value::new_undefined(ctx.clone()));
            sched.request_animation_frame(JsCallback::new(&ctx, target, Vec::new()));
        })?,
    )?;

    Ok(())
}

fn register_timer<'js>(
    ctx: &Ctx<'js>,
    scheduler: &Scheduler<JsCallback>,
    api: TimerApi,
    args: Vec<Value<'js>>,
) -> rquickjs::Result<Object<'js>> {
    let mut args = args.into_iter();
    let target = args.next();
    let delay = match api {
        TimerApi::Immediate => None,
        TimerApi::Timeout | TimerApi::Interval => args.next().and_then(|value| value.as_number()),
    };

    let callback = JsCallback::function(ctx, api.name(), target, args.collect())
        .map_err(|err| throw_invalid(ctx, &err))?;

    let handle = match api {
        TimerApi::Timeout => scheduler.set_timeout(callback, delay),
        TimerApi::Interval => scheduler.set_interval(callback, delay),
        TimerApi::Immediate => scheduler.set_immediate(callback),
    };
    timer_handle_object(ctx, scheduler, handle)
}

/// Script-side handle: ref/unref/hasRef/refresh, coerces to its id
fn timer_handle_object<'js>(
    ctx: &Ctx<'js>,
    scheduler: &Scheduler<JsCallback>,
    handle: TimerHandle,
) -> rquickjs::Result<Object<'js>> {
    let object = Object::new(ctx.clone())?;

    object.set("ref", Function::new(ctx.clone(), |this: This<Object<'js>>| this.0)?)?;
    object.set("unref", Function::new(ctx.clone(), |this: This<Object<'js>>| this.0)?)?;
    object.set("hasRef", Function::new(ctx.clone(), move || handle.has_ref())?)?;

    let sched = scheduler.clone();
    object.set(
        "refresh",
        Function::new(ctx.clone(), move |this: This<Object<'js>>| {
            sched.refresh(handle);
            this.0
        })?,
    )?;

    let id = handle.id();
    object.set("valueOf", Function::new(ctx.clone(), move || id as f64)?)?;
    object.set("toString", Function::new(ctx.clone(), move || id.to_string())?)?;

    Ok(object)
}

/// Numeric id of a handle object or raw number; `None` for falsy input and
/// for numbers that cannot be an id
fn numeric_id<'js>(
    ctx: &Ctx<'js>,
    value: Option<Value<'js>>,
) -> rquickjs::Result<Option<u64>> {
    let Some(value) = value else {
        return Ok(None);
    };
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    let Coerced(number) = Coerced::<f64>::from_js(ctx, value)?;
    if !number.is_finite() || number < 1.0 || number.fract() != 0.0 {
        return Ok(None);
    }
    Ok(Some(number as u64))
}

fn throw_invalid(ctx: &Ctx<'_>, err: &SchedulerError) -> rquickjs::Error {
    Exception::throw_type(ctx, &err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rquickjs::{Context, Runtime};

    fn with_timers(test: impl for<'js> FnOnce(Ctx<'js>, &Scheduler<JsCallback>)) {
        let runtime = Runtime::new().unwrap();
        let context = Context::full(&runtime).unwrap();
        let scheduler = Scheduler::new(0);

        context.with(|ctx| {
            install_timers(&ctx, &scheduler).unwrap();
            test(ctx, &scheduler);
        });
        scheduler.clear();
    }

    #[test]
    fn test_globals_installed() {
        with_timers(|ctx, _| {
            for name in [
                "setTimeout",
                "setInterval",
                "setImmediate",
                "clearTimeout",
                "clearInterval",
                "clearImmediate",
                "setTick",
                "clearTick",
                "requestAnimationFrame",
            ] {
                let kind: String = ctx.eval(format!("typeof {name}")).unwrap();
                assert_eq!(kind, "function", "{name} missing");
            }
        });
    }

    #[test]
    fn test_registration_updates_tables() {
        with_timers(|ctx, scheduler| {
            let _: Value = ctx
                .eval(
                    "globalThis.t = setTimeout(() => {}, 10);
                     setInterval(() => {}, 5);
                     setTick(() => {});",
                )
                .unwrap();
            assert_eq!(scheduler.active_timer_count(), 2);
            assert_eq!(scheduler.active_ticker_count(), 1);

            let _: Value = ctx
                .eval("clearTimeout(t); clearTimeout(t); clearTimeout(undefined);")
                .unwrap();
            assert_eq!(scheduler.active_timer_count(), 1);
        });
    }

    #[test]
    fn test_handle_coerces_to_id() {
        with_timers(|ctx, _| {
            let same: bool = ctx
                .eval(
                    "const h = setInterval(() => {}, 1);
                     const m = {};
                     m[h] = 1;
                     h == +h && m[String(+h)] === 1",
                )
                .unwrap();
            assert!(same);

            let has_ref: bool = ctx
                .eval("h.ref() === h && h.unref() === h && h.hasRef()")
                .unwrap();
            assert!(has_ref);
        });
    }

    #[test]
    fn test_clear_accepts_numeric_id() {
        with_timers(|ctx, scheduler| {
            let _: Value = ctx
                .eval("const id = +setInterval(() => {}, 1); clearInterval(id);")
                .unwrap();
            assert_eq!(scheduler.active_timer_count(), 0);
        });
    }

    #[test]
    fn test_fractional_id_clears_nothing() {
        with_timers(|ctx, scheduler| {
            let _: Value = ctx
                .eval("setInterval(() => {}, 1); clearTimeout(1.5); clearTick(1.5);")
                .unwrap();
            assert_eq!(scheduler.active_timer_count(), 1);

            let _: Value = ctx.eval("setTick(() => {}); clearTick(1.5);").unwrap();
            assert_eq!(scheduler.active_ticker_count(), 1);
        });
    }

    #[test]
    fn test_non_function_throws_type_error() {
        with_timers(|ctx, scheduler| {
            let message: String = ctx
                .eval(
                    "try { setTimeout(42, 1); 'no error' }
                     catch (e) { e instanceof TypeError ? e.message : 'wrong type' }",
                )
                .unwrap();
            assert!(message.contains("setTimeout"), "got {message}");

            let threw: bool = ctx
                .eval("try { setTick('nope'); false } catch (e) { e instanceof TypeError }")
                .unwrap();
            assert!(threw);
            assert_eq!(scheduler.active_timer_count(), 0);
            assert_eq!(scheduler.active_ticker_count(), 0);
        });
    }

    #[test]
    fn test_animation_frame_accepts_anything() {
        with_timers(|ctx, scheduler| {
            let _: Value = ctx
                .eval("requestAnimationFrame(() => {}); requestAnimationFrame(5);")
                .unwrap();
            assert_eq!(scheduler.queued_frame_count(), 2);
        });
    }
}
