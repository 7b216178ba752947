//! QuickJS task host
//!
//! Runs scheduled callbacks inside the script context and drains the
//! QuickJS promise job queue, which nothing else services because the
//! runtime has no event loop of its own.

use std::cell::RefCell;
use std::rc::Rc;

use fxtick_core::{CallbackError, Completion, FailureSource, TaskHost, deferred};
use rquickjs::convert::Coerced;
use rquickjs::function::{Opt, This};
use rquickjs::{CaughtError, Context, Ctx, FromJs, Function, Runtime, Value};

use crate::JsCallback;

/// [`TaskHost`] over a QuickJS runtime and context
pub struct JsHost<'a> {
    runtime: &'a Runtime,
    context: &'a Context,
    max_jobs_per_flush: Option<usize>,
}

impl<'a> JsHost<'a> {
    pub fn new(runtime: &'a Runtime, context: &'a Context) -> Self {
        Self {
            runtime,
            context,
            max_jobs_per_flush: None,
        }
    }

    /// Stop each flush after `limit` jobs; the rest run next tick
    pub fn with_job_limit(mut self, limit: Option<usize>) -> Self {
        self.max_jobs_per_flush = limit;
        self
    }
}

impl TaskHost for JsHost<'_> {
    type Callback = JsCallback;

    fn invoke(
        &mut self,
        callback: &JsCallback,
        source: FailureSource,
    ) -> Result<Completion, CallbackError> {
        self.context.with(|ctx| {
            let value = callback.call(&ctx).map_err(|err| callback_error(&ctx, err))?;
            match source {
                FailureSource::Ticker => completion_for(&ctx, value),
                FailureSource::Timer | FailureSource::AnimationFrame => Ok(Completion::Immediate),
            }
        })
    }

    fn flush_deferred(&mut self) -> usize {
        let mut drained = 0;
        loop {
            if self.max_jobs_per_flush.is_some_and(|limit| drained >= limit) {
                tracing::warn!(
                    drained,
                    "Promise job limit reached, remaining jobs wait for the next tick"
                );
                break;
            }
            match self.runtime.execute_pending_job() {
                Ok(true) => drained += 1,
                Ok(false) => break,
                Err(exception) => {
                    drained += 1;
                    let message = exception.0.with(|ctx| {
                        let thrown = ctx.catch();
                        describe_value(&ctx, thrown)
                    });
                    tracing::error!("Error in promise job: {}", message);
                }
            }
        }
        drained
    }
}

/// Ticker return values that look like a promise (an object with a callable
/// `then`) become a [`Completion::Deferred`] settled through that `then`.
fn completion_for<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> Result<Completion, CallbackError> {
    let Some(object) = value.as_object() else {
        return Ok(Completion::Immediate);
    };
    let then: Value<'js> = object.get("then").map_err(|err| callback_error(ctx, err))?;
    let Some(then) = then.as_function() else {
        return Ok(Completion::Immediate);
    };

    let (pending, settler) = deferred();
    // Shared so whichever reaction runs first consumes the settler
    let settler = Rc::new(RefCell::new(Some(settler)));

    let on_fulfilled = {
        let settler = Rc::clone(&settler);
        Function::new(ctx.clone(), move || {
            if let Some(settler) = settler.borrow_mut().take() {
                settler.resolve();
            }
        })
    }
    .map_err(|err| callback_error(ctx, err))?;

    let on_rejected = Function::new(
        ctx.clone(),
        move |ctx: Ctx<'js>, reason: Opt<Value<'js>>| {
            if let Some(settler) = settler.borrow_mut().take() {
                let reason = reason.0.unwrap_or_else(|| Value::new_undefined(ctx.clone()));
                settler.reject(CallbackError::thrown(describe_value(&ctx, reason)));
            }
        },
    )
    .map_err(|err| callback_error(ctx, err))?;

    then.call::<_, Value>((This(object.clone()), on_fulfilled, on_rejected))
        .map_err(|err| callback_error(ctx, err))?;

    Ok(Completion::Deferred(pending))
}

pub(crate) fn callback_error<'js>(ctx: &Ctx<'js>, err: rquickjs::Error) -> CallbackError {
    CallbackError::thrown(CaughtError::from_error(ctx, err).to_string())
}

/// String form of a thrown or rejected value
pub(crate) fn describe_value<'js>(ctx: &Ctx<'js>, value: Value<'js>) -> String {
    match Coerced::<String>::from_js(ctx, value) {
        Ok(Coerced(text)) => text,
        Err(_) => "<unprintable value>".to_string(),
    }
}
