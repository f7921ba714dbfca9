//! # Dispatch algorithms.
//!
//! Two entry points, one per handler family:
//! - [`publish`] runs action handlers and reports a [`Delivery`];
//! - [`collect`] runs function handlers and appends their results.
//!
//! ## Flow (both families)
//! ```text
//! subject = (type_of(M), scope)
//!   ├─ no entry ─► stop, unless scoped Broadcast and FallbackPolicy::Always
//!   ├─ for each subscription (order asc):
//!   │     invoke(&mut message)
//!   │     message.is_cancelled()? ─► stop (no global pass)
//!   └─ scope.is_some() && Broadcast ─► recurse with scope = None
//! ```
//!
//! ## Rules
//! - Handlers run on the caller's stack; re-entrant publishes simply nest.
//! - The global pass is an independent publish: it restarts cancellation checks.
//! - A handler panic or a type mismatch aborts the remaining handlers of the call.

use std::any::{type_name, Any};

use tracing::trace;

use crate::core::config::FallbackPolicy;
use crate::error::BusError;
use crate::messages::{Message, PublishMode};
use crate::subjects::{
    ActionInvoker, FunctionInvoker, PayloadMismatch, Registry, ScopeId, SubjectKey,
};

/// Outcome of an action publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Number of handlers invoked, scoped and global together.
    pub invoked: usize,
    /// `true` if a handler cancelled the message.
    pub cancelled: bool,
}

impl Delivery {
    /// Returns `true` if no handler ran.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.invoked == 0
    }
}

fn payload_mismatch(subject: &SubjectKey, err: PayloadMismatch) -> BusError {
    BusError::TypeMismatch {
        subject: subject.to_string(),
        expected: err.expected,
    }
}

/// Whether the publish continues after the scoped subject turned out to have no entry.
fn continues_without_entry(
    subject: &SubjectKey,
    fallback: FallbackPolicy,
    mode: PublishMode,
) -> bool {
    !subject.is_global() && mode.reaches_global() && fallback.covers_unknown_subject()
}

/// Runs the action handlers of `(M, scope)` and, for scoped broadcasts, the global ones.
pub(crate) fn publish<M: Message>(
    actions: &Registry<ActionInvoker>,
    fallback: FallbackPolicy,
    scope: Option<&ScopeId>,
    message: &mut M,
    mode: PublishMode,
    delivery: &mut Delivery,
) -> Result<(), BusError> {
    let subject = SubjectKey::of::<M>(scope.cloned());

    match actions.snapshot(&subject) {
        Some(list) => {
            for sub in list.iter() {
                (sub.invoker)(&mut *message as &mut dyn Any)
                    .map_err(|err| payload_mismatch(&subject, err))?;
                delivery.invoked += 1;

                if message.is_cancelled() {
                    trace!(subject = %subject, invoked = delivery.invoked, "dispatch cancelled");
                    delivery.cancelled = true;
                    return Ok(());
                }
            }
        }
        None => {
            trace!(subject = %subject, "no action subscribers");
            if !continues_without_entry(&subject, fallback, mode) {
                return Ok(());
            }
        }
    }

    if scope.is_some() && mode.reaches_global() {
        trace!(subject = %subject, "broadcast to global action subscribers");
        publish(actions, fallback, None, message, mode, delivery)?;
    }
    Ok(())
}

/// Runs the function handlers of `(M, scope)` and appends their results to `out`.
///
/// Returns `true` if a handler cancelled the message.
pub(crate) fn collect<M: Message, R: 'static>(
    functions: &Registry<FunctionInvoker>,
    fallback: FallbackPolicy,
    scope: Option<&ScopeId>,
    message: &mut M,
    mode: PublishMode,
    out: &mut Vec<R>,
) -> Result<bool, BusError> {
    let subject = SubjectKey::of::<M>(scope.cloned());
    let falls_through = scope.is_some() && mode.reaches_global();

    let scoped = functions.snapshot(&subject);
    if scoped.is_none() {
        trace!(subject = %subject, "no function subscribers");
        if !continues_without_entry(&subject, fallback, mode) {
            return Ok(false);
        }
    }

    let expected = scoped.as_ref().map_or(0, |list| list.len())
        + if falls_through {
            functions.len(&subject.to_global())
        } else {
            0
        };
    out.reserve(expected);

    if let Some(list) = scoped {
        for sub in list.iter() {
            let value = (sub.invoker)(&mut *message as &mut dyn Any)
                .map_err(|err| payload_mismatch(&subject, err))?;
            let value = value
                .downcast::<R>()
                .map_err(|_| BusError::TypeMismatch {
                    subject: subject.to_string(),
                    expected: type_name::<R>(),
                })?;
            out.push(*value);

            if message.is_cancelled() {
                trace!(subject = %subject, produced = out.len(), "dispatch cancelled");
                return Ok(true);
            }
        }
    }

    if falls_through {
        trace!(subject = %subject, "broadcast to global function subscribers");
        return collect(functions, fallback, None, message, mode, out);
    }
    Ok(false)
}
