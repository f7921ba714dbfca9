//! # Subscription records and handler identity.
//!
//! A [`Subscription`] ties together:
//! - its [`SubscriptionId`] (subject + handler identity), used for dedup and removal;
//! - a type-erased invoker that accepts `&mut dyn Any`;
//! - an integer `order` (lower runs first).
//!
//! Handlers are registered as `Arc<F>`. The handler identity ([`HandlerId`]) is the
//! address of that shared allocation, so registering a clone of the same `Arc` twice
//! is recognised as the same handler. The invoker keeps the `Arc` alive, so an
//! identity cannot be reused while the handler is registered.
//!
//! ## Invocation wrappers
//! ```text
//! Fn(&mut M)        ──► ActionInvoker:   &mut dyn Any ─► downcast M ─► ()
//! Fn()              ──► ActionInvoker:   &mut dyn Any ─► check M    ─► ()
//! Fn(&mut M) -> R   ──► FunctionInvoker: &mut dyn Any ─► downcast M ─► Box<dyn Any>(R)
//! Fn() -> R         ──► FunctionInvoker: &mut dyn Any ─► check M    ─► Box<dyn Any>(R)
//! ```

use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

use crate::subjects::key::SubjectKey;

/// The payload handed to an invoker was not its registered message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PayloadMismatch {
    pub(crate) expected: &'static str,
}

/// Type-erased wrapper around an action handler.
pub(crate) type ActionInvoker =
    Arc<dyn Fn(&mut dyn Any) -> Result<(), PayloadMismatch> + Send + Sync>;

/// Type-erased wrapper around a function handler; the result is boxed.
pub(crate) type FunctionInvoker =
    Arc<dyn Fn(&mut dyn Any) -> Result<Box<dyn Any>, PayloadMismatch> + Send + Sync>;

/// Identity of a registered handler.
///
/// Derived from the address of the handler's `Arc` allocation.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use subjectbus::HandlerId;
///
/// let a = Arc::new(|| {});
/// let b = Arc::new(|| {});
///
/// assert_eq!(HandlerId::of(&a), HandlerId::of(&a.clone()));
/// assert_ne!(HandlerId::of(&a), HandlerId::of(&b));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandlerId(usize);

impl HandlerId {
    /// Returns the identity of a shared handler.
    pub fn of<F: ?Sized>(handler: &Arc<F>) -> Self {
        HandlerId(Arc::as_ptr(handler) as *const () as usize)
    }

    #[cfg(test)]
    pub(crate) fn from_raw(raw: usize) -> Self {
        HandlerId(raw)
    }
}

/// Dedup/removal key of a subscription: subject plus handler identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    /// Subject the handler is registered under.
    pub subject: SubjectKey,
    /// Identity of the handler.
    pub handler: HandlerId,
}

impl SubscriptionId {
    /// Pairs a subject with a handler identity.
    pub fn new(subject: SubjectKey, handler: HandlerId) -> Self {
        Self { subject, handler }
    }
}

/// One registered handler.
///
/// Ordered by `order` only; equality (for duplicate detection) is by [`SubscriptionId`].
#[derive(Clone)]
pub(crate) struct Subscription<I> {
    pub(crate) id: SubscriptionId,
    pub(crate) invoker: I,
    pub(crate) order: i32,
}

impl<I> Subscription<I> {
    pub(crate) fn new(id: SubscriptionId, invoker: I, order: i32) -> Self {
        Self { id, invoker, order }
    }
}

impl<I> PartialEq for Subscription<I> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<I> fmt::Debug for Subscription<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

fn mismatch<M: 'static>() -> PayloadMismatch {
    PayloadMismatch {
        expected: type_name::<M>(),
    }
}

/// Wraps `Fn(&mut M)`.
pub(crate) fn action<M, F>(handler: Arc<F>) -> ActionInvoker
where
    M: 'static,
    F: Fn(&mut M) + Send + Sync + ?Sized + 'static,
{
    Arc::new(move |payload: &mut dyn Any| -> Result<(), PayloadMismatch> {
        let message = payload.downcast_mut::<M>().ok_or_else(mismatch::<M>)?;
        handler(message);
        Ok(())
    })
}

/// Wraps `Fn()`; the payload is type-checked and then ignored.
pub(crate) fn unit_action<M, F>(handler: Arc<F>) -> ActionInvoker
where
    M: 'static,
    F: Fn() + Send + Sync + ?Sized + 'static,
{
    Arc::new(move |payload: &mut dyn Any| -> Result<(), PayloadMismatch> {
        if !payload.is::<M>() {
            return Err(mismatch::<M>());
        }
        handler();
        Ok(())
    })
}

/// Wraps `Fn(&mut M) -> R`.
pub(crate) fn function<M, R, F>(handler: Arc<F>) -> FunctionInvoker
where
    M: 'static,
    R: 'static,
    F: Fn(&mut M) -> R + Send + Sync + ?Sized + 'static,
{
    Arc::new(move |payload: &mut dyn Any| -> Result<Box<dyn Any>, PayloadMismatch> {
        let message = payload.downcast_mut::<M>().ok_or_else(mismatch::<M>)?;
        Ok(Box::new(handler(message)) as Box<dyn Any>)
    })
}

/// Wraps `Fn() -> R`; the payload is type-checked and then ignored.
pub(crate) fn unit_function<M, R, F>(handler: Arc<F>) -> FunctionInvoker
where
    M: 'static,
    R: 'static,
    F: Fn() -> R + Send + Sync + ?Sized + 'static,
{
    Arc::new(move |payload: &mut dyn Any| -> Result<Box<dyn Any>, PayloadMismatch> {
        if !payload.is::<M>() {
            return Err(mismatch::<M>());
        }
        Ok(Box::new(handler()) as Box<dyn Any>)
    })
}
