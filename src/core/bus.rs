//! # The bus: registration and publishing surface.
//!
//! [`Bus`] owns two registries (actions, functions) and a [`Config`]. It is cheap to
//! clone; clones share the same registries.
//!
//! ## Surface
//! | Family    | Subscribe                                   | Unsubscribe                                       |
//! |-----------|---------------------------------------------|---------------------------------------------------|
//! | action    | `subscribe`, `subscribe_in`                 | `unsubscribe`, `unsubscribe_in`                   |
//! | action () | `subscribe_unit`, `subscribe_unit_in`       | `unsubscribe_unit`, `unsubscribe_unit_in`         |
//! | function  | `subscribe_fn`, `subscribe_fn_in`           | `unsubscribe_fn`, `unsubscribe_fn_in`             |
//! | fn ()     | `subscribe_fn_unit`, `subscribe_fn_unit_in` | `unsubscribe_fn_unit`, `unsubscribe_fn_unit_in`   |
//! | any       |                                             | `unsubscribe_id`                                  |
//!
//! | Pattern   | Global      | Scoped (mode)  | Scoped (narrowcast) | Returns            |
//! |-----------|-------------|----------------|---------------------|--------------------|
//! | action    | `publish`   | `publish_in`   | `publish_to`        | [`Delivery`]       |
//! | function  | `collect`   | `collect_in`   | `collect_to`        | `Vec<R>`           |
//! | request   | `request`   | `request_in`   | `request_to`        | `Q::Response`      |
//! | aggregate | `aggregate` | `aggregate_in` | `aggregate_to`      | `A::Output`        |
//!
//! ## Rules
//! - Handlers are `Arc`s; the `Arc` allocation is the handler identity.
//! - Registering the same handler twice on the same subject is a no-op.
//! - Lower `order` runs first; equal orders run in registration order.
//! - Handlers run synchronously on the publishing thread. No lock is held while a
//!   handler runs, so handlers may publish, subscribe and unsubscribe.
//! - A publish runs the handler list as it was when the subject was looked up. A
//!   handler unsubscribed by an earlier handler of the same publish still runs once;
//!   a handler subscribed mid-publish first runs on the next lookup of its subject.

use std::fmt;
use std::sync::Arc;

use crate::core::config::Config;
use crate::core::dispatch::{self, Delivery};
use crate::error::BusError;
use crate::messages::{fold, Aggregate, Message, PublishMode, Request};
use crate::subjects::{
    self, ActionInvoker, FunctionInvoker, HandlerId, Registry, ScopeId, SubjectKey, Subscription,
    SubscriptionId,
};

struct Inner {
    cfg: Config,
    actions: Registry<ActionInvoker>,
    functions: Registry<FunctionInvoker>,
}

/// In-process publish/subscribe bus.
///
/// ## Example
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use subjectbus::{Bus, Message, PublishMode};
///
/// struct Score(u32);
/// impl Message for Score {}
///
/// let bus = Bus::new();
/// let log = Arc::new(Mutex::new(Vec::new()));
///
/// let l = log.clone();
/// bus.subscribe_in("player1", Arc::new(move |s: &mut Score| l.lock().unwrap().push(s.0 + 1)), 0);
/// let l = log.clone();
/// bus.subscribe(Arc::new(move |s: &mut Score| l.lock().unwrap().push(s.0 + 10)), 1);
///
/// let delivery = bus.publish_in("player1", &mut Score(0), PublishMode::Broadcast).unwrap();
/// assert_eq!(delivery.invoked, 2);
/// assert_eq!(*log.lock().unwrap(), vec![1, 10]);
/// ```
#[derive(Clone)]
pub struct Bus {
    inner: Arc<Inner>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bus")
            .field("cfg", &self.inner.cfg)
            .field("action_subjects", &self.inner.actions.subject_count())
            .field("function_subjects", &self.inner.functions.subject_count())
            .finish()
    }
}

impl Bus {
    /// Creates a bus with [`Config::default`].
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a bus with the given configuration.
    pub fn with_config(cfg: Config) -> Self {
        let capacity = cfg.subject_capacity;
        Self {
            inner: Arc::new(Inner {
                cfg,
                actions: Registry::with_capacity(capacity),
                functions: Registry::with_capacity(capacity),
            }),
        }
    }

    /// Returns the configuration this bus was built with.
    pub fn config(&self) -> &Config {
        &self.inner.cfg
    }

    // ---------------------------
    // Actions
    // ---------------------------

    /// Registers a global action handler for `M`.
    ///
    /// Returns `false` if this handler is already registered for the subject.
    pub fn subscribe<M, F>(&self, handler: Arc<F>, order: i32) -> bool
    where
        M: Message,
        F: Fn(&mut M) + Send + Sync + ?Sized + 'static,
    {
        let id = HandlerId::of(&handler);
        self.add_action::<M>(None, id, subjects::action::<M, F>(handler), order)
    }

    /// Registers an action handler for `M` under `scope`.
    pub fn subscribe_in<M, F>(
        &self,
        scope: impl Into<ScopeId>,
        handler: Arc<F>,
        order: i32,
    ) -> bool
    where
        M: Message,
        F: Fn(&mut M) + Send + Sync + ?Sized + 'static,
    {
        let id = HandlerId::of(&handler);
        self.add_action::<M>(Some(scope.into()), id, subjects::action::<M, F>(handler), order)
    }

    /// Registers a global zero-argument action handler for `M`.
    pub fn subscribe_unit<M, F>(&self, handler: Arc<F>, order: i32) -> bool
    where
        M: Message,
        F: Fn() + Send + Sync + ?Sized + 'static,
    {
        let id = HandlerId::of(&handler);
        self.add_action::<M>(None, id, subjects::unit_action::<M, F>(handler), order)
    }

    /// Registers a zero-argument action handler for `M` under `scope`.
    pub fn subscribe_unit_in<M, F>(
        &self,
        scope: impl Into<ScopeId>,
        handler: Arc<F>,
        order: i32,
    ) -> bool
    where
        M: Message,
        F: Fn() + Send + Sync + ?Sized + 'static,
    {
        let id = HandlerId::of(&handler);
        let invoker = subjects::unit_action::<M, F>(handler);
        self.add_action::<M>(Some(scope.into()), id, invoker, order)
    }

    /// Removes a global action handler. Returns `false` if it was not registered.
    pub fn unsubscribe<M, F>(&self, handler: &Arc<F>) -> bool
    where
        M: Message,
        F: Fn(&mut M) + ?Sized,
    {
        self.remove_action::<M>(None, HandlerId::of(handler))
    }

    /// Removes an action handler registered under `scope`.
    pub fn unsubscribe_in<M, F>(&self, scope: impl Into<ScopeId>, handler: &Arc<F>) -> bool
    where
        M: Message,
        F: Fn(&mut M) + ?Sized,
    {
        self.remove_action::<M>(Some(scope.into()), HandlerId::of(handler))
    }

    /// Removes a global zero-argument action handler of `M`.
    pub fn unsubscribe_unit<M, F>(&self, handler: &Arc<F>) -> bool
    where
        M: Message,
        F: Fn() + ?Sized,
    {
        self.remove_action::<M>(None, HandlerId::of(handler))
    }

    /// Removes a zero-argument action handler of `M` registered under `scope`.
    pub fn unsubscribe_unit_in<M, F>(&self, scope: impl Into<ScopeId>, handler: &Arc<F>) -> bool
    where
        M: Message,
        F: Fn() + ?Sized,
    {
        self.remove_action::<M>(Some(scope.into()), HandlerId::of(handler))
    }

    // ---------------------------
    // Functions
    // ---------------------------

    /// Registers a global function handler for `M` producing `R`.
    pub fn subscribe_fn<M, R, F>(&self, handler: Arc<F>, order: i32) -> bool
    where
        M: Message,
        R: 'static,
        F: Fn(&mut M) -> R + Send + Sync + ?Sized + 'static,
    {
        let id = HandlerId::of(&handler);
        self.add_function::<M>(None, id, subjects::function::<M, R, F>(handler), order)
    }

    /// Registers a function handler for `M` under `scope`.
    pub fn subscribe_fn_in<M, R, F>(
        &self,
        scope: impl Into<ScopeId>,
        handler: Arc<F>,
        order: i32,
    ) -> bool
    where
        M: Message,
        R: 'static,
        F: Fn(&mut M) -> R + Send + Sync + ?Sized + 'static,
    {
        let id = HandlerId::of(&handler);
        let invoker = subjects::function::<M, R, F>(handler);
        self.add_function::<M>(Some(scope.into()), id, invoker, order)
    }

    /// Registers a global zero-argument function handler for `M`.
    pub fn subscribe_fn_unit<M, R, F>(&self, handler: Arc<F>, order: i32) -> bool
    where
        M: Message,
        R: 'static,
        F: Fn() -> R + Send + Sync + ?Sized + 'static,
    {
        let id = HandlerId::of(&handler);
        self.add_function::<M>(None, id, subjects::unit_function::<M, R, F>(handler), order)
    }

    /// Registers a zero-argument function handler for `M` under `scope`.
    pub fn subscribe_fn_unit_in<M, R, F>(
        &self,
        scope: impl Into<ScopeId>,
        handler: Arc<F>,
        order: i32,
    ) -> bool
    where
        M: Message,
        R: 'static,
        F: Fn() -> R + Send + Sync + ?Sized + 'static,
    {
        let id = HandlerId::of(&handler);
        let invoker = subjects::unit_function::<M, R, F>(handler);
        self.add_function::<M>(Some(scope.into()), id, invoker, order)
    }

    /// Removes a global function handler. Returns `false` if it was not registered.
    pub fn unsubscribe_fn<M, R, F>(&self, handler: &Arc<F>) -> bool
    where
        M: Message,
        F: Fn(&mut M) -> R + ?Sized,
    {
        self.remove_function::<M>(None, HandlerId::of(handler))
    }

    /// Removes a function handler registered under `scope`.
    pub fn unsubscribe_fn_in<M, R, F>(&self, scope: impl Into<ScopeId>, handler: &Arc<F>) -> bool
    where
        M: Message,
        F: Fn(&mut M) -> R + ?Sized,
    {
        self.remove_function::<M>(Some(scope.into()), HandlerId::of(handler))
    }

    /// Removes a global zero-argument function handler of `M`.
    pub fn unsubscribe_fn_unit<M, R, F>(&self, handler: &Arc<F>) -> bool
    where
        M: Message,
        F: Fn() -> R + ?Sized,
    {
        self.remove_function::<M>(None, HandlerId::of(handler))
    }

    /// Removes a zero-argument function handler of `M` registered under `scope`.
    pub fn unsubscribe_fn_unit_in<M, R, F>(
        &self,
        scope: impl Into<ScopeId>,
        handler: &Arc<F>,
    ) -> bool
    where
        M: Message,
        F: Fn() -> R + ?Sized,
    {
        self.remove_function::<M>(Some(scope.into()), HandlerId::of(handler))
    }

    /// Removes every subscription with the given id, action or function.
    ///
    /// Useful when only the id was kept, e.g. for zero-argument handlers whose
    /// message type is not otherwise at hand. Returns `false` if nothing matched.
    ///
    /// ## Example
    /// ```rust
    /// use std::sync::Arc;
    /// use subjectbus::{Bus, HandlerId, Message, SubjectKey, SubscriptionId};
    ///
    /// struct Tick;
    /// impl Message for Tick {}
    ///
    /// let bus = Bus::new();
    /// let handler = Arc::new(|| {});
    /// bus.subscribe_unit_in::<Tick, _>("p1", handler.clone(), 0);
    ///
    /// let id = SubscriptionId::new(
    ///     SubjectKey::of::<Tick>(Some("p1".into())),
    ///     HandlerId::of(&handler),
    /// );
    /// assert!(bus.unsubscribe_id(&id));
    /// assert!(!bus.unsubscribe_id(&id));
    /// ```
    pub fn unsubscribe_id(&self, id: &SubscriptionId) -> bool {
        let action = self.inner.actions.unsubscribe(id);
        let function = self.inner.functions.unsubscribe(id);
        action || function
    }

    /// Returns the number of action handlers on `(M, scope)`.
    pub fn action_count<M: Message>(&self, scope: Option<ScopeId>) -> usize {
        self.inner.actions.len(&SubjectKey::of::<M>(scope))
    }

    /// Returns the number of function handlers on `(M, scope)`.
    pub fn function_count<M: Message>(&self, scope: Option<ScopeId>) -> usize {
        self.inner.functions.len(&SubjectKey::of::<M>(scope))
    }

    // ---------------------------
    // Publishing
    // ---------------------------

    /// Publishes `message` to global action handlers.
    ///
    /// No subscribers is not an error: the returned [`Delivery`] is empty.
    pub fn publish<M: Message>(&self, message: &mut M) -> Result<Delivery, BusError> {
        self.dispatch(None, message, PublishMode::Broadcast)
    }

    /// Publishes `message` to the action handlers of `scope`, then (in
    /// [`PublishMode::Broadcast`]) to the global ones.
    pub fn publish_in<M: Message>(
        &self,
        scope: impl Into<ScopeId>,
        message: &mut M,
        mode: PublishMode,
    ) -> Result<Delivery, BusError> {
        self.dispatch(Some(scope.into()), message, mode)
    }

    /// Publishes `message` to the action handlers of `scope` only.
    pub fn publish_to<M: Message>(
        &self,
        scope: impl Into<ScopeId>,
        message: &mut M,
    ) -> Result<Delivery, BusError> {
        self.dispatch(Some(scope.into()), message, PublishMode::Narrowcast)
    }

    /// Publishes `message` to global function handlers and returns their results
    /// in invocation order.
    pub fn collect<M: Message, R: 'static>(&self, message: &mut M) -> Result<Vec<R>, BusError> {
        self.gather(None, message, PublishMode::Broadcast)
    }

    /// Scoped variant of [`Bus::collect`]; global results follow scoped ones.
    pub fn collect_in<M: Message, R: 'static>(
        &self,
        scope: impl Into<ScopeId>,
        message: &mut M,
        mode: PublishMode,
    ) -> Result<Vec<R>, BusError> {
        self.gather(Some(scope.into()), message, mode)
    }

    /// Narrowcast variant of [`Bus::collect`].
    pub fn collect_to<M: Message, R: 'static>(
        &self,
        scope: impl Into<ScopeId>,
        message: &mut M,
    ) -> Result<Vec<R>, BusError> {
        self.gather(Some(scope.into()), message, PublishMode::Narrowcast)
    }

    /// Publishes `request` to global action handlers and returns its final response.
    pub fn request<Q: Request>(&self, mut request: Q) -> Result<Q::Response, BusError> {
        self.dispatch(None, &mut request, PublishMode::Broadcast)?;
        Ok(request.into_response())
    }

    /// Scoped variant of [`Bus::request`].
    pub fn request_in<Q: Request>(
        &self,
        scope: impl Into<ScopeId>,
        mut request: Q,
        mode: PublishMode,
    ) -> Result<Q::Response, BusError> {
        self.dispatch(Some(scope.into()), &mut request, mode)?;
        Ok(request.into_response())
    }

    /// Narrowcast variant of [`Bus::request`].
    pub fn request_to<Q: Request>(
        &self,
        scope: impl Into<ScopeId>,
        mut request: Q,
    ) -> Result<Q::Response, BusError> {
        self.dispatch(Some(scope.into()), &mut request, PublishMode::Narrowcast)?;
        Ok(request.into_response())
    }

    /// Collects global function results for `message` and folds them.
    ///
    /// Fails with [`BusError::EmptyAggregate`] if no handler produced a value.
    pub fn aggregate<A: Aggregate>(&self, message: &mut A) -> Result<A::Output, BusError> {
        self.reduce(None, message, PublishMode::Broadcast)
    }

    /// Scoped variant of [`Bus::aggregate`].
    pub fn aggregate_in<A: Aggregate>(
        &self,
        scope: impl Into<ScopeId>,
        message: &mut A,
        mode: PublishMode,
    ) -> Result<A::Output, BusError> {
        self.reduce(Some(scope.into()), message, mode)
    }

    /// Narrowcast variant of [`Bus::aggregate`].
    pub fn aggregate_to<A: Aggregate>(
        &self,
        scope: impl Into<ScopeId>,
        message: &mut A,
    ) -> Result<A::Output, BusError> {
        self.reduce(Some(scope.into()), message, PublishMode::Narrowcast)
    }

    // ---------------------------
    // Helpers
    // ---------------------------

    fn add_action<M: Message>(
        &self,
        scope: Option<ScopeId>,
        handler: HandlerId,
        invoker: ActionInvoker,
        order: i32,
    ) -> bool {
        let id = SubscriptionId::new(SubjectKey::of::<M>(scope), handler);
        self.inner.actions.subscribe(Subscription::new(id, invoker, order))
    }

    fn remove_action<M: Message>(&self, scope: Option<ScopeId>, handler: HandlerId) -> bool {
        let id = SubscriptionId::new(SubjectKey::of::<M>(scope), handler);
        self.inner.actions.unsubscribe(&id)
    }

    fn add_function<M: Message>(
        &self,
        scope: Option<ScopeId>,
        handler: HandlerId,
        invoker: FunctionInvoker,
        order: i32,
    ) -> bool {
        let id = SubscriptionId::new(SubjectKey::of::<M>(scope), handler);
        self.inner.functions.subscribe(Subscription::new(id, invoker, order))
    }

    fn remove_function<M: Message>(&self, scope: Option<ScopeId>, handler: HandlerId) -> bool {
        let id = SubscriptionId::new(SubjectKey::of::<M>(scope), handler);
        self.inner.functions.unsubscribe(&id)
    }

    fn dispatch<M: Message>(
        &self,
        scope: Option<ScopeId>,
        message: &mut M,
        mode: PublishMode,
    ) -> Result<Delivery, BusError> {
        let mut delivery = Delivery::default();
        dispatch::publish(
            &self.inner.actions,
            self.inner.cfg.fallback,
            scope.as_ref(),
            message,
            mode,
            &mut delivery,
        )?;
        Ok(delivery)
    }

    fn gather<M: Message, R: 'static>(
        &self,
        scope: Option<ScopeId>,
        message: &mut M,
        mode: PublishMode,
    ) -> Result<Vec<R>, BusError> {
        let mut out = Vec::new();
        dispatch::collect(
            &self.inner.functions,
            self.inner.cfg.fallback,
            scope.as_ref(),
            message,
            mode,
            &mut out,
        )?;
        Ok(out)
    }

    fn reduce<A: Aggregate>(
        &self,
        scope: Option<ScopeId>,
        message: &mut A,
        mode: PublishMode,
    ) -> Result<A::Output, BusError> {
        let subject = SubjectKey::of::<A>(scope.clone());
        let results = self.gather::<A, A::Output>(scope, message, mode)?;
        fold(message, &subject, results)
    }
}
