//! Subjects, subscriptions and the registry.
//!
//! ## Contents
//! - [`SubjectKey`], [`ScopeId`] what a handler listens on
//! - [`HandlerId`], [`SubscriptionId`] handler identity and dedup key
//! - `Subscription` one registered handler with its invoker and order (internal)
//! - `Registry` subject → ordered subscriptions, one per handler family (internal)
//!
//! ## Quick wiring
//! ```text
//! Bus::subscribe*(handler, order)
//!      └─► Subscription { SubscriptionId(subject, HandlerId), invoker, order }
//!           └─► Registry::subscribe ─► sorted list under SubjectKey
//! core::dispatch
//!      └─► Registry::snapshot(SubjectKey) ─► invoke in order
//! ```

mod key;
mod registry;
mod subscription;

pub use key::{ScopeId, ScopeKey, SubjectKey};
pub(crate) use registry::Registry;
pub(crate) use subscription::{
    action, function, unit_action, unit_function, ActionInvoker, FunctionInvoker, PayloadMismatch,
    Subscription,
};
pub use subscription::{HandlerId, SubscriptionId};
