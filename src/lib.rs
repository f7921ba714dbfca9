//! # subjectbus
//!
//! **subjectbus** is an in-process publish/subscribe bus for Rust.
//!
//! Handlers subscribe to a *subject*: a message type, optionally narrowed by a
//! scope id (a player, an entity, a connection). Publishers dispatch a message by
//! value of its type; handlers run synchronously, in priority order, on the
//! publishing thread.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   subscribe*(handler, order)                 publish*/collect*/request*/aggregate*
//!            │                                                  │
//!            ▼                                                  ▼
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │  Bus (cheap to clone, shared state)                                       │
//! │  - Config (FallbackPolicy, subject capacity)                              │
//! │  - Registry<actions>   : SubjectKey ─► [Subscription sorted by order]     │
//! │  - Registry<functions> : SubjectKey ─► [Subscription sorted by order]     │
//! └──────────────────────────────┬────────────────────────────────────────────┘
//!                                ▼
//!                         core::dispatch
//!              ┌─────────────────┴──────────────────┐
//!              ▼                                    ▼
//!   scoped subject (M, scope)        global subject (M, None)
//!   handlers in order                (Broadcast only, after scoped)
//! ```
//!
//! ### Dispatch
//! ```text
//! publish_in(scope, &mut msg, mode)
//!   ├─► snapshot (M, scope)            (no lock held while handlers run)
//!   ├─► for each handler (order asc):
//!   │       handler(&mut msg)
//!   │       msg.is_cancelled() ─► stop, skip global pass
//!   └─► mode == Broadcast ─► same loop on (M, None)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                     |
//! |-------------------|---------------------------------------------------------------|----------------------------------------|
//! | **Messages**      | Any `'static` type opting in; optional cancellation flag.     | [`Message`], [`PublishMode`]           |
//! | **Subjects**      | Type + optional scope id; dedup by handler identity.          | [`SubjectKey`], [`ScopeId`]            |
//! | **Request**       | One-shot request/response through a response slot.            | [`Request`], [`Reply`]                 |
//! | **Aggregate**     | Fold function-handler results into one value.                 | [`Aggregate`]                          |
//! | **Bus**           | Registration, publishing and delivery reports.                | [`Bus`], [`Delivery`]                  |
//! | **Errors**        | Typed errors for empty aggregates and payload mismatches.     | [`BusError`]                           |
//! | **Configuration** | Scoped-broadcast fallback and registry sizing.                | [`Config`], [`FallbackPolicy`]         |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use subjectbus::{Bus, Message, PublishMode};
//!
//! struct Ping;
//! impl Message for Ping {}
//!
//! struct Score;
//! impl Message for Score {}
//!
//! let bus = Bus::new();
//!
//! // nobody listens: not an error
//! assert!(bus.publish(&mut Ping).unwrap().is_empty());
//!
//! let points = Arc::new(AtomicU32::new(0));
//! let p = points.clone();
//! bus.subscribe_in("player1", Arc::new(move |_: &mut Score| {
//!     p.fetch_add(1, Ordering::SeqCst);
//! }), 0);
//! let p = points.clone();
//! bus.subscribe(Arc::new(move |_: &mut Score| {
//!     p.fetch_add(10, Ordering::SeqCst);
//! }), 1);
//!
//! bus.publish_in("player1", &mut Score, PublishMode::Broadcast).unwrap();
//! assert_eq!(points.load(Ordering::SeqCst), 11);
//! ```
mod core;
mod error;
mod messages;
mod subjects;

// ---- Public re-exports ----

pub use self::core::{Bus, Config, Delivery, FallbackPolicy};
pub use error::BusError;
pub use messages::{Aggregate, Message, PublishMode, Reply, Request};
pub use subjects::{HandlerId, ScopeId, ScopeKey, SubjectKey, SubscriptionId};
