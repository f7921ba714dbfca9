//! Message capabilities.
//!
//! Message types opt into bus features by implementing traits:
//!
//! ## Contents
//! - [`Message`] required for every published type; optional cancellation
//! - [`Request`] response slot for request/response publishes ([`Reply`] helper)
//! - [`Aggregate`] reduce function for aggregate publishes
//! - [`PublishMode`] broadcast vs narrowcast delivery for scoped publishes

mod aggregate;
mod message;
mod request;

pub(crate) use aggregate::fold;
pub use aggregate::Aggregate;
pub use message::{Message, PublishMode};
pub use request::{Reply, Request};
