//! # Request/response over the bus.
//!
//! A [`Request`] is a [`Message`] that carries its own response slot. The bus
//! dispatches it to **action** handlers like any other message; handlers answer by
//! writing the slot, and the publisher gets the final slot value back.
//!
//! ## Rules
//! - Exactly one logical answer is expected.
//! - If several handlers respond, the last write in dispatch order wins; the bus
//!   does not detect or prevent this.
//! - If nobody responds, the publisher gets the slot's initial value.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use subjectbus::{Bus, Message, Reply, Request};
//!
//! struct HighScore {
//!     reply: Reply<u32>,
//! }
//!
//! impl Message for HighScore {}
//!
//! impl Request for HighScore {
//!     type Response = u32;
//!
//!     fn respond(&mut self, value: u32) {
//!         self.reply.set(value);
//!     }
//!     fn response(&self) -> &u32 {
//!         self.reply.get()
//!     }
//!     fn into_response(self) -> u32 {
//!         self.reply.into_inner()
//!     }
//! }
//!
//! let bus = Bus::new();
//! bus.subscribe(Arc::new(|q: &mut HighScore| q.respond(42)), 0);
//!
//! let best = bus.request(HighScore { reply: Reply::new(0) }).unwrap();
//! assert_eq!(best, 42);
//! ```

use crate::messages::message::Message;

/// A message carrying a single mutable response slot.
pub trait Request: Message {
    /// Type of the answer.
    type Response;

    /// Writes the response slot. Last write wins.
    fn respond(&mut self, value: Self::Response);

    /// Returns the current slot value.
    fn response(&self) -> &Self::Response;

    /// Consumes the request and returns the slot value.
    fn into_response(self) -> Self::Response
    where
        Self: Sized;
}

/// Response slot to embed in request types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply<T> {
    value: T,
}

impl<T> Reply<T> {
    /// Creates a slot holding `initial` until a handler responds.
    pub fn new(initial: T) -> Self {
        Self { value: initial }
    }

    /// Overwrites the slot.
    pub fn set(&mut self, value: T) {
        self.value = value;
    }

    /// Returns the current slot value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Consumes the slot and returns its value.
    pub fn into_inner(self) -> T {
        self.value
    }
}
