//! # Message capability and delivery mode.
//!
//! Every type published on the bus implements [`Message`]. The trait has one
//! optional capability: cooperative cancellation. A handler that wants to stop the
//! dispatch mutates the message so that [`Message::is_cancelled`] returns `true`;
//! the dispatcher polls it after every handler.
//!
//! ## Example
//! ```rust
//! use subjectbus::Message;
//!
//! // Plain message: never cancels.
//! struct Ping;
//! impl Message for Ping {}
//!
//! // Cancellable message.
//! struct Damage {
//!     amount: u32,
//!     blocked: bool,
//! }
//!
//! impl Message for Damage {
//!     fn is_cancelled(&self) -> bool {
//!         self.blocked
//!     }
//! }
//! ```

use std::any::Any;

/// A payload that can be published on the bus.
///
/// The payload's [`TypeId`](std::any::TypeId) selects the subject, so the type
/// must be `'static`.
pub trait Message: Any {
    /// Returns `true` once a handler has cancelled this message.
    ///
    /// Checked after every handler invocation. Once it reports `true`, no further
    /// handler runs for the current publish, including the global fallback pass.
    ///
    /// Default: never cancelled.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Delivery mode for scoped publishes.
///
/// Has no effect on global publishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PublishMode {
    /// Scoped handlers first, then global handlers of the same message type.
    #[default]
    Broadcast,
    /// Scoped handlers only.
    Narrowcast,
}

impl PublishMode {
    /// Returns `true` if a scoped publish also reaches global handlers.
    #[inline]
    pub fn reaches_global(self) -> bool {
        matches!(self, PublishMode::Broadcast)
    }
}
