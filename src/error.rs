//! Error types used by the bus.
//!
//! [`BusError`] covers the two failures a publish can surface:
//!
//! - [`BusError::EmptyAggregate`] an aggregate was published but no function
//!   handler produced a value, so there is nothing to fold.
//! - [`BusError::TypeMismatch`] a type-erased invocation received a payload or
//!   produced a result of an unexpected type.
//!
//! Missing subscribers, duplicate subscriptions and unknown unsubscribes are
//! **not** errors and never reach this type.

use thiserror::Error;

/// # Errors produced by bus dispatch.
///
/// Errors are local to the publish call that triggered them. Remaining handlers
/// of that publish are not invoked once an error is returned.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// An aggregate publish produced zero results; there is no seed to fold from.
    #[error("aggregate on {subject} produced no results to fold")]
    EmptyAggregate {
        /// Subject the aggregate was published on.
        subject: String,
    },

    /// A handler was invoked with, or returned, a value of the wrong type.
    ///
    /// Indicates a function handler registered with a different return type than
    /// the one requested by the publisher, or a broken registry entry.
    #[error("type mismatch on {subject}: expected {expected}")]
    TypeMismatch {
        /// Subject being dispatched.
        subject: String,
        /// Name of the type the dispatcher expected.
        expected: &'static str,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use subjectbus::BusError;
    ///
    /// let err = BusError::EmptyAggregate { subject: "Total".into() };
    /// assert_eq!(err.as_label(), "bus_empty_aggregate");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::EmptyAggregate { .. } => "bus_empty_aggregate",
            BusError::TypeMismatch { .. } => "bus_type_mismatch",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BusError::EmptyAggregate { subject } => {
                format!("empty aggregate: subject={subject}")
            }
            BusError::TypeMismatch { subject, expected } => {
                format!("type mismatch: subject={subject} expected={expected}")
            }
        }
    }
}
