//! # Bus configuration.
//!
//! Provides [`Config`] settings of a single [`Bus`](crate::Bus) instance.
//!
//! ## Sentinel values
//! - `subject_capacity = 0` → registries start empty and grow on demand
//!
//! ## Fallback policy
//! A scoped [`Broadcast`](crate::PublishMode::Broadcast) publish also reaches the
//! global handlers of the same message type. [`FallbackPolicy`] decides what happens
//! when the *scoped* subject has never been subscribed:
//!
//! ```text
//! publish_in("p1", msg, Broadcast), no entry for (M, "p1"):
//!   FallbackPolicy::Always               ──► global handlers of M still run
//!   FallbackPolicy::RequireScopedSubject ──► publish ends, nothing runs
//! ```
//!
//! The policy applies identically to action publishes and to value-returning
//! publishes (`collect*`, `aggregate*`, `request*`).

/// What a scoped broadcast does when its scoped subject has no entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Global handlers always run after the scoped ones (possibly none).
    #[default]
    Always,
    /// A scoped subject that was never subscribed ends the publish early,
    /// without reaching global handlers.
    ///
    /// A subject whose handlers were all unsubscribed still has an (empty)
    /// entry and therefore falls back.
    RequireScopedSubject,
}

impl FallbackPolicy {
    /// Returns `true` if a scoped broadcast with no scoped entry reaches global handlers.
    #[inline]
    pub fn covers_unknown_subject(self) -> bool {
        matches!(self, FallbackPolicy::Always)
    }
}

/// Configuration of a bus instance.
///
/// ## Field semantics
/// - `fallback`: scoped-broadcast behavior for unknown scoped subjects
/// - `subject_capacity`: initial subject capacity of each registry (`0` = grow on demand)
#[derive(Clone, Debug)]
pub struct Config {
    /// Scoped-broadcast fallback behavior.
    pub fallback: FallbackPolicy,

    /// Number of subjects each registry (actions, functions) pre-allocates.
    pub subject_capacity: usize,
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `fallback = FallbackPolicy::Always`
    /// - `subject_capacity = 0`
    fn default() -> Self {
        Self {
            fallback: FallbackPolicy::default(),
            subject_capacity: 0,
        }
    }
}
