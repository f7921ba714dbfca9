//! # Subscription registry - subject → ordered handler list.
//!
//! One [`Registry`] exists per handler family (actions, functions). It maps each
//! [`SubjectKey`] to a list of [`Subscription`]s kept sorted by `order`.
//!
//! ## Architecture
//! ```text
//! subscribe(rec)   ──► write lock ──► entry(subject).or_default()
//!                                      ├─ same SubscriptionId present → no-op
//!                                      └─ push + stable sort by order (copy-on-write)
//! unsubscribe(id)  ──► write lock ──► remove first match (if any)
//! snapshot(subject) ─► read lock  ──► Arc clone of the current list
//! ```
//!
//! ## Rules
//! - Lists are non-decreasing by `order`; equal orders keep registration order.
//! - A subject never holds two records with the same [`SubscriptionId`].
//! - Entries are created lazily and never removed (they may become empty).
//! - Locks are never held while a handler runs: dispatch iterates a snapshot, so
//!   handlers may subscribe/unsubscribe/publish re-entrantly. Changes made during a
//!   dispatch are visible to the next lookup of that subject.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::subjects::key::SubjectKey;
use crate::subjects::subscription::{Subscription, SubscriptionId};

/// Snapshot of one subject's handler list.
pub(crate) type Snapshot<I> = Arc<Vec<Subscription<I>>>;

/// Subject → ordered subscriptions, for one handler family.
pub(crate) struct Registry<I> {
    subjects: RwLock<HashMap<SubjectKey, Snapshot<I>>>,
}

impl<I: Clone> Registry<I> {
    /// Creates an empty registry with room for `capacity` subjects.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            subjects: RwLock::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Registers a subscription.
    ///
    /// Returns `false` if a record with the same id already exists (idempotent).
    pub(crate) fn subscribe(&self, record: Subscription<I>) -> bool {
        let mut subjects = self.subjects.write();
        let list = subjects.entry(record.id.subject.clone()).or_default();

        if list.iter().any(|existing| existing == &record) {
            debug!(subject = %record.id.subject, "duplicate subscription ignored");
            return false;
        }

        debug!(subject = %record.id.subject, order = record.order, "subscribed");
        let list = Arc::make_mut(list);
        list.push(record);
        // `sort_by_key` is stable: equal orders keep registration order.
        list.sort_by_key(|s| s.order);
        true
    }

    /// Removes the subscription with the given id.
    ///
    /// Returns `false` if the subject or the handler is unknown.
    pub(crate) fn unsubscribe(&self, id: &SubscriptionId) -> bool {
        let mut subjects = self.subjects.write();
        let Some(list) = subjects.get_mut(&id.subject) else {
            return false;
        };
        let Some(pos) = list.iter().position(|s| &s.id == id) else {
            return false;
        };

        Arc::make_mut(list).remove(pos);
        debug!(subject = %id.subject, "unsubscribed");
        true
    }

    /// Returns the current list for `subject`, `None` if it was never subscribed.
    pub(crate) fn snapshot(&self, subject: &SubjectKey) -> Option<Snapshot<I>> {
        self.subjects.read().get(subject).cloned()
    }

    /// Returns the number of handlers registered for `subject`.
    pub(crate) fn len(&self, subject: &SubjectKey) -> usize {
        self.subjects.read().get(subject).map_or(0, |list| list.len())
    }

    /// Returns the number of subjects that have an entry (possibly empty).
    pub(crate) fn subject_count(&self) -> usize {
        self.subjects.read().len()
    }
}
