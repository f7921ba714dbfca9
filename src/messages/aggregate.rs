//! # Aggregate: fold many handler results into one.
//!
//! An [`Aggregate`] is a [`Message`] paired with a binary reduce function. The bus
//! dispatches it to **function** handlers returning [`Aggregate::Output`], then
//! left-folds the results in invocation order. The first result is the seed.
//!
//! ```text
//! results: [r1, r2, r3, ...]  ──►  reduce(reduce(r1, r2), r3) ...
//! results: []                 ──►  BusError::EmptyAggregate
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use subjectbus::{Aggregate, Bus, Message};
//!
//! struct TotalArmor;
//!
//! impl Message for TotalArmor {}
//!
//! impl Aggregate for TotalArmor {
//!     type Output = u32;
//!
//!     fn aggregate(&self, acc: u32, next: u32) -> u32 {
//!         acc + next
//!     }
//! }
//!
//! let bus = Bus::new();
//! bus.subscribe_fn(Arc::new(|_: &mut TotalArmor| 3u32), 0);
//! bus.subscribe_fn(Arc::new(|_: &mut TotalArmor| 4u32), 0);
//!
//! assert_eq!(bus.aggregate(&mut TotalArmor).unwrap(), 7);
//! ```

use crate::error::BusError;
use crate::messages::message::Message;
use crate::subjects::SubjectKey;

/// A message whose function-handler results are reduced to one value.
pub trait Aggregate: Message {
    /// Result type of each handler and of the fold.
    type Output: 'static;

    /// Combines the accumulated value with the next handler result.
    fn aggregate(&self, acc: Self::Output, next: Self::Output) -> Self::Output;
}

/// Left-folds `results` through `message`'s reduce function.
///
/// Fails with [`BusError::EmptyAggregate`] when `results` is empty.
pub(crate) fn fold<A: Aggregate>(
    message: &A,
    subject: &SubjectKey,
    results: Vec<A::Output>,
) -> Result<A::Output, BusError> {
    let mut results = results.into_iter();
    let seed = results.next().ok_or_else(|| BusError::EmptyAggregate {
        subject: subject.to_string(),
    })?;
    Ok(results.fold(seed, |acc, next| message.aggregate(acc, next)))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Longest;
    impl Message for Longest {}
    impl Aggregate for Longest {
        type Output = String;

        fn aggregate(&self, acc: String, next: String) -> String {
            if next.len() > acc.len() {
                next
            } else {
                acc
            }
        }
    }

    #[test]
    fn test_fold_is_left_to_right() {
        let subject = SubjectKey::of::<Longest>(None);
        let out = fold(
            &Longest,
            &subject,
            vec!["ab".into(), "xyz".into(), "abc".into()],
        )
        .unwrap();
        // ties keep the accumulated value
        assert_eq!(out, "xyz");
    }

    #[test]
    fn test_fold_single_result_is_seed() {
        let subject = SubjectKey::of::<Longest>(None);
        let out = fold(&Longest, &subject, vec!["only".into()]).unwrap();
        assert_eq!(out, "only");
    }

    #[test]
    fn test_fold_empty_fails() {
        let subject = SubjectKey::of::<Longest>(Some("p1".into()));
        let err = fold(&Longest, &subject, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            BusError::EmptyAggregate { ref subject } if subject.ends_with("Longest@p1")
        ));
    }
}
