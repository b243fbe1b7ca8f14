//! Semantic predicate evaluation.

use crate::error::PredicateError;
use crate::grammar::PredicateId;

/// Decides whether a predicate transition may be taken.
///
/// An `Err` prunes the guarded path the same way `Ok(false)` does; the engine
/// logs it and carries on.
pub trait PredicateEvaluator {
    fn evaluate(&self, predicate: PredicateId) -> Result<bool, PredicateError>;
}

impl<F> PredicateEvaluator for F
where
    F: Fn(PredicateId) -> Result<bool, PredicateError>,
{
    fn evaluate(&self, predicate: PredicateId) -> Result<bool, PredicateError> {
        self(predicate)
    }
}

/// Treats every predicate as satisfied.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysTrue;

impl PredicateEvaluator for AlwaysTrue {
    fn evaluate(&self, _predicate: PredicateId) -> Result<bool, PredicateError> {
        Ok(true)
    }
}
