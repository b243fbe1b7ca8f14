//! Error types for the document model and the grammar model.

use thiserror::Error;

/// Errors raised by [`LineIndex`](crate::document::LineIndex) queries and edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LineIndexError {
    /// Offset lies outside `0..=length`.
    #[error("Offset {offset} out of bounds (document length {length})")]
    OffsetOutOfBounds { offset: usize, length: usize },

    /// Line lies outside `0..line_count`.
    #[error("Line {line} out of bounds (line count {line_count})")]
    LineOutOfBounds { line: usize, line_count: usize },
}

/// A broken line tree. Indicates a defect, never expected in production.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Line index invariant violated at node {node}: {message}")]
pub struct InvariantViolation {
    /// Arena index of the offending node.
    pub node: usize,
    pub message: String,
}

impl InvariantViolation {
    pub fn new(node: usize, message: impl Into<String>) -> Self {
        Self {
            node,
            message: message.into(),
        }
    }
}

/// Errors raised by [`TextDocument`](crate::document::TextDocument).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error(transparent)]
    LineIndex(#[from] LineIndexError),

    /// A change event that is not newer than the document.
    #[error("Stale change event: current version {current}, received {received}")]
    StaleVersion { current: i32, received: i32 },

    /// A change range whose end precedes its start.
    #[error("Invalid range: end offset {end} precedes start offset {start}")]
    InvalidRange { start: usize, end: usize },
}

/// Errors raised while assembling an [`Automaton`](crate::grammar::Automaton).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    /// A transition references a state that was never added.
    #[error("Unknown state {0}")]
    UnknownState(usize),

    /// A rule transition whose target is not a rule start state.
    #[error("Rule transition from state {from} targets state {target}, which is not a rule start")]
    NotARuleStart { from: usize, target: usize },

    /// A rule index with no start/stop states.
    #[error("Unknown rule {0}")]
    UnknownRule(usize),
}

/// Failure reported by a predicate evaluator.
///
/// The completion engine never propagates it: the guarded path is pruned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Predicate {predicate} failed: {message}")]
pub struct PredicateError {
    pub predicate: u32,
    pub message: String,
}

impl PredicateError {
    pub fn new(predicate: u32, message: impl Into<String>) -> Self {
        Self {
            predicate,
            message: message.into(),
        }
    }
}
