//! Grammar-driven code completion.
//!
//! ```text
//! tokens ──► TokenWindow ──► CompletionEngine ──► CandidateSet
//!                                 │    ▲
//!                                 │    │ follow sets per rule
//!                                 ▼    │
//!                  Automaton ──► FollowSetCache (shared, Arc)
//! ```
//!
//! The engine walks the grammar automaton over the tokens in front of the
//! caret and reports the token types and preferred rules that could appear
//! at the caret. Predicates are evaluated through a caller-supplied
//! [`PredicateEvaluator`].

mod candidates;
mod config;
mod engine;
mod follow_sets;
mod predicate;
mod window;

pub use candidates::CandidateSet;
pub use config::CompletionConfig;
pub use engine::CompletionEngine;
pub use follow_sets::{FollowSetCache, FollowSetWithPath, FollowSets};
pub use predicate::{AlwaysTrue, PredicateEvaluator};
pub use window::TokenWindow;
