//! # dslkit-base
//!
//! Core library for DSL language tooling: an incremental line index for open
//! documents and a grammar-automaton code completion engine.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! completion → Follow-set cache, token window, completion engine
//!   ↓
//! grammar    → Automaton model, tokens, vocabulary, logos lexer adapter
//!   ↓
//! document   → Line delimiters, LineIndex (AVL arena), TextDocument, snapshots
//!   ↓
//! base       → Primitives (Position, Range, IntervalSet)
//! ```

// ============================================================================
// MODULES (dependency order: base → document → grammar → completion)
// ============================================================================

/// Foundation types: Position, Range, IntervalSet
pub mod base;

/// Documents: line index, mutable holder, immutable snapshots
pub mod document;

/// Grammar model: automaton, tokens, vocabulary
pub mod grammar;

/// Code completion over a grammar automaton
pub mod completion;

/// Error types shared across modules
pub mod error;

// ============================================================================
// RE-EXPORTS
// ============================================================================

// Foundation types
pub use base::{IntervalSet, Position, Range};

// Documents
pub use document::{ContentChange, DocumentSnapshot, LineDelimiter, LineIndex, TextDocument};

// Grammar
pub use grammar::{Automaton, AutomatonBuilder, AutomatonId, Token, TokenType, Vocabulary};

// Completion
pub use completion::{CandidateSet, CompletionConfig, CompletionEngine, FollowSetCache, TokenWindow};

// Errors
pub use error::{DocumentError, GrammarError, InvariantViolation, LineIndexError, PredicateError};
