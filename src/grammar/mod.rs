//! Grammar model consumed by the completion engine.
//!
//! The automaton, the vocabulary and the token stream are produced by a
//! parser generator outside this crate; this module only defines their shape
//! plus a builder for assembling automata by hand and a logos-based lexer
//! adapter.

mod automaton;
mod lexer;
mod token;
mod vocabulary;

pub use automaton::{
    Automaton, AutomatonBuilder, AutomatonId, PredicateId, RuleIndex, RuleStates, State, StateId,
    StateKind, Transition, TransitionKind,
};
pub use lexer::tokenize;
pub use token::{EOF, EPSILON, INVALID_TOKEN_TYPE, MIN_USER_TOKEN_TYPE, Token, TokenType};
pub use vocabulary::Vocabulary;
