//! Positioned tokens as consumed by the completion engine.

use smol_str::SmolStr;

use crate::base::Position;

/// Token type as assigned by the grammar. User types start at
/// [`MIN_USER_TOKEN_TYPE`]; negative values are reserved.
pub type TokenType = i32;

/// End of input.
pub const EOF: TokenType = -1;

/// "Nothing consumed": marks follow-set entries that can reach the rule end.
pub const EPSILON: TokenType = -2;

/// Assigned to input the lexer could not classify.
pub const INVALID_TOKEN_TYPE: TokenType = 0;

pub const MIN_USER_TOKEN_TYPE: TokenType = 1;

/// A token with its type, text, and position (character offsets, 0-based
/// line and column).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    pub token_type: TokenType,
    pub text: SmolStr,
    pub start: usize,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(
        token_type: TokenType,
        text: impl Into<SmolStr>,
        start: usize,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            token_type,
            text: text.into(),
            start,
            line,
            column,
        }
    }

    pub fn eof(start: usize, line: usize, column: usize) -> Self {
        Self::new(EOF, "", start, line, column)
    }

    pub fn is_eof(&self) -> bool {
        self.token_type == EOF
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// Character offset right after the token.
    pub fn end(&self) -> usize {
        self.start + self.text.chars().count()
    }
}
