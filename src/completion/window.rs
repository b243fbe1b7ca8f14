//! The token slice a completion request runs on.

use crate::base::Position;
use crate::grammar::{EOF, Token, TokenType};

/// Tokens from the start of the enclosing rule up to the caret token.
///
/// The last token is the caret token: the engine suggests what could stand
/// in its place. A window always holds at least one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenWindow {
    tokens: Vec<Token>,
}

impl TokenWindow {
    /// Window over `tokens[..=caret_index]`. An out-of-range caret falls back
    /// to the last token; an empty token list becomes a lone `EOF`.
    pub fn new(mut tokens: Vec<Token>, caret_index: usize) -> Self {
        tokens.truncate(caret_index.saturating_add(1));
        if tokens.is_empty() {
            tokens.push(Token::eof(0, 0, 0));
        }
        Self { tokens }
    }

    /// Collect the window for a caret position.
    ///
    /// Starting at `start_index`, takes tokens up to and including the first
    /// one that starts at or after `caret` (or `EOF`).
    pub fn collect(tokens: &[Token], start_index: usize, caret: Position) -> Self {
        let mut window = Vec::new();

        for token in tokens.iter().skip(start_index) {
            window.push(token.clone());
            if token.is_eof()
                || token.line > caret.line
                || (token.line == caret.line && token.column >= caret.character)
            {
                break;
            }
        }

        if window.is_empty() {
            window.push(Token::eof(0, caret.line, caret.character));
        }

        tracing::trace!(
            start_index,
            len = window.len(),
            line = caret.line,
            character = caret.character,
            "token window collected"
        );
        Self { tokens: window }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Never true: a window holds at least one token.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Index of the caret token (the last one).
    pub fn caret_index(&self) -> usize {
        self.tokens.len() - 1
    }

    pub(crate) fn token_types(&self) -> Vec<TokenType> {
        self.tokens.iter().map(|t| t.token_type).collect()
    }

    /// Type of the token at `index`, `EOF` past the end.
    pub fn token_type(&self, index: usize) -> TokenType {
        self.tokens.get(index).map_or(EOF, |t| t.token_type)
    }
}
