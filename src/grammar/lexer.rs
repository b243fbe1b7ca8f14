//! Logos adapter producing positioned [`Token`]s.
//!
//! Any `#[derive(Logos)]` enum can feed the completion engine: `classify` maps
//! each lexed variant to a grammar token type (or `None` to drop it, e.g. for
//! trivia), and the adapter attaches character offsets and line/column
//! positions.

use std::iter::Peekable;

use logos::Logos;

use super::token::{INVALID_TOKEN_TYPE, Token, TokenType};
use crate::document::{LineIndex, LineInfo, Lines};

/// Tokenize `source`, ending with an `EOF` token.
///
/// Input the lexer rejects becomes a token of type [`INVALID_TOKEN_TYPE`].
pub fn tokenize<'s, T, F>(source: &'s str, classify: F) -> Vec<Token>
where
    T: Logos<'s, Source = str>,
    T::Extras: Default,
    F: Fn(&T) -> Option<TokenType>,
{
    let line_index = LineIndex::from_text(source);
    let mut positions = PositionCursor::new(&line_index);
    let mut lexer = T::lexer(source);
    let mut tokens = Vec::new();

    let mut byte_cursor = 0;
    let mut char_cursor = 0;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        char_cursor += source[byte_cursor..span.start].chars().count();
        byte_cursor = span.start;

        let token_type = match &result {
            Ok(token) => classify(token),
            Err(_) => Some(INVALID_TOKEN_TYPE),
        };

        if let Some(token_type) = token_type {
            let (line, column) = positions.locate(char_cursor);
            tokens.push(Token::new(token_type, lexer.slice(), char_cursor, line, column));
        }
    }

    char_cursor += source[byte_cursor..].chars().count();
    let (line, column) = positions.locate(char_cursor);
    tokens.push(Token::eof(char_cursor, line, column));

    tracing::trace!(tokens = tokens.len(), "tokenized");
    tokens
}

/// Resolves increasing character offsets to (line, column) by walking the
/// lines once.
struct PositionCursor<'a> {
    lines: Peekable<Lines<'a>>,
    line: usize,
    current: Option<LineInfo>,
}

impl<'a> PositionCursor<'a> {
    fn new(index: &'a LineIndex) -> Self {
        let mut lines = index.lines().peekable();
        let current = lines.next();
        Self {
            lines,
            line: 0,
            current,
        }
    }

    fn locate(&mut self, offset: usize) -> (usize, usize) {
        while let Some(next) = self.lines.peek() {
            if next.offset > offset {
                break;
            }
            self.current = self.lines.next();
            self.line += 1;
        }
        let start = self.current.map_or(0, |line| line.offset);
        (self.line, offset - start)
    }
}
