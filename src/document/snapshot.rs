//! Immutable, shareable view of a document at one version.

use std::sync::Arc;

use smol_str::SmolStr;

use super::delimiter::LineDelimiter;
use super::line_index::{LineIndex, LineRegion};
use super::text_utils::{byte_offset, word_boundaries_at_caret};
use crate::base::{Position, Range};
use crate::error::LineIndexError;

/// A read-only document: text plus its line index.
///
/// Cloning is cheap; text and index are shared through `Arc`. All offsets
/// count characters (Unicode scalar values).
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    uri: SmolStr,
    language_id: SmolStr,
    version: i32,
    text: Arc<String>,
    lines: Arc<LineIndex>,
    /// Fast path flag: character and byte offsets coincide
    is_ascii: bool,
}

impl DocumentSnapshot {
    /// Snapshot of standalone text, without uri or language.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_identity("", "", 0, text)
    }

    pub fn with_identity(
        uri: impl Into<SmolStr>,
        language_id: impl Into<SmolStr>,
        version: i32,
        text: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let lines = LineIndex::from_text(&text);
        let is_ascii = text.is_ascii();
        Self::from_parts(
            uri.into(),
            language_id.into(),
            version,
            Arc::new(text),
            Arc::new(lines),
            is_ascii,
        )
    }

    pub(crate) fn from_parts(
        uri: SmolStr,
        language_id: SmolStr,
        version: i32,
        text: Arc<String>,
        lines: Arc<LineIndex>,
        is_ascii: bool,
    ) -> Self {
        Self {
            uri,
            language_id,
            version,
            text,
            lines,
            is_ascii,
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.line_count()
    }

    /// Offset of a position: line start plus `character`.
    ///
    /// Fails on a line that does not exist. The character is not checked
    /// against the line length; use [`validate_position`](Self::validate_position)
    /// first when the position comes from an untrusted source.
    pub fn offset_at(&self, position: Position) -> Result<usize, LineIndexError> {
        offset_of(&self.lines, position)
    }

    /// Whether `position` names a character of the document.
    pub fn position_in_bounds(&self, position: Position) -> bool {
        self.offset_at(position).is_ok_and(|offset| offset < self.len())
    }

    pub fn char_at_position(&self, position: Position) -> Result<char, LineIndexError> {
        self.char_at(self.offset_at(position)?)
    }

    pub fn position_at(&self, offset: usize) -> Result<Position, LineIndexError> {
        let line = self.lines.line_of_offset(offset)?;
        let start = self.lines.line_offset(line)?;
        Ok(Position::new(line, offset - start))
    }

    /// Range covering `offset..offset + length`; the end is clamped to the
    /// document length.
    pub fn range_of(&self, offset: usize, length: usize) -> Result<Range, LineIndexError> {
        let end = offset.saturating_add(length).min(self.len());
        Ok(Range::new(self.position_at(offset)?, self.position_at(end)?))
    }

    /// Clamp a position to the nearest legal one: the line to the last line,
    /// the character to the end of that line (before its delimiter).
    pub fn validate_position(&self, position: Position) -> Position {
        let line = position.line.min(self.line_count() - 1);
        let length = self
            .lines
            .line_information(line)
            .map(|region| region.length)
            .unwrap_or(0);
        Position::new(line, position.character.min(length))
    }

    pub fn char_at(&self, offset: usize) -> Result<char, LineIndexError> {
        let out_of_bounds = LineIndexError::OffsetOutOfBounds {
            offset,
            length: self.len(),
        };
        if self.is_ascii {
            return self
                .text
                .as_bytes()
                .get(offset)
                .map(|b| char::from(*b))
                .ok_or(out_of_bounds);
        }
        self.text.chars().nth(offset).ok_or(out_of_bounds)
    }

    /// Text of `offset..offset + length`.
    pub fn text_in(&self, offset: usize, length: usize) -> Result<&str, LineIndexError> {
        let out_of_bounds = |offset| LineIndexError::OffsetOutOfBounds {
            offset,
            length: self.len(),
        };
        let end = offset
            .checked_add(length)
            .ok_or(out_of_bounds(usize::MAX))?;
        let start_byte = byte_offset(&self.text, offset, self.is_ascii).ok_or(out_of_bounds(offset))?;
        let end_byte = byte_offset(&self.text, end, self.is_ascii).ok_or(out_of_bounds(end))?;
        Ok(&self.text[start_byte..end_byte])
    }

    /// Content of `line` without its delimiter.
    pub fn line_text(&self, line: usize) -> Result<&str, LineIndexError> {
        let region = self.lines.line_information(line)?;
        self.text_in(region.offset, region.length)
    }

    pub fn line_information(&self, line: usize) -> Result<LineRegion, LineIndexError> {
        self.lines.line_information(line)
    }

    pub fn line_information_of_offset(&self, offset: usize) -> Result<LineRegion, LineIndexError> {
        self.lines.line_information_of_offset(offset)
    }

    /// The first delimiter used in the document, `\n` when there is none.
    pub fn default_line_delimiter(&self) -> LineDelimiter {
        self.lines
            .line_delimiter(0)
            .ok()
            .flatten()
            .unwrap_or(LineDelimiter::Lf)
    }

    /// The identifier under (or right before) the caret, with its range.
    pub fn word_at(&self, position: Position) -> Option<(Range, &str)> {
        let line_text = self.line_text(position.line).ok()?;
        let (start, end) = word_boundaries_at_caret(line_text, position.character)?;
        let region = self.lines.line_information(position.line).ok()?;
        let word = self.text_in(region.offset + start, end - start).ok()?;
        let range = Range::from_coords(position.line, start, position.line, end);
        Some((range, word))
    }
}

/// Line start plus `character`, failing instead of wrapping on overflow.
pub(crate) fn offset_of(lines: &LineIndex, position: Position) -> Result<usize, LineIndexError> {
    let region = lines.line_information(position.line)?;
    region
        .offset
        .checked_add(position.character)
        .ok_or(LineIndexError::OffsetOutOfBounds {
            offset: usize::MAX,
            length: lines.len(),
        })
}
