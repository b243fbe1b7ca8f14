/// Position tracking for documents and tokens
///
/// Positions are 0-indexed for LSP compatibility. `character` counts Unicode
/// scalar values from the start of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    pub line: usize,
    pub character: usize,
}

/// A range between two positions (end exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Position {
    pub fn new(line: usize, character: usize) -> Self {
        Self { line, character }
    }
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Create a range from line/character coordinates
    pub fn from_coords(
        start_line: usize,
        start_character: usize,
        end_line: usize,
        end_character: usize,
    ) -> Self {
        Self {
            start: Position::new(start_line, start_character),
            end: Position::new(end_line, end_character),
        }
    }

    /// An empty range located at `position`
    pub fn empty(position: Position) -> Self {
        Self::new(position, position)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if a position falls within this range (both ends inclusive,
    /// so a caret sitting right after the last character still matches)
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }
}
