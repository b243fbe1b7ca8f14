//! Line delimiters and delimiter scanning.

/// A legal line delimiter. `\r\n` counts as a single delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineDelimiter {
    Cr,
    Lf,
    CrLf,
}

impl LineDelimiter {
    pub const ALL: [LineDelimiter; 3] = [Self::Cr, Self::Lf, Self::CrLf];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cr => "\r",
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        match self {
            Self::Cr | Self::Lf => 1,
            Self::CrLf => 2,
        }
    }
}

/// Where a delimiter was found, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimiterMatch {
    /// Char index of the first delimiter character.
    pub index: usize,
    pub delimiter: LineDelimiter,
}

impl DelimiterMatch {
    /// Char index right after the delimiter.
    pub fn end(&self) -> usize {
        self.index + self.delimiter.len()
    }
}

/// Finds delimiters in a character slice, starting at a char index.
pub fn next_delimiter(chars: &[char], from: usize) -> Option<DelimiterMatch> {
    let mut i = from;
    while i < chars.len() {
        match chars[i] {
            '\r' => {
                let delimiter = if chars.get(i + 1) == Some(&'\n') {
                    LineDelimiter::CrLf
                } else {
                    LineDelimiter::Cr
                };
                return Some(DelimiterMatch {
                    index: i,
                    delimiter,
                });
            }
            '\n' => {
                return Some(DelimiterMatch {
                    index: i,
                    delimiter: LineDelimiter::Lf,
                });
            }
            _ => i += 1,
        }
    }
    None
}

/// Splits text into `(length_with_delimiter, delimiter)` lines. The last entry
/// is always the incomplete line with no delimiter (possibly empty).
pub fn split_lines(text: &str) -> Vec<(usize, Option<LineDelimiter>)> {
    let chars: Vec<char> = text.chars().collect();
    let mut lines = Vec::new();
    let mut consumed = 0;
    while let Some(found) = next_delimiter(&chars, consumed) {
        lines.push((found.end() - consumed, Some(found.delimiter)));
        consumed = found.end();
    }
    lines.push((chars.len() - consumed, None));
    lines
}
