//! Character-level helpers shared by the document model.

/// Check if a character is considered part of a word (identifier).
///
/// Uses Unicode Standard Annex #31 rules for identifier characters, which is
/// what most DSL lexers accept for names.
#[inline]
pub fn is_word_character(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}

/// Find the boundaries of a word at the given character index.
///
/// Returns `Some((start, end))` where `start` is the index of the first word
/// character and `end` is the index after the last one, or `None` if the
/// character at `position` is not a word character.
pub fn find_word_boundaries(chars: &[char], position: usize) -> Option<(usize, usize)> {
    if !chars.get(position).copied().is_some_and(is_word_character) {
        return None;
    }

    let mut start = position;
    while start > 0 && is_word_character(chars[start - 1]) {
        start -= 1;
    }

    let mut end = position;
    while end < chars.len() && is_word_character(chars[end]) {
        end += 1;
    }

    Some((start, end))
}

/// Word boundaries for a caret in a line of text.
///
/// A caret sits *between* characters, so one placed right after the last
/// character of a word still selects that word.
pub fn word_boundaries_at_caret(line: &str, caret: usize) -> Option<(usize, usize)> {
    let chars: Vec<char> = line.chars().collect();
    find_word_boundaries(&chars, caret).or_else(|| {
        caret
            .checked_sub(1)
            .and_then(|before| find_word_boundaries(&chars, before))
    })
}

/// Convert a character index into a byte index of `text`.
///
/// `char_index == char count` maps to `text.len()`.
pub(crate) fn byte_offset(text: &str, char_index: usize, is_ascii: bool) -> Option<usize> {
    if is_ascii {
        return (char_index <= text.len()).then_some(char_index);
    }
    text.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .nth(char_index)
}
