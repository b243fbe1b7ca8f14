//! Line index behaviour seen from outside the crate.

use crate::helpers::document_helpers::*;
use dslkit::document::LineDelimiter;
use dslkit::{LineIndex, LineIndexError};
use rstest::rstest;

// =============================================================================
// CONSTRUCTION
// =============================================================================

#[test]
fn test_empty_text_has_one_line() {
    let index = LineIndex::from_text("");
    assert_eq!(index.line_count(), 1);
    assert_eq!(index.line_offset(0), Ok(0));
    assert_eq!(index.line_delimiter(0), Ok(None));
}

#[rstest]
#[case("a", 1)]
#[case("a\n", 2)]
#[case("a\r\nb", 2)]
#[case("a\r\rb", 3)]
#[case("\n\r\n\r", 4)]
#[case("a\n\rb", 3)]
fn test_line_count(#[case] text: &str, #[case] expected: usize) {
    let index = LineIndex::from_text(text);
    assert_eq!(index.line_count(), expected);
    assert_eq!(reconstruct(&index, text), text);
}

#[rstest]
#[case("ab\ncd", 3, Some(LineDelimiter::Lf))]
#[case("ab\r\ncd", 4, Some(LineDelimiter::CrLf))]
#[case("ab\rcd", 3, Some(LineDelimiter::Cr))]
fn test_first_delimiter(#[case] text: &str, #[case] second_line: usize, #[case] delimiter: Option<LineDelimiter>) {
    let index = LineIndex::from_text(text);
    assert_eq!(index.line_offset(1), Ok(second_line));
    assert_eq!(index.line_delimiter(0), Ok(delimiter));
    assert_eq!(index.line_delimiter(1), Ok(None));
}

// =============================================================================
// EDITS
// =============================================================================

#[test]
fn test_inserting_crlf_splits_line() {
    let mut index = LineIndex::from_text("ab\ncd");
    index.replace(2, 0, "\r\n").unwrap();

    let text = naive_replace("ab\ncd", 2, 0, "\r\n");
    assert_eq!(text, "ab\r\n\ncd");
    assert_eq!(index.line_count(), 3);
    assert_eq!(index.line_offset(1), Ok(4));
    assert_matches_text(&index, &text);
}

#[test]
fn test_replacing_delimiter_with_crlf() {
    let mut index = LineIndex::from_text("ab\ncd");
    index.replace(2, 1, "\r\n").unwrap();

    assert_eq!(index.line_count(), 2);
    assert_eq!(index.line_offset(1), Ok(4));
    assert_eq!(index.line_delimiter(0), Ok(Some(LineDelimiter::CrLf)));
}

#[rstest]
#[case::join_cr_and_lf("a\rb\nc", 2, 1, "")]
#[case::split_crlf("a\r\nb", 2, 0, "x")]
#[case::cr_before_lf_insert("a\r", 2, 0, "\nb")]
#[case::lf_after_cr_insert("\nb", 0, 0, "a\r")]
#[case::delete_everything("one\ntwo\r\nthree", 0, 14, "")]
#[case::replace_across_lines("one\ntwo\r\nthree\rfour", 2, 12, "X\nY")]
#[case::append("one\ntwo", 7, 0, "\r\nthree\n")]
#[case::multibyte("grüße\nwelt", 3, 4, "ö\r\n")]
fn test_edit_matches_rebuild(#[case] text: &str, #[case] offset: usize, #[case] length: usize, #[case] replacement: &str) {
    let mut index = LineIndex::from_text(text);
    index.replace(offset, length, replacement).unwrap();
    assert_matches_text(&index, &naive_replace(text, offset, length, replacement));
}

#[test]
fn test_typing_line_by_line() {
    let mut index = LineIndex::new();
    let mut text = String::new();

    for i in 0..200 {
        let line = format!("line {i}\n");
        index.replace(text.chars().count(), 0, &line).unwrap();
        text.push_str(&line);
    }

    assert_eq!(index.line_count(), 201);
    assert_matches_text(&index, &text);
}

#[test]
fn test_edit_out_of_bounds_leaves_index_untouched() {
    let mut index = LineIndex::from_text("abc\ndef");
    assert_eq!(
        index.replace(5, 10, "x"),
        Err(LineIndexError::OffsetOutOfBounds { offset: 15, length: 7 })
    );
    assert_matches_text(&index, "abc\ndef");
}

// =============================================================================
// QUERIES
// =============================================================================

#[rstest]
#[case(0, 0)]
#[case(3, 0)]
#[case(4, 1)]
#[case(9, 2)]
#[case(10, 2)]
fn test_line_of_offset(#[case] offset: usize, #[case] line: usize) {
    // "abc\n" "de\r\n" "fg"
    let index = LineIndex::from_text("abc\nde\r\nfg");
    assert_eq!(index.line_of_offset(offset), Ok(line));
}

#[test]
fn test_line_queries_out_of_bounds() {
    let index = LineIndex::from_text("abc\nde");
    assert_eq!(
        index.line_offset(2),
        Err(LineIndexError::LineOutOfBounds { line: 2, line_count: 2 })
    );
    assert_eq!(
        index.line_of_offset(7),
        Err(LineIndexError::OffsetOutOfBounds { offset: 7, length: 6 })
    );
}

#[test]
fn test_lines_iterator() {
    let index = LineIndex::from_text("a\r\nbb\ncc");
    let lines: Vec<_> = index.lines().map(|l| (l.offset, l.length, l.delimiter)).collect();
    assert_eq!(
        lines,
        vec![
            (0, 3, Some(LineDelimiter::CrLf)),
            (3, 3, Some(LineDelimiter::Lf)),
            (6, 2, None),
        ]
    );
}
