//! Property tests: a line index edited in place always agrees with one built
//! from scratch.

use crate::helpers::document_helpers::*;
use dslkit::LineIndex;
use proptest::prelude::*;

/// Text made of a few letters and every kind of delimiter character, so
/// delimiters are frequent and `\r`/`\n` pairs form and break often.
fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof!["a", "b", "é", "\r", "\n", "\r\n"], 0..40).prop_map(|parts| parts.concat())
}

fn edit_strategy() -> impl Strategy<Value = (String, usize, usize, String)> {
    (text_strategy(), text_strategy(), any::<prop::sample::Index>(), any::<prop::sample::Index>()).prop_map(
        |(text, replacement, start, len)| {
            let total = text.chars().count();
            let offset = start.index(total + 1);
            let length = len.index(total - offset + 1);
            (text, offset, length, replacement)
        },
    )
}

proptest! {
    #[test]
    fn prop_lines_round_trip(text in text_strategy()) {
        let index = LineIndex::from_text(&text);
        prop_assert_eq!(reconstruct(&index, &text), text.clone());
        prop_assert_eq!(index.len(), text.chars().count());
        prop_assert!(index.check_invariants().is_ok());
    }

    #[test]
    fn prop_incremental_equivalence((text, offset, length, replacement) in edit_strategy()) {
        let mut index = LineIndex::from_text(&text);
        index.replace(offset, length, &replacement).unwrap();

        let edited = naive_replace(&text, offset, length, &replacement);
        let rebuilt = LineIndex::from_text(&edited);

        prop_assert_eq!(index.line_count(), rebuilt.line_count());
        for line in 0..rebuilt.line_count() {
            prop_assert_eq!(index.line_offset(line), rebuilt.line_offset(line));
        }
        prop_assert_eq!(reconstruct(&index, &edited), edited.clone());
        prop_assert!(index.check_invariants().is_ok());
    }

    #[test]
    fn prop_edit_sequences(
        text in text_strategy(),
        edits in prop::collection::vec((any::<prop::sample::Index>(), any::<prop::sample::Index>(), text_strategy()), 1..12),
    ) {
        let mut index = LineIndex::from_text(&text);
        let mut current = text;

        for (start, len, replacement) in edits {
            let total = current.chars().count();
            let offset = start.index(total + 1);
            let length = len.index(total - offset + 1);
            index.replace(offset, length, &replacement).unwrap();
            current = naive_replace(&current, offset, length, &replacement);
        }

        assert_matches_text(&index, &current);
    }
}
