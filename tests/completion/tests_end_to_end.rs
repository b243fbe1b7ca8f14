//! Completion over real text: document → logos tokens → window → candidates.

use crate::helpers::grammar_fixtures::*;
use dslkit::completion::{AlwaysTrue, CompletionConfig, CompletionEngine, FollowSetCache, TokenWindow};
use dslkit::grammar::INVALID_TOKEN_TYPE;
use dslkit::{ContentChange, DocumentSnapshot, Position, Range, TextDocument};

fn complete_at(snapshot: &DocumentSnapshot, caret: Position, config: CompletionConfig) -> Vec<String> {
    let automaton = machine_grammar();
    let tokens = lex(snapshot.text());
    let window = TokenWindow::collect(&tokens, 0, caret);

    let mut engine = CompletionEngine::new(&automaton, FollowSetCache::new()).with_config(config);
    let candidates = engine.collect_candidates(&window, MACHINE, &AlwaysTrue);

    let mut names: Vec<String> = candidates
        .token_names(automaton.vocabulary())
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    names.extend(
        candidates
            .rule_names(&automaton)
            .into_iter()
            .map(|name| format!("<{name}>")),
    );
    names
}

#[test]
fn test_lexed_positions_drive_the_window() {
    let snapshot = DocumentSnapshot::new("state idle {\n  on start -> ");
    let caret = snapshot.position_at(snapshot.len()).unwrap();
    assert_eq!(caret, Position::new(1, 14));

    let tokens = lex(snapshot.text());
    let window = TokenWindow::collect(&tokens, 0, caret);
    let types: Vec<_> = window.tokens().iter().map(|t| t.token_type).collect();
    assert_eq!(types, vec![STATE, ID, LBRACE, ON, ID, ARROW, dslkit::grammar::EOF]);
    assert_eq!(window.caret_index(), 6);
}

#[test]
fn test_complete_transition_target() {
    let snapshot = DocumentSnapshot::new("state idle {\n  on start -> ");
    let caret = snapshot.position_at(snapshot.len()).unwrap();

    assert_eq!(complete_at(&snapshot, caret, CompletionConfig::new()), vec!["ID"]);
    assert_eq!(
        complete_at(&snapshot, caret, CompletionConfig::new().with_preferred_rule(NAME)),
        vec!["<name>"]
    );
}

#[test]
fn test_complete_inside_state_body() {
    let snapshot = DocumentSnapshot::new("// states\nstate idle {\n  ");
    let caret = snapshot.position_at(snapshot.len()).unwrap();

    assert_eq!(
        complete_at(&snapshot, caret, CompletionConfig::new()),
        vec!["'on' ID '->'", "'}'"]
    );
}

#[test]
fn test_complete_after_closed_state() {
    let snapshot = DocumentSnapshot::new("state idle {\n}\n");
    let caret = snapshot.position_at(snapshot.len()).unwrap();

    assert_eq!(complete_at(&snapshot, caret, CompletionConfig::new()), vec!["'state'"]);
}

#[test]
fn test_complete_word_under_caret() {
    let snapshot = DocumentSnapshot::new("state idle {\n  on sta");
    let caret = Position::new(1, 8);

    let (range, word) = snapshot.word_at(caret).unwrap();
    assert_eq!(word, "sta");
    assert_eq!(range, Range::from_coords(1, 5, 1, 8));

    // Completing from the start of the word offers what may replace it
    assert_eq!(complete_at(&snapshot, range.start, CompletionConfig::new()), vec!["ID '->'"]);
    // Completing after it offers what follows it
    assert_eq!(complete_at(&snapshot, caret, CompletionConfig::new()), vec!["'->'"]);
}

#[test]
fn test_invalid_input_yields_no_candidates() {
    let snapshot = DocumentSnapshot::new("state idle { # ");
    let tokens = lex(snapshot.text());
    assert!(tokens.iter().any(|t| t.token_type == INVALID_TOKEN_TYPE));

    let caret = snapshot.position_at(snapshot.len()).unwrap();
    assert!(complete_at(&snapshot, caret, CompletionConfig::new()).is_empty());
}

#[test]
fn test_completion_follows_document_edits() {
    let doc = TextDocument::new("file:///lights.sm", "statemachine", 1, "state off {\n}\n");
    doc.apply_changes(2, &[ContentChange::ranged(Range::from_coords(0, 11, 0, 11), "\n  on toggle ")])
        .unwrap();

    let snapshot = doc.snapshot();
    assert_eq!(snapshot.line_text(1), Ok("  on toggle "));

    let caret = snapshot.validate_position(Position::new(1, 100));
    assert_eq!(caret, Position::new(1, 12));
    assert_eq!(complete_at(&snapshot, caret, CompletionConfig::new()), vec!["'->'"]);
}
