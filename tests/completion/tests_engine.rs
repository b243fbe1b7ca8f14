//! Completion engine behaviour over small hand-built grammars.

use std::sync::Arc;

use crate::helpers::grammar_fixtures::*;
use dslkit::completion::{AlwaysTrue, CandidateSet, CompletionConfig, CompletionEngine, FollowSetCache, TokenWindow};
use dslkit::grammar::{Automaton, AutomatonBuilder, EOF, PredicateId, StateKind, TokenType};
use dslkit::{IntervalSet, PredicateError};

const A: TokenType = 1;
const B: TokenType = 2;
const C: TokenType = 3;
const X: TokenType = 4;

fn caret_window(types: &[TokenType]) -> TokenWindow {
    let tokens = tokens_of(types);
    let caret = tokens.len() - 1;
    TokenWindow::new(tokens, caret)
}

fn token_list(candidates: &CandidateSet) -> Vec<(TokenType, Vec<TokenType>)> {
    candidates.tokens().iter().map(|(t, f)| (*t, f.clone())).collect()
}

fn collect(automaton: &Automaton, types: &[TokenType], start_rule: usize) -> CandidateSet {
    let mut engine = CompletionEngine::new(automaton, FollowSetCache::new());
    engine.collect_candidates(&caret_window(types), start_rule, &AlwaysTrue)
}

// =============================================================================
// BASIC SCENARIOS
// =============================================================================

/// outer : r 'c' ;  r : 'a' | 'b' ;
fn alternatives() -> Automaton {
    let mut builder = AutomatonBuilder::new();
    let outer = builder.add_rule("outer");
    let r = builder.add_rule("r");
    let after_r = builder.add_state(outer.index, StateKind::Basic);
    builder.rule_call(outer.start, r.index, after_r);
    builder.atom(after_r, outer.stop, C);
    builder.atom(r.start, r.stop, A);
    builder.atom(r.start, r.stop, B);
    builder.build().unwrap()
}

#[test]
fn test_alternatives_at_rule_start() {
    let automaton = alternatives();
    let candidates = collect(&automaton, &[EOF], 1);
    assert_eq!(token_list(&candidates), vec![(A, vec![]), (B, vec![])]);
}

#[test]
fn test_candidates_after_consumed_token_come_from_outer_rule() {
    let automaton = alternatives();
    let candidates = collect(&automaton, &[A, EOF], 0);
    assert_eq!(token_list(&candidates), vec![(C, vec![])]);
}

#[test]
fn test_caret_on_partially_typed_token_suggests_replacements() {
    // The caret token itself is never consumed: the window "a" with the caret
    // on it asks what may stand at index 0
    let automaton = alternatives();
    let candidates = collect(&automaton, &[A], 0);
    assert_eq!(token_list(&candidates), vec![(A, vec![]), (B, vec![])]);
}

#[test]
fn test_collection_is_deterministic() {
    let automaton = machine_grammar();
    let types = [STATE, ID, LBRACE, EOF];
    let cache = FollowSetCache::new();
    let config = CompletionConfig::new().with_preferred_rule(NAME);

    let mut first = CompletionEngine::new(&automaton, cache.clone()).with_config(config.clone());
    let mut second = CompletionEngine::new(&automaton, FollowSetCache::new()).with_config(config);

    let a = first.collect_candidates(&caret_window(&types), MACHINE, &AlwaysTrue);
    let b = first.collect_candidates(&caret_window(&types), MACHINE, &AlwaysTrue);
    let c = second.collect_candidates(&caret_window(&types), MACHINE, &AlwaysTrue);
    assert_eq!(a, b);
    assert_eq!(a, c);
    assert_eq!(
        token_list(&a).into_iter().map(|(t, _)| t).collect::<Vec<_>>(),
        vec![ON, RBRACE]
    );
}

// =============================================================================
// FOLLOWING TOKENS
// =============================================================================

#[test]
fn test_following_tokens_of_keyword() {
    let automaton = machine_grammar();
    let candidates = collect(&automaton, &[STATE, ID, LBRACE, EOF], STATE_DECL);

    assert_eq!(candidates.tokens()[&ON], vec![ID, ARROW]);
    assert_eq!(candidates.tokens()[&RBRACE], Vec::<TokenType>::new());
    assert_eq!(
        candidates.token_names(automaton.vocabulary()),
        vec!["'on' ID '->'", "'}'"]
    );
}

#[test]
fn test_ambiguous_following_collapses() {
    // r : 'x' 'a' | 'x' 'b' ;
    let mut builder = AutomatonBuilder::new();
    let r = builder.add_rule("r");
    let after_first = builder.add_state(r.index, StateKind::Basic);
    let after_second = builder.add_state(r.index, StateKind::Basic);
    builder.atom(r.start, after_first, X);
    builder.atom(after_first, r.stop, A);
    builder.atom(r.start, after_second, X);
    builder.atom(after_second, r.stop, B);
    let automaton = builder.build().unwrap();

    let candidates = collect(&automaton, &[EOF], 0);
    assert_eq!(token_list(&candidates), vec![(X, vec![])]);
}

#[test]
fn test_following_list_stops_at_ignored_token() {
    let automaton = machine_grammar();
    let mut engine = CompletionEngine::new(&automaton, FollowSetCache::new())
        .with_config(CompletionConfig::new().with_ignored_token(ARROW));
    let candidates = engine.collect_candidates(&caret_window(&[STATE, ID, LBRACE, EOF]), STATE_DECL, &AlwaysTrue);

    assert_eq!(candidates.tokens()[&ON], vec![ID]);
}

// =============================================================================
// PREFERRED RULES AND IGNORED TOKENS
// =============================================================================

#[test]
fn test_preferred_rule_nested_two_levels() {
    let automaton = machine_grammar();
    let mut engine = CompletionEngine::new(&automaton, FollowSetCache::new())
        .with_config(CompletionConfig::new().with_preferred_rule(NAME));

    // state idle { on go -> |
    let window = caret_window(&[STATE, ID, LBRACE, ON, ID, ARROW, EOF]);
    let candidates = engine.collect_candidates(&window, STATE_DECL, &AlwaysTrue);

    assert_eq!(candidates.rules()[&NAME], vec![STATE_DECL, TRANSITION]);
    assert!(!candidates.contains_token(ID));
    assert!(candidates.tokens().is_empty());
    assert_eq!(candidates.rule_names(&automaton), vec!["name"]);
}

#[test]
fn test_without_preferred_rule_tokens_are_returned() {
    let automaton = machine_grammar();
    let candidates = collect(&automaton, &[STATE, ID, LBRACE, ON, ID, ARROW, EOF], STATE_DECL);
    assert_eq!(token_list(&candidates), vec![(ID, vec![])]);
    assert!(candidates.rules().is_empty());
}

#[test]
fn test_ignored_tokens_are_never_returned() {
    let automaton = machine_grammar();
    let mut engine = CompletionEngine::new(&automaton, FollowSetCache::new())
        .with_config(CompletionConfig::new().with_ignored_tokens([RBRACE]));
    let candidates = engine.collect_candidates(&caret_window(&[STATE, ID, LBRACE, EOF]), STATE_DECL, &AlwaysTrue);

    assert!(!candidates.contains_token(RBRACE));
    assert!(candidates.contains_token(ON));
}

// =============================================================================
// PREDICATES, WILDCARDS, NEGATED SETS
// =============================================================================

/// r : 'x' ({0}? 'a' | {1}? 'b') ;
fn guarded() -> Automaton {
    let mut builder = AutomatonBuilder::new();
    let r = builder.add_rule("r");
    let block = builder.add_state(r.index, StateKind::BlockStart);
    let first = builder.add_state(r.index, StateKind::Basic);
    let second = builder.add_state(r.index, StateKind::Basic);
    builder.atom(r.start, block, X);
    builder.predicate(block, first, 0);
    builder.atom(first, r.stop, A);
    builder.predicate(block, second, 1);
    builder.atom(second, r.stop, B);
    builder.build().unwrap()
}

#[test]
fn test_false_predicate_prunes_path() {
    let automaton = guarded();
    let mut engine = CompletionEngine::new(&automaton, FollowSetCache::new());
    let only_first = |predicate: PredicateId| Ok::<_, PredicateError>(predicate == 0);

    let candidates = engine.collect_candidates(&caret_window(&[X, EOF]), 0, &only_first);
    assert_eq!(token_list(&candidates), vec![(A, vec![])]);
}

#[test]
fn test_failing_predicate_is_treated_as_false() {
    let automaton = guarded();
    let mut engine = CompletionEngine::new(&automaton, FollowSetCache::new());
    let failing = |predicate: PredicateId| {
        if predicate == 1 {
            Err(PredicateError::new(predicate, "no semantic context"))
        } else {
            Ok(true)
        }
    };

    let candidates = engine.collect_candidates(&caret_window(&[X, EOF]), 0, &failing);
    assert_eq!(token_list(&candidates), vec![(A, vec![])]);
}

#[test]
fn test_wildcard_offers_every_token() {
    // r : 'x' . ;
    let mut builder = AutomatonBuilder::new().with_max_token_type(4);
    let r = builder.add_rule("r");
    let after_x = builder.add_state(r.index, StateKind::Basic);
    builder.atom(r.start, after_x, X);
    builder.wildcard(after_x, r.stop);
    let automaton = builder.build().unwrap();

    let candidates = collect(&automaton, &[X, EOF], 0);
    assert_eq!(candidates.tokens().keys().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4]);

    // A wildcard consumes whatever token is there
    let mut builder = AutomatonBuilder::new().with_max_token_type(4);
    let r = builder.add_rule("r");
    let after_any = builder.add_state(r.index, StateKind::Basic);
    builder.wildcard(r.start, after_any);
    builder.atom(after_any, r.stop, C);
    let automaton = builder.build().unwrap();

    let candidates = collect(&automaton, &[B, EOF], 0);
    assert_eq!(token_list(&candidates), vec![(C, vec![])]);
}

#[test]
fn test_not_set_offers_complement() {
    // r : 'x' ~('a' | 'c') ;
    let mut builder = AutomatonBuilder::new().with_max_token_type(4);
    let r = builder.add_rule("r");
    let after_x = builder.add_state(r.index, StateKind::Basic);
    builder.atom(r.start, after_x, X);
    builder.not_set(after_x, r.stop, [A, C].into_iter().collect::<IntervalSet>());
    let automaton = builder.build().unwrap();

    let candidates = collect(&automaton, &[X, EOF], 0);
    assert_eq!(candidates.tokens().keys().copied().collect::<Vec<_>>(), vec![B, X]);
}

#[test]
fn test_set_transition_consumes_member() {
    // r : ('a' | 'b') 'c' ;
    let mut builder = AutomatonBuilder::new();
    let r = builder.add_rule("r");
    let after_set = builder.add_state(r.index, StateKind::Basic);
    builder.set(r.start, after_set, IntervalSet::of_range(A, B));
    builder.atom(after_set, r.stop, C);
    let automaton = builder.build().unwrap();

    assert_eq!(token_list(&collect(&automaton, &[B, EOF], 0)), vec![(C, vec![])]);
    assert!(collect(&automaton, &[C, EOF], 0).is_empty());
}

// =============================================================================
// TERMINATION
// =============================================================================

#[test]
fn test_left_recursive_rule_terminates() {
    // top : e ';' ;  e : e '+' 'n' | 'n' ;
    const PLUS: TokenType = 1;
    const N: TokenType = 2;
    const END: TokenType = 3;

    let mut builder = AutomatonBuilder::new();
    let top = builder.add_rule("top");
    let e = builder.add_rule("e");

    let after_e = builder.add_state(top.index, StateKind::Basic);
    builder.rule_call(top.start, e.index, after_e);
    builder.atom(after_e, top.stop, END);

    let after_self = builder.add_state(e.index, StateKind::Basic);
    let after_plus = builder.add_state(e.index, StateKind::Basic);
    builder.rule_call(e.start, e.index, after_self);
    builder.atom(after_self, after_plus, PLUS);
    builder.atom(after_plus, e.stop, N);
    builder.atom(e.start, e.stop, N);
    let automaton = builder.build().unwrap();

    let candidates = collect(&automaton, &[N, EOF], 0);
    assert!(candidates.contains_token(END));
}

#[test]
fn test_epsilon_cycle_terminates() {
    // top : r 'c' ;  r : 'a'* ;  with a redundant epsilon loop
    let mut builder = AutomatonBuilder::new();
    let top = builder.add_rule("top");
    let r = builder.add_rule("r");

    let after_r = builder.add_state(top.index, StateKind::Basic);
    builder.rule_call(top.start, r.index, after_r);
    builder.atom(after_r, top.stop, C);

    let entry = builder.add_state(r.index, StateKind::LoopEntry);
    let back = builder.add_state(r.index, StateKind::LoopBack);
    let body = builder.add_state(r.index, StateKind::Basic);
    builder.epsilon(r.start, entry);
    builder.epsilon(entry, back);
    builder.epsilon(back, entry);
    builder.atom(entry, body, A);
    builder.epsilon(body, entry);
    builder.epsilon(entry, r.stop);
    let automaton = builder.build().unwrap();

    let candidates = collect(&automaton, &[A, A, EOF], 0);
    assert_eq!(token_list(&candidates), vec![(A, vec![]), (C, vec![])]);
}

// =============================================================================
// FOLLOW-SET CACHE
// =============================================================================

#[test]
fn test_cache_shared_between_engines() {
    let automaton = machine_grammar();
    let cache = FollowSetCache::new();
    let window = caret_window(&[STATE, ID, LBRACE, EOF]);

    let results: Vec<CandidateSet> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                let automaton = &automaton;
                let window = &window;
                scope.spawn(move || {
                    let mut engine = CompletionEngine::new(automaton, cache);
                    engine.collect_candidates(window, MACHINE, &AlwaysTrue)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
    assert!(!cache.is_empty());

    let start = automaton.rule_start(TRANSITION).unwrap();
    let before = cache.get(automaton.id(), start).unwrap();
    let again = cache.get_or_compute(&automaton, start);
    assert!(Arc::ptr_eq(&before, &again));

    cache.invalidate(automaton.id());
    assert!(cache.is_empty());
}

#[test]
fn test_cache_keeps_automata_apart() {
    let first = alternatives();
    let second = alternatives();
    assert_ne!(first.id(), second.id());

    let cache = FollowSetCache::new();
    CompletionEngine::new(&first, cache.clone()).collect_candidates(&caret_window(&[EOF]), 0, &AlwaysTrue);
    CompletionEngine::new(&second, cache.clone()).collect_candidates(&caret_window(&[EOF]), 0, &AlwaysTrue);
    let entries = cache.len();

    cache.invalidate(first.id());
    assert_eq!(cache.len(), entries / 2);
}
