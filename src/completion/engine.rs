//! Grammar automaton walker collecting completion candidates.
//!
//! The walk starts at a rule's start state with the first token of the
//! window and follows every transition the tokens allow. Once the caret token
//! is reached, whatever the automaton could consume there is collected:
//! token types as token candidates, or enclosing rules marked as preferred
//! as rule candidates.

use std::sync::Arc;

use indexmap::IndexSet;
use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};

use super::candidates::CandidateSet;
use super::config::CompletionConfig;
use super::follow_sets::{FollowSetCache, FollowSets, following_tokens};
use super::predicate::PredicateEvaluator;
use super::window::TokenWindow;
use crate::grammar::{
    Automaton, EPSILON, MIN_USER_TOKEN_TYPE, PredicateId, RuleIndex, StateId, TokenType,
    TransitionKind,
};

/// Token indices at which a rule invocation can stop.
type EndIndices = IndexSet<usize, FxBuildHasher>;

/// Collects completion candidates for one automaton.
///
/// The engine itself only holds the automaton, the shared follow-set cache and
/// the configuration; every [`collect_candidates`](Self::collect_candidates)
/// call runs with fresh per-request state.
#[derive(Debug, Clone)]
pub struct CompletionEngine<'a> {
    automaton: &'a Automaton,
    cache: FollowSetCache,
    config: CompletionConfig,
    states_processed: usize,
}

impl<'a> CompletionEngine<'a> {
    pub fn new(automaton: &'a Automaton, cache: FollowSetCache) -> Self {
        Self {
            automaton,
            cache,
            config: CompletionConfig::default(),
            states_processed: 0,
        }
    }

    pub fn with_config(mut self, config: CompletionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    pub fn automaton(&self) -> &'a Automaton {
        self.automaton
    }

    /// Number of automaton states visited by the last run.
    pub fn states_processed(&self) -> usize {
        self.states_processed
    }

    /// Candidates for the caret token of `window`, walking from `start_rule`
    /// at the window's first token.
    ///
    /// Never fails: an unknown start rule yields an empty set.
    pub fn collect_candidates(
        &mut self,
        window: &TokenWindow,
        start_rule: RuleIndex,
        predicates: &dyn PredicateEvaluator,
    ) -> CandidateSet {
        self.states_processed = 0;

        let Some(start) = self.automaton.rule_start(start_rule) else {
            tracing::debug!(start_rule, "unknown start rule, no candidates");
            return CandidateSet::default();
        };

        let mut walk = Walk {
            automaton: self.automaton,
            cache: &self.cache,
            config: &self.config,
            predicates,
            tokens: window.token_types(),
            caret: window.caret_index(),
            shortcuts: FxHashMap::default(),
            call_stack: Vec::new(),
            candidates: CandidateSet::default(),
            states_processed: 0,
        };
        walk.process_rule(start, 0);

        self.states_processed = walk.states_processed;
        let candidates = walk.candidates;

        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!(
                states_processed = self.states_processed,
                tokens = ?candidates.token_names(self.automaton.vocabulary()),
                rules = ?candidates.rule_names(self.automaton),
                "completion candidates collected"
            );
        }
        candidates
    }
}

/// Mutable state of a single request.
struct Walk<'w> {
    automaton: &'w Automaton,
    cache: &'w FollowSetCache,
    config: &'w CompletionConfig,
    predicates: &'w dyn PredicateEvaluator,
    tokens: Vec<TokenType>,
    caret: usize,
    /// Results per (rule, entry token index). An entry is present while the
    /// invocation is still running, which cuts left recursion short.
    shortcuts: FxHashMap<(RuleIndex, usize), EndIndices>,
    call_stack: Vec<RuleIndex>,
    candidates: CandidateSet,
    states_processed: usize,
}

impl Walk<'_> {
    fn process_rule(&mut self, start: StateId, token_index: usize) -> EndIndices {
        let Some(start_state) = self.automaton.state(start) else {
            return EndIndices::default();
        };
        let rule = start_state.rule_index();

        if let Some(known) = self.shortcuts.get(&(rule, token_index)) {
            tracing::debug!(rule, token_index, "shortcut");
            return known.clone();
        }

        let follow_sets = self.cache.get_or_compute(self.automaton, start);
        self.call_stack.push(rule);

        let result = if token_index >= self.caret {
            self.collect_at_caret(rule, &follow_sets);
            EndIndices::default()
        } else if !follow_sets.combined.contains(EPSILON)
            && !follow_sets.combined.contains(self.tokens[token_index])
        {
            tracing::trace!(rule, token_index, "rule cannot match current token");
            EndIndices::default()
        } else {
            self.shortcuts.insert((rule, token_index), EndIndices::default());
            let result = self.walk_rule(start, token_index);
            self.shortcuts.insert((rule, token_index), result.clone());
            result
        };

        self.call_stack.pop();
        result
    }

    /// The caret sits at the start of this rule: everything it can begin
    /// with is a candidate.
    fn collect_at_caret(&mut self, rule: RuleIndex, follow_sets: &Arc<FollowSets>) {
        if self.config.is_preferred(rule) {
            resolve_preferred(self.config, &mut self.candidates, &self.call_stack);
            return;
        }

        for set in &follow_sets.sets {
            let mut full_path = self.call_stack.clone();
            full_path.extend_from_slice(&set.path);
            if resolve_preferred(self.config, &mut self.candidates, &full_path) {
                continue;
            }

            let following = self.visible_following(&set.following);
            for symbol in set.intervals.iter() {
                self.add_token(symbol, &following);
            }
        }
    }

    fn walk_rule(&mut self, start: StateId, token_index: usize) -> EndIndices {
        let automaton = self.automaton;
        let mut result = EndIndices::default();
        let mut pipeline = vec![(start, token_index)];
        let mut visited: FxHashSet<(StateId, usize)> = FxHashSet::default();

        while let Some((state_id, index)) = pipeline.pop() {
            if !visited.insert((state_id, index)) {
                continue;
            }
            let Some(state) = automaton.state(state_id) else {
                continue;
            };
            self.states_processed += 1;

            let at_caret = index >= self.caret;
            let current = self.tokens[index];
            tracing::trace!(
                state = state_id,
                kind = ?state.kind(),
                rule = state.rule_index(),
                token_index = index,
                at_caret,
                "visiting state"
            );

            if state.is_rule_stop() {
                result.insert(index);
                continue;
            }

            for transition in state.transitions() {
                match &transition.kind {
                    TransitionKind::Rule { follow_state, .. } => {
                        let ends = self.process_rule(transition.target, index);
                        for end in ends {
                            pipeline.push((*follow_state, end));
                        }
                    }
                    TransitionKind::Predicate(predicate) => {
                        if self.check_predicate(*predicate) {
                            pipeline.push((transition.target, index));
                        }
                    }
                    TransitionKind::Wildcard => {
                        if !at_caret {
                            pipeline.push((transition.target, index + 1));
                        } else if !resolve_preferred(self.config, &mut self.candidates, &self.call_stack) {
                            for symbol in MIN_USER_TOKEN_TYPE..=automaton.max_token_type() {
                                self.add_token(symbol, &[]);
                            }
                        }
                    }
                    TransitionKind::Epsilon => {
                        if at_caret {
                            resolve_preferred(self.config, &mut self.candidates, &self.call_stack);
                        }
                        pipeline.push((transition.target, index));
                    }
                    TransitionKind::Atom(_) | TransitionKind::Set(_) | TransitionKind::NotSet(_) => {
                        let Some(set) = transition.match_set(automaton.max_token_type()) else {
                            continue;
                        };
                        if set.is_empty() {
                            continue;
                        }

                        if !at_caret {
                            if set.contains(current) {
                                tracing::trace!(token = current, "consumed");
                                pipeline.push((transition.target, index + 1));
                            }
                        } else if !resolve_preferred(self.config, &mut self.candidates, &self.call_stack) {
                            let following = if set.single().is_some() {
                                self.visible_following(&following_tokens(automaton, transition))
                            } else {
                                Vec::new()
                            };
                            for symbol in set.iter() {
                                self.add_token(symbol, &following);
                            }
                        }
                    }
                }
            }
        }

        result
    }

    fn check_predicate(&self, predicate: PredicateId) -> bool {
        match self.predicates.evaluate(predicate) {
            Ok(passed) => passed,
            Err(err) => {
                tracing::warn!(predicate, error = %err, "predicate evaluation failed, path pruned");
                false
            }
        }
    }

    fn add_token(&mut self, symbol: TokenType, following: &[TokenType]) {
        if symbol == EPSILON {
            return;
        }
        if self.config.is_ignored(symbol) {
            tracing::trace!(token = symbol, "ignored token");
            return;
        }
        tracing::trace!(
            token = %self.automaton.vocabulary().display_name(symbol),
            "collected token"
        );
        self.candidates.add_token(symbol, following);
    }

    /// A following list ends before the first ignored token.
    fn visible_following(&self, following: &[TokenType]) -> Vec<TokenType> {
        following
            .iter()
            .copied()
            .take_while(|token| !self.config.is_ignored(*token))
            .collect()
    }
}

/// Record the outermost preferred rule of `stack` with the rules enclosing
/// it. Returns whether the stack contains a preferred rule at all.
fn resolve_preferred(config: &CompletionConfig, candidates: &mut CandidateSet, stack: &[RuleIndex]) -> bool {
    if config.preferred_rules.is_empty() {
        return false;
    }

    let Some(position) = stack.iter().position(|rule| config.is_preferred(*rule)) else {
        return false;
    };
    let rule = stack[position];
    if candidates.add_rule(rule, &stack[..position]) {
        tracing::trace!(rule, depth = position, "collected rule");
    }
    true
}
