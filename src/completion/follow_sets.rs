//! Per-rule follow sets and the cache that shares them.
//!
//! A rule's follow sets list every token the rule could consume first,
//! together with the nested rule calls leading there. They depend only on the
//! automaton, so they are computed once per (automaton, rule start state) and
//! shared between engine instances.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::base::IntervalSet;
use crate::grammar::{
    Automaton, AutomatonId, EPSILON, MIN_USER_TOKEN_TYPE, RuleIndex, StateId, TokenType, Transition,
    TransitionKind,
};

/// Tokens reachable from a rule start along one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowSetWithPath {
    pub intervals: IntervalSet,
    /// Rules entered on the way, outermost first (the rule itself excluded).
    pub path: Vec<RuleIndex>,
    /// Tokens that must follow when `intervals` is a single token.
    pub following: Vec<TokenType>,
}

/// All follow sets of one rule plus their union.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FollowSets {
    pub sets: Vec<FollowSetWithPath>,
    /// Union of every entry; contains `EPSILON` if the rule can end without
    /// consuming anything.
    pub combined: IntervalSet,
}

impl FollowSets {
    /// Explore everything reachable from `start` without consuming a token.
    ///
    /// Predicates are assumed to pass: the result must not depend on
    /// per-request state.
    pub fn compute(automaton: &Automaton, start: StateId) -> Self {
        let stop = automaton
            .state(start)
            .and_then(|state| automaton.rule_stop(state.rule_index()));

        let mut collector = Collector {
            automaton,
            stop,
            seen: FxHashSet::default(),
            rule_stack: Vec::new(),
            sets: Vec::new(),
        };
        collector.collect(start);

        let mut combined = IntervalSet::new();
        for set in &collector.sets {
            combined.add_all(&set.intervals);
        }

        Self {
            sets: collector.sets,
            combined,
        }
    }
}

struct Collector<'a> {
    automaton: &'a Automaton,
    stop: Option<StateId>,
    seen: FxHashSet<StateId>,
    rule_stack: Vec<RuleIndex>,
    sets: Vec<FollowSetWithPath>,
}

impl Collector<'_> {
    fn collect(&mut self, state_id: StateId) {
        if !self.seen.insert(state_id) {
            return;
        }
        let automaton = self.automaton;
        let Some(state) = automaton.state(state_id) else {
            return;
        };

        if Some(state_id) == self.stop || state.is_rule_stop() {
            self.record(IntervalSet::of(EPSILON), Vec::new());
            return;
        }

        for transition in state.transitions() {
            match &transition.kind {
                TransitionKind::Rule { rule_index, .. } => {
                    if self.rule_stack.contains(rule_index) {
                        continue;
                    }
                    self.rule_stack.push(*rule_index);
                    self.collect(transition.target);
                    self.rule_stack.pop();
                }
                TransitionKind::Epsilon | TransitionKind::Predicate(_) => {
                    self.collect(transition.target);
                }
                TransitionKind::Wildcard => {
                    let all = IntervalSet::of_range(MIN_USER_TOKEN_TYPE, automaton.max_token_type());
                    self.record(all, Vec::new());
                }
                TransitionKind::Atom(_) | TransitionKind::Set(_) | TransitionKind::NotSet(_) => {
                    let Some(label) = transition.match_set(automaton.max_token_type()) else {
                        continue;
                    };
                    if !label.is_empty() {
                        let following = following_tokens(automaton, transition);
                        self.record(label, following);
                    }
                }
            }
        }
    }

    fn record(&mut self, intervals: IntervalSet, following: Vec<TokenType>) {
        self.sets.push(FollowSetWithPath {
            intervals,
            path: self.rule_stack.clone(),
            following,
        });
    }
}

/// Tokens that are certain to come right after `transition`: a chain of
/// states whose only way forward is a single token (or a plain epsilon).
/// Empty when the transition matches more than one token.
pub(crate) fn following_tokens(automaton: &Automaton, transition: &Transition) -> Vec<TokenType> {
    let mut result = Vec::new();
    if !matches!(transition.kind, TransitionKind::Atom(_)) {
        return result;
    }

    let mut visited = FxHashSet::default();
    let mut current = transition.target;
    while visited.insert(current) {
        let Some(state) = automaton.state(current) else {
            break;
        };
        if state.is_rule_stop() {
            break;
        }
        match state.transitions() {
            [only] => match only.kind {
                TransitionKind::Atom(token_type) => {
                    result.push(token_type);
                    current = only.target;
                }
                TransitionKind::Epsilon => current = only.target,
                _ => break,
            },
            _ => break,
        }
    }
    result
}

type CacheKey = (AutomatonId, StateId);

/// Follow sets shared across engine instances and threads.
///
/// Entries are computed outside the lock and stored if absent, so two
/// callers racing for the same entry both succeed; the first store wins.
#[derive(Debug, Clone, Default)]
pub struct FollowSetCache {
    entries: Arc<RwLock<FxHashMap<CacheKey, Arc<FollowSets>>>>,
}

impl FollowSetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, automaton: AutomatonId, start: StateId) -> Option<Arc<FollowSets>> {
        self.entries.read().get(&(automaton, start)).cloned()
    }

    pub fn get_or_compute(&self, automaton: &Automaton, start: StateId) -> Arc<FollowSets> {
        let key = (automaton.id(), start);
        if let Some(found) = self.entries.read().get(&key) {
            return Arc::clone(found);
        }

        let computed = Arc::new(FollowSets::compute(automaton, start));
        tracing::debug!(
            automaton = automaton.id().raw(),
            start,
            sets = computed.sets.len(),
            "follow sets computed"
        );

        let mut entries = self.entries.write();
        Arc::clone(entries.entry(key).or_insert(computed))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Drop every entry of one automaton.
    pub fn invalidate(&self, automaton: AutomatonId) {
        self.entries.write().retain(|(id, _), _| *id != automaton);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}
