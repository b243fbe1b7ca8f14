//! Grammar automaton: the state machine a generated parser runs on.
//!
//! Every rule owns a start and a stop state. Transitions either consume a
//! token (atom, set, not-set, wildcard) or move without consuming (epsilon,
//! rule call, predicate). The completion engine walks this graph; it never
//! parses.

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHasher;
use smol_str::SmolStr;

use super::token::{MIN_USER_TOKEN_TYPE, TokenType};
use super::vocabulary::Vocabulary;
use crate::base::IntervalSet;
use crate::error::GrammarError;

pub type StateId = usize;
pub type RuleIndex = usize;
pub type PredicateId = u32;

/// Identity of an automaton, used to key shared caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AutomatonId(u64);

static NEXT_AUTOMATON_ID: AtomicU64 = AtomicU64::new(1);

impl AutomatonId {
    /// A process-unique identity.
    pub fn unique() -> Self {
        // High bit clear keeps these apart from name-derived ids
        Self(NEXT_AUTOMATON_ID.fetch_add(1, Ordering::Relaxed) & !(1 << 63))
    }

    /// A stable identity derived from a grammar name. Two automata built for
    /// the same grammar name share cache entries.
    pub fn from_name(name: &str) -> Self {
        let mut hasher = FxHasher::default();
        name.hash(&mut hasher);
        Self(hasher.finish() | (1 << 63))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StateKind {
    Basic,
    RuleStart,
    RuleStop,
    BlockStart,
    BlockEnd,
    LoopEntry,
    LoopBack,
    LoopEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionKind {
    Epsilon,
    Atom(TokenType),
    Set(IntervalSet),
    /// Any token type not in the set.
    NotSet(IntervalSet),
    Wildcard,
    /// Enter `rule_index`; continue at `follow_state` once it stops.
    Rule {
        rule_index: RuleIndex,
        follow_state: StateId,
    },
    Predicate(PredicateId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transition {
    pub target: StateId,
    pub kind: TransitionKind,
}

impl Transition {
    /// True for transitions that move without consuming a token.
    pub fn is_epsilon(&self) -> bool {
        matches!(
            self.kind,
            TransitionKind::Epsilon | TransitionKind::Rule { .. } | TransitionKind::Predicate(_)
        )
    }

    /// Token types this transition consumes, the not-set already
    /// complemented against `MIN_USER_TOKEN_TYPE..=max_token_type`.
    /// `None` for non-consuming transitions and the wildcard.
    pub fn match_set(&self, max_token_type: TokenType) -> Option<IntervalSet> {
        match &self.kind {
            TransitionKind::Atom(token_type) => Some(IntervalSet::of(*token_type)),
            TransitionKind::Set(set) => Some(set.clone()),
            TransitionKind::NotSet(set) => Some(set.complement(MIN_USER_TOKEN_TYPE, max_token_type)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct State {
    id: StateId,
    kind: StateKind,
    rule_index: RuleIndex,
    transitions: Vec<Transition>,
}

impl State {
    pub fn id(&self) -> StateId {
        self.id
    }

    pub fn kind(&self) -> StateKind {
        self.kind
    }

    pub fn rule_index(&self) -> RuleIndex {
        self.rule_index
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn is_rule_stop(&self) -> bool {
        self.kind == StateKind::RuleStop
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct Rule {
    name: SmolStr,
    start: StateId,
    stop: StateId,
}

/// A read-only grammar automaton. Build one with [`AutomatonBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Automaton {
    id: AutomatonId,
    states: Vec<State>,
    rules: Vec<Rule>,
    vocabulary: Vocabulary,
    max_token_type: TokenType,
}

impl Automaton {
    pub fn id(&self) -> AutomatonId {
        self.id
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id)
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn rule_start(&self, rule: RuleIndex) -> Option<StateId> {
        self.rules.get(rule).map(|r| r.start)
    }

    pub fn rule_stop(&self, rule: RuleIndex) -> Option<StateId> {
        self.rules.get(rule).map(|r| r.stop)
    }

    pub fn rule_name(&self, rule: RuleIndex) -> Option<&str> {
        self.rules.get(rule).map(|r| r.name.as_str())
    }

    pub fn rule_index(&self, name: &str) -> Option<RuleIndex> {
        self.rules.iter().position(|r| r.name == name)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Highest token type the grammar can produce.
    pub fn max_token_type(&self) -> TokenType {
        self.max_token_type
    }
}

/// Start and stop states of a rule added to an [`AutomatonBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleStates {
    pub index: RuleIndex,
    pub start: StateId,
    pub stop: StateId,
}

#[derive(Debug, Clone)]
struct PendingTransition {
    from: StateId,
    /// `None` for rule calls, resolved to the rule start on build.
    to: Option<StateId>,
    kind: TransitionKind,
}

/// Assembles an [`Automaton`] state by state.
///
/// Transitions may reference states and rules that are added later; all
/// references are checked by [`build`](Self::build).
///
/// ```
/// use dslkit::grammar::{AutomatonBuilder, StateKind};
///
/// // r : 'a' | 'b' ;
/// let mut builder = AutomatonBuilder::new();
/// let r = builder.add_rule("r");
/// builder.atom(r.start, r.stop, 1);
/// builder.atom(r.start, r.stop, 2);
/// let automaton = builder.build().unwrap();
/// assert_eq!(automaton.max_token_type(), 2);
/// assert_eq!(automaton.state(r.stop).unwrap().kind(), StateKind::RuleStop);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AutomatonBuilder {
    id: Option<AutomatonId>,
    states: Vec<(StateKind, RuleIndex)>,
    rules: Vec<Rule>,
    transitions: Vec<PendingTransition>,
    vocabulary: Vocabulary,
    max_token_type: Option<TokenType>,
}

impl AutomatonBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the automaton identity from a grammar name instead of a
    /// process-unique counter.
    pub fn named(mut self, grammar_name: &str) -> Self {
        self.id = Some(AutomatonId::from_name(grammar_name));
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Override the inferred maximum token type.
    pub fn with_max_token_type(mut self, max_token_type: TokenType) -> Self {
        self.max_token_type = Some(max_token_type);
        self
    }

    pub fn add_rule(&mut self, name: &str) -> RuleStates {
        let index = self.rules.len();
        let start = self.push_state(index, StateKind::RuleStart);
        let stop = self.push_state(index, StateKind::RuleStop);
        self.rules.push(Rule {
            name: SmolStr::from(name),
            start,
            stop,
        });
        RuleStates { index, start, stop }
    }

    pub fn add_state(&mut self, rule: RuleIndex, kind: StateKind) -> StateId {
        self.push_state(rule, kind)
    }

    pub fn add_transition(&mut self, from: StateId, to: StateId, kind: TransitionKind) -> &mut Self {
        self.transitions.push(PendingTransition {
            from,
            to: Some(to),
            kind,
        });
        self
    }

    pub fn epsilon(&mut self, from: StateId, to: StateId) -> &mut Self {
        self.add_transition(from, to, TransitionKind::Epsilon)
    }

    pub fn atom(&mut self, from: StateId, to: StateId, token_type: TokenType) -> &mut Self {
        self.add_transition(from, to, TransitionKind::Atom(token_type))
    }

    pub fn set(&mut self, from: StateId, to: StateId, set: IntervalSet) -> &mut Self {
        self.add_transition(from, to, TransitionKind::Set(set))
    }

    pub fn not_set(&mut self, from: StateId, to: StateId, set: IntervalSet) -> &mut Self {
        self.add_transition(from, to, TransitionKind::NotSet(set))
    }

    pub fn wildcard(&mut self, from: StateId, to: StateId) -> &mut Self {
        self.add_transition(from, to, TransitionKind::Wildcard)
    }

    /// Call `rule` from `from`, resuming at `follow_state`.
    pub fn rule_call(&mut self, from: StateId, rule: RuleIndex, follow_state: StateId) -> &mut Self {
        self.transitions.push(PendingTransition {
            from,
            to: None,
            kind: TransitionKind::Rule {
                rule_index: rule,
                follow_state,
            },
        });
        self
    }

    pub fn predicate(&mut self, from: StateId, to: StateId, predicate: PredicateId) -> &mut Self {
        self.add_transition(from, to, TransitionKind::Predicate(predicate))
    }

    /// Validate all references and freeze the automaton.
    pub fn build(self) -> Result<Automaton, GrammarError> {
        let mut states: Vec<State> = self
            .states
            .iter()
            .enumerate()
            .map(|(id, (kind, rule_index))| State {
                id,
                kind: *kind,
                rule_index: *rule_index,
                transitions: Vec::new(),
            })
            .collect();

        if let Some((_, rule)) = self.states.iter().find(|(_, rule)| *rule >= self.rules.len()) {
            return Err(GrammarError::UnknownRule(*rule));
        }

        let mut max_token_type = self.vocabulary.max_token_type();

        for pending in self.transitions {
            if pending.from >= states.len() {
                return Err(GrammarError::UnknownState(pending.from));
            }

            let target = match (&pending.kind, pending.to) {
                (
                    TransitionKind::Rule {
                        rule_index,
                        follow_state,
                    },
                    to,
                ) => {
                    let rule = self
                        .rules
                        .get(*rule_index)
                        .ok_or(GrammarError::UnknownRule(*rule_index))?;
                    if *follow_state >= states.len() {
                        return Err(GrammarError::UnknownState(*follow_state));
                    }
                    let target = to.unwrap_or(rule.start);
                    if target != rule.start {
                        return Err(GrammarError::NotARuleStart {
                            from: pending.from,
                            target,
                        });
                    }
                    target
                }
                (_, Some(to)) => to,
                (_, None) => return Err(GrammarError::UnknownState(pending.from)),
            };
            if target >= states.len() {
                return Err(GrammarError::UnknownState(target));
            }

            match &pending.kind {
                TransitionKind::Atom(token_type) => max_token_type = max_token_type.max(*token_type),
                TransitionKind::Set(set) | TransitionKind::NotSet(set) => {
                    if let Some(last) = set.intervals().last() {
                        max_token_type = max_token_type.max(last.end);
                    }
                }
                _ => {}
            }

            states[pending.from].transitions.push(Transition {
                target,
                kind: pending.kind,
            });
        }

        let automaton = Automaton {
            id: self.id.unwrap_or_else(AutomatonId::unique),
            states,
            rules: self.rules,
            vocabulary: self.vocabulary,
            max_token_type: self.max_token_type.unwrap_or(max_token_type),
        };

        tracing::debug!(
            id = automaton.id.raw(),
            states = automaton.states.len(),
            rules = automaton.rules.len(),
            "automaton built"
        );
        Ok(automaton)
    }

    fn push_state(&mut self, rule: RuleIndex, kind: StateKind) -> StateId {
        self.states.push((kind, rule));
        self.states.len() - 1
    }
}
