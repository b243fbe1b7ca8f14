//! Completion results.

use indexmap::IndexMap;
use indexmap::map::Entry;
use smol_str::SmolStr;

use crate::grammar::{Automaton, RuleIndex, TokenType, Vocabulary};

/// Tokens and rules that may appear at the caret.
///
/// Both maps iterate in discovery order, so identical inputs produce
/// identical, identically ordered results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidateSet {
    tokens: IndexMap<TokenType, Vec<TokenType>>,
    rules: IndexMap<RuleIndex, Vec<RuleIndex>>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidate tokens with the tokens that always follow them. An empty
    /// list means nothing certain follows (or the paths disagree).
    pub fn tokens(&self) -> &IndexMap<TokenType, Vec<TokenType>> {
        &self.tokens
    }

    /// Candidate rules with the enclosing rules that led to them, outermost
    /// first.
    pub fn rules(&self) -> &IndexMap<RuleIndex, Vec<RuleIndex>> {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.rules.is_empty()
    }

    pub fn contains_token(&self, token_type: TokenType) -> bool {
        self.tokens.contains_key(&token_type)
    }

    pub fn contains_rule(&self, rule: RuleIndex) -> bool {
        self.rules.contains_key(&rule)
    }

    /// Display names of the candidate tokens, each followed by its certain
    /// continuation, e.g. `'state' ID`.
    pub fn token_names(&self, vocabulary: &Vocabulary) -> Vec<SmolStr> {
        self.tokens
            .iter()
            .map(|(token_type, following)| {
                let mut name = vocabulary.display_name(*token_type).to_string();
                for next in following {
                    name.push(' ');
                    name.push_str(&vocabulary.display_name(*next));
                }
                SmolStr::from(name)
            })
            .collect()
    }

    /// Names of the candidate rules.
    pub fn rule_names(&self, automaton: &Automaton) -> Vec<SmolStr> {
        self.rules
            .keys()
            .map(|rule| {
                automaton
                    .rule_name(*rule)
                    .map(SmolStr::from)
                    .unwrap_or_else(|| SmolStr::from(rule.to_string()))
            })
            .collect()
    }

    /// Add a token candidate. The first path to reach a token sets its
    /// following list; a later path with a different list clears it.
    pub(crate) fn add_token(&mut self, token_type: TokenType, following: &[TokenType]) {
        match self.tokens.entry(token_type) {
            Entry::Vacant(entry) => {
                entry.insert(following.to_vec());
            }
            Entry::Occupied(mut entry) => {
                if entry.get().as_slice() != following {
                    entry.get_mut().clear();
                }
            }
        }
    }

    /// Add a rule candidate. The first path recorded for a rule is kept.
    /// Returns false if the rule was already present.
    pub(crate) fn add_rule(&mut self, rule: RuleIndex, path: &[RuleIndex]) -> bool {
        match self.rules.entry(rule) {
            Entry::Vacant(entry) => {
                entry.insert(path.to_vec());
                true
            }
            Entry::Occupied(_) => false,
        }
    }
}
