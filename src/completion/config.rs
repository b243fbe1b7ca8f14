//! Per-request completion settings.

use rustc_hash::FxHashSet;

use crate::grammar::{RuleIndex, TokenType};

/// Which tokens never to suggest and which rules to suggest by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompletionConfig {
    /// Token types never returned as candidates (structural tokens, trivia).
    pub ignored_tokens: FxHashSet<TokenType>,
    /// Rules surfaced as a rule candidate instead of their tokens.
    pub preferred_rules: FxHashSet<RuleIndex>,
}

impl CompletionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignored_token(mut self, token_type: TokenType) -> Self {
        self.ignored_tokens.insert(token_type);
        self
    }

    pub fn with_ignored_tokens(mut self, token_types: impl IntoIterator<Item = TokenType>) -> Self {
        self.ignored_tokens.extend(token_types);
        self
    }

    pub fn with_preferred_rule(mut self, rule: RuleIndex) -> Self {
        self.preferred_rules.insert(rule);
        self
    }

    pub fn with_preferred_rules(mut self, rules: impl IntoIterator<Item = RuleIndex>) -> Self {
        self.preferred_rules.extend(rules);
        self
    }

    pub fn is_ignored(&self, token_type: TokenType) -> bool {
        self.ignored_tokens.contains(&token_type)
    }

    pub fn is_preferred(&self, rule: RuleIndex) -> bool {
        self.preferred_rules.contains(&rule)
    }
}
