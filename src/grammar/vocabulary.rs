//! Token type names.

use smol_str::SmolStr;

use super::token::{EOF, EPSILON, TokenType};

/// Literal (`'state'`) and symbolic (`ID`) names per token type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vocabulary {
    literal_names: Vec<Option<SmolStr>>,
    symbolic_names: Vec<Option<SmolStr>>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`define`](Self::define).
    pub fn with_token(
        mut self,
        token_type: TokenType,
        literal: Option<&str>,
        symbolic: Option<&str>,
    ) -> Self {
        self.define(token_type, literal, symbolic);
        self
    }

    /// Set the names of a token type. Reserved (non-positive) types are ignored.
    pub fn define(&mut self, token_type: TokenType, literal: Option<&str>, symbolic: Option<&str>) {
        let Some(index) = Self::slot(token_type) else {
            return;
        };
        if self.literal_names.len() <= index {
            self.literal_names.resize(index + 1, None);
            self.symbolic_names.resize(index + 1, None);
        }
        self.literal_names[index] = literal.map(SmolStr::from);
        self.symbolic_names[index] = symbolic.map(SmolStr::from);
    }

    pub fn literal_name(&self, token_type: TokenType) -> Option<&str> {
        let index = Self::slot(token_type)?;
        self.literal_names.get(index)?.as_deref()
    }

    pub fn symbolic_name(&self, token_type: TokenType) -> Option<&str> {
        let index = Self::slot(token_type)?;
        self.symbolic_names.get(index)?.as_deref()
    }

    /// Literal name if any, then symbolic name, then the number itself.
    pub fn display_name(&self, token_type: TokenType) -> SmolStr {
        match token_type {
            EOF => SmolStr::new_static("<EOF>"),
            EPSILON => SmolStr::new_static("<EPSILON>"),
            _ => self
                .literal_name(token_type)
                .or_else(|| self.symbolic_name(token_type))
                .map(SmolStr::from)
                .unwrap_or_else(|| SmolStr::from(token_type.to_string())),
        }
    }

    /// Token type with the given literal or symbolic name.
    pub fn token_type(&self, name: &str) -> Option<TokenType> {
        let matches = |names: &[Option<SmolStr>]| names.iter().position(|n| n.as_deref() == Some(name));
        matches(&self.literal_names)
            .or_else(|| matches(&self.symbolic_names))
            .and_then(|index| TokenType::try_from(index).ok())
    }

    /// Highest defined token type, 0 when empty.
    pub fn max_token_type(&self) -> TokenType {
        TokenType::try_from(self.literal_names.len().saturating_sub(1)).unwrap_or(TokenType::MAX)
    }

    fn slot(token_type: TokenType) -> Option<usize> {
        usize::try_from(token_type).ok().filter(|index| *index > 0)
    }
}
