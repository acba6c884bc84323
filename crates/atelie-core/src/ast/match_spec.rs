//! Decoded form of a routing rule's `match_json`
//!
//! Rules are stored as JSON and come in two dialects. Decoding happens once,
//! up front, into [`MatchSpec`] so the evaluator never has to sniff keys.

use super::expression::Expression;
use serde::{Deserialize, Serialize};

/// Variables an expression rule may reference
pub const EXPRESSION_VARIABLES: &[&str] = &["country", "cep", "cepDigits", "orderTotal", "attributes"];

/// Tagged routing predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dialect", rename_all = "snake_case")]
pub enum MatchSpec {
    /// `{"expression": "..."}`
    Expression(ExpressionRule),
    /// `{"country": .., "cep_prefix": [..], "min_total": ..}`
    Legacy(LegacyRule),
    /// Anything that is not a usable JSON object
    Invalid { reason: String },
}

/// Expression dialect rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionRule {
    /// Expression text as stored
    pub source: String,
    pub body: ExpressionBody,
}

/// Result of compiling the expression text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionBody {
    Parsed(Expression),
    /// The text could not be parsed; carries the parser message
    Unparsable(String),
}

/// Legacy dialect rule. Absent fields are always satisfied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyRule {
    pub country: Option<String>,
    pub cep_prefixes: Option<Vec<String>>,
    pub min_total: Option<f64>,
}

impl LegacyRule {
    /// True when the rule constrains nothing and therefore always matches
    pub fn is_unconstrained(&self) -> bool {
        self.country.is_none() && self.cep_prefixes.is_none() && self.min_total.is_none()
    }
}

impl MatchSpec {
    pub fn invalid(reason: impl Into<String>) -> Self {
        MatchSpec::Invalid {
            reason: reason.into(),
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, MatchSpec::Invalid { .. })
    }
}
