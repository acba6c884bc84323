//! Outcome of evaluating one rule against a context

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed vocabulary of rule evaluation diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    SpelMatched,
    SpelMismatch,
    /// Expression could not be parsed or evaluated
    SpelError,
    CountryMismatch,
    CepPrefixMismatch,
    MinTotalMismatch,
    LegacyMatched,
    InvalidMatchJson,
}

impl MatchReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchReason::SpelMatched => "spel_matched",
            MatchReason::SpelMismatch => "spel_mismatch",
            MatchReason::SpelError => "spel_error",
            MatchReason::CountryMismatch => "country_mismatch",
            MatchReason::CepPrefixMismatch => "cep_prefix_mismatch",
            MatchReason::MinTotalMismatch => "min_total_mismatch",
            MatchReason::LegacyMatched => "legacy_matched",
            MatchReason::InvalidMatchJson => "invalid_match_json",
        }
    }

    /// Broken rules, as opposed to rules that merely said no
    pub fn is_rule_defect(&self) -> bool {
        matches!(self, MatchReason::SpelError | MatchReason::InvalidMatchJson)
    }
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{matched, reason}` pair produced for every rule evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMatch {
    pub matched: bool,
    pub reason: MatchReason,
    /// Human readable detail for defects (parser message, offending type)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl RuleMatch {
    pub fn matched(reason: MatchReason) -> Self {
        Self {
            matched: true,
            reason,
            detail: None,
        }
    }

    pub fn mismatch(reason: MatchReason) -> Self {
        Self {
            matched: false,
            reason,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
