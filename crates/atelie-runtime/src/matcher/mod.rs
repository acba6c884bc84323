//! Rule matching
//!
//! [`RuleMatcher`] answers whether a routing rule's `match_json` applies to a
//! [`RouteContext`]. It never fails: malformed documents, unparsable
//! expressions and evaluation errors all come back as a non-matching
//! [`RuleMatch`] with a reason code.

mod evaluator;
mod legacy;

pub use evaluator::ExpressionEvaluator;

use atelie_core::ast::{ExpressionBody, ExpressionRule, MatchSpec};
use atelie_core::{MatchReason, RouteContext, RuleMatch};
use atelie_parser::MatchParser;

/// Stateless rule evaluator, safe to share across threads
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleMatcher;

impl RuleMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Decode `match_json` and evaluate it against `ctx`
    ///
    /// # Example
    /// ```
    /// use atelie_core::{MatchReason, RouteContext};
    /// use atelie_runtime::RuleMatcher;
    ///
    /// let ctx = RouteContext::new("BR", "01001-000", 150.0);
    /// let result = RuleMatcher::new().matches(&ctx, r#"{"expression":"orderTotal > 100"}"#);
    ///
    /// assert!(result.matched);
    /// assert_eq!(result.reason, MatchReason::SpelMatched);
    /// ```
    pub fn matches(&self, ctx: &RouteContext, match_json: &str) -> RuleMatch {
        let spec = MatchParser::parse(match_json);
        let result = self.evaluate(ctx, &spec);

        tracing::trace!(
            "Rule {} -> matched={} reason={}",
            match_json,
            result.matched,
            result.reason
        );
        result
    }

    /// Evaluate an already decoded rule
    pub fn evaluate(&self, ctx: &RouteContext, spec: &MatchSpec) -> RuleMatch {
        match spec {
            MatchSpec::Expression(rule) => evaluate_expression(ctx, rule),
            MatchSpec::Legacy(rule) => legacy::evaluate(ctx, rule),
            MatchSpec::Invalid { reason } => {
                RuleMatch::mismatch(MatchReason::InvalidMatchJson).with_detail(reason.clone())
            }
        }
    }
}

fn evaluate_expression(ctx: &RouteContext, rule: &ExpressionRule) -> RuleMatch {
    let expr = match &rule.body {
        ExpressionBody::Parsed(expr) => expr,
        ExpressionBody::Unparsable(message) => {
            tracing::warn!("Unparsable rule expression '{}': {}", rule.source, message);
            return RuleMatch::mismatch(MatchReason::SpelError).with_detail(message.clone());
        }
    };

    match ExpressionEvaluator::new(ctx).evaluate_predicate(expr) {
        Ok(true) => RuleMatch::matched(MatchReason::SpelMatched),
        Ok(false) => RuleMatch::mismatch(MatchReason::SpelMismatch),
        Err(e) => {
            tracing::warn!("Rule expression '{}' failed: {}", rule.source, e);
            RuleMatch::mismatch(MatchReason::SpelError).with_detail(e.to_string())
        }
    }
}
