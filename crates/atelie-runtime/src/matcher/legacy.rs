//! Legacy rule dialect: country, CEP prefix and minimum total checked in order

use atelie_core::ast::LegacyRule;
use atelie_core::{MatchReason, RouteContext, RuleMatch};

/// Check each present constraint; the first failing one names the reason
pub(crate) fn evaluate(ctx: &RouteContext, rule: &LegacyRule) -> RuleMatch {
    if let Some(country) = &rule.country {
        if *country != ctx.country {
            return RuleMatch::mismatch(MatchReason::CountryMismatch)
                .with_detail(format!("expected {}, got {}", country, ctx.country));
        }
    }

    if let Some(prefixes) = &rule.cep_prefixes {
        let cep = ctx.cep_digits();
        if !prefixes.iter().any(|prefix| cep.starts_with(prefix.as_str())) {
            return RuleMatch::mismatch(MatchReason::CepPrefixMismatch);
        }
    }

    if let Some(min_total) = rule.min_total {
        if ctx.order_total < min_total {
            return RuleMatch::mismatch(MatchReason::MinTotalMismatch)
                .with_detail(format!("{} < {}", ctx.order_total, min_total));
        }
    }

    RuleMatch::matched(MatchReason::LegacyMatched)
}
