//! Rule Playground
//!
//! Evaluates expression and legacy rules against a handful of contexts and
//! prints the reason code of every decision, including broken rules.
//!
//! Run with `cargo run --example rule_playground`.

use atelie_core::RouteContext;
use atelie_runtime::RuleMatcher;

fn main() {
    let rules = [
        r#"{"country": "BR", "cep_prefix": ["010", "011"], "min_total": 100}"#,
        r#"{"expression": "country == 'BR' && orderTotal >= 300"}"#,
        r#"{"expression": "cepDigits starts_with '9' or attributes.channel == 'app'"}"#,
        r#"{"expression": "attributes.tags contains 'fragile'"}"#,
        r#"{"expression": "orderTotal > "}"#,
        r#"{"expression": "cep > 10"}"#,
        r#"{}"#,
        r#"["not", "an", "object"]"#,
    ];

    let contexts = [
        RouteContext::new("BR", "01001-000", 150.0),
        RouteContext::new("BR", "90010-000", 450.0).with_attribute("channel", "app"),
        RouteContext::new("US", "10001", 50.0),
    ];

    let matcher = RuleMatcher::new();
    for ctx in &contexts {
        println!(
            "=== country={} cep={} total={:.2} ===",
            ctx.country, ctx.cep, ctx.order_total
        );
        for rule in &rules {
            let result = matcher.matches(ctx, rule);
            let mark = if result.matched { "MATCH" } else { "-----" };
            println!("  {} {:<20} {}", mark, result.reason, rule);
            if let Some(detail) = &result.detail {
                println!("        {}", detail);
            }
        }
        println!();
    }
}
