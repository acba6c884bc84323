//! Decoder for a routing rule's `match_json`
//!
//! Decoding is total: every input becomes a [`MatchSpec`], with unusable
//! documents mapped to `MatchSpec::Invalid` instead of an error.

use crate::error::{ParseError, Result};
use crate::expression_parser::ExpressionParser;
use atelie_core::ast::{ExpressionBody, ExpressionRule, LegacyRule, MatchSpec, EXPRESSION_VARIABLES};
use serde_json::{Map, Value as JsonValue};

const EXPRESSION_KEY: &str = "expression";
const LEGACY_KEYS: &[&str] = &["country", "cep_prefix", "min_total"];

/// Rule document decoder
pub struct MatchParser;

impl MatchParser {
    /// Decode `match_json` into its tagged dialect
    pub fn parse(match_json: &str) -> MatchSpec {
        let document: JsonValue = match serde_json::from_str(match_json.trim()) {
            Ok(doc) => doc,
            Err(e) => return MatchSpec::invalid(format!("malformed JSON: {}", e)),
        };

        let Some(object) = document.as_object() else {
            return MatchSpec::invalid("match_json must be a JSON object");
        };

        if let Some(expression) = object.get(EXPRESSION_KEY) {
            return match expression.as_str() {
                Some(source) => MatchSpec::Expression(Self::compile_expression(source)),
                None => MatchSpec::invalid("'expression' must be a string"),
            };
        }

        match Self::decode_legacy(object) {
            Ok(rule) => MatchSpec::Legacy(rule),
            Err(e) => MatchSpec::invalid(e.to_string()),
        }
    }

    fn compile_expression(source: &str) -> ExpressionRule {
        let body = match ExpressionParser::parse(source) {
            Ok(expr) => {
                for root in expr.root_variables() {
                    if !EXPRESSION_VARIABLES.contains(&root) {
                        tracing::debug!(
                            "Expression '{}' references unknown variable '{}', it will evaluate to null",
                            source,
                            root
                        );
                    }
                }
                ExpressionBody::Parsed(expr)
            }
            Err(e) => ExpressionBody::Unparsable(e.to_string()),
        };

        ExpressionRule {
            source: source.to_string(),
            body,
        }
    }

    fn decode_legacy(object: &Map<String, JsonValue>) -> Result<LegacyRule> {
        for key in object.keys() {
            if !LEGACY_KEYS.contains(&key.as_str()) {
                tracing::debug!("Ignoring unknown legacy rule field '{}'", key);
            }
        }

        Ok(LegacyRule {
            country: Self::country(object.get("country"))?,
            cep_prefixes: Self::cep_prefixes(object.get("cep_prefix"))?,
            min_total: Self::min_total(object.get("min_total"))?,
        })
    }

    fn country(value: Option<&JsonValue>) -> Result<Option<String>> {
        match value {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(invalid("country", format!("expected a string, got {}", other))),
        }
    }

    /// A list of prefixes, or a single (comma separated) string. An empty
    /// list constrains nothing.
    fn cep_prefixes(value: Option<&JsonValue>) -> Result<Option<Vec<String>>> {
        let prefixes: Vec<String> = match value {
            None | Some(JsonValue::Null) => return Ok(None),
            Some(JsonValue::String(s)) => s.split(',').map(str::to_string).collect(),
            Some(JsonValue::Array(items)) => items
                .iter()
                .map(|item| match item {
                    JsonValue::String(s) => Ok(s.clone()),
                    JsonValue::Number(n) => Ok(n.to_string()),
                    other => Err(invalid("cep_prefix", format!("unsupported prefix {}", other))),
                })
                .collect::<Result<_>>()?,
            Some(other) => {
                return Err(invalid("cep_prefix", format!("expected a list, got {}", other)))
            }
        };

        let prefixes: Vec<String> = prefixes
            .iter()
            .map(|p| atelie_core::model::digits_only(p))
            .filter(|p| !p.is_empty())
            .collect();

        Ok(if prefixes.is_empty() { None } else { Some(prefixes) })
    }

    fn min_total(value: Option<&JsonValue>) -> Result<Option<f64>> {
        match value {
            None | Some(JsonValue::Null) => Ok(None),
            Some(JsonValue::Number(n)) => n
                .as_f64()
                .map(Some)
                .ok_or_else(|| invalid("min_total", "number out of range")),
            Some(JsonValue::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| invalid("min_total", format!("'{}' is not a number", s))),
            Some(other) => Err(invalid("min_total", format!("expected a number, got {}", other))),
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ParseError {
    ParseError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}
