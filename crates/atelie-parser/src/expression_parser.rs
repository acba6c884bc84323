//! Expression parser
//!
//! Parses rule expression strings into Expression AST nodes.
//!
//! Supported syntax:
//! - Variables and paths: `country`, `#orderTotal`, `attributes.channel`, `attributes['gift-wrap']`
//! - Literals: `42`, `3.5`, `'BR'`, `"BR"`, `true`, `false`, `null`, `['010', '011']`, `{'SP', 'RJ'}`
//! - Logical operators: `||`, `or`, `&&`, `and`, `!`, `not`
//! - Keyword operators: `in`, `not in`, `contains`, `starts_with`, `ends_with`, `matches`
//! - Method style: `cep.startsWith('010')`, `attributes.tags.contains('fragile')`
//! - Comparison: `==`, `!=`, `<`, `<=`, `>`, `>=`
//! - Arithmetic: `+`, `-`, `*`, `/`, `%`
//! - Parentheses for grouping: `(a || b) && c`

use crate::error::{ParseError, Result};
use atelie_core::ast::{Expression, Operator, UnaryOperator};
use atelie_core::Value;

#[derive(Clone, Copy)]
enum Token {
    Symbol,
    Word,
}

type OpSpec = (&'static str, Operator, Token);

const LOGICAL_OR: &[OpSpec] = &[("||", Operator::Or, Token::Symbol), ("or", Operator::Or, Token::Word)];

const LOGICAL_AND: &[OpSpec] = &[("&&", Operator::And, Token::Symbol), ("and", Operator::And, Token::Word)];

const KEYWORD: &[OpSpec] = &[
    ("contains", Operator::Contains, Token::Word),
    ("starts_with", Operator::StartsWith, Token::Word),
    ("ends_with", Operator::EndsWith, Token::Word),
    ("matches", Operator::Regex, Token::Word),
    ("not_in", Operator::NotIn, Token::Word),
    ("in", Operator::In, Token::Word),
];

const COMPARISON: &[OpSpec] = &[
    ("==", Operator::Eq, Token::Symbol),
    ("!=", Operator::Ne, Token::Symbol),
    ("<=", Operator::Le, Token::Symbol),
    (">=", Operator::Ge, Token::Symbol),
    ("<", Operator::Lt, Token::Symbol),
    (">", Operator::Gt, Token::Symbol),
];

const ADDITIVE: &[OpSpec] = &[("+", Operator::Add, Token::Symbol), ("-", Operator::Sub, Token::Symbol)];

const MULTIPLICATIVE: &[OpSpec] = &[
    ("*", Operator::Mul, Token::Symbol),
    ("/", Operator::Div, Token::Symbol),
    ("%", Operator::Mod, Token::Symbol),
];

/// Binary operator levels, lowest precedence first
const LEVELS: &[&[OpSpec]] = &[LOGICAL_OR, LOGICAL_AND, KEYWORD, COMPARISON, ADDITIVE, MULTIPLICATIVE];

struct Split<'a> {
    left: &'a str,
    op: Operator,
    symbol: &'static str,
    right: &'a str,
}

/// Expression parser
pub struct ExpressionParser;

impl ExpressionParser {
    /// Parse an expression from a string
    pub fn parse(input: &str) -> Result<Expression> {
        let input = input.trim();

        if input.is_empty() {
            return Err(ParseError::InvalidExpression("Empty expression".to_string()));
        }

        Self::parse_level(input, 0)
    }

    /// Parse at a precedence level, falling through to tighter levels when
    /// no operator of this level appears at the top level of `input`.
    fn parse_level(input: &str, level: usize) -> Result<Expression> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::InvalidExpression("Empty operand".to_string()));
        }

        let Some(ops) = LEVELS.get(level) else {
            return Self::parse_unary(input);
        };

        let mask = top_level_mask(input)?;
        match split_rightmost(input, &mask, ops) {
            Some(split) => {
                if split.left.is_empty() || split.right.is_empty() {
                    return Err(ParseError::MissingOperand(split.symbol.to_string()));
                }
                // Rightmost split keeps operators left-associative
                Ok(Expression::binary(
                    Self::parse_level(split.left, level)?,
                    split.op,
                    Self::parse_level(split.right, level + 1)?,
                ))
            }
            None => Self::parse_level(input, level + 1),
        }
    }

    fn parse_unary(input: &str) -> Result<Expression> {
        let input = input.trim();

        if let Some(rest) = input.strip_prefix('!') {
            return Ok(Expression::unary(UnaryOperator::Not, Self::parse_unary(rest)?));
        }

        if let Some(rest) = strip_keyword_prefix(input, "not") {
            return Ok(Expression::unary(UnaryOperator::Not, Self::parse_unary(rest)?));
        }

        if let Some(rest) = input.strip_prefix('-') {
            if let Some(num) = parse_number(input) {
                return Ok(Expression::literal(Value::Number(num)));
            }
            return Ok(Expression::unary(UnaryOperator::Negate, Self::parse_unary(rest)?));
        }

        Self::parse_primary(input)
    }

    /// Parse a primary expression
    fn parse_primary(input: &str) -> Result<Expression> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::InvalidExpression("Empty operand".to_string()));
        }

        let mask = top_level_mask(input)?;
        let first = input.as_bytes()[0];

        // Parentheses and list literals
        if is_wrapped(input, &mask) {
            let inner = &input[1..input.len() - 1];
            match first {
                b'(' => return Self::parse_level(inner, 0),
                _ => return Ok(Expression::list(Self::parse_items(inner)?)),
            }
        }

        if first == b'\'' || first == b'"' {
            return Ok(Expression::literal(Value::String(parse_string_literal(input)?)));
        }

        if input.eq_ignore_ascii_case("true") {
            return Ok(Expression::literal(Value::Bool(true)));
        }
        if input.eq_ignore_ascii_case("false") {
            return Ok(Expression::literal(Value::Bool(false)));
        }
        if input.eq_ignore_ascii_case("null") {
            return Ok(Expression::literal(Value::Null));
        }

        if let Some(num) = parse_number(input) {
            return Ok(Expression::literal(Value::Number(num)));
        }

        if input.ends_with(')') {
            return Self::parse_method_call(input, &mask);
        }

        Ok(Expression::field_access(parse_path(input)?))
    }

    /// `target.method(arg)` for the string methods that map onto operators
    fn parse_method_call(input: &str, mask: &[bool]) -> Result<Expression> {
        let bytes = input.as_bytes();
        let close = input.len() - 1;

        let open = (0..close)
            .rev()
            .find(|&i| mask[i] && bytes[i] == b'(')
            .ok_or_else(|| ParseError::InvalidExpression(format!("Cannot parse: {}", input)))?;

        let dot = (0..open)
            .rev()
            .find(|&i| mask[i] && bytes[i] == b'.')
            .ok_or_else(|| ParseError::UnsupportedMethod(input[..open].trim().to_string()))?;

        let method = input[dot + 1..open].trim();
        let op = match method {
            "startsWith" | "starts_with" => Operator::StartsWith,
            "endsWith" | "ends_with" => Operator::EndsWith,
            "contains" => Operator::Contains,
            "matches" => Operator::Regex,
            other => return Err(ParseError::UnsupportedMethod(other.to_string())),
        };

        let mut args = Self::parse_items(&input[open + 1..close])?;
        if args.len() != 1 {
            return Err(ParseError::InvalidExpression(format!(
                "'{}' takes exactly one argument, got {}",
                method,
                args.len()
            )));
        }

        let target = Self::parse_primary(&input[..dot])?;
        Ok(Expression::binary(target, op, args.remove(0)))
    }

    /// Comma separated expressions (list literal body or method arguments)
    fn parse_items(inner: &str) -> Result<Vec<Expression>> {
        if inner.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mask = top_level_mask(inner)?;
        let bytes = inner.as_bytes();
        let mut items = Vec::new();
        let mut start = 0;

        for i in 0..inner.len() {
            if mask[i] && bytes[i] == b',' {
                items.push(Self::parse_level(&inner[start..i], 0)?);
                start = i + 1;
            }
        }
        items.push(Self::parse_level(&inner[start..], 0)?);

        Ok(items)
    }
}

/// Mark byte offsets that sit outside string literals and brackets.
///
/// Opening and closing brackets of top-level groups are marked too; quote
/// characters never are. Also validates delimiter balance.
fn top_level_mask(input: &str) -> Result<Vec<bool>> {
    let mut mask = vec![false; input.len()];
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut quote: Option<(char, usize)> = None;

    for (i, c) in input.char_indices() {
        if let Some((q, _)) = quote {
            if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' => quote = Some((c, i)),
            '(' | '[' | '{' => {
                if stack.is_empty() {
                    mask[i] = true;
                }
                stack.push((c, i));
            }
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((open, _)) if open == expected => {}
                    _ => {
                        return Err(ParseError::UnbalancedDelimiter {
                            delimiter: c,
                            offset: i,
                        })
                    }
                }
                if stack.is_empty() {
                    mask[i] = true;
                }
            }
            _ => {
                if stack.is_empty() {
                    mask[i] = true;
                }
            }
        }
    }

    if let Some((_, start)) = quote {
        return Err(ParseError::UnterminatedString(start));
    }
    if let Some((delimiter, offset)) = stack.pop() {
        return Err(ParseError::UnbalancedDelimiter { delimiter, offset });
    }

    Ok(mask)
}

/// Find the rightmost top-level operator of one precedence level
fn split_rightmost<'a>(input: &'a str, mask: &[bool], ops: &[OpSpec]) -> Option<Split<'a>> {
    let bytes = input.as_bytes();

    for i in (0..input.len()).rev() {
        if !mask[i] {
            continue;
        }

        for &(symbol, op, token) in ops {
            let end = i + symbol.len();
            if end > input.len() || !input.is_char_boundary(end) {
                continue;
            }
            if !input[i..end].eq_ignore_ascii_case(symbol) || !mask[i..end].iter().all(|m| *m) {
                continue;
            }

            let valid = match token {
                Token::Symbol => symbol_boundary(bytes, i, end, symbol),
                Token::Word => word_boundary(bytes, i, end),
            };
            if !valid {
                continue;
            }

            let mut left = &input[..i];
            let mut op = op;
            if op == Operator::In {
                if let Some(stripped) = strip_trailing_not(left) {
                    left = stripped;
                    op = Operator::NotIn;
                }
            }

            return Some(Split {
                left: left.trim(),
                op,
                symbol,
                right: input[end..].trim(),
            });
        }
    }

    None
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b'#'
}

fn word_boundary(bytes: &[u8], start: usize, end: usize) -> bool {
    (start == 0 || !is_ident_byte(bytes[start - 1])) && (end >= bytes.len() || !is_ident_byte(bytes[end]))
}

fn symbol_boundary(bytes: &[u8], start: usize, end: usize, symbol: &str) -> bool {
    if symbol == "+" || symbol == "-" {
        // Binary only when something that ends an operand precedes it
        return bytes[..start]
            .iter()
            .rev()
            .find(|b| !b.is_ascii_whitespace())
            .is_some_and(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b')' | b']' | b'}' | b'\'' | b'"'));
    }

    let prev_ok = start == 0 || !matches!(bytes[start - 1], b'=' | b'<' | b'>' | b'!' | b'&' | b'|');
    let next_ok = end >= bytes.len() || !matches!(bytes[end], b'=' | b'&' | b'|');
    prev_ok && next_ok
}

/// `left` ends with a standalone `not`, turning `in` into `not in`
fn strip_trailing_not(left: &str) -> Option<&str> {
    let trimmed = left.trim_end();
    let len = trimmed.len();
    if len < 3 || !trimmed.is_char_boundary(len - 3) || !trimmed[len - 3..].eq_ignore_ascii_case("not") {
        return None;
    }
    if len > 3 && is_ident_byte(trimmed.as_bytes()[len - 4]) {
        return None;
    }
    Some(&trimmed[..len - 3])
}

fn strip_keyword_prefix<'a>(input: &'a str, keyword: &str) -> Option<&'a str> {
    let len = keyword.len();
    if input.len() <= len || !input.is_char_boundary(len) || !input[..len].eq_ignore_ascii_case(keyword) {
        return None;
    }
    if is_ident_byte(input.as_bytes()[len]) {
        return None;
    }
    Some(&input[len..])
}

fn parse_number(input: &str) -> Option<f64> {
    let digits = input.strip_prefix('-').unwrap_or(input);
    let starts_numeric = digits
        .as_bytes()
        .first()
        .is_some_and(|b| b.is_ascii_digit() || *b == b'.');
    if !starts_numeric {
        return None;
    }
    input.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Unquote a string literal. Backslashes are kept as-is so regex patterns
/// survive; a doubled quote stands for one quote character.
fn parse_string_literal(input: &str) -> Result<String> {
    let mut chars = input.chars();
    let quote = chars.next().unwrap_or('\'');
    if input.len() < 2 || !input.ends_with(quote) {
        return Err(ParseError::UnterminatedString(0));
    }

    let inner = &input[1..input.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut iter = inner.chars().peekable();

    while let Some(c) = iter.next() {
        if c == quote {
            if iter.peek() == Some(&quote) {
                iter.next();
                out.push(quote);
            } else {
                return Err(ParseError::InvalidExpression(format!("Cannot parse: {}", input)));
            }
        } else {
            out.push(c);
        }
    }

    Ok(out)
}

/// True when the first byte opens a group whose matching closer is the last byte
fn is_wrapped(input: &str, mask: &[bool]) -> bool {
    let bytes = input.as_bytes();
    let last = bytes.len() - 1;
    let pair_ok = matches!(
        (bytes[0], bytes[last]),
        (b'(', b')') | (b'[', b']') | (b'{', b'}')
    );
    pair_ok && last > 0 && mask[1..last].iter().all(|m| !m)
}

/// Parse `root.field['key'][0]` into path segments; a leading `#` is ignored
fn parse_path(input: &str) -> Result<Vec<String>> {
    let path = input.strip_prefix('#').unwrap_or(input);
    let bytes = path.as_bytes();
    let invalid = || ParseError::InvalidExpression(format!("Cannot parse: {}", input));

    let mut segments = Vec::new();
    let mut expect_segment = true;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'.' => {
                if expect_segment {
                    return Err(invalid());
                }
                expect_segment = true;
                i += 1;
            }
            b'[' => {
                if segments.is_empty() || expect_segment {
                    return Err(invalid());
                }
                let (segment, next) = parse_index(path, i)?;
                segments.push(segment);
                i = next;
            }
            b if expect_segment && (b.is_ascii_alphabetic() || b == b'_') => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                segments.push(path[start..i].to_string());
                expect_segment = false;
            }
            _ => return Err(invalid()),
        }
    }

    if expect_segment {
        return Err(invalid());
    }

    Ok(segments)
}

/// Parse a bracket index starting at `open`; returns the key and the offset after `]`
fn parse_index(path: &str, open: usize) -> Result<(String, usize)> {
    let rest = &path[open + 1..];
    let trimmed = rest.trim_start();
    let unbalanced = ParseError::UnbalancedDelimiter {
        delimiter: '[',
        offset: open,
    };

    if let Some(quote) = trimmed.chars().next().filter(|c| *c == '\'' || *c == '"') {
        let body = &trimmed[1..];
        let end_quote = body
            .find(quote)
            .ok_or(ParseError::UnterminatedString(open + 1))?;
        let key = body[..end_quote].to_string();
        let after = body[end_quote + 1..].trim_start();
        if !after.starts_with(']') {
            return Err(unbalanced);
        }
        return Ok((key, path.len() - after.len() + 1));
    }

    let close = trimmed.find(']').ok_or(unbalanced)?;
    let key = trimmed[..close].trim();
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidExpression(format!("Invalid index: [{}]", key)));
    }
    Ok((key.to_string(), path.len() - trimmed.len() + close + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(path: &[&str]) -> Expression {
        Expression::field_access(path.iter().map(|s| s.to_string()).collect())
    }

    fn string(s: &str) -> Expression {
        Expression::literal(Value::String(s.to_string()))
    }

    #[test]
    fn test_parse_single_quoted_comparison() {
        let expr = ExpressionParser::parse("country == 'BR'").unwrap();
        assert_eq!(expr, Expression::binary(field(&["country"]), Operator::Eq, string("BR")));
    }

    #[test]
    fn test_parse_variable_alias() {
        let expr = ExpressionParser::parse("#orderTotal >= 300").unwrap();
        assert_eq!(
            expr,
            Expression::binary(
                field(&["orderTotal"]),
                Operator::Ge,
                Expression::literal(Value::Number(300.0))
            )
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = ExpressionParser::parse("a || b && c").unwrap();
        assert_eq!(
            expr,
            Expression::binary(
                field(&["a"]),
                Operator::Or,
                Expression::binary(field(&["b"]), Operator::And, field(&["c"]))
            )
        );
    }

    #[test]
    fn test_word_logical_operators() {
        let expr = ExpressionParser::parse("country == 'BR' and not attributes.vip").unwrap();
        match expr {
            Expression::Binary { op, right, .. } => {
                assert_eq!(op, Operator::And);
                assert_eq!(
                    *right,
                    Expression::unary(UnaryOperator::Not, field(&["attributes", "vip"]))
                );
            }
            other => panic!("Expected Binary, got {:?}", other),
        }
    }

    #[test]
    fn test_identifiers_containing_keywords() {
        let expr = ExpressionParser::parse("attributes.brand == 'order'").unwrap();
        assert_eq!(
            expr,
            Expression::binary(field(&["attributes", "brand"]), Operator::Eq, string("order"))
        );
    }

    #[test]
    fn test_parse_in_and_not_in() {
        let expr = ExpressionParser::parse("country in ['BR', 'PT']").unwrap();
        assert_eq!(
            expr,
            Expression::binary(
                field(&["country"]),
                Operator::In,
                Expression::list(vec![string("BR"), string("PT")])
            )
        );

        let expr = ExpressionParser::parse("country not in {'US'}").unwrap();
        assert!(matches!(expr, Expression::Binary { op: Operator::NotIn, .. }));
    }

    #[test]
    fn test_parse_method_style_calls() {
        let expr = ExpressionParser::parse("cepDigits.startsWith('010')").unwrap();
        assert_eq!(
            expr,
            Expression::binary(field(&["cepDigits"]), Operator::StartsWith, string("010"))
        );

        let expr = ExpressionParser::parse("attributes.email.matches('.*@atelie\\.com')").unwrap();
        assert!(matches!(expr, Expression::Binary { op: Operator::Regex, .. }));
    }

    #[test]
    fn test_parse_bracket_access() {
        let expr = ExpressionParser::parse("attributes['gift-wrap'] == true").unwrap();
        assert_eq!(
            expr,
            Expression::binary(
                field(&["attributes", "gift-wrap"]),
                Operator::Eq,
                Expression::literal(Value::Bool(true))
            )
        );
    }

    #[test]
    fn test_operators_inside_strings_are_ignored() {
        let expr = ExpressionParser::parse("attributes.note == 'a && b || c'").unwrap();
        assert_eq!(
            expr,
            Expression::binary(field(&["attributes", "note"]), Operator::Eq, string("a && b || c"))
        );
    }

    #[test]
    fn test_doubled_quote_escape() {
        let expr = ExpressionParser::parse("attributes.shop == 'Maria''s'").unwrap();
        assert_eq!(
            expr,
            Expression::binary(field(&["attributes", "shop"]), Operator::Eq, string("Maria's"))
        );
    }

    #[test]
    fn test_arithmetic_precedence_and_negatives() {
        let expr = ExpressionParser::parse("orderTotal * 2 - -10 > 100").unwrap();
        match expr {
            Expression::Binary { left, op: Operator::Gt, .. } => match *left {
                Expression::Binary { left: inner, op: Operator::Sub, right } => {
                    assert!(matches!(*inner, Expression::Binary { op: Operator::Mul, .. }));
                    assert_eq!(*right, Expression::literal(Value::Number(-10.0)));
                }
                other => panic!("Expected subtraction, got {:?}", other),
            },
            other => panic!("Expected comparison, got {:?}", other),
        }
    }

    #[test]
    fn test_parenthesized_grouping() {
        let expr = ExpressionParser::parse("(a || b) && c").unwrap();
        assert_eq!(
            expr,
            Expression::binary(
                Expression::binary(field(&["a"]), Operator::Or, field(&["b"])),
                Operator::And,
                field(&["c"])
            )
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ExpressionParser::parse("country == 'BR"),
            Err(ParseError::UnterminatedString(_))
        ));
        assert!(matches!(
            ExpressionParser::parse("(country == 'BR'"),
            Err(ParseError::UnbalancedDelimiter { .. })
        ));
        assert!(matches!(
            ExpressionParser::parse("== 'BR'"),
            Err(ParseError::MissingOperand(_))
        ));
        assert!(matches!(
            ExpressionParser::parse("lookup(country)"),
            Err(ParseError::UnsupportedMethod(_))
        ));
        assert!(ExpressionParser::parse("").is_err());
        assert!(ExpressionParser::parse("country ==== 'BR'").is_err());
        assert!(ExpressionParser::parse("1abc").is_err());
    }
}
