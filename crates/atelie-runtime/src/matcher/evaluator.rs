//! Expression evaluation against a [`RouteContext`]

use crate::error::{Result, RuntimeError};
use atelie_core::ast::{Expression, Operator, OperatorFamily, UnaryOperator};
use atelie_core::{RouteContext, Value};
use regex::Regex;
use std::cmp::Ordering;

/// Evaluates parsed expressions over one routing context
pub struct ExpressionEvaluator<'a> {
    ctx: &'a RouteContext,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(ctx: &'a RouteContext) -> Self {
        Self { ctx }
    }

    /// Evaluate a rule predicate; anything but a boolean result is an error
    pub fn evaluate_predicate(&self, expr: &Expression) -> Result<bool> {
        match self.evaluate(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::TypeError(format!(
                "expression must evaluate to a boolean, got {}",
                other.type_name()
            ))),
        }
    }

    pub fn evaluate(&self, expr: &Expression) -> Result<Value> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::FieldAccess(path) => Ok(self.lookup(path)),
            Expression::List(items) => items
                .iter()
                .map(|item| self.evaluate(item))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Expression::Unary { op, operand } => {
                let value = self.evaluate(operand)?;
                execute_unary(*op, &value)
            }
            Expression::Binary { left, op, right } => match op.family() {
                OperatorFamily::Boolean => self.evaluate_logical(left, *op, right),
                _ => {
                    let left = self.evaluate(left)?;
                    let right = self.evaluate(right)?;
                    execute_binary(&left, *op, &right)
                }
            },
        }
    }

    fn evaluate_logical(&self, left: &Expression, op: Operator, right: &Expression) -> Result<Value> {
        let left = as_condition(&self.evaluate(left)?, op)?;
        match (op, left) {
            (Operator::And, false) => Ok(Value::Bool(false)),
            (Operator::Or, true) => Ok(Value::Bool(true)),
            _ => {
                let right = as_condition(&self.evaluate(right)?, op)?;
                Ok(Value::Bool(right))
            }
        }
    }

    /// Resolve a variable path. Unknown variables and missing keys are null.
    fn lookup(&self, path: &[String]) -> Value {
        let Some((root, rest)) = path.split_first() else {
            return Value::Null;
        };

        if root == "attributes" {
            return match rest.split_first() {
                None => Value::Object(self.ctx.attributes.clone()),
                Some((key, deeper)) => self
                    .ctx
                    .attributes
                    .get(key)
                    .and_then(|value| value.get_path(deeper))
                    .cloned()
                    .unwrap_or(Value::Null),
            };
        }

        match self.ctx.variable(root) {
            Some(value) if rest.is_empty() => value,
            Some(value) => value.get_path(rest).cloned().unwrap_or(Value::Null),
            None => {
                tracing::debug!("Unknown variable '{}' evaluates to null", root);
                Value::Null
            }
        }
    }
}

fn as_condition(value: &Value, op: Operator) -> Result<bool> {
    value.as_bool().ok_or_else(|| {
        RuntimeError::TypeError(format!(
            "operands of '{}' must be boolean, got {}",
            op.symbol(),
            value.type_name()
        ))
    })
}

fn execute_unary(op: UnaryOperator, value: &Value) -> Result<Value> {
    match (op, value) {
        (UnaryOperator::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOperator::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
        (op, value) => Err(RuntimeError::TypeError(format!(
            "cannot apply {:?} to {}",
            op,
            value.type_name()
        ))),
    }
}

fn execute_binary(left: &Value, op: Operator, right: &Value) -> Result<Value> {
    match op.family() {
        OperatorFamily::Equality => Ok(Value::Bool((left == right) == (op == Operator::Eq))),
        OperatorFamily::Ordering => compare(left, op, right).map(Value::Bool),
        OperatorFamily::Arithmetic => arithmetic(left, op, right),
        OperatorFamily::Text => text_test(left, op, right).map(Value::Bool),
        OperatorFamily::Membership => membership(left, op, right).map(Value::Bool),
        OperatorFamily::Boolean => {
            let l = as_condition(left, op)?;
            let r = as_condition(right, op)?;
            Ok(Value::Bool(if op == Operator::And { l && r } else { l || r }))
        }
    }
}

/// Ordering comparison. A null operand compares false so rules over missing
/// attributes simply do not match.
fn compare(left: &Value, op: Operator, right: &Value) -> Result<bool> {
    let ordering = match (left, right) {
        (Value::Null, _) | (_, Value::Null) => {
            tracing::debug!("Null comparison {:?} {} {:?}, returning false", left, op.symbol(), right);
            return Ok(false);
        }
        (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => {
            return Err(RuntimeError::InvalidOperation(format!(
                "cannot compare {} and {} with '{}'",
                left.type_name(),
                right.type_name(),
                op.symbol()
            )))
        }
    };

    let Some(ordering) = ordering else {
        return Ok(false);
    };

    Ok(match op {
        Operator::Gt => ordering == Ordering::Greater,
        Operator::Ge => ordering != Ordering::Less,
        Operator::Lt => ordering == Ordering::Less,
        _ => ordering != Ordering::Greater,
    })
}

fn arithmetic(left: &Value, op: Operator, right: &Value) -> Result<Value> {
    match (left, op, right) {
        (Value::Number(l), Operator::Add, Value::Number(r)) => Ok(Value::Number(l + r)),
        (Value::Number(l), Operator::Sub, Value::Number(r)) => Ok(Value::Number(l - r)),
        (Value::Number(l), Operator::Mul, Value::Number(r)) => Ok(Value::Number(l * r)),
        (Value::Number(_), Operator::Div | Operator::Mod, Value::Number(r)) if *r == 0.0 => {
            Err(RuntimeError::DivisionByZero)
        }
        (Value::Number(l), Operator::Div, Value::Number(r)) => Ok(Value::Number(l / r)),
        (Value::Number(l), Operator::Mod, Value::Number(r)) => Ok(Value::Number(l % r)),

        // String concatenation
        (Value::String(_), Operator::Add, _) | (_, Operator::Add, Value::String(_))
            if !left.is_null() && !right.is_null() =>
        {
            match (left.to_display_string(), right.to_display_string()) {
                (Some(l), Some(r)) => Ok(Value::String(l + &r)),
                _ => Err(invalid_operands(left, op, right)),
            }
        }

        _ => Err(invalid_operands(left, op, right)),
    }
}

fn text_test(left: &Value, op: Operator, right: &Value) -> Result<bool> {
    match (left, op, right) {
        (Value::Null, _, _) => Ok(false),
        (Value::Array(items), Operator::Contains, needle) => Ok(items.contains(needle)),
        (Value::String(l), Operator::Contains, Value::String(r)) => Ok(l.contains(r.as_str())),
        (Value::String(l), Operator::StartsWith, Value::String(r)) => Ok(l.starts_with(r.as_str())),
        (Value::String(l), Operator::EndsWith, Value::String(r)) => Ok(l.ends_with(r.as_str())),
        (Value::String(l), Operator::Regex, Value::String(pattern)) => full_match(l, pattern),
        _ => Err(invalid_operands(left, op, right)),
    }
}

/// `matches` must cover the whole input, not just a substring of it
fn full_match(input: &str, pattern: &str) -> Result<bool> {
    let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| RuntimeError::InvalidRegex {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })?;
    Ok(regex.is_match(input))
}

fn membership(left: &Value, op: Operator, right: &Value) -> Result<bool> {
    let found = match right {
        Value::Array(items) => items.contains(left),
        Value::String(haystack) => match left {
            Value::String(needle) => haystack.contains(needle.as_str()),
            Value::Null => false,
            _ => return Err(invalid_operands(left, op, right)),
        },
        Value::Null => false,
        _ => return Err(invalid_operands(left, op, right)),
    };

    Ok(if op == Operator::NotIn { !found } else { found })
}

fn invalid_operands(left: &Value, op: Operator, right: &Value) -> RuntimeError {
    RuntimeError::InvalidOperation(format!(
        "cannot apply '{}' to {} and {}",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}
