//! Expression AST nodes

use super::operator::Operator;
use crate::types::Value;
use serde::{Deserialize, Serialize};

/// Expression AST node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Literal value
    Literal(Value),

    /// Variable or nested field access (e.g., country, attributes.channel)
    FieldAccess(Vec<String>),

    /// List literal (e.g., ['010', '011'])
    List(Vec<Expression>),

    /// Binary operation
    Binary {
        left: Box<Expression>,
        op: Operator,
        right: Box<Expression>,
    },

    /// Unary operation
    Unary {
        op: UnaryOperator,
        operand: Box<Expression>,
    },
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// Logical NOT (! / not)
    Not,
    /// Arithmetic negation (-)
    Negate,
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: Value) -> Self {
        Expression::Literal(value)
    }

    /// Create a field access expression
    pub fn field_access(path: Vec<String>) -> Self {
        Expression::FieldAccess(path)
    }

    /// Create a list expression
    pub fn list(items: Vec<Expression>) -> Self {
        Expression::List(items)
    }

    /// Create a binary expression
    pub fn binary(left: Expression, op: Operator, right: Expression) -> Self {
        Expression::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Create a unary expression
    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        Expression::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    /// Names of the root variables referenced by this expression
    pub fn root_variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_roots(&mut names);
        names
    }

    fn collect_roots<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expression::Literal(_) => {}
            Expression::FieldAccess(path) => {
                if let Some(root) = path.first() {
                    if !names.contains(&root.as_str()) {
                        names.push(root);
                    }
                }
            }
            Expression::List(items) => items.iter().for_each(|i| i.collect_roots(names)),
            Expression::Binary { left, right, .. } => {
                left.collect_roots(names);
                right.collect_roots(names);
            }
            Expression::Unary { operand, .. } => operand.collect_roots(names),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_expression() {
        let expr = Expression::literal(Value::Number(42.0));
        assert_eq!(expr, Expression::Literal(Value::Number(42.0)));
    }

    #[test]
    fn test_binary_expression() {
        let expr = Expression::binary(
            Expression::field_access(vec!["orderTotal".to_string()]),
            Operator::Ge,
            Expression::literal(Value::Number(300.0)),
        );

        match expr {
            Expression::Binary { op, .. } => assert_eq!(op, Operator::Ge),
            _ => panic!("Expected Binary expression"),
        }
    }

    #[test]
    fn test_root_variables_deduplicated() {
        let expr = Expression::binary(
            Expression::binary(
                Expression::field_access(vec!["country".to_string()]),
                Operator::Eq,
                Expression::literal(Value::String("BR".to_string())),
            ),
            Operator::And,
            Expression::binary(
                Expression::field_access(vec!["attributes".to_string(), "channel".to_string()]),
                Operator::Eq,
                Expression::field_access(vec!["country".to_string()]),
            ),
        );

        assert_eq!(expr.root_variables(), vec!["country", "attributes"]);
    }
}
