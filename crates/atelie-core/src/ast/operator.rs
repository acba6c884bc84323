//! Binary operators of the rule expression dialect
//!
//! Rules such as `cepDigits starts_with '010' and orderTotal >= 100` combine
//! request variables with these operators. Keyword forms (`and`, `matches`,
//! `not in`) are accepted case-insensitively by the parser.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,

    Add,
    Sub,
    Mul,
    Div,
    /// Remainder; a zero divisor is an evaluation error
    Mod,

    /// Both sides must evaluate to booleans
    And,
    Or,

    /// Substring test on text, element test on lists
    Contains,
    StartsWith,
    EndsWith,
    /// `matches`: the right side is a regex matched against the whole left text
    Regex,

    /// Left value is an item of the right-hand list, or a substring of right-hand text
    In,
    NotIn,
}

/// How the evaluator treats an operator's operands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorFamily {
    /// Structural equality over any two values
    Equality,
    /// Numbers against numbers or text against text; null never orders
    Ordering,
    Arithmetic,
    Text,
    Membership,
    Boolean,
}

impl Operator {
    pub fn family(&self) -> OperatorFamily {
        match self {
            Operator::Eq | Operator::Ne => OperatorFamily::Equality,
            Operator::Gt | Operator::Ge | Operator::Lt | Operator::Le => OperatorFamily::Ordering,
            Operator::Add | Operator::Sub | Operator::Mul | Operator::Div | Operator::Mod => {
                OperatorFamily::Arithmetic
            }
            Operator::Contains | Operator::StartsWith | Operator::EndsWith | Operator::Regex => {
                OperatorFamily::Text
            }
            Operator::In | Operator::NotIn => OperatorFamily::Membership,
            Operator::And | Operator::Or => OperatorFamily::Boolean,
        }
    }

    /// Produces a boolean whatever its operands, so it can stand alone as a rule
    pub fn yields_condition(&self) -> bool {
        self.family() != OperatorFamily::Arithmetic
    }

    /// How the operator reads in a rule, for error messages
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Ge => ">=",
            Operator::Lt => "<",
            Operator::Le => "<=",
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Contains => "contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::Regex => "matches",
            Operator::In => "in",
            Operator::NotIn => "not in",
        }
    }
}
