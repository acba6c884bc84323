//! Abstract Syntax Tree (AST) definitions for routing rules
//!
//! This module contains:
//! - Expressions and operators of the expression dialect
//! - The decoded, tagged form of a rule's `match_json`

pub mod expression;
pub mod match_spec;
pub mod operator;

pub use expression::{Expression, UnaryOperator};
pub use match_spec::{ExpressionBody, ExpressionRule, LegacyRule, MatchSpec, EXPRESSION_VARIABLES};
pub use operator::{Operator, OperatorFamily};
