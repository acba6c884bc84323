//! Atelie Parser - routing rule parser for the Atelie service routing engine
//!
//! This crate turns stored rule text into AST structures:
//! - [`ExpressionParser`] parses the expression dialect into an `Expression`
//! - [`MatchParser`] decodes a rule's `match_json` into a tagged `MatchSpec`

pub mod error;
pub mod expression_parser;
pub mod match_parser;

// Re-export main parser types
pub use error::{ParseError, Result};
pub use expression_parser::ExpressionParser;
pub use match_parser::MatchParser;
