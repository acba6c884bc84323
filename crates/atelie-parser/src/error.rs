//! Parser error types

use thiserror::Error;

/// Parser error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Invalid expression syntax
    #[error("Invalid expression syntax: {0}")]
    InvalidExpression(String),

    /// Invalid operator
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    /// Operator with nothing on one side
    #[error("Missing operand for '{0}'")]
    MissingOperand(String),

    /// String literal without its closing quote
    #[error("Unterminated string literal starting at offset {0}")]
    UnterminatedString(usize),

    /// Parenthesis or bracket without its counterpart
    #[error("Unbalanced delimiter '{delimiter}' at offset {offset}")]
    UnbalancedDelimiter { delimiter: char, offset: usize },

    /// Method call syntax the dialect does not know
    #[error("Unsupported method '{0}'")]
    UnsupportedMethod(String),

    /// Invalid field value inside a match document
    #[error("Invalid value for field '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type for parser operations
pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ParseError::MissingOperand("==".to_string()).to_string(),
            "Missing operand for '=='"
        );
        assert_eq!(
            ParseError::UnbalancedDelimiter { delimiter: ')', offset: 4 }.to_string(),
            "Unbalanced delimiter ')' at offset 4"
        );
        assert_eq!(
            ParseError::InvalidValue {
                field: "min_total".to_string(),
                message: "expected a number".to_string()
            }
            .to_string(),
            "Invalid value for field 'min_total': expected a number"
        );
    }
}
