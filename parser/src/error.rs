//! Parse errors with source positions.

use thiserror::Error;

/// Errors raised while tokenizing or parsing DDL text.
///
/// Positions are 1-based line and column numbers of the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A token that the grammar does not allow at this position.
    #[error(
        "Encountered \"{found}\" at line {line}, column {column}.\nWas expecting one of:\n{}",
        format_expected(.expected)
    )]
    Unexpected {
        found: String,
        line: usize,
        column: usize,
        expected: Vec<String>,
    },
    /// Text that cannot be tokenized (e.g. an unterminated literal).
    #[error("Lexical error at line {line}, column {column}: {message}")]
    Lexical {
        message: String,
        line: usize,
        column: usize,
    },
    /// Well-formed syntax that the statement model cannot accept.
    #[error("{message} (at line {line}, column {column})")]
    Invalid {
        message: String,
        line: usize,
        column: usize,
    },
}

impl ParseError {
    /// Returns the 1-based `(line, column)` of the error.
    pub fn position(&self) -> (usize, usize) {
        match self {
            ParseError::Unexpected { line, column, .. }
            | ParseError::Lexical { line, column, .. }
            | ParseError::Invalid { line, column, .. } => (*line, *column),
        }
    }
}

fn format_expected(expected: &[String]) -> String {
    expected
        .iter()
        .map(|item| format!("    {item} ..."))
        .collect::<Vec<_>>()
        .join("\n")
}
