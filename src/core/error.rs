//! Error taxonomy for the translation pipeline.
//!
//! Lexing and structural parse failures abort translation of the unit they occur in;
//! undeclared-variable warnings are not errors and travel with successful output instead.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("Unexpected character '{ch}' on line {line}")]
    UnexpectedCharacter { ch: char, line: usize },
    #[error("Unterminated string literal on line {line}")]
    UnterminatedString { line: usize },
    #[error("Unterminated date literal on line {line}")]
    UnterminatedDate { line: usize },
}

impl LexError {
    pub fn line(&self) -> usize {
        match self {
            LexError::UnexpectedCharacter { line, .. }
            | LexError::UnterminatedString { line }
            | LexError::UnterminatedDate { line } => *line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Missing terminator for {construct} opened on line {line} (expected {expected})")]
    MissingTerminator { construct: &'static str, expected: String, line: usize },
    #[error("Unexpected {found} on line {line}: {message}")]
    UnexpectedToken { found: String, message: String, line: usize },
    #[error("Mismatched brackets on line {line}")]
    MismatchedBrackets { line: usize },
    #[error("Unrecognised statement starting with '{content}' on line {line}")]
    UnrecognisedStatement { content: String, line: usize },
    #[error("Invalid {construct} on line {line}: {message}")]
    InvalidStatement { construct: &'static str, message: String, line: usize },
}

impl ParseError {
    pub fn line(&self) -> usize {
        match self {
            ParseError::MissingTerminator { line, .. }
            | ParseError::UnexpectedToken { line, .. }
            | ParseError::MismatchedBrackets { line }
            | ParseError::UnrecognisedStatement { line, .. }
            | ParseError::InvalidStatement { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Invalid expression on line {line}: {message}")]
    InvalidExpression { line: usize, message: String },
    /// A translator precondition failed; this is a defect, not bad input.
    #[error("Internal invariant violated: {0}")]
    Invariant(String),
    #[error("Source is empty, nothing to translate")]
    EmptySource,
}

impl TranslateError {
    pub fn invalid_expression(line: usize, message: impl Into<String>) -> Self {
        TranslateError::InvalidExpression { line, message: message.into() }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        TranslateError::Invariant(message.into())
    }

    /// Source line the failure points at, where there is one.
    pub fn line(&self) -> Option<usize> {
        match self {
            TranslateError::Lex(e) => Some(e.line()),
            TranslateError::Parse(e) => Some(e.line()),
            TranslateError::InvalidExpression { line, .. } => Some(*line),
            TranslateError::Invariant(_) | TranslateError::EmptySource => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_carry_lines() {
        let err = ParseError::MismatchedBrackets { line: 7 };
        assert_eq!(err.line(), 7);
        assert_eq!(format!("{}", err), "Mismatched brackets on line 7");
    }

    #[test]
    fn translate_error_wraps_parse_error() {
        let err: TranslateError = ParseError::UnrecognisedStatement { content: "Wend".into(), line: 2 }.into();
        assert_eq!(err.line(), Some(2));
        assert_eq!(format!("{}", err), "Unrecognised statement starting with 'Wend' on line 2");
    }

    #[test]
    fn invariant_has_no_line() {
        let err = TranslateError::invariant("missing result variable");
        assert_eq!(err.line(), None);
        assert_eq!(format!("{}", err), "Internal invariant violated: missing result variable");
    }
}
