//! Single-owner cursor over the disambiguated token stream.
//!
//! The cursor is an index into an immutable slice; it is passed by `&mut` down the
//! recursive descent and never cloned, so there is only ever one view of what has been
//! consumed.

use crate::core::error::ParseError;
use crate::core::token::{Token, TokenKind};

pub struct TokenCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    pub fn peek_at(&self, offset: usize) -> Option<&'a Token> {
        self.tokens.get(self.pos + offset)
    }

    /// Everything not yet consumed.
    pub fn rest(&self) -> &'a [Token] {
        &self.tokens[self.pos.min(self.tokens.len())..]
    }

    pub fn skip(&mut self, count: usize) {
        self.pos = (self.pos + count).min(self.tokens.len());
    }

    pub fn advance(&mut self) -> Option<&'a Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    /// Line of the current token, or of the last token once the stream is exhausted.
    pub fn line(&self) -> usize {
        self.peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.line)
            .unwrap_or(1)
    }

    pub fn check_atom(&self, value: &str) -> bool {
        self.peek().map(|t| t.is_atom(value)).unwrap_or(false)
    }

    pub fn check_kind(&self, kind: TokenKind) -> bool {
        self.peek().map(|t| t.kind == kind).unwrap_or(false)
    }

    pub fn match_atom(&mut self, value: &str) -> bool {
        if self.check_atom(value) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn consume_atom(&mut self, value: &str, construct: &'static str) -> Result<&'a Token, ParseError> {
        if self.check_atom(value) {
            self.advance().ok_or_else(|| self.missing(value))
        } else {
            Err(self.unexpected(&format!("expected '{}' in {}", value, construct)))
        }
    }

    pub fn consume_name(&mut self, construct: &'static str) -> Result<&'a Token, ParseError> {
        match self.peek() {
            Some(t) if t.is_name_like() => {
                self.pos += 1;
                Ok(t)
            }
            _ => Err(self.unexpected(&format!("expected a name in {}", construct))),
        }
    }

    /// True if the upcoming atoms spell out `sequence` (case-insensitive).
    pub fn starts_with_atoms(&self, sequence: &[&str]) -> bool {
        sequence
            .iter()
            .enumerate()
            .all(|(i, value)| self.peek_at(i).map(|t| t.is_atom(value)).unwrap_or(false))
    }

    /// Tokens from the cursor up to (not including) the next end-of-statement, without
    /// consuming anything.
    pub fn remaining_statement(&self) -> &'a [Token] {
        let rest = self.rest();
        let end = rest.iter().position(Token::is_end_of_statement).unwrap_or(rest.len());
        &rest[..end]
    }

    /// Consumes the rest of the current statement together with its end-of-statement marker.
    pub fn take_statement(&mut self) -> &'a [Token] {
        let statement = self.remaining_statement();
        self.pos += statement.len();
        self.skip_end_of_statement();
        statement
    }

    /// Runs `parse` with the stream cut off `len` tokens ahead of the cursor, then restores
    /// the full stream. Whatever `parse` consumed stays consumed.
    pub fn within<T>(&mut self, len: usize, parse: impl FnOnce(&mut Self) -> T) -> T {
        let full = self.tokens;
        self.tokens = &full[..(self.pos + len).min(full.len())];
        let result = parse(self);
        self.tokens = full;
        result
    }

    pub fn skip_end_of_statement(&mut self) -> bool {
        match self.peek() {
            Some(t) if t.is_end_of_statement() => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    /// Requires that the current statement has nothing left in it.
    pub fn expect_end_of_statement(&mut self, construct: &'static str) -> Result<(), ParseError> {
        if self.is_at_end() || self.skip_end_of_statement() {
            Ok(())
        } else if self.check_kind(TokenKind::InlineComment) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected end of statement after {}", construct)))
        }
    }

    pub fn unexpected(&self, message: &str) -> ParseError {
        let found = self
            .peek()
            .map(|t| match t.kind {
                TokenKind::Atom => format!("'{}'", t.content),
                other => other.to_string(),
            })
            .unwrap_or_else(|| "end of input".to_string());
        ParseError::UnexpectedToken { found, message: message.to_string(), line: self.line() }
    }

    fn missing(&self, value: &str) -> ParseError {
        self.unexpected(&format!("expected '{}'", value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks() -> Vec<Token> {
        vec![
            Token::atom("End", 1),
            Token::atom("If", 1),
            Token::end_of_statement(1),
            Token::atom("x", 2),
        ]
    }

    #[test]
    fn sequence_matching_does_not_consume() {
        let tokens = toks();
        let cursor = TokenCursor::new(&tokens);
        assert!(cursor.starts_with_atoms(&["END", "IF"]));
        assert!(!cursor.starts_with_atoms(&["END", "SUB"]));
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn take_statement_consumes_terminator() {
        let tokens = toks();
        let mut cursor = TokenCursor::new(&tokens);
        let stmt = cursor.take_statement();
        assert_eq!(stmt.len(), 2);
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.take_statement().len(), 1);
        assert!(cursor.is_at_end());
        assert_eq!(cursor.line(), 2);
    }

    #[test]
    fn within_hides_tokens_past_the_bound() {
        let tokens = toks();
        let mut cursor = TokenCursor::new(&tokens);
        let taken = cursor.within(2, |c| c.take_statement().len());
        assert_eq!(taken, 2);
        assert_eq!(cursor.position(), 2);
        assert!(cursor.skip_end_of_statement());
        assert!(cursor.check_atom("x"));
    }

    #[test]
    fn consume_atom_reports_line() {
        let tokens = toks();
        let mut cursor = TokenCursor::new(&tokens);
        let err = cursor.consume_atom("Loop", "do block").unwrap_err();
        assert_eq!(err.line(), 1);
    }
}
