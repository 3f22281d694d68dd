//! Token-list helpers shared by the block handlers: bracket counting, top-level
//! keyword scanning and entry-list splitting.

use crate::core::error::ParseError;
use crate::core::token::{Token, TokenKind};

/// Fails with the line of the first stray closing bracket, or of the earliest bracket
/// left open.
pub fn check_brackets(tokens: &[Token]) -> Result<(), ParseError> {
    let mut open_lines: Vec<usize> = Vec::new();
    for t in tokens {
        match t.kind {
            TokenKind::OpenBrace => open_lines.push(t.line),
            TokenKind::CloseBrace => {
                if open_lines.pop().is_none() {
                    return Err(ParseError::MismatchedBrackets { line: t.line });
                }
            }
            _ => {}
        }
    }
    match open_lines.first() {
        Some(line) => Err(ParseError::MismatchedBrackets { line: *line }),
        None => Ok(()),
    }
}

/// Index of the bracket closing the one opened at `open_index`.
pub fn matching_close(tokens: &[Token], open_index: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, t) in tokens.iter().enumerate().skip(open_index) {
        match t.kind {
            TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseBrace => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Positions of tokens at bracket depth zero that satisfy `pred`.
pub fn top_level_positions(tokens: &[Token], pred: impl Fn(&Token) -> bool) -> Vec<usize> {
    let mut depth = 0i32;
    let mut out = Vec::new();
    for (i, t) in tokens.iter().enumerate() {
        match t.kind {
            TokenKind::OpenBrace => depth += 1,
            TokenKind::CloseBrace => depth -= 1,
            _ if depth == 0 && pred(t) => out.push(i),
            _ => {}
        }
    }
    out
}

pub fn find_top_level_atom(tokens: &[Token], value: &str) -> Option<usize> {
    top_level_positions(tokens, |t| t.is_atom(value)).into_iter().next()
}

/// Splits a comma-separated entry list, ignoring separators nested inside brackets.
pub fn split_entries(tokens: &[Token]) -> Result<Vec<&[Token]>, ParseError> {
    check_brackets(tokens)?;
    let mut out = Vec::new();
    let mut start = 0;
    for i in top_level_positions(tokens, |t| t.kind == TokenKind::ArgumentSeparator) {
        out.push(&tokens[start..i]);
        start = i + 1;
    }
    out.push(&tokens[start..]);
    Ok(out)
}

/// `name`, `name.member`, `name(args)`, `name(args).member(args)` ... with balanced brackets.
pub fn is_valid_target_chain(tokens: &[Token]) -> bool {
    let mut i = 0;
    match tokens.first() {
        Some(t) if t.is_name_like() || t.is_atom("ME") => i += 1,
        // `.member` inside a With block; the accessor is checked by the loop
        Some(t) if t.kind == TokenKind::MemberAccessor => {}
        _ => return false,
    }
    while i < tokens.len() {
        match tokens[i].kind {
            TokenKind::MemberAccessor => match tokens.get(i + 1) {
                Some(t) if t.kind == TokenKind::Atom => i += 2,
                _ => return false,
            },
            TokenKind::OpenBrace => match matching_close(tokens, i) {
                Some(close) => i = close + 1,
                None => return false,
            },
            _ => return false,
        }
    }
    true
}

pub fn is_wrapped_in_brackets(tokens: &[Token]) -> bool {
    matches!(tokens.first(), Some(t) if t.kind == TokenKind::OpenBrace)
        && matching_close(tokens, 0) == Some(tokens.len() - 1)
}
