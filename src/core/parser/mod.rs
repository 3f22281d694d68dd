//! Block parser: turns the disambiguated token stream into a tree of [`CodeBlock`]s.
//!
//! Each construct has a [`BlockHandler`]: a side-effect-free opening-pattern check plus
//! a parse function that consumes the construct (recursively including its body) and
//! returns one node. The handlers are tried in the order of [`BLOCK_HANDLERS`]; the first
//! whose check passes wins.

pub mod cursor;
pub mod util;

mod conditionals;
mod loops;
mod routines;
mod statements;
mod with_block;

use tracing::{debug, trace};

use crate::core::ast::CodeBlock;
use crate::core::error::ParseError;
use crate::core::token::{Token, TokenKind};

pub use cursor::TokenCursor;

pub struct BlockHandler {
    pub name: &'static str,
    pub matches: fn(&TokenCursor<'_>) -> bool,
    pub parse: fn(&mut TokenCursor<'_>) -> Result<CodeBlock, ParseError>,
}

pub static BLOCK_HANDLERS: &[BlockHandler] = &[
    BlockHandler { name: "blank line", matches: statements::is_blank_line, parse: statements::parse_blank_line },
    BlockHandler { name: "comment", matches: statements::is_comment, parse: statements::parse_comment },
    BlockHandler {
        name: "option explicit",
        matches: statements::is_option_explicit,
        parse: statements::parse_option_explicit,
    },
    BlockHandler { name: "on error", matches: statements::is_on_error, parse: statements::parse_on_error },
    BlockHandler { name: "class", matches: routines::is_class, parse: routines::parse_class },
    BlockHandler { name: "function", matches: routines::is_function, parse: routines::parse_function },
    BlockHandler { name: "property", matches: routines::is_property, parse: routines::parse_property },
    BlockHandler { name: "dim", matches: statements::is_dim, parse: statements::parse_dim },
    BlockHandler { name: "const", matches: statements::is_const, parse: statements::parse_const },
    BlockHandler { name: "redim", matches: statements::is_redim, parse: statements::parse_redim },
    BlockHandler { name: "exit", matches: statements::is_exit, parse: statements::parse_exit },
    BlockHandler { name: "randomize", matches: statements::is_randomize, parse: statements::parse_randomize },
    BlockHandler { name: "while", matches: loops::is_while, parse: loops::parse_while },
    BlockHandler { name: "do", matches: loops::is_do, parse: loops::parse_do },
    BlockHandler { name: "for each", matches: loops::is_for_each, parse: loops::parse_for_each },
    BlockHandler { name: "for", matches: loops::is_for, parse: loops::parse_for },
    BlockHandler { name: "if", matches: conditionals::is_if, parse: conditionals::parse_if },
    BlockHandler { name: "select", matches: conditionals::is_select, parse: conditionals::parse_select },
    BlockHandler { name: "with", matches: with_block::is_with, parse: with_block::parse_with },
    BlockHandler {
        name: "value setting",
        matches: statements::is_value_setting,
        parse: statements::parse_value_setting,
    },
    BlockHandler { name: "statement", matches: statements::is_statement, parse: statements::parse_statement },
];

/// Parses a whole source unit. Every token must be consumed.
pub fn parse(tokens: &[Token]) -> Result<Vec<CodeBlock>, ParseError> {
    let mut cursor = TokenCursor::new(tokens);
    let (blocks, _) = parse_block_sequence(&mut cursor, &[])?;
    debug!(blocks = blocks.len(), tokens = tokens.len(), "parsed source unit");
    Ok(blocks)
}

/// Parses blocks until the upcoming statement starts with one of `terminators` (which is
/// left unconsumed) or the tokens run out. Returns the index of the terminator that
/// stopped the sequence, `None` at end of input.
pub fn parse_block_sequence(
    cursor: &mut TokenCursor<'_>,
    terminators: &[&[&str]],
) -> Result<(Vec<CodeBlock>, Option<usize>), ParseError> {
    let mut blocks = Vec::new();
    loop {
        while cursor.check_kind(TokenKind::EndOfStatementSameLine) {
            cursor.advance();
        }
        if cursor.is_at_end() {
            return Ok((blocks, None));
        }
        if let Some(index) = terminators.iter().position(|t| cursor.starts_with_atoms(t)) {
            return Ok((blocks, Some(index)));
        }
        blocks.push(parse_block(cursor)?);
    }
}

fn parse_block(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let handler = BLOCK_HANDLERS.iter().find(|h| (h.matches)(cursor));
    match handler {
        Some(h) => {
            trace!(handler = h.name, line = cursor.line(), "matched block handler");
            (h.parse)(cursor)
        }
        None => {
            let content = cursor.peek().map(|t| t.content.clone()).unwrap_or_default();
            Err(ParseError::UnrecognisedStatement { content, line: cursor.line() })
        }
    }
}

/// Parses a compound block's body, requiring that one of `terminators` ends it.
pub(crate) fn parse_body(
    cursor: &mut TokenCursor<'_>,
    terminators: &[&[&str]],
    construct: &'static str,
    opened_line: usize,
) -> Result<(Vec<CodeBlock>, usize), ParseError> {
    match parse_block_sequence(cursor, terminators)? {
        (body, Some(index)) => Ok((body, index)),
        (_, None) => Err(ParseError::MissingTerminator {
            construct,
            expected: terminators.iter().map(|t| t.join(" ")).collect::<Vec<_>>().join(" / "),
            line: opened_line,
        }),
    }
}

/// Consumes a multi-atom terminator (`END IF`, `LOOP` ...).
pub(crate) fn consume_sequence(
    cursor: &mut TokenCursor<'_>,
    sequence: &[&str],
    construct: &'static str,
) -> Result<(), ParseError> {
    for value in sequence {
        cursor.consume_atom(value, construct)?;
    }
    Ok(())
}
