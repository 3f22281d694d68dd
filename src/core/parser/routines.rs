//! Functions, subs, properties and classes.

use crate::core::ast::{CodeBlock, NameToken, Parameter, RoutineBlock, RoutineKind};
use crate::core::error::ParseError;
use crate::core::parser::cursor::TokenCursor;
use crate::core::parser::util::{matching_close, split_entries};
use crate::core::parser::{consume_sequence, parse_body};
use crate::core::token::{Token, TokenKind};

struct Modifiers {
    is_public: bool,
    is_default: bool,
    /// Number of modifier tokens
    len: usize,
}

fn peek_modifiers(cursor: &TokenCursor<'_>) -> Modifiers {
    let mut len = 0;
    let mut is_public = true;
    if let Some(t) = cursor.peek() {
        if t.is_atom("PRIVATE") {
            is_public = false;
            len += 1;
        } else if t.is_atom("PUBLIC") {
            len += 1;
        }
    }
    let is_default = cursor.peek_at(len).map(|t| t.is_atom("DEFAULT")).unwrap_or(false);
    if is_default {
        len += 1;
    }
    Modifiers { is_public, is_default, len }
}

pub fn is_function(cursor: &TokenCursor<'_>) -> bool {
    let m = peek_modifiers(cursor);
    cursor.peek_at(m.len).map(|t| t.is_atom("FUNCTION") || t.is_atom("SUB")).unwrap_or(false)
}

pub fn is_property(cursor: &TokenCursor<'_>) -> bool {
    let m = peek_modifiers(cursor);
    cursor.peek_at(m.len).map(|t| t.is_atom("PROPERTY")).unwrap_or(false)
}

pub fn parse_function(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let modifiers = peek_modifiers(cursor);
    cursor.skip(modifiers.len);
    let kind = if cursor.match_atom("FUNCTION") {
        RoutineKind::Function
    } else {
        cursor.consume_atom("SUB", "routine")?;
        RoutineKind::Sub
    };
    parse_routine(cursor, modifiers, kind)
}

pub fn parse_property(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let modifiers = peek_modifiers(cursor);
    cursor.skip(modifiers.len);
    cursor.consume_atom("PROPERTY", "property")?;
    let kind = if cursor.match_atom("GET") {
        RoutineKind::PropertyGet
    } else if cursor.match_atom("LET") {
        RoutineKind::PropertyLet
    } else if cursor.match_atom("SET") {
        RoutineKind::PropertySet
    } else {
        return Err(cursor.unexpected("expected Get, Let or Set after \"Property\""));
    };
    parse_routine(cursor, modifiers, kind)
}

fn parse_routine(cursor: &mut TokenCursor<'_>, modifiers: Modifiers, kind: RoutineKind) -> Result<CodeBlock, ParseError> {
    let opened = cursor.line();
    let name = NameToken::from_token(cursor.consume_name("routine")?);
    let parameters = parse_parameters(cursor)?;
    cursor.expect_end_of_statement("routine header")?;

    let terminator: &[&str] = match kind {
        RoutineKind::Function => &["END", "FUNCTION"],
        RoutineKind::Sub => &["END", "SUB"],
        _ => &["END", "PROPERTY"],
    };
    let (body, _) = parse_body(cursor, &[terminator], "routine", opened)?;
    consume_sequence(cursor, terminator, "routine")?;
    cursor.expect_end_of_statement("routine end")?;
    Ok(CodeBlock::Routine(RoutineBlock {
        kind,
        name,
        is_public: modifiers.is_public,
        is_default: modifiers.is_default,
        parameters,
        body,
    }))
}

fn parse_parameters(cursor: &mut TokenCursor<'_>) -> Result<Vec<Parameter>, ParseError> {
    if !cursor.check_kind(TokenKind::OpenBrace) {
        return Ok(Vec::new());
    }
    let line = cursor.line();
    let statement = cursor.remaining_statement();
    let close = matching_close(statement, 0)
        .ok_or(ParseError::MismatchedBrackets { line })?;
    let inner = &statement[1..close];
    cursor.skip(close + 1);
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    split_entries(inner)?.into_iter().map(|entry| parse_parameter(entry, line)).collect()
}

fn parse_parameter(entry: &[Token], line: usize) -> Result<Parameter, ParseError> {
    let (by_ref, rest) = match entry.first() {
        Some(t) if t.is_atom("BYVAL") => (false, &entry[1..]),
        Some(t) if t.is_atom("BYREF") => (true, &entry[1..]),
        _ => (true, entry),
    };
    match rest {
        [name] if name.is_name_like() => {
            Ok(Parameter { name: NameToken::from_token(name), by_ref, is_array: false })
        }
        [name, open, close]
            if name.is_name_like() && open.kind == TokenKind::OpenBrace && close.kind == TokenKind::CloseBrace =>
        {
            Ok(Parameter { name: NameToken::from_token(name), by_ref, is_array: true })
        }
        _ => Err(ParseError::InvalidStatement {
            construct: "parameter list",
            message: "expected [ByVal|ByRef] name".into(),
            line,
        }),
    }
}

pub fn is_class(cursor: &TokenCursor<'_>) -> bool {
    cursor.check_atom("CLASS")
}

pub fn parse_class(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let opened = cursor.line();
    cursor.consume_atom("CLASS", "class")?;
    let name = NameToken::from_token(cursor.consume_name("class")?);
    cursor.expect_end_of_statement("class header")?;
    let (members, _) = parse_body(cursor, &[&["END", "CLASS"]], "class", opened)?;
    for member in &members {
        let allowed = matches!(
            member,
            CodeBlock::Routine(_)
                | CodeBlock::Dim { .. }
                | CodeBlock::Const { .. }
                | CodeBlock::Comment { .. }
                | CodeBlock::InlineComment { .. }
                | CodeBlock::BlankLine
        );
        if !allowed {
            return Err(ParseError::InvalidStatement {
                construct: "class",
                message: format!("only declarations and routines may appear in class \"{}\"", name.name),
                line: opened,
            });
        }
    }
    consume_sequence(cursor, &["END", "CLASS"], "class")?;
    cursor.expect_end_of_statement("End Class")?;
    Ok(CodeBlock::Class { name, members })
}
