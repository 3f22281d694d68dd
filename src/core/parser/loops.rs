//! Loop constructs. `While .. Wend` has no node of its own; it becomes a pre-condition
//! `Do` block that cannot be exited early.

use crate::core::ast::{CodeBlock, ExitKind, Expression, NameToken};
use crate::core::error::ParseError;
use crate::core::parser::cursor::TokenCursor;
use crate::core::parser::statements::expression_from;
use crate::core::parser::util::find_top_level_atom;
use crate::core::parser::{consume_sequence, parse_body};

pub fn is_while(cursor: &TokenCursor<'_>) -> bool {
    cursor.check_atom("WHILE")
}

pub fn parse_while(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let opened = cursor.line();
    cursor.consume_atom("WHILE", "while loop")?;
    let condition = expression_from(cursor.take_statement(), "while loop", opened)?;
    let (body, _) = parse_body(cursor, &[&["WEND"]], "while loop", opened)?;
    reject_exit_do(&body)?;
    cursor.consume_atom("WEND", "while loop")?;
    cursor.expect_end_of_statement("Wend")?;
    Ok(CodeBlock::Do {
        condition: Some(condition),
        is_pre_condition: true,
        is_until: false,
        supports_exit: false,
        body,
    })
}

/// `Exit Do` whose nearest enclosing Do-style loop is a `While` has nothing to leave.
/// Nested `Do` loops own their own exits.
fn reject_exit_do(body: &[CodeBlock]) -> Result<(), ParseError> {
    for block in body {
        match block {
            CodeBlock::Exit { kind: ExitKind::Do, line } => {
                return Err(ParseError::InvalidStatement {
                    construct: "Exit",
                    message: "\"Exit Do\" cannot leave a While loop".into(),
                    line: *line,
                })
            }
            CodeBlock::Do { supports_exit: true, .. } | CodeBlock::Routine(_) | CodeBlock::Class { .. } => {}
            other => {
                for child in other.child_sequences() {
                    reject_exit_do(child)?;
                }
            }
        }
    }
    Ok(())
}

pub fn is_do(cursor: &TokenCursor<'_>) -> bool {
    cursor.check_atom("DO")
}

/// `WHILE cond` / `UNTIL cond` tail of a Do or Loop line, if present.
fn read_loop_condition(
    cursor: &mut TokenCursor<'_>,
    line: usize,
) -> Result<Option<(Expression, bool)>, ParseError> {
    let is_until = if cursor.match_atom("UNTIL") {
        true
    } else if cursor.match_atom("WHILE") {
        false
    } else {
        cursor.expect_end_of_statement("do loop")?;
        return Ok(None);
    };
    let condition = expression_from(cursor.take_statement(), "do loop", line)?;
    Ok(Some((condition, is_until)))
}

pub fn parse_do(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let opened = cursor.line();
    cursor.consume_atom("DO", "do loop")?;
    let pre = read_loop_condition(cursor, opened)?;
    let (body, _) = parse_body(cursor, &[&["LOOP"]], "do loop", opened)?;
    let loop_line = cursor.line();
    cursor.consume_atom("LOOP", "do loop")?;
    let post = read_loop_condition(cursor, loop_line)?;

    let (condition, is_pre_condition, is_until) = match (pre, post) {
        (Some(_), Some(_)) => {
            return Err(ParseError::InvalidStatement {
                construct: "do loop",
                message: "a loop may not have both a Do and a Loop condition".into(),
                line: loop_line,
            })
        }
        (Some((c, until)), None) => (Some(c), true, until),
        (None, Some((c, until))) => (Some(c), false, until),
        (None, None) => (None, true, false),
    };
    Ok(CodeBlock::Do { condition, is_pre_condition, is_until, supports_exit: true, body })
}

pub fn is_for_each(cursor: &TokenCursor<'_>) -> bool {
    cursor.starts_with_atoms(&["FOR", "EACH"])
}

/// `Next` optionally repeats the loop variable.
fn consume_next(cursor: &mut TokenCursor<'_>, variable: &NameToken) -> Result<(), ParseError> {
    cursor.consume_atom("NEXT", "for loop")?;
    if let Some(t) = cursor.peek() {
        if t.is_name_like() {
            if !t.content.eq_ignore_ascii_case(&variable.name) {
                return Err(cursor.unexpected(&format!("\"Next\" does not match loop variable \"{}\"", variable.name)));
            }
            cursor.advance();
        }
    }
    cursor.expect_end_of_statement("Next")
}

pub fn parse_for_each(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let opened = cursor.line();
    consume_sequence(cursor, &["FOR", "EACH"], "for each loop")?;
    let variable = NameToken::from_token(cursor.consume_name("for each loop")?);
    cursor.consume_atom("IN", "for each loop")?;
    let collection = expression_from(cursor.take_statement(), "for each loop", opened)?;
    let (body, _) = parse_body(cursor, &[&["NEXT"]], "for each loop", opened)?;
    consume_next(cursor, &variable)?;
    Ok(CodeBlock::ForEach { variable, collection, body })
}

pub fn is_for(cursor: &TokenCursor<'_>) -> bool {
    cursor.check_atom("FOR")
}

pub fn parse_for(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let opened = cursor.line();
    cursor.consume_atom("FOR", "for loop")?;
    let variable = NameToken::from_token(cursor.consume_name("for loop")?);
    cursor.consume_atom("=", "for loop")?;
    let header = cursor.take_statement();
    let to = find_top_level_atom(header, "TO").ok_or_else(|| ParseError::InvalidStatement {
        construct: "for loop",
        message: "expected \"To\"".into(),
        line: opened,
    })?;
    let start = expression_from(&header[..to], "for loop", opened)?;
    let after_to = &header[to + 1..];
    let (end, step) = match find_top_level_atom(after_to, "STEP") {
        Some(s) => (
            expression_from(&after_to[..s], "for loop", opened)?,
            Some(expression_from(&after_to[s + 1..], "for loop", opened)?),
        ),
        None => (expression_from(after_to, "for loop", opened)?, None),
    };
    let (body, _) = parse_body(cursor, &[&["NEXT"]], "for loop", opened)?;
    consume_next(cursor, &variable)?;
    Ok(CodeBlock::For { variable, start, end, step, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lexer::Lexer;
    use crate::core::number_rebuilder::rebuild;
    use crate::core::token::Token;

    fn tokens(src: &str) -> Vec<Token> {
        rebuild(&Lexer::new(src).tokenize().unwrap())
    }

    #[test]
    fn for_with_negative_step() {
        let toks = tokens("For i = 10 To 1 Step -1\n x = i\nNext i");
        let mut cursor = TokenCursor::new(&toks);
        match parse_for(&mut cursor).unwrap() {
            CodeBlock::For { step: Some(step), variable, .. } => {
                assert_eq!(variable.name, "i");
                assert_eq!(step.tokens.len(), 1);
                assert_eq!(step.tokens[0].content, "-1");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(cursor.is_at_end());
    }

    #[test]
    fn do_until_post_condition() {
        let toks = tokens("Do\n i = i + 1\nLoop Until i > 3");
        match parse_do(&mut TokenCursor::new(&toks)).unwrap() {
            CodeBlock::Do { is_pre_condition, is_until, supports_exit, .. } => {
                assert!(!is_pre_condition && is_until && supports_exit);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn both_conditions_rejected() {
        let toks = tokens("Do While a\nLoop Until b");
        assert!(parse_do(&mut TokenCursor::new(&toks)).is_err());
    }

    #[test]
    fn exit_do_cannot_leave_a_while_loop() {
        let toks = tokens("While a\nIf b Then\nExit Do\nEnd If\nWend");
        let err = parse_while(&mut TokenCursor::new(&toks)).unwrap_err();
        assert!(matches!(err, ParseError::InvalidStatement { construct: "Exit", line: 3, .. }), "{:?}", err);
    }

    #[test]
    fn exit_do_inside_a_do_nested_in_while_is_allowed() {
        let toks = tokens("While a\nDo\nExit Do\nLoop\nWend");
        assert!(parse_while(&mut TokenCursor::new(&toks)).is_ok());
    }

    #[test]
    fn mismatched_next_variable() {
        let toks = tokens("For Each x In items\nNext y");
        assert!(parse_for_each(&mut TokenCursor::new(&toks)).is_err());
    }
}
