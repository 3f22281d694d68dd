//! `If` (block and single-line forms) and `Select Case`.

use crate::core::ast::{CaseSegment, CodeBlock, ConditionalClause, Expression};
use crate::core::error::ParseError;
use crate::core::parser::cursor::TokenCursor;
use crate::core::parser::statements::expression_from;
use crate::core::parser::util::{find_top_level_atom, split_entries};
use crate::core::parser::{consume_sequence, parse_block_sequence, parse_body};
use crate::core::token::TokenKind;

const IF_TERMINATORS: &[&[&str]] = &[&["ELSEIF"], &["ELSE"], &["END", "IF"]];
const ELSE_TERMINATORS: &[&[&str]] = &[&["END", "IF"]];
const CASE_TERMINATORS: &[&[&str]] = &[&["CASE"], &["END", "SELECT"]];

pub fn is_if(cursor: &TokenCursor<'_>) -> bool {
    cursor.check_atom("IF")
}

/// Reads `<condition> THEN` from the cursor, leaving it just after THEN.
fn read_condition(cursor: &mut TokenCursor<'_>, construct: &'static str) -> Result<Expression, ParseError> {
    let line = cursor.line();
    let statement = cursor.remaining_statement();
    let then = find_top_level_atom(statement, "THEN").ok_or_else(|| ParseError::InvalidStatement {
        construct,
        message: "expected \"Then\"".into(),
        line,
    })?;
    let condition = expression_from(&statement[..then], construct, line)?;
    cursor.skip(then + 1);
    Ok(condition)
}

pub fn parse_if(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let opened = cursor.line();
    cursor.consume_atom("IF", "if block")?;
    let condition = read_condition(cursor, "if block")?;

    let single_line = cursor
        .peek()
        .map(|t| !t.is_end_of_statement() && t.kind != TokenKind::InlineComment)
        .unwrap_or(false);
    if single_line {
        return parse_single_line_if(cursor, condition);
    }
    cursor.skip_end_of_statement();

    let mut clauses = Vec::new();
    let mut condition = condition;
    loop {
        let (body, terminator) = parse_body(cursor, IF_TERMINATORS, "if block", opened)?;
        clauses.push(ConditionalClause { condition, body });
        match terminator {
            0 => {
                cursor.consume_atom("ELSEIF", "if block")?;
                condition = read_condition(cursor, "if block")?;
                cursor.skip_end_of_statement();
            }
            1 => {
                cursor.consume_atom("ELSE", "if block")?;
                cursor.skip_end_of_statement();
                let (else_body, _) = parse_body(cursor, ELSE_TERMINATORS, "if block", opened)?;
                consume_sequence(cursor, &["END", "IF"], "if block")?;
                cursor.expect_end_of_statement("End If")?;
                return Ok(CodeBlock::If { clauses, else_body: Some(else_body) });
            }
            _ => {
                consume_sequence(cursor, &["END", "IF"], "if block")?;
                cursor.expect_end_of_statement("End If")?;
                return Ok(CodeBlock::If { clauses, else_body: None });
            }
        }
    }
}

/// `If a Then b: c Else d` ends at the end of the physical line.
fn parse_single_line_if(cursor: &mut TokenCursor<'_>, condition: Expression) -> Result<CodeBlock, ParseError> {
    let rest = cursor.rest();
    let line_len = rest
        .iter()
        .position(|t| matches!(t.kind, TokenKind::EndOfStatementNewLine | TokenKind::InlineComment))
        .unwrap_or(rest.len());
    let else_at = find_top_level_atom(&rest[..line_len], "ELSE");

    let body = parse_inline_statements(cursor, else_at.unwrap_or(line_len))?;
    let else_body = match else_at {
        Some(at) => {
            cursor.consume_atom("ELSE", "if block")?;
            Some(parse_inline_statements(cursor, line_len - at - 1)?)
        }
        None => None,
    };
    cursor.skip_end_of_statement();
    Ok(CodeBlock::If { clauses: vec![ConditionalClause { condition, body }], else_body })
}

/// Statements in the next `len` tokens; nothing past them is read.
fn parse_inline_statements(cursor: &mut TokenCursor<'_>, len: usize) -> Result<Vec<CodeBlock>, ParseError> {
    let (blocks, _) = cursor.within(len, |inner| parse_block_sequence(inner, &[]))?;
    Ok(blocks)
}

pub fn is_select(cursor: &TokenCursor<'_>) -> bool {
    cursor.starts_with_atoms(&["SELECT", "CASE"])
}

pub fn parse_select(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let opened = cursor.line();
    consume_sequence(cursor, &["SELECT", "CASE"], "select block")?;
    let header = cursor.take_statement();
    let expression = expression_from(header, "select block", opened)?;

    let mut opening_comments = Vec::new();
    loop {
        match cursor.peek() {
            Some(t) if t.kind == TokenKind::Comment || t.kind == TokenKind::InlineComment => {
                let line = t.line;
                let content = t.content.clone();
                cursor.advance();
                cursor.skip_end_of_statement();
                opening_comments.push(CodeBlock::Comment { content, line });
            }
            Some(t) if t.is_end_of_statement() => {
                cursor.advance();
            }
            _ => break,
        }
    }

    let mut segments = Vec::new();
    loop {
        if cursor.starts_with_atoms(&["END", "SELECT"]) {
            consume_sequence(cursor, &["END", "SELECT"], "select block")?;
            cursor.expect_end_of_statement("End Select")?;
            return Ok(CodeBlock::Select { expression, opening_comments, segments });
        }
        if cursor.is_at_end() {
            return Err(ParseError::MissingTerminator {
                construct: "select block",
                expected: "END SELECT".into(),
                line: opened,
            });
        }
        let case_line = cursor.line();
        cursor.consume_atom("CASE", "select block")?;
        if matches!(segments.last(), Some(CaseSegment::Else { .. })) {
            return Err(ParseError::InvalidStatement {
                construct: "select block",
                message: "\"Case Else\" must be the last case".into(),
                line: case_line,
            });
        }
        let is_else = cursor.match_atom("ELSE");
        let values = if is_else {
            cursor.skip_end_of_statement();
            Vec::new()
        } else {
            let values = split_entries(cursor.take_statement())?
                .into_iter()
                .map(|v| expression_from(v, "case", case_line))
                .collect::<Result<Vec<_>, _>>()?;
            values
        };
        let (body, _) = parse_body(cursor, CASE_TERMINATORS, "select block", opened)?;
        segments.push(if is_else { CaseSegment::Else { body } } else { CaseSegment::Values { values, body } });
    }
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
    fn else_if_then_on_same_line_as_statement() {
        let toks = tokens("If a Then\nx = 1\nElseIf b Then x = 2\nEnd If");
        let mut cursor = TokenCursor::new(&toks);
        match parse_if(&mut cursor).unwrap() {
            CodeBlock::If { clauses, .. } => {
                assert_eq!(clauses.len(), 2);
                assert_eq!(clauses[1].body.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(cursor.is_at_end());
    }

    #[test]
    fn single_line_if_stops_at_line_end() {
        let toks = tokens("If a Then b: c\nd");
        let mut cursor = TokenCursor::new(&toks);
        match parse_if(&mut cursor).unwrap() {
            CodeBlock::If { clauses, else_body } => {
                assert_eq!(clauses[0].body.len(), 2);
                assert!(else_body.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(cursor.check_atom("d"));
    }

    #[test]
    fn single_line_else_branch_reads_from_the_same_stream() {
        let toks = tokens("If a Then b: c Else d: e:\nf");
        let mut cursor = TokenCursor::new(&toks);
        match parse_if(&mut cursor).unwrap() {
            CodeBlock::If { clauses, else_body } => {
                assert_eq!(clauses[0].body.len(), 2);
                assert_eq!(else_body.map(|b| b.len()), Some(2));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(cursor.check_atom("f"));
        // the statement before Else does not swallow it
        let toks = tokens("If a Then x = 1 Else x = 2");
        match parse_if(&mut TokenCursor::new(&toks)).unwrap() {
            CodeBlock::If { clauses, else_body: Some(else_body) } => {
                assert!(matches!(&clauses[0].body[0], CodeBlock::ValueSetting { .. }));
                assert!(matches!(&else_body[0], CodeBlock::ValueSetting { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn single_line_if_leaves_trailing_comment() {
        let toks = tokens("If a Then b ' note\nc");
        let mut cursor = TokenCursor::new(&toks);
        parse_if(&mut cursor).unwrap();
        assert!(cursor.check_kind(TokenKind::InlineComment));
    }

    #[test]
    fn select_with_zero_cases() {
        let toks = tokens("Select Case f(x)\nEnd Select");
        let mut cursor = TokenCursor::new(&toks);
        match parse_select(&mut cursor).unwrap() {
            CodeBlock::Select { segments, .. } => assert!(segments.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn case_after_case_else_is_rejected() {
        let toks = tokens("Select Case x\nCase Else\n a\nCase 1\nEnd Select");
        assert!(parse_select(&mut TokenCursor::new(&toks)).is_err());
    }

    #[test]
    fn missing_end_if() {
        let toks = tokens("If a Then\n b\n");
        let err = parse_if(&mut TokenCursor::new(&toks)).unwrap_err();
        assert!(matches!(err, ParseError::MissingTerminator { line: 1, .. }));
    }
}
