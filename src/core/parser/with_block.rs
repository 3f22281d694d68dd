//! `With <object> .. End With`.

use crate::core::ast::CodeBlock;
use crate::core::error::ParseError;
use crate::core::parser::cursor::TokenCursor;
use crate::core::parser::statements::expression_from;
use crate::core::parser::{consume_sequence, parse_body};

pub fn is_with(cursor: &TokenCursor<'_>) -> bool {
    cursor.check_atom("WITH")
}

pub fn parse_with(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let opened = cursor.line();
    cursor.consume_atom("WITH", "with block")?;
    let target = expression_from(cursor.take_statement(), "with block", opened)?;
    let (body, _) = parse_body(cursor, &[&["END", "WITH"]], "with block", opened)?;
    consume_sequence(cursor, &["END", "WITH"], "with block")?;
    cursor.expect_end_of_statement("End With")?;
    Ok(CodeBlock::With { target, body, line: opened })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lexer::Lexer;
    use crate::core::number_rebuilder::rebuild;
    use crate::core::token::{Token, TokenKind};

    fn tokens(src: &str) -> Vec<Token> {
        rebuild(&Lexer::new(src).tokenize().unwrap())
    }

    #[test]
    fn member_statements_belong_to_the_block() {
        let toks = tokens("With x\n.Draw \"Test\"\n.Name = 1\nEnd With");
        let mut cursor = TokenCursor::new(&toks);
        assert!(is_with(&cursor));
        match parse_with(&mut cursor).unwrap() {
            CodeBlock::With { target, body, line } => {
                assert_eq!(line, 1);
                assert_eq!(target.tokens.len(), 1);
                assert!(matches!(&body[0], CodeBlock::Statement { expression, .. }
                    if expression.tokens[0].kind == TokenKind::MemberAccessor));
                assert!(matches!(&body[1], CodeBlock::ValueSetting { .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(cursor.is_at_end());
    }

    #[test]
    fn missing_end_with_cites_the_opening_line() {
        let toks = tokens("With x\n.Draw\n.Size = 2");
        let err = parse_with(&mut TokenCursor::new(&toks)).unwrap_err();
        assert!(matches!(err, ParseError::MissingTerminator { line: 1, .. }), "{:?}", err);
    }
}
