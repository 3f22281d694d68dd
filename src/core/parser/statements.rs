//! Single-statement handlers: comments, directives, declarations, value settings and
//! plain statements.

use crate::core::ast::{
    CodeBlock, ConstantDeclaration, DeclarationScope, ExitKind, Expression, NameToken, VariableDeclaration,
};
use crate::core::error::ParseError;
use crate::core::parser::cursor::TokenCursor;
use crate::core::parser::util::{check_brackets, find_top_level_atom, is_valid_target_chain, split_entries};
use crate::core::token::{Token, TokenKind};

/// Atoms that only ever close or continue a construct; a statement never starts with them.
const NON_STATEMENT_KEYWORDS: &[&str] = &[
    "END", "NEXT", "LOOP", "WEND", "ELSE", "ELSEIF", "CASE", "THEN", "TO", "STEP", "IN", "EACH",
];

/// Words that may follow `Public`/`Private` without the line being a variable declaration.
const DECLARATION_MODIFIER_TARGETS: &[&str] = &["CONST", "FUNCTION", "SUB", "PROPERTY", "DEFAULT", "CLASS"];

/// Wraps a token run as an expression after checking it is non-empty and balanced.
pub(crate) fn expression_from(
    tokens: &[Token],
    construct: &'static str,
    line: usize,
) -> Result<Expression, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::InvalidStatement { construct, message: "missing expression".into(), line });
    }
    check_brackets(tokens)?;
    Ok(Expression::new(tokens.to_vec()))
}

pub fn is_blank_line(cursor: &TokenCursor<'_>) -> bool {
    cursor.check_kind(TokenKind::EndOfStatementNewLine)
}

pub fn parse_blank_line(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    cursor.advance();
    Ok(CodeBlock::BlankLine)
}

pub fn is_comment(cursor: &TokenCursor<'_>) -> bool {
    cursor.check_kind(TokenKind::Comment) || cursor.check_kind(TokenKind::InlineComment)
}

pub fn parse_comment(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let token = cursor.advance().ok_or_else(|| cursor.unexpected("expected comment"))?;
    cursor.skip_end_of_statement();
    let content = token.content.clone();
    Ok(match token.kind {
        TokenKind::InlineComment => CodeBlock::InlineComment { content, line: token.line },
        _ => CodeBlock::Comment { content, line: token.line },
    })
}

pub fn is_option_explicit(cursor: &TokenCursor<'_>) -> bool {
    cursor.starts_with_atoms(&["OPTION", "EXPLICIT"])
}

pub fn parse_option_explicit(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    cursor.skip(2);
    cursor.expect_end_of_statement("Option Explicit")?;
    Ok(CodeBlock::OptionExplicit)
}

pub fn is_on_error(cursor: &TokenCursor<'_>) -> bool {
    cursor.starts_with_atoms(&["ON", "ERROR"])
}

pub fn parse_on_error(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let line = cursor.line();
    let statement = cursor.take_statement();
    let rest = &statement[2..];
    let is = |i: usize, value: &str| rest.get(i).map(|t| t.is_atom(value)).unwrap_or(false);
    if rest.len() == 2 && is(0, "RESUME") && is(1, "NEXT") {
        return Ok(CodeBlock::OnErrorResumeNext { line });
    }
    let goto_zero = rest.len() == 2
        && is(0, "GOTO")
        && rest[1].kind == TokenKind::NumericValue
        && rest[1].content == "0";
    if goto_zero {
        return Ok(CodeBlock::OnErrorGoto0 { line });
    }
    Err(ParseError::InvalidStatement {
        construct: "On Error",
        message: "only \"Resume Next\" and \"Goto 0\" are supported".into(),
        line,
    })
}

fn declaration_scope(token: &Token) -> Option<DeclarationScope> {
    if token.is_atom("DIM") {
        Some(DeclarationScope::Dim)
    } else if token.is_atom("PRIVATE") {
        Some(DeclarationScope::Private)
    } else if token.is_atom("PUBLIC") {
        Some(DeclarationScope::Public)
    } else {
        None
    }
}

pub fn is_dim(cursor: &TokenCursor<'_>) -> bool {
    match cursor.peek().and_then(declaration_scope) {
        Some(DeclarationScope::Dim) => true,
        Some(_) => cursor
            .peek_at(1)
            .map(|t| t.is_name_like() && !DECLARATION_MODIFIER_TARGETS.iter().any(|k| t.is_atom(k)))
            .unwrap_or(false),
        None => false,
    }
}

pub fn parse_dim(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let line = cursor.line();
    let statement = cursor.take_statement();
    let scope = statement.first().and_then(declaration_scope).unwrap_or(DeclarationScope::Dim);
    let variables = parse_variable_list(&statement[1..], "Dim", line)?;
    Ok(CodeBlock::Dim { scope, variables })
}

/// `a, b(10), c()` as used by Dim and ReDim.
fn parse_variable_list(
    tokens: &[Token],
    construct: &'static str,
    line: usize,
) -> Result<Vec<VariableDeclaration>, ParseError> {
    if tokens.is_empty() {
        return Err(ParseError::InvalidStatement { construct, message: "no variables named".into(), line });
    }
    split_entries(tokens)?
        .into_iter()
        .map(|entry| {
            let name = match entry.first() {
                Some(t) if t.is_name_like() => NameToken::from_token(t),
                _ => {
                    return Err(ParseError::InvalidStatement {
                        construct,
                        message: "expected a variable name".into(),
                        line,
                    })
                }
            };
            let dimensions = match &entry[1..] {
                [] => None,
                [open, inner @ .., close]
                    if open.kind == TokenKind::OpenBrace && close.kind == TokenKind::CloseBrace =>
                {
                    if inner.is_empty() {
                        Some(Vec::new())
                    } else {
                        let bounds = split_entries(inner)?
                            .into_iter()
                            .map(|b| expression_from(b, construct, name.line))
                            .collect::<Result<Vec<_>, _>>()?;
                        Some(bounds)
                    }
                }
                _ => {
                    return Err(ParseError::InvalidStatement {
                        construct,
                        message: format!("unexpected content after \"{}\"", name.name),
                        line: name.line,
                    })
                }
            };
            Ok(VariableDeclaration { name, dimensions })
        })
        .collect()
}

pub fn is_const(cursor: &TokenCursor<'_>) -> bool {
    cursor.check_atom("CONST")
        || ((cursor.check_atom("PUBLIC") || cursor.check_atom("PRIVATE"))
            && cursor.peek_at(1).map(|t| t.is_atom("CONST")).unwrap_or(false))
}

pub fn parse_const(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let line = cursor.line();
    let statement = cursor.take_statement();
    let (scope, rest) = match statement.first().and_then(declaration_scope) {
        Some(scope) => (scope, &statement[2..]),
        None => (DeclarationScope::Dim, &statement[1..]),
    };
    let values = split_entries(rest)?
        .into_iter()
        .map(|entry| match entry {
            [name, eq, value @ ..] if name.is_name_like() && eq.is_atom("=") => Ok(ConstantDeclaration {
                name: NameToken::from_token(name),
                value: expression_from(value, "Const", name.line)?,
            }),
            _ => Err(ParseError::InvalidStatement {
                construct: "Const",
                message: "expected \"name = value\"".into(),
                line,
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CodeBlock::Const { scope, values })
}

pub fn is_redim(cursor: &TokenCursor<'_>) -> bool {
    cursor.check_atom("REDIM")
}

pub fn parse_redim(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let line = cursor.line();
    let statement = cursor.take_statement();
    let preserve = statement.get(1).map(|t| t.is_atom("PRESERVE")).unwrap_or(false);
    let rest = if preserve { &statement[2..] } else { &statement[1..] };
    let variables = parse_variable_list(rest, "ReDim", line)?;
    if variables.iter().any(|v| v.dimensions.is_none()) {
        return Err(ParseError::InvalidStatement {
            construct: "ReDim",
            message: "every variable needs new dimensions".into(),
            line,
        });
    }
    Ok(CodeBlock::ReDim { preserve, variables })
}

pub fn is_exit(cursor: &TokenCursor<'_>) -> bool {
    cursor.check_atom("EXIT")
}

pub fn parse_exit(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let line = cursor.line();
    cursor.advance();
    let kind = match cursor.advance() {
        Some(t) if t.is_atom("DO") => ExitKind::Do,
        Some(t) if t.is_atom("FOR") => ExitKind::For,
        Some(t) if t.is_atom("FUNCTION") => ExitKind::Function,
        Some(t) if t.is_atom("SUB") => ExitKind::Sub,
        Some(t) if t.is_atom("PROPERTY") => ExitKind::Property,
        _ => {
            return Err(ParseError::InvalidStatement {
                construct: "Exit",
                message: "expected Do, For, Function, Sub or Property".into(),
                line,
            })
        }
    };
    cursor.expect_end_of_statement("Exit")?;
    Ok(CodeBlock::Exit { kind, line })
}

pub fn is_randomize(cursor: &TokenCursor<'_>) -> bool {
    cursor.check_atom("RANDOMIZE")
}

pub fn parse_randomize(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let line = cursor.line();
    let statement = cursor.take_statement();
    let seed = match &statement[1..] {
        [] => None,
        rest => Some(expression_from(rest, "Randomize", line)?),
    };
    Ok(CodeBlock::Randomize { seed, line })
}

pub fn is_value_setting(cursor: &TokenCursor<'_>) -> bool {
    let statement = cursor.remaining_statement();
    if statement.first().map(|t| t.is_atom("SET")).unwrap_or(false) {
        return true;
    }
    match find_top_level_atom(statement, "=") {
        Some(eq) => eq > 0 && is_valid_target_chain(&statement[..eq]),
        None => false,
    }
}

pub fn parse_value_setting(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let line = cursor.line();
    let statement = cursor.take_statement();
    check_brackets(statement)?;
    let is_set = statement.first().map(|t| t.is_atom("SET")).unwrap_or(false);
    let body = if is_set { &statement[1..] } else { statement };
    let eq = find_top_level_atom(body, "=").ok_or_else(|| ParseError::InvalidStatement {
        construct: "Set",
        message: "expected \"=\"".into(),
        line,
    })?;
    if !is_valid_target_chain(&body[..eq]) {
        return Err(ParseError::InvalidStatement {
            construct: "value setting",
            message: "invalid assignment target".into(),
            line,
        });
    }
    Ok(CodeBlock::ValueSetting {
        target: Expression::new(body[..eq].to_vec()),
        value: expression_from(&body[eq + 1..], "value setting", line)?,
        is_set,
    })
}

pub fn is_statement(cursor: &TokenCursor<'_>) -> bool {
    match cursor.peek() {
        Some(t) if t.is_atom("CALL") || t.is_atom("ME") => true,
        Some(t) if t.kind == TokenKind::MemberAccessor => true,
        Some(t) => t.is_name_like() && !NON_STATEMENT_KEYWORDS.iter().any(|k| t.is_atom(k)),
        None => false,
    }
}

pub fn parse_statement(cursor: &mut TokenCursor<'_>) -> Result<CodeBlock, ParseError> {
    let line = cursor.line();
    let statement = cursor.take_statement();
    let call_keyword = statement.first().map(|t| t.is_atom("CALL")).unwrap_or(false);
    let body = if call_keyword { &statement[1..] } else { statement };
    Ok(CodeBlock::Statement { expression: expression_from(body, "statement", line)?, call_keyword })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lexer::Lexer;
    use crate::core::number_rebuilder::rebuild;

    fn tokens(src: &str) -> Vec<Token> {
        rebuild(&Lexer::new(src).tokenize().unwrap())
    }

    #[test]
    fn dim_with_dimensions() {
        let toks = tokens("Dim a, b(2, 3), c()");
        let mut cursor = TokenCursor::new(&toks);
        assert!(is_dim(&cursor));
        match parse_dim(&mut cursor).unwrap() {
            CodeBlock::Dim { scope, variables } => {
                assert_eq!(scope, DeclarationScope::Dim);
                assert_eq!(variables.len(), 3);
                assert!(variables[0].dimensions.is_none());
                assert_eq!(variables[1].dimensions.as_ref().map(|d| d.len()), Some(2));
                assert_eq!(variables[2].dimensions.as_ref().map(|d| d.len()), Some(0));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn private_const_is_not_a_dim() {
        let toks = tokens("Private Const A = 1, B = \"x\"");
        let cursor = TokenCursor::new(&toks);
        assert!(!is_dim(&cursor));
        assert!(is_const(&cursor));
    }

    #[test]
    fn on_error_variants() {
        let toks = tokens("On Error Resume Next\nOn Error Goto 0\nOn Error Goto Handler");
        let mut cursor = TokenCursor::new(&toks);
        assert_eq!(parse_on_error(&mut cursor).unwrap(), CodeBlock::OnErrorResumeNext { line: 1 });
        assert_eq!(parse_on_error(&mut cursor).unwrap(), CodeBlock::OnErrorGoto0 { line: 2 });
        assert!(parse_on_error(&mut cursor).is_err());
    }

    #[test]
    fn redim_requires_bounds() {
        let toks = tokens("ReDim Preserve a(5)");
        let mut cursor = TokenCursor::new(&toks);
        assert!(matches!(parse_redim(&mut cursor).unwrap(), CodeBlock::ReDim { preserve: true, .. }));
        let toks = tokens("ReDim a");
        assert!(parse_redim(&mut TokenCursor::new(&toks)).is_err());
    }

    #[test]
    fn terminator_words_are_not_statements() {
        let toks = tokens("Next");
        assert!(!is_statement(&TokenCursor::new(&toks)));
    }
}
