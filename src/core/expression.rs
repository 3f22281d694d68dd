// src/core/expression.rs
//! Expression parser: token runs from the syntax tree into operator trees.
//!
//! Precedence, tightest first: `^`, unary `-`, `* /`, `\`, `Mod`, `+ -`, `&`,
//! comparisons (`= <> < > <= >= Is`), `Not`, `And`, `Or`, `Xor`, `Eqv`, `Imp`.
//! Runs of `&` are flattened into a single concatenation.

use crate::core::error::TranslateError;
use crate::core::parser::util::{is_wrapped_in_brackets, matching_close, split_entries};
use crate::core::token::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Pow,
    Mult,
    Div,
    IntDiv,
    Mod,
    Add,
    Subt,
    Eq,
    NotEq,
    Lt,
    Gt,
    Lte,
    Gte,
    Is,
    And,
    Or,
    Xor,
    Eqv,
    Imp,
}

impl BinaryOp {
    /// Runtime member implementing the operator.
    pub fn runtime_name(self) -> &'static str {
        match self {
            BinaryOp::Pow => "POW",
            BinaryOp::Mult => "MULT",
            BinaryOp::Div => "DIV",
            BinaryOp::IntDiv => "INTDIV",
            BinaryOp::Mod => "MOD",
            BinaryOp::Add => "ADD",
            BinaryOp::Subt => "SUBT",
            BinaryOp::Eq => "EQ",
            BinaryOp::NotEq => "NOTEQ",
            BinaryOp::Lt => "LT",
            BinaryOp::Gt => "GT",
            BinaryOp::Lte => "LTE",
            BinaryOp::Gte => "GTE",
            BinaryOp::Is => "IS",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Xor => "XOR",
            BinaryOp::Eqv => "EQV",
            BinaryOp::Imp => "IMP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    True,
    False,
    Empty,
    Null,
    Nothing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChainHead {
    Name { name: String, line: usize },
    Me,
    /// Leading `.member` inside a `With` block
    With { line: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Member(String),
    /// Bracketed argument list, possibly empty
    Call(Vec<Expr>),
}

/// `head(.member | (args))*`
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    pub head: ChainHead,
    pub segments: Vec<Segment>,
}

impl Chain {
    pub fn simple(name: &str, line: usize) -> Self {
        Chain { head: ChainHead::Name { name: name.to_string(), line }, segments: Vec::new() }
    }

    /// A bare name with nothing hanging off it.
    pub fn simple_name(&self) -> Option<&str> {
        match (&self.head, self.segments.is_empty()) {
            (ChainHead::Name { name, .. }, true) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(String),
    Str(String),
    Date(String),
    Keyword(Keyword),
    Chain(Chain),
    New { class_name: String, line: usize },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Concat(Vec<Expr>),
    /// Explicit brackets; an argument written this way is passed by value.
    Bracketed(Box<Expr>),
    /// A literal followed by an argument list (fails at runtime).
    CalledLiteral { description: String },
}

impl Expr {
    /// Non-negative numeric literal. `-1` does not count: it is a negation of `1`.
    pub fn is_numeric_literal(&self) -> bool {
        matches!(self, Expr::Number(n) if !n.starts_with('-'))
    }

    pub fn as_chain(&self) -> Option<&Chain> {
        match self {
            Expr::Chain(c) => Some(c),
            _ => None,
        }
    }
}

/// A call in statement form: target chain plus the argument list written after it.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementCall {
    pub target: Chain,
    /// `None` when no arguments were written at all
    pub arguments: Option<Vec<Expr>>,
}

pub fn parse_expression(tokens: &[Token]) -> Result<Expr, TranslateError> {
    let line = tokens.first().map(|t| t.line).unwrap_or(0);
    if tokens.is_empty() {
        return Err(TranslateError::invalid_expression(line, "empty expression"));
    }
    let mut parser = ExprParser { tokens, pos: 0, line };
    let expr = parser.parse_imp()?;
    if parser.pos < tokens.len() {
        let t = &tokens[parser.pos];
        return Err(TranslateError::invalid_expression(t.line, format!("unexpected \"{}\"", t.content)));
    }
    Ok(expr)
}

/// Parses an assignment target; it must be a chain.
pub fn parse_target(tokens: &[Token]) -> Result<Chain, TranslateError> {
    let line = tokens.first().map(|t| t.line).unwrap_or(0);
    match parse_expression(tokens)? {
        Expr::Chain(c) => Ok(c),
        _ => Err(TranslateError::invalid_expression(line, "invalid assignment target")),
    }
}

/// Statement form: `f`, `f x, y`, `f (x)`, `a.b(1).c x`. Brackets directly after the
/// target only belong to it when more chain follows them; otherwise they are argument
/// syntax. With `call_keyword` the whole statement is a chain whose last bracket group
/// is the argument list (`Call f(x)`).
pub fn parse_statement_call(tokens: &[Token], call_keyword: bool) -> Result<StatementCall, TranslateError> {
    let line = tokens.first().map(|t| t.line).unwrap_or(0);
    if call_keyword {
        let mut chain = parse_target(tokens)?;
        let arguments = match chain.segments.last() {
            Some(Segment::Call(_)) => match chain.segments.pop() {
                Some(Segment::Call(args)) => Some(args),
                _ => None,
            },
            _ => None,
        };
        return Ok(StatementCall { target: chain, arguments });
    }

    let with_member = matches!(tokens.first(), Some(t) if t.kind == TokenKind::MemberAccessor);
    let mut end = if with_member { 2 } else { 1 };
    while end < tokens.len() {
        match tokens[end].kind {
            TokenKind::MemberAccessor => end += 2,
            TokenKind::OpenBrace => {
                let close = matching_close(tokens, end)
                    .ok_or_else(|| TranslateError::invalid_expression(line, "unbalanced brackets"))?;
                let continues = matches!(tokens.get(close + 1), Some(t) if t.kind == TokenKind::MemberAccessor);
                if !continues {
                    break;
                }
                end = close + 1;
            }
            _ => break,
        }
    }
    let end = end.min(tokens.len());
    let target = parse_target(&tokens[..end])?;
    let rest = &tokens[end..];
    if rest.is_empty() {
        return Ok(StatementCall { target, arguments: None });
    }

    // "f()" and "f(a, b)" are argument lists in their own right; "f (a)" is one
    // bracketed argument.
    if is_wrapped_in_brackets(rest) {
        let inner = &rest[1..rest.len() - 1];
        let has_separator = split_entries(inner)
            .map_err(|e| TranslateError::invalid_expression(e.line(), "unbalanced brackets"))?
            .len()
            > 1;
        if inner.is_empty() {
            return Ok(StatementCall { target, arguments: Some(Vec::new()) });
        }
        if has_separator {
            return Ok(StatementCall { target, arguments: Some(parse_argument_list(inner, line)?) });
        }
    }
    Ok(StatementCall { target, arguments: Some(parse_argument_list(rest, line)?) })
}

fn parse_argument_list(tokens: &[Token], line: usize) -> Result<Vec<Expr>, TranslateError> {
    split_entries(tokens)
        .map_err(|e| TranslateError::invalid_expression(e.line(), "unbalanced brackets"))?
        .into_iter()
        .map(|arg| {
            if arg.is_empty() {
                Err(TranslateError::invalid_expression(line, "missing argument"))
            } else {
                parse_expression(arg)
            }
        })
        .collect()
}

struct ExprParser<'a> {
    tokens: &'a [Token],
    pos: usize,
    line: usize,
}

impl<'a> ExprParser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn check_atom(&self, value: &str) -> bool {
        self.peek().map(|t| t.is_atom(value)).unwrap_or(false)
    }

    fn match_any(&mut self, ops: &[(&str, BinaryOp)]) -> Option<BinaryOp> {
        let t = self.peek()?;
        let op = ops.iter().find(|(s, _)| t.is_atom(s)).map(|(_, op)| *op)?;
        self.pos += 1;
        Some(op)
    }

    fn error(&self, message: &str) -> TranslateError {
        let line = self.peek().map(|t| t.line).unwrap_or(self.line);
        TranslateError::invalid_expression(line, message)
    }

    fn binary_level(
        &mut self,
        ops: &[(&str, BinaryOp)],
        next: fn(&mut Self) -> Result<Expr, TranslateError>,
    ) -> Result<Expr, TranslateError> {
        let mut lhs = next(self)?;
        while let Some(op) = self.match_any(ops) {
            let rhs = next(self)?;
            lhs = Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_imp(&mut self) -> Result<Expr, TranslateError> {
        self.binary_level(&[("IMP", BinaryOp::Imp)], Self::parse_eqv)
    }

    fn parse_eqv(&mut self) -> Result<Expr, TranslateError> {
        self.binary_level(&[("EQV", BinaryOp::Eqv)], Self::parse_xor)
    }

    fn parse_xor(&mut self) -> Result<Expr, TranslateError> {
        self.binary_level(&[("XOR", BinaryOp::Xor)], Self::parse_or)
    }

    fn parse_or(&mut self) -> Result<Expr, TranslateError> {
        self.binary_level(&[("OR", BinaryOp::Or)], Self::parse_and)
    }

    fn parse_and(&mut self) -> Result<Expr, TranslateError> {
        self.binary_level(&[("AND", BinaryOp::And)], Self::parse_not)
    }

    fn parse_not(&mut self) -> Result<Expr, TranslateError> {
        if self.check_atom("NOT") {
            self.pos += 1;
            let operand = self.parse_not()?;
            return Ok(Expr::Unary { op: UnaryOp::Not, operand: Box::new(operand) });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, TranslateError> {
        self.binary_level(
            &[
                ("=", BinaryOp::Eq),
                ("<>", BinaryOp::NotEq),
                ("<=", BinaryOp::Lte),
                (">=", BinaryOp::Gte),
                ("<", BinaryOp::Lt),
                (">", BinaryOp::Gt),
                ("IS", BinaryOp::Is),
            ],
            Self::parse_concat,
        )
    }

    fn parse_concat(&mut self) -> Result<Expr, TranslateError> {
        let first = self.parse_additive()?;
        if !self.check_atom("&") {
            return Ok(first);
        }
        let mut parts = vec![first];
        while self.check_atom("&") {
            self.pos += 1;
            parts.push(self.parse_additive()?);
        }
        Ok(Expr::Concat(parts))
    }

    fn parse_additive(&mut self) -> Result<Expr, TranslateError> {
        self.binary_level(&[("+", BinaryOp::Add), ("-", BinaryOp::Subt)], Self::parse_mod)
    }

    fn parse_mod(&mut self) -> Result<Expr, TranslateError> {
        self.binary_level(&[("MOD", BinaryOp::Mod)], Self::parse_int_div)
    }

    fn parse_int_div(&mut self) -> Result<Expr, TranslateError> {
        self.binary_level(&[("\\", BinaryOp::IntDiv)], Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, TranslateError> {
        self.binary_level(&[("*", BinaryOp::Mult), ("/", BinaryOp::Div)], Self::parse_unary)
    }

    fn parse_unary(&mut self) -> Result<Expr, TranslateError> {
        if self.check_atom("-") {
            self.pos += 1;
            let operand = self.parse_unary()?;
            return Ok(Expr::Unary { op: UnaryOp::Neg, operand: Box::new(operand) });
        }
        if self.check_atom("+") {
            self.pos += 1;
            return self.parse_unary();
        }
        self.parse_power()
    }

    fn parse_power(&mut self) -> Result<Expr, TranslateError> {
        let mut lhs = self.parse_primary()?;
        while self.check_atom("^") {
            self.pos += 1;
            let rhs = if self.check_atom("-") {
                self.pos += 1;
                Expr::Unary { op: UnaryOp::Neg, operand: Box::new(self.parse_primary()?) }
            } else {
                self.parse_primary()?
            };
            lhs = Expr::Binary { op: BinaryOp::Pow, lhs: Box::new(lhs), rhs: Box::new(rhs) };
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<Expr, TranslateError> {
        let t = self.peek().ok_or_else(|| self.error("expression ended unexpectedly"))?;
        match t.kind {
            TokenKind::NumericValue => {
                self.pos += 1;
                self.literal_or_called(Expr::Number(t.content.clone()), format!("[number: {}]", t.content))
            }
            TokenKind::StringLiteral => {
                self.pos += 1;
                self.literal_or_called(Expr::Str(t.content.clone()), format!("[string: \"{}\"]", t.content))
            }
            TokenKind::DateLiteral => {
                self.pos += 1;
                self.literal_or_called(Expr::Date(t.content.clone()), format!("[date: #{}#]", t.content))
            }
            TokenKind::OpenBrace => {
                let close = matching_close(self.tokens, self.pos).ok_or_else(|| self.error("unbalanced brackets"))?;
                let inner = parse_expression(&self.tokens[self.pos + 1..close])?;
                self.pos = close + 1;
                Ok(Expr::Bracketed(Box::new(inner)))
            }
            TokenKind::Atom => self.parse_atom(t),
            TokenKind::MemberAccessor => self.chain_from(ChainHead::With { line: t.line }),
            _ => Err(self.error(&format!("unexpected {}", t.kind))),
        }
    }

    fn literal_or_called(&mut self, literal: Expr, description: String) -> Result<Expr, TranslateError> {
        if let Some(t) = self.peek() {
            if t.kind == TokenKind::OpenBrace {
                let close = matching_close(self.tokens, self.pos).ok_or_else(|| self.error("unbalanced brackets"))?;
                self.pos = close + 1;
                return Ok(Expr::CalledLiteral { description });
            }
        }
        Ok(literal)
    }

    fn parse_atom(&mut self, t: &'a Token) -> Result<Expr, TranslateError> {
        let keyword = [
            ("TRUE", Keyword::True),
            ("FALSE", Keyword::False),
            ("EMPTY", Keyword::Empty),
            ("NULL", Keyword::Null),
            ("NOTHING", Keyword::Nothing),
        ]
        .into_iter()
        .find(|(s, _)| t.is_atom(s));
        if let Some((_, k)) = keyword {
            self.pos += 1;
            return Ok(Expr::Keyword(k));
        }
        if t.is_atom("NEW") {
            self.pos += 1;
            let class = self.peek().filter(|c| c.is_name_like()).ok_or_else(|| self.error("expected class name after \"New\""))?;
            self.pos += 1;
            if matches!(self.peek(), Some(b) if b.kind == TokenKind::OpenBrace) {
                return Err(self.error(&format!("class name \"{}\" may not be followed by brackets", class.content)));
            }
            return Ok(Expr::New { class_name: class.content.clone(), line: class.line });
        }
        let head = if t.is_atom("ME") {
            ChainHead::Me
        } else if t.is_name_like() {
            ChainHead::Name { name: t.content.clone(), line: t.line }
        } else {
            return Err(self.error(&format!("unexpected \"{}\"", t.content)));
        };
        self.pos += 1;
        self.chain_from(head)
    }

    /// Member accesses and bracketed argument lists following a chain head.
    fn chain_from(&mut self, head: ChainHead) -> Result<Expr, TranslateError> {
        let mut segments = Vec::new();
        while let Some(next) = self.peek() {
            match next.kind {
                TokenKind::MemberAccessor => {
                    let member = self
                        .tokens
                        .get(self.pos + 1)
                        .filter(|m| m.kind == TokenKind::Atom)
                        .ok_or_else(|| self.error("expected member name after \".\""))?;
                    segments.push(Segment::Member(member.content.clone()));
                    self.pos += 2;
                }
                TokenKind::OpenBrace => {
                    let close = matching_close(self.tokens, self.pos).ok_or_else(|| self.error("unbalanced brackets"))?;
                    let inner = &self.tokens[self.pos + 1..close];
                    let args = if inner.is_empty() { Vec::new() } else { parse_argument_list(inner, next.line)? };
                    segments.push(Segment::Call(args));
                    self.pos = close + 1;
                }
                _ => break,
            }
        }
        Ok(Expr::Chain(Chain { head, segments }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lexer::Lexer;
    use crate::core::number_rebuilder::rebuild;

    fn toks(src: &str) -> Vec<Token> {
        rebuild(&Lexer::new(src).tokenize().unwrap())
    }

    fn expr(src: &str) -> Expr {
        parse_expression(&toks(src)).unwrap()
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        match expr("1 + 2 * 3") {
            Expr::Binary { op: BinaryOp::Add, rhs, .. } => {
                assert!(matches!(*rhs, Expr::Binary { op: BinaryOp::Mult, .. }))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn concat_is_flattened_but_addition_nests() {
        match expr("a & 1 + 2 & c & d") {
            Expr::Concat(parts) => {
                assert_eq!(parts.len(), 4);
                assert!(matches!(parts[1], Expr::Binary { op: BinaryOp::Add, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn not_binds_looser_than_comparison() {
        match expr("Not a = b") {
            Expr::Unary { op: UnaryOp::Not, operand } => {
                assert!(matches!(*operand, Expr::Binary { op: BinaryOp::Eq, .. }))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn negation_binds_looser_than_power() {
        match expr("-x ^ 2") {
            Expr::Unary { op: UnaryOp::Neg, operand } => {
                assert!(matches!(*operand, Expr::Binary { op: BinaryOp::Pow, .. }))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn chains_with_members_and_calls() {
        match expr("a.b(1, (c)).d") {
            Expr::Chain(chain) => {
                assert_eq!(chain.segments.len(), 3);
                match &chain.segments[1] {
                    Segment::Call(args) => assert!(matches!(args[1], Expr::Bracketed(_))),
                    other => panic!("unexpected {:?}", other),
                }
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn statement_form_bracket_rules() {
        let single = parse_statement_call(&toks("func (x)"), false).unwrap();
        assert!(matches!(single.arguments.as_deref(), Some([Expr::Bracketed(_)])));

        let listed = parse_statement_call(&toks("func (x), y"), false).unwrap();
        assert_eq!(listed.arguments.map(|a| a.len()), Some(2));

        let indexed = parse_statement_call(&toks("a.b(1).c 2"), false).unwrap();
        assert_eq!(indexed.target.segments.len(), 3);

        let keyword = parse_statement_call(&toks("F(x)"), true).unwrap();
        assert!(matches!(keyword.arguments.as_deref(), Some([Expr::Chain(_)])));

        let forced = parse_statement_call(&toks("b()"), false).unwrap();
        assert_eq!(forced.arguments, Some(vec![]));
    }

    #[test]
    fn leading_accessor_starts_a_with_chain() {
        match expr(".Items(1).Name") {
            Expr::Chain(Chain { head: ChainHead::With { line: 1 }, segments }) => {
                assert_eq!(segments.len(), 3);
                assert_eq!(segments[0], Segment::Member("Items".into()));
            }
            other => panic!("unexpected {:?}", other),
        }
        let call = parse_statement_call(&toks(".Draw \"Test\""), false).unwrap();
        assert_eq!(call.target.segments, vec![Segment::Member("Draw".into())]);
        assert_eq!(call.arguments.map(|a| a.len()), Some(1));
    }

    #[test]
    fn new_with_brackets_is_rejected() {
        assert!(parse_expression(&toks("new C1()")).is_err());
        assert!(matches!(expr("New C1"), Expr::New { .. }));
    }

    #[test]
    fn literal_called_like_function() {
        let call = parse_statement_call(&toks("func 1()"), false).unwrap();
        assert!(matches!(call.arguments.as_deref(), Some([Expr::CalledLiteral { .. }])));
    }

    #[test]
    fn negative_literal_is_not_numeric_literal() {
        assert!(!expr("-1").is_numeric_literal());
        assert!(expr("1").is_numeric_literal());
    }
}
