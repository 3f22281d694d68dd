// src/core/token.rs
//! Token model shared by the atomizer, the literal reconstructor and the block parser.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    /// Keyword, name or operator word
    Atom,
    StringLiteral,
    DateLiteral,
    NumericValue,
    /// `.` before the literal reconstructor has decided what it is
    MemberAccessorOrDecimalPoint,
    MemberAccessor,
    OpenBrace,
    CloseBrace,
    ArgumentSeparator,
    EndOfStatementNewLine,
    /// `:` separator, or the implicit break before an inline comment
    EndOfStatementSameLine,
    Comment,
    InlineComment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub content: String,
    /// 1-based source line
    pub line: usize,
}

const OPERATORS: &[&str] = &["+", "-", "*", "/", "\\", "^", "&", "MOD"];
const COMPARISONS: &[&str] = &["=", "<>", "<", ">", "<=", ">=", "IS"];
const LOGICAL_OPERATORS: &[&str] = &["NOT", "AND", "OR", "XOR", "EQV", "IMP"];

/// Keywords after which a fresh expression starts (so a minus sign there can only be a sign).
const EXPRESSION_KEYWORDS: &[&str] = &[
    "TO", "STEP", "CASE", "IF", "THEN", "ELSEIF", "ELSE", "WHILE", "UNTIL", "IN",
];

impl Token {
    pub fn new(kind: TokenKind, content: impl Into<String>, line: usize) -> Self {
        Self { kind, content: content.into(), line }
    }

    pub fn atom(content: impl Into<String>, line: usize) -> Self {
        Self::new(TokenKind::Atom, content, line)
    }

    pub fn numeric(content: impl Into<String>, line: usize) -> Self {
        Self::new(TokenKind::NumericValue, content, line)
    }

    pub fn end_of_statement(line: usize) -> Self {
        Self::new(TokenKind::EndOfStatementNewLine, "", line)
    }

    pub fn is_end_of_statement(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::EndOfStatementNewLine | TokenKind::EndOfStatementSameLine
        )
    }

    /// Case-insensitive match against an atom's content.
    pub fn is_atom(&self, value: &str) -> bool {
        self.kind == TokenKind::Atom && self.content.eq_ignore_ascii_case(value)
    }

    fn atom_in(&self, set: &[&str]) -> bool {
        self.kind == TokenKind::Atom && set.iter().any(|v| self.content.eq_ignore_ascii_case(v))
    }

    pub fn is_operator(&self) -> bool {
        self.atom_in(OPERATORS)
    }

    pub fn is_comparison(&self) -> bool {
        self.atom_in(COMPARISONS)
    }

    pub fn is_logical_operator(&self) -> bool {
        self.atom_in(LOGICAL_OPERATORS)
    }

    pub fn is_expression_keyword(&self) -> bool {
        self.atom_in(EXPRESSION_KEYWORDS)
    }

    /// True for atoms that read like identifiers (letters, digits, underscores).
    pub fn is_name_like(&self) -> bool {
        self.kind == TokenKind::Atom
            && self
                .content
                .chars()
                .next()
                .map(|c| c.is_alphabetic() || c == '_')
                .unwrap_or(false)
            && !self.is_operator()
            && !self.is_comparison()
            && !self.is_logical_operator()
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenKind::Atom => "atom",
            TokenKind::StringLiteral => "string",
            TokenKind::DateLiteral => "date",
            TokenKind::NumericValue => "number",
            TokenKind::MemberAccessorOrDecimalPoint => "accessor-or-decimal-point",
            TokenKind::MemberAccessor => "member-accessor",
            TokenKind::OpenBrace => "(",
            TokenKind::CloseBrace => ")",
            TokenKind::ArgumentSeparator => ",",
            TokenKind::EndOfStatementNewLine => "end-of-line",
            TokenKind::EndOfStatementSameLine => ":",
            TokenKind::Comment => "comment",
            TokenKind::InlineComment => "inline-comment",
        };
        write!(f, "{}", name)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::Atom => write!(f, "Atom('{}') @{}", self.content, self.line),
            TokenKind::NumericValue => write!(f, "Number({}) @{}", self.content, self.line),
            TokenKind::StringLiteral => write!(f, "String(\"{}\") @{}", self.content, self.line),
            TokenKind::DateLiteral => write!(f, "Date(#{}#) @{}", self.content, self.line),
            TokenKind::Comment | TokenKind::InlineComment => {
                write!(f, "{}('{}) @{}", self.kind, self.content, self.line)
            }
            other => write!(f, "{} @{}", other, self.line),
        }
    }
}
