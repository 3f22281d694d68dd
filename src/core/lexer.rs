// src/core/lexer.rs
//! Raw-text atomizer: splits VBScript source into atoms, literals, brackets, separators,
//! comments and end-of-statement markers. Numeric literals are NOT assembled here; digit
//! runs and `.` stay separate until the literal reconstructor has looked at them.

use std::iter::Peekable;
use std::str::Chars;

use tracing::debug;
use unicode_ident::{is_xid_continue, is_xid_start};
use unicode_normalization::UnicodeNormalization;

use crate::core::error::LexError;
use crate::core::token::{Token, TokenKind};

pub struct Lexer {
    source: String,
}

struct Cursor<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    tokens: Vec<Token>,
    /// Content seen on the current line since the last end-of-statement
    line_has_content: bool,
}

impl<'a> Cursor<'a> {
    fn push(&mut self, kind: TokenKind, content: impl Into<String>) {
        let is_break = matches!(kind, TokenKind::EndOfStatementNewLine | TokenKind::EndOfStatementSameLine);
        self.tokens.push(Token::new(kind, content, self.line));
        self.line_has_content = !is_break;
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn next_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn read_while(&mut self, mut pred: impl FnMut(char) -> bool) -> String {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            s.push(c);
            self.chars.next();
        }
        s
    }

    fn read_to_line_end(&mut self) -> String {
        self.read_while(|c| c != '\n' && c != '\r')
    }
}

fn is_word_start(c: char) -> bool {
    c.is_ascii_alphanumeric() || is_xid_start(c)
}

fn is_word_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric() || is_xid_continue(c)
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self { source: input.nfc().collect() }
    }

    pub fn tokenize(&self) -> Result<Vec<Token>, LexError> {
        let mut cur = Cursor {
            chars: self.source.chars().peekable(),
            line: 1,
            tokens: Vec::new(),
            line_has_content: false,
        };

        while let Some(c) = cur.chars.next() {
            match c {
                '\r' => {
                    cur.next_if('\n');
                    self.new_line(&mut cur);
                }
                '\n' => self.new_line(&mut cur),
                ' ' | '\t' => {}
                '_' if self.is_line_continuation(&cur) => {
                    cur.read_while(|c| c == ' ' || c == '\t');
                    cur.next_if('\r');
                    cur.next_if('\n');
                    cur.line += 1;
                }
                '\'' => {
                    let text = cur.read_to_line_end();
                    self.push_comment(&mut cur, text);
                }
                '"' => {
                    let s = self.read_string(&mut cur)?;
                    cur.push(TokenKind::StringLiteral, s);
                }
                '#' => {
                    let d = cur.read_while(|c| c != '#' && c != '\n' && c != '\r');
                    if !cur.next_if('#') {
                        return Err(LexError::UnterminatedDate { line: cur.line });
                    }
                    cur.push(TokenKind::DateLiteral, d.trim());
                }
                '[' => {
                    let name = cur.read_while(|c| c != ']' && c != '\n' && c != '\r');
                    if !cur.next_if(']') {
                        return Err(LexError::UnexpectedCharacter { ch: '[', line: cur.line });
                    }
                    cur.push(TokenKind::Atom, name);
                }
                '.' => cur.push(TokenKind::MemberAccessorOrDecimalPoint, "."),
                '(' => cur.push(TokenKind::OpenBrace, "("),
                ')' => cur.push(TokenKind::CloseBrace, ")"),
                ',' => cur.push(TokenKind::ArgumentSeparator, ","),
                ':' => cur.push(TokenKind::EndOfStatementSameLine, ":"),
                '<' => {
                    let op = if cur.next_if('>') {
                        "<>"
                    } else if cur.next_if('=') {
                        "<="
                    } else {
                        "<"
                    };
                    cur.push(TokenKind::Atom, op);
                }
                '>' => {
                    let op = if cur.next_if('=') { ">=" } else { ">" };
                    cur.push(TokenKind::Atom, op);
                }
                '&' => {
                    let radix = cur.peek().filter(|c| matches!(c, 'h' | 'H' | 'o' | 'O'));
                    match radix {
                        Some(r) => {
                            cur.chars.next();
                            let digits = cur.read_while(|c| c.is_ascii_hexdigit());
                            let mut atom = format!("&{}{}", r.to_ascii_uppercase(), digits);
                            if cur.next_if('&') {
                                atom.push('&');
                            }
                            cur.push(TokenKind::Atom, atom);
                        }
                        None => cur.push(TokenKind::Atom, "&"),
                    }
                }
                '=' | '+' | '-' | '*' | '/' | '\\' | '^' => cur.push(TokenKind::Atom, c.to_string()),
                c if is_word_start(c) => {
                    let mut word = c.to_string();
                    word.push_str(&cur.read_while(is_word_continue));
                    if word.eq_ignore_ascii_case("rem")
                        && matches!(cur.peek(), None | Some(' ') | Some('\t') | Some('\n') | Some('\r'))
                    {
                        let text = cur.read_to_line_end();
                        let text = text.strip_prefix(' ').unwrap_or(&text).to_string();
                        self.push_comment(&mut cur, text);
                    } else {
                        cur.push(TokenKind::Atom, word);
                    }
                }
                other => return Err(LexError::UnexpectedCharacter { ch: other, line: cur.line }),
            }
        }

        debug!(tokens = cur.tokens.len(), lines = cur.line, "atomized source");
        Ok(cur.tokens)
    }

    fn new_line(&self, cur: &mut Cursor<'_>) {
        cur.push(TokenKind::EndOfStatementNewLine, "");
        cur.line += 1;
    }

    /// A lone `_` followed only by whitespace up to the end of the line.
    fn is_line_continuation(&self, cur: &Cursor<'_>) -> bool {
        let rest: String = cur.chars.clone().take_while(|c| *c != '\n' && *c != '\r').collect();
        rest.trim().is_empty()
    }

    fn push_comment(&self, cur: &mut Cursor<'_>, text: String) {
        if cur.line_has_content {
            cur.push(TokenKind::EndOfStatementSameLine, "");
            cur.push(TokenKind::InlineComment, text);
        } else {
            cur.push(TokenKind::Comment, text);
        }
    }

    fn read_string(&self, cur: &mut Cursor<'_>) -> Result<String, LexError> {
        let mut s = String::new();
        loop {
            match cur.chars.next() {
                Some('"') => {
                    if cur.next_if('"') {
                        s.push('"');
                    } else {
                        return Ok(s);
                    }
                }
                Some('\n') | Some('\r') | None => {
                    return Err(LexError::UnterminatedString { line: cur.line })
                }
                Some(c) => s.push(c),
            }
        }
    }
}
