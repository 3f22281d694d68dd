// src/core/number_rebuilder.rs
//! Literal reconstructor.
//!
//! Takes the atomizer's output and merges the pieces of each numeric literal (sign, digits,
//! decimal point, exponent, hex/octal suffix) into a single `NumericValue` token. Once that
//! is done every remaining `MemberAccessorOrDecimalPoint` can only be a member accessor, so
//! the output never contains an ambiguous token. Missing integer parts are made explicit
//! (".1" becomes "0.1").
//!
//! A leading minus sign or decimal point may only open a literal at the start of the stream
//! or straight after an operator, comparison, opening bracket, separator or expression
//! keyword: "Test -1" stays a subtraction because "Test" might be a value, whereas in
//! "For a = -1 To -10 Step -1" every minus sign belongs to its number.
//!
//! Malformed sequences are passed through as their original tokens. Running the pass over
//! its own output changes nothing.

use tracing::trace;

use crate::core::token::{Token, TokenKind};

pub fn rebuild(tokens: &[Token]) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut index = 0;
    while index < tokens.len() {
        let prefix_allowed = can_start_signed_number(out.last());
        match try_read_number(&tokens[index..], prefix_allowed) {
            Some((number, consumed)) => {
                trace!(value = %number.content, consumed, "rebuilt numeric literal");
                out.push(number);
                index += consumed;
            }
            None => {
                out.push(resolve_accessor(&tokens[index]));
                index += 1;
            }
        }
    }
    out
}

fn resolve_accessor(token: &Token) -> Token {
    if token.kind == TokenKind::MemberAccessorOrDecimalPoint {
        Token::new(TokenKind::MemberAccessor, ".", token.line)
    } else {
        token.clone()
    }
}

fn can_start_signed_number(previous: Option<&Token>) -> bool {
    match previous {
        None => true,
        Some(t) => match t.kind {
            TokenKind::OpenBrace | TokenKind::ArgumentSeparator => true,
            TokenKind::EndOfStatementNewLine | TokenKind::EndOfStatementSameLine => true,
            TokenKind::Atom => {
                t.is_operator() || t.is_comparison() || t.is_logical_operator() || t.is_expression_keyword()
            }
            _ => false,
        },
    }
}

/// Digits with an optional exponent marker: "12", "1E5", "5E" (exponent sign follows as a separate atom).
struct DigitAtom<'a> {
    mantissa: &'a str,
    exponent: Option<&'a str>,
}

fn digit_atom(token: &Token) -> Option<DigitAtom<'_>> {
    if token.kind != TokenKind::Atom {
        return None;
    }
    let s = token.content.as_str();
    let split = s.find(['e', 'E']);
    let (mantissa, exponent) = match split {
        Some(i) => (&s[..i], Some(&s[i + 1..])),
        None => (s, None),
    };
    let digits_only = |v: &str| v.chars().all(|c| c.is_ascii_digit());
    if mantissa.is_empty() || !digits_only(mantissa) {
        return None;
    }
    if let Some(exp) = exponent {
        if !digits_only(exp) {
            return None;
        }
    }
    Some(DigitAtom { mantissa, exponent })
}

fn is_ambiguous_point(token: Option<&Token>) -> bool {
    matches!(token, Some(t) if t.kind == TokenKind::MemberAccessorOrDecimalPoint)
}

fn try_read_number(tokens: &[Token], prefix_allowed: bool) -> Option<(Token, usize)> {
    let first = tokens.first()?;
    let line = first.line;
    let mut idx = 0;
    let negative = prefix_allowed && first.is_atom("-");
    if negative {
        idx += 1;
    }
    let sign = if negative { "-" } else { "" };

    if let Some(value) = tokens.get(idx).and_then(radix_literal) {
        let text = if negative { (-value).to_string() } else { value.to_string() };
        return Some((Token::numeric(text, line), idx + 1));
    }

    let mut integer = "0";
    let mut fraction: Option<&str> = None;
    let mut exponent: Option<(String, bool)> = None;

    if let Some(int_atom) = tokens.get(idx).and_then(digit_atom) {
        integer = int_atom.mantissa;
        idx += 1;
        match int_atom.exponent {
            Some(exp) => exponent = Some((exp.to_string(), exp.is_empty())),
            None => {
                if is_ambiguous_point(tokens.get(idx)) {
                    if let Some(frac) = tokens.get(idx + 1).and_then(digit_atom) {
                        fraction = Some(frac.mantissa);
                        exponent = frac.exponent.map(|e| (e.to_string(), e.is_empty()));
                        idx += 2;
                    }
                }
            }
        }
    } else if prefix_allowed && is_ambiguous_point(tokens.get(idx)) {
        let frac = tokens.get(idx + 1).and_then(digit_atom)?;
        fraction = Some(frac.mantissa);
        exponent = frac.exponent.map(|e| (e.to_string(), e.is_empty()));
        idx += 2;
    } else {
        return None;
    }

    let mut exponent_text = String::new();
    if let Some((digits, needs_signed_digits)) = exponent {
        if needs_signed_digits {
            let exp_sign = tokens.get(idx).filter(|t| t.is_atom("-") || t.is_atom("+"))?;
            let exp_digits = tokens.get(idx + 1).and_then(digit_atom)?;
            if exp_digits.exponent.is_some() {
                return None;
            }
            exponent_text = format!("E{}{}", exp_sign.content, exp_digits.mantissa);
            idx += 2;
        } else {
            exponent_text = format!("E{}", digits);
        }
    }

    let text = match fraction {
        Some(f) => format!("{}{}.{}{}", sign, integer, f, exponent_text),
        None => format!("{}{}{}", sign, integer, exponent_text),
    };
    Some((Token::numeric(text, line), idx))
}

/// Value of `&H1F` / `&O17`, optionally with the trailing `&` long suffix.
///
/// The bits are read as a signed Integer when they fit in 16 and no suffix is written,
/// otherwise as a signed Long (`&HFFFF` is -1, `&HFFFF&` is 65535).
fn radix_literal(token: &Token) -> Option<i64> {
    if token.kind != TokenKind::Atom || !token.content.starts_with('&') || token.content.len() < 3 {
        return None;
    }
    let long_suffix = token.content.len() > 3 && token.content.ends_with('&');
    let body = token.content.trim_end_matches('&');
    let radix = match body.get(1..2)? {
        "H" | "h" => 16,
        "O" | "o" => 8,
        _ => return None,
    };
    let digits = body.get(2..)?;
    if digits.is_empty() {
        return None;
    }
    let bits = u32::from_str_radix(digits, radix).ok()?;
    let value = match u16::try_from(bits) {
        Ok(short) if !long_suffix => i64::from(short as i16),
        _ => i64::from(bits as i32),
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lexer::Lexer;

    fn rebuilt(src: &str) -> Vec<(TokenKind, String)> {
        let raw = Lexer::new(src).tokenize().unwrap();
        rebuild(&raw).into_iter().map(|t| (t.kind, t.content)).collect()
    }

    fn num(s: &str) -> (TokenKind, String) {
        (TokenKind::NumericValue, s.to_string())
    }

    fn atom(s: &str) -> (TokenKind, String) {
        (TokenKind::Atom, s.to_string())
    }

    #[test]
    fn inserts_leading_zero() {
        assert_eq!(rebuilt(".1"), vec![num("0.1")]);
        assert_eq!(rebuilt("x = -.5"), vec![atom("x"), atom("="), num("-0.5")]);
    }

    #[test]
    fn minus_after_value_is_subtraction() {
        assert_eq!(rebuilt("Test -1"), vec![atom("Test"), atom("-"), num("1")]);
        assert_eq!(rebuilt("a - 1.5"), vec![atom("a"), atom("-"), num("1.5")]);
    }

    #[test]
    fn minus_after_keyword_or_operator_is_a_sign() {
        let toks = rebuilt("For a = -1 To -10 Step -1");
        assert_eq!(toks[3], num("-1"));
        assert_eq!(toks[5], num("-10"));
        assert_eq!(toks[7], num("-1"));
        assert_eq!(rebuilt("f(-2)")[2], num("-2"));
    }

    #[test]
    fn member_access_is_disambiguated() {
        let toks = rebuilt("a.b");
        assert_eq!(toks[1].0, TokenKind::MemberAccessor);
        assert!(toks.iter().all(|(k, _)| *k != TokenKind::MemberAccessorOrDecimalPoint));
    }

    #[test]
    fn exponents_and_radix_literals() {
        assert_eq!(rebuilt("1E5"), vec![num("1E5")]);
        assert_eq!(rebuilt("1.5E-3"), vec![num("1.5E-3")]);
        assert_eq!(rebuilt("&H0001"), vec![num("1")]);
        assert_eq!(rebuilt("&HFF&"), vec![num("255")]);
        assert_eq!(rebuilt("&O17"), vec![num("15")]);
    }

    #[test]
    fn radix_literals_wrap_to_signed_integer_or_long() {
        assert_eq!(rebuilt("&HFFFF"), vec![num("-1")]);
        assert_eq!(rebuilt("&H8000"), vec![num("-32768")]);
        assert_eq!(rebuilt("&H7FFF"), vec![num("32767")]);
        assert_eq!(rebuilt("&HFFFF&"), vec![num("65535")]);
        assert_eq!(rebuilt("&H10000"), vec![num("65536")]);
        assert_eq!(rebuilt("&HFFFFFFFF"), vec![num("-1")]);
        assert_eq!(rebuilt("&O177777"), vec![num("-1")]);
        assert_eq!(rebuilt("x = -&HFFFF"), vec![atom("x"), atom("="), num("1")]);
        assert_eq!(rebuilt("x = -&H10"), vec![atom("x"), atom("="), num("-16")]);
        // wider than a Long is not a literal
        assert_eq!(rebuilt("&H100000000"), vec![atom("&H100000000")]);
    }

    #[test]
    fn malformed_sequences_are_left_alone() {
        assert_eq!(rebuilt("5E x"), vec![atom("5E"), atom("x")]);
        assert_eq!(rebuilt("- x"), vec![atom("-"), atom("x")]);
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let raw = Lexer::new("x = -.5 + a.b(1.25, -3) - &H10").tokenize().unwrap();
        let once = rebuild(&raw);
        assert_eq!(rebuild(&once), once);
    }
}
