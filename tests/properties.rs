use proptest::prelude::*;

use vbs2cs::core::error::ParseError;
use vbs2cs::core::lexer::Lexer;
use vbs2cs::core::number_rebuilder::rebuild;
use vbs2cs::core::parser::parse;
use vbs2cs::core::TokenKind;

fn fragment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "x", "a.b", "1", "12", ".5", "1.25", "-", "+", "*", "=", "(", ")", ",", "1E5", "2E", "&H1F", "&O17&",
        "To", "Step", "Not", " ", "\n", ":", "f(", "-.5", "3.", "Mod",
    ])
}

fn source() -> impl Strategy<Value = String> {
    prop::collection::vec(fragment(), 0..40).prop_map(|parts| parts.join(" "))
}

proptest! {
    #[test]
    fn rebuilding_twice_changes_nothing(src in source()) {
        let raw = Lexer::new(&src).tokenize();
        prop_assume!(raw.is_ok());
        let once = rebuild(&raw.unwrap());
        prop_assert_eq!(rebuild(&once), once);
    }

    #[test]
    fn rebuilt_stream_has_no_ambiguous_points(src in source()) {
        let raw = Lexer::new(&src).tokenize();
        prop_assume!(raw.is_ok());
        let rebuilt = rebuild(&raw.unwrap());
        prop_assert!(rebuilt.iter().all(|t| t.kind != TokenKind::MemberAccessorOrDecimalPoint));
    }

    #[test]
    fn balanced_brackets_parse(depth in 0usize..12, blank in 0usize..4) {
        let src = format!("{}x = {}1{}\ny = 2", "\n".repeat(blank), "(".repeat(depth), ")".repeat(depth));
        let tokens = rebuild(&Lexer::new(&src).tokenize().unwrap());
        let blocks = parse(&tokens);
        prop_assert!(blocks.is_ok(), "{:?}", blocks);
    }

    #[test]
    fn unclosed_bracket_cites_its_line(depth in 1usize..12, blank in 0usize..4) {
        let src = format!("{}x = {}1{}\ny = 2", "\n".repeat(blank), "(".repeat(depth), ")".repeat(depth - 1));
        let tokens = rebuild(&Lexer::new(&src).tokenize().unwrap());
        prop_assert_eq!(parse(&tokens).unwrap_err(), ParseError::MismatchedBrackets { line: blank + 1 });
    }

    #[test]
    fn stray_closing_bracket_cites_its_line(depth in 0usize..12, blank in 0usize..4) {
        let src = format!("a = 0\n{}x = {}1{}", "\n".repeat(blank), "(".repeat(depth), ")".repeat(depth + 1));
        let tokens = rebuild(&Lexer::new(&src).tokenize().unwrap());
        prop_assert_eq!(parse(&tokens).unwrap_err(), ParseError::MismatchedBrackets { line: blank + 2 });
    }
}
