use super::*;
use crate::syntax::kind::TokenCategory;

fn lex(input: &str) -> Vec<(SyntaxKind, &str)> {
    Lexer::new(input).filter(|(kind, _)| *kind != SyntaxKind::Whitespace).collect()
}

#[test]
fn test_keywords_and_builtin_identifiers() {
    let tokens = lex("class get show dynamic");
    assert_eq!(
        tokens,
        vec![
            (SyntaxKind::KwClass, "class"),
            (SyntaxKind::KwGet, "get"),
            (SyntaxKind::KwShow, "show"),
            (SyntaxKind::Ident, "dynamic"),
        ]
    );
    assert!(SyntaxKind::KwGet.is_identifier_like());
    assert!(!SyntaxKind::KwClass.is_identifier_like());
}

#[test]
fn test_operators_prefer_longest_match() {
    let tokens = lex("a ~/= b >>= c ?? d ..e ...f => g");
    let kinds: Vec<SyntaxKind> = tokens.iter().map(|(kind, _)| *kind).collect();
    assert_eq!(
        kinds,
        vec![
            SyntaxKind::Ident,
            SyntaxKind::TildeSlashEq,
            SyntaxKind::Ident,
            SyntaxKind::GtGtEq,
            SyntaxKind::Ident,
            SyntaxKind::QuestionQuestion,
            SyntaxKind::Ident,
            SyntaxKind::DotDot,
            SyntaxKind::Ident,
            SyntaxKind::Ellipsis,
            SyntaxKind::Ident,
            SyntaxKind::FatArrow,
            SyntaxKind::Ident,
        ]
    );
}

#[test]
fn test_numbers() {
    let tokens = lex("1 0x1F 2.5 3e10 .5");
    assert_eq!(
        tokens,
        vec![
            (SyntaxKind::Integer, "1"),
            (SyntaxKind::Integer, "0x1F"),
            (SyntaxKind::Double, "2.5"),
            (SyntaxKind::Double, "3e10"),
            (SyntaxKind::Double, ".5"),
        ]
    );
}

#[test]
fn test_strings() {
    let tokens = lex(r#"'a\'b' "x" '' r'\d' '''multi
line'''"#);
    assert_eq!(
        tokens,
        vec![
            (SyntaxKind::String, r"'a\'b'"),
            (SyntaxKind::String, "\"x\""),
            (SyntaxKind::String, "''"),
            (SyntaxKind::String, r"r'\d'"),
            (SyntaxKind::String, "'''multi\nline'''"),
        ]
    );
}

#[test]
fn test_unterminated_string_stops_at_line_end() {
    let tokens = lex("'abc\nx");
    assert_eq!(tokens, vec![(SyntaxKind::String, "'abc"), (SyntaxKind::Ident, "x")]);
}

#[test]
fn test_comments() {
    let tokens = lex("a // line\n/* outer /* inner */ still */ b /* open");
    assert_eq!(
        tokens,
        vec![
            (SyntaxKind::Ident, "a"),
            (SyntaxKind::Comment, "// line"),
            (SyntaxKind::Comment, "/* outer /* inner */ still */"),
            (SyntaxKind::Ident, "b"),
            (SyntaxKind::Comment, "/* open"),
        ]
    );
}

#[test]
fn test_error_token() {
    let tokens = lex("a ` b");
    assert_eq!(tokens, vec![(SyntaxKind::Ident, "a"), (SyntaxKind::Error, "`"), (SyntaxKind::Ident, "b")]);
}

#[test]
fn test_starting_at_reports_absolute_spans() {
    let source = "abc def";
    let mut lexer = Lexer::starting_at(source, 4);
    assert_eq!(lexer.next_significant(), Some((SyntaxKind::Ident, 4..7)));
    assert_eq!(lexer.next_significant(), None);
}

#[test]
fn test_categories() {
    assert_eq!(SyntaxKind::PlusEq.category(), TokenCategory::Operator);
    assert_eq!(SyntaxKind::LParen.category(), TokenCategory::Punctuation);
    assert_eq!(SyntaxKind::KwWhile.category(), TokenCategory::Keyword);
    assert_eq!(SyntaxKind::String.category(), TokenCategory::Literal);
    assert_eq!(SyntaxKind::Eof.category(), TokenCategory::Eof);
}
