use expect_test::expect;

use super::*;

#[test]
fn scan_drops_whitespace_and_ends_with_eof() {
    let stream = TokenStream::scan("a  /* c */ b;");
    let kinds: Vec<SyntaxKind> = stream.iter().map(|(_, token)| token.kind()).collect();
    assert_eq!(
        kinds,
        vec![SyntaxKind::Ident, SyntaxKind::Comment, SyntaxKind::Ident, SyntaxKind::Semicolon, SyntaxKind::Eof]
    );
    assert_eq!(stream.token_count(), 5);
    assert_eq!(stream.get(stream.eof()).map(Token::offset), Some(13));
    stream.validate().unwrap();
}

#[test]
fn empty_source_is_just_eof() {
    let stream = TokenStream::scan("");
    assert_eq!(stream.first(), stream.eof());
    assert_eq!(stream.kind(stream.first()), SyntaxKind::Eof);
    stream.validate().unwrap();
}

#[test]
fn links_are_symmetric() {
    let stream = TokenStream::scan("x = y + 1;");
    for (id, token) in stream.iter() {
        if let Some(next) = token.next() {
            assert_eq!(stream.previous(next), Some(id));
        }
    }
    assert_eq!(stream.previous(stream.first()), None);
}

#[test]
fn token_at_finds_covering_or_following_token() {
    let stream = TokenStream::scan("foo  bar");
    assert_eq!(stream.lexeme(stream.token_at(1)), "foo");
    assert_eq!(stream.lexeme(stream.token_at(4)), "bar");
    assert_eq!(stream.token_at(100), stream.eof());
}

#[test]
fn dump_lists_every_token() {
    let stream = TokenStream::scan("class A {}");
    expect![[r#"
        KwClass 0..5 "class"
        Ident 6..7 "A"
        LBrace 8..9 "{"
        RBrace 9..10 "}"
        Eof 10..10 ""
    "#]]
    .assert_eq(&stream.dump());
}
