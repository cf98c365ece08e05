use super::*;
use crate::syntax::TokenStream;

fn kind_of(text: &str) -> SyntaxKind {
    let stream = TokenStream::scan(text);
    stream.kind(stream.first())
}

#[test]
fn every_compound_assignment_maps_to_its_binary_operator() {
    let compound = ["+=", "-=", "*=", "/=", "~/=", "%=", "^=", "&=", "|=", "<<=", ">>="];
    for text in compound {
        let kind = kind_of(text);
        assert!(kind.is_assignment_operator(), "{text} lexes as {kind:?}");
        let method = assignment_operator_method(kind);
        assert_eq!(method, text.strip_suffix('='), "{text}");
        // The compound form calls the same method as the binary form.
        assert_eq!(binary_operator_method(kind_of(&text[..text.len() - 1])), method, "{text}");
    }
    for text in ["=", "??="] {
        let kind = kind_of(text);
        assert!(kind.is_assignment_operator());
        assert_eq!(assignment_operator_method(kind), None, "{text}");
    }
}

#[test]
fn unary_and_increment_operators() {
    assert_eq!(prefix_operator_method(SyntaxKind::Minus), Some("unary-"));
    assert_eq!(prefix_operator_method(SyntaxKind::Tilde), Some("~"));
    assert_eq!(prefix_operator_method(SyntaxKind::PlusPlus), Some("+"));
    assert_eq!(prefix_operator_method(SyntaxKind::MinusMinus), Some("-"));
    assert_eq!(prefix_operator_method(SyntaxKind::Bang), None);
    assert_eq!(postfix_operator_method(SyntaxKind::PlusPlus), Some("+"));
    assert_eq!(postfix_operator_method(SyntaxKind::MinusMinus), Some("-"));
    assert!(is_increment(SyntaxKind::MinusMinus));
    assert!(!is_increment(SyntaxKind::Minus));
}

#[test]
fn short_circuit_operators_are_not_methods() {
    for kind in [SyntaxKind::AmpAmp, SyntaxKind::PipePipe, SyntaxKind::QuestionQuestion] {
        assert_eq!(binary_operator_method(kind), None);
    }
    assert_eq!(binary_operator_method(SyntaxKind::BangEq), Some("=="));
}
