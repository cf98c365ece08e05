use super::*;

#[test]
fn message_substitutes_arguments() {
    let diagnostic = Diagnostic::new(ErrorCode::UndefinedMethod, 0, 3, vec!["foo".to_string(), "A".to_string()]);
    assert_eq!(diagnostic.message(), "The method 'foo' is not defined for the class 'A'");
    assert_eq!(diagnostic.code.severity(), Severity::Warning);
    assert_eq!(diagnostic.code.stage(), ErrorStage::Resolve);
}

#[test]
fn scan_errors_report_lexical_problems() {
    let stream = TokenStream::scan("a ` 'ok' 'open\nb /* never closed");
    let codes: Vec<(ErrorCode, usize)> = scan_errors(&stream).into_iter().map(|d| (d.code, d.offset)).collect();
    assert_eq!(
        codes,
        vec![
            (ErrorCode::IllegalCharacter, 2),
            (ErrorCode::UnterminatedString, 9),
            (ErrorCode::UnterminatedComment, 17),
        ]
    );
}

#[test]
fn escaped_backslash_before_quote_is_terminated() {
    let stream = TokenStream::scan(r"x = 'a\\'; y = r'\';");
    assert!(scan_errors(&stream).is_empty());
}

#[test]
fn nested_comments_are_terminated() {
    let stream = TokenStream::scan("/* a /* b */ c */ x");
    assert!(scan_errors(&stream).is_empty());
}
