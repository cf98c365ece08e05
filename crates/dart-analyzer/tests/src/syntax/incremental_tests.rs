use super::*;

fn rescan_texts(
    before: &str,
    after: &str,
) -> RescanResult {
    let old = TokenStream::scan(before);
    let result = rescan(&old, after, Edit::between(before, after)).unwrap();
    assert_eq!(result.stream.snapshot(), TokenStream::scan(after).snapshot(), "{before:?} -> {after:?}");
    result.stream.validate().unwrap();
    result
}

fn assert_changed(
    before: &str,
    after: &str,
    first: Option<&str>,
    last: Option<&str>,
) {
    let result = rescan_texts(before, after);
    assert_eq!(result.first_changed.map(|id| result.stream.lexeme(id)), first, "first of {before:?} -> {after:?}");
    assert_eq!(result.last_changed.map(|id| result.stream.lexeme(id)), last, "last of {before:?} -> {after:?}");
}

#[test]
fn insert_before_identifier() {
    assert_changed("a + b;", "xa + b;", Some("xa"), Some("xa"));
}

#[test]
fn insert_inside_later_identifier() {
    assert_changed("a + b;", "a + xb;", Some("xb"), Some("xb"));
}

#[test]
fn insert_new_identifier_between_tokens() {
    assert_changed("a;  c;", "a; b c;", Some("b"), Some("b"));
}

#[test]
fn extend_identifier_at_end_of_input() {
    assert_changed("ab", "abs", Some("abs"), Some("abs"));
    assert_changed("b", "by", Some("by"), Some("by"));
}

#[test]
fn append_whitespace_changes_nothing() {
    let result = rescan_texts("a + b;", "a + b;  ");
    assert!(!result.has_changes());
    assert_eq!(result.first_changed, None);
}

#[test]
fn whitespace_only_edit_changes_nothing() {
    assert_changed("a + b;", "a  + b;", None, None);
    assert_changed("a + b;", "  a + b;", None, None);
}

#[test]
fn whitespace_after_comments_changes_nothing() {
    assert_changed("/* one */ // two\n/* three */ x;", "/* one */ // two\n/* three */  x;", None, None);
}

#[test]
fn insert_period() {
    assert_changed("a + b;", "a + b.;", Some("."), Some("."));
    assert_changed("a b;", "a. b;", Some("."), Some("."));
    assert_changed("a b;", "a .b;", Some("."), Some("."));
}

#[test]
fn insert_period_and_identifier() {
    assert_changed("a + b;", "a + b.x;", Some("."), Some("x"));
}

#[test]
fn split_identifier() {
    assert_changed("ab;", "a.b;", Some("a"), Some("b"));
}

#[test]
fn insert_function_before_existing_body() {
    assert_changed("f() {}", "f() => 0; g() {}", Some("=>"), Some(")"));
}

#[test]
fn deleting_a_token_reports_removal() {
    let result = rescan_texts("a b c;", "a c;");
    assert_eq!(result.first_changed, None);
    assert_eq!(result.removed_tokens, 1);
    assert!(result.has_changes());
}

#[test]
fn unterminated_comment_swallows_the_rest() {
    let result = rescan_texts("x /* y */ z;", "x /* y z;");
    let lexemes: Vec<&str> = result.changed_tokens().into_iter().map(|id| result.stream.lexeme(id)).collect();
    assert_eq!(lexemes, vec!["/* y z;"]);
}

#[test]
fn closing_a_comment_releases_text() {
    rescan_texts("x /* y z; w", "x /* y */ z; w");
}

#[test]
fn opening_a_string_swallows_the_line() {
    rescan_texts("a = b; c = d;\ne;", "a = 'b; c = d;\ne;");
}

#[test]
fn unaffected_tokens_keep_their_ids() {
    let before = "alpha beta gamma delta epsilon;";
    let after = "alpha beta GAMMA delta epsilon;";
    let old = TokenStream::scan(before);
    let result = rescan(&old, after, Edit::between(before, after)).unwrap();
    let old_ids: Vec<TokenId> = old.iter().map(|(id, _)| id).collect();
    let new_ids: Vec<TokenId> = result.stream.iter().map(|(id, _)| id).collect();
    assert_eq!(new_ids[0], old_ids[0]);
    assert_eq!(new_ids[new_ids.len() - 1], old_ids[old_ids.len() - 1]);
    assert_eq!(new_ids[4], old_ids[4]);
    assert_eq!(result.stream.lexeme(result.first_changed.unwrap()), "GAMMA");
}

#[test]
fn trailing_offsets_are_shifted() {
    let result = rescan_texts("a(b);", "a(bbbb);");
    let offsets: Vec<usize> = result.stream.iter().map(|(_, token)| token.offset()).collect();
    assert_eq!(offsets, vec![0, 1, 2, 6, 7, 8]);
}

#[test]
fn edit_past_end_is_malformed() {
    let old = TokenStream::scan("abc");
    let err = rescan(&old, "abc", Edit::new(2, 5, 5)).unwrap_err();
    assert!(matches!(err, ScanError::MalformedEdit { .. }));
}

#[test]
fn edit_disagreeing_with_new_length_is_malformed() {
    let old = TokenStream::scan("abc");
    assert!(rescan(&old, "abcdef", Edit::new(1, 0, 1)).is_err());
}

#[test]
fn edit_between_respects_char_boundaries() {
    let edit = Edit::between("aé", "aè");
    assert_eq!(edit, Edit::new(1, 2, 2));
    assert_eq!(Edit::between("same", "same"), Edit::new(4, 0, 0));
}
