use super::*;

#[test]
fn line_starts_for_empty_text() {
    let info = LineInfo::new("");
    assert_eq!(info.line_count(), 1);
    assert_eq!(info.location("", 0), LineColumn { line: 1, column: 1 });
}

#[test]
fn offsets_map_to_one_based_positions() {
    let text = "class A {\n  int x;\n}\n";
    let info = LineInfo::new(text);
    assert_eq!(info.line_count(), 4);
    assert_eq!(info.location(text, 14), LineColumn { line: 2, column: 5 });
    assert_eq!(info.location(text, 10), LineColumn { line: 2, column: 1 });
}

#[test]
fn columns_count_chars_not_bytes() {
    let text = "é = x;";
    let info = LineInfo::new(text);
    assert_eq!(info.location(text, 4), LineColumn { line: 1, column: 4 });
}

#[test]
fn offset_of_inverts_location() {
    let text = "a\nbcd\n";
    let info = LineInfo::new(text);
    let position = info.location(text, 4);
    assert_eq!(info.offset_of(text, position), Some(4));
    assert_eq!(info.offset_of(text, LineColumn { line: 9, column: 1 }), None);
}
