use super::*;

#[test]
fn scans_library_directives() {
    let stream = TokenStream::scan(
        "// header\nlibrary app.main;\nimport 'dart:core';\nimport 'util.dart' as u show Helper;\nexport 'api.dart' hide internal;\npart 'src/impl.dart';\nclass A {}\nimport 'late.dart';",
    );
    let info = DirectiveInfo::scan(&stream);
    assert_eq!(info.library_name.as_deref(), Some("app.main"));
    assert_eq!(info.source_kind(), SourceKind::Library);
    let uris: Vec<(&DirectiveKind, &str, Option<&str>)> =
        info.directives.iter().map(|d| (&d.kind, d.uri.as_str(), d.prefix.as_deref())).collect();
    assert_eq!(
        uris,
        vec![
            (&DirectiveKind::Import, "dart:core", None),
            (&DirectiveKind::Import, "util.dart", Some("u")),
            (&DirectiveKind::Export, "api.dart", None),
            (&DirectiveKind::Part, "src/impl.dart", None),
        ]
    );
    assert_eq!(info.of_kind(DirectiveKind::Import).count(), 2);
}

#[test]
fn part_of_by_name_and_uri() {
    let by_name = DirectiveInfo::scan(&TokenStream::scan("part of app.main;\nint x = 1;"));
    assert_eq!(by_name.part_of, Some(PartOf::Name("app.main".to_string())));
    assert_eq!(by_name.source_kind(), SourceKind::Part);

    let by_uri = DirectiveInfo::scan(&TokenStream::scan("part of '../main.dart';"));
    assert_eq!(by_uri.part_of, Some(PartOf::Uri("../main.dart".to_string())));
}

#[test]
fn annotations_before_directives_are_skipped() {
    let info = DirectiveInfo::scan(&TokenStream::scan("@Deprecated('x') library a;\nimport 'b.dart';"));
    assert_eq!(info.library_name.as_deref(), Some("a"));
    assert_eq!(info.directives.len(), 1);
}

#[test]
fn unquote_handles_every_quote_style() {
    assert_eq!(unquote("'a.dart'"), "a.dart");
    assert_eq!(unquote("\"a.dart\""), "a.dart");
    assert_eq!(unquote("r'a.dart'"), "a.dart");
    assert_eq!(unquote("'''a'''"), "a");
    assert_eq!(unquote("'open"), "open");
}
