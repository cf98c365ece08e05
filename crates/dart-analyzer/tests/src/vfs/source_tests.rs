use std::{fs, sync::Arc};

use super::*;
use crate::syntax::Edit;

fn source(uri: &str) -> Source {
    Source::parse(uri).expect("valid uri")
}

#[test]
fn resolves_relative_directive_uris() {
    let lib = source("file:///project/lib/src/a.dart");
    assert_eq!(lib.resolve("b.dart"), Some(source("file:///project/lib/src/b.dart")));
    assert_eq!(lib.resolve("../c.dart"), Some(source("file:///project/lib/c.dart")));
    assert_eq!(lib.resolve("dart:core"), Some(source("dart:core")));
}

#[test]
fn reports_scheme_and_short_name() {
    let core = source("dart:core");
    assert!(core.is_in_system_library());
    assert_eq!(core.short_name(), "core");
    let file = source("file:///project/lib/main.dart");
    assert!(!file.is_in_system_library());
    assert_eq!(file.scheme(), "file");
    assert_eq!(file.short_name(), "main.dart");
}

#[test]
fn rejects_invalid_uris() {
    assert!(matches!(Source::parse("not a uri"), Err(AnalysisError::InvalidUri(_))));
}

#[test]
fn overlay_shadows_resolvers() {
    let memory = Arc::new(MemoryUriResolver::new());
    let file = source("memory:///a.dart");
    memory.add(file.clone(), "class A {}");
    let factory = SourceFactory::new(vec![memory.clone() as Arc<dyn UriResolver>]);
    assert_eq!(factory.contents(&file).ok().as_deref(), Some("class A {}"));

    factory.overlay().open(file.clone(), "class B {}", 1);
    assert_eq!(factory.contents(&file).ok().as_deref(), Some("class B {}"));

    factory.overlay().close(&file);
    memory.remove(&file);
    assert!(!factory.exists(&file));
    assert!(matches!(factory.contents(&file), Err(AnalysisError::SourceNotFound(_))));
}

#[test]
fn overlay_changes_yield_a_single_edit() {
    let overlay = ContentOverlay::new();
    let file = source("memory:///a.dart");
    overlay.open(file.clone(), "var a = 1;", 1);
    let update = overlay
        .apply_changes(&file, vec![TextChange::replace(8..9, "42"), TextChange::replace(4..5, "b")], 2)
        .expect("changes apply");
    assert_eq!(&*update.text, "var b = 42;");
    assert_eq!(update.edit, Edit::new(4, 5, 6));
    assert_eq!(overlay.version(&file), Some(2));

    assert!(overlay.apply_changes(&file, vec![TextChange::replace(3..40, "")], 3).is_none());
    assert_eq!(overlay.version(&file), Some(2));
}

#[test]
fn directory_container_collects_dart_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("lib/src")).expect("mkdir");
    fs::create_dir_all(dir.path().join(".dart_tool")).expect("mkdir");
    fs::write(dir.path().join("lib/a.dart"), "library a;").expect("write");
    fs::write(dir.path().join("lib/src/b.dart"), "part of a;").expect("write");
    fs::write(dir.path().join("lib/notes.txt"), "").expect("write");
    fs::write(dir.path().join(".dart_tool/gen.dart"), "").expect("write");

    let container = DirectoryContainer::new(dir.path());
    let sources = container.sources();
    let names: Vec<&str> = sources.iter().map(Source::short_name).collect();
    assert_eq!(names, ["a.dart", "b.dart"]);
    assert!(sources.iter().all(|source| container.contains(source)));
    assert!(!container.contains(&source("file:///elsewhere/a.dart")));

    let filtered = collect_dart_sources(dir.path(), &["/src/".to_string()]);
    assert_eq!(filtered.len(), 1);
}

#[test]
fn file_resolver_reads_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("main.dart");
    fs::write(&path, "main() {}").expect("write");
    let factory = SourceFactory::with_file_system();
    let file = Source::from_path(&path);
    assert_eq!(factory.contents(&file).ok().as_deref(), Some("main() {}"));
    assert_eq!(file.to_file_path().map(|p| normalized_path(&p)), Some(normalized_path(&path)));

    let missing = Source::from_path(&dir.path().join("missing.dart"));
    assert!(matches!(factory.contents(&missing), Err(AnalysisError::Io { .. })));
}
