use std::time::Duration;

use super::*;
use crate::{
    diagnostics::ErrorCode,
    index::Relationship,
    vfs::{MemoryUriResolver, UriResolver},
};

const CORE: &str = "class Object {} class int {} class bool {} class String {}";

struct Fixture {
    files: Arc<MemoryUriResolver>,
    context: AnalysisContext,
}

impl Fixture {
    fn new(files: &[(&str, &str)]) -> Self {
        let resolver = Arc::new(MemoryUriResolver::new());
        resolver.add(source(CORE_LIBRARY), CORE);
        let mut changes = ChangeSet::new();
        for (uri, text) in files {
            resolver.add(source(uri), *text);
            changes = changes.added(source(uri));
        }
        let factory = SourceFactory::new(vec![resolver.clone() as Arc<dyn UriResolver>]);
        let context = AnalysisContext::new(factory, Arc::new(MemoryIndexStore::new()));
        context.changed(changes);
        Self {
            files: resolver,
            context,
        }
    }

    fn analyze_all(&self) {
        for source in self.context.available_sources() {
            self.context.analyze(&source).expect("analysis succeeds");
        }
    }

    fn top_level(
        &self,
        library: &str,
        name: &str,
    ) -> Element {
        let model = self.context.library_model(&source(library)).expect("library model");
        model.elements().find(|element| element.name() == name).cloned().expect("declared")
    }
}

fn source(uri: &str) -> Source {
    Source::parse(uri).expect("valid uri")
}

#[test]
fn kinds_come_from_directives() {
    let fixture = Fixture::new(&[
        ("file:///lib.dart", "library lib; part 'part.dart';"),
        ("file:///part.dart", "part of lib;"),
    ]);
    let (lib, part) = (source("file:///lib.dart"), source("file:///part.dart"));
    assert_eq!(fixture.context.known_kind_of(&lib), None);
    assert_eq!(fixture.context.get_or_compute_kind_of(&lib), SourceKind::Library);
    assert_eq!(fixture.context.known_kind_of(&lib), Some(SourceKind::Library));
    assert_eq!(fixture.context.get_or_compute_kind_of(&part), SourceKind::Part);
    assert_eq!(fixture.context.get_or_compute_kind_of(&source("file:///missing.dart")), SourceKind::Unknown);
}

#[test]
fn results_are_cached_until_a_change() {
    let fixture = Fixture::new(&[("file:///a.dart", "class A {}")]);
    let a = source("file:///a.dart");
    let first = fixture.context.parse(&a).expect("parse");
    let again = fixture.context.parse(&a).expect("parse");
    assert!(Arc::ptr_eq(&first, &again));

    fixture.context.source_changed(&a);
    let after = fixture.context.parse(&a).expect("parse");
    assert!(!Arc::ptr_eq(&first, &after));
}

#[test]
fn changes_invalidate_importers_transitively() {
    let fixture = Fixture::new(&[
        ("file:///a.dart", "import 'b.dart'; B a;"),
        ("file:///b.dart", "import 'c.dart'; class B {}"),
        ("file:///c.dart", "class C {}"),
        ("file:///d.dart", "class D {}"),
    ]);
    fixture.analyze_all();
    let result = fixture.context.source_changed(&source("file:///c.dart"));
    let expected = vec![source("file:///a.dart"), source("file:///b.dart"), source("file:///c.dart")];
    assert_eq!(result.invalidated, expected);
    assert_eq!(result.to_resolve, expected);
    assert!(result.removed.is_empty());
    assert_eq!(fixture.context.sources_to_resolve(&[source("file:///d.dart")]), [source("file:///d.dart")]);
}

#[test]
fn changes_to_core_invalidate_every_library() {
    let fixture = Fixture::new(&[("file:///a.dart", "int a;"), ("file:///b.dart", "bool b;")]);
    fixture.analyze_all();
    let result = fixture.context.source_changed(&source(CORE_LIBRARY));
    assert!(result.to_resolve.contains(&source("file:///a.dart")));
    assert!(result.to_resolve.contains(&source("file:///b.dart")));
}

#[test]
fn edited_sources_are_rescanned() {
    let before = "int count = 1;";
    let after = "int counter = 1;";
    let fixture = Fixture::new(&[("file:///a.dart", before)]);
    let a = source("file:///a.dart");
    fixture.context.scan(&a).expect("scan");

    fixture.files.add(a.clone(), after);
    fixture.context.source_edited(&a, Edit::between(before, after));
    let tokens = fixture.context.scan(&a).expect("rescan");
    assert_eq!(tokens.source(), after);
    assert_eq!(tokens.snapshot(), TokenStream::scan(after).snapshot());
    assert_eq!(fixture.top_level("file:///a.dart", "counter").kind(), crate::element::ElementKind::TopLevelVariable);
}

#[test]
fn parts_resolve_against_their_library() {
    let fixture = Fixture::new(&[
        ("file:///lib.dart", "library lib; part 'part.dart'; class A {}"),
        ("file:///part.dart", "part of lib; A a;"),
    ]);
    let (lib, part) = (source("file:///lib.dart"), source("file:///part.dart"));
    assert_eq!(fixture.context.library_of(&part).expect("library_of"), Some(lib.clone()));
    assert_eq!(fixture.context.library_of(&lib).expect("library_of"), Some(lib.clone()));
    assert!(fixture.context.errors(&part).expect("errors").is_empty());

    let class = fixture.top_level("file:///lib.dart", "A");
    let references = fixture.context.index().get_relationships(&class, Relationship::IsReferencedBy);
    assert_eq!(references.len(), 1);
    assert_eq!(references[0].element.source(), Some(&part));
}

#[test]
fn parts_cannot_be_resolved_as_libraries() {
    let fixture = Fixture::new(&[
        ("file:///lib.dart", "library lib; part 'part.dart';"),
        ("file:///part.dart", "part of lib;"),
    ]);
    let part = source("file:///part.dart");
    let err = fixture.context.library_model(&part).expect_err("a part is not a library");
    assert!(matches!(err, AnalysisError::NotALibrary(_)), "{err}");
}

#[test]
fn errors_include_unresolved_names() {
    let fixture = Fixture::new(&[("file:///a.dart", "f() { missing; }")]);
    let errors = fixture.context.errors(&source("file:///a.dart")).expect("errors");
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].code, ErrorCode::UndefinedIdentifier);
    assert_eq!(errors[0].arguments, ["missing"]);
}

#[test]
fn resolution_feeds_the_index_and_changes_retract_it() {
    let fixture = Fixture::new(&[("file:///a.dart", "class A {}"), ("file:///b.dart", "import 'a.dart'; A b;")]);
    fixture.analyze_all();
    let class = fixture.top_level("file:///a.dart", "A");
    let index = fixture.context.index().clone();
    assert_eq!(index.get_relationships(&class, Relationship::IsReferencedBy).len(), 1);

    fixture.context.source_changed(&source("file:///b.dart"));
    assert_eq!(index.get_relationships(&class, Relationship::IsReferencedBy), []);
}

#[test]
fn deleted_sources_leave_the_context() {
    let fixture = Fixture::new(&[("file:///a.dart", "class A {}"), ("file:///b.dart", "class B {}")]);
    fixture.analyze_all();
    let result = fixture.context.source_deleted(&source("file:///a.dart"));
    assert_eq!(result.removed, [source("file:///a.dart")]);
    assert_eq!(fixture.context.available_sources(), [source("file:///b.dart")]);
}

#[test]
fn discarded_contexts_refuse_queries() {
    let fixture = Fixture::new(&[("file:///a.dart", "class A {} A a;")]);
    fixture.analyze_all();
    let index = fixture.context.index().clone();
    assert!(index.internal_location_count_in(&fixture.context) > 0);

    fixture.context.discard();
    assert!(matches!(fixture.context.parse(&source("file:///a.dart")), Err(AnalysisError::Discarded)));
    assert!(fixture.context.available_sources().is_empty());
    assert_eq!(index.internal_location_count_in(&fixture.context), 0);
    assert!(fixture.context.changed(ChangeSet::new().added(source("file:///b.dart"))).is_empty());
}

#[test]
fn extraction_and_merging_move_sources_with_their_index_entries() {
    let fixture = Fixture::new(&[("file:///a.dart", "class A {}"), ("file:///b.dart", "import 'a.dart'; A b;")]);
    fixture.analyze_all();
    let class = fixture.top_level("file:///a.dart", "A");
    let index = fixture.context.index().clone();

    let moved: SourceSet = [source("file:///b.dart")].into_iter().collect();
    let extracted = fixture.context.extract_analysis_context(&moved).expect("extract");
    assert_eq!(fixture.context.available_sources(), [source("file:///a.dart")]);
    assert_eq!(extracted.available_sources(), [source("file:///b.dart")]);
    let references = index.get_relationships(&class, Relationship::IsReferencedBy);
    assert_eq!(references.len(), 1);
    assert_eq!(references[0].element.context(), extracted.id());

    let extracted_id = extracted.id();
    assert_eq!(fixture.context.merge_analysis_context(&extracted).expect("merge"), 1);
    assert_eq!(fixture.context.available_sources(), [source("file:///a.dart"), source("file:///b.dart")]);
    let references = index.get_relationships(&class, Relationship::IsReferencedBy);
    assert_eq!(references.len(), 1);
    assert_eq!(references[0].element.context(), fixture.context.id());
    assert_eq!(index.internal_location_count_in(&extracted_id), 0);
}

#[test]
fn instrumented_context_delegates_to_its_basis() {
    let fixture = Fixture::new(&[("file:///a.dart", "class A {}")]);
    let basis = Arc::new(fixture.context);
    let instrumented = InstrumentedAnalysisContext::new(basis.clone());
    let a = source("file:///a.dart");
    let first = instrumented.resolve(&a, &a).expect("resolve");
    let second = instrumented.resolve(&a, &a).expect("resolve");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(instrumented.resolve_calls(), 2);
    assert_eq!(instrumented.context_id(), basis.id());
    assert_eq!(instrumented.available_sources(), [a]);
}

#[tokio::test]
async fn scheduled_sources_are_analyzed_until_cancelled() {
    let fixture = Fixture::new(&[
        ("file:///a.dart", "class A {}"),
        ("file:///b.dart", "library b; part 'c.dart';"),
        ("file:///c.dart", "part of b;"),
    ]);
    let scheduler = AnalysisScheduler::start(Arc::new(fixture.context), 2);
    scheduler.schedule([source("file:///a.dart"), source("file:///b.dart")]);
    assert!(scheduler.wait_for_idle(Duration::from_secs(10)).await);
    let status = scheduler.status();
    assert_eq!((status.pending, status.completed, status.failed), (0, 2, 0));
    assert!(matches!(scheduler.result(&source("file:///b.dart")), Ok(SourceKind::Library)));
    assert!(matches!(
        scheduler.result(&source("file:///c.dart")),
        Err(AnalysisError::NotYetAvailable { what: "analysis", .. })
    ));

    assert_eq!(scheduler.analyze_priority(&source("file:///c.dart")).expect("priority"), SourceKind::Part);

    scheduler.cancel();
    scheduler.schedule([source("file:///a.dart")]);
    assert!(scheduler.wait_for_idle(Duration::from_secs(10)).await);
    assert!(matches!(scheduler.result(&source("file:///a.dart")), Err(AnalysisError::Cancelled(_))));
    assert!(scheduler.status().cancelled);
    scheduler.shutdown().await;
}

#[test]
fn computed_errors_wait_for_resolution() {
    let fixture = Fixture::new(&[("file:///a.dart", "main() { missing; }")]);
    let a = source("file:///a.dart");
    let not_yet = |result: Result<Vec<Diagnostic>, AnalysisError>| {
        matches!(result, Err(AnalysisError::NotYetAvailable { what: "errors", .. }))
    };
    assert!(not_yet(fixture.context.computed_errors(&a)));
    fixture.context.parse(&a).expect("parse");
    assert!(not_yet(fixture.context.computed_errors(&a)));

    let errors = fixture.context.errors(&a).expect("errors");
    assert_eq!(fixture.context.computed_errors(&a).expect("computed"), errors);
    assert_eq!(errors.len(), 1);

    fixture.context.source_changed(&a);
    assert!(not_yet(fixture.context.computed_errors(&a)));
}

#[test]
fn merging_into_a_discarded_context_keeps_the_other_context() {
    let fixture = Fixture::new(&[("file:///a.dart", "class A {}"), ("file:///b.dart", "import 'a.dart'; A b;")]);
    fixture.analyze_all();
    let moved: SourceSet = [source("file:///b.dart")].into_iter().collect();
    let extracted = fixture.context.extract_analysis_context(&moved).expect("extract");
    fixture.context.discard();

    assert!(matches!(fixture.context.merge_analysis_context(&extracted), Err(AnalysisError::Discarded)));
    assert_eq!(extracted.available_sources(), [source("file:///b.dart")]);
    assert_eq!(extracted.get_or_compute_kind_of(&source("file:///b.dart")), SourceKind::Library);
}

struct PanickingParser;

impl UnitParser for PanickingParser {
    fn parse(
        &self,
        source: &Source,
        _tokens: &TokenStream,
    ) -> ParsedUnit {
        panic!("parser crashed on {}", source.uri());
    }
}

#[tokio::test]
async fn crashed_analyses_are_reported_as_failures() {
    let fixture = Fixture::new(&[("file:///a.dart", "class A {}")]);
    let context = Arc::new(fixture.context.with_parser(Arc::new(PanickingParser)));
    let scheduler = AnalysisScheduler::start(context, 1);
    scheduler.schedule([source("file:///a.dart")]);
    assert!(scheduler.wait_for_idle(Duration::from_secs(10)).await);
    assert_eq!(scheduler.status().failed, 1);
    let result = scheduler.result(&source("file:///a.dart"));
    assert!(matches!(result, Err(AnalysisError::TaskFailed { .. })), "{result:?}");
    scheduler.shutdown().await;
}
