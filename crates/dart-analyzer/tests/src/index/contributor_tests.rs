use std::{collections::HashMap, sync::Arc};

use super::*;
use crate::{
    ast::parse_unit,
    element::{ContextId, ModelSet, declare_library, link_library},
    resolver::ElementResolver,
    syntax::TokenStream,
};

const CORE: &str = "class Object {} class int { int operator +(int other) => this; } class bool {}";

struct Indexed {
    text: String,
    unit: CompilationUnit,
    resolved: ResolvedUnit,
    store: MemoryIndexStore,
}

impl Indexed {
    fn element_at(
        &self,
        needle: &str,
    ) -> Element {
        let offset = self.text.find(needle).expect("needle present");
        let node = self.unit.node_at(offset).expect("node at needle");
        self.resolved.element(node).cloned().expect("bound")
    }

    /// Offsets of the locations recorded for `element`, sorted.
    fn offsets(
        &self,
        element: &Element,
        relationship: Relationship,
    ) -> Vec<usize> {
        let mut offsets: Vec<usize> =
            self.store.get_relationships(element, relationship).iter().map(|location| location.offset).collect();
        offsets.sort_unstable();
        offsets
    }

    fn offset_of(
        &self,
        needle: &str,
        nth: usize,
    ) -> usize {
        self.text.match_indices(needle).nth(nth).expect("needle present").0
    }
}

fn index_files(files: &[(&str, &str)]) -> Indexed {
    let context = ContextId::next();
    let mut parsed = Vec::new();
    for (uri, text) in std::iter::once(("dart:core", CORE)).chain(files.iter().copied()) {
        let source = Source::parse(uri).expect("valid uri");
        let unit = parse_unit(&TokenStream::scan(text)).unit;
        parsed.push((source, text.to_string(), unit));
    }
    let declared: HashMap<Source, Arc<LibraryModel>> = parsed
        .iter()
        .map(|(source, _, unit)| {
            (source.clone(), Arc::new(declare_library(context, source, &[(source.clone(), unit)])))
        })
        .collect();
    let mut models = ModelSet::new();
    let mut linked = HashMap::new();
    for (source, model) in &declared {
        let model = Arc::new(link_library(model, &declared));
        linked.insert(source.clone(), model.clone());
        models.insert(model);
    }

    let (source, text, unit) = parsed.swap_remove(1);
    let library = &linked[&source];
    let mut errors = Vec::new();
    let resolved = ElementResolver::resolve(&unit, &source, library, &models, &mut errors);
    let store = MemoryIndexStore::new();
    index_unit(&store, &unit, &resolved, library);
    Indexed {
        text,
        unit,
        resolved,
        store,
    }
}

fn index(text: &str) -> Indexed {
    index_files(&[("file:///main.dart", text)])
}

#[test]
fn declarations_are_defined_by_their_enclosing_element() {
    let indexed = index("class A { m() {} } f() {}");
    let class = indexed.element_at("A");
    let method = indexed.element_at("m()");
    let defined = indexed.store.get_relationships(&method, Relationship::IsDefinedBy);
    assert_eq!(defined.len(), 1);
    assert_eq!(defined[0].element, class);
    let defined = indexed.store.get_relationships(&class, Relationship::IsDefinedBy);
    assert_eq!(defined[0].element.kind(), ElementKind::CompilationUnit);
}

#[test]
fn invocations_are_split_by_qualification() {
    let indexed = index(
        "class A { m() {} n() { m(); this.m(); } }
         f(A a) { a.m(); }",
    );
    let method = indexed.element_at("m()");
    assert_eq!(indexed.offsets(&method, Relationship::IsInvokedBy), [indexed.offset_of("m();", 0)]);
    assert_eq!(indexed.offsets(&method, Relationship::IsInvokedByQualified), [
        indexed.offset_of("m();", 1),
        indexed.offset_of("m();", 2),
    ]);
    let locations = indexed.store.get_relationships(&method, Relationship::IsInvokedBy);
    assert_eq!(locations[0].element, indexed.element_at("n()"));
}

#[test]
fn variables_are_read_and_written() {
    let indexed = index("f() { var x = 1; x = 2; x += 3; x++; return x; }");
    let variable = indexed.element_at("x =");
    assert_eq!(indexed.offsets(&variable, Relationship::IsWrittenBy), [
        indexed.offset_of("x = 2", 0),
        indexed.offset_of("x +=", 0),
        indexed.offset_of("x++", 0),
    ]);
    assert_eq!(indexed.offsets(&variable, Relationship::IsReadBy), [
        indexed.offset_of("x +=", 0),
        indexed.offset_of("x++", 0),
        indexed.offset_of("x;", 0),
    ]);
    assert_eq!(indexed.offsets(&variable, Relationship::IsReferencedBy), [] as [usize; 0]);
}

#[test]
fn class_headers_record_supertype_relationships() {
    let indexed = index(
        "class S {} class M {} class I {}
         class C extends S with M implements I {}",
    );
    let declaring = indexed.element_at("C extends");
    for (name, nth, relationship) in [
        ("S", 1, Relationship::IsExtendedBy),
        ("M", 1, Relationship::IsMixedInBy),
        ("I", 1, Relationship::IsImplementedBy),
    ] {
        let class = indexed.element_at(name);
        let locations = indexed.store.get_relationships(&class, relationship);
        assert_eq!(locations.len(), 1, "{name}");
        assert_eq!(locations[0].element, declaring);
        assert_eq!(locations[0].offset, indexed.offset_of(name, nth));
    }
}

#[test]
fn operators_and_constructors_are_invocations() {
    let indexed = index("class A { A(); } f(int i) { i + 1; new A(); }");
    let constructor = indexed.element_at("A();");
    assert_eq!(constructor.kind(), ElementKind::Constructor);
    assert_eq!(indexed.offsets(&constructor, Relationship::IsInvokedBy), [indexed.offset_of("new A", 0)]);
    let plus = indexed.resolved.element(indexed.unit.node_at(indexed.offset_of("+ 1", 0)).expect("node")).cloned();
    let plus = plus.expect("operator bound");
    assert_eq!(indexed.store.get_relationships(&plus, Relationship::IsInvokedByQualified).len(), 1);
}

#[test]
fn import_prefixes_are_kept_on_locations() {
    let indexed = index_files(&[
        ("file:///main.dart", "import 'lib.dart' as p; p.A a;"),
        ("file:///lib.dart", "class A {}"),
    ]);
    let class = indexed.element_at("A a");
    let locations = indexed.store.get_relationships(&class, Relationship::IsReferencedBy);
    assert_eq!(locations.len(), 1);
    assert_eq!(locations[0].import_prefix.as_deref(), Some("p"));
}
