use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use super::*;
use crate::{ast::parse_unit, syntax::TokenStream};

fn declare_in(
    context: ContextId,
    uri: &str,
    text: &str,
) -> LibraryModel {
    let source = Source::parse(uri).expect("valid uri");
    let parsed = parse_unit(&TokenStream::scan(text));
    declare_library(context, &source, &[(source.clone(), &parsed.unit)])
}

fn class_info<'a>(
    model: &'a LibraryModel,
    name: &str,
) -> &'a ClassInfo {
    let class = model.top_level.iter().find(|element| element.name() == name).expect("class declared");
    model.info(class).and_then(ElementInfo::class).expect("class info")
}

fn libraries(models: Vec<LibraryModel>) -> HashMap<Source, Arc<LibraryModel>> {
    models.into_iter().map(|model| (model.source.clone(), Arc::new(model))).collect()
}

#[test]
fn location_encoding_escapes_separators() {
    let location = ElementLocation::library("file:///a.dart").child("file:///a.dart").child("odd;name");
    let encoded = location.encode();
    assert_eq!(encoded, "file:///a.dart;file:///a.dart;odd;;name");
    assert_eq!(ElementLocation::decode(&encoded), Some(location));
    assert_eq!(ElementLocation::decode(""), None);
}

#[test]
fn declares_class_member_table() {
    let model = declare_in(
        ContextId::next(),
        "file:///a.dart",
        "class A { int x; final y = 1; get z => 1; set z(v) {} m() {} A.named(); }",
    );
    let info = class_info(&model, "A");
    let mut keys: Vec<&str> = info.members.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["m", "x", "x=", "y", "z", "z="]);
    assert_eq!(info.constructors.keys().collect::<Vec<_>>(), ["named"]);
    assert_eq!(info.members["z"].kind(), ElementKind::Getter);
    assert_eq!(info.members["z="].kind(), ElementKind::Setter);
}

#[test]
fn classes_without_constructors_get_an_implicit_one() {
    let model = declare_in(ContextId::next(), "file:///a.dart", "class A {}");
    let info = class_info(&model, "A");
    let constructor = &info.constructors[""];
    assert_eq!(constructor.kind(), ElementKind::Constructor);
    let class = &model.top_level[0];
    // The class keeps its declaration slot.
    assert_eq!(model.declared_at(&model.source, class.name_offset()), Some(class));
}

#[test]
fn locals_are_disambiguated_by_offset() {
    let text = "f(p) { var a = 1; { var a = 2; } g() {} }";
    let model = declare_in(ContextId::next(), "file:///a.dart", text);
    let locals: Vec<String> = model
        .elements()
        .filter(|element| element.kind() == ElementKind::LocalVariable)
        .map(|element| element.location().components().last().cloned().unwrap_or_default())
        .collect();
    let first = text.find("a =").unwrap_or_default();
    let second = text.rfind("a =").unwrap_or_default();
    assert_eq!(locals, [format!("a@{first}"), format!("a@{second}")]);

    let function = &model.top_level[0];
    let children: Vec<ElementKind> =
        model.info(function).map(|info| info.children.iter().map(Element::kind).collect()).unwrap_or_default();
    assert_eq!(children, [
        ElementKind::Parameter,
        ElementKind::LocalVariable,
        ElementKind::LocalVariable,
        ElementKind::Function
    ]);
}

#[test]
fn identity_is_context_and_location() {
    let context = ContextId::next();
    let first = declare_in(context, "file:///a.dart", "class A {}");
    let second = declare_in(context, "file:///a.dart", "\n\nclass A {}");
    assert_eq!(first.top_level[0], second.top_level[0]);

    let other = declare_in(ContextId::next(), "file:///a.dart", "class A {}");
    assert_ne!(first.top_level[0], other.top_level[0]);
    assert_eq!(first.top_level[0].with_context(other.context()), other.top_level[0]);
}

#[test]
fn links_imports_through_combinators() {
    let context = ContextId::next();
    let b = declare_in(context, "file:///b.dart", "class B {} class Hidden {} class _Private {}");
    let a = declare_in(context, "file:///a.dart", "import 'b.dart' show B; class C extends B {}");
    let libraries = libraries(vec![b]);
    let linked = link_library(&a, &libraries);

    let scope = linked.scope().expect("linked");
    let b_class = scope.lookup("B").expect("B imported");
    assert_eq!(b_class.location().library_uri(), "file:///b.dart");
    assert!(scope.lookup("Hidden").is_none());
    assert!(scope.lookup("_Private").is_none());

    let import = &linked.imports[0];
    let namespace = scope.import_namespace(import).expect("namespace recorded");
    assert!(namespace.contains_key("Hidden"));

    let c = class_info(&linked, "C");
    assert_eq!(c.supertype, Some(DartType::Interface(b_class.clone())));
}

#[test]
fn prefixed_imports_resolve_type_names() {
    let context = ContextId::next();
    let b = declare_in(context, "file:///b.dart", "class B {}");
    let a = declare_in(context, "file:///a.dart", "import 'b.dart' as p; p.B field; Missing other;");
    let linked = link_library(&a, &libraries(vec![b]));
    let scope = linked.scope().expect("linked");
    assert_eq!(scope.lookup("p").map(Element::kind), Some(ElementKind::Prefix));
    assert!(scope.lookup("B").is_none());

    let types: Vec<String> = linked
        .top_level
        .iter()
        .filter_map(|element| linked.info(element))
        .map(|info| info.value_type().display_name())
        .collect();
    assert_eq!(types, ["B", "dynamic"]);
}

#[test]
fn export_cycles_terminate() {
    let context = ContextId::next();
    let a = declare_in(context, "file:///a.dart", "export 'b.dart'; class A {} var count = 0;");
    let b = declare_in(context, "file:///b.dart", "export 'a.dart' hide count; class B {}");
    let libraries = libraries(vec![a, b]);
    let a = &libraries[&Source::parse("file:///a.dart").expect("valid uri")];

    let namespace = export_namespace(a, &libraries, &mut HashSet::new());
    let mut names: Vec<&str> = namespace.keys().map(String::as_str).collect();
    names.sort_unstable();
    assert_eq!(names, ["A", "B", "count", "count="]);
}

#[test]
fn classes_default_to_object_from_core() {
    let context = ContextId::next();
    let core = declare_in(context, "dart:core", "class Object {} class int {}");
    let a = declare_in(context, "file:///a.dart", "class A {}");
    let libraries = libraries(vec![core]);
    let linked = link_library(&a, &libraries);
    let object = linked.scope().and_then(|scope| scope.lookup("Object")).cloned().expect("core imported");
    assert_eq!(class_info(&linked, "A").supertype, Some(DartType::Interface(object)));

    let core = &libraries[&Source::parse("dart:core").expect("valid uri")];
    let linked_core = link_library(core, &libraries);
    assert_eq!(class_info(&linked_core, "Object").supertype, None);
}

#[test]
fn combinators_filter_names() {
    let show = [Combinator::Show(vec!["a".into(), "b".into()])];
    assert!(Combinator::accepts_all(&show, "a"));
    assert!(!Combinator::accepts_all(&show, "c"));
    let both = [Combinator::Show(vec!["a".into(), "b".into()]), Combinator::Hide(vec!["b".into()])];
    assert!(Combinator::accepts_all(&both, "a"));
    assert!(!Combinator::accepts_all(&both, "b"));
    assert!(Combinator::accepts_all(&[], "anything"));
}
