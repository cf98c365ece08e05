use std::{collections::HashMap, sync::Arc};

use super::*;
use crate::{
    ast::parse_unit,
    element::{ContextId, ElementLocation, ModelSet, declare_library, link_library},
    syntax::TokenStream,
};

const CORE: &str = "
class Object { bool operator ==(other) => true; int get hashCode => 0; }
class bool {}
class int { int operator +(int other) => this; }
class double {}
class String {}
class Null {}
";

struct Resolution {
    text: String,
    unit: CompilationUnit,
    resolved: ResolvedUnit,
    errors: Vec<Diagnostic>,
}

impl Resolution {
    /// Element bound to the innermost node at the `nth` occurrence of `needle`.
    fn element_at(
        &self,
        needle: &str,
        nth: usize,
    ) -> Option<&Element> {
        let (offset, _) = self.text.match_indices(needle).nth(nth)?;
        self.resolved.element(self.unit.node_at(offset)?)
    }

    fn kind_at(
        &self,
        needle: &str,
        nth: usize,
    ) -> Option<ElementKind> {
        self.element_at(needle, nth).map(Element::kind)
    }

    fn codes(&self) -> Vec<ErrorCode> {
        self.errors.iter().map(|error| error.code).collect()
    }
}

/// Declares and links every file plus a stub core library, then resolves
/// the first file.
fn resolve_files(files: &[(&str, &str)]) -> Resolution {
    let context = ContextId::next();
    let mut parsed = Vec::new();
    for (uri, text) in std::iter::once(("dart:core", CORE)).chain(files.iter().copied()) {
        let source = Source::parse(uri).expect("valid uri");
        let unit = parse_unit(&TokenStream::scan(text));
        assert!(unit.errors.is_empty(), "{uri}: {:?}", unit.errors);
        parsed.push((source, text.to_string(), unit.unit));
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
    Resolution {
        text,
        unit,
        resolved,
        errors,
    }
}

fn resolve(text: &str) -> Resolution {
    resolve_files(&[("file:///main.dart", text)])
}

fn declaring_class(element: &Element) -> &str {
    element.location().components().get(2).map_or("", String::as_str)
}

#[test]
fn resolves_locals_parameters_and_shadowing() {
    let resolution = resolve(
        "var top = 1;
         f(int param) {
           var top = param;
           return top;
         }
         g() => top;",
    );
    assert!(resolution.errors.is_empty(), "{:?}", resolution.errors);
    assert_eq!(resolution.kind_at("top", 2), Some(ElementKind::LocalVariable));
    assert_eq!(resolution.kind_at("top", 3), Some(ElementKind::TopLevelVariable));
    assert_eq!(resolution.kind_at("param", 1), Some(ElementKind::Parameter));
    assert_eq!(resolution.element_at("param", 0), resolution.element_at("param", 1));
    assert_eq!(resolution.kind_at("int", 0), Some(ElementKind::Class));
}

#[test]
fn members_resolve_through_the_hierarchy() {
    let resolution = resolve(
        "class A { int value; m() {} }
         class B extends A { n() { m(); value = 2; this.m(); } }
         f(B b) { b.m(); b.value; b..m()..value = 3; }",
    );
    assert!(resolution.errors.is_empty(), "{:?}", resolution.errors);
    let declared = resolution.element_at("m()", 0).cloned().expect("declaration bound");
    for nth in 1..=4 {
        assert_eq!(resolution.element_at("m()", nth), Some(&declared), "occurrence {nth}");
    }
    for nth in 1..=3 {
        let field = resolution.element_at("value", nth).expect("field bound");
        assert_eq!(field.kind(), ElementKind::Field);
        assert_eq!(declaring_class(field), "A");
    }
}

#[test]
fn interfaces_are_searched_before_the_superclass() {
    let resolution = resolve(
        "class S { m() {} }
         class I { m() {} }
         class C extends S implements I {}
         f(C c) { c.m(); }",
    );
    let bound = resolution.element_at("m();", 0).expect("bound");
    assert_eq!(declaring_class(bound), "I");
}

#[test]
fn cyclic_hierarchies_terminate() {
    let resolution = resolve(
        "class A extends B {}
         class B extends A {}
         f(A a) { a.missing(); }",
    );
    assert_eq!(resolution.codes(), [ErrorCode::UndefinedMethod]);
    assert_eq!(resolution.errors[0].arguments, ["missing", "A"]);
}

#[test]
fn operators_bind_to_their_methods() {
    let resolution = resolve(
        "class V {
           V operator +(V o) => this;
           V operator -() => this;
           V operator [](int i) => this;
           operator []=(int i, V v) {}
         }
         f(V a, V b) { a + b; -a; a[0]; a[1] = b; a += b; a * b; }",
    );
    let name_at = |needle: &str| resolution.element_at(needle, 0).map(|element| element.name().to_string());
    assert_eq!(name_at("+ b"), Some("+".to_string()));
    assert_eq!(name_at("-a"), Some("unary-".to_string()));
    assert_eq!(name_at("[0]"), Some("[]".to_string()));
    assert_eq!(name_at("[1]"), Some("[]=".to_string()));
    assert_eq!(name_at("+= b"), Some("+".to_string()));
    assert_eq!(resolution.codes(), [ErrorCode::UndefinedOperator]);
    assert_eq!(resolution.errors[0].arguments, ["*", "V"]);
}

#[test]
fn increments_resolve_plus_on_the_operand_type() {
    let resolution = resolve("f(int i) { i++; ++i; }");
    assert!(resolution.errors.is_empty(), "{:?}", resolution.errors);
    assert_eq!(resolution.element_at("++;", 0).map(Element::name), Some("+"));
    assert_eq!(resolution.element_at("++i", 0).map(Element::name), Some("+"));
}

#[test]
fn labels_respect_function_and_switch_rules() {
    let resolution = resolve(
        "f() {
           outer: while (true) {
             g() { break outer; }
             break outer;
             continue missing;
           }
           s: switch (1) {
             l: case 1: break l;
             case 2: continue s;
           }
         }",
    );
    assert_eq!(resolution.codes(), [
        ErrorCode::LabelInOuterScope,
        ErrorCode::UndefinedLabel,
        ErrorCode::BreakLabelOnSwitchMember,
        ErrorCode::ContinueLabelOnSwitch,
    ]);
    let label = resolution.element_at("outer", 0).cloned().expect("label declared");
    assert_eq!(label.kind(), ElementKind::Label);
    assert_eq!(resolution.element_at("outer", 2), Some(&label));
}

#[test]
fn prefixes_and_combinators() {
    let resolution = resolve_files(&[
        (
            "file:///main.dart",
            "import 'lib.dart' as p;
             import 'other.dart' show Visible;
             main() { new p.A(); p.top; p.nope; }
             Hidden h;",
        ),
        ("file:///lib.dart", "class A {} var top = 1;"),
        ("file:///other.dart", "class Visible {} class Hidden {}"),
    ]);
    assert_eq!(resolution.codes(), [ErrorCode::UndefinedPrefixedName, ErrorCode::UndefinedClass]);
    assert_eq!(resolution.kind_at("p;", 0), Some(ElementKind::Prefix));
    assert_eq!(resolution.kind_at("p.A", 0), Some(ElementKind::Prefix));
    let class = resolution.element_at("A()", 0).expect("class bound");
    assert_eq!(class.location().library_uri(), "file:///lib.dart");
    assert_eq!(resolution.kind_at("top", 0), Some(ElementKind::TopLevelVariable));
    let shown = resolution.element_at("Visible", 0).expect("combinator bound");
    assert_eq!(shown.location().library_uri(), "file:///other.dart");
}

#[test]
fn missing_imports_are_reported() {
    let resolution = resolve("import 'gone.dart'; main() {}");
    assert_eq!(resolution.codes(), [ErrorCode::UriDoesNotExist]);
    assert_eq!(resolution.kind_at("import", 0), Some(ElementKind::Import));
}

#[test]
fn constructors_resolve_by_name() {
    let resolution = resolve(
        "class A { A(); A.named(); }
         class B extends A {
           B() : super.named();
           B.other() : this();
           B.bad() : super.nope();
         }
         f() { new A(); new A.named(); A.named(); new A.missing(); }",
    );
    assert_eq!(resolution.codes(), [ErrorCode::UndefinedConstructor, ErrorCode::UndefinedConstructor]);
    let named = resolution.element_at("named", 0).cloned().expect("declaration bound");
    assert_eq!(named.kind(), ElementKind::Constructor);
    for nth in 1..=3 {
        assert_eq!(resolution.element_at("named", nth), Some(&named), "occurrence {nth}");
    }
    let redirect = resolution.element_at("this()", 0).expect("redirect bound");
    assert_eq!(redirect.kind(), ElementKind::Constructor);
    assert_eq!(declaring_class(redirect), "B");
}

#[test]
fn member_access_follows_static_types() {
    let resolution = resolve(
        "class A { B get b => null; }
         class B { m() {} }
         class Box<T extends A> { T item; g() { item.b; } }
         class Bag<E> { E e; h() { e.hashCode; } }
         f(A a) { a.b.m(); (a).b.m(); }",
    );
    assert!(resolution.errors.is_empty(), "{:?}", resolution.errors);
    assert_eq!(resolution.kind_at("m();", 0), Some(ElementKind::Method));
    assert_eq!(resolution.kind_at("m();", 1), Some(ElementKind::Method));
    assert_eq!(resolution.kind_at("b;", 0), Some(ElementKind::Getter));
    let hash = resolution.element_at("hashCode;", 0).expect("bound through Object");
    assert_eq!(hash.location().library_uri(), "dart:core");
}

#[test]
fn named_arguments_bind_to_parameters() {
    let resolution = resolve("f({int count}) {} main() { f(count: 1); }");
    let parameter = resolution.element_at("count", 0).cloned().expect("parameter declared");
    assert_eq!(resolution.element_at("count", 1), Some(&parameter));
}

#[test]
fn resolution_is_deterministic() {
    let text = "class A { m() { var x = 1; return x + 2; } } f(A a) { a.m(); }";
    let locations = |resolution: &Resolution| -> Vec<(NodeId, ElementLocation)> {
        resolution.resolved.bindings().map(|(node, element)| (node, element.location().clone())).collect()
    };
    let first = resolve(text);
    let second = resolve(text);
    assert!(first.resolved.binding_count() > 0);
    assert_eq!(locations(&first), locations(&second));
    assert_eq!(first.errors, second.errors);
}
