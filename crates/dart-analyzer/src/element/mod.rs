//! Declared program entities and the per-library model that owns them.
//!
//! An [`Element`] is a cheap handle whose identity is the owning context plus
//! its [`ElementLocation`]; everything else about it lives in the
//! [`ElementInfo`] held by the declaring [`LibraryModel`].

mod builder;
mod linker;
mod location;

use std::{
    collections::HashMap,
    fmt,
    hash::{Hash, Hasher},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use indexmap::IndexMap;
use serde::Serialize;

pub use builder::declare_library;
pub use linker::{LibraryScope, PrefixScope, export_namespace, link_library};
pub use location::ElementLocation;

use crate::vfs::Source;

/// Identity of an analysis context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContextId(u64);

impl ContextId {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ElementKind {
    Library,
    CompilationUnit,
    Class,
    TypeParameter,
    Constructor,
    Method,
    Getter,
    Setter,
    Field,
    Function,
    TopLevelVariable,
    LocalVariable,
    Parameter,
    Label,
    Import,
    Prefix,
}

impl ElementKind {
    pub fn is_variable(self) -> bool {
        matches!(
            self,
            ElementKind::Field | ElementKind::TopLevelVariable | ElementKind::LocalVariable | ElementKind::Parameter
        )
    }

    pub fn is_executable(self) -> bool {
        matches!(
            self,
            ElementKind::Constructor
                | ElementKind::Method
                | ElementKind::Getter
                | ElementKind::Setter
                | ElementKind::Function
        )
    }
}

struct ElementData {
    kind: ElementKind,
    name: String,
    location: ElementLocation,
    context: ContextId,
    source: Option<Source>,
    name_offset: usize,
}

#[derive(Clone)]
pub struct Element(Arc<ElementData>);

impl Element {
    pub fn new(
        kind: ElementKind,
        name: impl Into<String>,
        location: ElementLocation,
        context: ContextId,
        source: Option<Source>,
        name_offset: usize,
    ) -> Self {
        Self(Arc::new(ElementData {
            kind,
            name: name.into(),
            location,
            context,
            source,
            name_offset,
        }))
    }

    pub fn kind(&self) -> ElementKind {
        self.0.kind
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn location(&self) -> &ElementLocation {
        &self.0.location
    }

    pub fn context(&self) -> ContextId {
        self.0.context
    }

    /// The unit that declares the element; `None` for synthetic elements.
    pub fn source(&self) -> Option<&Source> {
        self.0.source.as_ref()
    }

    pub fn name_offset(&self) -> usize {
        self.0.name_offset
    }

    /// The same declaration owned by another context.
    pub fn with_context(
        &self,
        context: ContextId,
    ) -> Self {
        if context == self.0.context {
            return self.clone();
        }
        Self(Arc::new(ElementData {
            kind: self.0.kind,
            name: self.0.name.clone(),
            location: self.0.location.clone(),
            context,
            source: self.0.source.clone(),
            name_offset: self.0.name_offset,
        }))
    }
}

impl PartialEq for Element {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || (self.0.context == other.0.context && self.0.location == other.0.location)
    }
}

impl Eq for Element {}

impl Hash for Element {
    fn hash<H: Hasher>(
        &self,
        state: &mut H,
    ) {
        self.0.context.hash(state);
        self.0.location.hash(state);
    }
}

impl fmt::Debug for Element {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?} {} @ {}", self.0.kind, self.0.name, self.0.location)
    }
}

impl fmt::Display for Element {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

/// Static types, only as far as member lookup needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DartType {
    Dynamic,
    Void,
    Interface(Element),
    TypeParameter(Element),
    /// A type name the linker has not bound yet.
    Unresolved {
        prefix: Option<String>,
        name: String,
    },
}

impl DartType {
    pub fn element(&self) -> Option<&Element> {
        match self {
            DartType::Interface(element) | DartType::TypeParameter(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, DartType::Dynamic | DartType::Unresolved { .. })
    }

    pub fn display_name(&self) -> String {
        match self {
            DartType::Dynamic => "dynamic".to_string(),
            DartType::Void => "void".to_string(),
            DartType::Interface(element) | DartType::TypeParameter(element) => element.name().to_string(),
            DartType::Unresolved {
                prefix: Some(prefix),
                name,
            } => format!("{prefix}.{name}"),
            DartType::Unresolved {
                name,
                ..
            } => name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Combinator {
    Show(Vec<String>),
    Hide(Vec<String>),
}

impl Combinator {
    /// Whether a name passes every combinator in `combinators`.
    pub fn accepts_all(
        combinators: &[Combinator],
        name: &str,
    ) -> bool {
        combinators.iter().all(|combinator| match combinator {
            Combinator::Show(names) => names.iter().any(|shown| shown == name),
            Combinator::Hide(names) => names.iter().all(|hidden| hidden != name),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub is_abstract: bool,
    pub type_parameters: Vec<Element>,
    pub supertype: Option<DartType>,
    pub mixins: Vec<DartType>,
    pub interfaces: Vec<DartType>,
    /// Getters, methods and fields by name; setters under `name=`.
    pub members: HashMap<String, Element>,
    /// Constructors by name; the unnamed constructor is `""`.
    pub constructors: IndexMap<String, Element>,
}

#[derive(Debug, Clone)]
pub struct ImportInfo {
    pub uri: String,
    pub imported: Option<Source>,
    pub prefix: Option<Element>,
    pub combinators: Vec<Combinator>,
}

#[derive(Debug, Clone)]
pub struct ExportInfo {
    pub uri: String,
    pub exported: Option<Source>,
    pub combinators: Vec<Combinator>,
}

#[derive(Debug, Clone)]
pub enum ElementDetail {
    Class(ClassInfo),
    Executable {
        return_type: DartType,
        parameters: Vec<Element>,
    },
    Variable {
        declared_type: DartType,
        is_final: bool,
    },
    TypeParameter {
        bound: Option<DartType>,
    },
    Import(ImportInfo),
    None,
}

#[derive(Debug, Clone)]
pub struct ElementInfo {
    pub element: Element,
    pub enclosing: Option<Element>,
    pub children: Vec<Element>,
    pub is_static: bool,
    pub detail: ElementDetail,
}

impl ElementInfo {
    pub fn class(&self) -> Option<&ClassInfo> {
        match &self.detail {
            ElementDetail::Class(class) => Some(class),
            _ => None,
        }
    }

    /// Type of the value read through this element: declared type of a
    /// variable, return type of a getter, the class of a constructor.
    pub fn value_type(&self) -> DartType {
        match &self.detail {
            ElementDetail::Variable {
                declared_type,
                ..
            } => declared_type.clone(),
            ElementDetail::Executable {
                return_type,
                ..
            } if matches!(self.element.kind(), ElementKind::Getter | ElementKind::Constructor) => return_type.clone(),
            _ => DartType::Dynamic,
        }
    }

    pub fn return_type(&self) -> DartType {
        match &self.detail {
            ElementDetail::Executable {
                return_type,
                ..
            } => return_type.clone(),
            _ => DartType::Dynamic,
        }
    }

    pub fn parameters(&self) -> &[Element] {
        match &self.detail {
            ElementDetail::Executable {
                parameters,
                ..
            } => parameters,
            _ => &[],
        }
    }
}

/// Every element declared by one library (its defining unit and parts),
/// plus, once linked, the scope its units resolve against.
#[derive(Debug, Clone)]
pub struct LibraryModel {
    pub library: Element,
    pub source: Source,
    pub units: Vec<Source>,
    pub imports: Vec<Element>,
    pub exports: Vec<ExportInfo>,
    /// Top-level declarations in source order.
    pub top_level: Vec<Element>,
    infos: IndexMap<ElementLocation, ElementInfo>,
    declarations: HashMap<(Source, usize), Element>,
    scope: Option<LibraryScope>,
}

impl LibraryModel {
    pub(crate) fn new(
        library: Element,
        source: Source,
    ) -> Self {
        Self {
            library,
            units: vec![source.clone()],
            source,
            imports: Vec::new(),
            exports: Vec::new(),
            top_level: Vec::new(),
            infos: IndexMap::new(),
            declarations: HashMap::new(),
            scope: None,
        }
    }

    pub fn context(&self) -> ContextId {
        self.library.context()
    }

    pub fn info(
        &self,
        element: &Element,
    ) -> Option<&ElementInfo> {
        self.infos.get(element.location())
    }

    pub fn element_at(
        &self,
        location: &ElementLocation,
    ) -> Option<&Element> {
        self.infos.get(location).map(|info| &info.element)
    }

    /// The element whose name is declared at `offset` in `unit`.
    pub fn declared_at(
        &self,
        unit: &Source,
        offset: usize,
    ) -> Option<&Element> {
        self.declarations.get(&(unit.clone(), offset))
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.infos.values().map(|info| &info.element)
    }

    pub fn element_count(&self) -> usize {
        self.infos.len()
    }

    /// `None` until the model is linked.
    pub fn scope(&self) -> Option<&LibraryScope> {
        self.scope.as_ref()
    }

    pub fn is_linked(&self) -> bool {
        self.scope.is_some()
    }

    /// Top-level names declared by this library. Setters and assignable
    /// variables also appear under `name=`.
    pub fn top_level_names(&self) -> Vec<(String, Element)> {
        let mut names = Vec::new();
        for element in &self.top_level {
            match element.kind() {
                ElementKind::Setter => names.push((format!("{}=", element.name()), element.clone())),
                ElementKind::TopLevelVariable => {
                    names.push((element.name().to_string(), element.clone()));
                    if let Some(ElementInfo {
                        detail: ElementDetail::Variable {
                            is_final: false,
                            ..
                        },
                        ..
                    }) = self.info(element)
                    {
                        names.push((format!("{}=", element.name()), element.clone()));
                    }
                },
                _ => names.push((element.name().to_string(), element.clone())),
            }
        }
        names
    }

    pub fn public_names(&self) -> Vec<(String, Element)> {
        let mut names = self.top_level_names();
        names.retain(|(_, element)| !element.name().starts_with('_'));
        names
    }

    /// Adds an element declared by a name in source.
    pub(crate) fn insert(
        &mut self,
        info: ElementInfo,
    ) {
        if let Some(unit) = info.element.source() {
            self.declarations.insert((unit.clone(), info.element.name_offset()), info.element.clone());
        }
        self.insert_implicit(info);
    }

    /// Adds an element with no declaring name of its own.
    pub(crate) fn insert_implicit(
        &mut self,
        info: ElementInfo,
    ) {
        if let Some(parent) = info.enclosing.as_ref().and_then(|parent| self.infos.get_mut(parent.location())) {
            parent.children.push(info.element.clone());
        }
        self.infos.insert(info.element.location().clone(), info);
    }

    pub(crate) fn info_mut(
        &mut self,
        location: &ElementLocation,
    ) -> Option<&mut ElementInfo> {
        self.infos.get_mut(location)
    }

    pub(crate) fn infos_mut(&mut self) -> impl Iterator<Item = &mut ElementInfo> {
        self.infos.values_mut()
    }

    pub(crate) fn set_scope(
        &mut self,
        scope: LibraryScope,
    ) {
        self.scope = Some(scope);
    }
}

/// Read access to element details across libraries.
pub trait ElementModel {
    fn info(
        &self,
        element: &Element,
    ) -> Option<&ElementInfo>;

    fn library(
        &self,
        source: &Source,
    ) -> Option<&LibraryModel>;
}

/// Linked library models keyed by library URI.
#[derive(Debug, Clone, Default)]
pub struct ModelSet {
    libraries: HashMap<String, Arc<LibraryModel>>,
}

impl ModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        model: Arc<LibraryModel>,
    ) {
        self.libraries.insert(model.source.uri().to_string(), model);
    }

    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }
}

impl ElementModel for ModelSet {
    fn info(
        &self,
        element: &Element,
    ) -> Option<&ElementInfo> {
        self.libraries.get(element.location().library_uri())?.info(element)
    }

    fn library(
        &self,
        source: &Source,
    ) -> Option<&LibraryModel> {
        self.libraries.get(source.uri()).map(|model| model.as_ref())
    }
}

impl ElementModel for LibraryModel {
    fn info(
        &self,
        element: &Element,
    ) -> Option<&ElementInfo> {
        LibraryModel::info(self, element)
    }

    fn library(
        &self,
        source: &Source,
    ) -> Option<&LibraryModel> {
        (source == &self.source).then_some(self)
    }
}

/// Anything that stands for an analysis context. Wrappers report the id of
/// the context they wrap.
pub trait ContextIdentity {
    fn context_id(&self) -> ContextId;
}

impl ContextIdentity for ContextId {
    fn context_id(&self) -> ContextId {
        *self
    }
}

/// Maps an element location back to a live element of one context; used
/// when restoring a persisted index.
pub trait ElementLookup: ContextIdentity {
    fn element_at(
        &self,
        location: &ElementLocation,
    ) -> Option<Element>;
}

#[cfg(test)]
#[path = "../../tests/src/element/element_tests.rs"]
mod tests;
