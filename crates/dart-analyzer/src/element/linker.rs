use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use tracing::debug;

use crate::{
    element::{ClassInfo, Combinator, DartType, Element, ElementDetail, ElementKind, ElementLocation, LibraryModel},
    vfs::Source,
};

const CORE_LIBRARY: &str = "dart:core";

/// Names visible at the top of every unit of a library.
///
/// Lookup order is: names the library defines, then import prefixes, then
/// names imported without a prefix. When two imports provide the same name
/// the first import wins.
#[derive(Debug, Clone, Default)]
pub struct LibraryScope {
    defined: HashMap<String, Element>,
    imported: HashMap<String, Element>,
    prefixes: HashMap<String, PrefixScope>,
    /// Full export namespace behind each import element, before combinators.
    import_namespaces: HashMap<ElementLocation, HashMap<String, Element>>,
}

impl LibraryScope {
    pub fn lookup(
        &self,
        name: &str,
    ) -> Option<&Element> {
        self.defined
            .get(name)
            .or_else(|| self.prefixes.get(name).map(|prefix| &prefix.element))
            .or_else(|| self.imported.get(name))
    }

    pub fn prefix(
        &self,
        name: &str,
    ) -> Option<&PrefixScope> {
        self.prefixes.get(name)
    }

    pub fn defined(
        &self,
        name: &str,
    ) -> Option<&Element> {
        self.defined.get(name)
    }

    /// What the library behind `import` exports, ignoring its `show`/`hide`.
    pub fn import_namespace(
        &self,
        import: &Element,
    ) -> Option<&HashMap<String, Element>> {
        self.import_namespaces.get(import.location())
    }

    fn resolve_type(
        &self,
        ty: &DartType,
    ) -> DartType {
        let DartType::Unresolved {
            prefix,
            name,
        } = ty
        else {
            return ty.clone();
        };
        let found = match prefix {
            Some(prefix) => self.prefix(prefix).and_then(|scope| scope.lookup(name)),
            None => self.lookup(name),
        };
        match found {
            Some(element) if element.kind() == ElementKind::Class => DartType::Interface(element.clone()),
            _ => DartType::Dynamic,
        }
    }
}

/// Names reachable through one import prefix.
#[derive(Debug, Clone)]
pub struct PrefixScope {
    pub element: Element,
    names: HashMap<String, Element>,
}

impl PrefixScope {
    pub fn lookup(
        &self,
        name: &str,
    ) -> Option<&Element> {
        self.names.get(name)
    }
}

fn combinator_name(key: &str) -> &str {
    key.strip_suffix('=').unwrap_or(key)
}

/// Public names of `library` plus everything it re-exports. `visiting`
/// holds the libraries on the current export path so cycles terminate.
pub fn export_namespace(
    library: &LibraryModel,
    libraries: &HashMap<Source, Arc<LibraryModel>>,
    visiting: &mut HashSet<Source>,
) -> HashMap<String, Element> {
    if !visiting.insert(library.source.clone()) {
        return HashMap::new();
    }
    let mut names: HashMap<String, Element> = library.public_names().into_iter().collect();
    for export in &library.exports {
        let Some(exported) = export.exported.as_ref().and_then(|source| libraries.get(source)) else {
            continue;
        };
        for (name, element) in export_namespace(exported, libraries, visiting) {
            if Combinator::accepts_all(&export.combinators, combinator_name(&name)) {
                names.entry(name).or_insert(element);
            }
        }
    }
    visiting.remove(&library.source);
    names
}

/// Binds the declared model of a library to its imports.
///
/// `libraries` holds declared (or linked) models of every library in the
/// import/export closure; missing entries are treated as empty. Type names
/// that do not resolve to a class become `dynamic`; classes without an
/// `extends` clause get `Object` when `dart:core` is available.
pub fn link_library(
    declared: &LibraryModel,
    libraries: &HashMap<Source, Arc<LibraryModel>>,
) -> LibraryModel {
    let mut model = declared.clone();
    let mut scope = LibraryScope::default();
    for (name, element) in model.top_level_names() {
        scope.defined.entry(name).or_insert(element);
    }

    let core = libraries.keys().find(|source| source.uri() == CORE_LIBRARY).cloned();
    let mut imports_core = false;
    for import in &model.imports {
        let Some(ElementDetail::Import(info)) = model.info(import).map(|info| &info.detail) else {
            continue;
        };
        let Some(imported) = info.imported.as_ref().and_then(|source| libraries.get(source)) else {
            continue;
        };
        imports_core |= info.imported == core;
        let namespace = export_namespace(imported, libraries, &mut HashSet::new());
        let target = match &info.prefix {
            Some(prefix) => {
                &mut scope
                    .prefixes
                    .entry(prefix.name().to_string())
                    .or_insert_with(|| PrefixScope {
                        element: prefix.clone(),
                        names: HashMap::new(),
                    })
                    .names
            },
            None => &mut scope.imported,
        };
        for (name, element) in &namespace {
            if Combinator::accepts_all(&info.combinators, combinator_name(name)) {
                target.entry(name.clone()).or_insert_with(|| element.clone());
            }
        }
        scope.import_namespaces.insert(import.location().clone(), namespace);
    }
    if let Some(core) = core.filter(|core| !imports_core && *core != model.source)
        && let Some(core_model) = libraries.get(&core)
    {
        for (name, element) in export_namespace(core_model, libraries, &mut HashSet::new()) {
            scope.imported.entry(name).or_insert(element);
        }
    }

    let object = scope.lookup("Object").filter(|element| element.kind() == ElementKind::Class).cloned();
    for info in model.infos_mut() {
        match &mut info.detail {
            ElementDetail::Class(ClassInfo {
                supertype,
                mixins,
                interfaces,
                ..
            }) => {
                *supertype = match supertype.as_ref() {
                    Some(ty) => Some(scope.resolve_type(ty)),
                    None => object.clone().filter(|object| *object != info.element).map(DartType::Interface),
                };
                for ty in mixins.iter_mut().chain(interfaces.iter_mut()) {
                    *ty = scope.resolve_type(ty);
                }
            },
            ElementDetail::Executable {
                return_type,
                ..
            } => *return_type = scope.resolve_type(return_type),
            ElementDetail::Variable {
                declared_type,
                ..
            } => *declared_type = scope.resolve_type(declared_type),
            ElementDetail::TypeParameter {
                bound: Some(bound),
            } => *bound = scope.resolve_type(bound),
            _ => {},
        }
    }

    debug!(
        "[element] linked {} ({} defined, {} imported, {} prefixes)",
        model.source.short_name(),
        scope.defined.len(),
        scope.imported.len(),
        scope.prefixes.len()
    );
    model.set_scope(scope);
    model
}
