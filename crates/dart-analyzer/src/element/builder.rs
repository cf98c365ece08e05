use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    ast::{CompilationUnit, MethodKind, NodeId, NodeKind},
    element::{
        ClassInfo, Combinator, ContextId, DartType, Element, ElementDetail, ElementInfo, ElementKind, ElementLocation,
        ExportInfo, ImportInfo, LibraryModel,
    },
    syntax::SyntaxKind,
    vfs::Source,
};

type TypeScope = [(String, Element)];

/// Builds the declared model of a library from its parsed units; the
/// defining unit comes first. Type names stay unresolved until
/// [`link_library`](super::link_library) runs.
pub fn declare_library(
    context: ContextId,
    library_source: &Source,
    units: &[(Source, &CompilationUnit)],
) -> LibraryModel {
    let library_location = ElementLocation::library(library_source.uri());
    let (name, name_offset) = units.first().and_then(|(_, unit)| library_name(unit)).unwrap_or_default();
    let library = Element::new(
        ElementKind::Library,
        name,
        library_location.clone(),
        context,
        Some(library_source.clone()),
        name_offset,
    );
    let mut model = LibraryModel::new(library.clone(), library_source.clone());
    model.insert_implicit(ElementInfo {
        element: library.clone(),
        enclosing: None,
        children: Vec::new(),
        is_static: false,
        detail: ElementDetail::None,
    });

    let mut prefixes = HashMap::new();
    for (index, (unit_source, unit)) in units.iter().enumerate() {
        if index > 0 {
            model.units.push(unit_source.clone());
        }
        let unit_location = library_location.child(unit_source.uri());
        let unit_element = Element::new(
            ElementKind::CompilationUnit,
            unit_source.short_name(),
            unit_location.clone(),
            context,
            Some(unit_source.clone()),
            0,
        );
        model.insert_implicit(ElementInfo {
            element: unit_element,
            enclosing: Some(library.clone()),
            children: Vec::new(),
            is_static: false,
            detail: ElementDetail::None,
        });
        let mut declarer = Declarer {
            context,
            model: &mut model,
            library: &library,
            library_source,
            unit_source,
            unit,
            unit_location,
            prefixes: &mut prefixes,
        };
        declarer.declare_unit(index == 0);
    }
    debug!("[element] declared {} elements in {}", model.element_count(), library_source.short_name());
    model
}

fn library_name(unit: &CompilationUnit) -> Option<(String, usize)> {
    let NodeKind::CompilationUnit {
        directives,
        ..
    } = unit.kind(unit.root())
    else {
        return None;
    };
    directives.iter().find_map(|directive| match unit.kind(*directive) {
        NodeKind::LibraryDirective {
            name,
        } => Some((unit.name(*name)?.to_string(), unit.span(*name).offset)),
        _ => None,
    })
}

struct Declarer<'a> {
    context: ContextId,
    model: &'a mut LibraryModel,
    library: &'a Element,
    library_source: &'a Source,
    unit_source: &'a Source,
    unit: &'a CompilationUnit,
    unit_location: ElementLocation,
    prefixes: &'a mut HashMap<String, Element>,
}

impl Declarer<'_> {
    fn element(
        &self,
        kind: ElementKind,
        name: &str,
        location: ElementLocation,
        name_offset: usize,
    ) -> Element {
        Element::new(kind, name, location, self.context, Some(self.unit_source.clone()), name_offset)
    }

    fn add(
        &mut self,
        element: &Element,
        enclosing: &Element,
        is_static: bool,
        detail: ElementDetail,
    ) {
        self.model.insert(ElementInfo {
            element: element.clone(),
            enclosing: Some(enclosing.clone()),
            children: Vec::new(),
            is_static,
            detail,
        });
    }

    fn name_of(
        &self,
        id: NodeId,
    ) -> (String, usize) {
        (self.unit.name(id).unwrap_or_default().to_string(), self.unit.span(id).offset)
    }

    fn declare_unit(
        &mut self,
        defining: bool,
    ) {
        let unit = self.unit;
        let NodeKind::CompilationUnit {
            directives,
            declarations,
        } = unit.kind(unit.root())
        else {
            return;
        };
        if defining {
            for directive in directives {
                match unit.kind(*directive) {
                    NodeKind::ImportDirective {
                        uri,
                        prefix,
                        combinators,
                    } => self.declare_import(*directive, uri, *prefix, combinators),
                    NodeKind::ExportDirective {
                        uri,
                        combinators,
                    } => {
                        let export = ExportInfo {
                            uri: uri.clone(),
                            exported: self.library_source.resolve(uri),
                            combinators: self.combinators(combinators),
                        };
                        self.model.exports.push(export);
                    },
                    _ => {},
                }
            }
        }
        for declaration in declarations {
            match unit.kind(*declaration) {
                NodeKind::ClassDeclaration {
                    ..
                } => self.declare_class(*declaration),
                NodeKind::FunctionDeclaration {
                    kind,
                    return_type,
                    name,
                    parameters,
                    body,
                } => {
                    let (element_kind, component_of): (ElementKind, fn(&str) -> String) = match kind {
                        MethodKind::Getter => (ElementKind::Getter, |name| format!("get:{name}")),
                        MethodKind::Setter => (ElementKind::Setter, |name| format!("{name}=")),
                        _ => (ElementKind::Function, str::to_string),
                    };
                    let (text, offset) = self.name_of(*name);
                    let return_type =
                        if *kind == MethodKind::Setter { DartType::Void } else { self.type_of(*return_type, &[]) };
                    let enclosing = self.library.clone();
                    let location = self.unit_location.clone();
                    let element = self.declare_executable(
                        Executable {
                            kind: element_kind,
                            name: &text,
                            name_offset: offset,
                            component: component_of(&text),
                            is_static: true,
                            return_type,
                            parameters: *parameters,
                            body: *body,
                        },
                        &enclosing,
                        &location,
                        &[],
                    );
                    self.model.top_level.push(element);
                },
                NodeKind::TopLevelVariableDeclaration {
                    variables,
                } => {
                    let enclosing = self.library.clone();
                    let location = self.unit_location.clone();
                    for (_, element) in
                        self.declare_variables(*variables, ElementKind::TopLevelVariable, &enclosing, &location, true, &[])
                    {
                        self.model.top_level.push(element);
                    }
                },
                _ => {},
            }
        }
    }

    fn combinators(
        &self,
        nodes: &[NodeId],
    ) -> Vec<Combinator> {
        nodes
            .iter()
            .filter_map(|node| match self.unit.kind(*node) {
                NodeKind::Combinator {
                    hide,
                    names,
                } => {
                    let names = names.iter().filter_map(|name| self.unit.name(*name)).map(str::to_string).collect();
                    Some(if *hide { Combinator::Hide(names) } else { Combinator::Show(names) })
                },
                _ => None,
            })
            .collect()
    }

    fn declare_import(
        &mut self,
        directive: NodeId,
        uri: &str,
        prefix: Option<NodeId>,
        combinators: &[NodeId],
    ) {
        let offset = self.unit.span(directive).offset;
        let prefix = prefix.map(|prefix| {
            let (name, name_offset) = self.name_of(prefix);
            if let Some(existing) = self.prefixes.get(&name) {
                return existing.clone();
            }
            let location = self.library.location().child(format!("prefix:{name}"));
            let element = self.element(ElementKind::Prefix, &name, location, name_offset);
            let library = self.library.clone();
            self.add(&element, &library, false, ElementDetail::None);
            self.prefixes.insert(name, element.clone());
            element
        });
        let info = ImportInfo {
            uri: uri.to_string(),
            imported: self.library_source.resolve(uri),
            prefix,
            combinators: self.combinators(combinators),
        };
        let location = self.unit_location.child(format!("import@{offset}"));
        let element = self.element(ElementKind::Import, uri, location, offset);
        let library = self.library.clone();
        self.add(&element, &library, false, ElementDetail::Import(info));
        self.model.imports.push(element);
    }

    fn type_of(
        &self,
        ty: Option<NodeId>,
        type_scope: &TypeScope,
    ) -> DartType {
        let unit = self.unit;
        let Some(NodeKind::TypeName {
            name,
            ..
        }) = ty.map(|ty| unit.kind(ty))
        else {
            return DartType::Dynamic;
        };
        match unit.kind(*name) {
            NodeKind::SimpleIdentifier {
                name,
            } => match name.as_str() {
                "void" => DartType::Void,
                "dynamic" => DartType::Dynamic,
                name => type_scope
                    .iter()
                    .find(|(parameter, _)| parameter == name)
                    .map(|(_, element)| DartType::TypeParameter(element.clone()))
                    .unwrap_or_else(|| DartType::Unresolved {
                        prefix: None,
                        name: name.to_string(),
                    }),
            },
            NodeKind::PrefixedIdentifier {
                prefix,
                identifier,
            } => DartType::Unresolved {
                prefix: unit.name(*prefix).map(str::to_string),
                name: unit.name(*identifier).unwrap_or_default().to_string(),
            },
            _ => DartType::Dynamic,
        }
    }

    fn declare_class(
        &mut self,
        node: NodeId,
    ) {
        let unit = self.unit;
        let NodeKind::ClassDeclaration {
            is_abstract,
            name,
            type_parameters,
            superclass,
            mixins,
            interfaces,
            members,
        } = unit.kind(node)
        else {
            return;
        };
        let (class_name, class_offset) = self.name_of(*name);
        let location = self.unit_location.child(class_name.as_str());
        let class = self.element(ElementKind::Class, &class_name, location.clone(), class_offset);

        let mut type_scope: Vec<(String, Element)> = Vec::new();
        for parameter in type_parameters {
            if let NodeKind::TypeParameter {
                name,
                ..
            } = unit.kind(*parameter)
            {
                let (text, offset) = self.name_of(*name);
                let element = self.element(
                    ElementKind::TypeParameter,
                    &text,
                    location.child(format!("type:{text}")),
                    offset,
                );
                type_scope.push((text, element));
            }
        }
        let info = ClassInfo {
            is_abstract: *is_abstract,
            type_parameters: type_scope.iter().map(|(_, element)| element.clone()).collect(),
            supertype: superclass.map(|ty| self.type_of(Some(ty), &type_scope)),
            mixins: mixins.iter().map(|ty| self.type_of(Some(*ty), &type_scope)).collect(),
            interfaces: interfaces.iter().map(|ty| self.type_of(Some(*ty), &type_scope)).collect(),
            members: HashMap::new(),
            constructors: IndexMap::new(),
        };
        let library = self.library.clone();
        self.add(&class, &library, false, ElementDetail::Class(info));
        for (parameter, (_, element)) in type_parameters.iter().zip(&type_scope) {
            let bound = match unit.kind(*parameter) {
                NodeKind::TypeParameter {
                    bound,
                    ..
                } => bound.map(|bound| self.type_of(Some(bound), &type_scope)),
                _ => None,
            };
            self.add(element, &class, false, ElementDetail::TypeParameter {
                bound,
            });
        }

        let mut table: HashMap<String, Element> = HashMap::new();
        let mut constructors: IndexMap<String, Element> = IndexMap::new();
        for member in members {
            match unit.kind(*member) {
                NodeKind::FieldDeclaration {
                    is_static,
                    variables,
                } => {
                    let finality = self.is_final_list(*variables);
                    for (key, element) in
                        self.declare_variables(*variables, ElementKind::Field, &class, &location, *is_static, &type_scope)
                    {
                        if !finality {
                            table.insert(format!("{key}="), element.clone());
                        }
                        table.insert(key, element);
                    }
                },
                NodeKind::MethodDeclaration {
                    is_static,
                    kind,
                    return_type,
                    name,
                    parameters,
                    body,
                } => {
                    let (text, offset) = self.name_of(*name);
                    let parameter_count = parameters.map_or(0, |list| match unit.kind(list) {
                        NodeKind::FormalParameterList {
                            parameters,
                        } => parameters.len(),
                        _ => 0,
                    });
                    let (element_kind, member_name, component) = match kind {
                        MethodKind::Getter => (ElementKind::Getter, text.clone(), format!("get:{text}")),
                        MethodKind::Setter => (ElementKind::Setter, text.clone(), format!("{text}=")),
                        MethodKind::Operator if text == "-" && parameter_count == 0 => {
                            (ElementKind::Method, "unary-".to_string(), "unary-".to_string())
                        },
                        _ => (ElementKind::Method, text.clone(), text.clone()),
                    };
                    let return_type =
                        if *kind == MethodKind::Setter { DartType::Void } else { self.type_of(*return_type, &type_scope) };
                    let element = self.declare_executable(
                        Executable {
                            kind: element_kind,
                            name: &member_name,
                            name_offset: offset,
                            component: component.clone(),
                            is_static: *is_static,
                            return_type,
                            parameters: *parameters,
                            body: *body,
                        },
                        &class,
                        &location,
                        &type_scope,
                    );
                    let key = if *kind == MethodKind::Setter { format!("{member_name}=") } else { member_name };
                    table.insert(key, element);
                },
                NodeKind::ConstructorDeclaration {
                    class_name,
                    name,
                    parameters,
                    body,
                    ..
                } => {
                    let (constructor_name, offset) = match name {
                        Some(name) => self.name_of(*name),
                        None => (String::new(), unit.span(*class_name).offset),
                    };
                    let component = if constructor_name.is_empty() {
                        "new".to_string()
                    } else {
                        format!("new:{constructor_name}")
                    };
                    let element = self.declare_executable(
                        Executable {
                            kind: ElementKind::Constructor,
                            name: &constructor_name,
                            name_offset: offset,
                            component,
                            is_static: false,
                            return_type: DartType::Interface(class.clone()),
                            parameters: Some(*parameters),
                            body: *body,
                        },
                        &class,
                        &location,
                        &type_scope,
                    );
                    constructors.insert(constructor_name, element);
                },
                _ => {},
            }
        }
        if constructors.is_empty() {
            let element = self.element(ElementKind::Constructor, "", location.child("new"), class_offset);
            self.model.insert_implicit(ElementInfo {
                element: element.clone(),
                enclosing: Some(class.clone()),
                children: Vec::new(),
                is_static: false,
                detail: ElementDetail::Executable {
                    return_type: DartType::Interface(class.clone()),
                    parameters: Vec::new(),
                },
            });
            constructors.insert(String::new(), element);
        }
        if let Some(ElementInfo {
            detail: ElementDetail::Class(info),
            ..
        }) = self.model.info_mut(&location)
        {
            info.members = table;
            info.constructors = constructors;
        }
        self.model.top_level.push(class);
    }

    fn is_final_list(
        &self,
        list: NodeId,
    ) -> bool {
        matches!(
            self.unit.kind(list),
            NodeKind::VariableDeclarationList {
                keyword: Some(SyntaxKind::KwFinal | SyntaxKind::KwConst),
                ..
            }
        )
    }

    /// Declares the variables of a field or top-level list and walks their
    /// initializers. Returns `(name, element)` pairs in order.
    fn declare_variables(
        &mut self,
        list: NodeId,
        kind: ElementKind,
        enclosing: &Element,
        location: &ElementLocation,
        is_static: bool,
        type_scope: &TypeScope,
    ) -> Vec<(String, Element)> {
        let unit = self.unit;
        let NodeKind::VariableDeclarationList {
            ty,
            variables,
            ..
        } = unit.kind(list)
        else {
            return Vec::new();
        };
        let declared_type = self.type_of(*ty, type_scope);
        let is_final = self.is_final_list(list);
        let mut declared = Vec::new();
        for variable in variables {
            let NodeKind::VariableDeclaration {
                name,
                initializer,
            } = unit.kind(*variable)
            else {
                continue;
            };
            let (text, offset) = self.name_of(*name);
            let element = self.element(kind, &text, location.child(text.as_str()), offset);
            self.add(&element, enclosing, is_static, ElementDetail::Variable {
                declared_type: declared_type.clone(),
                is_final,
            });
            if let Some(initializer) = initializer {
                let variable_location = element.location().clone();
                self.declare_body(*initializer, &element, &variable_location, type_scope);
            }
            declared.push((text, element));
        }
        declared
    }

    fn declare_executable(
        &mut self,
        executable: Executable<'_>,
        enclosing: &Element,
        parent_location: &ElementLocation,
        type_scope: &TypeScope,
    ) -> Element {
        let location = parent_location.child(executable.component);
        let element = self.element(executable.kind, executable.name, location.clone(), executable.name_offset);
        self.add(&element, enclosing, executable.is_static, ElementDetail::Executable {
            return_type: executable.return_type.clone(),
            parameters: Vec::new(),
        });
        let parameters = executable
            .parameters
            .map(|list| self.declare_parameters(list, &element, &location, type_scope))
            .unwrap_or_default();
        if let Some(ElementInfo {
            detail: ElementDetail::Executable {
                parameters: slot,
                ..
            },
            ..
        }) = self.model.info_mut(&location)
        {
            *slot = parameters;
        }
        self.declare_body(executable.body, &element, &location, type_scope);
        element
    }

    fn declare_parameters(
        &mut self,
        list: NodeId,
        enclosing: &Element,
        location: &ElementLocation,
        type_scope: &TypeScope,
    ) -> Vec<Element> {
        let unit = self.unit;
        let NodeKind::FormalParameterList {
            parameters,
        } = unit.kind(list)
        else {
            return Vec::new();
        };
        let mut declared = Vec::new();
        for parameter in parameters {
            let NodeKind::FormalParameter {
                ty,
                name,
                default_value,
                ..
            } = unit.kind(*parameter)
            else {
                continue;
            };
            let (text, offset) = self.name_of(*name);
            let element = self.element(ElementKind::Parameter, &text, location.child(text.as_str()), offset);
            let declared_type = self.type_of(*ty, type_scope);
            self.add(&element, enclosing, false, ElementDetail::Variable {
                declared_type,
                is_final: false,
            });
            if let Some(default_value) = default_value {
                self.declare_body(*default_value, enclosing, location, type_scope);
            }
            declared.push(element);
        }
        declared
    }

    fn declare_local(
        &mut self,
        kind: ElementKind,
        name: NodeId,
        declared_type: DartType,
        enclosing: &Element,
        location: &ElementLocation,
    ) {
        let (text, offset) = self.name_of(name);
        let component =
            if kind == ElementKind::Label { format!("label:{text}@{offset}") } else { format!("{text}@{offset}") };
        let element = self.element(kind, &text, location.child(component), offset);
        let detail = if kind == ElementKind::Label {
            ElementDetail::None
        } else {
            ElementDetail::Variable {
                declared_type,
                is_final: false,
            }
        };
        self.add(&element, enclosing, false, detail);
    }

    /// Declares locals, labels and nested functions inside an executable body.
    fn declare_body(
        &mut self,
        root: NodeId,
        enclosing: &Element,
        location: &ElementLocation,
        type_scope: &TypeScope,
    ) {
        let unit = self.unit;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            match unit.kind(id) {
                NodeKind::VariableDeclarationList {
                    ty,
                    variables,
                    ..
                } => {
                    let declared_type = self.type_of(*ty, type_scope);
                    let mut initializers = Vec::new();
                    for variable in variables {
                        if let NodeKind::VariableDeclaration {
                            name,
                            initializer,
                        } = unit.kind(*variable)
                        {
                            self.declare_local(ElementKind::LocalVariable, *name, declared_type.clone(), enclosing, location);
                            initializers.extend(*initializer);
                        }
                    }
                    stack.extend(initializers.into_iter().rev());
                },
                NodeKind::DeclaredIdentifier {
                    ty,
                    name,
                    ..
                } => {
                    let declared_type = self.type_of(*ty, type_scope);
                    self.declare_local(ElementKind::LocalVariable, *name, declared_type, enclosing, location);
                },
                NodeKind::CatchClause {
                    exception_type,
                    exception,
                    stack_trace,
                    body,
                } => {
                    if let Some(exception) = exception {
                        let declared_type = self.type_of(*exception_type, type_scope);
                        self.declare_local(ElementKind::LocalVariable, *exception, declared_type, enclosing, location);
                    }
                    if let Some(stack_trace) = stack_trace {
                        self.declare_local(ElementKind::LocalVariable, *stack_trace, DartType::Dynamic, enclosing, location);
                    }
                    stack.push(*body);
                },
                NodeKind::FunctionDeclarationStatement {
                    function,
                } => {
                    if let NodeKind::FunctionDeclaration {
                        return_type,
                        name,
                        parameters,
                        body,
                        ..
                    } = unit.kind(*function)
                    {
                        let (text, offset) = self.name_of(*name);
                        let return_type = self.type_of(*return_type, type_scope);
                        self.declare_executable(
                            Executable {
                                kind: ElementKind::Function,
                                name: &text,
                                name_offset: offset,
                                component: format!("{text}@{offset}"),
                                is_static: false,
                                return_type,
                                parameters: *parameters,
                                body: *body,
                            },
                            enclosing,
                            location,
                            type_scope,
                        );
                    }
                },
                NodeKind::FunctionExpression {
                    parameters,
                    body,
                } => {
                    let offset = unit.span(id).offset;
                    self.declare_executable(
                        Executable {
                            kind: ElementKind::Function,
                            name: "",
                            name_offset: offset,
                            component: format!("closure@{offset}"),
                            is_static: false,
                            return_type: DartType::Dynamic,
                            parameters: Some(*parameters),
                            body: *body,
                        },
                        enclosing,
                        location,
                        type_scope,
                    );
                },
                NodeKind::Label {
                    name,
                } => {
                    self.declare_local(ElementKind::Label, *name, DartType::Dynamic, enclosing, location);
                },
                kind => {
                    let mut children = kind.children();
                    children.reverse();
                    stack.extend(children);
                },
            }
        }
    }
}

struct Executable<'n> {
    kind: ElementKind,
    name: &'n str,
    name_offset: usize,
    component: String,
    is_static: bool,
    return_type: DartType,
    parameters: Option<NodeId>,
    body: NodeId,
}
