use tracing::debug;

use super::{Location, MemoryIndexStore, Relationship};
use crate::{
    ast::{CompilationUnit, NodeId, NodeKind},
    element::{Element, ElementKind, LibraryModel},
    resolver::{ResolvedUnit, operators},
    vfs::Source,
};

/// Records the relationships found in one resolved unit. Returns the number
/// of relationships recorded.
pub fn index_unit(
    store: &MemoryIndexStore,
    unit: &CompilationUnit,
    resolved: &ResolvedUnit,
    library: &LibraryModel,
) -> usize {
    let source = resolved.source();
    let Some(unit_element) = library.element_at(&library.library.location().child(source.uri())).cloned() else {
        return 0;
    };
    let mut contributor = Contributor {
        store,
        unit,
        resolved,
        library,
        source,
        unit_element,
        recorded: 0,
    };
    for (node, element) in resolved.bindings() {
        contributor.binding(node, element);
    }
    debug!("[index] {}: recorded {} relationships", source.short_name(), contributor.recorded);
    contributor.recorded
}

struct Contributor<'a> {
    store: &'a MemoryIndexStore,
    unit: &'a CompilationUnit,
    resolved: &'a ResolvedUnit,
    library: &'a LibraryModel,
    source: &'a Source,
    unit_element: Element,
    recorded: usize,
}

impl Contributor<'_> {
    fn record(
        &mut self,
        element: &Element,
        relationship: Relationship,
        location: Location,
    ) {
        if self.store.record_relationship(element, relationship, location) {
            self.recorded += 1;
        }
    }

    fn location(
        &self,
        node: NodeId,
    ) -> Location {
        let span = self.unit.span(node);
        Location::new(self.enclosing_element(node), span.offset, span.len)
    }

    fn binding(
        &mut self,
        node: NodeId,
        element: &Element,
    ) {
        if element.kind() == ElementKind::Import {
            return;
        }
        if self.is_declaration(node, element) {
            let span = self.unit.span(node);
            let enclosing = match self.library.info(element).and_then(|info| info.enclosing.clone()) {
                Some(enclosing) if enclosing.kind() != ElementKind::Library => enclosing,
                _ => self.unit_element.clone(),
            };
            self.record(element, Relationship::IsDefinedBy, Location::new(enclosing, span.offset, span.len));
            return;
        }

        let kind = self.unit.kind(node);
        match kind {
            NodeKind::SimpleIdentifier {
                ..
            } => self.identifier(node, element),
            NodeKind::BinaryExpression {
                ..
            }
            | NodeKind::PrefixExpression {
                ..
            }
            | NodeKind::PostfixExpression {
                ..
            }
            | NodeKind::AssignmentExpression {
                ..
            }
            | NodeKind::IndexExpression {
                ..
            } => {
                let location = self.location(node);
                self.record(element, Relationship::IsInvokedByQualified, location);
            },
            NodeKind::InstanceCreationExpression {
                ..
            }
            | NodeKind::SuperConstructorInvocation {
                ..
            }
            | NodeKind::RedirectingConstructorInvocation {
                ..
            }
            | NodeKind::MethodInvocation {
                ..
            } => {
                let location = self.location(node);
                self.record(element, Relationship::IsInvokedBy, location);
            },
            _ => {},
        }
    }

    fn is_declaration(
        &self,
        node: NodeId,
        element: &Element,
    ) -> bool {
        element.source() == Some(self.source)
            && element.name_offset() == self.unit.span(node).offset
            && self.library.declared_at(self.source, element.name_offset()) == Some(element)
    }

    fn identifier(
        &mut self,
        node: NodeId,
        element: &Element,
    ) {
        // Constructor references are recorded at their invocation sites.
        if element.kind() == ElementKind::Constructor {
            return;
        }
        let mut location = self.location(node);
        let qualifier = self.qualifier(node);
        if let Qualifier::Prefix(prefix) = &qualifier {
            location = location.with_prefix(prefix.clone());
        }
        let qualified = qualifier == Qualifier::Target;

        if let Some(parent) = self.unit.parent(node)
            && let NodeKind::MethodInvocation {
                target,
                operator,
                name,
                ..
            } = self.unit.kind(parent)
            && *name == node
        {
            let relationship = if target.is_some() || operator.is_some() {
                Relationship::IsInvokedByQualified
            } else {
                Relationship::IsInvokedBy
            };
            self.record(element, relationship, location);
            return;
        }

        if element.kind().is_variable() {
            let (read, write) = self.access(node);
            if read {
                self.record(element, Relationship::IsReadBy, location.clone());
            }
            if write {
                self.record(element, Relationship::IsWrittenBy, location.clone());
            }
            if matches!(element.kind(), ElementKind::LocalVariable | ElementKind::Parameter) {
                return;
            }
        }

        if element.kind() == ElementKind::Class
            && let Some(relationship) = self.supertype_relationship(node)
        {
            self.record(element, relationship, location.clone());
        }
        let relationship = if qualified { Relationship::IsReferencedByQualified } else { Relationship::IsReferencedBy };
        self.record(element, relationship, location);
    }

    /// The expression a name stands for: the name itself, or the
    /// property access or prefixed identifier it completes.
    fn expression_of(
        &self,
        node: NodeId,
    ) -> NodeId {
        match self.unit.parent(node).map(|parent| (parent, self.unit.kind(parent))) {
            Some((
                parent,
                NodeKind::PrefixedIdentifier {
                    identifier,
                    ..
                },
            )) if *identifier == node => parent,
            Some((
                parent,
                NodeKind::PropertyAccess {
                    property,
                    ..
                },
            )) if *property == node => parent,
            _ => node,
        }
    }

    fn qualifier(
        &self,
        node: NodeId,
    ) -> Qualifier {
        let Some(parent) = self.unit.parent(node) else {
            return Qualifier::None;
        };
        match self.unit.kind(parent) {
            NodeKind::PrefixedIdentifier {
                prefix,
                identifier,
            } if *identifier == node => match self.resolved.element(*prefix) {
                Some(element) if element.kind() == ElementKind::Prefix => Qualifier::Prefix(element.name().to_string()),
                _ => Qualifier::Target,
            },
            NodeKind::PropertyAccess {
                property,
                ..
            } if *property == node => Qualifier::Target,
            _ => Qualifier::None,
        }
    }

    /// Whether the name is read, written, or both.
    fn access(
        &self,
        node: NodeId,
    ) -> (bool, bool) {
        let expression = self.expression_of(node);
        let Some(parent) = self.unit.parent(expression) else {
            return (true, false);
        };
        match self.unit.kind(parent) {
            NodeKind::AssignmentExpression {
                operator,
                target,
                ..
            } if *target == expression => (operators::assignment_operator_method(*operator).is_some(), true),
            NodeKind::PrefixExpression {
                operator,
                operand,
            }
            | NodeKind::PostfixExpression {
                operator,
                operand,
            } if *operand == expression && operators::is_increment(*operator) => (true, true),
            _ => (true, false),
        }
    }

    /// How a class named in a class header relates to the declaring class.
    fn supertype_relationship(
        &self,
        node: NodeId,
    ) -> Option<Relationship> {
        let type_name = self.unit.parent(self.expression_of(node))?;
        if !matches!(self.unit.kind(type_name), NodeKind::TypeName { .. }) {
            return None;
        }
        let NodeKind::ClassDeclaration {
            superclass,
            mixins,
            interfaces,
            ..
        } = self.unit.kind(self.unit.parent(type_name)?)
        else {
            return None;
        };
        if *superclass == Some(type_name) {
            Some(Relationship::IsExtendedBy)
        } else if mixins.contains(&type_name) {
            Some(Relationship::IsMixedInBy)
        } else if interfaces.contains(&type_name) {
            Some(Relationship::IsImplementedBy)
        } else {
            None
        }
    }

    /// Innermost declared element whose body contains `node`, or the unit.
    fn enclosing_element(
        &self,
        node: NodeId,
    ) -> Element {
        let mut current = self.unit.parent(node);
        while let Some(ancestor) = current {
            let found = match self.unit.kind(ancestor) {
                NodeKind::FunctionExpression {
                    ..
                } => self.resolved.element(ancestor),
                NodeKind::MethodDeclaration {
                    name,
                    ..
                }
                | NodeKind::FunctionDeclaration {
                    name,
                    ..
                }
                | NodeKind::ClassDeclaration {
                    name,
                    ..
                } => self.resolved.element(*name),
                NodeKind::ConstructorDeclaration {
                    class_name,
                    name,
                    ..
                } => self.library.declared_at(self.source, self.unit.span(name.unwrap_or(*class_name)).offset),
                NodeKind::VariableDeclaration {
                    name,
                    ..
                } => self
                    .resolved
                    .element(*name)
                    .filter(|element| matches!(element.kind(), ElementKind::Field | ElementKind::TopLevelVariable)),
                _ => None,
            };
            if let Some(element) = found {
                return element.clone();
            }
            current = self.unit.parent(ancestor);
        }
        self.unit_element.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Qualifier {
    None,
    /// Qualified by an import prefix.
    Prefix(String),
    /// Qualified by a receiver expression or cascade.
    Target,
}

#[cfg(test)]
#[path = "../../tests/src/index/contributor_tests.rs"]
mod tests;
