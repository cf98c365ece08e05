//! Binds the identifiers of a parsed unit to the elements of a linked
//! library model.
//!
//! One traversal per unit. Declarations bind to the elements the builder
//! created for them (matched by name offset); references go through the
//! lexical frames, then the library scope, then the enclosing class
//! hierarchy. Member access uses a minimal static type for its target.
//! Anything that cannot be bound is reported and skipped.

mod lookup;
pub mod operators;
mod scope;

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::{
    ast::{CompilationUnit, LiteralKind, NodeId, NodeKind},
    diagnostics::{Diagnostic, DiagnosticSink, ErrorCode},
    element::{
        DartType, Element, ElementDetail, ElementInfo, ElementKind, ElementModel, LibraryModel, LibraryScope,
    },
    syntax::SyntaxKind,
    vfs::Source,
};

use lookup::MemberLookup;
use scope::{LabelLookup, LabelScope, LabelTarget, Scopes};

static EMPTY_SCOPE: Lazy<LibraryScope> = Lazy::new(LibraryScope::default);

/// Node to element bindings of one unit, plus the static types computed
/// along the way.
#[derive(Debug, Clone)]
pub struct ResolvedUnit {
    source: Source,
    bindings: BTreeMap<NodeId, Element>,
    types: BTreeMap<NodeId, DartType>,
}

impl ResolvedUnit {
    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn element(
        &self,
        node: NodeId,
    ) -> Option<&Element> {
        self.bindings.get(&node)
    }

    /// Bindings in node order.
    pub fn bindings(&self) -> impl Iterator<Item = (NodeId, &Element)> {
        self.bindings.iter().map(|(node, element)| (*node, element))
    }

    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// `None` when the node's type is `dynamic` or unknown.
    pub fn static_type(
        &self,
        node: NodeId,
    ) -> Option<&DartType> {
        self.types.get(&node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
    Invoke,
}

impl Access {
    fn member_key(
        self,
        name: &str,
    ) -> String {
        match self {
            Access::Write => format!("{name}="),
            Access::Read | Access::Invoke => name.to_string(),
        }
    }

    fn undefined_member(self) -> ErrorCode {
        match self {
            Access::Read => ErrorCode::UndefinedGetter,
            Access::Write => ErrorCode::UndefinedSetter,
            Access::Invoke => ErrorCode::UndefinedMethod,
        }
    }
}

/// What the left side of a `.` denotes.
enum Receiver {
    Value(DartType),
    Class(Element),
    Prefix(Element),
}

/// The library being resolved first, then everything else.
#[derive(Clone, Copy)]
struct Models<'a> {
    library: &'a LibraryModel,
    rest: &'a dyn ElementModel,
}

impl<'a> Models<'a> {
    fn info_of(
        &self,
        element: &Element,
    ) -> Option<&'a ElementInfo> {
        self.library.info(element).or_else(|| self.rest.info(element))
    }

    fn library_of(
        &self,
        source: &Source,
    ) -> Option<&'a LibraryModel> {
        if *source == self.library.source {
            return Some(self.library);
        }
        self.rest.library(source)
    }
}

impl ElementModel for Models<'_> {
    fn info(
        &self,
        element: &Element,
    ) -> Option<&ElementInfo> {
        self.info_of(element)
    }

    fn library(
        &self,
        source: &Source,
    ) -> Option<&LibraryModel> {
        self.library_of(source)
    }
}

pub struct ElementResolver<'a> {
    unit: &'a CompilationUnit,
    source: &'a Source,
    library: &'a LibraryModel,
    scope: &'a LibraryScope,
    models: &'a Models<'a>,
    object: Option<&'a Element>,
    scopes: Scopes,
    labels: LabelScope,
    class: Option<Element>,
    cascades: Vec<DartType>,
    bindings: BTreeMap<NodeId, Element>,
    types: BTreeMap<NodeId, DartType>,
    errors: Vec<Diagnostic>,
}

impl ElementResolver<'_> {
    /// Resolves `unit`, one of the units of `library`. `models` must answer
    /// for every library `library` imports; an unlinked `library` resolves
    /// against an empty library scope.
    pub fn resolve(
        unit: &CompilationUnit,
        source: &Source,
        library: &LibraryModel,
        models: &dyn ElementModel,
        sink: &mut dyn DiagnosticSink,
    ) -> ResolvedUnit {
        let models = Models {
            library,
            rest: models,
        };
        let scope = library.scope().unwrap_or(&*EMPTY_SCOPE);
        let mut resolver = ElementResolver {
            unit,
            source,
            library,
            scope,
            models: &models,
            object: scope.lookup("Object").filter(|element| element.kind() == ElementKind::Class),
            scopes: Scopes::default(),
            labels: LabelScope::default(),
            class: None,
            cascades: Vec::new(),
            bindings: BTreeMap::new(),
            types: BTreeMap::new(),
            errors: Vec::new(),
        };
        resolver.visit(unit.root());
        debug!(
            "[resolver] {}: {} bindings, {} diagnostics",
            source.short_name(),
            resolver.bindings.len(),
            resolver.errors.len()
        );
        for error in resolver.errors {
            sink.report(error);
        }
        ResolvedUnit {
            source: source.clone(),
            bindings: resolver.bindings,
            types: resolver.types,
        }
    }
}

impl<'a> ElementResolver<'a> {
    // ── bookkeeping ─────────────────────────────────────────────────────

    fn members(&self) -> MemberLookup<'a> {
        MemberLookup::new(self.models, self.object)
    }

    fn name(
        &self,
        node: NodeId,
    ) -> &'a str {
        self.unit.name(node).unwrap_or("")
    }

    fn bind(
        &mut self,
        node: NodeId,
        element: &Element,
    ) {
        self.bindings.entry(node).or_insert_with(|| element.clone());
    }

    fn report(
        &mut self,
        code: ErrorCode,
        node: NodeId,
        arguments: Vec<String>,
    ) {
        let span = self.unit.span(node);
        self.errors.push(Diagnostic::new(code, span.offset, span.len, arguments));
    }

    fn declared(
        &self,
        offset: usize,
    ) -> Option<Element> {
        self.library.declared_at(self.source, offset).cloned()
    }

    /// Binds the name of a declaration to the element built for it.
    fn declared_name(
        &mut self,
        name: NodeId,
    ) -> Option<Element> {
        let element = self.declared(self.unit.span(name).offset)?;
        self.bind(name, &element);
        Some(element)
    }

    fn define_declared(
        &mut self,
        name: NodeId,
    ) {
        if let Some(element) = self.declared_name(name) {
            self.scopes.define(self.name(name), &element);
        }
    }

    fn core_type(
        &self,
        name: &str,
    ) -> DartType {
        match self.scope.lookup(name) {
            Some(element) if element.kind() == ElementKind::Class => DartType::Interface(element.clone()),
            _ => DartType::Dynamic,
        }
    }

    fn visit_all(
        &mut self,
        nodes: &[NodeId],
    ) {
        for node in nodes {
            self.visit(*node);
        }
    }

    fn visit_opt(
        &mut self,
        node: Option<NodeId>,
    ) {
        if let Some(node) = node {
            self.visit(node);
        }
    }

    fn enter_function(&mut self) -> usize {
        self.scopes.push();
        self.labels.enter_function();
        self.labels.mark()
    }

    fn exit_function(
        &mut self,
        mark: usize,
    ) {
        self.labels.reset(mark);
        self.labels.exit_function();
        self.scopes.pop();
    }

    // ── traversal ───────────────────────────────────────────────────────

    fn visit(
        &mut self,
        node: NodeId,
    ) -> DartType {
        self.visit_with(node, Access::Read)
    }

    fn visit_with(
        &mut self,
        node: NodeId,
        access: Access,
    ) -> DartType {
        let unit = self.unit;
        let ty = match unit.kind(node) {
            NodeKind::CompilationUnit {
                directives,
                declarations,
            } => {
                self.visit_all(directives);
                self.visit_all(declarations);
                DartType::Dynamic
            },
            NodeKind::LibraryDirective {
                name,
            } => {
                let library = self.library.library.clone();
                self.bind(*name, &library);
                DartType::Dynamic
            },
            NodeKind::ImportDirective {
                prefix,
                combinators,
                ..
            } => {
                self.import_directive(node, *prefix, combinators);
                DartType::Dynamic
            },
            NodeKind::ExportDirective {
                uri,
                combinators,
            } => {
                self.export_directive(node, uri, combinators);
                DartType::Dynamic
            },
            NodeKind::PartDirective {
                uri,
            } => {
                let part = self.library.source.resolve(uri);
                if !part.is_some_and(|part| self.library.units.contains(&part)) {
                    self.report(ErrorCode::UriDoesNotExist, node, vec![uri.clone()]);
                }
                DartType::Dynamic
            },
            NodeKind::PartOfDirective {
                name,
                ..
            } => {
                if let Some(name) = name {
                    let library = self.library.library.clone();
                    self.bind(*name, &library);
                }
                DartType::Dynamic
            },
            NodeKind::Combinator {
                ..
            }
            | NodeKind::Label {
                ..
            }
            | NodeKind::EmptyFunctionBody
            | NodeKind::EmptyStatement => DartType::Dynamic,
            NodeKind::ClassDeclaration {
                ..
            } => {
                self.class_declaration(node);
                DartType::Dynamic
            },
            NodeKind::TypeParameter {
                name,
                bound,
            } => {
                self.define_declared(*name);
                if let Some(bound) = bound {
                    self.type_name(*bound);
                }
                DartType::Dynamic
            },
            NodeKind::TypeName {
                ..
            } => self.type_name(node),
            NodeKind::FieldDeclaration {
                variables,
                ..
            }
            | NodeKind::TopLevelVariableDeclaration {
                variables,
            }
            | NodeKind::VariableDeclarationStatement {
                variables,
            } => self.visit(*variables),
            NodeKind::VariableDeclarationList {
                ty,
                variables,
                ..
            } => {
                if let Some(ty) = ty {
                    self.type_name(*ty);
                }
                self.visit_all(variables);
                DartType::Dynamic
            },
            NodeKind::VariableDeclaration {
                name,
                initializer,
            } => {
                // A local is not in scope inside its own initializer.
                self.visit_opt(*initializer);
                match self.declared_name(*name) {
                    Some(element) if element.kind() == ElementKind::LocalVariable => {
                        self.scopes.define(self.name(*name), &element);
                    },
                    _ => {},
                }
                DartType::Dynamic
            },
            NodeKind::MethodDeclaration {
                return_type,
                name,
                parameters,
                body,
                ..
            } => {
                if let Some(return_type) = return_type {
                    self.type_name(*return_type);
                }
                self.declared_name(*name);
                let mark = self.enter_function();
                self.visit_opt(*parameters);
                self.visit(*body);
                self.exit_function(mark);
                DartType::Dynamic
            },
            NodeKind::ConstructorDeclaration {
                ..
            } => {
                self.constructor_declaration(node);
                DartType::Dynamic
            },
            NodeKind::FunctionDeclaration {
                return_type,
                name,
                parameters,
                body,
                ..
            } => {
                if let Some(return_type) = return_type {
                    self.type_name(*return_type);
                }
                // Local functions are visible in their own bodies.
                self.define_declared(*name);
                let mark = self.enter_function();
                self.visit_opt(*parameters);
                self.visit(*body);
                self.exit_function(mark);
                DartType::Dynamic
            },
            NodeKind::FormalParameterList {
                parameters,
            } => {
                self.visit_all(parameters);
                DartType::Dynamic
            },
            NodeKind::FormalParameter {
                ty,
                name,
                default_value,
                ..
            } => {
                if let Some(ty) = ty {
                    self.type_name(*ty);
                }
                self.visit_opt(*default_value);
                self.define_declared(*name);
                DartType::Dynamic
            },
            NodeKind::ConstructorFieldInitializer {
                field,
                value,
            } => {
                let text = self.name(*field);
                let member = self
                    .class
                    .as_ref()
                    .and_then(|class| self.members().class_info(class))
                    .and_then(|info| info.members.get(text))
                    .cloned();
                match member {
                    Some(member) => self.bind(*field, &member),
                    None => self.report(ErrorCode::UndefinedIdentifier, *field, vec![text.to_string()]),
                }
                self.visit(*value);
                DartType::Dynamic
            },
            NodeKind::SuperConstructorInvocation {
                name,
                arguments,
            } => {
                let superclass = self.class.as_ref().and_then(|class| self.members().supertype(class).element().cloned());
                self.constructor_invocation(node, superclass, *name);
                self.visit(*arguments);
                DartType::Dynamic
            },
            NodeKind::RedirectingConstructorInvocation {
                name,
                arguments,
            } => {
                self.constructor_invocation(node, self.class.clone(), *name);
                self.visit(*arguments);
                DartType::Dynamic
            },
            NodeKind::BlockFunctionBody {
                block,
            } => self.visit(*block),
            NodeKind::ExpressionFunctionBody {
                expression,
            } => self.visit(*expression),
            NodeKind::Block {
                statements,
            } => {
                self.scopes.push();
                self.visit_all(statements);
                self.scopes.pop();
                DartType::Dynamic
            },
            NodeKind::FunctionDeclarationStatement {
                function,
            } => self.visit(*function),
            NodeKind::ExpressionStatement {
                expression,
            } => self.visit(*expression),
            NodeKind::ReturnStatement {
                expression,
            } => {
                self.visit_opt(*expression);
                DartType::Dynamic
            },
            NodeKind::IfStatement {
                condition,
                then_statement,
                else_statement,
            } => {
                self.visit(*condition);
                self.visit(*then_statement);
                self.visit_opt(*else_statement);
                DartType::Dynamic
            },
            NodeKind::WhileStatement {
                condition,
                body,
            } => {
                self.visit(*condition);
                self.visit(*body);
                DartType::Dynamic
            },
            NodeKind::DoStatement {
                body,
                condition,
            } => {
                self.visit(*body);
                self.visit(*condition);
                DartType::Dynamic
            },
            NodeKind::ForStatement {
                variables,
                initialization,
                condition,
                updaters,
                body,
            } => {
                self.scopes.push();
                self.visit_opt(*variables);
                self.visit_opt(*initialization);
                self.visit_opt(*condition);
                self.visit_all(updaters);
                self.visit(*body);
                self.scopes.pop();
                DartType::Dynamic
            },
            NodeKind::ForEachStatement {
                loop_variable,
                iterable,
                body,
            } => {
                self.visit(*iterable);
                self.scopes.push();
                self.visit(*loop_variable);
                self.visit(*body);
                self.scopes.pop();
                DartType::Dynamic
            },
            NodeKind::DeclaredIdentifier {
                ty,
                name,
                ..
            } => {
                if let Some(ty) = ty {
                    self.type_name(*ty);
                }
                self.define_declared(*name);
                DartType::Dynamic
            },
            NodeKind::SwitchStatement {
                expression,
                members,
            } => {
                self.visit(*expression);
                let mark = self.labels.mark();
                // Member labels are visible from every member.
                for member in members {
                    if let NodeKind::SwitchCase {
                        labels,
                        ..
                    } = unit.kind(*member)
                    {
                        self.declare_labels(labels, LabelTarget::SwitchMember);
                    }
                }
                self.visit_all(members);
                self.labels.reset(mark);
                DartType::Dynamic
            },
            NodeKind::SwitchCase {
                expression,
                statements,
                ..
            } => {
                self.visit_opt(*expression);
                self.scopes.push();
                self.visit_all(statements);
                self.scopes.pop();
                DartType::Dynamic
            },
            NodeKind::BreakStatement {
                label,
            } => {
                self.label_reference(*label, false);
                DartType::Dynamic
            },
            NodeKind::ContinueStatement {
                label,
            } => {
                self.label_reference(*label, true);
                DartType::Dynamic
            },
            NodeKind::LabeledStatement {
                labels,
                statement,
            } => {
                let target = match unit.kind(*statement) {
                    NodeKind::WhileStatement {
                        ..
                    }
                    | NodeKind::DoStatement {
                        ..
                    }
                    | NodeKind::ForStatement {
                        ..
                    }
                    | NodeKind::ForEachStatement {
                        ..
                    } => LabelTarget::Loop,
                    NodeKind::SwitchStatement {
                        ..
                    } => LabelTarget::Switch,
                    _ => LabelTarget::Statement,
                };
                let mark = self.labels.mark();
                self.declare_labels(labels, target);
                self.visit(*statement);
                self.labels.reset(mark);
                DartType::Dynamic
            },
            NodeKind::TryStatement {
                body,
                catch_clauses,
                finally_block,
            } => {
                self.visit(*body);
                self.visit_all(catch_clauses);
                self.visit_opt(*finally_block);
                DartType::Dynamic
            },
            NodeKind::CatchClause {
                exception_type,
                exception,
                stack_trace,
                body,
            } => {
                if let Some(exception_type) = exception_type {
                    self.type_name(*exception_type);
                }
                self.scopes.push();
                for name in exception.iter().chain(stack_trace) {
                    self.define_declared(*name);
                }
                self.visit(*body);
                self.scopes.pop();
                DartType::Dynamic
            },
            NodeKind::AssertStatement {
                condition,
                message,
            } => {
                self.visit(*condition);
                self.visit_opt(*message);
                DartType::Dynamic
            },

            // ── expressions ─────────────────────────────────────────────
            NodeKind::SimpleIdentifier {
                name,
            } => self.simple_identifier(node, name, access),
            NodeKind::PrefixedIdentifier {
                prefix,
                identifier,
            } => {
                let receiver = self.receiver(Some(*prefix));
                self.member_access(receiver, *identifier, access)
            },
            NodeKind::PropertyAccess {
                target,
                property,
                ..
            } => {
                let receiver = self.receiver(*target);
                self.member_access(receiver, *property, access)
            },
            NodeKind::MethodInvocation {
                target,
                operator,
                name,
                arguments,
            } => self.method_invocation(node, *target, *operator, *name, *arguments),
            NodeKind::FunctionExpressionInvocation {
                function,
                arguments,
            } => {
                self.visit(*function);
                self.visit(*arguments);
                DartType::Dynamic
            },
            NodeKind::FunctionExpression {
                parameters,
                body,
            } => {
                if let Some(closure) = self.declared(unit.span(node).offset) {
                    self.bind(node, &closure);
                }
                let mark = self.enter_function();
                self.visit(*parameters);
                self.visit(*body);
                self.exit_function(mark);
                DartType::Dynamic
            },
            NodeKind::IndexExpression {
                target,
                index,
            } => {
                let receiver = match target {
                    Some(target) => self.visit(*target),
                    None => self.cascade_target(),
                };
                self.visit(*index);
                let method = if access == Access::Write { "[]=" } else { "[]" };
                match self.operator(node, &receiver, method) {
                    Some(method) if access != Access::Write => self.return_type(&method),
                    _ => DartType::Dynamic,
                }
            },
            NodeKind::ArgumentList {
                arguments,
            } => {
                self.visit_all(arguments);
                DartType::Dynamic
            },
            NodeKind::NamedExpression {
                expression,
                ..
            } => self.visit(*expression),
            NodeKind::AssignmentExpression {
                operator,
                target,
                value,
            } => {
                let target_type = self.visit_with(*target, Access::Write);
                let value_type = self.visit(*value);
                match operators::assignment_operator_method(*operator) {
                    Some(method) => {
                        self.operator(node, &target_type, method).map_or(DartType::Dynamic, |m| self.return_type(&m))
                    },
                    None => value_type,
                }
            },
            NodeKind::BinaryExpression {
                operator,
                left,
                right,
            } => {
                let left_type = self.visit(*left);
                self.visit(*right);
                match operator {
                    SyntaxKind::AmpAmp | SyntaxKind::PipePipe => self.core_type("bool"),
                    SyntaxKind::QuestionQuestion => left_type,
                    SyntaxKind::EqEq | SyntaxKind::BangEq => {
                        if let Some(equals) = self.members().member(&left_type, "==") {
                            self.bind(node, &equals);
                        }
                        self.core_type("bool")
                    },
                    operator => match operators::binary_operator_method(*operator) {
                        Some(method) => {
                            self.operator(node, &left_type, method).map_or(DartType::Dynamic, |m| self.return_type(&m))
                        },
                        None => DartType::Dynamic,
                    },
                }
            },
            NodeKind::PrefixExpression {
                operator,
                operand,
            } => {
                let access = if operators::is_increment(*operator) { Access::Write } else { Access::Read };
                let operand_type = self.visit_with(*operand, access);
                match operators::prefix_operator_method(*operator) {
                    Some(method) => {
                        self.operator(node, &operand_type, method).map_or(DartType::Dynamic, |m| self.return_type(&m))
                    },
                    None if *operator == SyntaxKind::Bang => self.core_type("bool"),
                    None => operand_type,
                }
            },
            NodeKind::PostfixExpression {
                operator,
                operand,
            } => {
                let access = if operators::is_increment(*operator) { Access::Write } else { Access::Read };
                let operand_type = self.visit_with(*operand, access);
                if let Some(method) = operators::postfix_operator_method(*operator) {
                    self.operator(node, &operand_type, method);
                }
                operand_type
            },
            NodeKind::ConditionalExpression {
                condition,
                then_expression,
                else_expression,
            } => {
                self.visit(*condition);
                let then_type = self.visit(*then_expression);
                let else_type = self.visit(*else_expression);
                if then_type == else_type { then_type } else { DartType::Dynamic }
            },
            NodeKind::IsExpression {
                expression,
                ty,
                ..
            } => {
                self.visit(*expression);
                self.type_name(*ty);
                self.core_type("bool")
            },
            NodeKind::AsExpression {
                expression,
                ty,
            } => {
                self.visit(*expression);
                self.type_name(*ty)
            },
            NodeKind::CascadeExpression {
                target,
                sections,
            } => {
                let target_type = self.visit(*target);
                self.cascades.push(target_type.clone());
                self.visit_all(sections);
                self.cascades.pop();
                target_type
            },
            NodeKind::InstanceCreationExpression {
                ty,
                name,
                arguments,
                ..
            } => {
                let created = self.constructor_reference(node, *ty, *name);
                self.visit(*arguments);
                created
            },
            NodeKind::ThisExpression => self.class.clone().map_or(DartType::Dynamic, DartType::Interface),
            NodeKind::SuperExpression => {
                self.class.as_ref().map_or(DartType::Dynamic, |class| self.members().supertype(class))
            },
            NodeKind::ParenthesizedExpression {
                expression,
            } => self.visit(*expression),
            NodeKind::ThrowExpression {
                expression,
            } => {
                self.visit(*expression);
                DartType::Dynamic
            },
            NodeKind::CollectionLiteral {
                elements,
            } => {
                self.visit_all(elements);
                DartType::Dynamic
            },
            NodeKind::Literal {
                kind,
            } => self.core_type(match kind {
                LiteralKind::Integer => "int",
                LiteralKind::Double => "double",
                LiteralKind::String => "String",
                LiteralKind::Boolean => "bool",
                LiteralKind::Null => "Null",
            }),
        };
        if !ty.is_dynamic() {
            self.types.insert(node, ty.clone());
        }
        ty
    }

    // ── declarations ────────────────────────────────────────────────────

    fn class_declaration(
        &mut self,
        node: NodeId,
    ) {
        let unit = self.unit;
        let NodeKind::ClassDeclaration {
            name,
            type_parameters,
            superclass,
            mixins,
            interfaces,
            members,
            ..
        } = unit.kind(node)
        else {
            return;
        };
        let class = self.declared_name(*name);
        let enclosing = std::mem::replace(&mut self.class, class.clone());
        self.scopes.push();
        self.visit_all(type_parameters);
        if let Some(info) = class.as_ref().and_then(|class| self.members().class_info(class)) {
            self.scopes.define_all(&info.members);
        }
        for ty in superclass.iter().chain(mixins).chain(interfaces) {
            self.type_name(*ty);
        }
        self.visit_all(members);
        self.scopes.pop();
        self.class = enclosing;
    }

    fn constructor_declaration(
        &mut self,
        node: NodeId,
    ) {
        let NodeKind::ConstructorDeclaration {
            class_name,
            name,
            parameters,
            initializers,
            redirected,
            body,
            ..
        } = self.unit.kind(node)
        else {
            return;
        };
        match name {
            Some(name) => {
                if let Some(class) = self.class.clone() {
                    self.bind(*class_name, &class);
                }
                self.declared_name(*name);
            },
            None => {
                self.declared_name(*class_name);
            },
        }
        let mark = self.enter_function();
        self.visit(*parameters);
        self.visit_all(initializers);
        if let Some(redirected) = redirected {
            self.constructor_reference(*redirected, *redirected, None);
        }
        self.visit(*body);
        self.exit_function(mark);
    }

    fn declare_labels(
        &mut self,
        labels: &[NodeId],
        target: LabelTarget,
    ) {
        for label in labels {
            if let NodeKind::Label {
                name,
            } = self.unit.kind(*label)
                && let Some(element) = self.declared_name(*name)
            {
                self.labels.push(self.name(*name), &element, target);
            }
        }
    }

    fn label_reference(
        &mut self,
        label: Option<NodeId>,
        is_continue: bool,
    ) {
        let Some(label) = label else {
            return;
        };
        let text = self.name(label);
        let found = match self.labels.lookup(text) {
            LabelLookup::Found(element, target) => Ok((element.clone(), target)),
            LabelLookup::OuterFunction(_) => Err(ErrorCode::LabelInOuterScope),
            LabelLookup::Missing => Err(ErrorCode::UndefinedLabel),
        };
        match found {
            Ok((element, target)) => {
                self.bind(label, &element);
                if !is_continue && target == LabelTarget::SwitchMember {
                    self.report(ErrorCode::BreakLabelOnSwitchMember, label, Vec::new());
                } else if is_continue && target == LabelTarget::Switch {
                    self.report(ErrorCode::ContinueLabelOnSwitch, label, Vec::new());
                }
            },
            Err(code) => self.report(code, label, vec![text.to_string()]),
        }
    }

    // ── directives ──────────────────────────────────────────────────────

    fn combinator_names(
        &self,
        combinators: &[NodeId],
    ) -> Vec<NodeId> {
        combinators
            .iter()
            .filter_map(|combinator| match self.unit.kind(*combinator) {
                NodeKind::Combinator {
                    names,
                    ..
                } => Some(names.iter().copied()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn import_directive(
        &mut self,
        node: NodeId,
        prefix: Option<NodeId>,
        combinators: &[NodeId],
    ) {
        let Some(import) = self.declared(self.unit.span(node).offset) else {
            return;
        };
        self.bind(node, &import);
        let Some(ElementDetail::Import(info)) = self.models.info_of(&import).map(|info| &info.detail) else {
            return;
        };
        if let (Some(prefix), Some(element)) = (prefix, &info.prefix) {
            self.bind(prefix, element);
        }
        if !info.imported.as_ref().is_some_and(|source| self.models.library_of(source).is_some()) {
            self.report(ErrorCode::UriDoesNotExist, node, vec![info.uri.clone()]);
            return;
        }
        let namespace = self.scope.import_namespace(&import);
        for name in self.combinator_names(combinators) {
            if let Some(element) = namespace.and_then(|namespace| namespace.get(self.name(name))) {
                self.bind(name, element);
            }
        }
    }

    fn export_directive(
        &mut self,
        node: NodeId,
        uri: &str,
        combinators: &[NodeId],
    ) {
        let exported = self.library.exports.iter().find(|export| export.uri == uri).and_then(|export| export.exported.as_ref());
        let Some(model) = exported.and_then(|source| self.models.library_of(source)) else {
            self.report(ErrorCode::UriDoesNotExist, node, vec![uri.to_string()]);
            return;
        };
        for name in self.combinator_names(combinators) {
            if let Some(element) = model.scope().and_then(|scope| scope.defined(self.name(name))) {
                self.bind(name, element);
            }
        }
    }

    // ── types and constructors ──────────────────────────────────────────

    /// Resolves a type annotation and binds its identifiers.
    fn type_name(
        &mut self,
        node: NodeId,
    ) -> DartType {
        let unit = self.unit;
        let NodeKind::TypeName {
            name,
            arguments,
        } = unit.kind(node)
        else {
            return DartType::Dynamic;
        };
        for argument in arguments {
            self.type_name(*argument);
        }
        match unit.kind(*name) {
            NodeKind::SimpleIdentifier {
                name: text,
            } => match text.as_str() {
                "void" => DartType::Void,
                "dynamic" | "" => DartType::Dynamic,
                text => self.named_type(*name, text),
            },
            NodeKind::PrefixedIdentifier {
                prefix,
                identifier,
            } => self.prefixed_type(*name, *prefix, *identifier).map_or(DartType::Dynamic, DartType::Interface),
            _ => DartType::Dynamic,
        }
    }

    fn named_type(
        &mut self,
        node: NodeId,
        text: &str,
    ) -> DartType {
        let found = self.scopes.lookup(text, false).or_else(|| self.scope.lookup(text)).cloned();
        match found {
            Some(element) if element.kind() == ElementKind::Class => {
                self.bind(node, &element);
                DartType::Interface(element)
            },
            Some(element) if element.kind() == ElementKind::TypeParameter => {
                self.bind(node, &element);
                DartType::TypeParameter(element)
            },
            _ => {
                self.report(ErrorCode::UndefinedClass, node, vec![text.to_string()]);
                DartType::Dynamic
            },
        }
    }

    /// `prefix.Class` through an import prefix.
    fn prefixed_type(
        &mut self,
        node: NodeId,
        prefix: NodeId,
        identifier: NodeId,
    ) -> Option<Element> {
        let (prefix_text, text) = (self.name(prefix), self.name(identifier));
        let Some(scope) = self.scope.prefix(prefix_text) else {
            self.report(ErrorCode::UndefinedClass, node, vec![format!("{prefix_text}.{text}")]);
            return None;
        };
        self.bind(prefix, &scope.element);
        match scope.lookup(text).filter(|element| element.kind() == ElementKind::Class) {
            Some(class) => {
                self.bind(identifier, class);
                Some(class.clone())
            },
            None => {
                self.report(ErrorCode::UndefinedClass, identifier, vec![format!("{prefix_text}.{text}")]);
                None
            },
        }
    }

    /// `new C()`, `new C.name()`, `new p.C()`, `new p.C.name()` and factory
    /// redirections. The parser reads `C.name` as a qualified type name, so
    /// a qualifier that is not an import prefix names the class.
    fn constructor_reference(
        &mut self,
        site: NodeId,
        ty: NodeId,
        name: Option<NodeId>,
    ) -> DartType {
        let unit = self.unit;
        let NodeKind::TypeName {
            name: type_name,
            arguments,
        } = unit.kind(ty)
        else {
            return DartType::Dynamic;
        };
        for argument in arguments {
            self.type_name(*argument);
        }
        let (class, constructor_name) = match unit.kind(*type_name) {
            NodeKind::SimpleIdentifier {
                name: text,
            } => (self.named_type(*type_name, text).element().cloned(), name),
            NodeKind::PrefixedIdentifier {
                prefix,
                identifier,
            } => {
                let prefix_text = self.name(*prefix);
                let is_import_prefix =
                    self.scopes.lookup(prefix_text, false).is_none() && self.scope.prefix(prefix_text).is_some();
                if is_import_prefix {
                    (self.prefixed_type(*type_name, *prefix, *identifier), name)
                } else {
                    (self.named_type(*prefix, prefix_text).element().cloned(), Some(*identifier))
                }
            },
            _ => (None, None),
        };
        let Some(class) = class.filter(|class| class.kind() == ElementKind::Class) else {
            return DartType::Dynamic;
        };
        let text = constructor_name.map_or("", |name| self.name(name));
        match self.members().constructor(&class, text) {
            Some(constructor) => {
                self.bind(site, &constructor);
                if let Some(name) = constructor_name {
                    self.bind(name, &constructor);
                }
            },
            None => self.report(ErrorCode::UndefinedConstructor, constructor_name.unwrap_or(ty), vec![
                class.name().to_string(),
                text.to_string(),
            ]),
        }
        DartType::Interface(class)
    }

    /// `super(...)`, `super.name(...)`, `this(...)` and `this.name(...)`.
    fn constructor_invocation(
        &mut self,
        node: NodeId,
        class: Option<Element>,
        name: Option<NodeId>,
    ) {
        let Some(class) = class else {
            return;
        };
        let text = name.map_or("", |name| self.name(name));
        match self.members().constructor(&class, text) {
            Some(constructor) => {
                self.bind(node, &constructor);
                if let Some(name) = name {
                    self.bind(name, &constructor);
                }
            },
            None => self.report(ErrorCode::UndefinedConstructor, name.unwrap_or(node), vec![
                class.name().to_string(),
                text.to_string(),
            ]),
        }
    }

    // ── references ──────────────────────────────────────────────────────

    fn return_type(
        &self,
        element: &Element,
    ) -> DartType {
        self.models.info_of(element).map_or(DartType::Dynamic, ElementInfo::return_type)
    }

    /// Type of the value produced by using `element` with `access`.
    fn value_type(
        &self,
        element: &Element,
        access: Access,
    ) -> DartType {
        let Some(info) = self.models.info_of(element) else {
            return DartType::Dynamic;
        };
        match (element.kind(), access) {
            (ElementKind::Setter, _) => info
                .parameters()
                .first()
                .and_then(|parameter| self.models.info_of(parameter))
                .map_or(DartType::Dynamic, ElementInfo::value_type),
            (ElementKind::Method | ElementKind::Function, Access::Invoke) => info.return_type(),
            (ElementKind::Getter | ElementKind::Constructor, _) => info.value_type(),
            (kind, Access::Read | Access::Write) if kind.is_variable() => info.value_type(),
            _ => DartType::Dynamic,
        }
    }

    fn cascade_target(&self) -> DartType {
        self.cascades.last().cloned().unwrap_or(DartType::Dynamic)
    }

    fn library_lookup(
        &self,
        name: &str,
        access: Access,
    ) -> Option<&'a Element> {
        if access == Access::Write
            && let Some(setter) = self.scope.lookup(&access.member_key(name))
        {
            return Some(setter);
        }
        self.scope.lookup(name)
    }

    fn simple_identifier(
        &mut self,
        node: NodeId,
        name: &str,
        access: Access,
    ) -> DartType {
        if name.is_empty() {
            return DartType::Dynamic;
        }
        if let Some(element) = self.bindings.get(&node) {
            return self.value_type(element, access);
        }
        let found = self
            .scopes
            .lookup(name, access == Access::Write)
            .or_else(|| self.library_lookup(name, access))
            .cloned()
            .or_else(|| {
                let class = self.class.as_ref()?;
                let members = self.members();
                members.member_of_class(class, &access.member_key(name)).or_else(|| members.member_of_class(class, name))
            });
        match found {
            Some(element) => {
                self.bind(node, &element);
                self.value_type(&element, access)
            },
            None => {
                let code =
                    if access == Access::Invoke { ErrorCode::UndefinedFunction } else { ErrorCode::UndefinedIdentifier };
                self.report(code, node, vec![name.to_string()]);
                DartType::Dynamic
            },
        }
    }

    fn receiver(
        &mut self,
        target: Option<NodeId>,
    ) -> Receiver {
        let Some(target) = target else {
            return Receiver::Value(self.cascade_target());
        };
        let ty = self.visit(target);
        match self.bindings.get(&target).filter(|_| matches!(self.unit.kind(target), NodeKind::SimpleIdentifier { .. })) {
            Some(element) if element.kind() == ElementKind::Class => Receiver::Class(element.clone()),
            Some(element) if element.kind() == ElementKind::Prefix => Receiver::Prefix(element.clone()),
            _ => Receiver::Value(ty),
        }
    }

    fn member_access(
        &mut self,
        receiver: Receiver,
        property: NodeId,
        access: Access,
    ) -> DartType {
        let text = self.name(property);
        if text.is_empty() {
            return DartType::Dynamic;
        }
        let key = access.member_key(text);
        let (found, owner) = match &receiver {
            Receiver::Prefix(prefix) => {
                let scope = self.scope.prefix(prefix.name());
                let found = scope.and_then(|scope| scope.lookup(&key).or_else(|| scope.lookup(text))).cloned();
                if found.is_none() {
                    self.report(ErrorCode::UndefinedPrefixedName, property, vec![
                        text.to_string(),
                        prefix.name().to_string(),
                    ]);
                }
                (found, None)
            },
            Receiver::Class(class) => {
                let found = self
                    .members()
                    .class_info(class)
                    .and_then(|info| info.members.get(&key).or_else(|| info.members.get(text)))
                    .cloned();
                (found, Some(class.name().to_string()))
            },
            Receiver::Value(ty) => {
                let members = self.members();
                let found = members.member(ty, &key).or_else(|| members.member(ty, text));
                let owner = members.class_of(ty).map(|_| ty.display_name());
                (found, owner)
            },
        };
        match (found, owner) {
            (Some(element), _) => {
                self.bind(property, &element);
                self.value_type(&element, access)
            },
            (None, Some(owner)) => {
                self.report(access.undefined_member(), property, vec![text.to_string(), owner]);
                DartType::Dynamic
            },
            (None, None) => DartType::Dynamic,
        }
    }

    fn method_invocation(
        &mut self,
        node: NodeId,
        target: Option<NodeId>,
        operator: Option<SyntaxKind>,
        name: NodeId,
        arguments: NodeId,
    ) -> DartType {
        let text = self.name(name);
        let ty = if target.is_none() && operator.is_none() {
            let ty = self.simple_identifier(name, text, Access::Invoke);
            match self.bindings.get(&name).filter(|element| element.kind() == ElementKind::Class).cloned() {
                // `C(...)` without `new`.
                Some(class) => {
                    if let Some(constructor) = self.members().constructor(&class, "") {
                        self.bind(node, &constructor);
                    }
                    DartType::Interface(class)
                },
                None => ty,
            }
        } else {
            match self.receiver(target) {
                // `C.name(...)` without `new`.
                Receiver::Class(class)
                    if self.members().class_info(&class).is_some_and(|info| !info.members.contains_key(text)) =>
                {
                    match self.members().constructor(&class, text) {
                        Some(constructor) => {
                            self.bind(node, &constructor);
                            self.bind(name, &constructor);
                        },
                        None => self.report(ErrorCode::UndefinedMethod, name, vec![
                            text.to_string(),
                            class.name().to_string(),
                        ]),
                    }
                    DartType::Interface(class)
                },
                receiver => self.member_access(receiver, name, Access::Invoke),
            }
        };
        if let Some(invoked) = self.bindings.get(&name).cloned() {
            self.named_arguments(&invoked, arguments);
        }
        self.visit(arguments);
        ty
    }

    /// Binds `name:` labels of named arguments to the invoked parameters.
    fn named_arguments(
        &mut self,
        invoked: &Element,
        arguments: NodeId,
    ) {
        let unit = self.unit;
        let NodeKind::ArgumentList {
            arguments,
        } = unit.kind(arguments)
        else {
            return;
        };
        let Some(parameters) = self.models.info_of(invoked).map(ElementInfo::parameters) else {
            return;
        };
        for argument in arguments {
            let NodeKind::NamedExpression {
                name: label,
                ..
            } = unit.kind(*argument)
            else {
                continue;
            };
            let NodeKind::Label {
                name,
            } = unit.kind(*label)
            else {
                continue;
            };
            if let Some(parameter) = parameters.iter().find(|parameter| parameter.name() == self.name(*name)) {
                self.bind(*name, parameter);
            }
        }
    }

    /// Binds an operator node to the method that implements it. Reports
    /// when the operand has a known class without that method.
    fn operator(
        &mut self,
        node: NodeId,
        operand: &DartType,
        method: &str,
    ) -> Option<Element> {
        let members = self.members();
        match members.member(operand, method) {
            Some(element) => {
                self.bind(node, &element);
                Some(element)
            },
            None => {
                if members.class_of(operand).is_some() {
                    self.report(ErrorCode::UndefinedOperator, node, vec![
                        method.to_string(),
                        operand.display_name(),
                    ]);
                }
                None
            },
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src/resolver/resolver_tests.rs"]
mod tests;
