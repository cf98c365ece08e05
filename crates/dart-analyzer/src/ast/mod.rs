//! Arena syntax tree produced by a [`UnitParser`](crate::context::UnitParser).
//!
//! Nodes refer to their children by [`NodeId`]; parents are filled in by
//! [`UnitBuilder::finish`] for every node reachable from the root.

mod parser;

pub use parser::{ParsedUnit, parse_unit};

use crate::syntax::SyntaxKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn end(self) -> usize {
        self.offset + self.len
    }

    pub fn contains(
        self,
        offset: usize,
    ) -> bool {
        self.offset <= offset && offset < self.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Getter,
    Setter,
    Operator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Required,
    Positional,
    Named,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Integer,
    Double,
    String,
    Boolean,
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    CompilationUnit {
        directives: Vec<NodeId>,
        declarations: Vec<NodeId>,
    },

    // ── directives ──────────────────────────────────────────────────────
    LibraryDirective {
        name: NodeId,
    },
    ImportDirective {
        uri: String,
        prefix: Option<NodeId>,
        combinators: Vec<NodeId>,
    },
    ExportDirective {
        uri: String,
        combinators: Vec<NodeId>,
    },
    PartDirective {
        uri: String,
    },
    PartOfDirective {
        name: Option<NodeId>,
        uri: Option<String>,
    },
    Combinator {
        hide: bool,
        names: Vec<NodeId>,
    },

    // ── declarations ────────────────────────────────────────────────────
    ClassDeclaration {
        is_abstract: bool,
        name: NodeId,
        type_parameters: Vec<NodeId>,
        superclass: Option<NodeId>,
        mixins: Vec<NodeId>,
        interfaces: Vec<NodeId>,
        members: Vec<NodeId>,
    },
    TypeParameter {
        name: NodeId,
        bound: Option<NodeId>,
    },
    TypeName {
        name: NodeId,
        arguments: Vec<NodeId>,
    },
    FieldDeclaration {
        is_static: bool,
        variables: NodeId,
    },
    TopLevelVariableDeclaration {
        variables: NodeId,
    },
    VariableDeclarationList {
        keyword: Option<SyntaxKind>,
        ty: Option<NodeId>,
        variables: Vec<NodeId>,
    },
    VariableDeclaration {
        name: NodeId,
        initializer: Option<NodeId>,
    },
    MethodDeclaration {
        is_static: bool,
        kind: MethodKind,
        return_type: Option<NodeId>,
        name: NodeId,
        parameters: Option<NodeId>,
        body: NodeId,
    },
    ConstructorDeclaration {
        is_factory: bool,
        class_name: NodeId,
        name: Option<NodeId>,
        parameters: NodeId,
        initializers: Vec<NodeId>,
        redirected: Option<NodeId>,
        body: NodeId,
    },
    FunctionDeclaration {
        kind: MethodKind,
        return_type: Option<NodeId>,
        name: NodeId,
        parameters: Option<NodeId>,
        body: NodeId,
    },
    FormalParameterList {
        parameters: Vec<NodeId>,
    },
    FormalParameter {
        kind: ParameterKind,
        field_formal: bool,
        ty: Option<NodeId>,
        name: NodeId,
        default_value: Option<NodeId>,
    },
    ConstructorFieldInitializer {
        field: NodeId,
        value: NodeId,
    },
    SuperConstructorInvocation {
        name: Option<NodeId>,
        arguments: NodeId,
    },
    RedirectingConstructorInvocation {
        name: Option<NodeId>,
        arguments: NodeId,
    },
    BlockFunctionBody {
        block: NodeId,
    },
    ExpressionFunctionBody {
        expression: NodeId,
    },
    EmptyFunctionBody,

    // ── statements ──────────────────────────────────────────────────────
    Block {
        statements: Vec<NodeId>,
    },
    VariableDeclarationStatement {
        variables: NodeId,
    },
    FunctionDeclarationStatement {
        function: NodeId,
    },
    ExpressionStatement {
        expression: NodeId,
    },
    ReturnStatement {
        expression: Option<NodeId>,
    },
    IfStatement {
        condition: NodeId,
        then_statement: NodeId,
        else_statement: Option<NodeId>,
    },
    WhileStatement {
        condition: NodeId,
        body: NodeId,
    },
    DoStatement {
        body: NodeId,
        condition: NodeId,
    },
    ForStatement {
        variables: Option<NodeId>,
        initialization: Option<NodeId>,
        condition: Option<NodeId>,
        updaters: Vec<NodeId>,
        body: NodeId,
    },
    ForEachStatement {
        loop_variable: NodeId,
        iterable: NodeId,
        body: NodeId,
    },
    DeclaredIdentifier {
        keyword: Option<SyntaxKind>,
        ty: Option<NodeId>,
        name: NodeId,
    },
    SwitchStatement {
        expression: NodeId,
        members: Vec<NodeId>,
    },
    SwitchCase {
        labels: Vec<NodeId>,
        expression: Option<NodeId>,
        statements: Vec<NodeId>,
    },
    BreakStatement {
        label: Option<NodeId>,
    },
    ContinueStatement {
        label: Option<NodeId>,
    },
    LabeledStatement {
        labels: Vec<NodeId>,
        statement: NodeId,
    },
    Label {
        name: NodeId,
    },
    TryStatement {
        body: NodeId,
        catch_clauses: Vec<NodeId>,
        finally_block: Option<NodeId>,
    },
    CatchClause {
        exception_type: Option<NodeId>,
        exception: Option<NodeId>,
        stack_trace: Option<NodeId>,
        body: NodeId,
    },
    AssertStatement {
        condition: NodeId,
        message: Option<NodeId>,
    },
    EmptyStatement,

    // ── expressions ─────────────────────────────────────────────────────
    SimpleIdentifier {
        name: String,
    },
    PrefixedIdentifier {
        prefix: NodeId,
        identifier: NodeId,
    },
    PropertyAccess {
        target: Option<NodeId>,
        operator: SyntaxKind,
        property: NodeId,
    },
    MethodInvocation {
        target: Option<NodeId>,
        operator: Option<SyntaxKind>,
        name: NodeId,
        arguments: NodeId,
    },
    FunctionExpressionInvocation {
        function: NodeId,
        arguments: NodeId,
    },
    FunctionExpression {
        parameters: NodeId,
        body: NodeId,
    },
    IndexExpression {
        target: Option<NodeId>,
        index: NodeId,
    },
    ArgumentList {
        arguments: Vec<NodeId>,
    },
    NamedExpression {
        name: NodeId,
        expression: NodeId,
    },
    AssignmentExpression {
        operator: SyntaxKind,
        target: NodeId,
        value: NodeId,
    },
    BinaryExpression {
        operator: SyntaxKind,
        left: NodeId,
        right: NodeId,
    },
    PrefixExpression {
        operator: SyntaxKind,
        operand: NodeId,
    },
    PostfixExpression {
        operator: SyntaxKind,
        operand: NodeId,
    },
    ConditionalExpression {
        condition: NodeId,
        then_expression: NodeId,
        else_expression: NodeId,
    },
    IsExpression {
        expression: NodeId,
        negated: bool,
        ty: NodeId,
    },
    AsExpression {
        expression: NodeId,
        ty: NodeId,
    },
    CascadeExpression {
        target: NodeId,
        sections: Vec<NodeId>,
    },
    InstanceCreationExpression {
        keyword: SyntaxKind,
        ty: NodeId,
        name: Option<NodeId>,
        arguments: NodeId,
    },
    ThisExpression,
    SuperExpression,
    ParenthesizedExpression {
        expression: NodeId,
    },
    ThrowExpression {
        expression: NodeId,
    },
    CollectionLiteral {
        elements: Vec<NodeId>,
    },
    Literal {
        kind: LiteralKind,
    },
}

impl NodeKind {
    /// Direct children in source order.
    pub fn children(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut push = |id: &NodeId| out.push(*id);
        match self {
            NodeKind::CompilationUnit {
                directives,
                declarations,
            } => {
                directives.iter().for_each(&mut push);
                declarations.iter().for_each(&mut push);
            },
            NodeKind::LibraryDirective {
                name,
            } => push(name),
            NodeKind::ImportDirective {
                prefix,
                combinators,
                ..
            } => {
                prefix.iter().for_each(&mut push);
                combinators.iter().for_each(&mut push);
            },
            NodeKind::ExportDirective {
                combinators,
                ..
            } => combinators.iter().for_each(&mut push),
            NodeKind::PartOfDirective {
                name,
                ..
            } => name.iter().for_each(&mut push),
            NodeKind::Combinator {
                names,
                ..
            } => names.iter().for_each(&mut push),
            NodeKind::ClassDeclaration {
                name,
                type_parameters,
                superclass,
                mixins,
                interfaces,
                members,
                ..
            } => {
                push(name);
                type_parameters.iter().for_each(&mut push);
                superclass.iter().for_each(&mut push);
                mixins.iter().for_each(&mut push);
                interfaces.iter().for_each(&mut push);
                members.iter().for_each(&mut push);
            },
            NodeKind::TypeParameter {
                name,
                bound,
            } => {
                push(name);
                bound.iter().for_each(&mut push);
            },
            NodeKind::TypeName {
                name,
                arguments,
            } => {
                push(name);
                arguments.iter().for_each(&mut push);
            },
            NodeKind::FieldDeclaration {
                variables,
                ..
            }
            | NodeKind::TopLevelVariableDeclaration {
                variables,
            }
            | NodeKind::VariableDeclarationStatement {
                variables,
            } => push(variables),
            NodeKind::VariableDeclarationList {
                ty,
                variables,
                ..
            } => {
                ty.iter().for_each(&mut push);
                variables.iter().for_each(&mut push);
            },
            NodeKind::VariableDeclaration {
                name,
                initializer,
            } => {
                push(name);
                initializer.iter().for_each(&mut push);
            },
            NodeKind::MethodDeclaration {
                return_type,
                name,
                parameters,
                body,
                ..
            }
            | NodeKind::FunctionDeclaration {
                return_type,
                name,
                parameters,
                body,
                ..
            } => {
                return_type.iter().for_each(&mut push);
                push(name);
                parameters.iter().for_each(&mut push);
                push(body);
            },
            NodeKind::ConstructorDeclaration {
                class_name,
                name,
                parameters,
                initializers,
                redirected,
                body,
                ..
            } => {
                push(class_name);
                name.iter().for_each(&mut push);
                push(parameters);
                initializers.iter().for_each(&mut push);
                redirected.iter().for_each(&mut push);
                push(body);
            },
            NodeKind::FormalParameterList {
                parameters,
            } => parameters.iter().for_each(&mut push),
            NodeKind::FormalParameter {
                ty,
                name,
                default_value,
                ..
            } => {
                ty.iter().for_each(&mut push);
                push(name);
                default_value.iter().for_each(&mut push);
            },
            NodeKind::ConstructorFieldInitializer {
                field,
                value,
            } => {
                push(field);
                push(value);
            },
            NodeKind::SuperConstructorInvocation {
                name,
                arguments,
            }
            | NodeKind::RedirectingConstructorInvocation {
                name,
                arguments,
            } => {
                name.iter().for_each(&mut push);
                push(arguments);
            },
            NodeKind::BlockFunctionBody {
                block,
            } => push(block),
            NodeKind::ExpressionFunctionBody {
                expression,
            }
            | NodeKind::ExpressionStatement {
                expression,
            }
            | NodeKind::ParenthesizedExpression {
                expression,
            }
            | NodeKind::ThrowExpression {
                expression,
            } => push(expression),
            NodeKind::Block {
                statements,
            } => statements.iter().for_each(&mut push),
            NodeKind::FunctionDeclarationStatement {
                function,
            } => push(function),
            NodeKind::ReturnStatement {
                expression,
            } => expression.iter().for_each(&mut push),
            NodeKind::IfStatement {
                condition,
                then_statement,
                else_statement,
            } => {
                push(condition);
                push(then_statement);
                else_statement.iter().for_each(&mut push);
            },
            NodeKind::WhileStatement {
                condition,
                body,
            } => {
                push(condition);
                push(body);
            },
            NodeKind::DoStatement {
                body,
                condition,
            } => {
                push(body);
                push(condition);
            },
            NodeKind::ForStatement {
                variables,
                initialization,
                condition,
                updaters,
                body,
            } => {
                variables.iter().for_each(&mut push);
                initialization.iter().for_each(&mut push);
                condition.iter().for_each(&mut push);
                updaters.iter().for_each(&mut push);
                push(body);
            },
            NodeKind::ForEachStatement {
                loop_variable,
                iterable,
                body,
            } => {
                push(loop_variable);
                push(iterable);
                push(body);
            },
            NodeKind::DeclaredIdentifier {
                ty,
                name,
                ..
            } => {
                ty.iter().for_each(&mut push);
                push(name);
            },
            NodeKind::SwitchStatement {
                expression,
                members,
            } => {
                push(expression);
                members.iter().for_each(&mut push);
            },
            NodeKind::SwitchCase {
                labels,
                expression,
                statements,
            } => {
                labels.iter().for_each(&mut push);
                expression.iter().for_each(&mut push);
                statements.iter().for_each(&mut push);
            },
            NodeKind::BreakStatement {
                label,
            }
            | NodeKind::ContinueStatement {
                label,
            } => label.iter().for_each(&mut push),
            NodeKind::LabeledStatement {
                labels,
                statement,
            } => {
                labels.iter().for_each(&mut push);
                push(statement);
            },
            NodeKind::Label {
                name,
            } => push(name),
            NodeKind::TryStatement {
                body,
                catch_clauses,
                finally_block,
            } => {
                push(body);
                catch_clauses.iter().for_each(&mut push);
                finally_block.iter().for_each(&mut push);
            },
            NodeKind::CatchClause {
                exception_type,
                exception,
                stack_trace,
                body,
            } => {
                exception_type.iter().for_each(&mut push);
                exception.iter().for_each(&mut push);
                stack_trace.iter().for_each(&mut push);
                push(body);
            },
            NodeKind::AssertStatement {
                condition,
                message,
            } => {
                push(condition);
                message.iter().for_each(&mut push);
            },
            NodeKind::PrefixedIdentifier {
                prefix,
                identifier,
            } => {
                push(prefix);
                push(identifier);
            },
            NodeKind::PropertyAccess {
                target,
                property,
                ..
            } => {
                target.iter().for_each(&mut push);
                push(property);
            },
            NodeKind::MethodInvocation {
                target,
                name,
                arguments,
                ..
            } => {
                target.iter().for_each(&mut push);
                push(name);
                push(arguments);
            },
            NodeKind::FunctionExpressionInvocation {
                function,
                arguments,
            } => {
                push(function);
                push(arguments);
            },
            NodeKind::FunctionExpression {
                parameters,
                body,
            } => {
                push(parameters);
                push(body);
            },
            NodeKind::IndexExpression {
                target,
                index,
            } => {
                target.iter().for_each(&mut push);
                push(index);
            },
            NodeKind::ArgumentList {
                arguments,
            } => arguments.iter().for_each(&mut push),
            NodeKind::NamedExpression {
                name,
                expression,
            } => {
                push(name);
                push(expression);
            },
            NodeKind::AssignmentExpression {
                target,
                value,
                ..
            } => {
                push(target);
                push(value);
            },
            NodeKind::BinaryExpression {
                left,
                right,
                ..
            } => {
                push(left);
                push(right);
            },
            NodeKind::PrefixExpression {
                operand,
                ..
            }
            | NodeKind::PostfixExpression {
                operand,
                ..
            } => push(operand),
            NodeKind::ConditionalExpression {
                condition,
                then_expression,
                else_expression,
            } => {
                push(condition);
                push(then_expression);
                push(else_expression);
            },
            NodeKind::IsExpression {
                expression,
                ty,
                ..
            }
            | NodeKind::AsExpression {
                expression,
                ty,
            } => {
                push(expression);
                push(ty);
            },
            NodeKind::CascadeExpression {
                target,
                sections,
            } => {
                push(target);
                sections.iter().for_each(&mut push);
            },
            NodeKind::InstanceCreationExpression {
                ty,
                name,
                arguments,
                ..
            } => {
                push(ty);
                name.iter().for_each(&mut push);
                push(arguments);
            },
            NodeKind::CollectionLiteral {
                elements,
            } => elements.iter().for_each(&mut push),
            NodeKind::PartDirective {
                ..
            }
            | NodeKind::EmptyFunctionBody
            | NodeKind::EmptyStatement
            | NodeKind::SimpleIdentifier {
                ..
            }
            | NodeKind::ThisExpression
            | NodeKind::SuperExpression
            | NodeKind::Literal {
                ..
            } => {},
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub parent: Option<NodeId>,
}

/// A parsed compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    nodes: Vec<Node>,
    root: NodeId,
}

impl CompilationUnit {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(
        &self,
        id: NodeId,
    ) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn kind(
        &self,
        id: NodeId,
    ) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn span(
        &self,
        id: NodeId,
    ) -> Span {
        self.node(id).span
    }

    pub fn parent(
        &self,
        id: NodeId,
    ) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// The name of a `SimpleIdentifier` node.
    pub fn name(
        &self,
        id: NodeId,
    ) -> Option<&str> {
        match self.kind(id) {
            NodeKind::SimpleIdentifier {
                name,
            } => Some(name),
            _ => None,
        }
    }

    /// Nodes reachable from the root, in pre-order.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            let mut children = self.kind(id).children();
            children.reverse();
            stack.extend(children);
        }
        order
    }

    /// Reachable `SimpleIdentifier` nodes named `name`, in source order.
    pub fn identifiers_named(
        &self,
        name: &str,
    ) -> Vec<NodeId> {
        self.walk().into_iter().filter(|id| self.name(*id) == Some(name)).collect()
    }

    /// The innermost node whose span contains `offset`.
    pub fn node_at(
        &self,
        offset: usize,
    ) -> Option<NodeId> {
        self.walk().into_iter().filter(|id| self.span(*id).contains(offset)).min_by_key(|id| self.span(*id).len)
    }
}

/// Accumulates nodes during parsing.
#[derive(Debug, Default)]
pub struct UnitBuilder {
    nodes: Vec<Node>,
}

impl UnitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        kind: NodeKind,
        start: usize,
        end: usize,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span: Span {
                offset: start,
                len: end.saturating_sub(start),
            },
            parent: None,
        });
        id
    }

    pub fn kind(
        &self,
        id: NodeId,
    ) -> Option<&NodeKind> {
        self.nodes.get(id.index()).map(|node| &node.kind)
    }

    pub fn finish(
        mut self,
        root: NodeId,
    ) -> CompilationUnit {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id.index()) else {
                continue;
            };
            let children = node.kind.children();
            for child in children {
                if let Some(child_node) = self.nodes.get_mut(child.index()) {
                    child_node.parent = Some(id);
                }
                stack.push(child);
            }
        }
        CompilationUnit {
            nodes: self.nodes,
            root,
        }
    }
}
