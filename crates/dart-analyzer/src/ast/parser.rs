//! Recursive-descent parser with local error recovery.
//!
//! Covers the declaration and expression forms the resolver binds. Anything
//! it cannot make sense of is reported and skipped one token at a time, so
//! the tree is always complete over the parts that did parse.

use tracing::trace;

use crate::{
    ast::{CompilationUnit, LiteralKind, MethodKind, NodeId, NodeKind, ParameterKind, UnitBuilder},
    diagnostics::{Diagnostic, ErrorCode},
    syntax::{SyntaxKind, TokenId, TokenStream, unquote},
};

#[derive(Debug, Clone)]
pub struct ParsedUnit {
    pub unit: CompilationUnit,
    pub errors: Vec<Diagnostic>,
}

pub fn parse_unit(stream: &TokenStream) -> ParsedUnit {
    let tokens: Vec<TokenId> =
        stream.iter().filter(|(_, token)| token.kind() != SyntaxKind::Comment).map(|(id, _)| id).collect();
    let parser = Parser {
        stream,
        tokens,
        pos: 0,
        pending_gt: false,
        builder: UnitBuilder::new(),
        errors: Vec::new(),
    };
    parser.compilation_unit()
}

/// Binary operator tiers from loosest to tightest.
const BINARY_LEVELS: &[&[SyntaxKind]] = &[
    &[SyntaxKind::QuestionQuestion],
    &[SyntaxKind::PipePipe],
    &[SyntaxKind::AmpAmp],
    &[SyntaxKind::EqEq, SyntaxKind::BangEq],
    &[SyntaxKind::Lt, SyntaxKind::Gt, SyntaxKind::LtEq, SyntaxKind::GtEq],
    &[SyntaxKind::Pipe],
    &[SyntaxKind::Caret],
    &[SyntaxKind::Amp],
    &[SyntaxKind::LtLt, SyntaxKind::GtGt],
    &[SyntaxKind::Plus, SyntaxKind::Minus],
    &[SyntaxKind::Star, SyntaxKind::Slash, SyntaxKind::Percent, SyntaxKind::TildeSlash],
];

const RELATIONAL_LEVEL: usize = 4;

/// Operators a class may declare with `operator`.
const USER_OPERATORS: &[SyntaxKind] = &[
    SyntaxKind::EqEq,
    SyntaxKind::Lt,
    SyntaxKind::Gt,
    SyntaxKind::LtEq,
    SyntaxKind::GtEq,
    SyntaxKind::Minus,
    SyntaxKind::Plus,
    SyntaxKind::Slash,
    SyntaxKind::TildeSlash,
    SyntaxKind::Star,
    SyntaxKind::Percent,
    SyntaxKind::Pipe,
    SyntaxKind::Caret,
    SyntaxKind::Amp,
    SyntaxKind::LtLt,
    SyntaxKind::GtGt,
    SyntaxKind::Tilde,
];

struct Parser<'a> {
    stream: &'a TokenStream,
    /// Significant tokens; the last one is always `Eof`.
    tokens: Vec<TokenId>,
    pos: usize,
    /// Set after a `>>` closed one type argument list and still owes a `>`.
    pending_gt: bool,
    builder: UnitBuilder,
    errors: Vec<Diagnostic>,
}

impl Parser<'_> {
    // ── token cursor ────────────────────────────────────────────────────

    fn token_at(
        &self,
        index: usize,
    ) -> TokenId {
        let last = self.tokens.len().saturating_sub(1);
        self.tokens[index.min(last)]
    }

    fn kind(&self) -> SyntaxKind {
        self.peek(0)
    }

    fn peek(
        &self,
        n: usize,
    ) -> SyntaxKind {
        self.stream.kind(self.token_at(self.pos + n))
    }

    fn kind_at(
        &self,
        index: usize,
    ) -> SyntaxKind {
        self.stream.kind(self.token_at(index))
    }

    fn at(
        &self,
        kind: SyntaxKind,
    ) -> bool {
        self.kind() == kind
    }

    fn lexeme(&self) -> &str {
        self.stream.lexeme(self.token_at(self.pos))
    }

    fn start(&self) -> usize {
        self.stream.get(self.token_at(self.pos)).map_or(0, |token| token.offset())
    }

    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            return 0;
        }
        self.stream.get(self.token_at(self.pos - 1)).map_or(0, |token| token.end())
    }

    fn bump(&mut self) {
        if self.kind() != SyntaxKind::Eof {
            self.pos += 1;
        }
    }

    fn eat(
        &mut self,
        kind: SyntaxKind,
    ) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(
        &mut self,
        kind: SyntaxKind,
        text: &str,
    ) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error(ErrorCode::ExpectedToken, vec![text.to_string()]);
        false
    }

    fn eat_gt(&mut self) -> bool {
        if self.pending_gt {
            self.pending_gt = false;
            return true;
        }
        if self.eat(SyntaxKind::Gt) {
            return true;
        }
        if self.eat(SyntaxKind::GtGt) {
            self.pending_gt = true;
            return true;
        }
        false
    }

    fn error(
        &mut self,
        code: ErrorCode,
        arguments: Vec<String>,
    ) {
        let (offset, len) = self.stream.get(self.token_at(self.pos)).map_or((0, 0), |token| (token.offset(), token.len()));
        self.errors.push(Diagnostic::new(code, offset, len, arguments));
    }

    fn unexpected(&mut self) {
        let lexeme = self.lexeme().to_string();
        self.error(ErrorCode::UnexpectedToken, vec![lexeme]);
        self.bump();
    }

    fn node(
        &mut self,
        kind: NodeKind,
        start: usize,
    ) -> NodeId {
        let end = self.prev_end().max(start);
        self.builder.add(kind, start, end)
    }

    fn identifier(&mut self) -> NodeId {
        let start = self.start();
        if self.kind().is_identifier_like() {
            let name = self.lexeme().to_string();
            self.bump();
            return self.node(
                NodeKind::SimpleIdentifier {
                    name,
                },
                start,
            );
        }
        self.error(ErrorCode::MissingIdentifier, Vec::new());
        self.builder.add(
            NodeKind::SimpleIdentifier {
                name: String::new(),
            },
            start,
            start,
        )
    }

    fn label(&mut self) -> NodeId {
        let start = self.start();
        let name = self.identifier();
        self.expect(SyntaxKind::Colon, ":");
        self.node(
            NodeKind::Label {
                name,
            },
            start,
        )
    }

    fn at_label(&self) -> bool {
        self.kind().is_identifier_like() && self.peek(1) == SyntaxKind::Colon
    }

    // ── lookahead ───────────────────────────────────────────────────────

    /// Index just past a type starting at `index`, if one can start there.
    fn type_end(
        &self,
        index: usize,
    ) -> Option<usize> {
        if self.kind_at(index) == SyntaxKind::KwVoid {
            return Some(index + 1);
        }
        if !self.kind_at(index).is_identifier_like() || self.kind_at(index) == SyntaxKind::KwAwait {
            return None;
        }
        let mut p = index + 1;
        if self.kind_at(p) == SyntaxKind::Dot && self.kind_at(p + 1).is_identifier_like() {
            p += 2;
        }
        if self.kind_at(p) == SyntaxKind::Lt {
            let mut depth = 0usize;
            loop {
                match self.kind_at(p) {
                    SyntaxKind::Lt => depth += 1,
                    SyntaxKind::Gt => depth = depth.saturating_sub(1),
                    SyntaxKind::GtGt => depth = depth.saturating_sub(2),
                    SyntaxKind::Comma | SyntaxKind::Dot | SyntaxKind::Question | SyntaxKind::KwVoid => {},
                    kind if kind.is_identifier_like() => {},
                    _ => return None,
                }
                p += 1;
                if depth == 0 {
                    break;
                }
            }
        }
        if self.kind_at(p) == SyntaxKind::Question {
            p += 1;
        }
        Some(p)
    }

    fn looks_like_type_then_name(&self) -> bool {
        self.type_end(self.pos).is_some_and(|end| self.kind_at(end).is_identifier_like())
    }

    /// Index just past the parenthesis group opening at `index`.
    fn after_parens(
        &self,
        index: usize,
    ) -> Option<usize> {
        if self.kind_at(index) != SyntaxKind::LParen {
            return None;
        }
        let mut depth = 0usize;
        let mut p = index;
        loop {
            match self.kind_at(p) {
                SyntaxKind::LParen => depth += 1,
                SyntaxKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(p + 1);
                    }
                },
                SyntaxKind::Eof => return None,
                _ => {},
            }
            p += 1;
        }
    }

    fn starts_body(
        &self,
        index: usize,
    ) -> bool {
        matches!(self.kind_at(index), SyntaxKind::LBrace | SyntaxKind::FatArrow | SyntaxKind::KwAsync)
    }

    fn looks_like_local_function(&self) -> bool {
        if let Some(end) = self.type_end(self.pos) {
            if self.kind_at(end).is_identifier_like() && self.kind_at(end + 1) == SyntaxKind::LParen {
                return self.after_parens(end + 1).is_some_and(|p| self.starts_body(p));
            }
        }
        self.kind().is_identifier_like()
            && self.after_parens(self.pos + 1).is_some_and(|p| self.kind_at(p) == SyntaxKind::LBrace)
    }

    fn skip_balanced(
        &mut self,
        open: SyntaxKind,
        close: SyntaxKind,
    ) {
        let mut depth = 0usize;
        loop {
            let kind = self.kind();
            if kind == SyntaxKind::Eof {
                return;
            }
            self.bump();
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return;
                }
            }
        }
    }

    fn skip_annotations(&mut self) {
        while self.eat(SyntaxKind::At) {
            while self.kind().is_identifier_like() {
                self.bump();
                if !self.eat(SyntaxKind::Dot) {
                    break;
                }
            }
            if self.at(SyntaxKind::LParen) {
                self.skip_balanced(SyntaxKind::LParen, SyntaxKind::RParen);
            }
        }
    }

    // ── compilation unit ────────────────────────────────────────────────

    fn compilation_unit(mut self) -> ParsedUnit {
        let mut directives = Vec::new();
        let mut declarations = Vec::new();
        loop {
            self.skip_annotations();
            let before = self.pos;
            match self.kind() {
                SyntaxKind::Eof => break,
                SyntaxKind::KwLibrary if self.peek(1).is_identifier_like() => directives.push(self.library_directive()),
                SyntaxKind::KwImport | SyntaxKind::KwExport if self.peek(1) == SyntaxKind::String => {
                    directives.push(self.namespace_directive())
                },
                SyntaxKind::KwPart if matches!(self.peek(1), SyntaxKind::String | SyntaxKind::KwOf) => {
                    directives.push(self.part_directive())
                },
                _ => {
                    if let Some(declaration) = self.top_level_declaration() {
                        declarations.push(declaration);
                    }
                },
            }
            if self.pos == before {
                self.unexpected();
            }
        }
        let end = self.stream.source().len();
        let root = self.builder.add(
            NodeKind::CompilationUnit {
                directives,
                declarations,
            },
            0,
            end,
        );
        trace!("[parser] {} nodes, {} errors", root.index() + 1, self.errors.len());
        ParsedUnit {
            unit: self.builder.finish(root),
            errors: self.errors,
        }
    }

    fn dotted_name(&mut self) -> NodeId {
        let start = self.start();
        let mut name = String::new();
        while self.kind().is_identifier_like() {
            name.push_str(self.lexeme());
            self.bump();
            if !(self.at(SyntaxKind::Dot) && self.peek(1).is_identifier_like()) {
                break;
            }
            name.push('.');
            self.bump();
        }
        self.node(
            NodeKind::SimpleIdentifier {
                name,
            },
            start,
        )
    }

    fn library_directive(&mut self) -> NodeId {
        let start = self.start();
        self.bump();
        let name = self.dotted_name();
        self.expect(SyntaxKind::Semicolon, ";");
        self.node(
            NodeKind::LibraryDirective {
                name,
            },
            start,
        )
    }

    fn string_value(&mut self) -> String {
        let value = unquote(self.lexeme());
        self.bump();
        value
    }

    fn namespace_directive(&mut self) -> NodeId {
        let start = self.start();
        let is_import = self.at(SyntaxKind::KwImport);
        self.bump();
        let uri = self.string_value();
        let mut prefix = None;
        let mut combinators = Vec::new();
        loop {
            if is_import && self.at(SyntaxKind::KwDeferred) {
                self.bump();
            } else if is_import && self.eat(SyntaxKind::KwAs) {
                prefix = Some(self.identifier());
            } else if matches!(self.kind(), SyntaxKind::KwShow | SyntaxKind::KwHide) {
                combinators.push(self.combinator());
            } else {
                break;
            }
        }
        self.expect(SyntaxKind::Semicolon, ";");
        let kind = if is_import {
            NodeKind::ImportDirective {
                uri,
                prefix,
                combinators,
            }
        } else {
            NodeKind::ExportDirective {
                uri,
                combinators,
            }
        };
        self.node(kind, start)
    }

    fn combinator(&mut self) -> NodeId {
        let start = self.start();
        let hide = self.at(SyntaxKind::KwHide);
        self.bump();
        let mut names = vec![self.identifier()];
        while self.eat(SyntaxKind::Comma) {
            names.push(self.identifier());
        }
        self.node(
            NodeKind::Combinator {
                hide,
                names,
            },
            start,
        )
    }

    fn part_directive(&mut self) -> NodeId {
        let start = self.start();
        self.bump();
        let kind = if self.eat(SyntaxKind::KwOf) {
            if self.at(SyntaxKind::String) {
                NodeKind::PartOfDirective {
                    name: None,
                    uri: Some(self.string_value()),
                }
            } else {
                NodeKind::PartOfDirective {
                    name: Some(self.dotted_name()),
                    uri: None,
                }
            }
        } else {
            NodeKind::PartDirective {
                uri: self.string_value(),
            }
        };
        self.expect(SyntaxKind::Semicolon, ";");
        self.node(kind, start)
    }

    // ── declarations ────────────────────────────────────────────────────

    fn top_level_declaration(&mut self) -> Option<NodeId> {
        let start = self.start();
        let is_abstract = self.eat(SyntaxKind::KwAbstract);
        if self.at(SyntaxKind::KwClass) {
            return Some(self.class_declaration(start, is_abstract));
        }
        if matches!(self.kind(), SyntaxKind::KwEnum) {
            // Enums are not modelled; skip the body.
            self.bump();
            self.identifier();
            self.skip_balanced(SyntaxKind::LBrace, SyntaxKind::RBrace);
            return None;
        }
        self.eat(SyntaxKind::KwExternal);
        if matches!(self.kind(), SyntaxKind::KwVar | SyntaxKind::KwFinal | SyntaxKind::KwConst) {
            let variables = self.keyword_variable_list();
            self.expect(SyntaxKind::Semicolon, ";");
            return Some(self.node(
                NodeKind::TopLevelVariableDeclaration {
                    variables,
                },
                start,
            ));
        }
        if !self.kind().is_identifier_like() && !self.at(SyntaxKind::KwVoid) {
            return None;
        }
        if let Some(kind) = self.accessor_kind() {
            return Some(self.function_declaration(start, kind, None));
        }
        let return_type = self.looks_like_type_then_name().then(|| self.type_name());
        if let Some(kind) = self.accessor_kind() {
            return Some(self.function_declaration(start, kind, return_type));
        }
        if self.peek(1) == SyntaxKind::LParen {
            return Some(self.function_declaration(start, MethodKind::Method, return_type));
        }
        let variables = self.variable_list(start, None, return_type);
        self.expect(SyntaxKind::Semicolon, ";");
        Some(self.node(
            NodeKind::TopLevelVariableDeclaration {
                variables,
            },
            start,
        ))
    }

    /// `get name`, `set name(` or `operator <op>` at the cursor.
    fn accessor_kind(&self) -> Option<MethodKind> {
        match self.kind() {
            SyntaxKind::KwGet if self.peek(1).is_identifier_like() => Some(MethodKind::Getter),
            SyntaxKind::KwSet if self.peek(1).is_identifier_like() && self.peek(2) == SyntaxKind::LParen => {
                Some(MethodKind::Setter)
            },
            SyntaxKind::KwOperator
                if USER_OPERATORS.contains(&self.peek(1)) || self.peek(1) == SyntaxKind::LBracket =>
            {
                Some(MethodKind::Operator)
            },
            _ => None,
        }
    }

    fn function_declaration(
        &mut self,
        start: usize,
        kind: MethodKind,
        return_type: Option<NodeId>,
    ) -> NodeId {
        if kind != MethodKind::Method {
            self.bump();
        }
        let name = self.identifier();
        let parameters = (kind != MethodKind::Getter).then(|| self.formal_parameter_list());
        let body = self.function_body();
        self.node(
            NodeKind::FunctionDeclaration {
                kind,
                return_type,
                name,
                parameters,
                body,
            },
            start,
        )
    }

    fn class_declaration(
        &mut self,
        start: usize,
        is_abstract: bool,
    ) -> NodeId {
        self.bump();
        let name = self.identifier();
        let class_name = self.builder.kind(name).and_then(|kind| match kind {
            NodeKind::SimpleIdentifier {
                name,
            } => Some(name.clone()),
            _ => None,
        });
        let type_parameters = self.type_parameters();
        let superclass = self.eat(SyntaxKind::KwExtends).then(|| self.type_name());
        let mixins = if self.eat(SyntaxKind::KwWith) { self.type_list() } else { Vec::new() };
        let interfaces = if self.eat(SyntaxKind::KwImplements) { self.type_list() } else { Vec::new() };
        let mut members = Vec::new();
        if self.expect(SyntaxKind::LBrace, "{") {
            while !matches!(self.kind(), SyntaxKind::RBrace | SyntaxKind::Eof) {
                self.skip_annotations();
                let before = self.pos;
                if let Some(member) = self.class_member(class_name.as_deref().unwrap_or_default()) {
                    members.push(member);
                }
                if self.pos == before {
                    self.unexpected();
                }
            }
            self.expect(SyntaxKind::RBrace, "}");
        }
        self.node(
            NodeKind::ClassDeclaration {
                is_abstract,
                name,
                type_parameters,
                superclass,
                mixins,
                interfaces,
                members,
            },
            start,
        )
    }

    fn type_parameters(&mut self) -> Vec<NodeId> {
        let mut parameters = Vec::new();
        if !self.eat(SyntaxKind::Lt) {
            return parameters;
        }
        loop {
            let start = self.start();
            let name = self.identifier();
            let bound = self.eat(SyntaxKind::KwExtends).then(|| self.type_name());
            parameters.push(self.node(
                NodeKind::TypeParameter {
                    name,
                    bound,
                },
                start,
            ));
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        if !self.eat_gt() {
            self.error(ErrorCode::ExpectedToken, vec![">".to_string()]);
        }
        parameters
    }

    fn type_list(&mut self) -> Vec<NodeId> {
        let mut types = vec![self.type_name()];
        while self.eat(SyntaxKind::Comma) {
            types.push(self.type_name());
        }
        types
    }

    fn type_name(&mut self) -> NodeId {
        let start = self.start();
        if self.eat(SyntaxKind::KwVoid) {
            let name = self.node(
                NodeKind::SimpleIdentifier {
                    name: "void".to_string(),
                },
                start,
            );
            return self.node(
                NodeKind::TypeName {
                    name,
                    arguments: Vec::new(),
                },
                start,
            );
        }
        let mut name = self.identifier();
        if self.at(SyntaxKind::Dot) && self.peek(1).is_identifier_like() {
            self.bump();
            let identifier = self.identifier();
            name = self.node(
                NodeKind::PrefixedIdentifier {
                    prefix: name,
                    identifier,
                },
                start,
            );
        }
        let mut arguments = Vec::new();
        if self.eat(SyntaxKind::Lt) {
            arguments = self.type_list();
            if !self.eat_gt() {
                self.error(ErrorCode::ExpectedToken, vec![">".to_string()]);
            }
        }
        self.eat(SyntaxKind::Question);
        self.node(
            NodeKind::TypeName {
                name,
                arguments,
            },
            start,
        )
    }

    fn class_member(
        &mut self,
        class_name: &str,
    ) -> Option<NodeId> {
        let start = self.start();
        let is_static = self.peek(1) != SyntaxKind::LParen && self.eat(SyntaxKind::KwStatic);
        self.eat(SyntaxKind::KwExternal);
        if self.at(SyntaxKind::KwFactory) {
            self.bump();
            return Some(self.constructor(start, true));
        }
        if matches!(self.kind(), SyntaxKind::KwVar | SyntaxKind::KwFinal | SyntaxKind::KwConst) {
            let variables = self.keyword_variable_list();
            self.expect(SyntaxKind::Semicolon, ";");
            return Some(self.node(
                NodeKind::FieldDeclaration {
                    is_static,
                    variables,
                },
                start,
            ));
        }
        if self.kind().is_identifier_like() && self.lexeme() == class_name {
            let named = self.peek(1) == SyntaxKind::Dot
                && self.peek(2).is_identifier_like()
                && self.peek(3) == SyntaxKind::LParen;
            if self.peek(1) == SyntaxKind::LParen || named {
                return Some(self.constructor(start, false));
            }
        }
        if !self.kind().is_identifier_like() && !self.at(SyntaxKind::KwVoid) {
            return None;
        }
        let mut return_type = None;
        if self.accessor_kind().is_none() && self.looks_like_type_then_name() {
            return_type = Some(self.type_name());
        }
        if let Some(kind) = self.accessor_kind() {
            return Some(self.method(start, is_static, kind, return_type));
        }
        if self.peek(1) == SyntaxKind::LParen {
            return Some(self.method(start, is_static, MethodKind::Method, return_type));
        }
        let variables = self.variable_list(start, None, return_type);
        self.expect(SyntaxKind::Semicolon, ";");
        Some(self.node(
            NodeKind::FieldDeclaration {
                is_static,
                variables,
            },
            start,
        ))
    }

    fn method(
        &mut self,
        start: usize,
        is_static: bool,
        kind: MethodKind,
        return_type: Option<NodeId>,
    ) -> NodeId {
        let name = match kind {
            MethodKind::Method => self.identifier(),
            MethodKind::Getter | MethodKind::Setter => {
                self.bump();
                self.identifier()
            },
            MethodKind::Operator => {
                self.bump();
                self.operator_name()
            },
        };
        let parameters = (kind != MethodKind::Getter).then(|| self.formal_parameter_list());
        let body = self.function_body();
        self.node(
            NodeKind::MethodDeclaration {
                is_static,
                kind,
                return_type,
                name,
                parameters,
                body,
            },
            start,
        )
    }

    fn operator_name(&mut self) -> NodeId {
        let start = self.start();
        let name = if self.eat(SyntaxKind::LBracket) {
            self.expect(SyntaxKind::RBracket, "]");
            if self.eat(SyntaxKind::Eq) { "[]=".to_string() } else { "[]".to_string() }
        } else {
            let name = self.lexeme().to_string();
            self.bump();
            name
        };
        self.node(
            NodeKind::SimpleIdentifier {
                name,
            },
            start,
        )
    }

    fn constructor(
        &mut self,
        start: usize,
        is_factory: bool,
    ) -> NodeId {
        let class_name = self.identifier();
        let name = self.eat(SyntaxKind::Dot).then(|| self.identifier());
        let parameters = self.formal_parameter_list();
        let mut initializers = Vec::new();
        if self.eat(SyntaxKind::Colon) {
            loop {
                initializers.push(self.constructor_initializer());
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
        }
        let mut redirected = None;
        if is_factory && self.eat(SyntaxKind::Eq) {
            redirected = Some(self.type_name());
            self.expect(SyntaxKind::Semicolon, ";");
        }
        let body = if redirected.is_some() {
            let at = self.prev_end();
            self.builder.add(NodeKind::EmptyFunctionBody, at, at)
        } else {
            self.function_body()
        };
        self.node(
            NodeKind::ConstructorDeclaration {
                is_factory,
                class_name,
                name,
                parameters,
                initializers,
                redirected,
                body,
            },
            start,
        )
    }

    fn constructor_initializer(&mut self) -> NodeId {
        let start = self.start();
        if self.eat(SyntaxKind::KwSuper) {
            let name = self.eat(SyntaxKind::Dot).then(|| self.identifier());
            let arguments = self.argument_list();
            return self.node(
                NodeKind::SuperConstructorInvocation {
                    name,
                    arguments,
                },
                start,
            );
        }
        if self.eat(SyntaxKind::KwThis) {
            if self.at(SyntaxKind::LParen) {
                let arguments = self.argument_list();
                return self.node(
                    NodeKind::RedirectingConstructorInvocation {
                        name: None,
                        arguments,
                    },
                    start,
                );
            }
            self.expect(SyntaxKind::Dot, ".");
            let name = self.identifier();
            if self.at(SyntaxKind::LParen) {
                let arguments = self.argument_list();
                return self.node(
                    NodeKind::RedirectingConstructorInvocation {
                        name: Some(name),
                        arguments,
                    },
                    start,
                );
            }
            self.expect(SyntaxKind::Eq, "=");
            let value = self.conditional_expression();
            return self.node(
                NodeKind::ConstructorFieldInitializer {
                    field: name,
                    value,
                },
                start,
            );
        }
        let field = self.identifier();
        self.expect(SyntaxKind::Eq, "=");
        let value = self.conditional_expression();
        self.node(
            NodeKind::ConstructorFieldInitializer {
                field,
                value,
            },
            start,
        )
    }

    fn formal_parameter_list(&mut self) -> NodeId {
        let start = self.start();
        let mut parameters = Vec::new();
        if !self.expect(SyntaxKind::LParen, "(") {
            return self.node(
                NodeKind::FormalParameterList {
                    parameters,
                },
                start,
            );
        }
        let mut kind = ParameterKind::Required;
        while !matches!(self.kind(), SyntaxKind::RParen | SyntaxKind::Eof) {
            match self.kind() {
                SyntaxKind::LBracket => {
                    self.bump();
                    kind = ParameterKind::Positional;
                    continue;
                },
                SyntaxKind::LBrace => {
                    self.bump();
                    kind = ParameterKind::Named;
                    continue;
                },
                SyntaxKind::RBracket | SyntaxKind::RBrace => {
                    self.bump();
                    continue;
                },
                _ => {},
            }
            let before = self.pos;
            parameters.push(self.formal_parameter(kind));
            if self.pos == before {
                self.unexpected();
            }
            if !self.eat(SyntaxKind::Comma) && !matches!(self.kind(), SyntaxKind::RBracket | SyntaxKind::RBrace) {
                break;
            }
        }
        self.expect(SyntaxKind::RParen, ")");
        self.node(
            NodeKind::FormalParameterList {
                parameters,
            },
            start,
        )
    }

    fn formal_parameter(
        &mut self,
        kind: ParameterKind,
    ) -> NodeId {
        let start = self.start();
        if self.lexeme() == "required" && self.peek(1).is_identifier_like() {
            self.bump();
        }
        while matches!(self.kind(), SyntaxKind::KwFinal | SyntaxKind::KwVar | SyntaxKind::KwConst) {
            self.bump();
        }
        let mut ty = None;
        if self.at(SyntaxKind::KwVoid) || (!self.at(SyntaxKind::KwThis) && self.looks_like_type_then_name()) {
            ty = Some(self.type_name());
        }
        let field_formal = self.at(SyntaxKind::KwThis) && self.peek(1) == SyntaxKind::Dot;
        if field_formal {
            self.bump();
            self.bump();
        }
        let name = self.identifier();
        if self.at(SyntaxKind::LParen) {
            // Function-typed parameter; its signature is not modelled.
            self.skip_balanced(SyntaxKind::LParen, SyntaxKind::RParen);
        }
        let default_value =
            (self.eat(SyntaxKind::Eq) || self.eat(SyntaxKind::Colon)).then(|| self.conditional_expression());
        self.node(
            NodeKind::FormalParameter {
                kind,
                field_formal,
                ty,
                name,
                default_value,
            },
            start,
        )
    }

    fn function_body(&mut self) -> NodeId {
        let start = self.start();
        if self.at(SyntaxKind::KwAsync) {
            self.bump();
            self.eat(SyntaxKind::Star);
        }
        if self.eat(SyntaxKind::FatArrow) {
            let expression = self.expression();
            self.expect(SyntaxKind::Semicolon, ";");
            return self.node(
                NodeKind::ExpressionFunctionBody {
                    expression,
                },
                start,
            );
        }
        if self.at(SyntaxKind::LBrace) {
            let block = self.block();
            return self.node(
                NodeKind::BlockFunctionBody {
                    block,
                },
                start,
            );
        }
        if !self.eat(SyntaxKind::Semicolon) {
            self.error(ErrorCode::ExpectedToken, vec!["{".to_string()]);
        }
        self.node(NodeKind::EmptyFunctionBody, start)
    }

    /// `var`/`final`/`const` followed by an optional type and declarators.
    fn keyword_variable_list(&mut self) -> NodeId {
        let start = self.start();
        let keyword = self.kind();
        self.bump();
        let ty = self.looks_like_type_then_name().then(|| self.type_name());
        self.variable_list(start, Some(keyword), ty)
    }

    fn variable_list(
        &mut self,
        start: usize,
        keyword: Option<SyntaxKind>,
        ty: Option<NodeId>,
    ) -> NodeId {
        let mut variables = Vec::new();
        loop {
            let declaration_start = self.start();
            let name = self.identifier();
            let initializer = self.eat(SyntaxKind::Eq).then(|| self.expression());
            variables.push(self.node(
                NodeKind::VariableDeclaration {
                    name,
                    initializer,
                },
                declaration_start,
            ));
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.node(
            NodeKind::VariableDeclarationList {
                keyword,
                ty,
                variables,
            },
            start,
        )
    }

    // ── statements ──────────────────────────────────────────────────────

    fn block(&mut self) -> NodeId {
        let start = self.start();
        self.expect(SyntaxKind::LBrace, "{");
        let mut statements = Vec::new();
        while !matches!(self.kind(), SyntaxKind::RBrace | SyntaxKind::Eof) {
            let before = self.pos;
            statements.push(self.statement());
            if self.pos == before {
                self.unexpected();
            }
        }
        self.expect(SyntaxKind::RBrace, "}");
        self.node(
            NodeKind::Block {
                statements,
            },
            start,
        )
    }

    fn statement(&mut self) -> NodeId {
        let start = self.start();
        if self.at_label() {
            let mut labels = Vec::new();
            while self.at_label() {
                labels.push(self.label());
            }
            let statement = self.statement();
            return self.node(
                NodeKind::LabeledStatement {
                    labels,
                    statement,
                },
                start,
            );
        }
        match self.kind() {
            SyntaxKind::LBrace => self.block(),
            SyntaxKind::Semicolon => {
                self.bump();
                self.node(NodeKind::EmptyStatement, start)
            },
            SyntaxKind::KwReturn => {
                self.bump();
                let expression = (!self.at(SyntaxKind::Semicolon)).then(|| self.expression());
                self.expect(SyntaxKind::Semicolon, ";");
                self.node(
                    NodeKind::ReturnStatement {
                        expression,
                    },
                    start,
                )
            },
            SyntaxKind::KwIf => {
                self.bump();
                let condition = self.parenthesized_condition();
                let then_statement = self.statement();
                let else_statement = self.eat(SyntaxKind::KwElse).then(|| self.statement());
                self.node(
                    NodeKind::IfStatement {
                        condition,
                        then_statement,
                        else_statement,
                    },
                    start,
                )
            },
            SyntaxKind::KwWhile => {
                self.bump();
                let condition = self.parenthesized_condition();
                let body = self.statement();
                self.node(
                    NodeKind::WhileStatement {
                        condition,
                        body,
                    },
                    start,
                )
            },
            SyntaxKind::KwDo => {
                self.bump();
                let body = self.statement();
                self.expect(SyntaxKind::KwWhile, "while");
                let condition = self.parenthesized_condition();
                self.expect(SyntaxKind::Semicolon, ";");
                self.node(
                    NodeKind::DoStatement {
                        body,
                        condition,
                    },
                    start,
                )
            },
            SyntaxKind::KwFor => self.for_statement(),
            SyntaxKind::KwTry => self.try_statement(),
            SyntaxKind::KwAssert => {
                self.bump();
                self.expect(SyntaxKind::LParen, "(");
                let condition = self.expression();
                let message = self.eat(SyntaxKind::Comma).then(|| self.expression());
                self.expect(SyntaxKind::RParen, ")");
                self.expect(SyntaxKind::Semicolon, ";");
                self.node(
                    NodeKind::AssertStatement {
                        condition,
                        message,
                    },
                    start,
                )
            },
            SyntaxKind::KwSwitch => self.switch_statement(),
            SyntaxKind::KwBreak | SyntaxKind::KwContinue => {
                let is_break = self.at(SyntaxKind::KwBreak);
                self.bump();
                let label = self.kind().is_identifier_like().then(|| self.identifier());
                self.expect(SyntaxKind::Semicolon, ";");
                let kind = if is_break {
                    NodeKind::BreakStatement {
                        label,
                    }
                } else {
                    NodeKind::ContinueStatement {
                        label,
                    }
                };
                self.node(kind, start)
            },
            SyntaxKind::KwVar | SyntaxKind::KwFinal | SyntaxKind::KwConst
                if self.peek(1).is_identifier_like() =>
            {
                let variables = self.keyword_variable_list();
                self.expect(SyntaxKind::Semicolon, ";");
                self.node(
                    NodeKind::VariableDeclarationStatement {
                        variables,
                    },
                    start,
                )
            },
            _ if self.looks_like_local_function() => {
                let return_type =
                    (self.peek(1) != SyntaxKind::LParen && self.looks_like_type_then_name()).then(|| self.type_name());
                let function = self.function_declaration(start, MethodKind::Method, return_type);
                self.node(
                    NodeKind::FunctionDeclarationStatement {
                        function,
                    },
                    start,
                )
            },
            _ if self.looks_like_type_then_name() => {
                let ty = self.type_name();
                let variables = self.variable_list(start, None, Some(ty));
                self.expect(SyntaxKind::Semicolon, ";");
                self.node(
                    NodeKind::VariableDeclarationStatement {
                        variables,
                    },
                    start,
                )
            },
            _ => {
                let expression = self.expression();
                self.expect(SyntaxKind::Semicolon, ";");
                self.node(
                    NodeKind::ExpressionStatement {
                        expression,
                    },
                    start,
                )
            },
        }
    }

    fn parenthesized_condition(&mut self) -> NodeId {
        self.expect(SyntaxKind::LParen, "(");
        let condition = self.expression();
        self.expect(SyntaxKind::RParen, ")");
        condition
    }

    fn for_statement(&mut self) -> NodeId {
        let start = self.start();
        self.bump();
        self.expect(SyntaxKind::LParen, "(");

        let mut p = self.pos;
        let keyword = matches!(self.kind_at(p), SyntaxKind::KwVar | SyntaxKind::KwFinal).then(|| self.kind_at(p));
        if keyword.is_some() {
            p += 1;
        }
        if let Some(end) = self.type_end(p).filter(|end| self.kind_at(*end).is_identifier_like()) {
            p = end;
        }
        if self.kind_at(p).is_identifier_like() && self.kind_at(p + 1) == SyntaxKind::KwIn {
            let variable_start = self.start();
            if keyword.is_some() {
                self.bump();
            }
            let ty = (self.pos < p).then(|| self.type_name());
            let name = self.identifier();
            let loop_variable = self.node(
                NodeKind::DeclaredIdentifier {
                    keyword,
                    ty,
                    name,
                },
                variable_start,
            );
            self.expect(SyntaxKind::KwIn, "in");
            let iterable = self.expression();
            self.expect(SyntaxKind::RParen, ")");
            let body = self.statement();
            return self.node(
                NodeKind::ForEachStatement {
                    loop_variable,
                    iterable,
                    body,
                },
                start,
            );
        }

        let mut variables = None;
        let mut initialization = None;
        if matches!(self.kind(), SyntaxKind::KwVar | SyntaxKind::KwFinal) {
            variables = Some(self.keyword_variable_list());
        } else if self.looks_like_type_then_name() {
            let list_start = self.start();
            let ty = self.type_name();
            variables = Some(self.variable_list(list_start, None, Some(ty)));
        } else if !self.at(SyntaxKind::Semicolon) {
            initialization = Some(self.expression());
        }
        self.expect(SyntaxKind::Semicolon, ";");
        let condition = (!self.at(SyntaxKind::Semicolon)).then(|| self.expression());
        self.expect(SyntaxKind::Semicolon, ";");
        let mut updaters = Vec::new();
        while !matches!(self.kind(), SyntaxKind::RParen | SyntaxKind::Eof) {
            updaters.push(self.expression());
            if !self.eat(SyntaxKind::Comma) {
                break;
            }
        }
        self.expect(SyntaxKind::RParen, ")");
        let body = self.statement();
        self.node(
            NodeKind::ForStatement {
                variables,
                initialization,
                condition,
                updaters,
                body,
            },
            start,
        )
    }

    fn try_statement(&mut self) -> NodeId {
        let start = self.start();
        self.bump();
        let body = self.block();
        let mut catch_clauses = Vec::new();
        while matches!(self.kind(), SyntaxKind::KwOn | SyntaxKind::KwCatch) {
            let clause_start = self.start();
            let exception_type = self.eat(SyntaxKind::KwOn).then(|| self.type_name());
            let mut exception = None;
            let mut stack_trace = None;
            if self.eat(SyntaxKind::KwCatch) {
                self.expect(SyntaxKind::LParen, "(");
                exception = Some(self.identifier());
                if self.eat(SyntaxKind::Comma) {
                    stack_trace = Some(self.identifier());
                }
                self.expect(SyntaxKind::RParen, ")");
            }
            let body = self.block();
            catch_clauses.push(self.node(
                NodeKind::CatchClause {
                    exception_type,
                    exception,
                    stack_trace,
                    body,
                },
                clause_start,
            ));
        }
        let finally_block = self.eat(SyntaxKind::KwFinally).then(|| self.block());
        self.node(
            NodeKind::TryStatement {
                body,
                catch_clauses,
                finally_block,
            },
            start,
        )
    }

    fn at_switch_member_start(&self) -> bool {
        let mut p = self.pos;
        while self.kind_at(p).is_identifier_like() && self.kind_at(p + 1) == SyntaxKind::Colon {
            p += 2;
        }
        matches!(self.kind_at(p), SyntaxKind::KwCase | SyntaxKind::KwDefault)
    }

    fn switch_statement(&mut self) -> NodeId {
        let start = self.start();
        self.bump();
        let expression = self.parenthesized_condition();
        let mut members = Vec::new();
        if self.expect(SyntaxKind::LBrace, "{") {
            while !matches!(self.kind(), SyntaxKind::RBrace | SyntaxKind::Eof) {
                if !self.at_switch_member_start() {
                    self.unexpected();
                    continue;
                }
                let member_start = self.start();
                let mut labels = Vec::new();
                while self.at_label() {
                    labels.push(self.label());
                }
                let expression = if self.eat(SyntaxKind::KwCase) {
                    let expression = self.expression();
                    self.expect(SyntaxKind::Colon, ":");
                    Some(expression)
                } else {
                    self.bump();
                    self.expect(SyntaxKind::Colon, ":");
                    None
                };
                let mut statements = Vec::new();
                while !matches!(self.kind(), SyntaxKind::RBrace | SyntaxKind::Eof) && !self.at_switch_member_start() {
                    let before = self.pos;
                    statements.push(self.statement());
                    if self.pos == before {
                        self.unexpected();
                    }
                }
                members.push(self.node(
                    NodeKind::SwitchCase {
                        labels,
                        expression,
                        statements,
                    },
                    member_start,
                ));
            }
            self.expect(SyntaxKind::RBrace, "}");
        }
        self.node(
            NodeKind::SwitchStatement {
                expression,
                members,
            },
            start,
        )
    }

    // ── expressions ─────────────────────────────────────────────────────

    fn expression(&mut self) -> NodeId {
        let start = self.start();
        let target = self.conditional_expression();
        if self.kind().is_assignment_operator() {
            let operator = self.kind();
            self.bump();
            let value = self.expression();
            return self.node(
                NodeKind::AssignmentExpression {
                    operator,
                    target,
                    value,
                },
                start,
            );
        }
        if self.at(SyntaxKind::DotDot) {
            let mut sections = Vec::new();
            while self.at(SyntaxKind::DotDot) {
                sections.push(self.cascade_section());
            }
            return self.node(
                NodeKind::CascadeExpression {
                    target,
                    sections,
                },
                start,
            );
        }
        target
    }

    fn cascade_section(&mut self) -> NodeId {
        let start = self.start();
        self.bump();
        let head = if self.eat(SyntaxKind::LBracket) {
            let index = self.expression();
            self.expect(SyntaxKind::RBracket, "]");
            self.node(
                NodeKind::IndexExpression {
                    target: None,
                    index,
                },
                start,
            )
        } else {
            let name = self.identifier();
            if self.at(SyntaxKind::LParen) {
                let arguments = self.argument_list();
                self.node(
                    NodeKind::MethodInvocation {
                        target: None,
                        operator: Some(SyntaxKind::DotDot),
                        name,
                        arguments,
                    },
                    start,
                )
            } else {
                self.node(
                    NodeKind::PropertyAccess {
                        target: None,
                        operator: SyntaxKind::DotDot,
                        property: name,
                    },
                    start,
                )
            }
        };
        let section = self.selectors(start, head);
        if self.kind().is_assignment_operator() {
            let operator = self.kind();
            self.bump();
            let value = self.conditional_expression();
            return self.node(
                NodeKind::AssignmentExpression {
                    operator,
                    target: section,
                    value,
                },
                start,
            );
        }
        section
    }

    fn conditional_expression(&mut self) -> NodeId {
        let start = self.start();
        let condition = self.binary(0);
        if !self.eat(SyntaxKind::Question) {
            return condition;
        }
        let then_expression = self.expression();
        self.expect(SyntaxKind::Colon, ":");
        let else_expression = self.expression();
        self.node(
            NodeKind::ConditionalExpression {
                condition,
                then_expression,
                else_expression,
            },
            start,
        )
    }

    fn binary(
        &mut self,
        level: usize,
    ) -> NodeId {
        let Some(operators) = BINARY_LEVELS.get(level) else {
            return self.unary();
        };
        let start = self.start();
        let mut left = self.binary(level + 1);
        loop {
            if level == RELATIONAL_LEVEL && self.eat(SyntaxKind::KwIs) {
                let negated = self.eat(SyntaxKind::Bang);
                let ty = self.type_name();
                left = self.node(
                    NodeKind::IsExpression {
                        expression: left,
                        negated,
                        ty,
                    },
                    start,
                );
                continue;
            }
            if level == RELATIONAL_LEVEL && self.eat(SyntaxKind::KwAs) {
                let ty = self.type_name();
                left = self.node(
                    NodeKind::AsExpression {
                        expression: left,
                        ty,
                    },
                    start,
                );
                continue;
            }
            let operator = self.kind();
            if !operators.contains(&operator) {
                break;
            }
            self.bump();
            let right = self.binary(level + 1);
            left = self.node(
                NodeKind::BinaryExpression {
                    operator,
                    left,
                    right,
                },
                start,
            );
        }
        left
    }

    fn unary(&mut self) -> NodeId {
        let start = self.start();
        match self.kind() {
            SyntaxKind::Minus | SyntaxKind::Bang | SyntaxKind::Tilde | SyntaxKind::PlusPlus | SyntaxKind::MinusMinus => {
                let operator = self.kind();
                self.bump();
                let operand = self.unary();
                self.node(
                    NodeKind::PrefixExpression {
                        operator,
                        operand,
                    },
                    start,
                )
            },
            SyntaxKind::KwAwait => {
                self.bump();
                self.unary()
            },
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> NodeId {
        let start = self.start();
        let primary = self.primary();
        let operand = self.selectors(start, primary);
        if matches!(self.kind(), SyntaxKind::PlusPlus | SyntaxKind::MinusMinus) {
            let operator = self.kind();
            self.bump();
            return self.node(
                NodeKind::PostfixExpression {
                    operator,
                    operand,
                },
                start,
            );
        }
        operand
    }

    fn selectors(
        &mut self,
        start: usize,
        mut node: NodeId,
    ) -> NodeId {
        loop {
            match self.kind() {
                SyntaxKind::Dot | SyntaxKind::QuestionDot => {
                    let operator = self.kind();
                    self.bump();
                    let name = self.identifier();
                    let is_simple = matches!(self.builder.kind(node), Some(NodeKind::SimpleIdentifier { .. }));
                    let kind = if self.at(SyntaxKind::LParen) {
                        NodeKind::MethodInvocation {
                            target: Some(node),
                            operator: Some(operator),
                            name,
                            arguments: self.argument_list(),
                        }
                    } else if operator == SyntaxKind::Dot && is_simple {
                        NodeKind::PrefixedIdentifier {
                            prefix: node,
                            identifier: name,
                        }
                    } else {
                        NodeKind::PropertyAccess {
                            target: Some(node),
                            operator,
                            property: name,
                        }
                    };
                    node = self.node(kind, start);
                },
                SyntaxKind::LBracket => {
                    self.bump();
                    let index = self.expression();
                    self.expect(SyntaxKind::RBracket, "]");
                    node = self.node(
                        NodeKind::IndexExpression {
                            target: Some(node),
                            index,
                        },
                        start,
                    );
                },
                SyntaxKind::LParen => {
                    let arguments = self.argument_list();
                    let kind = if matches!(self.builder.kind(node), Some(NodeKind::SimpleIdentifier { .. })) {
                        NodeKind::MethodInvocation {
                            target: None,
                            operator: None,
                            name: node,
                            arguments,
                        }
                    } else {
                        NodeKind::FunctionExpressionInvocation {
                            function: node,
                            arguments,
                        }
                    };
                    node = self.node(kind, start);
                },
                _ => return node,
            }
        }
    }

    fn argument_list(&mut self) -> NodeId {
        let start = self.start();
        let mut arguments = Vec::new();
        if self.expect(SyntaxKind::LParen, "(") {
            while !matches!(self.kind(), SyntaxKind::RParen | SyntaxKind::Eof) {
                let argument_start = self.start();
                let argument = if self.at_label() {
                    let name = self.label();
                    let expression = self.expression();
                    self.node(
                        NodeKind::NamedExpression {
                            name,
                            expression,
                        },
                        argument_start,
                    )
                } else {
                    self.expression()
                };
                arguments.push(argument);
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            self.expect(SyntaxKind::RParen, ")");
        }
        self.node(
            NodeKind::ArgumentList {
                arguments,
            },
            start,
        )
    }

    fn literal(
        &mut self,
        kind: LiteralKind,
    ) -> NodeId {
        let start = self.start();
        self.bump();
        if kind == LiteralKind::String {
            while self.eat(SyntaxKind::String) {}
        }
        self.node(
            NodeKind::Literal {
                kind,
            },
            start,
        )
    }

    fn primary(&mut self) -> NodeId {
        let start = self.start();
        match self.kind() {
            SyntaxKind::KwThis => {
                self.bump();
                self.node(NodeKind::ThisExpression, start)
            },
            SyntaxKind::KwSuper => {
                self.bump();
                self.node(NodeKind::SuperExpression, start)
            },
            SyntaxKind::KwNull => self.literal(LiteralKind::Null),
            SyntaxKind::KwTrue | SyntaxKind::KwFalse => self.literal(LiteralKind::Boolean),
            SyntaxKind::Integer => self.literal(LiteralKind::Integer),
            SyntaxKind::Double => self.literal(LiteralKind::Double),
            SyntaxKind::String => self.literal(LiteralKind::String),
            SyntaxKind::KwConst if matches!(self.peek(1), SyntaxKind::LBracket | SyntaxKind::LBrace | SyntaxKind::Lt) => {
                self.bump();
                self.primary()
            },
            SyntaxKind::KwNew | SyntaxKind::KwConst => {
                let keyword = self.kind();
                self.bump();
                let ty = self.type_name();
                let name = self.eat(SyntaxKind::Dot).then(|| self.identifier());
                let arguments = self.argument_list();
                self.node(
                    NodeKind::InstanceCreationExpression {
                        keyword,
                        ty,
                        name,
                        arguments,
                    },
                    start,
                )
            },
            SyntaxKind::Lt => {
                self.bump();
                self.type_list();
                if !self.eat_gt() {
                    self.error(ErrorCode::ExpectedToken, vec![">".to_string()]);
                }
                self.collection_literal(start)
            },
            SyntaxKind::LBracket | SyntaxKind::LBrace => self.collection_literal(start),
            SyntaxKind::LParen => {
                if self.after_parens(self.pos).is_some_and(|p| self.starts_body(p)) {
                    let parameters = self.formal_parameter_list();
                    let body = self.closure_body();
                    return self.node(
                        NodeKind::FunctionExpression {
                            parameters,
                            body,
                        },
                        start,
                    );
                }
                self.bump();
                let expression = self.expression();
                self.expect(SyntaxKind::RParen, ")");
                self.node(
                    NodeKind::ParenthesizedExpression {
                        expression,
                    },
                    start,
                )
            },
            SyntaxKind::KwThrow => {
                self.bump();
                let expression = self.expression();
                self.node(
                    NodeKind::ThrowExpression {
                        expression,
                    },
                    start,
                )
            },
            kind if kind.is_identifier_like() => self.identifier(),
            _ => {
                let lexeme = self.lexeme().to_string();
                self.error(ErrorCode::UnexpectedToken, vec![lexeme]);
                if !matches!(
                    self.kind(),
                    SyntaxKind::RParen
                        | SyntaxKind::RBrace
                        | SyntaxKind::RBracket
                        | SyntaxKind::Semicolon
                        | SyntaxKind::Comma
                        | SyntaxKind::Eof
                ) {
                    self.bump();
                }
                self.builder.add(
                    NodeKind::SimpleIdentifier {
                        name: String::new(),
                    },
                    start,
                    start,
                )
            },
        }
    }

    /// Like [`Self::function_body`] but an expression body does not own the
    /// terminating `;`.
    fn closure_body(&mut self) -> NodeId {
        let start = self.start();
        if self.at(SyntaxKind::KwAsync) {
            self.bump();
            self.eat(SyntaxKind::Star);
        }
        if self.eat(SyntaxKind::FatArrow) {
            let expression = self.expression();
            return self.node(
                NodeKind::ExpressionFunctionBody {
                    expression,
                },
                start,
            );
        }
        let block = self.block();
        self.node(
            NodeKind::BlockFunctionBody {
                block,
            },
            start,
        )
    }

    fn collection_literal(
        &mut self,
        start: usize,
    ) -> NodeId {
        let (open, close, text) = if self.at(SyntaxKind::LBrace) {
            (SyntaxKind::LBrace, SyntaxKind::RBrace, "}")
        } else {
            (SyntaxKind::LBracket, SyntaxKind::RBracket, "]")
        };
        let mut elements = Vec::new();
        if self.expect(open, if open == SyntaxKind::LBrace { "{" } else { "[" }) {
            while !matches!(self.kind(), SyntaxKind::Eof) && !self.at(close) {
                elements.push(self.expression());
                if self.eat(SyntaxKind::Colon) {
                    elements.push(self.expression());
                }
                if !self.eat(SyntaxKind::Comma) {
                    break;
                }
            }
            self.expect(close, text);
        }
        self.node(
            NodeKind::CollectionLiteral {
                elements,
            },
            start,
        )
    }
}

#[cfg(test)]
#[path = "../../tests/src/ast/parser_tests.rs"]
mod tests;
