//! Directive scanning straight off the token stream.
//!
//! Computing the kind of a source and its dependency edges only needs the
//! leading `library`/`import`/`export`/`part` directives, so this runs
//! without building a syntax tree.

use serde::Serialize;

use crate::syntax::{SyntaxKind, TokenId, TokenStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SourceKind {
    Library,
    Part,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DirectiveKind {
    Import,
    Export,
    Part,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UriDirective {
    pub kind: DirectiveKind,
    pub uri: String,
    pub offset: usize,
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PartOf {
    Name(String),
    Uri(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectiveInfo {
    pub library_name: Option<String>,
    pub part_of: Option<PartOf>,
    pub directives: Vec<UriDirective>,
}

impl DirectiveInfo {
    pub fn scan(stream: &TokenStream) -> Self {
        let mut info = Self::default();
        let mut cursor = DirectiveCursor {
            stream,
            id: stream.first(),
        };
        cursor.skip_trivia();
        loop {
            match cursor.kind() {
                SyntaxKind::At => {
                    cursor.bump();
                    cursor.skip_dotted_name();
                    if cursor.kind() == SyntaxKind::LParen {
                        cursor.skip_balanced();
                    }
                },
                SyntaxKind::KwLibrary => {
                    cursor.bump();
                    info.library_name = Some(cursor.dotted_name());
                    cursor.skip_to_semicolon();
                },
                SyntaxKind::KwImport | SyntaxKind::KwExport => {
                    let kind = if cursor.kind() == SyntaxKind::KwImport {
                        DirectiveKind::Import
                    } else {
                        DirectiveKind::Export
                    };
                    cursor.bump();
                    let Some((uri, offset)) = cursor.string() else {
                        cursor.skip_to_semicolon();
                        continue;
                    };
                    let mut prefix = None;
                    while !matches!(cursor.kind(), SyntaxKind::Semicolon | SyntaxKind::Eof) {
                        if cursor.kind() == SyntaxKind::KwAs {
                            cursor.bump();
                            if cursor.kind().is_identifier_like() {
                                prefix = Some(cursor.lexeme().to_string());
                            }
                        }
                        cursor.bump();
                    }
                    cursor.bump();
                    info.directives.push(UriDirective {
                        kind,
                        uri,
                        offset,
                        prefix,
                    });
                },
                SyntaxKind::KwPart => {
                    cursor.bump();
                    if cursor.kind() == SyntaxKind::KwOf {
                        cursor.bump();
                        info.part_of = Some(match cursor.string() {
                            Some((uri, _)) => PartOf::Uri(uri),
                            None => PartOf::Name(cursor.dotted_name()),
                        });
                    } else if let Some((uri, offset)) = cursor.string() {
                        info.directives.push(UriDirective {
                            kind: DirectiveKind::Part,
                            uri,
                            offset,
                            prefix: None,
                        });
                    }
                    cursor.skip_to_semicolon();
                },
                _ => break,
            }
        }
        info
    }

    pub fn source_kind(&self) -> SourceKind {
        if self.part_of.is_some() {
            SourceKind::Part
        } else {
            SourceKind::Library
        }
    }

    pub fn of_kind(
        &self,
        kind: DirectiveKind,
    ) -> impl Iterator<Item = &UriDirective> {
        self.directives.iter().filter(move |directive| directive.kind == kind)
    }
}

/// Value of a string literal lexeme without quotes or raw prefix.
pub fn unquote(lexeme: &str) -> String {
    let body = lexeme.strip_prefix('r').unwrap_or(lexeme);
    for quote in ["'''", "\"\"\"", "'", "\""] {
        if let Some(inner) = body.strip_prefix(quote) {
            return inner.strip_suffix(quote).unwrap_or(inner).to_string();
        }
    }
    body.to_string()
}

struct DirectiveCursor<'a> {
    stream: &'a TokenStream,
    id: TokenId,
}

impl DirectiveCursor<'_> {
    fn kind(&self) -> SyntaxKind {
        self.stream.kind(self.id)
    }

    fn lexeme(&self) -> &str {
        self.stream.lexeme(self.id)
    }

    fn bump(&mut self) {
        if let Some(next) = self.stream.next(self.id) {
            self.id = next;
        }
        self.skip_trivia();
    }

    fn skip_trivia(&mut self) {
        while self.kind() == SyntaxKind::Comment {
            match self.stream.next(self.id) {
                Some(next) => self.id = next,
                None => break,
            }
        }
    }

    fn string(&mut self) -> Option<(String, usize)> {
        if self.kind() != SyntaxKind::String {
            return None;
        }
        let value = unquote(self.lexeme());
        let offset = self.stream.get(self.id).map_or(0, |token| token.offset());
        self.bump();
        Some((value, offset))
    }

    fn dotted_name(&mut self) -> String {
        let mut name = String::new();
        while self.kind().is_identifier_like() {
            name.push_str(self.lexeme());
            self.bump();
            if self.kind() != SyntaxKind::Dot {
                break;
            }
            name.push('.');
            self.bump();
        }
        name
    }

    fn skip_dotted_name(&mut self) {
        self.dotted_name();
    }

    fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.kind() {
                SyntaxKind::LParen => depth += 1,
                SyntaxKind::RParen => depth = depth.saturating_sub(1),
                SyntaxKind::Eof => return,
                _ => {},
            }
            self.bump();
            if depth == 0 {
                return;
            }
        }
    }

    fn skip_to_semicolon(&mut self) {
        while !matches!(self.kind(), SyntaxKind::Semicolon | SyntaxKind::Eof) {
            self.bump();
        }
        self.bump();
    }
}

#[cfg(test)]
#[path = "../../tests/src/syntax/directives_tests.rs"]
mod tests;
