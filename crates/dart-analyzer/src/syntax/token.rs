use std::sync::Arc;

use crate::syntax::{SyntaxKind, lexer::Lexer};

/// Stable index of a token slot inside a [`TokenStream`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(u32);

impl TokenId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One lexical token. `next` is the owning link of the stream; `previous`
/// is a back-reference used for bounded backward walks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    kind: SyntaxKind,
    offset: usize,
    len: usize,
    next: Option<TokenId>,
    previous: Option<TokenId>,
}

impl Token {
    fn new(
        kind: SyntaxKind,
        offset: usize,
        len: usize,
    ) -> Self {
        Self {
            kind,
            offset,
            len,
            next: None,
            previous: None,
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn next(&self) -> Option<TokenId> {
        self.next
    }

    pub fn previous(&self) -> Option<TokenId> {
        self.previous
    }
}

/// Immutable view of a token together with its text, as compared by the
/// scan-equivalence checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSnapshot {
    pub kind: SyntaxKind,
    pub offset: usize,
    pub len: usize,
    pub lexeme: String,
}

/// Arena-backed, doubly linked token sequence over one immutable source
/// buffer. Whitespace is dropped; comments are kept. The last token is
/// always the single `Eof` token.
#[derive(Debug, Clone)]
pub struct TokenStream {
    source: Arc<str>,
    slots: Vec<Option<Token>>,
    free: Vec<TokenId>,
    head: TokenId,
    eof: TokenId,
    count: usize,
}

impl TokenStream {
    /// Full scan of `source`.
    pub fn scan(source: impl Into<Arc<str>>) -> Self {
        let source: Arc<str> = source.into();
        let mut stream = Self {
            source: source.clone(),
            slots: Vec::new(),
            free: Vec::new(),
            head: TokenId(0),
            eof: TokenId(0),
            count: 0,
        };
        let mut ids = Vec::new();
        let mut lexer = Lexer::new(&source);
        while let Some((kind, span)) = lexer.next_significant() {
            ids.push(stream.alloc(Token::new(kind, span.start, span.len())));
        }
        ids.push(stream.alloc(Token::new(SyntaxKind::Eof, source.len(), 0)));
        stream.link(None, &ids);
        stream
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn source_arc(&self) -> &Arc<str> {
        &self.source
    }

    pub fn first(&self) -> TokenId {
        self.head
    }

    pub fn eof(&self) -> TokenId {
        self.eof
    }

    /// Number of live tokens including `Eof`.
    pub fn token_count(&self) -> usize {
        self.count
    }

    pub fn get(
        &self,
        id: TokenId,
    ) -> Option<&Token> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn kind(
        &self,
        id: TokenId,
    ) -> SyntaxKind {
        self.get(id).map_or(SyntaxKind::Eof, Token::kind)
    }

    pub fn next(
        &self,
        id: TokenId,
    ) -> Option<TokenId> {
        self.get(id).and_then(Token::next)
    }

    pub fn previous(
        &self,
        id: TokenId,
    ) -> Option<TokenId> {
        self.get(id).and_then(Token::previous)
    }

    pub fn lexeme(
        &self,
        id: TokenId,
    ) -> &str {
        self.get(id).map_or("", |token| self.text_of(token))
    }

    pub fn text_of(
        &self,
        token: &Token,
    ) -> &str {
        self.source.get(token.offset..token.end()).unwrap_or("")
    }

    /// Tokens in stream order, `Eof` included.
    pub fn iter(&self) -> Tokens<'_> {
        Tokens {
            stream: self,
            cursor: Some(self.head),
        }
    }

    /// The token covering `offset`, or the first token starting after it.
    pub fn token_at(
        &self,
        offset: usize,
    ) -> TokenId {
        self.iter().find(|(_, token)| token.end() > offset || token.kind == SyntaxKind::Eof).map_or(self.eof, |(id, _)| id)
    }

    pub fn snapshot(&self) -> Vec<TokenSnapshot> {
        self.iter()
            .map(|(_, token)| TokenSnapshot {
                kind: token.kind,
                offset: token.offset,
                len: token.len,
                lexeme: self.text_of(token).to_string(),
            })
            .collect()
    }

    /// One line per token: `Kind offset..end "lexeme"`.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (_, token) in self.iter() {
            out.push_str(&format!("{:?} {}..{} {:?}\n", token.kind, token.offset, token.end(), self.text_of(token)));
        }
        out
    }

    /// Checks the link and ordering invariants; returns a description of the
    /// first violation.
    pub fn validate(&self) -> Result<(), String> {
        let mut previous: Option<(TokenId, usize)> = None;
        let mut seen = 0usize;
        for (id, token) in self.iter() {
            seen += 1;
            if seen > self.slots.len() {
                return Err("cycle in next links".to_string());
            }
            if token.previous != previous.map(|(prev_id, _)| prev_id) {
                return Err(format!("broken previous link at {}", token.offset));
            }
            if let Some((_, prev_end)) = previous {
                if token.offset < prev_end {
                    return Err(format!("overlapping token at {}", token.offset));
                }
            }
            if token.kind == SyntaxKind::Eof && id != self.eof {
                return Err("eof before end of stream".to_string());
            }
            previous = Some((id, token.end()));
        }
        if seen != self.count {
            return Err(format!("count {} but {} reachable", self.count, seen));
        }
        if self.kind(self.eof) != SyntaxKind::Eof || self.next(self.eof).is_some() {
            return Err("stream does not end with eof".to_string());
        }
        Ok(())
    }

    // ── arena plumbing used by the incremental scanner ──────────────────

    pub(crate) fn with_source(
        &self,
        source: Arc<str>,
    ) -> Self {
        let mut stream = self.clone();
        stream.source = source;
        stream
    }

    pub(crate) fn alloc_token(
        &mut self,
        kind: SyntaxKind,
        offset: usize,
        len: usize,
    ) -> TokenId {
        self.alloc(Token::new(kind, offset, len))
    }

    fn alloc(
        &mut self,
        token: Token,
    ) -> TokenId {
        self.count += 1;
        if let Some(id) = self.free.pop() {
            self.slots[id.index()] = Some(token);
            return id;
        }
        let id = TokenId(self.slots.len() as u32);
        self.slots.push(Some(token));
        id
    }

    pub(crate) fn release(
        &mut self,
        id: TokenId,
    ) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            if slot.take().is_some() {
                self.count -= 1;
                self.free.push(id);
            }
        }
    }

    pub(crate) fn relocate(
        &mut self,
        id: TokenId,
        offset: usize,
    ) {
        if let Some(Some(token)) = self.slots.get_mut(id.index()) {
            token.offset = offset;
        }
    }

    /// Links `run` in order after `anchor` (or as the head). The last id of
    /// `run` becomes the end of the stream.
    pub(crate) fn link(
        &mut self,
        anchor: Option<TokenId>,
        run: &[TokenId],
    ) {
        let mut previous = anchor;
        for &id in run {
            if let Some(Some(token)) = self.slots.get_mut(id.index()) {
                token.previous = previous;
                token.next = None;
            }
            match previous {
                Some(prev) => {
                    if let Some(Some(token)) = self.slots.get_mut(prev.index()) {
                        token.next = Some(id);
                    }
                },
                None => self.head = id,
            }
            previous = Some(id);
        }
        if let Some(last) = run.last() {
            self.eof = *last;
        }
    }
}

/// Iterator over `(TokenId, &Token)` following `next` links.
pub struct Tokens<'a> {
    stream: &'a TokenStream,
    cursor: Option<TokenId>,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = (TokenId, &'a Token);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        let token = self.stream.get(id)?;
        self.cursor = token.next;
        Some((id, token))
    }
}

#[cfg(test)]
#[path = "../../tests/src/syntax/token_tests.rs"]
mod tests;
